use std::collections::HashMap;

/// Number of (label, url) rows on the admin form.
pub(crate) const MAX_LINK_ROWS: usize = 5;

/// Pulls `links-{i}-label` / `links-{i}-url` pairs out of the submitted
/// form, dropping any row where either side is blank.
pub(crate) fn collect_rows(form: &HashMap<String, String>) -> Vec<(String, String)> {
    let mut rows = Vec::new();
    for i in 0..MAX_LINK_ROWS {
        let label = form
            .get(&format!("links-{i}-label"))
            .map(String::as_str)
            .unwrap_or("");
        let url = form
            .get(&format!("links-{i}-url"))
            .map(String::as_str)
            .unwrap_or("");
        if !label.trim().is_empty() && !url.trim().is_empty() {
            rows.push((label.to_owned(), url.to_owned()));
        }
    }
    rows
}

/// Pads the stored links with blank rows so the form always shows
/// `MAX_LINK_ROWS` of them.
pub(crate) fn pad_rows(links: &[(String, String)]) -> Vec<(String, String)> {
    let mut rows = links.to_vec();
    rows.truncate(MAX_LINK_ROWS);
    while rows.len() < MAX_LINK_ROWS {
        rows.push((String::new(), String::new()));
    }
    rows
}
