use axum::{
    debug_handler,
    extract::{Path, State},
    response::{Html, IntoResponse, Response},
};
use sqlx::SqlitePool;

use crate::{AppResult, include_res, res};

/// Public card: anyone can look up a user by username.
#[debug_handler]
pub(crate) async fn profile(
    Path(username): Path<String>,
    State(db_pool): State<SqlitePool>,
) -> AppResult<Response> {
    let row: Option<(String, String, Option<String>, Option<String>)> =
        sqlx::query_as("SELECT id,name,bio,profile_pic_url FROM users WHERE username=?")
            .bind(&username)
            .fetch_optional(&db_pool)
            .await?;

    let Some((user_id, name, bio, profile_pic_url)) = row else {
        return res::sorry("user");
    };

    let links: Vec<(String, String)> = sqlx::query_as("SELECT label,url FROM links WHERE user_id=?")
        .bind(&user_id)
        .fetch_all(&db_pool)
        .await?;

    let mut items = String::new();
    for (label, url) in links {
        items += &include_res!(str, "/pages/link_item.html")
            .replace("{url}", &res::escape(&url))
            .replace("{label}", &res::escape(&label));
    }

    let mut bio_html = String::new();
    pulldown_cmark::html::push_html(
        &mut bio_html,
        pulldown_cmark::Parser::new(bio.as_deref().unwrap_or("")),
    );

    let name = res::escape(&name);
    let photo = match &profile_pic_url {
        Some(path) => format!(r#"<img class="profile-photo rounded" src="/{path}" alt="{name}">"#),
        None => String::new(),
    };

    Ok(Html(
        include_res!(str, "/pages/enduser.html")
            .replace("{links}", &items)
            .replace("{bio}", &bio_html)
            .replace("{photo}", &photo)
            .replace("{name}", &name)
            .replace("{username}", &res::escape(&username)),
    )
    .into_response())
}
