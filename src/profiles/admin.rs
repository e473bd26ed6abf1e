use std::collections::HashMap;

use axum::{
    Form, debug_handler,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppResult, include_res, res};

use super::{links, owner};

#[derive(Deserialize)]
pub(crate) struct AdminQuery {
    error: Option<String>,
}

#[debug_handler]
pub(crate) async fn admin_page(
    Path(username): Path<String>,
    Query(AdminQuery { error }): Query<AdminQuery>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(user) = owner(&db_pool, &session, &username).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    let stored: Vec<(String, String)> = sqlx::query_as("SELECT label,url FROM links WHERE user_id=?")
        .bind(&user.id)
        .fetch_all(&db_pool)
        .await?;

    let mut rows = String::new();
    for (i, (label, url)) in links::pad_rows(&stored).iter().enumerate() {
        rows += &include_res!(str, "/pages/link_row.html")
            .replace("{i}", &i.to_string())
            .replace("{label}", &res::escape(label))
            .replace("{url}", &res::escape(url));
    }

    let username = res::escape(&username);
    let photo = match &user.profile_pic_url {
        Some(path) => format!(r#"<img class="img-thumbnail mb-3" src="/{path}" alt="{username}">"#),
        None => String::new(),
    };

    Ok(Html(
        include_res!(str, "/pages/admin.html")
            .replace("{rows}", &rows)
            .replace("{bio}", &res::escape(user.bio.as_deref().unwrap_or("")))
            .replace("{photo}", &photo)
            .replace("{error}", &res::escape(error.as_deref().unwrap_or("")))
            .replace("{username}", &username),
    )
    .into_response())
}

/// Saves the bio and replaces the whole link set with the submitted rows.
#[debug_handler]
pub(crate) async fn save(
    Path(username): Path<String>,
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(form): Form<HashMap<String, String>>,
) -> AppResult<Response> {
    let Some(user) = owner(&db_pool, &session, &username).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    let bio = form.get("bio").cloned().unwrap_or_default();
    let rows = links::collect_rows(&form);

    let mut tx = db_pool.begin().await?;
    sqlx::query("UPDATE users SET bio=? WHERE id=?")
        .bind(&bio)
        .bind(&user.id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM links WHERE user_id=?")
        .bind(&user.id)
        .execute(&mut *tx)
        .await?;
    for (label, url) in &rows {
        sqlx::query("INSERT INTO links (user_id,label,url) VALUES (?,?,?)")
            .bind(&user.id)
            .bind(label)
            .bind(url)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    Ok(Redirect::to(&format!("/{username}")).into_response())
}
