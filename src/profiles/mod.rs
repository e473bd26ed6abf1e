mod admin;
mod links;
mod page;
mod photo;
mod upload;

use axum::{
    Router,
    routing::{get, post},
};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppResult, AppState, session::USER_ID};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{username}", get(page::profile))
        .route("/{username}/admin", get(admin::admin_page).post(admin::save))
        .route("/{username}/upload", post(upload::upload))
}

pub(crate) struct Owner {
    pub id: String,
    pub bio: Option<String>,
    pub profile_pic_url: Option<String>,
}

/// Resolves `username` to its user row, but only when the session belongs
/// to that same user.
pub(crate) async fn owner(
    db_pool: &SqlitePool,
    session: &Session,
    username: &str,
) -> AppResult<Option<Owner>> {
    let Some(user_id) = session.get::<String>(USER_ID).await? else {
        return Ok(None);
    };

    let row: Option<(String, Option<String>, Option<String>)> =
        sqlx::query_as("SELECT id,bio,profile_pic_url FROM users WHERE username=?")
            .bind(username)
            .fetch_optional(db_pool)
            .await?;

    Ok(match row {
        Some((id, bio, profile_pic_url)) if id == user_id => Some(Owner {
            id,
            bio,
            profile_pic_url,
        }),
        _ => None,
    })
}
