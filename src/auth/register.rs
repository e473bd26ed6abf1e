use axum::{
    Form, debug_handler,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{AppResult, include_res, session::USER_ID};

use super::{create_user, password};

#[derive(Deserialize)]
pub(crate) struct RegisterForm {
    name: String,
    email: String,
    username: String,
    password: String,
}

#[debug_handler]
pub(crate) async fn register_page() -> impl IntoResponse {
    Html(include_res!(str, "/pages/register.html").replace("{error}", ""))
}

#[debug_handler]
pub(crate) async fn register(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(RegisterForm {
        name,
        email,
        username,
        password,
    }): Form<RegisterForm>,
) -> AppResult<Response> {
    if name.trim().is_empty()
        || email.trim().is_empty()
        || username.trim().is_empty()
        || password.is_empty()
    {
        return Ok(register_error("All fields are required."));
    }

    if sqlx::query("SELECT 1 FROM users WHERE email=?")
        .bind(&email)
        .fetch_optional(&db_pool)
        .await?
        .is_some()
    {
        // already have an account for that address
        return Ok(Redirect::to("/login").into_response());
    }

    if sqlx::query("SELECT 1 FROM users WHERE username=?")
        .bind(&username)
        .fetch_optional(&db_pool)
        .await?
        .is_some()
    {
        return Ok(register_error("That username is already taken."));
    }

    let id = Uuid::now_v7().to_string();
    let hash = password::hash_password(&password).await?;
    create_user(&db_pool, &id, &email, &username, &name, Some(&hash)).await?;

    session.insert(USER_ID, id).await?;
    Ok(Redirect::to(&format!("/{username}/admin")).into_response())
}

fn register_error(msg: &str) -> Response {
    Html(include_res!(str, "/pages/register.html").replace("{error}", msg)).into_response()
}
