use axum::{Router, routing::get};
use sqlx::SqlitePool;

use crate::AppState;

mod callback;
mod login;
mod logout;
mod password;
mod provider;
mod register;

pub use provider::Provider;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", get(register::register_page).post(register::register))
        .route("/login", get(login::login_page).post(login::login))
        .route("/login/okta", get(login::login_okta))
        .route("/authorization-code/callback", get(callback::callback))
        .route("/logout", get(logout::logout))
}

pub(crate) async fn create_user(
    db_pool: &SqlitePool,
    id: &str,
    email: &str,
    username: &str,
    name: &str,
    password_hash: Option<&str>,
) -> Result<sqlx::sqlite::SqliteQueryResult, sqlx::Error> {
    println!("adding @{username}#{id}");
    sqlx::query("INSERT INTO users (id,email,username,name,password_hash) VALUES (?,?,?,?,?)")
        .bind(id)
        .bind(email)
        .bind(username)
        .bind(name)
        .bind(password_hash)
        .execute(db_pool)
        .await
}
