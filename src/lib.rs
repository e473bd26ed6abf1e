pub mod auth;
pub mod db;
pub mod index;
pub mod profiles;
pub mod res;
pub mod session;

use std::ops::Deref;

use axum::{
    Router,
    extract::FromRef,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde_json::Value;
use sqlx::SqlitePool;
use tower_http::services::ServeDir;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, cookie::SameSite};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub provider: auth::Provider,
}

/// Builds the full application router; `main` and the route tests share this.
pub fn app(state: AppState) -> Router {
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(30)));

    Router::new()
        .route("/", get(index::home))
        .route("/about", get(index::about))
        .route("/contact", get(index::contact))
        .merge(auth::router())
        .merge(profiles::router())
        .nest_service("/static", ServeDir::new("static"))
        .with_state(state)
        .layer(session_layer)
}

pub trait GetField {
    fn get_str_field(&self, field: &str) -> AppResult<String>;
    fn get_obj_field(&self, field: &str) -> AppResult<&Value>;
}

impl GetField for serde_json::Value {
    fn get_str_field(&self, field: &str) -> AppResult<String> {
        Ok(self
            .get(field)
            .ok_or(format!("expected {field} in {self}"))?
            .as_str()
            .ok_or(format!("expected {field} in {self} to be string"))?
            .to_owned())
    }

    fn get_obj_field(&self, field: &str) -> AppResult<&Value> {
        self.get(field)
            .ok_or(format!("expected {field} in {self}").into())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError(pub StatusCode, pub anyhow::Error);

impl AppError {
    pub fn forbidden(msg: &str) -> AppError {
        AppError(StatusCode::FORBIDDEN, anyhow::Error::msg(msg.to_owned()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.0, format!("{}\n\n{}", self.1, self.1.backtrace())).into_response()
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        Self(StatusCode::INTERNAL_SERVER_ERROR, anyhow::Error::msg(err))
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        Self(StatusCode::INTERNAL_SERVER_ERROR, anyhow::Error::msg(err.to_owned()))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self(StatusCode::INTERNAL_SERVER_ERROR, err)
    }
}

macro_rules! apperr_impl {
    ($E:ty) => {
        impl From<$E> for AppError {
            fn from(err: $E) -> Self {
                Self(StatusCode::INTERNAL_SERVER_ERROR, anyhow::Error::from(err))
            }
        }
    };
}

apperr_impl!(std::io::Error);
apperr_impl!(tokio::task::JoinError);
apperr_impl!(serde_json::Error);
apperr_impl!(sqlx::Error);
apperr_impl!(tower_sessions::session::Error);
apperr_impl!(axum::Error);
apperr_impl!(axum::extract::multipart::MultipartError);
apperr_impl!(reqwest::Error);
apperr_impl!(image::ImageError);
apperr_impl!(argon2::password_hash::Error);
apperr_impl!(oauth2::url::ParseError);

// a failed token exchange is an authentication failure, not a server error
impl<E: core::error::Error + Send + Sync + 'static, R: oauth2::ErrorResponse + Send + Sync + 'static>
    From<oauth2::RequestTokenError<E, R>> for AppError
{
    fn from(err: oauth2::RequestTokenError<E, R>) -> Self {
        Self(StatusCode::FORBIDDEN, anyhow::Error::from(err))
    }
}

pub struct Markdown<T>(pub T);

impl<T> IntoResponse for Markdown<T>
where
    T: Deref<Target = str>,
{
    fn into_response(self) -> axum::response::Response {
        let mut html_output = String::new();
        pulldown_cmark::html::push_html(&mut html_output, pulldown_cmark::Parser::new(&*self.0));
        Html(html_output).into_response()
    }
}
