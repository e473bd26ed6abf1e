use axum::{
    debug_handler,
    response::{Html, IntoResponse},
};

use crate::{Markdown, include_res};

#[debug_handler]
pub async fn home() -> impl IntoResponse {
    Html(include_res!(str, "/pages/index.html"))
}

#[debug_handler]
pub async fn about() -> impl IntoResponse {
    Markdown(include_res!(str, "/pages/about.md"))
}

#[debug_handler]
pub async fn contact() -> impl IntoResponse {
    Html(include_res!(str, "/pages/contact.html"))
}
