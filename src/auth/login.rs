use axum::{
    Form, debug_handler,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use oauth2::{CsrfToken, PkceCodeChallenge, Scope};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{
    AppResult, include_res,
    session::{CSRF_STATE, PKCE_VERIFIER, USER_ID},
};

use super::{Provider, password};

#[derive(Deserialize)]
pub(crate) struct LoginForm {
    email: String,
    password: String,
}

#[debug_handler]
pub(crate) async fn login_page() -> impl IntoResponse {
    Html(include_res!(str, "/pages/login.html").replace("{error}", ""))
}

#[debug_handler]
pub(crate) async fn login(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(LoginForm { email, password }): Form<LoginForm>,
) -> AppResult<Response> {
    let row: Option<(String, String, Option<String>)> =
        sqlx::query_as("SELECT id,username,password_hash FROM users WHERE email=?")
            .bind(&email)
            .fetch_optional(&db_pool)
            .await?;

    // accounts created through the provider have no local password
    let Some((id, username, Some(stored))) = row else {
        return Ok(login_error());
    };

    if !password::verify_password(&password, &stored).await? {
        return Ok(login_error());
    }

    session.insert(USER_ID, id).await?;
    Ok(Redirect::to(&format!("/{username}/admin")).into_response())
}

#[debug_handler]
pub(crate) async fn login_okta(
    State(provider): State<Provider>,
    session: Session,
) -> AppResult<Response> {
    let (pkce_code_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

    let (authorize_url, csrf_state) = provider
        .client()
        .authorize_url(CsrfToken::new_random)
        .add_scope(Scope::new("openid".to_string()))
        .add_scope(Scope::new("email".to_string()))
        .add_scope(Scope::new("profile".to_string()))
        .set_pkce_challenge(pkce_code_challenge)
        .url();

    session.insert(CSRF_STATE, csrf_state.secret()).await?;
    session.insert(PKCE_VERIFIER, pkce_verifier.secret()).await?;

    Ok(Redirect::to(authorize_url.as_str()).into_response())
}

fn login_error() -> Response {
    Html(include_res!(str, "/pages/login.html").replace("{error}", "Wrong email or password."))
        .into_response()
}
