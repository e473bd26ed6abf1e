use axum::{
    debug_handler,
    extract::{Query, State},
    response::Redirect,
};
use oauth2::{
    AuthorizationCode, CsrfToken, PkceCodeVerifier, TokenResponse, basic::BasicTokenType,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{
    AppError, AppResult, AppState, GetField,
    session::{CSRF_STATE, PKCE_VERIFIER, USER_ID},
};

use super::{Provider, create_user};

#[derive(Deserialize)]
pub(crate) struct CallbackQuery {
    pub state: Option<String>,
    pub code: Option<String>,
}

/// Authorization-code callback: exchange the code, read the identity
/// claims, upsert the local user, then log the session in.
#[debug_handler(state = AppState)]
pub(crate) async fn callback(
    Query(CallbackQuery { state, code }): Query<CallbackQuery>,
    State(db_pool): State<SqlitePool>,
    State(provider): State<Provider>,
    session: Session,
) -> AppResult<Redirect> {
    let Some(code) = code else {
        return Err(AppError::forbidden(
            "the code was not returned or is not accessible",
        ));
    };
    let state = CsrfToken::new(state.ok_or_else(|| AppError::forbidden("missing state"))?);

    let Some(stored_state) = session.get::<String>(CSRF_STATE).await? else {
        return Err(AppError::forbidden("no csrf_state in session"));
    };
    if state.secret().as_str() != stored_state.as_str() {
        return Err(AppError::forbidden("csrf tokens don't match"));
    }

    let Some(pkce_verifier) = session.get::<String>(PKCE_VERIFIER).await? else {
        return Err(AppError::forbidden("no pkce_verifier in session"));
    };

    let http_client = reqwest::ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .build()?;
    let token_result = provider
        .client()
        .exchange_code(AuthorizationCode::new(code))
        .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier))
        .request_async(&http_client)
        .await?;

    if !matches!(token_result.token_type(), BasicTokenType::Bearer) {
        return Err(AppError::forbidden(
            "unsupported token type, should be 'Bearer'",
        ));
    }
    let access_token = token_result.access_token().secret();

    let claims: serde_json::Value = http_client
        .get(provider.userinfo_uri())
        .bearer_auth(access_token)
        .send()
        .await?
        .json()
        .await?;

    let user_id = claims.get_str_field("sub")?;
    let email = claims.get_str_field("email")?;
    let username = claims.get_str_field("profile_username")?;
    let name = format!(
        "{} {}",
        claims.get_str_field("given_name")?,
        claims.get_str_field("family_name")?
    );

    if sqlx::query("SELECT 1 FROM users WHERE id=?")
        .bind(&user_id)
        .fetch_optional(&db_pool)
        .await?
        .is_none()
    {
        create_user(&db_pool, &user_id, &email, &username, &name, None).await?;
    }

    // the local row exists before the session is marked as logged in
    session.insert(USER_ID, user_id.clone()).await?;
    println!("welcome u/{user_id}");

    Ok(Redirect::to(&format!("/{username}/admin")))
}
