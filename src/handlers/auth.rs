use axum::{
    extract::{Query, State},
    response::Redirect,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;

use crate::auth::oauth::{self, GoogleOAuth};
use crate::auth::session::{
    create_login_state_token, create_session_token, verify_login_state_token,
    verify_session_token, SessionUser, LOGIN_STATE_COOKIE, SESSION_COOKIE,
};
use crate::error::{AppError, AppResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

fn login_setup(state: &AppState) -> AppResult<(&GoogleOAuth, &str)> {
    match (state.oauth.as_deref(), state.config.secret_key.as_deref()) {
        (Some(client), Some(secret)) => Ok((client, secret)),
        _ => Err(AppError::Unavailable("Google login is not configured".into())),
    }
}

fn cookie(state: &AppState, name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.oauth_redirect_uri.starts_with("https://"))
        .build()
}

pub async fn login(State(state): State<AppState>, jar: CookieJar) -> AppResult<(CookieJar, Redirect)> {
    let (client, secret) = login_setup(&state)?;

    let login_state = oauth::random_token(32);
    let verifier = oauth::random_token(64);
    let url = client
        .authorize_url(&login_state, &oauth::code_challenge(&verifier))
        .map_err(|e| AppError::Internal(e.into()))?;

    let token = create_login_state_token(&login_state, &verifier, secret)?;
    let jar = jar.add(cookie(&state, LOGIN_STATE_COOKIE, token));

    Ok((jar, Redirect::to(url.as_str())))
}

pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> AppResult<(CookieJar, Redirect)> {
    let (client, secret) = login_setup(&state)?;

    if let Some(error) = params.error {
        return Err(AppError::InvalidRequest(format!("Login was not completed: {}", error)));
    }

    let stored = jar
        .get(LOGIN_STATE_COOKIE)
        .ok_or_else(|| AppError::InvalidRequest("Login session expired".into()))?;
    let claims = verify_login_state_token(stored.value(), secret)
        .map_err(|_| AppError::InvalidRequest("Login session expired".into()))?;

    if params.state.as_deref() != Some(claims.state.as_str()) {
        tracing::warn!("OAuth state mismatch on callback");
        return Err(AppError::InvalidRequest("Login state mismatch".into()));
    }
    let code = params
        .code
        .ok_or_else(|| AppError::InvalidRequest("Missing authorization code".into()))?;

    let tokens = client
        .exchange_code(&code, &claims.verifier)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;
    let user = client
        .fetch_user(&tokens.access_token)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    tracing::info!(sub = %user.sub, "User logged in with Google");

    let session = create_session_token(user, secret)?;
    let jar = jar
        .remove(Cookie::build(LOGIN_STATE_COOKIE).path("/"))
        .add(cookie(&state, SESSION_COOKIE, session));

    Ok((jar, Redirect::to(&state.config.post_login_redirect)))
}

pub async fn me(State(state): State<AppState>, jar: CookieJar) -> AppResult<Json<SessionUser>> {
    let secret = state.config.secret_key.as_deref().ok_or(AppError::Unauthorized)?;
    let token = jar.get(SESSION_COOKIE).ok_or(AppError::Unauthorized)?;
    let user = verify_session_token(token.value(), secret)?;
    Ok(Json(user))
}
