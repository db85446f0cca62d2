//! Session gateway: Google login redirects, current-user lookup and logout.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use super::error::ApiError;
use crate::oauth::AuthExchangeError;
use crate::session::{self, Principal, OAUTH_STATE_COOKIE};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentUserResponse {
    pub authenticated: bool,
    pub user: Option<Principal>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub success: bool,
    pub message: String,
}

/// Redirect the browser to the identity provider
pub async fn begin_login(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let oauth_state = uuid::Uuid::new_v4().to_string();

    match state.identity.authorization_url(&oauth_state) {
        Ok(url) => {
            let jar = jar.add(state.cookies.state_cookie(&oauth_state));
            (jar, Redirect::to(&url)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, reason = e.reason(), "Cannot start Google login");
            Redirect::to(&state.config.client.error_url()).into_response()
        }
    }
}

/// Provider callback: exchange the code, open a session, land on the home or error screen
pub async fn callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Response {
    let stored_state = jar.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string());
    let previous_session = state.cookies.session_token(&jar);
    let jar = jar.remove(state.cookies.clear_state_cookie());

    match complete_login(&state, params, stored_state, previous_session).await {
        Ok((token, principal)) => {
            tracing::info!(user_id = %principal.id, "Google login successful");
            let jar = jar.add(state.cookies.session_cookie(&token));
            (jar, Redirect::to(&state.config.client.home_url())).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, reason = e.reason(), "Google login failed");
            (jar, Redirect::to(&state.config.client.error_url())).into_response()
        }
    }
}

async fn complete_login(
    state: &AppState,
    params: CallbackParams,
    stored_state: Option<String>,
    previous_session: Option<String>,
) -> Result<(String, Principal), AuthExchangeError> {
    if let Some(error) = params.error {
        return Err(AuthExchangeError::Denied(error));
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or(AuthExchangeError::MissingCode)?;

    let received = params.state.ok_or(AuthExchangeError::StateMismatch)?;
    let stored = stored_state.ok_or(AuthExchangeError::StateMismatch)?;
    if received.len() != stored.len() || !bool::from(received.as_bytes().ct_eq(stored.as_bytes()))
    {
        return Err(AuthExchangeError::StateMismatch);
    }

    let principal = state.identity.authenticate(&code).await?;

    // A fresh login replaces whatever session the browser carried before
    if let Some(previous) = previous_session {
        if let Err(e) = state.sessions.destroy(&previous).await {
            tracing::warn!(error = %e, "Failed to destroy previous session");
        }
    }

    let token = session::generate_token();
    state
        .sessions
        .set(&token, principal.clone())
        .await
        .map_err(|e| AuthExchangeError::Session(e.to_string()))?;

    Ok((token, principal))
}

/// Report who is signed in, if anyone
pub async fn current_user(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<CurrentUserResponse>, ApiError> {
    let user = match state.cookies.session_token(&jar) {
        Some(token) => state.sessions.get(&token).await?,
        None => None,
    };

    Ok(Json(CurrentUserResponse {
        authenticated: user.is_some(),
        user,
    }))
}

/// Destroy the session and clear its cookie
pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    if let Some(token) = state.cookies.session_token(&jar) {
        if let Err(e) = state.sessions.destroy(&token).await {
            tracing::error!(error = %e, "Failed to logout");
            return ApiError::session_store("Failed to logout").into_response();
        }
    }

    let jar = jar.remove(state.cookies.clear_session_cookie());
    (
        jar,
        Json(LogoutResponse {
            success: true,
            message: "Logged out successfully".to_string(),
        }),
    )
        .into_response()
}
