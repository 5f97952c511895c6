// Login, logout and session status

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, header},
    response::{AppendHeaders, IntoResponse},
};
use std::time::Duration;

use super::AppState;
use super::extract::{cookie_value, current_session, expired_cookie, session_cookie};
use crate::auth::verify_credentials;
use crate::error::{ApiError, ApiResult};
use crate::models::{AuthStatus, LoginRequest, LoginResponse, MessageResponse};

/// POST /api/auth/login
pub(super) async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload.map_err(|_| ApiError::validation("Invalid credentials format"))?;
    let user = verify_credentials(state.users.as_ref(), &req.username, &req.password)
        .await
        .ok_or_else(|| {
            tracing::info!(username = %req.username, "login rejected");
            ApiError::InvalidCredentials
        })?;

    // A fresh id on every login; any session the client already held is dropped.
    if let Some(old) = cookie_value(&headers, &state.auth.cookie_name) {
        state.sessions.destroy(&old).await;
    }
    let ttl = state.auth.session_ttl_secs;
    let session = state
        .sessions
        .create(user.clone(), Duration::from_secs(ttl))
        .await;
    tracing::info!(username = %user.username, "login");

    let cookie = session_cookie(
        &state.auth.cookie_name,
        &session.id,
        ttl,
        state.auth.secure_cookie,
    );
    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(LoginResponse {
            message: "Login successful".into(),
            user,
        }),
    ))
}

/// POST /api/auth/logout. Always succeeds and expires the cookie.
pub(super) async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(id) = cookie_value(&headers, &state.auth.cookie_name)
        && state.sessions.destroy(&id).await
    {
        tracing::info!("logout");
    }
    (
        AppendHeaders([(
            header::SET_COOKIE,
            expired_cookie(&state.auth.cookie_name, state.auth.secure_cookie),
        )]),
        Json(MessageResponse::new("Logged out successfully")),
    )
}

/// GET /api/auth/status. No side effects.
pub(super) async fn status(State(state): State<AppState>, headers: HeaderMap) -> Json<AuthStatus> {
    let user = current_session(&headers, &state).await.map(|s| s.user);
    Json(AuthStatus {
        authenticated: user.is_some(),
        user,
    })
}
