// Session cookie extraction

use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};

use super::AppState;
use crate::error::ApiError;
use crate::models::{PublicUser, Session};

/// Authenticated caller. Rejects with 401 before the handler (and any runtime call) runs.
pub(crate) struct SessionUser {
    pub(crate) user: PublicUser,
}

impl FromRequestParts<AppState> for SessionUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = current_session(&parts.headers, state)
            .await
            .ok_or(ApiError::Unauthorized)?;
        Ok(SessionUser { user: session.user })
    }
}

/// Live session named by the request's session cookie, if any.
pub(crate) async fn current_session(headers: &HeaderMap, state: &AppState) -> Option<Session> {
    let id = cookie_value(headers, &state.auth.cookie_name)?;
    state.sessions.get(&id).await
}

pub(crate) fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(k, _)| *k == name)
        .map(|(_, v)| v.trim_matches('"'))
        .find(|v| !v.is_empty())
        .map(String::from)
}

/// `Set-Cookie` value for a new session.
pub(crate) fn session_cookie(name: &str, id: &str, max_age_secs: u64, secure: bool) -> String {
    let mut c = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        name, id, max_age_secs
    );
    if secure {
        c.push_str("; Secure");
    }
    c
}

pub(crate) fn expired_cookie(name: &str, secure: bool) -> String {
    session_cookie(name, "", 0, secure)
}
