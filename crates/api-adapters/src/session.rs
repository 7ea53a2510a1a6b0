//! Session cookie plumbing: reading the token off a request and
//! resolving it to an identity. Token issuance lives in the auth
//! adapter; this module only carries the cookie.

use axum::http::{header, HeaderMap};
use domains::Identity;

use crate::state::AppState;

pub const SESSION_COOKIE: &str = "pb_session";

/// Extracts the session token from the Cookie header, if any.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

/// Resolves the request to an identity. Stale tokens and disabled
/// accounts resolve to anonymous.
pub async fn identify(state: &AppState, headers: &HeaderMap) -> Option<Identity> {
    let token = session_token(headers)?;
    let user_id = state.sessions.resolve(&token).await.ok().flatten()?;
    state
        .accounts
        .find(user_id)
        .await
        .ok()
        .flatten()
        .filter(|user| user.is_active)
}

/// Set-Cookie value for a fresh session.
pub fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}

/// Set-Cookie value that clears the session.
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Max-Age=0")
}
