//! Session resolution from the request's cookies.
//!
//! Presence of a non-empty session cookie stands in for authentication. The
//! token is not verified here; the collaborator checks it whenever a route
//! forwards it as a bearer token.

use axum_extra::extract::cookie::{Cookie, CookieJar};

#[must_use]
pub fn session_token(jar: &CookieJar, cookie_name: &str) -> Option<String> {
    jar.get(cookie_name)
        .map(Cookie::value)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

#[must_use]
pub fn has_session(jar: &CookieJar, cookie_name: &str) -> bool {
    session_token(jar, cookie_name).is_some()
}
