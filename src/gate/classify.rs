//! Route classification by path.

use serde::Serialize;

/// Paths reachable without a session, matched exactly.
pub const PUBLIC_PATHS: &[&str] = &["/", "/sign-in", "/sign-up", "/sign-out", "/auth/callback"];

/// Prefix of the auth API, which must stay reachable to establish sessions.
pub const AUTH_API_PREFIX: &str = "/api/auth/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteClass {
    Public,
    AuthApi,
    Protected,
}

#[must_use]
pub fn classify(path: &str) -> RouteClass {
    if path.starts_with(AUTH_API_PREFIX) {
        RouteClass::AuthApi
    } else if PUBLIC_PATHS.contains(&path) {
        RouteClass::Public
    } else {
        RouteClass::Protected
    }
}

#[cfg(test)]
#[path = "classify_test.rs"]
mod tests;
