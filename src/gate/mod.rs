//! Session gate: decides allow/redirect before a request reaches a handler.
//!
//! SYSTEM CONTEXT
//! ==============
//! Installed as the outermost route layer in `routes::app`. Each request is
//! resolved for session presence, classified by path, decided by the redirect
//! policy, logged, and then either redirected or passed on.
//!
//! DESIGN
//! ======
//! The gate holds no cross-request state. Classification and policy are pure
//! functions; the resolver only reads cookies. Static asset paths skip the
//! gate entirely and are not logged.

pub mod classify;
pub mod policy;
pub mod session;

use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;

pub use classify::classify;
pub use policy::{Decision, decide};

use crate::logging::Logger;
use crate::state::AppState;

/// Path prefixes served without gating.
const UNGATED_PREFIXES: &[&str] = &["/assets/", "/images/", "/public/"];
const UNGATED_PATHS: &[&str] = &["/favicon.ico", "/healthz"];

#[must_use]
pub fn bypasses_gate(path: &str) -> bool {
    UNGATED_PATHS.contains(&path) || UNGATED_PREFIXES.iter().any(|p| path.starts_with(p))
}

/// Resolve, classify and decide for one request path.
#[must_use]
pub fn evaluate(jar: &CookieJar, cookie_name: &str, path: &str) -> Decision {
    let has_session = session::has_session(jar, cookie_name);
    decide(has_session, classify(path), path)
}

// =============================================================================
// MIDDLEWARE
// =============================================================================

/// Axum middleware; install with `middleware::from_fn_with_state`.
pub async fn session_gate(State(state): State<AppState>, jar: CookieJar, request: Request, next: Next) -> Response {
    let start = Instant::now();
    let path = request.uri().path().to_owned();
    if bypasses_gate(&path) {
        return next.run(request).await;
    }

    let decision = evaluate(&jar, &state.config.session_cookie, &path);
    log_request(&state.logger, request.method(), &path, start.elapsed(), decision);

    match decision.location() {
        Some(target) => Redirect::temporary(target).into_response(),
        None => next.run(request).await,
    }
}

fn log_request(logger: &Logger, method: &Method, path: &str, elapsed: Duration, decision: Decision) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    let meta = json!({
        "method": method.as_str(),
        "path": path,
        "durationMs": duration_ms,
        "decision": decision,
    });
    logger.http(&format!("[Request] {method} {path} - {duration_ms}ms"), Some(&meta));
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
