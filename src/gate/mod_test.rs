use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::header::{COOKIE, LOCATION};
use axum::http::{Request, StatusCode};
use axum::routing::get;
use serde_json::Value;
use tower::ServiceExt;

use super::*;
use crate::config::Config;
use crate::logging::file_sink::{ALL_LOG, FileSink};
use crate::logging::Level;
use crate::state::test_helpers::{MockBackend, MockMode};

fn temp_dir(name: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    std::env::temp_dir().join(format!("portico-gate-{name}-{}-{nanos}", std::process::id()))
}

fn state_logging_to(dir: &Path) -> AppState {
    let logger = Logger::new(Level::Http, Some(FileSink::open(dir).unwrap()));
    AppState::new(Config::default(), logger, Arc::new(MockBackend::new(MockMode::Healthy)))
}

/// Gate in front of handlers that always answer 200.
fn gated(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "ok" }))
        .route("/{*rest}", get(|| async { "ok" }))
        .layer(axum::middleware::from_fn_with_state(state.clone(), session_gate))
        .with_state(state)
}

async fn send(app: Router, path: &str, cookie: Option<&str>) -> (StatusCode, Option<String>) {
    let mut req = Request::builder().uri(path);
    if let Some(cookie) = cookie {
        req = req.header(COOKIE, cookie);
    }
    let resp = app.oneshot(req.body(Body::empty()).unwrap()).await.unwrap();
    let location = resp
        .headers()
        .get(LOCATION)
        .map(|v| v.to_str().unwrap().to_owned());
    (resp.status(), location)
}

fn logged_entries(dir: &Path) -> Vec<Value> {
    std::fs::read_to_string(dir.join(ALL_LOG))
        .unwrap_or_default()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

// =============================================================================
// bypasses_gate / evaluate
// =============================================================================

#[test]
fn static_assets_bypass() {
    assert!(bypasses_gate("/assets/app.css"));
    assert!(bypasses_gate("/images/logo.png"));
    assert!(bypasses_gate("/public/robots.txt"));
    assert!(bypasses_gate("/favicon.ico"));
    assert!(bypasses_gate("/healthz"));
}

#[test]
fn pages_do_not_bypass() {
    assert!(!bypasses_gate("/"));
    assert!(!bypasses_gate("/dashboard"));
    assert!(!bypasses_gate("/api/auth/sign-in"));
    assert!(!bypasses_gate("/assets"));
}

#[test]
fn evaluate_without_cookie() {
    let jar = CookieJar::new();
    assert_eq!(evaluate(&jar, "auth_session", "/dashboard"), Decision::RedirectToSignIn);
    assert_eq!(evaluate(&jar, "auth_session", "/sign-in"), Decision::Allow);
}

// =============================================================================
// middleware
// =============================================================================

#[tokio::test]
async fn anonymous_dashboard_redirects_to_sign_in() {
    let (state, _) = crate::state::test_helpers::test_app_state();
    let (status, location) = send(gated(state), "/dashboard", None).await;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location.as_deref(), Some("/sign-in"));
}

#[tokio::test]
async fn signed_in_sign_in_redirects_to_dashboard() {
    let (state, _) = crate::state::test_helpers::test_app_state();
    let (status, location) = send(gated(state), "/sign-in", Some("auth_session=abc")).await;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location.as_deref(), Some("/dashboard"));
}

#[tokio::test]
async fn signed_in_dashboard_passes_through() {
    let (state, _) = crate::state::test_helpers::test_app_state();
    let (status, location) = send(gated(state), "/dashboard", Some("auth_session=abc")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(location, None);
}

#[tokio::test]
async fn auth_api_is_open_without_session() {
    let (state, _) = crate::state::test_helpers::test_app_state();
    let (status, _) = send(gated(state), "/api/auth/status", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn empty_cookie_counts_as_no_session() {
    let (state, _) = crate::state::test_helpers::test_app_state();
    let (status, location) = send(gated(state), "/settings", Some("auth_session=")).await;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location.as_deref(), Some("/sign-in"));
}

#[tokio::test]
async fn assets_pass_without_session() {
    let (state, _) = crate::state::test_helpers::test_app_state();
    let (status, _) = send(gated(state), "/assets/app.css", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn query_string_does_not_affect_classification() {
    let (state, _) = crate::state::test_helpers::test_app_state();
    let (status, _) = send(gated(state), "/sign-in?error=auth_callback_error", None).await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// request logging
// =============================================================================

#[tokio::test]
async fn every_decision_is_logged_at_http_level() {
    let dir = temp_dir("log");
    let app = gated(state_logging_to(&dir));

    send(app.clone(), "/dashboard", None).await;
    send(app, "/", None).await;

    let entries = logged_entries(&dir);
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e["level"] == "http"));

    assert_eq!(entries[0]["meta"]["method"], "GET");
    assert_eq!(entries[0]["meta"]["path"], "/dashboard");
    assert_eq!(entries[0]["meta"]["decision"], "redirect_to_sign_in");
    assert!(entries[0]["meta"]["durationMs"].is_u64());
    assert!(
        entries[0]["message"]
            .as_str()
            .unwrap()
            .starts_with("[Request] GET /dashboard - ")
    );
    assert_eq!(entries[1]["meta"]["decision"], "allow");
    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn bypassed_paths_are_not_logged() {
    let dir = temp_dir("bypass");
    send(gated(state_logging_to(&dir)), "/assets/app.css", None).await;
    assert!(logged_entries(&dir).is_empty());
    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn http_entries_suppressed_below_threshold() {
    let dir = temp_dir("threshold");
    let logger = Logger::new(Level::Info, Some(FileSink::open(&dir).unwrap()));
    let state = AppState::new(Config::default(), logger, Arc::new(MockBackend::new(MockMode::Healthy)));
    send(gated(state), "/dashboard", None).await;
    assert!(logged_entries(&dir).is_empty());
    std::fs::remove_dir_all(&dir).ok();
}
