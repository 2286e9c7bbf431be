//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One Axum router carries the page routes, the auth API, the protected user
//! API and static assets. The session gate wraps all of it; assets and
//! `/healthz` pass the gate untouched.

pub mod auth;
pub mod pages;
pub mod users;

use axum::Router;
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::gate;
use crate::state::AppState;

fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::landing))
        .route("/sign-in", get(pages::sign_in_page))
        .route("/sign-up", get(pages::sign_up_page))
        .route("/sign-out", get(pages::sign_out_page))
        .route("/dashboard", get(pages::dashboard))
        .route("/auth/callback", get(pages::auth_callback_page))
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/sign-in", post(auth::sign_in))
        .route("/api/auth/sign-up", post(auth::sign_up))
        .route("/api/auth/sign-out", post(auth::sign_out))
        .route("/api/auth/reset-password", post(auth::reset_password))
        .route("/api/auth/change-password", post(auth::change_password))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/auth/verify-email/{token}", get(auth::verify_email))
        .route("/api/auth/oauth/{provider}", get(auth::oauth_redirect))
        .route("/api/auth/callback", get(auth::oauth_callback))
        .route("/api/auth/status", get(auth::status))
        .route("/api/users/me", get(users::me))
        .route("/api/users/me/settings", get(users::settings).put(users::update_settings))
}

/// Full application router with the session gate installed.
pub fn app(state: AppState) -> Router {
    let assets = ServeDir::new(&state.config.static_dir);

    page_routes()
        .merge(api_routes())
        .route("/healthz", get(healthz))
        .nest_service("/assets", assets)
        .layer(middleware::from_fn_with_state(state.clone(), gate::session_gate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
