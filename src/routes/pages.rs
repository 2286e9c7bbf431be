//! Page routes. Rendering is out of scope; each screen answers with a small
//! JSON description of what it would show.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::json;

use super::auth::{SessionToken, clear_session, end_session, store_access_token};
use crate::error::AppError;
use crate::gate::policy::{DASHBOARD_PATH, SIGN_IN_PATH};
use crate::services::backend::{AuthProvider, BackendError};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SignInQuery {
    error: Option<String>,
}

#[derive(Deserialize)]
pub struct TokenQuery {
    token: Option<String>,
}

fn providers() -> Vec<&'static str> {
    AuthProvider::ALL.iter().map(|p| p.as_str()).collect()
}

/// `GET /`
pub async fn landing(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "screen": "landing",
        "links": { "signIn": SIGN_IN_PATH, "signUp": "/sign-up" },
        "api": state.auth.api_status(),
    }))
}

/// `GET /sign-in`; echoes `?error=` from a failed OAuth callback.
pub async fn sign_in_page(Query(query): Query<SignInQuery>) -> Json<serde_json::Value> {
    Json(json!({
        "screen": "sign-in",
        "error": query.error,
        "providers": providers(),
    }))
}

/// `GET /sign-up`
pub async fn sign_up_page() -> Json<serde_json::Value> {
    Json(json!({ "screen": "sign-up", "providers": providers() }))
}

/// `GET /dashboard`. A cookie the collaborator no longer accepts is cleared
/// and the browser sent to sign in; an outage keeps the cookie.
pub async fn dashboard(State(state): State<AppState>, jar: CookieJar, SessionToken(token): SessionToken) -> Response {
    match state.auth.current_user(&token).await {
        Ok(user) => Json(json!({ "screen": "dashboard", "user": user })).into_response(),
        Err(BackendError::Authentication(_)) => {
            (clear_session(&state.config, jar), Redirect::temporary(SIGN_IN_PATH)).into_response()
        }
        Err(e) => AppError::from(e).into_response(),
    }
}

/// `GET /sign-out`: always ends at the sign-in screen.
pub async fn sign_out_page(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    end_session(&state, &jar).await;
    (clear_session(&state.config, jar), Redirect::temporary(SIGN_IN_PATH))
}

/// `GET /auth/callback?token=`: verify the token an OAuth provider flow
/// handed back and adopt it as the session.
pub async fn auth_callback_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<TokenQuery>,
) -> Response {
    let Some(token) = query.token.filter(|t| !t.is_empty()) else {
        return callback_failure(StatusCode::BAD_REQUEST, "No token provided.");
    };

    match state.auth.verify_callback_token(&token).await {
        Ok(_) => (store_access_token(&state.config, jar, token), Redirect::temporary(DASHBOARD_PATH)).into_response(),
        Err(e) => {
            state
                .logger
                .error("auth callback verification failed", Some(&json!({ "error": e.to_string() })));
            let err = AppError::from(e);
            callback_failure(err.status(), &err.public_message())
        }
    }
}

fn callback_failure(status: StatusCode, reason: &str) -> Response {
    let body = json!({ "status": "error", "message": format!("Authentication failed: {reason}") });
    (status, Json(body)).into_response()
}
