//! Auth API routes: sign-in/up/out, password flows, OAuth, session refresh.
//!
//! Everything under `/api/auth/` is reachable without a session. Successful
//! sign-ins store the collaborator's access token in the session cookie (the
//! one the gate looks for) and the refresh token in a companion cookie.

use axum::extract::{FromRef, FromRequestParts, Path, Query, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::config::Config;
use crate::error::AppError;
use crate::gate::session;
use crate::services::auth_context::{MIN_PASSWORD_LEN, normalize_email, password_acceptable};
use crate::services::backend::{AuthProvider, BackendError, MessageResponse, Session, User};
use crate::state::AppState;

const REFRESH_COOKIE_SUFFIX: &str = "_refresh";

// =============================================================================
// COOKIES
// =============================================================================

#[must_use]
pub(crate) fn refresh_cookie_name(config: &Config) -> String {
    format!("{}{REFRESH_COOKIE_SUFFIX}", config.session_cookie)
}

fn base_cookie(config: &Config, name: String, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .build()
}

/// Store both tokens of `session`. The access-token cookie expires with the
/// session, immediately if the session is already over; the refresh cookie
/// is a browser-session cookie.
#[must_use]
pub(crate) fn store_session(config: &Config, jar: CookieJar, session: &Session) -> CookieJar {
    let mut access = base_cookie(config, config.session_cookie.clone(), session.access_token.clone());
    let remaining = session
        .expires_at
        .saturating_sub(OffsetDateTime::now_utc().unix_timestamp());
    access.set_max_age(Duration::seconds(remaining.max(0)));
    let refresh = base_cookie(config, refresh_cookie_name(config), session.refresh_token.clone());
    jar.add(access).add(refresh)
}

/// Store a bare access token (OAuth callback) with no known expiry.
#[must_use]
pub(crate) fn store_access_token(config: &Config, jar: CookieJar, token: String) -> CookieJar {
    jar.add(base_cookie(config, config.session_cookie.clone(), token))
}

#[must_use]
pub(crate) fn clear_session(config: &Config, jar: CookieJar) -> CookieJar {
    let mut access = base_cookie(config, config.session_cookie.clone(), String::new());
    access.set_max_age(Duration::ZERO);
    let mut refresh = base_cookie(config, refresh_cookie_name(config), String::new());
    refresh.set_max_age(Duration::ZERO);
    jar.add(access).add(refresh)
}

// =============================================================================
// SESSION EXTRACTOR
// =============================================================================

/// Access token from the session cookie. Use as a handler parameter on
/// routes that call the collaborator on the user's behalf.
pub struct SessionToken(pub String);

impl<S> FromRequestParts<S> for SessionToken
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        session::session_token(&jar, &app_state.config.session_cookie)
            .map(Self)
            .ok_or_else(|| BackendError::Authentication("Authentication required".into()).into())
    }
}

// =============================================================================
// REQUEST / RESPONSE BODIES
// =============================================================================

#[derive(Deserialize)]
pub struct Credentials {
    email: String,
    password: String,
}

#[derive(Deserialize)]
pub struct EmailBody {
    email: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordBody {
    token: String,
    password: String,
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
}

#[derive(Serialize)]
pub struct SignedIn {
    pub user: User,
    pub expires_at: i64,
}

fn validated_email(raw: &str) -> Result<String, AppError> {
    normalize_email(raw).ok_or_else(|| AppError::BadRequest("Please enter a valid email address".into()))
}

fn validated_password(password: &str) -> Result<(), AppError> {
    if password_acceptable(password) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("Password must be at least {MIN_PASSWORD_LEN} characters")))
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `POST /api/auth/sign-in`: authenticate and set session cookies.
pub async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<Credentials>,
) -> Result<(CookieJar, Json<SignedIn>), AppError> {
    let email = validated_email(&body.email)?;
    if body.password.is_empty() {
        return Err(AppError::BadRequest("Password is required".into()));
    }

    let response = state.auth.sign_in(&email, &body.password).await?;
    state
        .logger
        .info("user signed in", Some(&serde_json::json!({ "userId": response.user.id })));

    let jar = store_session(&state.config, jar, &response.session);
    Ok((jar, Json(SignedIn { expires_at: response.session.expires_at, user: response.user })))
}

/// `POST /api/auth/sign-up`: create an account; the collaborator sends the
/// confirmation email.
pub async fn sign_up(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = validated_email(&body.email)?;
    validated_password(&body.password)?;
    Ok(Json(state.auth.sign_up(&email, &body.password).await?))
}

/// `POST /api/auth/sign-out`: best-effort collaborator sign-out, then clear
/// cookies regardless of the outcome.
pub async fn sign_out(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    end_session(&state, &jar).await;
    (clear_session(&state.config, jar), StatusCode::NO_CONTENT)
}

pub(crate) async fn end_session(state: &AppState, jar: &CookieJar) {
    let Some(token) = session::session_token(jar, &state.config.session_cookie) else {
        return;
    };
    if let Err(e) = state.auth.sign_out(&token).await {
        state
            .logger
            .warn("collaborator sign-out failed", Some(&serde_json::json!({ "error": e.to_string() })));
    }
}

/// `POST /api/auth/reset-password`: request a reset email.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<EmailBody>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = validated_email(&body.email)?;
    Ok(Json(state.auth.reset_password(&email).await?))
}

/// `POST /api/auth/change-password`: set a new password with a reset token.
pub async fn change_password(
    State(state): State<AppState>,
    Json(body): Json<ChangePasswordBody>,
) -> Result<StatusCode, AppError> {
    if body.token.is_empty() {
        return Err(AppError::BadRequest("Reset token is required".into()));
    }
    validated_password(&body.password)?;
    state
        .auth
        .change_password(&body.token, &body.password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/auth/verify-email/{token}`.
pub async fn verify_email(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.auth.verify_email(&token).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// `POST /api/auth/refresh`: trade the refresh cookie for a new session.
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<serde_json::Value>), AppError> {
    let refresh_token = session::session_token(&jar, &refresh_cookie_name(&state.config))
        .ok_or_else(|| AppError::from(BackendError::Authentication("No refresh token".into())))?;

    let session = state.auth.refresh(&refresh_token).await?;
    let jar = store_session(&state.config, jar, &session);
    Ok((jar, Json(serde_json::json!({ "expires_at": session.expires_at }))))
}

/// `GET /api/auth/oauth/{provider}`: hand the browser to the collaborator's
/// OAuth entry point.
pub async fn oauth_redirect(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> Result<Redirect, AppError> {
    let provider =
        AuthProvider::parse(&provider).ok_or_else(|| AppError::BadRequest(format!("unsupported provider: {provider}")))?;
    let url = state.auth.social_sign_in_url(provider)?;
    Ok(Redirect::temporary(&url))
}

/// `GET /api/auth/callback?code=`: exchange an OAuth code, set cookies and
/// go home. Failures land on the sign-in screen with an error tag.
pub async fn oauth_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackQuery>,
) -> Response {
    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return Redirect::temporary("/").into_response();
    };

    match state.auth.complete_oauth(&code).await {
        Ok(response) => {
            let jar = store_session(&state.config, jar, &response.session);
            (jar, Redirect::temporary("/")).into_response()
        }
        Err(BackendError::Configuration) => {
            state.logger.error("missing backend configuration for OAuth callback", None);
            Redirect::temporary("/sign-in?error=server_configuration_error").into_response()
        }
        Err(e) => {
            state.logger.error(
                "error exchanging code for session",
                Some(&serde_json::json!({ "error": e.to_string() })),
            );
            Redirect::temporary("/sign-in?error=auth_callback_error").into_response()
        }
    }
}

/// `GET /api/auth/status`: probe the collaborator and report reachability.
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    state.auth.check_api_connection().await;
    Json(state.auth.api_status())
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
