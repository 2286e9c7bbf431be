//! Protected user API: profile and settings, forwarded to the collaborator
//! with the session cookie's token.

use axum::extract::State;
use axum::response::Json;

use super::auth::SessionToken;
use crate::error::AppError;
use crate::services::backend::{User, UserSettings, UserSettingsBase};
use crate::state::AppState;

/// `GET /api/users/me`
pub async fn me(State(state): State<AppState>, SessionToken(token): SessionToken) -> Result<Json<User>, AppError> {
    Ok(Json(state.auth.current_user(&token).await?))
}

/// `GET /api/users/me/settings`
pub async fn settings(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
) -> Result<Json<UserSettings>, AppError> {
    Ok(Json(state.auth.user_settings(&token).await?))
}

/// `PUT /api/users/me/settings`
pub async fn update_settings(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    Json(body): Json<UserSettingsBase>,
) -> Result<Json<UserSettings>, AppError> {
    Ok(Json(state.auth.update_user_settings(&token, &body).await?))
}
