//! Auth context: the one place routes go through to reach the identity
//! collaborator.
//!
//! ARCHITECTURE
//! ============
//! An `AuthContext` is created once in `main`, stored in `AppState`, and
//! lives for the whole process. It wraps an [`IdentityBackend`] and tracks
//! two pieces of shared state:
//!
//! - API status (`watch` channel): whether the collaborator was reachable on
//!   the last call. Only network failures mark it down; a rejected credential
//!   says nothing about reachability.
//! - Auth events (`broadcast` channel): sign-in, sign-out, refresh and status
//!   flips. Subscribers hold an [`AuthSubscription`]; dropping it
//!   unsubscribes.
//!
//! Per-user state (user, session tokens) is never stored here. It travels in
//! the session cookie and in the values returned to the caller.

use std::sync::Arc;

use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::sync::{broadcast, watch};

use super::backend::{
    AuthProvider, BackendError, IdentityBackend, MessageResponse, Session, SignInResponse, User, UserSettings,
    UserSettingsBase, VerifyTokenResponse,
};

const EVENT_CHANNEL_CAPACITY: usize = 64;
pub const MIN_PASSWORD_LEN: usize = 8;

// =============================================================================
// STATE TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiStatus {
    pub is_up: bool,
    /// RFC 3339 time of the last observation; `None` before the first call.
    pub last_checked: Option<String>,
}

impl Default for ApiStatus {
    fn default() -> Self {
        Self { is_up: true, last_checked: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn { user_id: String },
    SignedOut,
    SessionRefreshed,
    ApiStatusChanged { is_up: bool },
}

/// Live subscription to [`AuthEvent`]s. Dropping it unsubscribes.
pub struct AuthSubscription {
    rx: broadcast::Receiver<AuthEvent>,
}

impl AuthSubscription {
    /// Wait for the next event. Returns `None` once the context is gone.
    /// Events missed because the subscriber fell behind are skipped.
    pub async fn recv(&mut self) -> Option<AuthEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "auth subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking poll for a pending event.
    pub fn try_recv(&mut self) -> Option<AuthEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => {}
                Err(_) => return None,
            }
        }
    }
}

// =============================================================================
// INPUT VALIDATION
// =============================================================================

/// Trim and lowercase an email; `None` unless it has exactly one `@` with
/// non-empty local and domain parts.
#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    let (local, domain) = normalized.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return None;
    }
    Some(normalized)
}

#[must_use]
pub fn password_acceptable(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}

// =============================================================================
// CONTEXT
// =============================================================================

#[derive(Clone)]
pub struct AuthContext {
    inner: Arc<Inner>,
}

struct Inner {
    backend: Arc<dyn IdentityBackend>,
    status: watch::Sender<ApiStatus>,
    events: broadcast::Sender<AuthEvent>,
}

impl AuthContext {
    #[must_use]
    pub fn new(backend: Arc<dyn IdentityBackend>) -> Self {
        let (status, _) = watch::channel(ApiStatus::default());
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { inner: Arc::new(Inner { backend, status, events }) }
    }

    #[must_use]
    pub fn api_status(&self) -> ApiStatus {
        self.inner.status.borrow().clone()
    }

    #[must_use]
    pub fn watch_api_status(&self) -> watch::Receiver<ApiStatus> {
        self.inner.status.subscribe()
    }

    #[must_use]
    pub fn subscribe(&self) -> AuthSubscription {
        AuthSubscription { rx: self.inner.events.subscribe() }
    }

    fn publish(&self, event: AuthEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }

    fn set_api_up(&self, is_up: bool) {
        let last_checked = OffsetDateTime::now_utc().format(&Rfc3339).ok();
        let previous = self
            .inner
            .status
            .send_replace(ApiStatus { is_up, last_checked });
        if previous.is_up != is_up {
            tracing::info!(is_up, "backend API status changed");
            self.publish(AuthEvent::ApiStatusChanged { is_up });
        }
    }

    /// Record what a collaborator call says about reachability.
    fn observe<T>(&self, result: Result<T, BackendError>) -> Result<T, BackendError> {
        match &result {
            Ok(_) => self.set_api_up(true),
            Err(e) if e.is_network() => self.set_api_up(false),
            Err(_) => {}
        }
        result
    }

    // -------------------------------------------------------------------------
    // Operations
    // -------------------------------------------------------------------------

    /// # Errors
    ///
    /// Propagates collaborator failures.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignInResponse, BackendError> {
        let response = self.observe(self.inner.backend.sign_in(email, password).await)?;
        self.publish(AuthEvent::SignedIn { user_id: response.user.id.clone() });
        Ok(response)
    }

    /// # Errors
    ///
    /// Propagates collaborator failures.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<MessageResponse, BackendError> {
        self.observe(self.inner.backend.sign_up(email, password).await)
    }

    /// Publishes `SignedOut` even when the collaborator call fails, since the
    /// caller clears the cookie either way.
    ///
    /// # Errors
    ///
    /// Propagates collaborator failures.
    pub async fn sign_out(&self, token: &str) -> Result<(), BackendError> {
        let result = self.observe(self.inner.backend.sign_out(token).await);
        self.publish(AuthEvent::SignedOut);
        result
    }

    /// # Errors
    ///
    /// Propagates collaborator failures.
    pub async fn reset_password(&self, email: &str) -> Result<MessageResponse, BackendError> {
        self.observe(self.inner.backend.reset_password(email).await)
    }

    /// # Errors
    ///
    /// Propagates collaborator failures.
    pub async fn change_password(&self, reset_token: &str, password: &str) -> Result<(), BackendError> {
        self.observe(
            self.inner
                .backend
                .change_password(reset_token, password)
                .await,
        )
    }

    /// # Errors
    ///
    /// Propagates collaborator failures.
    pub async fn verify_email(&self, token: &str) -> Result<(), BackendError> {
        self.observe(self.inner.backend.verify_email(token).await)
    }

    /// Exchange a refresh token for a new session.
    ///
    /// # Errors
    ///
    /// Returns `Authentication` when the collaborator answers without a
    /// session.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Session, BackendError> {
        let response = self.observe(self.inner.backend.refresh(refresh_token).await)?;
        match response.session {
            Some(session) if response.success => {
                self.publish(AuthEvent::SessionRefreshed);
                Ok(session)
            }
            _ => Err(BackendError::Authentication(
                response
                    .error
                    .unwrap_or_else(|| "Could not refresh session".into()),
            )),
        }
    }

    /// Verify the token handed back by an OAuth redirect.
    ///
    /// # Errors
    ///
    /// Returns `Authentication` when the collaborator reports failure.
    pub async fn verify_callback_token(&self, token: &str) -> Result<VerifyTokenResponse, BackendError> {
        let response = self.observe(self.inner.backend.verify_token(token).await)?;
        if !response.success {
            return Err(BackendError::Authentication(
                response
                    .error
                    .unwrap_or_else(|| "Unknown error".into()),
            ));
        }
        Ok(response)
    }

    /// Exchange an OAuth authorization code for a session.
    ///
    /// # Errors
    ///
    /// Propagates collaborator failures.
    pub async fn complete_oauth(&self, code: &str) -> Result<SignInResponse, BackendError> {
        let response = self.observe(self.inner.backend.exchange_code(code).await)?;
        self.publish(AuthEvent::SignedIn { user_id: response.user.id.clone() });
        Ok(response)
    }

    /// # Errors
    ///
    /// Propagates collaborator failures.
    pub async fn current_user(&self, token: &str) -> Result<User, BackendError> {
        self.observe(self.inner.backend.current_user(token).await)
    }

    /// # Errors
    ///
    /// Propagates collaborator failures.
    pub async fn user_settings(&self, token: &str) -> Result<UserSettings, BackendError> {
        self.observe(self.inner.backend.user_settings(token).await)
    }

    /// # Errors
    ///
    /// Propagates collaborator failures.
    pub async fn update_user_settings(
        &self,
        token: &str,
        settings: &UserSettingsBase,
    ) -> Result<UserSettings, BackendError> {
        self.observe(
            self.inner
                .backend
                .update_user_settings(token, settings)
                .await,
        )
    }

    /// URL that starts the collaborator's OAuth flow for `provider`.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the backend URL is unset.
    pub fn social_sign_in_url(&self, provider: AuthProvider) -> Result<String, BackendError> {
        self.inner.backend.oauth_url(provider)
    }

    /// Probe the collaborator's health endpoint and record the result.
    pub async fn check_api_connection(&self) -> bool {
        let is_up = self.inner.backend.health().await;
        self.set_api_up(is_up);
        is_up
    }
}

#[cfg(test)]
#[path = "auth_context_test.rs"]
mod tests;
