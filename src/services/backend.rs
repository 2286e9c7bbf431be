//! Identity/backend collaborator client.
//!
//! ARCHITECTURE
//! ============
//! Routes and the auth context talk to the collaborator through the
//! [`IdentityBackend`] trait. [`HttpBackend`] is the production `reqwest`
//! implementation; tests substitute an in-memory mock.
//!
//! Failures are classified so callers can tell a rejected credential
//! ([`BackendError::Authentication`]) from an unreachable service
//! ([`BackendError::Network`]). Pure parsing lives in `check_status` and
//! `error_message` for testability.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const HEALTH_TIMEOUT_SECS: u64 = 3;
const CONNECT_TIMEOUT_SECS: u64 = 3;
const DEFAULT_ERROR_MESSAGE: &str = "An error occurred";
const DEFAULT_AUTH_ERROR_MESSAGE: &str = "Invalid or expired token";

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// `BACKEND_API_URL` is not set.
    #[error("backend API URL is not configured")]
    Configuration,

    /// The collaborator rejected the credentials or token (401/403).
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The collaborator could not be reached or timed out.
    #[error("could not reach the backend API: {0}")]
    Network(String),

    /// Any other non-success status.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// A success response had an unexpected body.
    #[error("unexpected backend response: {0}")]
    Decode(String),

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl BackendError {
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds.
    pub expires_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInResponse {
    pub user: User,
    pub session: Session,
}

/// Body of sign-up and password-reset responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub session: Option<Session>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyTokenResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub user: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettingsBase {
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    pub id: String,
    #[serde(flatten)]
    pub settings: UserSettingsBase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Google,
    Github,
    Facebook,
}

impl AuthProvider {
    pub const ALL: [Self; 3] = [Self::Google, Self::Github, Self::Facebook];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Github => "github",
            Self::Facebook => "facebook",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "google" => Some(Self::Google),
            "github" => Some(Self::Github),
            "facebook" => Some(Self::Facebook),
            _ => None,
        }
    }
}

// =============================================================================
// TRAIT
// =============================================================================

/// Operations the identity/backend collaborator offers. Tokens are the
/// collaborator-issued access tokens carried in the session cookie.
#[async_trait::async_trait]
pub trait IdentityBackend: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SignInResponse, BackendError>;
    async fn sign_up(&self, email: &str, password: &str) -> Result<MessageResponse, BackendError>;
    async fn sign_out(&self, token: &str) -> Result<(), BackendError>;
    async fn reset_password(&self, email: &str) -> Result<MessageResponse, BackendError>;
    async fn change_password(&self, reset_token: &str, password: &str) -> Result<(), BackendError>;
    async fn verify_email(&self, token: &str) -> Result<(), BackendError>;
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, BackendError>;
    async fn verify_token(&self, token: &str) -> Result<VerifyTokenResponse, BackendError>;
    async fn exchange_code(&self, code: &str) -> Result<SignInResponse, BackendError>;
    async fn current_user(&self, token: &str) -> Result<User, BackendError>;
    async fn user_settings(&self, token: &str) -> Result<UserSettings, BackendError>;
    async fn update_user_settings(
        &self,
        token: &str,
        settings: &UserSettingsBase,
    ) -> Result<UserSettings, BackendError>;
    /// `true` if the health endpoint answers with a success status.
    async fn health(&self) -> bool;
    fn oauth_url(&self, provider: AuthProvider) -> Result<String, BackendError>;
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

pub struct HttpBackend {
    http: reqwest::Client,
    base_url: Option<String>,
}

impl HttpBackend {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: Option<String>, timeout_secs: u64) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| BackendError::HttpClientBuild(e.to_string()))?;
        let base_url = base_url.map(|url| url.trim_end_matches('/').to_owned());
        Ok(Self { http, base_url })
    }

    fn url(&self, path: &str) -> Result<String, BackendError> {
        let base = self
            .base_url
            .as_deref()
            .ok_or(BackendError::Configuration)?;
        Ok(format!("{base}{path}"))
    }

    /// `path` followed by `segment` as one percent-encoded path segment, so
    /// caller-supplied values cannot add segments or a query string.
    fn segment_url(&self, path: &str, segment: &str) -> Result<Url, BackendError> {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(BackendError::Authentication(DEFAULT_AUTH_ERROR_MESSAGE.to_owned()));
        }
        let mut url = Url::parse(&self.url(path)?).map_err(|_| BackendError::Configuration)?;
        url.path_segments_mut()
            .map_err(|()| BackendError::Configuration)?
            .push(segment);
        Ok(url)
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> Result<RequestBuilder, BackendError> {
        let url = Url::parse(&self.url(path)?).map_err(|_| BackendError::Configuration)?;
        Ok(self.request_url(method, url, token))
    }

    fn request_url(&self, method: Method, url: Url, token: Option<&str>) -> RequestBuilder {
        let mut req = self.http.request(method, url);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn fetch<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, BackendError> {
        let text = execute(req).await?;
        parse_body(&text)
    }
}

async fn execute(req: RequestBuilder) -> Result<String, BackendError> {
    let response = req.send().await.map_err(transport_error)?;
    let status = response.status().as_u16();
    let text = response.text().await.map_err(transport_error)?;
    check_status(status, &text)?;
    Ok(text)
}

fn transport_error(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Network("connection timed out".into())
    } else if e.is_decode() {
        BackendError::Decode(e.to_string())
    } else {
        BackendError::Network(e.to_string())
    }
}

/// Map a response status and body to an error, if the status is not 2xx.
pub(crate) fn check_status(status: u16, body: &str) -> Result<(), BackendError> {
    if (200..300).contains(&status) {
        return Ok(());
    }
    match status {
        401 | 403 => Err(BackendError::Authentication(
            error_message(body).unwrap_or_else(|| DEFAULT_AUTH_ERROR_MESSAGE.to_owned()),
        )),
        _ => Err(BackendError::Api {
            status,
            message: error_message(body).unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_owned()),
        }),
    }
}

/// Pull a human-readable message from an error body: `detail`, then `error`,
/// then `message`.
pub(crate) fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["detail", "error", "message"]
        .iter()
        .find_map(|key| value.get(key).and_then(serde_json::Value::as_str))
        .filter(|msg| !msg.is_empty())
        .map(str::to_owned)
}

pub(crate) fn parse_body<T: DeserializeOwned>(text: &str) -> Result<T, BackendError> {
    serde_json::from_str(text).map_err(|e| BackendError::Decode(e.to_string()))
}

#[async_trait::async_trait]
impl IdentityBackend for HttpBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SignInResponse, BackendError> {
        let req = self
            .request(Method::POST, "/api/v1/auth/sign-in", None)?
            .json(&serde_json::json!({ "email": email, "password": password }));
        self.fetch(req).await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<MessageResponse, BackendError> {
        let req = self
            .request(Method::POST, "/api/v1/auth/sign-up", None)?
            .json(&serde_json::json!({ "email": email, "password": password }));
        self.fetch(req).await
    }

    async fn sign_out(&self, token: &str) -> Result<(), BackendError> {
        let req = self.request(Method::POST, "/api/v1/auth/sign-out", Some(token))?;
        execute(req).await.map(drop)
    }

    async fn reset_password(&self, email: &str) -> Result<MessageResponse, BackendError> {
        let req = self
            .request(Method::POST, "/api/v1/auth/reset-password", None)?
            .json(&serde_json::json!({ "email": email }));
        self.fetch(req).await
    }

    async fn change_password(&self, reset_token: &str, password: &str) -> Result<(), BackendError> {
        let req = self
            .request(Method::POST, "/api/v1/auth/change-password", None)?
            .json(&serde_json::json!({ "token": reset_token, "password": password }));
        execute(req).await.map(drop)
    }

    async fn verify_email(&self, token: &str) -> Result<(), BackendError> {
        let url = self.segment_url("/api/v1/auth/verify-email", token)?;
        let req = self.request_url(Method::GET, url, None);
        execute(req).await.map(drop)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, BackendError> {
        let req = self
            .request(Method::POST, "/api/v1/auth/refresh", None)?
            .json(&serde_json::json!({ "refresh_token": refresh_token }));
        self.fetch(req).await
    }

    async fn verify_token(&self, token: &str) -> Result<VerifyTokenResponse, BackendError> {
        let req = self
            .request(Method::POST, "/api/v1/auth/verify-token", None)?
            .json(&serde_json::json!({ "token": token }));
        self.fetch(req).await
    }

    async fn exchange_code(&self, code: &str) -> Result<SignInResponse, BackendError> {
        let req = self
            .request(Method::POST, "/api/v1/auth/callback", None)?
            .json(&serde_json::json!({ "code": code }));
        self.fetch(req).await
    }

    async fn current_user(&self, token: &str) -> Result<User, BackendError> {
        let req = self.request(Method::GET, "/api/v1/users/me", Some(token))?;
        self.fetch(req).await
    }

    async fn user_settings(&self, token: &str) -> Result<UserSettings, BackendError> {
        let req = self.request(Method::GET, "/api/v1/users/me/settings", Some(token))?;
        self.fetch(req).await
    }

    async fn update_user_settings(
        &self,
        token: &str,
        settings: &UserSettingsBase,
    ) -> Result<UserSettings, BackendError> {
        let req = self
            .request(Method::PUT, "/api/v1/users/me/settings", Some(token))?
            .json(settings);
        self.fetch(req).await
    }

    async fn health(&self) -> bool {
        let Ok(req) = self.request(Method::GET, "/api/v1/health", None) else {
            return false;
        };
        match req.timeout(Duration::from_secs(HEALTH_TIMEOUT_SECS)).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn oauth_url(&self, provider: AuthProvider) -> Result<String, BackendError> {
        self.url(&format!("/auth/oauth/{}", provider.as_str()))
    }
}

#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;
