//! HTTP error mapping.
//!
//! Collaborator failures keep their category on the way out: a rejected
//! credential is a 401, an unreachable collaborator is a 503 with
//! `"API disconnected"` so clients do not prompt for re-login during an
//! outage, and a missing backend URL is a 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use crate::services::backend::BackendError;

pub const API_DISCONNECTED: &str = "API disconnected";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl AppError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Backend(e) => backend_status(e),
        }
    }

    /// Message safe to show to the end user.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Backend(BackendError::Network(_)) => API_DISCONNECTED.to_owned(),
            Self::Backend(BackendError::Authentication(msg)) => msg.clone(),
            Self::Backend(BackendError::Decode(_) | BackendError::HttpClientBuild(_)) => {
                "Unexpected response from the backend API".to_owned()
            }
            other => other.to_string(),
        }
    }
}

fn backend_status(e: &BackendError) -> StatusCode {
    match e {
        BackendError::Configuration | BackendError::HttpClientBuild(_) => StatusCode::INTERNAL_SERVER_ERROR,
        BackendError::Authentication(_) => StatusCode::UNAUTHORIZED,
        BackendError::Network(_) => StatusCode::SERVICE_UNAVAILABLE,
        BackendError::Api { status, .. } if (400..500).contains(status) => {
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
        }
        BackendError::Api { .. } | BackendError::Decode(_) => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, %status, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        (status, Json(serde_json::json!({ "error": self.public_message() }))).into_response()
    }
}
