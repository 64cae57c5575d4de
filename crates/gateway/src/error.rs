//! Unified error handling for the gateway's JSON routes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::models::SessionError;
use crate::platform::PlatformError;

/// Application-level error type for the gateway.
#[derive(Debug, Error)]
pub enum AppError {
    /// Upstream platform operation failed.
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Session store operation failed.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// No platform login in the current session.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Platform(PlatformError::ConfigurationMissing(_)) | Self::Session(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Platform(_) => StatusCode::BAD_GATEWAY,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Gateway request error"
            );
        }

        // Don't expose internal error details to clients
        let body = match &self {
            Self::Platform(PlatformError::AllEndpointsFailed { diagnostics }) => json!({
                "error": self.to_string(),
                "diagnostics": diagnostics,
            }),
            Self::Platform(PlatformError::ConfigurationMissing(_)) | Self::Session(_) => {
                json!({ "error": "Internal server error" })
            }
            Self::Platform(_) => json!({ "error": "External service error" }),
            Self::Unauthorized(_) => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
