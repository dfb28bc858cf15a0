//! Unified error handling with Sentry integration.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::json;
use thiserror::Error;

use crate::platform::{PlatformError, UnknownPlatform};

/// Application-level error type for the controller API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Unknown platform in a status path.
    #[error(transparent)]
    NotFound(UnknownPlatform),

    /// Malformed request (unknown deploy target, bad body).
    #[error("{0}")]
    BadRequest(String),

    /// A sync run is already in flight.
    #[error("Sync already in progress")]
    SyncInProgress,

    /// The platform could not be reached or refused the call.
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::SyncInProgress => StatusCode::CONFLICT,
            Self::Platform(PlatformError::NotConfigured(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Platform(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = json!({
            "error": self.to_string(),
            "timestamp": Utc::now().to_rfc3339(),
        });
        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Platform;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound(UnknownPlatform("gke".to_owned()))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("Unknown platform: gke".to_owned())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(get_status(AppError::SyncInProgress), StatusCode::CONFLICT);
        assert_eq!(
            get_status(PlatformError::NotConfigured(Platform::Heroku).into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            get_status(
                PlatformError::Status {
                    platform: Platform::Heroku,
                    status: 500
                }
                .into()
            ),
            StatusCode::BAD_GATEWAY
        );
    }
}
