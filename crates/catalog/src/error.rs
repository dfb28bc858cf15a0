//! Unified error handling with Sentry integration.
//!
//! All route handlers return `Result<T, AppError>`. Server errors are
//! captured to Sentry before the JSON error envelope is sent.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::response::ApiResponse;
use crate::services::CatalogError;

/// Application-level error type for the catalog service.
#[derive(Debug, Error)]
pub enum AppError {
    /// Catalog operation failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Bad request from client (malformed path, query or body).
    #[error("{0}")]
    BadRequest(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Catalog(CatalogError::NotFound | CatalogError::DealNotFound) => {
                StatusCode::NOT_FOUND
            }
            Self::Catalog(CatalogError::Validation(_) | CatalogError::Conflict(_))
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Catalog(CatalogError::Store { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
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

        // Don't expose internal error details to clients
        let message = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ApiResponse::error(message))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::RepositoryError;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::from(CatalogError::NotFound);
        assert_eq!(err.to_string(), "Product not found");

        let err = AppError::from(CatalogError::Conflict("SKU already exists".to_string()));
        assert_eq!(err.to_string(), "SKU already exists");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(CatalogError::NotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(CatalogError::DealNotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(CatalogError::Validation("bad".to_string()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(CatalogError::Conflict("dup".to_string()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(
                CatalogError::Store {
                    context: "fetching product",
                    source: RepositoryError::DataCorruption("bad row".to_string()),
                }
                .into()
            ),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
