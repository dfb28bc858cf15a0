//! Client error type.

use thiserror::Error;

/// Errors returned by the storefront API clients.
///
/// Every failure is logged where it happens and then returned, so a caller
/// always sees the outcome.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("{status} returned by service: {body}")]
    Status { status: u16, body: String },

    /// The response body did not have the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The service answered 2xx but flagged the request as unsuccessful.
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// The operation needs a logged-in user.
    #[error("User must be logged in")]
    NotAuthenticated,

    /// The call was refused before reaching the network.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ApiError {
    /// HTTP status of a `Status` error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }

    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::NotAuthenticated | Self::Status { status: 401 | 403, .. }
        )
    }
}
