//! JSON response envelope shared by every catalog endpoint.

use serde::{Deserialize, Serialize};

/// `{success, data?, count?, message?, error?}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// A successful response carrying `data`.
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            count: None,
            message: None,
            error: None,
        }
    }

    /// A successful response with a human-readable message.
    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::ok(data)
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// A successful list response; `count` is the number of items.
    pub fn list(items: Vec<T>) -> Self {
        Self {
            count: Some(items.len()),
            ..Self::ok(items)
        }
    }
}

impl ApiResponse<()> {
    /// A failed response.
    pub fn error(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            count: None,
            message: None,
            error: Some(error.into()),
        }
    }
}
