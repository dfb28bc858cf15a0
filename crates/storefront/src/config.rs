//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `PRODUCTS_URL_BASE` - Catalog service base URL
//! - `CART_URL_BASE` - Cart service base URL
//! - `ORDERS_URL_BASE` - Order service base URL
//! - `USERS_URL_BASE` - User service base URL
//! - `SEARCH_URL_BASE` - Search service base URL
//! - `DEALS_URL_BASE` - Catalog deals base URL
//! - `REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 10)
//!
//! Every URL defaults to the local API gateway on port 8080.

use std::time::Duration;

use thiserror::Error;

const DEFAULT_PRODUCTS_URL: &str = "http://localhost:8080/api/products";
const DEFAULT_CART_URL: &str = "http://localhost:8080/api/cart";
const DEFAULT_ORDERS_URL: &str = "http://localhost:8080/api/orders";
const DEFAULT_USERS_URL: &str = "http://localhost:8080/api/users";
const DEFAULT_SEARCH_URL: &str = "http://localhost:8080/api/search";
const DEFAULT_DEALS_URL: &str = "http://localhost:8080/api/deals";

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Base URLs of the services the storefront talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontConfig {
    pub products_url: String,
    pub cart_url: String,
    pub orders_url: String,
    pub users_url: String,
    pub search_url: String,
    pub deals_url: String,
    pub request_timeout: Duration,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            products_url: DEFAULT_PRODUCTS_URL.to_owned(),
            cart_url: DEFAULT_CART_URL.to_owned(),
            orders_url: DEFAULT_ORDERS_URL.to_owned(),
            users_url: DEFAULT_USERS_URL.to_owned(),
            search_url: DEFAULT_SEARCH_URL.to_owned(),
            deals_url: DEFAULT_DEALS_URL.to_owned(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a URL is not absolute http(s) or the timeout
    /// is not a positive number of seconds.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let request_timeout = match std::env::var("REQUEST_TIMEOUT_SECS") {
            Ok(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidEnvVar(
                        "REQUEST_TIMEOUT_SECS".to_string(),
                        format!("expected a positive integer, got {raw:?}"),
                    ));
                }
            },
            Err(_) => DEFAULT_REQUEST_TIMEOUT,
        };

        Ok(Self {
            products_url: get_url("PRODUCTS_URL_BASE", DEFAULT_PRODUCTS_URL)?,
            cart_url: get_url("CART_URL_BASE", DEFAULT_CART_URL)?,
            orders_url: get_url("ORDERS_URL_BASE", DEFAULT_ORDERS_URL)?,
            users_url: get_url("USERS_URL_BASE", DEFAULT_USERS_URL)?,
            search_url: get_url("SEARCH_URL_BASE", DEFAULT_SEARCH_URL)?,
            deals_url: get_url("DEALS_URL_BASE", DEFAULT_DEALS_URL)?,
            request_timeout,
        })
    }
}

fn get_url(key: &str, default: &str) -> Result<String, ConfigError> {
    let Ok(value) = std::env::var(key) else {
        return Ok(default.to_owned());
    };
    validate_base_url(&value)
        .map_err(|reason| ConfigError::InvalidEnvVar(key.to_string(), reason))
}

/// Normalize a base URL: trimmed, no trailing slash, http or https.
pub(crate) fn validate_base_url(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_owned())
    } else {
        Err(format!("expected an http(s) URL, got {raw:?}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_point_at_local_gateway() {
        let config = StorefrontConfig::default();
        assert_eq!(config.products_url, "http://localhost:8080/api/products");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_validate_base_url() {
        assert_eq!(
            validate_base_url(" https://cart.techmart.io/api/cart/ ").unwrap(),
            "https://cart.techmart.io/api/cart"
        );
        assert!(validate_base_url("cart.techmart.io").is_err());
        assert!(validate_base_url("").is_err());
    }
}
