//! HTTP clients for the services behind the storefront.
//!
//! # Architecture
//!
//! - One `reqwest::Client` shared by every service client (JSON headers,
//!   per-request timeout from config)
//! - Each client method performs exactly one HTTP call and returns
//!   `Result<T, ApiError>`; failures are logged where they happen
//! - Product lookups are cached in-memory via `moka` (5 minute TTL)
//!
//! # Example
//!
//! ```rust,ignore
//! use techmart_storefront::{StorefrontApi, StorefrontConfig};
//!
//! let api = StorefrontApi::new(&StorefrontConfig::from_env()?)?;
//! let session = api.users.login("ada@techmart.io", password).await?;
//! let cart = api.cart.get_cart(session.user_id(), session.token()).await?;
//! ```

pub mod cart;
pub mod deals;
pub mod orders;
pub mod products;
pub mod search;
pub mod users;

use std::sync::Arc;

use reqwest::RequestBuilder;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use crate::config::StorefrontConfig;
use crate::error::ApiError;

pub use cart::{CartApi, CartClient};
pub use deals::DealsClient;
pub use orders::OrdersClient;
pub use products::ProductsClient;
pub use search::SearchClient;
pub use users::UsersClient;

/// Longest response body excerpt written to logs.
const LOG_BODY_LIMIT: usize = 500;

/// All storefront service clients, sharing one connection pool.
#[derive(Clone)]
pub struct StorefrontApi {
    pub products: ProductsClient,
    pub cart: CartClient,
    pub orders: OrdersClient,
    pub users: UsersClient,
    pub search: SearchClient,
    pub deals: DealsClient,
}

impl StorefrontApi {
    /// Build every client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Transport` if the HTTP client cannot be built.
    pub fn new(config: &StorefrontConfig) -> Result<Self, ApiError> {
        let http = http_client(config)?;
        Ok(Self {
            products: ProductsClient::new(http.clone(), &config.products_url),
            cart: CartClient::new(http.clone(), &config.cart_url),
            orders: OrdersClient::new(http.clone(), &config.orders_url),
            users: UsersClient::new(http.clone(), &config.users_url),
            search: SearchClient::new(http.clone(), &config.search_url),
            deals: DealsClient::new(http, &config.deals_url),
        })
    }
}

/// The shared HTTP client: JSON in and out, bounded by the configured timeout.
///
/// # Errors
///
/// Returns `ApiError::Transport` if the TLS backend fails to initialize.
pub fn http_client(config: &StorefrontConfig) -> Result<reqwest::Client, ApiError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    Ok(reqwest::Client::builder()
        .default_headers(headers)
        .timeout(config.request_timeout)
        .build()?)
}

/// One service's base URL plus the shared client.
#[derive(Clone)]
pub(crate) struct ServiceClient {
    http: reqwest::Client,
    base: Arc<str>,
    service: &'static str,
}

impl ServiceClient {
    pub(crate) fn new(http: reqwest::Client, base_url: &str, service: &'static str) -> Self {
        Self {
            http,
            base: Arc::from(base_url.trim().trim_end_matches('/')),
            service,
        }
    }

    /// Join a path onto the base URL. An empty path (or a bare `?query`)
    /// addresses the base itself; `"/"` addresses it with a trailing slash.
    pub(crate) fn url(&self, path: &str) -> String {
        if path.is_empty() || path.starts_with('?') {
            format!("{}{path}", self.base)
        } else {
            format!("{}/{}", self.base, path.trim_start_matches('/'))
        }
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.http.get(self.url(path))
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.http.post(self.url(path))
    }

    pub(crate) fn put(&self, path: &str) -> RequestBuilder {
        self.http.put(self.url(path))
    }

    pub(crate) fn delete(&self, path: &str) -> RequestBuilder {
        self.http.delete(self.url(path))
    }

    /// Send and decode a JSON body.
    pub(crate) async fn json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let body = self.text(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                service = self.service,
                error = %e,
                body = %excerpt(&body),
                "Failed to decode service response"
            );
            ApiError::Decode(e)
        })
    }

    /// Send and return the raw body of a successful response.
    pub(crate) async fn text(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await.map_err(|e| {
            tracing::error!(service = self.service, error = %e, "Request failed");
            ApiError::Transport(e)
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::error!(service = self.service, %status, error = %e, "Failed to read response body");
            ApiError::Transport(e)
        })?;

        if !status.is_success() {
            tracing::error!(
                service = self.service,
                %status,
                body = %excerpt(&body),
                "Service returned non-success status"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

/// Attach a bearer token.
pub(crate) fn authorized(request: RequestBuilder, token: &SecretString) -> RequestBuilder {
    request.bearer_auth(token.expose_secret())
}

/// Percent-encode query pairs into `k=v&k=v`.
pub(crate) fn query_string<K: AsRef<str>, V: AsRef<str>>(pairs: &[(K, V)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                urlencoding::encode(k.as_ref()),
                urlencoding::encode(v.as_ref())
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// `path?query`, or just `path` when there is nothing to add.
pub(crate) fn with_query<K: AsRef<str>, V: AsRef<str>>(path: &str, pairs: &[(K, V)]) -> String {
    if pairs.is_empty() {
        path.to_owned()
    } else {
        format!("{path}?{}", query_string(pairs))
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(LOG_BODY_LIMIT).collect()
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ServiceClient {
        ServiceClient::new(reqwest::Client::new(), base, "test")
    }

    #[test]
    fn test_url_joining() {
        let cart = client("http://localhost:8080/api/cart/");
        assert_eq!(cart.url(""), "http://localhost:8080/api/cart");
        assert_eq!(cart.url("/"), "http://localhost:8080/api/cart/");
        assert_eq!(cart.url("items/7"), "http://localhost:8080/api/cart/items/7");
        assert_eq!(cart.url("/summary"), "http://localhost:8080/api/cart/summary");
        assert_eq!(cart.url("?page=2"), "http://localhost:8080/api/cart?page=2");
    }

    #[test]
    fn test_query_string_encodes() {
        assert_eq!(
            query_string(&[("search", "usb c"), ("brand", "A&B")]),
            "search=usb%20c&brand=A%26B"
        );
        assert_eq!(with_query::<&str, &str>("stats", &[]), "stats");
        assert_eq!(with_query("", &[("limit", "5")]), "?limit=5");
    }

    #[tokio::test]
    async fn test_non_success_status_is_returned_with_body() {
        use axum::{Router, http::StatusCode, routing::get};

        let router = Router::new().route(
            "/boom",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down for maintenance") }),
        );
        let base = test_support::serve(router).await;
        let service = ServiceClient::new(test_support::http(), &base, "test");

        let err = service.text(service.get("boom")).await.unwrap_err();
        match err {
            ApiError::Status { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "down for maintenance");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_undecodable_body_is_decode_error() {
        use axum::{Router, routing::get};

        let router = Router::new().route("/text", get(|| async { "not json" }));
        let base = test_support::serve(router).await;
        let service = ServiceClient::new(test_support::http(), &base, "test");

        let err = service
            .json::<serde_json::Value>(service.get("text"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
