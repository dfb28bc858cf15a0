//! HTTP middleware stack for the controller.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. Rate limiting (100 requests per 15 minutes per client IP)
//! 3. `TraceLayer` (request tracing, span carries `request_id`)
//! 4. Request ID
//! 5. Security headers
//! 6. CORS

pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};

pub use rate_limit::{RateLimitConfigError, api_rate_limiter};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use security_headers::security_headers_middleware;

/// CORS for the dashboard origins, with credentials. Invalid origins are
/// skipped with a warning.
#[must_use]
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin)
                .inspect_err(|_| tracing::warn!(%origin, "Ignoring invalid CORS origin"))
                .ok()
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}
