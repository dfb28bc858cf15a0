//! Rate limiting using governor and `tower_governor`.
//!
//! One limiter for the whole API: 100 requests per 15 minutes per client IP.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use thiserror::Error;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Requests allowed per window.
pub const REQUESTS_PER_WINDOW: u32 = 100;

/// Length of the rate limit window.
pub const WINDOW: Duration = Duration::from_secs(15 * 60);

/// Client IP from proxy headers, falling back to the peer address.
///
/// The peer address needs the server started with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let headers = req.headers();

        // First hop of X-Forwarded-For
        if let Some(ip) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
        {
            return Ok(ip);
        }

        if let Some(ip) = headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
        {
            return Ok(ip);
        }

        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

#[derive(Debug, Error)]
#[error("rate limiter configuration rejected")]
pub struct RateLimitConfigError;

/// A full bucket of 100 requests, refilled one request every 9 seconds.
///
/// # Errors
///
/// Returns `RateLimitConfigError` if governor rejects the quota.
pub fn api_rate_limiter() -> Result<RateLimiterLayer, RateLimitConfigError> {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .period(WINDOW / REQUESTS_PER_WINDOW)
        .burst_size(REQUESTS_PER_WINDOW)
        .finish()
        .ok_or(RateLimitConfigError)?;
    Ok(GovernorLayer::new(Arc::new(config)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    fn request(headers: &[(&str, &str)]) -> Request<()> {
        let mut builder = Request::get("/api/status/all");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap()
    }

    #[test]
    fn test_forwarded_for_first_hop_wins() {
        let req = request(&[
            ("x-forwarded-for", "203.0.113.7, 10.0.0.1"),
            ("x-real-ip", "198.51.100.1"),
        ]);
        let ip = ClientIpKeyExtractor.extract(&req).unwrap();
        assert_eq!(ip.to_string(), "203.0.113.7");
    }

    #[test]
    fn test_falls_back_to_peer_address() {
        let mut req = request(&[("x-forwarded-for", "garbage")]);
        let peer: SocketAddr = "192.0.2.9:50000".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(peer));
        assert_eq!(
            ClientIpKeyExtractor.extract(&req).unwrap(),
            peer.ip()
        );

        assert!(ClientIpKeyExtractor.extract(&request(&[])).is_err());
    }

    #[test]
    fn test_quota_is_valid() {
        assert_eq!(WINDOW / REQUESTS_PER_WINDOW, Duration::from_secs(9));
        assert!(api_rate_limiter().is_ok());
    }
}
