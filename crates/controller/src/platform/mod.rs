//! Hosting platforms the controller watches and syncs.
//!
//! Each platform sits behind the [`PlatformClient`] trait so the scheduler
//! and the HTTP API can be driven by fakes in tests.

mod http;

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

pub use http::HttpPlatform;

/// A hosting platform running part of TechMart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Vercel,
    Heroku,
    Render,
}

impl Platform {
    pub const ALL: [Self; 3] = [Self::Vercel, Self::Heroku, Self::Render];

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Vercel => "Vercel",
            Self::Heroku => "Heroku",
            Self::Render => "Render",
        }
    }

    /// Path segment and environment variable prefix.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Vercel => "vercel",
            Self::Heroku => "heroku",
            Self::Render => "render",
        }
    }

    /// What TechMart runs there.
    #[must_use]
    pub const fn hosts(self) -> &'static str {
        match self {
            Self::Vercel => "Frontend (TechMart UI)",
            Self::Heroku => "Product and cart services",
            Self::Render => "Search service",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a path names a platform the controller does not know.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown platform: {0}")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.slug().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownPlatform(s.to_owned()))
    }
}

/// Errors from talking to a platform.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The request never produced a response (connect failure, timeout).
    #[error("{platform} request failed")]
    Transport {
        platform: Platform,
        #[source]
        source: reqwest::Error,
    },

    /// The platform answered with a non-success status.
    #[error("{platform} answered HTTP {status}")]
    Status { platform: Platform, status: u16 },

    /// The operation needs a URL that is not configured.
    #[error("{0} has no deploy hook configured")]
    NotConfigured(Platform),
}

impl PlatformError {
    /// Whether another attempt could succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::NotConfigured(_) => false,
        }
    }
}

/// Healthy or not, as reported to API clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Successful health probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    pub http_status: u16,
}

/// One platform's health as served by the status endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub platform: Platform,
    pub service: &'static str,
    pub status: HealthStatus,
    pub response_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl HealthReport {
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// Result of a successful sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub platform: Platform,
    pub message: String,
}

/// Result of a successful deploy trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployReport {
    pub platform: Platform,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    pub status: &'static str,
    pub message: String,
}

/// A platform the controller can probe, sync and deploy.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    fn platform(&self) -> Platform;

    /// Probe the platform's health URL.
    async fn health(&self) -> Result<Probe, PlatformError>;

    /// Bring the platform's deployment in line with the expected state.
    async fn sync(&self) -> Result<SyncReport, PlatformError>;

    /// Trigger a new deployment, optionally of a single service.
    async fn deploy(&self, service: Option<&str>) -> Result<DeployReport, PlatformError>;
}

/// Probe a platform and time the answer. Never fails: errors become an
/// unhealthy report.
pub async fn check(client: &dyn PlatformClient) -> HealthReport {
    let platform = client.platform();
    let started = Instant::now();
    let result = client.health().await;
    let response_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let (status, http_status, error) = match result {
        Ok(probe) => (HealthStatus::Healthy, Some(probe.http_status), None),
        Err(e) => {
            tracing::warn!(platform = %platform, error = %e, "Health check failed");
            let http_status = match &e {
                PlatformError::Status { status, .. } => Some(*status),
                _ => None,
            };
            (HealthStatus::Unhealthy, http_status, Some(e.to_string()))
        }
    };

    HealthReport {
        platform,
        service: platform.hosts(),
        status,
        response_time_ms,
        http_status,
        error,
        checked_at: Utc::now(),
    }
}
