//! Controller configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` - Listen port (default: 3000)
//! - `ALLOWED_ORIGINS` - Comma-separated CORS origins
//! - `APP_ENV` / `NODE_ENV` - Environment name (default: development)
//! - `SYNC_INTERVAL_SECS` - Seconds between scheduled syncs (default: 300)
//! - `SYNC_MAX_ATTEMPTS` - Attempts per platform per sync (default: 3)
//! - `SYNC_BASE_DELAY_MS` - First retry delay, doubled per attempt (default: 500)
//! - `{VERCEL,HEROKU,RENDER}_HEALTH_URL` - Platform health URL
//! - `{VERCEL,HEROKU,RENDER}_TOKEN` - Bearer token for the platform
//! - `{VERCEL,HEROKU,RENDER}_DEPLOY_HOOK_URL` - Deploy trigger URL
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::platform::Platform;
use crate::scheduler::RetryPolicy;

const DEFAULT_ALLOWED_ORIGINS: &[&str] = &["http://localhost:3000"];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Where one platform lives and how to authenticate to it.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub platform: Platform,
    pub health_url: Url,
    pub deploy_hook: Option<Url>,
    pub token: Option<SecretString>,
}

/// Controller configuration.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    /// Reported by `/health`
    pub environment: String,
    pub sync_interval: Duration,
    pub retry: RetryPolicy,
    pub platforms: Vec<PlatformConfig>,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
}

impl ControllerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let host = parse_env("HOST", "0.0.0.0")?;
        let port = parse_env("PORT", "3000")?;
        let allowed_origins = get_optional_env("ALLOWED_ORIGINS").map_or_else(
            || {
                DEFAULT_ALLOWED_ORIGINS
                    .iter()
                    .map(|s| (*s).to_owned())
                    .collect()
            },
            |raw| parse_origins(&raw),
        );
        let environment = get_optional_env("APP_ENV")
            .or_else(|| get_optional_env("NODE_ENV"))
            .unwrap_or_else(|| "development".to_owned());

        let interval_secs: u64 = parse_env("SYNC_INTERVAL_SECS", "300")?;
        if interval_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "SYNC_INTERVAL_SECS".to_owned(),
                "must be at least 1".to_owned(),
            ));
        }
        let max_attempts: u32 = parse_env("SYNC_MAX_ATTEMPTS", "3")?;
        let base_delay_ms: u64 = parse_env("SYNC_BASE_DELAY_MS", "500")?;

        let platforms = Platform::ALL
            .into_iter()
            .map(platform_from_env)
            .collect::<Result<_, _>>()?;

        Ok(Self {
            host,
            port,
            allowed_origins,
            environment,
            sync_interval: Duration::from_secs(interval_secs),
            retry: RetryPolicy::new(max_attempts, Duration::from_millis(base_delay_ms)),
            platforms,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Health URL used when none is configured.
#[must_use]
pub const fn default_health_url(platform: Platform) -> &'static str {
    match platform {
        Platform::Vercel => "https://ecommerce-microservices-platform.vercel.app/health",
        Platform::Heroku => "https://techmart-products-service.herokuapp.com/health",
        Platform::Render => "https://techmart-search-service.onrender.com/health",
    }
}

fn platform_from_env(platform: Platform) -> Result<PlatformConfig, ConfigError> {
    let prefix = platform.slug().to_ascii_uppercase();
    let health_key = format!("{prefix}_HEALTH_URL");
    let hook_key = format!("{prefix}_DEPLOY_HOOK_URL");

    let health_url = get_optional_env(&health_key)
        .unwrap_or_else(|| default_health_url(platform).to_owned());
    let health_url = parse_url(&health_key, &health_url)?;
    let deploy_hook = get_optional_env(&hook_key)
        .map(|raw| parse_url(&hook_key, &raw))
        .transpose()?;

    Ok(PlatformConfig {
        platform,
        health_url,
        deploy_hook,
        token: get_optional_env(&format!("{prefix}_TOKEN")).map(SecretString::from),
    })
}

// =============================================================================
// Helper Functions
// =============================================================================

fn parse_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string()))?;
    if matches!(url.scheme(), "http" | "https") {
        Ok(url)
    } else {
        Err(ConfigError::InvalidEnvVar(
            key.to_owned(),
            format!("unsupported scheme '{}'", url.scheme()),
        ))
    }
}

fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key)
        .unwrap_or_else(|| default.to_owned())
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Split a comma-separated origin list.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}
