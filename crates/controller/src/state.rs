//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ControllerConfig;
use crate::metrics::Metrics;
use crate::platform::{HttpPlatform, Platform, PlatformClient};
use crate::scheduler::{RetryPolicy, SyncScheduler};

/// Application state shared across all handlers. Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    platforms: Vec<Arc<dyn PlatformClient>>,
    scheduler: Arc<SyncScheduler>,
    metrics: Arc<Metrics>,
    environment: String,
}

impl AppState {
    /// State with HTTP clients for every configured platform.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be built.
    pub fn from_config(config: &ControllerConfig) -> reqwest::Result<Self> {
        let http = HttpPlatform::client()?;
        let platforms = config
            .platforms
            .iter()
            .map(|p| Arc::new(HttpPlatform::new(http.clone(), p)) as Arc<dyn PlatformClient>)
            .collect();
        Ok(Self::new(platforms, config.retry, config.environment.clone()))
    }

    #[must_use]
    pub fn new(
        platforms: Vec<Arc<dyn PlatformClient>>,
        retry: RetryPolicy,
        environment: String,
    ) -> Self {
        let metrics = Arc::new(Metrics::new());
        let scheduler = Arc::new(SyncScheduler::new(
            platforms.clone(),
            retry,
            Arc::clone(&metrics),
        ));
        Self {
            inner: Arc::new(AppStateInner {
                platforms,
                scheduler,
                metrics,
                environment,
            }),
        }
    }

    #[must_use]
    pub fn platforms(&self) -> &[Arc<dyn PlatformClient>] {
        &self.inner.platforms
    }

    /// The client for one platform, if configured.
    #[must_use]
    pub fn platform(&self, platform: Platform) -> Option<&Arc<dyn PlatformClient>> {
        self.inner
            .platforms
            .iter()
            .find(|client| client.platform() == platform)
    }

    #[must_use]
    pub fn scheduler(&self) -> &Arc<SyncScheduler> {
        &self.inner.scheduler
    }

    #[must_use]
    pub fn metrics(&self) -> &Metrics {
        &self.inner.metrics
    }

    #[must_use]
    pub fn environment(&self) -> &str {
        &self.inner.environment
    }
}
