//! Scheduled multi-cloud sync.
//!
//! Every tick syncs all platforms concurrently. Each platform is retried
//! under its own [`RetryPolicy`] and settles independently, so one failing
//! platform never stops the others. Runs never overlap: a run requested
//! while another is in flight (from the timer or from `POST /api/sync/all`)
//! is skipped and logged.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::metrics::Metrics;
use crate::platform::{Platform, PlatformClient, PlatformError};

/// Attempts per platform and the delay before the first retry. Later
/// retries double the delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}

impl RetryPolicy {
    /// At least one attempt is always made.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay after failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }
}

/// How one platform fared in a run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
    pub platform: Platform,
    pub status: OutcomeStatus,
    pub attempts: u32,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Synced,
    Failed,
}

impl SyncOutcome {
    #[must_use]
    pub fn is_synced(&self) -> bool {
        self.status == OutcomeStatus::Synced
    }
}

/// A completed sync run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncRun {
    pub timestamp: DateTime<Utc>,
    pub duration_ms: u64,
    pub sync_results: Vec<SyncOutcome>,
}

impl SyncRun {
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.sync_results.iter().filter(|o| o.is_synced()).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.sync_results.len() - self.succeeded()
    }
}

/// Runs syncs across every platform, one run at a time.
pub struct SyncScheduler {
    platforms: Vec<Arc<dyn PlatformClient>>,
    policy: RetryPolicy,
    metrics: Arc<Metrics>,
    in_flight: Mutex<()>,
}

impl SyncScheduler {
    #[must_use]
    pub fn new(
        platforms: Vec<Arc<dyn PlatformClient>>,
        policy: RetryPolicy,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            platforms,
            policy,
            metrics,
            in_flight: Mutex::new(()),
        }
    }

    #[must_use]
    pub const fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Sync every platform. Returns `None` without doing anything when a
    /// run is already in flight.
    pub async fn run_once(&self) -> Option<SyncRun> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            tracing::warn!("Previous sync run still in flight, skipping");
            self.metrics.record_skipped_run();
            return None;
        };

        tracing::info!(platforms = self.platforms.len(), "Starting sync run");
        let timestamp = Utc::now();
        let started = Instant::now();

        let sync_results =
            join_all(self.platforms.iter().map(|client| self.sync_platform(client.as_ref())))
                .await;

        let run = SyncRun {
            timestamp,
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            sync_results,
        };
        let (succeeded, failed) = (run.succeeded(), run.failed());
        self.metrics.record_run(succeeded, failed);
        tracing::info!(
            succeeded,
            failed,
            duration_ms = run.duration_ms,
            "Sync run completed"
        );
        Some(run)
    }

    /// Sync one platform under the retry policy. Never fails: the outcome
    /// carries the last error.
    async fn sync_platform(&self, client: &dyn PlatformClient) -> SyncOutcome {
        let platform = client.platform();
        let (result, attempts) = with_retry(self.policy, platform, || client.sync()).await;
        match result {
            Ok(report) => {
                tracing::info!(platform = %platform, attempts, "Platform synced");
                SyncOutcome {
                    platform,
                    status: OutcomeStatus::Synced,
                    attempts,
                    message: report.message,
                }
            }
            Err(e) => {
                tracing::error!(platform = %platform, attempts, error = %e, "Platform sync failed");
                SyncOutcome {
                    platform,
                    status: OutcomeStatus::Failed,
                    attempts,
                    message: e.to_string(),
                }
            }
        }
    }

    /// Run [`Self::run_once`] every `period`, starting one period from now.
    ///
    /// Each tick spawns its run so a slow run shows up as a skipped tick
    /// rather than delaying the timer. Missed ticks are skipped.
    pub fn spawn(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tracing::info!(period_secs = period.as_secs(), "Spawning sync scheduler");
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let scheduler = Arc::clone(&self);
                tokio::spawn(async move {
                    scheduler.run_once().await;
                });
            }
        })
    }
}

/// Call `op` until it succeeds, fails with a non-retryable error, or the
/// policy's attempts run out. Returns the last result and the attempt count.
pub async fn with_retry<T, F, Fut>(
    policy: RetryPolicy,
    platform: Platform,
    mut op: F,
) -> (Result<T, PlatformError>, u32)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PlatformError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return (Ok(value), attempt),
            Err(e) if e.is_retryable() && attempt < policy.max_attempts => {
                let delay = policy.delay_after(attempt);
                tracing::debug!(
                    platform = %platform,
                    attempt,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %e,
                    "Retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return (Err(e), attempt),
        }
    }
}
