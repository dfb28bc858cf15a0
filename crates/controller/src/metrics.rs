//! In-process counters served by `/api/metrics`.
//!
//! Sync results are not persisted; only these aggregates survive a run.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::Serialize;

#[derive(Debug)]
pub struct Metrics {
    started: Instant,
    checks_total: AtomicU64,
    checks_healthy: AtomicU64,
    checks_unhealthy: AtomicU64,
    sync_runs: AtomicU64,
    sync_runs_skipped: AtomicU64,
    platform_syncs_succeeded: AtomicU64,
    platform_syncs_failed: AtomicU64,
    deploys_triggered: AtomicU64,
    deploys_failed: AtomicU64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub platform_checks: CheckCounts,
    pub sync: SyncCounts,
    pub deploys: DeployCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckCounts {
    pub total_checks: u64,
    pub successful_checks: u64,
    pub failed_checks: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncCounts {
    pub runs: u64,
    pub runs_skipped: u64,
    pub platform_syncs_succeeded: u64,
    pub platform_syncs_failed: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployCounts {
    pub triggered: u64,
    pub failed: u64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    #[must_use]
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            checks_total: AtomicU64::new(0),
            checks_healthy: AtomicU64::new(0),
            checks_unhealthy: AtomicU64::new(0),
            sync_runs: AtomicU64::new(0),
            sync_runs_skipped: AtomicU64::new(0),
            platform_syncs_succeeded: AtomicU64::new(0),
            platform_syncs_failed: AtomicU64::new(0),
            deploys_triggered: AtomicU64::new(0),
            deploys_failed: AtomicU64::new(0),
        }
    }

    /// Whole seconds since the controller started.
    #[must_use]
    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    pub fn record_check(&self, healthy: bool) {
        self.checks_total.fetch_add(1, Ordering::Relaxed);
        if healthy {
            self.checks_healthy.fetch_add(1, Ordering::Relaxed);
        } else {
            self.checks_unhealthy.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_run(&self, succeeded: usize, failed: usize) {
        let count = |n: usize| u64::try_from(n).unwrap_or(u64::MAX);
        self.sync_runs.fetch_add(1, Ordering::Relaxed);
        self.platform_syncs_succeeded
            .fetch_add(count(succeeded), Ordering::Relaxed);
        self.platform_syncs_failed
            .fetch_add(count(failed), Ordering::Relaxed);
    }

    pub fn record_skipped_run(&self) {
        self.sync_runs_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_deploy(&self, triggered: bool) {
        if triggered {
            self.deploys_triggered.fetch_add(1, Ordering::Relaxed);
        } else {
            self.deploys_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        MetricsSnapshot {
            uptime_secs: self.uptime_secs(),
            platform_checks: CheckCounts {
                total_checks: load(&self.checks_total),
                successful_checks: load(&self.checks_healthy),
                failed_checks: load(&self.checks_unhealthy),
            },
            sync: SyncCounts {
                runs: load(&self.sync_runs),
                runs_skipped: load(&self.sync_runs_skipped),
                platform_syncs_succeeded: load(&self.platform_syncs_succeeded),
                platform_syncs_failed: load(&self.platform_syncs_failed),
            },
            deploys: DeployCounts {
                triggered: load(&self.deploys_triggered),
                failed: load(&self.deploys_failed),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = Metrics::new();
        metrics.record_check(true);
        metrics.record_check(false);
        metrics.record_run(2, 1);
        metrics.record_skipped_run();
        metrics.record_deploy(true);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.platform_checks.total_checks, 2);
        assert_eq!(snapshot.platform_checks.failed_checks, 1);
        assert_eq!(snapshot.sync.runs, 1);
        assert_eq!(snapshot.sync.runs_skipped, 1);
        assert_eq!(snapshot.sync.platform_syncs_succeeded, 2);
        assert_eq!(snapshot.deploys.triggered, 1);
        assert_eq!(snapshot.deploys.failed, 0);
    }
}
