//! Platform health endpoints.

use std::time::Instant;

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::platform::{self, HealthReport, Platform, UnknownPlatform};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StatusSummary {
    pub total_platforms: usize,
    pub healthy_platforms: usize,
    pub unhealthy_platforms: usize,
    pub response_time_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct AllStatus {
    pub timestamp: DateTime<Utc>,
    pub platforms: Vec<HealthReport>,
    pub summary: StatusSummary,
}

/// `GET /api/status/all`: every platform checked concurrently.
pub async fn all(State(state): State<AppState>) -> Json<AllStatus> {
    tracing::info!("Starting multi-cloud status check");
    let started = Instant::now();

    let platforms = join_all(
        state
            .platforms()
            .iter()
            .map(|client| platform::check(client.as_ref())),
    )
    .await;
    for report in &platforms {
        state.metrics().record_check(report.is_healthy());
    }

    let healthy_platforms = platforms.iter().filter(|r| r.is_healthy()).count();
    let summary = StatusSummary {
        total_platforms: platforms.len(),
        healthy_platforms,
        unhealthy_platforms: platforms.len() - healthy_platforms,
        response_time_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    };
    tracing::info!(
        healthy = summary.healthy_platforms,
        total = summary.total_platforms,
        response_time_ms = summary.response_time_ms,
        "Status check completed"
    );

    Json(AllStatus {
        timestamp: Utc::now(),
        platforms,
        summary,
    })
}

/// `GET /api/status/{platform}`
pub async fn one(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<HealthReport>> {
    let client = name
        .parse::<Platform>()
        .ok()
        .and_then(|p| state.platform(p))
        .ok_or_else(|| AppError::NotFound(UnknownPlatform(name)))?;

    let report = platform::check(client.as_ref()).await;
    state.metrics().record_check(report.is_healthy());
    Ok(Json(report))
}
