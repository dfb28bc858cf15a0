//! On-demand sync and deploy endpoints.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::platform::{DeployReport, Platform};
use crate::scheduler::SyncRun;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    #[serde(flatten)]
    pub run: SyncRun,
    pub summary: SyncSummary,
}

#[derive(Debug, Serialize)]
pub struct SyncSummary {
    pub succeeded: usize,
    pub failed: usize,
}

/// Optional body of `POST /api/deploy/{platform}`.
#[derive(Debug, Default, Deserialize)]
pub struct DeployRequest {
    pub service: Option<String>,
}

/// `POST /api/sync/all`: same run and retry policy as the timer. Returns 409
/// while a run is in flight.
pub async fn sync_all(State(state): State<AppState>) -> Result<Json<SyncResponse>> {
    let run = state
        .scheduler()
        .run_once()
        .await
        .ok_or(AppError::SyncInProgress)?;
    let summary = SyncSummary {
        succeeded: run.succeeded(),
        failed: run.failed(),
    };
    Ok(Json(SyncResponse { run, summary }))
}

/// `POST /api/deploy/{platform}` with an optional `{"service": ...}` body.
pub async fn deploy(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Json<DeployReport>> {
    let client = name
        .parse::<Platform>()
        .ok()
        .and_then(|p| state.platform(p))
        .ok_or_else(|| AppError::BadRequest(format!("Unknown platform: {name}")))?;

    let request: DeployRequest = if body.iter().all(u8::is_ascii_whitespace) {
        DeployRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid request body: {e}")))?
    };

    let result = client.deploy(request.service.as_deref()).await;
    state.metrics().record_deploy(result.is_ok());
    Ok(Json(result?))
}
