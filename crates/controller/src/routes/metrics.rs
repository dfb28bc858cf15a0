//! Controller metrics endpoint.

use axum::{Json, extract::State};
use chrono::Utc;
use serde_json::{Value, json};

use crate::state::AppState;

/// `GET /api/metrics`
pub async fn metrics(State(state): State<AppState>) -> Json<Value> {
    let policy = state.scheduler().policy();
    Json(json!({
        "timestamp": Utc::now().to_rfc3339(),
        "controller_metrics": state.metrics().snapshot(),
        "sync_policy": {
            "max_attempts": policy.max_attempts,
            "base_delay_ms": u64::try_from(policy.base_delay.as_millis()).unwrap_or(u64::MAX),
        },
    }))
}
