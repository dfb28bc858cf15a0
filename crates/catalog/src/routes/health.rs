//! Health check handlers.

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use serde_json::{Value, json};

use crate::db;
use crate::state::AppState;

/// Liveness health check. Does not check dependencies.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "product-service",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Readiness health check.
///
/// Verifies database connectivity; returns 503 if the database is not
/// reachable. Stores without a pool are always ready.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    let Some(pool) = state.pool() else {
        return StatusCode::OK;
    };
    match db::ping(pool).await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
