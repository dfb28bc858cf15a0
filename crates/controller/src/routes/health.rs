//! Health check and endpoint documentation.

use axum::{Json, extract::State};
use chrono::Utc;
use serde_json::{Value, json};

use crate::platform::Platform;
use crate::state::AppState;

pub const SERVICE_NAME: &str = "TechMart Multi-Cloud Controller";

/// Liveness health check.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
        "uptime_secs": state.metrics().uptime_secs(),
        "environment": state.environment(),
    }))
}

/// `GET /` and `GET /api`
pub async fn docs() -> Json<Value> {
    let status: serde_json::Map<String, Value> = std::iter::once((
        "all".to_owned(),
        Value::from("GET /api/status/all"),
    ))
    .chain(Platform::ALL.into_iter().map(|p| {
        (
            p.slug().to_owned(),
            Value::from(format!("GET /api/status/{}", p.slug())),
        )
    }))
    .collect();

    Json(json!({
        "name": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Multi-cloud status, sync and deployment for the TechMart platform",
        "endpoints": {
            "health": "GET /health",
            "status": status,
            "sync": {
                "all": "POST /api/sync/all",
                "deploy": "POST /api/deploy/{platform}",
            },
            "metrics": "GET /api/metrics",
        },
        "platforms": Platform::ALL.map(Platform::name),
    }))
}
