//! HTTP route handlers for the controller.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Endpoint documentation
//! GET  /api                    - Endpoint documentation
//! GET  /health                 - Liveness, uptime, environment
//!
//! GET  /api/status/all         - Every platform's health plus a summary
//! GET  /api/status/{platform}  - One platform's health
//! POST /api/sync/all           - On-demand sync run
//! POST /api/deploy/{platform}  - Trigger a deployment
//! GET  /api/metrics            - Uptime and counters
//! ```

pub mod health;
pub mod metrics;
pub mod status;
pub mod sync;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the `/api` router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::docs))
        .route("/status/all", get(status::all))
        .route("/status/{platform}", get(status::one))
        .route("/sync/all", post(sync::sync_all))
        .route("/deploy/{platform}", post(sync::deploy))
        .route("/metrics", get(metrics::metrics))
}

/// Build the complete application router (without outer layers).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::docs))
        .route("/health", get(health::health))
        .nest("/api", api_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::platform::fake::FakePlatform;
    use crate::platform::{Platform, PlatformClient};
    use crate::scheduler::RetryPolicy;

    fn app_with(platforms: Vec<Arc<dyn PlatformClient>>) -> Router {
        let retry = RetryPolicy::new(2, std::time::Duration::from_millis(1));
        routes().with_state(AppState::new(platforms, retry, "test".to_owned()))
    }

    fn app() -> Router {
        app_with(vec![
            Arc::new(FakePlatform::healthy(Platform::Vercel)),
            Arc::new(FakePlatform::failing(Platform::Heroku, u32::MAX)),
            Arc::new(FakePlatform::unconfigured(Platform::Render)),
        ])
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_health_and_docs() {
        let app = app();
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["environment"], "test");
        assert!(body["uptime_secs"].is_u64());

        for uri in ["/", "/api"] {
            let (status, body) = send(&app, "GET", uri, None).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert_eq!(body["endpoints"]["metrics"], "GET /api/metrics");
        }
    }

    #[tokio::test]
    async fn test_status_all_summarizes() {
        let app = app();
        let (status, body) = send(&app, "GET", "/api/status/all", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"]["total_platforms"], 3);
        assert_eq!(body["summary"]["healthy_platforms"], 1);
        assert_eq!(body["summary"]["unhealthy_platforms"], 2);
        assert_eq!(body["platforms"][0]["platform"], "vercel");
        assert_eq!(body["platforms"][0]["status"], "healthy");

        let (_, metrics) = send(&app, "GET", "/api/metrics", None).await;
        assert_eq!(metrics["controller_metrics"]["platform_checks"]["total_checks"], 3);
        assert_eq!(metrics["controller_metrics"]["platform_checks"]["failed_checks"], 2);
    }

    #[tokio::test]
    async fn test_status_one() {
        let app = app();
        let (status, body) = send(&app, "GET", "/api/status/heroku", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "unhealthy");

        let (status, body) = send(&app, "GET", "/api/status/gke", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Unknown platform: gke");
    }

    #[tokio::test]
    async fn test_sync_all_settles_every_platform() {
        let app = app();
        let (status, body) = send(&app, "POST", "/api/sync/all", None).await;
        assert_eq!(status, StatusCode::OK);
        let results = body["sync_results"].as_array().unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0]["status"], "synced");
        assert_eq!(results[1]["status"], "failed");
        assert_eq!(results[1]["attempts"], 2);
        assert_eq!(results[2]["attempts"], 1);
        assert_eq!(body["summary"], json!({"succeeded": 1, "failed": 2}));

        let (_, metrics) = send(&app, "GET", "/api/metrics", None).await;
        assert_eq!(metrics["controller_metrics"]["sync"]["runs"], 1);
    }

    #[tokio::test]
    async fn test_deploy() {
        let app = app();
        let (status, body) = send(
            &app,
            "POST",
            "/api/deploy/Vercel",
            Some(json!({"service": "storefront"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "triggered");
        assert_eq!(body["service"], "storefront");

        let (status, _) = send(&app, "POST", "/api/deploy/heroku", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, "POST", "/api/deploy/argocd", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Unknown platform: argocd");

        let (status, _) = send(&app, "POST", "/api/deploy/render", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_deploy_rejects_malformed_body() {
        let app = app();
        let request = Request::builder()
            .method("POST")
            .uri("/api/deploy/vercel")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
