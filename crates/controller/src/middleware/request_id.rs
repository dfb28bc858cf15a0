//! Request ID middleware.
//!
//! Dashboard calls arrive without an id, so one is generated unless an
//! upstream proxy already set `x-request-id`. Responses echo the id, and
//! failed responses are logged with it since platform errors surface there.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty() && s.len() <= 128)
        .map_or_else(|| Uuid::new_v4().to_string(), str::to_owned);

    tracing::Span::current().record("request_id", request_id.as_str());
    sentry::configure_scope(|scope| scope.set_tag("request_id", &request_id));

    let path = request.uri().path().to_owned();
    let mut response = next.run(request).await;

    let status = response.status();
    if status.is_server_error() || status.is_client_error() {
        tracing::warn!(%request_id, %path, status = status.as_u16(), "Request failed");
    }
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{Router, body::Body, http::StatusCode, middleware::from_fn, routing::get};
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        Router::new()
            .route("/ok", get(|| async { "ok" }))
            .route("/down", get(|| async { StatusCode::BAD_GATEWAY }))
            .layer(from_fn(request_id_middleware))
    }

    async fn id_for(uri: &str, header: Option<&str>) -> String {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = header {
            builder = builder.header(REQUEST_ID_HEADER, value);
        }
        let response = app()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        response.headers()[REQUEST_ID_HEADER]
            .to_str()
            .unwrap()
            .to_owned()
    }

    #[tokio::test]
    async fn test_upstream_id_is_echoed() {
        assert_eq!(id_for("/ok", Some("deploy-42")).await, "deploy-42");
    }

    #[tokio::test]
    async fn test_failed_response_still_gets_generated_id() {
        let id = id_for("/down", None).await;
        assert!(Uuid::parse_str(&id).is_ok(), "{id}");
    }
}
