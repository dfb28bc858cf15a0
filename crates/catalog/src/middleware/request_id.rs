//! `x-request-id` propagation.
//!
//! An upstream id is kept when it is a printable header value of at most
//! [`MAX_REQUEST_ID_LEN`] bytes; anything else is replaced by a fresh UUID v4.
//! The chosen id is written back onto the request before the handler runs,
//! so the request and response always carry the same value.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longer upstream ids are discarded.
pub const MAX_REQUEST_ID_LEN: usize = 128;

fn upstream_id(headers: &HeaderMap) -> Option<HeaderValue> {
    let value = headers.get(REQUEST_ID_HEADER)?.to_str().ok()?.trim();
    if value.is_empty() || value.len() > MAX_REQUEST_ID_LEN {
        return None;
    }
    HeaderValue::from_str(value).ok()
}

fn fresh_id() -> HeaderValue {
    HeaderValue::from_str(&Uuid::new_v4().to_string())
        .unwrap_or_else(|_| HeaderValue::from_static("unknown"))
}

pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let id = upstream_id(request.headers()).unwrap_or_else(fresh_id);
    let text = id.to_str().unwrap_or_default();

    tracing::Span::current().record("request_id", text);
    sentry::configure_scope(|scope| scope.set_tag("request_id", text));
    request.headers_mut().insert(REQUEST_ID_HEADER, id.clone());

    let mut response = next.run(request).await;
    response.headers_mut().insert(REQUEST_ID_HEADER, id);
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{Router, body::Body, middleware::from_fn, routing::get};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;

    /// Echoes the id the handler saw.
    fn app() -> Router {
        Router::new()
            .route(
                "/",
                get(|headers: HeaderMap| async move {
                    headers[REQUEST_ID_HEADER].to_str().unwrap().to_owned()
                }),
            )
            .layer(from_fn(request_id_middleware))
    }

    async fn call(header: Option<&str>) -> (String, String) {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(REQUEST_ID_HEADER, value);
        }
        let response = app()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let echoed = response.headers()[REQUEST_ID_HEADER]
            .to_str()
            .unwrap()
            .to_owned();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (echoed, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_upstream_id_is_kept() {
        let (echoed, seen) = call(Some("abc-123")).await;
        assert_eq!(echoed, "abc-123");
        assert_eq!(seen, "abc-123");
    }

    #[tokio::test]
    async fn test_oversized_id_is_replaced_for_handler_and_response() {
        let oversized = "x".repeat(MAX_REQUEST_ID_LEN + 1);
        for header in [None, Some(oversized.as_str()), Some("   ")] {
            let (echoed, seen) = call(header).await;
            assert!(Uuid::parse_str(&echoed).is_ok(), "{echoed}");
            assert_eq!(seen, echoed);
        }
    }
}
