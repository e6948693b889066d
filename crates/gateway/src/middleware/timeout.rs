//! Request deadline

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Router,
};
use linkrank_common::errors::AppError;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;

/// Wrap `router` in a deadline whose expiry answers with the JSON error body
pub fn with_deadline(router: Router, limit: Duration) -> Router {
    let secs = limit.as_secs_f64();

    router
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, limit))
        .layer(axum::middleware::map_response(move |response: Response| async move {
            timeout_body(response, secs)
        }))
}

fn timeout_body(response: Response, secs: f64) -> Response {
    // No handler answers 408 itself, so the status marks an expired deadline
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        return AppError::RequestTimeout { secs }.into_response();
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::Request,
        routing::get,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        let router = Router::new()
            .route("/fast", get(|| async { "done" }))
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            );
        with_deadline(router, Duration::from_millis(50))
    }

    async fn call(uri: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn test_expired_deadline_has_error_body() {
        let (status, bytes) = call("/slow").await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);

        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "REQUEST_TIMEOUT");
        assert_eq!(body["error"], "Request timed out after 0.05s");
    }

    #[tokio::test]
    async fn test_fast_request_untouched() {
        let (status, bytes) = call("/fast").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(bytes, b"done");
    }
}
