//! Per-request metrics recording

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use linkrank_common::metrics::RequestMetrics;

/// Record count and latency of every request, labelled by route
pub async fn track_requests(request: Request, next: Next) -> Response {
    // Unmatched paths share one label to keep cardinality bounded
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let metrics = RequestMetrics::start(request.method().as_str(), &endpoint);
    let response = next.run(request).await;
    metrics.finish(response.status().as_u16());

    response
}
