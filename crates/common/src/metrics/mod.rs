//! Metrics and observability utilities
//!
//! Provides Prometheus metric descriptions and recording helpers
//! with standardized naming conventions.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all LinkRank metrics
pub const METRICS_PREFIX: &str = "linkrank";

/// Histogram buckets for request latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
    10.00,  // 10s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Engine metrics
    describe_counter!(
        format!("{}_pagerank_runs_total", METRICS_PREFIX),
        Unit::Count,
        "Total PageRank computations"
    );

    describe_histogram!(
        format!("{}_pagerank_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "PageRank computation latency in seconds"
    );

    describe_histogram!(
        format!("{}_pagerank_iterations", METRICS_PREFIX),
        Unit::Count,
        "Power iterations performed per computation"
    );

    // Crawl metrics
    describe_counter!(
        format!("{}_crawl_jobs_total", METRICS_PREFIX),
        Unit::Count,
        "Crawl jobs by outcome"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record a PageRank computation
pub fn record_pagerank(duration_secs: f64, iterations: usize, converged: bool) {
    let outcome = if converged { "converged" } else { "exhausted" };

    counter!(
        format!("{}_pagerank_runs_total", METRICS_PREFIX),
        "outcome" => outcome
    )
    .increment(1);

    histogram!(format!("{}_pagerank_duration_seconds", METRICS_PREFIX)).record(duration_secs);

    histogram!(format!("{}_pagerank_iterations", METRICS_PREFIX)).record(iterations as f64);
}

/// Helper to record a finished crawl job
pub fn record_crawl_job(outcome: &'static str) {
    counter!(
        format!("{}_crawl_jobs_total", METRICS_PREFIX),
        "outcome" => outcome
    )
    .increment(1);
}
