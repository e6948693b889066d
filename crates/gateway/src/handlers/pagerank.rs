//! PageRank handlers

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use linkrank_common::{
    errors::{AppError, Result},
    metrics::record_pagerank,
};
use linkrank_engine::{rank, PageRankConfig, RankResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::extract::JsonBody;
use crate::AppState;

/// Highest-ranked nodes included in the computation log line
const TOP_LOGGED: usize = 10;

/// Optional overrides of the configured PageRank defaults
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunPageRankRequest {
    pub damping: Option<f64>,
    pub max_iter: Option<usize>,
    pub tolerance: Option<f64>,
}

#[derive(Serialize)]
pub struct RankResponse<'a> {
    pub status: &'static str,
    pub result: &'a RankResult,
}

impl RunPageRankRequest {
    fn resolve(&self, state: &AppState) -> PageRankConfig {
        let defaults = &state.config.pagerank;
        PageRankConfig {
            damping: self.damping.unwrap_or(defaults.damping),
            tolerance: self.tolerance.unwrap_or(defaults.tolerance),
            max_iterations: self.max_iter.unwrap_or(defaults.max_iterations),
        }
    }
}

/// Rank the stored graph and cache the result
pub async fn run_pagerank(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RunPageRankRequest>,
) -> Result<Response> {
    let snapshot = state.store.snapshot().await.ok_or(AppError::NoGraph)?;

    let config = request.resolve(&state);
    config.validate()?;

    let graph = Arc::clone(&snapshot.graph);
    let started = Instant::now();
    let result = tokio::task::spawn_blocking(move || rank(&graph, &config))
        .await
        .map_err(|e| AppError::Internal {
            message: format!("PageRank computation failed: {}", e),
        })??;
    let elapsed = started.elapsed();

    record_pagerank(elapsed.as_secs_f64(), result.iterations, result.converged);

    let cached = state.store.set_result(snapshot.generation, result.clone()).await;
    tracing::info!(
        nodes = result.scores.len(),
        iterations = result.iterations,
        converged = result.converged,
        cached,
        duration_ms = elapsed.as_millis() as u64,
        top = ?result.scores.top(TOP_LOGGED),
        "PageRank computed"
    );

    Ok(Json(RankResponse {
        status: "ok",
        result: &result,
    })
    .into_response())
}

/// Last cached result
pub async fn get_result(State(state): State<AppState>) -> Result<Response> {
    let result = state.store.result().await.ok_or(AppError::NoResult)?;

    Ok(Json(RankResponse {
        status: "ok",
        result: &result,
    })
    .into_response())
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::{config, router, send};
    use axum::http::StatusCode;

    const SINK_GRAPH: &str = r#"{"graph": {"A": ["B", "C"], "B": ["C"], "C": []}}"#;

    #[tokio::test]
    async fn test_end_to_end_defaults() {
        let (app, _) = router(config());
        send(&app, "POST", "/upload-graph", Some(SINK_GRAPH)).await;

        let (status, body) = send(&app, "POST", "/run-pagerank", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let result = &body["result"];
        let scores = result["scores"].as_object().unwrap();
        let total: f64 = scores.values().map(|v| v.as_f64().unwrap()).sum();
        assert!((total - 1.0).abs() < 1e-9);

        let c = scores["C"].as_f64().unwrap();
        assert!(c > scores["A"].as_f64().unwrap());
        assert!(c > scores["B"].as_f64().unwrap());

        assert!(result["iterations"].as_u64().unwrap() <= 100);
        assert_eq!(result["damping"], 0.85);
        assert_eq!(result["tolerance"], 1e-6);
        assert_eq!(result["converged"], true);
    }

    #[tokio::test]
    async fn test_run_without_graph() {
        let (app, _) = router(config());
        let (status, body) = send(&app, "POST", "/run-pagerank", Some("{}")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No graph uploaded yet");
    }

    #[tokio::test]
    async fn test_invalid_damping_rejected() {
        let (app, _) = router(config());
        send(&app, "POST", "/upload-graph", Some(SINK_GRAPH)).await;

        for body in [r#"{"damping": 1.0}"#, r#"{"damping": 0}"#, r#"{"maxIter": 0}"#, r#"{"tolerance": -1}"#] {
            let (status, json) = send(&app, "POST", "/run-pagerank", Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body {}", body);
            assert_eq!(json["code"], "INVALID_PARAMETER");
        }
    }

    #[tokio::test]
    async fn test_iteration_budget() {
        let (app, _) = router(config());
        send(&app, "POST", "/upload-graph", Some(SINK_GRAPH)).await;

        let (status, body) = send(&app, "POST", "/run-pagerank", Some(r#"{"maxIter": 2}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["iterations"], 2);
        assert_eq!(body["result"]["converged"], false);
    }

    #[tokio::test]
    async fn test_result_lifecycle() {
        let (app, _) = router(config());

        let (status, body) = send(&app, "GET", "/result", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "No result available yet");

        send(&app, "POST", "/upload-graph", Some(SINK_GRAPH)).await;
        let (_, run) = send(&app, "POST", "/run-pagerank", Some(r#"{"damping": 0.5}"#)).await;

        let (status, body) = send(&app, "GET", "/result", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"], run["result"]);
        assert_eq!(body["result"]["damping"], 0.5);

        // A new upload invalidates the cached result
        send(&app, "POST", "/upload-graph", Some(SINK_GRAPH)).await;
        let (status, _) = send(&app, "GET", "/result", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
