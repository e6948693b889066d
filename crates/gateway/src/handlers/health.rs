//! Health check handlers

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct RootResponse {
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Service banner
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        status: "ok",
        message: "PageRank backend running",
    })
}

/// Liveness probe - always returns healthy if server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::{config, router, send};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_root_banner() {
        let (app, _) = router(config());
        let (status, body) = send(&app, "GET", "/", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok", "message": "PageRank backend running"}));
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = router(config());
        let (status, body) = send(&app, "GET", "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }
}
