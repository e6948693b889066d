//! Crawl control handlers

use axum::{extract::State, Json};
use linkrank_common::errors::{AppError, Result};
use linkrank_orchestrator::{CrawlRequest, CrawlStatus};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::extract::JsonBody;
use crate::AppState;

/// Request to launch a crawl job
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StartCrawlRequest {
    #[validate(url(message = "startUrl must be a valid URL"))]
    pub start_url: Option<String>,

    #[validate(range(min = 1, message = "maxPages must be at least 1"))]
    pub max_pages: Option<u32>,

    pub keyword: Option<String>,
}

#[derive(Serialize)]
pub struct StartCrawlResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// Launch a crawl job unless one is already running
pub async fn start_crawl(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<StartCrawlRequest>,
) -> Result<Json<StartCrawlResponse>> {
    if state.orchestrator.is_running() {
        return Err(AppError::CrawlInProgress);
    }

    let seed = match request.start_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => url.to_string(),
        _ => {
            return Err(AppError::MissingField {
                field: "startUrl".to_string(),
            })
        }
    };

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let keyword = request
        .keyword
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty());

    let job_id = state.orchestrator.start(CrawlRequest {
        seed,
        max_pages: request
            .max_pages
            .unwrap_or(state.config.crawl.default_max_pages),
        keyword,
    })?;

    tracing::info!(%job_id, "Crawl accepted");

    Ok(Json(StartCrawlResponse {
        status: "ok",
        message: "Crawl started",
    }))
}

/// Current crawl status snapshot
pub async fn crawl_status(State(state): State<AppState>) -> Json<CrawlStatus> {
    Json(state.orchestrator.status())
}
