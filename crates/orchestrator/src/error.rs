//! Orchestrator error types

use linkrank_common::errors::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Crawl already in progress")]
    Busy,

    #[error("Failed to start crawl process {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<OrchestratorError> for AppError {
    fn from(e: OrchestratorError) -> Self {
        match e {
            OrchestratorError::Busy => AppError::CrawlInProgress,
            OrchestratorError::Spawn { .. } => AppError::Internal {
                message: e.to_string(),
            },
        }
    }
}
