//! Engine error types

use linkrank_common::errors::AppError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid parameter {name}={value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("Graph artifact I/O failed for {}: {source}", .path.display())]
    ArtifactIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed graph artifact {}: {source}", .path.display())]
    ArtifactFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl From<EngineError> for AppError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::InvalidParameter { name, value, reason } => AppError::InvalidParameter {
                name: name.to_string(),
                value,
                reason: reason.to_string(),
            },
            EngineError::ArtifactIo { ref path, .. } | EngineError::ArtifactFormat { ref path, .. } => {
                AppError::ArtifactUnavailable {
                    path: path.display().to_string(),
                    message: e.to_string(),
                }
            }
        }
    }
}
