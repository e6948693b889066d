//! Error types for LinkRank services
//!
//! Provides the error taxonomy shared by the gateway and the library crates:
//! - Validation errors for malformed request input
//! - State errors for operations that are invalid right now
//! - I/O errors for the graph artifact
//! - Computation errors for rejected engine parameters
//!
//! Every variant maps to an HTTP status and a machine-readable code, and the
//! response body always carries a plain `error` message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    ValidationError,
    MissingField,
    InvalidFormat,

    // State errors
    NoGraph,
    NoResult,
    CrawlInProgress,

    // Computation errors
    InvalidParameter,

    // I/O errors
    ArtifactUnavailable,

    // Rate limiting
    RateLimited,
    RequestTimeout,

    // Internal errors
    InternalError,
    ConfigurationError,
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("{message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("{field} is required")]
    MissingField { field: String },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    // State errors
    #[error("No graph uploaded yet")]
    NoGraph,

    #[error("No graph uploaded yet")]
    GraphNotFound,

    #[error("No result available yet")]
    NoResult,

    #[error("Crawl already in progress")]
    CrawlInProgress,

    // Computation errors
    #[error("Invalid parameter {name}={value}: {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    // I/O errors
    #[error("Failed to load graph artifact {path}: {message}")]
    ArtifactUnavailable { path: String, message: String },

    // Rate limiting
    #[error("Rate limit exceeded: {limit} requests per second")]
    RateLimited { limit: u32 },

    #[error("Request timed out after {secs}s")]
    RequestTimeout { secs: f64 },

    // Internal errors
    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::MissingField { .. } => ErrorCode::MissingField,
            AppError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            AppError::NoGraph | AppError::GraphNotFound => ErrorCode::NoGraph,
            AppError::NoResult => ErrorCode::NoResult,
            AppError::CrawlInProgress => ErrorCode::CrawlInProgress,
            AppError::InvalidParameter { .. } => ErrorCode::InvalidParameter,
            AppError::ArtifactUnavailable { .. } => ErrorCode::ArtifactUnavailable,
            AppError::RateLimited { .. } => ErrorCode::RateLimited,
            AppError::RequestTimeout { .. } => ErrorCode::RequestTimeout,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation { .. }
            | AppError::MissingField { .. }
            | AppError::InvalidFormat { .. }
            | AppError::InvalidParameter { .. }
            | AppError::NoGraph
            | AppError::CrawlInProgress => StatusCode::BAD_REQUEST,

            // 404 Not Found
            AppError::GraphNotFound | AppError::NoResult => StatusCode::NOT_FOUND,

            // 429 Too Many Requests
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,

            // 408 Request Timeout
            AppError::RequestTimeout { .. } => StatusCode::REQUEST_TIMEOUT,

            // 500 Internal Server Error
            AppError::ArtifactUnavailable { .. }
            | AppError::Internal { .. }
            | AppError::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Message shown to API clients.
    ///
    /// Artifact failures keep their detail in the logs only.
    pub fn public_message(&self) -> String {
        match self {
            AppError::ArtifactUnavailable { .. } => "Failed to load default graph".to_string(),
            other => other.to_string(),
        }
    }
}

/// Structured error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        // Log based on severity
        if self.is_server_error() {
            tracing::error!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        let field = match &self {
            AppError::Validation { field, .. } => field.clone(),
            AppError::MissingField { field } => Some(field.clone()),
            _ => None,
        };

        let body = ErrorResponse {
            error: self.public_message(),
            code,
            field,
        };

        (status, Json(body)).into_response()
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration {
            message: err.to_string(),
        }
    }
}
