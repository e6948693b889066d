//! LinkRank Common Library
//!
//! Shared code for the LinkRank service and its crawler:
//! - Error types and HTTP mapping
//! - Configuration management
//! - Metrics and observability

pub mod config;
pub mod errors;
pub mod metrics;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{AppError, Result};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
