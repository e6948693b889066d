//! Crawler error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CrawlerError>;

#[derive(Error, Debug)]
pub enum CrawlerError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid setting {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    #[error(transparent)]
    Artifact(#[from] linkrank_engine::EngineError),
}
