//! Crawler settings
//!
//! Read from bare environment variables (`START_URL`, `MAX_PAGES`, ...),
//! so the orchestrator can configure a run without touching files.

use crate::error::{CrawlerError, Result};
use config::{Config, Environment};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct CrawlSettings {
    /// Seed URL
    #[serde(default = "default_start_url")]
    pub start_url: String,

    /// Maximum pages visited
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Case-insensitive keyword pages must mention to keep their links
    #[serde(default)]
    pub keyword_filter: String,

    /// Seconds slept between batches
    #[serde(default = "default_crawl_delay")]
    pub crawl_delay: f64,

    /// Maximum link depth from the seed
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Fetch attempts per page
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Pages fetched concurrently per batch
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Artifact path
    #[serde(default = "default_graph_output")]
    pub graph_output: PathBuf,
}

fn default_start_url() -> String { "https://www.tum.de".to_string() }
fn default_max_pages() -> usize { 50 }
fn default_crawl_delay() -> f64 { 0.3 }
fn default_max_depth() -> usize { 3 }
fn default_max_retries() -> u32 { 3 }
fn default_concurrency() -> usize { 5 }
fn default_graph_output() -> PathBuf { PathBuf::from("data/graph.json") }

impl CrawlSettings {
    /// Load settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::build(Environment::default())
    }

    /// Load settings from an explicit variable map
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        Self::build(Environment::default().source(Some(vars)))
    }

    fn build(source: Environment) -> Result<Self> {
        let settings: Self = Config::builder()
            .add_source(source.try_parsing(true))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        let seed = Url::parse(&self.start_url).map_err(|e| CrawlerError::InvalidSetting {
            name: "START_URL",
            reason: e.to_string(),
        })?;
        if seed.host_str().is_none() {
            return Err(CrawlerError::InvalidSetting {
                name: "START_URL",
                reason: "URL has no host".to_string(),
            });
        }

        if self.max_pages == 0 {
            return Err(CrawlerError::InvalidSetting {
                name: "MAX_PAGES",
                reason: "must be at least 1".to_string(),
            });
        }

        if self.concurrency == 0 {
            return Err(CrawlerError::InvalidSetting {
                name: "CONCURRENCY",
                reason: "must be at least 1".to_string(),
            });
        }

        if !(self.crawl_delay.is_finite() && self.crawl_delay >= 0.0) {
            return Err(CrawlerError::InvalidSetting {
                name: "CRAWL_DELAY",
                reason: "must be a non-negative number of seconds".to_string(),
            });
        }

        Ok(())
    }

    /// Normalized lower-case keyword, if one is set
    pub fn keyword(&self) -> Option<String> {
        let keyword = self.keyword_filter.trim().to_lowercase();
        (!keyword.is_empty()).then_some(keyword)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs_f64(self.crawl_delay)
    }

    /// Attempts per page, at least one
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let settings = CrawlSettings::from_vars(HashMap::new()).unwrap();

        assert_eq!(settings.start_url, "https://www.tum.de");
        assert_eq!(settings.max_pages, 50);
        assert_eq!(settings.max_depth, 3);
        assert_eq!(settings.concurrency, 5);
        assert_eq!(settings.graph_output, PathBuf::from("data/graph.json"));
        assert!(settings.keyword().is_none());
    }

    #[test]
    fn test_environment_overrides() {
        let settings = CrawlSettings::from_vars(vars(&[
            ("START_URL", "https://example.org/docs"),
            ("MAX_PAGES", "7"),
            ("KEYWORD_FILTER", "  Research "),
            ("CRAWL_DELAY", "0"),
            ("GRAPH_OUTPUT", "/tmp/out.json"),
        ]))
        .unwrap();

        assert_eq!(settings.start_url, "https://example.org/docs");
        assert_eq!(settings.max_pages, 7);
        assert_eq!(settings.keyword().as_deref(), Some("research"));
        assert_eq!(settings.delay(), Duration::ZERO);
        assert_eq!(settings.graph_output, PathBuf::from("/tmp/out.json"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        for pairs in [
            vec![("START_URL", "not a url")],
            vec![("MAX_PAGES", "0")],
            vec![("CONCURRENCY", "0")],
            vec![("CRAWL_DELAY", "-1")],
        ] {
            assert!(CrawlSettings::from_vars(vars(&pairs)).is_err(), "{:?}", pairs);
        }
    }

    #[test]
    fn test_unparseable_number_rejected() {
        let err = CrawlSettings::from_vars(vars(&[("MAX_PAGES", "many")])).unwrap_err();
        assert!(matches!(err, CrawlerError::Config(_)));
    }
}
