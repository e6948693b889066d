//! LinkRank acquisition crawler
//!
//! Crawls one site breadth-first and writes the link graph artifact the
//! gateway loads. Progress goes to stdout one line per page; diagnostics go
//! to stderr.

mod crawl;
mod error;
mod fetch;
mod settings;
mod urls;

use crate::crawl::{crawl, CrawlOutcome};
use crate::error::Result;
use crate::fetch::HttpSource;
use crate::settings::CrawlSettings;
use linkrank_engine::GraphArtifact;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("CRAWLER_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Crawl failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let settings = CrawlSettings::from_env()?;
    let source = HttpSource::new(settings.attempts())?;

    let outcome = crawl(&source, &settings, |line| println!("{}", line)).await?;
    let pages = outcome.graph.key_count();
    let elapsed = outcome.elapsed.as_secs_f64();

    let artifact = build_artifact(outcome, &settings);
    artifact.save(&settings.graph_output).await?;

    match settings.keyword() {
        Some(_) => println!(
            "Crawled {} pages matching '{}' in {:.1}s",
            pages,
            settings.keyword_filter.trim(),
            elapsed
        ),
        None => println!("Crawled {} pages in {:.1}s", pages, elapsed),
    }

    Ok(())
}

fn build_artifact(outcome: CrawlOutcome, settings: &CrawlSettings) -> GraphArtifact {
    let total_time = (outcome.elapsed.as_secs_f64() * 100.0).round() / 100.0;
    let crawl_info = serde_json::json!({
        "max_pages": settings.max_pages,
        "pages_crawled": outcome.graph.key_count(),
        "source": settings.start_url,
        "keyword_filter": settings.keyword(),
        "total_time": total_time,
        "crawled_at": chrono::Utc::now().to_rfc3339(),
    });

    GraphArtifact {
        graph: outcome.graph,
        titles: Some(outcome.titles),
        crawl_info: Some(crawl_info),
    }
}
