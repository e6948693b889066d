//! Crawl status state machine
//!
//! `Idle -> Running` on start, `Running -> Idle` on exit or deadline.
//! While running, every output line replaces the message and every error
//! line replaces it with an `Error:` prefix.

use serde::Serialize;
use std::time::Duration;

pub const STARTING_MESSAGE: &str = "Starting crawl...";
pub const COMPLETED_MESSAGE: &str = "Crawl completed successfully";

/// Pollable snapshot of the crawl job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStatus {
    pub running: bool,
    pub message: String,
}

/// Line emitted by the crawl process
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlEvent {
    /// Line from stdout
    Output(String),
    /// Line from stderr
    Error(String),
}

/// How the crawl process ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Process exited; `None` when killed by a signal
    Exited(Option<i32>),
    /// Deadline elapsed and the process was killed
    TimedOut(Duration),
    /// Waiting on the process failed
    WaitFailed(String),
}

impl CrawlStatus {
    pub fn starting() -> Self {
        Self {
            running: true,
            message: STARTING_MESSAGE.to_string(),
        }
    }

    pub fn finished(message: impl Into<String>) -> Self {
        Self {
            running: false,
            message: message.into(),
        }
    }

    /// Apply one output event to a running job
    pub fn apply(&mut self, event: CrawlEvent) {
        if !self.running {
            return;
        }

        self.message = match event {
            CrawlEvent::Output(line) => line,
            CrawlEvent::Error(line) => format!("Error: {}", line),
        };
    }
}

impl JobOutcome {
    /// Final message for every outcome except success
    pub fn failure_message(&self) -> Option<String> {
        match self {
            JobOutcome::Exited(Some(0)) => None,
            JobOutcome::Exited(Some(code)) => Some(format!("Crawl failed with code {}", code)),
            JobOutcome::Exited(None) => Some("Crawl terminated without an exit code".to_string()),
            JobOutcome::TimedOut(limit) => {
                Some(format!("Crawl timed out after {}s", limit.as_secs_f64()))
            }
            JobOutcome::WaitFailed(reason) => Some(format!("Crawl failed: {}", reason)),
        }
    }

    /// Label used for metrics
    pub fn label(&self) -> &'static str {
        match self {
            JobOutcome::Exited(Some(0)) => "succeeded",
            JobOutcome::Exited(_) => "failed",
            JobOutcome::TimedOut(_) => "timed_out",
            JobOutcome::WaitFailed(_) => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_replaces_message() {
        let mut status = CrawlStatus::starting();
        status.apply(CrawlEvent::Output("[1/50] Home".into()));
        status.apply(CrawlEvent::Output("[2/50] About".into()));

        assert!(status.running);
        assert_eq!(status.message, "[2/50] About");
    }

    #[test]
    fn test_error_line_keeps_running() {
        let mut status = CrawlStatus::starting();
        status.apply(CrawlEvent::Error("connection reset".into()));

        assert!(status.running);
        assert_eq!(status.message, "Error: connection reset");
    }

    #[test]
    fn test_events_ignored_once_finished() {
        let mut status = CrawlStatus::finished(COMPLETED_MESSAGE);
        status.apply(CrawlEvent::Output("late line".into()));
        assert_eq!(status.message, COMPLETED_MESSAGE);
    }

    #[test]
    fn test_failure_messages() {
        assert_eq!(JobOutcome::Exited(Some(0)).failure_message(), None);
        assert_eq!(
            JobOutcome::Exited(Some(2)).failure_message().unwrap(),
            "Crawl failed with code 2"
        );
        assert_eq!(
            JobOutcome::TimedOut(Duration::from_secs(90)).failure_message().unwrap(),
            "Crawl timed out after 90s"
        );
        assert_eq!(
            JobOutcome::TimedOut(Duration::from_millis(250)).failure_message().unwrap(),
            "Crawl timed out after 0.25s"
        );
        assert!(JobOutcome::Exited(None).failure_message().is_some());
    }

    #[test]
    fn test_status_serializes_flat() {
        let json = serde_json::to_value(CrawlStatus::starting()).unwrap();
        assert_eq!(json, serde_json::json!({"running": true, "message": "Starting crawl..."}));
    }
}
