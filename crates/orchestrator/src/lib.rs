//! LinkRank Crawl Orchestrator
//!
//! Runs at most one crawl process at a time and exposes its progress as a
//! pollable status snapshot. On a clean exit the graph artifact the process
//! wrote is loaded into the shared [`GraphStore`].

pub mod command;
pub mod error;
pub mod status;

pub use command::{CrawlCommand, CrawlRequest};
pub use error::OrchestratorError;
pub use status::{CrawlEvent, CrawlStatus, JobOutcome};

use linkrank_common::metrics::record_crawl_job;
use linkrank_engine::{GraphArtifact, GraphStore};
use status::COMPLETED_MESSAGE;
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Single-flight crawl job supervisor
#[derive(Clone)]
pub struct CrawlOrchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    command: CrawlCommand,
    store: Arc<GraphStore>,
    artifact_path: PathBuf,
    timeout: Option<Duration>,
    status: watch::Sender<CrawlStatus>,
}

impl CrawlOrchestrator {
    pub fn new(
        command: CrawlCommand,
        store: Arc<GraphStore>,
        artifact_path: impl Into<PathBuf>,
        timeout: Option<Duration>,
    ) -> Self {
        let (status, _) = watch::channel(CrawlStatus::default());

        Self {
            inner: Arc::new(Inner {
                command,
                store,
                artifact_path: artifact_path.into(),
                timeout,
                status,
            }),
        }
    }

    /// Launch a crawl job.
    ///
    /// Fails with [`OrchestratorError::Busy`] while another job is running;
    /// nothing is spawned in that case.
    pub fn start(&self, request: CrawlRequest) -> Result<Uuid, OrchestratorError> {
        let claimed = self.inner.status.send_if_modified(|status| {
            if status.running {
                return false;
            }
            *status = CrawlStatus::starting();
            true
        });

        if !claimed {
            debug!(seed = %request.seed, "Crawl rejected, job already running");
            return Err(OrchestratorError::Busy);
        }

        let child = match self
            .inner
            .command
            .spawn(&request, &self.inner.artifact_path)
        {
            Ok(child) => child,
            Err(source) => {
                error!(program = %self.inner.command.program, error = %source, "Failed to spawn crawl process");
                self.inner.status.send_replace(CrawlStatus::finished(format!(
                    "Failed to start crawl: {}",
                    source
                )));
                record_crawl_job("failed");
                return Err(OrchestratorError::Spawn {
                    program: self.inner.command.program.clone(),
                    source,
                });
            }
        };

        let job_id = Uuid::new_v4();
        info!(
            %job_id,
            seed = %request.seed,
            max_pages = request.max_pages,
            keyword = request.keyword.as_deref().unwrap_or(""),
            "Crawl job started"
        );

        let inner = Arc::clone(&self.inner);
        tokio::spawn(
            async move { inner.supervise(child).await }
                .instrument(info_span!("crawl_job", %job_id)),
        );

        Ok(job_id)
    }

    /// Current status snapshot
    pub fn status(&self) -> CrawlStatus {
        self.inner.status.borrow().clone()
    }

    /// Receiver notified on every status change
    pub fn subscribe(&self) -> watch::Receiver<CrawlStatus> {
        self.inner.status.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.inner.status.borrow().running
    }
}

impl Inner {
    async fn supervise(&self, mut child: Child) {
        let (tx, mut rx) = mpsc::channel(64);

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, tx.clone(), CrawlEvent::Output).in_current_span());
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, tx.clone(), CrawlEvent::Error).in_current_span());
        }
        drop(tx);

        let outcome = match self.timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, self.drain_and_wait(&mut rx, &mut child)).await {
                    Ok(waited) => outcome_of(waited),
                    Err(_) => {
                        if let Err(e) = child.kill().await {
                            warn!(error = %e, "Failed to kill timed out crawl process");
                        }
                        JobOutcome::TimedOut(limit)
                    }
                }
            }
            None => outcome_of(self.drain_and_wait(&mut rx, &mut child).await),
        };

        let final_status = match outcome.failure_message() {
            None => self.reload().await,
            Some(message) => {
                warn!(outcome = ?outcome, "Crawl job failed");
                CrawlStatus::finished(message)
            }
        };

        record_crawl_job(outcome.label());
        self.status.send_replace(final_status);
    }

    /// Apply output events until both pipes close, then reap the process
    async fn drain_and_wait(
        &self,
        rx: &mut mpsc::Receiver<CrawlEvent>,
        child: &mut Child,
    ) -> io::Result<ExitStatus> {
        while let Some(event) = rx.recv().await {
            self.status.send_modify(|status| status.apply(event));
        }
        child.wait().await
    }

    async fn reload(&self) -> CrawlStatus {
        match GraphArtifact::load(&self.artifact_path).await {
            Ok(artifact) => {
                let nodes = artifact.graph.key_count();
                let generation = self.store.set_graph(artifact.graph).await;
                info!(nodes, generation, "Crawl completed, graph reloaded");
                CrawlStatus::finished(COMPLETED_MESSAGE)
            }
            Err(e) => {
                error!(error = %e, "Crawl completed but graph reload failed");
                CrawlStatus::finished(format!("Crawl completed but graph reload failed: {}", e))
            }
        }
    }
}

fn outcome_of(waited: io::Result<ExitStatus>) -> JobOutcome {
    match waited {
        Ok(status) => JobOutcome::Exited(status.code()),
        Err(e) => JobOutcome::WaitFailed(e.to_string()),
    }
}

/// Send each non-empty trimmed line of `reader` as an event
async fn forward_lines<R>(
    reader: R,
    tx: mpsc::Sender<CrawlEvent>,
    event: fn(String) -> CrawlEvent,
) where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if tx.send(event(line.to_string())).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!(error = %e, "Crawl output stream failed");
                break;
            }
        }
    }
}
