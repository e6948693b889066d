//! Crawl process launch
//!
//! Crawl parameters reach the process through its environment:
//! `START_URL`, `MAX_PAGES`, `KEYWORD_FILTER` and `GRAPH_OUTPUT`.

use linkrank_common::config::CrawlConfig;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::{Child, Command};

pub const ENV_START_URL: &str = "START_URL";
pub const ENV_MAX_PAGES: &str = "MAX_PAGES";
pub const ENV_KEYWORD_FILTER: &str = "KEYWORD_FILTER";
pub const ENV_GRAPH_OUTPUT: &str = "GRAPH_OUTPUT";

/// Parameters of one crawl job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    pub seed: String,
    pub max_pages: u32,
    pub keyword: Option<String>,
}

/// Program launched for each crawl job
#[derive(Debug, Clone)]
pub struct CrawlCommand {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl CrawlCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    pub fn from_config(config: &CrawlConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            working_dir: config.working_dir.clone(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Spawn the process with piped stdout/stderr.
    ///
    /// A relative `artifact_path` is resolved against this process's working
    /// directory so both sides agree on the file.
    pub fn spawn(&self, request: &CrawlRequest, artifact_path: &Path) -> io::Result<Child> {
        let output = if artifact_path.is_relative() {
            std::env::current_dir()?.join(artifact_path)
        } else {
            artifact_path.to_path_buf()
        };

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .env(ENV_START_URL, &request.seed)
            .env(ENV_MAX_PAGES, request.max_pages.to_string())
            .env(ENV_GRAPH_OUTPUT, &output)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match &request.keyword {
            Some(keyword) => {
                command.env(ENV_KEYWORD_FILTER, keyword);
            }
            None => {
                command.env_remove(ENV_KEYWORD_FILTER);
            }
        }

        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        command.spawn()
    }
}
