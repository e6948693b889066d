//! Graph artifact file
//!
//! The crawler writes one JSON document:
//! `{"graph": {...}, "titles": {...}, "crawl_info": {...}}`.
//! Only `graph` is required.

use crate::error::EngineError;
use crate::graph::Graph;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphArtifact {
    pub graph: Graph,

    /// Display title per node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub titles: Option<BTreeMap<String, String>>,

    /// Opaque crawl metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crawl_info: Option<serde_json::Value>,
}

impl GraphArtifact {
    /// Artifact holding just a graph
    pub fn new(graph: Graph) -> Self {
        Self {
            graph,
            titles: None,
            crawl_info: None,
        }
    }

    /// Read and parse the artifact at `path`
    pub async fn load(path: &Path) -> Result<Self, EngineError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| EngineError::ArtifactIo {
                path: path.to_path_buf(),
                source,
            })?;

        let artifact: Self =
            serde_json::from_slice(&bytes).map_err(|source| EngineError::ArtifactFormat {
                path: path.to_path_buf(),
                source,
            })?;

        debug!(
            path = %path.display(),
            nodes = artifact.graph.key_count(),
            "Graph artifact loaded"
        );
        Ok(artifact)
    }

    /// Write the artifact to `path`, replacing any previous file.
    ///
    /// The document is written to a sibling temp file first and renamed into
    /// place, so readers never observe a partial write.
    pub async fn save(&self, path: &Path) -> Result<(), EngineError> {
        let io_err = |source| EngineError::ArtifactIo {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let body = serde_json::to_vec_pretty(self).map_err(|source| EngineError::ArtifactFormat {
            path: path.to_path_buf(),
            source,
        })?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, path).await.map_err(io_err)?;

        Ok(())
    }
}
