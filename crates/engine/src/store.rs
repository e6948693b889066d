//! Single-slot graph store
//!
//! Holds the current graph and the last rank result computed against it.
//! Every `set_graph` bumps a generation counter; results are only accepted
//! for the generation they were computed from.

use crate::graph::Graph;
use crate::pagerank::RankResult;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Current graph together with its generation
#[derive(Debug, Clone)]
pub struct GraphSnapshot {
    pub graph: Arc<Graph>,
    pub generation: u64,
}

#[derive(Debug, Default)]
struct Slot {
    graph: Option<Arc<Graph>>,
    generation: u64,
    result: Option<Arc<RankResult>>,
}

/// Holder of the current graph and last result
#[derive(Debug, Default)]
pub struct GraphStore {
    slot: RwLock<Slot>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the graph and drop any cached result.
    ///
    /// Returns the new generation.
    pub async fn set_graph(&self, graph: Graph) -> u64 {
        let mut slot = self.slot.write().await;
        slot.generation += 1;
        slot.graph = Some(Arc::new(graph));
        slot.result = None;

        debug!(generation = slot.generation, "Graph replaced");
        slot.generation
    }

    /// Current graph, if any
    pub async fn graph(&self) -> Option<Arc<Graph>> {
        self.slot.read().await.graph.clone()
    }

    /// Current graph with the generation it was stored under
    pub async fn snapshot(&self) -> Option<GraphSnapshot> {
        let slot = self.slot.read().await;
        slot.graph.as_ref().map(|graph| GraphSnapshot {
            graph: Arc::clone(graph),
            generation: slot.generation,
        })
    }

    /// Cache a result computed from `generation`.
    ///
    /// Returns false, leaving the cache untouched, when the graph has been
    /// replaced since that generation.
    pub async fn set_result(&self, generation: u64, result: RankResult) -> bool {
        let mut slot = self.slot.write().await;
        if slot.graph.is_none() || slot.generation != generation {
            warn!(
                computed_for = generation,
                current = slot.generation,
                "Discarding rank result for a replaced graph"
            );
            return false;
        }

        slot.result = Some(Arc::new(result));
        true
    }

    /// Last result for the current graph, if any
    pub async fn result(&self) -> Option<Arc<RankResult>> {
        self.slot.read().await.result.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagerank::{rank, PageRankConfig};

    fn graph(json: &str) -> Graph {
        serde_json::from_str(json).unwrap()
    }

    #[tokio::test]
    async fn test_empty_store() {
        let store = GraphStore::new();
        assert!(store.graph().await.is_none());
        assert!(store.snapshot().await.is_none());
        assert!(store.result().await.is_none());
    }

    #[tokio::test]
    async fn test_set_result_for_current_graph() {
        let store = GraphStore::new();
        let generation = store.set_graph(graph(r#"{"A": ["B"], "B": []}"#)).await;

        let snapshot = store.snapshot().await.unwrap();
        assert_eq!(snapshot.generation, generation);

        let result = rank(&snapshot.graph, &PageRankConfig::default()).unwrap();
        assert!(store.set_result(snapshot.generation, result.clone()).await);
        assert_eq!(store.result().await.as_deref(), Some(&result));
    }

    #[tokio::test]
    async fn test_set_graph_clears_result() {
        let store = GraphStore::new();
        let generation = store.set_graph(graph(r#"{"A": []}"#)).await;
        let result = rank(&graph(r#"{"A": []}"#), &PageRankConfig::default()).unwrap();
        assert!(store.set_result(generation, result).await);

        store.set_graph(graph(r#"{"B": []}"#)).await;
        assert!(store.result().await.is_none());
    }

    #[tokio::test]
    async fn test_stale_result_refused() {
        let store = GraphStore::new();
        let stale = store.set_graph(graph(r#"{"A": ["B"]}"#)).await;
        let snapshot = store.snapshot().await.unwrap();

        // Graph replaced while the computation was outstanding
        let fresh = store.set_graph(graph(r#"{"C": []}"#)).await;
        assert!(fresh > stale);

        let result = rank(&snapshot.graph, &PageRankConfig::default()).unwrap();
        assert!(!store.set_result(stale, result).await);
        assert!(store.result().await.is_none());
    }

    #[tokio::test]
    async fn test_snapshot_outlives_replacement() {
        let store = GraphStore::new();
        store.set_graph(graph(r#"{"A": ["B"]}"#)).await;
        let snapshot = store.snapshot().await.unwrap();

        store.set_graph(graph(r#"{"C": []}"#)).await;
        assert!(snapshot.graph.contains_key("A"));
        assert!(store.graph().await.unwrap().contains_key("C"));
    }
}
