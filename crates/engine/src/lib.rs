//! LinkRank Engine
//!
//! Ranks the nodes of a directed graph by structural importance:
//! - Ordered adjacency-list graph model
//! - PageRank power iteration with dangling-node redistribution
//! - Single-slot graph store with stale-result protection
//! - Graph artifact loading and saving

pub mod artifact;
pub mod error;
pub mod graph;
pub mod pagerank;
pub mod store;

pub use artifact::GraphArtifact;
pub use error::EngineError;
pub use graph::{Edge, Graph};
pub use pagerank::{rank, PageRankConfig, RankResult, Scores};
pub use store::{GraphSnapshot, GraphStore};
