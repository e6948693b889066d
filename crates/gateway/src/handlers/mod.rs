//! API handlers module

pub mod crawl;
pub mod graph;
pub mod health;
pub mod pagerank;
