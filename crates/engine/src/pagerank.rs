//! PageRank power iteration
//!
//! Every iteration starts each node at the teleportation term
//! `(1 - damping) / N` and then pushes each node's damped score along its
//! outgoing edges. A dangling node spreads its damped score evenly over all
//! N nodes, so total mass stays 1 without renormalization.
//!
//! Nodes are visited in graph order, which makes floating-point accumulation
//! order (and therefore every score bit) reproducible.

use crate::error::EngineError;
use crate::graph::Graph;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// PageRank configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRankConfig {
    /// Damping factor, open interval (0, 1)
    pub damping: f64,

    /// Convergence threshold on the L1 change between iterations
    pub tolerance: f64,

    /// Iteration budget, at least 1
    pub max_iterations: usize,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            tolerance: 1e-6,
            max_iterations: 100,
        }
    }
}

impl PageRankConfig {
    /// Reject parameters outside the solver's contract
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.damping > 0.0 && self.damping < 1.0) {
            return Err(EngineError::InvalidParameter {
                name: "damping",
                value: self.damping.to_string(),
                reason: "must be strictly between 0 and 1",
            });
        }

        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(EngineError::InvalidParameter {
                name: "tolerance",
                value: self.tolerance.to_string(),
                reason: "must be a finite positive number",
            });
        }

        if self.max_iterations == 0 {
            return Err(EngineError::InvalidParameter {
                name: "maxIter",
                value: self.max_iterations.to_string(),
                reason: "must be at least 1",
            });
        }

        Ok(())
    }
}

/// Score per node, in graph node order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scores(Vec<(String, f64)>);

impl Scores {
    /// Score of a single node
    pub fn get(&self, node: &str) -> Option<f64> {
        self.0
            .iter()
            .find(|(id, _)| id == node)
            .map(|&(_, score)| score)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(id, score)| (id.as_str(), *score))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all scores
    pub fn total(&self) -> f64 {
        self.0.iter().map(|(_, score)| score).sum()
    }

    /// Highest-scoring nodes, ties broken by node order
    pub fn top(&self, limit: usize) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self.iter().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked.truncate(limit);
        ranked
    }
}

impl Serialize for Scores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (node, score) in &self.0 {
            map.serialize_entry(node, score)?;
        }
        map.end()
    }
}

/// Outcome of one PageRank computation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankResult {
    pub scores: Scores,

    /// Completed passes
    pub iterations: usize,

    pub damping: f64,

    pub tolerance: f64,

    /// False when the iteration budget ran out first
    pub converged: bool,
}

/// Compute PageRank scores for every node of `graph`
pub fn rank(graph: &Graph, config: &PageRankConfig) -> Result<RankResult, EngineError> {
    config.validate()?;

    let indexed = graph.indexed();
    let n = indexed.len();
    if n == 0 {
        return Ok(RankResult {
            scores: Scores::default(),
            iterations: 0,
            damping: config.damping,
            tolerance: config.tolerance,
            converged: true,
        });
    }

    let n_f64 = n as f64;
    let damping = config.damping;
    let teleport = (1.0 - damping) / n_f64;

    let mut scores = vec![1.0 / n_f64; n];

    // Precompute outgoing counts
    let out_degree: Vec<usize> = indexed.adjacency.iter().map(Vec::len).collect();

    let mut iterations = config.max_iterations;
    let mut converged = false;

    for iteration in 1..=config.max_iterations {
        let mut next = vec![teleport; n];

        for (node, neighbors) in indexed.adjacency.iter().enumerate() {
            if out_degree[node] == 0 {
                let contribution = damping * (scores[node] / n_f64);
                for score in next.iter_mut() {
                    *score += contribution;
                }
            } else {
                let contribution = damping * (scores[node] / out_degree[node] as f64);
                for &target in neighbors {
                    next[target] += contribution;
                }
            }
        }

        let mut diff = 0.0;
        for (new, old) in next.iter().zip(&scores) {
            diff += (new - old).abs();
        }

        scores = next;

        if diff < config.tolerance {
            iterations = iteration;
            converged = true;
            break;
        }
    }

    let scores = indexed
        .nodes
        .iter()
        .zip(scores)
        .map(|(&node, score)| (node.to_string(), score))
        .collect();

    Ok(RankResult {
        scores: Scores(scores),
        iterations,
        damping: config.damping,
        tolerance: config.tolerance,
        converged,
    })
}
