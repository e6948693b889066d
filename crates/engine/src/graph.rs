//! Directed graph representation
//!
//! A graph is an ordered adjacency mapping: each key is a node and maps to
//! the sequence of nodes it links to. Declared key order is preserved
//! through parsing and serialization because it fixes the engine's
//! accumulation order.
//!
//! Neighbors that never appear as a key are still nodes. They are registered
//! after all keys, in order of first appearance, with no outgoing edges.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Flattened edge view of the adjacency mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge<'a> {
    pub source: &'a str,
    pub target: &'a str,
}

/// In-memory directed graph
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    /// Adjacency list in declared key order
    adjacency: Vec<(String, Vec<String>)>,

    /// Key -> position in `adjacency`
    positions: HashMap<String, usize>,
}

/// Graph resolved to dense indices for the solver
#[derive(Debug)]
pub(crate) struct IndexedGraph<'a> {
    /// Every node, keys first, then neighbor-only nodes
    pub nodes: Vec<&'a str>,

    /// Outgoing neighbor indices, one entry per node in `nodes`
    pub adjacency: Vec<Vec<usize>>,
}

impl<'a> IndexedGraph<'a> {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

impl Graph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph with room for `capacity` keys
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            adjacency: Vec::with_capacity(capacity),
            positions: HashMap::with_capacity(capacity),
        }
    }

    /// Set the outgoing neighbors of a node.
    ///
    /// Re-inserting an existing key replaces its neighbors and keeps the
    /// key's original position.
    pub fn insert(&mut self, node: impl Into<String>, neighbors: Vec<String>) {
        let node = node.into();
        match self.positions.get(&node).copied() {
            Some(idx) => self.adjacency[idx].1 = neighbors,
            None => {
                self.positions.insert(node.clone(), self.adjacency.len());
                self.adjacency.push((node, neighbors));
            }
        }
    }

    /// Append a single edge, declaring the source as a key if needed
    pub fn add_edge(&mut self, source: impl Into<String>, target: impl Into<String>) {
        let source = source.into();
        let idx = match self.positions.get(&source).copied() {
            Some(idx) => idx,
            None => {
                self.insert(source, Vec::new());
                self.adjacency.len() - 1
            }
        };
        self.adjacency[idx].1.push(target.into());
    }

    /// Outgoing neighbors of a declared key
    pub fn neighbors(&self, node: &str) -> Option<&[String]> {
        self.positions
            .get(node)
            .map(|&idx| self.adjacency[idx].1.as_slice())
    }

    /// Whether `node` is a declared key
    pub fn contains_key(&self, node: &str) -> bool {
        self.positions.contains_key(node)
    }

    /// Declared keys in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.adjacency.iter().map(|(node, _)| node.as_str())
    }

    /// Declared adjacency in order
    pub fn adjacency(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.adjacency
            .iter()
            .map(|(node, neighbors)| (node.as_str(), neighbors.as_slice()))
    }

    /// Number of declared keys
    pub fn key_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// All nodes: declared keys, then neighbor-only nodes by first appearance
    pub fn nodes(&self) -> Vec<&str> {
        let mut nodes: Vec<&str> = self.keys().collect();
        let mut extra_seen: HashSet<&str> = HashSet::new();

        for (_, neighbors) in &self.adjacency {
            for target in neighbors {
                let target = target.as_str();
                if !self.positions.contains_key(target) && extra_seen.insert(target) {
                    nodes.push(target);
                }
            }
        }

        nodes
    }

    /// Number of nodes, including neighbor-only nodes
    pub fn node_count(&self) -> usize {
        self.nodes().len()
    }

    /// Flattened edges in adjacency order, duplicates included
    pub fn edges(&self) -> impl Iterator<Item = Edge<'_>> {
        self.adjacency.iter().flat_map(|(source, neighbors)| {
            neighbors.iter().map(move |target| Edge {
                source: source.as_str(),
                target: target.as_str(),
            })
        })
    }

    /// Total number of edges, duplicates included
    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(|(_, neighbors)| neighbors.len()).sum()
    }

    /// Resolve node ids to dense indices once
    pub(crate) fn indexed(&self) -> IndexedGraph<'_> {
        let nodes = self.nodes();
        let index: HashMap<&str, usize> = nodes
            .iter()
            .enumerate()
            .map(|(idx, &node)| (node, idx))
            .collect();

        let mut adjacency: Vec<Vec<usize>> = self
            .adjacency
            .iter()
            .map(|(_, neighbors)| neighbors.iter().map(|target| index[target.as_str()]).collect())
            .collect();

        // Neighbor-only nodes have no outgoing edges
        adjacency.resize_with(nodes.len(), Vec::new);

        IndexedGraph { nodes, adjacency }
    }
}

impl FromIterator<(String, Vec<String>)> for Graph {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        let mut graph = Graph::new();
        for (node, neighbors) in iter {
            graph.insert(node, neighbors);
        }
        graph
    }
}

impl Serialize for Graph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.adjacency.len()))?;
        for (node, neighbors) in &self.adjacency {
            map.serialize_entry(node, neighbors)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Graph {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct GraphVisitor;

        impl<'de> Visitor<'de> for GraphVisitor {
            type Value = Graph;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping node ids to arrays of neighbor ids")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Graph, A::Error> {
                let mut graph = Graph::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((node, neighbors)) = access.next_entry::<String, Vec<String>>()? {
                    graph.insert(node, neighbors);
                }
                Ok(graph)
            }
        }

        deserializer.deserialize_map(GraphVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Graph {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_parse_preserves_key_order() {
        let graph = parse(r#"{"zeta": ["alpha"], "alpha": [], "mid": ["zeta", "alpha"]}"#);
        let keys: Vec<&str> = graph.keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_serialize_round_trips_order() {
        let graph = parse(r#"{"b": ["a"], "a": ["b", "b"]}"#);
        let json = serde_json::to_string(&graph).unwrap();
        assert_eq!(json, r#"{"b":["a"],"a":["b","b"]}"#);
    }

    #[test]
    fn test_duplicate_key_last_wins_first_position() {
        let graph = parse(r#"{"A": ["B"], "B": [], "A": ["C"]}"#);
        let keys: Vec<&str> = graph.keys().collect();
        assert_eq!(keys, vec!["A", "B"]);
        assert_eq!(graph.neighbors("A").unwrap(), ["C".to_string()]);
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(serde_json::from_str::<Graph>(r#"["A", "B"]"#).is_err());
        assert!(serde_json::from_str::<Graph>(r#""A""#).is_err());
        assert!(serde_json::from_str::<Graph>(r#"{"A": "B"}"#).is_err());
        assert!(serde_json::from_str::<Graph>(r#"{"A": [1, 2]}"#).is_err());
    }

    #[test]
    fn test_neighbor_only_nodes_registered_after_keys() {
        let graph = parse(r#"{"A": ["X", "B"], "B": ["Y", "X"]}"#);
        assert_eq!(graph.nodes(), vec!["A", "B", "X", "Y"]);
        assert_eq!(graph.key_count(), 2);
        assert_eq!(graph.node_count(), 4);
    }

    #[test]
    fn test_edges_keep_duplicates() {
        let mut graph = Graph::new();
        graph.add_edge("A", "B");
        graph.add_edge("A", "B");
        graph.add_edge("B", "A");

        let edges: Vec<(&str, &str)> = graph.edges().map(|e| (e.source, e.target)).collect();
        assert_eq!(edges, vec![("A", "B"), ("A", "B"), ("B", "A")]);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_indexed_graph() {
        let graph = parse(r#"{"A": ["B", "C"], "B": ["C"]}"#);
        let indexed = graph.indexed();

        assert_eq!(indexed.nodes, vec!["A", "B", "C"]);
        assert_eq!(indexed.adjacency, vec![vec![1, 2], vec![2], vec![]]);
    }

    #[test]
    fn test_empty_graph() {
        let graph = parse("{}");
        assert!(graph.is_empty());
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edges().count(), 0);
    }
}
