//! Append-only directed graph of finding coordinates.
//!
//! Edges are filtered to existing nodes so cyclic or dangling references
//! never occur (spec design note: "Cyclic references do not occur").

use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    nodes: BTreeSet<String>,
    edges: BTreeSet<(String, String)>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, coordinate: impl Into<String>) {
        self.nodes.insert(coordinate.into());
    }

    /// Add an edge only if both endpoints are already nodes; returns whether
    /// the edge was added.
    pub fn add_edge(&mut self, src: &str, dst: &str) -> bool {
        if self.nodes.contains(src) && self.nodes.contains(dst) {
            self.edges.insert((src.to_string(), dst.to_string()));
            true
        } else {
            false
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn dependencies_of(&self, coordinate: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|(src, _)| src == coordinate)
            .map(|(_, dst)| dst.as_str())
            .collect()
    }

    pub fn to_dict(&self) -> serde_json::Value {
        serde_json::json!({
            "nodes": self.nodes.iter().collect::<Vec<_>>(),
            "edges": self.edges.iter().map(|(a, b)| vec![a, b]).collect::<Vec<_>>(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_requires_both_endpoints_to_exist() {
        let mut graph = Graph::new();
        graph.add_node("a");
        assert!(!graph.add_edge("a", "b"));
        assert_eq!(graph.edge_count(), 0);
        graph.add_node("b");
        assert!(graph.add_edge("a", "b"));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn dependencies_of_returns_outgoing_edges() {
        let mut graph = Graph::new();
        graph.add_node("a");
        graph.add_node("b");
        graph.add_node("c");
        graph.add_edge("a", "b");
        graph.add_edge("a", "c");
        let mut deps = graph.dependencies_of("a");
        deps.sort();
        assert_eq!(deps, vec!["b", "c"]);
    }

    #[test]
    fn duplicate_edges_are_deduped() {
        let mut graph = Graph::new();
        graph.add_node("a");
        graph.add_node("b");
        graph.add_edge("a", "b");
        graph.add_edge("a", "b");
        assert_eq!(graph.edge_count(), 1);
    }
}
