//! Weighted undirected tag graph
//!
//! Nodes and edges are stored in insertion order. Relaxation iterates them by
//! index, so the order in which the builder adds records is the order in which
//! forces are accumulated.

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised when the graph structure would become inconsistent
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstructionError {
    #[error("Edge {source_id} -- {target_id} references unknown node '{missing}'")]
    UnknownNode {
        source_id: String,
        target_id: String,
        missing: String,
    },

    #[error("Node '{0}' already exists")]
    DuplicateNode(String),

    #[error("Edge {source_id} -- {target_id} already exists")]
    DuplicateEdge { source_id: String, target_id: String },

    #[error("Node '{id}' has invalid size {size}")]
    InvalidSize { id: String, size: f64 },
}

/// A 2-D point in layout space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn distance(&self, other: &Position) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// A tag in the graph
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    id: String,
    size: f64,
    pub label: String,
    pub cluster: Option<i64>,
    pub position: Position,
}

impl GraphNode {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Radius used for rendering and overlap avoidance. Fixed at build time.
    pub fn size(&self) -> f64 {
        self.size
    }
}

/// An undirected, weighted co-occurrence edge
#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge {
    source: usize,
    target: usize,
    weight: f64,
    /// Pass-through fields from the pair record
    pub attributes: Map<String, Value>,
}

impl GraphEdge {
    /// Index of the source node
    pub fn source(&self) -> usize {
        self.source
    }

    /// Index of the target node
    pub fn target(&self) -> usize {
        self.target
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// The tag graph: unique nodes keyed by id, at most one edge per unordered pair
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    index: HashMap<String, usize>,
    edge_keys: HashSet<(usize, usize)>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node at the origin, returning its index
    pub fn add_node(
        &mut self,
        id: impl Into<String>,
        size: f64,
        label: impl Into<String>,
    ) -> Result<usize, ConstructionError> {
        let id = id.into();
        if !size.is_finite() || size <= 0.0 {
            return Err(ConstructionError::InvalidSize { id, size });
        }
        if self.index.contains_key(&id) {
            return Err(ConstructionError::DuplicateNode(id));
        }

        let idx = self.nodes.len();
        self.index.insert(id.clone(), idx);
        self.nodes.push(GraphNode {
            id,
            size,
            label: label.into(),
            cluster: None,
            position: Position::ORIGIN,
        });
        Ok(idx)
    }

    /// Add an undirected edge between two existing nodes
    pub fn add_edge(
        &mut self,
        source: &str,
        target: &str,
        weight: f64,
        attributes: Map<String, Value>,
    ) -> Result<(), ConstructionError> {
        let unknown = |missing: &str| ConstructionError::UnknownNode {
            source_id: source.to_string(),
            target_id: target.to_string(),
            missing: missing.to_string(),
        };
        let s = self.node_index(source).ok_or_else(|| unknown(source))?;
        let t = self.node_index(target).ok_or_else(|| unknown(target))?;

        if !self.edge_keys.insert((s.min(t), s.max(t))) {
            return Err(ConstructionError::DuplicateEdge {
                source_id: source.to_string(),
                target_id: target.to_string(),
            });
        }

        self.edges.push(GraphEdge {
            source: s,
            target: t,
            weight,
            attributes,
        });
        Ok(())
    }

    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.node_index(id).map(|idx| &self.nodes[idx])
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut GraphNode> {
        self.node_index(id).map(move |idx| &mut self.nodes[idx])
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [GraphNode] {
        &mut self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// Find the edge joining two nodes, in either direction
    pub fn edge_between(&self, a: &str, b: &str) -> Option<&GraphEdge> {
        let (a, b) = (self.node_index(a)?, self.node_index(b)?);
        if !self.edge_keys.contains(&(a.min(b), a.max(b))) {
            return None;
        }
        self.edges
            .iter()
            .find(|e| (e.source, e.target) == (a, b) || (e.source, e.target) == (b, a))
    }

    /// Ids of an edge's endpoints
    pub fn endpoints(&self, edge: &GraphEdge) -> (&str, &str) {
        (&self.nodes[edge.source].id, &self.nodes[edge.target].id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Degree of every node, in node order. Self-loops count twice.
    pub fn degrees(&self) -> Vec<usize> {
        let mut degrees = vec![0; self.nodes.len()];
        for edge in &self.edges {
            degrees[edge.source] += 1;
            degrees[edge.target] += 1;
        }
        degrees
    }

    /// Snapshot of all positions, in node order
    pub fn positions(&self) -> Vec<Position> {
        self.nodes.iter().map(|n| n.position).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Graph {
        let mut graph = Graph::new();
        graph.add_node("a", 5.0, "a").unwrap();
        graph.add_node("b", 10.0, "b").unwrap();
        graph.add_node("c", 15.0, "c").unwrap();
        graph.add_edge("a", "b", 0.5, Map::new()).unwrap();
        graph.add_edge("b", "c", 0.9, Map::new()).unwrap();
        graph
    }

    #[test]
    fn test_add_nodes_and_edges() {
        let graph = triangle();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.node("b").unwrap().size(), 10.0);
        assert_eq!(graph.endpoints(&graph.edges()[1]), ("b", "c"));
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let mut graph = triangle();
        let err = graph.add_node("a", 1.0, "a").unwrap_err();
        assert_eq!(err, ConstructionError::DuplicateNode("a".to_string()));
    }

    #[test]
    fn test_invalid_size_rejected() {
        let mut graph = Graph::new();
        assert!(graph.add_node("z", 0.0, "z").is_err());
        assert!(graph.add_node("n", f64::NAN, "n").is_err());
        assert!(graph.is_empty());
    }

    #[test]
    fn test_unknown_endpoint_rejected() {
        let mut graph = triangle();
        let err = graph.add_edge("a", "zzz", 1.0, Map::new()).unwrap_err();
        match err {
            ConstructionError::UnknownNode { missing, .. } => assert_eq!(missing, "zzz"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_reverse_duplicate_edge_rejected() {
        let mut graph = triangle();
        let err = graph.add_edge("b", "a", 0.3, Map::new()).unwrap_err();
        assert!(matches!(err, ConstructionError::DuplicateEdge { .. }));
    }

    #[test]
    fn test_edge_between_is_symmetric() {
        let graph = triangle();
        assert_eq!(graph.edge_between("c", "b").unwrap().weight(), 0.9);
        assert!(graph.edge_between("a", "c").is_none());
    }

    #[test]
    fn test_degrees_count_self_loops_twice() {
        let mut graph = triangle();
        graph.add_edge("a", "a", 0.2, Map::new()).unwrap();
        assert_eq!(graph.degrees(), vec![3, 2, 1]);
        assert!(graph.edges()[2].is_self_loop());
    }
}
