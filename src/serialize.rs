//! Output document for the rendering layer
//!
//! The laid-out graph is written in graphology's serialized-graph shape so the
//! renderer can load it as-is:
//!
//! ```json
//! {
//!   "options": { "type": "undirected", "multi": false, "allowSelfLoops": true },
//!   "attributes": {},
//!   "nodes": [{ "key": "rust", "attributes": { "size": 30.0, "label": "rust", "x": 1.5, "y": -2.0 } }],
//!   "edges": [{ "key": "e0", "source": "rust", "target": "cargo", "attributes": { "weight": 1.0 } }]
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::graph::Graph;

/// Complete serialized graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedGraph {
    pub options: GraphOptions,
    pub attributes: Map<String, Value>,
    pub nodes: Vec<SerializedNode>,
    pub edges: Vec<SerializedEdge>,
}

/// Graph-level flags describing the container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphOptions {
    #[serde(rename = "type")]
    pub graph_type: String,
    pub multi: bool,
    pub allow_self_loops: bool,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            graph_type: "undirected".to_string(),
            multi: false,
            allow_self_loops: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedNode {
    pub key: String,
    pub attributes: NodeAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeAttributes {
    pub size: f64,
    pub label: String,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedEdge {
    pub key: String,
    pub source: String,
    pub target: String,
    pub attributes: EdgeAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeAttributes {
    pub weight: f64,
    /// Pass-through fields from the pair record
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Convert a graph to its output document
pub fn to_document(graph: &Graph) -> SerializedGraph {
    let nodes = graph
        .nodes()
        .iter()
        .map(|node| SerializedNode {
            key: node.id().to_string(),
            attributes: NodeAttributes {
                size: node.size(),
                label: node.label.clone(),
                x: node.position.x,
                y: node.position.y,
                cluster: node.cluster,
            },
        })
        .collect();

    let edges = graph
        .edges()
        .iter()
        .enumerate()
        .map(|(edge_id, edge)| {
            let (source, target) = graph.endpoints(edge);
            let mut extra = edge.attributes.clone();
            // The computed weight wins over any pass-through field of the same name
            extra.remove("weight");
            SerializedEdge {
                key: format!("e{}", edge_id),
                source: source.to_string(),
                target: target.to_string(),
                attributes: EdgeAttributes {
                    weight: edge.weight(),
                    extra,
                },
            }
        })
        .collect();

    SerializedGraph {
        options: GraphOptions::default(),
        attributes: Map::new(),
        nodes,
        edges,
    }
}

/// Serialize a graph to compact JSON bytes
pub fn serialize(graph: &Graph) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(&to_document(graph))
}

/// Serialize a graph to indented JSON bytes
pub fn serialize_pretty(graph: &Graph) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec_pretty(&to_document(graph))
}
