//! Report generation for a finished layout
//!
//! Summarizes what the builder kept and dropped, where the nodes ended up, and
//! whether any node circles still overlap.

use std::io::{self, Write};

use crate::graph::Graph;
use crate::pipeline::LayoutOutcome;

/// Overlap below this many layout units is not reported
pub const OVERLAP_TOLERANCE: f64 = 0.5;

/// Axis-aligned bounds of the node circles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Extent {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Two nodes whose circles intersect
#[derive(Debug, Clone, PartialEq)]
pub struct Overlap {
    pub a: String,
    pub b: String,
    /// How far the circles intersect
    pub depth: f64,
}

/// Bounds of all node circles, `None` for an empty graph
pub fn extent(graph: &Graph) -> Option<Extent> {
    graph.nodes().iter().fold(None, |acc, node| {
        let (p, r) = (node.position, node.size());
        let current = Extent {
            min_x: p.x - r,
            max_x: p.x + r,
            min_y: p.y - r,
            max_y: p.y + r,
        };
        Some(match acc {
            None => current,
            Some(e) => Extent {
                min_x: e.min_x.min(current.min_x),
                max_x: e.max_x.max(current.max_x),
                min_y: e.min_y.min(current.min_y),
                max_y: e.max_y.max(current.max_y),
            },
        })
    })
}

/// Node pairs whose circles (radius = size) overlap by more than `tolerance`
pub fn overlapping_pairs(graph: &Graph, tolerance: f64) -> Vec<Overlap> {
    let nodes = graph.nodes();
    let mut overlaps = Vec::new();

    for (i, a) in nodes.iter().enumerate() {
        for b in &nodes[i + 1..] {
            let depth = a.size() + b.size() - a.position.distance(&b.position);
            if depth > tolerance {
                overlaps.push(Overlap {
                    a: a.id().to_string(),
                    b: b.id().to_string(),
                    depth,
                });
            }
        }
    }

    overlaps.sort_by(|x, y| y.depth.total_cmp(&x.depth));
    overlaps
}

/// Generate a summary report to the given writer
pub fn generate_summary<W: Write>(outcome: &LayoutOutcome, writer: &mut W) -> io::Result<()> {
    let graph = &outcome.graph;
    let stats = &outcome.stats;

    writeln!(writer, "Tag Graph Layout")?;
    writeln!(writer, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
    writeln!(writer)?;
    writeln!(
        writer,
        "Nodes: {} | Edges: {} | Self-loops: {}",
        graph.node_count(),
        graph.edge_count(),
        graph.edges().iter().filter(|e| e.is_self_loop()).count()
    )?;
    writeln!(
        writer,
        "Input: {} tags, {} pairs",
        stats.tags_read, stats.pairs_read
    )?;
    writeln!(
        writer,
        "Dropped pairs: {} below threshold, {} referencing skipped reserved tags",
        stats.pairs_below_threshold, stats.pairs_dropped_reserved
    )?;
    if stats.reserved_tags_sanitized > 0 {
        writeln!(
            writer,
            "⚠️ Sanitized reserved tags: {}",
            stats.reserved_tags_sanitized
        )?;
    }
    writeln!(writer)?;

    if let Some(e) = extent(graph) {
        writeln!(
            writer,
            "Extent: x [{:.2}, {:.2}] y [{:.2}, {:.2}] ({:.2} x {:.2})",
            e.min_x,
            e.max_x,
            e.min_y,
            e.max_y,
            e.width(),
            e.height()
        )?;
    }

    let overlaps = overlapping_pairs(graph, OVERLAP_TOLERANCE);
    if overlaps.is_empty() {
        writeln!(writer, "✅ No overlapping nodes")?;
    } else {
        writeln!(writer, "❌ Overlapping node pairs: {}", overlaps.len())?;
        for overlap in overlaps.iter().take(10) {
            writeln!(
                writer,
                "  {} / {}: {:.2}",
                overlap.a, overlap.b, overlap.depth
            )?;
        }
        if overlaps.len() > 10 {
            writeln!(writer, "  ... and {} more", overlaps.len() - 10)?;
        }
    }

    writeln!(writer)?;
    let t = &outcome.timings;
    writeln!(
        writer,
        "Timing: build {:.2?} | placement {:.2?} | relaxation {:.2?}",
        t.build, t.placement, t.relaxation
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::BuildStats;
    use crate::graph::Position;
    use crate::pipeline::StageTimings;
    use serde_json::Map;

    fn graph_at(positions: &[(f64, f64)]) -> Graph {
        let mut graph = Graph::new();
        for (i, &(x, y)) in positions.iter().enumerate() {
            let id = format!("n{}", i);
            graph.add_node(id.clone(), 1.0, id).unwrap();
            graph.nodes_mut()[i].position = Position::new(x, y);
        }
        graph
    }

    #[test]
    fn test_extent() {
        let graph = graph_at(&[(0.0, 0.0), (10.0, -4.0)]);
        let e = extent(&graph).unwrap();
        assert_eq!(e.min_x, -1.0);
        assert_eq!(e.max_x, 11.0);
        assert_eq!(e.min_y, -5.0);
        assert_eq!(e.width(), 12.0);
        assert_eq!(e.height(), 6.0);
        assert!(extent(&Graph::new()).is_none());
    }

    #[test]
    fn test_overlapping_pairs() {
        let graph = graph_at(&[(0.0, 0.0), (1.0, 0.0), (5.0, 0.0), (6.8, 0.0)]);
        let overlaps = overlapping_pairs(&graph, OVERLAP_TOLERANCE);

        assert_eq!(overlaps.len(), 1);
        assert_eq!(overlaps[0].a, "n0");
        assert_eq!(overlaps[0].b, "n1");
        assert_eq!(overlaps[0].depth, 1.0);
    }

    #[test]
    fn test_generate_summary() {
        let mut graph = graph_at(&[(0.0, 0.0), (0.5, 0.0), (9.0, 9.0)]);
        graph.add_edge("n0", "n1", 1.0, Map::new()).unwrap();
        let outcome = LayoutOutcome {
            graph,
            stats: BuildStats {
                tags_read: 4,
                pairs_read: 3,
                pairs_below_threshold: 1,
                reserved_tags_sanitized: 1,
                pairs_dropped_reserved: 1,
            },
            timings: StageTimings::default(),
        };

        let mut output = Vec::new();
        generate_summary(&outcome, &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();

        assert!(text.contains("Nodes: 3 | Edges: 1"));
        assert!(text.contains("1 below threshold, 1 referencing skipped reserved tags"));
        assert!(text.contains("Sanitized reserved tags: 1"));
        assert!(text.contains("Overlapping node pairs: 1"));
        assert!(text.contains("n0 / n1: 1.50"));
    }
}
