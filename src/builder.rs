//! Graph construction from tag and pair statistics
//!
//! - Node size: `sqrt(count / max_count) * size_scale`
//! - Edge weight: `pair_count_normalized / max(pair_count_normalized)`, kept only
//!   when strictly above the weight threshold
//! - Reserved tag ids are sanitized before any node or edge is created
//!
//! Records are processed in input order so that the built graph, and therefore
//! the layout, is reproducible.

use std::collections::HashSet;

use log::{debug, warn};
use serde::Deserialize;
use thiserror::Error;

use crate::graph::{ConstructionError, Graph};
use crate::records::{PairRecord, TagRecord};

/// Default weight threshold below which pairs are dropped
pub const DEFAULT_WEIGHT_THRESHOLD: f64 = 0.01;

/// Default radius of the most frequent tag
pub const SIZE_SCALE: f64 = 30.0;

/// Tag ids that used to break dynamic-object graph containers
pub const DEFAULT_RESERVED_TAGS: &[&str] = &["constructor"];

const MIN_NODE_SIZE: f64 = 1e-6;

/// Malformed or degenerate input, detected before any layout work
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidInputError {
    #[error("Tag set is empty")]
    EmptyTagSet,

    #[error("All tag counts are zero; node sizes are undefined")]
    AllCountsZero,

    #[error("Duplicate tag '{0}'")]
    DuplicateTag(String),

    #[error("Pair {tag1} -- {tag2} has invalid pairCountNormalized {value} (expected a value in [0, 1])")]
    InvalidPairScore {
        tag1: String,
        tag2: String,
        value: f64,
    },

    #[error("Maximum pairCountNormalized is zero; edge weights are undefined")]
    ZeroPairScoreMax,

    #[error("Weight threshold {0} is outside [0, 1)")]
    InvalidThreshold(f64),

    #[error("Size scale {0} must be positive")]
    InvalidSizeScale(f64),
}

/// Errors that can occur while building the graph
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    #[error("Construction error: {0}")]
    Construction(#[from] ConstructionError),
}

/// What to do with a tag whose id is reserved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservedTagPolicy {
    /// Drop the tag and every pair that references it
    #[default]
    Skip,
    /// Keep the tag under a suffixed id
    Rename,
}

/// Tuning for graph construction
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOptions {
    pub weight_threshold: f64,
    pub size_scale: f64,
    pub reserved_tags: Vec<String>,
    pub reserved_policy: ReservedTagPolicy,
    pub rename_suffix: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            weight_threshold: DEFAULT_WEIGHT_THRESHOLD,
            size_scale: SIZE_SCALE,
            reserved_tags: DEFAULT_RESERVED_TAGS.iter().map(|s| s.to_string()).collect(),
            reserved_policy: ReservedTagPolicy::Skip,
            rename_suffix: "_".to_string(),
        }
    }
}

/// Counters describing what the builder kept and dropped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub tags_read: usize,
    pub pairs_read: usize,
    /// Pairs at or below the weight threshold
    pub pairs_below_threshold: usize,
    /// Reserved tags that were skipped or renamed
    pub reserved_tags_sanitized: usize,
    /// Pairs dropped because an endpoint was a skipped reserved tag
    pub pairs_dropped_reserved: usize,
}

/// Build a graph with the default options and the given threshold
pub fn build(
    tags: &[TagRecord],
    pairs: &[PairRecord],
    weight_threshold: f64,
) -> Result<Graph, BuildError> {
    let options = BuildOptions {
        weight_threshold,
        ..BuildOptions::default()
    };
    build_with_options(tags, pairs, &options).map(|(graph, _)| graph)
}

/// Build a graph, returning it together with build statistics
pub fn build_with_options(
    tags: &[TagRecord],
    pairs: &[PairRecord],
    options: &BuildOptions,
) -> Result<(Graph, BuildStats), BuildError> {
    validate_options(options)?;

    let sanitizer = Sanitizer::new(options);
    let mut stats = BuildStats {
        tags_read: tags.len(),
        pairs_read: pairs.len(),
        ..BuildStats::default()
    };

    if tags.is_empty() {
        return Err(InvalidInputError::EmptyTagSet.into());
    }

    let max_count = tags.iter().map(|t| t.count).max().unwrap_or(0);
    if max_count == 0 {
        return Err(InvalidInputError::AllCountsZero.into());
    }

    let max_pair_score = max_pair_score(pairs)?;

    let mut graph = Graph::new();
    let mut seen = HashSet::with_capacity(tags.len());

    for tag in tags {
        let Some(id) = sanitizer.resolve(&tag.tag) else {
            warn!("Reserved tag '{}' skipped during ingestion", tag.tag);
            stats.reserved_tags_sanitized += 1;
            continue;
        };
        if sanitizer.is_reserved(&tag.tag) {
            warn!("Reserved tag '{}' renamed to '{}' during ingestion", tag.tag, id);
            stats.reserved_tags_sanitized += 1;
        }

        if !seen.insert(id.clone()) {
            return Err(InvalidInputError::DuplicateTag(id).into());
        }

        let size = node_size(tag.count, max_count, options.size_scale);
        let idx = graph.add_node(id.clone(), size, id)?;
        graph.nodes_mut()[idx].cluster = tag.cluster;
    }

    if let Some(max_score) = max_pair_score {
        for pair in pairs {
            let (Some(source), Some(target)) =
                (sanitizer.resolve(&pair.tag1), sanitizer.resolve(&pair.tag2))
            else {
                warn!(
                    "Pair {} -- {} dropped: references a skipped reserved tag",
                    pair.tag1, pair.tag2
                );
                stats.pairs_dropped_reserved += 1;
                continue;
            };

            // Unknown endpoints are an upstream data bug, whatever the pair's weight.
            for id in [&source, &target] {
                if graph.node_index(id).is_none() {
                    return Err(ConstructionError::UnknownNode {
                        source_id: source.clone(),
                        target_id: target.clone(),
                        missing: id.clone(),
                    }
                    .into());
                }
            }

            let weight = pair.pair_count_normalized / max_score;
            if weight <= options.weight_threshold {
                stats.pairs_below_threshold += 1;
                continue;
            }

            graph.add_edge(&source, &target, weight, pair.extra.clone())?;
        }
    }

    debug!(
        "Built graph: {} nodes, {} edges ({} pairs below threshold {})",
        graph.node_count(),
        graph.edge_count(),
        stats.pairs_below_threshold,
        options.weight_threshold
    );

    Ok((graph, stats))
}

/// `sqrt(count / max_count) * scale`, floored so zero-count tags keep a positive radius
fn node_size(count: u64, max_count: u64, scale: f64) -> f64 {
    let size = (count as f64 / max_count as f64).sqrt() * scale;
    size.max(MIN_NODE_SIZE)
}

fn validate_options(options: &BuildOptions) -> Result<(), InvalidInputError> {
    if !(0.0..1.0).contains(&options.weight_threshold) {
        return Err(InvalidInputError::InvalidThreshold(options.weight_threshold));
    }
    if !(options.size_scale.is_finite() && options.size_scale > 0.0) {
        return Err(InvalidInputError::InvalidSizeScale(options.size_scale));
    }
    Ok(())
}

/// Maximum `pair_count_normalized` over all pairs, `None` when there are no pairs
fn max_pair_score(pairs: &[PairRecord]) -> Result<Option<f64>, InvalidInputError> {
    let mut max: Option<f64> = None;
    for pair in pairs {
        let value = pair.pair_count_normalized;
        if !(0.0..=1.0).contains(&value) {
            return Err(InvalidInputError::InvalidPairScore {
                tag1: pair.tag1.clone(),
                tag2: pair.tag2.clone(),
                value,
            });
        }
        max = Some(max.map_or(value, |m: f64| m.max(value)));
    }

    match max {
        Some(m) if m <= 0.0 => Err(InvalidInputError::ZeroPairScoreMax),
        other => Ok(other),
    }
}

/// Maps raw tag ids to graph ids according to the reserved-tag policy
struct Sanitizer<'a> {
    reserved: HashSet<&'a str>,
    policy: ReservedTagPolicy,
    suffix: &'a str,
}

impl<'a> Sanitizer<'a> {
    fn new(options: &'a BuildOptions) -> Self {
        Self {
            reserved: options.reserved_tags.iter().map(String::as_str).collect(),
            policy: options.reserved_policy,
            suffix: &options.rename_suffix,
        }
    }

    fn is_reserved(&self, tag: &str) -> bool {
        self.reserved.contains(tag)
    }

    /// Graph id for a tag, `None` when the tag is skipped
    fn resolve(&self, tag: &str) -> Option<String> {
        if !self.is_reserved(tag) {
            return Some(tag.to_string());
        }
        match self.policy {
            ReservedTagPolicy::Skip => None,
            ReservedTagPolicy::Rename => Some(format!("{}{}", tag, self.suffix)),
        }
    }
}
