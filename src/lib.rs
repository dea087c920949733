//! # tag-graph-layout - Static layout for tag co-occurrence graphs
//!
//! Turns tag frequency and tag-pair co-occurrence statistics into a 2-D graph
//! layout that a renderer can load without running any physics itself.
//!
//! ## Pipeline
//!
//! 1. **Build** - tags become nodes sized by `sqrt(count / max_count) * 30`,
//!    pairs become edges weighted by their normalized score (pairs at or below
//!    the weight threshold are dropped)
//! 2. **Place** - every node gets a seeded Mulberry32 random position
//! 3. **Relax** - two ForceAtlas2-style phases: a long, heavily damped global
//!    pass, then a short refinement pass that respects node sizes
//! 4. **Serialize** - nodes and edges are written as a graphology-style JSON document
//!
//! ## Usage
//!
//! ```bash
//! tag-graph-layout data/result/tags.json data/result/tag-pairs.json -o graph.json
//! ```
//!
//! Identical inputs and seed always produce the same layout.

pub mod builder;
pub mod config;
pub mod graph;
pub mod layout;
pub mod logging;
pub mod pipeline;
pub mod placement;
pub mod records;
pub mod report;
pub mod serialize;

pub use builder::{
    BuildError, BuildOptions, BuildStats, DEFAULT_WEIGHT_THRESHOLD, InvalidInputError,
    ReservedTagPolicy, SIZE_SCALE, build, build_with_options,
};
pub use config::{
    ConfigError, PipelineSettings, TagLayoutConfig, find_config_file, load_config,
    load_config_file, parse_config,
};
pub use graph::{ConstructionError, Graph, GraphEdge, GraphNode, Position};
pub use layout::{
    ForceAtlasSettings, LayoutError, LayoutPlan, relax, relax_with, run_phase, validate_positions,
};
pub use pipeline::{LayoutOutcome, PipelineError, StageTimings, Stages, run, run_files};
pub use placement::{DEFAULT_SEED, Mulberry32, PlacementOptions, place_random, place_random_with};
pub use records::{InputError, PairRecord, TagRecord, load_pairs, load_tags};
pub use report::{Extent, Overlap, extent, generate_summary, overlapping_pairs};
pub use serialize::{SerializedGraph, serialize, serialize_pretty, to_document};
