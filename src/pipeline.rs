//! Builder → Placement → Relaxation orchestration
//!
//! Each stage consumes the previous stage's output. The run either produces a
//! fully laid-out graph or fails before any layout work starts.

use std::path::Path;
use std::time::{Duration, Instant};

use log::info;
use thiserror::Error;

use crate::builder::{BuildError, BuildStats, build_with_options};
use crate::config::{ConfigError, PipelineSettings};
use crate::graph::Graph;
use crate::layout::{LayoutError, relax_with, validate_positions};
use crate::placement::place_random_with;
use crate::records::{InputError, PairRecord, TagRecord, load_pairs, load_tags};

/// Errors that can abort a pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Which stages to run after building the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stages {
    /// Placement and both relaxation phases
    #[default]
    Full,
    /// Stop after the seeded initial placement
    PlacementOnly,
}

/// Wall-clock time spent in each stage
#[derive(Debug, Clone, Copy, Default)]
pub struct StageTimings {
    pub build: Duration,
    pub placement: Duration,
    pub relaxation: Duration,
}

/// A laid-out graph together with what happened while producing it
#[derive(Debug, Clone)]
pub struct LayoutOutcome {
    pub graph: Graph,
    pub stats: BuildStats,
    pub timings: StageTimings,
}

/// Run the pipeline over in-memory records
pub fn run(
    tags: &[TagRecord],
    pairs: &[PairRecord],
    settings: &PipelineSettings,
    stages: Stages,
) -> Result<LayoutOutcome, PipelineError> {
    let mut timings = StageTimings::default();

    let start = Instant::now();
    let (mut graph, stats) = build_with_options(tags, pairs, &settings.build)?;
    timings.build = start.elapsed();
    info!(
        "Built graph: {} nodes, {} edges from {} tags and {} pairs",
        graph.node_count(),
        graph.edge_count(),
        stats.tags_read,
        stats.pairs_read
    );

    let start = Instant::now();
    place_random_with(&mut graph, &settings.placement);
    validate_positions(&graph)?;
    timings.placement = start.elapsed();
    info!("Placed nodes with seed {}", settings.placement.seed);

    if stages == Stages::Full {
        info!(
            "Relaxing layout: {} + {} iterations",
            settings.layout.global.iterations, settings.layout.refine.iterations
        );
        let start = Instant::now();
        relax_with(&mut graph, &settings.layout);
        timings.relaxation = start.elapsed();
    }

    Ok(LayoutOutcome {
        graph,
        stats,
        timings,
    })
}

/// Load both input documents and run the pipeline
pub fn run_files(
    tags_path: &Path,
    pairs_path: &Path,
    settings: &PipelineSettings,
    stages: Stages,
) -> Result<LayoutOutcome, PipelineError> {
    let tags = load_tags(tags_path)?;
    let pairs = load_pairs(pairs_path)?;
    info!(
        "Loaded {} tags from '{}' and {} pairs from '{}'",
        tags.len(),
        tags_path.display(),
        pairs.len(),
        pairs_path.display()
    );
    run(&tags, &pairs, settings, stages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::InvalidInputError;
    use crate::layout::ForceAtlasSettings;

    fn quick_settings() -> PipelineSettings {
        let mut settings = PipelineSettings::default();
        settings.layout.global = ForceAtlasSettings {
            iterations: 2_000,
            ..ForceAtlasSettings::global()
        };
        settings.layout.refine = ForceAtlasSettings {
            iterations: 500,
            ..ForceAtlasSettings::refine()
        };
        settings
    }

    fn tags() -> Vec<TagRecord> {
        vec![
            TagRecord::new("a", 100),
            TagRecord::new("b", 50),
            TagRecord::new("c", 25),
        ]
    }

    fn pairs() -> Vec<PairRecord> {
        vec![
            PairRecord::new("a", "b", 40, 0.8),
            PairRecord::new("b", "c", 10, 0.1),
        ]
    }

    #[test]
    fn test_placement_only_keeps_initial_positions() {
        let settings = quick_settings();
        let outcome = run(&tags(), &pairs(), &settings, Stages::PlacementOnly).unwrap();

        let mut expected = outcome.graph.clone();
        place_random_with(&mut expected, &settings.placement);
        assert_eq!(outcome.graph.positions(), expected.positions());
        assert_eq!(outcome.timings.relaxation, Duration::ZERO);
    }

    #[test]
    fn test_full_run_moves_nodes() {
        let settings = quick_settings();
        let placed = run(&tags(), &pairs(), &settings, Stages::PlacementOnly).unwrap();
        let relaxed = run(&tags(), &pairs(), &settings, Stages::Full).unwrap();
        assert_ne!(placed.graph.positions(), relaxed.graph.positions());
    }

    #[test]
    fn test_invalid_input_aborts_before_layout() {
        let err = run(&[], &pairs(), &quick_settings(), Stages::Full).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Build(BuildError::InvalidInput(InvalidInputError::EmptyTagSet))
        ));
    }
}
