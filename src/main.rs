//! tag-graph-layout CLI - Static layout for tag co-occurrence graphs
//!
//! Reads tag and tag-pair statistics, lays the graph out with a two-phase
//! force simulation, and writes the render-ready JSON document.
//!
//! Usage:
//!   tag-graph-layout [OPTIONS] <TAGS> <PAIRS>

use std::fs::File;
use std::io::{BufWriter, Write, stderr, stdout};
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use clap::{ArgAction, Parser};
use log::{info, warn};

use tag_graph_layout::{
    Stages, TagLayoutConfig, generate_summary, load_config, load_config_file, logging, run_files,
    serialize, serialize_pretty,
};

/// tag-graph-layout - Precompute a force-directed layout of tag co-occurrences
#[derive(Parser, Debug)]
#[command(name = "tag-graph-layout")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Tag statistics document (JSON array of {tag, count, cluster})
    tags: PathBuf,

    /// Tag-pair statistics document (JSON array of {tag1, tag2, pairCount, pairCountNormalized})
    pairs: PathBuf,

    /// Output file for the graph document (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Config file path (default: search for .taglayout.toml next to the tag file)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Drop pairs whose normalized weight is at or below this value
    #[arg(long)]
    threshold: Option<f64>,

    /// Seed for the initial random placement
    #[arg(long)]
    seed: Option<u32>,

    /// Iterations of the global layout phase
    #[arg(long, value_name = "N")]
    global_iterations: Option<usize>,

    /// Iterations of the refinement layout phase
    #[arg(long, value_name = "N")]
    refine_iterations: Option<usize>,

    /// Stop after the initial placement (no relaxation)
    #[arg(long)]
    placement_only: bool,

    /// Pretty-print the output document
    #[arg(long)]
    pretty: bool,

    /// Print a layout summary to stderr
    #[arg(short, long)]
    summary: bool,

    /// Verbose output (repeat for more detail)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Show timing information
    #[arg(long)]
    timing: bool,

    /// Number of threads for parallel force accumulation (default: all CPU cores)
    #[arg(long, short = 'j', value_name = "N")]
    jobs: Option<usize>,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if let Err(e) = logging::init(args.verbose) {
        eprintln!("Warning: Could not install logger: {}", e);
    }

    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .unwrap_or_else(|e| warn!("Could not set thread count: {}", e));
    }
    info!(
        "Using {} thread(s) for force accumulation",
        rayon::current_num_threads()
    );

    let total_start = Instant::now();

    // Load configuration file
    let config: TagLayoutConfig = match &args.config {
        Some(path) => load_config_file(path)?,
        None => load_config(&args.tags)?,
    };
    let mut settings = config.resolve()?;

    // CLI args override config, which overrides defaults
    if let Some(threshold) = args.threshold {
        settings.build.weight_threshold = threshold;
    }
    if let Some(seed) = args.seed {
        settings.placement.seed = seed;
    }
    if let Some(iterations) = args.global_iterations {
        settings.layout.global.iterations = iterations;
    }
    if let Some(iterations) = args.refine_iterations {
        settings.layout.refine.iterations = iterations;
    }

    let stages = if args.placement_only {
        Stages::PlacementOnly
    } else {
        Stages::Full
    };

    let outcome = run_files(&args.tags, &args.pairs, &settings, stages)?;

    let bytes = if args.pretty {
        serialize_pretty(&outcome.graph)?
    } else {
        serialize(&outcome.graph)?
    };

    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(stdout()),
    };
    writer.write_all(&bytes)?;
    writer.flush()?;

    // Notify about output file
    if let Some(path) = &args.output {
        info!("Graph written to: {}", path.display());
    }

    if args.summary {
        generate_summary(&outcome, &mut stderr())?;
    }

    if args.timing {
        let t = &outcome.timings;
        eprintln!(
            "Build: {:.2?} | Placement: {:.2?} | Relaxation: {:.2?} | Total: {:.2?}",
            t.build,
            t.placement,
            t.relaxation,
            total_start.elapsed()
        );
    }

    Ok(())
}
