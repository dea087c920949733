//! Configuration file support for tag-graph-layout
//!
//! This module handles parsing `.taglayout.toml` files that override the
//! builder, placement and layout defaults.
//!
//! ## Configuration File Format
//!
//! ```toml
//! # .taglayout.toml
//!
//! [graph]
//! # Pairs whose normalized weight is at or below this value are dropped
//! weight_threshold = 0.01
//!
//! # Radius of the most frequent tag
//! size_scale = 30.0
//!
//! # Tag ids that must never become node ids, and what to do with them
//! reserved_tags = ["constructor"]
//! reserved_policy = "skip"   # or "rename"
//! rename_suffix = "_"
//!
//! [placement]
//! seed = 42
//! center = 0.5
//! scale = 1.0
//!
//! [layout.global]
//! iterations = 50000
//! edge_weight_influence = 0.05
//! gravity = 0.005
//! slow_down = 1000.0
//!
//! [layout.refine]
//! iterations = 5000
//! adjust_sizes = true
//! ```
//!
//! Every key is optional; omitted keys keep their defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::builder::{BuildOptions, ReservedTagPolicy};
use crate::layout::{ForceAtlasSettings, LayoutPlan};
use crate::placement::PlacementOptions;

const CONFIG_NAMES: [&str; 2] = [".taglayout.toml", "taglayout.toml"];

/// Errors that can occur when loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Graph construction section
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct GraphConfig {
    pub weight_threshold: Option<f64>,
    pub size_scale: Option<f64>,
    pub reserved_tags: Option<Vec<String>>,
    pub reserved_policy: Option<ReservedTagPolicy>,
    pub rename_suffix: Option<String>,
}

/// Initial placement section
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PlacementConfig {
    pub seed: Option<u32>,
    pub center: Option<f64>,
    pub scale: Option<f64>,
}

/// Overrides for one relaxation phase
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PhaseConfig {
    pub iterations: Option<usize>,
    pub adjust_sizes: Option<bool>,
    pub edge_weight_influence: Option<f64>,
    pub gravity: Option<f64>,
    pub lin_log_mode: Option<bool>,
    pub outbound_attraction_distribution: Option<bool>,
    pub scaling_ratio: Option<f64>,
    pub slow_down: Option<f64>,
    pub strong_gravity_mode: Option<bool>,
}

impl PhaseConfig {
    /// Apply the overrides on top of `base`
    pub fn apply(&self, base: ForceAtlasSettings) -> ForceAtlasSettings {
        ForceAtlasSettings {
            iterations: self.iterations.unwrap_or(base.iterations),
            adjust_sizes: self.adjust_sizes.unwrap_or(base.adjust_sizes),
            edge_weight_influence: self
                .edge_weight_influence
                .unwrap_or(base.edge_weight_influence),
            gravity: self.gravity.unwrap_or(base.gravity),
            lin_log_mode: self.lin_log_mode.unwrap_or(base.lin_log_mode),
            outbound_attraction_distribution: self
                .outbound_attraction_distribution
                .unwrap_or(base.outbound_attraction_distribution),
            scaling_ratio: self.scaling_ratio.unwrap_or(base.scaling_ratio),
            slow_down: self.slow_down.unwrap_or(base.slow_down),
            strong_gravity_mode: self.strong_gravity_mode.unwrap_or(base.strong_gravity_mode),
        }
    }
}

/// Layout section: one table per phase
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct LayoutConfig {
    #[serde(default)]
    pub global: PhaseConfig,
    #[serde(default)]
    pub refine: PhaseConfig,
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TagLayoutConfig {
    #[serde(default)]
    pub graph: GraphConfig,

    #[serde(default)]
    pub placement: PlacementConfig,

    #[serde(default)]
    pub layout: LayoutConfig,
}

/// Fully resolved settings for one pipeline run
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipelineSettings {
    pub build: BuildOptions,
    pub placement: PlacementOptions,
    pub layout: LayoutPlan,
}

impl TagLayoutConfig {
    /// Resolve the file's overrides against the defaults
    pub fn resolve(&self) -> Result<PipelineSettings, ConfigError> {
        let defaults = PipelineSettings::default();

        let graph = &self.graph;
        let build = BuildOptions {
            weight_threshold: graph
                .weight_threshold
                .unwrap_or(defaults.build.weight_threshold),
            size_scale: graph.size_scale.unwrap_or(defaults.build.size_scale),
            reserved_tags: graph
                .reserved_tags
                .clone()
                .unwrap_or(defaults.build.reserved_tags),
            reserved_policy: graph
                .reserved_policy
                .unwrap_or(defaults.build.reserved_policy),
            rename_suffix: graph
                .rename_suffix
                .clone()
                .unwrap_or(defaults.build.rename_suffix),
        };
        if build.reserved_policy == ReservedTagPolicy::Rename && build.rename_suffix.is_empty() {
            return Err(invalid("graph.rename_suffix", "must not be empty"));
        }

        let placement = PlacementOptions {
            seed: self.placement.seed.unwrap_or(defaults.placement.seed),
            center: self.placement.center.unwrap_or(defaults.placement.center),
            scale: self.placement.scale.unwrap_or(defaults.placement.scale),
        };
        if !(placement.center.is_finite() && placement.scale.is_finite() && placement.scale > 0.0)
        {
            return Err(invalid(
                "placement",
                "center must be finite and scale finite and positive",
            ));
        }

        let layout = LayoutPlan {
            global: self.layout.global.apply(defaults.layout.global),
            refine: self.layout.refine.apply(defaults.layout.refine),
        };
        for (name, phase) in layout.phases() {
            validate_phase(name, phase)?;
        }

        Ok(PipelineSettings {
            build,
            placement,
            layout,
        })
    }
}

fn validate_phase(name: &str, phase: &ForceAtlasSettings) -> Result<(), ConfigError> {
    let positive = [("slow_down", phase.slow_down), ("scaling_ratio", phase.scaling_ratio)];
    for (key, value) in positive {
        if !(value.is_finite() && value > 0.0) {
            return Err(invalid(&format!("layout.{}.{}", name, key), "must be positive"));
        }
    }

    let non_negative = [
        ("gravity", phase.gravity),
        ("edge_weight_influence", phase.edge_weight_influence),
    ];
    for (key, value) in non_negative {
        if !(value.is_finite() && value >= 0.0) {
            return Err(invalid(
                &format!("layout.{}.{}", name, key),
                "must not be negative",
            ));
        }
    }
    Ok(())
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse configuration from a TOML string
pub fn parse_config(content: &str) -> Result<TagLayoutConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Load configuration for inputs located at `start_path`
///
/// Searches for `.taglayout.toml` in the given directory and parent directories.
pub fn load_config(start_path: &Path) -> Result<TagLayoutConfig, ConfigError> {
    match find_config_file(start_path) {
        Some(path) => load_config_file(&path),
        None => Ok(TagLayoutConfig::default()),
    }
}

/// Load configuration from an explicit file
pub fn load_config_file(path: &Path) -> Result<TagLayoutConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Find the config file by searching up the directory tree
pub fn find_config_file(start_path: &Path) -> Option<PathBuf> {
    let mut current = if start_path.is_file() {
        start_path.parent()?.to_path_buf()
    } else {
        start_path.to_path_buf()
    };

    loop {
        for name in &CONFIG_NAMES {
            let config_path = current.join(name);
            if config_path.exists() {
                return Some(config_path);
            }
        }

        // Move to parent directory
        if let Some(parent) = current.parent() {
            current = parent.to_path_buf();
        } else {
            break;
        }
    }

    None
}
