//! Two-phase force-directed relaxation
//!
//! A ForceAtlas2-style simulation with direct pairwise repulsion:
//!
//! 1. **Repulsion** between every pair of nodes, proportional to the product of
//!    their masses (`1 + degree`). With `adjust_sizes` the distance is measured
//!    between circle borders and overlapping nodes are pushed apart hard.
//! 2. **Gravity** pulling every node toward the origin, so disconnected
//!    components cannot drift away.
//! 3. **Attraction** along edges, scaled by `weight ^ edge_weight_influence`.
//!    In LinLog mode the pull grows with `ln(1 + distance)`.
//!
//! Each node then moves by its net force times an adaptive speed derived from
//! how much its force is oscillating ("swinging") versus pushing steadily in one
//! direction ("traction"), divided by `slow_down`.
//!
//! Every iteration reads one snapshot of positions and only writes the new ones
//! once all forces are known. Forces for a node are summed in a fixed order, so
//! results do not depend on whether accumulation ran on the rayon pool.

use std::time::Instant;

use log::debug;
use rayon::prelude::*;
use thiserror::Error;

use crate::graph::{Graph, Position};

/// Node count from which force accumulation runs on the rayon pool
const PARALLEL_THRESHOLD: usize = 128;

/// Upper bound on a single displacement when node sizes are respected
const MAX_STEP: f64 = 10.0;

/// Overlap repulsion multiplier when node sizes are respected
const OVERLAP_REPULSION: f64 = 100.0;

/// Errors detected before relaxation starts
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("Node '{id}' has non-finite position ({x}, {y})")]
    NonFinitePosition { id: String, x: f64, y: f64 },
}

/// Tuning for a single relaxation phase
#[derive(Debug, Clone, PartialEq)]
pub struct ForceAtlasSettings {
    /// Fixed iteration budget; there is no convergence test
    pub iterations: usize,
    /// Measure distances between node borders and push overlapping nodes apart
    pub adjust_sizes: bool,
    /// Exponent applied to edge weights (0 ignores weights, 1 uses them as-is)
    pub edge_weight_influence: f64,
    /// Strength of the pull toward the origin
    pub gravity: f64,
    /// Logarithmic attraction, which tightens clusters
    pub lin_log_mode: bool,
    /// Divide attraction by the source node's mass, pushing hubs to the border
    pub outbound_attraction_distribution: bool,
    /// Repulsion coefficient
    pub scaling_ratio: f64,
    /// Step damping; larger values give smaller, steadier steps
    pub slow_down: f64,
    /// Gravity independent of distance to the origin
    pub strong_gravity_mode: bool,
}

impl ForceAtlasSettings {
    /// Coarse structure discovery: weak weights, weak gravity, heavy damping
    pub fn global() -> Self {
        Self {
            iterations: 50_000,
            adjust_sizes: false,
            edge_weight_influence: 0.05,
            gravity: 0.005,
            lin_log_mode: true,
            outbound_attraction_distribution: false,
            scaling_ratio: 1.0,
            slow_down: 1000.0,
            strong_gravity_mode: false,
        }
    }

    /// Local refinement: full weights, moderate gravity, overlap avoidance
    pub fn refine() -> Self {
        Self {
            iterations: 5_000,
            adjust_sizes: true,
            edge_weight_influence: 1.0,
            gravity: 0.05,
            lin_log_mode: true,
            outbound_attraction_distribution: false,
            scaling_ratio: 1.0,
            slow_down: 1.0,
            strong_gravity_mode: false,
        }
    }
}

/// The two phases run back to back over the same graph
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutPlan {
    pub global: ForceAtlasSettings,
    pub refine: ForceAtlasSettings,
}

impl Default for LayoutPlan {
    fn default() -> Self {
        Self {
            global: ForceAtlasSettings::global(),
            refine: ForceAtlasSettings::refine(),
        }
    }
}

impl LayoutPlan {
    /// Phases in execution order, with their names
    pub fn phases(&self) -> [(&'static str, &ForceAtlasSettings); 2] {
        [("global", &self.global), ("refine", &self.refine)]
    }
}

/// Reject graphs whose positions cannot be relaxed
pub fn validate_positions(graph: &Graph) -> Result<(), LayoutError> {
    match graph.nodes().iter().find(|n| !n.position.is_finite()) {
        Some(node) => Err(LayoutError::NonFinitePosition {
            id: node.id().to_string(),
            x: node.position.x,
            y: node.position.y,
        }),
        None => Ok(()),
    }
}

/// Relax the graph with the default two-phase plan
pub fn relax(graph: &mut Graph) {
    relax_with(graph, &LayoutPlan::default());
}

/// Relax the graph with a custom plan; phase 2 continues from phase 1's result
pub fn relax_with(graph: &mut Graph, plan: &LayoutPlan) {
    for (name, settings) in plan.phases() {
        let start = Instant::now();
        run_phase(graph, settings);
        debug!(
            "Layout phase '{}' finished: {} iterations over {} nodes in {:.2?}",
            name,
            settings.iterations,
            graph.node_count(),
            start.elapsed()
        );
    }
}

/// Run one phase over the graph's current positions
pub fn run_phase(graph: &mut Graph, settings: &ForceAtlasSettings) {
    let parallel = graph.node_count() >= PARALLEL_THRESHOLD;
    run_phase_with(graph, settings, parallel);
}

fn run_phase_with(graph: &mut Graph, settings: &ForceAtlasSettings, parallel: bool) {
    if graph.is_empty() || settings.iterations == 0 {
        return;
    }

    let mut simulation = Simulation::new(graph, settings);
    let mut positions = graph.positions();

    for _ in 0..settings.iterations {
        let forces = simulation.forces(&positions, parallel);
        simulation.apply(&forces, &mut positions);
    }

    for (node, position) in graph.nodes_mut().iter_mut().zip(positions) {
        node.position = position;
    }
}

/// An edge as seen from one of its endpoints
#[derive(Debug, Clone, Copy)]
struct Spring {
    other: usize,
    /// Edge weight raised to the edge weight influence
    strength: f64,
    /// Mass of the edge's source node, used by outbound attraction distribution
    source_mass: f64,
}

/// Per-node motion carried between iterations
#[derive(Debug, Clone, Copy)]
struct Motion {
    old_dx: f64,
    old_dy: f64,
    convergence: f64,
}

impl Default for Motion {
    fn default() -> Self {
        Self {
            old_dx: 0.0,
            old_dy: 0.0,
            convergence: 1.0,
        }
    }
}

struct Simulation<'a> {
    settings: &'a ForceAtlasSettings,
    sizes: Vec<f64>,
    masses: Vec<f64>,
    springs: Vec<Vec<Spring>>,
    attraction_coefficient: f64,
    motion: Vec<Motion>,
}

impl<'a> Simulation<'a> {
    fn new(graph: &Graph, settings: &'a ForceAtlasSettings) -> Self {
        let n = graph.node_count();
        let sizes: Vec<f64> = graph.nodes().iter().map(|node| node.size()).collect();
        let masses: Vec<f64> = graph
            .degrees()
            .into_iter()
            .map(|degree| 1.0 + degree as f64)
            .collect();

        let mut springs = vec![Vec::new(); n];
        for edge in graph.edges().iter().filter(|e| !e.is_self_loop()) {
            let (s, t) = (edge.source(), edge.target());
            let strength = edge_strength(edge.weight(), settings.edge_weight_influence);
            let source_mass = masses[s];
            springs[s].push(Spring {
                other: t,
                strength,
                source_mass,
            });
            springs[t].push(Spring {
                other: s,
                strength,
                source_mass,
            });
        }

        let attraction_coefficient = if settings.outbound_attraction_distribution {
            masses.iter().sum::<f64>() / n as f64
        } else {
            1.0
        };

        Self {
            settings,
            sizes,
            masses,
            springs,
            attraction_coefficient,
            motion: vec![Motion::default(); n],
        }
    }

    fn forces(&self, positions: &[Position], parallel: bool) -> Vec<(f64, f64)> {
        if parallel {
            (0..positions.len())
                .into_par_iter()
                .map(|i| self.force_on(i, positions))
                .collect()
        } else {
            (0..positions.len())
                .map(|i| self.force_on(i, positions))
                .collect()
        }
    }

    /// Net force on node `i` for the given snapshot
    fn force_on(&self, i: usize, positions: &[Position]) -> (f64, f64) {
        let s = self.settings;
        let p = positions[i];
        let (mass, size) = (self.masses[i], self.sizes[i]);
        let (mut fx, mut fy) = (0.0, 0.0);

        // Repulsion
        for (j, q) in positions.iter().enumerate() {
            if j == i {
                continue;
            }
            let (xd, yd) = (p.x - q.x, p.y - q.y);
            let factor = if s.adjust_sizes {
                let distance = (xd * xd + yd * yd).sqrt() - size - self.sizes[j];
                if distance > 0.0 {
                    s.scaling_ratio * mass * self.masses[j] / distance / distance
                } else if distance < 0.0 {
                    OVERLAP_REPULSION * s.scaling_ratio * mass * self.masses[j]
                } else {
                    0.0
                }
            } else {
                let distance_sq = xd * xd + yd * yd;
                if distance_sq > 0.0 {
                    s.scaling_ratio * mass * self.masses[j] / distance_sq
                } else {
                    0.0
                }
            };
            fx += xd * factor;
            fy += yd * factor;
        }

        // Gravity
        let distance = (p.x * p.x + p.y * p.y).sqrt();
        if distance > 0.0 {
            let factor = if s.strong_gravity_mode {
                s.gravity * mass
            } else {
                s.gravity * mass / distance
            };
            fx -= p.x * factor;
            fy -= p.y * factor;
        }

        // Attraction
        for spring in &self.springs[i] {
            let q = positions[spring.other];
            let (xd, yd) = (p.x - q.x, p.y - q.y);
            let mut coefficient = self.attraction_coefficient * spring.strength;
            if s.outbound_attraction_distribution {
                coefficient /= spring.source_mass;
            }

            let mut distance = (xd * xd + yd * yd).sqrt();
            if s.adjust_sizes {
                distance -= size + self.sizes[spring.other];
            }

            let factor = if distance > 0.0 {
                if s.lin_log_mode {
                    -coefficient * distance.ln_1p() / distance
                } else {
                    -coefficient
                }
            } else if !s.adjust_sizes && !s.lin_log_mode {
                -coefficient
            } else {
                0.0
            };
            fx += xd * factor;
            fy += yd * factor;
        }

        (fx, fy)
    }

    /// Move every node by its force, scaled by its adaptive speed
    fn apply(&mut self, forces: &[(f64, f64)], positions: &mut [Position]) {
        let s = self.settings;

        for (i, &(dx, dy)) in forces.iter().enumerate() {
            let motion = &mut self.motion[i];
            let mass = self.masses[i];

            let swinging =
                mass * ((motion.old_dx - dx).powi(2) + (motion.old_dy - dy).powi(2)).sqrt();
            let traction =
                ((motion.old_dx + dx).powi(2) + (motion.old_dy + dy).powi(2)).sqrt() / 2.0;
            let damping = 1.0 + swinging.sqrt();
            let force_sq = dx * dx + dy * dy;

            let speed = if s.adjust_sizes { 0.1 } else { motion.convergence };
            let node_speed = speed * traction.ln_1p() / damping;
            motion.convergence = (node_speed * force_sq / damping).sqrt().min(1.0);
            motion.old_dx = dx;
            motion.old_dy = dy;

            let factor = if s.adjust_sizes {
                let force = force_sq.sqrt();
                if force > 0.0 {
                    (node_speed * force).min(MAX_STEP) / force / s.slow_down
                } else {
                    0.0
                }
            } else {
                node_speed / s.slow_down
            };

            positions[i].x += dx * factor;
            positions[i].y += dy * factor;
        }
    }
}

fn edge_strength(weight: f64, influence: f64) -> f64 {
    if influence == 0.0 {
        1.0
    } else if influence == 1.0 {
        weight
    } else {
        weight.powf(influence)
    }
}
