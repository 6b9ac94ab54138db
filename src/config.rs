//! Construction time parameters.
//!
//! Every struct has a `Default` matching the classic fire effect and deserializes
//! with missing fields filled from it, so a partial config file is enough.

use serde::{Deserialize, Serialize};

use crate::d2::EdgePolicy;
use crate::fire::PerturbationCoupling;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub width: usize,
    pub height: usize,
    pub edge_policy: EdgePolicy,
    /// m²/s
    pub diffusion: f32,
    /// m²/s
    pub viscosity: f32,
    /// Edge length of a cell in m.
    pub cell_size: f32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            width: 200,
            height: 160,
            edge_policy: EdgePolicy::Wrap,
            diffusion: 0.0001,
            viscosity: 0.0001,
            cell_size: 0.01,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Simulated seconds per update.
    pub step_size: f64,
    /// Longest wall-clock frame that is caught up on, in seconds.
    pub max_frame_time: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            step_size: 0.02,
            // 25 steps
            max_frame_time: 0.5,
        }
    }
}

/// Parameters of the stochastic fire rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FireParams {
    /// Per cell and step chance of a small spark.
    pub spark_probability: f32,
    pub spark_offset: f32,
    pub spark_spread: f32,
    /// Per cell and step chance of a large flare.
    pub flare_probability: f32,
    pub flare_offset: f32,
    pub flare_spread: f32,
    /// Upper bound of the uniform cooldown subtracted from every blended cell.
    pub cooldown: f32,
    pub source_base: f32,
    pub source_gain: f32,
    /// Lower bound of the normal sample driving the bottom row.
    pub source_floor: f32,
    pub coupling: PerturbationCoupling,
}

impl Default for FireParams {
    fn default() -> Self {
        Self {
            spark_probability: 0.0001,
            spark_offset: 0.0,
            spark_spread: 0.2,
            flare_probability: 0.00002,
            flare_offset: 0.5,
            flare_spread: 2.0,
            cooldown: 0.01,
            source_base: 0.2,
            source_gain: 1.2,
            source_floor: -0.15,
            coupling: PerturbationCoupling::InPass,
        }
    }
}

impl FireParams {
    /// No sparks, flares or cooldown. Only the bottom row stays random.
    pub fn calm() -> Self {
        Self {
            spark_probability: 0.0,
            flare_probability: 0.0,
            cooldown: 0.0,
            ..Self::default()
        }
    }

    /// Smallest value the bottom row can be given.
    pub fn source_minimum(&self) -> f32 {
        self.source_base + self.source_gain * self.source_floor
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub field: FieldConfig,
    pub scheduler: SchedulerConfig,
    pub fire: FireParams,
    /// Seed of the random generator, `None` seeds from the OS.
    pub seed: Option<u64>,
}
