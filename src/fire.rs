//! The fire effect: a stochastic per-cell rule over a double-buffered field.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{info, trace};

use crate::config::{FieldConfig, FireParams, SimulationConfig};
use crate::d2::{DoubleBuffer, Grid};
use crate::error::Result;
use crate::present::{FrameSink, Overlay};
use crate::scheduler::Simulation;

/// How sparks written into the visible grid interact with the blend of the same step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerturbationCoupling {
    /// Sparks are written while the blend pass runs, so cells scanned later in the
    /// same step already see them.
    #[default]
    InPass,
    /// All sparks are written first, then every cell is blended from the same snapshot.
    BeforePass,
}

/// Weights of the cell itself, the cell below and the three other neighbours.
const SELF_WEIGHT: f32 = 3.0;
const DOWN_WEIGHT: f32 = 5.0;
const WEIGHT_SUM: f32 = SELF_WEIGHT + DOWN_WEIGHT + 3.0;

/// Sample of N(0, 1) using the Box-Muller transform.
pub fn standard_normal<R: Rng>(rng: &mut R) -> f32 {
    // (0, 1], keeps ln() finite.
    let u1 = 1.0 - rng.random::<f64>();
    let u2 = rng.random::<f64>();
    ((-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()) as f32
}

fn chance<R: Rng>(rng: &mut R, probability: f32) -> bool {
    rng.random::<f32>() < probability
}

fn set_plus(field: &mut Grid, x: isize, y: isize, value: f32) {
    field.set(x, y, value);
    field.set(x, y + 1, value);
    field.set(x, y - 1, value);
    field.set(x + 1, y, value);
    field.set(x - 1, y, value);
}

fn perturb<R: Rng>(params: &FireParams, visible: &mut Grid, x: isize, y: isize, rng: &mut R) {
    let old = visible.get(x, y);

    if chance(rng, params.spark_probability) {
        let value = old + params.spark_offset + params.spark_spread * standard_normal(rng);
        set_plus(visible, x, y, value);
    }
    if chance(rng, params.flare_probability) {
        let value = old + params.flare_offset + params.flare_spread * standard_normal(rng);
        set_plus(visible, x, y, value);
    }
}

fn blend<R: Rng>(
    params: &FireParams,
    visible: &Grid,
    working: &mut Grid,
    x: isize,
    y: isize,
    rng: &mut R,
) {
    let old = visible.get(x, y);
    let up = visible.get(x, y - 1);
    let down = visible.get(x, y + 1);
    // Sampled from the row below, heat rises.
    let left = visible.get(x - 1, y + 1);
    let right = visible.get(x + 1, y + 1);

    let cooldown = rng.random::<f32>() * params.cooldown;
    let value = (old * SELF_WEIGHT + down * DOWN_WEIGHT + left + right + up) / WEIGHT_SUM - cooldown;
    working.set(x, y, value);

    if y == visible.height() as isize - 1 {
        let heat = standard_normal(rng).max(params.source_floor);
        working.set(x, y, params.source_base + params.source_gain * heat);
    }
}

/// One step of the fire rule, reading `visible` and writing `working`.
///
/// Sparks and flares are written straight into `visible`; see [`PerturbationCoupling`].
/// The bottom row of `working` is a noisy heat source instead of a blend.
pub fn update_field<R: Rng>(
    params: &FireParams,
    visible: &mut Grid,
    working: &mut Grid,
    rng: &mut R,
) -> Result<()> {
    visible.check_dim(working)?;

    let (w, h) = visible.dim();
    let (w, h) = (w as isize, h as isize);

    match params.coupling {
        PerturbationCoupling::InPass => {
            for x in 0..w {
                for y in 0..h {
                    perturb(params, visible, x, y, rng);
                    blend(params, visible, working, x, y, rng);
                }
            }
        }
        PerturbationCoupling::BeforePass => {
            for x in 0..w {
                for y in 0..h {
                    perturb(params, visible, x, y, rng);
                }
            }
            for x in 0..w {
                for y in 0..h {
                    blend(params, visible, working, x, y, rng);
                }
            }
        }
    }

    Ok(())
}

/// The fire effect as a [`Simulation`].
///
/// Every update draws the overlay into the visible grid, runs [`update_field`] and
/// swaps the buffers. Every render hands the visible grid to the frame sink.
pub struct FireSimulation<R = StdRng> {
    field: DoubleBuffer,
    params: FireParams,
    rng: R,
    overlay: Option<Box<dyn Overlay + Send>>,
    sink: Option<Box<dyn FrameSink + Send>>,
    steps: u64,
    frames: u64,
}

impl FireSimulation<StdRng> {
    pub fn new(config: &SimulationConfig) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_rng(&config.field, config.fire, rng)
    }
}

impl<R: Rng> FireSimulation<R> {
    pub fn with_rng(field: &FieldConfig, params: FireParams, rng: R) -> Result<Self> {
        info!(
            "Creating fire simulation: {}x{} grid, {:?} edges, {:?} coupling",
            field.width, field.height, field.edge_policy, params.coupling
        );

        Ok(Self {
            field: DoubleBuffer::new(field.width, field.height, field.edge_policy)?,
            params,
            rng,
            overlay: None,
            sink: None,
            steps: 0,
            frames: 0,
        })
    }

    pub fn with_overlay<O>(mut self, overlay: O) -> Self
    where
        O: Overlay + Send + 'static,
    {
        self.overlay = Some(Box::new(overlay));
        self
    }

    pub fn with_sink<S>(mut self, sink: S) -> Self
    where
        S: FrameSink + Send + 'static,
    {
        self.sink = Some(Box::new(sink));
        self
    }

    /// The last completed step.
    pub fn field(&self) -> &Grid {
        self.field.visible()
    }

    /// Direct access to the visible grid, e.g. for seeding.
    pub fn field_mut(&mut self) -> &mut Grid {
        self.field.visible_mut()
    }

    pub fn params(&self) -> &FireParams {
        &self.params
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Runs the rule once and swaps the buffers.
    pub fn step(&mut self) -> Result<()> {
        let (visible, working) = self.field.split_mut();
        update_field(&self.params, visible, working, &mut self.rng)?;
        self.field.swap();
        self.steps += 1;
        Ok(())
    }
}

impl<R: Rng> Simulation for FireSimulation<R> {
    fn update(&mut self, simulation_time: f64, delta_time: f64) -> Result<()> {
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.draw(self.field.visible_mut(), simulation_time, delta_time);
        }
        self.step()
    }

    fn render(&mut self) -> Result<()> {
        self.frames += 1;

        let field = self.field.visible();
        trace!(
            "Frame {} after {} steps: min={:.3} max={:.3} mean={:.3}",
            self.frames,
            self.steps,
            field.min(),
            field.max(),
            field.mean()
        );

        if let Some(sink) = self.sink.as_mut() {
            sink.present(field);
        }

        Ok(())
    }
}
