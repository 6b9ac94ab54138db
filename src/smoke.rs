//! Smoke: a density carried by a velocity field, both diffused and advected.
//!
//! The velocity is never projected, so the flow is not incompressible.

use tracing::info;

use crate::config::FieldConfig;
use crate::d2::{density_step, velocity_step, Grid, VelocityField};
use crate::error::Result;
use crate::present::FrameSink;
use crate::scheduler::Simulation;

pub struct SmokeSimulation {
    density: Grid,
    density_source: Grid,
    density_scratch: Grid,
    velocity: VelocityField,
    velocity_scratch: VelocityField,
    force: VelocityField,
    diffusion: f32,
    viscosity: f32,
    cell_size: f32,
    sink: Option<Box<dyn FrameSink + Send>>,
}

impl SmokeSimulation {
    pub fn new(config: &FieldConfig) -> Result<Self> {
        let (w, h, policy) = (config.width, config.height, config.edge_policy);

        info!(
            "Creating smoke simulation: {}x{} grid, diffusion={} viscosity={}",
            w, h, config.diffusion, config.viscosity
        );

        Ok(Self {
            density: Grid::new(w, h, policy)?,
            density_source: Grid::new(w, h, policy)?,
            density_scratch: Grid::new(w, h, policy)?,
            velocity: VelocityField::new(w, h, policy)?,
            velocity_scratch: VelocityField::new(w, h, policy)?,
            force: VelocityField::new(w, h, policy)?,
            diffusion: config.diffusion,
            viscosity: config.viscosity,
            cell_size: config.cell_size,
            sink: None,
        })
    }

    pub fn with_sink<S>(mut self, sink: S) -> Self
    where
        S: FrameSink + Send + 'static,
    {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn density(&self) -> &Grid {
        &self.density
    }

    pub fn velocity(&self) -> &VelocityField {
        &self.velocity
    }

    /// Density added per second inside the rectangle, until replaced.
    pub fn inject_density(&mut self, x: isize, y: isize, w: usize, h: usize, rate: f32) {
        self.density_source.fill_rect(x, y, w, h, rate, false);
    }

    /// Force applied per second inside the rectangle, until replaced.
    pub fn inject_force(&mut self, x: isize, y: isize, w: usize, h: usize, fx: f32, fy: f32) {
        self.force.x.fill_rect(x, y, w, h, fx, false);
        self.force.y.fill_rect(x, y, w, h, fy, false);
    }

    pub fn step(&mut self, dt: f32) -> Result<()> {
        velocity_step(
            &mut self.velocity,
            &mut self.velocity_scratch,
            &self.force,
            self.viscosity,
            dt,
            self.cell_size,
        )?;

        // density_step overwrites its source grid, keep the injected one.
        self.density_scratch.copy_from(&self.density_source)?;
        density_step(
            &mut self.density,
            &mut self.density_scratch,
            &self.velocity,
            self.diffusion,
            dt,
            self.cell_size,
        )
    }
}

impl Simulation for SmokeSimulation {
    fn update(&mut self, _simulation_time: f64, delta_time: f64) -> Result<()> {
        self.step(delta_time as f32)
    }

    fn render(&mut self) -> Result<()> {
        if let Some(sink) = self.sink.as_mut() {
            sink.present(&self.density);
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::d2::EdgePolicy;

    fn config() -> FieldConfig {
        FieldConfig {
            width: 24,
            height: 24,
            edge_policy: EdgePolicy::Clamp,
            diffusion: 0.0001,
            viscosity: 0.0,
            cell_size: 0.1,
        }
    }

    #[test]
    fn test_density_accumulates() {
        let mut smoke = SmokeSimulation::new(&config()).unwrap();
        smoke.inject_density(10, 10, 4, 4, 5.0);

        for _ in 0..10 {
            smoke.step(0.02).unwrap();
        }

        assert!(smoke.density().get(11, 11) > 0.5);
        assert!(smoke.density().get(2, 2) < smoke.density().get(11, 11));
    }

    #[test]
    fn test_source_survives_steps() {
        let mut smoke = SmokeSimulation::new(&config()).unwrap();
        smoke.inject_density(10, 10, 4, 4, 5.0);

        smoke.step(0.02).unwrap();
        let first = smoke.density().get(11, 11);
        smoke.step(0.02).unwrap();

        assert_eq!(smoke.density_source.get(11, 11), 5.0);
        assert!(smoke.density().get(11, 11) > first);
    }

    #[test]
    fn test_force_moves_density() {
        let mut smoke = SmokeSimulation::new(&config()).unwrap();
        smoke.inject_density(4, 10, 2, 4, 5.0);
        smoke.inject_force(1, 1, 22, 22, 5.0, 0.0);

        for _ in 0..30 {
            smoke.step(0.02).unwrap();
        }

        assert!(smoke.velocity().x.get(12, 12) > 0.0);
        // Carried downstream in +x, nothing upstream.
        assert!(smoke.density().get(8, 11) > smoke.density().get(1, 11));
    }
}
