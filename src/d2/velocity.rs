use std::mem;

use super::grid::{Boundary, EdgePolicy, Grid};
use super::{advect, diffuse};
use crate::error::{FieldError, Result};

/// Pair of `x` and `y` velocity grids in cells of the owning scalar field.
#[derive(Debug, Clone, PartialEq)]
pub struct VelocityField {
    pub x: Grid,
    pub y: Grid,
}

impl VelocityField {
    pub fn new(w: usize, h: usize, policy: EdgePolicy) -> Result<Self> {
        Ok(Self {
            x: Grid::new(w, h, policy)?,
            y: Grid::new(w, h, policy)?,
        })
    }

    pub fn dim(&self) -> (usize, usize) {
        self.x.dim()
    }

    pub fn fill(&mut self, u: f32, v: f32) {
        self.x.fill(u);
        self.y.fill(v);
    }

    /// Largest velocity magnitude over all cells.
    pub fn max_speed(&self) -> f32 {
        self.x
            .as_slice()
            .iter()
            .zip(self.y.as_slice())
            .map(|(u, v)| (u * u + v * v).sqrt())
            .fold(0.0, f32::max)
    }
}

/// The stages a velocity update can be made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VelocityStage {
    /// `velocity += force * dt`
    Forces,
    /// Viscous diffusion with no-flow walls.
    Diffusion,
    /// Advection of the velocity by itself.
    SelfAdvection,
    /// Pressure projection to a divergence free field. Not implemented.
    Projection,
}

impl VelocityStage {
    pub const DEFAULT: [VelocityStage; 3] = [
        VelocityStage::Forces,
        VelocityStage::Diffusion,
        VelocityStage::SelfAdvection,
    ];

    pub fn is_implemented(self) -> bool {
        self != VelocityStage::Projection
    }
}

/// Pressure projection.
///
/// Always fails: the resulting velocity fields are never made incompressible.
pub fn project(
    _velocity: &mut VelocityField,
    _pressure: &mut Grid,
    _divergence: &mut Grid,
    _cell_size: f32,
) -> Result<()> {
    Err(FieldError::NotImplemented("pressure projection"))
}

/// Runs [`VelocityStage::DEFAULT`], see [`velocity_step_with`].
pub fn velocity_step(
    velocity: &mut VelocityField,
    prev: &mut VelocityField,
    force: &VelocityField,
    viscosity: f32,
    dt: f32,
    cell_size: f32,
) -> Result<()> {
    velocity_step_with(
        &VelocityStage::DEFAULT,
        velocity,
        prev,
        force,
        viscosity,
        dt,
        cell_size,
    )
}

/// Applies `stages` in order. The latest velocity is always left in `velocity`,
/// `prev` is scratch space.
///
/// Reaching [`VelocityStage::Projection`] returns [`FieldError::NotImplemented`] and
/// leaves the stages before it applied.
pub fn velocity_step_with(
    stages: &[VelocityStage],
    velocity: &mut VelocityField,
    prev: &mut VelocityField,
    force: &VelocityField,
    viscosity: f32,
    dt: f32,
    cell_size: f32,
) -> Result<()> {
    velocity.x.check_dim(&prev.x)?;
    velocity.x.check_dim(&force.x)?;

    for stage in stages {
        match stage {
            VelocityStage::Forces => {
                velocity.x.add(&force.x, dt, 0.0)?;
                velocity.y.add(&force.y, dt, 0.0)?;
            }
            VelocityStage::Diffusion => {
                diffuse(
                    &mut prev.x,
                    &velocity.x,
                    viscosity,
                    dt,
                    cell_size,
                    Boundary::HorizontalVelocity,
                )?;
                diffuse(
                    &mut prev.y,
                    &velocity.y,
                    viscosity,
                    dt,
                    cell_size,
                    Boundary::VerticalVelocity,
                )?;
                mem::swap(velocity, prev);
            }
            VelocityStage::SelfAdvection => {
                mem::swap(velocity, prev);
                advect(
                    &mut velocity.x,
                    &prev.x,
                    &prev.x,
                    &prev.y,
                    dt,
                    cell_size,
                    Boundary::HorizontalVelocity,
                )?;
                advect(
                    &mut velocity.y,
                    &prev.y,
                    &prev.x,
                    &prev.y,
                    dt,
                    cell_size,
                    Boundary::VerticalVelocity,
                )?;
            }
            VelocityStage::Projection => {
                return Err(FieldError::NotImplemented("pressure projection"));
            }
        }
    }

    Ok(())
}
