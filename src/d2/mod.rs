use cgmath::{vec2, Vector2};

mod buffer;
mod grid;
mod linear;
mod velocity;

pub use buffer::DoubleBuffer;
pub use grid::{Boundary, EdgePolicy, Grid};
pub use linear::{diffuse, RELAXATION_ITERATIONS};
pub use velocity::{project, velocity_step, velocity_step_with, VelocityField, VelocityStage};

use crate::error::Result;

fn clamp_to_domain(p: Vector2<f32>, (w, h): (usize, usize)) -> Vector2<f32> {
    vec2(
        p.x.max(0.5).min(w as f32 - 0.5),
        p.y.max(0.5).min(h as f32 - 0.5),
    )
}

/// Semi-Lagrangian advection of `source` into `target` along `(x_velocity, y_velocity)`.
///
/// Each interior cell is traced back by `dt / cell_size` times its velocity, the traced
/// point is clamped into `[0.5, w - 0.5] x [0.5, h - 0.5]` and `source` is sampled there
/// bilinearly. Border cells are written by `target.set_boundaries(boundary)` afterwards.
pub fn advect(
    target: &mut Grid,
    source: &Grid,
    x_velocity: &Grid,
    y_velocity: &Grid,
    dt: f32,
    cell_size: f32,
    boundary: Boundary,
) -> Result<()> {
    target.check_dim(source)?;
    target.check_dim(x_velocity)?;
    target.check_dim(y_velocity)?;

    let dim = target.dim();
    let (w, h) = dim;
    let dt0 = dt / cell_size;

    for y in 1..h.saturating_sub(1) {
        for x in 1..w.saturating_sub(1) {
            let uv = vec2(x_velocity.data[[y, x]], y_velocity.data[[y, x]]);
            let p = clamp_to_domain(vec2(x as f32, y as f32) - uv * dt0, dim);

            target.data[[y, x]] = source.get_interpolated(p.x, p.y);
        }
    }

    target.set_boundaries(boundary);

    Ok(())
}

/// One density update: add `prev * dt` as a source, diffuse, then advect along `velocity`.
///
/// `prev` is used as scratch space and holds the diffused density afterwards.
pub fn density_step(
    density: &mut Grid,
    prev: &mut Grid,
    velocity: &VelocityField,
    diffusion: f32,
    dt: f32,
    cell_size: f32,
) -> Result<()> {
    density.add(prev, dt, 0.0)?;
    diffuse(prev, density, diffusion, dt, cell_size, Boundary::Scalar)?;
    advect(
        density,
        prev,
        &velocity.x,
        &velocity.y,
        dt,
        cell_size,
        Boundary::Scalar,
    )
}
