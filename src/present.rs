//! Seams to the outside: whatever draws into a field and whatever shows it.

use crate::d2::Grid;

/// Receives the visible grid once per rendered frame.
///
/// Called on the scheduler thread after the buffer swap, so the grid is always a
/// completed step. Implementations that hand frames to another thread should copy
/// what they need out of `field` before returning.
pub trait FrameSink {
    fn present(&mut self, field: &Grid);
}

impl<F> FrameSink for F
where
    F: FnMut(&Grid),
{
    fn present(&mut self, field: &Grid) {
        self(field)
    }
}

/// Draws into the visible grid before each update, e.g. text or shapes.
///
/// Only `get`, `set` and `fill_rect` are meant to be used on `field`.
pub trait Overlay {
    fn draw(&mut self, field: &mut Grid, simulation_time: f64, delta_time: f64);
}

impl<F> Overlay for F
where
    F: FnMut(&mut Grid, f64, f64),
{
    fn draw(&mut self, field: &mut Grid, simulation_time: f64, delta_time: f64) {
        self(field, simulation_time, delta_time)
    }
}
