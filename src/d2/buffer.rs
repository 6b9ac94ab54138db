use std::mem;

use super::grid::{EdgePolicy, Grid};
use crate::error::Result;

/// A `visible` grid holding the last completed step and a `working` grid the next
/// step is written into.
#[derive(Debug, Clone)]
pub struct DoubleBuffer {
    visible: Grid,
    working: Grid,
}

impl DoubleBuffer {
    pub fn new(w: usize, h: usize, policy: EdgePolicy) -> Result<Self> {
        Ok(Self {
            visible: Grid::new(w, h, policy)?,
            working: Grid::new(w, h, policy)?,
        })
    }

    pub fn dim(&self) -> (usize, usize) {
        self.visible.dim()
    }

    pub fn visible(&self) -> &Grid {
        &self.visible
    }

    pub fn visible_mut(&mut self) -> &mut Grid {
        &mut self.visible
    }

    /// `(visible, working)`
    pub fn split_mut(&mut self) -> (&mut Grid, &mut Grid) {
        (&mut self.visible, &mut self.working)
    }

    /// Makes the working grid visible and reseeds the new working grid from it.
    pub fn swap(&mut self) {
        mem::swap(&mut self.visible, &mut self.working);
        // Both grids are created with the same size and never resized.
        self.working.data.assign(&self.visible.data);
    }

    /// Overwrites both grids with `value`.
    pub fn reset(&mut self, value: f32) {
        self.visible.fill(value);
        self.working.fill(value);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_swap() {
        let mut buffer = DoubleBuffer::new(3, 3, EdgePolicy::Wrap).unwrap();

        {
            let (visible, working) = buffer.split_mut();
            visible.set(1, 1, 1.0);
            working.set(1, 1, 2.0);
        }

        buffer.swap();
        assert_eq!(buffer.visible().get(1, 1), 2.0);

        let (visible, working) = buffer.split_mut();
        assert_eq!(visible, working);
    }

    #[test]
    fn test_reset() {
        let mut buffer = DoubleBuffer::new(2, 2, EdgePolicy::Clamp).unwrap();
        buffer.visible_mut().set(0, 0, 4.0);
        buffer.reset(0.5);
        assert!(buffer.visible().as_slice().iter().all(|&v| v == 0.5));
        assert_eq!(buffer.dim(), (2, 2));
    }
}
