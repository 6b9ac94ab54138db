use std::ops::Range;

use ndarray::{Array, Array2, Zip};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FieldError, Result};

/// What happens to coordinates outside `[0, w) x [0, h)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgePolicy {
    /// Coordinates wrap around, the grid is a torus.
    #[default]
    Wrap,
    /// Coordinates are pulled to the nearest edge cell.
    Clamp,
}

/// Edge condition enforced by [`Grid::set_boundaries`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// Zero gradient: borders copy their interior neighbour.
    Scalar,
    /// No flow through the left and right walls.
    HorizontalVelocity,
    /// No flow through the top and bottom walls.
    VerticalVelocity,
}

impl Boundary {
    /// `1` is horizontal velocity, `2` is vertical velocity, anything else is a scalar.
    pub fn from_kind(kind: i32) -> Self {
        match kind {
            1 => Boundary::HorizontalVelocity,
            2 => Boundary::VerticalVelocity,
            _ => Boundary::Scalar,
        }
    }

    fn horizontal_sign(self) -> f32 {
        if self == Boundary::HorizontalVelocity {
            -1.0
        } else {
            1.0
        }
    }

    fn vertical_sign(self) -> f32 {
        if self == Boundary::VerticalVelocity {
            -1.0
        } else {
            1.0
        }
    }
}

#[inline]
fn mix(t: f32, a: f32, b: f32) -> f32 {
    a + (b - a) * t
}

/// Reduces `v` into `[0, n]`. Non-finite values have no position on the torus and map to 0.
fn wrap_coordinate(v: f32, n: f32) -> f32 {
    if v.is_finite() {
        v.rem_euclid(n)
    } else {
        0.0
    }
}

/// Fixed size two dimensional `f32` field.
///
/// Cells are stored row-major in an array of shape `(h, w)`, so the cell
/// `(x, y)` lives at flat offset `x + y * w`.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub(crate) data: Array2<f32>,
    policy: EdgePolicy,
}

impl Grid {
    pub fn new(w: usize, h: usize, policy: EdgePolicy) -> Result<Self> {
        Self::from_elem(w, h, 0.0, policy)
    }

    pub fn from_elem(w: usize, h: usize, value: f32, policy: EdgePolicy) -> Result<Self> {
        if w == 0 || h == 0 {
            return Err(FieldError::InvalidConstruction {
                width: w,
                height: h,
            });
        }

        debug!("Allocating {}x{} grid ({:?})", w, h, policy);

        Ok(Self {
            data: Array::from_elem((h, w), value),
            policy,
        })
    }

    /// Builds a grid from a closure over `(x, y)`.
    pub fn from_fn<F>(w: usize, h: usize, policy: EdgePolicy, mut f: F) -> Result<Self>
    where
        F: FnMut(usize, usize) -> f32,
    {
        let mut grid = Self::new(w, h, policy)?;
        grid.data
            .indexed_iter_mut()
            .for_each(|((y, x), e)| *e = f(x, y));
        Ok(grid)
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    /// `(width, height)`
    pub fn dim(&self) -> (usize, usize) {
        (self.width(), self.height())
    }

    pub fn policy(&self) -> EdgePolicy {
        self.policy
    }

    /// Row-major view of every cell.
    pub fn as_slice(&self) -> &[f32] {
        // Always built through `Array::from_elem`, which is standard layout.
        self.data
            .as_slice()
            .unwrap_or_else(|| unreachable!("grid storage is contiguous"))
    }

    fn index(&self, x: isize, y: isize) -> [usize; 2] {
        let (w, h) = (self.width() as isize, self.height() as isize);

        let (x, y) = match self.policy {
            EdgePolicy::Wrap => (x.rem_euclid(w), y.rem_euclid(h)),
            EdgePolicy::Clamp => (x.clamp(0, w - 1), y.clamp(0, h - 1)),
        };

        [y as usize, x as usize]
    }

    fn contains(&self, x: isize, y: isize) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width() && (y as usize) < self.height()
    }

    pub fn get(&self, x: isize, y: isize) -> f32 {
        self.data[self.index(x, y)]
    }

    /// Bilinear interpolation between the four cells around `(x, y)`.
    ///
    /// The point is brought into the grid with the edge policy first, so any `f32`
    /// is accepted.
    pub fn get_interpolated(&self, x: f32, y: f32) -> f32 {
        let (w, h) = (self.width() as f32, self.height() as f32);
        let (x, y) = match self.policy {
            EdgePolicy::Wrap => (wrap_coordinate(x, w), wrap_coordinate(y, h)),
            EdgePolicy::Clamp => (x.clamp(0.0, w - 1.0), y.clamp(0.0, h - 1.0)),
        };

        let x0 = x.floor() as isize;
        let y0 = y.floor() as isize;
        let x1 = x0.saturating_add(1);
        let y1 = y0.saturating_add(1);

        let cx = x - x0 as f32;
        let cy = y - y0 as f32;

        let r0 = mix(cx, self.get(x0, y0), self.get(x1, y0));
        let r1 = mix(cx, self.get(x0, y1), self.get(x1, y1));
        mix(cy, r0, r1)
    }

    pub fn set(&mut self, x: isize, y: isize, v: f32) {
        let i = self.index(x, y);
        self.data[i] = v;
    }

    /// Writes `v` unless `(x, y)` is outside the grid and `allow_out_of_bounds` is false.
    pub fn set_bounded(&mut self, x: isize, y: isize, v: f32, allow_out_of_bounds: bool) {
        if allow_out_of_bounds || self.contains(x, y) {
            self.set(x, y, v);
        }
    }

    pub fn fill_rect(
        &mut self,
        x: isize,
        y: isize,
        w: usize,
        h: usize,
        v: f32,
        allow_out_of_bounds: bool,
    ) {
        let ys = self.span(y, h, self.height(), allow_out_of_bounds);
        let xs = self.span(x, w, self.width(), allow_out_of_bounds);

        for yp in ys {
            for xp in xs.clone() {
                self.set(xp, yp, v);
            }
        }
    }

    /// Coordinates of `[start, start + len)` that reach distinct cells along an axis of
    /// `size` cells.
    fn span(&self, start: isize, len: usize, size: usize, allow_out_of_bounds: bool) -> Range<isize> {
        let size = size as isize;
        let end = start.saturating_add(isize::try_from(len).unwrap_or(isize::MAX));
        if start >= end {
            return 0..0;
        }

        match (allow_out_of_bounds, self.policy) {
            (false, _) => start.max(0)..end.min(size),
            (true, EdgePolicy::Wrap) => start..end.min(start.saturating_add(size)),
            (true, EdgePolicy::Clamp) => {
                start.clamp(0, size - 1)..(end - 1).clamp(0, size - 1) + 1
            }
        }
    }

    pub fn fill(&mut self, v: f32) {
        self.data.fill(v);
    }

    pub(crate) fn check_dim(&self, other: &Grid) -> Result<()> {
        if self.dim() == other.dim() {
            Ok(())
        } else {
            Err(FieldError::DimensionMismatch {
                expected: self.dim(),
                found: other.dim(),
            })
        }
    }

    pub fn copy_from(&mut self, other: &Grid) -> Result<()> {
        self.check_dim(other)?;
        self.data.assign(&other.data);
        Ok(())
    }

    /// `self[i] += other[i] * scale + offset`
    pub fn add(&mut self, other: &Grid, scale: f32, offset: f32) -> Result<()> {
        self.check_dim(other)?;

        Zip::from(&mut self.data).and(&other.data).for_each(|a, &b| {
            *a += b * scale + offset;
        });

        Ok(())
    }

    /// Rewrites the outermost ring of cells from their interior neighbours.
    pub fn set_boundaries(&mut self, boundary: Boundary) {
        let (w, h) = self.dim();
        let vs = boundary.vertical_sign();
        let hs = boundary.horizontal_sign();

        if h >= 2 {
            for x in 1..w.saturating_sub(1) {
                self.data[[0, x]] = vs * self.data[[1, x]];
                self.data[[h - 1, x]] = vs * self.data[[h - 2, x]];
            }
        }

        if w >= 2 {
            for y in 1..h.saturating_sub(1) {
                self.data[[y, 0]] = hs * self.data[[y, 1]];
                self.data[[y, w - 1]] = hs * self.data[[y, w - 2]];
            }
        }

        let (r, b) = (w as isize - 1, h as isize - 1);
        self.set(0, 0, (self.get(1, 0) + self.get(0, 1)) / 2.0);
        self.set(0, b, (self.get(1, b) + self.get(0, b - 1)) / 2.0);
        self.set(r, 0, (self.get(r - 1, 0) + self.get(r, 1)) / 2.0);
        self.set(r, b, (self.get(r - 1, b) + self.get(r, b - 1)) / 2.0);
    }

    pub fn min(&self) -> f32 {
        self.data.iter().copied().fold(f32::INFINITY, f32::min)
    }

    pub fn max(&self) -> f32 {
        self.data.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    pub fn mean(&self) -> f32 {
        self.data.sum() / self.data.len() as f32
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn ramp(w: usize, h: usize, policy: EdgePolicy) -> Grid {
        Grid::from_fn(w, h, policy, |x, y| (x + y * w) as f32).unwrap()
    }

    #[test]
    fn test_zero_dimensions() {
        assert_eq!(
            Grid::new(0, 4, EdgePolicy::Wrap),
            Err(FieldError::InvalidConstruction {
                width: 0,
                height: 4
            })
        );
        assert!(Grid::new(3, 0, EdgePolicy::Clamp).is_err());
        assert!(Grid::new(1, 1, EdgePolicy::Clamp).is_ok());
    }

    #[test]
    fn test_row_major() {
        let g = ramp(4, 3, EdgePolicy::Wrap);
        assert_eq!(g.as_slice().len(), 12);
        for y in 0..3 {
            for x in 0..4 {
                assert_eq!(g.as_slice()[x + y * 4], g.get(x as isize, y as isize));
            }
        }
    }

    #[test]
    fn test_wrap() {
        let g = ramp(10, 10, EdgePolicy::Wrap);

        assert_eq!(g.get(-1, 0), g.get(9, 0));
        assert_eq!(g.get(10, 0), g.get(0, 0));
        assert_eq!(g.get(3, -1), g.get(3, 9));
        assert_eq!(g.get(-21, 25), g.get(9, 5));
    }

    #[test]
    fn test_clamp() {
        let g = ramp(10, 10, EdgePolicy::Clamp);

        assert_eq!(g.get(-1, 0), g.get(0, 0));
        assert_eq!(g.get(10, 0), g.get(9, 0));
        assert_eq!(g.get(10, 10), g.get(9, 9));
        assert_eq!(g.get(4, -7), g.get(4, 0));
    }

    #[test]
    fn test_full_range_access() {
        for &policy in &[EdgePolicy::Wrap, EdgePolicy::Clamp] {
            let mut g = Grid::new(7, 5, policy).unwrap();
            for y in -5..10 {
                for x in -7..14 {
                    g.set(x, y, 1.0);
                    assert_eq!(g.get(x, y), 1.0);
                }
            }
            assert_eq!(g.as_slice().len(), 35);
        }
    }

    #[test]
    fn test_set_bounded() {
        let mut g = Grid::new(4, 4, EdgePolicy::Wrap).unwrap();

        g.set_bounded(-1, 0, 1.0, false);
        assert_eq!(g.get(3, 0), 0.0);

        g.set_bounded(-1, 0, 1.0, true);
        assert_eq!(g.get(3, 0), 1.0);

        g.set_bounded(2, 2, 5.0, false);
        assert_eq!(g.get(2, 2), 5.0);
    }

    #[test]
    fn test_fill_rect() {
        let mut g = Grid::new(5, 5, EdgePolicy::Wrap).unwrap();
        g.fill_rect(3, 3, 4, 4, 2.0, false);

        let filled = g.as_slice().iter().filter(|&&v| v == 2.0).count();
        assert_eq!(filled, 4);
        assert_eq!(g.get(0, 0), 0.0);

        g.fill_rect(3, 3, 4, 4, 1.0, true);
        assert_eq!(g.get(0, 0), 1.0);
        assert_eq!(g.get(4, 4), 1.0);
    }

    #[test]
    fn test_interpolated() {
        let g = Grid::from_fn(4, 4, EdgePolicy::Clamp, |x, _| x as f32).unwrap();

        assert_abs_diff_eq!(g.get_interpolated(1.0, 2.0), 1.0);
        assert_abs_diff_eq!(g.get_interpolated(1.5, 2.0), 1.5);
        assert_abs_diff_eq!(g.get_interpolated(2.25, 0.7), 2.25);
        // Right edge clamps onto the last column.
        assert_abs_diff_eq!(g.get_interpolated(3.5, 1.0), 3.0);
    }

    #[test]
    fn test_interpolated_far_away() {
        let g = Grid::from_fn(4, 4, EdgePolicy::Clamp, |x, _| x as f32).unwrap();

        assert_abs_diff_eq!(g.get_interpolated(1e30, 1.0), 3.0);
        assert_abs_diff_eq!(g.get_interpolated(f32::INFINITY, 1.0), 3.0);
        assert_abs_diff_eq!(g.get_interpolated(-1e30, f32::NEG_INFINITY), 0.0);
        assert_abs_diff_eq!(g.get_interpolated(2.0, f32::INFINITY), 2.0);

        let g = Grid::from_fn(4, 4, EdgePolicy::Wrap, |x, _| x as f32).unwrap();

        assert!(g.get_interpolated(1e30, -1e30).is_finite());
        assert_abs_diff_eq!(g.get_interpolated(f32::INFINITY, 1.0), 0.0);
        assert_abs_diff_eq!(g.get_interpolated(1.5, f32::NEG_INFINITY), 1.5);
        assert_abs_diff_eq!(g.get_interpolated(5.5, 1.0), g.get_interpolated(1.5, 1.0));
        assert_abs_diff_eq!(g.get_interpolated(f32::NAN, 2.0), 0.0);
    }

    #[test]
    fn test_fill_rect_huge() {
        let mut g = Grid::new(4, 4, EdgePolicy::Wrap).unwrap();
        g.fill_rect(1, 1, usize::MAX, 1, 2.0, false);

        for x in 0..4 {
            assert_eq!(g.get(x, 1), if x == 0 { 0.0 } else { 2.0 });
        }
        assert_eq!(g.get(1, 0), 0.0);

        g.fill_rect(-3, 2, usize::MAX, 1, 3.0, true);
        assert!((0..4).all(|x| g.get(x, 2) == 3.0));

        g.fill_rect(isize::MAX - 1, 0, 10, 10, 4.0, false);
        assert_eq!(g.max(), 3.0);

        let mut g = Grid::new(5, 5, EdgePolicy::Clamp).unwrap();
        g.fill_rect(-10, 4, 100, 1, 1.0, true);
        assert!((0..5).all(|x| g.get(x, 4) == 1.0));
        assert_eq!(g.get(0, 3), 0.0);
    }

    #[test]
    fn test_copy_and_add() {
        let a = ramp(3, 2, EdgePolicy::Wrap);
        let mut b = Grid::new(3, 2, EdgePolicy::Wrap).unwrap();

        b.copy_from(&a).unwrap();
        assert_eq!(a, b);

        b.add(&a, 2.0, 1.0).unwrap();
        for (i, &v) in b.as_slice().iter().enumerate() {
            assert_abs_diff_eq!(v, i as f32 * 3.0 + 1.0);
        }
    }

    #[test]
    fn test_dimension_mismatch() {
        let a = Grid::new(3, 2, EdgePolicy::Wrap).unwrap();
        let mut b = Grid::new(2, 3, EdgePolicy::Wrap).unwrap();

        let err = FieldError::DimensionMismatch {
            expected: (2, 3),
            found: (3, 2),
        };
        assert_eq!(b.copy_from(&a), Err(err.clone()));
        assert_eq!(b.add(&a, 1.0, 0.0), Err(err));
    }

    #[test]
    fn test_boundaries_mirror() {
        let (w, h) = (6, 5);
        let mut g = Grid::from_fn(w, h, EdgePolicy::Clamp, |x, y| (x * 7 + y * 3) as f32).unwrap();
        g.set_boundaries(Boundary::Scalar);

        let (r, b) = (w as isize - 1, h as isize - 1);
        for x in 1..r {
            assert_eq!(g.get(x, 0), g.get(x, 1));
            assert_eq!(g.get(x, b), g.get(x, b - 1));
        }
        for y in 1..b {
            assert_eq!(g.get(0, y), g.get(1, y));
            assert_eq!(g.get(r, y), g.get(r - 1, y));
        }

        assert_abs_diff_eq!(g.get(0, 0), (g.get(1, 0) + g.get(0, 1)) / 2.0);
        assert_abs_diff_eq!(g.get(0, b), (g.get(1, b) + g.get(0, b - 1)) / 2.0);
        assert_abs_diff_eq!(g.get(r, 0), (g.get(r - 1, 0) + g.get(r, 1)) / 2.0);
        assert_abs_diff_eq!(g.get(r, b), (g.get(r - 1, b) + g.get(r, b - 1)) / 2.0);
    }

    #[test]
    fn test_boundaries_velocity() {
        let mut g = Grid::from_elem(5, 5, 1.0, EdgePolicy::Clamp).unwrap();
        g.set_boundaries(Boundary::from_kind(1));

        for y in 1..4 {
            assert_eq!(g.get(0, y), -1.0);
            assert_eq!(g.get(4, y), -1.0);
        }
        for x in 1..4 {
            assert_eq!(g.get(x, 0), 1.0);
            assert_eq!(g.get(x, 4), 1.0);
        }

        let mut g = Grid::from_elem(5, 5, 1.0, EdgePolicy::Clamp).unwrap();
        g.set_boundaries(Boundary::from_kind(2));

        for x in 1..4 {
            assert_eq!(g.get(x, 0), -1.0);
            assert_eq!(g.get(x, 4), -1.0);
        }
        assert_eq!(g.get(0, 2), 1.0);
    }

    #[test]
    fn test_boundaries_tiny() {
        for &(w, h) in &[(1, 1), (1, 3), (3, 1), (2, 2)] {
            let mut g = Grid::from_elem(w, h, 1.0, EdgePolicy::Clamp).unwrap();
            g.set_boundaries(Boundary::Scalar);
            assert!(g.as_slice().iter().all(|&v| v == 1.0));
        }
    }

    #[test]
    fn test_stats() {
        let g = ramp(2, 2, EdgePolicy::Wrap);
        assert_eq!(g.min(), 0.0);
        assert_eq!(g.max(), 3.0);
        assert_abs_diff_eq!(g.mean(), 1.5);
    }
}
