use super::grid::{Boundary, Grid};
use crate::error::Result;

/// Number of relaxation sweeps done by [`diffuse`].
pub const RELAXATION_ITERATIONS: usize = 20;

/// One Gauss-Seidel sweep of `(1 + 4a) x - a * (neighbours of x) = x0` over the interior cells.
fn relax(x: &mut Grid, x0: &Grid, a: f32) {
    let (w, h) = x.dim();
    let denom = 1.0 + 4.0 * a;

    for j in 1..h.saturating_sub(1) {
        for i in 1..w.saturating_sub(1) {
            let neighbours =
                x.data[[j, i + 1]] + x.data[[j, i - 1]] + x.data[[j + 1, i]] + x.data[[j - 1, i]];
            x.data[[j, i]] = (x0.data[[j, i]] + a * neighbours) / denom;
        }
    }
}

/// Implicit diffusion of `source` into `target`.
///
/// `rate` is the diffusion coefficient in m²/s, `cell_size` the edge length of a cell in m.
/// The solve is approximated by a fixed number of relaxation sweeps, each followed by
/// `target.set_boundaries(boundary)`, so the cost is the same for every call and
/// arbitrarily large rates stay stable.
pub fn diffuse(
    target: &mut Grid,
    source: &Grid,
    rate: f32,
    dt: f32,
    cell_size: f32,
    boundary: Boundary,
) -> Result<()> {
    target.check_dim(source)?;

    let cells_per_meter = 1.0 / cell_size;
    let a = dt * rate * cells_per_meter * cells_per_meter;

    target.copy_from(source)?;

    for _ in 0..RELAXATION_ITERATIONS {
        relax(target, source, a);
        target.set_boundaries(boundary);
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::d2::EdgePolicy;
    use crate::error::FieldError;
    use approx::assert_abs_diff_eq;

    fn noisy(w: usize, h: usize) -> Grid {
        Grid::from_fn(w, h, EdgePolicy::Clamp, |x, y| {
            ((x * 31 + y * 17) % 13) as f32 / 13.0 - 0.3
        })
        .unwrap()
    }

    #[test]
    fn test_zero_rate_is_identity() {
        let source = noisy(12, 9);
        let mut target = Grid::new(12, 9, EdgePolicy::Clamp).unwrap();

        diffuse(&mut target, &source, 0.0, 0.02, 1.0, Boundary::Scalar).unwrap();

        for y in 1..8 {
            for x in 1..11 {
                assert_eq!(target.get(x, y), source.get(x, y));
            }
        }
    }

    #[test]
    fn test_stays_in_range() {
        let source = noisy(16, 16);
        let (lo, hi) = (source.min(), source.max());

        for &rate in &[0.01, 1.0, 50.0, 1e6] {
            let mut target = Grid::new(16, 16, EdgePolicy::Clamp).unwrap();
            diffuse(&mut target, &source, rate, 0.02, 0.1, Boundary::Scalar).unwrap();

            for &v in target.as_slice() {
                assert!(v >= lo - 1e-5 && v <= hi + 1e-5, "{} not in [{}, {}]", v, lo, hi);
            }
        }
    }

    #[test]
    fn test_smooths_spike() {
        let mut source = Grid::new(9, 9, EdgePolicy::Clamp).unwrap();
        source.set(4, 4, 1.0);

        let mut target = Grid::new(9, 9, EdgePolicy::Clamp).unwrap();
        diffuse(&mut target, &source, 1.0, 1.0, 1.0, Boundary::Scalar).unwrap();

        let center = target.get(4, 4);
        assert!(center < 1.0);
        assert!(center > 0.0);
        assert!(target.get(3, 4) > 0.0);
        assert_abs_diff_eq!(target.get(3, 4), target.get(5, 4), epsilon = 1e-2);
    }

    #[test]
    fn test_borders_follow_boundary() {
        let source = noisy(8, 8);
        let mut target = Grid::new(8, 8, EdgePolicy::Clamp).unwrap();
        diffuse(&mut target, &source, 0.5, 0.1, 1.0, Boundary::HorizontalVelocity).unwrap();

        for y in 1..7 {
            assert_eq!(target.get(0, y), -target.get(1, y));
            assert_eq!(target.get(7, y), -target.get(6, y));
        }
    }

    #[test]
    fn test_mismatch() {
        let source = Grid::new(4, 4, EdgePolicy::Clamp).unwrap();
        let mut target = Grid::new(4, 5, EdgePolicy::Clamp).unwrap();

        assert!(matches!(
            diffuse(&mut target, &source, 1.0, 1.0, 1.0, Boundary::Scalar),
            Err(FieldError::DimensionMismatch { .. })
        ));
    }
}
