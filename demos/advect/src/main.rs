use firefield::d2::{advect, Boundary, EdgePolicy, Grid};
use noise::{NoiseFn, Perlin};

fn main() -> firefield::Result<()> {
    const N: usize = 400;
    const N_FRAME: usize = 64;

    let mut soot = Grid::new(N, N, EdgePolicy::Clamp)?;
    let mut next = Grid::new(N, N, EdgePolicy::Clamp)?;

    soot.fill_rect(N as isize / 2 - 100, N as isize / 2 - 100, 201, 201, 0.5, false);

    let perlin = Perlin::new();
    let freq = 4.0;
    let sample = |x: usize, y: usize, z: f64| {
        perlin.get([x as f64 / N as f64 * freq, y as f64 / N as f64 * freq, z]) as f32
    };
    let u = Grid::from_fn(N, N, EdgePolicy::Clamp, |x, y| sample(x, y, 0.0))?;
    let v = Grid::from_fn(N, N, EdgePolicy::Clamp, |x, y| sample(x, y, 0.5))?;

    let dt = 1.0 / 24.0;
    let dx = 1.0 / N as f32;

    for f in 1..=N_FRAME {
        image_util::save_monochrome("advect", f, &soot).unwrap();

        advect(&mut next, &soot, &u, &v, dt, dx, Boundary::Scalar)?;
        std::mem::swap(&mut soot, &mut next);

        eprint!("\r {} / {}", f, N_FRAME);
    }

    Ok(())
}
