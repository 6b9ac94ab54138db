use firefield::d2::{diffuse, Boundary, EdgePolicy, Grid};

fn main() -> firefield::Result<()> {
    const N: usize = 400;
    const N_FRAME: usize = 64;

    let mut soot = Grid::new(N, N, EdgePolicy::Clamp)?;
    let mut next = Grid::new(N, N, EdgePolicy::Clamp)?;

    let dt = 1.0 / 24.0;
    let diff = 0.001;

    soot.fill_rect(N as isize / 2 - 2, N as isize / 2 - 2, 4, 4, 1000.0, false);

    for f in 1..=N_FRAME {
        image_util::save_monochrome("diffuse", f, &soot).unwrap();
        diffuse(&mut next, &soot, diff, dt, 1.0 / N as f32, Boundary::Scalar)?;
        std::mem::swap(&mut soot, &mut next);

        eprint!("\r {} / {}", f, N_FRAME);
    }

    Ok(())
}
