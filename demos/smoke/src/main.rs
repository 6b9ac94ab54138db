use firefield::{FieldConfig, SmokeSimulation};
use image_util::Gradient;

fn main() -> firefield::Result<()> {
    const N: usize = 200;
    const N_FRAME: usize = 120;

    let config = FieldConfig {
        width: N,
        height: N,
        cell_size: 1.0 / N as f32,
        ..FieldConfig::default()
    };

    let mut smoke = SmokeSimulation::new(&config)?;
    let gradient = Gradient::fire();

    let n = N as isize;
    smoke.inject_density(n / 2 - 5, n - 20, 10, 10, 20.0);
    smoke.inject_force(n / 2 - 5, n / 4, 10, n as usize / 2, 0.0, -2.0);

    let dt = 1.0 / 24.0;

    for f in 1..=N_FRAME {
        image_util::save_gradient("smoke", f, smoke.density(), &gradient, 2).unwrap();

        smoke.step(dt)?;

        eprint!("\r {} / {}", f, N_FRAME);
    }

    Ok(())
}
