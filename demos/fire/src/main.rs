use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use firefield::{FireSimulation, FixedTimestep, Grid, SimulationConfig, StopHandle};
use image_util::Gradient;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Fire effect rendered to a PNG sequence in `out/`
#[derive(Parser, Debug)]
#[command(name = "fire")]
struct Args {
    /// JSON file with a (partial) simulation config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of frames to save
    #[arg(short, long, default_value_t = 200)]
    frames: usize,

    /// Seed for the random generator
    #[arg(short, long)]
    seed: Option<u64>,

    /// Pixels per cell
    #[arg(long, default_value_t = 4)]
    scale: u32,

    /// Pattern scrolled across the fire, `#` is a block
    #[arg(long, default_value = "### ## # ###  #### # ##")]
    banner: String,
}

const GLOW: f32 = 1.3;
const SHADOW: f32 = 0.68;

/// Scrolls `pattern` right to left over the field, one cell per update.
struct Banner {
    pattern: Vec<bool>,
    x: isize,
    y: isize,
    block: usize,
}

impl Banner {
    fn new(pattern: &str, width: usize, y: usize) -> Self {
        Self {
            pattern: pattern.chars().map(|c| c == '#').collect(),
            x: width as isize,
            y: y as isize,
            block: 3,
        }
    }

    fn draw(&mut self, field: &mut Grid, simulation_time: f64) {
        let y = (simulation_time * 2.0).sin() * 5.0;
        let y = self.y + y as isize;
        let stride = self.block as isize + 1;

        for (i, _) in self.pattern.iter().enumerate().filter(|(_, on)| **on) {
            let x = self.x + i as isize * stride;
            field.fill_rect(x + 1, y - 1, self.block, self.block, SHADOW, false);
            field.fill_rect(x, y, self.block, self.block, GLOW, false);
        }

        self.x -= 1;
        if self.x + self.pattern.len() as isize * stride < 0 {
            self.x = field.width() as isize;
        }
    }
}

fn load_config(args: &Args) -> anyhow::Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => SimulationConfig::default(),
    };

    if args.seed.is_some() {
        config.seed = args.seed;
    }

    Ok(config)
}

/// Hands up to `frames` frames to `save`, numbered from 1, and returns how many arrived.
///
/// The sender lives inside the simulation, so it is never dropped while the loop is
/// alive or after it died. Waiting ends once the loop is no longer running.
fn receive_frames<T>(
    rx: &Receiver<T>,
    frames: usize,
    loop_state: &StopHandle,
    mut save: impl FnMut(usize, T) -> anyhow::Result<()>,
) -> anyhow::Result<usize> {
    let mut saved = 0;
    while saved < frames {
        match rx.recv_timeout(Duration::from_millis(250)) {
            Ok(frame) => {
                saved += 1;
                save(saved, frame)?;
            }
            Err(RecvTimeoutError::Timeout) if loop_state.is_running() => {}
            Err(_) => break,
        }
    }
    Ok(saved)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    info!("{:?}", config);

    std::fs::create_dir_all("out")?;

    let (tx, rx) = mpsc::sync_channel(4);
    let gradient = Gradient::fire();
    let scale = args.scale;

    let mut banner = Banner::new(&args.banner, config.field.width, config.field.height / 2);
    let simulation = FireSimulation::new(&config)?
        .with_overlay(move |field: &mut Grid, t: f64, _dt: f64| banner.draw(field, t))
        .with_sink(move |field: &Grid| {
            // Drop frames while the writer is busy.
            let _ = tx.try_send(image_util::render(field, &gradient, scale));
        });

    let scheduler = FixedTimestep::from_config(&config.scheduler)?;
    let thread = scheduler.spawn(simulation)?;

    receive_frames(&rx, args.frames, &thread.stop_handle(), |index, img| {
        image_util::save("fire", index, &img)?;
        eprint!("\r {} / {}", index, args.frames);
        Ok(())
    })?;
    eprintln!();

    thread.stop();
    let (simulation, result) = thread.join();
    result?;

    info!(
        "Done: {} steps, {} frames rendered",
        simulation.steps(),
        simulation.frames()
    );

    Ok(())
}
