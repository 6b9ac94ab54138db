//! Fixed timestep loop: simulation steps of constant size, decoupled from the frame rate.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, trace};

use crate::config::SchedulerConfig;
use crate::error::{FieldError, Result};

/// Something driven by a [`FixedTimestep`].
pub trait Simulation {
    /// Advances the simulation by `delta_time` seconds, `simulation_time` is the time
    /// before the update.
    fn update(&mut self, simulation_time: f64, delta_time: f64) -> Result<()>;

    /// Called once per frame after all updates of that frame.
    fn render(&mut self) -> Result<()>;
}

/// Wall-clock source, in seconds.
pub trait Clock {
    fn now(&mut self) -> f64;

    fn sleep(&mut self, seconds: f64);
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&mut self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }

    fn sleep(&mut self, seconds: f64) {
        if seconds > 0.0 {
            thread::sleep(Duration::from_secs_f64(seconds));
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
}

/// Asks a running loop to finish after its current frame.
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// A loop running on its own thread, see [`FixedTimestep::spawn`].
#[derive(Debug)]
pub struct SchedulerThread<S> {
    stop: StopHandle,
    handle: JoinHandle<(S, Result<()>)>,
}

impl<S> SchedulerThread<S> {
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Waits for the loop to end and gives the simulation back.
    ///
    /// Panics if the scheduler thread panicked.
    pub fn join(self) -> (S, Result<()>) {
        match self.handle.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

#[derive(Debug)]
pub struct FixedTimestep {
    step_size: f64,
    max_frame_time: f64,
    simulation_time: f64,
    remaining_time: f64,
    running: Arc<AtomicBool>,
}

impl FixedTimestep {
    pub fn new(step_size: f64, max_frame_time: f64) -> Result<Self> {
        if !(step_size > 0.0 && step_size.is_finite()) {
            return Err(FieldError::InvalidStepSize { step_size });
        }

        Ok(Self {
            step_size,
            max_frame_time: max_frame_time.max(0.0),
            simulation_time: 0.0,
            remaining_time: 0.0,
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn from_config(config: &SchedulerConfig) -> Result<Self> {
        Self::new(config.step_size, config.max_frame_time)
    }

    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    pub fn simulation_time(&self) -> f64 {
        self.simulation_time
    }

    pub fn state(&self) -> SchedulerState {
        if self.running.load(Ordering::Acquire) {
            SchedulerState::Running
        } else {
            SchedulerState::Stopped
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.running))
    }

    /// Adds `frame_time` seconds of wall-clock time and runs as many whole steps as fit.
    ///
    /// `frame_time` is capped at the maximum frame time first, so a long stall is not
    /// caught up in full. Returns the number of updates run.
    pub fn advance<S>(&mut self, simulation: &mut S, frame_time: f64) -> Result<usize>
    where
        S: Simulation + ?Sized,
    {
        let mut frame_time = frame_time.max(0.0);
        if frame_time > self.max_frame_time {
            debug!(
                "Frame took {:.3}s, only catching up {:.3}s",
                frame_time, self.max_frame_time
            );
            frame_time = self.max_frame_time;
        }

        self.remaining_time += frame_time;

        let mut updates = 0;
        while self.remaining_time >= self.step_size {
            simulation.update(self.simulation_time, self.step_size)?;
            self.remaining_time -= self.step_size;
            self.simulation_time += self.step_size;
            updates += 1;
        }

        Ok(updates)
    }

    /// Runs frames until stopped: catch up with `clock`, render once, idle for the rest
    /// of the step.
    pub fn run<S, C>(&mut self, simulation: &mut S, clock: &mut C) -> Result<()>
    where
        S: Simulation + ?Sized,
        C: Clock + ?Sized,
    {
        self.running.store(true, Ordering::Release);
        self.drive(simulation, clock)
    }

    fn drive<S, C>(&mut self, simulation: &mut S, clock: &mut C) -> Result<()>
    where
        S: Simulation + ?Sized,
        C: Clock + ?Sized,
    {
        info!("Scheduler started, step size {:.4}s", self.step_size);

        let result = self.frames(simulation, clock);

        self.running.store(false, Ordering::Release);
        info!(
            "Scheduler stopped at simulation time {:.3}s",
            self.simulation_time
        );

        result
    }

    fn frames<S, C>(&mut self, simulation: &mut S, clock: &mut C) -> Result<()>
    where
        S: Simulation + ?Sized,
        C: Clock + ?Sized,
    {
        let mut old_time = clock.now();

        while self.running.load(Ordering::Acquire) {
            let frame_start = clock.now();
            let frame_time = frame_start - old_time;
            old_time = frame_start;

            let updates = self.advance(simulation, frame_time)?;
            simulation.render()?;

            let frame_duration = clock.now() - frame_start;
            trace!("{} updates in {:.4}s", updates, frame_duration);

            let idle = self.step_size - frame_duration;
            if idle > 0.0 {
                clock.sleep(idle);
            }
        }

        Ok(())
    }

    /// Moves the loop and `simulation` onto a new thread driven by a [`SystemClock`].
    pub fn spawn<S>(mut self, mut simulation: S) -> std::io::Result<SchedulerThread<S>>
    where
        S: Simulation + Send + 'static,
    {
        // Marked running before the thread starts so an early stop is not lost.
        self.running.store(true, Ordering::Release);
        let stop = self.stop_handle();

        let handle = thread::Builder::new()
            .name("scheduler".into())
            .spawn(move || {
                let result = self.drive(&mut simulation, &mut SystemClock::new());
                (simulation, result)
            })?;

        Ok(SchedulerThread { stop, handle })
    }
}
