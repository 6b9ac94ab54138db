//! A double-buffered 2D scalar field with Diffuse and Advect operations,
//! a stochastic fire rule and a fixed-timestep scheduler to drive it.

pub mod config;
pub mod d2;
pub mod error;
pub mod fire;
pub mod present;
pub mod scheduler;
pub mod smoke;

pub use config::{FieldConfig, FireParams, SchedulerConfig, SimulationConfig};
pub use d2::{Boundary, DoubleBuffer, EdgePolicy, Grid, VelocityField};
pub use error::{FieldError, Result};
pub use fire::{FireSimulation, PerturbationCoupling};
pub use present::{FrameSink, Overlay};
pub use scheduler::{Clock, FixedTimestep, SchedulerState, Simulation, StopHandle, SystemClock};
pub use smoke::SmokeSimulation;
