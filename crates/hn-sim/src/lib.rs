//! hn-sim: time-stepped simulation of heat networks.
//!
//! Each timestep the controller hands out setpoints, the elements turn them
//! into prescribed flows, the solver runs to convergence and an outer check
//! re-solves while delivered heat misses the request. Outputs are collected
//! in a [`ResultTable`].

pub mod cancel;
pub mod config;
pub mod error;
pub mod progress;
pub mod results;
pub mod simulation;

pub use cancel::CancellationToken;
pub use config::SimulationConfig;
pub use error::{SimError, SimResult};
pub use progress::{ProgressReporter, SimProgress};
pub use results::{ColumnKey, ResultTable};
pub use simulation::{Simulation, SimulationResult, StepReport};
