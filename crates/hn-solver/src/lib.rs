//! Network assembly and the fixed-point solver.
//!
//! A [`Network`] holds elements, junctions and their topology. A [`Solver`]
//! repeatedly asks every element and junction for linear rows built around
//! the previous iterate, solves the dense system with nalgebra's LU and
//! writes the result back until the iterates stop changing.

pub mod error;
pub mod linear_system;
pub mod network;
pub mod solver;

pub use error::{SolverError, SolverResult};
pub use linear_system::LinearSystem;
pub use network::Network;
pub use solver::{SolveOutcome, SolveStatus, Solver, SolverConfig};
