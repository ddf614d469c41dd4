//! Error types for solver operations.

use hn_components::ComponentError;
use hn_graph::GraphError;
use thiserror::Error;

/// Errors that can occur while assembling or solving the network system.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Problem setup error: {what}")]
    Setup { what: String },

    #[error("System has {rows} equation rows for {unknowns} unknowns")]
    Dimension { rows: usize, unknowns: usize },

    #[error("Equation references unknown {index}, system has {unknowns}")]
    IndexOutOfRange { index: usize, unknowns: usize },

    #[error("Linear system is singular")]
    Singular,

    #[error("Component error: {0}")]
    Component(#[from] ComponentError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),
}

pub type SolverResult<T> = Result<T, SolverError>;
