//! Error types for simulation runs.

use hn_components::{ComponentError, SetpointKey};
use hn_controls::ControlError;
use hn_core::ElementId;
use hn_solver::SolverError;
use thiserror::Error;

/// Errors that abort a simulation run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid simulation config: {what}")]
    InvalidConfig { what: &'static str },

    #[error("Timestep {step}: element '{name}' ({element}) is missing setpoint(s): {}", join_keys(.keys))]
    MissingSetpoint {
        step: usize,
        element: ElementId,
        name: String,
        keys: Vec<SetpointKey>,
    },

    #[error("Timestep {step}: controller addressed unknown element {element}")]
    UnknownElement { step: usize, element: ElementId },

    #[error("Component error: {0}")]
    Component(ComponentError),

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    #[error("Controller error: {0}")]
    Control(#[from] ControlError),

    #[error("Simulation cancelled before timestep {step}")]
    Cancelled { step: usize },
}

pub type SimResult<T> = Result<T, SimError>;

fn join_keys(keys: &[SetpointKey]) -> String {
    keys.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl SimError {
    /// Attaches the timestep to setpoint failures.
    pub(crate) fn from_component(step: usize, e: ComponentError) -> Self {
        match e {
            ComponentError::MissingSetpoint {
                element,
                name,
                keys,
            } => SimError::MissingSetpoint {
                step,
                element,
                name,
                keys,
            },
            other => SimError::Component(other),
        }
    }
}
