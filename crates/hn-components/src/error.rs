//! Error types for element operations.

use hn_core::ElementId;
use thiserror::Error;

use crate::setpoint::SetpointKey;

/// Errors that can occur while configuring elements or building their rows.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComponentError {
    #[error("Connection point {port} out of range for element '{element}' ({count} ports)")]
    PortOutOfRange {
        element: String,
        port: usize,
        count: usize,
    },

    #[error("Element '{name}' ({element}) is missing setpoint(s): {}", join_keys(.keys))]
    MissingSetpoint {
        element: ElementId,
        name: String,
        keys: Vec<SetpointKey>,
    },

    #[error("Invalid parameter for element '{element}': {what}")]
    InvalidParameter { element: String, what: String },

    #[error("Non-physical value: {what}")]
    NonPhysical { what: &'static str },

    #[error("Solution slice has length {actual}, expected {expected}")]
    SolutionLength { expected: usize, actual: usize },
}

pub type ComponentResult<T> = Result<T, ComponentError>;

fn join_keys(keys: &[SetpointKey]) -> String {
    keys.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
