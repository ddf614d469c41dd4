//! Error types for control operations.

use hn_core::ElementId;
use thiserror::Error;

/// Result type for control operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur while producing setpoints.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Invalid argument provided to a control function.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// The element is not managed by this controller.
    #[error("Element {element} is not managed by the controller")]
    UnknownElement { element: ElementId },

    /// A profile does not cover the requested timestep.
    #[error("Profile for element {element} has {len} values, timestep {step} requested")]
    ProfileLength {
        element: ElementId,
        len: usize,
        step: usize,
    },
}
