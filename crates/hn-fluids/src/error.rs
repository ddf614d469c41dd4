//! Fluid property errors.

use thiserror::Error;

/// Result type for fluid operations.
pub type FluidResult<T> = Result<T, FluidError>;

/// Errors raised while constructing or querying a fluid table.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FluidError {
    /// The table is unusable (too short, unsorted, non-monotonic energy).
    #[error("Invalid fluid table: {what}")]
    InvalidTable { what: String },

    /// A table entry or query argument is NaN or infinite.
    #[error("Non-finite value for {what}")]
    NonFinite { what: &'static str },
}
