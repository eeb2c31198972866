//! Equation-of-state errors.

use thiserror::Error;

/// Result type for equation-of-state operations.
pub type EosResult<T> = Result<T, EosError>;

/// Errors that can occur while constructing an equation of state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EosError {
    /// Non-physical parameter values (negative density, divergent exponent).
    #[error("Non-physical value for {what}")]
    NonPhysical { what: &'static str },

    /// Invalid argument.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}
