//! Error types for structure integration.

use thiserror::Error;

/// Result type for structure operations.
pub type StructureResult<T> = Result<T, StructureError>;

/// Errors encountered while integrating a body's structure.
///
/// `Clone` so that batch runs can hand per-element outcomes to the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructureError {
    /// Caller contract violation, reported before any stepping.
    #[error("Invalid input: {what}")]
    InvalidInput { what: &'static str },

    /// The radius ceiling was crossed without the surface event firing.
    #[error(
        "No surface below r = {ceiling_m} m (reached r = {radius_m} m with P = {pressure_pa} Pa)"
    )]
    RunawayRadius {
        radius_m: f64,
        pressure_pa: f64,
        ceiling_m: f64,
    },

    /// The step controller could not hold the requested tolerance.
    #[error("Step size underflow at r = {radius_m} m (h = {step_m} m)")]
    StepUnderflow { radius_m: f64, step_m: f64 },

    /// The per-integration step budget ran out before any other outcome.
    #[error("Step budget exhausted at r = {radius_m} m")]
    MaxStepsExceeded { radius_m: f64 },

    /// A profile query radius lies at or beyond the body's surface.
    #[error("Profile radius {query_m} m lies beyond the surface at {surface_m} m")]
    QueryBeyondSurface { query_m: f64, surface_m: f64 },

    /// Integration produced a non-finite state.
    #[error("Non-finite state at r = {radius_m} m")]
    NonFiniteState { radius_m: f64 },
}
