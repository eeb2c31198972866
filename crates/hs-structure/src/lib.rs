//! hs-structure: hydrostatic structure integration for hydrostat.
//!
//! Provides:
//! - Dormand-Prince 5(4) adaptive integration of the coupled mass/pressure
//!   equations outward from the center
//! - Surface detection via a post-step predicate, refined inside the
//!   crossing step
//! - Interior density sampling along one continuous trajectory
//! - Mass-radius manifold generation across independent central pressures

pub mod error;
pub mod manifold;
pub mod model;

// Internal modules
mod dopri;
mod solve;
mod tableau;

// Re-exports for public API
pub use error::{StructureError, StructureResult};
pub use manifold::ManifoldResult;
pub use model::{SolveOptions, StepControl, StructureModel, Surface};
