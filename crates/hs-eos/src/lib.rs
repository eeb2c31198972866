//! hs-eos: pressure-density relations for hydrostat.
//!
//! Provides:
//! - DensityModel trait for pluggable equations of state
//! - Polytropic power-law implementation with a floor density
//!
//! # Architecture
//!
//! This crate defines a stable API (`DensityModel` trait) that isolates the
//! structure integrator from any particular pressure-density law. Currently
//! the floored polytrope is the only implementation, but the seam allows for
//! future additions (tabulated laws, piecewise polytropes).
//!
//! # Example
//!
//! ```
//! use hs_eos::{DensityModel, Polytropic};
//!
//! let eos = Polytropic::new(1460.0, 0.00311, 0.513).unwrap();
//! let rho = eos.rho(1.0e12);
//! assert!(rho > 1460.0);
//! ```

pub mod error;
pub mod model;
pub mod polytropic;

// Re-exports for ergonomics
pub use error::{EosError, EosResult};
pub use model::DensityModel;
pub use polytropic::Polytropic;
