//! Structure model: equation of state + gravity + solver configuration.

use hs_core::Tolerances;
use hs_eos::DensityModel;

use crate::dopri::State;
use crate::error::{StructureError, StructureResult};

/// Surface point of a converged integration: the radius at which pressure
/// fell to the surface threshold, with the enclosed mass and pressure there.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Surface {
    pub radius_m: f64,
    pub mass_kg: f64,
    pub pressure_pa: f64,
}

/// Post-step verdict of the surface predicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepControl {
    /// Keep integrating outward.
    Continue,
    /// Pressure fell below the surface threshold within the last step.
    Stop,
    /// The radius ceiling was crossed; the integration is not converging.
    RunawayAbort,
}

/// Options for structure solves.
#[derive(Clone, Copy, Debug)]
pub struct SolveOptions {
    /// Relative step-error tolerance
    pub rel_tol: f64,
    /// Absolute step-error tolerance
    pub abs_tol: f64,
    /// Radius the integration starts from [m]; keeps the pressure-gradient
    /// term away from the r = 0 singularity while staying negligible next to
    /// any physical body
    pub start_radius_m: f64,
    /// Pressure threshold defining the surface [Pa]
    pub surface_pressure_pa: f64,
    /// Runaway guard: the integration is abandoned past this radius [m]
    pub radius_ceiling_m: f64,
    /// First trial step [m]
    pub initial_step_m: f64,
    /// Maximum number of trial steps per integration (safety limit)
    pub max_steps: usize,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            rel_tol: 1e-6,
            abs_tol: 1e-12,
            start_radius_m: 1e-10,
            surface_pressure_pa: 1e-2,
            radius_ceiling_m: 1e13,
            initial_step_m: 1e-10,
            max_steps: 1_000_000,
        }
    }
}

impl SolveOptions {
    pub(crate) fn validate(&self) -> StructureResult<()> {
        if !(self.rel_tol > 0.0) || !(self.abs_tol > 0.0) {
            return Err(StructureError::InvalidInput {
                what: "tolerances must be positive",
            });
        }
        if !(self.start_radius_m > 0.0) {
            return Err(StructureError::InvalidInput {
                what: "start radius must be positive",
            });
        }
        if !(self.initial_step_m > 0.0) {
            return Err(StructureError::InvalidInput {
                what: "initial step must be positive",
            });
        }
        if !(self.surface_pressure_pa > 0.0) {
            return Err(StructureError::InvalidInput {
                what: "surface pressure threshold must be positive",
            });
        }
        if !(self.radius_ceiling_m > self.start_radius_m) {
            return Err(StructureError::InvalidInput {
                what: "radius ceiling must exceed the start radius",
            });
        }
        if self.max_steps == 0 {
            return Err(StructureError::InvalidInput {
                what: "max_steps must be positive",
            });
        }
        Ok(())
    }

    pub(crate) fn tolerances(&self) -> Tolerances {
        Tolerances {
            abs: self.abs_tol,
            rel: self.rel_tol,
        }
    }
}

/// Integrator for the hydrostatic structure equations under a given density
/// model.
///
/// Owns the equation of state, the gravitational constant and the solver
/// options; all trajectory state is per-call, so one model may serve many
/// concurrent solves.
#[derive(Clone, Debug)]
pub struct StructureModel<E> {
    eos: E,
    big_g: f64,
    options: SolveOptions,
}

impl<E: DensityModel> StructureModel<E> {
    /// Create a model with default solve options. The gravitational constant
    /// is an explicit input (see `hs_core::units::constants::G_SI`).
    pub fn new(eos: E, big_g: f64) -> Self {
        Self::with_options(eos, big_g, SolveOptions::default())
    }

    /// Create a model with explicit solve options.
    pub fn with_options(eos: E, big_g: f64, options: SolveOptions) -> Self {
        Self {
            eos,
            big_g,
            options,
        }
    }

    pub fn options(&self) -> &SolveOptions {
        &self.options
    }

    pub fn eos(&self) -> &E {
        &self.eos
    }

    /// Hydrostatic right-hand side at radius r > 0:
    ///
    /// ```text
    /// dM/dr = 4 pi r^2 rho(P)
    /// dP/dr = -G M rho(P) / r^2
    /// ```
    pub(crate) fn rhs(&self, radius_m: f64, y: &State) -> State {
        let rho = self.eos.rho(y[1]);
        let r2 = radius_m * radius_m;
        [
            4.0 * std::f64::consts::PI * r2 * rho,
            -self.big_g * y[0] * rho / r2,
        ]
    }

    /// Surface predicate, evaluated on every accepted step.
    pub(crate) fn surface_control(&self, radius_m: f64, y: &State) -> StepControl {
        if y[1] < self.options.surface_pressure_pa {
            StepControl::Stop
        } else if radius_m > self.options.radius_ceiling_m {
            StepControl::RunawayAbort
        } else {
            StepControl::Continue
        }
    }
}
