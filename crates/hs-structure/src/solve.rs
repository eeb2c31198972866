//! Surface solving and profile sampling.
//!
//! One step driver serves both operations: an accepted-step loop with
//! rejection retries and underflow/budget guards, combined per call with the
//! surface predicate (surface solve) or with exact advancement to a sequence
//! of query radii (profile sampling).

use tracing::debug;

use hs_eos::DensityModel;

use crate::dopri::{DormandPrince, State, hermite};
use crate::error::{StructureError, StructureResult};
use crate::model::{StepControl, StructureModel, Surface};

/// Fraction of the current radius below which the step size counts as
/// underflowed (about two decades above f64 epsilon).
const STEP_FLOOR: f64 = 1e-14;

/// Bisection iteration cap for locating the surface inside one step.
const MAX_BISECTIONS: usize = 64;

/// One accepted step, with endpoint derivatives for interpolation.
struct AcceptedStep {
    r_from: f64,
    y_from: State,
    f_from: State,
    r_to: f64,
    y_to: State,
    f_to: State,
}

/// Mutable trajectory cursor for one integration.
struct Stepper<'m, E> {
    model: &'m StructureModel<E>,
    dp: DormandPrince,
    r: f64,
    y: State,
    h: f64,
    steps_taken: usize,
}

impl<'m, E: DensityModel> Stepper<'m, E> {
    fn new(model: &'m StructureModel<E>, central_pressure_pa: f64) -> Self {
        let opts = model.options();
        Self {
            model,
            dp: DormandPrince::new(opts.tolerances()),
            r: opts.start_radius_m,
            y: [0.0, central_pressure_pa],
            h: opts.initial_step_m,
            steps_taken: 0,
        }
    }

    /// Advance by exactly one accepted step, retrying rejected trials with
    /// the controller's shrunken step size.
    fn advance(&mut self) -> StructureResult<AcceptedStep> {
        let max_steps = self.model.options().max_steps;
        let model = self.model;
        loop {
            if self.steps_taken >= max_steps {
                return Err(StructureError::MaxStepsExceeded { radius_m: self.r });
            }
            self.steps_taken += 1;

            let trial = self.dp.step(|r, y| model.rhs(r, y), self.r, &self.y, self.h);
            if trial.accepted {
                let step = AcceptedStep {
                    r_from: self.r,
                    y_from: self.y,
                    f_from: trial.f0,
                    r_to: self.r + self.h,
                    y_to: trial.y,
                    f_to: trial.f1,
                };
                if !step.y_to.iter().all(|v| v.is_finite()) {
                    return Err(StructureError::NonFiniteState { radius_m: step.r_to });
                }
                self.r = step.r_to;
                self.y = step.y_to;
                self.h = trial.h_next;
                return Ok(step);
            }

            if trial.h_next < self.r * STEP_FLOOR {
                return Err(StructureError::StepUnderflow {
                    radius_m: self.r,
                    step_m: trial.h_next,
                });
            }
            self.h = trial.h_next;
        }
    }

    /// Advance to exactly `target_m`, clamping the step so the target is
    /// never overshot. The surface predicate stays active: crossing the
    /// threshold on the way is a `QueryBeyondSurface` error carrying the
    /// located surface radius.
    fn advance_to(&mut self, target_m: f64) -> StructureResult<()> {
        loop {
            let remaining = target_m - self.r;
            if remaining <= target_m * f64::EPSILON {
                return Ok(());
            }
            let h_free = self.h;
            let clamped = self.h >= remaining;
            if clamped {
                self.h = remaining;
            }
            let step = self.advance()?;
            if clamped {
                // keep the controller's free-running step for later targets
                self.h = self.h.max(h_free);
            }
            if step.y_to[1] < self.model.options().surface_pressure_pa {
                let surface = locate_surface(self.model, &step);
                return Err(StructureError::QueryBeyondSurface {
                    query_m: target_m,
                    surface_m: surface.radius_m,
                });
            }
        }
    }
}

/// Refine the surface radius inside the step that crossed the threshold, by
/// bisection over the cubic Hermite interpolant of that step. The step
/// entered with pressure at or above the threshold and left below it, so the
/// crossing is bracketed.
fn locate_surface<E: DensityModel>(model: &StructureModel<E>, step: &AcceptedStep) -> Surface {
    let threshold = model.options().surface_pressure_pa;
    let interp = |r: f64| {
        hermite(
            step.r_from,
            &step.y_from,
            &step.f_from,
            step.r_to,
            &step.y_to,
            &step.f_to,
            r,
        )
    };

    let mut lo = step.r_from;
    let mut hi = step.r_to;
    for _ in 0..MAX_BISECTIONS {
        if hi - lo <= hi * STEP_FLOOR {
            break;
        }
        let mid = 0.5 * (lo + hi);
        if interp(mid)[1] < threshold {
            hi = mid;
        } else {
            lo = mid;
        }
    }

    // report the below-threshold side, where the event condition holds
    let y = interp(hi);
    Surface {
        radius_m: hi,
        mass_kg: y[0],
        pressure_pa: y[1],
    }
}

fn validate_central_pressure(central_pressure_pa: f64) -> StructureResult<()> {
    if !central_pressure_pa.is_finite() || central_pressure_pa <= 0.0 {
        return Err(StructureError::InvalidInput {
            what: "central pressure must be positive and finite",
        });
    }
    Ok(())
}

impl<E: DensityModel> StructureModel<E> {
    /// Integrate outward from the center until pressure falls to the surface
    /// threshold, and return the surface radius, enclosed mass and pressure
    /// there.
    ///
    /// A runaway integration (radius ceiling crossed before the surface
    /// event) is `RunawayRadius`; a step controller that cannot hold the
    /// tolerance is `StepUnderflow`.
    pub fn solve_surface(&self, central_pressure_pa: f64) -> StructureResult<Surface> {
        self.options().validate()?;
        validate_central_pressure(central_pressure_pa)?;

        let opts = *self.options();
        // a positive central pressure already below the threshold is a
        // degenerate body whose surface sits at the start radius
        if central_pressure_pa < opts.surface_pressure_pa {
            return Ok(Surface {
                radius_m: opts.start_radius_m,
                mass_kg: 0.0,
                pressure_pa: central_pressure_pa,
            });
        }

        let mut stepper = Stepper::new(self, central_pressure_pa);
        loop {
            let step = stepper.advance()?;
            match self.surface_control(step.r_to, &step.y_to) {
                StepControl::Continue => {}
                StepControl::Stop => {
                    let surface = locate_surface(self, &step);
                    debug!(
                        radius_m = surface.radius_m,
                        mass_kg = surface.mass_kg,
                        steps = stepper.steps_taken,
                        "surface located"
                    );
                    return Ok(surface);
                }
                StepControl::RunawayAbort => {
                    return Err(StructureError::RunawayRadius {
                        radius_m: step.r_to,
                        pressure_pa: step.y_to[1],
                        ceiling_m: opts.radius_ceiling_m,
                    });
                }
            }
        }
    }

    /// Sample the interior density at the given radii along one continuous
    /// trajectory from the same initial state as `solve_surface`.
    ///
    /// Radii must be finite, positive, non-decreasing, at or above the start
    /// radius and below the radius ceiling; any violation is `InvalidInput`
    /// before integration begins. A query radius at or beyond the body's
    /// surface fails with `QueryBeyondSurface` rather than truncating the
    /// output.
    pub fn sample_profile(
        &self,
        central_pressure_pa: f64,
        radii_m: &[f64],
    ) -> StructureResult<Vec<f64>> {
        self.options().validate()?;
        validate_central_pressure(central_pressure_pa)?;

        let opts = *self.options();
        let mut prev = opts.start_radius_m;
        for &r in radii_m {
            if !r.is_finite() || r <= 0.0 {
                return Err(StructureError::InvalidInput {
                    what: "profile radii must be positive and finite",
                });
            }
            if r < prev {
                return Err(StructureError::InvalidInput {
                    what: "profile radii must be non-decreasing and at or above the start radius",
                });
            }
            if r > opts.radius_ceiling_m {
                return Err(StructureError::InvalidInput {
                    what: "profile radii must not exceed the radius ceiling",
                });
            }
            prev = r;
        }

        if central_pressure_pa < opts.surface_pressure_pa {
            // degenerate body: every query radius lies outside it
            if let Some(&first) = radii_m.first() {
                return Err(StructureError::QueryBeyondSurface {
                    query_m: first,
                    surface_m: opts.start_radius_m,
                });
            }
            return Ok(Vec::new());
        }

        let mut stepper = Stepper::new(self, central_pressure_pa);
        let mut densities = Vec::with_capacity(radii_m.len());
        for &r in radii_m {
            stepper.advance_to(r)?;
            densities.push(self.eos().rho(stepper.y[1]));
        }
        Ok(densities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hs_core::units::constants::G_SI;
    use hs_eos::Polytropic;

    fn rocky_model() -> StructureModel<Polytropic> {
        StructureModel::new(Polytropic::new(1460.0, 0.00311, 0.513).unwrap(), G_SI)
    }

    #[test]
    fn rejects_non_positive_central_pressure() {
        let model = rocky_model();
        assert!(matches!(
            model.solve_surface(0.0),
            Err(StructureError::InvalidInput { .. })
        ));
        assert!(matches!(
            model.solve_surface(-1.0e9),
            Err(StructureError::InvalidInput { .. })
        ));
        assert!(matches!(
            model.solve_surface(f64::NAN),
            Err(StructureError::InvalidInput { .. })
        ));
        assert!(matches!(
            model.sample_profile(0.0, &[1.0e3]),
            Err(StructureError::InvalidInput { .. })
        ));
    }

    #[test]
    fn rejects_bad_profile_radii() {
        let model = rocky_model();
        let pc = 1.0e12;
        // decreasing
        assert!(matches!(
            model.sample_profile(pc, &[1.0e6, 5.0e5]),
            Err(StructureError::InvalidInput { .. })
        ));
        // non-positive
        assert!(matches!(
            model.sample_profile(pc, &[0.0, 1.0e6]),
            Err(StructureError::InvalidInput { .. })
        ));
        assert!(matches!(
            model.sample_profile(pc, &[-5.0]),
            Err(StructureError::InvalidInput { .. })
        ));
        // beyond the runaway ceiling
        assert!(matches!(
            model.sample_profile(pc, &[1.0e6, 2.0e13]),
            Err(StructureError::InvalidInput { .. })
        ));
    }

    #[test]
    fn repeated_profile_radii_are_allowed() {
        let model = rocky_model();
        let rho = model.sample_profile(1.0e12, &[1.0e5, 1.0e5]).unwrap();
        assert_eq!(rho.len(), 2);
        assert_eq!(rho[0], rho[1]);
    }

    #[test]
    fn empty_profile_is_empty() {
        let model = rocky_model();
        assert!(model.sample_profile(1.0e12, &[]).unwrap().is_empty());
    }

    #[test]
    fn sub_threshold_central_pressure_is_a_degenerate_surface() {
        let model = rocky_model();
        let surface = model.solve_surface(1.0e-3).unwrap();
        assert_eq!(surface.radius_m, model.options().start_radius_m);
        assert_eq!(surface.mass_kg, 0.0);
        assert_eq!(surface.pressure_pa, 1.0e-3);
    }

    #[test]
    fn near_vacuum_eos_reports_runaway() {
        // density stays ~0, so pressure never falls to the threshold and the
        // integration runs into the ceiling
        let eos = Polytropic::new(0.0, 1.0e-30, 1.0).unwrap();
        let model = StructureModel::new(eos, G_SI);
        match model.solve_surface(1.0e5) {
            Err(StructureError::RunawayRadius {
                radius_m,
                ceiling_m,
                ..
            }) => {
                assert!(radius_m > ceiling_m);
            }
            other => panic!("expected RunawayRadius, got {other:?}"),
        }
    }

    #[test]
    fn overflowing_polytropic_term_reports_step_underflow() {
        // 10^400 overflows f64, so the first derivative evaluation is
        // non-finite and every trial step is rejected
        let eos = Polytropic::new(0.0, 1.0, 400.0).unwrap();
        let model = StructureModel::new(eos, G_SI);
        assert!(matches!(
            model.solve_surface(10.0),
            Err(StructureError::StepUnderflow { .. })
        ));
    }

    #[test]
    fn invalid_options_are_reported_before_integration() {
        let eos = Polytropic::new(1460.0, 0.00311, 0.513).unwrap();
        let opts = crate::model::SolveOptions {
            rel_tol: -1.0,
            ..Default::default()
        };
        let model = StructureModel::with_options(eos, G_SI, opts);
        assert!(matches!(
            model.solve_surface(1.0e12),
            Err(StructureError::InvalidInput { .. })
        ));
    }
}
