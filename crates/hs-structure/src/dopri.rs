//! Adaptive Dormand-Prince 5(4) stepping over the two-component state.

use hs_core::Tolerances;

use crate::tableau::{A, B, C, E, STAGES};

/// Integration state: [enclosed mass (kg), pressure (Pa)].
pub(crate) type State = [f64; 2];

/// Step-size controller (I-controller):
///
/// ```text
/// h_new = safety * h * error^(-1/5)
/// ```
#[derive(Clone, Debug)]
pub(crate) struct StepController {
    pub safety: f64,
    pub min_factor: f64,
    pub max_factor: f64,
    exponent: f64,
}

impl Default for StepController {
    fn default() -> Self {
        Self {
            safety: 0.9,
            min_factor: 0.2,
            max_factor: 5.0,
            exponent: 1.0 / 5.0,
        }
    }
}

impl StepController {
    /// Step-size adjustment factor for a scaled error estimate. A non-finite
    /// estimate shrinks at the maximum rate.
    pub fn factor(&self, error: f64) -> f64 {
        if !error.is_finite() {
            return self.min_factor;
        }
        if error == 0.0 {
            return self.max_factor;
        }
        (self.safety * error.powf(-self.exponent)).clamp(self.min_factor, self.max_factor)
    }
}

/// Outcome of one trial step.
pub(crate) struct StepTrial {
    /// 5th-order solution at the step end
    pub y: State,
    /// Controller's suggested next step size
    pub h_next: f64,
    /// Whether the scaled error estimate passed the acceptance test
    pub accepted: bool,
    /// Derivative at the step start (first stage)
    pub f0: State,
    /// Derivative at the step end (FSAL stage, exact when accepted)
    pub f1: State,
}

/// Embedded-pair stepper with tolerance-scaled error control.
#[derive(Clone, Debug)]
pub(crate) struct DormandPrince {
    tol: Tolerances,
    controller: StepController,
}

impl DormandPrince {
    pub fn new(tol: Tolerances) -> Self {
        Self {
            tol,
            controller: StepController::default(),
        }
    }

    /// Attempt one step of size `h` from (`r`, `y`).
    pub fn step<F>(&self, rhs: F, r: f64, y: &State, h: f64) -> StepTrial
    where
        F: Fn(f64, &State) -> State,
    {
        let mut k = [[0.0_f64; 2]; STAGES];
        k[0] = rhs(r, y);
        for i in 1..STAGES {
            let mut y_stage = [0.0_f64; 2];
            for n in 0..2 {
                let mut sum = 0.0;
                for j in 0..i {
                    sum += A[i][j] * k[j][n];
                }
                y_stage[n] = y[n] + h * sum;
            }
            k[i] = rhs(r + C[i] * h, &y_stage);
        }

        let mut y_new = [0.0_f64; 2];
        for n in 0..2 {
            let mut sum = 0.0;
            for i in 0..STAGES {
                sum += B[i] * k[i][n];
            }
            y_new[n] = y[n] + h * sum;
        }

        // Scaled max-norm of the embedded error estimate. Any non-finite
        // component (overflowing derivatives, NaN stages) forces a rejection
        // rather than silently comparing against NaN.
        let mut error: f64 = 0.0;
        for n in 0..2 {
            let mut e = 0.0;
            for i in 0..STAGES {
                e += E[i] * k[i][n];
            }
            e *= h;
            let scale = self.tol.abs + self.tol.rel * y[n].abs().max(y_new[n].abs());
            let scaled = (e / scale).abs();
            if !scaled.is_finite() || !y_new[n].is_finite() {
                error = f64::INFINITY;
                break;
            }
            error = error.max(scaled);
        }

        let accepted = error.is_finite() && error <= 1.0;
        let h_next = h * self.controller.factor(error);

        StepTrial {
            y: y_new,
            h_next,
            accepted,
            f0: k[0],
            f1: k[STAGES - 1],
        }
    }
}

/// Cubic Hermite interpolation of the state inside one accepted step, from
/// the endpoint states and derivatives.
pub(crate) fn hermite(
    r0: f64,
    y0: &State,
    f0: &State,
    r1: f64,
    y1: &State,
    f1: &State,
    r: f64,
) -> State {
    let dr = r1 - r0;
    let alpha = (r - r0) / dr;
    let a2 = alpha * alpha;
    let a3 = a2 * alpha;
    let h00 = 1.0 - 3.0 * a2 + 2.0 * a3;
    let h10 = alpha - 2.0 * a2 + a3;
    let h01 = 3.0 * a2 - 2.0 * a3;
    let h11 = -a2 + a3;
    let mut y = [0.0_f64; 2];
    for n in 0..2 {
        y[n] = h00 * y0[n] + h10 * dr * f0[n] + h01 * y1[n] + h11 * dr * f1[n];
    }
    y
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quadrature_rhs(r: f64, _y: &State) -> State {
        // pure quadrature, both components below the method's exactness degree
        [r * r, -r]
    }

    #[test]
    fn exact_on_low_degree_polynomials() {
        let dp = DormandPrince::new(Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        });
        let trial = dp.step(quadrature_rhs, 1.0, &[0.0, 0.0], 0.5);
        assert!(trial.accepted);
        let exact0 = (1.5_f64.powi(3) - 1.0) / 3.0;
        let exact1 = -(1.5_f64.powi(2) - 1.0) / 2.0;
        assert!((trial.y[0] - exact0).abs() < 1e-12, "y0 = {}", trial.y[0]);
        assert!((trial.y[1] - exact1).abs() < 1e-12, "y1 = {}", trial.y[1]);
    }

    #[test]
    fn adaptive_decay_matches_exponential() {
        // y' = -y on both components, integrated 0 -> 2 with accept/reject
        let dp = DormandPrince::new(Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        });
        let rhs = |_r: f64, y: &State| [-y[0], -y[1]];
        let mut r = 0.0;
        let mut y = [1.0, 2.0];
        let mut h: f64 = 0.1;
        let r_end = 2.0;
        let mut accepted = 0;
        let mut rejected = 0;
        while r_end - r > 1e-12 {
            let h_try = h.min(r_end - r);
            let trial = dp.step(rhs, r, &y, h_try);
            if trial.accepted {
                r += h_try;
                y = trial.y;
                accepted += 1;
            } else {
                rejected += 1;
            }
            h = trial.h_next;
            assert!(accepted + rejected < 10_000, "controller is not converging");
        }
        let exact = (-2.0_f64).exp();
        assert!((y[0] - exact).abs() / exact < 1e-7);
        assert!((y[1] - 2.0 * exact).abs() / (2.0 * exact) < 1e-7);
    }

    #[test]
    fn rejects_on_non_finite_derivatives() {
        let dp = DormandPrince::new(Tolerances {
            abs: 1e-12,
            rel: 1e-6,
        });
        let rhs = |_r: f64, _y: &State| [f64::INFINITY, f64::NAN];
        let trial = dp.step(rhs, 1.0, &[0.0, 1.0], 0.1);
        assert!(!trial.accepted);
        assert!(trial.h_next < 0.1);
    }

    #[test]
    fn controller_factor_bounds() {
        let ctrl = StepController::default();
        assert_eq!(ctrl.factor(0.0), ctrl.max_factor);
        assert_eq!(ctrl.factor(f64::NAN), ctrl.min_factor);
        assert_eq!(ctrl.factor(f64::INFINITY), ctrl.min_factor);
        let f = ctrl.factor(1.0);
        assert!((f - ctrl.safety).abs() < 1e-14);
        assert!(ctrl.factor(1e12) >= ctrl.min_factor);
        assert!(ctrl.factor(1e-12) <= ctrl.max_factor);
    }

    #[test]
    fn hermite_reproduces_cubics() {
        // y(r) = r^2 on [1, 2]; a cubic Hermite is exact on quadratics
        let y0 = [1.0, 1.0];
        let f0 = [2.0, 2.0];
        let y1 = [4.0, 4.0];
        let f1 = [4.0, 4.0];
        let at = |r: f64| hermite(1.0, &y0, &f0, 2.0, &y1, &f1, r);
        assert!((at(1.0)[0] - 1.0).abs() < 1e-14);
        assert!((at(2.0)[0] - 4.0).abs() < 1e-14);
        assert!((at(1.5)[0] - 2.25).abs() < 1e-14);
    }
}
