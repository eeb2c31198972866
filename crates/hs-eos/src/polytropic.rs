//! Floored polytropic pressure-density law.

use crate::error::{EosError, EosResult};
use crate::model::DensityModel;

/// Polytropic equation of state with a floor density:
///
/// ```text
/// rho(P) = rho0 + c * P^n   for P >= 0
/// rho(P) = rho0             for P < 0
/// ```
///
/// The floor keeps the density finite when the integrator transiently
/// overshoots into negative pressure near the surface. Parameters are
/// immutable once constructed.
#[derive(Clone, Debug, PartialEq)]
pub struct Polytropic {
    rho0_kg_m3: f64,
    coefficient: f64,
    exponent: f64,
}

impl Polytropic {
    /// Create a polytropic law from floor density [kg/m³], coefficient and
    /// exponent.
    ///
    /// The coefficient carries units of kg/m³/Pa^n; both it and the floor
    /// must be finite and non-negative. A polytropic term (`c > 0`) requires
    /// a positive exponent: a zero exponent would shift the zero-pressure
    /// density away from the floor, and a negative one diverges as the
    /// pressure falls to zero.
    pub fn new(rho0_kg_m3: f64, coefficient: f64, exponent: f64) -> EosResult<Self> {
        if !rho0_kg_m3.is_finite() || rho0_kg_m3 < 0.0 {
            return Err(EosError::NonPhysical {
                what: "floor density must be non-negative and finite",
            });
        }
        if !coefficient.is_finite() || coefficient < 0.0 {
            return Err(EosError::NonPhysical {
                what: "polytropic coefficient must be non-negative and finite",
            });
        }
        if !exponent.is_finite() {
            return Err(EosError::InvalidArg {
                what: "polytropic exponent must be finite",
            });
        }
        if coefficient > 0.0 && exponent <= 0.0 {
            return Err(EosError::NonPhysical {
                what: "polytropic exponent must be positive when the coefficient is nonzero",
            });
        }
        Ok(Self {
            rho0_kg_m3,
            coefficient,
            exponent,
        })
    }

    /// Floor/reference density [kg/m³].
    pub fn rho0_kg_m3(&self) -> f64 {
        self.rho0_kg_m3
    }

    /// Polytropic coefficient [kg/m³/Pa^n].
    pub fn coefficient(&self) -> f64 {
        self.coefficient
    }

    /// Polytropic exponent (dimensionless).
    pub fn exponent(&self) -> f64 {
        self.exponent
    }
}

impl DensityModel for Polytropic {
    fn rho(&self, pressure_pa: f64) -> f64 {
        if pressure_pa < 0.0 {
            return self.rho0_kg_m3;
        }
        self.rho0_kg_m3 + self.coefficient * pressure_pa.powf(self.exponent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_pressure_hits_floor_exactly() {
        let eos = Polytropic::new(1460.0, 0.00311, 0.513).unwrap();
        assert_eq!(eos.rho(-1.0), 1460.0);
        assert_eq!(eos.rho(-1.0e9), 1460.0);
        assert_eq!(eos.rho(f64::MIN), 1460.0);
    }

    #[test]
    fn zero_pressure_is_floor() {
        let eos = Polytropic::new(1460.0, 0.00311, 0.513).unwrap();
        assert_eq!(eos.rho(0.0), 1460.0);
    }

    #[test]
    fn large_pressure_stays_finite() {
        let eos = Polytropic::new(4260.0, 0.00127, 0.549).unwrap();
        assert!(eos.rho(1.0e17).is_finite());
    }

    #[test]
    fn earth_like_central_density() {
        // rocky-planet parameter set at an Earth-like central pressure
        let eos = Polytropic::new(1460.0, 0.00311, 0.513).unwrap();
        let rho_c = eos.rho(1.0e12);
        assert!(rho_c > 4_000.0 && rho_c < 8_000.0, "rho_c = {rho_c}");
    }

    #[test]
    fn zero_coefficient_is_constant_density() {
        let eos = Polytropic::new(5_000.0, 0.0, 1.0).unwrap();
        assert_eq!(eos.rho(0.0), 5_000.0);
        assert_eq!(eos.rho(1.0e15), 5_000.0);
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(Polytropic::new(-1.0, 0.0031, 0.5).is_err());
        assert!(Polytropic::new(f64::NAN, 0.0031, 0.5).is_err());
        assert!(Polytropic::new(1460.0, -0.1, 0.5).is_err());
        assert!(Polytropic::new(1460.0, 0.0031, f64::INFINITY).is_err());
        assert!(Polytropic::new(1460.0, 0.0031, 0.0).is_err());
        assert!(Polytropic::new(1460.0, 0.0031, -0.5).is_err());
        // exponent is irrelevant without a polytropic term
        assert!(Polytropic::new(1460.0, 0.0, -0.5).is_ok());
    }
}
