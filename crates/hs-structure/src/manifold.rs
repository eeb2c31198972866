//! Mass-radius manifold generation across central pressures.

use rayon::prelude::*;
use tracing::warn;

use hs_eos::DensityModel;

use crate::error::StructureError;
use crate::model::{StructureModel, Surface};

/// Result of a mass-radius manifold run.
///
/// Outcomes are positional: `outcomes[i]` belongs to
/// `central_pressures_pa[i]`. One failed element never aborts the batch.
#[derive(Clone, Debug)]
pub struct ManifoldResult {
    /// Central pressures the batch was run over [Pa]
    pub central_pressures_pa: Vec<f64>,
    /// Per-pressure outcome: surface point or the error that stopped it
    pub outcomes: Vec<Result<Surface, StructureError>>,
    /// Number of converged integrations
    pub num_converged: usize,
    /// Number of failed integrations
    pub num_failed: usize,
}

impl ManifoldResult {
    /// Masses of the converged bodies [kg], in input order.
    pub fn masses_kg(&self) -> Vec<f64> {
        self.outcomes
            .iter()
            .filter_map(|o| o.as_ref().ok().map(|s| s.mass_kg))
            .collect()
    }

    /// Radii of the converged bodies [m], in input order.
    pub fn radii_m(&self) -> Vec<f64> {
        self.outcomes
            .iter()
            .filter_map(|o| o.as_ref().ok().map(|s| s.radius_m))
            .collect()
    }

    /// Central pressures corresponding to the converged bodies [Pa].
    pub fn converged_central_pressures_pa(&self) -> Vec<f64> {
        self.central_pressures_pa
            .iter()
            .zip(&self.outcomes)
            .filter_map(|(pc, o)| o.as_ref().ok().map(|_| *pc))
            .collect()
    }
}

impl<E: DensityModel> StructureModel<E> {
    /// Solve one body per central pressure and collect the mass-radius
    /// manifold.
    ///
    /// Integrations are independent and share only the immutable model, so
    /// the batch fans out across worker threads; output order matches input
    /// order regardless.
    pub fn manifold(&self, central_pressures_pa: &[f64]) -> ManifoldResult {
        let outcomes: Vec<Result<Surface, StructureError>> = central_pressures_pa
            .par_iter()
            .map(|&pc| self.solve_surface(pc))
            .collect();

        let mut num_converged = 0;
        let mut num_failed = 0;
        for (pc, outcome) in central_pressures_pa.iter().zip(&outcomes) {
            match outcome {
                Ok(_) => num_converged += 1,
                Err(err) => {
                    num_failed += 1;
                    warn!(central_pressure_pa = *pc, %err, "manifold element failed");
                }
            }
        }

        ManifoldResult {
            central_pressures_pa: central_pressures_pa.to_vec(),
            outcomes,
            num_converged,
            num_failed,
        }
    }
}
