use std::convert::Infallible;

use nalgebra::Vector6;
use tendril_core::Model;

use crate::{ArcSample, RodModel, Wrench};

/// Right-hand side of the costate equation `μ' = ad_ξᵀ μ`.
///
/// The internal wrench is conserved in the world frame, so in the body frame
/// it only rotates and couples torque to force through the rod's strains.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostateSystem {
    model: RodModel,
    inv_stiffness: Vector6<f64>,
}

impl CostateSystem {
    #[must_use]
    pub fn new(model: RodModel, inv_stiffness: Vector6<f64>) -> Self {
        Self {
            model,
            inv_stiffness,
        }
    }

    /// Returns `μ'` for the costate `mu`.
    #[must_use]
    pub fn evaluate(&self, mu: &Wrench) -> Wrench {
        match self.model {
            RodModel::Inextensible => evaluate_inextensible(mu, &self.inv_stiffness),
            RodModel::ExtensibleShearable => {
                evaluate_extensible_shearable(mu, &self.inv_stiffness)
            }
        }
    }
}

impl Model for CostateSystem {
    type Input = ArcSample<Wrench>;
    type Output = Wrench;
    type Error = Infallible;

    fn call(&self, input: &Self::Input) -> Result<Wrench, Self::Error> {
        Ok(self.evaluate(&input.value))
    }
}

/// Kirchhoff rod: `ω = c⁻¹ τ`, `v = e_x`.
fn evaluate_inextensible(mu: &Wrench, inv: &Vector6<f64>) -> Wrench {
    let (t0, t1, t2) = (mu[0], mu[1], mu[2]);
    let (f0, f1, f2) = (mu[3], mu[4], mu[5]);
    let (u0, u1, u2) = (inv[0] * t0, inv[1] * t1, inv[2] * t2);

    Wrench::new(
        t1 * u2 - t2 * u1,
        t2 * u0 - t0 * u2 + f2,
        t0 * u1 - t1 * u0 - f1,
        f1 * u2 - f2 * u1,
        f2 * u0 - f0 * u2,
        f0 * u1 - f1 * u0,
    )
}

/// Cosserat rod: `ω = c⁻¹ τ`, `v = e_x + c⁻¹ f`.
fn evaluate_extensible_shearable(mu: &Wrench, inv: &Vector6<f64>) -> Wrench {
    let (t0, t1, t2) = (mu[0], mu[1], mu[2]);
    let (f0, f1, f2) = (mu[3], mu[4], mu[5]);
    let (u0, u1, u2) = (inv[0] * t0, inv[1] * t1, inv[2] * t2);
    let (v0, v1, v2) = (1.0 + inv[3] * f0, inv[4] * f1, inv[5] * f2);

    Wrench::new(
        t1 * u2 - t2 * u1 + f1 * v2 - f2 * v1,
        t2 * u0 - t0 * u2 + f2 * v0 - f0 * v2,
        t0 * u1 - t1 * u0 + f0 * v1 - f1 * v0,
        f1 * u2 - f2 * u1,
        f2 * u0 - f0 * u2,
        f0 * u1 - f1 * u0,
    )
}
