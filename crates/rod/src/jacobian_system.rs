//! Sensitivities of the rod with respect to its base wrench.
//!
//! Two 6×6 matrices are carried along the rod:
//!
//! - `M(s) = ∂μ(s)/∂a`, the costate sensitivity, starting from `I`
//! - `J(s)`, the body-frame sensitivity of the configuration, starting from `0`
//!
//! They obey the linearized costate and state equations
//!
//! ```text
//! M' = (ad_ξᵀ + Q(μ) G) M
//! J' = G M − ad_ξ J
//! ```
//!
//! where `G = ∂ξ/∂μ` and `Q(μ) = [[τ×, f×], [f×, 0]]`. Both are packed
//! side by side into a single [`JacobianPair`] so they step together.

use nalgebra::{Matrix6, SMatrix, Vector6};
use tendril_core::Model;

use crate::{
    ArcSample, RodModel, Wrench, se3,
    trajectory::{CostateInterpolant, InterpError},
};

/// `|det J|` above which the stability check is armed.
pub const STABILITY_THRESHOLD: f64 = 1e-6;

/// `|det J|` below which an armed rod is considered unstable.
pub const STABILITY_TOLERANCE: f64 = 1e-8;

/// `[M | J]`: the costate sensitivity in columns `0..6`, the configuration
/// sensitivity in columns `6..12`.
pub type JacobianPair = SMatrix<f64, 6, 12>;

/// Returns the pair at the base of the rod, `[I | 0]`.
#[must_use]
pub fn initial_pair() -> JacobianPair {
    pack(&Matrix6::identity(), &Matrix6::zeros())
}

#[must_use]
pub fn pack(m: &Matrix6<f64>, j: &Matrix6<f64>) -> JacobianPair {
    let mut pair = JacobianPair::zeros();
    pair.fixed_view_mut::<6, 6>(0, 0).copy_from(m);
    pair.fixed_view_mut::<6, 6>(0, 6).copy_from(j);
    pair
}

/// Splits a pair into `(M, J)`.
#[must_use]
pub fn split(pair: &JacobianPair) -> (Matrix6<f64>, Matrix6<f64>) {
    (
        pair.fixed_view::<6, 6>(0, 0).into_owned(),
        pair.fixed_view::<6, 6>(0, 6).into_owned(),
    )
}

/// Right-hand side of the sensitivity equations.
pub struct JacobianSystem<'a> {
    costates: &'a CostateInterpolant<'a>,
    model: RodModel,
    inv_stiffness: Vector6<f64>,
    gradient: Matrix6<f64>,
}

impl<'a> JacobianSystem<'a> {
    #[must_use]
    pub fn new(
        costates: &'a CostateInterpolant<'a>,
        model: RodModel,
        inv_stiffness: Vector6<f64>,
    ) -> Self {
        Self {
            costates,
            model,
            inv_stiffness,
            gradient: model.twist_gradient(&inv_stiffness),
        }
    }

    /// Returns `(M', J')` for the costate `mu` and the current `(M, J)`.
    #[must_use]
    pub fn evaluate(
        &self,
        mu: &Wrench,
        m: &Matrix6<f64>,
        j: &Matrix6<f64>,
    ) -> (Matrix6<f64>, Matrix6<f64>) {
        let xi = self.model.twist(mu, &self.inv_stiffness);
        let ad = se3::ad(&xi);
        let coupling = ad.transpose() + wrench_coupling(mu) * self.gradient;

        (coupling * m, self.gradient * m - ad * j)
    }
}

impl Model for JacobianSystem<'_> {
    type Input = ArcSample<JacobianPair>;
    type Output = JacobianPair;
    type Error = InterpError;

    fn call(&self, input: &Self::Input) -> Result<JacobianPair, Self::Error> {
        let mu = self.costates.at(input.s)?;
        let (m, j) = split(&input.value);
        let (dm, dj) = self.evaluate(&mu, &m, &j);
        Ok(pack(&dm, &dj))
    }
}

/// `Q(μ) = [[τ×, f×], [f×, 0]]`, the derivative of `ad_ξᵀ μ` with respect to `ξ`.
fn wrench_coupling(mu: &Wrench) -> Matrix6<f64> {
    let torque = mu.fixed_rows::<3>(0).cross_matrix();
    let force = mu.fixed_rows::<3>(3).cross_matrix();

    let mut q = Matrix6::zeros();
    q.fixed_view_mut::<3, 3>(0, 0).copy_from(&torque);
    q.fixed_view_mut::<3, 3>(0, 3).copy_from(&force);
    q.fixed_view_mut::<3, 3>(3, 0).copy_from(&force);
    q
}
