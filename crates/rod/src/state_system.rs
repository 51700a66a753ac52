use nalgebra::{Matrix4, Vector6};
use tendril_core::Model;

use crate::{
    ArcSample, RodModel,
    se3::{self, Twist},
    trajectory::{CostateInterpolant, InterpError},
};

/// Right-hand side of the configuration equation `q' = q ξ̂(μ(s))`.
///
/// The costate is read from an already integrated trajectory, so this system
/// can only run after the costate pass.
pub struct StateSystem<'a> {
    costates: &'a CostateInterpolant<'a>,
    model: RodModel,
    inv_stiffness: Vector6<f64>,
}

impl<'a> StateSystem<'a> {
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
        }
    }

    /// Returns the body twist at arc length `s`.
    ///
    /// # Errors
    ///
    /// Returns an error if the costate cannot be interpolated at `s`.
    pub fn twist_at(&self, s: f64) -> Result<Twist, InterpError> {
        let mu = self.costates.at(s)?;
        Ok(self.model.twist(&mu, &self.inv_stiffness))
    }
}

impl Model for StateSystem<'_> {
    type Input = ArcSample<Matrix4<f64>>;
    type Output = Matrix4<f64>;
    type Error = InterpError;

    fn call(&self, input: &Self::Input) -> Result<Matrix4<f64>, Self::Error> {
        let xi = self.twist_at(input.s)?;
        Ok(input.value * se3::hat(&xi))
    }
}
