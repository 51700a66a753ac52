use nalgebra::Vector6;
use thiserror::Error;
use uom::si::{f64::Length, length::meter};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::RodModel;

/// Static parameters of an elastic rod.
///
/// Stiffness coefficients are normalized: the first three are the bending and
/// torsion stiffnesses, the last three the axial and shear stiffnesses (only
/// read by [`RodModel::ExtensibleShearable`]). Integration runs over the
/// normalized arc length `[0, integration_time]`; the physical length only
/// scales node translations when placing the rod in the world.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Parameters {
    model: RodModel,
    stiffness: Vector6<f64>,
    length: Length,
    integration_time: f64,
}

/// Errors that can occur when validating rod parameters.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ParametersError {
    #[error("stiffness coefficient {index} must be finite and strictly positive, got {value}")]
    Stiffness { index: usize, value: f64 },

    #[error("rod length must be finite and strictly positive")]
    Length,

    #[error("integration time must be finite and strictly positive, got {0}")]
    IntegrationTime(f64),
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            model: RodModel::Inextensible,
            stiffness: Vector6::repeat(1.0),
            length: Length::new::<meter>(1.0),
            integration_time: 1.0,
        }
    }
}

impl Parameters {
    /// Creates validated rod parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if a stiffness coefficient, the length or the
    /// integration time is non-finite or not strictly positive.
    pub fn new(
        model: RodModel,
        stiffness: Vector6<f64>,
        length: Length,
        integration_time: f64,
    ) -> Result<Self, ParametersError> {
        if let Some((index, &value)) = stiffness
            .iter()
            .enumerate()
            .find(|&(_, c)| !c.is_finite() || *c <= 0.0)
        {
            return Err(ParametersError::Stiffness { index, value });
        }

        let meters = length.get::<meter>();
        if !meters.is_finite() || meters <= 0.0 {
            return Err(ParametersError::Length);
        }

        if !integration_time.is_finite() || integration_time <= 0.0 {
            return Err(ParametersError::IntegrationTime(integration_time));
        }

        Ok(Self {
            model,
            stiffness,
            length,
            integration_time,
        })
    }

    /// Returns the constitutive model.
    #[must_use]
    pub fn model(&self) -> RodModel {
        self.model
    }

    /// Returns the stiffness coefficients.
    #[must_use]
    pub fn stiffness(&self) -> &Vector6<f64> {
        &self.stiffness
    }

    /// Returns the element-wise inverse of the stiffness coefficients.
    #[must_use]
    pub fn inverse_stiffness(&self) -> Vector6<f64> {
        self.stiffness.map(f64::recip)
    }

    /// Returns the physical rod length.
    #[must_use]
    pub fn length(&self) -> Length {
        self.length
    }

    /// Returns the extent of the normalized arc-length domain.
    #[must_use]
    pub fn integration_time(&self) -> f64 {
        self.integration_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unit_kirchhoff_rod() {
        let params = Parameters::default();

        assert_eq!(params.model(), RodModel::Inextensible);
        assert_eq!(params.inverse_stiffness(), Vector6::repeat(1.0));
        assert_eq!(params.length().get::<meter>(), 1.0);
        assert_eq!(params.integration_time(), 1.0);
    }

    #[test]
    fn rejects_non_positive_stiffness() {
        let stiffness = Vector6::new(1.0, 1.0, 0.0, 1.0, 1.0, 1.0);

        let result = Parameters::new(
            RodModel::Inextensible,
            stiffness,
            Length::new::<meter>(1.0),
            1.0,
        );

        assert_eq!(
            result,
            Err(ParametersError::Stiffness {
                index: 2,
                value: 0.0
            })
        );
    }

    #[test]
    fn rejects_invalid_length_and_time() {
        let stiffness = Vector6::repeat(2.0);

        let zero_length = Parameters::new(
            RodModel::ExtensibleShearable,
            stiffness,
            Length::new::<meter>(0.0),
            1.0,
        );
        assert_eq!(zero_length, Err(ParametersError::Length));

        let nan_time = Parameters::new(
            RodModel::ExtensibleShearable,
            stiffness,
            Length::new::<meter>(0.5),
            f64::NAN,
        );
        assert!(matches!(nan_time, Err(ParametersError::IntegrationTime(_))));
    }

    #[test]
    fn inverse_stiffness_is_elementwise() {
        let stiffness = Vector6::new(1.0, 2.0, 4.0, 0.5, 0.25, 8.0);
        let params = Parameters::new(
            RodModel::ExtensibleShearable,
            stiffness,
            Length::new::<meter>(0.3),
            1.0,
        )
        .unwrap();

        assert_eq!(
            params.inverse_stiffness(),
            Vector6::new(1.0, 0.5, 0.25, 2.0, 4.0, 0.125)
        );
    }
}
