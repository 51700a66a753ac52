use ndarray::Array1;
use ninterp::{
    error::{InterpolateError, ValidateError},
    interpolator::Extrapolate,
    prelude::{Interp1DOwned, Interpolator},
    strategy::Linear,
};
use thiserror::Error;

use crate::Wrench;

/// Fraction of a step within which a query snaps to the nearest grid node.
const GRID_TOLERANCE: f64 = 1e-9;

#[derive(Error, Debug)]
pub enum InterpError {
    #[error(transparent)]
    Validation(#[from] ValidateError),
    #[error(transparent)]
    Interpolation(#[from] InterpolateError),
}

/// Costate samples on the uniform arc-length grid `s_i = i * step`.
///
/// Index 0 holds the base wrench.
#[derive(Debug, Clone, PartialEq)]
pub struct CostateTrajectory {
    step: f64,
    samples: Vec<Wrench>,
}

impl CostateTrajectory {
    /// Wraps samples taken every `step` along the rod.
    #[must_use]
    pub fn new(step: f64, samples: Vec<Wrench>) -> Self {
        Self { step, samples }
    }

    #[must_use]
    pub fn step(&self) -> f64 {
        self.step
    }

    #[must_use]
    pub fn samples(&self) -> &[Wrench] {
        &self.samples
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.samples.capacity()
    }

    /// Builds a linear interpolant over the samples.
    ///
    /// Queries outside the grid are clamped to the end samples.
    ///
    /// # Errors
    ///
    /// Returns an error if the sample grid is rejected by the interpolator.
    pub fn interpolant(&self) -> Result<CostateInterpolant<'_>, InterpError> {
        let grid: Array1<f64> = (0..self.samples.len())
            .map(|i| i as f64 * self.step)
            .collect();

        let components = (0..6)
            .map(|k| {
                let values: Array1<f64> = self.samples.iter().map(|mu| mu[k]).collect();
                Interp1DOwned::new(grid.clone(), values, Linear, Extrapolate::Clamp)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CostateInterpolant {
            trajectory: self,
            components,
        })
    }
}

/// Evaluates a [`CostateTrajectory`] at arbitrary arc length.
pub struct CostateInterpolant<'a> {
    trajectory: &'a CostateTrajectory,
    components: Vec<Interp1DOwned<f64, Linear>>,
}

impl CostateInterpolant<'_> {
    /// Returns the costate at arc length `s`.
    ///
    /// Grid points are looked up exactly; other positions are linearly
    /// interpolated between the two bracketing samples.
    ///
    /// # Errors
    ///
    /// Returns an error if interpolation fails.
    pub fn at(&self, s: f64) -> Result<Wrench, InterpError> {
        let samples = self.trajectory.samples();
        let position = s / self.trajectory.step();
        let nearest = position.round();

        if (position - nearest).abs() < GRID_TOLERANCE
            && nearest >= 0.0
            && (nearest as usize) < samples.len()
        {
            return Ok(samples[nearest as usize]);
        }

        let mut mu = Wrench::zeros();
        for (value, component) in mu.iter_mut().zip(&self.components) {
            *value = component.interpolate(&[s])?;
        }
        Ok(mu)
    }
}
