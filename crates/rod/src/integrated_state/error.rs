use thiserror::Error;
use tendril_solvers::transient::rk4;

use crate::trajectory::InterpError;

/// Errors that can occur when building or integrating an [`IntegratedState`].
///
/// [`IntegratedState`]: crate::IntegratedState
#[derive(Debug, Error)]
pub enum StateError {
    #[error("a rod needs at least 2 nodes, got {0}")]
    TooFewNodes(usize),

    #[error("costate integration failed")]
    Costate(#[source] rk4::Error),

    #[error("configuration integration failed")]
    Configuration(#[source] rk4::Error),

    #[error("jacobian integration failed")]
    Jacobian(#[source] rk4::Error),

    #[error("costate trajectory cannot be interpolated")]
    Interpolation(#[from] InterpError),
}
