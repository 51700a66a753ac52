use crate::{IntegrationResult, Wrench};

/// Indicates how the inverse kinematics solver terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The squared pose error fell below the threshold.
    Valid,

    /// The iteration budget ran out before convergence.
    MaxIterReached,

    /// The node Jacobian could not be inverted.
    JacobianSingular,

    /// Re-integrating from the updated wrench did not give a stable
    /// equilibrium.
    IntegrationFailed,

    /// Stopped early due to an observer action.
    StoppedByObserver,
}

/// The result of an inverse kinematics solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solution {
    /// Final solver status.
    pub status: Status,

    /// Base wrench the state was last integrated from.
    pub wrench: Wrench,

    /// Squared pose error at the last evaluated iteration.
    pub square_error: f64,

    /// Number of Newton updates applied.
    pub iters: usize,

    /// Result of the last re-integration, if any update was applied.
    pub last_integration: Option<IntegrationResult>,
}
