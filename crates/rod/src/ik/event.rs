use crate::{Wrench, se3::Twist};

/// Emitted once per iteration, before the convergence check.
#[derive(Debug, Clone, Copy)]
pub struct Event<'a> {
    /// Number of Newton updates applied so far.
    pub iter: usize,

    /// Current base wrench.
    pub wrench: &'a Wrench,

    /// Pose error `log(target⁻¹ q)` of the tracked node.
    pub error: &'a Twist,

    /// Squared norm of `error`.
    pub square_error: f64,
}
