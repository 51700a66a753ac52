#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Controls which optional work an integration performs and which per-node
/// buffers it keeps afterwards.
///
/// Node configurations are always kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct IntegrationOptions {
    /// Computes the singular values of the force rows of `J` at every node.
    pub compute_singular_values: bool,

    /// Stops the Jacobian pass at the first node found to be unstable.
    pub stop_if_unstable: bool,

    pub keep_costate_samples: bool,
    pub keep_determinants: bool,
    pub keep_m_matrices: bool,

    /// Required by inverse kinematics.
    pub keep_j_matrices: bool,
}

impl Default for IntegrationOptions {
    fn default() -> Self {
        Self {
            compute_singular_values: false,
            stop_if_unstable: true,
            keep_costate_samples: false,
            keep_determinants: false,
            keep_m_matrices: false,
            keep_j_matrices: true,
        }
    }
}

impl IntegrationOptions {
    /// Options that compute and keep every per-node buffer and never stop early.
    #[must_use]
    pub fn keep_all() -> Self {
        Self {
            compute_singular_values: true,
            stop_if_unstable: false,
            keep_costate_samples: true,
            keep_determinants: true,
            keep_m_matrices: true,
            keep_j_matrices: true,
        }
    }
}
