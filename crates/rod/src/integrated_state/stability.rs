use nalgebra::Matrix6;
use tracing::debug;

use crate::jacobian_system::{STABILITY_THRESHOLD, STABILITY_TOLERANCE};

/// One-way stability latch over the determinants of `J` along the rod.
///
/// The check arms once `|det J|` has grown past [`STABILITY_THRESHOLD`].
/// From then on the rod is unstable as soon as the determinant changes sign
/// between consecutive nodes or falls below [`STABILITY_TOLERANCE`].
/// A non-finite determinant latches immediately, armed or not.
#[derive(Debug)]
pub(crate) struct StabilityMonitor {
    determinants: Vec<f64>,
    armed: bool,
    unstable_at: Option<usize>,
}

impl StabilityMonitor {
    pub(crate) fn new(num_nodes: usize) -> Self {
        Self {
            determinants: vec![0.0; num_nodes],
            armed: false,
            unstable_at: None,
        }
    }

    /// Records `det J` at `node` (at least 1) and updates the latch.
    pub(crate) fn record(&mut self, node: usize, j: &Matrix6<f64>) {
        let det = j.lu().determinant();
        self.determinants[node] = det;

        if det.abs() > STABILITY_THRESHOLD {
            self.armed = true;
        }

        if self.unstable_at.is_some() {
            return;
        }

        if !det.is_finite() {
            debug!(node, det, "determinant diverged");
            self.unstable_at = Some(node);
        } else if self.armed {
            let previous = self.determinants[node - 1];
            if det.abs() < STABILITY_TOLERANCE
                || det.is_sign_negative() != previous.is_sign_negative()
            {
                debug!(node, det, previous, "rod became unstable");
                self.unstable_at = Some(node);
            }
        }
    }

    pub(crate) fn is_stable(&self) -> bool {
        self.unstable_at.is_none()
    }

    pub(crate) fn into_determinants(self) -> Vec<f64> {
        self.determinants
    }
}
