use nalgebra::Vector6;

/// Internal wrench `(τx, τy, τz, fx, fy, fz)`, torque first.
pub type Wrench = Vector6<f64>;

/// Magnitude below which a transverse wrench component counts as zero.
pub const SINGULAR_THRESHOLD: f64 = 1e-12;

/// Returns `true` if a base wrench puts the rod in a singular configuration.
///
/// A wrench with no transverse torque and no transverse force keeps the rod
/// straight along its axis. Every such equilibrium has a rank-deficient
/// Jacobian, so it can neither be classified nor used for inverse kinematics.
/// This includes the all-zero wrench of an unloaded straight rod, which is
/// reported as [`IntegrationResult::Singular`] rather than `Valid`.
///
/// [`IntegrationResult::Singular`]: crate::IntegrationResult::Singular
#[must_use]
pub fn is_configuration_singular(wrench: &Wrench) -> bool {
    [1, 2, 4, 5]
        .iter()
        .all(|&i| wrench[i].abs() < SINGULAR_THRESHOLD)
}
