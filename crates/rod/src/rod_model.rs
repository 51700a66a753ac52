use nalgebra::{Matrix6, Vector3, Vector6};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Wrench, se3::Twist};

/// Constitutive model relating the internal wrench to the rod's body twist.
///
/// Both variants share the unit axial velocity along the body `x` axis. They
/// differ in which strains the internal force is allowed to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RodModel {
    /// Kirchhoff rod: bending and torsion only, `v = e_x`.
    #[default]
    Inextensible,

    /// Cosserat rod: additionally admits axial extension and shear,
    /// `v = e_x + c⁻¹_f ∘ f`.
    ExtensibleShearable,
}

impl RodModel {
    /// Returns the body twist `ξ(μ)` produced by the internal wrench `mu`.
    #[must_use]
    pub fn twist(self, mu: &Wrench, inv_stiffness: &Vector6<f64>) -> Twist {
        let strain = mu.component_mul(inv_stiffness);
        match self {
            Self::Inextensible => Twist::new(strain[0], strain[1], strain[2], 1.0, 0.0, 0.0),
            Self::ExtensibleShearable => {
                Twist::new(strain[0], strain[1], strain[2], 1.0 + strain[3], strain[4], strain[5])
            }
        }
    }

    /// Returns the constant gradient `∂ξ/∂μ`.
    #[must_use]
    pub fn twist_gradient(self, inv_stiffness: &Vector6<f64>) -> Matrix6<f64> {
        match self {
            Self::Inextensible => {
                let mut diagonal = *inv_stiffness;
                diagonal.fixed_rows_mut::<3>(3).copy_from(&Vector3::zeros());
                Matrix6::from_diagonal(&diagonal)
            }
            Self::ExtensibleShearable => Matrix6::from_diagonal(inv_stiffness),
        }
    }
}
