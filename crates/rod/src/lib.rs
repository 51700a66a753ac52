//! Quasi-static equilibrium, stability and inverse kinematics of elastic rods.
//!
//! A rod clamped at its base is fully described by the internal wrench it
//! carries there. From that base wrench, an [`IntegratedState`] integrates:
//!
//! - the costate (internal wrench) along the rod with a [`CostateSystem`],
//! - the pose of every node with a [`StateSystem`],
//! - the sensitivity of costates and poses to the base wrench with a
//!   [`JacobianSystem`], which also decides whether the equilibrium is stable.
//!
//! The [`ik`] module inverts this map: it searches for the base wrench that
//! places a node at a target pose.
//!
//! Two constitutive models are supported, see [`RodModel`].
//!
//! # Example
//!
//! ```ignore
//! use nalgebra::Isometry3;
//! use tendril_rod::{IntegratedState, IntegrationResult, Parameters, Wrench};
//!
//! let wrench = Wrench::new(0.0, 0.3, -0.2, 0.0, 0.5, 0.4);
//! let mut state = IntegratedState::new(wrench, 50, Isometry3::identity(), Parameters::default())?;
//!
//! if state.integrate()? == IntegrationResult::Valid {
//!     let tip = state.world_node(49);
//! }
//! ```
//!
//! # Features
//!
//! - `serde`: derives `Serialize`/`Deserialize` for [`Parameters`],
//!   [`RodModel`] and [`IntegrationOptions`].

pub mod ik;
pub mod jacobian_system;
pub mod se3;
pub mod trajectory;

mod arc_length;
mod costate_system;
mod integrated_state;
mod parameters;
mod rod;
mod rod_model;
mod state_system;

pub use arc_length::{ArcLengthProblem, ArcSample};
pub use costate_system::CostateSystem;
pub use integrated_state::{IntegratedState, IntegrationOptions, IntegrationResult, StateError};
pub use jacobian_system::JacobianSystem;
pub use parameters::{Parameters, ParametersError};
pub use rod::{SINGULAR_THRESHOLD, Wrench, is_configuration_singular};
pub use rod_model::RodModel;
pub use state_system::StateSystem;
