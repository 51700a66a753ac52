//! Newton inverse kinematics on the base wrench.
//!
//! Finds the base wrench whose equilibrium places a chosen node at a target
//! pose. Each iteration measures the body-frame pose error
//! `e = log(target⁻¹ q_node)`, solves `J δ = e` with the node Jacobian and
//! re-integrates the rod from `w − scale · δ`.
//!
//! # Example
//!
//! ```ignore
//! use tendril_rod::ik::{InverseKinematics, Status};
//!
//! let ik = InverseKinematics::new(parameters);
//! let solution = ik.compute(&mut state, state.num_nodes() - 1, &target)?;
//!
//! if solution.status == Status::Valid {
//!     println!("base wrench: {}", solution.wrench);
//! }
//! ```

mod action;
mod config;
mod event;
mod solution;

pub use action::Action;
pub use config::{Config, ConfigError};
pub use event::Event;
pub use solution::{Solution, Status};

use nalgebra::Matrix4;
use tendril_core::Observer;
use tracing::debug;

use crate::{IntegratedState, IntegrationResult, Parameters, StateError, se3};

/// Inverse kinematics solver bound to a rod.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InverseKinematics {
    parameters: Parameters,
    config: Config,
}

impl InverseKinematics {
    /// Creates a solver with the default [`Config`].
    #[must_use]
    pub fn new(parameters: Parameters) -> Self {
        Self::with_config(parameters, Config::default())
    }

    #[must_use]
    pub fn with_config(parameters: Parameters, config: Config) -> Self {
        Self { parameters, config }
    }

    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    #[must_use]
    pub fn config(&self) -> Config {
        self.config
    }

    /// Sets the squared pose error below which the solver has converged.
    ///
    /// # Errors
    ///
    /// Returns an error if the threshold is negative or non-finite.
    pub fn set_square_error_threshold(&mut self, threshold: f64) -> Result<(), ConfigError> {
        self.config = Config::new(
            threshold,
            self.config.max_iters(),
            self.config.log_interval(),
            self.config.scale(),
        )?;
        Ok(())
    }

    pub fn set_max_iters(&mut self, max_iters: usize) {
        self.config = self.config.with_max_iters(max_iters);
    }

    /// Sets how many iterations separate two progress log events.
    ///
    /// # Errors
    ///
    /// Returns an error if `log_interval` is zero.
    pub fn set_log_interval(&mut self, log_interval: usize) -> Result<(), ConfigError> {
        self.config = Config::new(
            self.config.square_error_threshold(),
            self.config.max_iters(),
            log_interval,
            self.config.scale(),
        )?;
        Ok(())
    }

    /// Sets the factor applied to every Newton update.
    ///
    /// # Errors
    ///
    /// Returns an error if `scale` is zero or non-finite.
    pub fn set_scale(&mut self, scale: f64) -> Result<(), ConfigError> {
        self.config = Config::new(
            self.config.square_error_threshold(),
            self.config.max_iters(),
            self.config.log_interval(),
            scale,
        )?;
        Ok(())
    }

    /// Drives `node` of `state` towards `target` by updating its base wrench.
    ///
    /// This is a convenience wrapper around [`compute_observed`] that
    /// discards events.
    ///
    /// # Errors
    ///
    /// Returns an error if re-integrating the rod fails.
    ///
    /// [`compute_observed`]: Self::compute_observed
    pub fn compute(
        &self,
        state: &mut IntegratedState,
        node: usize,
        target: &Matrix4<f64>,
    ) -> Result<Solution, StateError> {
        self.compute_observed(state, node, target, ())
    }

    /// Drives `node` of `state` towards `target`, reporting every iteration.
    ///
    /// The state must be integrated with `keep_j_matrices` for the rod this
    /// solver is bound to. On return it holds the integration of the final
    /// wrench.
    ///
    /// # Errors
    ///
    /// Returns an error if re-integrating the rod fails.
    ///
    /// # Panics
    ///
    /// Panics if the state was integrated for different rod parameters, has
    /// not been integrated, does not keep its Jacobians, or has no `node`.
    pub fn compute_observed<Obs>(
        &self,
        state: &mut IntegratedState,
        node: usize,
        target: &Matrix4<f64>,
        mut observer: Obs,
    ) -> Result<Solution, StateError>
    where
        Obs: for<'a> Observer<Event<'a>, Action>,
    {
        assert_eq!(
            state.parameters(),
            &self.parameters,
            "rod state was built for different parameters"
        );
        assert!(
            state.options().keep_j_matrices,
            "inverse kinematics requires keep_j_matrices"
        );

        let target_inv = se3::inverse(target);
        let mut wrench = state.base_wrench();
        let mut last_integration = None;
        let mut iter = 0;

        loop {
            let error = se3::log6(&(target_inv * state.node(node)));
            let square_error = error.norm_squared();

            if iter % self.config.log_interval() == 0 {
                debug!(
                    iter,
                    square_error,
                    wrench = ?wrench.as_slice(),
                    "inverse kinematics progress"
                );
            }

            let solution = |status| Solution {
                status,
                wrench,
                square_error,
                iters: iter,
                last_integration,
            };

            let event = Event {
                iter,
                wrench: &wrench,
                error: &error,
                square_error,
            };
            if let Some(Action::StopEarly) = observer.observe(&event) {
                return Ok(solution(Status::StoppedByObserver));
            }

            if square_error < self.config.square_error_threshold() {
                return Ok(solution(Status::Valid));
            }
            if iter >= self.config.max_iters() {
                return Ok(solution(Status::MaxIterReached));
            }

            let decomposition = state.j_matrix(node).full_piv_lu();
            let update = if decomposition.is_invertible() {
                decomposition.solve(&error)
            } else {
                None
            };
            let Some(update) = update else {
                debug!(iter, node, "node jacobian is singular");
                return Ok(solution(Status::JacobianSingular));
            };

            wrench -= update * self.config.scale();
            let result = state.integrate_from_base_wrench(wrench)?;
            last_integration = Some(result);
            iter += 1;

            if result != IntegrationResult::Valid {
                debug!(iter, ?result, "re-integration failed");
                return Ok(Solution {
                    status: Status::IntegrationFailed,
                    wrench,
                    square_error,
                    iters: iter,
                    last_integration,
                });
            }
        }
    }
}
