//! Equilibrium shape, sensitivities and stability of a rod for one base wrench.
//!
//! An [`IntegratedState`] runs three passes along the rod, each with the
//! fixed-step RK4 solver over `num_nodes - 1` steps:
//!
//! 1. the costate `μ(s)` from the base wrench,
//! 2. the node configurations `q(s)`, reading `μ` from pass 1,
//! 3. the sensitivities `(M(s), J(s))`, reading `μ` from pass 1 and tracking
//!    the stability of the equilibrium through `det J`.
//!
//! Optionally the singular values of the force rows of `J` are computed
//! afterwards. Per-node buffers other than the configurations are only kept
//! if the [`IntegrationOptions`] ask for them.

mod error;
mod options;
mod result;
mod stability;

pub use error::StateError;
pub use options::IntegrationOptions;
pub use result::IntegrationResult;

use std::{mem::size_of, time::Instant};

use nalgebra::{Isometry3, Matrix4, Matrix6, Vector3};
use tendril_solvers::transient::rk4;
use tracing::{debug, trace};
use uom::si::length::meter;

use crate::{
    ArcLengthProblem, ArcSample, CostateSystem, Parameters, StateSystem, Wrench,
    jacobian_system::{self, JacobianPair, JacobianSystem},
    rod::is_configuration_singular,
    trajectory::{CostateInterpolant, CostateTrajectory},
};

use stability::StabilityMonitor;

/// A rod integrated from a base wrench.
///
/// The structural parameters (node count, base placement, rod parameters)
/// are fixed at construction. Every integration call resets and recomputes
/// the per-node buffers.
///
/// Accessors panic if the state has not been integrated yet, if a node index
/// is out of range, or if the requested buffer was not retained.
#[derive(Debug, Clone)]
pub struct IntegratedState {
    num_nodes: usize,
    base_placement: Isometry3<f64>,
    parameters: Parameters,
    options: IntegrationOptions,
    base_wrench: Wrench,
    initialized: bool,
    stable: bool,
    nodes: Vec<Matrix4<f64>>,
    costates: Option<CostateTrajectory>,
    m_matrices: Option<Vec<Matrix6<f64>>>,
    j_matrices: Option<Vec<Matrix6<f64>>>,
    determinants: Option<Vec<f64>>,
    singular_values: Option<Vec<Vector3<f64>>>,
}

/// Output of the Jacobian pass, before retention.
struct Sensitivities {
    m_matrices: Vec<Matrix6<f64>>,
    j_matrices: Vec<Matrix6<f64>>,
    determinants: Vec<f64>,
    stable: bool,
}

impl IntegratedState {
    /// Creates a state for a rod discretized into `num_nodes` nodes.
    ///
    /// Nothing is integrated yet; call [`integrate`](Self::integrate) or
    /// [`integrate_from_base_wrench`](Self::integrate_from_base_wrench).
    ///
    /// # Errors
    ///
    /// Returns [`StateError::TooFewNodes`] if `num_nodes < 2`.
    pub fn new(
        base_wrench: Wrench,
        num_nodes: usize,
        base_placement: Isometry3<f64>,
        parameters: Parameters,
    ) -> Result<Self, StateError> {
        if num_nodes < 2 {
            return Err(StateError::TooFewNodes(num_nodes));
        }

        Ok(Self {
            num_nodes,
            base_placement,
            parameters,
            options: IntegrationOptions::default(),
            base_wrench,
            initialized: false,
            stable: false,
            nodes: Vec::new(),
            costates: None,
            m_matrices: None,
            j_matrices: None,
            determinants: None,
            singular_values: None,
        })
    }

    /// Integrates the rod from its current base wrench.
    ///
    /// # Errors
    ///
    /// Returns an error if one of the integration passes fails.
    pub fn integrate(&mut self) -> Result<IntegrationResult, StateError> {
        self.integrate_from_base_wrench(self.base_wrench)
    }

    /// Integrates the rod from `wrench`, which becomes the new base wrench.
    ///
    /// A singular wrench returns [`IntegrationResult::Singular`] with every
    /// buffer reset to its default. Otherwise the result reports whether the
    /// equilibrium is stable.
    ///
    /// # Errors
    ///
    /// Returns an error if one of the integration passes fails. The state then
    /// keeps its previous base wrench and buffers.
    pub fn integrate_from_base_wrench(
        &mut self,
        wrench: Wrench,
    ) -> Result<IntegrationResult, StateError> {
        if is_configuration_singular(&wrench) {
            debug!(wrench = ?wrench.as_slice(), "base wrench is singular");
            self.base_wrench = wrench;
            self.initialized = true;
            self.stable = false;
            self.reset_buffers();
            return Ok(IntegrationResult::Singular);
        }

        let options = self.options;
        let dt = self.step();
        let started = Instant::now();

        let costates = self.integrate_costates(wrench, dt)?;
        let costates_done = Instant::now();

        let interpolant = costates.interpolant()?;
        let nodes = self.integrate_nodes(&interpolant, dt)?;
        let nodes_done = Instant::now();

        let sensitivities = self.integrate_sensitivities(&interpolant, dt)?;
        let sensitivities_done = Instant::now();
        drop(interpolant);

        let singular_values = (options.compute_singular_values
            && (sensitivities.stable || !options.stop_if_unstable))
            .then(|| force_singular_values(&sensitivities.j_matrices));

        trace!(
            nodes = self.num_nodes,
            costate = ?(costates_done - started),
            state = ?(nodes_done - costates_done),
            jacobian = ?(sensitivities_done - nodes_done),
            singular_values = ?sensitivities_done.elapsed(),
            "integration stage timings"
        );

        self.base_wrench = wrench;
        self.initialized = true;
        self.stable = sensitivities.stable;
        self.nodes = nodes;
        self.costates = options.keep_costate_samples.then_some(costates);
        self.m_matrices = options
            .keep_m_matrices
            .then_some(sensitivities.m_matrices);
        self.j_matrices = options
            .keep_j_matrices
            .then_some(sensitivities.j_matrices);
        self.determinants = options
            .keep_determinants
            .then_some(sensitivities.determinants);
        self.singular_values = singular_values;

        if self.stable {
            Ok(IntegrationResult::Valid)
        } else {
            debug!(wrench = ?wrench.as_slice(), "equilibrium is unstable");
            Ok(IntegrationResult::Unstable)
        }
    }

    fn step(&self) -> f64 {
        self.parameters.integration_time() / (self.num_nodes - 1) as f64
    }

    fn integrate_costates(
        &self,
        wrench: Wrench,
        dt: f64,
    ) -> Result<CostateTrajectory, StateError> {
        let system =
            CostateSystem::new(self.parameters.model(), self.parameters.inverse_stiffness());

        let solution = rk4::solve_unobserved(
            &system,
            &ArcLengthProblem::new(),
            ArcSample::new(0.0, wrench),
            dt,
            self.num_nodes - 1,
        )
        .map_err(StateError::Costate)?;

        Ok(CostateTrajectory::new(dt, samples(solution.into_inputs())))
    }

    fn integrate_nodes(
        &self,
        costates: &CostateInterpolant<'_>,
        dt: f64,
    ) -> Result<Vec<Matrix4<f64>>, StateError> {
        let system = StateSystem::new(
            costates,
            self.parameters.model(),
            self.parameters.inverse_stiffness(),
        );

        let solution = rk4::solve_unobserved(
            &system,
            &ArcLengthProblem::new(),
            ArcSample::new(0.0, Matrix4::identity()),
            dt,
            self.num_nodes - 1,
        )
        .map_err(StateError::Configuration)?;

        Ok(samples(solution.into_inputs()))
    }

    fn integrate_sensitivities(
        &self,
        costates: &CostateInterpolant<'_>,
        dt: f64,
    ) -> Result<Sensitivities, StateError> {
        let system = JacobianSystem::new(
            costates,
            self.parameters.model(),
            self.parameters.inverse_stiffness(),
        );
        let stop_if_unstable = self.options.stop_if_unstable;
        let mut monitor = StabilityMonitor::new(self.num_nodes);

        let solution = rk4::solve(
            &system,
            &ArcLengthProblem::new(),
            ArcSample::new(0.0, jacobian_system::initial_pair()),
            dt,
            self.num_nodes - 1,
            |event: &rk4::Event<'_, ArcSample<JacobianPair>, JacobianPair>| {
                if event.step == 0 {
                    return None;
                }
                let (_, j) = jacobian_system::split(&event.snapshot.input.value);
                monitor.record(event.step, &j);

                (stop_if_unstable && !monitor.is_stable()).then_some(rk4::Action::StopEarly)
            },
        )
        .map_err(StateError::Jacobian)?;

        let mut m_matrices = vec![Matrix6::zeros(); self.num_nodes];
        let mut j_matrices = vec![Matrix6::zeros(); self.num_nodes];
        for (i, pair) in solution.into_inputs().enumerate() {
            let (m, j) = jacobian_system::split(&pair.value);
            m_matrices[i] = m;
            j_matrices[i] = j;
        }

        Ok(Sensitivities {
            m_matrices,
            j_matrices,
            stable: monitor.is_stable(),
            determinants: monitor.into_determinants(),
        })
    }

    fn reset_buffers(&mut self) {
        let n = self.num_nodes;
        let options = self.options;

        self.nodes = vec![Matrix4::identity(); n];
        self.costates = options
            .keep_costate_samples
            .then(|| CostateTrajectory::new(self.step(), vec![Wrench::zeros(); n]));
        self.m_matrices = options
            .keep_m_matrices
            .then(|| vec![Matrix6::zeros(); n]);
        self.j_matrices = options
            .keep_j_matrices
            .then(|| vec![Matrix6::zeros(); n]);
        self.determinants = options.keep_determinants.then(|| vec![0.0; n]);
        self.singular_values = None;
    }

    fn assert_initialized(&self) {
        assert!(self.initialized, "rod state has not been integrated");
    }

    fn assert_node(&self, node: usize) {
        self.assert_initialized();
        assert!(
            node < self.num_nodes,
            "node index {node} out of range for a rod with {} nodes",
            self.num_nodes
        );
    }

    /// Returns `true` if the last integration found a stable equilibrium.
    #[must_use]
    pub fn is_stable(&self) -> bool {
        self.assert_initialized();
        self.stable
    }

    #[must_use]
    pub fn base_wrench(&self) -> Wrench {
        self.assert_initialized();
        self.base_wrench
    }

    /// Returns the internal wrench at the last node.
    ///
    /// Requires `keep_costate_samples`.
    #[must_use]
    pub fn tip_wrench(&self) -> Wrench {
        self.wrench(self.num_nodes - 1)
    }

    /// Returns the internal wrench at `node`.
    ///
    /// Requires `keep_costate_samples`.
    #[must_use]
    pub fn wrench(&self, node: usize) -> Wrench {
        self.assert_node(node);
        self.costates().samples()[node]
    }

    /// Returns the costate trajectory. Requires `keep_costate_samples`.
    #[must_use]
    pub fn costates(&self) -> &CostateTrajectory {
        self.assert_initialized();
        self.costates
            .as_ref()
            .unwrap_or_else(|| panic!("costate samples were not kept"))
    }

    /// Returns `M = ∂μ/∂a` at `node`. Requires `keep_m_matrices`.
    #[must_use]
    pub fn m_matrix(&self, node: usize) -> &Matrix6<f64> {
        self.assert_node(node);
        let m_matrices = self
            .m_matrices
            .as_ref()
            .unwrap_or_else(|| panic!("M matrices were not kept"));
        &m_matrices[node]
    }

    /// Returns the body-frame configuration Jacobian at `node`.
    ///
    /// Requires `keep_j_matrices`.
    #[must_use]
    pub fn j_matrix(&self, node: usize) -> &Matrix6<f64> {
        self.assert_node(node);
        let j_matrices = self
            .j_matrices
            .as_ref()
            .unwrap_or_else(|| panic!("J matrices were not kept"));
        &j_matrices[node]
    }

    /// Returns `det J` at every node. Requires `keep_determinants`.
    #[must_use]
    pub fn determinants(&self) -> &[f64] {
        self.assert_initialized();
        self.determinants
            .as_deref()
            .unwrap_or_else(|| panic!("determinants were not kept"))
    }

    /// Returns the singular values of rows `3..6` of `J` at `node`.
    ///
    /// Requires `compute_singular_values`, and a stable equilibrium unless
    /// `stop_if_unstable` was disabled.
    #[must_use]
    pub fn singular_values(&self, node: usize) -> &Vector3<f64> {
        self.assert_node(node);
        let singular_values = self
            .singular_values
            .as_ref()
            .unwrap_or_else(|| panic!("singular values were not computed"));
        &singular_values[node]
    }

    /// Returns the node configurations relative to the rod base.
    #[must_use]
    pub fn nodes(&self) -> &[Matrix4<f64>] {
        self.assert_initialized();
        &self.nodes
    }

    #[must_use]
    pub fn node(&self, node: usize) -> &Matrix4<f64> {
        self.assert_node(node);
        &self.nodes[node]
    }

    /// Returns the world pose of `node`.
    ///
    /// The local translation is scaled by the rod length in meters and the
    /// result is composed with the base placement.
    #[must_use]
    pub fn world_node(&self, node: usize) -> Matrix4<f64> {
        let mut local = *self.node(node);
        let length = self.parameters.length().get::<meter>();
        local
            .fixed_view_mut::<3, 1>(0, 3)
            .scale_mut(length);

        self.base_placement.to_homogeneous() * local
    }

    /// Returns an estimate of the heap and inline memory held by this state.
    #[must_use]
    pub fn mem_usage(&self) -> usize {
        size_of::<Self>()
            + self.nodes.capacity() * size_of::<Matrix4<f64>>()
            + self
                .costates
                .as_ref()
                .map_or(0, |c| c.capacity() * size_of::<Wrench>())
            + self
                .m_matrices
                .as_ref()
                .map_or(0, |m| m.capacity() * size_of::<Matrix6<f64>>())
            + self
                .j_matrices
                .as_ref()
                .map_or(0, |j| j.capacity() * size_of::<Matrix6<f64>>())
            + self
                .determinants
                .as_ref()
                .map_or(0, |d| d.capacity() * size_of::<f64>())
            + self
                .singular_values
                .as_ref()
                .map_or(0, |s| s.capacity() * size_of::<Vector3<f64>>())
    }

    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    #[must_use]
    pub fn base_placement(&self) -> &Isometry3<f64> {
        &self.base_placement
    }

    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    #[must_use]
    pub fn options(&self) -> IntegrationOptions {
        self.options
    }

    /// Replaces the options used by subsequent integrations.
    pub fn set_options(&mut self, options: IntegrationOptions) {
        self.options = options;
    }
}

fn samples<T>(inputs: impl Iterator<Item = ArcSample<T>>) -> Vec<T> {
    inputs.map(|sample| sample.value).collect()
}

/// Singular values of the force-sensitivity rows of `J`; node 0 stays zero.
///
/// Rows holding a non-finite entry get `NaN` singular values, since the SVD
/// iteration does not terminate on them.
fn force_singular_values(j_matrices: &[Matrix6<f64>]) -> Vec<Vector3<f64>> {
    let mut values = vec![Vector3::zeros(); j_matrices.len()];
    for (value, j) in values.iter_mut().zip(j_matrices).skip(1) {
        let forces = j.fixed_view::<3, 6>(3, 0).into_owned();
        *value = if forces.iter().all(|x| x.is_finite()) {
            forces.singular_values()
        } else {
            Vector3::repeat(f64::NAN)
        };
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use nalgebra::{Matrix3, Point3, RowVector4, Translation3, UnitQuaternion, Vector6};
    use uom::si::f64::Length;

    use crate::{RodModel, se3};

    // --- Test fixtures ---

    fn bent_wrench() -> Wrench {
        Wrench::new(0.0, 0.3, -0.2, 0.0, 0.5, 0.4)
    }

    fn state(wrench: Wrench, num_nodes: usize) -> IntegratedState {
        IntegratedState::new(
            wrench,
            num_nodes,
            Isometry3::identity(),
            Parameters::default(),
        )
        .unwrap()
    }

    // --- Tests ---

    #[test]
    fn rejects_fewer_than_two_nodes() {
        let result =
            IntegratedState::new(bent_wrench(), 1, Isometry3::identity(), Parameters::default());

        assert!(matches!(result, Err(StateError::TooFewNodes(1))));
    }

    #[test]
    #[should_panic(expected = "has not been integrated")]
    fn accessors_require_integration() {
        let state = state(bent_wrench(), 11);

        let _ = state.base_wrench();
    }

    #[test]
    fn base_node_holds_initial_values() {
        let mut state = state(bent_wrench(), 21);
        state.set_options(IntegrationOptions::keep_all());

        let result = state.integrate().unwrap();

        assert_eq!(result, IntegrationResult::Valid);
        assert_eq!(state.nodes().len(), 21);
        assert_eq!(*state.node(0), Matrix4::identity());
        assert_eq!(*state.m_matrix(0), Matrix6::identity());
        assert_eq!(*state.j_matrix(0), Matrix6::zeros());
        assert_eq!(state.wrench(0), bent_wrench());
        assert_eq!(state.determinants()[0], 0.0);
        assert_eq!(*state.singular_values(0), Vector3::zeros());
    }

    #[test]
    fn costate_invariants_are_conserved() {
        let mut state = state(bent_wrench(), 51);
        state.set_options(IntegrationOptions::keep_all());
        state.integrate().unwrap();

        let base = state.base_wrench();
        let tip = state.tip_wrench();
        let force_norm = |w: &Wrench| w.fixed_rows::<3>(3).norm_squared();
        let twist = |w: &Wrench| w.fixed_rows::<3>(0).dot(&w.fixed_rows::<3>(3));

        assert_relative_eq!(force_norm(&tip), force_norm(&base), epsilon = 1e-9);
        assert_relative_eq!(twist(&tip), twist(&base), epsilon = 1e-9);
    }

    #[test]
    fn nodes_stay_rigid_displacements() {
        let mut state = state(bent_wrench(), 31);
        state.integrate().unwrap();

        for q in state.nodes() {
            let r = q.fixed_view::<3, 3>(0, 0);
            assert_relative_eq!(r.transpose() * r, Matrix3::identity(), epsilon = 1e-8);
            assert_eq!(q.fixed_view::<1, 4>(3, 0), RowVector4::new(0.0, 0.0, 0.0, 1.0));
        }
    }

    #[test]
    fn jacobian_matches_finite_differences() {
        let num_nodes = 101;
        let mut state = state(bent_wrench(), num_nodes);
        state.set_options(IntegrationOptions::keep_all());
        state.integrate().unwrap();

        let tip = num_nodes - 1;
        let q_tip = *state.node(tip);
        let j = *state.j_matrix(tip);
        let m = *state.m_matrix(tip);
        let eps = 1e-6;

        for k in 0..6 {
            let mut perturbed = state.clone();
            let mut delta = Wrench::zeros();
            delta[k] = eps;

            perturbed.integrate_from_base_wrench(bent_wrench() + delta).unwrap();
            let plus_pose = se3::log6(&(se3::inverse(&q_tip) * perturbed.node(tip)));
            let plus_mu = perturbed.tip_wrench();

            perturbed.integrate_from_base_wrench(bent_wrench() - delta).unwrap();
            let minus_pose = se3::log6(&(se3::inverse(&q_tip) * perturbed.node(tip)));
            let minus_mu = perturbed.tip_wrench();

            let j_column = j.column(k).into_owned();
            let m_column = m.column(k).into_owned();
            assert_relative_eq!(
                (plus_pose - minus_pose) / (2.0 * eps),
                j_column,
                epsilon = 1e-3 * j_column.amax()
            );
            assert_relative_eq!(
                (plus_mu - minus_mu) / (2.0 * eps),
                m_column,
                epsilon = 1e-3 * m_column.amax()
            );
            assert_relative_eq!(perturbed.base_wrench(), bent_wrench() - delta);
        }
    }

    #[test]
    fn singular_wrench_resets_buffers() {
        let mut state = state(bent_wrench(), 11);
        state.set_options(IntegrationOptions::keep_all());
        state.integrate().unwrap();

        let axial = Wrench::new(0.5, 0.0, 0.0, -1.0, 0.0, 0.0);
        let result = state.integrate_from_base_wrench(axial).unwrap();

        assert_eq!(result, IntegrationResult::Singular);
        assert!(!state.is_stable());
        assert_eq!(state.base_wrench(), axial);
        assert!(state.nodes().iter().all(|q| *q == Matrix4::identity()));
        assert!(state.determinants().iter().all(|&d| d == 0.0));
        assert_eq!(*state.j_matrix(10), Matrix6::zeros());
        assert_eq!(state.tip_wrench(), Wrench::zeros());
    }

    #[test]
    fn failed_integration_keeps_previous_state() {
        let mut state = state(bent_wrench(), 11);
        state.integrate().unwrap();
        let nodes = state.nodes().to_vec();

        // A single node makes the arc-length step infinite.
        state.num_nodes = 1;
        let result = state.integrate_from_base_wrench(Wrench::new(0.0, 0.1, 0.0, 0.0, 0.2, 0.0));
        state.num_nodes = 11;

        assert!(matches!(result, Err(StateError::Costate(_))));
        assert_eq!(state.base_wrench(), bent_wrench());
        assert_eq!(state.nodes(), nodes.as_slice());
        assert!(state.is_stable());
    }

    #[test]
    fn non_finite_jacobian_has_nan_singular_values() {
        let mut diverged = Matrix6::identity();
        diverged[(4, 2)] = f64::NAN;
        let j_matrices = [Matrix6::zeros(), Matrix6::identity(), diverged];

        let values = force_singular_values(&j_matrices);

        assert_eq!(values[0], Vector3::zeros());
        assert_relative_eq!(values[1], Vector3::repeat(1.0), epsilon = 1e-12);
        assert!(values[2].iter().all(|v| v.is_nan()));
    }

    #[test]
    fn default_options_keep_only_jacobians() {
        let mut state = state(bent_wrench(), 11);
        state.integrate().unwrap();

        assert_eq!(state.j_matrix(10).nrows(), 6);
        assert!(state.costates.is_none());
        assert!(state.m_matrices.is_none());
        assert!(state.determinants.is_none());
        assert!(state.singular_values.is_none());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn node_index_is_checked() {
        let mut state = state(bent_wrench(), 11);
        state.integrate().unwrap();

        let _ = state.node(11);
    }

    #[test]
    fn world_node_applies_length_and_placement() {
        let length = 2.5;
        let parameters = Parameters::new(
            RodModel::Inextensible,
            Vector6::repeat(1.0),
            Length::new::<meter>(length),
            1.0,
        )
        .unwrap();
        let placement = Isometry3::from_parts(
            Translation3::new(1.0, -2.0, 0.5),
            UnitQuaternion::from_euler_angles(0.1, -0.4, 0.7),
        );
        let mut state = IntegratedState::new(bent_wrench(), 11, placement, parameters).unwrap();
        state.integrate().unwrap();

        let local = *state.node(10);
        let world = state.world_node(10);

        let local_position = local.fixed_view::<3, 1>(0, 3).into_owned() * length;
        let expected_position = placement * Point3::from(local_position);
        assert_relative_eq!(
            world.fixed_view::<3, 1>(0, 3).into_owned(),
            expected_position.coords,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            world.fixed_view::<3, 3>(0, 0).into_owned(),
            placement.rotation.to_rotation_matrix().matrix() * local.fixed_view::<3, 3>(0, 0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn mem_usage_grows_with_retained_buffers() {
        let mut lean = state(bent_wrench(), 21);
        lean.set_options(IntegrationOptions {
            keep_j_matrices: false,
            ..IntegrationOptions::default()
        });
        lean.integrate().unwrap();

        let mut full = lean.clone();
        full.set_options(IntegrationOptions::keep_all());
        full.integrate().unwrap();

        let nodes_size = 21 * size_of::<Matrix4<f64>>();
        assert!(lean.mem_usage() >= size_of::<IntegratedState>() + nodes_size);
        assert!(full.mem_usage() > lean.mem_usage() + 21 * 2 * size_of::<Matrix6<f64>>());
    }
}
