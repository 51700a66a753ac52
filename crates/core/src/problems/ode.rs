use crate::{DerivativeOf, StepIntegrable};

/// Defines an ODE problem over a model.
///
/// The model evaluates the right-hand side of the equation. The problem tells a
/// solver how to read the integrated state out of a model input, how to read
/// the derivative out of a model output, and how to rebuild a model input once
/// the state has been stepped. The independent variable is `Delta`: time for
/// transient problems, arc length for rods.
///
/// Solvers evaluating intermediate stages (such as Runge-Kutta) call
/// [`OdeProblem::build_input`] with trial states and fractional steps, so the
/// rebuilt input must depend only on `base`, `state` and `delta`.
pub trait OdeProblem {
    type Input;
    type Output;
    type Delta;
    type State: StepIntegrable<Self::Delta>;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Extracts the state from model input.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the state cannot be extracted from the input.
    fn state(&self, input: &Self::Input) -> Result<Self::State, Self::Error>;

    /// Computes the derivative of the state from model input and output.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the derivative cannot be computed.
    fn derivative(
        &self,
        input: &Self::Input,
        output: &Self::Output,
    ) -> Result<DerivativeOf<Self::State, Self::Delta>, Self::Error>;

    /// Builds model input from a state reached `delta` past `base`.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the input cannot be constructed from the state.
    fn build_input(
        &self,
        base: &Self::Input,
        state: &Self::State,
        delta: &Self::Delta,
    ) -> Result<Self::Input, Self::Error>;

    /// Finalizes input after a step is accepted by the solver.
    ///
    /// Intermediate stage evaluations never pass through this hook. The
    /// default implementation returns the input unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if finalization fails.
    fn finalize_step(
        &self,
        next_input: Self::Input,
        _prev_input: &Self::Input,
        _prev_output: &Self::Output,
        _step_delta: &Self::Delta,
    ) -> Result<Self::Input, Self::Error> {
        Ok(next_input)
    }
}
