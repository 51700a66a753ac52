use std::{convert::Infallible, marker::PhantomData};

use tendril_core::{OdeProblem, StepIntegrable};

/// A value sampled at normalized arc length `s`.
///
/// This is the model input for every rod system: the right-hand sides depend
/// on the current sample and on where along the rod it sits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcSample<T> {
    pub s: f64,
    pub value: T,
}

impl<T> ArcSample<T> {
    pub fn new(s: f64, value: T) -> Self {
        Self { s, value }
    }
}

/// ODE problem for rod systems whose model output is the derivative itself.
///
/// The state is the sampled value and stepping advances `s` by the step.
#[derive(Debug)]
pub struct ArcLengthProblem<T>(PhantomData<T>);

impl<T> ArcLengthProblem<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for ArcLengthProblem<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OdeProblem for ArcLengthProblem<T>
where
    T: StepIntegrable<f64, Derivative = T> + Clone,
{
    type Input = ArcSample<T>;
    type Output = T;
    type Delta = f64;
    type State = T;
    type Error = Infallible;

    fn state(&self, input: &Self::Input) -> Result<T, Self::Error> {
        Ok(input.value.clone())
    }

    fn derivative(&self, _input: &Self::Input, output: &T) -> Result<T, Self::Error> {
        Ok(output.clone())
    }

    fn build_input(
        &self,
        base: &Self::Input,
        state: &T,
        delta: &f64,
    ) -> Result<Self::Input, Self::Error> {
        Ok(ArcSample::new(base.s + delta, state.clone()))
    }
}
