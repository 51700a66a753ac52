//! Classic fixed-step 4th-order Runge-Kutta solver for ODE problems.
//!
//! Each step evaluates the model four times:
//!
//! ```text
//! k1 = f(x_n,          y_n)
//! k2 = f(x_n + h / 2,  y_n + k1 * h / 2)
//! k3 = f(x_n + h / 2,  y_n + k2 * h / 2)
//! k4 = f(x_n + h,      y_n + k3 * h)
//! y_{n+1} = y_n + (k1 + 2 k2 + 2 k3 + k4) * h / 6
//! ```
//!
//! Intermediate stages are built with [`OdeProblem::build_input`] and are
//! never reported to the observer. Only accepted nodes are recorded in the
//! solution history, so a problem sampled on `steps + 1` nodes produces
//! exactly `steps + 1` snapshots.
//!
//! # Example
//!
//! ```ignore
//! use tendril_solvers::transient::rk4;
//!
//! let solution = rk4::solve_unobserved(&model, &problem, initial_input, ds, steps)?;
//!
//! for snapshot in &solution.history {
//!     println!("{:?} -> {:?}", snapshot.input, snapshot.output);
//! }
//! ```

mod action;
mod error;
mod event;
mod solution;

pub use action::Action;
pub use error::Error;
pub use event::Event;
pub use solution::{Solution, Status};

use std::ops::{Add, Mul};

use tendril_core::{DerivativeOf, Model, Observer, OdeProblem, Snapshot, StepIntegrable};

/// Integrates an ODE problem using the classic RK4 method with a fixed step.
///
/// # Algorithm
///
/// 1. Call the model with the initial input to get the initial snapshot.
/// 2. For each step:
///    - Extract the state and the derivative `k1` at the current node.
///    - Evaluate `k2`, `k3` at the half step and `k4` at the full step.
///    - Step the state with the weighted slope and build the next input.
///    - Finalize the step and call the model at the new node.
///    - Emit an [`Event`] to the observer.
///    - If the observer returns `StopEarly`, terminate.
/// 3. Return the solution with the full history.
///
/// # Errors
///
/// Returns an error if `dt` is zero or non-finite, or if the model or problem
/// returns an error at any point.
pub fn solve<M, P, Obs>(
    model: &M,
    problem: &P,
    initial: M::Input,
    dt: f64,
    steps: usize,
    mut observer: Obs,
) -> Result<Solution<M::Input, M::Output>, Error>
where
    M: Model,
    P: OdeProblem<Input = M::Input, Output = M::Output, Delta = f64>,
    DerivativeOf<P::State, f64>: Clone
        + Add<Output = DerivativeOf<P::State, f64>>
        + Mul<f64, Output = DerivativeOf<P::State, f64>>,
    Obs: for<'a> Observer<Event<'a, M::Input, M::Output>, Action>,
{
    if !dt.is_finite() || dt == 0.0 {
        return Err(Error::InvalidStep { dt });
    }

    let initial_output = model.call(&initial).map_err(Error::model)?;

    let mut history = Vec::with_capacity(steps + 1);
    history.push(Snapshot::new(initial, initial_output));

    if stop_requested(&mut observer, 0, &history[0]) {
        return Ok(Solution {
            status: Status::StoppedByObserver,
            history,
            steps: 0,
        });
    }

    for step in 1..=steps {
        let next_input = advance(model, problem, &history[step - 1], dt)?;
        let next_output = model.call(&next_input).map_err(Error::model)?;
        history.push(Snapshot::new(next_input, next_output));

        if stop_requested(&mut observer, step, &history[step]) {
            return Ok(Solution {
                status: Status::StoppedByObserver,
                history,
                steps: step,
            });
        }
    }

    Ok(Solution {
        status: Status::Complete,
        history,
        steps,
    })
}

/// Integrates an ODE problem using RK4 without observation.
///
/// This is a convenience wrapper around [`solve`] that discards events.
///
/// # Errors
///
/// Returns an error if `dt` is zero or non-finite, or if the model or problem
/// returns an error at any point.
pub fn solve_unobserved<M, P>(
    model: &M,
    problem: &P,
    initial: M::Input,
    dt: f64,
    steps: usize,
) -> Result<Solution<M::Input, M::Output>, Error>
where
    M: Model,
    P: OdeProblem<Input = M::Input, Output = M::Output, Delta = f64>,
    DerivativeOf<P::State, f64>: Clone
        + Add<Output = DerivativeOf<P::State, f64>>
        + Mul<f64, Output = DerivativeOf<P::State, f64>>,
{
    solve(model, problem, initial, dt, steps, ())
}

/// Computes the input at the node one step past `current`.
fn advance<M, P>(
    model: &M,
    problem: &P,
    current: &Snapshot<M::Input, M::Output>,
    dt: f64,
) -> Result<M::Input, Error>
where
    M: Model,
    P: OdeProblem<Input = M::Input, Output = M::Output, Delta = f64>,
    DerivativeOf<P::State, f64>: Clone
        + Add<Output = DerivativeOf<P::State, f64>>
        + Mul<f64, Output = DerivativeOf<P::State, f64>>,
{
    let base = &current.input;
    let state = problem.state(base).map_err(Error::problem)?;
    let half = 0.5 * dt;

    let k1 = problem
        .derivative(base, &current.output)
        .map_err(Error::problem)?;
    let k2 = stage(model, problem, base, &state, k1.clone(), half)?;
    let k3 = stage(model, problem, base, &state, k2.clone(), half)?;
    let k4 = stage(model, problem, base, &state, k3.clone(), dt)?;

    let slope = (k1 + (k2 + k3) * 2.0 + k4) * (1.0 / 6.0);
    let next_state = state.step(slope, dt);

    let next_input = problem
        .build_input(base, &next_state, &dt)
        .map_err(Error::problem)?;
    problem
        .finalize_step(next_input, base, &current.output, &dt)
        .map_err(Error::problem)
}

/// Evaluates the derivative at the trial state `state + slope * h`.
fn stage<M, P>(
    model: &M,
    problem: &P,
    base: &M::Input,
    state: &P::State,
    slope: DerivativeOf<P::State, f64>,
    h: f64,
) -> Result<DerivativeOf<P::State, f64>, Error>
where
    M: Model,
    P: OdeProblem<Input = M::Input, Output = M::Output, Delta = f64>,
{
    let trial = state.step(slope, h);
    let input = problem
        .build_input(base, &trial, &h)
        .map_err(Error::problem)?;
    let output = model.call(&input).map_err(Error::model)?;
    problem.derivative(&input, &output).map_err(Error::problem)
}

fn stop_requested<I, O, Obs>(observer: &mut Obs, step: usize, snapshot: &Snapshot<I, O>) -> bool
where
    Obs: for<'a> Observer<Event<'a, I, O>, Action>,
{
    matches!(
        observer.observe(&Event { step, snapshot }),
        Some(Action::StopEarly)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::convert::Infallible;

    use approx::assert_relative_eq;
    use nalgebra::Vector2;

    // --- Test fixtures ---

    /// Model input: independent variable and scalar state.
    #[derive(Debug, Clone, Copy)]
    struct Input {
        s: f64,
        y: f64,
    }

    /// Right-hand side `y' = -y`.
    struct Decay;

    impl Model for Decay {
        type Input = Input;
        type Output = f64;
        type Error = Infallible;

        fn call(&self, input: &Input) -> Result<f64, Self::Error> {
            Ok(-input.y)
        }
    }

    /// Right-hand side `y' = 3 s^2`, integrated exactly by RK4.
    struct Cubic;

    impl Model for Cubic {
        type Input = Input;
        type Output = f64;
        type Error = Infallible;

        fn call(&self, input: &Input) -> Result<f64, Self::Error> {
            Ok(3.0 * input.s * input.s)
        }
    }

    struct ScalarProblem;

    impl OdeProblem for ScalarProblem {
        type Input = Input;
        type Output = f64;
        type Delta = f64;
        type State = f64;
        type Error = Infallible;

        fn state(&self, input: &Input) -> Result<f64, Self::Error> {
            Ok(input.y)
        }

        fn derivative(&self, _input: &Input, output: &f64) -> Result<f64, Self::Error> {
            Ok(*output)
        }

        fn build_input(&self, base: &Input, state: &f64, delta: &f64) -> Result<Input, Self::Error> {
            Ok(Input {
                s: base.s + delta,
                y: *state,
            })
        }
    }

    /// Harmonic oscillator `x'' = -x` with a `nalgebra` state.
    struct Oscillator;

    impl Model for Oscillator {
        type Input = (f64, Vector2<f64>);
        type Output = Vector2<f64>;
        type Error = Infallible;

        fn call(&self, (_, y): &Self::Input) -> Result<Vector2<f64>, Self::Error> {
            Ok(Vector2::new(y[1], -y[0]))
        }
    }

    struct VectorProblem;

    impl OdeProblem for VectorProblem {
        type Input = (f64, Vector2<f64>);
        type Output = Vector2<f64>;
        type Delta = f64;
        type State = Vector2<f64>;
        type Error = Infallible;

        fn state(&self, input: &Self::Input) -> Result<Vector2<f64>, Self::Error> {
            Ok(input.1)
        }

        fn derivative(
            &self,
            _input: &Self::Input,
            output: &Vector2<f64>,
        ) -> Result<Vector2<f64>, Self::Error> {
            Ok(*output)
        }

        fn build_input(
            &self,
            base: &Self::Input,
            state: &Vector2<f64>,
            delta: &f64,
        ) -> Result<Self::Input, Self::Error> {
            Ok((base.0 + delta, *state))
        }
    }

    // --- Tests ---

    #[test]
    fn exponential_decay_is_fourth_order_accurate() {
        let initial = Input { s: 0.0, y: 1.0 };

        let solution =
            solve_unobserved(&Decay, &ScalarProblem, initial, 0.1, 10).expect("should solve");

        assert_eq!(solution.status, Status::Complete);
        assert_eq!(solution.steps, 10);
        assert_eq!(solution.history.len(), 11);

        let last = solution.history.last().unwrap();
        assert_relative_eq!(last.input.s, 1.0, epsilon = 1e-12);
        assert_relative_eq!(last.input.y, (-1.0_f64).exp(), epsilon = 1e-5);
    }

    #[test]
    fn cubic_is_integrated_exactly() {
        let initial = Input { s: 0.0, y: 0.0 };

        let solution =
            solve_unobserved(&Cubic, &ScalarProblem, initial, 0.25, 4).expect("should solve");

        let last = solution.history.last().unwrap();
        assert_relative_eq!(last.input.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn oscillator_conserves_energy() {
        let initial = (0.0, Vector2::new(1.0, 0.0));

        let solution = solve_unobserved(&Oscillator, &VectorProblem, initial, 0.01, 628)
            .expect("should solve");

        let (_, y) = solution.history.last().unwrap().input;
        assert_relative_eq!(y.norm_squared(), 1.0, epsilon = 1e-8);
        assert_relative_eq!(y[0], 6.28_f64.cos(), epsilon = 1e-8);
    }

    #[test]
    fn observer_can_stop_early() {
        let initial = Input { s: 0.0, y: 1.0 };

        let observer = |event: &Event<'_, Input, f64>| {
            if event.step >= 5 {
                Some(Action::StopEarly)
            } else {
                None
            }
        };

        let solution =
            solve(&Decay, &ScalarProblem, initial, 0.1, 100, observer).expect("should stop early");

        assert_eq!(solution.status, Status::StoppedByObserver);
        assert_eq!(solution.steps, 5);
        assert_eq!(solution.history.len(), 6);
    }

    #[test]
    fn step_numbers_start_at_zero() {
        let initial = Input { s: 0.0, y: 1.0 };

        let mut step_values = Vec::new();
        solve(
            &Decay,
            &ScalarProblem,
            initial,
            0.25,
            4,
            |event: &Event<'_, Input, f64>| {
                step_values.push(event.step);
                None
            },
        )
        .expect("should solve");

        assert_eq!(step_values, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn zero_steps_returns_initial() {
        let initial = Input { s: 0.0, y: 5.0 };

        let solution =
            solve_unobserved(&Decay, &ScalarProblem, initial, 0.1, 0).expect("should solve");

        assert_eq!(solution.status, Status::Complete);
        assert_eq!(solution.history.len(), 1);
        assert_relative_eq!(solution.history[0].input.y, 5.0);
    }

    #[test]
    fn rejects_zero_step() {
        let initial = Input { s: 0.0, y: 1.0 };

        let result = solve_unobserved(&Decay, &ScalarProblem, initial, 0.0, 3);

        assert!(matches!(result, Err(Error::InvalidStep { .. })));
    }
}
