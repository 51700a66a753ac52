/// A trait for types that can be stepped using their derivative.
///
/// Implementing this trait enables generic ODE solvers to work with the type by
/// stepping it via `derivative * delta`, where the derivative is with respect
/// to `Delta`. For rods, `Delta` is the arc-length increment between nodes.
pub trait StepIntegrable<Delta> {
    /// The derivative of the type with respect to `Delta`.
    type Derivative;

    /// Returns the value after stepping with a derivative and step size.
    #[must_use]
    fn step(&self, derivative: Self::Derivative, delta: Delta) -> Self;
}

/// Type alias for the derivative of a `StepIntegrable` type.
///
/// This is a convenience for accessing the [`StepIntegrable::Derivative`]
/// associated type without writing out the fully qualified syntax.
pub type DerivativeOf<T, Delta> = <T as StepIntegrable<Delta>>::Derivative;

impl StepIntegrable<f64> for f64 {
    type Derivative = f64;

    fn step(&self, derivative: f64, delta: f64) -> Self {
        self + derivative * delta
    }
}

/// Fixed-size matrices step element-wise; their derivative has the same shape.
#[cfg(feature = "nalgebra")]
impl<const R: usize, const C: usize> StepIntegrable<f64> for nalgebra::SMatrix<f64, R, C> {
    type Derivative = nalgebra::SMatrix<f64, R, C>;

    fn step(&self, derivative: Self::Derivative, delta: f64) -> Self {
        self + derivative * delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Vector state and derivative
    #[derive(Debug, PartialEq)]
    struct StateVector(Vec<f64>);
    struct DerivativeVector(Vec<f64>);

    impl StepIntegrable<f64> for StateVector {
        type Derivative = DerivativeVector;

        fn step(&self, derivative: DerivativeVector, delta: f64) -> Self {
            let next = self
                .0
                .iter()
                .zip(derivative.0.iter())
                .map(|(s, d)| s + d * delta)
                .collect();
            StateVector(next)
        }
    }

    #[test]
    fn step_scalar_state() {
        let next = 1.0_f64.step(2.0, 0.5);

        assert_eq!(next, 2.0);
    }

    #[test]
    fn step_vector_state() {
        let state = StateVector(vec![1.0, 2.0, 3.0]);
        let deriv = DerivativeVector(vec![0.1, 0.2, 0.3]);
        let dt = 10.0;

        let next = state.step(deriv, dt);

        assert_eq!(next, StateVector(vec![2.0, 4.0, 6.0]));
    }

    #[cfg(feature = "nalgebra")]
    #[test]
    fn step_matrix_state() {
        use nalgebra::{Matrix2, Vector3};

        let v = Vector3::new(1.0, 0.0, -1.0).step(Vector3::new(2.0, 2.0, 2.0), 0.25);
        assert_eq!(v, Vector3::new(1.5, 0.5, -0.5));

        let m = Matrix2::identity().step(Matrix2::new(0.0, 1.0, -1.0, 0.0), 2.0);
        assert_eq!(m, Matrix2::new(1.0, 2.0, -2.0, 1.0));
    }
}
