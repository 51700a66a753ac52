//! Fixed-step integrators that march an [`OdeProblem`] along its independent
//! variable.
//!
//! [`OdeProblem`]: tendril_core::OdeProblem

pub mod rk4;
