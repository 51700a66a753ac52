//! Numerical solvers for Tendril ODE problems.
//!
//! - [`transient::rk4`]: classic fixed-step 4th-order Runge-Kutta

pub mod transient;
