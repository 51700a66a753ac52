//! Core traits and types for the Tendril rod integration workspace.
//!
//! This crate defines the shared abstractions that solvers and rod models
//! build on:
//!
//! - [`Model`]: a callable that maps a typed input to a typed output
//! - [`Snapshot`]: a captured input/output pair from a model call
//! - [`Observer`]: receives solver events and optionally returns control actions
//! - [`OdeProblem`]: adapts a model to an ODE solver by extracting a state,
//!   its derivative, and rebuilding model input from a stepped state
//! - [`StepIntegrable`]: types that can be stepped by `derivative * delta`
//!
//! # Features
//!
//! - `nalgebra` (default): implements [`StepIntegrable`] for fixed-size
//!   `nalgebra` matrices so that vectors, homogeneous transforms and packed
//!   matrix pairs can be integrated directly.

mod model;
mod observer;
mod problems;
mod step;

pub use observer::Observer;
pub use problems::OdeProblem;
pub use step::{DerivativeOf, StepIntegrable};
pub use {model::Model, model::Snapshot};
