//! Shared vocabulary of the benchmark harness: the `Problem` and `Model`
//! traits, capability tags, hyperparameters and loss metrics.

#![deny(unused_imports)]
#![warn(missing_docs, unused_crate_dependencies)]

mod activation;
mod capability;
mod error;
mod hyperparams;
mod metric;
mod model;
mod noise;
mod problem;

pub use activation::Activation;
pub use capability::{intersects, Capability};
pub use error::{Error, Result};
pub use hyperparams::{HyperparamSet, Hyperparams};
pub use metric::Metric;
pub use model::Model;
pub use noise::{gaussian, seeded_rng};
pub use problem::Problem;

/// Observations, predictions and actions are dense column vectors
pub type Observation = nalgebra::DVector<f64>;
