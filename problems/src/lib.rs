//! Data generating processes and simulated environments for the benchmark harness

#[macro_use]
extern crate log;

mod arma;
mod lds;
mod mackey_glass;
mod pendulum;
mod random;

pub use arma::{Params as ARMAParams, ARMA};
pub use lds::{Params as LDSParams, LDS};
pub use mackey_glass::{MackeyGlass, Params as MackeyGlassParams};
pub use pendulum::{Params as PendulumParams, Pendulum};
pub use random::{Params as RandomParams, Random};

use common::Observation;
use nalgebra::{DMatrix, DVector};
use nanorand::WyRand;

/// Vector of independent standard normal samples
pub(crate) fn gaussian_vector(rng: &mut WyRand, n: usize) -> Observation {
    DVector::from_fn(n, |_, _| common::gaussian(rng))
}

/// Matrix of independent standard normal samples
pub(crate) fn gaussian_matrix(rng: &mut WyRand, rows: usize, cols: usize) -> DMatrix<f64> {
    DMatrix::from_fn(rows, cols, |_, _| common::gaussian(rng))
}
