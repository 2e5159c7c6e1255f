//! Online learners shipped with the benchmark harness

#[macro_use]
extern crate log;

mod autoregressor;
mod esn;
mod last_value;
mod optimizer;
mod rnn;

pub use autoregressor::{AutoRegressor, Params as AutoRegressorParams};
pub use esn::{Params as ESNParams, ESN};
pub use last_value::LastValue;
pub use optimizer::Optimizer;
pub use rnn::{Params as RNNParams, RNN};

use common::{Error, Observation, Result};

/// Check the length of an incoming observation
#[inline]
pub(crate) fn check_dim(what: &'static str, x: &Observation, expected: usize) -> Result<()> {
    if x.len() != expected {
        return Err(Error::ShapeMismatch {
            what,
            expected,
            got: x.len(),
        });
    }
    Ok(())
}

/// Reject predictions that contain NaN or infinities
#[inline]
pub(crate) fn check_finite(what: &'static str, x: &Observation) -> Result<()> {
    if x.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(Error::NonFinite(what))
    }
}
