use common::{seeded_rng, Capability, Error, HyperparamSet, Observation, Problem, Result};
use nanorand::WyRand;
use serde::{Deserialize, Serialize};

use crate::gaussian_vector;

/// The parameters of the white noise process
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Dimensionality of each sample
    pub dim: usize,
    /// Standard deviation
    pub scale: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            dim: 1,
            scale: 1.0,
        }
    }
}

impl HyperparamSet for Params {
    fn validate(&self) -> Result<()> {
        if self.dim == 0 {
            return Err(Error::invalid_param("dim", "must be positive"));
        }

        Ok(())
    }
}

/// Independent gaussian samples, nothing to learn
#[derive(Debug, Clone)]
pub struct Random {
    params: Params,
    t: usize,
    rng: WyRand,
}

impl Random {
    /// The capability tags of this problem
    pub const COMPATIBLES: &'static [Capability] = &[Capability::TimeSeries];

    /// Create a new noise source
    pub fn new(params: Params, seed: u64) -> Self {
        Self {
            params,
            t: 0,
            rng: seeded_rng(seed),
        }
    }
}

impl Problem for Random {
    #[inline(always)]
    fn compatibles(&self) -> &'static [Capability] {
        Self::COMPATIBLES
    }

    #[inline(always)]
    fn observation_dim(&self) -> usize {
        self.params.dim
    }

    fn step(&mut self, _action: Option<&Observation>) -> Result<Observation> {
        self.t += 1;
        Ok(gaussian_vector(&mut self.rng, self.params.dim) * self.params.scale)
    }

    fn hidden(&self) -> String {
        format!("t: {}", self.t)
    }
}
