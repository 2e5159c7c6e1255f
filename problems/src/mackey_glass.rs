use std::collections::VecDeque;

use common::{seeded_rng, Capability, Error, HyperparamSet, Observation, Problem, Result};
use nalgebra::DVector;
use nanorand::Rng;
use serde::{Deserialize, Serialize};

/// The parameters of the Mackey-Glass series
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Delay, roughly correlates to the chaotic and complex behaviour of the sequence
    pub tau: usize,
    /// Number of integration substeps per emitted sample
    pub delta_t: usize,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            tau: 30,
            delta_t: 10,
        }
    }
}

impl HyperparamSet for Params {
    fn validate(&self) -> Result<()> {
        if self.tau == 0 || self.delta_t == 0 {
            return Err(Error::invalid_param("tau", "tau and delta_t must be positive"));
        }

        Ok(())
    }
}

/// Mackey-Glass delay differential equation, squashed by tanh
#[derive(Debug, Clone)]
pub struct MackeyGlass {
    delta_t: usize,
    history: VecDeque<f64>,
    value: f64,
    t: usize,
}

impl MackeyGlass {
    /// The capability tags of this problem
    pub const COMPATIBLES: &'static [Capability] = &[Capability::TimeSeries];

    /// Create a new series with a randomly perturbed initial history
    pub fn new(params: Params, seed: u64) -> Self {
        let history_len = params.tau * params.delta_t;
        let mut rng = seeded_rng(seed);
        let history = (0..history_len)
            .map(|_| 1.2 + 0.2 * (rng.generate::<f64>() - 0.5))
            .collect();

        Self {
            delta_t: params.delta_t,
            history,
            value: 1.2,
            t: 0,
        }
    }
}

impl Problem for MackeyGlass {
    #[inline(always)]
    fn compatibles(&self) -> &'static [Capability] {
        Self::COMPATIBLES
    }

    #[inline(always)]
    fn observation_dim(&self) -> usize {
        1
    }

    fn step(&mut self, _action: Option<&Observation>) -> Result<Observation> {
        for _ in 0..self.delta_t {
            let x_tau = self.history.pop_front().unwrap_or(self.value);
            self.history.push_back(self.value);
            let last = self.value;
            self.value =
                last + (0.2 * x_tau / (1.0 + x_tau.powi(10)) - 0.1 * last) / self.delta_t as f64;
        }
        self.t += 1;

        Ok(DVector::from_element(1, self.value.tanh()))
    }

    fn hidden(&self) -> String {
        format!("t: {}, value: {}", self.t, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_and_reproducible() {
        let run = |seed| {
            let mut mg = MackeyGlass::new(Params::default(), seed);
            (0..500).map(|_| mg.step(None).unwrap()[0]).collect::<Vec<f64>>()
        };
        let a = run(0);
        assert_eq!(a, run(0));
        assert_ne!(a, run(1));
        assert!(a.iter().all(|v| v.abs() < 1.0));
    }
}
