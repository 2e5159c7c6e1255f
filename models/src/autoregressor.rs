use std::collections::VecDeque;

use common::{Capability, Error, HyperparamSet, Model, Observation, Result};
use lin_reg::RecursiveLeastSquares;
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::{check_dim, check_finite};

/// The parameters of the autoregressive model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Number of lagged observations used as regressors
    pub p: usize,
    /// Forgetting factor of the recursive least squares fit
    pub forgetting_factor: f64,
    /// Initial scale of the inverse correlation matrix
    pub delta: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            p: 3,
            forgetting_factor: 0.99,
            delta: 100.0,
        }
    }
}

impl HyperparamSet for Params {
    fn validate(&self) -> Result<()> {
        if self.p == 0 {
            return Err(Error::invalid_param("p", "must be positive"));
        }
        if self.forgetting_factor <= 0.0 || self.forgetting_factor > 1.0 {
            return Err(Error::invalid_param("forgetting_factor", "must be within (0, 1]"));
        }

        Ok(())
    }
}

/// AR(p) model over all observation dimensions, fit online.
/// Every output dimension regresses on an intercept and the last `p` full observations.
#[derive(Debug, Clone)]
pub struct AutoRegressor {
    params: Params,
    dim: usize,
    /// Most recent observation first
    window: VecDeque<DVector<f64>>,
    fits: Vec<RecursiveLeastSquares>,
    last_regressors: Option<DVector<f64>>,
}

impl AutoRegressor {
    /// The capability tags of this model
    pub const COMPATIBLES: &'static [Capability] = &[Capability::TimeSeries];

    /// Create a new model for observations of length `dim`
    pub fn new(params: Params, dim: usize) -> Self {
        let n_regressors = 1 + params.p * dim;
        let fits = (0..dim)
            .map(|_| RecursiveLeastSquares::new(n_regressors, params.forgetting_factor, params.delta))
            .collect();
        let window = (0..params.p).map(|_| DVector::zeros(dim)).collect();

        Self {
            params,
            dim,
            window,
            fits,
            last_regressors: None,
        }
    }

    fn regressors(window: &VecDeque<DVector<f64>>, dim: usize) -> DVector<f64> {
        let mut r = DVector::zeros(1 + window.len() * dim);
        r[0] = 1.0;
        for (lag, obs) in window.iter().enumerate() {
            r.rows_mut(1 + lag * dim, dim).copy_from(obs);
        }
        r
    }

    fn push(window: &mut VecDeque<DVector<f64>>, x: &DVector<f64>) {
        let _ = window.pop_back();
        window.push_front(x.clone());
    }

    fn readout(&self, regressors: &DVector<f64>) -> DVector<f64> {
        DVector::from_iterator(self.dim, self.fits.iter().map(|f| f.predict(regressors)))
    }
}

impl Model for AutoRegressor {
    #[inline(always)]
    fn compatibles(&self) -> &'static [Capability] {
        Self::COMPATIBLES
    }

    #[inline(always)]
    fn uses_regressors(&self) -> bool {
        true
    }

    fn predict(&mut self, x: &Observation) -> Result<Observation> {
        check_dim("autoregressor input", x, self.dim)?;
        Self::push(&mut self.window, x);
        let regressors = Self::regressors(&self.window, self.dim);
        let pred = self.readout(&regressors);
        check_finite("autoregressor prediction", &pred)?;
        self.last_regressors = Some(regressors);

        Ok(pred)
    }

    fn forecast(&mut self, x: &Observation, horizon: usize) -> Result<Vec<Observation>> {
        let mut preds = Vec::with_capacity(horizon);
        let mut pred = self.predict(x)?;
        let mut window = self.window.clone();
        preds.push(pred.clone());
        for _ in 1..horizon {
            Self::push(&mut window, &pred);
            pred = self.readout(&Self::regressors(&window, self.dim));
            preds.push(pred.clone());
        }

        Ok(preds)
    }

    fn update(&mut self, y: &Observation) -> Result<()> {
        check_dim("autoregressor target", y, self.dim)?;
        if let Some(regressors) = self.last_regressors.take() {
            for (fit, target) in self.fits.iter_mut().zip(y.iter()) {
                fit.update(&regressors, *target);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_ar2_process() {
        if let Err(_) = pretty_env_logger::try_init() {}

        let params = Params {
            p: 2,
            forgetting_factor: 1.0,
            delta: 1000.0,
        };
        let mut model = AutoRegressor::new(params, 1);
        // x_t = 0.5 x_{t-1} - 0.3 x_{t-2} + 0.1 + e_t
        let mut rng = common::seeded_rng(11);
        let mut xs = vec![0.0, 0.0];
        for t in 2..3000 {
            xs.push(0.5 * xs[t - 1] - 0.3 * xs[t - 2] + 0.1 + common::gaussian(&mut rng));
        }
        for t in 0..xs.len() - 1 {
            model.predict(&DVector::from_element(1, xs[t])).unwrap();
            model.update(&DVector::from_element(1, xs[t + 1])).unwrap();
        }
        let w = model.fits[0].weights();
        info!("weights: {}", w);
        assert!((w[0] - 0.1).abs() < 0.1);
        assert!((w[1] - 0.5).abs() < 0.1);
        assert!((w[2] + 0.3).abs() < 0.1);
    }

    #[test]
    fn forecast_rolls_forward() {
        let mut model = AutoRegressor::new(Params::default(), 2);
        let preds = model.forecast(&DVector::from_vec(vec![1.0, 2.0]), 5).unwrap();
        assert_eq!(preds.len(), 5);
        assert!(model.forecast(&DVector::zeros(3), 2).is_err());
    }
}
