use common::{
    seeded_rng, Activation, Capability, Error, HyperparamSet, Model, Observation,
    Result,
};
use lin_reg::RecursiveLeastSquares;
use nalgebra::{DMatrix, DVector};
use nanorand::{Rng, WyRand};
use serde::{Deserialize, Serialize};

use crate::{check_dim, check_finite};

/// The parameters of the Echo State Network
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Number of nodes in the reservoir
    pub reservoir_size: usize,
    /// Controls the retention of information from previous time steps.
    /// The spectral radius determines how fast the influence of an input
    /// dies out in a reservoir with time, and how stable the reservoir
    /// activations are.
    pub spectral_radius: f64,
    /// Connection probability within the reservoir
    pub reservoir_sparsity: f64,
    /// Scales the reservoir biases
    pub reservoir_bias_scaling: f64,
    /// Probability of inputs connecting to state
    pub input_sparsity: f64,
    /// Scales the input weight matrix
    pub input_weight_scaling: f64,
    /// Tunes the decay time of internal activity of the network.
    /// This sort of acts as a EMA smoothing filter on the state.
    pub leaking_rate: f64,
    /// Nonlinearity applied to the reservoir state
    pub reservoir_activation: Activation,
    /// Forgetting factor of the online readout regression
    pub forgetting_factor: f64,
    /// Initial scale of the readout's inverse correlation matrix
    pub delta: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            reservoir_size: 100,
            spectral_radius: 0.9,
            reservoir_sparsity: 0.1,
            reservoir_bias_scaling: 0.1,
            input_sparsity: 1.0,
            input_weight_scaling: 0.5,
            leaking_rate: 0.3,
            reservoir_activation: Activation::Tanh,
            forgetting_factor: 0.999,
            delta: 100.0,
        }
    }
}

impl HyperparamSet for Params {
    fn validate(&self) -> Result<()> {
        if self.reservoir_size == 0 {
            return Err(Error::invalid_param("reservoir_size", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.leaking_rate) {
            return Err(Error::invalid_param("leaking_rate", "must be within [0, 1]"));
        }
        if self.forgetting_factor <= 0.0 || self.forgetting_factor > 1.0 {
            return Err(Error::invalid_param("forgetting_factor", "must be within (0, 1]"));
        }

        Ok(())
    }
}

/// Leaky Echo State Network with a readout trained online by recursive least squares
#[derive(Debug, Clone)]
pub struct ESN {
    params: Params,
    input_dim: usize,
    input_weight_matrix: DMatrix<f64>,
    reservoir_matrix: DMatrix<f64>,
    reservoir_biases: DVector<f64>,
    state: DVector<f64>,
    /// One regression per output dimension over `[1, state]`
    readouts: Vec<RecursiveLeastSquares>,
    /// Features the last prediction was made from
    last_features: Option<DVector<f64>>,
}

impl ESN {
    /// The capability tags of this model
    pub const COMPATIBLES: &'static [Capability] = &[Capability::TimeSeries];

    /// Create a new reservoir, with random initialization
    pub fn new(params: Params, input_dim: usize, output_dim: usize, seed: u64) -> Self {
        let mut rng = seeded_rng(seed);
        let reservoir_matrix = construct_reservoir_weights(&mut rng, &params);
        let reservoir_biases = DVector::from_fn(params.reservoir_size, |_, _| {
            (rng.generate::<f64>() * 2.0 - 1.0) * params.reservoir_bias_scaling
        });
        let input_weight_matrix = DMatrix::from_fn(params.reservoir_size, input_dim, |_, _| {
            if rng.generate::<f64>() < params.input_sparsity {
                (rng.generate::<f64>() * 2.0 - 1.0) * params.input_weight_scaling
            } else {
                0.0
            }
        });
        let readouts = (0..output_dim)
            .map(|_| {
                RecursiveLeastSquares::new(
                    params.reservoir_size + 1,
                    params.forgetting_factor,
                    params.delta,
                )
            })
            .collect();

        Self {
            state: DVector::zeros(params.reservoir_size),
            params,
            input_dim,
            input_weight_matrix,
            reservoir_matrix,
            reservoir_biases,
            readouts,
            last_features: None,
        }
    }

    /// The state after feeding `input` to a reservoir currently in `state`
    fn next_state(&self, state: &DVector<f64>, input: &DVector<f64>) -> DVector<f64> {
        let mut pre: DVector<f64> = &self.input_weight_matrix * input
            + &self.reservoir_matrix * state
            + &self.reservoir_biases;
        self.params.reservoir_activation.activate(pre.as_mut_slice());

        state * (1.0 - self.params.leaking_rate) + pre * self.params.leaking_rate
    }

    /// Prepend the 1 to state for proper readout
    fn features(state: &DVector<f64>) -> DVector<f64> {
        DVector::from_fn(state.len() + 1, |i, _| if i == 0 { 1.0 } else { state[i - 1] })
    }

    fn readout(&self, features: &DVector<f64>) -> DVector<f64> {
        DVector::from_iterator(self.readouts.len(), self.readouts.iter().map(|r| r.predict(features)))
    }
}

impl Model for ESN {
    #[inline(always)]
    fn compatibles(&self) -> &'static [Capability] {
        Self::COMPATIBLES
    }

    fn predict(&mut self, x: &Observation) -> Result<Observation> {
        check_dim("esn input", x, self.input_dim)?;
        self.state = self.next_state(&self.state, x);
        let features = Self::features(&self.state);
        let pred = self.readout(&features);
        check_finite("esn prediction", &pred)?;
        self.last_features = Some(features);

        Ok(pred)
    }

    fn forecast(&mut self, x: &Observation, horizon: usize) -> Result<Vec<Observation>> {
        if horizon > 1 && self.input_dim != self.readouts.len() {
            return Err(Error::Unsupported(format!(
                "forecasting needs equal input and output dims, got {} and {}",
                self.input_dim,
                self.readouts.len()
            )));
        }
        let mut preds = Vec::with_capacity(horizon);
        let mut pred = self.predict(x)?;
        let mut state = self.state.clone();
        preds.push(pred.clone());
        // To forecast, replace the input with its own prediction
        for _ in 1..horizon {
            state = self.next_state(&state, &pred);
            pred = self.readout(&Self::features(&state));
            preds.push(pred.clone());
        }

        Ok(preds)
    }

    fn update(&mut self, y: &Observation) -> Result<()> {
        check_dim("esn target", y, self.readouts.len())?;
        let features = match self.last_features.take() {
            Some(f) => f,
            None => return Ok(()),
        };
        for (readout, target) in self.readouts.iter_mut().zip(y.iter()) {
            readout.update(&features, *target);
        }

        Ok(())
    }
}

/// Sparse random reservoir scaled to the desired spectral radius
fn construct_reservoir_weights(rng: &mut WyRand, params: &Params) -> DMatrix<f64> {
    let n = params.reservoir_size;
    let mut reservoir_matrix = DMatrix::from_fn(n, n, |_, _| {
        if rng.generate::<f64>() < params.reservoir_sparsity {
            rng.generate::<f64>() * 2.0 - 1.0
        } else {
            0.0
        }
    });

    let spec_rad = reservoir_matrix
        .complex_eigenvalues()
        .iter()
        .map(|c| c.re.hypot(c.im))
        .fold(0.0, f64::max);
    if spec_rad > 0.0 {
        reservoir_matrix *= params.spectral_radius / spec_rad;
    } else {
        warn!("reservoir has no non-zero eigenvalue, leaving it unscaled");
    }

    reservoir_matrix
}

#[cfg(test)]
mod tests {
    use common::Hyperparams;

    use super::*;

    #[test]
    fn reservoir_has_requested_spectral_radius() {
        let params = Params {
            reservoir_size: 30,
            reservoir_sparsity: 0.3,
            ..Default::default()
        };
        let m = construct_reservoir_weights(&mut seeded_rng(3), &params);
        let rad = m.complex_eigenvalues().iter().map(|c| c.re.hypot(c.im)).fold(0.0, f64::max);
        assert!((rad - params.spectral_radius).abs() < 1e-6, "radius: {}", rad);
    }

    #[test]
    fn learns_sine() {
        if let Err(_) = pretty_env_logger::try_init() {}

        let params = Params {
            reservoir_size: 40,
            ..Default::default()
        };
        let mut esn = ESN::new(params, 1, 1, 0);
        let sine = |t: usize| DVector::from_element(1, (t as f64 * 0.2).sin());
        let mut late = 0.0;
        for t in 0..1000 {
            let p = esn.predict(&sine(t)).unwrap();
            if t >= 900 {
                late += (p[0] - sine(t + 1)[0]).powi(2);
            }
            esn.update(&sine(t + 1)).unwrap();
        }
        info!("late loss: {}", late);
        assert!(late / 100.0 < 1e-3);
    }

    #[test]
    fn invalid_params() {
        let hp = Hyperparams::new().with("leaking_rate", 1.5);
        assert!(Params::from_hyperparams(&hp).is_err());
        let hp = Hyperparams::new().with("reservoir_size", "large");
        assert!(Params::from_hyperparams(&hp).is_err());
    }

    #[test]
    fn identity_reservoir() {
        let hp = Hyperparams::new()
            .with("reservoir_size", 20_usize)
            .with("reservoir_activation", "identity");
        let params = Params::from_hyperparams(&hp).unwrap();
        assert_eq!(params.reservoir_activation, Activation::Identity);

        let mut esn = ESN::new(params, 1, 1, 4);
        for t in 0..200 {
            let x = DVector::from_element(1, (t as f64 * 0.3).cos());
            let p = esn.predict(&x).unwrap();
            assert!(p[0].is_finite());
            esn.update(&DVector::from_element(1, ((t + 1) as f64 * 0.3).cos())).unwrap();
        }
    }
}
