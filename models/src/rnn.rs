use std::collections::VecDeque;

use common::{
    seeded_rng, Activation, Capability, Error, HyperparamSet, Model, Observation,
    Result,
};
use nalgebra::{DMatrix, DVector};
use nanorand::{Rng, WyRand};
use serde::{Deserialize, Serialize};

use crate::{check_dim, check_finite, optimizer::OptimizerState, Optimizer};

/// The parameters of the recurrent network
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Length of the input history used for truncated backpropagation
    #[serde(rename = "l")]
    pub memory_len: usize,
    /// Number of hidden units
    #[serde(rename = "h")]
    pub hidden_size: usize,
    /// Nonlinearity of the hidden state
    pub activation: Activation,
    /// Update rule applied to the gradients
    pub optimizer: Optimizer,
    /// Base learning rate of the optimizer
    pub lr: f64,
    /// Gradients with a larger euclidean norm are rescaled to this norm
    pub grad_clip: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            memory_len: 32,
            hidden_size: 64,
            activation: Activation::Tanh,
            optimizer: Optimizer::OGD,
            lr: 0.003,
            grad_clip: 10.0,
        }
    }
}

impl HyperparamSet for Params {
    fn validate(&self) -> Result<()> {
        if self.hidden_size == 0 {
            return Err(Error::invalid_param("h", "must be positive"));
        }
        if self.memory_len == 0 {
            return Err(Error::invalid_param("l", "must be positive"));
        }

        Ok(())
    }
}

// indices into `RNN::weights`
const W_H: usize = 0;
const W_X: usize = 1;
const W_OUT: usize = 2;
const B_H: usize = 3;

/// One step of history kept for truncated backpropagation
#[derive(Debug, Clone)]
struct Step {
    input: DVector<f64>,
    prev_hidden: DVector<f64>,
    hidden: DVector<f64>,
}

/// Randomly initialized recurrent network trained online.
/// The hidden state follows `h' = act(W_h h + W_x x + b_h)` and the output is `W_out h'`.
#[derive(Debug, Clone)]
pub struct RNN {
    params: Params,
    input_dim: usize,
    output_dim: usize,
    /// `[W_h, W_x, W_out, b_h]`
    weights: Vec<DMatrix<f64>>,
    hidden: DVector<f64>,
    history: VecDeque<Step>,
    last_prediction: Option<DVector<f64>>,
    optimizer: OptimizerState,
}

impl RNN {
    /// The capability tags of this model
    pub const COMPATIBLES: &'static [Capability] = &[Capability::TimeSeries];

    /// Create a new network with glorot uniform initialization
    ///
    /// # Arguments:
    /// params: The parameters
    /// input_dim: Length of the observations fed to `predict`
    /// output_dim: Length of the predictions
    /// seed: Seed for the weight initialization
    pub fn new(params: Params, input_dim: usize, output_dim: usize, seed: u64) -> Self {
        let mut rng = seeded_rng(seed);
        let h = params.hidden_size;
        let weights = vec![
            glorot(&mut rng, h, h),
            glorot(&mut rng, h, input_dim),
            glorot(&mut rng, output_dim, h),
            DMatrix::zeros(h, 1),
        ];
        let optimizer = OptimizerState::new(params.optimizer, params.lr, &weights);

        Self {
            history: VecDeque::with_capacity(params.memory_len),
            hidden: DVector::zeros(h),
            params,
            input_dim,
            output_dim,
            weights,
            last_prediction: None,
            optimizer,
        }
    }

    /// The parameters
    #[inline(always)]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Compute the next hidden state and output without mutating the network
    fn cell(&self, x: &DVector<f64>, hidden: &DVector<f64>) -> (DVector<f64>, DVector<f64>) {
        let mut next: DVector<f64> = &self.weights[W_H] * hidden
            + &self.weights[W_X] * x
            + self.weights[B_H].column(0);
        self.params.activation.activate(next.as_mut_slice());
        let y = &self.weights[W_OUT] * &next;

        (next, y)
    }

    fn gradients(&self, err: &DVector<f64>) -> Vec<DMatrix<f64>> {
        let mut grads: Vec<DMatrix<f64>> =
            self.weights.iter().map(|w| DMatrix::zeros(w.nrows(), w.ncols())).collect();
        let last = match self.history.back() {
            Some(last) => last,
            None => return grads,
        };
        grads[W_OUT] = err * last.hidden.transpose();

        let act = self.params.activation;
        let mut d_hidden: DVector<f64> = self.weights[W_OUT].transpose() * err;
        for step in self.history.iter().rev() {
            let d_pre = d_hidden.zip_map(&step.hidden, |d, h| d * act.derivative_from_output(h));
            grads[W_H] += &d_pre * step.prev_hidden.transpose();
            grads[W_X] += &d_pre * step.input.transpose();
            grads[B_H] += &d_pre;
            d_hidden = self.weights[W_H].transpose() * d_pre;
        }

        let norm = grads.iter().map(|g| g.norm_squared()).sum::<f64>().sqrt();
        if norm > self.params.grad_clip {
            debug!("clipping gradient norm {} to {}", norm, self.params.grad_clip);
            let scale = self.params.grad_clip / norm;
            grads.iter_mut().for_each(|g| *g *= scale);
        }

        grads
    }
}

impl Model for RNN {
    #[inline(always)]
    fn compatibles(&self) -> &'static [Capability] {
        Self::COMPATIBLES
    }

    #[inline(always)]
    fn uses_regressors(&self) -> bool {
        true
    }

    fn predict(&mut self, x: &Observation) -> Result<Observation> {
        check_dim("rnn input", x, self.input_dim)?;
        let (next, y) = self.cell(x, &self.hidden);
        check_finite("rnn prediction", &y)?;

        if self.history.len() == self.params.memory_len {
            let _ = self.history.pop_front();
        }
        self.history.push_back(Step {
            input: x.clone(),
            prev_hidden: std::mem::replace(&mut self.hidden, next.clone()),
            hidden: next,
        });
        self.last_prediction = Some(y.clone());

        Ok(y)
    }

    fn forecast(&mut self, x: &Observation, horizon: usize) -> Result<Vec<Observation>> {
        if horizon > 1 && self.input_dim != self.output_dim {
            return Err(Error::Unsupported(format!(
                "forecasting needs equal input and output dims, got {} and {}",
                self.input_dim, self.output_dim
            )));
        }
        let mut preds = Vec::with_capacity(horizon);
        let mut y = self.predict(x)?;
        let mut hidden = self.hidden.clone();
        preds.push(y.clone());
        for _ in 1..horizon {
            let (next, out) = self.cell(&y, &hidden);
            hidden = next;
            y = out;
            preds.push(y.clone());
        }

        Ok(preds)
    }

    fn update(&mut self, y: &Observation) -> Result<()> {
        check_dim("rnn target", y, self.output_dim)?;
        let pred = match self.last_prediction.take() {
            Some(pred) => pred,
            None => {
                debug!("update called before predict, nothing to learn from");
                return Ok(());
            }
        };
        let err: DVector<f64> = pred - y;
        let grads = self.gradients(&err);
        self.optimizer.step(&mut self.weights, &grads);
        if self.weights.iter().any(|w| w.iter().any(|v| !v.is_finite())) {
            return Err(Error::NonFinite("rnn weights"));
        }

        Ok(())
    }
}

/// Glorot uniform initialization
fn glorot(rng: &mut WyRand, rows: usize, cols: usize) -> DMatrix<f64> {
    let limit = (6.0 / (rows + cols) as f64).sqrt();
    DMatrix::from_fn(rows, cols, |_, _| (rng.generate::<f64>() * 2.0 - 1.0) * limit)
}

#[cfg(test)]
mod tests {
    use common::Hyperparams;

    use super::*;

    fn sine(t: usize) -> Observation {
        DVector::from_element(1, (t as f64 * 0.2).sin())
    }

    #[test]
    fn params_from_hyperparams() {
        let p = Params::from_hyperparams(
            &Hyperparams::new().with("h", 8_usize).with("optimizer", "adagrad").with("activation", "relu"),
        )
        .unwrap();
        assert_eq!(p.hidden_size, 8);
        assert_eq!(p.optimizer, Optimizer::Adagrad);
        assert_eq!(p.activation, Activation::Relu);
        assert_eq!(p.memory_len, 32);
        assert_eq!(p.to_hyperparams().get_str("optimizer"), Some("Adagrad"));

        let back = Params::from_hyperparams(&p.to_hyperparams()).unwrap();
        assert_eq!(back.hidden_size, 8);
        assert_eq!(back.optimizer, Optimizer::Adagrad);

        assert!(Params::from_hyperparams(&Hyperparams::new().with("optimizer", "Nope")).is_err());
        assert!(Params::from_hyperparams(&Hyperparams::new().with("h", 0_usize)).is_err());
        assert!(Params::from_hyperparams(&Hyperparams::new().with("activation", "softmax")).is_err());
    }

    #[test]
    fn every_activation_stays_finite() {
        for activation in [Activation::Identity, Activation::Tanh, Activation::Relu, Activation::Sigmoid] {
            let params = Params {
                hidden_size: 8,
                memory_len: 4,
                activation,
                ..Default::default()
            };
            let mut rnn = RNN::new(params, 1, 1, 3);
            for t in 0..300 {
                let p = rnn.predict(&sine(t)).unwrap();
                assert!(p[0].is_finite(), "{:?} diverged at {}", activation, t);
                rnn.update(&sine(t + 1)).unwrap();
            }
        }
    }

    #[test]
    fn deterministic_given_seed() {
        let run = || {
            let mut rnn = RNN::new(Params::default(), 1, 1, 42);
            (0..50)
                .map(|t| {
                    let p = rnn.predict(&sine(t)).unwrap();
                    rnn.update(&sine(t + 1)).unwrap();
                    p[0]
                })
                .collect::<Vec<f64>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn learns_sine() {
        if let Err(_) = pretty_env_logger::try_init() {}

        let params = Params {
            hidden_size: 16,
            memory_len: 8,
            optimizer: Optimizer::Adagrad,
            lr: 0.05,
            ..Default::default()
        };
        let mut rnn = RNN::new(params, 1, 1, 0);
        let mut early = 0.0;
        let mut late = 0.0;
        for t in 0..2000 {
            let p = rnn.predict(&sine(t)).unwrap();
            let target = sine(t + 1);
            let loss = (p[0] - target[0]).powi(2);
            if t < 100 {
                early += loss;
            }
            if t >= 1900 {
                late += loss;
            }
            rnn.update(&target).unwrap();
        }
        info!("early loss: {}, late loss: {}", early, late);
        assert!(late < early);
    }

    #[test]
    fn forecast_length_and_shape() {
        let mut rnn = RNN::new(Params::default(), 2, 2, 1);
        let x = DVector::from_vec(vec![0.1, 0.2]);
        let preds = rnn.forecast(&x, 4).unwrap();
        assert_eq!(preds.len(), 4);
        assert!(preds.iter().all(|p| p.len() == 2));

        let mut mismatched = RNN::new(Params::default(), 2, 1, 1);
        assert!(mismatched.forecast(&x, 2).is_err());
        assert_eq!(mismatched.forecast(&x, 1).unwrap().len(), 1);
    }

    #[test]
    fn wrong_input_dim() {
        let mut rnn = RNN::new(Params::default(), 3, 3, 1);
        let err = rnn.predict(&DVector::zeros(2)).unwrap_err();
        assert_eq!(
            err,
            Error::ShapeMismatch {
                what: "rnn input",
                expected: 3,
                got: 2
            }
        );
    }
}
