use std::{fmt, str::FromStr};

use common::Error;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// Gradient based update rule used by the recurrent network.
/// Read from a case insensitive name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Optimizer {
    /// Online gradient descent with a `lr / sqrt(t)` step size
    OGD,
    /// Adagrad with per-coordinate step sizes
    Adagrad,
}

impl Optimizer {
    /// The display name, also used to derive result keys
    pub fn name(&self) -> &'static str {
        match self {
            Optimizer::OGD => "OGD",
            Optimizer::Adagrad => "Adagrad",
        }
    }
}

impl fmt::Display for Optimizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Optimizer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ogd" => Ok(Optimizer::OGD),
            "adagrad" => Ok(Optimizer::Adagrad),
            _ => Err(Error::invalid_param("optimizer", format!("unknown optimizer `{}`", s))),
        }
    }
}

impl TryFrom<String> for Optimizer {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Optimizer> for String {
    fn from(o: Optimizer) -> Self {
        o.name().to_string()
    }
}

/// Mutable state of an optimizer over a fixed list of parameter matrices
#[derive(Debug, Clone)]
pub(crate) struct OptimizerState {
    kind: Optimizer,
    lr: f64,
    t: usize,
    /// Sum of squared gradients, only used by Adagrad
    accum: Vec<DMatrix<f64>>,
}

impl OptimizerState {
    const EPS: f64 = 1e-8;

    pub(crate) fn new(kind: Optimizer, lr: f64, params: &[DMatrix<f64>]) -> Self {
        let accum = match kind {
            Optimizer::OGD => vec![],
            Optimizer::Adagrad => {
                params.iter().map(|p| DMatrix::zeros(p.nrows(), p.ncols())).collect()
            }
        };
        Self {
            kind,
            lr,
            t: 0,
            accum,
        }
    }

    pub(crate) fn step(&mut self, params: &mut [DMatrix<f64>], grads: &[DMatrix<f64>]) {
        self.t += 1;
        match self.kind {
            Optimizer::OGD => {
                let lr = self.lr / (self.t as f64).sqrt();
                for (p, g) in params.iter_mut().zip(grads) {
                    *p -= g * lr;
                }
            }
            Optimizer::Adagrad => {
                for ((p, g), acc) in params.iter_mut().zip(grads).zip(self.accum.iter_mut()) {
                    *acc += g.component_mul(g);
                    let lr = self.lr;
                    let scaled = g.zip_map(acc, |gi, ai| lr * gi / (ai.sqrt() + Self::EPS));
                    *p -= scaled;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimize(kind: Optimizer, lr: f64) -> f64 {
        // minimize (w - 3)^2
        let mut params = vec![DMatrix::from_element(1, 1, 0.0)];
        let mut opt = OptimizerState::new(kind, lr, &params);
        for _ in 0..2000 {
            let g = DMatrix::from_element(1, 1, 2.0 * (params[0][(0, 0)] - 3.0));
            opt.step(&mut params, &[g]);
        }
        params[0][(0, 0)]
    }

    #[test]
    fn both_converge() {
        assert!((minimize(Optimizer::OGD, 0.5) - 3.0).abs() < 1e-3);
        assert!((minimize(Optimizer::Adagrad, 0.5) - 3.0).abs() < 1e-3);
    }

    #[test]
    fn parse_names() {
        assert_eq!("adagrad".parse::<Optimizer>().unwrap(), Optimizer::Adagrad);
        assert_eq!("OGD".parse::<Optimizer>().unwrap().to_string(), "OGD");
        assert!("sgd-plus".parse::<Optimizer>().is_err());
    }
}
