use std::{fmt, str::FromStr};

use crate::{Error, Observation, Result};

/// Loss between a prediction and the observed ground truth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Mean squared error
    Mse,
    /// Mean absolute error
    Mae,
    /// Root mean squared error
    Rmse,
}

impl Metric {
    /// Names reserved for the per-trial pseudo metrics
    pub const RESERVED: [&'static str; 2] = ["time", "memory"];

    /// The name under which results are stored
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Mse => "mse",
            Metric::Mae => "mae",
            Metric::Rmse => "rmse",
        }
    }

    /// Compute the loss. Both vectors must have the same length and the result must be finite.
    pub fn evaluate(&self, prediction: &Observation, truth: &Observation) -> Result<f64> {
        if prediction.len() != truth.len() {
            return Err(Error::ShapeMismatch {
                what: "metric",
                expected: truth.len(),
                got: prediction.len(),
            });
        }
        if truth.is_empty() {
            return Ok(0.0);
        }
        let n = truth.len() as f64;
        let diff = prediction - truth;
        let loss = match self {
            Metric::Mse => diff.norm_squared() / n,
            Metric::Mae => diff.iter().map(|v| v.abs()).sum::<f64>() / n,
            Metric::Rmse => (diff.norm_squared() / n).sqrt(),
        };
        if !loss.is_finite() {
            return Err(Error::NonFinite("metric"));
        }

        Ok(loss)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mse" => Ok(Metric::Mse),
            "mae" => Ok(Metric::Mae),
            "rmse" => Ok(Metric::Rmse),
            other => Err(Error::Unsupported(format!("metric `{}`", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::DVector;
    use round::round;

    use super::*;

    #[test]
    fn losses() {
        let pred = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let truth = DVector::from_vec(vec![1.0, 0.0, 4.0]);
        assert_eq!(round(Metric::Mse.evaluate(&pred, &truth).unwrap(), 4), 1.6667);
        assert_eq!(Metric::Mae.evaluate(&pred, &truth).unwrap(), 1.0);
        assert_eq!(round(Metric::Rmse.evaluate(&pred, &truth).unwrap(), 4), 1.291);
    }

    #[test]
    fn shape_mismatch() {
        let pred = DVector::from_vec(vec![1.0]);
        let truth = DVector::from_vec(vec![1.0, 2.0]);
        assert_eq!(
            Metric::Mse.evaluate(&pred, &truth),
            Err(Error::ShapeMismatch {
                what: "metric",
                expected: 2,
                got: 1
            })
        );
    }

    #[test]
    fn non_finite() {
        let pred = DVector::from_vec(vec![f64::NAN]);
        let truth = DVector::from_vec(vec![1.0]);
        assert_eq!(Metric::Mae.evaluate(&pred, &truth), Err(Error::NonFinite("metric")));
    }

    #[test]
    fn parse() {
        assert_eq!("MSE".parse::<Metric>().unwrap(), Metric::Mse);
        assert!("time".parse::<Metric>().is_err());
    }
}
