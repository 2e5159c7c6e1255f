use serde::{Deserialize, Serialize};

/// The possible activation functions applied inside the shipped learners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    /// The identity function
    Identity,
    /// The hyperbolic tangent
    Tanh,
    /// The rectified linear unit
    Relu,
    /// The logistic function
    Sigmoid,
}

impl Activation {
    /// Perform the activation function over all elements
    pub fn activate(&self, vals: &mut [f64]) {
        match self {
            Activation::Identity => {}
            Activation::Tanh => {
                for v in vals {
                    *v = v.tanh();
                }
            }
            Activation::Relu => {
                for v in vals {
                    if *v < 0.0 {
                        *v = 0.0;
                    }
                }
            }
            Activation::Sigmoid => {
                for v in vals {
                    *v = 1.0 / (1.0 + (-*v).exp());
                }
            }
        }
    }

    /// Derivative of the activation, expressed through its already activated output
    #[inline]
    pub fn derivative_from_output(&self, y: f64) -> f64 {
        match self {
            Activation::Identity => 1.0,
            Activation::Tanh => 1.0 - y * y,
            Activation::Relu => {
                if y > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Sigmoid => y * (1.0 - y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relu_clamps_negatives() {
        let mut vals = [-1.0, 0.5, -0.0, 2.0];
        Activation::Relu.activate(&mut vals);
        assert_eq!(vals, [0.0, 0.5, -0.0, 2.0]);
    }

    #[test]
    fn named_in_lowercase() {
        let act: Activation = serde_json::from_value(serde_json::json!("sigmoid")).unwrap();
        assert_eq!(act, Activation::Sigmoid);
        assert_eq!(serde_json::to_value(Activation::Identity).unwrap(), "identity");
        assert!(serde_json::from_value::<Activation>(serde_json::json!("softmax")).is_err());
    }

    #[test]
    fn sigmoid_derivative() {
        let mut vals = [0.0];
        Activation::Sigmoid.activate(&mut vals);
        assert_eq!(vals[0], 0.5);
        assert_eq!(Activation::Sigmoid.derivative_from_output(vals[0]), 0.25);
        assert_eq!(Activation::Identity.derivative_from_output(-3.0), 1.0);
    }

    #[test]
    fn tanh_derivative() {
        let mut vals = [0.3];
        Activation::Tanh.activate(&mut vals);
        let d = Activation::Tanh.derivative_from_output(vals[0]);
        let expected = 1.0 / 0.3_f64.cosh().powi(2);
        assert!((d - expected).abs() < 1e-12);
    }
}
