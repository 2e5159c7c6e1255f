use std::collections::VecDeque;

use common::{
    gaussian, seeded_rng, Capability, Error, HyperparamSet, Observation, Problem,
    Result,
};
use nalgebra::DVector;
use nanorand::WyRand;
use serde::{Deserialize, Serialize};

/// The parameters of the ARMA process
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Order of the autoregressive part, ignored if `phi` is given
    pub p: usize,
    /// Order of the moving average part, ignored if `psi` is given
    pub q: usize,
    /// Fixed autoregressive coefficients
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phi: Option<Vec<f64>>,
    /// Fixed moving average coefficients
    #[serde(skip_serializing_if = "Option::is_none")]
    pub psi: Option<Vec<f64>>,
    /// Fixed constant drift, drawn at random if absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c: Option<f64>,
    /// Standard deviation of the innovations
    pub noise_magnitude: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            p: 3,
            q: 3,
            phi: None,
            psi: None,
            c: None,
            noise_magnitude: 0.1,
        }
    }
}

impl HyperparamSet for Params {
    fn validate(&self) -> Result<()> {
        if self.noise_magnitude < 0.0 {
            return Err(Error::invalid_param("noise_magnitude", "must not be negative"));
        }

        Ok(())
    }
}

/// Scalar autoregressive moving average process
/// `x_t = c + sum_i phi_i x_{t-i} + sum_j psi_j e_{t-j} + e_t`
#[derive(Debug, Clone)]
pub struct ARMA {
    phi: Vec<f64>,
    psi: Vec<f64>,
    c: f64,
    noise_magnitude: f64,
    /// Most recent value first
    x: VecDeque<f64>,
    /// Most recent innovation first
    noise: VecDeque<f64>,
    t: usize,
    rng: WyRand,
}

impl ARMA {
    /// The capability tags of this problem
    pub const COMPATIBLES: &'static [Capability] = &[Capability::TimeSeries];

    /// Create a new process. Random coefficients are scaled so that the AR part is stable.
    pub fn new(params: Params, seed: u64) -> Self {
        let mut rng = seeded_rng(seed);
        let phi = params.phi.unwrap_or_else(|| {
            let raw: Vec<f64> = (0..params.p).map(|_| gaussian(&mut rng)).collect();
            let l1 = raw.iter().map(|v| v.abs()).sum::<f64>();
            if l1 > 0.0 {
                raw.iter().map(|v| v / (1.1 * l1)).collect()
            } else {
                raw
            }
        });
        let psi = params
            .psi
            .unwrap_or_else(|| (0..params.q).map(|_| gaussian(&mut rng)).collect());
        let c = params.c.unwrap_or_else(|| gaussian(&mut rng));
        let x = (0..phi.len()).map(|_| gaussian(&mut rng)).collect();
        let noise = (0..psi.len())
            .map(|_| params.noise_magnitude * gaussian(&mut rng))
            .collect();

        Self {
            phi,
            psi,
            c,
            noise_magnitude: params.noise_magnitude,
            x,
            noise,
            t: 0,
            rng,
        }
    }

    /// Number of steps taken so far
    #[inline(always)]
    pub fn t(&self) -> usize {
        self.t
    }

    /// The autoregressive coefficients in use
    #[inline(always)]
    pub fn phi(&self) -> &[f64] {
        &self.phi
    }
}

impl Problem for ARMA {
    #[inline(always)]
    fn compatibles(&self) -> &'static [Capability] {
        Self::COMPATIBLES
    }

    #[inline(always)]
    fn observation_dim(&self) -> usize {
        1
    }

    fn step(&mut self, action: Option<&Observation>) -> Result<Observation> {
        if action.is_some() {
            return Err(Error::Unsupported("ARMA-v0 takes no action".to_string()));
        }
        let x_ar: f64 = self.phi.iter().zip(self.x.iter()).map(|(a, b)| a * b).sum();
        let x_ma: f64 = self.psi.iter().zip(self.noise.iter()).map(|(a, b)| a * b).sum();
        let eps = self.noise_magnitude * gaussian(&mut self.rng);
        let x_new = self.c + x_ar + x_ma + eps;

        if !self.x.is_empty() {
            let _ = self.x.pop_back();
            self.x.push_front(x_new);
        }
        if !self.noise.is_empty() {
            let _ = self.noise.pop_back();
            self.noise.push_front(eps);
        }
        self.t += 1;

        Ok(DVector::from_element(1, x_new))
    }

    fn hidden(&self) -> String {
        format!("t: {}, x: {:?}, noise: {:?}", self.t, self.x, self.noise)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_and_reproducible() {
        let run = || {
            let mut arma = ARMA::new(Params::default(), 5);
            (0..1000).map(|_| arma.step(None).unwrap()[0]).collect::<Vec<f64>>()
        };
        let a = run();
        assert_eq!(a, run());
        assert!(a.iter().all(|v| v.is_finite() && v.abs() < 1e3));
    }

    #[test]
    fn fixed_coefficients() {
        let params = Params {
            phi: Some(vec![0.5]),
            psi: Some(vec![]),
            c: Some(1.0),
            noise_magnitude: 0.0,
            ..Default::default()
        };
        let mut arma = ARMA::new(params, 0);
        for _ in 0..200 {
            arma.step(None).unwrap();
        }
        // fixed point of x = 1 + 0.5 x
        let x = arma.step(None).unwrap()[0];
        assert!((x - 2.0).abs() < 1e-9);
        assert_eq!(arma.t(), 201);
    }

    #[test]
    fn params_from_hyperparams() {
        let hp = common::Hyperparams::new().with("phi", vec![0.5, 0.1]).with("c", 0.2);
        let params = Params::from_hyperparams(&hp).unwrap();
        assert_eq!(params.phi, Some(vec![0.5, 0.1]));
        assert_eq!(params.psi, None);
        assert_eq!(params.p, 3);

        let written = params.to_hyperparams();
        assert!(written.contains("phi"));
        assert!(!written.contains("psi"));

        let hp = common::Hyperparams::new().with("noise_magnitude", -1.0);
        assert!(Params::from_hyperparams(&hp).is_err());
    }

    #[test]
    fn random_phi_is_stable() {
        let arma = ARMA::new(Params::default(), 9);
        assert!(arma.phi().iter().map(|v| v.abs()).sum::<f64>() < 1.0);
    }

    #[test]
    fn rejects_actions() {
        let mut arma = ARMA::new(Params::default(), 0);
        assert!(arma.step(Some(&DVector::zeros(1))).is_err());
    }
}
