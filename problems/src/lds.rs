use common::{
    seeded_rng, Capability, Error, HyperparamSet, Observation, Problem, Result,
};
use nalgebra::{DMatrix, DVector};
use nanorand::WyRand;
use serde::{Deserialize, Serialize};

use crate::{gaussian_matrix, gaussian_vector};

/// The parameters of the linear dynamical system
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Action dimension
    pub n: usize,
    /// Observation dimension
    pub m: usize,
    /// Hidden state dimension
    pub d: usize,
    /// Standard deviation of process and observation noise
    pub noise_magnitude: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            n: 2,
            m: 2,
            d: 4,
            noise_magnitude: 0.1,
        }
    }
}

impl HyperparamSet for Params {
    fn validate(&self) -> Result<()> {
        if self.m == 0 || self.d == 0 {
            return Err(Error::invalid_param("m", "observation and hidden dims must be positive"));
        }

        Ok(())
    }
}

/// Randomly generated linear dynamical system
/// `h' = A h + B u + w`, `y = C h' + D u + v`
#[derive(Debug, Clone)]
pub struct LDS {
    params: Params,
    a: DMatrix<f64>,
    b: DMatrix<f64>,
    c: DMatrix<f64>,
    d: DMatrix<f64>,
    h: DVector<f64>,
    t: usize,
    rng: WyRand,
}

impl LDS {
    /// The capability tags of this problem
    pub const COMPATIBLES: &'static [Capability] = &[Capability::TimeSeries, Capability::Control];

    /// Create a new system. The transition matrix is scaled to a spectral norm of 0.9.
    pub fn new(params: Params, seed: u64) -> Self {
        let mut rng = seeded_rng(seed);
        let mut a = gaussian_matrix(&mut rng, params.d, params.d);
        let norm = a.singular_values().max();
        if norm > 0.0 {
            a *= 0.9 / norm;
        }
        let b = gaussian_matrix(&mut rng, params.d, params.n);
        let c = gaussian_matrix(&mut rng, params.m, params.d);
        let d = gaussian_matrix(&mut rng, params.m, params.n);
        let h = gaussian_vector(&mut rng, params.d);

        Self {
            params,
            a,
            b,
            c,
            d,
            h,
            t: 0,
            rng,
        }
    }

    /// Number of steps taken so far
    #[inline(always)]
    pub fn t(&self) -> usize {
        self.t
    }

    /// The current hidden state
    #[inline(always)]
    pub fn hidden_state(&self) -> &DVector<f64> {
        &self.h
    }
}

impl Problem for LDS {
    #[inline(always)]
    fn compatibles(&self) -> &'static [Capability] {
        Self::COMPATIBLES
    }

    #[inline(always)]
    fn observation_dim(&self) -> usize {
        self.params.m
    }

    #[inline(always)]
    fn action_dim(&self) -> usize {
        self.params.n
    }

    fn step(&mut self, action: Option<&Observation>) -> Result<Observation> {
        let u = match action {
            Some(u) if u.len() != self.params.n => {
                return Err(Error::ShapeMismatch {
                    what: "lds action",
                    expected: self.params.n,
                    got: u.len(),
                })
            }
            Some(u) => u.clone(),
            None => gaussian_vector(&mut self.rng, self.params.n),
        };
        let w = gaussian_vector(&mut self.rng, self.params.d) * self.params.noise_magnitude;
        let v = gaussian_vector(&mut self.rng, self.params.m) * self.params.noise_magnitude;

        self.h = &self.a * &self.h + &self.b * &u + w;
        let y = &self.c * &self.h + &self.d * &u + v;
        self.t += 1;
        debug!("lds step {}: y = {}", self.t, y.transpose());

        Ok(y)
    }

    fn hidden(&self) -> String {
        format!("t: {}, h: {:?}", self.t, self.h.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lds_steps() {
        if let Err(_) = pretty_env_logger::try_init() {}

        let params = Params {
            n: 5,
            m: 3,
            d: 10,
            noise_magnitude: 1.0,
        };
        let mut lds = LDS::new(params, 0);
        assert_eq!(lds.t(), 0);

        let mut rng = seeded_rng(1);
        for _ in 0..1000 {
            let u = gaussian_vector(&mut rng, 5);
            let y = lds.step(Some(&u)).unwrap();
            assert_eq!(y.len(), 3);
            assert!(y.iter().all(|v| v.is_finite()));
        }
        assert_eq!(lds.t(), 1000);
        assert_eq!(lds.hidden_state().len(), 10);
        info!("{}", lds.hidden());
    }

    #[test]
    fn wrong_action_dim() {
        let mut lds = LDS::new(Params::default(), 0);
        assert!(lds.step(Some(&DVector::zeros(7))).is_err());
        // without action one is drawn internally
        assert_eq!(lds.step(None).unwrap().len(), 2);
    }
}
