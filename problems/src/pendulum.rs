use common::{seeded_rng, Capability, Error, HyperparamSet, Observation, Problem, Result};
use nalgebra::DVector;
use nanorand::{Rng, WyRand};
use serde::{Deserialize, Serialize};

/// The parameters of the pendulum simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Integration step in seconds
    pub dt: f64,
    /// Gravitational acceleration
    pub gravity: f64,
    /// Length of the rod
    pub length: f64,
    /// Mass at the tip
    pub mass: f64,
    /// Viscous friction coefficient
    pub damping: f64,
    /// Torques are clamped to `[-max_torque, max_torque]`
    pub max_torque: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            dt: 0.05,
            gravity: 10.0,
            length: 1.0,
            mass: 1.0,
            damping: 0.1,
            max_torque: 2.0,
        }
    }
}

impl HyperparamSet for Params {
    fn validate(&self) -> Result<()> {
        if self.length <= 0.0 || self.mass <= 0.0 {
            return Err(Error::invalid_param("length", "length and mass must be positive"));
        }

        Ok(())
    }
}

/// Damped pendulum driven by a torque, integrated with explicit euler steps.
/// Observations are `(cos theta, sin theta, omega)`.
#[derive(Debug, Clone)]
pub struct Pendulum {
    params: Params,
    theta: f64,
    omega: f64,
    t: usize,
    rng: WyRand,
}

impl Pendulum {
    /// The capability tags of this problem
    pub const COMPATIBLES: &'static [Capability] = &[Capability::Control];

    /// Create a new pendulum at a random angle
    pub fn new(params: Params, seed: u64) -> Self {
        let mut rng = seeded_rng(seed);
        let theta = (rng.generate::<f64>() * 2.0 - 1.0) * std::f64::consts::PI;

        Self {
            params,
            theta,
            omega: 0.0,
            t: 0,
            rng,
        }
    }

    fn observation(&self) -> Observation {
        DVector::from_vec(vec![self.theta.cos(), self.theta.sin(), self.omega])
    }
}

impl Problem for Pendulum {
    #[inline(always)]
    fn compatibles(&self) -> &'static [Capability] {
        Self::COMPATIBLES
    }

    #[inline(always)]
    fn observation_dim(&self) -> usize {
        3
    }

    #[inline(always)]
    fn action_dim(&self) -> usize {
        1
    }

    fn step(&mut self, action: Option<&Observation>) -> Result<Observation> {
        let p = &self.params;
        let torque = match action {
            Some(u) if u.len() != 1 => {
                return Err(Error::ShapeMismatch {
                    what: "pendulum action",
                    expected: 1,
                    got: u.len(),
                })
            }
            Some(u) => u[0],
            None => (self.rng.generate::<f64>() * 2.0 - 1.0) * p.max_torque,
        }
        .clamp(-p.max_torque, p.max_torque);

        let alpha = -p.gravity / p.length * self.theta.sin()
            + torque / (p.mass * p.length * p.length)
            - p.damping * self.omega;
        self.omega += alpha * p.dt;
        self.theta += self.omega * p.dt;
        self.t += 1;

        Ok(self.observation())
    }

    fn hidden(&self) -> String {
        format!("t: {}, theta: {}, omega: {}", self.t, self.theta, self.omega)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damping_dissipates_energy() {
        let params = Params::default();
        let mut pendulum = Pendulum::new(params, 2);
        let zero = DVector::zeros(1);
        let energy = |p: &Pendulum| 0.5 * p.omega.powi(2) + 10.0 * (1.0 - p.theta.cos());
        let e0 = energy(&pendulum);
        for _ in 0..2000 {
            let obs = pendulum.step(Some(&zero)).unwrap();
            assert_eq!(obs.len(), 3);
        }
        assert!(energy(&pendulum) < e0);
    }
}
