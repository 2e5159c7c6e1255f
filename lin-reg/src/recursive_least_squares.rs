use nalgebra::{DMatrix, DVector};

/// Online least squares estimator of `y = w^T x`.
/// Each call to `update` costs O(d^2) and observations are weighted down
/// geometrically by the forgetting factor.
#[derive(Debug, Clone)]
pub struct RecursiveLeastSquares {
    weights: DVector<f64>,
    /// Inverse correlation matrix estimate
    p: DMatrix<f64>,
    forgetting_factor: f64,
}

impl RecursiveLeastSquares {
    /// Create a new estimator
    ///
    /// # Arguments:
    /// dim: Number of regressors
    /// forgetting_factor: In (0, 1], 1 weights all observations equally
    /// delta: Initial scale of the inverse correlation matrix, large values mean weak priors
    pub fn new(dim: usize, forgetting_factor: f64, delta: f64) -> Self {
        Self {
            weights: DVector::zeros(dim),
            p: DMatrix::from_diagonal_element(dim, dim, delta),
            forgetting_factor,
        }
    }

    /// The current weights
    #[inline(always)]
    pub fn weights(&self) -> &DVector<f64> {
        &self.weights
    }

    /// Number of regressors
    #[inline(always)]
    pub fn dim(&self) -> usize {
        self.weights.len()
    }

    /// Prediction for the regressors `x`
    #[inline]
    pub fn predict(&self, x: &DVector<f64>) -> f64 {
        self.weights.dot(x)
    }

    /// Incorporate one observation and return the a priori error
    pub fn update(&mut self, x: &DVector<f64>, y: f64) -> f64 {
        let px = &self.p * x;
        let denom = self.forgetting_factor + x.dot(&px);
        let gain = &px / denom;
        let err = y - self.weights.dot(x);
        self.weights += &gain * err;
        self.p = (&self.p - &gain * px.transpose()) / self.forgetting_factor;
        debug!("rls error: {}, gain norm: {}", err, gain.norm());

        err
    }
}

#[cfg(test)]
mod tests {
    use round::round;

    use super::*;

    #[test]
    fn converges_to_linear_relation() {
        if let Err(_) = pretty_env_logger::try_init() {}

        let mut rls = RecursiveLeastSquares::new(3, 1.0, 1000.0);
        for i in 0..200 {
            let t = i as f64 * 0.1;
            let x = DVector::from_vec(vec![1.0, t, t.sin()]);
            let y = 2.0 + 1.5 * t - 0.8 * t.sin();
            rls.update(&x, y);
        }
        let w: Vec<f64> = rls.weights().iter().map(|v| round(*v, 3)).collect();
        assert_eq!(w, vec![2.0, 1.5, -0.8]);
    }

    #[test]
    fn forgetting_tracks_change() {
        if let Err(_) = pretty_env_logger::try_init() {}

        let mut rls = RecursiveLeastSquares::new(1, 0.9, 100.0);
        let x = DVector::from_vec(vec![1.0]);
        for _ in 0..100 {
            rls.update(&x, 1.0);
        }
        for _ in 0..100 {
            rls.update(&x, -1.0);
        }
        assert!((rls.predict(&x) + 1.0).abs() < 1e-3);
    }
}
