use nanorand::{Rng, WyRand};

/// Create the random number generator used by problems and models.
/// Every stochastic component is seeded so that a trial is reproducible.
#[inline]
pub fn seeded_rng(seed: u64) -> WyRand {
    WyRand::new_seed(seed)
}

/// Draw a standard normal sample using the Box-Muller transform
pub fn gaussian(rng: &mut WyRand) -> f64 {
    // 1 - u keeps the argument of ln inside (0, 1]
    let u1 = 1.0 - rng.generate::<f64>();
    let u2 = rng.generate::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gaussian_is_reproducible() {
        let mut a = seeded_rng(7);
        let mut b = seeded_rng(7);
        for _ in 0..100 {
            assert_eq!(gaussian(&mut a), gaussian(&mut b));
        }
    }

    #[test]
    fn gaussian_moments() {
        let mut rng = seeded_rng(0);
        let n = 20_000;
        let samples: Vec<f64> = (0..n).map(|_| gaussian(&mut rng)).collect();
        let mean = samples.iter().sum::<f64>() / n as f64;
        let var = samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.05, "mean: {}", mean);
        assert!((var - 1.0).abs() < 0.05, "var: {}", var);
    }
}
