use common::{Capability, Model, Observation, Result};

use crate::check_dim;

/// Predicts that the next value equals the last observed one.
/// Serves as the naive baseline every learner should beat.
#[derive(Debug, Clone)]
pub struct LastValue {
    dim: usize,
}

impl LastValue {
    /// The capability tags of this model
    pub const COMPATIBLES: &'static [Capability] = &[Capability::TimeSeries];

    /// Create a new baseline for observations of length `dim`
    #[inline(always)]
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Model for LastValue {
    #[inline(always)]
    fn compatibles(&self) -> &'static [Capability] {
        Self::COMPATIBLES
    }

    fn predict(&mut self, x: &Observation) -> Result<Observation> {
        check_dim("last value input", x, self.dim)?;
        Ok(x.clone())
    }

    fn forecast(&mut self, x: &Observation, horizon: usize) -> Result<Vec<Observation>> {
        check_dim("last value input", x, self.dim)?;
        Ok(vec![x.clone(); horizon])
    }

    #[inline(always)]
    fn update(&mut self, _y: &Observation) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::DVector;

    use super::*;

    #[test]
    fn repeats_input() {
        let mut m = LastValue::new(2);
        let x = DVector::from_vec(vec![1.0, -2.0]);
        assert_eq!(m.predict(&x).unwrap(), x);
        assert_eq!(m.forecast(&x, 3).unwrap().len(), 3);
        assert!(m.predict(&DVector::from_vec(vec![1.0])).is_err());
    }
}
