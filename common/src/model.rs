use crate::{Capability, Observation, Result};

/// An online learner evaluated by the harness
pub trait Model {
    /// The capability tags this model supports
    fn compatibles(&self) -> &'static [Capability];

    /// Whether the model consumes a window of lagged observations
    fn uses_regressors(&self) -> bool {
        false
    }

    /// Predict the next value given the current observation
    fn predict(&mut self, x: &Observation) -> Result<Observation>;

    /// Forecast `horizon` values into the future given the current observation.
    /// Advances the model state exactly like [`Model::predict`].
    fn forecast(&mut self, x: &Observation, horizon: usize) -> Result<Vec<Observation>>;

    /// Feed back the observed ground truth for the last prediction
    fn update(&mut self, y: &Observation) -> Result<()>;
}
