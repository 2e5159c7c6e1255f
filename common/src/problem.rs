use crate::{Capability, Observation, Result};

/// A data source or simulated environment stepped by the harness
pub trait Problem {
    /// The capability tags this problem offers
    fn compatibles(&self) -> &'static [Capability];

    /// Dimensionality of the emitted observations
    fn observation_dim(&self) -> usize;

    /// Dimensionality of the accepted actions, 0 if the problem takes none
    fn action_dim(&self) -> usize {
        0
    }

    /// Advance by one timestep and return the new observation.
    /// Problems that take an action draw their own when `action` is `None`.
    fn step(&mut self, action: Option<&Observation>) -> Result<Observation>;

    /// Snapshot of the internal state, for diagnostics only
    fn hidden(&self) -> String;
}
