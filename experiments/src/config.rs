use std::time::Duration;

use crate::{Restriction, Selection};

/// Everything `Experiment::initialize` needs, built with chained setters
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentConfig {
    /// Problem ids, optionally with hyperparameters
    pub problems: Selection,
    /// Model ids, optionally with hyperparameters
    pub models: Selection,
    /// Optional problem to models restriction of the cross product
    pub restriction: Option<Restriction>,
    /// Metric names to evaluate
    pub metrics: Vec<String>,
    /// Load frozen results instead of running trials
    pub use_precomputed: bool,
    /// Number of scored steps per trial, ignored in precomputed mode
    pub timesteps: usize,
    /// Log trial start and end
    pub verbose: bool,
    /// Log progress every tenth of a trial
    pub load_bar: bool,
    /// Seed for problems and models in fresh mode
    pub seed: u64,
    /// Forecast horizon
    pub horizon: usize,
    /// Optional wall clock limit per trial
    pub trial_timeout: Option<Duration>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            problems: Selection::default(),
            models: Selection::default(),
            restriction: None,
            metrics: vec!["mse".to_string()],
            use_precomputed: true,
            timesteps: 100,
            verbose: true,
            load_bar: true,
            seed: 0,
            horizon: 1,
            trial_timeout: None,
        }
    }
}

impl ExperimentConfig {
    /// Start from the defaults with the given problems and models
    pub fn new(problems: impl Into<Selection>, models: impl Into<Selection>) -> Self {
        Self {
            problems: problems.into(),
            models: models.into(),
            ..Default::default()
        }
    }

    /// Restrict the pairs that are run
    pub fn restriction(mut self, restriction: Restriction) -> Self {
        self.restriction = Some(restriction);
        self
    }

    /// Set the metrics to evaluate
    pub fn metrics(mut self, metrics: &[&str]) -> Self {
        self.metrics = metrics.iter().map(|m| m.to_string()).collect();
        self
    }

    /// Choose between precomputed and fresh mode
    pub fn use_precomputed(mut self, use_precomputed: bool) -> Self {
        self.use_precomputed = use_precomputed;
        self
    }

    /// Set the number of timesteps per trial
    pub fn timesteps(mut self, timesteps: usize) -> Self {
        self.timesteps = timesteps;
        self
    }

    /// Toggle trial start and end logging
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Toggle progress logging
    pub fn load_bar(mut self, load_bar: bool) -> Self {
        self.load_bar = load_bar;
        self
    }

    /// Set the seed of fresh trials
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the forecast horizon
    pub fn horizon(mut self, horizon: usize) -> Self {
        self.horizon = horizon;
        self
    }

    /// Set a per trial time limit
    pub fn trial_timeout(mut self, timeout: Duration) -> Self {
        self.trial_timeout = Some(timeout);
        self
    }
}
