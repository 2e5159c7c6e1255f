use std::fmt;

use common::Metric;

use crate::{
    results::{MEMORY, TIME},
    run_trial, ExperimentError, ModelSpec, ProblemSpec, Registry, Result, ResultsTable,
    TrialSettings,
};

/// What an experiment asks a precomputed source for
#[derive(Debug, Clone, Copy)]
pub struct LoadRequest<'a> {
    /// The (problem, model) pairs after compatibility matching
    pub pairs: &'a [(String, String)],
    /// The requested metrics
    pub metrics: &'a [Metric],
}

/// Provider of frozen trial results
pub trait PrecomputedSource {
    /// Produce a table covering every (metric, problem, model) triple of the request.
    /// `frozen` carries the fixed seed and timestep count.
    fn load(
        &self,
        registry: &Registry,
        request: &LoadRequest<'_>,
        frozen: &TrialSettings,
    ) -> Result<ResultsTable>;
}

/// Serves a given table, e.g. one generated earlier on a reference machine
#[derive(Debug, Clone, Default)]
pub struct FrozenSource {
    table: ResultsTable,
}

impl FrozenSource {
    /// Wrap a frozen table
    pub fn new(table: ResultsTable) -> Self {
        Self { table }
    }
}

impl PrecomputedSource for FrozenSource {
    fn load(
        &self,
        _registry: &Registry,
        request: &LoadRequest<'_>,
        _frozen: &TrialSettings,
    ) -> Result<ResultsTable> {
        let mut out = ResultsTable::new();
        for metric in request.metrics {
            for (problem, model) in request.pairs {
                for name in [metric.name(), TIME, MEMORY] {
                    let value = self.table.get(name, problem, model).ok_or_else(|| {
                        ExperimentError::MissingPrecomputed {
                            metric: name.to_string(),
                            problem: problem.clone(),
                            model: model.clone(),
                        }
                    })?;
                    out.insert(crate::ResultKey::new(name, problem, model), value.clone());
                }
            }
        }

        Ok(out)
    }
}

/// Generates the frozen results on demand by running every requested triple
/// once with default hyperparameters under the fixed seed and timestep count
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneratedSource;

impl PrecomputedSource for GeneratedSource {
    fn load(
        &self,
        registry: &Registry,
        request: &LoadRequest<'_>,
        frozen: &TrialSettings,
    ) -> Result<ResultsTable> {
        let mut out = ResultsTable::new();
        for metric in request.metrics {
            for (problem, model) in request.pairs {
                let outcome = run_trial(
                    registry,
                    &ProblemSpec::new(problem),
                    &ModelSpec::new(model),
                    *metric,
                    frozen,
                );
                out.insert_outcome(metric.name(), problem, model, &outcome);
            }
        }

        Ok(out)
    }
}

/// The frozen seed, timestep count and data source of precomputed mode
pub struct PrecomputedConfig {
    key: u64,
    timesteps: usize,
    source: Box<dyn PrecomputedSource>,
}

impl PrecomputedConfig {
    /// Seed the frozen results were generated with
    pub const DEFAULT_KEY: u64 = 0;
    /// Timestep count the frozen results were generated with
    pub const DEFAULT_TIMESTEPS: usize = 1000;

    /// Create a new config
    pub fn new(key: u64, timesteps: usize, source: Box<dyn PrecomputedSource>) -> Self {
        Self {
            key,
            timesteps,
            source,
        }
    }

    /// The frozen random seed
    #[inline(always)]
    pub fn key(&self) -> u64 {
        self.key
    }

    /// The frozen timestep count
    #[inline(always)]
    pub fn timesteps(&self) -> usize {
        self.timesteps
    }

    /// Load the results of a request from the source
    pub fn load(
        &self,
        registry: &Registry,
        request: &LoadRequest<'_>,
        frozen: &TrialSettings,
    ) -> Result<ResultsTable> {
        self.source.load(registry, request, frozen)
    }
}

impl Default for PrecomputedConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_KEY, Self::DEFAULT_TIMESTEPS, Box::new(GeneratedSource))
    }
}

impl fmt::Debug for PrecomputedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrecomputedConfig")
            .field("key", &self.key)
            .field("timesteps", &self.timesteps)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ResultKey, ResultValue};

    fn frozen_settings() -> TrialSettings {
        TrialSettings {
            timesteps: 20,
            verbose: false,
            load_bar: false,
            ..Default::default()
        }
    }

    #[test]
    fn frozen_source_serves_and_rejects() {
        let mut table = ResultsTable::new();
        table.insert(ResultKey::new("mse", "ARMA-v0", "RNN"), ResultValue::Series(vec![0.5; 20]));
        table.insert(ResultKey::new("time", "ARMA-v0", "RNN"), ResultValue::Scalar(0.1));
        table.insert(ResultKey::new("memory", "ARMA-v0", "RNN"), ResultValue::Scalar(64.0));
        let source = FrozenSource::new(table.clone());
        let r = Registry::new();

        let pairs = vec![("ARMA-v0".to_string(), "RNN".to_string())];
        let request = LoadRequest {
            pairs: &pairs,
            metrics: &[Metric::Mse],
        };
        assert_eq!(source.load(&r, &request, &frozen_settings()).unwrap(), table);

        let request = LoadRequest {
            pairs: &pairs,
            metrics: &[Metric::Mae],
        };
        assert!(matches!(
            source.load(&r, &request, &frozen_settings()),
            Err(ExperimentError::MissingPrecomputed { .. })
        ));
    }

    #[test]
    fn generated_source_is_reproducible() {
        let r = Registry::with_defaults();
        let pairs = vec![("ARMA-v0".to_string(), "AutoRegressor".to_string())];
        let request = LoadRequest {
            pairs: &pairs,
            metrics: &[Metric::Mse],
        };
        let a = GeneratedSource.load(&r, &request, &frozen_settings()).unwrap();
        let b = GeneratedSource.load(&r, &request, &frozen_settings()).unwrap();
        assert_eq!(
            a.get("mse", "ARMA-v0", "AutoRegressor"),
            b.get("mse", "ARMA-v0", "AutoRegressor")
        );
        assert_eq!(a.get("mse", "ARMA-v0", "AutoRegressor").unwrap().as_series().unwrap().len(), 20);
    }

    #[test]
    fn defaults() {
        let config = PrecomputedConfig::default();
        assert_eq!(config.key(), 0);
        assert_eq!(config.timesteps(), 1000);
    }
}
