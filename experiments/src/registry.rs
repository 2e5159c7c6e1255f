use std::fmt;

use common::{Capability, HyperparamSet, Hyperparams, Model, Problem};
use indexmap::IndexMap;
use models::{AutoRegressor, AutoRegressorParams, ESNParams, LastValue, RNNParams, ESN, RNN};
use problems::{
    ARMAParams, LDSParams, MackeyGlass, MackeyGlassParams, Pendulum, PendulumParams, Random,
    RandomParams, ARMA, LDS,
};

use crate::{ExperimentError, Result};

/// Whether an id refers to a problem or a model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// A data source or environment
    Problem,
    /// An online learner
    Model,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Problem => write!(f, "problem"),
            Kind::Model => write!(f, "model"),
        }
    }
}

/// What a model needs to know about the problem it will be run against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelContext {
    /// Dimension of the observations fed to `predict`
    pub input_dim: usize,
    /// Dimension of the ground truth fed to `update`
    pub output_dim: usize,
    /// Seed for any random initialization
    pub seed: u64,
}

/// Constructs a problem from merged hyperparameters and a seed
pub type ProblemBuilder = Box<dyn Fn(&Hyperparams, u64) -> common::Result<Box<dyn Problem>>>;

/// Constructs a model from merged hyperparameters and the problem context
pub type ModelBuilder =
    Box<dyn Fn(&Hyperparams, &ModelContext) -> common::Result<Box<dyn Model>>>;

/// A registered problem type
pub struct ProblemEntry {
    compatibles: &'static [Capability],
    defaults: Hyperparams,
    builder: ProblemBuilder,
}

impl ProblemEntry {
    /// The capability tags the problem offers
    #[inline(always)]
    pub fn compatibles(&self) -> &'static [Capability] {
        self.compatibles
    }

    /// The default hyperparameters
    #[inline(always)]
    pub fn defaults(&self) -> &Hyperparams {
        &self.defaults
    }
}

/// A registered model type
pub struct ModelEntry {
    compatibles: &'static [Capability],
    defaults: Hyperparams,
    uses_regressors: bool,
    builder: ModelBuilder,
}

impl ModelEntry {
    /// The capability tags the model supports
    #[inline(always)]
    pub fn compatibles(&self) -> &'static [Capability] {
        self.compatibles
    }

    /// The default hyperparameters
    #[inline(always)]
    pub fn defaults(&self) -> &Hyperparams {
        &self.defaults
    }

    /// Whether the model consumes lagged observations
    #[inline(always)]
    pub fn uses_regressors(&self) -> bool {
        self.uses_regressors
    }
}

/// Maps problem and model ids to their constructors.
/// Capability tags are recorded per id so compatibility is decided without building anything.
#[derive(Default)]
pub struct Registry {
    problems: IndexMap<String, ProblemEntry>,
    models: IndexMap<String, ModelEntry>,
}

impl Registry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every shipped problem and model
    pub fn with_defaults() -> Self {
        let mut r = Self::new();

        r.register_problem::<ARMAParams>("ARMA-v0", ARMA::COMPATIBLES, Box::new(build_arma));
        r.register_problem::<LDSParams>("LDS-v0", LDS::COMPATIBLES, Box::new(build_lds));
        r.register_problem::<RandomParams>("Random-v0", Random::COMPATIBLES, Box::new(build_random));
        r.register_problem::<MackeyGlassParams>(
            "MackeyGlass-v0",
            MackeyGlass::COMPATIBLES,
            Box::new(build_mackey_glass),
        );
        r.register_problem::<PendulumParams>(
            "Pendulum-v0",
            Pendulum::COMPATIBLES,
            Box::new(build_pendulum),
        );

        r.register_model::<RNNParams>("RNN", RNN::COMPATIBLES, true, Box::new(build_rnn));
        r.register_model::<ESNParams>("ESN", ESN::COMPATIBLES, false, Box::new(build_esn));
        r.register_model::<AutoRegressorParams>(
            "AutoRegressor",
            AutoRegressor::COMPATIBLES,
            true,
            Box::new(build_autoregressor),
        );
        r.register_model_raw(
            "LastValue",
            LastValue::COMPATIBLES,
            Hyperparams::new(),
            false,
            Box::new(build_last_value),
        );

        r
    }

    /// Register a problem whose defaults are given by a typed parameter struct
    pub fn register_problem<P: HyperparamSet>(
        &mut self,
        id: &str,
        compatibles: &'static [Capability],
        builder: ProblemBuilder,
    ) {
        self.register_problem_raw(id, compatibles, P::default().to_hyperparams(), builder)
    }

    /// Register a problem with explicit default hyperparameters, replacing any previous entry
    pub fn register_problem_raw(
        &mut self,
        id: &str,
        compatibles: &'static [Capability],
        defaults: Hyperparams,
        builder: ProblemBuilder,
    ) {
        self.problems.insert(
            id.to_string(),
            ProblemEntry {
                compatibles,
                defaults,
                builder,
            },
        );
    }

    /// Register a model whose defaults are given by a typed parameter struct
    pub fn register_model<P: HyperparamSet>(
        &mut self,
        id: &str,
        compatibles: &'static [Capability],
        uses_regressors: bool,
        builder: ModelBuilder,
    ) {
        self.register_model_raw(id, compatibles, P::default().to_hyperparams(), uses_regressors, builder)
    }

    /// Register a model with explicit default hyperparameters, replacing any previous entry
    pub fn register_model_raw(
        &mut self,
        id: &str,
        compatibles: &'static [Capability],
        defaults: Hyperparams,
        uses_regressors: bool,
        builder: ModelBuilder,
    ) {
        self.models.insert(
            id.to_string(),
            ModelEntry {
                compatibles,
                defaults,
                uses_regressors,
                builder,
            },
        );
    }

    /// Look up a problem
    pub fn problem(&self, id: &str) -> Result<&ProblemEntry> {
        self.problems.get(id).ok_or_else(|| ExperimentError::UnknownId {
            kind: Kind::Problem,
            id: id.to_string(),
        })
    }

    /// Look up a model
    pub fn model(&self, id: &str) -> Result<&ModelEntry> {
        self.models.get(id).ok_or_else(|| ExperimentError::UnknownId {
            kind: Kind::Model,
            id: id.to_string(),
        })
    }

    /// Every registered problem id, in registration order
    pub fn problem_ids(&self) -> impl Iterator<Item = &str> {
        self.problems.keys().map(|k| k.as_str())
    }

    /// Every registered model id, in registration order
    pub fn model_ids(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(|k| k.as_str())
    }

    /// Build a problem. `params` override the registered defaults key by key.
    pub fn resolve_problem(
        &self,
        id: &str,
        params: &Hyperparams,
        seed: u64,
    ) -> Result<Box<dyn Problem>> {
        let entry = self.problem(id)?;
        let merged = params.merged_over(&entry.defaults);
        debug!("building problem {} with {}", id, merged);

        (entry.builder)(&merged, seed).map_err(|source| ExperimentError::Build {
            id: id.to_string(),
            source,
        })
    }

    /// Build a model. `params` override the registered defaults key by key.
    pub fn resolve_model(
        &self,
        id: &str,
        params: &Hyperparams,
        ctx: &ModelContext,
    ) -> Result<Box<dyn Model>> {
        let entry = self.model(id)?;
        let merged = params.merged_over(&entry.defaults);
        debug!("building model {} with {}", id, merged);

        (entry.builder)(&merged, ctx).map_err(|source| ExperimentError::Build {
            id: id.to_string(),
            source,
        })
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("problems", &self.problems.keys().collect::<Vec<_>>())
            .field("models", &self.models.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn build_arma(params: &Hyperparams, seed: u64) -> common::Result<Box<dyn Problem>> {
    Ok(Box::new(ARMA::new(ARMAParams::from_hyperparams(params)?, seed)))
}

fn build_lds(params: &Hyperparams, seed: u64) -> common::Result<Box<dyn Problem>> {
    Ok(Box::new(LDS::new(LDSParams::from_hyperparams(params)?, seed)))
}

fn build_random(params: &Hyperparams, seed: u64) -> common::Result<Box<dyn Problem>> {
    Ok(Box::new(Random::new(RandomParams::from_hyperparams(params)?, seed)))
}

fn build_mackey_glass(params: &Hyperparams, seed: u64) -> common::Result<Box<dyn Problem>> {
    Ok(Box::new(MackeyGlass::new(MackeyGlassParams::from_hyperparams(params)?, seed)))
}

fn build_pendulum(params: &Hyperparams, seed: u64) -> common::Result<Box<dyn Problem>> {
    Ok(Box::new(Pendulum::new(PendulumParams::from_hyperparams(params)?, seed)))
}

fn build_rnn(params: &Hyperparams, ctx: &ModelContext) -> common::Result<Box<dyn Model>> {
    let params = RNNParams::from_hyperparams(params)?;
    Ok(Box::new(RNN::new(params, ctx.input_dim, ctx.output_dim, ctx.seed)))
}

fn build_esn(params: &Hyperparams, ctx: &ModelContext) -> common::Result<Box<dyn Model>> {
    let params = ESNParams::from_hyperparams(params)?;
    Ok(Box::new(ESN::new(params, ctx.input_dim, ctx.output_dim, ctx.seed)))
}

fn build_autoregressor(params: &Hyperparams, ctx: &ModelContext) -> common::Result<Box<dyn Model>> {
    let params = AutoRegressorParams::from_hyperparams(params)?;
    Ok(Box::new(AutoRegressor::new(params, ctx.input_dim)))
}

fn build_last_value(_params: &Hyperparams, ctx: &ModelContext) -> common::Result<Box<dyn Model>> {
    Ok(Box::new(LastValue::new(ctx.input_dim)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_registered() {
        let r = Registry::with_defaults();
        let problems: Vec<&str> = r.problem_ids().collect();
        assert_eq!(
            problems,
            vec!["ARMA-v0", "LDS-v0", "Random-v0", "MackeyGlass-v0", "Pendulum-v0"]
        );
        let models: Vec<&str> = r.model_ids().collect();
        assert_eq!(models, vec!["RNN", "ESN", "AutoRegressor", "LastValue"]);

        let rnn = r.model("RNN").unwrap();
        assert!(rnn.uses_regressors());
        assert_eq!(rnn.defaults().get_str("optimizer"), Some("OGD"));
        assert_eq!(rnn.defaults().get_str("activation"), Some("tanh"));
        assert_eq!(r.model("ESN").unwrap().defaults().get("reservoir_size"), Some(&100.into()));
    }

    #[test]
    fn unknown_ids() {
        let r = Registry::with_defaults();
        assert!(matches!(
            r.problem("Kuka-v0"),
            Err(ExperimentError::UnknownId { kind: Kind::Problem, .. })
        ));
        let ctx = ModelContext {
            input_dim: 1,
            output_dim: 1,
            seed: 0,
        };
        assert!(matches!(
            r.resolve_model("LSTM", &Hyperparams::new(), &ctx),
            Err(ExperimentError::UnknownId { kind: Kind::Model, .. })
        ));
    }

    #[test]
    fn resolve_with_overrides() {
        let r = Registry::with_defaults();
        let problem = r
            .resolve_problem("LDS-v0", &Hyperparams::new().with("m", 3_usize), 0)
            .unwrap();
        assert_eq!(problem.observation_dim(), 3);
        assert_eq!(problem.action_dim(), 2);

        let err = r
            .resolve_problem("ARMA-v0", &Hyperparams::new().with("p", "three"), 0)
            .err()
            .unwrap();
        assert!(matches!(err, ExperimentError::Build { ref id, .. } if id == "ARMA-v0"));
    }
}
