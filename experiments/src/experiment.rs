use std::{collections::HashMap, path::Path};

use bench_plot::{graph, Panel};
use common::{Hyperparams, Metric};
use indexmap::IndexMap;

use crate::{
    compatibility::pairs,
    precomputed::LoadRequest,
    results::{MEMORY, TIME},
    run_trial, ExperimentConfig, ExperimentError, Kind, ModelSpec, PrecomputedConfig, ProblemSpec,
    Registry, Restriction, Result, ResultsTable, Scoreboard, TrialSettings,
};

/// Lifecycle of an [`Experiment`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// `initialize` was not called yet
    Uninitialized,
    /// Results of the configured problems and models are available
    Initialized,
    /// At least one model was added after initialization
    Augmented,
}

/// State created by `initialize`
#[derive(Debug)]
struct State {
    problems: IndexMap<String, ProblemSpec>,
    models: IndexMap<String, ModelSpec>,
    restriction: Option<Restriction>,
    metrics: Vec<Metric>,
    use_precomputed: bool,
    settings: TrialSettings,
    results: ResultsTable,
    /// Anonymous re-additions per model id
    duplicates: HashMap<String, usize>,
    added: Vec<String>,
}

/// Runs every compatible (problem, model) pair under every metric and keeps the results.
/// Execution is strictly sequential, one trial after the other.
#[derive(Debug)]
pub struct Experiment {
    registry: Registry,
    precomputed: PrecomputedConfig,
    state: Option<State>,
    phase: Phase,
}

impl Default for Experiment {
    fn default() -> Self {
        Self::new(Registry::with_defaults(), PrecomputedConfig::default())
    }
}

impl Experiment {
    /// Create a new uninitialized experiment
    pub fn new(registry: Registry, precomputed: PrecomputedConfig) -> Self {
        Self {
            registry,
            precomputed,
            state: None,
            phase: Phase::Uninitialized,
        }
    }

    /// The current lifecycle phase
    #[inline(always)]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The registry ids are resolved against
    #[inline(always)]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Run or load the results of `config`, replacing all prior state
    pub fn initialize(&mut self, config: ExperimentConfig) -> Result<()> {
        self.state = None;
        self.phase = Phase::Uninitialized;

        let metrics = parse_metrics(&config.metrics)?;
        if config.horizon == 0 {
            return Err(ExperimentError::InvalidConfig("horizon must be at least 1".to_string()));
        }

        let mut problem_params = config.problems.normalize();
        let mut model_params = config.models.normalize();
        for id in problem_params.keys() {
            self.registry.problem(id)?;
        }
        for id in model_params.keys() {
            self.registry.model(id)?;
        }

        let mut settings = TrialSettings {
            seed: config.seed,
            timesteps: config.timesteps,
            horizon: config.horizon,
            verbose: config.verbose,
            load_bar: config.load_bar,
            timeout: config.trial_timeout,
        };
        if config.use_precomputed {
            if config.timesteps != self.precomputed.timesteps() {
                warn!(
                    "when using precomputed results the number of timesteps is fixed to {}, ignoring {}",
                    self.precomputed.timesteps(),
                    config.timesteps
                );
            }
            if config.problems.has_explicit_params() {
                warn!("when using precomputed results, specified problem hyperparameters are disregarded and defaults are used instead");
            }
            if config.models.has_explicit_params() {
                warn!("when using precomputed results, specified model hyperparameters are disregarded and defaults are used instead");
            }
            problem_params.values_mut().for_each(|p| *p = Hyperparams::new());
            model_params.values_mut().for_each(|p| *p = Hyperparams::new());
            settings.seed = self.precomputed.key();
            settings.timesteps = self.precomputed.timesteps();
        }

        let problems: IndexMap<String, ProblemSpec> = problem_params
            .into_iter()
            .map(|(id, params)| (id.clone(), ProblemSpec::new(&id).with_params(params)))
            .collect();
        let models: IndexMap<String, ModelSpec> = model_params
            .into_iter()
            .map(|(id, params)| {
                let mut spec = ModelSpec::new(&id).with_params(params);
                spec.uses_regressors = self.registry.model(&id).map(|e| e.uses_regressors())?;
                Ok((id, spec))
            })
            .collect::<Result<_>>()?;

        let problem_ids: Vec<String> = problems.keys().cloned().collect();
        let model_ids: Vec<String> = models.keys().cloned().collect();
        let pairs = pairs(&self.registry, &problem_ids, &model_ids, config.restriction.as_ref())?;
        info!(
            "initializing experiment with {} problems, {} models, {} pairs and metrics {:?}",
            problem_ids.len(),
            model_ids.len(),
            pairs.len(),
            config.metrics
        );

        let results = if config.use_precomputed {
            let request = LoadRequest {
                pairs: &pairs,
                metrics: &metrics,
            };
            self.precomputed.load(&self.registry, &request, &settings)?
        } else {
            let mut results = ResultsTable::new();
            for metric in metrics.iter() {
                for (problem_id, model_id) in pairs.iter() {
                    let (problem, model) = match (problems.get(problem_id), models.get(model_id)) {
                        (Some(p), Some(m)) => (p, m),
                        _ => continue,
                    };
                    let outcome = run_trial(&self.registry, problem, model, *metric, &settings);
                    results.insert_outcome(metric.name(), problem_id, model_id, &outcome);
                }
            }
            results
        };

        self.state = Some(State {
            problems,
            models,
            restriction: config.restriction,
            metrics,
            use_precomputed: config.use_precomputed,
            settings,
            results,
            duplicates: HashMap::new(),
            added: vec![],
        });
        self.phase = Phase::Initialized;

        Ok(())
    }

    /// Evaluate another model on every problem of the experiment under every metric.
    /// Returns the key the results are stored under.
    ///
    /// The key is `model_id` if the id is new to the experiment. Otherwise it is
    /// `model_id-name`, where the name is `name` or the text of an `optimizer`
    /// hyperparameter, or `model_id-<n>` with a per id counter if there is no name.
    pub fn add_model(
        &mut self,
        model_id: &str,
        model_params: Hyperparams,
        name: Option<&str>,
    ) -> Result<String> {
        let state = self.state.as_mut().ok_or(ExperimentError::NotInitialized)?;
        let entry = self.registry.model(model_id)?;

        let name = name
            .map(|n| n.to_string())
            .or_else(|| model_params.get_str("optimizer").map(|o| o.to_string()));
        let key = if !state.models.contains_key(model_id) {
            model_id.to_string()
        } else if let Some(name) = name.as_ref() {
            format!("{}-{}", model_id, name)
        } else {
            // skip counter values already taken by an explicit name
            let n = state.duplicates.entry(model_id.to_string()).or_insert(0);
            loop {
                *n += 1;
                let key = format!("{}-{}", model_id, n);
                if !state.models.contains_key(&key) {
                    break key;
                }
            }
        };
        if state.models.contains_key(&key) {
            warn!("model key {} already exists, its results will be replaced", key);
        }
        info!("adding model {} as {} with {}", model_id, key, model_params);

        let spec = ModelSpec {
            id: model_id.to_string(),
            key: key.clone(),
            params: model_params,
            name,
            uses_regressors: entry.uses_regressors(),
        };

        let mut pending = ResultsTable::new();
        for metric in state.metrics.iter() {
            for problem in state.problems.values() {
                let outcome = run_trial(&self.registry, problem, &spec, *metric, &state.settings);
                pending.insert_outcome(metric.name(), &problem.id, &key, &outcome);
            }
        }

        state.results.merge(pending);
        state.models.insert(key.clone(), spec);
        state.added.push(key.clone());
        self.phase = Phase::Augmented;

        Ok(key)
    }

    /// All results gathered so far
    pub fn results(&self) -> Result<&ResultsTable> {
        Ok(&self.state()?.results)
    }

    /// Problem ids in configuration order
    pub fn problem_ids(&self) -> Result<Vec<String>> {
        Ok(self.state()?.problems.keys().cloned().collect())
    }

    /// Model keys in configuration order followed by added models
    pub fn model_ids(&self) -> Result<Vec<String>> {
        Ok(self.state()?.models.keys().cloned().collect())
    }

    /// Description of a model key, including added models
    pub fn model_spec(&self, key: &str) -> Result<Option<&ModelSpec>> {
        Ok(self.state()?.models.get(key))
    }

    /// The restriction given at initialization
    pub fn restriction(&self) -> Result<Option<&Restriction>> {
        Ok(self.state()?.restriction.as_ref())
    }

    /// The effective trial settings, with the frozen values in precomputed mode
    pub fn settings(&self) -> Result<&TrialSettings> {
        Ok(&self.state()?.settings)
    }

    /// Mean score per (problem, model) for `metric`, which may also be `time` or `memory`
    pub fn scoreboard(&self, metric: &str) -> Result<Scoreboard> {
        let state = self.state()?;
        let known = state.metrics.iter().any(|m| m.name() == metric);
        if !known && metric != TIME && metric != MEMORY {
            return Err(ExperimentError::InvalidConfig(format!(
                "metric `{}` was not evaluated in this experiment",
                metric
            )));
        }
        if state.use_precomputed && metric == TIME && !state.added.is_empty() {
            warn!("time comparison between precomputed models and added models may be irrelevant due to hardware differences");
        }

        let problems: Vec<String> = state.problems.keys().cloned().collect();
        let models: Vec<String> = state.models.keys().cloned().collect();

        Ok(Scoreboard::new(&state.results, metric, &problems, &models))
    }

    /// Plot the loss curves of `metric`, one subplot per problem and one line per model,
    /// and save the figure to `save_as`. Failed trials are left out.
    pub fn graph<P: AsRef<Path>>(
        &self,
        problem_ids: Option<&[&str]>,
        metric: &str,
        save_as: P,
        dims: (u32, u32),
    ) -> Result<()> {
        let state = self.state()?;
        if !state.metrics.iter().any(|m| m.name() == metric) {
            return Err(ExperimentError::InvalidConfig(format!(
                "metric `{}` was not evaluated in this experiment",
                metric
            )));
        }

        let problem_ids: Vec<String> = match problem_ids {
            Some(ids) => ids.iter().map(|id| id.to_string()).collect(),
            None => state.problems.keys().cloned().collect(),
        };
        if let Some(unknown) = problem_ids.iter().find(|id| !state.problems.contains_key(id.as_str())) {
            return Err(ExperimentError::UnknownId {
                kind: Kind::Problem,
                id: unknown.clone(),
            });
        }
        let panels: Vec<Panel> = problem_ids
            .iter()
            .map(|problem| {
                let mut panel = Panel::new(format!("Problem: {}", problem));
                for model in state.models.keys() {
                    if state.results.failed(problem, model) {
                        continue;
                    }
                    if let Some(series) = state.results.get(metric, problem, model).and_then(|v| v.as_series()) {
                        let points = series.iter().enumerate().map(|(t, v)| (t as f64, *v)).collect();
                        panel.push_line(model.as_str(), points);
                    }
                }
                panel
            })
            .collect();

        let path = save_as.as_ref().to_string_lossy().to_string();
        graph(&panels, metric, &path, dims)?;

        Ok(())
    }

    fn state(&self) -> Result<&State> {
        self.state.as_ref().ok_or(ExperimentError::NotInitialized)
    }
}

fn parse_metrics(names: &[String]) -> Result<Vec<Metric>> {
    if names.is_empty() {
        return Err(ExperimentError::InvalidConfig("at least one metric is required".to_string()));
    }
    names
        .iter()
        .map(|name| {
            if Metric::RESERVED.contains(&name.as_str()) {
                return Err(ExperimentError::InvalidConfig(format!(
                    "`{}` is a reserved pseudo metric",
                    name
                )));
            }
            name.parse::<Metric>()
                .map_err(|e| ExperimentError::InvalidConfig(e.to_string()))
        })
        .collect()
}
