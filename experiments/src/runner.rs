use std::{
    collections::VecDeque,
    fmt,
    panic::{self, AssertUnwindSafe},
    time::{Duration, Instant},
};

use common::{intersects, Metric, Model, Observation, Problem};

use crate::{MemoryProbe, ModelContext, ModelSpec, ProblemSpec, Registry};

/// Settings shared by every trial of an experiment
#[derive(Debug, Clone, PartialEq)]
pub struct TrialSettings {
    /// Seed handed to problem and model construction
    pub seed: u64,
    /// Number of scored steps
    pub timesteps: usize,
    /// Forecast horizon, 1 means plain one step ahead prediction
    pub horizon: usize,
    /// Log trial start and end
    pub verbose: bool,
    /// Log progress every tenth of a trial
    pub load_bar: bool,
    /// Abort a trial that runs longer than this, checked between steps
    pub timeout: Option<Duration>,
}

impl Default for TrialSettings {
    fn default() -> Self {
        Self {
            seed: 0,
            timesteps: 100,
            horizon: 1,
            verbose: true,
            load_bar: true,
            timeout: None,
        }
    }
}

/// Measurements of a completed trial
#[derive(Debug, Clone, PartialEq)]
pub struct TrialResult {
    /// Metric value per timestep
    pub loss: Vec<f64>,
    /// Wall clock seconds spent in the step loop
    pub time: f64,
    /// Peak heap bytes above the level before the loop
    pub memory: usize,
}

/// Why a trial did not complete
#[derive(Debug, Clone, PartialEq)]
pub enum TrialFailure {
    /// Problem and model share no capability tag
    Incompatible,
    /// Problem or model could not be constructed
    Build(String),
    /// A step, prediction, metric or update returned an error
    Step {
        /// Timestep of the failure
        t: usize,
        /// Error description
        reason: String,
    },
    /// Problem or model code panicked
    Panicked(String),
    /// The trial exceeded its time limit
    TimedOut {
        /// Timesteps completed before giving up
        t: usize,
    },
}

impl fmt::Display for TrialFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrialFailure::Incompatible => write!(f, "model and problem are not compatible"),
            TrialFailure::Build(reason) => write!(f, "construction failed: {}", reason),
            TrialFailure::Step { t, reason } => write!(f, "failed at step {}: {}", t, reason),
            TrialFailure::Panicked(msg) => write!(f, "panicked: {}", msg),
            TrialFailure::TimedOut { t } => write!(f, "timed out after {} steps", t),
        }
    }
}

/// Result of a single trial. A failed trial is stored as the sentinel `(0, -1, -1)`.
#[derive(Debug, Clone, PartialEq)]
pub enum TrialOutcome {
    /// The loop ran to the end
    Completed(TrialResult),
    /// The loop could not be run or was aborted
    Failed(TrialFailure),
}

impl TrialOutcome {
    /// Whether the trial ran to the end
    #[inline(always)]
    pub fn is_completed(&self) -> bool {
        matches!(self, TrialOutcome::Completed(_))
    }
}

/// Run one (problem, model, metric) trial with freshly built instances.
/// Never panics and never returns an error, failures become [`TrialOutcome::Failed`].
pub fn run_trial(
    registry: &Registry,
    problem: &ProblemSpec,
    model: &ModelSpec,
    metric: Metric,
    settings: &TrialSettings,
) -> TrialOutcome {
    if settings.verbose {
        info!("running {} on {} with metric {}", model.key, problem.id, metric);
    }

    let outcome = match panic::catch_unwind(AssertUnwindSafe(|| {
        drive(registry, problem, model, metric, settings)
    })) {
        Ok(Ok(result)) => TrialOutcome::Completed(result),
        Ok(Err(failure)) => TrialOutcome::Failed(failure),
        Err(payload) => {
            let msg = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic payload".to_string());
            TrialOutcome::Failed(TrialFailure::Panicked(msg))
        }
    };

    match &outcome {
        TrialOutcome::Completed(r) => {
            if settings.verbose {
                info!(
                    "finished {} on {} in {:.3}s, peak memory {} bytes",
                    model.key, problem.id, r.time, r.memory
                );
            }
        }
        TrialOutcome::Failed(failure) => {
            error!("could not run {} on {}: {}", model.key, problem.id, failure);
        }
    }

    outcome
}

fn drive(
    registry: &Registry,
    problem_spec: &ProblemSpec,
    model_spec: &ModelSpec,
    metric: Metric,
    settings: &TrialSettings,
) -> Result<TrialResult, TrialFailure> {
    let problem_entry = registry
        .problem(&problem_spec.id)
        .map_err(|e| TrialFailure::Build(e.to_string()))?;
    let model_entry = registry
        .model(&model_spec.id)
        .map_err(|e| TrialFailure::Build(e.to_string()))?;
    if !intersects(problem_entry.compatibles(), model_entry.compatibles()) {
        return Err(TrialFailure::Incompatible);
    }

    let mut problem = registry
        .resolve_problem(&problem_spec.id, &problem_spec.params, settings.seed)
        .map_err(|e| TrialFailure::Build(e.to_string()))?;
    let ctx = ModelContext {
        input_dim: problem.observation_dim(),
        output_dim: problem.observation_dim(),
        seed: settings.seed,
    };
    let mut model = registry
        .resolve_model(&model_spec.id, &model_spec.params, &ctx)
        .map_err(|e| TrialFailure::Build(e.to_string()))?;

    let probe = MemoryProbe::start();
    let t0 = Instant::now();

    let loss = step_loop(problem.as_mut(), model.as_mut(), metric, settings, t0)?;

    Ok(TrialResult {
        loss,
        time: t0.elapsed().as_secs_f64(),
        memory: probe.peak(),
    })
}

fn step_loop(
    problem: &mut dyn Problem,
    model: &mut dyn Model,
    metric: Metric,
    settings: &TrialSettings,
    t0: Instant,
) -> Result<Vec<f64>, TrialFailure> {
    let fail = |t: usize| move |e: common::Error| TrialFailure::Step { t, reason: e.to_string() };
    let horizon = settings.horizon.max(1);
    let tick = (settings.timesteps / 10).max(1);

    let mut losses = Vec::with_capacity(settings.timesteps);
    // forecasts issued during the last `horizon - 1` steps, oldest first
    let mut issued: VecDeque<Vec<Observation>> = VecDeque::with_capacity(horizon);
    let mut x = problem.step(None).map_err(fail(0))?;

    for t in 0..settings.timesteps {
        let prediction = if horizon == 1 {
            model.predict(&x).map_err(fail(t))?
        } else {
            let forecast = model.forecast(&x, horizon).map_err(fail(t))?;
            let current = forecast.first().cloned().ok_or_else(|| TrialFailure::Step {
                t,
                reason: "empty forecast".to_string(),
            })?;
            issued.push_back(forecast);
            if issued.len() == horizon {
                issued
                    .pop_front()
                    .and_then(|mut f| f.pop())
                    .unwrap_or(current)
            } else {
                current
            }
        };

        let y = problem.step(None).map_err(fail(t))?;
        losses.push(metric.evaluate(&prediction, &y).map_err(fail(t))?);
        model.update(&y).map_err(fail(t))?;
        x = y;

        debug!("t: {}, loss: {}, problem: {}", t, losses[t], problem.hidden());
        if settings.load_bar && (t + 1) % tick == 0 {
            info!("{}/{} steps", t + 1, settings.timesteps);
        }
        if let Some(timeout) = settings.timeout {
            if t0.elapsed() > timeout {
                return Err(TrialFailure::TimedOut { t: t + 1 });
            }
        }
    }

    Ok(losses)
}
