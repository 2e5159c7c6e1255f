//! Experiment orchestration: resolves problem and model ids, matches compatible pairs,
//! runs every (metric, problem, model) trial and aggregates the results.

#![deny(unused_imports)]
#![warn(missing_docs)]

#[macro_use]
extern crate log;

mod compatibility;
mod config;
mod error;
mod experiment;
mod memory;
mod precomputed;
mod registry;
mod results;
mod runner;
mod scoreboard;
mod selection;

pub use compatibility::{compatible, pairs};
pub use config::ExperimentConfig;
pub use error::{ExperimentError, Result};
pub use experiment::{Experiment, Phase};
pub use memory::{current_bytes, MemoryProbe, TrackingAllocator};
pub use precomputed::{FrozenSource, GeneratedSource, LoadRequest, PrecomputedConfig, PrecomputedSource};
pub use registry::{Kind, ModelBuilder, ModelContext, ModelEntry, ProblemBuilder, ProblemEntry, Registry};
pub use results::{ResultKey, ResultValue, ResultsTable, MEMORY, SENTINEL, TIME};
pub use runner::{run_trial, TrialFailure, TrialOutcome, TrialResult, TrialSettings};
pub use scoreboard::Scoreboard;
pub use selection::{ModelSpec, ProblemSpec, Restriction, Selection};

#[cfg(test)]
#[global_allocator]
static ALLOC: TrackingAllocator = TrackingAllocator;
