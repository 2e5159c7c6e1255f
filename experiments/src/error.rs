use thiserror::Error;

use crate::Kind;

/// Result type alias
pub type Result<T> = std::result::Result<T, ExperimentError>;

/// Errors that abort an experiment operation.
/// Failures inside a single trial never show up here, see [`crate::TrialFailure`].
#[derive(Error, Debug)]
pub enum ExperimentError {
    /// The id is not registered
    #[error("unknown {kind} id `{id}`")]
    UnknownId {
        /// Whether a problem or a model was requested
        kind: Kind,
        /// The requested id
        id: String,
    },

    /// `add_model`, `scoreboard` or `graph` before `initialize`
    #[error("experiment has not been initialized")]
    NotInitialized,

    /// Structurally invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The precomputed source has no entry for a requested triple
    #[error("no precomputed result for ({metric}, {problem}, {model})")]
    MissingPrecomputed {
        /// Metric name
        metric: String,
        /// Problem id
        problem: String,
        /// Model id
        model: String,
    },

    /// Constructing a problem or model from its hyperparameters failed
    #[error("could not build `{id}`: {source}")]
    Build {
        /// The problem or model id
        id: String,
        /// Underlying cause
        source: common::Error,
    },

    /// Writing an export failed
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Writing a csv export failed
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// Rendering a graph failed
    #[error(transparent)]
    Plot(#[from] bench_plot::PlotError),
}
