use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by problems, models and metrics while stepping
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Two vectors that have to agree in length did not
    #[error("shape mismatch in {what}: expected {expected}, got {got}")]
    ShapeMismatch {
        /// Where the mismatch was detected
        what: &'static str,
        /// The expected length
        expected: usize,
        /// The observed length
        got: usize,
    },

    /// A NaN or infinity showed up
    #[error("non-finite value in {0}")]
    NonFinite(&'static str),

    /// A hyperparameter had the wrong type or an invalid value
    #[error("invalid hyperparameter `{key}`: {reason}")]
    InvalidParam {
        /// Name of the hyperparameter
        key: String,
        /// What is wrong with it
        reason: String,
    },

    /// A hyperparameter set could not be read into its typed form
    #[error("malformed hyperparameters: {0}")]
    Hyperparams(String),

    /// The operation is not offered by this implementation
    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl Error {
    /// Shorthand for [`Error::InvalidParam`]
    pub fn invalid_param(key: &str, reason: impl Into<String>) -> Self {
        Error::InvalidParam {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
