//! Evaluation errors.

use thiserror::Error;

/// Errors that can occur while loading suites, configuring runs or
/// persisting reports.
///
/// Scoring never produces one of these: a scoring failure is always a
/// failing [`ScoreResult`](crate::ScoreResult).
#[derive(Debug, Error)]
pub enum EvalError {
    /// Suite loading error.
    #[error("Failed to load suite: {0}")]
    SuiteLoad(String),

    /// Two cases in one suite share an id.
    #[error("Duplicate case id '{id}' (cases #{first} and #{second})")]
    DuplicateCaseId {
        /// The repeated id.
        id: String,
        /// Index of the first case using it.
        first: usize,
        /// Index of the repeating case.
        second: usize,
    },

    /// Run options are inconsistent.
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error.
    #[error("YAML error: {0}")]
    Yaml(String),

    /// Other error.
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl EvalError {
    /// Create a suite load error.
    pub fn suite_load(msg: impl Into<String>) -> Self {
        Self::SuiteLoad(msg.into())
    }

    /// Create an invalid options error.
    pub fn invalid_options(msg: impl Into<String>) -> Self {
        Self::InvalidOptions(msg.into())
    }
}

impl From<serde_yaml::Error> for EvalError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Yaml(err.to_string())
    }
}

/// Result type for evaluation operations.
pub type EvalResult<T> = Result<T, EvalError>;
