use thiserror::Error;

use crate::models::adapter::PredictionMode;

/// Errors raised while building, scoring or reporting a grid search.
///
/// Some variants only ever affect a single grid point (they end up recorded
/// on a failed report row), others mean the run itself is wired incorrectly
/// and abort it. See [`GridError::is_fatal`].
#[derive(Debug, Error)]
pub enum GridError {
    #[error("predicted and actual label sequences differ in length ({predicted} vs {actual})")]
    ShapeMismatch { predicted: usize, actual: usize },

    #[error("cannot tabulate empty label sequences")]
    EmptyInput,

    #[error("label {label} is outside the label set of {n_classes} classes")]
    LabelOutOfRange { label: usize, n_classes: usize },

    #[error("confusion matrix holds no samples")]
    EmptyMatrix,

    #[error("metric is undefined: {0}")]
    UndefinedMetric(String),

    #[error("invalid scores: {0}")]
    InvalidScores(String),

    #[error("training failed: {0}")]
    Training(String),

    #[error("adapter '{adapter}' does not support {mode} predictions")]
    UnsupportedMode {
        adapter: String,
        mode: PredictionMode,
    },

    #[error("invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("invalid hyperparameter grid: {0}")]
    InvalidGrid(String),

    #[error("invalid runner settings: {0}")]
    InvalidSettings(String),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),

    #[error("no report row has a defined value for the requested metric")]
    NoScoredRows,
}

impl GridError {
    /// Structural errors abort a whole grid search; everything else is local
    /// to one grid point and gets recorded on its report row.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GridError::UnsupportedMode { .. }
                | GridError::InvalidDataset(_)
                | GridError::InvalidGrid(_)
                | GridError::InvalidSettings(_)
                | GridError::ThreadPool(_)
        )
    }
}

/// Result type used across the crate.
pub type Result<T> = std::result::Result<T, GridError>;
