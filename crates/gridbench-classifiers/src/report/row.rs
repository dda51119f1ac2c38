use serde::{Deserialize, Serialize};

use crate::grid::HyperparameterTuple;
use crate::metrics::SplitMetrics;

/// Scores of one trained configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub test: SplitMetrics,
    /// Present when the runner also scored the training side.
    pub train: Option<SplitMetrics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowOutcome {
    Scored(Evaluation),
    /// The configuration could not be trained or scored; the row is kept so
    /// the table stays complete.
    Failed { error: String },
}

/// Result for one grid point. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Position of the configuration in grid enumeration order.
    pub index: usize,
    pub params: HyperparameterTuple,
    pub outcome: RowOutcome,
    pub elapsed_seconds: f64,
}

impl ReportRow {
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, RowOutcome::Failed { .. })
    }

    pub fn evaluation(&self) -> Option<&Evaluation> {
        match &self.outcome {
            RowOutcome::Scored(evaluation) => Some(evaluation),
            RowOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            RowOutcome::Failed { error } => Some(error.as_str()),
            RowOutcome::Scored(_) => None,
        }
    }
}
