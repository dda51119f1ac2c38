//! Structured results of a grid search.
//!
//! Rows are plain data in grid enumeration order; writers (TSV, JSON) live
//! with the caller and consume [`TableRecord`]s.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{GridError, Result};

pub mod row;
pub mod table;

pub use row::{Evaluation, ReportRow, RowOutcome};
pub use table::TableRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    MisclassificationRate,
    Accuracy,
    Sensitivity,
    Specificity,
    TrainMisclassificationRate,
}

impl Metric {
    /// Value of the metric for `row`, `None` for failed rows and undefined
    /// metrics.
    pub fn value(&self, row: &ReportRow) -> Option<f64> {
        let evaluation = row.evaluation()?;
        match self {
            Metric::MisclassificationRate => Some(evaluation.test.misclassification_rate),
            Metric::Accuracy => Some(evaluation.test.accuracy()),
            Metric::Sensitivity => evaluation.test.sensitivity,
            Metric::Specificity => evaluation.test.specificity,
            Metric::TrainMisclassificationRate => evaluation
                .train
                .as_ref()
                .map(|train| train.misclassification_rate),
        }
    }

    /// Direction in which the metric improves.
    pub fn natural_direction(&self) -> Direction {
        match self {
            Metric::MisclassificationRate | Metric::TrainMisclassificationRate => {
                Direction::Minimize
            }
            Metric::Accuracy | Metric::Sensitivity | Metric::Specificity => Direction::Maximize,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Metric::MisclassificationRate => "misclassification_rate",
            Metric::Accuracy => "accuracy",
            Metric::Sensitivity => "sensitivity",
            Metric::Specificity => "specificity",
            Metric::TrainMisclassificationRate => "train_misclassification_rate",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "misclassification_rate" | "mcr" | "error" => Ok(Metric::MisclassificationRate),
            "accuracy" => Ok(Metric::Accuracy),
            "sensitivity" | "recall" | "tpr" => Ok(Metric::Sensitivity),
            "specificity" | "tnr" => Ok(Metric::Specificity),
            "train_misclassification_rate" | "train_mcr" => Ok(Metric::TrainMisclassificationRate),
            _ => Err(format!(
                "Unknown metric: {}. Valid options are: misclassification_rate, accuracy, sensitivity, specificity, train_misclassification_rate",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Minimize,
    Maximize,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Minimize => write!(f, "minimize"),
            Direction::Maximize => write!(f, "maximize"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "min" | "minimize" => Ok(Direction::Minimize),
            "max" | "maximize" => Ok(Direction::Maximize),
            _ => Err(format!(
                "Unknown direction: {}. Valid options are: minimize, maximize",
                s
            )),
        }
    }
}

/// Best row by `metric`. Rows where the metric is undefined are skipped;
/// ties go to the row enumerated first.
pub fn select_best(rows: &[ReportRow], metric: Metric, direction: Direction) -> Result<&ReportRow> {
    let mut best: Option<(&ReportRow, f64)> = None;
    for row in rows {
        let value = match metric.value(row) {
            Some(v) if !v.is_nan() => v,
            _ => continue,
        };
        let better = match best {
            None => true,
            Some((current, current_value)) => {
                let strictly = match direction {
                    Direction::Minimize => value < current_value,
                    Direction::Maximize => value > current_value,
                };
                strictly || (value == current_value && row.index < current.index)
            }
        };
        if better {
            best = Some((row, value));
        }
    }
    best.map(|(row, _)| row).ok_or(GridError::NoScoredRows)
}

/// All rows of one grid search, in enumeration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentReport {
    rows: Vec<ReportRow>,
    expected_len: usize,
}

impl ExperimentReport {
    pub fn new(rows: Vec<ReportRow>) -> Self {
        let expected_len = rows.len();
        Self::from_run(rows, expected_len)
    }

    /// Report of a run that was meant to cover `expected_len` grid points;
    /// fewer rows means the search was cancelled.
    pub fn from_run(mut rows: Vec<ReportRow>, expected_len: usize) -> Self {
        rows.sort_by_key(|row| row.index);
        Self { rows, expected_len }
    }

    pub fn to_table(&self) -> &[ReportRow] {
        &self.rows
    }

    pub fn rows(&self) -> impl Iterator<Item = &ReportRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn select_best(&self, metric: Metric, direction: Direction) -> Result<&ReportRow> {
        select_best(&self.rows, metric, direction)
    }

    pub fn failed_rows(&self) -> impl Iterator<Item = &ReportRow> {
        self.rows.iter().filter(|row| row.is_failed())
    }

    pub fn scored_count(&self) -> usize {
        self.rows.iter().filter(|row| !row.is_failed()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.rows.len() == self.expected_len
    }

    pub fn to_records(&self) -> Vec<TableRecord> {
        self.rows.iter().map(TableRecord::from).collect()
    }
}
