use serde::{Deserialize, Serialize};

use crate::report::row::ReportRow;
use crate::report::Metric;

/// Flat view of a report row for CSV/JSON writers. Undefined metrics are NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRecord {
    pub index: usize,
    pub params: String,
    pub status: String,
    pub test_misclassification_rate: f64,
    pub test_sensitivity: f64,
    pub test_specificity: f64,
    pub train_misclassification_rate: f64,
    pub elapsed_seconds: f64,
    pub error: String,
}

impl From<&ReportRow> for TableRecord {
    fn from(row: &ReportRow) -> Self {
        let value = |metric: Metric| metric.value(row).unwrap_or(f64::NAN);
        TableRecord {
            index: row.index,
            params: row.params.to_string(),
            status: if row.is_failed() { "failed" } else { "ok" }.to_string(),
            test_misclassification_rate: value(Metric::MisclassificationRate),
            test_sensitivity: value(Metric::Sensitivity),
            test_specificity: value(Metric::Specificity),
            train_misclassification_rate: value(Metric::TrainMisclassificationRate),
            elapsed_seconds: row.elapsed_seconds,
            error: row.error().unwrap_or_default().to_string(),
        }
    }
}
