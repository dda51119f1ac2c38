//! Confusion-matrix based classification metrics.
//!
//! All functions here are pure: they read a [`ConfusionMatrix`] and return a
//! rate, or an error when the rate is undefined for the class distribution
//! at hand.
pub mod confusion;

pub use confusion::ConfusionMatrix;

use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};

/// Fraction of samples whose predicted label differs from the true label.
pub fn misclassification_rate(cm: &ConfusionMatrix) -> Result<f64> {
    let total = cm.total();
    if total == 0 {
        return Err(GridError::EmptyMatrix);
    }
    Ok(1.0 - cm.diagonal_sum() as f64 / total as f64)
}

pub fn accuracy(cm: &ConfusionMatrix) -> Result<f64> {
    misclassification_rate(cm).map(|rate| 1.0 - rate)
}

/// True-positive rate for `positive`: correctly predicted positives over all
/// actual positives.
pub fn sensitivity(cm: &ConfusionMatrix, positive: usize) -> Result<f64> {
    check_label(cm, positive)?;
    let actual_positive = cm.actual_count(positive);
    if actual_positive == 0 {
        return Err(GridError::UndefinedMetric(format!(
            "sensitivity: class {} has no actual members",
            positive
        )));
    }
    Ok(cm.count(positive, positive) as f64 / actual_positive as f64)
}

/// True-negative rate for `positive`, treating every other label as the
/// negative class (one-vs-rest).
pub fn specificity(cm: &ConfusionMatrix, positive: usize) -> Result<f64> {
    check_label(cm, positive)?;
    let actual_negative = cm.total() - cm.actual_count(positive);
    if actual_negative == 0 {
        return Err(GridError::UndefinedMetric(format!(
            "specificity: no actual members outside class {}",
            positive
        )));
    }
    let true_negative: usize = (0..cm.n_classes())
        .filter(|&p| p != positive)
        .flat_map(|p| {
            (0..cm.n_classes())
                .filter(|&a| a != positive)
                .map(move |a| (p, a))
        })
        .map(|(p, a)| cm.count(p, a))
        .sum();
    Ok(true_negative as f64 / actual_negative as f64)
}

fn check_label(cm: &ConfusionMatrix, label: usize) -> Result<()> {
    if label >= cm.n_classes() {
        return Err(GridError::LabelOutOfRange {
            label,
            n_classes: cm.n_classes(),
        });
    }
    Ok(())
}

/// Metrics of one model on one side (train or test) of the partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitMetrics {
    pub confusion: ConfusionMatrix,
    pub misclassification_rate: f64,
    pub sensitivity: Option<f64>,
    pub specificity: Option<f64>,
}

impl SplitMetrics {
    /// Derive all metrics from `cm`. Sensitivity and specificity are only
    /// computed when a positive label is given; undefined ones become `None`.
    pub fn from_confusion(cm: ConfusionMatrix, positive: Option<usize>) -> Result<Self> {
        let misclassification_rate = misclassification_rate(&cm)?;
        let (sensitivity, specificity) = match positive {
            Some(pos) => (
                optional_metric(sensitivity(&cm, pos))?,
                optional_metric(specificity(&cm, pos))?,
            ),
            None => (None, None),
        };
        Ok(Self {
            confusion: cm,
            misclassification_rate,
            sensitivity,
            specificity,
        })
    }

    pub fn accuracy(&self) -> f64 {
        1.0 - self.misclassification_rate
    }
}

fn optional_metric(value: Result<f64>) -> Result<Option<f64>> {
    match value {
        Ok(v) => Ok(Some(v)),
        Err(GridError::UndefinedMetric(reason)) => {
            log::debug!("Metric left undefined: {}", reason);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
