use std::fmt;

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use crate::data_handling::LabelSet;
use crate::error::{GridError, Result};
use crate::grid::HyperparameterTuple;

/// What `predict` hands back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionMode {
    /// Continuous scores (probability of the positive label), binned later.
    RawScore,
    /// Labels already discretized by the model itself.
    ClassLabel,
}

impl fmt::Display for PredictionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictionMode::RawScore => write!(f, "raw score"),
            PredictionMode::ClassLabel => write!(f, "class label"),
        }
    }
}

impl std::str::FromStr for PredictionMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "raw_score" | "score" => Ok(PredictionMode::RawScore),
            "class_label" | "label" => Ok(PredictionMode::ClassLabel),
            _ => Err(format!(
                "Unknown prediction mode: {}. Valid options are: raw_score, class_label",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predictions {
    Scores(Vec<f64>),
    Labels(Vec<usize>),
}

impl Predictions {
    pub fn len(&self) -> usize {
        match self {
            Predictions::Scores(s) => s.len(),
            Predictions::Labels(l) => l.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn mode(&self) -> PredictionMode {
        match self {
            Predictions::Scores(_) => PredictionMode::RawScore,
            Predictions::Labels(_) => PredictionMode::ClassLabel,
        }
    }
}

/// Uniform fit capability over a family of trainable classifiers.
///
/// An adapter holds no training state: every `fit` call returns a fresh
/// [`TrainedModel`], so one adapter can serve many grid points at once.
pub trait ModelAdapter: Send + Sync {
    /// Human readable name used in logs and errors.
    fn name(&self) -> &str;

    /// Prediction modes the trained models of this adapter can produce.
    fn supported_modes(&self) -> &'static [PredictionMode];

    fn supports(&self, mode: PredictionMode) -> bool {
        self.supported_modes().contains(&mode)
    }

    /// Whether `mode` is available for models trained on `labels`. Adapters
    /// whose modes depend on the class count narrow this; the runner checks
    /// it before any fit.
    fn supports_for(&self, mode: PredictionMode, _labels: &LabelSet) -> bool {
        self.supports(mode)
    }

    /// Train on `x`/`y` with one hyperparameter configuration.
    ///
    /// Returns [`GridError::Training`] for malformed input, invalid
    /// hyperparameters or a failure inside the underlying library.
    fn fit(
        &self,
        x: ArrayView2<'_, f64>,
        y: &[usize],
        labels: &LabelSet,
        params: &HyperparameterTuple,
    ) -> Result<Box<dyn TrainedModel>>;
}

/// Opaque fitted model; dropped once its predictions are obtained.
pub trait TrainedModel: Send {
    fn predict(&self, x: ArrayView2<'_, f64>, mode: PredictionMode) -> Result<Predictions>;
}

pub(crate) fn unsupported(adapter: &str, mode: PredictionMode) -> GridError {
    GridError::UnsupportedMode {
        adapter: adapter.to_string(),
        mode,
    }
}
