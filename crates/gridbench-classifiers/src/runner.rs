//! Exhaustive grid search over one model adapter.
//!
//! Every grid point is trained on the TRAIN side of the partition and scored
//! on the TEST side, independently of every other point. Points run on the
//! rayon pool unless a single thread is requested; the returned rows are
//! always in grid enumeration order.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::binning::ScoreBinner;
use crate::data_handling::Dataset;
use crate::error::{GridError, Result};
use crate::grid::{HyperparameterGrid, HyperparameterTuple};
use crate::metrics::{ConfusionMatrix, SplitMetrics};
use crate::models::adapter::{unsupported, ModelAdapter, PredictionMode, Predictions, TrainedModel};
use crate::report::{Evaluation, ReportRow, RowOutcome};

/// How grid points are scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerSettings {
    /// Prediction mode requested from every trained model.
    pub mode: PredictionMode,
    /// Applied to raw scores; ignored in class-label mode.
    pub binner: ScoreBinner,
    /// Label treated as positive for sensitivity and specificity.
    pub positive_label: Option<usize>,
    /// Also score the training side (overfitting diagnostics).
    pub evaluate_train: bool,
    /// Worker count; `None` uses the global rayon pool, `Some(1)` runs
    /// sequentially on the calling thread.
    pub threads: Option<usize>,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            mode: PredictionMode::RawScore,
            binner: ScoreBinner::default(),
            positive_label: Some(1),
            evaluate_train: false,
            threads: None,
        }
    }
}

/// Cooperative cancellation flag, checked before each grid point starts.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct GridSearchRunner<'a> {
    adapter: &'a dyn ModelAdapter,
    settings: RunnerSettings,
    cancel: CancellationToken,
}

impl<'a> GridSearchRunner<'a> {
    pub fn new(adapter: &'a dyn ModelAdapter, settings: RunnerSettings) -> Self {
        Self {
            adapter,
            settings,
            cancel: CancellationToken::new(),
        }
    }

    /// Share `token` with the caller so it can stop the search between points.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn settings(&self) -> &RunnerSettings {
        &self.settings
    }

    /// Evaluate every combination of `grid`.
    ///
    /// Failures local to one grid point become failed rows. Structural
    /// problems (unsupported prediction mode, mismatched datasets, settings
    /// inconsistent with the label set) abort the run. Points skipped because
    /// of cancellation produce no row.
    pub fn run(
        &self,
        grid: &HyperparameterGrid,
        train: &Dataset,
        test: &Dataset,
    ) -> Result<Vec<ReportRow>> {
        self.check_structure(train, test)?;
        let combinations = grid.combinations()?;
        let n_points = combinations.len();

        log::info!(
            "Grid search over {} configuration(s) of {} ({} training / {} testing samples)",
            n_points,
            self.adapter.name(),
            train.nrows(),
            test.nrows()
        );

        let started = Instant::now();
        let outcomes: Vec<Option<ReportRow>> = match self.settings.threads {
            Some(1) => combinations
                .into_iter()
                .enumerate()
                .map(|(index, params)| self.evaluate_point(index, params, train, test))
                .collect::<Result<_>>()?,
            Some(n) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| GridError::ThreadPool(e.to_string()))?;
                pool.install(|| self.evaluate_parallel(combinations, train, test))?
            }
            None => self.evaluate_parallel(combinations, train, test)?,
        };

        let mut rows: Vec<ReportRow> = outcomes.into_iter().flatten().collect();
        rows.sort_by_key(|row| row.index);

        let failed = rows.iter().filter(|row| row.is_failed()).count();
        if rows.len() < n_points {
            log::warn!(
                "Grid search cancelled: {} of {} configuration(s) evaluated",
                rows.len(),
                n_points
            );
        }
        log::info!(
            "Grid search finished in {:.2}s: {} scored, {} failed",
            started.elapsed().as_secs_f64(),
            rows.len() - failed,
            failed
        );

        Ok(rows)
    }

    fn evaluate_parallel(
        &self,
        combinations: Vec<HyperparameterTuple>,
        train: &Dataset,
        test: &Dataset,
    ) -> Result<Vec<Option<ReportRow>>> {
        combinations
            .into_par_iter()
            .enumerate()
            .map(|(index, params)| self.evaluate_point(index, params, train, test))
            .collect()
    }

    fn check_structure(&self, train: &Dataset, test: &Dataset) -> Result<()> {
        let mode = self.settings.mode;
        if !self.adapter.supports(mode) {
            return Err(unsupported(self.adapter.name(), mode));
        }
        if train.label_set() != test.label_set() {
            return Err(GridError::InvalidDataset(format!(
                "train and test label sets differ ({} vs {} classes)",
                train.label_set().n_classes(),
                test.label_set().n_classes()
            )));
        }
        if train.ncols() != test.ncols() {
            return Err(GridError::InvalidDataset(format!(
                "train has {} feature columns, test has {}",
                train.ncols(),
                test.ncols()
            )));
        }
        if !self.adapter.supports_for(mode, &train.label_set()) {
            return Err(unsupported(self.adapter.name(), mode));
        }
        let n_classes = train.label_set().n_classes();
        if mode == PredictionMode::RawScore && self.settings.binner.n_classes() != n_classes {
            return Err(GridError::InvalidSettings(format!(
                "binner produces {} classes but the label set has {}",
                self.settings.binner.n_classes(),
                n_classes
            )));
        }
        if let Some(positive) = self.settings.positive_label {
            if !train.label_set().contains(positive) {
                return Err(GridError::InvalidSettings(format!(
                    "positive label {} is outside the label set of {} classes",
                    positive, n_classes
                )));
            }
        }
        if self.settings.threads == Some(0) {
            return Err(GridError::InvalidSettings(
                "threads must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn evaluate_point(
        &self,
        index: usize,
        params: HyperparameterTuple,
        train: &Dataset,
        test: &Dataset,
    ) -> Result<Option<ReportRow>> {
        if self.cancel.is_cancelled() {
            log::debug!("Skipping configuration {} ({}): cancelled", index, params);
            return Ok(None);
        }

        let started = Instant::now();
        let outcome = match self.score_point(&params, train, test) {
            Ok(evaluation) => {
                log::debug!(
                    "Configuration {} ({}): test misclassification rate {:.4}",
                    index,
                    params,
                    evaluation.test.misclassification_rate
                );
                RowOutcome::Scored(evaluation)
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                log::warn!("Configuration {} ({}) failed: {}", index, params, e);
                RowOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        Ok(Some(ReportRow {
            index,
            params,
            outcome,
            elapsed_seconds: started.elapsed().as_secs_f64(),
        }))
    }

    fn score_point(
        &self,
        params: &HyperparameterTuple,
        train: &Dataset,
        test: &Dataset,
    ) -> Result<Evaluation> {
        let model = self.adapter.fit(
            train.features(),
            train.labels(),
            &train.label_set(),
            params,
        )?;
        let test_metrics = self.score_split(model.as_ref(), test)?;
        let train_metrics = if self.settings.evaluate_train {
            Some(self.score_split(model.as_ref(), train)?)
        } else {
            None
        };
        Ok(Evaluation {
            test: test_metrics,
            train: train_metrics,
        })
    }

    fn score_split(&self, model: &dyn TrainedModel, data: &Dataset) -> Result<SplitMetrics> {
        let predictions = model.predict(data.features(), self.settings.mode)?;
        if predictions.mode() != self.settings.mode {
            return Err(unsupported(self.adapter.name(), self.settings.mode));
        }
        let predicted = match predictions {
            Predictions::Scores(scores) => self.settings.binner.assign(&scores)?,
            Predictions::Labels(labels) => labels,
        };
        let cm = ConfusionMatrix::tabulate(&predicted, data.labels(), &data.label_set())?;
        SplitMetrics::from_confusion(cm, self.settings.positive_label)
    }
}
