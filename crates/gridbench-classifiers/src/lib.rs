//! gridbench-classifiers: grid-search evaluation of classifiers.
//!
//! This crate trains one classifier per point of a hyperparameter grid on a
//! fixed train/test partition, turns predictions into class labels (directly,
//! or by binning raw scores), tabulates confusion matrices and collects the
//! misclassification rate, sensitivity and specificity of every point into a
//! structured report.
//!
//! Model families (gradient boosted trees, random forests, support vector
//! machines) sit behind the [`models::ModelAdapter`] trait, so the runner
//! never knows which library does the fitting.
pub mod binning;
pub mod config;
pub mod data_handling;
pub mod error;
pub mod grid;
pub mod labels;
pub mod metrics;
pub mod models;
pub mod report;
pub mod runner;

pub use binning::{QuantileBinner, ScoreBinner, ThresholdBinner};
pub use config::{ModelConfig, ModelKind};
pub use data_handling::{Dataset, LabelSet, Partition};
pub use error::{GridError, Result};
pub use grid::{HyperparameterGrid, HyperparameterTuple, ParamValue};
pub use metrics::{ConfusionMatrix, SplitMetrics};
pub use models::factory::build_adapter;
pub use report::{select_best, Direction, ExperimentReport, Metric, ReportRow};
pub use runner::{CancellationToken, GridSearchRunner, RunnerSettings};
