use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use gridbench_classifiers::config::{ModelConfig, ModelKind};
use gridbench_classifiers::report::{Direction, Metric};
use gridbench_classifiers::runner::RunnerSettings;

use crate::util::validate_tsv_or_csv_file;

/// Everything needed for one `gridbench run`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Labelled table (`.csv` or `.tsv`) with a header row.
    pub data_file: String,
    /// Where the result table goes; stdout when empty.
    pub output_file: Option<String>,
    /// Optional JSON summary with the best row and the full table.
    pub summary_file: Option<String>,
    /// Column holding the label (0/1, or 0..k-1).
    pub label_column: String,
    /// Column marking rows as `train`/`test`; a seeded random split is used
    /// when absent.
    pub partition_column: Option<String>,
    pub train_fraction: f64,
    pub seed: u64,
    /// Derive a multiclass target from the binary label at these quantiles
    /// of a logistic-regression probability.
    pub multiclass_quantiles: Option<Vec<f64>>,
    pub model: ModelConfig,
    pub settings: RunnerSettings,
    pub select_metric: Metric,
    /// Defaults to the direction in which `select_metric` improves.
    pub select_direction: Option<Direction>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self::for_kind(ModelKind::default())
    }
}

impl ExperimentConfig {
    /// Default experiment for a model family: its default grid and the
    /// prediction mode its models produce.
    pub fn for_kind(kind: ModelKind) -> Self {
        ExperimentConfig {
            data_file: String::new(),
            output_file: None,
            summary_file: None,
            label_column: String::from("label"),
            partition_column: None,
            train_fraction: 0.7,
            seed: 42,
            multiclass_quantiles: None,
            model: ModelConfig::for_kind(kind),
            settings: RunnerSettings {
                mode: kind.default_mode(),
                ..RunnerSettings::default()
            },
            select_metric: Metric::MisclassificationRate,
            select_direction: None,
        }
    }

    pub fn direction(&self) -> Direction {
        self.select_direction
            .unwrap_or_else(|| self.select_metric.natural_direction())
    }

    /// Switch to another model family, replacing the grid and prediction mode
    /// with that family's defaults.
    pub fn set_model_kind(&mut self, kind: ModelKind) {
        if self.model.kind != kind {
            log::info!(
                "Model type overridden to {}; using its default grid and {} predictions",
                kind,
                kind.default_mode()
            );
            self.model = ModelConfig::for_kind(kind);
            self.settings.mode = kind.default_mode();
        }
    }

    pub fn from_arguments(config_path: &Path, matches: &ArgMatches) -> Result<Self> {
        let mut config = load_experiment_config(config_path)?;

        // Apply CLI overrides
        if let Some(data_file) = matches.get_one::<String>("data_file") {
            config.data_file = data_file.clone();
        }
        validate_tsv_or_csv_file(&config.data_file)?;

        if let Some(output_file) = matches.get_one::<String>("output_file") {
            config.output_file = Some(output_file.clone());
        }

        if let Some(summary_file) = matches.get_one::<String>("summary_file") {
            config.summary_file = Some(summary_file.clone());
        }

        if let Some(model_type) = matches.get_one::<String>("model_type") {
            let kind = ModelKind::from_str(model_type).map_err(anyhow::Error::msg)?;
            config.set_model_kind(kind);
        }

        if let Some(threads) = matches.get_one::<usize>("threads") {
            config.settings.threads = Some(*threads);
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks that do not need the data file.
    pub fn validate(&self) -> Result<()> {
        if self.label_column.is_empty() {
            anyhow::bail!("label_column must not be empty");
        }
        if self.partition_column.as_deref() == Some(self.label_column.as_str()) {
            anyhow::bail!("partition_column and label_column must differ");
        }
        if self.partition_column.is_none() && !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            anyhow::bail!(
                "train_fraction must lie in (0, 1), got {}",
                self.train_fraction
            );
        }
        self.model
            .grid
            .validate()
            .context("Invalid hyperparameter grid")?;
        Ok(())
    }
}

/// Load an experiment configuration from a JSON file. Missing fields take
/// their default values; a missing `settings.mode` follows the model family.
pub fn load_experiment_config<P: AsRef<Path>>(path: P) -> Result<ExperimentConfig> {
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
    parse_experiment_config(&content)
        .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))
}

pub fn parse_experiment_config(json: &str) -> Result<ExperimentConfig> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let mode_given = value.pointer("/settings/mode").is_some();
    let mut config: ExperimentConfig = serde_json::from_value(value)?;
    if !mode_given {
        config.settings.mode = config.model.kind.default_mode();
    }
    Ok(config)
}
