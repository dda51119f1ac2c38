use anyhow::{Context, Result};
use std::path::Path;

use gridbench_classifiers::data_handling::{Dataset, LabelSet, Partition};
use gridbench_classifiers::labels::derive_multiclass_labels;
use gridbench_classifiers::models::factory::build_adapter;
use gridbench_classifiers::report::ExperimentReport;
use gridbench_classifiers::runner::GridSearchRunner;

use crate::grid::input::ExperimentConfig;
use crate::grid::load_data::load_labelled_table;
use crate::grid::output::{write_summary, write_table, RunSummary};

/// Load the data named by `config`, run the grid search and return the report.
pub fn run_experiment(config: &ExperimentConfig) -> Result<ExperimentReport> {
    let table = load_labelled_table(
        &config.data_file,
        &config.label_column,
        config.partition_column.as_deref(),
    )?;
    let dataset = match &config.multiclass_quantiles {
        Some(quantiles) => with_multiclass_target(&table.dataset, quantiles)?,
        None => table.dataset,
    };
    dataset.log_input_data_summary();

    let partition = match table.partition {
        Some(partition) => partition,
        None => Partition::random_split(dataset.nrows(), config.train_fraction, config.seed)?,
    };
    let (train, test) = dataset.split(&partition)?;

    let grid = &config.model.grid;
    let adapter = build_adapter(config.model.kind);
    let runner = GridSearchRunner::new(adapter.as_ref(), config.settings.clone());
    let rows = runner
        .run(grid, &train, &test)
        .with_context(|| format!("Grid search over {} failed", config.model.kind))?;

    Ok(ExperimentReport::from_run(rows, grid.len()))
}

/// Replace the binary label of `dataset` with a quantile-binned multiclass
/// target derived from all of its rows.
fn with_multiclass_target(dataset: &Dataset, quantiles: &[f64]) -> Result<Dataset> {
    if !dataset.label_set().is_binary() {
        anyhow::bail!(
            "multiclass_quantiles needs a binary label column, found {} classes",
            dataset.label_set().n_classes()
        );
    }
    let (labels, binner) = derive_multiclass_labels(dataset.features(), dataset.labels(), quantiles)
        .context("Failed to derive the multiclass target")?;
    Ok(dataset.with_labels(labels, LabelSet::new(binner.n_classes())?)?)
}

/// Run the experiment and write the table, the optional summary and a log of
/// the best configuration.
pub fn run_and_write(config: &ExperimentConfig) -> Result<ExperimentReport> {
    let report = run_experiment(config)?;

    let metric = config.select_metric;
    let direction = config.direction();
    match report.select_best(metric, direction) {
        Ok(best) => {
            log::info!("Best configuration by {} ({}): {}", metric, direction, best.params);
            if let Some(evaluation) = best.evaluation() {
                log::info!("Test confusion matrix (rows predicted, columns actual):\n{}", evaluation.test.confusion);
            }
        }
        Err(e) => log::warn!("No best configuration: {}", e),
    }
    if !report.is_complete() {
        log::warn!("The grid search did not evaluate every configuration");
    }

    write_table(&report.to_records(), config.output_file.as_deref().map(Path::new))?;
    if let Some(summary_file) = &config.summary_file {
        let summary = RunSummary::new(config.model.kind, &report, metric, direction);
        write_summary(&summary, Path::new(summary_file))?;
    }
    Ok(report)
}
