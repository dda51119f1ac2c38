use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use gridbench_classifiers::config::ModelKind;
use gridbench_classifiers::report::{Direction, ExperimentReport, Metric, TableRecord};

use crate::util::delimiter_for;

/// JSON summary of a finished run.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub model: ModelKind,
    pub metric: Metric,
    pub direction: Direction,
    pub complete: bool,
    pub scored: usize,
    pub failed: usize,
    pub best: Option<TableRecord>,
    pub table: Vec<TableRecord>,
}

impl RunSummary {
    pub fn new(model: ModelKind, report: &ExperimentReport, metric: Metric, direction: Direction) -> Self {
        let best = report
            .select_best(metric, direction)
            .ok()
            .map(TableRecord::from);
        RunSummary {
            model,
            metric,
            direction,
            complete: report.is_complete(),
            scored: report.scored_count(),
            failed: report.failed_rows().count(),
            best,
            table: report.to_records(),
        }
    }
}

/// Write the result table as TSV (or CSV for a `.csv` path); stdout when
/// `output_path` is `None`.
pub fn write_table(records: &[TableRecord], output_path: Option<&Path>) -> Result<()> {
    match output_path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {:?}", path))?;
            write_records(records, BufWriter::new(file), delimiter_for(path))?;
            log::info!("Wrote {} rows to {:?}", records.len(), path);
        }
        None => {
            let stdout = io::stdout();
            write_records(records, stdout.lock(), b'\t')?;
        }
    }
    Ok(())
}

fn write_records<W: Write>(records: &[TableRecord], out: W, delimiter: u8) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(out);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_summary(summary: &RunSummary, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create summary file: {:?}", path))?;
    serde_json::to_writer_pretty(BufWriter::new(file), summary)
        .with_context(|| format!("Failed to write summary: {:?}", path))?;
    log::info!("Wrote run summary to {:?}", path);
    Ok(())
}
