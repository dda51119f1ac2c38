use anyhow::{Context, Result};
use csv::ReaderBuilder;
use ndarray::Array2;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use gridbench_classifiers::data_handling::{Dataset, LabelSet, Partition};

use crate::util::delimiter_for;

/// A labelled table split into features, labels and an optional
/// partition column.
#[derive(Debug, Clone)]
pub struct LabelledTable {
    pub dataset: Dataset,
    /// Present when the table carries a partition column.
    pub partition: Option<Partition>,
}

/// Load a CSV or TSV table with a header row.
///
/// `label_column` holds integer labels `0..k` (`true`/`false` are read as
/// 1/0); every column other than the label and partition columns must be
/// numeric and becomes a feature.
pub fn load_labelled_table<P: AsRef<Path>>(
    path: P,
    label_column: &str,
    partition_column: Option<&str>,
) -> Result<LabelledTable> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter_for(path))
        .has_headers(true)
        .from_reader(BufReader::new(file));

    let headers = rdr.headers()?.clone();
    let find = |name: &str| headers.iter().position(|h| h.trim() == name);
    let label_idx = find(label_column)
        .with_context(|| format!("Label column '{}' not found in {:?}", label_column, path))?;
    let partition_idx = match partition_column {
        Some(name) => Some(
            find(name)
                .with_context(|| format!("Partition column '{}' not found in {:?}", name, path))?,
        ),
        None => None,
    };

    let feature_idx: Vec<usize> = (0..headers.len())
        .filter(|&i| i != label_idx && Some(i) != partition_idx)
        .collect();
    if feature_idx.is_empty() {
        anyhow::bail!("No feature columns in {:?}", path);
    }
    let feature_names: Vec<String> = feature_idx
        .iter()
        .map(|&i| headers[i].trim().to_string())
        .collect();

    let mut values = Vec::new();
    let mut labels = Vec::new();
    let mut is_train = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row + 1))?;
        let line = row + 2;

        let label_field = record.get(label_idx).unwrap_or("");
        labels.push(
            parse_label(label_field)
                .with_context(|| format!("Bad label '{}' on line {}", label_field, line))?,
        );

        if let Some(idx) = partition_idx {
            let field = record.get(idx).unwrap_or("");
            is_train.push(
                parse_partition(field)
                    .with_context(|| format!("Bad partition value '{}' on line {}", field, line))?,
            );
        }

        for (&idx, name) in feature_idx.iter().zip(&feature_names) {
            let field = record.get(idx).unwrap_or("").trim();
            let value: f64 = field.parse().with_context(|| {
                format!("Non-numeric value '{}' in column '{}' on line {}", field, name, line)
            })?;
            values.push(value);
        }
    }

    let n_rows = labels.len();
    if n_rows == 0 {
        anyhow::bail!("No data rows in {:?}", path);
    }
    let x = Array2::from_shape_vec((n_rows, feature_idx.len()), values)?;
    let n_classes = labels.iter().copied().max().unwrap_or(0).max(1) + 1;
    let dataset = Dataset::new(x, labels, LabelSet::new(n_classes)?)?
        .with_feature_names(feature_names)?;

    log::info!(
        "Loaded {} rows with {} features from {:?}",
        dataset.nrows(),
        dataset.ncols(),
        path
    );

    Ok(LabelledTable {
        dataset,
        partition: partition_idx.map(|_| Partition::from_mask(is_train)),
    })
}

fn parse_label(field: &str) -> Result<usize> {
    let field = field.trim();
    match field.to_lowercase().as_str() {
        "true" => return Ok(1),
        "false" => return Ok(0),
        _ => {}
    }
    if let Ok(label) = field.parse::<usize>() {
        return Ok(label);
    }
    let value: f64 = field.parse()?;
    if value >= 0.0 && value.fract() == 0.0 {
        Ok(value as usize)
    } else {
        anyhow::bail!("labels must be non-negative integers")
    }
}

fn parse_partition(field: &str) -> Result<bool> {
    match field.trim().to_lowercase().as_str() {
        "train" | "training" | "1" | "true" => Ok(true),
        "test" | "testing" | "0" | "false" => Ok(false),
        _ => anyhow::bail!("expected train/test or 1/0"),
    }
}
