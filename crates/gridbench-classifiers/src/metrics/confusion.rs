use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data_handling::LabelSet;
use crate::error::{GridError, Result};

/// Square table of counts over a fixed label set.
///
/// `counts[i][j]` is the number of samples predicted as label `i` whose true
/// label is `j`. Rows are predictions, columns are the truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    /// Tabulate predicted against actual labels.
    ///
    /// Both sequences must have the same, non-zero length and every label
    /// must belong to `label_set`. Cells that never occur are kept as zeros.
    pub fn tabulate(predicted: &[usize], actual: &[usize], label_set: &LabelSet) -> Result<Self> {
        if predicted.len() != actual.len() {
            return Err(GridError::ShapeMismatch {
                predicted: predicted.len(),
                actual: actual.len(),
            });
        }
        if predicted.is_empty() {
            return Err(GridError::EmptyInput);
        }
        label_set.validate(predicted)?;
        label_set.validate(actual)?;

        let k = label_set.n_classes();
        let mut counts = vec![vec![0usize; k]; k];
        for (&p, &a) in predicted.iter().zip(actual.iter()) {
            counts[p][a] += 1;
        }
        Ok(Self { counts })
    }

    pub fn n_classes(&self) -> usize {
        self.counts.len()
    }

    pub fn count(&self, predicted: usize, actual: usize) -> usize {
        self.counts[predicted][actual]
    }

    pub fn rows(&self) -> &[Vec<usize>] {
        &self.counts
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn diagonal_sum(&self) -> usize {
        (0..self.n_classes()).map(|i| self.counts[i][i]).sum()
    }

    /// Samples whose true label is `label` (column sum).
    pub fn actual_count(&self, label: usize) -> usize {
        self.counts.iter().map(|row| row[label]).sum()
    }

    /// Samples predicted as `label` (row sum).
    pub fn predicted_count(&self, label: usize) -> usize {
        self.counts[label].iter().sum()
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .counts
            .iter()
            .flatten()
            .map(|c| c.to_string().len())
            .max()
            .unwrap_or(1)
            .max(self.n_classes().to_string().len());

        write!(f, "{:>w$} |", "p\\a", w = width.max(3))?;
        for j in 0..self.n_classes() {
            write!(f, " {:>w$}", j, w = width)?;
        }
        writeln!(f)?;
        for (i, row) in self.counts.iter().enumerate() {
            write!(f, "{:>w$} |", i, w = width.max(3))?;
            for c in row {
                write!(f, " {:>w$}", c, w = width)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
