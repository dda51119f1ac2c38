//! Data structures for the feature matrix, label vector and train/test
//! partition handed to a grid search.
//!
//! A `Dataset` is validated once on construction and is read-only afterwards.
//! `Partition` is a boolean mask (`true` = train) and is always total and
//! disjoint by construction.
use ndarray::{Array2, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};

/// The fixed, finite enumeration of class labels `0..n_classes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabelSet {
    n_classes: usize,
}

impl LabelSet {
    pub fn new(n_classes: usize) -> Result<Self> {
        if n_classes < 2 {
            return Err(GridError::InvalidDataset(format!(
                "a label set needs at least 2 classes, got {}",
                n_classes
            )));
        }
        Ok(Self { n_classes })
    }

    /// The `{0, 1}` label set.
    pub fn binary() -> Self {
        Self { n_classes: 2 }
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn is_binary(&self) -> bool {
        self.n_classes == 2
    }

    pub fn contains(&self, label: usize) -> bool {
        label < self.n_classes
    }

    pub fn labels(&self) -> std::ops::Range<usize> {
        0..self.n_classes
    }

    /// Check every label of `labels` against the set.
    pub fn validate(&self, labels: &[usize]) -> Result<()> {
        match labels.iter().find(|&&l| !self.contains(l)) {
            Some(&label) => Err(GridError::LabelOutOfRange {
                label,
                n_classes: self.n_classes,
            }),
            None => Ok(()),
        }
    }
}

/// Features, labels and the label set of one experiment.
#[derive(Debug, Clone)]
pub struct Dataset {
    x: Array2<f64>,
    y: Vec<usize>,
    label_set: LabelSet,
    feature_names: Vec<String>,
}

impl Dataset {
    /// Build a dataset, checking the row/label alignment and the label set.
    pub fn new(x: Array2<f64>, y: Vec<usize>, label_set: LabelSet) -> Result<Self> {
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(GridError::InvalidDataset(format!(
                "feature matrix must be non-empty, got shape ({}, {})",
                x.nrows(),
                x.ncols()
            )));
        }
        if x.nrows() != y.len() {
            return Err(GridError::InvalidDataset(format!(
                "{} feature rows but {} labels",
                x.nrows(),
                y.len()
            )));
        }
        if let Some((row, col)) = x
            .indexed_iter()
            .find_map(|(idx, v)| (!v.is_finite()).then_some(idx))
        {
            return Err(GridError::InvalidDataset(format!(
                "non-finite feature value at row {}, column {}",
                row, col
            )));
        }
        label_set
            .validate(&y)
            .map_err(|e| GridError::InvalidDataset(e.to_string()))?;

        let feature_names = (0..x.ncols()).map(|i| format!("x{}", i)).collect();
        Ok(Self {
            x,
            y,
            label_set,
            feature_names,
        })
    }

    /// Attach column names (used by the CLI for logging only).
    pub fn with_feature_names(mut self, names: Vec<String>) -> Result<Self> {
        if names.len() != self.x.ncols() {
            return Err(GridError::InvalidDataset(format!(
                "{} feature names for {} columns",
                names.len(),
                self.x.ncols()
            )));
        }
        self.feature_names = names;
        Ok(self)
    }

    pub fn features(&self) -> ArrayView2<'_, f64> {
        self.x.view()
    }

    pub fn labels(&self) -> &[usize] {
        &self.y
    }

    pub fn label_set(&self) -> LabelSet {
        self.label_set
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn nrows(&self) -> usize {
        self.x.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.x.ncols()
    }

    /// Number of samples per label, indexed by label.
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.label_set.n_classes()];
        for &label in &self.y {
            counts[label] += 1;
        }
        counts
    }

    pub fn log_input_data_summary(&self) {
        log::info!(
            "Dataset: {} samples, {} features, class counts {:?}",
            self.nrows(),
            self.ncols(),
            self.class_counts()
        );
    }

    /// Same features with a different label vector, e.g. a multiclass target
    /// derived from the binary one.
    pub fn with_labels(&self, y: Vec<usize>, label_set: LabelSet) -> Result<Dataset> {
        Dataset::new(self.x.clone(), y, label_set)?.with_feature_names(self.feature_names.clone())
    }

    /// Keep only the rows where `mask[i]` is true.
    pub fn filter(&self, mask: &[bool]) -> Dataset {
        let selected_indices: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(i, &m)| if m { Some(i) } else { None })
            .collect();

        Dataset {
            x: self.x.select(Axis(0), &selected_indices),
            y: selected_indices.iter().map(|&i| self.y[i]).collect(),
            label_set: self.label_set,
            feature_names: self.feature_names.clone(),
        }
    }

    /// Split into `(train, test)` according to `partition`.
    pub fn split(&self, partition: &Partition) -> Result<(Dataset, Dataset)> {
        if partition.len() != self.nrows() {
            return Err(GridError::InvalidDataset(format!(
                "partition covers {} samples but the dataset has {}",
                partition.len(),
                self.nrows()
            )));
        }
        let train = self.filter(partition.train_mask());
        let test = self.filter(&partition.test_mask());
        if train.nrows() == 0 || test.nrows() == 0 {
            return Err(GridError::InvalidDataset(format!(
                "partition leaves an empty side ({} train, {} test)",
                train.nrows(),
                test.nrows()
            )));
        }
        log::debug!(
            "Split dataset into {} training and {} testing samples",
            train.nrows(),
            test.nrows()
        );
        Ok((train, test))
    }
}

/// Train/test assignment for every sample; `true` marks a training sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    is_train: Vec<bool>,
}

impl Partition {
    pub fn from_mask(is_train: Vec<bool>) -> Self {
        Self { is_train }
    }

    /// Every index in `test_indices` goes to the test side, the rest train.
    pub fn from_test_indices(n_samples: usize, test_indices: &[usize]) -> Result<Self> {
        let mut is_train = vec![true; n_samples];
        for &idx in test_indices {
            if idx >= n_samples {
                return Err(GridError::InvalidDataset(format!(
                    "test index {} out of range for {} samples",
                    idx, n_samples
                )));
            }
            if !is_train[idx] {
                return Err(GridError::InvalidDataset(format!(
                    "test index {} listed twice",
                    idx
                )));
            }
            is_train[idx] = false;
        }
        Ok(Self { is_train })
    }

    /// Seeded random split; `train_fraction` of the samples (rounded) go to
    /// the training side and both sides are kept non-empty.
    pub fn random_split(n_samples: usize, train_fraction: f64, seed: u64) -> Result<Self> {
        if n_samples < 2 {
            return Err(GridError::InvalidDataset(format!(
                "cannot split {} samples into train and test",
                n_samples
            )));
        }
        if !(train_fraction > 0.0 && train_fraction < 1.0) {
            return Err(GridError::InvalidDataset(format!(
                "train fraction must lie in (0, 1), got {}",
                train_fraction
            )));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut indices: Vec<usize> = (0..n_samples).collect();
        indices.shuffle(&mut rng);

        let n_train = ((n_samples as f64 * train_fraction).round() as usize).clamp(1, n_samples - 1);
        let mut is_train = vec![false; n_samples];
        for &idx in &indices[..n_train] {
            is_train[idx] = true;
        }
        Ok(Self { is_train })
    }

    pub fn len(&self) -> usize {
        self.is_train.len()
    }

    pub fn is_empty(&self) -> bool {
        self.is_train.is_empty()
    }

    pub fn train_mask(&self) -> &[bool] {
        &self.is_train
    }

    pub fn test_mask(&self) -> Vec<bool> {
        self.is_train.iter().map(|&t| !t).collect()
    }

    pub fn n_train(&self) -> usize {
        self.is_train.iter().filter(|&&t| t).count()
    }

    pub fn n_test(&self) -> usize {
        self.len() - self.n_train()
    }
}
