//! Turning continuous probability scores into class labels.
//!
//! Two binners exist:
//!
//! * [`ThresholdBinner`] for binary problems: a single cutoff, with scores
//!   equal to the cutoff assigned to the positive label.
//! * [`QuantileBinner`] for `k` classes: `k - 1` cutpoints taken as empirical
//!   quantiles of a score sample, which gives roughly equally sized classes.
//!
//! Quantiles use linear interpolation between order statistics (the
//! "type 7" definition, also the default of R and numpy): for a sorted
//! sample `x[0..n]` and probability `q`, let `h = (n - 1) * q`; the quantile
//! is `x[floor(h)] + (h - floor(h)) * (x[floor(h) + 1] - x[floor(h)])`.
use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};

pub const DEFAULT_CUTOFF: f64 = 0.5;

/// Binary cutoff: `score >= cutoff` maps to label 1, anything else to 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdBinner {
    pub cutoff: f64,
}

impl Default for ThresholdBinner {
    fn default() -> Self {
        Self {
            cutoff: DEFAULT_CUTOFF,
        }
    }
}

impl ThresholdBinner {
    pub fn new(cutoff: f64) -> Self {
        Self { cutoff }
    }

    pub fn assign(&self, scores: &[f64]) -> Result<Vec<usize>> {
        check_scores(scores)?;
        Ok(scores
            .iter()
            .map(|&s| if s >= self.cutoff { 1 } else { 0 })
            .collect())
    }
}

/// `k`-class binner with cutpoints fitted as empirical quantiles.
///
/// Deserialized binners are checked like fitted ones: one strictly
/// increasing, finite cutpoint per quantile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawQuantileBinner")]
pub struct QuantileBinner {
    quantiles: Vec<f64>,
    cutpoints: Vec<f64>,
}

#[derive(Deserialize)]
struct RawQuantileBinner {
    quantiles: Vec<f64>,
    cutpoints: Vec<f64>,
}

impl TryFrom<RawQuantileBinner> for QuantileBinner {
    type Error = GridError;

    fn try_from(raw: RawQuantileBinner) -> Result<Self> {
        check_quantiles(&raw.quantiles)?;
        if raw.cutpoints.len() != raw.quantiles.len() {
            return Err(GridError::InvalidScores(format!(
                "{} cutpoints given for {} quantiles",
                raw.cutpoints.len(),
                raw.quantiles.len()
            )));
        }
        if raw.cutpoints.iter().any(|t| !t.is_finite()) {
            return Err(GridError::InvalidScores(format!(
                "cutpoints must be finite, got {:?}",
                raw.cutpoints
            )));
        }
        check_cutpoints(&raw.cutpoints)?;
        Ok(Self {
            quantiles: raw.quantiles,
            cutpoints: raw.cutpoints,
        })
    }
}

impl QuantileBinner {
    /// Fit cutpoints at `quantiles` of `scores`.
    ///
    /// `quantiles` must be strictly increasing values in `(0, 1)`; the binner
    /// then produces `quantiles.len() + 1` classes. The resulting cutpoints
    /// must be strictly increasing too, which fails for score samples with
    /// large runs of tied values.
    pub fn fit(scores: &[f64], quantiles: &[f64]) -> Result<Self> {
        check_quantiles(quantiles)?;
        if scores.is_empty() {
            return Err(GridError::InvalidScores(
                "cannot fit cutpoints on an empty score sample".to_string(),
            ));
        }
        check_scores(scores)?;

        let mut sorted = scores.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let cutpoints = quantiles
            .iter()
            .map(|&q| empirical_quantile(&sorted, q))
            .collect::<Result<Vec<f64>>>()?;
        check_cutpoints(&cutpoints)?;
        log::debug!(
            "Fitted cutpoints {:?} at quantiles {:?} over {} scores",
            cutpoints,
            quantiles,
            scores.len()
        );

        Ok(Self {
            quantiles: quantiles.to_vec(),
            cutpoints,
        })
    }

    pub fn cutpoints(&self) -> &[f64] {
        &self.cutpoints
    }

    pub fn quantiles(&self) -> &[f64] {
        &self.quantiles
    }

    pub fn n_classes(&self) -> usize {
        self.cutpoints.len() + 1
    }

    /// Label 0 for `s <= t1`, label `m` for `t_m < s <= t_{m+1}`, and the
    /// last label for scores above every cutpoint.
    pub fn assign(&self, scores: &[f64]) -> Result<Vec<usize>> {
        check_scores(scores)?;
        Ok(scores
            .iter()
            .map(|&s| self.cutpoints.partition_point(|&t| t < s))
            .collect())
    }
}

/// Either binner, as applied by the grid-search runner to raw scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBinner {
    Threshold(ThresholdBinner),
    Quantile(QuantileBinner),
}

impl Default for ScoreBinner {
    fn default() -> Self {
        ScoreBinner::Threshold(ThresholdBinner::default())
    }
}

impl ScoreBinner {
    pub fn n_classes(&self) -> usize {
        match self {
            ScoreBinner::Threshold(_) => 2,
            ScoreBinner::Quantile(b) => b.n_classes(),
        }
    }

    pub fn assign(&self, scores: &[f64]) -> Result<Vec<usize>> {
        match self {
            ScoreBinner::Threshold(b) => b.assign(scores),
            ScoreBinner::Quantile(b) => b.assign(scores),
        }
    }
}

/// Empirical quantile of an ascending-sorted sample using linear
/// interpolation between the two nearest order statistics.
///
/// `q` is clamped to `[0, 1]`. An empty sample has no quantiles and gives
/// [`GridError::InvalidScores`].
pub fn empirical_quantile(sorted: &[f64], q: f64) -> Result<f64> {
    if sorted.is_empty() {
        return Err(GridError::InvalidScores(
            "empirical quantile of an empty sample".to_string(),
        ));
    }
    let h = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    Ok(sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo]))
}

fn check_quantiles(quantiles: &[f64]) -> Result<()> {
    if quantiles.is_empty() {
        return Err(GridError::InvalidScores(
            "at least one quantile is required".to_string(),
        ));
    }
    if quantiles.iter().any(|&q| !(q > 0.0 && q < 1.0)) {
        return Err(GridError::InvalidScores(format!(
            "quantiles must lie in (0, 1), got {:?}",
            quantiles
        )));
    }
    if quantiles.windows(2).any(|w| w[0] >= w[1]) {
        return Err(GridError::InvalidScores(format!(
            "quantiles must be strictly increasing, got {:?}",
            quantiles
        )));
    }
    Ok(())
}

fn check_cutpoints(cutpoints: &[f64]) -> Result<()> {
    if cutpoints.windows(2).any(|w| w[0] >= w[1]) {
        return Err(GridError::InvalidScores(format!(
            "cutpoints must be strictly increasing, got {:?}",
            cutpoints
        )));
    }
    Ok(())
}

fn check_scores(scores: &[f64]) -> Result<()> {
    match scores.iter().position(|s| s.is_nan()) {
        Some(i) => Err(GridError::InvalidScores(format!("NaN score at position {}", i))),
        None => Ok(()),
    }
}
