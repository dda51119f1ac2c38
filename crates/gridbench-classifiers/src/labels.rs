//! Multiclass targets derived from a binary label.
//!
//! A logistic regression of the binary label on the features gives every
//! sample a probability; cutting those probabilities at quantiles yields a
//! graded `k`-class target (e.g. low / medium / high at 0.33 and 0.66).
use linfa::traits::Fit;
use linfa::Dataset;
use linfa_logistic::LogisticRegression;
use ndarray::{Array1, ArrayView2};

use crate::binning::QuantileBinner;
use crate::data_handling::LabelSet;
use crate::error::{GridError, Result};

const MAX_ITERATIONS: u64 = 200;
/// L2 penalty of the logistic fit.
const L2_PENALTY: f64 = 1.0;

/// Quantiles of the usual three-class target.
pub const DEFAULT_QUANTILES: [f64; 2] = [0.33, 0.66];

/// Fit a logistic regression of `binary_labels` on `features` and bin its
/// probabilities at `quantiles`, returning the multiclass labels together
/// with the fitted binner.
///
/// The regression carries a ridge penalty ([`L2_PENALTY`]) where a plain
/// maximum-likelihood fit would have none. On separable classes the
/// unpenalized probabilities saturate at 0 and 1, the quantile cutpoints
/// tie and no target can be derived; the penalized fit keeps the scores
/// distinct and ordered the same way.
///
/// The regression and the cutpoints are fitted on every row passed in. When
/// the result is later split into train and test sets, the test rows have
/// already influenced the target construction; split first and derive per
/// side if that leakage matters.
pub fn derive_multiclass_labels(
    features: ArrayView2<'_, f64>,
    binary_labels: &[usize],
    quantiles: &[f64],
) -> Result<(Vec<usize>, QuantileBinner)> {
    if features.nrows() != binary_labels.len() {
        return Err(GridError::InvalidDataset(format!(
            "{} feature rows but {} binary labels",
            features.nrows(),
            binary_labels.len()
        )));
    }
    LabelSet::binary()
        .validate(binary_labels)
        .map_err(|e| GridError::InvalidDataset(e.to_string()))?;
    if !binary_labels.contains(&0) || !binary_labels.contains(&1) {
        return Err(GridError::InvalidDataset(
            "both binary classes are needed to derive a multiclass target".to_string(),
        ));
    }

    let targets: Array1<usize> = binary_labels.iter().copied().collect();
    let dataset = Dataset::new(features.to_owned(), targets);
    let model = LogisticRegression::default()
        .alpha(L2_PENALTY)
        .max_iterations(MAX_ITERATIONS)
        .fit(&dataset)
        .map_err(|e| GridError::InvalidDataset(format!("logistic regression failed: {}", e)))?;

    let probabilities = model.predict_probabilities(&features);
    let scores = oriented_towards_positive(probabilities.to_vec(), binary_labels);

    let binner = QuantileBinner::fit(&scores, quantiles)?;
    let labels = binner.assign(&scores)?;
    log::info!(
        "Derived {}-class target from the binary label at quantiles {:?} (cutpoints {:?})",
        binner.n_classes(),
        quantiles,
        binner.cutpoints()
    );
    Ok((labels, binner))
}

/// Flip the probabilities when they describe class 0, so that high scores
/// always mean "more like label 1".
fn oriented_towards_positive(scores: Vec<f64>, binary_labels: &[usize]) -> Vec<f64> {
    let mean_of = |class: usize| {
        let (sum, n) = scores
            .iter()
            .zip(binary_labels)
            .filter(|&(_, &y)| y == class)
            .fold((0.0f64, 0usize), |(sum, n), (&s, _)| (sum + s, n + 1));
        sum / n as f64
    };
    if mean_of(1) >= mean_of(0) {
        scores
    } else {
        scores.into_iter().map(|s| 1.0 - s).collect()
    }
}
