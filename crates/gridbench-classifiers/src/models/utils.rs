//! Helpers shared by the model adapters: input checks, hyperparameter
//! readers and panic containment around third-party training code.
use std::panic::{self, AssertUnwindSafe};

use ndarray::ArrayView2;

use crate::data_handling::LabelSet;
use crate::error::{GridError, Result};
use crate::grid::HyperparameterTuple;

pub(crate) fn check_training_input(
    x: &ArrayView2<'_, f64>,
    y: &[usize],
    labels: &LabelSet,
) -> Result<()> {
    if x.nrows() == 0 {
        return Err(GridError::Training("no training samples".to_string()));
    }
    if x.nrows() != y.len() {
        return Err(GridError::Training(format!(
            "{} training rows but {} labels",
            x.nrows(),
            y.len()
        )));
    }
    labels
        .validate(y)
        .map_err(|e| GridError::Training(e.to_string()))
}

/// Strictly positive float parameter, `default` when absent.
pub(crate) fn positive_f64(params: &HyperparameterTuple, name: &str, default: f64) -> Result<f64> {
    let value = params.get_f64(name)?.unwrap_or(default);
    if !(value > 0.0 && value.is_finite()) {
        return Err(GridError::Training(format!(
            "hyperparameter '{}' must be positive, got {}",
            name, value
        )));
    }
    Ok(value)
}

/// Strictly positive integer parameter, `default` when absent.
pub(crate) fn positive_usize(
    params: &HyperparameterTuple,
    name: &str,
    default: usize,
) -> Result<usize> {
    let value = params.get_usize(name)?.unwrap_or(default);
    if value == 0 {
        return Err(GridError::Training(format!(
            "hyperparameter '{}' must be positive, got 0",
            name
        )));
    }
    Ok(value)
}

/// Run library training code, turning a panic into a training error so one
/// bad configuration only fails its own grid point.
pub(crate) fn catch_training_panic<T, F>(model: &str, f: F) -> Result<T>
where
    F: FnOnce() -> T,
{
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        GridError::Training(format!("{} panicked during training: {}", model, reason))
    })
}
