use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;
use ndarray::ArrayView2;

use crate::data_handling::LabelSet;
use crate::error::{GridError, Result};
use crate::grid::HyperparameterTuple;
use crate::models::adapter::{unsupported, ModelAdapter, PredictionMode, Predictions, TrainedModel};
use crate::models::utils::{catch_training_panic, check_training_input, positive_f64, positive_usize};

const KNOWN_PARAMS: &[&str] = &["shrinkage", "depth", "iterations", "min_leaf_size", "loss"];

/// Loss functions of the `gbdt` crate usable for binary classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GbdtLoss {
    /// Binomial deviance on `{-1, 1}` targets; predictions are probabilities.
    LogLikelyhood,
    /// Least squares on `{0, 1}` targets; predictions are clamped to `[0, 1]`.
    SquaredError,
}

impl GbdtLoss {
    fn as_config_str(&self) -> &'static str {
        match self {
            GbdtLoss::LogLikelyhood => "LogLikelyhood",
            GbdtLoss::SquaredError => "SquaredError",
        }
    }

    fn target(&self, label: usize) -> f32 {
        match (self, label) {
            (GbdtLoss::LogLikelyhood, 1) => 1.0,
            (GbdtLoss::LogLikelyhood, _) => -1.0,
            (GbdtLoss::SquaredError, l) => l as f32,
        }
    }
}

/// Hyperparameters of one boosted-tree fit.
#[derive(Debug, Clone, PartialEq)]
pub struct GbdtParams {
    pub shrinkage: f64,
    pub depth: u32,
    pub iterations: usize,
    pub min_leaf_size: usize,
    pub loss: GbdtLoss,
}

impl Default for GbdtParams {
    fn default() -> Self {
        Self {
            shrinkage: 0.1,
            depth: 3,
            iterations: 50,
            min_leaf_size: 1,
            loss: GbdtLoss::LogLikelyhood,
        }
    }
}

impl GbdtParams {
    pub fn from_tuple(params: &HyperparameterTuple) -> Result<Self> {
        params.ensure_known(KNOWN_PARAMS)?;
        let defaults = GbdtParams::default();
        let depth = positive_usize(params, "depth", defaults.depth as usize)?;
        let loss = match params.get_str("loss")? {
            None => defaults.loss,
            Some(s) if s.eq_ignore_ascii_case("LogLikelyhood") => GbdtLoss::LogLikelyhood,
            Some(s) if s.eq_ignore_ascii_case("SquaredError") => GbdtLoss::SquaredError,
            Some(other) => {
                return Err(GridError::Training(format!(
                    "unsupported gbdt loss '{}'. Valid options are: LogLikelyhood, SquaredError",
                    other
                )))
            }
        };
        Ok(Self {
            shrinkage: positive_f64(params, "shrinkage", defaults.shrinkage)?,
            depth: u32::try_from(depth)
                .map_err(|_| GridError::Training(format!("depth {} is too large", depth)))?,
            iterations: positive_usize(params, "iterations", defaults.iterations)?,
            min_leaf_size: positive_usize(params, "min_leaf_size", defaults.min_leaf_size)?,
            loss,
        })
    }
}

/// Gradient boosted decision trees backed by the `gbdt` crate.
///
/// Binary labels only. Produces probability scores for label 1.
#[derive(Debug, Default, Clone)]
pub struct GradientBoostedTreeAdapter;

impl GradientBoostedTreeAdapter {
    pub fn new() -> Self {
        GradientBoostedTreeAdapter
    }
}

impl ModelAdapter for GradientBoostedTreeAdapter {
    fn name(&self) -> &str {
        "gbdt"
    }

    fn supported_modes(&self) -> &'static [PredictionMode] {
        &[PredictionMode::RawScore]
    }

    fn supports_for(&self, mode: PredictionMode, labels: &LabelSet) -> bool {
        mode == PredictionMode::RawScore && labels.is_binary()
    }

    fn fit(
        &self,
        x: ArrayView2<'_, f64>,
        y: &[usize],
        labels: &LabelSet,
        params: &HyperparameterTuple,
    ) -> Result<Box<dyn TrainedModel>> {
        check_training_input(&x, y, labels)?;
        if !labels.is_binary() {
            return Err(GridError::Training(format!(
                "gbdt adapter only handles binary labels, got {} classes",
                labels.n_classes()
            )));
        }
        let params = GbdtParams::from_tuple(params)?;

        let mut config = Config::new();
        config.set_feature_size(x.ncols());
        config.set_shrinkage(params.shrinkage as f32);
        config.set_max_depth(params.depth);
        config.set_iterations(params.iterations);
        config.set_min_leaf_size(params.min_leaf_size);
        config.set_debug(false);
        config.set_loss(params.loss.as_config_str());

        let mut train_x = DataVec::with_capacity(x.nrows());
        for (row, &label) in x.rows().into_iter().zip(y.iter()) {
            let train_row = row.iter().map(|&v| v as f32).collect();
            train_x.push(Data::new_training_data(train_row, 1.0, params.loss.target(label), None));
        }

        let model = catch_training_panic(self.name(), move || {
            let mut gbdt = GBDT::new(&config);
            gbdt.fit(&mut train_x);
            gbdt
        })?;

        log::trace!(
            "Fitted gbdt with {} trees (shrinkage {}, depth {})",
            params.iterations,
            params.shrinkage,
            params.depth
        );

        Ok(Box::new(TrainedGbdt {
            model,
            n_features: x.ncols(),
            n_trees: params.iterations,
            loss: params.loss,
        }))
    }
}

/// A fitted booster. Prediction always uses all `n_trees` trees grown during
/// training; the tree count is part of the grid point, not of the caller.
pub struct TrainedGbdt {
    model: GBDT,
    n_features: usize,
    n_trees: usize,
    loss: GbdtLoss,
}

impl TrainedGbdt {
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }
}

impl TrainedModel for TrainedGbdt {
    fn predict(&self, x: ArrayView2<'_, f64>, mode: PredictionMode) -> Result<Predictions> {
        if mode != PredictionMode::RawScore {
            return Err(unsupported("gbdt", mode));
        }
        if x.ncols() != self.n_features {
            return Err(GridError::Training(format!(
                "model trained on {} features, asked to predict {}",
                self.n_features,
                x.ncols()
            )));
        }

        let mut test_x = DataVec::with_capacity(x.nrows());
        for row in x.rows() {
            let test_row = row.iter().map(|&v| v as f32).collect();
            test_x.push(Data::new_test_data(test_row, None));
        }
        let predictions = catch_training_panic("gbdt", || self.model.predict(&test_x))?;

        let scores = predictions
            .into_iter()
            .map(|p| match self.loss {
                GbdtLoss::LogLikelyhood => p as f64,
                GbdtLoss::SquaredError => (p as f64).clamp(0.0, 1.0),
            })
            .collect();
        Ok(Predictions::Scores(scores))
    }
}
