use linfa::traits::{Fit, Predict};
use linfa::Dataset;
use linfa_trees::DecisionTree;
use ndarray::{Array1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::data_handling::LabelSet;
use crate::error::{GridError, Result};
use crate::grid::HyperparameterTuple;
use crate::models::adapter::{unsupported, ModelAdapter, PredictionMode, Predictions, TrainedModel};
use crate::models::utils::{catch_training_panic, check_training_input, positive_f64, positive_usize};

const KNOWN_PARAMS: &[&str] = &["n_trees", "depth", "feature_fraction", "seed"];

#[derive(Debug, Clone, PartialEq)]
pub struct RandomForestParams {
    pub n_trees: usize,
    /// `None` grows every tree until its leaves are pure.
    pub max_depth: Option<usize>,
    /// Fraction of the columns each tree sees; `None` uses `sqrt(p)` columns.
    pub feature_fraction: Option<f64>,
    pub seed: u64,
}

impl Default for RandomForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            feature_fraction: None,
            seed: 42,
        }
    }
}

impl RandomForestParams {
    pub fn from_tuple(params: &HyperparameterTuple) -> Result<Self> {
        params.ensure_known(KNOWN_PARAMS)?;
        let defaults = RandomForestParams::default();
        let max_depth = match params.get("depth") {
            None => defaults.max_depth,
            Some(_) => Some(positive_usize(params, "depth", 1)?),
        };
        let feature_fraction = match params.get("feature_fraction") {
            None => defaults.feature_fraction,
            Some(_) => {
                let fraction = positive_f64(params, "feature_fraction", 1.0)?;
                if fraction > 1.0 {
                    return Err(GridError::Training(format!(
                        "feature_fraction must be at most 1, got {}",
                        fraction
                    )));
                }
                Some(fraction)
            }
        };
        Ok(Self {
            n_trees: positive_usize(params, "n_trees", defaults.n_trees)?,
            max_depth,
            feature_fraction,
            seed: params.get_usize("seed")?.map(|s| s as u64).unwrap_or(defaults.seed),
        })
    }

    fn features_per_tree(&self, n_columns: usize) -> usize {
        let wanted = match self.feature_fraction {
            Some(fraction) => (n_columns as f64 * fraction).round() as usize,
            None => (n_columns as f64).sqrt().ceil() as usize,
        };
        wanted.clamp(1, n_columns)
    }
}

/// Bagged `linfa-trees` decision trees, each grown on a bootstrap sample of
/// the rows and a random subset of the columns.
#[derive(Debug, Default, Clone)]
pub struct RandomForestAdapter;

impl RandomForestAdapter {
    pub fn new() -> Self {
        RandomForestAdapter
    }
}

impl ModelAdapter for RandomForestAdapter {
    fn name(&self) -> &str {
        "random_forest"
    }

    fn supported_modes(&self) -> &'static [PredictionMode] {
        &[PredictionMode::RawScore, PredictionMode::ClassLabel]
    }

    /// A vote fraction is a single score, so raw scores need two classes.
    fn supports_for(&self, mode: PredictionMode, labels: &LabelSet) -> bool {
        match mode {
            PredictionMode::RawScore => labels.is_binary(),
            PredictionMode::ClassLabel => true,
        }
    }

    fn fit(
        &self,
        x: ArrayView2<'_, f64>,
        y: &[usize],
        labels: &LabelSet,
        params: &HyperparameterTuple,
    ) -> Result<Box<dyn TrainedModel>> {
        check_training_input(&x, y, labels)?;
        let params = RandomForestParams::from_tuple(params)?;

        let n_samples = x.nrows();
        let n_columns = x.ncols();
        let per_tree = params.features_per_tree(n_columns);
        let mut rng = StdRng::seed_from_u64(params.seed);

        let mut members = Vec::with_capacity(params.n_trees);
        for _ in 0..params.n_trees {
            let rows: Vec<usize> = (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();
            let mut columns = rand::seq::index::sample(&mut rng, n_columns, per_tree).into_vec();
            columns.sort_unstable();

            let records = x.select(Axis(0), &rows).select(Axis(1), &columns);
            let targets: Array1<usize> = rows.iter().map(|&r| y[r]).collect();
            let dataset = Dataset::new(records, targets);

            let tree_params = DecisionTree::<f64, usize>::params().max_depth(params.max_depth);
            let tree = catch_training_panic(self.name(), || tree_params.fit(&dataset))?
                .map_err(|e| GridError::Training(format!("decision tree: {}", e)))?;
            members.push(ForestMember { tree, columns });
        }

        log::trace!(
            "Fitted random forest with {} trees over {} of {} columns each",
            params.n_trees,
            per_tree,
            n_columns
        );

        Ok(Box::new(TrainedForest {
            members,
            n_features: n_columns,
            n_classes: labels.n_classes(),
        }))
    }
}

struct ForestMember {
    tree: DecisionTree<f64, usize>,
    columns: Vec<usize>,
}

pub struct TrainedForest {
    members: Vec<ForestMember>,
    n_features: usize,
    n_classes: usize,
}

impl TrainedForest {
    /// Per-sample vote counts, indexed by label.
    fn votes(&self, x: &ArrayView2<'_, f64>) -> Vec<Vec<usize>> {
        let mut votes = vec![vec![0usize; self.n_classes]; x.nrows()];
        for member in &self.members {
            let records = x.select(Axis(1), &member.columns);
            let predicted: Array1<usize> = member.tree.predict(&records);
            for (sample, &label) in predicted.iter().enumerate() {
                votes[sample][label] += 1;
            }
        }
        votes
    }
}

impl TrainedModel for TrainedForest {
    fn predict(&self, x: ArrayView2<'_, f64>, mode: PredictionMode) -> Result<Predictions> {
        if x.ncols() != self.n_features {
            return Err(GridError::Training(format!(
                "forest trained on {} features, asked to predict {}",
                self.n_features,
                x.ncols()
            )));
        }
        match mode {
            PredictionMode::RawScore => {
                // a single vote fraction only makes sense with two classes
                if self.n_classes != 2 {
                    return Err(unsupported("random_forest", mode));
                }
                let n_trees = self.members.len() as f64;
                let scores = self
                    .votes(&x)
                    .iter()
                    .map(|v| v[1] as f64 / n_trees)
                    .collect();
                Ok(Predictions::Scores(scores))
            }
            PredictionMode::ClassLabel => {
                let labels = self.votes(&x).iter().map(|v| majority(v)).collect();
                Ok(Predictions::Labels(labels))
            }
        }
    }
}

/// Label with the most votes; ties go to the lowest label.
pub(crate) fn majority(votes: &[usize]) -> usize {
    let mut best = 0;
    for (label, &count) in votes.iter().enumerate() {
        if count > votes[best] {
            best = label;
        }
    }
    best
}
