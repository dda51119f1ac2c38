use linfa::traits::{Fit, Predict};
use linfa::Dataset;
use linfa_svm::{Svm, SvmParams};
use ndarray::{Array1, ArrayView2, Axis};

use crate::data_handling::LabelSet;
use crate::error::{GridError, Result};
use crate::grid::HyperparameterTuple;
use crate::models::adapter::{unsupported, ModelAdapter, PredictionMode, Predictions, TrainedModel};
use crate::models::random_forest::majority;
use crate::models::utils::{catch_training_panic, check_training_input, positive_f64};

const KNOWN_PARAMS: &[&str] = &["kernel", "cost", "gamma", "degree", "coef0", "eps"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Kernel {
    Linear,
    /// `exp(-gamma * |x - y|^2)`
    Gaussian { gamma: f64 },
    /// `(x . y + coef0)^degree`
    Polynomial { coef0: f64, degree: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SvmHyperparams {
    pub kernel: Kernel,
    pub cost: f64,
    pub eps: f64,
}

impl Default for SvmHyperparams {
    fn default() -> Self {
        Self {
            kernel: Kernel::Linear,
            cost: 1.0,
            eps: 1e-3,
        }
    }
}

impl SvmHyperparams {
    pub fn from_tuple(params: &HyperparameterTuple) -> Result<Self> {
        params.ensure_known(KNOWN_PARAMS)?;
        let kernel = match params.get_str("kernel")?.unwrap_or("linear") {
            "linear" => Kernel::Linear,
            "gaussian" | "gauss" | "radial" => Kernel::Gaussian {
                gamma: positive_f64(params, "gamma", 1.0)?,
            },
            "polynomial" | "poly" => Kernel::Polynomial {
                coef0: params.get_f64("coef0")?.unwrap_or(1.0),
                degree: positive_f64(params, "degree", 3.0)?,
            },
            other => {
                return Err(GridError::Training(format!(
                    "Unsupported kernel type: {}. Valid options are: linear, gaussian, polynomial",
                    other
                )))
            }
        };
        Ok(Self {
            kernel,
            cost: positive_f64(params, "cost", 1.0)?,
            eps: positive_f64(params, "eps", 1e-3)?,
        })
    }

    fn machine_params(&self) -> SvmParams<f64, bool> {
        let params = Svm::<f64, bool>::params()
            .eps(self.eps)
            .pos_neg_weights(self.cost, self.cost);
        match self.kernel {
            Kernel::Linear => params.linear_kernel(),
            // linfa's gaussian kernel divides the squared distance by `eps`
            Kernel::Gaussian { gamma } => params.gaussian_kernel(1.0 / gamma),
            Kernel::Polynomial { coef0, degree } => params.polynomial_kernel(coef0, degree),
        }
    }
}

/// Support vector machine backed by `linfa-svm`.
///
/// `linfa-svm` classifiers are binary, so `k` classes are handled one-vs-one:
/// a machine per label pair, each sample taking the label with most pairwise
/// wins. Only class labels are produced.
#[derive(Debug, Default, Clone)]
pub struct SupportVectorMachineAdapter;

impl SupportVectorMachineAdapter {
    pub fn new() -> Self {
        SupportVectorMachineAdapter
    }
}

impl ModelAdapter for SupportVectorMachineAdapter {
    fn name(&self) -> &str {
        "svm"
    }

    fn supported_modes(&self) -> &'static [PredictionMode] {
        &[PredictionMode::ClassLabel]
    }

    fn fit(
        &self,
        x: ArrayView2<'_, f64>,
        y: &[usize],
        labels: &LabelSet,
        params: &HyperparameterTuple,
    ) -> Result<Box<dyn TrainedModel>> {
        check_training_input(&x, y, labels)?;
        let hyper = SvmHyperparams::from_tuple(params)?;

        let present: Vec<usize> = labels
            .labels()
            .filter(|label| y.contains(label))
            .collect();
        if present.len() < 2 {
            return Err(GridError::Training(format!(
                "svm needs at least two classes in the training data, found {:?}",
                present
            )));
        }

        let mut machines = Vec::new();
        for (i, &negative) in present.iter().enumerate() {
            for &positive in &present[i + 1..] {
                let rows: Vec<usize> = (0..y.len())
                    .filter(|&r| y[r] == negative || y[r] == positive)
                    .collect();
                let records = x.select(Axis(0), &rows);
                let targets: Array1<bool> = rows.iter().map(|&r| y[r] == positive).collect();
                let dataset = Dataset::new(records, targets);

                let machine_params = hyper.machine_params();
                let machine = catch_training_panic(self.name(), || machine_params.fit(&dataset))?
                    .map_err(|e| {
                        GridError::Training(format!(
                            "svm for classes {} vs {}: {}",
                            negative, positive, e
                        ))
                    })?;
                machines.push(PairwiseMachine {
                    negative,
                    positive,
                    machine,
                });
            }
        }

        log::trace!(
            "Fitted {} pairwise svm machine(s) with {:?}",
            machines.len(),
            hyper.kernel
        );

        Ok(Box::new(TrainedSvm {
            machines,
            n_features: x.ncols(),
            n_classes: labels.n_classes(),
        }))
    }
}

struct PairwiseMachine {
    negative: usize,
    positive: usize,
    machine: Svm<f64, bool>,
}

pub struct TrainedSvm {
    machines: Vec<PairwiseMachine>,
    n_features: usize,
    n_classes: usize,
}

impl TrainedModel for TrainedSvm {
    fn predict(&self, x: ArrayView2<'_, f64>, mode: PredictionMode) -> Result<Predictions> {
        if mode != PredictionMode::ClassLabel {
            return Err(unsupported("svm", mode));
        }
        if x.ncols() != self.n_features {
            return Err(GridError::Training(format!(
                "svm trained on {} features, asked to predict {}",
                self.n_features,
                x.ncols()
            )));
        }

        let records = x.to_owned();
        let mut votes = vec![vec![0usize; self.n_classes]; x.nrows()];
        for pair in &self.machines {
            let decisions: Array1<bool> = pair.machine.predict(&records);
            for (sample, &is_positive) in decisions.iter().enumerate() {
                let winner = if is_positive { pair.positive } else { pair.negative };
                votes[sample][winner] += 1;
            }
        }
        Ok(Predictions::Labels(votes.iter().map(|v| majority(v)).collect()))
    }
}
