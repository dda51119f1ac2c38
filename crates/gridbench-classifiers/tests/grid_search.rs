use std::sync::atomic::{AtomicUsize, Ordering};

use gridbench_classifiers::binning::{QuantileBinner, ScoreBinner};
use gridbench_classifiers::data_handling::{Dataset, LabelSet};
use gridbench_classifiers::error::{GridError, Result};
use gridbench_classifiers::grid::{HyperparameterGrid, HyperparameterTuple, ParamValue};
use gridbench_classifiers::models::{ModelAdapter, PredictionMode, Predictions, TrainedModel};
use gridbench_classifiers::report::{ExperimentReport, RowOutcome};
use gridbench_classifiers::runner::{CancellationToken, GridSearchRunner, RunnerSettings};
use ndarray::{Array2, ArrayView2};

/// Scores a sample as `scale * x0 + bias`. Fails for one chosen `(scale, bias)`
/// pair and can cancel a shared token when a given bias is trained.
#[derive(Default)]
struct LinearStub {
    fail_on: Option<(i64, f64)>,
    cancel_on_bias: Option<(f64, CancellationToken)>,
}

struct LinearModel {
    scale: f64,
    bias: f64,
}

impl ModelAdapter for LinearStub {
    fn name(&self) -> &str {
        "linear-stub"
    }

    fn supported_modes(&self) -> &'static [PredictionMode] {
        &[PredictionMode::RawScore]
    }

    fn fit(
        &self,
        _x: ArrayView2<'_, f64>,
        _y: &[usize],
        _labels: &LabelSet,
        params: &HyperparameterTuple,
    ) -> Result<Box<dyn TrainedModel>> {
        let scale = params.get_usize("scale")?.unwrap_or(1) as i64;
        let bias = params.get_f64("bias")?.unwrap_or(0.0);
        if self.fail_on == Some((scale, bias)) {
            return Err(GridError::Training("stub refuses this point".to_string()));
        }
        if let Some((trigger, token)) = &self.cancel_on_bias {
            if *trigger == bias {
                token.cancel();
            }
        }
        Ok(Box::new(LinearModel {
            scale: scale as f64,
            bias,
        }))
    }
}

impl TrainedModel for LinearModel {
    fn predict(&self, x: ArrayView2<'_, f64>, _mode: PredictionMode) -> Result<Predictions> {
        Ok(Predictions::Scores(
            x.column(0).iter().map(|v| self.scale * v + self.bias).collect(),
        ))
    }
}

fn dataset() -> Dataset {
    let values: Vec<f64> = (0..20).map(|i| i as f64 / 20.0).collect();
    let labels: Vec<usize> = values.iter().map(|&v| usize::from(v >= 0.5)).collect();
    let x = Array2::from_shape_vec((20, 1), values).unwrap();
    Dataset::new(x, labels, LabelSet::binary()).unwrap()
}

fn grid_3x4() -> HyperparameterGrid {
    HyperparameterGrid::new()
        .axis("scale", [1i64, 2, 3])
        .axis("bias", [0.0, 0.1, 0.2, 0.3])
}

fn sequential() -> RunnerSettings {
    RunnerSettings {
        threads: Some(1),
        ..RunnerSettings::default()
    }
}

#[test]
fn test_one_row_per_grid_point_in_order() {
    let data = dataset();
    let stub = LinearStub::default();
    let rows = GridSearchRunner::new(&stub, sequential())
        .run(&grid_3x4(), &data, &data)
        .unwrap();

    assert_eq!(rows.len(), 12);
    let tuples: Vec<String> = rows.iter().map(|r| r.params.to_string()).collect();
    assert_eq!(tuples[0], "scale=1, bias=0");
    assert_eq!(tuples[1], "scale=1, bias=0.1");
    assert_eq!(tuples[4], "scale=2, bias=0");
    assert_eq!(tuples[11], "scale=3, bias=0.3");
    let mut distinct = tuples.clone();
    distinct.sort();
    distinct.dedup();
    assert_eq!(distinct.len(), 12);
    for (i, row) in rows.iter().enumerate() {
        assert_eq!(row.index, i);
        assert!(!row.is_failed());
    }
    // identity scores on [0, 1) reproduce the labels exactly
    assert_eq!(rows[0].evaluation().unwrap().test.misclassification_rate, 0.0);
}

#[test]
fn test_failed_point_does_not_disturb_the_rest() {
    let data = dataset();
    let baseline = GridSearchRunner::new(&LinearStub::default(), sequential())
        .run(&grid_3x4(), &data, &data)
        .unwrap();

    let failing = LinearStub {
        fail_on: Some((2, 0.1)),
        ..LinearStub::default()
    };
    let rows = GridSearchRunner::new(&failing, sequential())
        .run(&grid_3x4(), &data, &data)
        .unwrap();

    assert_eq!(rows.len(), 12);
    let failed: Vec<usize> = rows.iter().filter(|r| r.is_failed()).map(|r| r.index).collect();
    assert_eq!(failed, vec![5]);
    assert!(rows[5].error().unwrap().contains("stub refuses"));
    for (row, expected) in rows.iter().zip(&baseline) {
        if row.index != 5 {
            assert_eq!(row.outcome, expected.outcome);
            assert_eq!(row.params, expected.params);
        }
    }
}

#[test]
fn test_unsupported_mode_aborts_the_run() {
    let data = dataset();
    let settings = RunnerSettings {
        mode: PredictionMode::ClassLabel,
        ..sequential()
    };
    let result = GridSearchRunner::new(&LinearStub::default(), settings).run(&grid_3x4(), &data, &data);
    assert!(matches!(result, Err(GridError::UnsupportedMode { .. })));
}

/// Raw scores for binary label sets only; counts how often it is trained.
#[derive(Default)]
struct BinaryScorer {
    fits: AtomicUsize,
}

impl ModelAdapter for BinaryScorer {
    fn name(&self) -> &str {
        "binary-scorer"
    }

    fn supported_modes(&self) -> &'static [PredictionMode] {
        &[PredictionMode::RawScore]
    }

    fn supports_for(&self, mode: PredictionMode, labels: &LabelSet) -> bool {
        self.supports(mode) && labels.is_binary()
    }

    fn fit(
        &self,
        _x: ArrayView2<'_, f64>,
        _y: &[usize],
        _labels: &LabelSet,
        _params: &HyperparameterTuple,
    ) -> Result<Box<dyn TrainedModel>> {
        self.fits.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(LinearModel { scale: 1.0, bias: 0.0 }))
    }
}

#[test]
fn test_label_dependent_mode_is_rejected_before_training() {
    let values: Vec<f64> = (0..30).map(|i| i as f64 / 30.0).collect();
    let labels: Vec<usize> = (0..30).map(|i| i / 10).collect();
    let binner = QuantileBinner::fit(&values, &[0.33, 0.66]).unwrap();
    let x = Array2::from_shape_vec((30, 1), values).unwrap();
    let three = Dataset::new(x, labels, LabelSet::new(3).unwrap()).unwrap();

    let adapter = BinaryScorer::default();
    let settings = RunnerSettings {
        binner: ScoreBinner::Quantile(binner),
        positive_label: None,
        ..sequential()
    };
    let result = GridSearchRunner::new(&adapter, settings).run(&grid_3x4(), &three, &three);
    assert!(matches!(result, Err(GridError::UnsupportedMode { .. })));
    assert_eq!(adapter.fits.load(Ordering::SeqCst), 0);

    let data = dataset();
    let rows = GridSearchRunner::new(&adapter, sequential())
        .run(&grid_3x4(), &data, &data)
        .unwrap();
    assert_eq!(rows.len(), 12);
    assert_eq!(adapter.fits.load(Ordering::SeqCst), 12);
}

#[test]
fn test_parallel_and_sequential_tables_match() {
    let data = dataset();
    let stub = LinearStub {
        fail_on: Some((3, 0.2)),
        ..LinearStub::default()
    };
    let seq = GridSearchRunner::new(&stub, sequential())
        .run(&grid_3x4(), &data, &data)
        .unwrap();
    for threads in [None, Some(4)] {
        let settings = RunnerSettings {
            threads,
            ..RunnerSettings::default()
        };
        let par = GridSearchRunner::new(&stub, settings)
            .run(&grid_3x4(), &data, &data)
            .unwrap();
        assert_eq!(par.len(), seq.len());
        for (a, b) in par.iter().zip(&seq) {
            assert_eq!(a.index, b.index);
            assert_eq!(a.params, b.params);
            assert_eq!(a.outcome, b.outcome);
        }
    }
}

#[test]
fn test_cancellation_stops_before_next_point() {
    let data = dataset();
    let token = CancellationToken::new();
    let stub = LinearStub {
        cancel_on_bias: Some((0.2, token.clone())),
        ..LinearStub::default()
    };
    let rows = GridSearchRunner::new(&stub, sequential())
        .with_cancellation(token.clone())
        .run(&grid_3x4(), &data, &data)
        .unwrap();

    // the point that triggered cancellation completes, nothing after it starts
    assert!(token.is_cancelled());
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| matches!(r.outcome, RowOutcome::Scored(_))));

    let report = ExperimentReport::from_run(rows, grid_3x4().len());
    assert!(!report.is_complete());
    assert_eq!(report.scored_count(), 3);
}

#[test]
fn test_train_side_is_scored_on_request() {
    let data = dataset();
    let settings = RunnerSettings {
        evaluate_train: true,
        ..sequential()
    };
    let grid = HyperparameterGrid::new().axis("bias", [ParamValue::Float(0.32)]);
    let rows = GridSearchRunner::new(&LinearStub::default(), settings)
        .run(&grid, &data, &data)
        .unwrap();
    let evaluation = rows[0].evaluation().unwrap();
    let train = evaluation.train.as_ref().unwrap();
    assert_eq!(train.misclassification_rate, evaluation.test.misclassification_rate);
    // bias 0.32 moves 0.2, 0.25, ..., 0.45 over the cutoff
    assert!((evaluation.test.misclassification_rate - 0.3).abs() < 1e-12);
}
