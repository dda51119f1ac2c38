use gridbench_classifiers::config::{ModelConfig, ModelKind};
use gridbench_classifiers::data_handling::{Dataset, LabelSet, Partition};
use gridbench_classifiers::models::factory::build_adapter;
use gridbench_classifiers::report::{Direction, ExperimentReport, Metric};
use gridbench_classifiers::runner::{GridSearchRunner, RunnerSettings};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn main() {
    env_logger::init();

    // Two noisy blobs: class 1 around (1, 1), class 0 around (-1, -1)
    let n = 200;
    let mut rng = StdRng::seed_from_u64(1);
    let mut values = Vec::with_capacity(n * 2);
    let mut labels = Vec::with_capacity(n);
    for i in 0..n {
        let label = i % 2;
        let center = if label == 1 { 1.0 } else { -1.0 };
        values.push(center + rng.gen_range(-1.5..1.5));
        values.push(center + rng.gen_range(-1.5..1.5));
        labels.push(label);
    }
    let x = Array2::from_shape_vec((n, 2), values).expect("failed to create feature matrix");
    let data = Dataset::new(x, labels, LabelSet::binary()).expect("invalid synthetic dataset");
    data.log_input_data_summary();

    let partition = Partition::random_split(n, 0.7, 42).expect("failed to split");
    let (train, test) = data.split(&partition).expect("failed to split");

    let config = ModelConfig::for_kind(ModelKind::GradientBoostedTrees);
    println!("Grid: {}", serde_json::to_string(&config.grid).unwrap());

    let adapter = build_adapter(config.kind);
    let settings = RunnerSettings {
        evaluate_train: true,
        ..RunnerSettings::default()
    };
    let rows = GridSearchRunner::new(adapter.as_ref(), settings)
        .run(&config.grid, &train, &test)
        .expect("grid search failed");
    let report = ExperimentReport::new(rows);

    for record in report.to_records() {
        println!(
            "{:>3}  {:<40}  test={:.3}  train={:.3}",
            record.index,
            record.params,
            record.test_misclassification_rate,
            record.train_misclassification_rate
        );
    }

    let best = report
        .select_best(Metric::MisclassificationRate, Direction::Minimize)
        .expect("no configuration could be scored");
    println!("Best: {}", best.params);
    if let Some(evaluation) = best.evaluation() {
        println!("{}", evaluation.test.confusion);
    }
}
