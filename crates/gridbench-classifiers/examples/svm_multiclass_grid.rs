use gridbench_classifiers::config::ModelKind;
use gridbench_classifiers::data_handling::{Dataset, LabelSet, Partition};
use gridbench_classifiers::grid::HyperparameterGrid;
use gridbench_classifiers::labels::{derive_multiclass_labels, DEFAULT_QUANTILES};
use gridbench_classifiers::models::factory::build_adapter;
use gridbench_classifiers::report::{Direction, ExperimentReport, Metric};
use gridbench_classifiers::runner::{GridSearchRunner, RunnerSettings};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn main() {
    env_logger::init();

    // Binary label driven by a linear score with noise
    let n = 150;
    let mut rng = StdRng::seed_from_u64(5);
    let mut values = Vec::with_capacity(n * 3);
    let mut binary = Vec::with_capacity(n);
    for _ in 0..n {
        let row: [f64; 3] = [rng.gen_range(-2.0..2.0), rng.gen_range(-2.0..2.0), rng.gen_range(-1.0..1.0)];
        let signal = row[0] + 0.5 * row[1] + rng.gen_range(-0.5..0.5);
        values.extend_from_slice(&row);
        binary.push(usize::from(signal > 0.0));
    }
    let x = Array2::from_shape_vec((n, 3), values).expect("failed to create feature matrix");

    // low / medium / high target from the binary one
    let (multiclass, binner) = derive_multiclass_labels(x.view(), &binary, &DEFAULT_QUANTILES)
        .expect("failed to derive multiclass labels");
    println!("Cutpoints: {:?}", binner.cutpoints());

    let data = Dataset::new(x, multiclass, LabelSet::new(binner.n_classes()).unwrap())
        .expect("invalid dataset");
    let (train, test) = data
        .split(&Partition::random_split(n, 0.7, 9).expect("failed to split"))
        .expect("failed to split");

    let grid = HyperparameterGrid::new()
        .axis("kernel", ["linear", "gaussian"])
        .axis("cost", [0.1, 1.0, 10.0]);
    let settings = RunnerSettings {
        mode: ModelKind::SupportVectorMachine.default_mode(),
        positive_label: Some(2),
        ..RunnerSettings::default()
    };
    let adapter = build_adapter(ModelKind::SupportVectorMachine);
    let rows = GridSearchRunner::new(adapter.as_ref(), settings)
        .run(&grid, &train, &test)
        .expect("grid search failed");
    let report = ExperimentReport::new(rows);

    for row in report.rows() {
        match row.evaluation() {
            Some(e) => println!(
                "{:<30} misclassification={:.3} sensitivity(high)={:?}",
                row.params.to_string(),
                e.test.misclassification_rate,
                e.test.sensitivity
            ),
            None => println!("{:<30} failed: {}", row.params.to_string(), row.error().unwrap_or("")),
        }
    }
    if let Ok(best) = report.select_best(Metric::MisclassificationRate, Direction::Minimize) {
        println!("Best: {}", best.params);
    }
}
