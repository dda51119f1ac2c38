use approx::assert_relative_eq;
use gridbench_classifiers::data_handling::LabelSet;
use gridbench_classifiers::error::GridError;
use gridbench_classifiers::metrics::{
    misclassification_rate, sensitivity, specificity, ConfusionMatrix, SplitMetrics,
};

/// Deterministic pseudo-random labels, no rng needed for a fixed fixture.
fn labels(n: usize, k: usize, salt: usize) -> Vec<usize> {
    (0..n).map(|i| (i * 7 + salt * 13 + i / 3) % k).collect()
}

#[test]
fn test_counts_sum_to_sample_count() {
    for k in 2..6 {
        let set = LabelSet::new(k).unwrap();
        let predicted = labels(97, k, 1);
        let actual = labels(97, k, 2);
        let cm = ConfusionMatrix::tabulate(&predicted, &actual, &set).unwrap();
        assert_eq!(cm.total(), 97);
        assert_eq!(cm.rows().iter().flatten().sum::<usize>(), 97);
        assert_eq!(cm.n_classes(), k);
    }
}

#[test]
fn test_perfect_predictions_score_zero_error() {
    let set = LabelSet::new(3).unwrap();
    let actual = labels(60, 3, 4);
    let cm = ConfusionMatrix::tabulate(&actual, &actual, &set).unwrap();
    assert_eq!(misclassification_rate(&cm).unwrap(), 0.0);
    for label in 0..3 {
        assert_eq!(sensitivity(&cm, label).unwrap(), 1.0);
        assert_eq!(specificity(&cm, label).unwrap(), 1.0);
    }
}

#[test]
fn test_error_rate_is_invariant_under_joint_permutation() {
    let set = LabelSet::binary();
    let predicted = labels(40, 2, 5);
    let actual = labels(40, 2, 6);
    let base = misclassification_rate(&ConfusionMatrix::tabulate(&predicted, &actual, &set).unwrap())
        .unwrap();

    // reverse then rotate both sequences with the same permutation
    let permutation: Vec<usize> = (0..40).rev().map(|i| (i + 11) % 40).collect();
    let p: Vec<usize> = permutation.iter().map(|&i| predicted[i]).collect();
    let a: Vec<usize> = permutation.iter().map(|&i| actual[i]).collect();
    let permuted = misclassification_rate(&ConfusionMatrix::tabulate(&p, &a, &set).unwrap()).unwrap();
    assert_relative_eq!(base, permuted);
}

#[test]
fn test_rates_follow_a_relabelling_of_the_classes() {
    let set = LabelSet::new(3).unwrap();
    let predicted = labels(70, 3, 2);
    let actual = labels(70, 3, 9);
    let before = ConfusionMatrix::tabulate(&predicted, &actual, &set).unwrap();

    // label i becomes relabel[i] in both sequences
    let relabel = [2, 0, 1];
    let p: Vec<usize> = predicted.iter().map(|&l| relabel[l]).collect();
    let a: Vec<usize> = actual.iter().map(|&l| relabel[l]).collect();
    let after = ConfusionMatrix::tabulate(&p, &a, &set).unwrap();

    assert_relative_eq!(
        misclassification_rate(&before).unwrap(),
        misclassification_rate(&after).unwrap()
    );
    for label in 0..3 {
        assert_relative_eq!(
            sensitivity(&before, label).unwrap(),
            sensitivity(&after, relabel[label]).unwrap()
        );
        assert_relative_eq!(
            specificity(&before, label).unwrap(),
            specificity(&after, relabel[label]).unwrap()
        );
    }
}

#[test]
fn test_binary_rates_by_hand() {
    // actual:    1 1 1 1 0 0 0 0 0 0
    // predicted: 1 1 1 0 0 0 0 0 1 1
    let actual = [1, 1, 1, 1, 0, 0, 0, 0, 0, 0];
    let predicted = [1, 1, 1, 0, 0, 0, 0, 0, 1, 1];
    let cm = ConfusionMatrix::tabulate(&predicted, &actual, &LabelSet::binary()).unwrap();
    let metrics = SplitMetrics::from_confusion(cm, Some(1)).unwrap();
    assert_relative_eq!(metrics.misclassification_rate, 0.3);
    assert_relative_eq!(metrics.sensitivity.unwrap(), 0.75);
    assert_relative_eq!(metrics.specificity.unwrap(), 4.0 / 6.0);
    assert_relative_eq!(metrics.accuracy(), 0.7);
}

#[test]
fn test_tabulate_rejects_bad_input() {
    let set = LabelSet::binary();
    assert!(matches!(
        ConfusionMatrix::tabulate(&[0, 1], &[0], &set),
        Err(GridError::ShapeMismatch { predicted: 2, actual: 1 })
    ));
    assert!(matches!(
        ConfusionMatrix::tabulate(&[], &[], &set),
        Err(GridError::EmptyInput)
    ));
    assert!(matches!(
        ConfusionMatrix::tabulate(&[0, 3], &[0, 1], &set),
        Err(GridError::LabelOutOfRange { label: 3, n_classes: 2 })
    ));
}

#[test]
fn test_undefined_rates_are_none() {
    let cm = ConfusionMatrix::tabulate(&[0, 1, 0], &[0, 0, 0], &LabelSet::binary()).unwrap();
    assert!(matches!(sensitivity(&cm, 1), Err(GridError::UndefinedMetric(_))));
    let metrics = SplitMetrics::from_confusion(cm, Some(1)).unwrap();
    assert!(metrics.sensitivity.is_none());
    assert_relative_eq!(metrics.specificity.unwrap(), 2.0 / 3.0);
}
