use approx::assert_relative_eq;
use gridbench_classifiers::binning::{empirical_quantile, QuantileBinner, ThresholdBinner};
use gridbench_classifiers::error::GridError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn test_threshold_assigns_cutoff_to_positive() {
    let binner = ThresholdBinner::new(0.5);
    let labels = binner.assign(&[0.0, 0.49, 0.5, 0.51, 1.0]).unwrap();
    assert_eq!(labels, vec![0, 0, 1, 1, 1]);
}

#[test]
fn test_threshold_output_is_binary_for_any_cutoff() {
    let mut rng = StdRng::seed_from_u64(7);
    let scores: Vec<f64> = (0..200).map(|_| rng.gen::<f64>()).collect();
    for cutoff in [0.0, 0.1, 0.5, 0.9, 1.0] {
        let labels = ThresholdBinner::new(cutoff).assign(&scores).unwrap();
        assert!(labels.iter().all(|&l| l <= 1));
        for (s, l) in scores.iter().zip(&labels) {
            assert_eq!(*l == 1, *s >= cutoff);
        }
    }
}

#[test]
fn test_uniform_scores_split_into_thirds() {
    let mut rng = StdRng::seed_from_u64(2024);
    let scores: Vec<f64> = (0..300).map(|_| rng.gen::<f64>()).collect();
    let binner = QuantileBinner::fit(&scores, &[0.33, 0.66]).unwrap();
    let labels = binner.assign(&scores).unwrap();

    let mut counts = [0usize; 3];
    for l in labels {
        counts[l] += 1;
    }
    for (class, &count) in counts.iter().enumerate() {
        assert!(
            (95..=105).contains(&count),
            "class {} holds {} of 300 samples",
            class,
            count
        );
    }
}

#[test]
fn test_quantile_interpolates_linearly() {
    let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
    // h = 4 * 0.33 = 1.32 -> 2 + 0.32 * (3 - 2)
    assert_relative_eq!(empirical_quantile(&sorted, 0.33).unwrap(), 2.32);
    assert_relative_eq!(empirical_quantile(&sorted, 0.5).unwrap(), 3.0);
    assert_relative_eq!(empirical_quantile(&sorted, 1.0).unwrap(), 5.0);
    assert_relative_eq!(empirical_quantile(&[7.0], 0.66).unwrap(), 7.0);
}

#[test]
fn test_quantile_assignment_boundaries() {
    let scores = [0.0, 0.25, 0.5, 0.75, 1.0];
    let binner = QuantileBinner::fit(&scores, &[0.25, 0.75]).unwrap();
    assert_eq!(binner.cutpoints(), &[0.25, 0.75]);
    // a score equal to a cutpoint stays in the lower class
    let labels = binner.assign(&[0.1, 0.25, 0.3, 0.75, 0.8]).unwrap();
    assert_eq!(labels, vec![0, 0, 1, 1, 2]);
}

#[test]
fn test_degenerate_distribution_is_rejected() {
    let scores = vec![0.5; 50];
    assert!(matches!(
        QuantileBinner::fit(&scores, &[0.33, 0.66]),
        Err(GridError::InvalidScores(_))
    ));
    assert!(matches!(
        QuantileBinner::fit(&[0.1, 0.2, 0.3], &[0.66, 0.33]),
        Err(GridError::InvalidScores(_))
    ));
    assert!(matches!(
        ThresholdBinner::default().assign(&[0.2, f64::NAN]),
        Err(GridError::InvalidScores(_))
    ));
}
