//! Statistical behaviour of the full pipeline
//!
//! These tests run enough repetitions to check that:
//! - Under no effect the estimate is unbiased and the test holds its size
//! - Power grows with the effect size

use crate::analysis::aggregate;
use crate::grid::{FactorLevels, build_grid_seeded};
use crate::model::Outcome;
use crate::simulation::{ExecutionStrategy, run};

#[test]
fn test_size_under_null_with_large_samples() {
    let levels = FactorLevels {
        sample_sizes: vec![10_000],
        effect_sizes: vec![0.0],
        outcomes: vec![Outcome::Change],
        corrections: vec![false],
        iterations: 500,
    };
    let grid = build_grid_seeded(&levels, 31).unwrap();
    let results = run(&grid, ExecutionStrategy::default()).unwrap();

    let mean_estimate = results.iter().map(|r| r.estimate).sum::<f64>() / results.len() as f64;
    let rejection_rate =
        results.iter().filter(|r| r.pvalue < 0.05).count() as f64 / results.len() as f64;

    // Per-repetition sd of the estimate is 0.3 * sqrt(4 / 10_000) = 0.006
    assert!(mean_estimate.abs() < 0.002, "mean estimate {mean_estimate}");
    // Binomial sd of the rate over 500 repetitions is about 0.01
    assert!(
        (0.015..=0.095).contains(&rejection_rate),
        "rejection rate {rejection_rate}"
    );
    assert!(results.iter().all(|r| !r.singular));
}

#[test]
fn test_power_increases_with_effect_size() {
    let levels = FactorLevels {
        sample_sizes: vec![10],
        effect_sizes: vec![0.0, 0.2, 0.5, 1.0],
        outcomes: vec![Outcome::Change],
        corrections: vec![false, true],
        iterations: 400,
    };
    let grid = build_grid_seeded(&levels, 5).unwrap();
    let results = run(&grid, ExecutionStrategy::default()).unwrap();
    let summaries = aggregate(&grid, &results);
    assert_eq!(summaries.len(), 8);

    for correction in [false, true] {
        let powers: Vec<f64> = summaries
            .iter()
            .filter(|s| s.correction == correction)
            .map(|s| s.power.unwrap())
            .collect();
        assert_eq!(powers.len(), 4);
        for pair in powers.windows(2) {
            assert!(pair[1] >= pair[0], "power not monotone: {powers:?}");
        }
        assert!(powers[3] > 0.9, "power at effect 1.0: {}", powers[3]);
        assert!(powers[0] < 0.12, "size at effect 0.0: {}", powers[0]);
    }
}

#[test]
fn test_bias_near_zero_for_all_designs() {
    let levels = FactorLevels {
        sample_sizes: vec![40],
        effect_sizes: vec![0.5],
        outcomes: Outcome::ALL.to_vec(),
        corrections: vec![false, true],
        iterations: 300,
    };
    let grid = build_grid_seeded(&levels, 8).unwrap();
    let results = run(&grid, ExecutionStrategy::default()).unwrap();

    for summary in aggregate(&grid, &results) {
        let bias = summary.bias.unwrap();
        // The post outcome without correction is by far the noisiest:
        // sd of one estimate is about 3 * sqrt(4 / 40) = 0.95
        assert!(bias.abs() < 0.25, "{summary:?}");
        assert!(summary.bias_lo.unwrap() <= bias && bias <= summary.bias_hi.unwrap());
        assert_eq!(summary.n, 300);
    }
}
