//! Tests for aggregation
//!
//! These tests verify that:
//! - Results join to grid rows by row id; missing rows only reduce `n`
//! - Groups follow grid order and empty groups carry no statistics
//! - Bias and power arithmetic, including interval clipping
//! - Options: singular exclusion, alpha and quantile method

use crate::analysis::{AggregateOptions, QuantileMethod, aggregate, aggregate_with};
use crate::model::{Condition, EstimationResult, GridRow, Outcome};

fn grid_row(row_id: usize, effect_size: f64, outcome: Outcome, correction: bool) -> GridRow {
    GridRow {
        row_id,
        condition: Condition {
            sample_size: 10,
            effect_size,
            outcome,
            correction,
            iteration: row_id,
        },
        seed: row_id as u64,
    }
}

fn result(row_id: usize, estimate: f64, pvalue: f64) -> EstimationResult {
    EstimationResult {
        row_id,
        estimate,
        pvalue,
        singular: false,
    }
}

/// 12 rows: (post, false) 0..3, (post, true) 3..6, (change, false) 6..9,
/// (change, true) 9..12
fn twelve_row_grid() -> Vec<GridRow> {
    let mut grid = Vec::new();
    for outcome in Outcome::ALL {
        for correction in [false, true] {
            for _ in 0..3 {
                let id = grid.len();
                grid.push(grid_row(id, 0.5, outcome, correction));
            }
        }
    }
    grid
}

#[test]
fn test_join_with_partial_results() {
    let grid = twelve_row_grid();
    let results = vec![result(2, 0.4, 0.01), result(5, 0.6, 0.2), result(9, 0.5, 0.03)];

    let summaries = aggregate(&grid, &results);
    assert_eq!(summaries.len(), 4);
    assert_eq!(summaries.iter().map(|s| s.n).sum::<usize>(), 3);

    let counts: Vec<usize> = summaries.iter().map(|s| s.n).collect();
    assert_eq!(counts, vec![1, 1, 0, 1]);

    assert_eq!(summaries[0].outcome, Outcome::Post);
    assert!(!summaries[0].correction);
    assert_eq!(summaries[3].outcome, Outcome::Change);
    assert!(summaries[3].correction);
}

#[test]
fn test_empty_group_has_no_statistics() {
    let grid = twelve_row_grid();
    let summaries = aggregate(&grid, &[]);

    assert_eq!(summaries.len(), 4);
    for summary in &summaries {
        assert_eq!(summary.n, 0);
        assert_eq!(summary.bias, None);
        assert_eq!(summary.bias_lo, None);
        assert_eq!(summary.bias_hi, None);
        assert_eq!(summary.power, None);
        assert_eq!(summary.power_lo, None);
        assert_eq!(summary.power_hi, None);
        assert_eq!(summary.effect_size, 0.5);
        assert_eq!(summary.sample_size, 10);
    }
}

#[test]
fn test_power_and_bias_arithmetic() {
    let grid: Vec<GridRow> = (0..4).map(|i| grid_row(i, 0.5, Outcome::Change, false)).collect();
    // rejects: true, false, true, true
    let results = vec![
        result(0, 0.9, 0.01),
        result(1, 0.1, 0.20),
        result(2, 0.6, 0.03),
        result(3, 0.4, 0.04),
    ];

    let summaries = aggregate(&grid, &results);
    assert_eq!(summaries.len(), 1);
    let s = &summaries[0];

    assert_eq!(s.n, 4);
    assert_eq!(s.power, Some(0.75));
    let se = (0.75_f64 * 0.25 / 4.0).sqrt();
    let power_lo = s.power_lo.unwrap();
    assert!((power_lo - (0.75 - 1.96 * se)).abs() < 1e-12);
    assert_eq!(s.power_hi, Some(1.0));

    // biases: 0.4, -0.4, 0.1, -0.1 -> mean 0
    assert!(s.bias.unwrap().abs() < 1e-12);
    // nearest quantiles of 4 values pick the extremes
    assert!((s.bias_lo.unwrap() + 0.4).abs() < 1e-12);
    assert!((s.bias_hi.unwrap() - 0.4).abs() < 1e-12);
}

#[test]
fn test_degenerate_power_interval() {
    let grid: Vec<GridRow> = (0..3).map(|i| grid_row(i, 1.0, Outcome::Post, true)).collect();
    let all_reject: Vec<_> = (0..3).map(|i| result(i, 1.0, 0.001)).collect();
    let none_reject: Vec<_> = (0..3).map(|i| result(i, 1.0, 0.5)).collect();

    let s = aggregate(&grid, &all_reject)[0];
    assert_eq!((s.power, s.power_lo, s.power_hi), (Some(1.0), Some(1.0), Some(1.0)));

    let s = aggregate(&grid, &none_reject)[0];
    assert_eq!((s.power, s.power_lo, s.power_hi), (Some(0.0), Some(0.0), Some(0.0)));
}

#[test]
fn test_pvalue_at_alpha_does_not_reject() {
    let grid = vec![grid_row(0, 0.0, Outcome::Post, false)];
    let s = aggregate(&grid, &[result(0, 0.0, 0.05)])[0];
    assert_eq!(s.power, Some(0.0));
}

#[test]
fn test_unknown_and_non_finite_results_ignored() {
    let grid: Vec<GridRow> = (0..2).map(|i| grid_row(i, 0.5, Outcome::Post, false)).collect();
    let results = vec![
        result(0, 0.5, 0.01),
        result(1, f64::NAN, 0.01),
        result(99, 0.5, 0.01),
    ];
    let s = aggregate(&grid, &results)[0];
    assert_eq!(s.n, 1);
}

#[test]
fn test_groups_follow_grid_order() {
    let grid = vec![
        grid_row(0, 0.8, Outcome::Post, false),
        grid_row(1, 0.2, Outcome::Post, false),
        grid_row(2, 0.8, Outcome::Post, false),
    ];
    let results = vec![result(0, 0.8, 0.01), result(1, 0.2, 0.5), result(2, 0.6, 0.01)];
    let summaries = aggregate(&grid, &results);

    let effects: Vec<f64> = summaries.iter().map(|s| s.effect_size).collect();
    assert_eq!(effects, vec![0.8, 0.2]);
    assert_eq!(summaries[0].n, 2);
    assert_eq!(summaries[1].n, 1);
}

#[test]
fn test_exclude_singular_option() {
    let grid: Vec<GridRow> = (0..3).map(|i| grid_row(i, 0.5, Outcome::Post, true)).collect();
    let mut results: Vec<_> = (0..3).map(|i| result(i, 0.5, 0.01)).collect();
    results[1].singular = true;

    assert_eq!(aggregate(&grid, &results)[0].n, 3);

    let options = AggregateOptions {
        exclude_singular: true,
        ..Default::default()
    };
    assert_eq!(aggregate_with(&grid, &results, &options)[0].n, 2);
}

#[test]
fn test_custom_alpha_and_linear_quantiles() {
    let grid: Vec<GridRow> = (0..5).map(|i| grid_row(i, 0.0, Outcome::Change, false)).collect();
    let results: Vec<_> = (0..5)
        .map(|i| result(i, i as f64, 0.02 * (i + 1) as f64))
        .collect();

    let options = AggregateOptions {
        alpha: 0.07,
        bias_quantiles: (0.1, 0.9),
        quantile: QuantileMethod::Linear,
        ..Default::default()
    };
    let s = aggregate_with(&grid, &results, &options)[0];

    // p-values 0.02, 0.04, 0.06 reject at alpha 0.07
    assert_eq!(s.power, Some(0.6));
    assert!((s.bias_lo.unwrap() - 0.4).abs() < 1e-12);
    assert!((s.bias_hi.unwrap() - 3.6).abs() < 1e-12);
    assert_eq!(s.bias, Some(2.0));
}
