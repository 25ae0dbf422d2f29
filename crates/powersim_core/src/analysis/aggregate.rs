//! Collapse per-row results into per-condition power and bias summaries.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::stats::{QuantileMethod, mean, proportion_interval, quantile_sorted};
use crate::model::{AggregateSummary, Condition, ConditionKey, EstimationResult, GridRow};

/// Options for `aggregate_with`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateOptions {
    /// A result rejects the null when `pvalue < alpha`
    pub alpha: f64,
    /// Lower and upper quantiles of the bias interval
    pub bias_quantiles: (f64, f64),
    pub quantile: QuantileMethod,
    /// Normal critical value for the power interval
    pub z: f64,
    /// Drop results from singular designs before grouping
    pub exclude_singular: bool,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            bias_quantiles: (0.025, 0.975),
            quantile: QuantileMethod::Nearest,
            z: 1.96,
            exclude_singular: false,
        }
    }
}

/// Repetitions collected for one condition
struct Group {
    key: ConditionKey,
    biases: Vec<f64>,
    rejections: usize,
}

impl Group {
    fn new(condition: &Condition) -> Self {
        Self {
            key: condition.key(),
            biases: Vec::new(),
            rejections: 0,
        }
    }

    fn summarize(mut self, options: &AggregateOptions) -> AggregateSummary {
        let n = self.biases.len();
        let mut summary = AggregateSummary::empty(self.key);
        if n == 0 {
            return summary;
        }

        self.biases.sort_unstable_by(f64::total_cmp);
        let (q_lo, q_hi) = options.bias_quantiles;
        let power = self.rejections as f64 / n as f64;
        let (power_lo, power_hi) = proportion_interval(power, n, options.z);

        summary.bias = mean(&self.biases);
        summary.bias_lo = quantile_sorted(&self.biases, q_lo, options.quantile);
        summary.bias_hi = quantile_sorted(&self.biases, q_hi, options.quantile);
        summary.power = Some(power);
        summary.power_lo = Some(power_lo);
        summary.power_hi = Some(power_hi);
        summary.n = n;
        summary
    }
}

/// Aggregate with the default options
pub fn aggregate(grid: &[GridRow], results: &[EstimationResult]) -> Vec<AggregateSummary> {
    aggregate_with(grid, results, &AggregateOptions::default())
}

/// Join results to the grid by `row_id` and summarize per condition.
///
/// Grid rows without a result (an unfinished run) only reduce `n`. Results
/// whose `row_id` is not in the grid, or whose estimate or p-value is not
/// finite, are ignored. Every condition of the grid gets one summary, in
/// grid order of first appearance; conditions without any contributing
/// repetition are reported with `n = 0` and no statistics.
pub fn aggregate_with(
    grid: &[GridRow],
    results: &[EstimationResult],
    options: &AggregateOptions,
) -> Vec<AggregateSummary> {
    let mut by_row: FxHashMap<usize, &EstimationResult> = FxHashMap::default();
    for result in results.iter().filter(|r| r.is_finite()) {
        by_row.entry(result.row_id).or_insert(result);
    }

    let mut groups: Vec<Group> = Vec::new();
    let mut index: FxHashMap<ConditionKey, usize> = FxHashMap::default();
    let mut joined = 0;

    for row in grid {
        let slot = *index.entry(row.condition.key()).or_insert_with(|| {
            groups.push(Group::new(&row.condition));
            groups.len() - 1
        });

        let Some(result) = by_row.get(&row.row_id) else {
            continue;
        };
        if options.exclude_singular && result.singular {
            continue;
        }

        let group = &mut groups[slot];
        group.biases.push(result.estimate - row.condition.effect_size);
        if result.pvalue < options.alpha {
            group.rejections += 1;
        }
        joined += 1;
    }

    tracing::debug!(
        grid_rows = grid.len(),
        results = results.len(),
        joined,
        groups = groups.len(),
        "aggregated simulation results"
    );

    groups.into_iter().map(|g| g.summarize(options)).collect()
}
