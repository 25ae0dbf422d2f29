//! Summary statistics used by the aggregator

use serde::{Deserialize, Serialize};

/// How empirical quantiles are read off sorted data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantileMethod {
    /// Value at index `round(q · (n - 1))`
    #[default]
    Nearest,
    /// Linear interpolation between the two neighbouring order statistics
    Linear,
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Empirical `q`-quantile of data already sorted ascending.
///
/// `None` for empty data or a `q` outside `[0, 1]`.
pub fn quantile_sorted(sorted: &[f64], q: f64, method: QuantileMethod) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    match method {
        QuantileMethod::Nearest => Some(sorted[pos.round() as usize]),
        QuantileMethod::Linear => {
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            let frac = pos - lo as f64;
            Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
        }
    }
}

/// Normal-approximation interval for a proportion, clipped to `[0, 1]`.
///
/// `se = sqrt(p (1 - p) / n)`; the interval is `p ± z · se`. A proportion of
/// exactly 0 or 1 yields a point interval. `n` must be positive.
pub fn proportion_interval(p: f64, n: usize, z: f64) -> (f64, f64) {
    let se = (p * (1.0 - p) / n as f64).sqrt();
    (
        (p - z * se).clamp(0.0, 1.0),
        (p + z * se).clamp(0.0, 1.0),
    )
}
