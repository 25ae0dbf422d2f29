//! Estimation results and aggregate summaries
//!
//! Contains the output types of the runner (one `EstimationResult` per grid
//! row) and of the aggregator (one `AggregateSummary` per condition).

use serde::{Deserialize, Serialize};

use super::condition::{ConditionKey, Outcome};

/// Treatment effect extracted from a single fitted model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    /// Coefficient of the treatment indicator
    pub estimate: f64,
    /// Two-sided p-value of the treatment coefficient
    pub pvalue: f64,
    /// The design's cross-product matrix is (near) rank deficient
    pub singular: bool,
}

impl Estimate {
    pub fn into_result(self, row_id: usize) -> EstimationResult {
        EstimationResult {
            row_id,
            estimate: self.estimate,
            pvalue: self.pvalue,
            singular: self.singular,
        }
    }
}

/// Result record for one grid row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimationResult {
    pub row_id: usize,
    pub estimate: f64,
    pub pvalue: f64,
    pub singular: bool,
}

impl EstimationResult {
    /// Whether both numeric fields can take part in aggregation
    pub fn is_finite(&self) -> bool {
        self.estimate.is_finite() && self.pvalue.is_finite()
    }
}

/// Power and bias summary for one condition, aggregated over repetitions.
///
/// All statistics are `None` when no repetition contributed (`n == 0`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregateSummary {
    pub sample_size: usize,
    pub effect_size: f64,
    pub outcome: Outcome,
    pub correction: bool,
    pub bias: Option<f64>,
    pub bias_lo: Option<f64>,
    pub bias_hi: Option<f64>,
    pub power: Option<f64>,
    pub power_lo: Option<f64>,
    pub power_hi: Option<f64>,
    pub n: usize,
}

impl AggregateSummary {
    /// A summary with no contributing repetitions
    pub fn empty(key: ConditionKey) -> Self {
        Self {
            sample_size: key.sample_size,
            effect_size: key.effect_size(),
            outcome: key.outcome,
            correction: key.correction,
            bias: None,
            bias_lo: None,
            bias_hi: None,
            power: None,
            power_lo: None,
            power_hi: None,
            n: 0,
        }
    }
}
