//! Simulation conditions and grid rows
//!
//! A `Condition` is one cell of the factorial design plus its repetition
//! index. A `GridRow` tags a condition with its position in the grid and the
//! seed for its private random stream.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Response transform fed to the estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Use the post measurement as the response
    Post,
    /// Use the pre/post difference as the response
    Change,
}

impl Outcome {
    pub const ALL: [Outcome; 2] = [Outcome::Post, Outcome::Change];

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Post => "post",
            Outcome::Change => "change",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The axes of the factorial design, in expansion order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorAxis {
    SampleSize,
    EffectSize,
    Outcome,
    Correction,
    Iteration,
}

impl FactorAxis {
    pub const ALL: [FactorAxis; 5] = [
        FactorAxis::SampleSize,
        FactorAxis::EffectSize,
        FactorAxis::Outcome,
        FactorAxis::Correction,
        FactorAxis::Iteration,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FactorAxis::SampleSize => "sample_size",
            FactorAxis::EffectSize => "effect_size",
            FactorAxis::Outcome => "outcome",
            FactorAxis::Correction => "correction",
            FactorAxis::Iteration => "iteration",
        }
    }
}

impl fmt::Display for FactorAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One cell of the factorial design for a single repetition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub sample_size: usize,
    pub effect_size: f64,
    pub outcome: Outcome,
    pub correction: bool,
    /// Repetition index. Not a statistical factor.
    pub iteration: usize,
}

impl Condition {
    /// Grouping key over the statistical factors (everything but `iteration`)
    pub fn key(&self) -> ConditionKey {
        ConditionKey {
            sample_size: self.sample_size,
            // +0.0 folds -0.0 into 0.0 so both land in the same group
            effect_bits: (self.effect_size + 0.0).to_bits(),
            outcome: self.outcome,
            correction: self.correction,
        }
    }
}

/// Hashable identity of a condition with the repetition index removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConditionKey {
    pub sample_size: usize,
    effect_bits: u64,
    pub outcome: Outcome,
    pub correction: bool,
}

impl ConditionKey {
    pub fn effect_size(&self) -> f64 {
        f64::from_bits(self.effect_bits)
    }
}

/// A condition tagged with its grid position and random seed.
///
/// Serializes flat, matching the grid record columns:
/// `row_id, sample_size, effect_size, outcome, correction, iteration, seed`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridRow {
    pub row_id: usize,
    #[serde(flatten)]
    pub condition: Condition,
    pub seed: u64,
}
