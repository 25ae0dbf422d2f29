//! Factorial grid expansion
//!
//! Expands the factor levels into one `GridRow` per combination. Rows are
//! laid out in row-major order over the axes
//! `sample_size, effect_size, outcome, correction, iteration`, so the
//! iteration index varies fastest and `row_id` is the flat position.

use rustc_hash::FxHashSet;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::InvalidFactorError;
use crate::model::{Condition, FactorAxis, GridRow, Outcome};

/// Row seeds are drawn uniformly from `[0, SEED_UPPER)`
pub const SEED_UPPER: u64 = 1 << 31;

fn default_sample_sizes() -> Vec<usize> {
    (4..20).collect()
}

fn default_effect_sizes() -> Vec<f64> {
    (0..=10).map(|i| f64::from(i) / 10.0).collect()
}

fn default_outcomes() -> Vec<Outcome> {
    Outcome::ALL.to_vec()
}

fn default_corrections() -> Vec<bool> {
    vec![false, true]
}

fn default_iterations() -> usize {
    500
}

/// Levels of every factor axis.
///
/// The iteration axis is given as a repetition count `R` and expands to
/// `0..R`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorLevels {
    #[serde(default = "default_sample_sizes")]
    pub sample_sizes: Vec<usize>,
    #[serde(default = "default_effect_sizes")]
    pub effect_sizes: Vec<f64>,
    #[serde(default = "default_outcomes")]
    pub outcomes: Vec<Outcome>,
    #[serde(default = "default_corrections")]
    pub corrections: Vec<bool>,
    #[serde(default = "default_iterations")]
    pub iterations: usize,
}

impl Default for FactorLevels {
    fn default() -> Self {
        Self {
            sample_sizes: default_sample_sizes(),
            effect_sizes: default_effect_sizes(),
            outcomes: default_outcomes(),
            corrections: default_corrections(),
            iterations: default_iterations(),
        }
    }
}

impl FactorLevels {
    /// Number of levels per axis, in expansion order
    pub fn shape(&self) -> [usize; 5] {
        [
            self.sample_sizes.len(),
            self.effect_sizes.len(),
            self.outcomes.len(),
            self.corrections.len(),
            self.iterations,
        ]
    }

    /// Total number of grid rows
    pub fn cardinality(&self) -> usize {
        self.shape().iter().product()
    }

    /// Number of distinct conditions once iterations are collapsed
    pub fn condition_count(&self) -> usize {
        self.shape()[..4].iter().product()
    }

    /// Check that every axis is non-empty and every level is usable
    pub fn validate(&self) -> Result<(), InvalidFactorError> {
        for (axis, len) in FactorAxis::ALL.iter().zip(self.shape()) {
            if len == 0 {
                return Err(InvalidFactorError::EmptyAxis(*axis));
            }
        }

        if let Some(&n) = self.sample_sizes.iter().find(|&&n| n < 2) {
            return Err(InvalidFactorError::SampleSizeTooSmall(n));
        }
        if let Some(&e) = self.effect_sizes.iter().find(|e| !e.is_finite()) {
            return Err(InvalidFactorError::NonFiniteEffectSize(e));
        }

        let mut seen = FxHashSet::default();
        if let Some(n) = self.sample_sizes.iter().find(|n| !seen.insert(**n)) {
            return Err(duplicate(FactorAxis::SampleSize, n));
        }
        let mut seen = FxHashSet::default();
        if let Some(e) = self
            .effect_sizes
            .iter()
            .find(|e| !seen.insert((**e + 0.0).to_bits()))
        {
            return Err(duplicate(FactorAxis::EffectSize, e));
        }
        let mut seen = FxHashSet::default();
        if let Some(o) = self.outcomes.iter().find(|o| !seen.insert(**o)) {
            return Err(duplicate(FactorAxis::Outcome, o));
        }
        let mut seen = FxHashSet::default();
        if let Some(c) = self.corrections.iter().find(|c| !seen.insert(**c)) {
            return Err(duplicate(FactorAxis::Correction, c));
        }

        Ok(())
    }

    /// Recover the condition at a flat grid position without expanding the
    /// whole grid. Returns `None` past the end of the grid.
    pub fn condition_at(&self, row_id: usize) -> Option<Condition> {
        if row_id >= self.cardinality() {
            return None;
        }
        let shape = self.shape();
        let strides = compute_strides(&shape);
        let idx: Vec<usize> = strides
            .iter()
            .zip(shape)
            .map(|(&stride, len)| (row_id / stride) % len)
            .collect();

        Some(Condition {
            sample_size: self.sample_sizes[idx[0]],
            effect_size: self.effect_sizes[idx[1]],
            outcome: self.outcomes[idx[2]],
            correction: self.corrections[idx[3]],
            iteration: idx[4],
        })
    }
}

fn duplicate(axis: FactorAxis, level: impl std::fmt::Debug) -> InvalidFactorError {
    InvalidFactorError::DuplicateLevel {
        axis,
        level: format!("{level:?}"),
    }
}

/// Row-major strides: the last axis varies fastest
fn compute_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

/// Expand the factor levels into the full grid.
///
/// One seed per row is drawn from `rng` in `row_id` order, so the same
/// levels and the same source state always produce the same grid.
pub fn build_grid<R: Rng + ?Sized>(
    levels: &FactorLevels,
    rng: &mut R,
) -> Result<Vec<GridRow>, InvalidFactorError> {
    levels.validate()?;

    let mut rows = Vec::with_capacity(levels.cardinality());
    for &sample_size in &levels.sample_sizes {
        for &effect_size in &levels.effect_sizes {
            for &outcome in &levels.outcomes {
                for &correction in &levels.corrections {
                    for iteration in 0..levels.iterations {
                        rows.push(GridRow {
                            row_id: rows.len(),
                            condition: Condition {
                                sample_size,
                                effect_size,
                                outcome,
                                correction,
                                iteration,
                            },
                            seed: rng.random_range(0..SEED_UPPER),
                        });
                    }
                }
            }
        }
    }

    tracing::debug!(rows = rows.len(), "expanded simulation grid");
    Ok(rows)
}

/// Expand the grid with row seeds drawn from a source seeded by `seed`
pub fn build_grid_seeded(
    levels: &FactorLevels,
    seed: u64,
) -> Result<Vec<GridRow>, InvalidFactorError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    build_grid(levels, &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strides_row_major() {
        assert_eq!(compute_strides(&[2, 3, 4]), vec![12, 4, 1]);
        assert_eq!(compute_strides(&[5]), vec![1]);
        assert!(compute_strides(&[]).is_empty());
    }

    #[test]
    fn test_default_levels_match_reference_study() {
        let levels = FactorLevels::default();
        assert_eq!(levels.shape(), [16, 11, 2, 2, 500]);
        assert_eq!(levels.cardinality(), 16 * 11 * 2 * 2 * 500);
        assert_eq!(levels.condition_count(), 704);
        assert!(levels.validate().is_ok());
    }

    #[test]
    fn test_condition_at_out_of_range() {
        let levels = FactorLevels {
            iterations: 2,
            ..Default::default()
        };
        assert!(levels.condition_at(levels.cardinality()).is_none());
        assert!(levels.condition_at(levels.cardinality() - 1).is_some());
    }
}
