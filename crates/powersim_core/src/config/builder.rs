//! Fluent builder for `SimulationConfig`

use super::SimulationConfig;
use crate::error::InvalidFactorError;
use crate::model::Outcome;

/// Builder for simulation configs, validated on `build`
#[derive(Debug, Clone, Default)]
pub struct SimulationBuilder {
    config: SimulationConfig,
}

impl SimulationBuilder {
    /// Start from the default study design
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Factor levels
    // =========================================================================

    #[must_use]
    pub fn sample_sizes(mut self, sizes: impl IntoIterator<Item = usize>) -> Self {
        self.config.factors.sample_sizes = sizes.into_iter().collect();
        self
    }

    #[must_use]
    pub fn effect_sizes(mut self, effects: impl IntoIterator<Item = f64>) -> Self {
        self.config.factors.effect_sizes = effects.into_iter().collect();
        self
    }

    #[must_use]
    pub fn outcomes(mut self, outcomes: impl IntoIterator<Item = Outcome>) -> Self {
        self.config.factors.outcomes = outcomes.into_iter().collect();
        self
    }

    #[must_use]
    pub fn corrections(mut self, corrections: impl IntoIterator<Item = bool>) -> Self {
        self.config.factors.corrections = corrections.into_iter().collect();
        self
    }

    /// Number of repetitions per condition
    #[must_use]
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.config.factors.iterations = iterations;
        self
    }

    // =========================================================================
    // Execution
    // =========================================================================

    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    #[must_use]
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = Some(workers);
        self.config.sequential = false;
        self
    }

    #[must_use]
    pub fn sequential(mut self) -> Self {
        self.config.sequential = true;
        self
    }

    /// Validate the factor levels and return the config
    pub fn build(self) -> Result<SimulationConfig, InvalidFactorError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FactorAxis;
    use crate::simulation::ExecutionStrategy;

    #[test]
    fn test_builder_sets_levels() {
        let config = SimulationBuilder::new()
            .sample_sizes([6, 10])
            .effect_sizes([0.0, 0.5])
            .outcomes([Outcome::Change])
            .corrections([true])
            .iterations(3)
            .seed(7)
            .workers(2)
            .build()
            .unwrap();

        assert_eq!(config.factors.shape(), [2, 2, 1, 1, 3]);
        assert_eq!(config.seed, 7);
        assert_eq!(
            config.strategy(),
            ExecutionStrategy::Parallel { workers: Some(2) }
        );
    }

    #[test]
    fn test_builder_sequential() {
        let config = SimulationBuilder::new().sequential().build().unwrap();
        assert_eq!(config.strategy(), ExecutionStrategy::Sequential);
    }

    #[test]
    fn test_builder_rejects_empty_axis() {
        let err = SimulationBuilder::new().outcomes([]).build().unwrap_err();
        assert_eq!(err, InvalidFactorError::EmptyAxis(FactorAxis::Outcome));
    }
}
