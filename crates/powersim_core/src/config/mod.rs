//! Simulation configuration
//!
//! `SimulationConfig` holds everything needed to reproduce a run: the factor
//! levels, the master seed the row seeds are drawn from, and the worker
//! count. It deserializes from YAML/JSON with every field optional.
//!
//! ```ignore
//! use powersim_core::config::SimulationBuilder;
//!
//! let config = SimulationBuilder::new()
//!     .sample_sizes(4..20)
//!     .effect_sizes([0.0, 0.2, 0.5])
//!     .iterations(1000)
//!     .seed(2024)
//!     .workers(8)
//!     .build()?;
//! ```

use serde::{Deserialize, Serialize};

use crate::error::InvalidFactorError;
use crate::grid::{FactorLevels, build_grid_seeded};
use crate::model::GridRow;
use crate::simulation::ExecutionStrategy;

pub mod builder;

pub use builder::SimulationBuilder;

fn default_seed() -> u64 {
    42
}

/// Complete simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub factors: FactorLevels,
    /// Seed of the source the per-row seeds are drawn from
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Worker pool size; `None` uses one worker per core
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    /// Run rows one after another instead of on a worker pool
    #[serde(default)]
    pub sequential: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            factors: FactorLevels::default(),
            seed: default_seed(),
            workers: None,
            sequential: false,
        }
    }
}

impl SimulationConfig {
    pub fn strategy(&self) -> ExecutionStrategy {
        if self.sequential {
            ExecutionStrategy::Sequential
        } else {
            ExecutionStrategy::Parallel {
                workers: self.workers,
            }
        }
    }

    pub fn validate(&self) -> Result<(), InvalidFactorError> {
        self.factors.validate()
    }

    /// Expand the configured grid. Identical configs give identical grids.
    pub fn build_grid(&self) -> Result<Vec<GridRow>, InvalidFactorError> {
        build_grid_seeded(&self.factors, self.seed)
    }
}
