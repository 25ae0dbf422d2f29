//! Monte Carlo power and bias simulation for pre/post treatment designs
//!
//! This crate provides the simulation engine. It supports:
//! - Full factorial grids over sample size, effect size, outcome transform
//!   and covariate correction, with one reproducible seed per row
//! - Synthetic two-group pre/post data generated from a private random stream
//! - OLS estimation of the treatment effect with rank-deficiency detection
//! - Sequential or worker-pool execution with results keyed by `row_id`
//! - Aggregation into bias and power summaries with intervals
//!
//! # Example
//!
//! ```ignore
//! use powersim_core::{SimulationBuilder, aggregate, run};
//!
//! let config = SimulationBuilder::new()
//!     .sample_sizes([10, 20, 40])
//!     .effect_sizes([0.0, 0.5])
//!     .iterations(200)
//!     .seed(1)
//!     .build()?;
//!
//! let grid = config.build_grid()?;
//! let results = run(&grid, config.strategy())?;
//! let summaries = aggregate(&grid, &results);
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod analysis;
pub mod error;
pub mod estimate;
pub mod generate;
pub mod grid;
pub mod linalg;
pub mod simulation;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod config;
pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use analysis::{AggregateOptions, aggregate, aggregate_with};
pub use config::{SimulationBuilder, SimulationConfig};
pub use error::{DesignError, GeneratorError, InvalidFactorError, RunError};
pub use estimate::{Design, OlsFit, estimate, fit_ols};
pub use generate::{GeneratorParams, generate, generate_with};
pub use grid::{FactorLevels, build_grid, build_grid_seeded};
pub use simulation::{ExecutionStrategy, Runner, run, run_pending, run_row};
