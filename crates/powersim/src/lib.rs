//! Command-line front end for powersim studies
//!
//! Loads a YAML study config, persists the grid, results and summary as
//! JSON Lines in an output directory, and logs progress to stderr and a log
//! file next to the records.

pub mod commands;
pub mod config;
pub mod logging;
pub mod storage;

pub use commands::{RunOptions, RunReport, aggregate_results, build_grid, run_grid, simulate};
pub use config::load_config;
pub use logging::init_logging;
pub use storage::{OutputDirectory, StorageError};
