//! Integration tests for the powersim simulation engine
//!
//! Tests are organized by topic:
//! - `grid` - Factorial expansion, row ids and seed reproducibility
//! - `generate` - Synthetic sample determinism and treatment assignment
//! - `estimator` - OLS fits, p-values and singular designs
//! - `runner` - Serial/parallel execution and row attribution
//! - `aggregate` - Join, grouping and interval arithmetic
//! - `statistical` - Type I error and power behaviour over many repetitions

mod aggregate;
mod statistical;
