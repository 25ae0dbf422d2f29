//! Aggregation of simulation results.
//!
//! Results are joined to the grid by `row_id` and grouped by condition
//! (`sample_size`, `effect_size`, `outcome`, `correction`). Each group
//! reports:
//!
//! - `bias`: mean of `estimate - effect_size`, with an empirical
//!   2.5% / 97.5% quantile interval
//! - `power`: share of repetitions with `pvalue < 0.05`, with a
//!   normal-approximation interval clipped to `[0, 1]`
//!
//! ```ignore
//! use powersim_core::analysis::{AggregateOptions, aggregate_with};
//!
//! let summaries = aggregate_with(&grid, &results, &AggregateOptions {
//!     exclude_singular: true,
//!     ..Default::default()
//! });
//! ```
//!
//! Note the two intervals are built differently: bias uses quantiles of the
//! simulated distribution, power uses the binomial standard error.

mod aggregate;
mod stats;

pub use aggregate::*;
pub use stats::*;
