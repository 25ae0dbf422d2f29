//! The grid / run / aggregate steps of a simulation study
//!
//! Each step reads its inputs from and writes its outputs to an
//! `OutputDirectory`, so a study can be run in one go or step by step, and
//! an interrupted run picks up where it stopped.

use color_eyre::eyre::{WrapErr, bail};

use powersim_core::model::{AggregateSummary, GridRow};
use powersim_core::{
    AggregateOptions, ExecutionStrategy, Runner, SimulationConfig, aggregate_with,
};

use crate::storage::OutputDirectory;

pub const DEFAULT_CHUNK_SIZE: usize = 5000;

/// Fraction of singular fits above which a run logs a warning
const SINGULAR_WARN_FRACTION: f64 = 0.01;

/// Build the grid for `config` and write it, with the config, to `out`.
///
/// If `out` already holds a grid, it must be the same grid: the results
/// file is keyed by row id and would otherwise be silently misattributed.
pub fn build_grid(config: &SimulationConfig, out: &OutputDirectory) -> color_eyre::Result<usize> {
    let grid = config.build_grid().wrap_err("Invalid factor levels")?;
    out.init()?;

    if out.grid_path().exists() {
        let existing = out
            .load_grid()
            .wrap_err("Failed to read existing grid")?;
        if existing != grid {
            bail!(
                "{} already holds a different grid; use a fresh output directory",
                out.root().display()
            );
        }
        tracing::info!(rows = grid.len(), "grid already present, keeping it");
        return Ok(grid.len());
    }

    out.save_config(config)?;
    out.save_grid(&grid)?;
    tracing::info!(
        rows = grid.len(),
        conditions = config.factors.condition_count(),
        iterations = config.factors.iterations,
        path = %out.grid_path().display(),
        "grid written"
    );
    Ok(grid.len())
}

/// Options for the run step
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub strategy: ExecutionStrategy,
    /// Rows run and appended per batch
    pub chunk_size: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            strategy: ExecutionStrategy::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Counts from one invocation of the run step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub total: usize,
    /// Rows that already had a result before this invocation
    pub skipped: usize,
    /// Rows run by this invocation
    pub completed: usize,
    /// Rows run by this invocation whose fit was singular
    pub singular: usize,
}

/// Run every grid row in `out` that does not have a result yet.
///
/// Rows are run in chunks; each chunk's results are appended to the
/// results file before the next chunk starts.
pub fn run_grid(out: &OutputDirectory, options: RunOptions) -> color_eyre::Result<RunReport> {
    if options.chunk_size == 0 {
        bail!("chunk size must be at least 1");
    }

    let grid = out
        .load_grid()
        .wrap_err("Failed to load grid; run the grid step first")?;
    let done = out
        .completed_rows()
        .wrap_err("Failed to read existing results")?;
    let pending: Vec<GridRow> = grid
        .iter()
        .filter(|row| !done.contains(&row.row_id))
        .copied()
        .collect();

    let mut report = RunReport {
        total: grid.len(),
        skipped: grid.len() - pending.len(),
        ..Default::default()
    };
    if report.skipped > 0 {
        tracing::info!(
            skipped = report.skipped,
            pending = pending.len(),
            "resuming from existing results"
        );
    }

    let runner = Runner::new(options.strategy).wrap_err("Failed to start workers")?;
    tracing::debug!(workers = runner.workers(), "runner ready");

    let mut writer = out.result_writer()?;
    for chunk in pending.chunks(options.chunk_size) {
        let results = runner.run(chunk).wrap_err("Simulation run aborted")?;
        writer.append_all(&results)?;

        report.completed += results.len();
        report.singular += results.iter().filter(|r| r.singular).count();
        tracing::info!(
            done = report.skipped + report.completed,
            total = report.total,
            "progress: {:.1}%",
            100.0 * (report.skipped + report.completed) as f64 / report.total.max(1) as f64
        );
    }

    if report.completed > 0 {
        let fraction = report.singular as f64 / report.completed as f64;
        if fraction > SINGULAR_WARN_FRACTION {
            tracing::warn!(
                singular = report.singular,
                completed = report.completed,
                "{:.1}% of fits had a singular design",
                100.0 * fraction
            );
        }
    }
    tracing::info!(
        completed = report.completed,
        written = writer.written(),
        "run finished"
    );
    Ok(report)
}

/// Join the results in `out` to its grid and write the summary table
pub fn aggregate_results(
    out: &OutputDirectory,
    options: &AggregateOptions,
) -> color_eyre::Result<Vec<AggregateSummary>> {
    let grid = out.load_grid().wrap_err("Failed to load grid")?;
    let results = out.load_results().wrap_err("Failed to load results")?;
    if results.len() < grid.len() {
        tracing::warn!(
            results = results.len(),
            rows = grid.len(),
            "results are incomplete; summaries cover finished rows only"
        );
    }

    let summaries = aggregate_with(&grid, &results, options);
    out.save_summary(&summaries)?;
    tracing::info!(
        conditions = summaries.len(),
        path = %out.summary_path().display(),
        "summary written"
    );
    Ok(summaries)
}

/// Grid, run and aggregate in one go
pub fn simulate(
    config: &SimulationConfig,
    out: &OutputDirectory,
    run_options: RunOptions,
    aggregate_options: &AggregateOptions,
) -> color_eyre::Result<Vec<AggregateSummary>> {
    build_grid(config, out)?;
    run_grid(out, run_options)?;
    aggregate_results(out, aggregate_options)
}
