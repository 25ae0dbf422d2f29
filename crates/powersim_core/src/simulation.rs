use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{DesignError, RunError};
use crate::estimate::estimate;
use crate::generate::generate;
use crate::model::{EstimationResult, GridRow};

/// How grid rows are mapped to results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStrategy {
    Sequential,
    /// Fixed-size worker pool. `workers: None` sizes the pool to the
    /// available cores.
    Parallel { workers: Option<usize> },
}

impl Default for ExecutionStrategy {
    fn default() -> Self {
        ExecutionStrategy::Parallel { workers: None }
    }
}

/// Simulate a single grid row: generate its sample, then estimate.
///
/// Reads nothing but the row itself, which is what makes rows safe to run
/// in any order on any worker.
pub fn run_row(row: &GridRow) -> Result<EstimationResult, DesignError> {
    let c = &row.condition;
    let sample = generate(c.sample_size, c.effect_size, row.seed);
    let estimate = estimate(&sample, c.outcome, c.correction)?;
    Ok(estimate.into_result(row.row_id))
}

fn evaluate(row: &GridRow) -> Result<EstimationResult, RunError> {
    run_row(row).map_err(|source| RunError::Design {
        row_id: row.row_id,
        source,
    })
}

/// Maps grid rows to results with a fixed execution strategy.
///
/// A parallel runner owns its worker pool, so running many chunks through
/// one runner spawns the workers once.
pub struct Runner {
    strategy: ExecutionStrategy,
    #[cfg(feature = "parallel")]
    pool: Option<rayon::ThreadPool>,
}

impl Runner {
    pub fn new(strategy: ExecutionStrategy) -> Result<Self, RunError> {
        #[cfg(feature = "parallel")]
        let pool = match strategy {
            ExecutionStrategy::Sequential => None,
            ExecutionStrategy::Parallel { workers } => Some(build_pool(workers)?),
        };

        Ok(Self {
            strategy,
            #[cfg(feature = "parallel")]
            pool,
        })
    }

    pub fn strategy(&self) -> ExecutionStrategy {
        self.strategy
    }

    /// Number of threads rows are spread over
    #[cfg(feature = "parallel")]
    pub fn workers(&self) -> usize {
        self.pool
            .as_ref()
            .map_or(1, |pool| pool.current_num_threads())
    }

    #[cfg(not(feature = "parallel"))]
    pub fn workers(&self) -> usize {
        1
    }

    /// Run every row. Returns exactly one result per row, sorted by
    /// `row_id`. The first row that fails to estimate aborts the run.
    pub fn run(&self, rows: &[GridRow]) -> Result<Vec<EstimationResult>, RunError> {
        tracing::debug!(rows = rows.len(), strategy = ?self.strategy, "running grid rows");

        let mut results = self.evaluate_all(rows)?;

        // Completion order never decides attribution: every result carries its
        // own row_id, and the output is put back into grid order here.
        results.sort_unstable_by_key(|r| r.row_id);

        let singular = results.iter().filter(|r| r.singular).count();
        if singular > 0 {
            tracing::debug!(singular, total = results.len(), "singular designs in run");
        }

        Ok(results)
    }

    /// Run only the rows whose `row_id` is not in `completed`
    pub fn run_pending(
        &self,
        grid: &[GridRow],
        completed: &FxHashSet<usize>,
    ) -> Result<Vec<EstimationResult>, RunError> {
        let pending: Vec<GridRow> = grid
            .iter()
            .filter(|row| !completed.contains(&row.row_id))
            .copied()
            .collect();
        tracing::debug!(
            pending = pending.len(),
            completed = grid.len() - pending.len(),
            "resuming simulation run"
        );
        self.run(&pending)
    }

    #[cfg(feature = "parallel")]
    fn evaluate_all(&self, rows: &[GridRow]) -> Result<Vec<EstimationResult>, RunError> {
        match &self.pool {
            Some(pool) => pool.install(|| rows.par_iter().map(evaluate).collect()),
            None => rows.iter().map(evaluate).collect(),
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn evaluate_all(&self, rows: &[GridRow]) -> Result<Vec<EstimationResult>, RunError> {
        rows.iter().map(evaluate).collect()
    }
}

#[cfg(feature = "parallel")]
fn build_pool(workers: Option<usize>) -> Result<rayon::ThreadPool, RunError> {
    let mut builder =
        rayon::ThreadPoolBuilder::new().thread_name(|i| format!("powersim-worker-{i}"));
    if let Some(workers) = workers {
        builder = builder.num_threads(workers);
    }
    builder
        .build()
        .map_err(|e| RunError::ThreadPool(e.to_string()))
}

/// Run every grid row with a runner built for this call.
///
/// Returns exactly one result per row, sorted by `row_id`. The first row
/// that fails to estimate aborts the run.
pub fn run(
    grid: &[GridRow],
    strategy: ExecutionStrategy,
) -> Result<Vec<EstimationResult>, RunError> {
    Runner::new(strategy)?.run(grid)
}

/// Run only the grid rows whose `row_id` is not in `completed`.
///
/// Used to resume an interrupted run from a checkpoint of earlier results.
pub fn run_pending(
    grid: &[GridRow],
    completed: &FxHashSet<usize>,
    strategy: ExecutionStrategy,
) -> Result<Vec<EstimationResult>, RunError> {
    Runner::new(strategy)?.run_pending(grid, completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Condition, Outcome};

    fn row(row_id: usize, sample_size: usize, seed: u64) -> GridRow {
        GridRow {
            row_id,
            condition: Condition {
                sample_size,
                effect_size: 0.5,
                outcome: Outcome::Post,
                correction: false,
                iteration: 0,
            },
            seed,
        }
    }

    #[test]
    fn test_run_row_tags_row_id() {
        let result = run_row(&row(17, 10, 3)).unwrap();
        assert_eq!(result.row_id, 17);
    }

    #[test]
    fn test_results_sorted_by_row_id() {
        let grid = vec![row(4, 6, 1), row(1, 6, 2), row(3, 6, 3)];
        let results = run(&grid, ExecutionStrategy::Sequential).unwrap();
        let ids: Vec<usize> = results.iter().map(|r| r.row_id).collect();
        assert_eq!(ids, vec![1, 3, 4]);
    }

    #[test]
    fn test_design_error_aborts_run() {
        let grid = vec![row(0, 10, 1), row(1, 2, 2), row(2, 10, 3)];
        let err = run(&grid, ExecutionStrategy::Sequential).unwrap_err();
        match err {
            RunError::Design { row_id, source } => {
                assert_eq!(row_id, 1);
                assert_eq!(
                    source,
                    DesignError::TooFewUnits {
                        units: 2,
                        minimum: 3
                    }
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_run_pending_skips_completed() {
        let grid: Vec<GridRow> = (0..6).map(|i| row(i, 8, i as u64)).collect();
        let completed: FxHashSet<usize> = [0, 2, 5].into_iter().collect();
        let results = run_pending(&grid, &completed, ExecutionStrategy::Sequential).unwrap();
        let ids: Vec<usize> = results.iter().map(|r| r.row_id).collect();
        assert_eq!(ids, vec![1, 3, 4]);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_runner_reuses_pool_across_chunks() {
        let grid: Vec<GridRow> = (0..12).map(|i| row(i, 8, 100 + i as u64)).collect();
        let expected = run(&grid, ExecutionStrategy::Sequential).unwrap();

        let runner = Runner::new(ExecutionStrategy::Parallel { workers: Some(3) }).unwrap();
        assert_eq!(runner.workers(), 3);

        let mut chunked = Vec::new();
        for chunk in grid.chunks(5) {
            chunked.extend(runner.run(chunk).unwrap());
        }
        assert_eq!(chunked, expected);
        assert_eq!(runner.workers(), 3);
    }

    #[test]
    fn test_sequential_runner_has_one_worker() {
        let runner = Runner::new(ExecutionStrategy::Sequential).unwrap();
        assert_eq!(runner.workers(), 1);
        assert_eq!(runner.strategy(), ExecutionStrategy::Sequential);
    }
}
