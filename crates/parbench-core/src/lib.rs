//! # parbench-core
//!
//! Partitioning, accumulation strategies, and task decomposition for
//! shared-memory reductions over an index domain, each returning its result
//! together with the elapsed time so strategies can be compared.

pub mod accumulate;
pub mod aggregate;
pub mod constants;
pub mod contribution;
pub mod error;
pub mod matrix;
pub mod options;
pub mod partition;
pub mod pool;
pub mod sort;
pub mod strategy;
pub mod tasks;

// Re-exports
pub use accumulate::{
    accumulate, accumulate_with, sequential_sum, AccumulationResult, MergeDiscipline,
};
pub use aggregate::Aggregate;
pub use constants::{
    exit_codes, DEFAULT_CUTOFF, DEFAULT_TASKS, DEFAULT_WORKERS, MAX_LOCKED_WORKERS,
};
pub use contribution::{Contribution, DotProductTerm, Identity, MidpointPi};
pub use error::ParError;
pub use matrix::{multiply, Matrix, MatrixStrategy};
pub use options::Options;
pub use partition::{Domain, PartitionScheme, WorkRange, WorkerLayout};
pub use sort::{parallel_quicksort, quicksort, SortReport};
pub use strategy::{invoke, Strategy};
pub use tasks::{fixed_task_sum, recursive_task_sum, Decomposition, TaskStats};

/// Estimate π by the midpoint rule over `intervals` intervals.
///
/// # Example
/// ```
/// use parbench_core::{estimate_pi, Options, Strategy};
///
/// let run = estimate_pi(10_000, Strategy::Reduction, &Options::with_workers(2)).unwrap();
/// assert!((run.value - std::f64::consts::PI).abs() < 1e-6);
/// ```
pub fn estimate_pi(
    intervals: u64,
    strategy: Strategy,
    options: &Options,
) -> Result<AccumulationResult<f64>, ParError> {
    let pi = MidpointPi::new(intervals);
    invoke(Domain::zero_based(intervals), strategy, options, &pi)
        .map(|run| run.map(|sum| pi.finish(sum)))
}

/// Sum the integers `1..=n`.
///
/// # Example
/// ```
/// use parbench_core::{sum_integers, Options, Strategy};
///
/// let run = sum_integers(10, Strategy::Atomic, &Options::with_workers(2)).unwrap();
/// assert_eq!(run.value, 55);
/// ```
pub fn sum_integers(
    n: u64,
    strategy: Strategy,
    options: &Options,
) -> Result<AccumulationResult<u64>, ParError> {
    invoke(Domain::one_based(n), strategy, options, &Identity)
}
