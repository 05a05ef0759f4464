//! Task-based decomposition: fixed task counts and recursive halving.
//!
//! Tasks run inside a per-invocation pool. Spawning is structured: a parent
//! returns only after every task it spawned has completed, and the top-level
//! call returns only after the whole tree has joined.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, trace};

use crate::accumulate::AccumulationResult;
use crate::aggregate::Aggregate;
use crate::contribution::Contribution;
use crate::error::ParError;
use crate::partition::{blocks, Domain, WorkRange};
use crate::pool::build_pool;

/// Spawn instrumentation for one decomposition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    /// Number of tasks spawned (the initiating call is not counted).
    pub spawned: usize,
    /// Size of the smallest spawned task, if any was spawned.
    pub smallest_spawned: Option<u64>,
    /// Deepest recursion level at which a task was spawned.
    pub max_depth: usize,
}

/// Thread-safe spawn counter shared by every task of one invocation.
#[derive(Debug)]
pub(crate) struct SpawnCounter {
    spawned: AtomicUsize,
    smallest: AtomicU64,
    max_depth: AtomicUsize,
}

impl SpawnCounter {
    pub(crate) fn new() -> Self {
        Self {
            spawned: AtomicUsize::new(0),
            smallest: AtomicU64::new(u64::MAX),
            max_depth: AtomicUsize::new(0),
        }
    }

    /// Record a task of `size` indices spawned at `depth`.
    pub(crate) fn record(&self, size: u64, depth: usize) {
        self.spawned.fetch_add(1, Ordering::Relaxed);
        self.smallest.fetch_min(size, Ordering::Relaxed);
        self.max_depth.fetch_max(depth, Ordering::Relaxed);
        trace!(size, depth, "task spawned");
    }

    pub(crate) fn snapshot(&self) -> TaskStats {
        let spawned = self.spawned.load(Ordering::Relaxed);
        TaskStats {
            spawned,
            smallest_spawned: (spawned > 0).then(|| self.smallest.load(Ordering::Relaxed)),
            max_depth: self.max_depth.load(Ordering::Relaxed),
        }
    }
}

/// Result of a recursive decomposition: the aggregate plus spawn statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Decomposition<T> {
    /// Aggregate and elapsed time.
    pub result: AccumulationResult<T>,
    /// Spawn instrumentation.
    pub stats: TaskStats,
}

/// Sum `domain` as exactly `tasks` equal contiguous blocks, one task per
/// block, on a pool of `workers` threads. Each task merges its local sum with
/// one atomic add.
///
/// Fails with [`ParError::InvalidPartition`] before any work when the domain
/// size is not a multiple of `tasks`.
pub fn fixed_task_sum<T, C>(
    domain: Domain,
    tasks: usize,
    workers: usize,
    contribution: &C,
) -> Result<AccumulationResult<T>, ParError>
where
    T: Aggregate,
    C: Contribution<T> + ?Sized,
{
    let ranges = blocks(domain, tasks)?;
    let pool = build_pool(workers)?;

    let start = Instant::now();
    let total = T::new_cell(T::ZERO);
    pool.scope(|s| {
        for range in &ranges {
            let total = &total;
            s.spawn(move |_| {
                let local = sum_sequential(*range, contribution);
                T::fetch_add(total, local);
            });
        }
    });
    let value = T::load(&total);
    let elapsed = start.elapsed();

    debug!(tasks, workers, size = domain.len(), ?elapsed, "fixed-task sum complete");
    Ok(AccumulationResult { value, elapsed })
}

/// Sum `domain` by recursive halving on a pool of `workers` threads.
///
/// A subrange of at most `cutoff` indices is summed sequentially in the
/// current task; larger subranges are spawned. Partials are returned up the
/// tree, so no shared aggregate is needed.
pub fn recursive_task_sum<T, C>(
    domain: Domain,
    cutoff: usize,
    workers: usize,
    contribution: &C,
) -> Result<Decomposition<T>, ParError>
where
    T: Aggregate,
    C: Contribution<T> + ?Sized,
{
    if cutoff == 0 {
        return Err(ParError::Zero("cutoff"));
    }
    let range = domain.range()?;
    let pool = build_pool(workers)?;
    let counter = SpawnCounter::new();

    let start = Instant::now();
    let value = pool.install(|| sum_branch(range, cutoff as u64, 0, contribution, &counter));
    let elapsed = start.elapsed();

    let stats = counter.snapshot();
    debug!(
        cutoff,
        workers,
        spawned = stats.spawned,
        ?elapsed,
        "recursive-task sum complete"
    );
    Ok(Decomposition {
        result: AccumulationResult { value, elapsed },
        stats,
    })
}

/// Fold `range` on the calling thread.
pub(crate) fn sum_sequential<T, C>(range: WorkRange, contribution: &C) -> T
where
    T: Aggregate,
    C: Contribution<T> + ?Sized,
{
    range
        .indices()
        .fold(T::ZERO, |acc, i| acc.combine(contribution.term(i)))
}

fn sum_branch<T, C>(
    range: WorkRange,
    cutoff: u64,
    depth: usize,
    contribution: &C,
    counter: &SpawnCounter,
) -> T
where
    T: Aggregate,
    C: Contribution<T> + ?Sized,
{
    if range.len() <= cutoff {
        return sum_sequential(range, contribution);
    }
    let (left, right) = range.halves();
    match (left.len() > cutoff, right.len() > cutoff) {
        (true, true) => {
            counter.record(left.len(), depth + 1);
            counter.record(right.len(), depth + 1);
            let (a, b) = rayon::join(
                || sum_branch(left, cutoff, depth + 1, contribution, counter),
                || sum_branch(right, cutoff, depth + 1, contribution, counter),
            );
            a.combine(b)
        }
        // Odd split straddling the cutoff: the small half stays inline and the
        // large one continues in this task.
        _ => {
            let small = sum_sequential::<T, C>(left, contribution);
            small.combine(sum_branch(right, cutoff, depth, contribution, counter))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contribution::{Identity, MidpointPi};

    #[test]
    fn fixed_tasks_sum_ten() {
        let result = fixed_task_sum(Domain::one_based(10), 5, 4, &Identity).unwrap();
        assert_eq!(result.value, 55);
    }

    #[test]
    fn fixed_tasks_sum_one_million() {
        let result = fixed_task_sum(Domain::one_based(1_000_000), 100, 8, &Identity).unwrap();
        assert_eq!(result.value, 500_000_500_000);
    }

    #[test]
    fn fixed_tasks_reject_uneven_partition() {
        let result = fixed_task_sum::<u64, _>(Domain::one_based(100), 7, 4, &Identity);
        assert_eq!(
            result,
            Err(ParError::InvalidPartition {
                size: 100,
                tasks: 7
            })
        );
    }

    #[test]
    fn fixed_tasks_reject_zero_tasks_before_pool() {
        let result = fixed_task_sum::<u64, _>(Domain::one_based(100), 0, 0, &Identity);
        assert_eq!(result, Err(ParError::Zero("tasks")));
    }

    #[test]
    fn fixed_tasks_more_tasks_than_workers() {
        let result = fixed_task_sum(Domain::one_based(4096), 4096, 3, &Identity).unwrap();
        assert_eq!(result.value, 4096 * 4097 / 2);
    }

    #[test]
    fn fixed_tasks_estimate_pi() {
        let pi = MidpointPi::new(10_000);
        let result = fixed_task_sum(Domain::zero_based(10_000), 10, 4, &pi).unwrap();
        assert!((pi.finish(result.value) - std::f64::consts::PI).abs() < 1e-6);
    }

    #[test]
    fn recursive_sum_matches_closed_form() {
        let run = recursive_task_sum(Domain::one_based(1_000_000), 1000, 8, &Identity).unwrap();
        assert_eq!(run.result.value, 500_000_500_000);
        assert!(run.stats.spawned > 0);
    }

    #[test]
    fn recursive_sum_below_cutoff_spawns_nothing() {
        let run = recursive_task_sum(Domain::one_based(1000), 1000, 4, &Identity).unwrap();
        assert_eq!(run.result.value, 500_500);
        assert_eq!(run.stats, TaskStats::default());
    }

    #[test]
    fn recursive_sum_never_spawns_at_or_below_cutoff() {
        for n in [2_001u64, 5_000, 65_537, 100_000] {
            let run = recursive_task_sum(Domain::one_based(n), 1000, 4, &Identity).unwrap();
            assert_eq!(run.result.value, n * (n + 1) / 2);
            if let Some(smallest) = run.stats.smallest_spawned {
                assert!(smallest > 1000, "n = {n}: spawned a task of {smallest}");
            }
        }
    }

    #[test]
    fn recursive_sum_spawn_count_scales_with_size_over_cutoff() {
        let n = 1 << 20;
        let cutoff = 1 << 10;
        let run = recursive_task_sum(Domain::zero_based(n), cutoff, 4, &Identity).unwrap();
        // Halving a power of two spawns every node strictly larger than the
        // cutoff below the root: 2 + 4 + ... + n / (2 * cutoff).
        assert_eq!(run.stats.spawned as u64, n / cutoff as u64 - 2);
        assert_eq!(run.stats.max_depth, 9);
        assert_eq!(run.stats.smallest_spawned, Some(2 * cutoff as u64));
    }

    #[test]
    fn recursive_sum_rejects_zero_cutoff() {
        let result = recursive_task_sum::<u64, _>(Domain::one_based(10), 0, 4, &Identity);
        assert_eq!(result, Err(ParError::Zero("cutoff")));
    }

    #[test]
    fn spawn_counter_snapshot() {
        let counter = SpawnCounter::new();
        assert_eq!(counter.snapshot(), TaskStats::default());
        counter.record(5000, 1);
        counter.record(2000, 3);
        let stats = counter.snapshot();
        assert_eq!(stats.spawned, 2);
        assert_eq!(stats.smallest_spawned, Some(2000));
        assert_eq!(stats.max_depth, 3);
    }
}
