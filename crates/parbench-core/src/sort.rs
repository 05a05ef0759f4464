//! Partition-based quicksort, sequential and task-parallel.
//!
//! Both variants share one two-pointer partition around the middle element.
//! The parallel variant spawns a task for each side of a partition that is
//! larger than the cutoff and sorts smaller sides inline, so the number of
//! spawned tasks stays proportional to `len / cutoff`.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

use crate::error::ParError;
use crate::pool::build_pool;
use crate::tasks::{SpawnCounter, TaskStats};

/// Timing and spawn statistics of one parallel sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SortReport {
    /// Wall-clock time of the sort.
    pub elapsed: Duration,
    /// Spawn instrumentation.
    pub stats: TaskStats,
}

/// Partition `a` around `a[(len - 1) / 2]`.
///
/// Returns `(left_end, right_start)` with `left_end <= right_start`: every
/// element of `a[..left_end]` is `<= pivot` and every element of
/// `a[right_start..]` is `>= pivot`. Elements in between equal the pivot.
/// Both sides are strictly shorter than `a`.
fn partition<T: Ord + Clone>(a: &mut [T]) -> (usize, usize) {
    debug_assert!(!a.is_empty());
    let hi = a.len() - 1;
    let pivot = a[hi / 2].clone();
    let mut l = 0;
    let mut h = hi;

    while l <= h {
        while a[l] < pivot && l < hi {
            l += 1;
        }
        while a[h] > pivot && h > 0 {
            h -= 1;
        }
        if l <= h {
            a.swap(l, h);
            l += 1;
            if h == 0 {
                return (0, l);
            }
            h -= 1;
        }
    }
    (h + 1, l)
}

/// Split `a` into the two sides left by [`partition`].
fn split<T: Ord + Clone>(a: &mut [T]) -> (&mut [T], &mut [T]) {
    let (left_end, right_start) = partition(a);
    let (front, right) = a.split_at_mut(right_start);
    (&mut front[..left_end], right)
}

/// Sort `a` in place with recursive partitioning on the calling thread.
pub fn quicksort<T: Ord + Clone>(a: &mut [T]) {
    if a.len() <= 1 {
        return;
    }
    let (left, right) = split(a);
    quicksort(left);
    quicksort(right);
}

/// Sort `data` in place on a pool of `workers` threads.
///
/// Sides of at most `cutoff` elements are sorted sequentially by the task
/// that produced them; larger sides are spawned as new tasks. Each parent
/// waits for both of its sides, and the call returns once the whole task
/// tree has joined.
pub fn parallel_quicksort<T>(
    data: &mut [T],
    workers: usize,
    cutoff: usize,
) -> Result<SortReport, ParError>
where
    T: Ord + Clone + Send,
{
    if cutoff == 0 {
        return Err(ParError::Zero("cutoff"));
    }
    let pool = build_pool(workers)?;
    let counter = SpawnCounter::new();

    let start = Instant::now();
    pool.install(|| sort_branch(data, cutoff, 0, &counter));
    let elapsed = start.elapsed();

    let stats = counter.snapshot();
    debug!(
        len = data.len(),
        cutoff,
        workers,
        spawned = stats.spawned,
        ?elapsed,
        "parallel quicksort complete"
    );
    Ok(SortReport { elapsed, stats })
}

fn sort_branch<T>(a: &mut [T], cutoff: usize, depth: usize, counter: &SpawnCounter)
where
    T: Ord + Clone + Send,
{
    if a.len() <= cutoff {
        quicksort(a);
        return;
    }
    let (left, right) = split(a);
    rayon::scope(|s| {
        for side in [left, right] {
            if side.len() > cutoff {
                counter.record(side.len() as u64, depth + 1);
                s.spawn(move |_| sort_branch(side, cutoff, depth + 1, counter));
            } else {
                quicksort(side);
            }
        }
    });
}
