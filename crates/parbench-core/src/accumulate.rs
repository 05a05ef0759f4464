//! Accumulation strategies.
//!
//! Every discipline shares the same driver: one closure per pool thread
//! walks its share of the domain, interleaved or as one contiguous block,
//! and folds contributions. They
//! differ only in where a contribution lands and how partials reach the
//! single aggregate:
//!
//! | Discipline       | Per index                    | End of region                 |
//! |------------------|------------------------------|-------------------------------|
//! | `PaddedSlots`    | store into own padded slot   | caller sums slots             |
//! | `UnpaddedSlots`  | store into own adjacent slot | caller sums slots             |
//! | `Critical`       | local partial                | add under a mutex             |
//! | `Atomic`         | local partial                | one atomic add                |
//! | `Reduction`      | local partial                | returned, folded after join   |
//! | `Unsynchronized` | load/add/store on shared     | nothing (updates get lost)    |

use std::fmt;
use std::time::{Duration, Instant};

use crossbeam::utils::CachePadded;
use parking_lot::Mutex;
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::Aggregate;
use crate::constants::MAX_LOCKED_WORKERS;
use crate::contribution::Contribution;
use crate::error::ParError;
use crate::partition::{Domain, WorkRange, WorkerLayout};
use crate::pool::build_pool;
use crate::tasks::sum_sequential;

/// How per-worker partials are merged into the shared aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeDiscipline {
    /// One cache-line-padded slot per worker.
    PaddedSlots,
    /// One slot per worker, slots adjacent in memory (false sharing).
    UnpaddedSlots,
    /// Local partial added to the aggregate inside a mutex.
    Critical,
    /// Local partial added to the aggregate with one atomic operation.
    Atomic,
    /// Private partials collected by the pool and folded after the join.
    Reduction,
    /// Every worker updates one shared cell with a non-atomic
    /// read-modify-write. Produces wrong results under contention; kept only
    /// to demonstrate the race.
    Unsynchronized,
}

impl MergeDiscipline {
    /// All disciplines, race-free ones first.
    pub const ALL: [MergeDiscipline; 6] = [
        Self::PaddedSlots,
        Self::UnpaddedSlots,
        Self::Critical,
        Self::Atomic,
        Self::Reduction,
        Self::Unsynchronized,
    ];

    /// Short name of the discipline.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::PaddedSlots => "padded-slot",
            Self::UnpaddedSlots => "unpadded-slot",
            Self::Critical => "critical",
            Self::Atomic => "atomic",
            Self::Reduction => "reduction",
            Self::Unsynchronized => "naive",
        }
    }

    /// Maximum worker count accepted by this discipline, if capped.
    ///
    /// Only the lock and atomic disciplines are capped.
    // TODO: revisit whether the cap should apply uniformly once the slot
    // disciplines have been measured above 16 workers.
    #[must_use]
    pub fn worker_cap(&self) -> Option<usize> {
        match self {
            Self::Critical | Self::Atomic => Some(MAX_LOCKED_WORKERS),
            _ => None,
        }
    }

    /// Whether the discipline always yields the exact aggregate.
    #[must_use]
    pub fn is_race_free(&self) -> bool {
        !matches!(self, Self::Unsynchronized)
    }

    /// Reject worker counts this discipline does not accept.
    pub fn validate_workers(&self, workers: usize) -> Result<(), ParError> {
        if workers == 0 {
            return Err(ParError::Zero("workers"));
        }
        match self.worker_cap() {
            Some(max) if workers > max => Err(ParError::TooManyWorkers { workers, max }),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for MergeDiscipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Aggregate and wall-clock time of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccumulationResult<T> {
    /// The aggregate.
    pub value: T,
    /// Time spent in the parallel region and the final merge.
    pub elapsed: Duration,
}

impl<T> AccumulationResult<T> {
    /// Transform the value, keeping the elapsed time.
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> AccumulationResult<U> {
        AccumulationResult {
            value: f(self.value),
            elapsed: self.elapsed,
        }
    }
}

/// Compute `Σ contribution(i)` over `domain` with `workers` threads, each
/// worker visiting an interleaved share.
///
/// A pool of exactly `workers` threads is built before the clock starts.
pub fn accumulate<T, C>(
    domain: Domain,
    workers: usize,
    discipline: MergeDiscipline,
    contribution: &C,
) -> Result<AccumulationResult<T>, ParError>
where
    T: Aggregate,
    C: Contribution<T> + ?Sized,
{
    accumulate_with(domain, workers, discipline, WorkerLayout::Interleaved, contribution)
}

/// Like [`accumulate`], with the worker shares laid out by `layout`.
pub fn accumulate_with<T, C>(
    domain: Domain,
    workers: usize,
    discipline: MergeDiscipline,
    layout: WorkerLayout,
    contribution: &C,
) -> Result<AccumulationResult<T>, ParError>
where
    T: Aggregate,
    C: Contribution<T> + ?Sized,
{
    discipline.validate_workers(workers)?;
    domain.range()?;
    let pool = build_pool(workers)?;
    accumulate_in(&pool, domain, discipline, layout, contribution)
}

/// Like [`accumulate_with`], reusing an existing pool. The pool size is the
/// worker count.
pub fn accumulate_in<T, C>(
    pool: &ThreadPool,
    domain: Domain,
    discipline: MergeDiscipline,
    layout: WorkerLayout,
    contribution: &C,
) -> Result<AccumulationResult<T>, ParError>
where
    T: Aggregate,
    C: Contribution<T> + ?Sized,
{
    let workers = pool.current_num_threads();
    discipline.validate_workers(workers)?;
    let range = domain.range()?;

    let start = Instant::now();
    let value = match discipline {
        MergeDiscipline::PaddedSlots => {
            run(pool, range, layout, contribution, PaddedSlots::new(workers))
        }
        MergeDiscipline::UnpaddedSlots => {
            run(pool, range, layout, contribution, UnpaddedSlots::new(workers))
        }
        MergeDiscipline::Critical => run(pool, range, layout, contribution, CriticalMerge::new()),
        MergeDiscipline::Atomic => run(pool, range, layout, contribution, AtomicMerge::new()),
        MergeDiscipline::Reduction => run(pool, range, layout, contribution, ReductionMerge),
        MergeDiscipline::Unsynchronized => {
            run(pool, range, layout, contribution, UnsynchronizedMerge::new())
        }
    };
    let elapsed = start.elapsed();

    debug!(
        discipline = discipline.name(),
        ?layout,
        workers,
        size = domain.len(),
        ?elapsed,
        "accumulation complete"
    );
    Ok(AccumulationResult { value, elapsed })
}

/// Compute `Σ contribution(i)` over `domain` on the calling thread, as the
/// single-threaded baseline.
pub fn sequential_sum<T, C>(
    domain: Domain,
    contribution: &C,
) -> Result<AccumulationResult<T>, ParError>
where
    T: Aggregate,
    C: Contribution<T> + ?Sized,
{
    let range = domain.range()?;
    let start = Instant::now();
    let value = sum_sequential(range, contribution);
    let elapsed = start.elapsed();
    debug!(size = domain.len(), ?elapsed, "sequential sum complete");
    Ok(AccumulationResult { value, elapsed })
}

/// Where contributions land and how partials leave the parallel region.
trait Merge<T: Aggregate>: Sync {
    /// Fold one contribution on behalf of worker `id`.
    fn visit(&self, _id: usize, local: &mut T, term: T) {
        *local = local.combine(term);
    }

    /// Publish a worker's partial at the end of its loop. The returned value
    /// is carried out of the region by the pool.
    fn publish(&self, id: usize, local: T) -> T;

    /// Produce the aggregate after every worker has joined.
    fn finish(self, published: Vec<T>) -> T;
}

fn run<T, C, M>(
    pool: &ThreadPool,
    range: WorkRange,
    layout: WorkerLayout,
    contribution: &C,
    merge: M,
) -> T
where
    T: Aggregate,
    C: Contribution<T> + ?Sized,
    M: Merge<T>,
{
    let published = pool.broadcast(|ctx| {
        let id = ctx.index();
        let mut local = T::ZERO;
        for i in layout.indices(range, id, ctx.num_threads()) {
            merge.visit(id, &mut local, contribution.term(i));
        }
        merge.publish(id, local)
    });
    merge.finish(published)
}

fn sum_cells<'a, T: Aggregate>(cells: impl Iterator<Item = &'a T::Cell>) -> T {
    cells.fold(T::ZERO, |acc, cell| acc.combine(T::load(cell)))
}

struct PaddedSlots<T: Aggregate> {
    slots: Vec<CachePadded<T::Cell>>,
}

impl<T: Aggregate> PaddedSlots<T> {
    fn new(workers: usize) -> Self {
        Self {
            slots: (0..workers).map(|_| CachePadded::new(T::new_cell(T::ZERO))).collect(),
        }
    }
}

impl<T: Aggregate> Merge<T> for PaddedSlots<T> {
    // Each worker is the only writer of its slot.
    fn visit(&self, id: usize, _local: &mut T, term: T) {
        T::racy_add(&self.slots[id], term);
    }

    fn publish(&self, _id: usize, _local: T) -> T {
        T::ZERO
    }

    fn finish(self, _published: Vec<T>) -> T {
        sum_cells::<T>(self.slots.iter().map(|slot| &**slot))
    }
}

struct UnpaddedSlots<T: Aggregate> {
    slots: Vec<T::Cell>,
}

impl<T: Aggregate> UnpaddedSlots<T> {
    fn new(workers: usize) -> Self {
        Self {
            slots: (0..workers).map(|_| T::new_cell(T::ZERO)).collect(),
        }
    }
}

impl<T: Aggregate> Merge<T> for UnpaddedSlots<T> {
    fn visit(&self, id: usize, _local: &mut T, term: T) {
        T::racy_add(&self.slots[id], term);
    }

    fn publish(&self, _id: usize, _local: T) -> T {
        T::ZERO
    }

    fn finish(self, _published: Vec<T>) -> T {
        sum_cells::<T>(self.slots.iter())
    }
}

struct CriticalMerge<T> {
    total: Mutex<T>,
}

impl<T: Aggregate> CriticalMerge<T> {
    fn new() -> Self {
        Self {
            total: Mutex::new(T::ZERO),
        }
    }
}

impl<T: Aggregate> Merge<T> for CriticalMerge<T> {
    fn publish(&self, _id: usize, local: T) -> T {
        let mut total = self.total.lock();
        *total = total.combine(local);
        T::ZERO
    }

    fn finish(self, _published: Vec<T>) -> T {
        self.total.into_inner()
    }
}

struct AtomicMerge<T: Aggregate> {
    total: T::Cell,
}

impl<T: Aggregate> AtomicMerge<T> {
    fn new() -> Self {
        Self {
            total: T::new_cell(T::ZERO),
        }
    }
}

impl<T: Aggregate> Merge<T> for AtomicMerge<T> {
    fn publish(&self, _id: usize, local: T) -> T {
        T::fetch_add(&self.total, local);
        T::ZERO
    }

    fn finish(self, _published: Vec<T>) -> T {
        T::load(&self.total)
    }
}

struct ReductionMerge;

impl<T: Aggregate> Merge<T> for ReductionMerge {
    fn publish(&self, _id: usize, local: T) -> T {
        local
    }

    fn finish(self, published: Vec<T>) -> T {
        published.into_iter().fold(T::ZERO, T::combine)
    }
}

struct UnsynchronizedMerge<T: Aggregate> {
    total: T::Cell,
}

impl<T: Aggregate> UnsynchronizedMerge<T> {
    fn new() -> Self {
        Self {
            total: T::new_cell(T::ZERO),
        }
    }
}

impl<T: Aggregate> Merge<T> for UnsynchronizedMerge<T> {
    // Shared by every worker: concurrent load/store pairs overwrite each other.
    fn visit(&self, _id: usize, _local: &mut T, term: T) {
        T::racy_add(&self.total, term);
    }

    fn publish(&self, _id: usize, _local: T) -> T {
        T::ZERO
    }

    fn finish(self, _published: Vec<T>) -> T {
        T::load(&self.total)
    }
}
