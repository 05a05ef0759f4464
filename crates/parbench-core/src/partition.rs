//! Domain partitioning: interleaved (stride) and contiguous block assignment.

use std::fmt;
use std::iter::StepBy;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::ParError;

/// An index domain `first, first + 1, ..., first + len - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Domain {
    first: u64,
    len: u64,
}

impl Domain {
    /// The domain `[0, n)`.
    #[must_use]
    pub fn zero_based(n: u64) -> Self {
        Self { first: 0, len: n }
    }

    /// The domain `[1, n]`, used for 1-indexed sums.
    #[must_use]
    pub fn one_based(n: u64) -> Self {
        Self { first: 1, len: n }
    }

    /// First index of the domain.
    #[must_use]
    pub fn first(&self) -> u64 {
        self.first
    }

    /// Number of indices in the domain.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the domain has no indices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The whole domain as a single range.
    ///
    /// Fails when one past the last index does not fit in a `u64`.
    pub fn range(&self) -> Result<WorkRange, ParError> {
        self.first
            .checked_add(self.len)
            .map(|hi| WorkRange::new(self.first, hi))
            .ok_or_else(|| {
                ParError::InvalidInput(format!(
                    "domain of {} indices from {} overflows u64",
                    self.len, self.first
                ))
            })
    }
}

/// A half-open index interval `[lo, hi)` owned by one worker or task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkRange {
    /// First index.
    pub lo: u64,
    /// One past the last index.
    pub hi: u64,
}

impl WorkRange {
    /// Create a range. `lo` must not exceed `hi`.
    #[must_use]
    pub fn new(lo: u64, hi: u64) -> Self {
        debug_assert!(lo <= hi, "range [{lo}, {hi}) is inverted");
        Self { lo, hi }
    }

    /// Number of indices in the range.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.hi - self.lo
    }

    /// Whether the range is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lo == self.hi
    }

    /// Iterate the indices of the range.
    #[must_use]
    pub fn indices(&self) -> Range<u64> {
        self.lo..self.hi
    }

    /// Split at the midpoint. The left half gets the smaller share on odd
    /// lengths.
    #[must_use]
    pub fn halves(&self) -> (WorkRange, WorkRange) {
        let mid = self.lo + self.len() / 2;
        (WorkRange::new(self.lo, mid), WorkRange::new(mid, self.hi))
    }
}

impl fmt::Display for WorkRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.lo, self.hi)
    }
}

/// Which indices of a range each pool worker visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerLayout {
    /// Worker `id` visits `lo + id + k * workers`.
    Interleaved,
    /// Worker `id` visits one contiguous block, as static scheduling does.
    Block,
}

impl WorkerLayout {
    /// Indices of `range` visited by worker `id` out of `workers`.
    #[must_use]
    pub fn indices(self, range: WorkRange, id: usize, workers: usize) -> StepBy<Range<u64>> {
        match self {
            Self::Interleaved => interleaved(range, id, workers),
            Self::Block => block(range, id, workers).indices().step_by(1),
        }
    }
}

/// How a domain is split among workers or tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PartitionScheme {
    /// The whole domain on the calling thread.
    Sequential,
    /// Worker `id` owns `first + id + k * stride`.
    Interleaved {
        /// Number of workers.
        stride: usize,
    },
    /// One contiguous block per worker.
    Block {
        /// Number of workers.
        workers: usize,
    },
    /// Exactly `count` block tasks.
    TaskFixed {
        /// Number of tasks.
        count: usize,
    },
    /// Recursive halving down to `cutoff` indices.
    TaskRecursive {
        /// Size at or below which a task runs sequentially.
        cutoff: usize,
    },
}

impl fmt::Display for PartitionScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => f.write_str("sequential"),
            Self::Interleaved { stride } => write!(f, "interleaved(stride={stride})"),
            Self::Block { workers } => write!(f, "block(workers={workers})"),
            Self::TaskFixed { count } => write!(f, "tasks(count={count})"),
            Self::TaskRecursive { cutoff } => write!(f, "recursive(cutoff={cutoff})"),
        }
    }
}

/// Indices of `range` owned by worker `id` out of `workers`.
///
/// Balanced to within one index per worker even when the range size is not
/// a multiple of the worker count.
#[must_use]
pub fn interleaved(range: WorkRange, id: usize, workers: usize) -> StepBy<Range<u64>> {
    debug_assert!(workers > 0 && id < workers);
    let start = range.lo.saturating_add(id as u64).min(range.hi);
    (start..range.hi).step_by(workers)
}

/// Contiguous block of `range` owned by worker `id` out of `workers`:
/// `[lo + len * id / workers, lo + len * (id + 1) / workers)`.
///
/// Blocks are in worker order, cover the range exactly once, and differ in
/// size by at most one.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn block(range: WorkRange, id: usize, workers: usize) -> WorkRange {
    debug_assert!(workers > 0 && id < workers);
    let len = u128::from(range.len());
    let workers = workers as u128;
    let id = id as u128;
    // Each offset is at most `len`, so it fits back in a u64.
    let lo = (len * id / workers) as u64;
    let hi = (len * (id + 1) / workers) as u64;
    WorkRange::new(range.lo + lo, range.lo + hi)
}

/// Split `domain` into exactly `tasks` contiguous blocks of equal size.
///
/// Fails with [`ParError::InvalidPartition`] when the domain size is not a
/// multiple of `tasks`; nothing is rounded.
pub fn blocks(domain: Domain, tasks: usize) -> Result<Vec<WorkRange>, ParError> {
    if tasks == 0 {
        return Err(ParError::Zero("tasks"));
    }
    let count = tasks as u64;
    if domain.len() % count != 0 {
        return Err(ParError::InvalidPartition {
            size: domain.len(),
            tasks,
        });
    }
    let whole = domain.range()?;
    let size = whole.len() / count;
    Ok((0..count)
        .map(|t| {
            let lo = whole.lo + size * t;
            WorkRange::new(lo, lo + size)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleaved_covers_domain_exactly_once() {
        let range = Domain::zero_based(103).range().unwrap();
        let mut seen = vec![0u32; 103];
        for id in 0..10 {
            for i in interleaved(range, id, 10) {
                seen[usize::try_from(i).unwrap()] += 1;
            }
        }
        assert!(seen.iter().all(|&c| c == 1));
    }

    #[test]
    fn interleaved_is_balanced() {
        let range = Domain::one_based(103).range().unwrap();
        let sizes: Vec<usize> = (0..10).map(|id| interleaved(range, id, 10).count()).collect();
        let max = *sizes.iter().max().unwrap();
        let min = *sizes.iter().min().unwrap();
        assert!(max - min <= 1, "unbalanced: {sizes:?}");
    }

    #[test]
    fn interleaved_worker_beyond_domain_is_empty() {
        let range = Domain::zero_based(3).range().unwrap();
        assert_eq!(interleaved(range, 5, 8).count(), 0);
    }

    #[test]
    fn interleaved_one_based_starts_at_one() {
        let owned: Vec<u64> = interleaved(Domain::one_based(10).range().unwrap(), 0, 4).collect();
        assert_eq!(owned, vec![1, 5, 9]);
    }

    #[test]
    fn block_splits_one_based_sum_in_worker_order() {
        let range = Domain::one_based(10).range().unwrap();
        let owned: Vec<WorkRange> = (0..4).map(|id| block(range, id, 4)).collect();
        assert_eq!(
            owned,
            vec![
                WorkRange::new(1, 3),
                WorkRange::new(3, 6),
                WorkRange::new(6, 8),
                WorkRange::new(8, 11),
            ]
        );
    }

    #[test]
    fn block_covers_range_and_is_balanced() {
        let range = WorkRange::new(7, 110);
        let owned: Vec<WorkRange> = (0..10).map(|id| block(range, id, 10)).collect();
        assert_eq!(owned[0].lo, 7);
        assert_eq!(owned[9].hi, 110);
        for pair in owned.windows(2) {
            assert_eq!(pair[0].hi, pair[1].lo);
        }
        let sizes: Vec<u64> = owned.iter().map(WorkRange::len).collect();
        assert!(sizes.iter().max().unwrap() - sizes.iter().min().unwrap() <= 1);
    }

    #[test]
    fn block_layout_visits_contiguous_indices() {
        let range = Domain::zero_based(12).range().unwrap();
        let owned: Vec<u64> = WorkerLayout::Block.indices(range, 1, 3).collect();
        assert_eq!(owned, vec![4, 5, 6, 7]);
        let owned: Vec<u64> = WorkerLayout::Interleaved.indices(range, 1, 3).collect();
        assert_eq!(owned, vec![1, 4, 7, 10]);
    }

    #[test]
    fn overflowing_domain_is_rejected() {
        assert!(matches!(
            Domain::one_based(u64::MAX).range(),
            Err(ParError::InvalidInput(_))
        ));
        assert_eq!(
            Domain::zero_based(u64::MAX).range(),
            Ok(WorkRange::new(0, u64::MAX))
        );
        assert!(blocks(Domain::one_based(u64::MAX), 1).is_err());
    }

    #[test]
    fn blocks_one_based() {
        let ranges = blocks(Domain::one_based(100), 4).unwrap();
        assert_eq!(ranges.len(), 4);
        assert_eq!(ranges[0], WorkRange::new(1, 26));
        assert_eq!(ranges[3], WorkRange::new(76, 101));
    }

    #[test]
    fn blocks_are_contiguous_and_disjoint() {
        let ranges = blocks(Domain::zero_based(60), 6).unwrap();
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].hi, pair[1].lo);
        }
        assert_eq!(ranges.iter().map(WorkRange::len).sum::<u64>(), 60);
    }

    #[test]
    fn blocks_reject_uneven_split() {
        assert_eq!(
            blocks(Domain::one_based(100), 7),
            Err(ParError::InvalidPartition {
                size: 100,
                tasks: 7
            })
        );
    }

    #[test]
    fn blocks_reject_zero_tasks() {
        assert_eq!(blocks(Domain::one_based(100), 0), Err(ParError::Zero("tasks")));
    }

    #[test]
    fn empty_domain_splits_into_empty_blocks() {
        let ranges = blocks(Domain::zero_based(0), 3).unwrap();
        assert!(ranges.iter().all(WorkRange::is_empty));
    }

    #[test]
    fn halves_split_odd_length() {
        let (left, right) = WorkRange::new(0, 5).halves();
        assert_eq!(left, WorkRange::new(0, 2));
        assert_eq!(right, WorkRange::new(2, 5));
    }

    #[test]
    fn display_formats() {
        assert_eq!(WorkRange::new(1, 4).to_string(), "[1, 4)");
        assert_eq!(
            PartitionScheme::Interleaved { stride: 4 }.to_string(),
            "interleaved(stride=4)"
        );
        assert_eq!(
            PartitionScheme::TaskRecursive { cutoff: 1000 }.to_string(),
            "recursive(cutoff=1000)"
        );
        assert_eq!(PartitionScheme::Block { workers: 8 }.to_string(), "block(workers=8)");
        assert_eq!(PartitionScheme::Sequential.to_string(), "sequential");
    }
}
