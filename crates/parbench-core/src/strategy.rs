//! Strategy selection for reductions over an index domain.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::accumulate::{accumulate_with, sequential_sum, AccumulationResult, MergeDiscipline};
use crate::aggregate::Aggregate;
use crate::contribution::Contribution;
use crate::error::ParError;
use crate::options::Options;
use crate::partition::{Domain, PartitionScheme, WorkerLayout};
use crate::tasks::{fixed_task_sum, recursive_task_sum};

/// Every way of computing `Σ f(i)` over a domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Single-threaded fold on the calling thread; the baseline.
    Sequential,
    /// Per-worker slots padded to a cache line, summed after the join.
    PaddedSlot,
    /// Per-worker slots packed side by side, so workers share cache lines.
    UnpaddedSlot,
    /// Local partials merged inside a mutex.
    Critical,
    /// Local partials merged with one atomic add each.
    Atomic,
    /// Local partials returned by each worker and folded after the join.
    #[default]
    Reduction,
    /// Like [`Strategy::Reduction`], with one contiguous block per worker.
    BlockReduction,
    /// Unsynchronized shared updates. Wrong under contention.
    Naive,
    /// A fixed number of equal block tasks.
    FixedTask,
    /// Recursive halving down to the cutoff.
    RecursiveTask,
}

impl Strategy {
    /// All strategies, in presentation order.
    pub const ALL: [Strategy; 10] = [
        Self::Sequential,
        Self::PaddedSlot,
        Self::UnpaddedSlot,
        Self::Critical,
        Self::Atomic,
        Self::Reduction,
        Self::BlockReduction,
        Self::Naive,
        Self::FixedTask,
        Self::RecursiveTask,
    ];

    /// Command-line name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::PaddedSlot => "padded-slot",
            Self::UnpaddedSlot => "unpadded-slot",
            Self::Critical => "critical",
            Self::Atomic => "atomic",
            Self::Reduction => "reduction",
            Self::BlockReduction => "block-reduction",
            Self::Naive => "naive",
            Self::FixedTask => "fixed-task",
            Self::RecursiveTask => "recursive-task",
        }
    }

    /// The merge discipline of a worker strategy, `None` for the sequential
    /// and task strategies.
    #[must_use]
    pub fn discipline(&self) -> Option<MergeDiscipline> {
        match self {
            Self::PaddedSlot => Some(MergeDiscipline::PaddedSlots),
            Self::UnpaddedSlot => Some(MergeDiscipline::UnpaddedSlots),
            Self::Critical => Some(MergeDiscipline::Critical),
            Self::Atomic => Some(MergeDiscipline::Atomic),
            Self::Reduction | Self::BlockReduction => Some(MergeDiscipline::Reduction),
            Self::Naive => Some(MergeDiscipline::Unsynchronized),
            Self::Sequential | Self::FixedTask | Self::RecursiveTask => None,
        }
    }

    /// Whether the result is always the exact aggregate.
    #[must_use]
    pub fn is_race_free(&self) -> bool {
        !matches!(self, Self::Naive)
    }

    /// How the domain is split under `options`.
    #[must_use]
    pub fn scheme(&self, options: &Options) -> PartitionScheme {
        match self {
            Self::Sequential => PartitionScheme::Sequential,
            Self::BlockReduction => PartitionScheme::Block {
                workers: options.workers,
            },
            Self::FixedTask => PartitionScheme::TaskFixed {
                count: options.tasks,
            },
            Self::RecursiveTask => PartitionScheme::TaskRecursive {
                cutoff: options.cutoff,
            },
            _ => PartitionScheme::Interleaved {
                stride: options.workers,
            },
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = ParError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.name() == s)
            .ok_or_else(|| ParError::InvalidInput(format!("unknown strategy: {s}")))
    }
}

/// Compute `Σ contribution(i)` over `domain` with `strategy`.
///
/// The strategy's [`PartitionScheme`] decides how the domain is split.
/// `options.workers` sizes the pool of every parallel strategy;
/// `options.tasks` and `options.cutoff` apply to the task strategies only.
/// Options are used as given: zero values are rejected, not defaulted.
pub fn invoke<T, C>(
    domain: Domain,
    strategy: Strategy,
    options: &Options,
    contribution: &C,
) -> Result<AccumulationResult<T>, ParError>
where
    T: Aggregate,
    C: Contribution<T> + ?Sized,
{
    let scheme = strategy.scheme(options);
    match (scheme, strategy.discipline()) {
        (PartitionScheme::Sequential, _) => sequential_sum(domain, contribution),
        (PartitionScheme::TaskFixed { count }, _) => {
            fixed_task_sum(domain, count, options.workers, contribution)
        }
        (PartitionScheme::TaskRecursive { cutoff }, _) => {
            recursive_task_sum(domain, cutoff, options.workers, contribution)
                .map(|run| run.result)
        }
        (PartitionScheme::Interleaved { stride }, Some(discipline)) => accumulate_with(
            domain,
            stride,
            discipline,
            WorkerLayout::Interleaved,
            contribution,
        ),
        (PartitionScheme::Block { workers }, Some(discipline)) => {
            accumulate_with(domain, workers, discipline, WorkerLayout::Block, contribution)
        }
        (scheme, None) => Err(ParError::InvalidInput(format!(
            "{strategy} has no merge discipline for {scheme}"
        ))),
    }
}
