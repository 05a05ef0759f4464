//! Invocation options.

use crate::constants::{DEFAULT_CUTOFF, DEFAULT_TASKS, DEFAULT_WORKERS};

/// Options shared by every strategy invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Number of worker threads in the per-invocation pool.
    pub workers: usize,
    /// Number of tasks for fixed-task summation.
    pub tasks: usize,
    /// Subrange size at or below which recursive decomposition runs
    /// sequentially.
    pub cutoff: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            tasks: DEFAULT_TASKS,
            cutoff: DEFAULT_CUTOFF,
        }
    }
}

impl Options {
    /// Options with the given worker count and default everything else.
    #[must_use]
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let opts = Options::default();
        assert_eq!(opts.workers, DEFAULT_WORKERS);
        assert_eq!(opts.tasks, DEFAULT_TASKS);
        assert_eq!(opts.cutoff, DEFAULT_CUTOFF);
    }

    #[test]
    fn with_workers_sets_only_workers() {
        let opts = Options::with_workers(4);
        assert_eq!(opts.workers, 4);
        assert_eq!(opts.tasks, DEFAULT_TASKS);
    }
}
