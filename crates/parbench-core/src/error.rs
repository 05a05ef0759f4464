//! Error type shared by every strategy.
//!
//! All variants are detected before any worker or task is spawned, so a
//! failed call never produces a partial aggregate.

/// Error type for reductions, decompositions, and sorts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParError {
    /// Worker count exceeds the cap of a capped merge discipline.
    #[error("invalid configuration: {workers} workers exceeds the maximum of {max}")]
    TooManyWorkers {
        /// Requested worker count.
        workers: usize,
        /// Cap for the selected discipline.
        max: usize,
    },

    /// A worker, task, or cutoff parameter is zero.
    #[error("invalid configuration: {0} must be greater than zero")]
    Zero(&'static str),

    /// Domain size is not evenly divisible by the task count.
    #[error("invalid partition: domain size {size} is not divisible by {tasks} tasks")]
    InvalidPartition {
        /// Domain size.
        size: u64,
        /// Requested task count.
        tasks: usize,
    },

    /// Malformed input (dimension mismatch, unknown strategy name, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The worker pool could not be created.
    #[error("worker pool error: {0}")]
    Pool(String),
}

impl ParError {
    /// Whether this error is a configuration error (as opposed to bad input).
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::TooManyWorkers { .. } | Self::Zero(_) | Self::InvalidPartition { .. }
        )
    }
}
