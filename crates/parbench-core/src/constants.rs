//! Constants for worker limits, decomposition cutoffs, and default problem sizes.

/// Upper bound on worker count for the critical-section and atomic merge
/// disciplines. Reduction and slot disciplines are not capped.
pub const MAX_LOCKED_WORKERS: usize = 16;

/// Default worker count.
pub const DEFAULT_WORKERS: usize = 10;

/// Default number of tasks for fixed-task summation.
pub const DEFAULT_TASKS: usize = 10;

/// Default subrange size at or below which recursive decomposition runs
/// sequentially instead of spawning.
pub const DEFAULT_CUTOFF: usize = 1000;

/// Default interval count for the midpoint estimate of π.
pub const DEFAULT_INTERVALS: u64 = 10_000;

/// Default number of trials averaged by the harness.
pub const DEFAULT_TRIALS: usize = 100;

/// Absolute tolerance for the π estimate at the default interval count.
pub const PI_TOLERANCE: f64 = 1e-6;

/// Relative tolerance for reassociating matrix strategies.
pub const MATRIX_RELATIVE_TOLERANCE: f64 = 1e-9;

/// Process exit codes.
pub mod exit_codes {
    /// Successful execution.
    pub const SUCCESS: i32 = 0;
    /// Generic error.
    pub const ERROR_GENERIC: i32 = 1;
    /// A strategy produced a result that disagrees with the known answer.
    pub const ERROR_MISMATCH: i32 = 3;
    /// Invalid configuration or partition.
    pub const ERROR_CONFIG: i32 = 4;
}
