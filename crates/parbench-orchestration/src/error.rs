//! Harness errors.

use parbench_core::ParError;

/// Errors from running or analyzing a comparison.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HarnessError {
    /// A race-free method produced a wrong answer.
    #[error("result mismatch: {} produced a wrong answer", .methods.join(", "))]
    Mismatch {
        /// Names of the offending methods.
        methods: Vec<String>,
    },

    /// Every method failed.
    #[error("no valid results")]
    NoResults,

    /// An error from the core library.
    #[error(transparent)]
    Core(#[from] ParError),
}
