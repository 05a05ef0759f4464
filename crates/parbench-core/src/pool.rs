//! Per-invocation worker pools.
//!
//! Each strategy invocation gets its own fixed-size `rayon` pool so that the
//! worker count is exactly the one requested and nothing is shared across
//! calls.

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::ParError;

/// Build a pool of exactly `workers` threads.
pub fn build_pool(workers: usize) -> Result<ThreadPool, ParError> {
    if workers == 0 {
        return Err(ParError::Zero("workers"));
    }
    ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("parbench-worker-{i}"))
        .build()
        .map_err(|e| ParError::Pool(e.to_string()))
}
