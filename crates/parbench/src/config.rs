//! Application configuration from CLI flags and environment.

use clap::Parser;

use parbench_core::constants::{DEFAULT_CUTOFF, DEFAULT_TASKS, DEFAULT_TRIALS, DEFAULT_WORKERS};
use parbench_core::Options;
use parbench_orchestration::Problem;

/// parbench: compare shared-memory reduction and decomposition strategies.
#[derive(Parser, Debug)]
#[command(name = "parbench", version, about)]
#[allow(clippy::struct_excessive_bools)]
pub struct AppConfig {
    /// Problem to solve: pi, sum, matrix, or sort.
    #[arg(long, default_value = "pi")]
    pub problem: String,

    /// Strategy to run, `all`, or `default`. Names depend on the problem.
    #[arg(long, default_value = "all")]
    pub strategy: String,

    /// Problem size: intervals, N, matrix dimension, or element count.
    #[arg(short = 'n', long, env = "PARBENCH_SIZE")]
    pub size: Option<u64>,

    /// Worker threads per invocation.
    #[arg(short, long, default_value_t = DEFAULT_WORKERS, env = "PARBENCH_WORKERS")]
    pub workers: usize,

    /// Task count for fixed-task summation.
    #[arg(long, default_value_t = DEFAULT_TASKS)]
    pub tasks: usize,

    /// Subrange size at or below which recursive methods run sequentially.
    #[arg(long, default_value_t = DEFAULT_CUTOFF)]
    pub cutoff: usize,

    /// Trials per strategy.
    #[arg(long, default_value_t = DEFAULT_TRIALS)]
    pub trials: usize,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Quiet mode (one `method value` line per strategy).
    #[arg(short, long)]
    pub quiet: bool,

    /// Verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Generate shell completion.
    #[arg(long, value_enum)]
    pub completion: Option<clap_complete::Shell>,
}

impl AppConfig {
    /// Parse CLI arguments.
    #[must_use]
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Strategy options. Zero values are passed through and rejected by the
    /// strategies themselves.
    #[must_use]
    pub fn options(&self) -> Options {
        Options {
            workers: self.workers,
            tasks: self.tasks,
            cutoff: self.cutoff,
        }
    }

    /// Requested size, or the problem's default.
    #[must_use]
    pub fn size_for(&self, problem: Problem) -> u64 {
        self.size.unwrap_or_else(|| problem.default_size())
    }
}
