//! Orchestration interfaces.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use parbench_core::PartitionScheme;

use crate::problem::Problem;

/// Trait for reporting trial progress to the user.
pub trait TrialReporter: Send + Sync {
    /// A method is about to run `total` trials.
    fn start(&self, method: &str, total: usize);

    /// One trial of the current method finished.
    fn trial_complete(&self, method: &str, completed: usize);

    /// The current method finished all of its trials.
    fn complete(&self);
}

/// Trait for presenting results to the user.
pub trait ResultPresenter: Send + Sync {
    /// Present a finished comparison.
    fn present_report(&self, report: &ComparisonReport);

    /// Present an error.
    fn present_error(&self, error: &str);
}

/// Aggregate of all trials of one method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialSummary {
    /// Method name.
    pub method: String,
    /// Whether the method is expected to be exact on every trial.
    pub race_free: bool,
    /// How the method split its work, when it follows a fixed scheme.
    pub scheme: Option<PartitionScheme>,
    /// Number of completed trials.
    pub trials: usize,
    /// Mean numeric result over the trials, if the problem has one.
    pub mean_value: Option<f64>,
    /// Mean wall-clock time of one trial.
    pub mean_elapsed: Duration,
    /// Fastest trial.
    pub min_elapsed: Duration,
    /// Slowest trial.
    pub max_elapsed: Duration,
    /// Trials whose result differed from the known answer.
    pub mismatches: usize,
    /// Largest spawn count seen in one trial, for task-based methods.
    pub spawned: Option<usize>,
    /// Set when the method could not run at all.
    pub error: Option<String>,
}

impl TrialSummary {
    /// Summary of a method that failed before completing any trial.
    #[must_use]
    pub fn failed(method: &str, race_free: bool, error: String) -> Self {
        Self {
            method: method.to_string(),
            race_free,
            scheme: None,
            trials: 0,
            mean_value: None,
            mean_elapsed: Duration::ZERO,
            min_elapsed: Duration::ZERO,
            max_elapsed: Duration::ZERO,
            mismatches: 0,
            spawned: None,
            error: Some(error),
        }
    }

    /// Completed without error and every trial was correct.
    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.error.is_none() && self.mismatches == 0
    }
}

/// A full comparison: parameters plus one summary per method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// Problem that was solved.
    pub problem: Problem,
    /// Intervals, `N`, matrix dimension, or element count.
    pub size: u64,
    /// Pool size of every parallel method.
    pub workers: usize,
    /// Task count of the fixed-task method.
    pub tasks: usize,
    /// Sequential cutoff of the recursive methods.
    pub cutoff: usize,
    /// Trials per method.
    pub trials: usize,
    /// One summary per method, in run order.
    pub results: Vec<TrialSummary>,
}

/// Null trial reporter (does nothing).
pub struct NullTrialReporter;

impl TrialReporter for NullTrialReporter {
    fn start(&self, _method: &str, _total: usize) {}
    fn trial_complete(&self, _method: &str, _completed: usize) {}
    fn complete(&self) {}
}
