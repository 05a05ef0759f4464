//! Core orchestration: repeated trials, comparison, and result analysis.

use std::time::Duration;

use tracing::{debug, info, warn};

use parbench_core::{Options, ParError};

use crate::error::HarnessError;
use crate::interfaces::{ComparisonReport, TrialReporter, TrialSummary};
use crate::problem::{Method, Workload};

/// Run `method` on `workload` `trials` times and summarize.
///
/// Stops at the first failing trial; a method that fails once fails on
/// every trial since inputs and options do not change.
pub fn run_trials(
    workload: &Workload,
    method: Method,
    options: &Options,
    trials: usize,
    reporter: &dyn TrialReporter,
) -> Result<TrialSummary, HarnessError> {
    if trials == 0 {
        return Err(ParError::Zero("trials").into());
    }
    reporter.start(method.name(), trials);

    let mut total = Duration::ZERO;
    let mut min_elapsed = Duration::MAX;
    let mut max_elapsed = Duration::ZERO;
    let mut value_sum: Option<f64> = None;
    let mut mismatches = 0;
    let mut spawned: Option<usize> = None;

    for completed in 1..=trials {
        let trial = match workload.run(method, options) {
            Ok(trial) => trial,
            Err(e) => {
                reporter.complete();
                return Err(e.into());
            }
        };
        total += trial.elapsed;
        min_elapsed = min_elapsed.min(trial.elapsed);
        max_elapsed = max_elapsed.max(trial.elapsed);
        if let Some(v) = trial.value {
            value_sum = Some(value_sum.unwrap_or(0.0) + v);
        }
        if !trial.correct {
            mismatches += 1;
        }
        if let Some(stats) = trial.stats {
            spawned = Some(spawned.unwrap_or(0).max(stats.spawned));
        }
        reporter.trial_complete(method.name(), completed);
    }
    reporter.complete();

    let summary = TrialSummary {
        method: method.name().to_string(),
        race_free: method.is_race_free(),
        scheme: method.scheme(options),
        trials,
        mean_value: value_sum.map(|sum| sum / trials as f64),
        mean_elapsed: total.div_f64(trials as f64),
        min_elapsed,
        max_elapsed,
        mismatches,
        spawned,
        error: None,
    };
    debug!(
        method = %method,
        trials,
        mismatches,
        mean_elapsed = ?summary.mean_elapsed,
        "trials complete"
    );
    Ok(summary)
}

/// Run every method in turn, recording failures in their summaries.
///
/// Methods run one after another so that their pools never compete for
/// cores.
pub fn execute_comparison(
    workload: &Workload,
    methods: &[Method],
    options: &Options,
    trials: usize,
    reporter: &dyn TrialReporter,
) -> ComparisonReport {
    let results = methods
        .iter()
        .map(|&method| {
            run_trials(workload, method, options, trials, reporter).unwrap_or_else(|e| {
                debug!(method = %method, error = %e, "method failed");
                TrialSummary {
                    scheme: method.scheme(options),
                    ..TrialSummary::failed(method.name(), method.is_race_free(), e.to_string())
                }
            })
        })
        .collect();
    build_report(workload, options, trials, results)
}

/// Attach the run parameters to a set of summaries.
#[must_use]
pub fn build_report(
    workload: &Workload,
    options: &Options,
    trials: usize,
    results: Vec<TrialSummary>,
) -> ComparisonReport {
    ComparisonReport {
        problem: workload.problem(),
        size: workload.size(),
        workers: options.workers,
        tasks: options.tasks,
        cutoff: options.cutoff,
        trials,
        results,
    }
}

/// Check every summary against the known answer.
///
/// Fails when no method completed, or when a race-free method produced a
/// wrong answer in any trial. Wrong answers from the unsynchronized method
/// are expected and only logged at info level.
pub fn analyze_results(results: &[TrialSummary]) -> Result<(), HarnessError> {
    let valid: Vec<&TrialSummary> = results.iter().filter(|r| r.error.is_none()).collect();
    if valid.is_empty() {
        return Err(HarnessError::NoResults);
    }

    let mut wrong = Vec::new();
    for summary in valid.iter().filter(|r| r.mismatches > 0) {
        if summary.race_free {
            warn!(method = %summary.method, mismatches = summary.mismatches, "wrong result");
            wrong.push(summary.method.clone());
        } else {
            info!(
                method = %summary.method,
                mismatches = summary.mismatches,
                trials = summary.trials,
                "lost updates in unsynchronized method"
            );
        }
    }

    if wrong.is_empty() {
        Ok(())
    } else {
        Err(HarnessError::Mismatch { methods: wrong })
    }
}
