//! CLI output formatting.

use std::time::Duration;

use parbench_orchestration::{ComparisonReport, Problem, TrialSummary};

/// Format a duration for display.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 0.001 {
        format!("{:.2}µs", secs * 1_000_000.0)
    } else if secs < 1.0 {
        format!("{:.2}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{secs:.3}s")
    } else {
        let mins = (secs / 60.0).floor() as u64;
        let remaining = secs - (mins as f64 * 60.0);
        format!("{mins}m{remaining:.1}s")
    }
}

/// Format a number with thousand separators.
#[must_use]
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Format a mean result value the way the problem reads best: π to twelve
/// decimals, sums as grouped integers, matrix checksums in full.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_value(problem: Problem, value: Option<f64>) -> String {
    match (problem, value) {
        (_, None) => "-".to_string(),
        (Problem::Pi, Some(v)) => format!("{v:.12}"),
        (Problem::Sum, Some(v)) if v.fract() == 0.0 && v >= 0.0 => format_number(v as u64),
        (_, Some(v)) => format!("{v}"),
    }
}

/// Short correctness label for a summary.
#[must_use]
pub fn status_label(summary: &TrialSummary) -> String {
    match (&summary.error, summary.mismatches) {
        (Some(_), _) => "ERROR".to_string(),
        (None, 0) => "OK".to_string(),
        (None, wrong) if summary.race_free => format!("WRONG {wrong}/{}", summary.trials),
        (None, wrong) => format!("RACE {wrong}/{}", summary.trials),
    }
}

/// One-line description of the run parameters.
#[must_use]
pub fn describe_run(report: &ComparisonReport) -> String {
    format!(
        "{} size={} workers={} tasks={} cutoff={} trials={}",
        report.problem,
        format_number(report.size),
        report.workers,
        report.tasks,
        report.cutoff,
        report.trials
    )
}

/// Serialize a report as pretty-printed JSON.
pub fn to_json(report: &ComparisonReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}
