//! CLI result presenter.

use parbench_orchestration::interfaces::{ComparisonReport, ResultPresenter};

use crate::output::{describe_run, format_duration, format_value, status_label, to_json};
use crate::ui::{print_error, print_header, styled_status};

/// CLI result presenter: a comparison table, bare values, or JSON.
pub struct CLIResultPresenter {
    verbose: bool,
    quiet: bool,
    json: bool,
}

impl CLIResultPresenter {
    #[must_use]
    pub fn new(verbose: bool, quiet: bool, json: bool) -> Self {
        Self {
            verbose,
            quiet,
            json,
        }
    }

    /// Render the comparison table as lines of text, without styling.
    #[must_use]
    pub fn render_table(&self, report: &ComparisonReport) -> Vec<String> {
        let mut lines = vec![format!(
            "  {:<16} {:>12} {:>12} {:>12} {:>22}  {}",
            "method", "mean", "min", "max", "value", "status"
        )];
        lines.push(format!("{:-<96}", ""));
        for result in &report.results {
            let mut line = format!(
                "  {:<16} {:>12} {:>12} {:>12} {:>22}  {}",
                result.method,
                format_duration(result.mean_elapsed),
                format_duration(result.min_elapsed),
                format_duration(result.max_elapsed),
                format_value(report.problem, result.mean_value),
                status_label(result),
            );
            if self.verbose {
                if let Some(scheme) = &result.scheme {
                    line.push_str(&format!(" scheme={scheme}"));
                }
                if let Some(spawned) = result.spawned {
                    line.push_str(&format!(" spawned={spawned}"));
                }
                if let Some(error) = &result.error {
                    line.push_str(&format!(" ({error})"));
                }
            }
            lines.push(line);
        }
        lines
    }
}

impl ResultPresenter for CLIResultPresenter {
    fn present_report(&self, report: &ComparisonReport) {
        if self.json {
            match to_json(report) {
                Ok(json) => println!("{json}"),
                Err(e) => print_error(&format!("cannot serialize report: {e}")),
            }
            return;
        }

        if self.quiet {
            for result in &report.results {
                println!(
                    "{} {}",
                    result.method,
                    format_value(report.problem, result.mean_value)
                );
            }
            return;
        }

        print_header(&describe_run(report));
        let lines = self.render_table(report);
        for line in &lines[..2] {
            println!("{line}");
        }
        for (line, result) in lines[2..].iter().zip(&report.results) {
            // Restyle the status column in place.
            let label = status_label(result);
            match line.rfind(&label) {
                Some(at) => println!(
                    "{}{}{}",
                    &line[..at],
                    styled_status(&label),
                    &line[at + label.len()..]
                ),
                None => println!("{line}"),
            }
        }
    }

    fn present_error(&self, error: &str) {
        print_error(error);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use parbench_orchestration::{PartitionScheme, Problem, TrialSummary};

    use super::*;

    fn report() -> ComparisonReport {
        let ok = TrialSummary {
            method: "reduction".into(),
            race_free: true,
            scheme: Some(PartitionScheme::Interleaved { stride: 10 }),
            trials: 100,
            mean_value: Some(500_000_500_000.0),
            mean_elapsed: Duration::from_millis(2),
            min_elapsed: Duration::from_millis(1),
            max_elapsed: Duration::from_millis(3),
            mismatches: 0,
            spawned: None,
            error: None,
        };
        let racy = TrialSummary {
            method: "naive".into(),
            race_free: false,
            mismatches: 91,
            mean_value: Some(123_456.0),
            ..ok.clone()
        };
        let recursive = TrialSummary {
            method: "recursive-task".into(),
            spawned: Some(998),
            scheme: Some(PartitionScheme::TaskRecursive { cutoff: 1000 }),
            ..ok.clone()
        };
        ComparisonReport {
            problem: Problem::Sum,
            size: 1_000_000,
            workers: 10,
            tasks: 10,
            cutoff: 1000,
            trials: 100,
            results: vec![
                ok,
                racy,
                recursive,
                TrialSummary::failed("critical", true, "17 workers exceeds 16".into()),
            ],
        }
    }

    #[test]
    fn table_has_header_rule_and_one_row_per_method() {
        let presenter = CLIResultPresenter::new(false, false, false);
        let lines = presenter.render_table(&report());
        assert_eq!(lines.len(), 2 + 4);
        assert!(lines[0].contains("method"));
        assert!(lines[1].starts_with("----"));
        assert!(lines[2].contains("reduction") && lines[2].contains("500,000,500,000"));
        assert!(lines[3].ends_with("RACE 91/100"));
        assert!(lines[5].ends_with("ERROR"));
    }

    #[test]
    fn verbose_table_shows_spawns_and_errors() {
        let presenter = CLIResultPresenter::new(true, false, false);
        let lines = presenter.render_table(&report());
        assert!(lines[2].ends_with("scheme=interleaved(stride=10)"));
        assert!(lines[4].ends_with("scheme=recursive(cutoff=1000) spawned=998"));
        assert!(lines[5].contains("(17 workers exceeds 16)"));
    }

    #[test]
    fn present_modes_do_not_panic() {
        let report = report();
        CLIResultPresenter::new(false, false, false).present_report(&report);
        CLIResultPresenter::new(true, false, false).present_report(&report);
        CLIResultPresenter::new(false, true, false).present_report(&report);
        CLIResultPresenter::new(false, false, true).present_report(&report);
    }

    #[test]
    fn present_error() {
        CLIResultPresenter::new(false, false, false).present_error("test error message");
    }
}
