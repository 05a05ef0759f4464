//! Trial progress display.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;

use parbench_orchestration::TrialReporter;

const TEMPLATE: &str =
    "{prefix:>16} [{elapsed_precise}] {bar:40.cyan/blue} {pos:>5}/{len:5} trials (eta {eta})";

/// Progress bar over the trials of each method, one bar at a time.
pub struct CLIProgressReporter {
    enabled: bool,
    bar: Mutex<Option<ProgressBar>>,
}

impl CLIProgressReporter {
    /// A reporter that draws bars on stderr when `enabled`.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            bar: Mutex::new(None),
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ")
    }
}

impl TrialReporter for CLIProgressReporter {
    fn start(&self, method: &str, total: usize) {
        let bar = if self.enabled {
            let bar = ProgressBar::new(total as u64);
            bar.set_style(Self::style());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        } else {
            ProgressBar::hidden()
        };
        bar.set_prefix(method.to_string());
        *self.bar.lock() = Some(bar);
    }

    fn trial_complete(&self, _method: &str, completed: usize) {
        if let Some(bar) = self.bar.lock().as_ref() {
            bar.set_position(completed as u64);
        }
    }

    fn complete(&self) {
        if let Some(bar) = self.bar.lock().take() {
            bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_is_valid() {
        assert!(ProgressStyle::with_template(TEMPLATE).is_ok());
    }

    #[test]
    fn hidden_reporter_tracks_position() {
        let reporter = CLIProgressReporter::new(false);
        reporter.start("reduction", 10);
        reporter.trial_complete("reduction", 4);
        assert_eq!(reporter.bar.lock().as_ref().map(ProgressBar::position), Some(4));
        reporter.complete();
        assert!(reporter.bar.lock().is_none());
    }

    #[test]
    fn complete_without_start_is_noop() {
        let reporter = CLIProgressReporter::new(false);
        reporter.complete();
        reporter.trial_complete("atomic", 1);
    }
}
