//! # parbench-orchestration
//!
//! Trial execution, method selection, and result analysis.

pub mod error;
pub mod interfaces;
pub mod method_selection;
pub mod orchestrator;
pub mod problem;

pub use error::HarnessError;
pub use interfaces::{ComparisonReport, ResultPresenter, TrialReporter, TrialSummary};
pub use method_selection::{default_method, get_methods_to_run};
pub use orchestrator::{analyze_results, build_report, execute_comparison, run_trials};
pub use problem::{Method, Problem, SortMethod, Workload};

pub use parbench_core::PartitionScheme;
