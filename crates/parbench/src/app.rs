//! Application entry point and dispatch.

use anyhow::{Context, Result};
use tracing::debug;

use parbench_cli::presenter::CLIResultPresenter;
use parbench_cli::progress::CLIProgressReporter;
use parbench_cli::ui::{print_success, print_warning};
use parbench_core::{Options, ParError};
use parbench_orchestration::interfaces::ResultPresenter;
use parbench_orchestration::method_selection::get_methods_to_run;
use parbench_orchestration::orchestrator::{
    analyze_results, build_report, execute_comparison, run_trials,
};
use parbench_orchestration::{Problem, TrialSummary, Workload};

use crate::config::AppConfig;

/// Run the application.
pub fn run(config: &AppConfig) -> Result<()> {
    // Handle shell completion
    if let Some(shell) = config.completion {
        let mut cmd = <AppConfig as clap::CommandFactory>::command();
        parbench_cli::completion::generate_completion(&mut cmd, shell, &mut std::io::stdout());
        return Ok(());
    }

    run_cli(config)
}

fn run_cli(config: &AppConfig) -> Result<()> {
    let presenter = CLIResultPresenter::new(config.verbose, config.quiet, config.json);
    run_with(config, &presenter)
}

/// Run the comparison, reporting any error through `presenter`.
fn run_with(config: &AppConfig, presenter: &dyn ResultPresenter) -> Result<()> {
    let result = run_comparison(config, presenter);
    if let Err(err) = &result {
        presenter.present_error(&format!("{err:#}"));
    }
    result
}

fn run_comparison(config: &AppConfig, presenter: &dyn ResultPresenter) -> Result<()> {
    let problem: Problem = config.problem.parse()?;
    let options = config.options();
    validate(&options, config.trials)?;

    let size = config.size_for(problem);
    let workload = Workload::prepare(problem, size)
        .with_context(|| format!("preparing {problem} workload of size {size}"))?;
    let methods = get_methods_to_run(problem, &config.strategy)?;
    debug!(%problem, size, methods = methods.len(), ?options, "starting comparison");

    let reporter = CLIProgressReporter::new(!config.quiet && !config.json);

    // A single explicitly chosen method fails loudly; in a comparison,
    // failures become rows of the report.
    let report = if let [method] = methods[..] {
        let summary = run_trials(&workload, method, &options, config.trials, &reporter)
            .with_context(|| format!("running {method}"))?;
        build_report(&workload, &options, config.trials, vec![summary])
    } else {
        execute_comparison(&workload, &methods, &options, config.trials, &reporter)
    };

    presenter.present_report(&report);
    let verdict = analyze_results(&report.results);
    if verdict.is_ok() && !config.quiet && !config.json {
        if report.results.iter().all(TrialSummary::is_correct) {
            print_success("every method matched the known answer");
        } else {
            print_warning("some methods failed or lost updates, see the status column");
        }
    }
    verdict?;
    Ok(())
}

/// Reject options that would make every method fail.
fn validate(options: &Options, trials: usize) -> Result<(), ParError> {
    if options.workers == 0 {
        return Err(ParError::Zero("workers"));
    }
    if trials == 0 {
        return Err(ParError::Zero("trials"));
    }
    Ok(())
}
