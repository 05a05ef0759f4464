//! Method selection logic.

use parbench_core::{MatrixStrategy, ParError, Strategy};

use crate::problem::{Method, Problem, SortMethod};

/// Get the methods to run for `problem` based on a name selection.
///
/// `"all"` selects every method of the problem and `"default"` its
/// default method. Otherwise the name is looked up among the problem's own
/// methods.
pub fn get_methods_to_run(problem: Problem, selection: &str) -> Result<Vec<Method>, ParError> {
    match selection {
        "all" => return Ok(problem.methods()),
        "default" => return Ok(vec![default_method(problem)]),
        _ => {}
    }
    let method = match problem {
        Problem::Pi | Problem::Sum => Method::Reduce(selection.parse::<Strategy>()?),
        Problem::Matrix => Method::Multiply(selection.parse::<MatrixStrategy>()?),
        Problem::Sort => SortMethod::ALL
            .into_iter()
            .find(|m| m.name() == selection)
            .map(Method::Sort)
            .ok_or_else(|| ParError::InvalidInput(format!("unknown sort method: {selection}")))?,
    };
    Ok(vec![method])
}

/// Method used when none is selected.
#[must_use]
pub fn default_method(problem: Problem) -> Method {
    match problem {
        Problem::Pi | Problem::Sum => Method::Reduce(Strategy::default()),
        Problem::Matrix => Method::Multiply(MatrixStrategy::Collapse),
        Problem::Sort => Method::Sort(SortMethod::Parallel),
    }
}
