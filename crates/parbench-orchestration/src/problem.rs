//! Benchmark problems, the methods that solve them, and prepared workloads.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use parbench_core::constants::{DEFAULT_INTERVALS, MATRIX_RELATIVE_TOLERANCE, PI_TOLERANCE};
use parbench_core::{
    invoke, multiply, parallel_quicksort, quicksort, recursive_task_sum, Contribution, Domain,
    Identity, Matrix, MatrixStrategy, MidpointPi, Options, ParError, PartitionScheme, Strategy,
    TaskStats,
};

/// A problem with a known answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Problem {
    /// Midpoint-rule estimate of π.
    #[default]
    Pi,
    /// Sum of `1..=N`.
    Sum,
    /// `A * A` for `A[i][j] = i + j`.
    Matrix,
    /// Sort of a scrambled sequence.
    Sort,
}

impl Problem {
    /// All problems, in presentation order.
    pub const ALL: [Problem; 4] = [Self::Pi, Self::Sum, Self::Matrix, Self::Sort];

    /// Command-line name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pi => "pi",
            Self::Sum => "sum",
            Self::Matrix => "matrix",
            Self::Sort => "sort",
        }
    }

    /// Size used when none is given: intervals, `N`, matrix dimension, or
    /// element count.
    #[must_use]
    pub fn default_size(&self) -> u64 {
        match self {
            Self::Pi => DEFAULT_INTERVALS,
            Self::Sum => 1_000_000,
            Self::Matrix => 100,
            Self::Sort => 1_000_000,
        }
    }

    /// Every method that solves this problem.
    #[must_use]
    pub fn methods(&self) -> Vec<Method> {
        match self {
            Self::Pi | Self::Sum => Strategy::ALL.into_iter().map(Method::Reduce).collect(),
            Self::Matrix => MatrixStrategy::ALL.into_iter().map(Method::Multiply).collect(),
            Self::Sort => SortMethod::ALL.into_iter().map(Method::Sort).collect(),
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Problem {
    type Err = ParError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| ParError::InvalidInput(format!("unknown problem: {s}")))
    }
}

/// Sequential or task-parallel quicksort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortMethod {
    /// Recursive partitioning on the calling thread.
    Sequential,
    /// Task-parallel partitioning with the cutoff.
    Parallel,
}

impl SortMethod {
    /// Both sort methods, baseline first.
    pub const ALL: [SortMethod; 2] = [Self::Sequential, Self::Parallel];

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Parallel => "parallel",
        }
    }
}

/// One way of solving a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// A reduction strategy, for π and sums.
    Reduce(Strategy),
    /// A matrix multiply strategy.
    Multiply(MatrixStrategy),
    /// A quicksort.
    Sort(SortMethod),
}

impl Method {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Reduce(s) => s.name(),
            Self::Multiply(s) => s.name(),
            Self::Sort(s) => s.name(),
        }
    }

    /// Whether every trial is expected to produce the exact answer.
    #[must_use]
    pub fn is_race_free(&self) -> bool {
        match self {
            Self::Reduce(s) => s.is_race_free(),
            Self::Multiply(_) | Self::Sort(_) => true,
        }
    }

    /// How the method splits its work under `options`. `None` for matrix
    /// strategies that leave the split to the pool's work stealing.
    #[must_use]
    pub fn scheme(&self, options: &Options) -> Option<PartitionScheme> {
        match self {
            Self::Reduce(s) => Some(s.scheme(options)),
            Self::Multiply(MatrixStrategy::Sequential) | Self::Sort(SortMethod::Sequential) => {
                Some(PartitionScheme::Sequential)
            }
            Self::Sort(SortMethod::Parallel) => Some(PartitionScheme::TaskRecursive {
                cutoff: options.cutoff,
            }),
            Self::Multiply(_) => None,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of a single trial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trial {
    /// Numeric result: the estimate, the sum, or the sum of the product's
    /// entries. `None` for sorts.
    pub value: Option<f64>,
    pub elapsed: Duration,
    /// Whether the result equals the known answer.
    pub correct: bool,
    /// Spawn statistics for task-based methods.
    pub stats: Option<TaskStats>,
}

#[derive(Debug, Clone)]
enum Input {
    Pi,
    Sum,
    Matrix { a: Matrix, expected: Matrix },
    Sort { data: Vec<u64>, expected: Vec<u64> },
}

/// A problem instance with its inputs and reference answer prepared once,
/// outside any timed region.
#[derive(Debug, Clone)]
pub struct Workload {
    problem: Problem,
    size: u64,
    input: Input,
}

impl Workload {
    /// Prepare `problem` at `size`.
    pub fn prepare(problem: Problem, size: u64) -> Result<Self, ParError> {
        if size == 0 {
            return Err(ParError::Zero("size"));
        }
        let input = match problem {
            Problem::Pi => Input::Pi,
            Problem::Sum => Input::Sum,
            Problem::Matrix => {
                let n = to_usize(size)?;
                let a = Matrix::from_fn(n, |i, j| (i + j) as f64);
                let expected = multiply(&a, &a, MatrixStrategy::Sequential, 1)?.value;
                Input::Matrix { a, expected }
            }
            Problem::Sort => {
                let data = scrambled(to_usize(size)?);
                let mut expected = data.clone();
                expected.sort_unstable();
                Input::Sort { data, expected }
            }
        };
        Ok(Self {
            problem,
            size,
            input,
        })
    }

    #[must_use]
    pub fn problem(&self) -> Problem {
        self.problem
    }

    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Run `method` once.
    pub fn run(&self, method: Method, options: &Options) -> Result<Trial, ParError> {
        match (&self.input, method) {
            (Input::Pi, Method::Reduce(strategy)) => {
                let pi = MidpointPi::new(self.size);
                let (sum, elapsed, stats) =
                    reduce(Domain::zero_based(self.size), strategy, options, &pi)?;
                let estimate = pi.finish(sum);
                Ok(Trial {
                    value: Some(estimate),
                    elapsed,
                    correct: (estimate - std::f64::consts::PI).abs() < pi_tolerance(self.size),
                    stats,
                })
            }
            (Input::Sum, Method::Reduce(strategy)) => {
                let (sum, elapsed, stats) =
                    reduce(Domain::one_based(self.size), strategy, options, &Identity)?;
                Ok(Trial {
                    value: Some(sum as f64),
                    elapsed,
                    correct: sum == triangular(self.size),
                    stats,
                })
            }
            (Input::Matrix { a, expected }, Method::Multiply(strategy)) => {
                let run = multiply(a, a, strategy, options.workers)?;
                let correct = if strategy.is_exact() {
                    run.value == *expected
                } else {
                    run.value.max_relative_diff(expected) <= MATRIX_RELATIVE_TOLERANCE
                };
                Ok(Trial {
                    value: Some(checksum(&run.value)),
                    elapsed: run.elapsed,
                    correct,
                    stats: None,
                })
            }
            (Input::Sort { data, expected }, Method::Sort(sort)) => {
                let mut work = data.clone();
                let (elapsed, stats) = match sort {
                    SortMethod::Sequential => {
                        let start = Instant::now();
                        quicksort(&mut work);
                        (start.elapsed(), None)
                    }
                    SortMethod::Parallel => {
                        let report =
                            parallel_quicksort(&mut work, options.workers, options.cutoff)?;
                        (report.elapsed, Some(report.stats))
                    }
                };
                Ok(Trial {
                    value: None,
                    elapsed,
                    correct: work == *expected,
                    stats,
                })
            }
            _ => Err(ParError::InvalidInput(format!(
                "method {method} does not apply to problem {}",
                self.problem
            ))),
        }
    }
}

/// Run a reduction, keeping spawn statistics for the recursive strategy.
fn reduce<T, C>(
    domain: Domain,
    strategy: Strategy,
    options: &Options,
    contribution: &C,
) -> Result<(T, Duration, Option<TaskStats>), ParError>
where
    T: parbench_core::Aggregate,
    C: Contribution<T>,
{
    if strategy == Strategy::RecursiveTask {
        let run = recursive_task_sum(domain, options.cutoff, options.workers, contribution)?;
        return Ok((run.result.value, run.result.elapsed, Some(run.stats)));
    }
    let run = invoke(domain, strategy, options, contribution)?;
    Ok((run.value, run.elapsed, None))
}

/// Accepted π error for `intervals` midpoint intervals. The rule's own error
/// is about `1 / (12 n²)`, so small interval counts get a wider bound.
fn pi_tolerance(intervals: u64) -> f64 {
    let n = intervals as f64;
    PI_TOLERANCE.max(1.0 / (n * n))
}

/// `1 + 2 + ... + n` in wrapping arithmetic, matching the `u64` aggregate.
fn triangular(n: u64) -> u64 {
    if n % 2 == 0 {
        (n / 2).wrapping_mul(n.wrapping_add(1))
    } else {
        n.wrapping_mul(n / 2 + 1)
    }
}

fn checksum(m: &Matrix) -> f64 {
    (0..m.size()).map(|i| m.row(i).iter().sum::<f64>()).sum()
}

fn to_usize(size: u64) -> Result<usize, ParError> {
    usize::try_from(size).map_err(|_| ParError::InvalidInput(format!("size {size} is too large")))
}

/// Deterministic scrambled sequence of `n` values (splitmix64 of the index).
fn scrambled(n: usize) -> Vec<u64> {
    (0..n as u64)
        .map(|i| {
            let mut z = i.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
            z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
            z ^ (z >> 31)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Options {
        Options {
            workers: 4,
            tasks: 10,
            cutoff: 100,
        }
    }

    #[test]
    fn problem_names_parse() {
        for problem in Problem::ALL {
            assert_eq!(problem.name().parse::<Problem>().unwrap(), problem);
        }
        assert!("fft".parse::<Problem>().is_err());
    }

    #[test]
    fn triangular_numbers() {
        assert_eq!(triangular(10), 55);
        assert_eq!(triangular(1_000_000), 500_000_500_000);
        assert_eq!(triangular(7), 28);
    }

    #[test]
    fn coarse_pi_is_still_correct() {
        let workload = Workload::prepare(Problem::Pi, 100).unwrap();
        let trial = workload.run(Method::Reduce(Strategy::Reduction), &options()).unwrap();
        assert!(trial.correct);
        assert!((pi_tolerance(10_000) - PI_TOLERANCE).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_size_rejected() {
        assert!(matches!(
            Workload::prepare(Problem::Sum, 0),
            Err(ParError::Zero("size"))
        ));
    }

    #[test]
    fn every_method_solves_its_problem() {
        let sizes = [
            (Problem::Pi, 10_000),
            (Problem::Sum, 10_000),
            (Problem::Matrix, 24),
            (Problem::Sort, 20_000),
        ];
        for (problem, size) in sizes {
            let workload = Workload::prepare(problem, size).unwrap();
            for method in problem.methods().into_iter().filter(Method::is_race_free) {
                let trial = workload.run(method, &options()).unwrap();
                assert!(trial.correct, "{problem}/{method}");
            }
        }
    }

    #[test]
    fn reduction_methods_include_baseline_and_block_rows() {
        let methods = Problem::Sum.methods();
        assert_eq!(methods[0], Method::Reduce(Strategy::Sequential));
        assert!(methods.contains(&Method::Reduce(Strategy::BlockReduction)));
        let workload = Workload::prepare(Problem::Sum, 1_000_000).unwrap();
        for strategy in [Strategy::Sequential, Strategy::BlockReduction] {
            let trial = workload.run(Method::Reduce(strategy), &options()).unwrap();
            assert_eq!(trial.value, Some(500_000_500_000.0), "{strategy}");
            assert!(trial.correct);
        }
    }

    #[test]
    fn method_schemes() {
        let options = options();
        assert_eq!(
            Method::Reduce(Strategy::BlockReduction).scheme(&options),
            Some(PartitionScheme::Block { workers: 4 })
        );
        assert_eq!(
            Method::Sort(SortMethod::Parallel).scheme(&options),
            Some(PartitionScheme::TaskRecursive { cutoff: 100 })
        );
        assert_eq!(
            Method::Multiply(MatrixStrategy::Sequential).scheme(&options),
            Some(PartitionScheme::Sequential)
        );
        assert_eq!(Method::Multiply(MatrixStrategy::Collapse).scheme(&options), None);
    }

    #[test]
    fn sum_value_is_reported() {
        let workload = Workload::prepare(Problem::Sum, 10).unwrap();
        let trial = workload.run(Method::Reduce(Strategy::Atomic), &options()).unwrap();
        assert_eq!(trial.value, Some(55.0));
        assert!(trial.stats.is_none());
    }

    #[test]
    fn recursive_task_reports_spawns() {
        let workload = Workload::prepare(Problem::Sum, 100_000).unwrap();
        let trial = workload
            .run(Method::Reduce(Strategy::RecursiveTask), &options())
            .unwrap();
        assert!(trial.stats.unwrap().spawned > 0);
    }

    #[test]
    fn parallel_sort_reports_spawns() {
        let workload = Workload::prepare(Problem::Sort, 50_000).unwrap();
        let trial = workload
            .run(Method::Sort(SortMethod::Parallel), &options())
            .unwrap();
        assert!(trial.correct);
        assert!(trial.value.is_none());
        assert!(trial.stats.unwrap().smallest_spawned.unwrap() > 100);
    }

    #[test]
    fn mismatched_method_rejected() {
        let workload = Workload::prepare(Problem::Matrix, 4).unwrap();
        let result = workload.run(Method::Reduce(Strategy::Reduction), &options());
        assert!(matches!(result, Err(ParError::InvalidInput(_))));
    }

    #[test]
    fn matrix_checksum() {
        // A = [[0, 1], [1, 2]], A * A = [[1, 2], [2, 5]]
        let workload = Workload::prepare(Problem::Matrix, 2).unwrap();
        let trial = workload
            .run(Method::Multiply(MatrixStrategy::Collapse), &options())
            .unwrap();
        assert_eq!(trial.value, Some(10.0));
    }

    #[test]
    fn scrambled_is_deterministic_and_unsorted() {
        let a = scrambled(1000);
        assert_eq!(a, scrambled(1000));
        assert!(a.windows(2).any(|w| w[0] > w[1]));
    }
}
