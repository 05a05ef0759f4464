//! Square matrix multiplication under several parallel loop strategies.
//!
//! `Collapse` and `NestedLoops` compute every cell with the same `k` order as
//! `Sequential`, so their results are bit-identical to it. `Reduction` sums
//! each cell's dot product across workers and `Transpose` reads `Bᵀ` rows,
//! so they may differ by reassociation.

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::accumulate::{accumulate_in, AccumulationResult, MergeDiscipline};
use crate::contribution::DotProductTerm;
use crate::error::ParError;
use crate::partition::{Domain, WorkerLayout};
use crate::pool::build_pool;

/// Dense square matrix of `f64`, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    n: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// An `n x n` matrix of zeros.
    #[must_use]
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            data: vec![0.0; n * n],
        }
    }

    /// An `n x n` matrix with `m[i][j] = f(i, j)`.
    #[must_use]
    pub fn from_fn(n: usize, f: impl Fn(usize, usize) -> f64) -> Self {
        let data = (0..n * n).map(|idx| f(idx / n, idx % n)).collect();
        Self { n, data }
    }

    /// Dimension of the matrix.
    #[must_use]
    pub fn size(&self) -> usize {
        self.n
    }

    /// Element at row `i`, column `j`.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    /// Row `i` as a slice.
    #[must_use]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    /// The transpose.
    #[must_use]
    pub fn transpose(&self) -> Self {
        Self::from_fn(self.n, |i, j| self.get(j, i))
    }

    /// Largest `|x - y| / max(|x|, |y|, 1)` over corresponding elements.
    #[must_use]
    pub fn max_relative_diff(&self, other: &Self) -> f64 {
        self.data
            .iter()
            .zip(&other.data)
            .map(|(x, y)| (x - y).abs() / x.abs().max(y.abs()).max(1.0))
            .fold(0.0, f64::max)
    }

    /// `Σ_k self[i][k] * other[k][j]`, accumulated in increasing `k`.
    fn dot(&self, other: &Self, i: usize, j: usize) -> f64 {
        let mut sum = 0.0;
        for (k, a_ik) in self.row(i).iter().enumerate() {
            sum += a_ik * other.get(k, j);
        }
        sum
    }
}

/// Loop strategy for `C = A * B`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatrixStrategy {
    /// Triple loop on the calling thread.
    Sequential,
    /// One parallel loop over all `n * n` cells.
    Collapse,
    /// Parallel rows, with a parallel loop over columns inside each row.
    NestedLoops,
    /// Cells in order, each cell a parallel reduction over `k`.
    Reduction,
    /// Transpose `B`, then one parallel loop over cells with unit-stride
    /// dot products.
    Transpose,
}

impl MatrixStrategy {
    /// All strategies.
    pub const ALL: [MatrixStrategy; 5] = [
        Self::Sequential,
        Self::Collapse,
        Self::NestedLoops,
        Self::Reduction,
        Self::Transpose,
    ];

    /// Short name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Collapse => "collapse",
            Self::NestedLoops => "nested-loops",
            Self::Reduction => "reduction",
            Self::Transpose => "transpose",
        }
    }

    /// Whether results are bit-identical to [`MatrixStrategy::Sequential`].
    #[must_use]
    pub fn is_exact(&self) -> bool {
        matches!(self, Self::Sequential | Self::Collapse | Self::NestedLoops)
    }
}

impl fmt::Display for MatrixStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MatrixStrategy {
    type Err = ParError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.name() == s)
            .ok_or_else(|| ParError::InvalidInput(format!("unknown matrix strategy: {s}")))
    }
}

/// Compute `A * B` with `strategy` on a pool of `workers` threads.
///
/// The transpose of `B` used by [`MatrixStrategy::Transpose`] is built
/// before the clock starts.
pub fn multiply(
    a: &Matrix,
    b: &Matrix,
    strategy: MatrixStrategy,
    workers: usize,
) -> Result<AccumulationResult<Matrix>, ParError> {
    if a.size() != b.size() {
        return Err(ParError::InvalidInput(format!(
            "dimension mismatch: {n}x{n} * {m}x{m}",
            n = a.size(),
            m = b.size()
        )));
    }
    let n = a.size();
    let pool = build_pool(workers)?;
    let b_t = (strategy == MatrixStrategy::Transpose).then(|| b.transpose());
    let mut c = Matrix::zeros(n);

    let start = Instant::now();
    match strategy {
        MatrixStrategy::Sequential => {
            for i in 0..n {
                for j in 0..n {
                    c.data[i * n + j] = a.dot(b, i, j);
                }
            }
        }
        MatrixStrategy::Collapse => pool.install(|| {
            c.data.par_iter_mut().enumerate().for_each(|(idx, cell)| {
                *cell = a.dot(b, idx / n, idx % n);
            });
        }),
        MatrixStrategy::NestedLoops => pool.install(|| {
            c.data.par_chunks_mut(n.max(1)).enumerate().for_each(|(i, row)| {
                row.par_iter_mut().enumerate().for_each(|(j, cell)| {
                    *cell = a.dot(b, i, j);
                });
            });
        }),
        MatrixStrategy::Reduction => {
            for i in 0..n {
                for j in 0..n {
                    let term = DotProductTerm::new(a, b, i, j);
                    let cell = accumulate_in(
                        &pool,
                        Domain::zero_based(n as u64),
                        MergeDiscipline::Reduction,
                        WorkerLayout::Block,
                        &term,
                    )?;
                    c.data[i * n + j] = cell.value;
                }
            }
        }
        MatrixStrategy::Transpose => {
            let b_t = b_t.as_ref().unwrap_or(b);
            pool.install(|| {
                c.data.par_iter_mut().enumerate().for_each(|(idx, cell)| {
                    let (row, col) = (a.row(idx / n), b_t.row(idx % n));
                    *cell = row.iter().zip(col).map(|(x, y)| x * y).sum();
                });
            });
        }
    }
    let elapsed = start.elapsed();

    debug!(strategy = strategy.name(), n, workers, ?elapsed, "matrix multiply complete");
    Ok(AccumulationResult { value: c, elapsed })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn i_plus_j(n: usize) -> Matrix {
        Matrix::from_fn(n, |i, j| (i + j) as f64)
    }

    #[test]
    fn sequential_small_product() {
        let a = i_plus_j(2); // [[0, 1], [1, 2]]
        let c = multiply(&a, &a, MatrixStrategy::Sequential, 1).unwrap().value;
        assert_eq!(c, Matrix::from_fn(2, |i, j| [[1.0, 2.0], [2.0, 5.0]][i][j]));
    }

    #[test]
    fn every_strategy_matches_sequential() {
        let a = i_plus_j(64);
        let expected = multiply(&a, &a, MatrixStrategy::Sequential, 1).unwrap().value;
        for strategy in MatrixStrategy::ALL {
            let c = multiply(&a, &a, strategy, 4).unwrap().value;
            if strategy.is_exact() {
                assert_eq!(c, expected, "{strategy} differs");
            } else {
                assert!(c.max_relative_diff(&expected) <= 1e-9, "{strategy} differs");
            }
        }
    }

    #[test]
    fn non_square_pair_rejected() {
        let a = Matrix::zeros(3);
        let b = Matrix::zeros(4);
        assert!(matches!(
            multiply(&a, &b, MatrixStrategy::Collapse, 2),
            Err(ParError::InvalidInput(_))
        ));
    }

    #[test]
    fn empty_matrix() {
        let a = Matrix::zeros(0);
        for strategy in MatrixStrategy::ALL {
            let c = multiply(&a, &a, strategy, 2).unwrap().value;
            assert_eq!(c.size(), 0);
        }
    }

    #[test]
    fn transpose_roundtrip() {
        let a = Matrix::from_fn(3, |i, j| (i * 3 + j) as f64);
        assert_eq!(a.transpose().get(0, 2), a.get(2, 0));
        assert_eq!(a.transpose().transpose(), a);
    }

    #[test]
    fn strategy_names_parse() {
        for strategy in MatrixStrategy::ALL {
            assert_eq!(strategy.name().parse::<MatrixStrategy>().unwrap(), strategy);
        }
        assert!("strassen".parse::<MatrixStrategy>().is_err());
    }

    #[test]
    fn relative_diff_of_equal_matrices_is_zero() {
        let a = i_plus_j(5);
        assert!(a.max_relative_diff(&a.clone()).abs() < f64::EPSILON);
    }
}
