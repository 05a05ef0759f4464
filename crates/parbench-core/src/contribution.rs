//! Per-index contribution functions.
//!
//! A contribution maps an index of the domain to the value it adds to the
//! aggregate. It must be pure: every strategy calls it concurrently from
//! all workers with no synchronization.

use crate::aggregate::Aggregate;
use crate::matrix::Matrix;

/// A pure `index -> value` function, callable from any worker.
pub trait Contribution<T: Aggregate>: Sync {
    /// Value contributed by `index`.
    fn term(&self, index: u64) -> T;
}

impl<T, F> Contribution<T> for F
where
    T: Aggregate,
    F: Fn(u64) -> T + Sync,
{
    fn term(&self, index: u64) -> T {
        self(index)
    }
}

/// `i -> i`, so that summing over `[1, N]` yields `N(N+1)/2`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Contribution<u64> for Identity {
    fn term(&self, index: u64) -> u64 {
        index
    }
}

/// Midpoint-rule term of `∫₀¹ 4/(1+x²) dx = π`.
///
/// The term omits the `dx` factor; apply [`MidpointPi::finish`] to the
/// aggregate to get the estimate.
#[derive(Debug, Clone, Copy)]
pub struct MidpointPi {
    dx: f64,
}

impl MidpointPi {
    /// Integrand sampled at the midpoints of `intervals` equal subintervals.
    #[must_use]
    pub fn new(intervals: u64) -> Self {
        Self {
            dx: 1.0 / intervals.max(1) as f64,
        }
    }

    /// Width of one subinterval.
    #[must_use]
    pub fn dx(&self) -> f64 {
        self.dx
    }

    /// Scale a summed aggregate into the π estimate.
    #[must_use]
    pub fn finish(&self, sum: f64) -> f64 {
        sum * self.dx
    }
}

impl Contribution<f64> for MidpointPi {
    fn term(&self, index: u64) -> f64 {
        let x = (index as f64 + 0.5) * self.dx;
        4.0 / (1.0 + x * x)
    }
}

/// `A[i][k] * B[k][j]` for a fixed output cell `(i, j)`, indexed by `k`.
#[derive(Debug, Clone, Copy)]
pub struct DotProductTerm<'a> {
    a: &'a Matrix,
    b: &'a Matrix,
    row: usize,
    col: usize,
}

impl<'a> DotProductTerm<'a> {
    /// Terms of `C[row][col]` for `C = A * B`.
    #[must_use]
    pub fn new(a: &'a Matrix, b: &'a Matrix, row: usize, col: usize) -> Self {
        Self { a, b, row, col }
    }
}

impl Contribution<f64> for DotProductTerm<'_> {
    #[allow(clippy::cast_possible_truncation)]
    fn term(&self, index: u64) -> f64 {
        let k = index as usize;
        self.a.get(self.row, k) * self.b.get(k, self.col)
    }
}
