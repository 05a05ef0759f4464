//! Value types that can be reduced, and the shared cells they merge into.
//!
//! Every shared cell is an atomic word so that each merge discipline can be
//! expressed without `unsafe`. Relaxed ordering is enough everywhere: the
//! pool join publishes all writes before the caller reads the aggregate.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// A commutative, associative value with an atomic shared cell.
pub trait Aggregate: Copy + Send + Sync + PartialEq + fmt::Debug + 'static {
    /// Shared cell holding one value of this type.
    type Cell: Send + Sync;

    /// Identity of [`Aggregate::combine`].
    const ZERO: Self;

    /// Merge two partials.
    #[must_use]
    fn combine(self, other: Self) -> Self;

    /// Create a cell holding `value`.
    fn new_cell(value: Self) -> Self::Cell;

    /// Read a cell.
    fn load(cell: &Self::Cell) -> Self;

    /// Overwrite a cell. Only race-free when the caller is the cell's single
    /// writer.
    fn store(cell: &Self::Cell, value: Self);

    /// Indivisible read-modify-write add.
    fn fetch_add(cell: &Self::Cell, value: Self);

    /// Non-atomic read-modify-write: load, add, store as separate steps.
    /// Concurrent callers lose updates.
    fn racy_add(cell: &Self::Cell, value: Self) {
        racy_add_split(cell, value, || {});
    }
}

/// The steps of [`Aggregate::racy_add`], with `between` run after the load
/// and before the store.
fn racy_add_split<T: Aggregate>(cell: &T::Cell, value: T, between: impl FnOnce()) {
    let current = T::load(cell);
    between();
    T::store(cell, current.combine(value));
}

impl Aggregate for u64 {
    type Cell = AtomicU64;

    const ZERO: Self = 0;

    fn combine(self, other: Self) -> Self {
        self.wrapping_add(other)
    }

    fn new_cell(value: Self) -> AtomicU64 {
        AtomicU64::new(value)
    }

    fn load(cell: &AtomicU64) -> Self {
        cell.load(Ordering::Relaxed)
    }

    fn store(cell: &AtomicU64, value: Self) {
        cell.store(value, Ordering::Relaxed);
    }

    fn fetch_add(cell: &AtomicU64, value: Self) {
        cell.fetch_add(value, Ordering::Relaxed);
    }
}

/// `f64` is stored as its bit pattern; atomic add is a compare-exchange loop.
impl Aggregate for f64 {
    type Cell = AtomicU64;

    const ZERO: Self = 0.0;

    fn combine(self, other: Self) -> Self {
        self + other
    }

    fn new_cell(value: Self) -> AtomicU64 {
        AtomicU64::new(value.to_bits())
    }

    fn load(cell: &AtomicU64) -> Self {
        f64::from_bits(cell.load(Ordering::Relaxed))
    }

    fn store(cell: &AtomicU64, value: Self) {
        cell.store(value.to_bits(), Ordering::Relaxed);
    }

    fn fetch_add(cell: &AtomicU64, value: Self) {
        let mut current = cell.load(Ordering::Relaxed);
        loop {
            let next = (f64::from_bits(current) + value).to_bits();
            match cell.compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;

    use super::*;

    #[test]
    fn u64_cell_roundtrip() {
        let cell = u64::new_cell(5);
        u64::fetch_add(&cell, 7);
        assert_eq!(u64::load(&cell), 12);
        u64::store(&cell, 1);
        assert_eq!(u64::load(&cell), 1);
    }

    #[test]
    fn u64_combine_wraps() {
        assert_eq!(u64::MAX.combine(2), 1);
    }

    #[test]
    fn f64_fetch_add() {
        let cell = f64::new_cell(0.5);
        f64::fetch_add(&cell, 0.25);
        assert!((f64::load(&cell) - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn racy_add_single_thread_is_exact() {
        let cell = u64::new_cell(0);
        for i in 1..=10 {
            u64::racy_add(&cell, i);
        }
        assert_eq!(u64::load(&cell), 55);
    }

    #[test]
    fn racy_add_loses_interleaved_updates() {
        let cell = u64::new_cell(40);
        let barrier = Barrier::new(2);
        std::thread::scope(|s| {
            for value in [1, 2] {
                let (cell, barrier) = (&cell, &barrier);
                s.spawn(move || {
                    racy_add_split(cell, value, || {
                        barrier.wait();
                    });
                });
            }
        });
        // Both workers read 40 before either wrote, so one update is lost.
        let value = u64::load(&cell);
        assert!(value == 41 || value == 42, "got {value}");
        assert_ne!(value, 43);
    }

    #[test]
    fn racy_add_loses_interleaved_f64_updates() {
        let cell = f64::new_cell(0.0);
        let barrier = Barrier::new(4);
        std::thread::scope(|s| {
            for _ in 0..4 {
                let (cell, barrier) = (&cell, &barrier);
                s.spawn(move || {
                    racy_add_split(cell, 1.0, || {
                        barrier.wait();
                    });
                });
            }
        });
        assert!((f64::load(&cell) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn f64_fetch_add_concurrent() {
        let cell = f64::new_cell(0.0);
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..1000 {
                        f64::fetch_add(&cell, 1.0);
                    }
                });
            }
        });
        assert!((f64::load(&cell) - 4000.0).abs() < f64::EPSILON);
    }
}
