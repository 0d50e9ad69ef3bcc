//! Compiled predicates and their composition.

use std::fmt;
use std::ops::BitAnd;

/// A compiled filter over records.
///
/// `Built` values are produced by binding an expression to a registered
/// query, and are joined with [`Built::and`] (or `&`). Evaluation
/// short-circuits: the right-hand side is not run for records the left-hand
/// side rejects.
///
/// ```
/// use recordset::Built;
///
/// let even = Built::from_fn(|n: &i32| n % 2 == 0);
/// let small = Built::from_fn(|n: &i32| *n < 10);
/// let filter = Built::always() & even & small;
///
/// assert!(filter.matches(&4));
/// assert!(!filter.matches(&12));
/// ```
pub struct Built<R> {
    filter: Box<dyn Fn(&R) -> bool + Send + Sync>,
}

impl<R: 'static> Built<R> {
    /// The identity predicate, matching every record.
    pub fn always() -> Self {
        Built::from_fn(|_| true)
    }

    /// Wraps a closure.
    pub fn from_fn<F>(filter: F) -> Self
    where
        F: Fn(&R) -> bool + Send + Sync + 'static,
    {
        Built {
            filter: Box::new(filter),
        }
    }

    /// Joins two predicates with logical AND.
    pub fn and(self, other: Built<R>) -> Self {
        Built::from_fn(move |record| self.matches(record) && other.matches(record))
    }
}

impl<R> Built<R> {
    /// Tests a record.
    pub fn matches(&self, record: &R) -> bool {
        (self.filter)(record)
    }
}

impl<R: 'static> BitAnd for Built<R> {
    type Output = Built<R>;

    fn bitand(self, other: Built<R>) -> Built<R> {
        self.and(other)
    }
}

impl<R> fmt::Debug for Built<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Built").finish_non_exhaustive()
    }
}
