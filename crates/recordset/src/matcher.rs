//! The matching protocol.
//!
//! Matching is split between two traits:
//!
//! - [`Enumerate`] turns a candidate (usually a record field) into the
//!   sequence of values to test. A list yields its items, an integer
//!   [`Interval`] yields every integer it contains, anything else yields itself.
//! - [`Matcher`] decides whether an expression matches one candidate element,
//!   and derives `any`/`all` matching from that.
//!
//! | Expression | `matches_element(candidate)` |
//! |------------|------------------------------|
//! | [`Value`] | loose equality, or any item for a list value |
//! | [`Interval`] | containment |
//! | list | any item matches |
//! | [`Predicate`] | the closure's result |
//! | [`Regex`] | candidate is a string containing a match |
//!
//! `matches_all` is `false` for an empty candidate set: an empty field never
//! satisfies an "all" rule.
//!
//! ```
//! use recordset::{Expr, Matcher, Value};
//!
//! let level = Expr::from(1..=10);
//! assert!(level.matches_any(&Value::from(vec![0, 5])));
//! assert!(!level.matches_all(&Value::from(vec![0, 5])));
//! assert!(!level.matches_all(&Value::List(vec![])));
//! ```

use regex::Regex;

use crate::expr::{Expr, Interval, Predicate};
use crate::value::{Number, Value};

/// Candidate side of the protocol.
pub trait Enumerate {
    /// Returns the elements a matcher is tested against.
    fn to_enumeration(&self) -> Vec<Value<'_>>;
}

/// Expression side of the protocol.
pub trait Matcher {
    /// Tests a single candidate element.
    fn matches_element(&self, candidate: &Value<'_>) -> bool;

    /// Returns `true` if any enumerated candidate matches.
    ///
    /// An empty candidate set never matches.
    fn matches_any<C>(&self, candidates: &C) -> bool
    where
        C: Enumerate + ?Sized,
    {
        candidates
            .to_enumeration()
            .iter()
            .any(|candidate| self.matches_element(candidate))
    }

    /// Returns `true` if the candidate set is non-empty and every element matches.
    fn matches_all<C>(&self, candidates: &C) -> bool
    where
        C: Enumerate + ?Sized,
    {
        let elements = candidates.to_enumeration();
        !elements.is_empty()
            && elements
                .iter()
                .all(|candidate| self.matches_element(candidate))
    }
}

// ============================================================================
// Enumerate
// ============================================================================

impl Enumerate for Value<'_> {
    fn to_enumeration(&self) -> Vec<Value<'_>> {
        match self {
            Value::List(items) => items.iter().map(Value::reborrow).collect(),
            other => vec![other.reborrow()],
        }
    }
}

impl Enumerate for [Value<'_>] {
    fn to_enumeration(&self) -> Vec<Value<'_>> {
        self.iter().map(Value::reborrow).collect()
    }
}

impl Enumerate for Vec<Value<'_>> {
    fn to_enumeration(&self) -> Vec<Value<'_>> {
        self.as_slice().to_enumeration()
    }
}

impl Enumerate for Interval {
    /// Materializes every integer in the interval.
    ///
    /// This is eager: enumerating `0..=1_000_000` allocates a million values.
    /// Intervals over non-integers cannot be enumerated and yield nothing.
    fn to_enumeration(&self) -> Vec<Value<'_>> {
        match self.integer_bounds() {
            Some((start, end)) => (start..=end)
                .map(|n| Value::Number(Number::from_integer(n)))
                .collect(),
            None => {
                tracing::warn!(interval = %self, "interval is not enumerable");
                Vec::new()
            }
        }
    }
}

impl Enumerate for Expr {
    fn to_enumeration(&self) -> Vec<Value<'_>> {
        match self {
            Expr::Value(v) => v.to_enumeration(),
            Expr::Range(r) => r.to_enumeration(),
            Expr::List(items) => items.iter().flat_map(Expr::to_enumeration).collect(),
            // Expression-only kinds have no candidate values
            Expr::Predicate(_) | Expr::Regex(_) => Vec::new(),
        }
    }
}

// ============================================================================
// Matcher
// ============================================================================

impl Matcher for Value<'_> {
    fn matches_element(&self, candidate: &Value<'_>) -> bool {
        match self {
            // A list value behaves like a list expression
            Value::List(items) => items.matches_element(candidate),
            other => other.loose_eq(candidate),
        }
    }
}

impl Matcher for Interval {
    fn matches_element(&self, candidate: &Value<'_>) -> bool {
        self.contains(candidate)
    }
}

impl<M: Matcher> Matcher for [M] {
    fn matches_element(&self, candidate: &Value<'_>) -> bool {
        self.iter().any(|m| m.matches_element(candidate))
    }
}

impl<M: Matcher> Matcher for Vec<M> {
    fn matches_element(&self, candidate: &Value<'_>) -> bool {
        self.as_slice().matches_element(candidate)
    }
}

impl Matcher for Predicate {
    fn matches_element(&self, candidate: &Value<'_>) -> bool {
        self.call(candidate)
    }
}

impl Matcher for Regex {
    fn matches_element(&self, candidate: &Value<'_>) -> bool {
        candidate.as_str().is_some_and(|s| self.is_match(s))
    }
}

impl Matcher for Expr {
    fn matches_element(&self, candidate: &Value<'_>) -> bool {
        match self {
            Expr::Value(v) => v.matches_element(candidate),
            Expr::Range(r) => r.matches_element(candidate),
            Expr::List(items) => items.matches_element(candidate),
            Expr::Predicate(p) => p.matches_element(candidate),
            Expr::Regex(r) => r.matches_element(candidate),
        }
    }
}
