//! Query expressions.
//!
//! An [`Expr`] is the right-hand side of a query key: `{level: 1..=10}` binds
//! the expression `1..=10` to the `level` query. The shape of the expression
//! decides how it matches (see [`Matcher`](crate::Matcher)).

use std::fmt;
use std::ops::{Range, RangeInclusive};
use std::sync::Arc;

use regex::Regex;

use crate::value::{compare_values, Timestamp, Value};

/// Right-hand side of a query key.
///
/// # Example
///
/// ```
/// use recordset::{Expr, Matcher, Value};
///
/// assert!(Expr::from("El").matches_element(&Value::from("El")));
/// assert!(Expr::from(1..=10).matches_element(&Value::from(10)));
/// assert!(Expr::from(vec!["El", "Eld"]).matches_element(&Value::from("Eld")));
/// assert!(Expr::predicate(|v| v.as_str().is_some_and(|s| s.len() == 3))
///     .matches_element(&Value::from("Eld")));
/// ```
#[derive(Debug, Clone)]
pub enum Expr {
    /// Plain value, matched by equality.
    Value(Value<'static>),
    /// Interval, matched by containment.
    Range(Interval),
    /// Alternatives; matches if any element matches.
    List(Vec<Expr>),
    /// Caller-supplied test.
    Predicate(Predicate),
    /// Pattern searched for in string candidates.
    Regex(Regex),
}

impl Expr {
    /// Wraps a closure as a predicate expression.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Value<'_>) -> bool + Send + Sync + 'static,
    {
        Expr::Predicate(Predicate::new(f))
    }

    /// Compiles `pattern` into a regex expression.
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Expr::Regex(Regex::new(pattern)?))
    }

    /// Joins two expressions into one flattened list of alternatives.
    ///
    /// Nested lists on either side are spread, so combining `[1, 2]` with `3`
    /// yields `[1, 2, 3]`.
    pub fn combine(self, other: Expr) -> Expr {
        let mut items = Vec::new();
        self.flatten_into(&mut items);
        other.flatten_into(&mut items);
        Expr::List(items)
    }

    fn flatten_into(self, out: &mut Vec<Expr>) {
        match self {
            Expr::List(items) => {
                for item in items {
                    item.flatten_into(out);
                }
            }
            other => out.push(other),
        }
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Expr::Value(a), Expr::Value(b)) => a == b,
            (Expr::Range(a), Expr::Range(b)) => a == b,
            (Expr::List(a), Expr::List(b)) => a == b,
            (Expr::Predicate(a), Expr::Predicate(b)) => a.ptr_eq(b),
            (Expr::Regex(a), Expr::Regex(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Value(v) => write!(f, "{}", v),
            Expr::Range(r) => write!(f, "{}", r),
            Expr::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Expr::Predicate(_) => f.write_str("<predicate>"),
            Expr::Regex(r) => write!(f, "/{}/", r.as_str()),
        }
    }
}

/// Ordered interval between two values.
///
/// Containment uses [`compare_values`], so intervals work over numbers,
/// strings and timestamps alike. Only integer intervals can be enumerated.
#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    /// Lower bound, always included.
    pub start: Value<'static>,
    /// Upper bound.
    pub end: Value<'static>,
    /// Whether `end` itself is included.
    pub inclusive: bool,
}

impl Interval {
    /// Creates `start..=end`.
    pub fn inclusive(start: impl Into<Value<'static>>, end: impl Into<Value<'static>>) -> Self {
        Interval {
            start: start.into(),
            end: end.into(),
            inclusive: true,
        }
    }

    /// Creates `start..end`.
    pub fn exclusive(start: impl Into<Value<'static>>, end: impl Into<Value<'static>>) -> Self {
        Interval {
            start: start.into(),
            end: end.into(),
            inclusive: false,
        }
    }

    /// Returns `true` if `value` lies inside the interval.
    ///
    /// Values that cannot be compared with the bounds are never contained.
    pub fn contains(&self, value: &Value<'_>) -> bool {
        if value.is_none() {
            return false;
        }
        let above_start = compare_values(&self.start, value).is_some_and(|o| o.is_le());
        let below_end = compare_values(value, &self.end).is_some_and(|o| {
            if self.inclusive {
                o.is_le()
            } else {
                o.is_lt()
            }
        });
        above_start && below_end
    }

    /// Returns the integer bounds as an inclusive pair, if both are integers.
    pub(crate) fn integer_bounds(&self) -> Option<(i128, i128)> {
        let start = self.start.as_number()?.as_integer()?;
        let end = self.end.as_number()?.as_integer()?;
        Some((start, if self.inclusive { end } else { end - 1 }))
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = if self.inclusive { "..=" } else { ".." };
        write!(f, "{}{}{}", self.start, op, self.end)
    }
}

impl<T: Into<Value<'static>>> From<RangeInclusive<T>> for Interval {
    fn from(range: RangeInclusive<T>) -> Self {
        let (start, end) = range.into_inner();
        Interval::inclusive(start, end)
    }
}

impl<T: Into<Value<'static>>> From<Range<T>> for Interval {
    fn from(range: Range<T>) -> Self {
        Interval::exclusive(range.start, range.end)
    }
}

/// Shared single-argument test used as an expression.
#[derive(Clone)]
pub struct Predicate(Arc<dyn Fn(&Value<'_>) -> bool + Send + Sync>);

impl Predicate {
    /// Wraps a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value<'_>) -> bool + Send + Sync + 'static,
    {
        Predicate(Arc::new(f))
    }

    /// Invokes the test.
    pub fn call(&self, candidate: &Value<'_>) -> bool {
        (self.0)(candidate)
    }

    /// Returns `true` if both handles share the same closure.
    pub fn ptr_eq(&self, other: &Predicate) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

macro_rules! expr_from_value {
    ($($source:ty),*) => {
        $(
            impl From<$source> for Expr {
                fn from(v: $source) -> Self {
                    Expr::Value(Value::from(v))
                }
            }
        )*
    };
}

expr_from_value!(
    i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, bool, String, &'static str,
    Timestamp
);

impl From<Value<'static>> for Expr {
    fn from(v: Value<'static>) -> Self {
        Expr::Value(v)
    }
}

impl From<Interval> for Expr {
    fn from(r: Interval) -> Self {
        Expr::Range(r)
    }
}

impl<T: Into<Value<'static>>> From<RangeInclusive<T>> for Expr {
    fn from(range: RangeInclusive<T>) -> Self {
        Expr::Range(range.into())
    }
}

impl<T: Into<Value<'static>>> From<Range<T>> for Expr {
    fn from(range: Range<T>) -> Self {
        Expr::Range(range.into())
    }
}

impl From<Predicate> for Expr {
    fn from(p: Predicate) -> Self {
        Expr::Predicate(p)
    }
}

impl From<Regex> for Expr {
    fn from(r: Regex) -> Self {
        Expr::Regex(r)
    }
}

impl<T: Into<Expr>> From<Vec<T>> for Expr {
    fn from(items: Vec<T>) -> Self {
        Expr::List(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_contains_respects_inclusivity() {
        let inclusive = Interval::inclusive(1, 10);
        assert!(inclusive.contains(&Value::from(1)));
        assert!(inclusive.contains(&Value::from(10)));
        assert!(!inclusive.contains(&Value::from(11)));

        let exclusive = Interval::exclusive(1, 10);
        assert!(exclusive.contains(&Value::from(9.5)));
        assert!(!exclusive.contains(&Value::from(10)));
    }

    #[test]
    fn interval_over_strings_and_mismatches() {
        let letters = Interval::from("a"..="m");
        assert!(letters.contains(&Value::from("eld")));
        assert!(!letters.contains(&Value::from("zed")));
        assert!(!letters.contains(&Value::from(5)));
        assert!(!letters.contains(&Value::None));
    }

    #[test]
    fn integer_bounds() {
        assert_eq!(Interval::inclusive(1, 3).integer_bounds(), Some((1, 3)));
        assert_eq!(Interval::exclusive(1, 3).integer_bounds(), Some((1, 2)));
        assert_eq!(Interval::inclusive(1.0, 3.0).integer_bounds(), None);
        assert_eq!(Interval::from("a".."c").integer_bounds(), None);
    }

    #[test]
    fn combine_flattens_lists() {
        let left = Expr::from(vec![1, 2]);
        assert_eq!(left.combine(Expr::from(3)), Expr::from(vec![1, 2, 3]));
        assert_eq!(
            Expr::from(1).combine(Expr::from(2)),
            Expr::from(vec![1, 2])
        );
    }

    #[test]
    fn predicate_equality_is_identity() {
        let p = Predicate::new(|_| true);
        assert_eq!(Expr::from(p.clone()), Expr::from(p));
        assert_ne!(Expr::predicate(|_| true), Expr::predicate(|_| true));
    }

    #[test]
    fn display() {
        assert_eq!(Expr::from(1..=10).to_string(), "1..=10");
        assert_eq!(Expr::from(vec!["El", "Eld"]).to_string(), "[\"El\", \"Eld\"]");
        assert_eq!(Expr::predicate(|_| true).to_string(), "<predicate>");
        assert_eq!(Expr::regex("^E").unwrap().to_string(), "/^E/");
    }
}
