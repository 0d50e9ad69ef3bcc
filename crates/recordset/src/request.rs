//! Query requests and their normalization.
//!
//! A caller may ask for records in three shapes:
//!
//! - a bare expression, applied to the dataset's primary field
//! - a mapping of query key to expression
//! - a list of either, merged into one mapping
//!
//! [`Request::normalize`] reduces all of them to [`Conditions`].

use std::fmt;
use std::ops::{Range, RangeInclusive};

use regex::Regex;

use crate::expr::{Expr, Interval, Predicate};
use crate::value::{Timestamp, Value};

/// Insertion-ordered mapping of query key to expression.
///
/// Keys are unique; inserting an existing key replaces its expression in
/// place. Conditions are evaluated in insertion order.
///
/// ```
/// use recordset::Conditions;
///
/// let conditions = Conditions::new()
///     .with("name", "Eld")
///     .with("lvl", 1..=10);
/// assert_eq!(conditions.len(), 2);
/// assert_eq!(conditions.to_string(), r#"{name: "Eld", lvl: 1..=10}"#);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conditions {
    entries: Vec<(String, Expr)>,
}

impl Conditions {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Conditions::default()
    }

    /// Adds a condition, builder style.
    pub fn with(mut self, key: impl Into<String>, expression: impl Into<Expr>) -> Self {
        self.insert(key, expression);
        self
    }

    /// Sets the expression for `key`, replacing any previous one.
    pub fn insert(&mut self, key: impl Into<String>, expression: impl Into<Expr>) {
        let key = key.into();
        let expression = expression.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = expression,
            None => self.entries.push((key, expression)),
        }
    }

    /// Merges `other` into `self`.
    ///
    /// A key present on both sides ends up with both expressions combined
    /// into one flattened list, at the key's original position.
    pub fn merge(&mut self, other: Conditions) {
        for (key, expression) in other.entries {
            match self.entries.iter().position(|(k, _)| *k == key) {
                Some(index) => {
                    let (_, slot) = &mut self.entries[index];
                    let left = std::mem::replace(slot, Expr::List(Vec::new()));
                    *slot = left.combine(expression);
                }
                None => self.entries.push((key, expression)),
            }
        }
    }

    /// Returns the expression bound to `key`.
    pub fn get(&self, key: &str) -> Option<&Expr> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, expression)| expression)
    }

    /// Number of conditions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no conditions.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates the keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Iterates the conditions in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Expr)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), e))
    }
}

impl IntoIterator for Conditions {
    type Item = (String, Expr);
    type IntoIter = std::vec::IntoIter<(String, Expr)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>, E: Into<Expr>> FromIterator<(K, E)> for Conditions {
    fn from_iter<I: IntoIterator<Item = (K, E)>>(iter: I) -> Self {
        let mut conditions = Conditions::new();
        for (key, expression) in iter {
            conditions.insert(key, expression);
        }
        conditions
    }
}

impl fmt::Display for Conditions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, expression)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", key, expression)?;
        }
        f.write_str("}")
    }
}

/// A query request in any of its accepted shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Bare expression for the primary field.
    Expr(Expr),
    /// Key to expression mapping.
    Map(Conditions),
    /// Several requests merged together.
    List(Vec<Request>),
}

impl Request {
    /// Builds a list request.
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Request>,
    {
        Request::List(items.into_iter().map(Into::into).collect())
    }

    /// Reduces the request to a single mapping.
    ///
    /// Bare expressions are keyed by `primary_field`. List elements are
    /// normalized in order and merged with [`Conditions::merge`], so
    /// `[{a: 1}, {a: 2}]` becomes `{a: [1, 2]}`.
    ///
    /// # Errors
    ///
    /// Returns the offending bare expression, as a request, when it has to be
    /// keyed but `primary_field` is `None`.
    pub fn normalize(self, primary_field: Option<&str>) -> Result<Conditions, Request> {
        match self {
            Request::Map(conditions) => Ok(conditions),
            Request::List(items) => {
                let mut merged = Conditions::new();
                for item in items {
                    merged.merge(item.normalize(primary_field)?);
                }
                Ok(merged)
            }
            Request::Expr(expression) => match primary_field {
                Some(field) => Ok(Conditions::new().with(field, expression)),
                None => Err(Request::Expr(expression)),
            },
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::Expr(expression) => write!(f, "{}", expression),
            Request::Map(conditions) => write!(f, "{}", conditions),
            Request::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

// ============================================================================
// Conversions
// ============================================================================

macro_rules! request_from_expr {
    ($($source:ty),*) => {
        $(
            impl From<$source> for Request {
                fn from(v: $source) -> Self {
                    Request::Expr(Expr::from(v))
                }
            }
        )*
    };
}

request_from_expr!(
    i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, bool, String, &'static str,
    Timestamp, Value<'static>, Interval, Predicate, Regex
);

impl From<Expr> for Request {
    fn from(expression: Expr) -> Self {
        Request::Expr(expression)
    }
}

impl<T: Into<Value<'static>>> From<RangeInclusive<T>> for Request {
    fn from(range: RangeInclusive<T>) -> Self {
        Request::Expr(Expr::from(range))
    }
}

impl<T: Into<Value<'static>>> From<Range<T>> for Request {
    fn from(range: Range<T>) -> Self {
        Request::Expr(Expr::from(range))
    }
}

impl From<Conditions> for Request {
    fn from(conditions: Conditions) -> Self {
        Request::Map(conditions)
    }
}

impl<K: Into<String>, E: Into<Expr>, const N: usize> From<[(K, E); N]> for Request {
    fn from(pairs: [(K, E); N]) -> Self {
        Request::Map(pairs.into_iter().collect())
    }
}

impl<K: Into<String>, E: Into<Expr>> From<(K, E)> for Request {
    fn from((key, expression): (K, E)) -> Self {
        Request::Map(Conditions::new().with(key, expression))
    }
}

impl From<Vec<Request>> for Request {
    fn from(items: Vec<Request>) -> Self {
        Request::List(items)
    }
}
