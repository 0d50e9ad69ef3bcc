//! Recordset - named queries over immutable, lazily loaded record collections.
//!
//! A [`Dataset`] wraps a data source (any closure returning the full list of
//! records). Callers register named queries against it, then ask for records
//! with requests in whatever shape is convenient:
//!
//! - a bare value, matched against the primary field
//! - a mapping of query key to expression
//! - a list of either, merged into one mapping
//!
//! # Quick Start
//!
//! ```rust
//! use recordset::{rule, Dataset, Expr, Matcher, Record, Value};
//!
//! struct Rune {
//!     name: String,
//!     level: u8,
//!     runes: Vec<String>,
//! }
//!
//! impl Record for Rune {
//!     fn field_value(&self, field: &str) -> Value<'_> {
//!         match field {
//!             "name" => Value::string(self.name.as_str()),
//!             "level" => Value::from(self.level),
//!             "runes" => Value::List(self.runes.iter().map(|r| Value::string(r.as_str())).collect()),
//!             _ => Value::None,
//!         }
//!     }
//! }
//!
//! let mut words = Dataset::new(|| {
//!     vec![
//!         Rune { name: "Stealth".into(), level: 17, runes: vec!["Tal".into(), "Eth".into()] },
//!         Rune { name: "Lore".into(), level: 27, runes: vec!["Ort".into(), "Sol".into()] },
//!     ]
//! });
//! words.set_primary_field("name");
//! words.queries("name").unwrap();
//! words.queries("level").unwrap();
//! // Every rune of the record must be listed in the request
//! words
//!     .queries_with("runes", rule(|ctx| ctx.expression.matches_all(&ctx.field_value)))
//!     .unwrap();
//!
//! assert_eq!(words.query("Lore").unwrap()[0].level, 27);
//! assert_eq!(words.query([("level", 1..=20)]).unwrap()[0].name, "Stealth");
//! let by_runes = words.query([("runes", vec!["Tal", "Eth", "Ort"])]).unwrap();
//! assert_eq!(by_runes.len(), 1);
//! assert!(words.one([("level", Expr::predicate(|v| v.as_number().is_some()))]).is_err());
//! ```
//!
//! # Matching
//!
//! The right-hand side of each key is an [`Expr`]. Its shape decides how it
//! matches a field value. The default (equality) strategy tests the field
//! value as a single candidate, so a list-valued field is not spread into its
//! items; a custom rule using [`Matcher::matches_any`] or
//! [`Matcher::matches_all`] on `ctx.field_value` does that.
//!
//! | Expression | Matches a field value when |
//! |------------|----------------------------|
//! | value | equal (numbers compare across widths) |
//! | interval `a..=b` | contained |
//! | list | any item matches |
//! | predicate | the closure returns `true` |
//! | regex | the value is a string containing a match |
//!
//! All conditions of a request must match. They are evaluated in request
//! order and stop at the first failure.
//!
//! # Single results
//!
//! [`Dataset::one`] and [`Dataset::require`] treat several matches as an
//! error ([`QueryError::AmbiguousResult`]); `require` also fails with
//! [`QueryError::NoResult`] when nothing matches.

mod builder;
mod built;
mod config;
mod dataset;
mod error;
mod expr;
mod matcher;
mod record;
mod request;
mod value;

// Re-export public API
pub use builder::{rule, Context, QueryBuilder, QueryOptions, Rule, Strategy};
pub use built::Built;
pub use config::{DatasetConfig, QuerySpec};
pub use dataset::{Dataset, Snapshot, Source};
pub use error::{ConfigError, Matches, QueryError, Result};
pub use expr::{Expr, Interval, Predicate};
pub use matcher::{Enumerate, Matcher};
pub use record::{AsTimestamp, AsValue, Record};
pub use request::{Conditions, Request};
pub use value::{compare_values, Number, Timestamp, Value};

#[cfg(feature = "macros")]
pub use recordset_macros::Record;
