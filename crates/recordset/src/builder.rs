//! Query builders: registered, named matching rules.
//!
//! A [`QueryBuilder`] knows which record field a query key reads and how an
//! expression is matched against it. Binding an expression with
//! [`QueryBuilder::compile`] produces a [`Built`] filter.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::built::Built;
use crate::error::{QueryError, Result};
use crate::expr::Expr;
use crate::matcher::Matcher;
use crate::record::Record;
use crate::value::Value;

/// Caller-supplied matching logic for the custom strategy.
pub type Rule<R> = Arc<dyn Fn(&Context<'_, R>) -> bool + Send + Sync>;

/// Wraps a closure as a [`Rule`].
///
/// ```
/// use recordset::{rule, Matcher, Rule};
///
/// // Matches records whose `runes` field lies entirely inside the expression.
/// let all_runes: Rule<serde_json::Value> =
///     rule(|ctx| ctx.expression.matches_all(&ctx.field_value));
/// ```
pub fn rule<R, F>(f: F) -> Rule<R>
where
    F: Fn(&Context<'_, R>) -> bool + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Everything a custom rule may look at while testing one record.
pub struct Context<'a, R> {
    /// Expression bound to the query key.
    pub expression: &'a Expr,
    /// Record being tested.
    pub record: &'a R,
    /// Field the query reads.
    pub field_name: &'a str,
    /// Current value of `field_name` on `record`.
    pub field_value: Value<'a>,
}

/// How a query matches its expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// The expression must element-match the field value as a whole.
    Equality,
    /// A caller-supplied [`Rule`] decides.
    Custom,
}

impl Strategy {
    /// Returns the configuration name of this strategy.
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Equality => "equality",
            Strategy::Custom => "custom",
        }
    }
}

impl FromStr for Strategy {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("equality") {
            Ok(Strategy::Equality)
        } else if s.eq_ignore_ascii_case("custom") {
            Ok(Strategy::Custom)
        } else {
            Err(QueryError::UnknownStrategy(s.to_string()))
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options accepted when registering a query.
///
/// ```
/// use recordset::{QueryOptions, Strategy};
///
/// let options = QueryOptions::new().field("lvl").strategy(Strategy::Equality);
/// assert_eq!(options.field.as_deref(), Some("lvl"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Record field to read. Defaults to the query name.
    pub field: Option<String>,
    /// Matching strategy. Defaults to custom when a rule is given, equality otherwise.
    pub strategy: Option<Strategy>,
}

impl QueryOptions {
    /// Creates default options.
    pub fn new() -> Self {
        QueryOptions::default()
    }

    /// Sets the record field to read.
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Sets the strategy explicitly.
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = Some(strategy);
        self
    }
}

/// A registered query.
pub struct QueryBuilder<R> {
    name: String,
    field: String,
    strategy: Strategy,
    rule: Option<Rule<R>>,
}

impl<R> Clone for QueryBuilder<R> {
    fn clone(&self) -> Self {
        QueryBuilder {
            name: self.name.clone(),
            field: self.field.clone(),
            strategy: self.strategy,
            rule: self.rule.clone(),
        }
    }
}

impl<R: Record + 'static> QueryBuilder<R> {
    /// Resolves options into a builder.
    ///
    /// # Errors
    ///
    /// [`QueryError::MissingRule`] if the custom strategy is selected without
    /// a rule.
    pub fn new(name: impl Into<String>, options: QueryOptions, rule: Option<Rule<R>>) -> Result<Self> {
        let name = name.into();
        let strategy = options.strategy.unwrap_or(if rule.is_some() {
            Strategy::Custom
        } else {
            Strategy::Equality
        });
        if strategy == Strategy::Custom && rule.is_none() {
            return Err(QueryError::MissingRule(name));
        }
        let field = options.field.unwrap_or_else(|| name.clone());
        Ok(QueryBuilder {
            name,
            field,
            strategy,
            // The equality strategy never consults a rule
            rule: rule.filter(|_| strategy == Strategy::Custom),
        })
    }

    /// Binds an expression, producing a record filter.
    pub fn compile(&self, expression: Expr) -> Built<R> {
        let field = self.field.clone();
        match (&self.strategy, &self.rule) {
            (Strategy::Custom, Some(rule)) => {
                let rule = Arc::clone(rule);
                Built::from_fn(move |record: &R| {
                    rule(&Context {
                        expression: &expression,
                        record,
                        field_name: &field,
                        field_value: record.field_value(&field),
                    })
                })
            }
            // The field is one candidate; list fields are not spread
            _ => Built::from_fn(move |record: &R| {
                expression.matches_any(&[record.field_value(&field)][..])
            }),
        }
    }
}

impl<R> QueryBuilder<R> {
    /// Query key this builder is registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record field the query reads.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Matching strategy in effect.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }
}

impl<R> fmt::Debug for QueryBuilder<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("name", &self.name)
            .field("field", &self.field)
            .field("strategy", &self.strategy)
            .field("rule", &self.rule.as_ref().map(|_| ".."))
            .finish()
    }
}
