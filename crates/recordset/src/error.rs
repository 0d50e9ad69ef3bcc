//! Error types for the recordset crate.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::request::{Conditions, Request};

/// Errors raised while registering or running queries.
///
/// Every variant is terminal for the call that produced it. A query that
/// cannot be answered is never reported as an empty result.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The request named a key no query was registered for.
    #[error("{dataset} does not query {key:?}. Available query keys are {available:?}")]
    UnknownQueryKey {
        dataset: String,
        key: String,
        available: Vec<String>,
        request: Conditions,
    },

    /// A bare value was queried but no primary field is configured.
    #[error(
        "primary field not defined for {dataset}, {request} should be either a mapping or a list of mappings"
    )]
    NoPrimaryField { dataset: String, request: Request },

    /// A single-result lookup matched more than one record.
    ///
    /// `positions` are the indices of every match in the snapshot that was
    /// queried and `matches` holds the records themselves, so both stay
    /// valid after the dataset is reset.
    #[error("{dataset}.query({request}) returned more than one record")]
    AmbiguousResult {
        dataset: String,
        request: Request,
        positions: Vec<usize>,
        matches: Matches,
    },

    /// `require` matched nothing.
    #[error("{dataset}.query({request}) returned nothing")]
    NoResult { dataset: String, request: Request },

    /// Strategy name not recognized.
    #[error("unknown query strategy '{0}'. Expected one of: equality, custom")]
    UnknownStrategy(String),

    /// The custom strategy was selected but no rule was supplied.
    #[error("query '{0}' uses the custom strategy but has no rule")]
    MissingRule(String),

    /// Invalid declarative configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl QueryError {
    /// Records behind an [`QueryError::AmbiguousResult`].
    ///
    /// Returns `None` for other variants or when `R` is not the record type
    /// of the dataset that raised the error.
    pub fn matches<R: Send + Sync + 'static>(&self) -> Option<&[Arc<R>]> {
        match self {
            QueryError::AmbiguousResult { matches, .. } => matches.downcast(),
            _ => None,
        }
    }
}

/// Records matched by an ambiguous single-result lookup.
///
/// The record type is erased so [`QueryError`] stays non-generic; recover it
/// with [`Matches::downcast`] or [`QueryError::matches`].
#[derive(Clone)]
pub struct Matches {
    records: Arc<dyn Any + Send + Sync>,
    len: usize,
}

impl Matches {
    /// Wraps the matched records.
    pub fn new<R: Send + Sync + 'static>(records: Vec<Arc<R>>) -> Self {
        Matches {
            len: records.len(),
            records: Arc::new(records),
        }
    }

    /// Returns the records if they are of type `R`.
    pub fn downcast<R: Send + Sync + 'static>(&self) -> Option<&[Arc<R>]> {
        self.records
            .downcast_ref::<Vec<Arc<R>>>()
            .map(Vec::as_slice)
    }

    /// Number of matched records.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if nothing matched.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Debug for Matches {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matches").field("len", &self.len).finish_non_exhaustive()
    }
}

/// Errors raised while loading a [`DatasetConfig`](crate::DatasetConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document could not be parsed.
    #[error("invalid dataset config: {0}")]
    Parse(String),
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}

/// Result type for recordset operations.
pub type Result<T> = std::result::Result<T, QueryError>;
