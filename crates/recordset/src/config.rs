//! Declarative dataset configuration.
//!
//! Query registrations can be described in YAML or JSON instead of code:
//!
//! ```
//! use recordset::DatasetConfig;
//!
//! let config = DatasetConfig::from_yaml(
//!     r#"
//! name: runes
//! primary_field: name
//! queries:
//!   name: {}
//!   level: { field: lvl }
//! "#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.primary_field.as_deref(), Some("name"));
//! assert_eq!(config.queries["level"].field.as_deref(), Some("lvl"));
//! ```
//!
//! Strategies are kept as strings until [`Dataset::apply_config`] registers
//! them, so a misspelled strategy fails there rather than silently falling
//! back to a default.
//!
//! [`Dataset::apply_config`]: crate::Dataset::apply_config

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::builder::{QueryOptions, Strategy};
use crate::error::{ConfigError, Result};

/// Top-level dataset configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetConfig {
    /// Display name used in error messages.
    #[serde(default)]
    pub name: Option<String>,
    /// Field bare-value requests are keyed by.
    #[serde(default)]
    pub primary_field: Option<String>,
    /// Queries to register, by name.
    #[serde(default)]
    pub queries: BTreeMap<String, QuerySpec>,
}

/// One query registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuerySpec {
    /// Record field to read, defaults to the query name.
    #[serde(default)]
    pub field: Option<String>,
    /// `equality` or `custom`.
    #[serde(default)]
    pub strategy: Option<String>,
}

impl DatasetConfig {
    /// Parses a YAML document.
    pub fn from_yaml(source: &str) -> std::result::Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// Parses a JSON document.
    pub fn from_json(source: &str) -> std::result::Result<Self, ConfigError> {
        Ok(serde_json::from_str(source)?)
    }
}

impl QuerySpec {
    /// Resolves this entry into registration options.
    ///
    /// # Errors
    ///
    /// [`QueryError::UnknownStrategy`](crate::QueryError::UnknownStrategy) for
    /// an unrecognized strategy name.
    pub fn options(&self) -> Result<QueryOptions> {
        let mut options = QueryOptions::new();
        options.field = self.field.clone();
        options.strategy = self.strategy.as_deref().map(str::parse::<Strategy>).transpose()?;
        Ok(options)
    }
}
