//! The dataset service.
//!
//! A [`Dataset`] owns a lazily loaded, immutable snapshot of records, the
//! registry of named queries, and the optional primary field. Running a
//! request goes:
//!
//! ```text
//! request -> normalize -> look up & compile each key -> AND -> filter snapshot
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::builder::{QueryBuilder, QueryOptions, Rule};
use crate::built::Built;
use crate::config::DatasetConfig;
use crate::error::{Matches, QueryError, Result};
use crate::record::Record;
use crate::request::Request;

/// Immutable, shared view of every loaded record.
pub type Snapshot<R> = Arc<[Arc<R>]>;

/// Zero-argument producer of the full record sequence.
pub type Source<R> = Arc<dyn Fn() -> Vec<R> + Send + Sync>;

/// Queryable collection of records.
///
/// # Example
///
/// ```
/// use recordset::{Dataset, Record, Value};
///
/// struct Rune {
///     name: &'static str,
///     lvl: u8,
/// }
///
/// impl Record for Rune {
///     fn field_value(&self, field: &str) -> Value<'_> {
///         match field {
///             "name" => Value::from(self.name),
///             "lvl" => Value::from(self.lvl),
///             _ => Value::None,
///         }
///     }
/// }
///
/// let mut runes = Dataset::new(|| {
///     vec![Rune { name: "El", lvl: 5 }, Rune { name: "Eld", lvl: 9 }]
/// });
/// runes.queries("name").unwrap();
/// runes.queries("lvl").unwrap();
/// runes.set_primary_field("name");
///
/// assert_eq!(runes.query([("lvl", 1..=10)]).unwrap().len(), 2);
/// assert_eq!(runes.query("El").unwrap()[0].lvl, 5);
/// assert_eq!(runes.require([("name", "Eld")]).unwrap().lvl, 9);
/// assert!(runes.require([("name", "Zed")]).is_err());
/// ```
pub struct Dataset<R> {
    name: String,
    source: Source<R>,
    cache: RwLock<Option<Snapshot<R>>>,
    queries: HashMap<String, QueryBuilder<R>>,
    primary_field: Option<String>,
}

impl<R: Record + Send + Sync + 'static> Dataset<R> {
    /// Creates a dataset over `source`. Nothing is loaded until first use.
    pub fn new<F>(source: F) -> Self
    where
        F: Fn() -> Vec<R> + Send + Sync + 'static,
    {
        Dataset {
            name: short_type_name::<R>().to_string(),
            source: Arc::new(source),
            cache: RwLock::new(None),
            queries: HashMap::new(),
            primary_field: None,
        }
    }

    /// Sets the display name used in error messages.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Display name used in error messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replaces the data source and drops the cached snapshot.
    pub fn set_data_source<F>(&mut self, source: F)
    where
        F: Fn() -> Vec<R> + Send + Sync + 'static,
    {
        self.source = Arc::new(source);
        *self.cache.get_mut().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Sets the field bare-value requests are keyed by.
    pub fn set_primary_field(&mut self, field: impl Into<String>) {
        self.primary_field = Some(field.into());
    }

    /// Field bare-value requests are keyed by, if any.
    pub fn primary_field(&self) -> Option<&str> {
        self.primary_field.as_deref()
    }

    // ========================================================================
    // Snapshot
    // ========================================================================

    /// Returns every record, loading the snapshot on first access.
    pub fn all(&self) -> Snapshot<R> {
        if let Some(snapshot) = self.cache.read().unwrap_or_else(PoisonError::into_inner).as_ref() {
            return Arc::clone(snapshot);
        }

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have loaded while we waited for the write lock
        if let Some(snapshot) = cache.as_ref() {
            return Arc::clone(snapshot);
        }
        let snapshot = self.load();
        *cache = Some(Arc::clone(&snapshot));
        snapshot
    }

    /// Reloads from the data source and publishes the new snapshot.
    ///
    /// Snapshots handed out earlier stay valid and unchanged.
    pub fn reset_cache(&self) -> Snapshot<R> {
        let snapshot = self.load();
        *self.cache.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&snapshot));
        snapshot
    }

    fn load(&self) -> Snapshot<R> {
        let snapshot: Snapshot<R> = (self.source)().into_iter().map(Arc::new).collect();
        debug!(dataset = %self.name, records = snapshot.len(), "loaded snapshot");
        snapshot
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Registers a query under `name`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// [`QueryError::MissingRule`] if the custom strategy is selected without
    /// a rule.
    pub fn register_query(
        &mut self,
        name: impl Into<String>,
        options: QueryOptions,
        rule: Option<Rule<R>>,
    ) -> Result<()> {
        let builder = QueryBuilder::new(name, options, rule)?;
        debug!(
            dataset = %self.name,
            query = builder.name(),
            field = builder.field(),
            strategy = %builder.strategy(),
            "registered query"
        );
        self.queries.insert(builder.name().to_string(), builder);
        Ok(())
    }

    /// Registers an equality query reading the field of the same name.
    pub fn queries(&mut self, name: impl Into<String>) -> Result<()> {
        self.register_query(name, QueryOptions::new(), None)
    }

    /// Registers a custom query.
    pub fn queries_with(&mut self, name: impl Into<String>, rule: Rule<R>) -> Result<()> {
        self.register_query(name, QueryOptions::new(), Some(rule))
    }

    /// Applies a declarative configuration.
    ///
    /// `rules` resolves custom rules by query name. A query without an
    /// explicit strategy is custom when `rules` returns a rule for it, and
    /// equality otherwise.
    ///
    /// # Errors
    ///
    /// [`QueryError::UnknownStrategy`] or [`QueryError::MissingRule`] for the
    /// first offending query. Queries before it stay registered.
    pub fn apply_config<F>(&mut self, config: &DatasetConfig, mut rules: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<Rule<R>>,
    {
        if let Some(name) = &config.name {
            self.name = name.clone();
        }
        if let Some(field) = &config.primary_field {
            self.primary_field = Some(field.clone());
        }
        for (name, entry) in &config.queries {
            let options = entry.options()?;
            self.register_query(name.as_str(), options, rules(name))?;
        }
        Ok(())
    }

    /// Registered query keys, sorted.
    pub fn query_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.queries.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Looks up a registered query.
    pub fn query_builder(&self, name: &str) -> Option<&QueryBuilder<R>> {
        self.queries.get(name)
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Compiles a request into one filter without running it.
    ///
    /// # Errors
    ///
    /// [`QueryError::NoPrimaryField`] or [`QueryError::UnknownQueryKey`].
    pub fn compile(&self, request: impl Into<Request>) -> Result<Built<R>> {
        let request: Request = request.into();
        let conditions = request
            .normalize(self.primary_field())
            .map_err(|request| QueryError::NoPrimaryField {
                dataset: self.name.clone(),
                request,
            })?;

        let mut joined = Built::always();
        for (key, expression) in conditions.iter() {
            let builder = self.queries.get(key).ok_or_else(|| QueryError::UnknownQueryKey {
                dataset: self.name.clone(),
                key: key.to_string(),
                available: self.query_keys(),
                request: conditions.clone(),
            })?;
            joined = joined.and(builder.compile(expression.clone()));
        }
        Ok(joined)
    }

    /// Returns every record matching all conditions of `request`, in
    /// snapshot order.
    ///
    /// # Errors
    ///
    /// [`QueryError::NoPrimaryField`] or [`QueryError::UnknownQueryKey`].
    pub fn query(&self, request: impl Into<Request>) -> Result<Vec<Arc<R>>> {
        let request = request.into();
        let hits = self.select(&request)?;
        Ok(hits.into_iter().map(|(_, record)| record).collect())
    }

    /// Returns the only match, or `None` when nothing matches.
    ///
    /// # Errors
    ///
    /// [`QueryError::AmbiguousResult`] when more than one record matches,
    /// plus the errors of [`Dataset::query`].
    pub fn one(&self, request: impl Into<Request>) -> Result<Option<Arc<R>>> {
        let request = request.into();
        let hits = self.select(&request)?;
        self.single(request, hits)
    }

    /// Returns the only match.
    ///
    /// # Errors
    ///
    /// [`QueryError::NoResult`] when nothing matches and
    /// [`QueryError::AmbiguousResult`] when more than one record does, plus
    /// the errors of [`Dataset::query`].
    pub fn require(&self, request: impl Into<Request>) -> Result<Arc<R>> {
        let request = request.into();
        let hits = self.select(&request)?;
        match self.single(request.clone(), hits)? {
            Some(record) => Ok(record),
            None => Err(QueryError::NoResult {
                dataset: self.name.clone(),
                request,
            }),
        }
    }

    /// Number of matching records.
    pub fn count(&self, request: impl Into<Request>) -> Result<usize> {
        let filter = self.compile(request)?;
        Ok(self.all().iter().filter(|record| filter.matches(record)).count())
    }

    /// Returns `true` if any record matches.
    pub fn exists(&self, request: impl Into<Request>) -> Result<bool> {
        let filter = self.compile(request)?;
        Ok(self.all().iter().any(|record| filter.matches(record)))
    }

    fn select(&self, request: &Request) -> Result<Vec<(usize, Arc<R>)>> {
        let filter = self.compile(request.clone())?;
        let hits: Vec<(usize, Arc<R>)> = self
            .all()
            .iter()
            .enumerate()
            .filter(|(_, record)| filter.matches(record))
            .map(|(position, record)| (position, Arc::clone(record)))
            .collect();
        debug!(dataset = %self.name, %request, matches = hits.len(), "query");
        Ok(hits)
    }

    fn single(&self, request: Request, hits: Vec<(usize, Arc<R>)>) -> Result<Option<Arc<R>>> {
        if hits.len() > 1 {
            let (positions, records): (Vec<usize>, Vec<Arc<R>>) = hits.into_iter().unzip();
            return Err(QueryError::AmbiguousResult {
                dataset: self.name.clone(),
                request,
                positions,
                matches: Matches::new(records),
            });
        }
        Ok(hits.into_iter().next().map(|(_, record)| record))
    }
}

impl<R> fmt::Debug for Dataset<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let loaded = self
            .cache
            .read()
            .map(|cache| cache.as_ref().map(|snapshot| snapshot.len()))
            .unwrap_or(None);
        f.debug_struct("Dataset")
            .field("name", &self.name)
            .field("primary_field", &self.primary_field)
            .field("queries", &self.queries.values().collect::<Vec<_>>())
            .field("loaded", &loaded)
            .finish_non_exhaustive()
    }
}

/// `my_crate::model::Rune` -> `Rune`
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
