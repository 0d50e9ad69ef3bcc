//! End-to-end tests for datasets and named queries.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use recordset::{
    rule, Conditions, Context, Dataset, DatasetConfig, Expr, Matcher, QueryError, QueryOptions,
    Record, Request, Strategy, Value,
};

// ============================================================================
// Fixtures
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Rune {
    name: &'static str,
    lvl: i64,
}

impl Record for Rune {
    fn field_value(&self, field: &str) -> Value<'_> {
        match field {
            "name" => Value::from(self.name),
            "lvl" => Value::from(self.lvl),
            _ => Value::None,
        }
    }
}

fn runes() -> Dataset<Rune> {
    let mut runes = Dataset::new(|| {
        vec![
            Rune { name: "El", lvl: 5 },
            Rune { name: "Eld", lvl: 9 },
        ]
    });
    runes.set_primary_field("name");
    runes.queries("name").unwrap();
    runes.queries("lvl").unwrap();
    runes
}

#[derive(Debug, Clone, PartialEq)]
struct Foo {
    foo: Vec<i64>,
}

impl Record for Foo {
    fn field_value(&self, field: &str) -> Value<'_> {
        match field {
            "foo" if self.foo.len() == 1 => Value::from(self.foo[0]),
            "foo" => Value::from(self.foo.clone()),
            _ => Value::None,
        }
    }
}

fn foos(data: Vec<Vec<i64>>) -> Dataset<Foo> {
    let mut dataset = Dataset::new(move || data.iter().map(|foo| Foo { foo: foo.clone() }).collect());
    dataset.queries("foo").unwrap();
    dataset
}

fn foo_values(records: &[Arc<Foo>]) -> Vec<Vec<i64>> {
    records.iter().map(|r| r.foo.clone()).collect()
}

fn names(records: &[Arc<Rune>]) -> Vec<&'static str> {
    records.iter().map(|r| r.name).collect()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// Walkthrough
// ============================================================================

#[test]
fn rune_walkthrough() {
    init_tracing();
    let runes = runes();

    assert_eq!(names(&runes.query([("lvl", 1..=10)]).unwrap()), vec!["El", "Eld"]);
    assert_eq!(names(&runes.query("El").unwrap()), vec!["El"]);
    assert_eq!(
        names(&runes.query([("name", vec!["El", "Eld"])]).unwrap()),
        vec!["El", "Eld"]
    );
    assert_eq!(
        *runes.one([("name", "Eld")]).unwrap().unwrap(),
        Rune { name: "Eld", lvl: 9 }
    );
    assert!(matches!(
        runes.require([("name", "Zed")]),
        Err(QueryError::NoResult { .. })
    ));
}

#[test]
fn loads_data_in_source_order() {
    let dataset = foos(vec![vec![123], vec![456]]);
    let all = dataset.all();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].foo, vec![123]);
    assert_eq!(all[1].foo, vec![456]);
}

// ============================================================================
// Equality queries
// ============================================================================

#[test]
fn filters_by_exact_value() {
    let dataset = foos(vec![vec![123], vec![456]]);
    assert_eq!(foo_values(&dataset.query([("foo", 123)]).unwrap()), vec![vec![123]]);
}

#[test]
fn finds_by_list_of_values() {
    let dataset = foos(vec![vec![123], vec![456]]);
    assert_eq!(
        foo_values(&dataset.query([("foo", vec![123, 456])]).unwrap()),
        vec![vec![123], vec![456]]
    );
}

#[test]
fn finds_by_range() {
    let dataset = foos(vec![vec![123], vec![456]]);
    assert_eq!(dataset.query([("foo", 100..=500)]).unwrap().len(), 2);
    assert_eq!(dataset.query([("foo", 100..456)]).unwrap().len(), 1);
}

#[test]
fn finds_by_predicate() {
    let dataset = foos(vec![vec![123], vec![456]]);
    let below = Expr::predicate(|v| {
        v.as_number()
            .and_then(|n| n.as_integer())
            .is_some_and(|n| n < 200)
    });
    assert_eq!(foo_values(&dataset.query([("foo", below)]).unwrap()), vec![vec![123]]);
}

#[test]
fn finds_by_regex() {
    let runes = runes();
    let pattern = Expr::regex("^El.$").unwrap();
    assert_eq!(names(&runes.query([("name", pattern)]).unwrap()), vec!["Eld"]);
}

#[test]
fn equality_does_not_spread_list_fields() {
    let dataset = foos(vec![vec![1, 2], vec![3, 4], vec![2]]);
    assert_eq!(foo_values(&dataset.query([("foo", 2)]).unwrap()), vec![vec![2]]);
    assert_eq!(foo_values(&dataset.query([("foo", 2..=3)]).unwrap()), vec![vec![2]]);
}

#[test]
fn custom_rule_spreads_list_fields() {
    let mut dataset = foos(vec![vec![1, 2], vec![3, 4], vec![2]]);
    dataset
        .queries_with("foo", rule(|ctx| ctx.expression.matches_any(&ctx.field_value)))
        .unwrap();
    assert_eq!(
        foo_values(&dataset.query([("foo", 2)]).unwrap()),
        vec![vec![1, 2], vec![2]]
    );
}

#[test]
fn conditions_are_anded() {
    let runes = runes();
    let hits = runes.query([("name", Expr::from(vec!["El", "Eld"])), ("lvl", Expr::from(9))]);
    assert_eq!(names(&hits.unwrap()), vec!["Eld"]);
    assert!(runes
        .query([("name", Expr::from("El")), ("lvl", Expr::from(9))])
        .unwrap()
        .is_empty());
}

#[test]
fn query_field_can_differ_from_key() {
    let mut runes = runes();
    runes
        .register_query("level", QueryOptions::new().field("lvl"), None)
        .unwrap();
    assert_eq!(names(&runes.query([("level", 9)]).unwrap()), vec!["Eld"]);
}

#[test]
fn serde_json_records() {
    let mut docs = Dataset::new(|| {
        vec![
            serde_json::json!({"name": "El", "runes": ["Tal", "Eth"]}),
            serde_json::json!({"name": "Eld", "runes": ["Ort"]}),
        ]
    })
    .with_name("docs");
    docs.queries("name").unwrap();
    docs
        .queries_with("runes", rule(|ctx| ctx.expression.matches_any(&ctx.field_value)))
        .unwrap();

    let hits = docs.query([("runes", "Eth")]).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["name"], "El");
    assert_eq!(docs.require([("name", "Eld")]).unwrap()["runes"][0], "Ort");
}

// ============================================================================
// Custom queries
// ============================================================================

#[test]
fn custom_rule_matches_all_elements() {
    let mut dataset = foos(vec![vec![1, 2], vec![3, 4]]);
    dataset
        .queries_with("foo", rule(|ctx| ctx.expression.matches_all(&ctx.field_value)))
        .unwrap();
    assert_eq!(foo_values(&dataset.query([("foo", 2..=5)]).unwrap()), vec![vec![3, 4]]);
}

#[test]
fn custom_rule_sees_record_and_field() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    let mut runes = runes();
    runes
        .queries_with(
            "strong",
            rule(move |ctx: &Context<'_, Rune>| {
                if let Ok(mut log) = log.lock() {
                    log.push((ctx.field_name.to_string(), ctx.record.name));
                }
                ctx.field_value.is_none() && ctx.record.lvl > 6
            }),
        )
        .unwrap();

    assert_eq!(names(&runes.query([("strong", true)]).unwrap()), vec!["Eld"]);
    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![("strong".to_string(), "El"), ("strong".to_string(), "Eld")]
    );
}

#[test]
fn custom_strategy_requires_rule() {
    let mut runes = runes();
    let err = runes
        .register_query("lore", QueryOptions::new().strategy(Strategy::Custom), None)
        .unwrap_err();
    assert_eq!(err.to_string(), "query 'lore' uses the custom strategy but has no rule");
    assert!(!runes.query_keys().contains(&"lore".to_string()));
}

#[test]
fn reregistering_replaces_query() {
    let mut runes = runes();
    runes.queries_with("lvl", rule(|_| false)).unwrap();
    assert!(runes.query([("lvl", 5)]).unwrap().is_empty());
    runes.queries("lvl").unwrap();
    assert_eq!(runes.query([("lvl", 5)]).unwrap().len(), 1);
}

#[test]
fn conditions_short_circuit_in_request_order() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut runes = runes();
    runes
        .queries_with(
            "counted",
            rule(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            }),
        )
        .unwrap();

    let request = Conditions::new().with("name", "Eld").with("counted", true);
    assert_eq!(runes.query(request).unwrap().len(), 1);
    // Only the record that passed `name` reached the rule
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Request shapes
// ============================================================================

#[test]
fn bare_values_use_primary_field() {
    let mut dataset = foos(vec![vec![123], vec![456]]);
    dataset.set_primary_field("foo");
    assert_eq!(foo_values(&dataset.query(123).unwrap()), vec![vec![123]]);
    assert_eq!(dataset.query(Request::list([123, 456])).unwrap().len(), 2);
}

#[test]
fn list_of_mappings_merges_keys() {
    let runes = runes();
    let request = Request::list([
        Request::from([("name", "El")]),
        Request::from([("name", "Eld")]),
    ]);
    assert_eq!(names(&runes.query(request).unwrap()), vec!["El", "Eld"]);
}

#[test]
fn empty_list_request_matches_everything() {
    let runes = runes();
    assert_eq!(runes.query(Request::List(Vec::new())).unwrap().len(), 2);
}

// ============================================================================
// Single results
// ============================================================================

#[test]
fn one_returns_none_for_no_match() {
    let dataset = foos(vec![vec![123], vec![456]]);
    assert!(dataset.one([("foo", Vec::<i64>::new())]).unwrap().is_none());
}

#[test]
fn one_returns_single_value() {
    let dataset = foos(vec![vec![123], vec![456]]);
    assert_eq!(dataset.one([("foo", 123)]).unwrap().unwrap().foo, vec![123]);
}

#[test]
fn one_rejects_multiple_values() {
    let dataset = foos(vec![vec![123], vec![456]]);
    let err = dataset.one([("foo", vec![123, 456])]).unwrap_err();
    assert!(err
        .to_string()
        .ends_with(".query({foo: [123, 456]}) returned more than one record"));
    match err {
        QueryError::AmbiguousResult { positions, .. } => assert_eq!(positions, vec![0, 1]),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn ambiguous_matches_survive_reset() {
    let generation = Arc::new(AtomicUsize::new(0));
    let source_generation = Arc::clone(&generation);
    let mut dataset = Dataset::new(move || {
        let n = source_generation.fetch_add(1, Ordering::SeqCst) as i64;
        vec![Foo { foo: vec![n] }, Foo { foo: vec![n + 10] }]
    });
    dataset.queries("foo").unwrap();

    let err = dataset.require([("foo", 0..=20)]).unwrap_err();
    dataset.reset_cache();
    assert_eq!(dataset.all()[0].foo, vec![1]);

    let records = err.matches::<Foo>().unwrap();
    assert_eq!(foo_values(records), vec![vec![0], vec![10]]);
}

#[test]
fn require_reports_nothing() {
    let dataset = foos(vec![vec![123], vec![456]]);
    let err = dataset.require([("foo", Vec::<i64>::new())]).unwrap_err();
    assert_eq!(err.to_string(), "Foo.query({foo: []}) returned nothing");
}

#[test]
fn require_returns_single_value() {
    let dataset = foos(vec![vec![123], vec![456]]);
    assert_eq!(dataset.require([("foo", 123)]).unwrap().foo, vec![123]);
    assert!(matches!(
        dataset.require([("foo", 100..=500)]),
        Err(QueryError::AmbiguousResult { .. })
    ));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn unknown_key_lists_available_keys() {
    let dataset = foos(vec![vec![123]]);
    let err = dataset.query([("bar", 123)]).unwrap_err();
    assert!(err
        .to_string()
        .ends_with(r#"does not query "bar". Available query keys are ["foo"]"#));
    match err {
        QueryError::UnknownQueryKey { key, available, .. } => {
            assert_eq!(key, "bar");
            assert_eq!(available, vec!["foo".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn bare_value_without_primary_field() {
    let dataset = foos(vec![vec![123]]);
    let err = dataset.query(123).unwrap_err();
    assert_eq!(
        err.to_string(),
        "primary field not defined for Foo, 123 should be either a mapping or a list of mappings"
    );
}

#[test]
fn errors_are_not_empty_results() {
    let dataset = foos(vec![vec![123]]);
    assert!(dataset.count([("bar", 1)]).is_err());
    assert!(dataset.exists(1).is_err());
}

// ============================================================================
// Snapshots
// ============================================================================

#[test]
fn reset_publishes_new_snapshot_and_keeps_old() {
    let generation = Arc::new(AtomicUsize::new(0));
    let source_generation = Arc::clone(&generation);
    let mut dataset = Dataset::new(move || {
        let n = source_generation.fetch_add(1, Ordering::SeqCst) as i64;
        vec![Foo { foo: vec![n] }]
    });
    dataset.queries("foo").unwrap();

    let before = dataset.all();
    assert_eq!(before[0].foo, vec![0]);
    assert_eq!(dataset.query([("foo", 0)]).unwrap().len(), 1);

    let after = dataset.reset_cache();
    assert_eq!(after[0].foo, vec![1]);
    assert_eq!(before[0].foo, vec![0]);
    assert!(dataset.query([("foo", 0)]).unwrap().is_empty());
    assert_eq!(dataset.query([("foo", 1)]).unwrap().len(), 1);
}

#[test]
fn concurrent_first_access_loads_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let dataset = Arc::new(Dataset::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        vec![Foo { foo: vec![1] }]
    }));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let dataset = Arc::clone(&dataset);
            std::thread::spawn(move || dataset.all().len())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 1);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn apply_yaml_config() {
    let config = DatasetConfig::from_yaml(
        r#"
name: runes
primary_field: name
queries:
  name: {}
  level: { field: lvl }
  heavy: { field: lvl, strategy: custom }
"#,
    )
    .unwrap();

    let mut runes = Dataset::new(|| {
        vec![
            Rune { name: "El", lvl: 5 },
            Rune { name: "Eld", lvl: 9 },
        ]
    });
    runes
        .apply_config(&config, |name| match name {
            "heavy" => Some(rule(|ctx| {
                ctx.field_value.as_number().and_then(|n| n.as_integer()) > Some(6)
            })),
            _ => None,
        })
        .unwrap();

    assert_eq!(runes.name(), "runes");
    assert_eq!(runes.primary_field(), Some("name"));
    assert_eq!(runes.query_keys(), vec!["heavy", "level", "name"]);
    assert_eq!(names(&runes.query("El").unwrap()), vec!["El"]);
    assert_eq!(names(&runes.query([("level", 9)]).unwrap()), vec!["Eld"]);
    assert_eq!(names(&runes.query([("heavy", true)]).unwrap()), vec!["Eld"]);

    let err = runes.query([("lvl", 5)]).unwrap_err();
    assert!(err.to_string().starts_with("runes does not query"));
}

#[test]
fn config_with_unknown_strategy_fails_at_registration() {
    let config = DatasetConfig::from_json(r#"{"queries": {"name": {"strategy": "fuzzy"}}}"#).unwrap();
    let mut runes: Dataset<Rune> = Dataset::new(Vec::new);
    let err = runes.apply_config(&config, |_| None).unwrap_err();
    assert!(matches!(err, QueryError::UnknownStrategy(ref s) if s == "fuzzy"));
}

#[test]
fn config_custom_without_rule_fails() {
    let config = DatasetConfig::from_yaml("queries:\n  name:\n    strategy: custom\n").unwrap();
    let mut runes: Dataset<Rune> = Dataset::new(Vec::new);
    let err = runes.apply_config(&config, |_| None).unwrap_err();
    assert!(matches!(err, QueryError::MissingRule(ref name) if name == "name"));
}
