//! End-to-end scenario tests
//!
//! These tests drive the scenario runner against in-memory collaborators:
//! 1. Path assertions on decoded response trees and native values
//! 2. Collect-all evaluation and reporting
//! 3. Isolation: rollback, cache flush, and index clear after every scenario

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use apicheck::assertion::Callsite;
use apicheck::http::{HttpInvoker, HttpResponse, RequestSpec};
use apicheck::impl_record;
use apicheck::scenario::{Cache, DataStore, Reporter, ScenarioState, SearchIndex};
use apicheck::{
    evaluate, AssertionOutcome, AssertionSpec, Error, Operator, Output, PathExpression, Resolved,
    Result, Root, Scenario, ScenarioReport, ScenarioRunner,
};
use serde_json::{json, Value};

/// Store, cache, and index sharing one call log
#[derive(Default)]
struct World {
    rows: RefCell<BTreeMap<String, String>>,
    snapshot: RefCell<Option<BTreeMap<String, String>>>,
    cache: RefCell<BTreeMap<String, String>>,
    documents: RefCell<Vec<Value>>,
    log: RefCell<Vec<&'static str>>,
    fail_flush: Cell<bool>,
}

impl World {
    fn seeded() -> Self {
        let world = Self::default();
        world
            .rows
            .borrow_mut()
            .insert("user:1".to_string(), "foo".to_string());
        world
    }

    fn calls(&self) -> Vec<&'static str> {
        self.log.borrow().clone()
    }
}

impl DataStore for World {
    fn begin(&self) -> Result<()> {
        self.log.borrow_mut().push("begin");
        *self.snapshot.borrow_mut() = Some(self.rows.borrow().clone());
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        self.log.borrow_mut().push("rollback");
        let snapshot = self
            .snapshot
            .borrow_mut()
            .take()
            .ok_or_else(|| Error::Collaborator("rollback without begin".to_string()))?;
        *self.rows.borrow_mut() = snapshot;
        Ok(())
    }
}

impl Cache for World {
    fn flush_all(&self) -> Result<()> {
        self.log.borrow_mut().push("flush");
        if self.fail_flush.get() {
            return Err(Error::Collaborator("cache unavailable".to_string()));
        }
        self.cache.borrow_mut().clear();
        Ok(())
    }
}

impl SearchIndex for World {
    fn clear_all(&self) -> Result<()> {
        self.log.borrow_mut().push("clear");
        self.documents.borrow_mut().clear();
        Ok(())
    }
}

/// Canned HTTP service
struct FakeService {
    status: u16,
    body: Value,
    requests: RefCell<Vec<RequestSpec>>,
}

impl FakeService {
    fn new(status: u16, body: Value) -> Self {
        Self {
            status,
            body,
            requests: RefCell::new(Vec::new()),
        }
    }
}

impl HttpInvoker for FakeService {
    fn invoke(&self, request: &RequestSpec) -> Result<HttpResponse> {
        self.requests.borrow_mut().push(request.clone());
        Ok(HttpResponse {
            status: self.status,
            body: self.body.clone(),
        })
    }
}

#[derive(Default)]
struct Recorder {
    cases: Vec<(usize, bool, Callsite)>,
    finished: Vec<String>,
}

impl Reporter for Recorder {
    fn record(&mut self, _scenario: &str, case: usize, outcome: &AssertionOutcome) {
        self.cases
            .push((case, outcome.passed, outcome.callsite.clone()));
    }

    fn finish(&mut self, report: &ScenarioReport) {
        self.finished.push(report.description.clone());
    }
}

fn ok_body() -> Value {
    json!({"result": {"status": "ok", "list": ["foo", "bar"]}})
}

fn path(s: &str) -> PathExpression {
    PathExpression::parse(s).unwrap()
}

// === Path resolution end to end ===

#[test]
fn test_status_equal_passes() {
    let body = ok_body();
    let spec = AssertionSpec::at("result.status", Operator::Equal, "ok").unwrap();
    let outcome = evaluate(&spec, Root::Tree(&body)).unwrap();
    assert!(outcome.passed);
}

#[test]
fn test_list_index_and_out_of_range() {
    let body = ok_body();

    let spec = AssertionSpec::at("result.list.1", Operator::Equal, "bar").unwrap();
    assert!(evaluate(&spec, Root::Tree(&body)).unwrap().passed);

    assert_eq!(Root::Tree(&body).resolve(&path("result.list.5")), Resolved::Absent);

    let spec = AssertionSpec::at("result.list.5", Operator::Equal, "bar").unwrap();
    let outcome = evaluate(&spec, Root::Tree(&body)).unwrap();
    assert!(!outcome.passed);
    let message = outcome.message.unwrap();
    assert!(message.contains("<absent>"), "{message}");
    assert!(message.contains("\"bar\""), "{message}");
}

struct Item {
    name: String,
}

struct Data {
    list: Vec<Item>,
}

struct Envelope {
    data: Option<Data>,
}

impl_record!(Item { name as "Name" });
impl_record!(Data { list as "List" });
impl_record!(Envelope { data as "Data" });

fn envelope() -> Envelope {
    Envelope {
        data: Some(Data {
            list: vec![
                Item {
                    name: "foo".to_string(),
                },
                Item {
                    name: "bar".to_string(),
                },
            ],
        }),
    }
}

#[test]
fn test_native_value_resolution() {
    let value = envelope();
    let root = Root::Native(&value);
    assert_eq!(root.resolve(&path("Data.List.0.Name")), Resolved::Value(json!("foo")));
    assert_eq!(root.resolve(&path("Data.List.1.Name")), Resolved::Value(json!("bar")));
    assert_eq!(root.resolve(&path("Data.List.2.Name")), Resolved::Absent);

    let empty = Envelope { data: None };
    assert_eq!(Root::Native(&empty).resolve(&path("Data.List.0")), Resolved::Absent);
}

#[test]
fn test_greater_than_on_string_is_a_defect() {
    let body = json!({"result": {"status": "ok"}});
    let spec = AssertionSpec::at("result.status", Operator::GreaterThan, 5).unwrap();
    let defect = evaluate(&spec, Root::Tree(&body)).unwrap_err();
    assert!(defect
        .to_string()
        .contains("GreaterThan requires integer, got string"));
}

// === Scenario runner ===

#[test]
fn test_request_scenario_reports_every_assertion() {
    let service = FakeService::new(200, ok_body());
    let mut recorder = Recorder::default();
    let scenario = Scenario::new("health check").expect_status(200).assertions([
        AssertionSpec::at("result.status", Operator::Equal, "ng").unwrap(),
        AssertionSpec::at("result.list", Operator::LengthEquals, 2).unwrap(),
        AssertionSpec::at("result.list.0", Operator::Matches, "^f").unwrap(),
    ]);

    let report = {
        let mut runner = ScenarioRunner::new().with_reporter(&mut recorder);
        runner
            .run_request(&scenario, &service, &RequestSpec::get("/health"))
            .unwrap()
    };

    assert_eq!(service.requests.borrow().len(), 1);
    assert_eq!(report.outcomes.len(), 4);
    assert!(!report.passed());
    assert_eq!(report.failures().count(), 1);

    let cases: Vec<(usize, bool)> = recorder.cases.iter().map(|(c, p, _)| (*c, *p)).collect();
    assert_eq!(cases, vec![(0, true), (1, false), (2, true), (3, true)]);
    assert_eq!(recorder.finished, vec!["health check".to_string()]);

    // each assertion points at the line that declared it
    let lines: Vec<u32> = recorder.cases[1..]
        .iter()
        .map(|(_, _, callsite)| match callsite {
            Callsite::Source { line, .. } => *line,
            other => panic!("unexpected callsite {other:?}"),
        })
        .collect();
    assert_eq!(lines[1], lines[0] + 1);
    assert_eq!(lines[2], lines[1] + 1);
}

#[test]
fn test_wrong_status_fails_without_stopping() {
    let service = FakeService::new(404, json!({"error": [{"code": "E40401"}]}));
    let scenario = Scenario::new("missing user")
        .expect_status(200)
        .assert(AssertionSpec::at("error.0.code", Operator::Equal, "E40401").unwrap());

    let report = ScenarioRunner::new()
        .run_request(&scenario, &service, &RequestSpec::get("/users/9"))
        .unwrap();

    assert!(!report.outcomes[0].passed);
    assert_eq!(
        report.outcomes[0].message.as_deref(),
        Some("Equal: value=404, want=200")
    );
    assert!(report.outcomes[1].passed);
}

#[test]
fn test_native_scenario_with_derived_value() {
    let scenario = Scenario::new("exec")
        .assert(AssertionSpec::at("Data.List.1.Name", Operator::Equal, "bar").unwrap())
        .assert(AssertionSpec::derived(
            |root| match root.to_value() {
                Resolved::Value(value) => json!(value["Data"]["List"].as_array().map(Vec::len)),
                Resolved::Absent => Value::Null,
            },
            Operator::Equal,
            2,
        ));

    let report = ScenarioRunner::new()
        .run(&scenario, || Ok(Output::native(envelope())))
        .unwrap();
    assert!(report.passed(), "{:?}", report.failures().collect::<Vec<_>>());
}

#[test]
fn test_transactional_scenario_leaves_store_unchanged() {
    let world = World::seeded();
    let before = world.rows.borrow().clone();
    let mut runner = ScenarioRunner::new()
        .with_store(&world)
        .with_cache(&world)
        .with_index(&world);

    let first = Scenario::new("creates a user").transactional(true).assert(
        AssertionSpec::produced(|| Ok(json!(world.rows.borrow().len())), Operator::Equal, 2),
    );
    let report = runner
        .run(&first, || {
            world
                .rows
                .borrow_mut()
                .insert("user:2".to_string(), "bar".to_string());
            world
                .cache
                .borrow_mut()
                .insert("user:2".to_string(), "bar".to_string());
            world.documents.borrow_mut().push(json!({"id": 2}));
            Ok(Output::Nothing)
        })
        .unwrap();

    assert!(report.passed());
    assert_eq!(*world.rows.borrow(), before);
    assert!(world.cache.borrow().is_empty());
    assert!(world.documents.borrow().is_empty());
    assert_eq!(world.calls(), vec!["begin", "rollback", "flush", "clear"]);
    assert_eq!(
        runner.history(),
        &[
            ScenarioState::Pending,
            ScenarioState::Running,
            ScenarioState::RollingBack,
            ScenarioState::Reported,
            ScenarioState::Idle,
        ]
    );

    let second = Scenario::new("sees the seed only").assert(AssertionSpec::produced(
        || Ok(json!(world.rows.borrow().len())),
        Operator::Equal,
        1,
    ));
    assert!(runner.run(&second, || Ok(Output::Nothing)).unwrap().passed());
}

#[test]
fn test_producer_reads_cache_before_flush() {
    let world = World::default();
    let mut runner = ScenarioRunner::new().with_cache(&world);
    let scenario = Scenario::new("cache write").assert(AssertionSpec::produced(
        || {
            world
                .cache
                .borrow()
                .get("test_key")
                .map(|value| json!(value))
                .ok_or_else(|| Error::Collaborator("test_key missing".to_string()))
        },
        Operator::Equal,
        "data",
    ));

    let report = runner
        .run(&scenario, || {
            world
                .cache
                .borrow_mut()
                .insert("test_key".to_string(), "data".to_string());
            Ok(Output::Nothing)
        })
        .unwrap();

    assert!(report.passed());
    assert!(world.cache.borrow().is_empty());
}

#[test]
fn test_defect_still_cleans_up() {
    let world = World::seeded();
    let before = world.rows.borrow().clone();
    let mut runner = ScenarioRunner::new().with_store(&world).with_cache(&world);
    let scenario = Scenario::new("broken test")
        .transactional(true)
        .assert(AssertionSpec::at("name", Operator::LessThan, 3).unwrap())
        .assert(AssertionSpec::at("name", Operator::Equal, "foo").unwrap());

    let err = runner
        .run(&scenario, || {
            world
                .rows
                .borrow_mut()
                .insert("user:3".to_string(), "baz".to_string());
            Ok(Output::Tree(json!({"name": "foo"})))
        })
        .unwrap_err();

    assert!(err.is_defect());
    assert!(matches!(err, Error::ShapeDefect(ref d) if d.operator == Operator::LessThan));
    assert_eq!(*world.rows.borrow(), before);
    assert_eq!(world.calls(), vec!["begin", "rollback", "flush"]);
    assert_eq!(runner.state(), ScenarioState::Idle);
}

#[test]
fn test_body_error_still_rolls_back() {
    let world = World::seeded();
    let mut runner = ScenarioRunner::new().with_store(&world);
    let scenario = Scenario::new("body fails").transactional(true);

    let err = runner
        .run(&scenario, || {
            world.rows.borrow_mut().clear();
            Err(Error::Collaborator("connection reset".to_string()))
        })
        .unwrap_err();

    assert!(matches!(err, Error::ScenarioFailed { .. }));
    assert!(err.to_string().contains("connection reset"));
    assert_eq!(world.rows.borrow().len(), 1);
    assert_eq!(world.calls(), vec!["begin", "rollback"]);
}

#[test]
fn test_cleanup_error_is_returned_after_all_steps() {
    let world = World::default();
    world.fail_flush.set(true);
    let mut runner = ScenarioRunner::new()
        .with_store(&world)
        .with_cache(&world)
        .with_index(&world);
    let scenario = Scenario::new("flush fails").transactional(true);

    let err = runner.run(&scenario, || Ok(Output::Nothing)).unwrap_err();

    assert!(err.to_string().contains("cache unavailable"));
    assert_eq!(world.calls(), vec!["begin", "rollback", "flush", "clear"]);
}

#[test]
fn test_non_transactional_scenario_keeps_writes() {
    let world = World::default();
    let mut runner = ScenarioRunner::new().with_store(&world);
    let scenario = Scenario::new("plain write");

    runner
        .run(&scenario, || {
            world
                .rows
                .borrow_mut()
                .insert("k".to_string(), "v".to_string());
            Ok(Output::Nothing)
        })
        .unwrap();

    assert_eq!(world.rows.borrow().len(), 1);
    assert!(world.calls().is_empty());
}
