//! HTTP collaborator tests against a local stub server

mod common;

use std::collections::BTreeMap;

use apicheck::common::config::HttpConfig;
use apicheck::http::{HttpClient, HttpInvoker, RequestSpec};
use apicheck::{AssertionSpec, Operator, Resolved, Scenario, ScenarioRunner};
use common::{Reply, StubServer};
use serde_json::{json, Value};

fn client(server: &StubServer, headers: &[(&str, &str)]) -> HttpClient {
    HttpClient::new(&HttpConfig {
        base_url: server.url(),
        timeout_secs: 5,
        headers: headers
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
    })
    .unwrap()
}

#[test]
fn test_request_goes_out_as_described() {
    let server = StubServer::start(|_| Reply::json(201, json!({"result": {"id": 3}})));
    let client = client(&server, &[("Authorization", "Bearer default")]);

    let mut request = RequestSpec::post("/users", json!({"name": "foo"}));
    request.query = Some(BTreeMap::from([("page".to_string(), "2".to_string())]));
    request
        .headers
        .insert("authorization".to_string(), "Bearer scenario".to_string());
    request
        .headers
        .insert("X-Token".to_string(), "abc".to_string());

    let response = client.invoke(&request).unwrap();
    assert_eq!(response.status, 201);
    assert_eq!(response.body, json!({"result": {"id": 3}}));

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let seen = &requests[0];
    assert_eq!(seen.method, "POST");
    assert_eq!(seen.target, "/users?page=2");
    assert_eq!(seen.header("authorization"), vec!["Bearer scenario"]);
    assert_eq!(seen.header("x-token"), vec!["abc"]);
    assert_eq!(seen.header("content-type"), vec!["application/json"]);
    assert_eq!(
        serde_json::from_str::<Value>(&seen.body).unwrap(),
        json!({"name": "foo"})
    );
}

#[test]
fn test_string_body_is_sent_verbatim() {
    let server = StubServer::start(|_| Reply::json(200, json!({})));
    let client = client(&server, &[]);

    let mut request = RequestSpec::post("/login", json!("user=foo&pass=bar"));
    request.method = Some("put".to_string());
    request.headers.insert(
        "Content-Type".to_string(),
        "application/x-www-form-urlencoded".to_string(),
    );
    client.invoke(&request).unwrap();

    let seen = &server.requests()[0];
    assert_eq!(seen.method, "PUT");
    assert_eq!(seen.body, "user=foo&pass=bar");
    assert_eq!(
        seen.header("content-type"),
        vec!["application/x-www-form-urlencoded"]
    );
}

#[test]
fn test_get_still_sends_json_content_type() {
    let server = StubServer::start(|_| Reply::json(200, json!({"result": []})));
    client(&server, &[])
        .invoke(&RequestSpec::get("health"))
        .unwrap();

    let seen = &server.requests()[0];
    assert_eq!(seen.method, "GET");
    assert_eq!(seen.target, "/health");
    assert_eq!(seen.header("content-type"), vec!["application/json"]);
    assert!(seen.body.is_empty());
}

#[test]
fn test_missing_route_with_text_body_still_checks_status() {
    let server =
        StubServer::start(|request| Reply::text(404, &format!("Cannot GET {}", request.target)));
    let client = client(&server, &[]);

    let scenario = Scenario::new("missing route")
        .expect_status(404)
        .assert(AssertionSpec::at("result", Operator::NotPresent, Value::Null).unwrap())
        .assert(AssertionSpec::derived(
            |root| match root.to_value() {
                Resolved::Value(value) => value,
                Resolved::Absent => Value::Null,
            },
            Operator::Equal,
            "Cannot GET /x",
        ));

    let report = ScenarioRunner::new()
        .run_request(&scenario, &client, &RequestSpec::get("/x"))
        .unwrap();

    assert_eq!(report.outcomes.len(), 3);
    assert!(report.passed(), "{:?}", report.failures().collect::<Vec<_>>());
}
