//! End-to-end tests for the GraphQL client over real HTTP
//!
//! Covers retry classification: which failures are retried, how many times,
//! and what error reaches the job.

mod common;

use common::{JobHarness, StubGraphQlServer, StubReply, HEARTBEAT_STAMP, TEST_MAX_ATTEMPTS};
use crm_jobs::append_log::StreamId;
use crm_jobs::config::RetrySettings;
use crm_jobs::graphql::{
    ApiError, GraphQlClient, HttpTransport, QueryDocument, RetryPolicy, TransportError, Variables,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const HELLO: QueryDocument = QueryDocument::new("query { hello }");

fn client_for(server: &StubGraphQlServer, max_attempts: u32, timeout_secs: u64) -> GraphQlClient {
    let transport = HttpTransport::new(&server.url).unwrap();
    let policy = RetryPolicy::new(&RetrySettings {
        max_attempts,
        attempt_timeout_secs: timeout_secs,
        initial_backoff_ms: 5,
        max_backoff_ms: 20,
        backoff_multiplier: 2.0,
    });
    GraphQlClient::new(Arc::new(transport), policy)
}

#[test]
fn test_transient_server_errors_are_retried_until_success() {
    let server = StubGraphQlServer::scripted(vec![
        StubReply::status(503),
        StubReply::status(502),
        StubReply::data(json!({ "hello": "back" })),
    ]);
    let client = client_for(&server, 3, 2);

    let data = client.execute(&HELLO, &Variables::new()).unwrap();

    assert_eq!(data["hello"], "back");
    assert_eq!(server.request_count(), 3);
}

#[test]
fn test_attempts_never_exceed_max_attempts() {
    let server = StubGraphQlServer::always(StubReply::status(503));
    let client = client_for(&server, 4, 2);

    let err = client.execute(&HELLO, &Variables::new()).unwrap_err();

    assert!(matches!(
        err,
        ApiError::Transport {
            attempts: 4,
            source: TransportError::ServerStatus(503)
        }
    ));
    assert_eq!(server.request_count(), 4);
}

#[test]
fn test_client_rejection_is_not_retried() {
    let server = StubGraphQlServer::always(StubReply::status(403));
    let client = client_for(&server, 3, 2);

    let err = client.execute(&HELLO, &Variables::new()).unwrap_err();

    assert!(matches!(
        err,
        ApiError::Transport {
            attempts: 1,
            source: TransportError::ClientStatus(403)
        }
    ));
    assert_eq!(server.request_count(), 1);
}

#[test]
fn test_bad_request_with_error_payload_is_an_application_error() {
    let server = StubGraphQlServer::always(StubReply::json(
        400,
        json!({ "errors": [{ "message": "Syntax Error: Unexpected Name" }] }),
    ));
    let client = client_for(&server, 3, 2);

    let err = client.execute(&HELLO, &Variables::new()).unwrap_err();

    assert!(matches!(err, ApiError::Application(ref messages) if messages.len() == 1));
    assert_eq!(err.to_string(), "Syntax Error: Unexpected Name");
    assert_eq!(server.request_count(), 1);
}

#[test]
fn test_application_errors_are_not_retried() {
    let server = StubGraphQlServer::always(StubReply::errors(&["first", "second"]));
    let client = client_for(&server, 3, 2);

    let err = client.execute(&HELLO, &Variables::new()).unwrap_err();

    assert_eq!(err.to_string(), "first; second");
    assert_eq!(server.request_count(), 1);
}

#[test]
fn test_malformed_body_is_retried() {
    let server = StubGraphQlServer::scripted(vec![
        StubReply::raw(200, "<html>gateway</html>"),
        StubReply::data(json!({ "hello": "ok" })),
    ]);
    let client = client_for(&server, 3, 2);

    let data = client.execute(&HELLO, &Variables::new()).unwrap();

    assert_eq!(data["hello"], "ok");
    assert_eq!(server.request_count(), 2);
}

#[test]
fn test_slow_attempt_times_out_and_is_retried() {
    let server = StubGraphQlServer::scripted(vec![
        StubReply::data(json!({ "hello": "late" })).delayed(Duration::from_millis(2500)),
        StubReply::data(json!({ "hello": "fast" })),
    ]);
    let client = client_for(&server, 2, 1);

    let data = client.execute(&HELLO, &Variables::new()).unwrap();

    assert_eq!(data["hello"], "fast");
    assert_eq!(server.request_count(), 2);
}

#[test]
fn test_missing_data_is_reported() {
    let server = StubGraphQlServer::always(StubReply::json(200, json!({})));
    let client = client_for(&server, 3, 2);

    let err = client.execute(&HELLO, &Variables::new()).unwrap_err();

    assert!(matches!(err, ApiError::MissingData));
    assert_eq!(server.request_count(), 1);
}

#[test]
fn test_heartbeat_recovers_after_transient_failure() {
    let server = StubGraphQlServer::scripted(vec![
        StubReply::status(503),
        StubReply::data(json!({ "hello": "Hello, GraphQL!" })),
    ]);
    let harness = JobHarness::new(&server);

    let outcome = harness.run("heartbeat");

    assert!(!outcome.is_failure());
    assert_eq!(
        harness.lines(StreamId::Heartbeat)[1],
        format!("{} GraphQL hello: Hello, GraphQL!", HEARTBEAT_STAMP)
    );
    assert_eq!(server.request_count(), 2);
}

#[test]
fn test_heartbeat_failure_names_attempt_count() {
    let server = StubGraphQlServer::always(StubReply::status(503));
    let harness = JobHarness::new(&server);

    let outcome = harness.run("heartbeat");

    assert!(outcome.is_failure());
    assert_eq!(
        harness.lines(StreamId::Heartbeat)[1],
        format!(
            "{} GraphQL check failed: server returned HTTP 503 (after {} attempt(s))",
            HEARTBEAT_STAMP, TEST_MAX_ATTEMPTS
        )
    );
    assert_eq!(server.request_count(), TEST_MAX_ATTEMPTS as usize);
}
