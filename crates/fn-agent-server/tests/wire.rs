//! Wire-level tests for the control-plane API.
//!
//! These tests run a real server on an ephemeral port and exercise the
//! JSON contract over HTTP, the same way the orchestrator does.

use std::time::{Duration, Instant};

use fn_agent_common::AgentConfig;
use fn_agent_server::AgentServer;
use fn_agent_server::server::TestHandle;
use serde_json::{Value, json};

async fn start() -> TestHandle {
    AgentServer::start_test(&AgentConfig::default())
        .await
        .unwrap()
}

// ============================================================================
// Test: Probes
// ============================================================================

#[tokio::test]
async fn test_health_body_exact() {
    let server = start().await;

    let body: Value = reqwest::get(format!("{}/health", server.url()))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body, json!({"status": "healthy", "ready": true}));
    server.shutdown().await;
}

#[tokio::test]
async fn test_ready_reports_load_version() {
    let server = start().await;
    let client = reqwest::Client::new();

    let before: Value = client
        .get(format!("{}/ready", server.url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(before["loaded"], false);
    assert_eq!(before["version"], 0);

    client
        .post(format!("{}/load", server.url()))
        .json(&json!({"code": "fn handler(e, c) { e }"}))
        .send()
        .await
        .unwrap();

    let after: Value = client
        .get(format!("{}/ready", server.url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(after["loaded"], true);
    assert_eq!(after["version"], 1);

    server.shutdown().await;
}

// ============================================================================
// Test: Routing Faults
// ============================================================================

#[tokio::test]
async fn test_unknown_path_404_empty_body() {
    let server = start().await;

    let response = reqwest::get(format!("{}/nope", server.url())).await.unwrap();

    assert_eq!(response.status(), 404);
    assert_eq!(response.text().await.unwrap(), "");
    server.shutdown().await;
}

#[tokio::test]
async fn test_wrong_method_404() {
    let server = start().await;

    let response = reqwest::get(format!("{}/invoke", server.url()))
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    server.shutdown().await;
}

#[tokio::test]
async fn test_malformed_json_500_envelope() {
    let server = start().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/invoke", server.url()))
        .header("content-type", "application/json")
        .body("{definitely not json")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .starts_with("ProtocolError:")
    );
    assert!(body["logs"].is_string());
    server.shutdown().await;
}

#[tokio::test]
async fn test_zero_timeout_rejected() {
    let server = start().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/invoke", server.url()))
        .json(&json!({"event": {}, "timeout_seconds": 0}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("timeout_seconds"));
    server.shutdown().await;
}

// ============================================================================
// Test: Load / Invoke Flow
// ============================================================================

#[tokio::test]
async fn test_load_then_invoke_echo() {
    let server = start().await;
    let client = reqwest::Client::new();

    let load: Value = client
        .post(format!("{}/load", server.url()))
        .json(&json!({"code": "fn handler(event, ctx) { #{echo: event.name} }"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(load, json!({"success": true, "message": "Function loaded"}));

    let invoke: Value = client
        .post(format!("{}/invoke", server.url()))
        .json(&json!({"event": {"name": "Ada"}}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(invoke["success"], true);
    assert_eq!(invoke["result"], json!({"echo": "Ada"}));
    assert_eq!(invoke["logs"], "");
    assert!(invoke["execution_time_ms"].is_u64());
    assert!(invoke["memory_used_mb"].is_u64());
    server.shutdown().await;
}

#[tokio::test]
async fn test_invoke_without_load() {
    let server = start().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/invoke", server.url()))
        .json(&json!({"event": {}}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "No function code loaded");
    assert_eq!(body["execution_time_ms"], 0);
    server.shutdown().await;
}

#[tokio::test]
async fn test_implicit_load_via_invoke() {
    let server = start().await;
    let client = reqwest::Client::new();

    let body: Value = client
        .post(format!("{}/invoke", server.url()))
        .json(&json!({
            "code": "fn handler(event, ctx) { event.x + 1 }",
            "event": {"x": 9}
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["success"], true);
    assert_eq!(body["result"], 10);

    // The implicit load is a real load: the function stays resident.
    let again: Value = client
        .post(format!("{}/invoke", server.url()))
        .json(&json!({"event": {"x": 1}}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(again["result"], 2);
    server.shutdown().await;
}

#[tokio::test]
async fn test_load_failure_is_200_with_error() {
    let server = start().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/load", server.url()))
        .json(&json!({"code": "fn handler( {"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().starts_with("LoadError:"));
    server.shutdown().await;
}

#[tokio::test]
async fn test_stdout_captured_over_wire() {
    let server = start().await;
    let client = reqwest::Client::new();

    let body: Value = client
        .post(format!("{}/invoke", server.url()))
        .json(&json!({
            "code": r#"fn handler(event, ctx) { print("working"); "done" }"#,
            "event": {}
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["success"], true);
    assert_eq!(body["result"], "done");
    assert_eq!(body["logs"], "[STDOUT] working");
    server.shutdown().await;
}

#[tokio::test]
async fn test_timeout_over_wire() {
    let server = start().await;
    let client = reqwest::Client::new();

    client
        .post(format!("{}/load", server.url()))
        .json(&json!({"code": "fn handler(e, c) { let x = 0; while true { x += 1 } x }"}))
        .send()
        .await
        .unwrap();

    let started = Instant::now();
    let body: Value = client
        .post(format!("{}/invoke", server.url()))
        .json(&json!({"event": {}, "timeout_seconds": 1}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(body["success"], false);
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("TimeoutError:"), "unexpected: {error}");
    assert!(error.contains('1'));
    assert!(elapsed >= Duration::from_secs(1));
    assert!(elapsed < Duration::from_secs(3), "took {elapsed:?}");
    server.shutdown().await;
}

#[tokio::test]
async fn test_env_vars_carried_by_load() {
    let server = start().await;
    let client = reqwest::Client::new();

    client
        .post(format!("{}/load", server.url()))
        .json(&json!({
            "code": r#"fn handler(event, ctx) { env("REGION") }"#,
            "env_vars": {"REGION": "eu-west-1"}
        }))
        .send()
        .await
        .unwrap();

    let body: Value = client
        .post(format!("{}/invoke", server.url()))
        .json(&json!({"event": {}}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["result"], "eu-west-1");
    server.shutdown().await;
}
