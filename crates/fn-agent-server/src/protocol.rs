//! Wire types for the control-plane API.
//!
//! These structs define the JSON bodies exchanged with the orchestrator.
//! The field names and shapes are a fixed contract; optional response
//! fields are omitted (not null) when absent.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use fn_agent_core::InvocationRecord;

/// `GET /health` response body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"healthy"` while the process is serving.
    pub status: &'static str,
    /// Always `true`; the orchestrator treats anything else as not serving.
    pub ready: bool,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy",
            ready: true,
        }
    }
}

/// `GET /ready` response body.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    /// Whether a function is currently resident.
    pub loaded: bool,
    /// Version counter of the most recent successful load (0 if none).
    pub version: u64,
}

/// `POST /load` request body.
#[derive(Debug, Deserialize)]
pub struct LoadRequest {
    /// Source text of the function.
    pub code: String,
    /// Entry-point name; defaults to the conventional handler name.
    pub handler: Option<String>,
    /// Environment variables visible to the function.
    #[serde(default)]
    pub env_vars: HashMap<String, String>,
}

/// `POST /load` response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoadResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs: Option<String>,
}

impl LoadResponse {
    pub fn loaded() -> Self {
        Self {
            success: true,
            message: Some("Function loaded".to_string()),
            error: None,
            logs: None,
        }
    }

    pub fn failed(error: impl Into<String>, logs: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
            logs: Some(logs.into()),
        }
    }
}

/// `POST /invoke` request body.
///
/// When `code` is present the request performs an implicit load first,
/// replacing whatever was resident.
#[derive(Debug, Default, Deserialize)]
pub struct InvokeRequest {
    pub code: Option<String>,
    pub handler: Option<String>,
    #[serde(default)]
    pub env_vars: HashMap<String, String>,
    pub event: Option<Value>,
    pub timeout_seconds: Option<i64>,
}

/// `POST /invoke` response body.
///
/// Every invocation produces exactly one of these; `execution_time_ms` is
/// present on every path, including failures, so callers can always render
/// a duration.
#[derive(Debug, Serialize, Deserialize)]
pub struct InvokeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub logs: String,
    pub execution_time_ms: u64,
    pub memory_used_mb: u64,
}

impl InvokeResponse {
    /// A failure that never reached execution (no function, load error,
    /// protocol error).
    pub fn rejected(error: impl Into<String>, logs: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
            logs: logs.into(),
            execution_time_ms: 0,
            memory_used_mb: 0,
        }
    }
}

impl From<InvocationRecord> for InvokeResponse {
    fn from(record: InvocationRecord) -> Self {
        Self {
            success: record.success,
            result: record.result,
            error: record.error.map(|e| e.to_string()),
            logs: record.logs,
            execution_time_ms: record.execution_time_ms,
            memory_used_mb: record.memory_used_mb,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_shape() {
        let body = serde_json::to_value(HealthResponse::healthy()).unwrap();
        assert_eq!(body, serde_json::json!({"status": "healthy", "ready": true}));
    }

    #[test]
    fn test_load_response_omits_absent_fields() {
        let body = serde_json::to_value(LoadResponse::loaded()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"success": true, "message": "Function loaded"})
        );
    }

    #[test]
    fn test_invoke_response_success_omits_error() {
        let response = InvokeResponse {
            success: true,
            result: Some(serde_json::json!({"echo": "Ada"})),
            error: None,
            logs: String::new(),
            execution_time_ms: 3,
            memory_used_mb: 0,
        };
        let body = serde_json::to_value(response).unwrap();

        assert!(body.get("error").is_none());
        assert_eq!(body["logs"], "");
        assert_eq!(body["result"]["echo"], "Ada");
    }

    #[test]
    fn test_invoke_request_defaults() {
        let request: InvokeRequest = serde_json::from_str("{}").unwrap();
        assert!(request.code.is_none());
        assert!(request.event.is_none());
        assert!(request.env_vars.is_empty());
        assert!(request.timeout_seconds.is_none());
    }

    #[test]
    fn test_load_request_minimal() {
        let request: LoadRequest =
            serde_json::from_str(r#"{"code": "fn handler(e, c) { e }"}"#).unwrap();
        assert!(request.handler.is_none());
        assert!(request.env_vars.is_empty());
    }
}
