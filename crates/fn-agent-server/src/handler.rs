//! Request handlers for the control-plane API.
//!
//! This module provides the HTTP handlers for the probe, load, and invoke
//! operations. User-code failures (load, handler resolution, runtime,
//! timeout) are always HTTP 200 with `success=false`; HTTP 500 is reserved
//! for protocol faults at the control-plane boundary.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use fn_agent_common::AgentError;
use fn_agent_core::{DEFAULT_HANDLER, FunctionSpec, InvokeOptions};

use crate::protocol::{
    HealthResponse, InvokeRequest, InvokeResponse, LoadRequest, LoadResponse, ReadyResponse,
};
use crate::state::AppState;

/// Liveness probe.
///
/// Answers healthy as long as the process is serving; does not consider
/// whether a function is loaded.
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse::healthy())
}

/// Readiness probe.
///
/// Reports whether a function is resident and at which load version, so the
/// orchestrator can tell "serving but empty" from "serving and routable".
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(ReadyResponse {
        status: "ready",
        loaded: state.slot().is_loaded(),
        version: state.slot().version(),
    })
}

/// Replace the resident function.
#[instrument(skip(state, payload))]
pub async fn handle_load(
    State(state): State<AppState>,
    payload: Result<Json<LoadRequest>, JsonRejection>,
) -> (StatusCode, Json<LoadResponse>) {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let err = protocol_error(&rejection);
            warn!(error = %err, "Rejected malformed load request");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(LoadResponse::failed(err.to_string(), rejection.body_text())),
            );
        }
    };

    let spec = FunctionSpec::from_source(request.code)
        .with_handler(request.handler.unwrap_or_else(|| DEFAULT_HANDLER.to_string()))
        .with_env(request.env_vars);

    match state.load_function(spec) {
        Ok(_version) => (StatusCode::OK, Json(LoadResponse::loaded())),
        Err(err) => {
            error!(error = %err, "Load failed");
            (
                StatusCode::OK,
                Json(LoadResponse::failed(err.to_string(), error_trace(&err))),
            )
        }
    }
}

/// Run one invocation.
///
/// When the request carries inline `code`, an implicit load happens first,
/// replacing the resident function exactly as `POST /load` would.
#[instrument(skip(state, payload))]
pub async fn handle_invoke(
    State(state): State<AppState>,
    payload: Result<Json<InvokeRequest>, JsonRejection>,
) -> (StatusCode, Json<InvokeResponse>) {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let err = protocol_error(&rejection);
            warn!(error = %err, "Rejected malformed invoke request");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(InvokeResponse::rejected(
                    err.to_string(),
                    rejection.body_text(),
                )),
            );
        }
    };

    // A zero or negative timeout is a caller bug; reject it instead of
    // silently truncating to something unusable.
    let timeout_secs = match request.timeout_seconds {
        Some(secs) if secs <= 0 => {
            let err = AgentError::protocol(format!(
                "timeout_seconds must be positive, got {secs}"
            ));
            warn!(error = %err, "Rejected invalid timeout");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(InvokeResponse::rejected(err.to_string(), String::new())),
            );
        }
        #[allow(clippy::cast_sign_loss)]
        Some(secs) => secs as u64,
        None => state.config().execution.default_timeout_secs,
    };

    // Implicit load.
    if let Some(code) = request.code {
        let spec = FunctionSpec::from_source(code)
            .with_handler(request.handler.unwrap_or_else(|| DEFAULT_HANDLER.to_string()))
            .with_env(request.env_vars);

        if let Err(err) = state.load_function(spec) {
            error!(error = %err, "Implicit load failed");
            return (
                StatusCode::OK,
                Json(InvokeResponse::rejected(err.to_string(), error_trace(&err))),
            );
        }
    }

    let Some(func) = state.slot().current() else {
        let err = AgentError::NoFunctionLoaded;
        return (
            StatusCode::OK,
            Json(InvokeResponse::rejected(err.to_string(), String::new())),
        );
    };

    let request_id = Uuid::new_v4().to_string();
    let event = request.event.unwrap_or_else(|| serde_json::json!({}));

    info!(
        request_id = %request_id,
        handler = %func.handler_name,
        version = func.version,
        timeout_secs,
        "Handling invocation"
    );

    let record = state
        .executor()
        .invoke_with(
            func,
            event,
            InvokeOptions {
                timeout: std::time::Duration::from_secs(timeout_secs),
                request_id,
            },
        )
        .await;

    (StatusCode::OK, Json(record.into()))
}

/// Fallback for unknown paths and unmatched methods: 404 with an empty body.
pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

fn protocol_error(rejection: &JsonRejection) -> AgentError {
    AgentError::protocol(rejection.body_text())
}

/// Render a pre-execution failure as a single tagged trace line, matching
/// the shape of logs produced during execution.
fn error_trace(err: &AgentError) -> String {
    format!("[ERROR] {err}")
}
