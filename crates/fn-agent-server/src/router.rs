//! HTTP router configuration.
//!
//! This module provides functions to build the Axum router with all
//! necessary routes and middleware.

use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handler::{handle_invoke, handle_load, health_check, not_found, readiness_check};
use crate::state::AppState;

/// Build the application router.
///
/// Routes:
/// - `GET /health` - Liveness probe
/// - `GET /ready` - Readiness probe
/// - `POST /load` - Replace the resident function
/// - `POST /invoke` - Run one invocation
///
/// Anything else, including a wrong method on a known path, is a 404 with
/// an empty body.
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(health_check).fallback(not_found))
        .route("/ready", get(readiness_check).fallback(not_found))
        .route("/load", post(handle_load).fallback(not_found))
        .route("/invoke", post(handle_invoke).fallback(not_found))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
