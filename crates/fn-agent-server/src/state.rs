//! Shared application state.
//!
//! This module provides [`AppState`], which holds shared resources
//! across all HTTP request handlers.

use std::sync::Arc;

use fn_agent_common::{AgentConfig, AgentError};
use fn_agent_core::{Executor, FunctionSlot, FunctionSpec};
use fn_agent_host::create_engine_builder;

/// Shared state across all request handlers.
///
/// This struct is cloned for each request, so it uses `Arc` for shared data.
#[derive(Clone)]
pub struct AppState {
    /// The single slot holding the currently loaded function.
    slot: Arc<FunctionSlot>,

    /// Timeout-supervised executor (shared across all requests).
    executor: Arc<Executor>,

    /// Agent configuration.
    config: AgentConfig,
}

impl AppState {
    /// Create new application state.
    pub fn new(config: &AgentConfig) -> Self {
        let builder = create_engine_builder(config);
        let executor = Arc::new(Executor::new(builder, config.execution.clone()));

        Self {
            slot: Arc::new(FunctionSlot::new()),
            executor,
            config: config.clone(),
        }
    }

    /// Get the function slot.
    pub fn slot(&self) -> &FunctionSlot {
        &self.slot
    }

    /// Get the executor.
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Get the agent configuration.
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Compile and install a function definition, replacing any resident one.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Load`] if the source does not compile; the
    /// previous function (if any) stays resident.
    pub fn load_function(&self, spec: FunctionSpec) -> Result<u64, AgentError> {
        self.slot.load(spec, &self.config.engine)
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("loaded", &self.slot.is_loaded())
            .field("version", &self.slot.version())
            .finish_non_exhaustive()
    }
}
