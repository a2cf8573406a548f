//! The resident loaded function.
//!
//! This module provides:
//! - [`FunctionSpec`]: The source/handler/environment triple from a load request
//! - [`CompiledFunction`]: A spec compiled and ready to invoke
//! - [`FunctionSlot`]: The single mutable slot holding the current function
//!
//! The agent serves exactly one deployed function, so the slot holds at most
//! one definition and `load` replaces it wholesale. Readers take an `Arc`
//! snapshot; an invocation started under one load finishes under that load
//! even if a new one lands mid-flight.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use rhai::AST;
use tracing::info;

use fn_agent_common::{AgentError, EngineConfig};

use crate::engine::compile_source;

/// Conventional handler name used when a load request does not name one.
pub const DEFAULT_HANDLER: &str = "handler";

/// A function definition as submitted by the control plane.
#[derive(Debug, Clone)]
pub struct FunctionSpec {
    /// Raw source text of the user's program.
    pub source: String,
    /// Name of the exported entry point.
    pub handler_name: String,
    /// Environment variables visible to the function via the `env` capability.
    pub env: HashMap<String, String>,
}

impl FunctionSpec {
    /// Create a spec with the default handler name and empty environment.
    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            handler_name: DEFAULT_HANDLER.to_string(),
            env: HashMap::new(),
        }
    }

    /// Set the handler name.
    #[must_use]
    pub fn with_handler(mut self, handler: impl Into<String>) -> Self {
        self.handler_name = handler.into();
        self
    }

    /// Set the environment variables.
    #[must_use]
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }
}

/// A compiled, invocable function definition.
///
/// Immutable once created; shared with in-flight invocations via `Arc`.
#[derive(Debug)]
pub struct CompiledFunction {
    /// Raw source, kept for per-invocation recompilation when configured.
    pub source: String,
    /// Name of the entry point to resolve.
    pub handler_name: String,
    /// Environment snapshot taken at load time.
    pub env: Arc<HashMap<String, String>>,
    /// Compiled form of the source.
    pub ast: AST,
    /// Monotonic load version that produced this definition.
    pub version: u64,
}

/// The single mutable slot holding the currently loaded function.
///
/// Single-writer (load), multiple-reader (invoke): writers swap the whole
/// `Arc`, readers clone it. The version counter increments on every
/// successful load.
#[derive(Debug, Default)]
pub struct FunctionSlot {
    current: RwLock<Option<Arc<CompiledFunction>>>,
    version: AtomicU64,
}

impl FunctionSlot {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile and install a new function definition, replacing any previous
    /// one wholesale.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Load`] if the source does not compile; the
    /// previously loaded function (if any) stays resident in that case.
    pub fn load(&self, spec: FunctionSpec, config: &EngineConfig) -> Result<u64, AgentError> {
        let ast = compile_source(config, &spec.source)?;
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;

        let compiled = Arc::new(CompiledFunction {
            source: spec.source,
            handler_name: spec.handler_name,
            env: Arc::new(spec.env),
            ast,
            version,
        });

        info!(
            handler = %compiled.handler_name,
            version,
            source_bytes = compiled.source.len(),
            "Function loaded"
        );

        *self.current.write() = Some(compiled);
        Ok(version)
    }

    /// Snapshot of the currently loaded function, if any.
    pub fn current(&self) -> Option<Arc<CompiledFunction>> {
        self.current.read().clone()
    }

    /// Returns `true` if a function is loaded.
    pub fn is_loaded(&self) -> bool {
        self.current.read().is_some()
    }

    /// The version of the most recent successful load (0 if none yet).
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(source: &str) -> FunctionSpec {
        FunctionSpec::from_source(source)
    }

    #[test]
    fn test_empty_slot() {
        let slot = FunctionSlot::new();
        assert!(!slot.is_loaded());
        assert!(slot.current().is_none());
        assert_eq!(slot.version(), 0);
    }

    #[test]
    fn test_load_and_snapshot() {
        let slot = FunctionSlot::new();
        let config = EngineConfig::default();

        let version = slot
            .load(spec("fn handler(event, ctx) { event }"), &config)
            .unwrap();

        assert_eq!(version, 1);
        assert!(slot.is_loaded());

        let current = slot.current().unwrap();
        assert_eq!(current.handler_name, "handler");
        assert_eq!(current.version, 1);
    }

    #[test]
    fn test_load_replaces_wholesale() {
        let slot = FunctionSlot::new();
        let config = EngineConfig::default();

        let mut env = HashMap::new();
        env.insert("STAGE".to_string(), "dev".to_string());
        slot.load(spec("fn handler(e, c) { 1 }").with_env(env), &config)
            .unwrap();

        // Second load carries no env; the first load's env must not survive.
        slot.load(spec("fn handler(e, c) { 2 }"), &config).unwrap();

        let current = slot.current().unwrap();
        assert_eq!(current.version, 2);
        assert!(current.env.is_empty());
    }

    #[test]
    fn test_load_failure_keeps_previous() {
        let slot = FunctionSlot::new();
        let config = EngineConfig::default();

        slot.load(spec("fn handler(e, c) { 1 }"), &config).unwrap();
        let err = slot.load(spec("fn broken( {"), &config).unwrap_err();

        assert!(matches!(err, AgentError::Load { .. }));
        // Previous definition is still resident at its old version.
        let current = slot.current().unwrap();
        assert_eq!(current.version, 1);
    }

    #[test]
    fn test_inflight_snapshot_survives_reload() {
        let slot = FunctionSlot::new();
        let config = EngineConfig::default();

        slot.load(spec("fn handler(e, c) { 1 }"), &config).unwrap();
        let snapshot = slot.current().unwrap();

        slot.load(spec("fn handler(e, c) { 2 }"), &config).unwrap();

        // The old snapshot is unchanged; only new reads see version 2.
        assert_eq!(snapshot.version, 1);
        assert_eq!(slot.current().unwrap().version, 2);
    }

    #[test]
    fn test_spec_builder() {
        let s = FunctionSpec::from_source("fn main(e) { e }").with_handler("main");
        assert_eq!(s.handler_name, "main");
        assert!(s.env.is_empty());
    }
}
