//! Sandboxed script engine construction and compilation.
//!
//! The engine is the evaluation environment for untrusted guest code. Unlike
//! a shared runtime, a **fresh engine is built for every invocation** via
//! [`EngineBuilder`], carrying only the capabilities the host chooses to
//! register. The builder seam lets the host crate attach its allow-listed
//! functions without this crate depending on it.
//!
//! Safety posture:
//! - The module resolver is disabled, so guest code cannot `import` from the
//!   host filesystem.
//! - Call depth, expression depth, and (optionally) operation count are
//!   bounded by [`EngineConfig`].
//! - A [`CancelFlag`] checked from the engine's progress hook terminates a
//!   runaway evaluation after the supervisor's timer has fired.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rhai::module_resolvers::DummyModuleResolver;
use rhai::{AST, Dynamic, Engine};

use fn_agent_common::{AgentError, EngineConfig};

use crate::sink::OutputSink;

/// Cooperative cancellation flag for one invocation.
///
/// Set by the supervisor when the timeout timer fires; observed by the
/// engine's progress hook, which terminates the evaluation at the next
/// checkpoint. This is best-effort: the script keeps running until it hits a
/// checkpoint, and its result is discarded either way.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create a new, unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns `true` if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Per-invocation state handed to the engine builder.
///
/// Everything an engine's host functions may capture: the invocation's own
/// output sink, its cancellation flag, the environment snapshot of the
/// loaded function, and the request id for tracing.
#[derive(Debug, Clone)]
pub struct InvocationHooks {
    /// Output sink owned by this invocation.
    pub sink: OutputSink,
    /// Cancellation flag owned by this invocation.
    pub cancel: CancelFlag,
    /// Environment snapshot of the loaded function.
    pub env: Arc<HashMap<String, String>>,
    /// Unique request identifier for tracing.
    pub request_id: String,
}

/// Builds one engine per invocation.
///
/// Implemented by the host crate, which layers its capability allow-list on
/// top of [`base_engine`].
pub trait EngineBuilder: Send + Sync {
    /// Build a fresh engine wired to this invocation's hooks.
    fn build(&self, hooks: &InvocationHooks) -> Engine;
}

/// Construct the baseline sandboxed engine: safety limits applied, module
/// resolution disabled, cancellation wired. No host functions are registered
/// here; that is the builder's job.
pub fn base_engine(config: &EngineConfig, cancel: &CancelFlag) -> Engine {
    let mut engine = Engine::new();

    engine.set_module_resolver(DummyModuleResolver::new());
    engine.set_max_call_levels(config.max_call_levels);
    engine.set_max_expr_depths(config.max_expr_depth, config.max_expr_depth);
    if config.max_operations > 0 {
        engine.set_max_operations(config.max_operations);
    }

    let flag = cancel.clone();
    engine.on_progress(move |_ops| {
        if flag.is_cancelled() {
            Some(Dynamic::UNIT)
        } else {
            None
        }
    });

    engine
}

/// Compile function source into an AST.
///
/// Used at load time so parse errors surface on `/load` rather than on the
/// first invocation.
///
/// # Errors
///
/// Returns [`AgentError::Load`] if the source does not parse.
pub fn compile_source(config: &EngineConfig, source: &str) -> Result<AST, AgentError> {
    let engine = base_engine(config, &CancelFlag::new());
    engine
        .compile(source)
        .map_err(|e| AgentError::load(e.to_string()))
}
