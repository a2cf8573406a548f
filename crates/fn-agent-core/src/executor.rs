//! Invocation supervision.
//!
//! This module provides [`Executor`], which runs one invocation end to end:
//!
//! 1. Build a fresh engine wired to this invocation's sink and cancel flag
//! 2. Evaluate the loaded source in a fresh scope
//! 3. Resolve the named handler and call it with `(event, context)`
//! 4. Race the call against the wall-clock timeout
//! 5. Normalize the outcome into a single [`InvocationRecord`]
//!
//! The timeout is soft: the losing side keeps running until the engine's
//! progress hook observes the cancel flag, and its eventual settlement is
//! discarded. Hard cancellation (killing the agent process) belongs to the
//! orchestrator.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rhai::serde::{from_dynamic, to_dynamic};
use rhai::{AST, CallFnOptions, Dynamic, Engine, EvalAltResult, FnPtr, Map, Scope};
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{error, info, instrument, warn};

use fn_agent_common::{AgentError, ExecutionConfig};

use crate::engine::{CancelFlag, EngineBuilder, InvocationHooks};
use crate::function::CompiledFunction;
use crate::resources;
use crate::sink::OutputSink;

/// Options for a single invocation.
#[derive(Debug, Clone)]
pub struct InvokeOptions {
    /// Wall-clock timeout for the handler.
    pub timeout: Duration,
    /// Unique request identifier for tracing.
    pub request_id: String,
}

/// The normalized outcome of one invocation.
///
/// Exactly one record is produced per invocation, for every outcome.
#[derive(Debug)]
pub struct InvocationRecord {
    /// Whether the handler settled with a value before the timer fired.
    pub success: bool,
    /// The handler's return value; present only on success.
    pub result: Option<Value>,
    /// The failure; present only when `success` is false.
    pub error: Option<AgentError>,
    /// Rendered captured output, including the final `[ERROR]` trace line on
    /// failure.
    pub logs: String,
    /// Wall-clock duration, measured to completion or to the failure point.
    pub execution_time_ms: u64,
    /// Approximate heap growth; zero on failure paths.
    pub memory_used_mb: u64,
}

impl InvocationRecord {
    fn completed(result: Value, logs: String, elapsed_ms: u64, memory_mb: u64) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
            logs,
            execution_time_ms: elapsed_ms,
            memory_used_mb: memory_mb,
        }
    }

    fn failed(error: AgentError, logs: String, elapsed_ms: u64) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error),
            logs,
            execution_time_ms: elapsed_ms,
            memory_used_mb: 0,
        }
    }
}

/// Timeout-supervised handler executor.
///
/// Thread-safe and shared across all control-plane requests. Each invocation
/// gets its own engine, scope, output sink, and cancel flag; the semaphore
/// bounds how many run at once (one permit serializes them).
pub struct Executor {
    builder: Arc<dyn EngineBuilder>,
    execution: ExecutionConfig,
    semaphore: Arc<Semaphore>,
}

impl Executor {
    /// Create a new executor.
    ///
    /// # Arguments
    ///
    /// * `builder` - Engine builder supplying the capability set
    /// * `execution` - Execution configuration (timeout default, concurrency)
    pub fn new(builder: Arc<dyn EngineBuilder>, execution: ExecutionConfig) -> Self {
        let permits = execution.max_concurrent_invocations.max(1);
        Self {
            builder,
            execution,
            semaphore: Arc::new(Semaphore::new(permits)),
        }
    }

    /// Memory limit reported to handlers, in megabytes.
    pub fn memory_limit_mb(&self) -> u64 {
        self.execution
            .memory_limit_mb
            .unwrap_or_else(resources::memory_limit_mb)
    }

    /// Run one invocation with the default timeout.
    pub async fn invoke(
        &self,
        func: Arc<CompiledFunction>,
        event: Value,
        request_id: String,
    ) -> InvocationRecord {
        self.invoke_with(
            func,
            event,
            InvokeOptions {
                timeout: self.execution.default_timeout(),
                request_id,
            },
        )
        .await
    }

    /// Run one invocation with explicit options.
    ///
    /// Never returns an error: every failure mode is folded into the record.
    #[instrument(
        skip(self, func, event, opts),
        fields(request_id = %opts.request_id, handler = %func.handler_name, version = func.version)
    )]
    pub async fn invoke_with(
        &self,
        func: Arc<CompiledFunction>,
        event: Value,
        opts: InvokeOptions,
    ) -> InvocationRecord {
        let Ok(_permit) = self.semaphore.acquire().await else {
            // The semaphore is never closed while the executor lives.
            return InvocationRecord::failed(
                AgentError::protocol("executor is shutting down"),
                String::new(),
                0,
            );
        };

        let sink = OutputSink::new();
        let cancel = CancelFlag::new();
        let hooks = InvocationHooks {
            sink: sink.clone(),
            cancel: cancel.clone(),
            env: func.env.clone(),
            request_id: opts.request_id.clone(),
        };

        let timeout_secs = opts.timeout.as_secs();
        let memory_limit_mb = self.memory_limit_mb();
        let recompile = self.execution.recompile_per_invocation;
        let builder = self.builder.clone();
        let task_func = func.clone();

        let started = Instant::now();
        let heap_before = resources::heap_resident_bytes();

        let task = tokio::task::spawn_blocking(move || {
            let engine = builder.build(&hooks);
            run_script(
                &engine,
                &task_func,
                &event,
                recompile,
                timeout_secs,
                memory_limit_mb,
                &hooks.request_id,
            )
        });

        match tokio::time::timeout(opts.timeout, task).await {
            Ok(Ok(Ok(value))) => {
                let elapsed_ms = elapsed_ms(started);
                let heap_after = resources::heap_resident_bytes();
                let memory_mb = resources::memory_delta_mb(heap_before, heap_after);

                info!(
                    duration_ms = elapsed_ms,
                    memory_used_mb = memory_mb,
                    log_lines = sink.len(),
                    "Invocation completed"
                );

                InvocationRecord::completed(value, sink.render(), elapsed_ms, memory_mb)
            }
            Ok(Ok(Err(err))) => {
                let elapsed_ms = elapsed_ms(started);
                sink.push_error(err.to_string());

                error!(
                    duration_ms = elapsed_ms,
                    error_kind = err.kind(),
                    error = %err,
                    "Invocation failed"
                );

                InvocationRecord::failed(err, sink.render(), elapsed_ms)
            }
            Ok(Err(join_err)) => {
                let elapsed_ms = elapsed_ms(started);
                let err =
                    AgentError::user_runtime(format!("execution thread panicked: {join_err}"));
                sink.push_error(err.to_string());

                error!(duration_ms = elapsed_ms, error = %err, "Invocation panicked");

                InvocationRecord::failed(err, sink.render(), elapsed_ms)
            }
            Err(_elapsed) => {
                // Timer won the race. Ask the still-running evaluation to
                // stop at its next progress checkpoint and discard whatever
                // it eventually produces.
                cancel.cancel();

                let elapsed_ms = elapsed_ms(started);
                let err = AgentError::timeout(timeout_secs);
                sink.push_error(err.to_string());

                warn!(
                    duration_ms = elapsed_ms,
                    timeout_secs, "Invocation timed out"
                );

                InvocationRecord::failed(err, sink.render(), elapsed_ms)
            }
        }
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field(
                "max_concurrent_invocations",
                &self.execution.max_concurrent_invocations,
            )
            .finish_non_exhaustive()
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Evaluate the function source and call the handler. Runs on a blocking
/// thread; everything it touches is owned by this invocation.
fn run_script(
    engine: &Engine,
    func: &CompiledFunction,
    event: &Value,
    recompile: bool,
    timeout_secs: u64,
    memory_limit_mb: u64,
    request_id: &str,
) -> Result<Value, AgentError> {
    // Isolation-freshness knob: recompile from source instead of reusing the
    // AST compiled at load time.
    let recompiled;
    let ast: &AST = if recompile {
        recompiled = engine
            .compile(&func.source)
            .map_err(|e| AgentError::load(e.to_string()))?;
        &recompiled
    } else {
        &func.ast
    };

    // Fresh scope per invocation; top-level statements run here, so their
    // output is captured and their bindings are visible to the handler.
    let mut scope = Scope::new();
    engine
        .eval_ast_with_scope::<Dynamic>(&mut scope, ast)
        .map_err(|e| map_eval_error(&e, timeout_secs))?;

    let event_dyn = to_dynamic(event)
        .map_err(|e| AgentError::user_runtime(format!("event is not representable: {e}")))?;
    let ctx_dyn = build_context(timeout_secs, memory_limit_mb, request_id);

    let output = call_handler(engine, &mut scope, ast, func, event_dyn, ctx_dyn, timeout_secs)?;

    from_dynamic::<Value>(&output).map_err(|e| {
        AgentError::user_runtime(format!("handler return value is not serializable: {e}"))
    })
}

/// Context object passed as the handler's second argument.
fn build_context(timeout_secs: u64, memory_limit_mb: u64, request_id: &str) -> Dynamic {
    let mut ctx = Map::new();
    ctx.insert(
        "memory_limit_mb".into(),
        Dynamic::from(memory_limit_mb as i64),
    );
    ctx.insert("timeout_seconds".into(), Dynamic::from(timeout_secs as i64));
    ctx.insert("request_id".into(), request_id.into());
    Dynamic::from(ctx)
}

/// Locate and call the handler.
///
/// Resolution order: a script function of the configured name in the
/// compiled source, then a top-level variable bound to a function pointer.
/// No fallback name guessing.
fn call_handler(
    engine: &Engine,
    scope: &mut Scope,
    ast: &AST,
    func: &CompiledFunction,
    event: Dynamic,
    ctx: Dynamic,
    timeout_secs: u64,
) -> Result<Dynamic, AgentError> {
    let name = func.handler_name.as_str();

    // Script functions carry their arity in metadata, so dispatch exactly.
    let arity = ast
        .iter_functions()
        .filter(|f| f.name == name)
        .map(|f| f.params.len())
        .max();

    if let Some(arity) = arity {
        let options = || CallFnOptions::new().eval_ast(false).rewind_scope(true);
        let result = match arity {
            0 => engine.call_fn_with_options::<Dynamic>(options(), scope, ast, name, ()),
            1 => engine.call_fn_with_options::<Dynamic>(options(), scope, ast, name, (event,)),
            2 => engine.call_fn_with_options::<Dynamic>(options(), scope, ast, name, (event, ctx)),
            n => {
                return Err(AgentError::user_runtime(format!(
                    "handler '{name}' takes {n} parameters; expected (event) or (event, context)"
                )));
            }
        };
        return result.map_err(|e| map_eval_error(&e, timeout_secs));
    }

    // Top-level `let handler = |event| ...` binding.
    if let Some(fn_ptr) = scope.get_value::<FnPtr>(name) {
        return call_fn_ptr(engine, ast, &fn_ptr, event, ctx, timeout_secs);
    }

    Err(AgentError::handler_not_found(name))
}

/// Call a function-pointer handler, trying `(event, context)` first and
/// falling back to `(event)` on arity mismatch (closures do not expose their
/// arity up front).
fn call_fn_ptr(
    engine: &Engine,
    ast: &AST,
    fn_ptr: &FnPtr,
    event: Dynamic,
    ctx: Dynamic,
    timeout_secs: u64,
) -> Result<Dynamic, AgentError> {
    match fn_ptr.call::<Dynamic>(engine, ast, (event.clone(), ctx)) {
        Ok(value) => Ok(value),
        Err(e) if is_arity_mismatch(&e, fn_ptr.fn_name()) => fn_ptr
            .call::<Dynamic>(engine, ast, (event,))
            .map_err(|e| map_eval_error(&e, timeout_secs)),
        Err(e) => Err(map_eval_error(&e, timeout_secs)),
    }
}

/// True if the error is a signature mismatch on the named function itself
/// rather than a failure inside its body.
fn is_arity_mismatch(err: &EvalAltResult, fn_name: &str) -> bool {
    matches!(err, EvalAltResult::ErrorFunctionNotFound(sig, _) if sig.starts_with(fn_name))
}

/// Map an engine evaluation error into the agent taxonomy. A terminated
/// evaluation means the cancel flag fired, which only happens on timeout.
fn map_eval_error(err: &EvalAltResult, timeout_secs: u64) -> AgentError {
    if matches!(err, EvalAltResult::ErrorTerminated(..)) {
        AgentError::timeout(timeout_secs)
    } else {
        AgentError::user_runtime(err.to_string())
    }
}
