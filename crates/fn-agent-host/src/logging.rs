//! Output capture host functions.
//!
//! This module wires the engine's `print` and `debug` hooks into the
//! invocation's output buffer, so everything a guest emits is:
//! 1. Captured in the invocation's sink for the response `logs` field
//! 2. Mirrored via the `tracing` crate for observability
//!
//! When the logging capability is not granted, the hooks are replaced with
//! no-ops: guest output is swallowed rather than leaking to the host's own
//! stdout.

use rhai::Engine;
use tracing::debug;

use fn_agent_core::engine::InvocationHooks;

use crate::capabilities::Capabilities;

/// Attach output hooks to an engine for one invocation.
///
/// `print(...)` lines are captured as standard output, `debug(...)` lines
/// as standard error.
pub fn attach(engine: &mut Engine, caps: &Capabilities, hooks: &InvocationHooks) {
    if !caps.logging_enabled {
        engine.on_print(|_| {});
        engine.on_debug(|_, _, _| {});
        return;
    }

    let sink = hooks.sink.clone();
    let request_id = hooks.request_id.clone();
    engine.on_print(move |text| {
        sink.push_stdout(text);
        debug!(request_id = %request_id, guest_log = true, "{}", text);
    });

    let sink = hooks.sink.clone();
    let request_id = hooks.request_id.clone();
    engine.on_debug(move |text, _source, _pos| {
        sink.push_stderr(text);
        debug!(request_id = %request_id, guest_log = true, guest_stream = "stderr", "{}", text);
    });
}
