//! Host function registration.
//!
//! This module provides [`CapabilityEngineBuilder`], the host's
//! implementation of the core crate's engine-builder seam. For every
//! invocation it constructs the baseline sandboxed engine and registers the
//! granted capability functions on it, each one capturing only state owned
//! by that invocation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rhai::{Dynamic, Engine, Map};

use fn_agent_common::{AgentConfig, EngineConfig};
use fn_agent_core::engine::{EngineBuilder, InvocationHooks, base_engine};

use crate::capabilities::Capabilities;
use crate::logging;

/// Engine builder that layers granted capabilities on the baseline sandbox.
#[derive(Debug, Clone)]
pub struct CapabilityEngineBuilder {
    caps: Capabilities,
    engine_config: EngineConfig,
}

impl CapabilityEngineBuilder {
    /// Create a builder with the given capability set.
    pub fn new(caps: Capabilities, engine_config: EngineConfig) -> Self {
        Self {
            caps,
            engine_config,
        }
    }

    /// The capability set this builder grants.
    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }
}

impl EngineBuilder for CapabilityEngineBuilder {
    fn build(&self, hooks: &InvocationHooks) -> Engine {
        let mut engine = base_engine(&self.engine_config, &hooks.cancel);

        logging::attach(&mut engine, &self.caps, hooks);

        if self.caps.env_enabled {
            register_env(&mut engine, hooks.env.clone());
        }
        if self.caps.timers_enabled {
            register_timers(&mut engine, self.caps.max_sleep_ms);
        }
        if self.caps.process_info_enabled {
            register_process_info(&mut engine, hooks.request_id.clone());
        }

        engine
    }
}

/// Register `env(name)`: look up a variable in the loaded function's
/// environment snapshot. Returns unit for unknown names.
///
/// The snapshot is the only environment guests ever see; the agent process
/// environment is not exposed.
fn register_env(engine: &mut Engine, env: Arc<HashMap<String, String>>) {
    engine.register_fn("env", move |name: &str| -> Dynamic {
        env.get(name)
            .map_or(Dynamic::UNIT, |value| value.clone().into())
    });
}

/// Register `sleep(ms)`, capped per call.
///
/// Sleeping counts against the invocation's wall-clock timeout like any
/// other guest work.
fn register_timers(engine: &mut Engine, max_sleep_ms: u64) {
    engine.register_fn("sleep", move |ms: i64| {
        let ms = u64::try_from(ms).unwrap_or(0).min(max_sleep_ms);
        std::thread::sleep(Duration::from_millis(ms));
    });
}

/// Register `process_info()`: pid and request id of the current invocation.
fn register_process_info(engine: &mut Engine, request_id: String) {
    engine.register_fn("process_info", move || -> Map {
        let mut info = Map::new();
        info.insert("pid".into(), Dynamic::from(i64::from(std::process::id())));
        info.insert("request_id".into(), request_id.clone().into());
        info
    });
}

/// Construct the standard engine builder for a configured agent.
///
/// All capabilities are granted: the agent runs exactly one tenant, so the
/// capability set exists to scope host functions per invocation, not to
/// separate tenants.
pub fn create_engine_builder(config: &AgentConfig) -> Arc<dyn EngineBuilder> {
    Arc::new(CapabilityEngineBuilder::new(
        Capabilities::all(),
        config.engine.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fn_agent_core::engine::CancelFlag;
    use fn_agent_core::sink::OutputSink;

    fn hooks_with_env(pairs: &[(&str, &str)]) -> InvocationHooks {
        let env = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        InvocationHooks {
            sink: OutputSink::new(),
            cancel: CancelFlag::new(),
            env: Arc::new(env),
            request_id: "test-registry".into(),
        }
    }

    fn build(caps: Capabilities, hooks: &InvocationHooks) -> Engine {
        CapabilityEngineBuilder::new(caps, EngineConfig::default()).build(hooks)
    }

    #[test]
    fn test_env_lookup() {
        let hooks = hooks_with_env(&[("STAGE", "prod")]);
        let engine = build(Capabilities::all(), &hooks);

        let value = engine.eval::<String>(r#"env("STAGE")"#).unwrap();
        assert_eq!(value, "prod");
    }

    #[test]
    fn test_env_unknown_name_is_unit() {
        let hooks = hooks_with_env(&[]);
        let engine = build(Capabilities::all(), &hooks);

        let is_unit = engine.eval::<bool>(r#"env("MISSING") == ()"#).unwrap();
        assert!(is_unit);
    }

    #[test]
    fn test_env_denied_without_capability() {
        let hooks = hooks_with_env(&[("STAGE", "prod")]);
        let engine = build(Capabilities::none(), &hooks);

        let result = engine.eval::<String>(r#"env("STAGE")"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_process_info_fields() {
        let hooks = hooks_with_env(&[]);
        let engine = build(Capabilities::all(), &hooks);

        let request_id = engine
            .eval::<String>("process_info().request_id")
            .unwrap();
        assert_eq!(request_id, "test-registry");

        let pid = engine.eval::<i64>("process_info().pid").unwrap();
        assert!(pid > 0);
    }

    #[test]
    fn test_sleep_capped() {
        let hooks = hooks_with_env(&[]);
        let caps = Capabilities::builder().enable_timers(10).build();
        let engine = build(caps, &hooks);

        let started = std::time::Instant::now();
        engine.run("sleep(5000)").unwrap();
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_print_goes_to_sink() {
        let hooks = hooks_with_env(&[]);
        let engine = build(Capabilities::all(), &hooks);

        engine.run(r#"print("captured")"#).unwrap();
        assert_eq!(hooks.sink.render(), "[STDOUT] captured");
    }
}
