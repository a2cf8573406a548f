//! Configuration structures for the function agent.
//!
//! This module defines configuration options for the agent's components:
//! - [`AgentConfig`]: Top-level configuration containing all settings
//! - [`EngineConfig`]: Script engine safety limits
//! - [`ExecutionConfig`]: Per-invocation execution settings (timeout, concurrency)

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level agent configuration.
///
/// This structure contains all configuration options for the agent.
/// It can be loaded from a TOML file or constructed programmatically.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AgentConfig {
    /// Script engine configuration.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Per-invocation execution configuration.
    #[serde(default)]
    pub execution: ExecutionConfig,
}

/// Script engine safety limits.
///
/// These settings bound what a single evaluation is allowed to do inside the
/// engine, independent of the wall-clock timeout.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Maximum depth of nested function calls.
    #[serde(default = "defaults::max_call_levels")]
    pub max_call_levels: usize,

    /// Maximum depth of expression nesting at parse time.
    #[serde(default = "defaults::max_expr_depth")]
    pub max_expr_depth: usize,

    /// Maximum number of engine operations per evaluation.
    ///
    /// Zero means unbounded; the wall-clock timeout still applies.
    #[serde(default = "defaults::max_operations")]
    pub max_operations: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_call_levels: defaults::max_call_levels(),
            max_expr_depth: defaults::max_expr_depth(),
            max_operations: defaults::max_operations(),
        }
    }
}

/// Per-invocation execution configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExecutionConfig {
    /// Default invocation timeout in seconds.
    ///
    /// Applied when the invoke request does not carry `timeout_seconds`.
    #[serde(default = "defaults::default_timeout_secs")]
    pub default_timeout_secs: u64,

    /// Maximum number of invocations running at the same time.
    ///
    /// Each invocation gets its own engine, so concurrent execution is safe;
    /// set this to 1 to serialize invocations instead.
    #[serde(default = "defaults::max_concurrent_invocations")]
    pub max_concurrent_invocations: usize,

    /// Recompile the function source on every invocation.
    ///
    /// By default the source is compiled once per load and the compiled form
    /// is shared; top-level statements still re-run per invocation. Enabling
    /// this trades compile cost for a from-source parse each time.
    #[serde(default)]
    pub recompile_per_invocation: bool,

    /// Memory limit reported to handlers, in megabytes.
    ///
    /// When unset, the limit is probed from cgroup/system memory at startup.
    #[serde(default)]
    pub memory_limit_mb: Option<u64>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: defaults::default_timeout_secs(),
            max_concurrent_invocations: defaults::max_concurrent_invocations(),
            recompile_per_invocation: false,
            memory_limit_mb: None,
        }
    }
}

impl ExecutionConfig {
    /// Get the default timeout as a `Duration`.
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }
}

/// Default value functions for serde.
mod defaults {
    pub const fn max_call_levels() -> usize {
        64
    }

    pub const fn max_expr_depth() -> usize {
        64
    }

    pub const fn max_operations() -> u64 {
        0
    }

    pub const fn default_timeout_secs() -> u64 {
        30
    }

    pub const fn max_concurrent_invocations() -> usize {
        16
    }
}
