//! Capability-based security for host functions.
//!
//! This module provides the [`Capabilities`] struct, which defines what
//! host functions a guest script is allowed to call.

/// Capability configuration for a function execution.
///
/// Each flag gates the registration of a host function group. A capability
/// that is not granted is not merely denied at call time; the corresponding
/// function is never registered, so the guest cannot even name it.
///
/// # Security Philosophy
///
/// We follow the principle of least privilege:
/// - By default, nothing is allowed
/// - Each capability must be explicitly granted
/// - Capabilities are immutable during execution
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    /// Enable output capture (`print`/`debug`).
    pub logging_enabled: bool,

    /// Enable `env(name)` access to the loaded function's environment.
    pub env_enabled: bool,

    /// Enable `sleep(ms)`.
    pub timers_enabled: bool,

    /// Maximum single `sleep` duration in milliseconds.
    pub max_sleep_ms: u64,

    /// Enable `process_info()`.
    pub process_info_enabled: bool,
}

impl Capabilities {
    /// Create a capability set with everything disabled.
    pub fn none() -> Self {
        Self::default()
    }

    /// Create a capability set with everything enabled.
    ///
    /// This is the standard set for a deployed function: the agent already
    /// runs one tenant per process, so all invocation-scoped capabilities
    /// are safe to grant.
    pub fn all() -> Self {
        Self {
            logging_enabled: true,
            env_enabled: true,
            timers_enabled: true,
            max_sleep_ms: 10_000,
            process_info_enabled: true,
        }
    }

    /// Create a builder for constructing capabilities.
    pub fn builder() -> CapabilitiesBuilder {
        CapabilitiesBuilder::default()
    }
}

/// Builder for [`Capabilities`].
#[derive(Debug, Default)]
pub struct CapabilitiesBuilder {
    inner: Capabilities,
}

impl CapabilitiesBuilder {
    /// Enable output capture.
    #[must_use]
    pub fn enable_logging(mut self) -> Self {
        self.inner.logging_enabled = true;
        self
    }

    /// Enable environment access.
    #[must_use]
    pub fn enable_env(mut self) -> Self {
        self.inner.env_enabled = true;
        self
    }

    /// Enable `sleep` with the given per-call cap in milliseconds.
    #[must_use]
    pub fn enable_timers(mut self, max_sleep_ms: u64) -> Self {
        self.inner.timers_enabled = true;
        self.inner.max_sleep_ms = max_sleep_ms;
        self
    }

    /// Enable `process_info`.
    #[must_use]
    pub fn enable_process_info(mut self) -> Self {
        self.inner.process_info_enabled = true;
        self
    }

    /// Build the capabilities.
    #[must_use]
    pub fn build(self) -> Capabilities {
        self.inner
    }
}
