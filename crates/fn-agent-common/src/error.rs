//! Error types for the function agent.
//!
//! This module defines [`AgentError`], the taxonomy of everything that can go
//! wrong between accepting a control-plane request and producing an
//! invocation result. The `Display` form of each variant is exactly the
//! `error` string placed on the wire (`Kind: message`), so handlers can call
//! `to_string()` and get the contract format.

use thiserror::Error;

/// Errors produced while loading or invoking a function.
///
/// User-code failures (`Load`, `HandlerNotFound`, `UserRuntime`, `Timeout`,
/// `NoFunctionLoaded`) are recovered into a structured result and never
/// escape the control-plane server. `Protocol` maps to an HTTP 500 envelope.
/// No variant causes process exit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// The function source failed to parse or compile.
    #[error("LoadError: {reason}")]
    Load {
        /// Description of the compile failure, including position info.
        reason: String,
    },

    /// The configured handler is not defined by the evaluated source.
    #[error("HandlerNotFoundError: handler function '{handler}' not found in code")]
    HandlerNotFound {
        /// The handler name that was looked up.
        handler: String,
    },

    /// The handler raised an error during execution.
    #[error("UserRuntimeError: {message}")]
    UserRuntime {
        /// The raised error, rendered with position info where available.
        message: String,
    },

    /// The timeout timer fired before the handler settled.
    #[error("TimeoutError: function execution exceeded {timeout_secs} seconds")]
    Timeout {
        /// The configured timeout in seconds.
        timeout_secs: u64,
    },

    /// An invocation arrived before any function was loaded.
    #[error("No function code loaded")]
    NoFunctionLoaded,

    /// Malformed request at the control-plane boundary.
    #[error("ProtocolError: {reason}")]
    Protocol {
        /// Description of what was wrong with the request.
        reason: String,
    },

    /// Invalid agent configuration.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },
}

impl AgentError {
    /// Create a new `Load` error.
    pub fn load(reason: impl Into<String>) -> Self {
        Self::Load {
            reason: reason.into(),
        }
    }

    /// Create a new `HandlerNotFound` error.
    pub fn handler_not_found(handler: impl Into<String>) -> Self {
        Self::HandlerNotFound {
            handler: handler.into(),
        }
    }

    /// Create a new `UserRuntime` error.
    pub fn user_runtime(message: impl Into<String>) -> Self {
        Self::UserRuntime {
            message: message.into(),
        }
    }

    /// Create a new `Timeout` error.
    pub fn timeout(timeout_secs: u64) -> Self {
        Self::Timeout { timeout_secs }
    }

    /// Create a new `Protocol` error.
    pub fn protocol(reason: impl Into<String>) -> Self {
        Self::Protocol {
            reason: reason.into(),
        }
    }

    /// Create a new `InvalidConfig` error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Short kind tag for logging and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Load { .. } => "LoadError",
            Self::HandlerNotFound { .. } => "HandlerNotFoundError",
            Self::UserRuntime { .. } => "UserRuntimeError",
            Self::Timeout { .. } => "TimeoutError",
            Self::NoFunctionLoaded => "NoFunctionLoaded",
            Self::Protocol { .. } => "ProtocolError",
            Self::InvalidConfig { .. } => "InvalidConfig",
        }
    }

    /// Returns `true` if this error indicates the timeout timer fired.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` if the failure originates in user code or its
    /// configuration rather than in the agent itself.
    ///
    /// User failures are reported with HTTP 200 and `success = false`;
    /// everything else is a control-plane fault.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Load { .. }
                | Self::HandlerNotFound { .. }
                | Self::UserRuntime { .. }
                | Self::Timeout { .. }
                | Self::NoFunctionLoaded
        )
    }
}
