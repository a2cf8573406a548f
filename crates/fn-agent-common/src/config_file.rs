//! Configuration file structures for the function agent.
//!
//! This module defines structures for TOML configuration files:
//! - [`ConfigFile`]: Top-level configuration file structure
//! - [`ServerConfigFile`]: HTTP server settings
//! - [`FunctionEntry`]: Optional function to pre-load at startup

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::AgentConfig;

/// Top-level configuration file structure.
///
/// This structure represents a complete TOML configuration file
/// that can be loaded at startup.
///
/// # Example
///
/// ```toml
/// [agent.engine]
/// max_call_levels = 64
///
/// [agent.execution]
/// default_timeout_secs = 30
/// max_concurrent_invocations = 16
///
/// [server]
/// bind_addr = "0.0.0.0:8080"
/// request_timeout_secs = 300
///
/// [function]
/// path = "./handler.rhai"
/// handler = "handler"
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConfigFile {
    /// Agent configuration (engine + execution settings).
    #[serde(default)]
    pub agent: AgentConfig,

    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfigFile,

    /// Function to pre-load at startup.
    ///
    /// Normally the orchestrator loads the function over `/load`; this is a
    /// local-development convenience.
    #[serde(default)]
    pub function: Option<FunctionEntry>,
}

impl ConfigFile {
    /// Load configuration from a TOML file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the TOML configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigFileError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigFileError::Io {
            path: path.as_ref().display().to_string(),
            source: e,
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string cannot be parsed as TOML.
    pub fn from_toml(content: &str) -> Result<Self, ConfigFileError> {
        toml::from_str(content).map_err(|e| ConfigFileError::Parse {
            message: e.to_string(),
        })
    }
}

/// HTTP server configuration from config file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfigFile {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "defaults::bind_addr")]
    pub bind_addr: String,

    /// Request timeout in seconds.
    ///
    /// This bounds the whole HTTP exchange and therefore caps the largest
    /// usable invocation `timeout_seconds`.
    #[serde(default = "defaults::request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Enable graceful shutdown.
    #[serde(default = "defaults::graceful_shutdown")]
    pub graceful_shutdown: bool,
}

impl Default for ServerConfigFile {
    fn default() -> Self {
        Self {
            bind_addr: defaults::bind_addr(),
            request_timeout_secs: defaults::request_timeout_secs(),
            graceful_shutdown: defaults::graceful_shutdown(),
        }
    }
}

/// A function to load at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FunctionEntry {
    /// Path to the function source file.
    pub path: String,

    /// Handler name to invoke.
    #[serde(default = "defaults::handler_name")]
    pub handler: String,

    /// Environment variables for the function.
    #[serde(default)]
    pub env_vars: HashMap<String, String>,
}

/// Configuration file errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("Failed to parse config file: {message}")]
    Parse { message: String },
}

/// Default value functions for serde.
mod defaults {
    pub fn bind_addr() -> String {
        "0.0.0.0:8080".to_string()
    }

    pub const fn request_timeout_secs() -> u64 {
        300
    }

    pub const fn graceful_shutdown() -> bool {
        true
    }

    pub fn handler_name() -> String {
        "handler".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_file() {
        let config = ConfigFile::default();

        assert_eq!(config.server.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.server.request_timeout_secs, 300);
        assert!(config.server.graceful_shutdown);
        assert!(config.function.is_none());
    }

    #[test]
    fn test_parse_minimal_config() {
        let toml = r#"
            [server]
            bind_addr = "127.0.0.1:3000"
        "#;

        let config = ConfigFile::from_toml(toml).unwrap();

        assert_eq!(config.server.bind_addr, "127.0.0.1:3000");
        // Defaults applied
        assert_eq!(config.server.request_timeout_secs, 300);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [agent.engine]
            max_call_levels = 32
            max_operations = 1000000

            [agent.execution]
            default_timeout_secs = 10
            max_concurrent_invocations = 1
            recompile_per_invocation = true

            [server]
            bind_addr = "0.0.0.0:9000"
            request_timeout_secs = 60
            graceful_shutdown = false

            [function]
            path = "./echo.rhai"
            handler = "main"

            [function.env_vars]
            STAGE = "dev"
        "#;

        let config = ConfigFile::from_toml(toml).unwrap();

        assert_eq!(config.agent.engine.max_call_levels, 32);
        assert_eq!(config.agent.engine.max_operations, 1_000_000);
        assert_eq!(config.agent.execution.default_timeout_secs, 10);
        assert_eq!(config.agent.execution.max_concurrent_invocations, 1);
        assert!(config.agent.execution.recompile_per_invocation);
        assert_eq!(config.server.bind_addr, "0.0.0.0:9000");
        assert!(!config.server.graceful_shutdown);

        let function = config.function.unwrap();
        assert_eq!(function.path, "./echo.rhai");
        assert_eq!(function.handler, "main");
        assert_eq!(function.env_vars.get("STAGE").unwrap(), "dev");
    }

    #[test]
    fn test_function_entry_default_handler() {
        let toml = r#"
            [function]
            path = "./fn.rhai"
        "#;

        let config = ConfigFile::from_toml(toml).unwrap();
        let function = config.function.unwrap();

        assert_eq!(function.handler, "handler");
        assert!(function.env_vars.is_empty());
    }

    #[test]
    fn test_parse_invalid_toml() {
        let invalid = "this is not valid toml [";
        let result = ConfigFile::from_toml(invalid);
        assert!(result.is_err());
    }
}
