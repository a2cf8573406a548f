//! Common types, errors, and utilities for fn-agent.
//!
//! This crate provides shared functionality used across the fn-agent workspace:
//! - Error types using `thiserror` for type-safe error handling
//! - Configuration structures for agent settings
//! - TOML configuration file loading

pub mod config;
pub mod config_file;
pub mod error;

pub use config::{AgentConfig, EngineConfig, ExecutionConfig};
pub use config_file::{ConfigFile, ConfigFileError, FunctionEntry, ServerConfigFile};
pub use error::AgentError;
