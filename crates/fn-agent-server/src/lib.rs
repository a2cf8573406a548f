//! HTTP control plane for fn-agent.
//!
//! This crate provides the HTTP interface the orchestrator uses to drive
//! one agent. It handles:
//!
//! - Liveness and readiness probes
//! - Loading (and wholesale replacing) the resident function
//! - Running invocations and returning their results
//!
//! User-code failures are encoded in the JSON result with HTTP 200; HTTP
//! error statuses are reserved for control-plane faults (malformed bodies,
//! unknown routes).
//!
//! # Quick Start
//!
//! ```ignore
//! use fn_agent_server::{AgentServer, ServerConfig};
//! use fn_agent_common::AgentConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let agent_config = AgentConfig::default();
//!     let server_config = ServerConfig::default();
//!
//!     let server = AgentServer::new(&agent_config, server_config);
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod handler;
pub mod protocol;
pub mod router;
pub mod server;
pub mod state;

pub use server::{AgentServer, ServerConfig};
pub use state::AppState;
