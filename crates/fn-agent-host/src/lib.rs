//! Host capability implementations for fn-agent.
//!
//! This crate provides the host-side functions that guest scripts can call.
//! Guest code runs in a closed-world engine; every interaction with the
//! outside world goes through a function registered here.
//!
//! # Capabilities
//!
//! - [`logging`]: `print`/`debug` capture into the invocation's output buffer
//! - [`registry`]: `env`, `sleep`, and `process_info` host functions
//! - [`capabilities`]: The allow-list deciding which of the above exist
//!
//! # Security Model
//!
//! All host functions follow the principle of least privilege:
//!
//! 1. **Capabilities**: A function only exists in the engine if its
//!    capability is granted; ungranted calls fail at the call site.
//! 2. **Invocation scoping**: Host functions capture only state owned by
//!    the current invocation, never shared mutable state.

pub mod capabilities;
pub mod logging;
pub mod registry;

pub use capabilities::Capabilities;
pub use registry::{CapabilityEngineBuilder, create_engine_builder};
