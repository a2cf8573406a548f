//! Core execution runtime for fn-agent.
//!
//! This crate provides the fundamental function execution capabilities:
//! - [`engine`]: Sandboxed script engine construction and compilation
//! - [`FunctionSlot`]: The single resident loaded function
//! - [`OutputSink`]: Per-invocation captured guest output
//! - [`Executor`]: Timeout-supervised invocation of the loaded handler
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    FunctionSlot                         │
//! │  (One resident function, replaced wholesale by /load)   │
//! │  - compiled AST + handler name + env snapshot           │
//! └─────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                      Executor                           │
//! │  (Per-invocation, races the handler against a timer)    │
//! │  - fresh engine via EngineBuilder                       │
//! │  - own OutputSink, own cancellation flag                │
//! │  - resource accounting (wall clock + heap delta)        │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Every invocation builds its own engine and output sink, so concurrent
//! invocations cannot observe each other's logs or state.

pub mod engine;
pub mod executor;
pub mod function;
pub mod resources;
pub mod sink;

pub use engine::{CancelFlag, EngineBuilder, InvocationHooks};
pub use executor::{Executor, InvocationRecord, InvokeOptions};
pub use function::{CompiledFunction, DEFAULT_HANDLER, FunctionSlot, FunctionSpec};
pub use sink::{LogLine, OutputSink, StreamTag};
