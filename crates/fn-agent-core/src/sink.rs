//! Per-invocation captured guest output.
//!
//! This module provides:
//! - [`OutputSink`]: An ordered, invocation-scoped buffer of output lines
//! - [`LogLine`] and [`StreamTag`]: A single captured line and its origin
//!
//! Each invocation owns exactly one sink; the engine built for that
//! invocation appends to it and nothing else ever does. This is what makes
//! the no-cross-invocation-leak invariant hold without any global state.

use std::sync::Arc;

use parking_lot::Mutex;

/// Origin of a captured output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamTag {
    /// Guest standard output (`print`).
    Stdout,
    /// Guest standard error (`debug`).
    Stderr,
    /// The final failure trace appended by the supervisor.
    Error,
}

impl std::fmt::Display for StreamTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamTag::Stdout => write!(f, "STDOUT"),
            StreamTag::Stderr => write!(f, "STDERR"),
            StreamTag::Error => write!(f, "ERROR"),
        }
    }
}

/// A single captured output line.
#[derive(Debug, Clone)]
pub struct LogLine {
    /// Which stream the line came from.
    pub tag: StreamTag,
    /// Line content as emitted by the guest.
    pub message: String,
}

/// Ordered buffer of output lines for one invocation.
///
/// Cheaply cloneable; clones share the same buffer. The engine's print and
/// debug hooks hold one clone, the supervisor holds another.
#[derive(Debug, Clone, Default)]
pub struct OutputSink {
    lines: Arc<Mutex<Vec<LogLine>>>,
}

impl OutputSink {
    /// Create a new empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line with the given tag.
    pub fn push(&self, tag: StreamTag, message: impl Into<String>) {
        self.lines.lock().push(LogLine {
            tag,
            message: message.into(),
        });
    }

    /// Append a standard-output line.
    pub fn push_stdout(&self, message: impl Into<String>) {
        self.push(StreamTag::Stdout, message);
    }

    /// Append a standard-error line.
    pub fn push_stderr(&self, message: impl Into<String>) {
        self.push(StreamTag::Stderr, message);
    }

    /// Append the final failure trace.
    pub fn push_error(&self, message: impl Into<String>) {
        self.push(StreamTag::Error, message);
    }

    /// Number of captured lines.
    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    /// Returns `true` if nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }

    /// Snapshot of the captured lines in emission order.
    pub fn lines(&self) -> Vec<LogLine> {
        self.lines.lock().clone()
    }

    /// Render the buffer into the wire format: one `[TAG] message` entry per
    /// line, joined with newlines. An empty buffer renders as `""`.
    pub fn render(&self) -> String {
        self.lines
            .lock()
            .iter()
            .map(|line| format!("[{}] {}", line.tag, line.message))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
