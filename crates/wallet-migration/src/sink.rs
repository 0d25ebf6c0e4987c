//! Progress message sinks
//!
//! The caller owns the sink and passes it to the [`crate::Migrator`]. The
//! engine never writes to ambient global state.

use parking_lot::Mutex;
use std::sync::mpsc;

/// Receives human-readable progress lines, in order
pub trait MessageSink {
    /// Deliver one line. Blank lines are meaningful separators.
    fn emit(&self, line: &str);
}

impl<K: MessageSink + ?Sized> MessageSink for &K {
    fn emit(&self, line: &str) {
        (**self).emit(line)
    }
}

impl<K: MessageSink + ?Sized> MessageSink for Box<K> {
    fn emit(&self, line: &str) {
        (**self).emit(line)
    }
}

impl<K: MessageSink + ?Sized> MessageSink for std::sync::Arc<K> {
    fn emit(&self, line: &str) {
        (**self).emit(line)
    }
}

/// Forwards lines over a channel. A dropped receiver silently discards lines.
impl MessageSink for mpsc::Sender<String> {
    fn emit(&self, line: &str) {
        let _ = self.send(line.to_string());
    }
}

/// Adapts a closure into a sink
pub struct CallbackSink<F>(pub F);

impl<F: Fn(&str)> MessageSink for CallbackSink<F> {
    fn emit(&self, line: &str) {
        (self.0)(line)
    }
}

/// Buffers every line in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the lines received so far
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// True if any received line contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|line| line.contains(needle))
    }
}

impl MessageSink for MemorySink {
    fn emit(&self, line: &str) {
        self.lines.lock().push(line.to_string());
    }
}

/// Mirrors lines into `tracing` at info level, skipping blank separators
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl MessageSink for TracingSink {
    fn emit(&self, line: &str) {
        if !line.trim().is_empty() {
            tracing::info!(target: "wallet_migration::progress", "{}", line);
        }
    }
}

/// Delivers every line to both sinks, first then second
#[derive(Debug, Default, Clone)]
pub struct TeeSink<A, B>(pub A, pub B);

impl<A: MessageSink, B: MessageSink> MessageSink for TeeSink<A, B> {
    fn emit(&self, line: &str) {
        self.0.emit(line);
        self.1.emit(line);
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl MessageSink for NullSink {
    fn emit(&self, _line: &str) {}
}
