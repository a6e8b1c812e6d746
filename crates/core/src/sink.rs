// crates/core/src/sink.rs
//! The output channel back to a request's client.
//!
//! Every task working on a request (coordinator, work unit, checker) writes
//! through the same [`SharedSink`]. Implementations serialize writes so each
//! `write` call lands atomically, and writing is best-effort: a failed write
//! is logged and dropped, never propagated to the writer.

use std::sync::{Arc, Mutex};

use crate::error::SinkError;

/// A synchronized, best-effort response stream.
pub trait ResponseSink: Send + Sync {
    /// Append `text` to the stream as a single atomic write.
    fn try_write(&self, text: &str) -> Result<(), SinkError>;

    /// Signal that no further writes will occur. Idempotent.
    fn complete(&self);

    /// Append `text`, discarding any failure.
    fn write(&self, text: &str) {
        if let Err(e) = self.try_write(text) {
            tracing::debug!(error = %e, bytes = text.len(), "Dropped response write");
        }
    }
}

/// Sink handle shared between the tasks serving one request.
pub type SharedSink = Arc<dyn ResponseSink>;

/// In-memory sink that captures everything written to it.
///
/// Writes after [`complete`](ResponseSink::complete) are rejected with
/// [`SinkError::Closed`], mirroring a finished HTTP response.
#[derive(Debug, Default)]
pub struct MemorySink {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    buf: String,
    writes: usize,
    complete_calls: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor returning both the typed sink (for
    /// inspection) and the erased handle (for the coordinator).
    pub fn shared() -> (Arc<Self>, SharedSink) {
        let sink = Arc::new(Self::new());
        let shared: SharedSink = sink.clone();
        (sink, shared)
    }

    /// Everything written so far.
    pub fn contents(&self) -> String {
        match self.inner.lock() {
            Ok(inner) => inner.buf.clone(),
            Err(e) => {
                tracing::error!("Mutex poisoned reading memory sink: {e}");
                String::new()
            }
        }
    }

    /// Number of accepted writes.
    pub fn writes(&self) -> usize {
        self.inner.lock().map(|inner| inner.writes).unwrap_or(0)
    }

    /// Whether `complete()` has been called at least once.
    pub fn is_complete(&self) -> bool {
        self.complete_calls() > 0
    }

    /// Number of times `complete()` was called.
    pub fn complete_calls(&self) -> usize {
        self.inner
            .lock()
            .map(|inner| inner.complete_calls)
            .unwrap_or(0)
    }
}

impl ResponseSink for MemorySink {
    fn try_write(&self, text: &str) -> Result<(), SinkError> {
        let mut inner = self.inner.lock().map_err(|_| SinkError::Poisoned)?;
        if inner.complete_calls > 0 {
            return Err(SinkError::Closed);
        }
        inner.buf.push_str(text);
        inner.writes += 1;
        Ok(())
    }

    fn complete(&self) {
        match self.inner.lock() {
            Ok(mut inner) => inner.complete_calls += 1,
            Err(e) => tracing::error!("Mutex poisoned completing memory sink: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_captures_writes() {
        let sink = MemorySink::new();
        sink.write("hello ");
        sink.write("world");
        assert_eq!(sink.contents(), "hello world");
        assert_eq!(sink.writes(), 2);
        assert!(!sink.is_complete());
    }

    #[test]
    fn test_writes_after_complete_are_dropped() {
        let sink = MemorySink::new();
        sink.write("before");
        sink.complete();
        assert_eq!(sink.try_write("after"), Err(SinkError::Closed));
        // `write` swallows the failure.
        sink.write("after");
        assert_eq!(sink.contents(), "before");
    }

    #[test]
    fn test_complete_is_counted() {
        let sink = MemorySink::new();
        sink.complete();
        sink.complete();
        assert!(sink.is_complete());
        assert_eq!(sink.complete_calls(), 2);
    }

    #[test]
    fn test_concurrent_writes_never_interleave() {
        let (sink, shared) = MemorySink::shared();
        let threads: Vec<_> = ["aaaa", "bbbb", "cccc", "dddd"]
            .into_iter()
            .map(|chunk| {
                let shared = Arc::clone(&shared);
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        shared.write(chunk);
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }

        let contents = sink.contents();
        assert_eq!(contents.len(), 4 * 4 * 200);
        for chunk in contents.as_bytes().chunks(4) {
            assert!(
                chunk.iter().all(|b| *b == chunk[0]),
                "interleaved write: {:?}",
                String::from_utf8_lossy(chunk)
            );
        }
    }
}
