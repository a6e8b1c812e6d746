// crates/server/src/sink.rs
//! Response sink backed by a streaming HTTP body.

use std::convert::Infallible;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use baton_core::{ResponseSink, SharedSink, SinkError};
use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;

/// Forwards each write as one body chunk; `complete()` ends the body.
///
/// The sender sits behind a mutex so writes from the coordinator, work unit
/// and checker are ordered and a write can never race with completion.
pub struct StreamSink {
    tx: Mutex<Option<mpsc::UnboundedSender<Bytes>>>,
}

impl StreamSink {
    /// Create a sink and the response body it feeds.
    pub fn channel() -> (SharedSink, Body) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink: SharedSink = Arc::new(Self {
            tx: Mutex::new(Some(tx)),
        });
        let stream = UnboundedReceiverStream::new(rx).map(Ok::<_, Infallible>);
        (sink, Body::from_stream(stream))
    }
}

impl ResponseSink for StreamSink {
    fn try_write(&self, text: &str) -> Result<(), SinkError> {
        let guard = self.tx.lock().map_err(|_| SinkError::Poisoned)?;
        match guard.as_ref() {
            Some(tx) => tx
                .send(Bytes::copy_from_slice(text.as_bytes()))
                .map_err(|_| SinkError::Disconnected),
            None => Err(SinkError::Closed),
        }
    }

    fn complete(&self) {
        match self.tx.lock() {
            Ok(mut guard) => {
                // Dropping the sender ends the body stream.
                guard.take();
            }
            Err(e) => tracing::error!("Mutex poisoned completing stream sink: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn collect(body: Body) -> String {
        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_writes_become_body_until_complete() {
        let (sink, body) = StreamSink::channel();
        sink.write("hello ");
        sink.write("world");
        sink.complete();

        assert_eq!(collect(body).await, "hello world");
    }

    #[tokio::test]
    async fn test_write_after_complete_is_closed() {
        let (sink, _body) = StreamSink::channel();
        sink.complete();
        assert_eq!(sink.try_write("late"), Err(SinkError::Closed));
        // Best-effort write swallows it.
        sink.write("late");
    }

    #[tokio::test]
    async fn test_write_after_client_disconnect() {
        let (sink, body) = StreamSink::channel();
        drop(body);
        assert_eq!(sink.try_write("anyone?"), Err(SinkError::Disconnected));
        sink.complete();
    }

    #[tokio::test]
    async fn test_complete_is_idempotent() {
        let (sink, body) = StreamSink::channel();
        sink.write("x");
        sink.complete();
        sink.complete();
        assert_eq!(collect(body).await, "x");
    }
}
