// crates/server/src/requests/registry.rs
//! Registry of in-flight requests.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use baton_core::{CompletionHandle, RequestId, RequestSnapshot};
use tokio::sync::broadcast;

/// Lifecycle update broadcast to SSE subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestEvent {
    /// The coordinator accepted a request.
    Accepted(RequestSnapshot),
    /// The request's checker reached a terminal state.
    Resolved(RequestSnapshot),
}

impl RequestEvent {
    /// SSE event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Accepted(_) => "accepted",
            Self::Resolved(_) => "resolved",
        }
    }

    pub fn snapshot(&self) -> &RequestSnapshot {
        match self {
            Self::Accepted(snapshot) | Self::Resolved(snapshot) => snapshot,
        }
    }
}

/// Registry of requests whose checker has not resolved yet.
///
/// Thread-safe via `Arc` wrapping. Call `track` right after the coordinator
/// accepts a request; the entry is dropped once the request resolves.
pub struct RequestRegistry {
    requests: RwLock<HashMap<RequestId, Arc<CompletionHandle>>>,
    events_tx: broadcast::Sender<RequestEvent>,
}

impl RequestRegistry {
    pub fn new() -> Self {
        let (events_tx, _) = broadcast::channel(256);
        Self {
            requests: RwLock::new(HashMap::new()),
            events_tx,
        }
    }

    /// Start tracking a request until its checker resolves it.
    pub fn track(self: &Arc<Self>, handle: Arc<CompletionHandle>) {
        let id = handle.id();
        match self.requests.write() {
            Ok(mut requests) => {
                requests.insert(id, Arc::clone(&handle));
            }
            Err(e) => tracing::error!("RwLock poisoned writing requests map: {e}"),
        }
        // No subscribers is fine.
        let _ = self.events_tx.send(RequestEvent::Accepted(handle.snapshot()));

        let registry = Arc::clone(self);
        tokio::spawn(async move {
            handle.resolved().await;
            registry.remove(id);
            let _ = registry
                .events_tx
                .send(RequestEvent::Resolved(handle.snapshot()));
        });
    }

    /// Subscribe to accepted/resolved updates (for SSE streaming).
    pub fn subscribe(&self) -> broadcast::Receiver<RequestEvent> {
        self.events_tx.subscribe()
    }

    /// Current snapshot of an in-flight request.
    pub fn get(&self, id: RequestId) -> Option<RequestSnapshot> {
        self.handle(id).map(|h| h.snapshot())
    }

    /// Snapshots of all in-flight requests, oldest first.
    pub fn active(&self) -> Vec<RequestSnapshot> {
        let mut snapshots: Vec<_> = match self.requests.read() {
            Ok(requests) => requests.values().map(|h| h.snapshot()).collect(),
            Err(e) => {
                tracing::error!("RwLock poisoned reading requests: {e}");
                Vec::new()
            }
        };
        snapshots.sort_by_key(|s| s.request_id);
        snapshots
    }

    /// Cancel an in-flight request's work unit.
    ///
    /// The checker notices on its next tick and completes the response.
    /// Returns the post-cancel snapshot, or `None` if the id is unknown.
    pub fn cancel(&self, id: RequestId) -> Option<RequestSnapshot> {
        let handle = self.handle(id)?;
        handle.work().cancel();
        tracing::info!(request_id = id, "Request work cancelled via API");
        Some(handle.snapshot())
    }

    pub fn len(&self) -> usize {
        self.requests.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn handle(&self, id: RequestId) -> Option<Arc<CompletionHandle>> {
        match self.requests.read() {
            Ok(requests) => requests.get(&id).cloned(),
            Err(e) => {
                tracing::error!("RwLock poisoned reading requests map: {e}");
                None
            }
        }
    }

    fn remove(&self, id: RequestId) {
        match self.requests.write() {
            Ok(mut requests) => {
                requests.remove(&id);
            }
            Err(e) => tracing::error!("RwLock poisoned removing request: {e}"),
        }
    }
}

impl Default for RequestRegistry {
    fn default() -> Self {
        Self::new()
    }
}
