// crates/core/src/completion.rs
//! Shared completion state for one in-flight request.

use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::checker::CheckerState;
use crate::sink::SharedSink;
use crate::work::WorkHandle;

/// Unique identifier for an accepted request.
pub type RequestId = u64;

/// The baton passed between a request's coordinator, work unit and checker.
///
/// Created once per request, before the work unit is submitted and before
/// the checker is scheduled, and shared behind an `Arc`. Every field is set
/// at construction; afterwards only the checker mutates it (tick counter and
/// published state).
pub struct CompletionHandle {
    id: RequestId,
    sink: SharedSink,
    work: WorkHandle,
    checker: CancellationToken,
    ticks: AtomicU32,
    state_tx: watch::Sender<CheckerState>,
    accepted_at: DateTime<Utc>,
}

impl CompletionHandle {
    pub fn new(id: RequestId, sink: SharedSink) -> Self {
        let (state_tx, _) = watch::channel(CheckerState::Running);
        Self {
            id,
            sink,
            work: WorkHandle::new(),
            checker: CancellationToken::new(),
            ticks: AtomicU32::new(0),
            state_tx,
            accepted_at: Utc::now(),
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn sink(&self) -> &SharedSink {
        &self.sink
    }

    /// Handle to this request's work unit.
    pub fn work(&self) -> &WorkHandle {
        &self.work
    }

    /// Token stopping this request's checker.
    pub fn checker_token(&self) -> &CancellationToken {
        &self.checker
    }

    /// Stop future checker ticks. A tick already in progress finishes first.
    pub fn stop_checker(&self) {
        self.checker.cancel();
    }

    pub fn accepted_at(&self) -> DateTime<Utc> {
        self.accepted_at
    }

    /// Progress ticks emitted so far.
    pub fn ticks(&self) -> u32 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Count one progress tick and return the new total.
    pub(crate) fn record_tick(&self) -> u32 {
        self.ticks.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Latest state published by the checker.
    pub fn state(&self) -> CheckerState {
        *self.state_tx.borrow()
    }

    pub(crate) fn publish_state(&self, state: CheckerState) {
        self.state_tx.send_replace(state);
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<CheckerState> {
        self.state_tx.subscribe()
    }

    /// Wait until the checker reaches a terminal state.
    pub async fn resolved(&self) -> CheckerState {
        let mut rx = self.subscribe();
        let state = match rx.wait_for(|state| state.is_terminal()).await {
            Ok(state) => *state,
            // The sender lives in `self`, so the channel cannot close while
            // we hold a borrow.
            Err(_) => self.state(),
        };
        state
    }

    pub fn snapshot(&self) -> RequestSnapshot {
        RequestSnapshot {
            request_id: self.id,
            state: self.state(),
            ticks: self.ticks(),
            work_done: self.work.is_done(),
            work_cancelled: self.work.is_cancelled(),
            accepted_at: self.accepted_at.to_rfc3339(),
        }
    }
}

impl std::fmt::Debug for CompletionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionHandle")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("ticks", &self.ticks())
            .field("work", &self.work)
            .finish_non_exhaustive()
    }
}

/// Point-in-time view of a request, as reported over the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSnapshot {
    pub request_id: RequestId,
    pub state: CheckerState,
    pub ticks: u32,
    pub work_done: bool,
    pub work_cancelled: bool,
    pub accepted_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use std::sync::Arc;
    use std::time::Duration;

    fn new_handle() -> CompletionHandle {
        let (_sink, shared) = MemorySink::shared();
        CompletionHandle::new(7, shared)
    }

    #[test]
    fn test_new_handle_is_running() {
        let handle = new_handle();
        assert_eq!(handle.id(), 7);
        assert_eq!(handle.state(), CheckerState::Running);
        assert_eq!(handle.ticks(), 0);
        assert!(!handle.work().is_finished());
        assert!(!handle.checker_token().is_cancelled());
    }

    #[test]
    fn test_cancellation_tokens_are_independent() {
        let handle = new_handle();
        handle.stop_checker();
        assert!(handle.checker_token().is_cancelled());
        assert!(!handle.work().is_cancelled());

        let other = new_handle();
        other.work().cancel();
        assert!(other.work().is_cancelled());
        assert!(!other.checker_token().is_cancelled());
    }

    #[test]
    fn test_record_tick() {
        let handle = new_handle();
        assert_eq!(handle.record_tick(), 1);
        assert_eq!(handle.record_tick(), 2);
        assert_eq!(handle.ticks(), 2);
    }

    #[tokio::test]
    async fn test_resolved_returns_terminal_state() {
        let handle = Arc::new(new_handle());
        let waiter = {
            let handle = Arc::clone(&handle);
            tokio::spawn(async move { handle.resolved().await })
        };

        tokio::task::yield_now().await;
        handle.publish_state(CheckerState::TimedOut);

        let state = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("resolved() should return")
            .unwrap();
        assert_eq!(state, CheckerState::TimedOut);
    }

    #[tokio::test]
    async fn test_resolved_returns_immediately_when_already_terminal() {
        let handle = new_handle();
        handle.publish_state(CheckerState::Completed);
        assert_eq!(handle.resolved().await, CheckerState::Completed);
    }

    #[test]
    fn test_snapshot_serialize() {
        let handle = new_handle();
        handle.record_tick();
        let json = serde_json::to_string(&handle.snapshot()).unwrap();
        assert!(json.contains("\"requestId\":7"));
        assert!(json.contains("\"state\":\"running\""));
        assert!(json.contains("\"ticks\":1"));
        assert!(json.contains("\"workDone\":false"));
        assert!(json.contains("\"workCancelled\":false"));
        assert!(json.contains("\"acceptedAt\""));
    }
}
