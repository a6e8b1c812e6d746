// crates/core/src/work.rs
//! The placeholder long-running operation behind each request.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::markers;
use crate::sink::SharedSink;

/// Cancellable handle to a running [`WorkUnit`].
///
/// Cloning is cheap; all clones observe and control the same work unit.
#[derive(Debug, Clone, Default)]
pub struct WorkHandle {
    token: CancellationToken,
    done: Arc<AtomicBool>,
}

impl WorkHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the work unit has stopped running, whether it finished or
    /// unwound after cancellation.
    ///
    /// Pairs with the release store in [`mark_done`](Self::mark_done): once
    /// this returns true, every marker the work unit wrote is already in the
    /// sink.
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    /// True once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Request cancellation. The work unit unwinds at its next await point.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Done or cancelled, the condition the checker resolves a request on.
    pub fn is_finished(&self) -> bool {
        self.is_done() || self.is_cancelled()
    }

    fn mark_done(&self) {
        self.done.store(true, Ordering::Release);
    }
}

/// How a work unit terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkOutcome {
    /// The wait elapsed and the finished marker was written.
    Finished,
    /// Cancellation arrived before the wait elapsed.
    Cancelled,
}

/// Pretends to do some slow blocking thing, reporting to the client as it goes.
pub struct WorkUnit {
    sink: SharedSink,
    duration: Duration,
}

impl WorkUnit {
    pub fn new(sink: SharedSink, duration: Duration) -> Self {
        Self { sink, duration }
    }

    /// Run to completion or cancellation.
    ///
    /// The done flag is published after the last write, so a checker that
    /// observes it never reports completion ahead of the finished marker.
    pub async fn run(self, handle: WorkHandle) -> WorkOutcome {
        let outcome = self.execute(&handle).await;
        handle.mark_done();
        outcome
    }

    /// Submit this work unit to the runtime.
    pub fn spawn(self, handle: WorkHandle) -> JoinHandle<WorkOutcome> {
        tokio::spawn(self.run(handle))
    }

    async fn execute(&self, handle: &WorkHandle) -> WorkOutcome {
        if handle.is_cancelled() {
            tracing::debug!("Work unit cancelled before start");
            return WorkOutcome::Cancelled;
        }

        self.sink.write(markers::WORK_RUNNING);

        tokio::select! {
            biased;
            _ = handle.token.cancelled() => {
                tracing::debug!("Work unit cancelled");
                WorkOutcome::Cancelled
            }
            _ = tokio::time::sleep(self.duration) => {
                self.sink.write(markers::WORK_DONE);
                WorkOutcome::Finished
            }
        }
    }
}
