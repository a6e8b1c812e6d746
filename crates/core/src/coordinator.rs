// crates/core/src/coordinator.rs
//! Entry point that wires a response sink to a new work unit and checker.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::checker::Checker;
use crate::completion::{CompletionHandle, RequestId};
use crate::config::BatonConfig;
use crate::error::ConfigError;
use crate::markers;
use crate::sink::SharedSink;
use crate::work::WorkUnit;

/// Accepts requests and hands each one off to its own work unit and checker.
///
/// Thread-safe; share it behind an `Arc` and call [`handle`](Self::handle)
/// from any request task. Must be called from within a tokio runtime.
#[derive(Debug)]
pub struct RequestCoordinator {
    config: BatonConfig,
    next_id: AtomicU64,
}

impl RequestCoordinator {
    pub fn new(config: BatonConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn config(&self) -> &BatonConfig {
        &self.config
    }

    /// Accept one request.
    ///
    /// Writes the initial acknowledgment, submits the work unit, schedules
    /// the checker (first tick one period from now) and writes the second
    /// acknowledgment. Returns without waiting for any of it; the request
    /// stays open until the checker completes the sink.
    pub fn handle(&self, sink: SharedSink) -> Arc<CompletionHandle> {
        let id: RequestId = self.next_id.fetch_add(1, Ordering::Relaxed);

        sink.write(markers::INITIAL_RUNNING);

        let handle = Arc::new(CompletionHandle::new(id, Arc::clone(&sink)));

        WorkUnit::new(Arc::clone(&sink), self.config.work_duration).spawn(handle.work().clone());
        Checker::new(
            Arc::clone(&handle),
            self.config.checker_period,
            self.config.tick_budget,
        )
        .spawn();

        sink.write(markers::INITIAL_DONE);

        tracing::info!(
            request_id = id,
            checker_period_ms = millis(self.config.checker_period),
            tick_budget = self.config.tick_budget,
            deadline_ms = millis(self.config.deadline()),
            "Request accepted"
        );
        handle
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Default for RequestCoordinator {
    fn default() -> Self {
        Self {
            config: BatonConfig::default(),
            next_id: AtomicU64::new(1),
        }
    }
}
