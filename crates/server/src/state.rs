// crates/server/src/state.rs
//! Application state for the Axum server.

use std::sync::Arc;
use std::time::Instant;

use baton_core::{BatonConfig, ConfigError, RequestCoordinator};
use tokio::sync::watch;

use crate::requests::RequestRegistry;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Accepts streaming requests and starts their work unit and checker.
    pub coordinator: RequestCoordinator,
    /// In-flight requests, for listing, lookup and cancellation.
    pub requests: Arc<RequestRegistry>,
    /// Flips to `true` on graceful shutdown so long-lived SSE streams end.
    pub shutdown: watch::Receiver<bool>,
}

impl AppState {
    /// Create a new application state wrapped in an Arc for sharing.
    ///
    /// Returns the state plus the sender that signals shutdown.
    pub fn new(config: BatonConfig) -> Result<(Arc<Self>, watch::Sender<bool>), ConfigError> {
        let (shutdown_tx, shutdown) = watch::channel(false);
        let state = Arc::new(Self {
            start_time: Instant::now(),
            coordinator: RequestCoordinator::new(config)?,
            requests: Arc::new(RequestRegistry::new()),
            shutdown,
        });
        Ok((state, shutdown_tx))
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
