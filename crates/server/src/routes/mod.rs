// crates/server/src/routes/mod.rs
//! API route handlers for the baton server.

pub mod async_request;
pub mod health;
pub mod requests;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined API router with all routes under /api prefix.
///
/// Routes:
/// - GET  /api/health - Health check
/// - GET  /api/async - Start a request and stream its progress markers
/// - GET  /api/requests - List in-flight requests
/// - GET  /api/requests/stream - SSE stream of request lifecycle events
/// - GET  /api/requests/{id} - Snapshot of one in-flight request
/// - POST /api/requests/{id}/cancel - Cancel a request's work unit
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", health::router())
        .nest("/api", async_request::router())
        .nest("/api", requests::router())
        .with_state(state)
}
