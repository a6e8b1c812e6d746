// crates/server/src/lib.rs
//! Baton server library.
//!
//! Axum transport for asynchronous request completion tracking: each
//! `GET /api/async` starts a work unit and a periodic checker and streams
//! their progress markers back as the response body.

pub mod config;
pub mod error;
pub mod requests;
pub mod routes;
pub mod sink;
pub mod state;

pub use config::ServerArgs;
pub use error::*;
pub use routes::api_routes;
pub use state::AppState;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the Axum application with all routes and middleware.
///
/// This sets up:
/// - API routes (health, async, requests)
/// - CORS for development (allows any origin)
/// - Request tracing
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api_routes(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

// ============================================================================
// Integration Tests
// ============================================================================
