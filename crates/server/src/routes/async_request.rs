// crates/server/src/routes/async_request.rs
//! The streaming endpoint that kicks off a work unit and its checker.
//!
//! - GET /async — Start a request; the response body streams its markers

use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::sink::StreamSink;
use crate::state::AppState;

/// GET /api/async — Accept a request and stream its progress.
///
/// Returns immediately with a streaming body. The body stays open until the
/// request's checker completes it, on success or on timeout.
async fn start_request(State(state): State<Arc<AppState>>) -> Response {
    let (sink, body) = StreamSink::channel();
    let handle = state.coordinator.handle(sink);
    state.requests.track(handle);

    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response()
}

/// Build the streaming request router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/async", get(start_request))
}
