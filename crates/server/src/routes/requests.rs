// crates/server/src/routes/requests.rs
//! API routes for in-flight request inspection.
//!
//! - GET  /requests — List all in-flight requests
//! - GET  /requests/stream — SSE stream of accepted/resolved events
//! - GET  /requests/{id} — Snapshot of one in-flight request
//! - POST /requests/{id}/cancel — Cancel a request's work unit

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use baton_core::{RequestId, RequestSnapshot};
use tokio::sync::broadcast::error::RecvError;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// GET /api/requests — List all in-flight requests.
async fn list_requests(State(state): State<Arc<AppState>>) -> Json<Vec<RequestSnapshot>> {
    Json(state.requests.active())
}

/// GET /api/requests/{id} — Snapshot of one in-flight request.
async fn get_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<RequestId>,
) -> ApiResult<Json<RequestSnapshot>> {
    state
        .requests
        .get(id)
        .map(Json)
        .ok_or(ApiError::RequestNotFound(id))
}

/// POST /api/requests/{id}/cancel — Cancel a request's work unit.
///
/// The request's checker reports `response complete` on its next tick.
async fn cancel_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<RequestId>,
) -> ApiResult<Json<RequestSnapshot>> {
    state
        .requests
        .cancel(id)
        .map(Json)
        .ok_or(ApiError::RequestNotFound(id))
}

/// GET /api/requests/stream — SSE stream of request lifecycle events.
async fn stream_requests(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.requests.subscribe();
    let mut shutdown = state.shutdown.clone();

    let stream = async_stream::stream! {
        loop {
            tokio::select! {
                biased;
                event = rx.recv() => {
                    match event {
                        Ok(event) => {
                            let json = match serde_json::to_string(event.snapshot()) {
                                Ok(j) => j,
                                Err(e) => {
                                    tracing::error!(error = %e, "Failed to serialize request event");
                                    continue;
                                }
                            };
                            yield Ok(Event::default().event(event.name()).data(json));
                        }
                        Err(RecvError::Lagged(n)) => {
                            tracing::warn!("SSE client lagged by {} request events", n);
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
                changed = shutdown.changed() => {
                    // A dropped sender can never signal again.
                    if changed.is_err() || *shutdown.borrow() { break; }
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}

/// Build the requests router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/requests", get(list_requests))
        .route("/requests/stream", get(stream_requests))
        .route("/requests/{id}", get(get_request))
        .route("/requests/{id}/cancel", post(cancel_request))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use baton_core::{BatonConfig, CheckerState, MemorySink};
    use tower::ServiceExt;

    fn test_state() -> (Arc<AppState>, tokio::sync::watch::Sender<bool>) {
        let config = BatonConfig::new(Duration::from_millis(100), 5, Duration::from_secs(60));
        AppState::new(config).unwrap()
    }

    fn app(state: &Arc<AppState>) -> Router {
        Router::new()
            .nest("/api", router())
            .with_state(Arc::clone(state))
    }

    async fn request(app: Router, method: &str, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn start(state: &Arc<AppState>) -> Arc<baton_core::CompletionHandle> {
        let (_sink, shared) = MemorySink::shared();
        let handle = state.coordinator.handle(shared);
        state.requests.track(Arc::clone(&handle));
        handle
    }

    #[tokio::test]
    async fn test_list_requests_empty() {
        let (state, _shutdown) = test_state();
        let (status, body) = request(app(&state), "GET", "/api/requests").await;

        assert_eq!(status, StatusCode::OK);
        let json: Vec<serde_json::Value> = serde_json::from_str(&body).unwrap();
        assert!(json.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_and_get_in_flight_request() {
        let (state, _shutdown) = test_state();
        let handle = start(&state);

        let (status, body) = request(app(&state), "GET", "/api/requests").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json[0]["requestId"], 1);
        assert_eq!(json[0]["state"], "running");

        let (status, body) = request(app(&state), "GET", "/api/requests/1").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["requestId"], 1);
        assert_eq!(json["workCancelled"], false);

        handle.work().cancel();
    }

    #[tokio::test]
    async fn test_get_unknown_request_is_404() {
        let (state, _shutdown) = test_state();
        let (status, body) = request(app(&state), "GET", "/api/requests/99").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["error"], "Request not found");
    }

    #[tokio::test]
    async fn test_get_non_numeric_id_is_400() {
        let (state, _shutdown) = test_state();
        let (status, _body) = request(app(&state), "GET", "/api/requests/abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_request() {
        let (state, _shutdown) = test_state();
        let handle = start(&state);

        let (status, body) = request(app(&state), "POST", "/api/requests/1/cancel").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["workCancelled"], true);

        assert_eq!(handle.resolved().await, CheckerState::Completed);
    }

    #[tokio::test]
    async fn test_cancel_unknown_request_is_404() {
        let (state, _shutdown) = test_state();
        let (status, _body) = request(app(&state), "POST", "/api/requests/5/cancel").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_ends_on_shutdown() {
        let (state, shutdown_tx) = test_state();

        let response = app(&state)
            .oneshot(
                Request::builder()
                    .uri("/api/requests/stream")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let handle = start(&state);
        handle.work().cancel();
        handle.resolved().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        shutdown_tx.send(true).unwrap();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("event: accepted"));
        assert!(body.contains("event: resolved"));
        assert!(body.contains("\"state\":\"completed\""));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_ends_when_shutdown_sender_dropped() {
        let (state, shutdown_tx) = test_state();
        drop(shutdown_tx);

        let response = app(&state)
            .oneshot(
                Request::builder()
                    .uri("/api/requests/stream")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = tokio::time::timeout(
            Duration::from_secs(1),
            axum::body::to_bytes(response.into_body(), usize::MAX),
        )
        .await
        .expect("stream should end once the shutdown sender is gone")
        .unwrap();
        assert!(body.is_empty());
    }
}
