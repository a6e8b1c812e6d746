// crates/server/src/requests/mod.rs
//! Tracking of in-flight asynchronous requests.
//!
//! Provides:
//! - `RequestRegistry` — lookup, listing and cancellation of in-flight requests
//! - `RequestEvent` — SSE-compatible lifecycle updates

pub mod registry;

pub use registry::{RequestEvent, RequestRegistry};
