// crates/core/src/markers.rs
//! Literal markers written to a request's response stream.
//!
//! Clients (and tests) match on these byte-for-byte, so they are the wire
//! format of the streaming endpoint.

/// First acknowledgment, written by the coordinator before any work starts.
pub const INITIAL_RUNNING: &str = "servlet initial thread is running\n";

/// Second acknowledgment, written by the coordinator after scheduling.
pub const INITIAL_DONE: &str = "\n\nservlet initial thread is done\n";

/// Written by the work unit when it starts.
pub const WORK_RUNNING: &str = "callable is running\n";

/// Written by the work unit when its wait elapses without cancellation.
pub const WORK_DONE: &str = "callable is DONE\n";

/// One per non-terminal checker tick.
pub const PROGRESS: &str = "#";

/// Terminal marker when the work unit finished (or was cancelled externally).
pub const RESPONSE_COMPLETE: &str = "\n response complete";

/// Terminal marker when the tick budget ran out.
pub const TIME_UP: &str = "Time up";
