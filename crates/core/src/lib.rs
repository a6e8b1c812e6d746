// crates/core/src/lib.rs
//! Asynchronous request completion tracking.
//!
//! A request is accepted by the [`RequestCoordinator`], which starts a
//! long-running [`WorkUnit`] and a periodic [`Checker`] that share one
//! [`CompletionHandle`]. The checker reports progress to the request's
//! [`ResponseSink`] and finishes the request once the work unit is done or
//! the tick budget runs out.

pub mod checker;
pub mod completion;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod markers;
pub mod sink;
pub mod work;

pub use checker::{transition, Checker, CheckerState, TickAction, Transition};
pub use completion::{CompletionHandle, RequestId, RequestSnapshot};
pub use config::BatonConfig;
pub use coordinator::RequestCoordinator;
pub use error::*;
pub use sink::{MemorySink, ResponseSink, SharedSink};
pub use work::{WorkHandle, WorkOutcome, WorkUnit};
