// crates/core/src/error.rs
use thiserror::Error;

/// Errors a [`ResponseSink`](crate::sink::ResponseSink) can report from
/// `try_write`. Callers going through `write` never see these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    #[error("response sink already completed")]
    Closed,

    #[error("client disconnected")]
    Disconnected,

    #[error("response sink lock poisoned")]
    Poisoned,
}

/// Errors raised when validating a [`BatonConfig`](crate::config::BatonConfig).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("checker period must be greater than zero")]
    ZeroCheckerPeriod,
}
