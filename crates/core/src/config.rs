// crates/core/src/config.rs
//! Tunable timing parameters for request completion tracking.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default interval between checker ticks.
pub const DEFAULT_CHECKER_PERIOD: Duration = Duration::from_millis(1000);

/// Default number of progress ticks before a request times out.
pub const DEFAULT_TICK_BUDGET: u32 = 20;

/// Default length of the placeholder slow operation.
pub const DEFAULT_WORK_DURATION: Duration = Duration::from_secs(10);

/// Timing configuration shared by every request a coordinator accepts.
///
/// Serialized with millisecond integer fields so it can be embedded in
/// JSON/TOML configuration files:
///
/// ```json
/// { "checker_period_ms": 1000, "tick_budget": 20, "work_duration_ms": 10000 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawBatonConfig", into = "RawBatonConfig")]
pub struct BatonConfig {
    /// Interval between checker ticks. The first tick fires one period after
    /// the request is accepted.
    pub checker_period: Duration,
    /// Progress ticks allowed before the checker gives up on the work unit.
    pub tick_budget: u32,
    /// How long the placeholder work unit waits before finishing.
    pub work_duration: Duration,
}

impl BatonConfig {
    pub fn new(checker_period: Duration, tick_budget: u32, work_duration: Duration) -> Self {
        Self {
            checker_period,
            tick_budget,
            work_duration,
        }
    }

    /// Reject configurations the scheduling substrate cannot run.
    ///
    /// A zero tick budget is allowed (the first tick times out); a zero
    /// period is not, since the checker interval would spin.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.checker_period.is_zero() {
            return Err(ConfigError::ZeroCheckerPeriod);
        }
        Ok(())
    }

    /// Wall-clock time after which an unfinished work unit is cancelled.
    pub fn deadline(&self) -> Duration {
        self.checker_period
            .saturating_mul(self.tick_budget.saturating_add(1))
    }
}

impl Default for BatonConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_CHECKER_PERIOD,
            DEFAULT_TICK_BUDGET,
            DEFAULT_WORK_DURATION,
        )
    }
}

#[derive(Serialize, Deserialize)]
#[serde(default)]
struct RawBatonConfig {
    checker_period_ms: u64,
    tick_budget: u32,
    work_duration_ms: u64,
}

impl Default for RawBatonConfig {
    fn default() -> Self {
        BatonConfig::default().into()
    }
}

impl From<RawBatonConfig> for BatonConfig {
    fn from(raw: RawBatonConfig) -> Self {
        Self::new(
            Duration::from_millis(raw.checker_period_ms),
            raw.tick_budget,
            Duration::from_millis(raw.work_duration_ms),
        )
    }
}

impl From<BatonConfig> for RawBatonConfig {
    fn from(config: BatonConfig) -> Self {
        Self {
            checker_period_ms: u64::try_from(config.checker_period.as_millis()).unwrap_or(u64::MAX),
            tick_budget: config.tick_budget,
            work_duration_ms: u64::try_from(config.work_duration.as_millis()).unwrap_or(u64::MAX),
        }
    }
}
