// crates/core/src/checker.rs
//! Periodic checker that decides when a request is finished.
//!
//! The checker is the sole arbiter of request lifetime: it is the only
//! component that calls [`ResponseSink::complete`](crate::sink::ResponseSink::complete),
//! so completion happens exactly once whichever outcome triggers it.
//!
//! Each tick evaluates, in priority order:
//!
//! ```text
//! work done or cancelled  -> "\n response complete", complete sink, stop  => Completed
//! ticks_left == 0         -> "Time up", cancel work, complete sink, stop  => TimedOut
//! otherwise               -> "#", ticks_left -= 1                         => Running
//! ```
//!
//! Checking the work unit first means a worker that finishes on the same
//! tick the budget runs out is reported as a success.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::completion::CompletionHandle;
use crate::markers;

/// Lifecycle of one request as seen by its checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckerState {
    /// Still polling the work unit.
    Running,
    /// The work unit finished (or was cancelled by someone else).
    Completed,
    /// The tick budget ran out and the work unit was cancelled.
    TimedOut,
}

impl CheckerState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::TimedOut => "timed_out",
        }
    }
}

/// Side effect a tick asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickAction {
    /// Write one progress marker.
    Progress,
    /// Write the completion marker, complete the sink, stop ticking.
    Complete,
    /// Write the time-up marker, cancel the work unit, complete the sink,
    /// stop ticking.
    TimeUp,
    /// Already terminal; do nothing.
    Idle,
}

/// Result of evaluating one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub state: CheckerState,
    pub action: TickAction,
    pub ticks_left: u32,
}

/// Evaluate one tick. Pure: no I/O, no clock.
pub fn transition(state: CheckerState, work_finished: bool, ticks_left: u32) -> Transition {
    if state.is_terminal() {
        return Transition {
            state,
            action: TickAction::Idle,
            ticks_left,
        };
    }

    if work_finished {
        Transition {
            state: CheckerState::Completed,
            action: TickAction::Complete,
            ticks_left,
        }
    } else if ticks_left == 0 {
        Transition {
            state: CheckerState::TimedOut,
            action: TickAction::TimeUp,
            ticks_left,
        }
    } else {
        Transition {
            state: CheckerState::Running,
            action: TickAction::Progress,
            ticks_left: ticks_left - 1,
        }
    }
}

/// Polls one request's work unit at a fixed period.
pub struct Checker {
    handle: Arc<CompletionHandle>,
    period: Duration,
    ticks_left: u32,
    state: CheckerState,
}

impl Checker {
    pub fn new(handle: Arc<CompletionHandle>, period: Duration, tick_budget: u32) -> Self {
        Self {
            handle,
            period,
            ticks_left: tick_budget,
            state: CheckerState::Running,
        }
    }

    pub fn state(&self) -> CheckerState {
        self.state
    }

    pub fn ticks_left(&self) -> u32 {
        self.ticks_left
    }

    /// Evaluate one tick against the handle and apply its side effects.
    pub fn tick(&mut self) -> TickAction {
        let work = self.handle.work();
        let next = transition(self.state, work.is_finished(), self.ticks_left);
        let sink = self.handle.sink();
        let request_id = self.handle.id();

        match next.action {
            TickAction::Progress => {
                sink.write(markers::PROGRESS);
                let ticks = self.handle.record_tick();
                tracing::debug!(request_id, ticks, ticks_left = next.ticks_left, "Checker tick");
            }
            TickAction::Complete => {
                sink.write(markers::RESPONSE_COMPLETE);
                sink.complete();
                self.handle.stop_checker();
                tracing::info!(
                    request_id,
                    ticks = self.handle.ticks(),
                    outcome = CheckerState::Completed.as_str(),
                    "Request resolved"
                );
            }
            TickAction::TimeUp => {
                work.cancel();
                sink.write(markers::TIME_UP);
                sink.complete();
                self.handle.stop_checker();
                tracing::info!(
                    request_id,
                    ticks = self.handle.ticks(),
                    outcome = CheckerState::TimedOut.as_str(),
                    "Request resolved"
                );
            }
            TickAction::Idle => {}
        }

        self.ticks_left = next.ticks_left;
        if next.state != self.state {
            self.state = next.state;
            self.handle.publish_state(next.state);
        }
        next.action
    }

    /// Tick every period, starting one period from now, until a terminal
    /// state is reached or the handle's checker token is cancelled.
    ///
    /// Ticks follow a fixed rate: a late tick fires immediately and the
    /// schedule catches up, as a fixed-rate scheduler would.
    pub async fn run(mut self) -> CheckerState {
        let stop = self.handle.checker_token().clone();
        let mut interval = interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Burst);

        loop {
            tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                _ = interval.tick() => {}
            }

            self.tick();
            if self.state.is_terminal() {
                break;
            }
        }

        if !self.state.is_terminal() {
            tracing::warn!(
                request_id = self.handle.id(),
                ticks = self.handle.ticks(),
                "Checker stopped before the request resolved"
            );
        }
        self.state
    }

    /// Schedule this checker on the runtime.
    pub fn spawn(self) -> JoinHandle<CheckerState> {
        tokio::spawn(self.run())
    }
}
