//! Snapshot fetch scheduler: a pure state machine.
//!
//! `Idle → Fetching → { Scheduled, Failed } → Fetching → …`
//!
//! Each call to [`SyncScheduler::handle`] maps (state, event, now) to a new
//! state plus a list of actions for the runtime to perform. No timers or I/O
//! live here.

use super::config::{SchedulePolicy, SyncConfig};
use crate::domain::discount::DiscountSnapshot;
use crate::error::FetchError;
use crate::view::SyncStatus;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Floor for `valid_until`-driven delays, so an already-expired instant
/// cannot turn into a tight fetch loop.
pub const MIN_VALID_UNTIL_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerState {
    Idle,
    /// A fetch is in flight; timer firings are ignored.
    Fetching,
    Scheduled { delay: Duration },
    Failed { retry_in: Duration },
}

#[derive(Debug)]
pub enum SchedulerEvent {
    Start,
    /// The armed fetch timer fired (or a manual refresh was requested).
    TimerFired,
    /// One second of the cosmetic countdown elapsed.
    CountdownTick,
    FetchSucceeded(DiscountSnapshot),
    FetchFailed(FetchError),
}

/// Countdown display transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownDisplay {
    /// (Re)start a 1-second ticker showing this value.
    Started(u64),
    Remaining(u64),
    Hidden,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerAction {
    /// Issue one snapshot fetch.
    Fetch,
    /// Arm the fetch timer, replacing any armed one.
    ArmTimer(Duration),
    Countdown(CountdownDisplay),
    Apply(DiscountSnapshot),
    Report(SyncStatus),
}

/// Delay until the next fetch and the countdown shown for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextFetch {
    pub delay: Duration,
    pub countdown_secs: u64,
}

#[derive(Debug, Clone)]
pub struct SyncScheduler {
    config: SyncConfig,
    state: SchedulerState,
    countdown: Option<u64>,
    consecutive_failures: u32,
}

impl SyncScheduler {
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config,
            state: SchedulerState::Idle,
            countdown: None,
            consecutive_failures: 0,
        }
    }

    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    pub fn is_fetching(&self) -> bool {
        self.state == SchedulerState::Fetching
    }

    pub fn countdown(&self) -> Option<u64> {
        self.countdown
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn handle(&mut self, event: SchedulerEvent, now: DateTime<Utc>) -> Vec<SchedulerAction> {
        match event {
            SchedulerEvent::Start => {
                if self.state != SchedulerState::Idle {
                    tracing::debug!(state = ?self.state, "Start ignored, already running");
                    return Vec::new();
                }
                self.begin_fetch()
            }
            SchedulerEvent::TimerFired => {
                if self.is_fetching() {
                    tracing::debug!("Fetch already in flight, skipping tick");
                    return Vec::new();
                }
                self.begin_fetch()
            }
            SchedulerEvent::CountdownTick => self.tick_countdown(),
            SchedulerEvent::FetchSucceeded(snapshot) => {
                if !self.is_fetching() {
                    tracing::warn!(state = ?self.state, "Dropping snapshot that arrived outside a fetch");
                    return Vec::new();
                }
                self.on_success(snapshot, now)
            }
            SchedulerEvent::FetchFailed(error) => {
                if !self.is_fetching() {
                    tracing::warn!(state = ?self.state, "Dropping failure that arrived outside a fetch");
                    return Vec::new();
                }
                self.on_failure(error)
            }
        }
    }

    /// Delay to the next fetch after `snapshot`, per the configured policy.
    pub fn plan_next(&self, snapshot: &DiscountSnapshot, now: DateTime<Utc>) -> NextFetch {
        let fixed = NextFetch {
            delay: self.config.default_interval(),
            countdown_secs: self.config.default_interval().as_secs(),
        };
        if self.config.policy == SchedulePolicy::FixedInterval {
            return fixed;
        }

        if let Some(secs) = snapshot.seconds_until_next_update {
            return NextFetch {
                delay: Duration::from_secs(secs) + self.config.safety_buffer(),
                countdown_secs: secs,
            };
        }

        if let Some(until) = snapshot.valid_until {
            let remaining_ms = (until - now).num_milliseconds().max(0) as u64;
            let remaining = Duration::from_millis(remaining_ms);
            return NextFetch {
                delay: remaining.max(MIN_VALID_UNTIL_DELAY),
                countdown_secs: remaining.as_secs(),
            };
        }

        fixed
    }

    fn begin_fetch(&mut self) -> Vec<SchedulerAction> {
        self.state = SchedulerState::Fetching;
        vec![
            SchedulerAction::Fetch,
            SchedulerAction::Report(SyncStatus::Fetching),
        ]
    }

    fn on_success(&mut self, snapshot: DiscountSnapshot, now: DateTime<Utc>) -> Vec<SchedulerAction> {
        if self.consecutive_failures > 0 {
            tracing::info!(failures = self.consecutive_failures, "Fetch recovered");
        }
        self.consecutive_failures = 0;

        let next = self.plan_next(&snapshot, now);
        tracing::debug!(
            delay_ms = next.delay.as_millis() as u64,
            countdown = next.countdown_secs,
            "Next fetch scheduled"
        );
        self.state = SchedulerState::Scheduled { delay: next.delay };

        let countdown = if next.countdown_secs > 0 {
            self.countdown = Some(next.countdown_secs);
            CountdownDisplay::Started(next.countdown_secs)
        } else {
            self.countdown = None;
            CountdownDisplay::Hidden
        };

        let last_updated = snapshot.received_at;
        vec![
            SchedulerAction::Apply(snapshot),
            SchedulerAction::Report(SyncStatus::Live { last_updated }),
            SchedulerAction::ArmTimer(next.delay),
            SchedulerAction::Countdown(countdown),
        ]
    }

    fn on_failure(&mut self, error: FetchError) -> Vec<SchedulerAction> {
        self.consecutive_failures += 1;
        let retry_in = self.config.retry_delay();
        tracing::warn!(
            failures = self.consecutive_failures,
            retry_ms = retry_in.as_millis() as u64,
            "Snapshot fetch failed: {}",
            error
        );
        self.state = SchedulerState::Failed { retry_in };
        self.countdown = None;
        vec![
            SchedulerAction::Report(SyncStatus::Retrying {
                reason: error.to_string(),
                retry_in,
            }),
            SchedulerAction::Countdown(CountdownDisplay::Hidden),
            SchedulerAction::ArmTimer(retry_in),
        ]
    }

    fn tick_countdown(&mut self) -> Vec<SchedulerAction> {
        let Some(current) = self.countdown else {
            return Vec::new();
        };
        let remaining = current.saturating_sub(1);
        if remaining > 0 {
            self.countdown = Some(remaining);
            return vec![SchedulerAction::Countdown(CountdownDisplay::Remaining(remaining))];
        }

        self.countdown = None;
        let mut actions = vec![SchedulerAction::Countdown(CountdownDisplay::Hidden)];
        if self.config.refetch_on_countdown_end && matches!(self.state, SchedulerState::Scheduled { .. }) {
            tracing::debug!("Countdown ended, fetching early");
            actions.extend(self.begin_fetch());
        }
        actions
    }
}
