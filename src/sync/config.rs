//! Sync configuration.

use crate::domain::history::{SeriesMode, DEFAULT_SERIES_CAPACITY};
use crate::shared::Timescale;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which input governs the delay to the next fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulePolicy {
    /// `seconds_until_next_update` + buffer, else `valid_until - now`, else
    /// the default interval.
    #[default]
    ServerHint,
    /// Always the default interval; snapshot hints are ignored.
    FixedInterval,
}

/// Configuration for the sync runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub policy: SchedulePolicy,
    pub default_interval_ms: u64,
    /// Added to `seconds_until_next_update` so the fetch lands after the
    /// server's own update boundary.
    pub safety_buffer_ms: u64,
    /// Flat delay before retrying a failed fetch.
    pub retry_delay_ms: u64,
    /// Legacy: fetch immediately when the countdown reaches zero.
    pub refetch_on_countdown_end: bool,
    pub timescale: Timescale,
    pub series_mode: SeriesMode,
    pub series_capacity: usize,
    /// Backfill the chart before the first fetch.
    pub load_history: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            policy: SchedulePolicy::ServerHint,
            default_interval_ms: 60_000,
            safety_buffer_ms: 2_000,
            retry_delay_ms: 10_000,
            refetch_on_countdown_end: false,
            timescale: Timescale::Realtime,
            series_mode: SeriesMode::Discount,
            series_capacity: DEFAULT_SERIES_CAPACITY,
            load_history: true,
        }
    }
}

impl SyncConfig {
    pub fn default_interval(&self) -> Duration {
        Duration::from_millis(self.default_interval_ms)
    }

    pub fn safety_buffer(&self) -> Duration {
        Duration::from_millis(self.safety_buffer_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}
