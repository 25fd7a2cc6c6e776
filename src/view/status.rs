//! User-visible status lines.

use crate::shared::Timescale;
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

/// Status of the snapshot fetch cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncStatus {
    Idle,
    Fetching,
    Live { last_updated: DateTime<Utc> },
    /// The last fetch failed; one retry is armed.
    Retrying { reason: String, retry_in: Duration },
}

impl SyncStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, SyncStatus::Retrying { .. })
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::Idle => write!(f, "waiting"),
            SyncStatus::Fetching => write!(f, "fetching latest discount..."),
            SyncStatus::Live { last_updated } => {
                write!(f, "connected | last update: {}", last_updated.format("%H:%M:%S"))
            }
            SyncStatus::Retrying { retry_in, .. } => {
                write!(f, "failed, retrying in {}s", retry_in.as_secs())
            }
        }
    }
}

/// Status of the one-shot history backfill.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryStatus {
    NotRequested,
    Loading(Timescale),
    Loaded { scale: Timescale, points: usize },
    /// Persistent until the next scale switch; not retried.
    Failed { scale: Timescale, reason: String },
}

impl fmt::Display for HistoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryStatus::NotRequested => write!(f, "history not loaded"),
            HistoryStatus::Loading(scale) => write!(f, "loading {} history...", scale),
            HistoryStatus::Loaded { scale, points } => {
                write!(f, "loaded {} {} history points", points, scale)
            }
            HistoryStatus::Failed { .. } => write!(f, "history load failed"),
        }
    }
}

/// Status of the push channel.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamStatus {
    Disabled,
    Connecting,
    Connected,
    Reconnecting { retry_in: Duration },
}

impl fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamStatus::Disabled => write!(f, "stream off"),
            StreamStatus::Connecting => write!(f, "connecting..."),
            StreamStatus::Connected => write!(f, "live"),
            StreamStatus::Reconnecting { retry_in } => {
                write!(f, "disconnected, reconnecting in {}s", retry_in.as_secs())
            }
        }
    }
}
