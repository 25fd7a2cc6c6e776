//! View state: the single source of truth render collaborators read from.
//!
//! `apply_snapshot` and `append_point` are the only writers of the current
//! snapshot and the chart series. The sync runtime owns one instance and
//! publishes clones; renderers never write.

pub mod status;

use crate::domain::discount::{DiscountCode, DiscountSettings, DiscountSnapshot};
use crate::domain::history::{ChartPoint, ChartSeries, HistoryPoint, SeriesMode};
use crate::shared::fmt::NOT_AVAILABLE;
use crate::shared::Timescale;
use chrono::{DateTime, Utc};

pub use status::{HistoryStatus, StreamStatus, SyncStatus};

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    snapshot: Option<DiscountSnapshot>,
    series: ChartSeries,
    status: SyncStatus,
    history: HistoryStatus,
    stream: StreamStatus,
    countdown: Option<u64>,
    last_updated: Option<DateTime<Utc>>,
}

impl ViewState {
    pub fn new(mode: SeriesMode, capacity: usize) -> Self {
        Self {
            snapshot: None,
            series: ChartSeries::new(mode, capacity),
            status: SyncStatus::Idle,
            history: HistoryStatus::NotRequested,
            stream: StreamStatus::Disabled,
            countdown: None,
            last_updated: None,
        }
    }

    // ── Writers ──────────────────────────────────────────────────────────

    /// Replace the current snapshot and push one chart point for it.
    pub fn apply_snapshot(&mut self, snapshot: DiscountSnapshot) {
        self.series.push(snapshot_point(self.series.mode(), &snapshot));
        self.last_updated = Some(snapshot.received_at);
        self.snapshot = Some(snapshot);
    }

    /// Push one streamed point. Leaves the snapshot untouched.
    pub fn append_point(&mut self, point: HistoryPoint) {
        let settings = self.settings();
        self.series.push_history(&point, &settings);
        self.last_updated = Some(point.timestamp);
    }

    /// Replace the whole series from a history load (never merged).
    ///
    /// Points are projected with the current snapshot's settings. A snapshot
    /// newer than the last history point stays on the chart as its tail.
    pub fn replace_history(&mut self, scale: Timescale, points: &[HistoryPoint]) {
        let settings = self.settings();
        self.series.replace(points, &settings);
        self.history = HistoryStatus::Loaded {
            scale,
            points: self.series.len(),
        };

        let Some(snapshot) = &self.snapshot else {
            return;
        };
        let newer = self
            .series
            .latest()
            .map_or(true, |last| snapshot.received_at > last.x);
        if newer {
            self.series.push(snapshot_point(self.series.mode(), snapshot));
        }
    }

    pub fn set_status(&mut self, status: SyncStatus) {
        self.status = status;
    }

    pub fn set_history_status(&mut self, history: HistoryStatus) {
        self.history = history;
    }

    pub fn set_stream_status(&mut self, stream: StreamStatus) {
        self.stream = stream;
    }

    pub fn set_countdown(&mut self, countdown: Option<u64>) {
        self.countdown = countdown;
    }

    // ── Readers ──────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> Option<&DiscountSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn series(&self) -> &ChartSeries {
        &self.series
    }

    pub fn status(&self) -> &SyncStatus {
        &self.status
    }

    pub fn history_status(&self) -> &HistoryStatus {
        &self.history
    }

    pub fn stream_status(&self) -> &StreamStatus {
        &self.stream
    }

    /// Seconds shown on the countdown; `None` when hidden.
    pub fn countdown(&self) -> Option<u64> {
        self.countdown
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// Settings used to project index values; the server's once a snapshot
    /// has arrived.
    pub fn settings(&self) -> DiscountSettings {
        self.snapshot
            .as_ref()
            .map(|s| s.settings)
            .unwrap_or_default()
    }

    /// Snapshot usable for display: present and not superseded by a failure.
    fn live_snapshot(&self) -> Option<&DiscountSnapshot> {
        if self.status.is_failed() {
            return None;
        }
        self.snapshot.as_ref()
    }

    pub fn discount_label(&self) -> String {
        self.live_snapshot()
            .map(|s| s.discount_label())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    pub fn index_label(&self) -> Option<String> {
        self.snapshot.as_ref().map(|s| s.index_label())
    }

    pub fn formula_label(&self) -> Option<String> {
        self.snapshot.as_ref().map(|s| s.formula_label())
    }

    /// Issue a discount code for the current snapshot, if one can be shown.
    pub fn discount_code(&self, now: DateTime<Utc>) -> Option<DiscountCode> {
        self.live_snapshot().map(|s| DiscountCode::issue(s, now))
    }
}

fn snapshot_point(mode: SeriesMode, snapshot: &DiscountSnapshot) -> ChartPoint {
    let y = match mode {
        SeriesMode::Index => snapshot.current_index,
        SeriesMode::Discount => snapshot.final_discount_percent,
    };
    ChartPoint {
        x: snapshot.received_at,
        y,
    }
}

impl Default for ViewState {
    fn default() -> Self {
        let series = ChartSeries::default();
        Self::new(series.mode(), series.capacity())
    }
}
