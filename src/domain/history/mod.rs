//! History domain: index points and the bounded chart series.

#[cfg(feature = "http")]
pub mod client;
pub mod convert;
pub mod state;
pub mod wire;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use state::{ChartSeries, DEFAULT_SERIES_CAPACITY};

/// One index observation, from the history endpoint or the stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub timestamp: DateTime<Utc>,
    pub index: f64,
}

/// A rendered chart point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub x: DateTime<Utc>,
    pub y: f64,
}

/// What the chart's `y` axis shows. Fixed per series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesMode {
    /// The raw sentiment index.
    Index,
    /// Percent off derived from the index.
    #[default]
    Discount,
}
