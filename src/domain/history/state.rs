//! Chart series state container: bounded, FIFO-evicting.

use super::{ChartPoint, HistoryPoint, SeriesMode};
use crate::domain::discount::{calculate_discount, DiscountSettings};
use std::collections::VecDeque;

/// One hour of one-point-per-minute sampling.
pub const DEFAULT_SERIES_CAPACITY: usize = 60;

/// Rolling chart series, ordered by arrival.
///
/// Never holds more than `capacity` points; pushing at capacity evicts the
/// oldest point.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    mode: SeriesMode,
    points: VecDeque<ChartPoint>,
    capacity: usize,
}

impl ChartSeries {
    pub fn new(mode: SeriesMode, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            mode,
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn mode(&self) -> SeriesMode {
        self.mode
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Push a point, evicting the oldest if at capacity.
    pub fn push(&mut self, point: ChartPoint) {
        if self.points.len() >= self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    /// Push an index observation, projected through this series' mode.
    pub fn push_history(&mut self, point: &HistoryPoint, settings: &DiscountSettings) {
        let y = self.project(point.index, settings);
        self.push(ChartPoint { x: point.timestamp, y });
    }

    /// Replace all points (e.g. from a history load). Keeps the most recent
    /// `capacity` points.
    pub fn replace(&mut self, history: &[HistoryPoint], settings: &DiscountSettings) {
        self.points.clear();
        let skip = history.len().saturating_sub(self.capacity);
        for point in &history[skip..] {
            self.push_history(point, settings);
        }
    }

    /// `y` for a raw index in this series' mode.
    pub fn project(&self, index: f64, settings: &DiscountSettings) -> f64 {
        match self.mode {
            SeriesMode::Index => index,
            SeriesMode::Discount => calculate_discount(index, settings),
        }
    }

    pub fn points(&self) -> &VecDeque<ChartPoint> {
        &self.points
    }

    pub fn latest(&self) -> Option<&ChartPoint> {
        self.points.back()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl Default for ChartSeries {
    fn default() -> Self {
        Self::new(SeriesMode::default(), DEFAULT_SERIES_CAPACITY)
    }
}
