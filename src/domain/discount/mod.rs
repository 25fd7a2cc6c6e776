//! Discount domain: the server-authoritative snapshot and the client copy
//! of the discount formula.

#[cfg(feature = "http")]
pub mod client;
pub mod code;
pub mod convert;
pub mod wire;

use crate::shared::fmt;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use code::DiscountCode;

/// Formula parameters currently in effect server-side.
///
/// Echoed back with every snapshot; never mutated client-side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscountSettings {
    pub base_discount: f64,
    pub index_threshold: f64,
    pub conversion_factor: f64,
    pub discount_cap: f64,
}

impl Default for DiscountSettings {
    fn default() -> Self {
        Self {
            base_discount: 5.0,
            index_threshold: 70.0,
            conversion_factor: 0.5,
            discount_cap: 25.0,
        }
    }
}

/// Percent off for a given index, mirroring the server formula:
/// `min(base + max(0, (threshold - index) * factor), cap)`.
pub fn calculate_discount(index: f64, settings: &DiscountSettings) -> f64 {
    let extra = ((settings.index_threshold - index) * settings.conversion_factor).max(0.0);
    (settings.base_discount + extra).min(settings.discount_cap)
}

/// One server response: current index, resolved discount and the formula
/// parameters, plus an optional scheduling hint.
///
/// Replaced wholesale on every successful fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountSnapshot {
    pub current_index: f64,
    /// Percent off, already clamped server-side.
    pub final_discount_percent: f64,
    pub settings: DiscountSettings,
    pub seconds_until_next_update: Option<u64>,
    pub valid_until: Option<DateTime<Utc>>,
    /// Local time the response was decoded.
    pub received_at: DateTime<Utc>,
}

impl DiscountSnapshot {
    /// e.g. "9.5 折".
    pub fn discount_label(&self) -> String {
        fmt::discount_label(self.final_discount_percent)
    }

    pub fn index_label(&self) -> String {
        fmt::index_label(self.current_index)
    }

    pub fn formula_label(&self) -> String {
        fmt::formula_label(
            self.settings.base_discount,
            self.settings.index_threshold,
            self.current_index,
            self.settings.conversion_factor,
        )
    }

    /// The discount recomputed client-side from this snapshot's own inputs.
    pub fn recomputed_discount(&self) -> f64 {
        calculate_discount(self.current_index, &self.settings)
    }
}
