//! Discount, index and formula labels.
//!
//! Discounts are shown in the 折 convention: a 5% discount reads as "9.5 折"
//! (you pay 95%, expressed in tenths).

/// Shown in place of the discount when the latest fetch failed.
pub const NOT_AVAILABLE: &str = "N/A";

/// `(100 - percent_off) / 10`, one decimal, suffixed with 折.
pub fn discount_label(percent_off: f64) -> String {
    format!("{:.1} 折", (100.0 - percent_off) / 10.0)
}

/// The sentiment index as a percentage with two decimals.
pub fn index_label(index: f64) -> String {
    format!("{:.2} %", index)
}

/// Human-readable rendering of the discount formula with the current index
/// substituted in.
pub fn formula_label(base: f64, threshold: f64, index: f64, factor: f64) -> String {
    format!(
        "{}% + ({}% - {:.1}%) * {}",
        base, threshold, index, factor
    )
}
