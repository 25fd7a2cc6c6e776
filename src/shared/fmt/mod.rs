//! Display formatting for dashboard labels.

pub mod discount;

pub use discount::{discount_label, formula_label, index_label, NOT_AVAILABLE};
