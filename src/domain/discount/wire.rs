//! Wire types for `GET /api/current-discount`.
//!
//! Every field is optional here so a logical error payload (`{"error": ...}`)
//! decodes cleanly; presence is enforced in `convert.rs`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentDiscountResponse {
    #[serde(default, alias = "current_pni")]
    pub current_ppi: Option<f64>,
    #[serde(default)]
    pub final_discount_percentage: Option<f64>,
    #[serde(default)]
    pub settings: Option<WireSettings>,
    #[serde(default)]
    pub seconds_until_next_update: Option<i64>,
    /// Epoch seconds.
    #[serde(default)]
    pub valid_until: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireSettings {
    #[serde(default)]
    pub base_discount: Option<f64>,
    #[serde(default, alias = "pni_threshold")]
    pub ppi_threshold: Option<f64>,
    #[serde(default)]
    pub conversion_factor: Option<f64>,
    #[serde(default)]
    pub discount_cap: Option<f64>,
}
