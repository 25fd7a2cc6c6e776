//! Wire types for `GET /api/history`.

use crate::shared::serde_util::WireTimestamp;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct WireHistoryPoint {
    pub timestamp: WireTimestamp,
    #[serde(alias = "pni")]
    pub ppi: f64,
}

/// Either the point list or a logical error object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum HistoryResponse {
    Points(Vec<WireHistoryPoint>),
    Error { error: String },
}
