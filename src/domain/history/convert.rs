//! Validated decode: history response → ordered `HistoryPoint`s.

use super::wire::{HistoryResponse, WireHistoryPoint};
use super::HistoryPoint;
use crate::error::FetchError;

/// Decode a history body. Points come back sorted by timestamp ascending;
/// an empty list is a valid (empty) history.
pub fn decode_history(body: &str) -> Result<Vec<HistoryPoint>, FetchError> {
    match serde_json::from_str::<HistoryResponse>(body)? {
        HistoryResponse::Error { error } => Err(FetchError::Application(error)),
        HistoryResponse::Points(points) => {
            let mut out = points
                .into_iter()
                .map(point_from_wire)
                .collect::<Result<Vec<_>, _>>()?;
            out.sort_by_key(|p| p.timestamp);
            Ok(out)
        }
    }
}

fn point_from_wire(wire: WireHistoryPoint) -> Result<HistoryPoint, FetchError> {
    if !wire.ppi.is_finite() {
        return Err(FetchError::Parse(format!("non-finite index: {}", wire.ppi)));
    }
    Ok(HistoryPoint {
        timestamp: wire.timestamp.to_datetime().map_err(FetchError::Parse)?,
        index: wire.ppi,
    })
}
