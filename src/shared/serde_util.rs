//! Custom serde helpers for backend wire formats.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

/// A timestamp as the history endpoint sends it: epoch milliseconds, or an
/// ISO 8601 string (with or without offset).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WireTimestamp {
    Millis(f64),
    Text(String),
}

impl WireTimestamp {
    pub fn to_datetime(&self) -> Result<DateTime<Utc>, String> {
        match self {
            WireTimestamp::Millis(ms) => from_millis_f64(*ms),
            WireTimestamp::Text(s) => parse_iso(s),
        }
    }
}

/// Convert fractional epoch seconds (as sent on the stream) to `DateTime<Utc>`.
pub fn from_epoch_seconds(secs: f64) -> Result<DateTime<Utc>, String> {
    from_millis_f64(secs * 1000.0)
}

fn from_millis_f64(ms: f64) -> Result<DateTime<Utc>, String> {
    if !ms.is_finite() {
        return Err(format!("Invalid timestamp: {}", ms));
    }
    DateTime::<Utc>::from_timestamp_millis(ms.round() as i64)
        .ok_or_else(|| format!("Invalid timestamp: {}", ms))
}

/// RFC 3339 first; naive ISO strings (Python `isoformat()` of a UTC
/// datetime) are taken as UTC.
fn parse_iso(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("Invalid timestamp {:?}: {}", s, e))
}
