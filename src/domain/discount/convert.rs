//! Validated decode: wire response → `DiscountSnapshot`.

use super::wire::{CurrentDiscountResponse, WireSettings};
use super::{DiscountSettings, DiscountSnapshot};
use crate::error::FetchError;
use crate::shared::serde_util::from_epoch_seconds;
use chrono::{DateTime, Utc};

/// Decode a response body into a snapshot.
///
/// An embedded `error` field wins over everything else and yields
/// `FetchError::Application`. Missing or non-finite fields yield
/// `FetchError::Parse`; a partially-valid snapshot is never returned.
pub fn decode_snapshot(body: &str, received_at: DateTime<Utc>) -> Result<DiscountSnapshot, FetchError> {
    let wire: CurrentDiscountResponse = serde_json::from_str(body)?;
    snapshot_from_wire(wire, received_at)
}

pub fn snapshot_from_wire(
    wire: CurrentDiscountResponse,
    received_at: DateTime<Utc>,
) -> Result<DiscountSnapshot, FetchError> {
    if let Some(error) = wire.error {
        return Err(FetchError::Application(error));
    }

    let current_index = finite("current_ppi", wire.current_ppi)?;
    let final_discount_percent = finite("final_discount_percentage", wire.final_discount_percentage)?;
    let settings = settings_from_wire(
        wire.settings
            .ok_or_else(|| FetchError::Parse("missing field `settings`".into()))?,
    )?;

    let seconds_until_next_update = wire.seconds_until_next_update.map(|s| {
        if s < 0 {
            tracing::debug!(seconds = s, "Negative update hint clamped to 0");
        }
        s.max(0) as u64
    });

    let valid_until = match wire.valid_until {
        Some(secs) => Some(from_epoch_seconds(secs).map_err(FetchError::Parse)?),
        None => None,
    };

    Ok(DiscountSnapshot {
        current_index,
        final_discount_percent,
        settings,
        seconds_until_next_update,
        valid_until,
        received_at,
    })
}

fn settings_from_wire(wire: WireSettings) -> Result<DiscountSettings, FetchError> {
    let defaults = DiscountSettings::default();
    Ok(DiscountSettings {
        base_discount: finite("settings.base_discount", wire.base_discount)?,
        index_threshold: finite("settings.ppi_threshold", wire.ppi_threshold)?,
        conversion_factor: finite("settings.conversion_factor", wire.conversion_factor)?,
        // Older servers do not echo the cap.
        discount_cap: match wire.discount_cap {
            Some(_) => finite("settings.discount_cap", wire.discount_cap)?,
            None => defaults.discount_cap,
        },
    })
}

fn finite(name: &str, value: Option<f64>) -> Result<f64, FetchError> {
    match value {
        Some(v) if v.is_finite() => Ok(v),
        Some(v) => Err(FetchError::Parse(format!("field `{}` is not finite: {}", name, v))),
        None => Err(FetchError::Parse(format!("missing field `{}`", name))),
    }
}
