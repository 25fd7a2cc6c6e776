//! On-demand discount code: the string a barcode/QR renderer encodes.

use super::DiscountSnapshot;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// How long an issued code stays on screen.
pub const CODE_DISPLAY_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscountCode {
    /// `MILK-{percent_off:.2}-{issued_at_millis}`
    pub payload: String,
    pub percent_off: f64,
    pub issued_at: DateTime<Utc>,
    /// Server expiry of the underlying snapshot, when the server sent one.
    pub valid_until: Option<DateTime<Utc>>,
    /// End of the on-screen display window.
    pub display_until: DateTime<Utc>,
}

impl DiscountCode {
    pub fn issue(snapshot: &DiscountSnapshot, now: DateTime<Utc>) -> Self {
        Self {
            payload: format!(
                "MILK-{:.2}-{}",
                snapshot.final_discount_percent,
                now.timestamp_millis()
            ),
            percent_off: snapshot.final_discount_percent,
            issued_at: now,
            valid_until: snapshot.valid_until,
            display_until: now + Duration::seconds(CODE_DISPLAY_SECS),
        }
    }

    /// Whole seconds left in the display window, 0 once elapsed.
    pub fn seconds_remaining(&self, now: DateTime<Utc>) -> u64 {
        (self.display_until - now).num_seconds().max(0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::discount::tests::snapshot;

    #[test]
    fn test_payload_format() {
        let snap = snapshot(40.0, 20.0);
        let now = DateTime::<Utc>::from_timestamp_millis(1_700_000_123_456).unwrap();
        let code = DiscountCode::issue(&snap, now);
        assert_eq!(code.payload, "MILK-20.00-1700000123456");
        assert_eq!(code.seconds_remaining(now), 60);
        assert_eq!(code.seconds_remaining(now + Duration::seconds(59)), 1);
        assert_eq!(code.seconds_remaining(now + Duration::seconds(90)), 0);
    }

    #[test]
    fn test_carries_server_expiry() {
        let mut snap = snapshot(80.0, 5.0);
        snap.valid_until = DateTime::<Utc>::from_timestamp(1_700_000_060, 0);
        let code = DiscountCode::issue(&snap, snap.received_at);
        assert_eq!(code.valid_until, snap.valid_until);
    }
}
