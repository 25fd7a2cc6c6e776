//! Live index stream: inbound messages, events and reconnection.
//!
//! The transport is compile-time selected:
//! - `ws-native` feature → `tokio-tungstenite` (native.rs)
//!
//! This module defines the shared message/event types and the transport-free
//! `StreamChannel` machine in `channel.rs`.

pub mod channel;

#[cfg(feature = "ws-native")]
pub mod native;

use crate::domain::history::HistoryPoint;
use crate::error::WsError;
use crate::shared::serde_util::from_epoch_seconds;
use serde::Deserialize;
use std::time::Duration;

pub use channel::{ChannelAction, ChannelEvent, ChannelState, StreamChannel};

/// Boxed event stream consumed by the sync runtime.
#[cfg(any(feature = "runtime", feature = "ws-native"))]
pub type EventStream =
    std::pin::Pin<Box<dyn futures_util::Stream<Item = WsEvent> + Send>>;

// ─── Inbound messages ────────────────────────────────────────────────────────

/// A recognized inbound message. Any other `type` is ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum StreamMessage {
    #[serde(rename = "ppi_update")]
    PpiUpdate { timestamp: f64, ppi: f64 },
    #[serde(rename = "pni_update")]
    PniUpdate { timestamp: f64, pni: f64 },
}

impl StreamMessage {
    pub const TYPES: [&'static str; 2] = ["ppi_update", "pni_update"];

    pub fn into_point(self) -> Result<HistoryPoint, WsError> {
        let (timestamp, index) = match self {
            StreamMessage::PpiUpdate { timestamp, ppi } => (timestamp, ppi),
            StreamMessage::PniUpdate { timestamp, pni } => (timestamp, pni),
        };
        if !index.is_finite() {
            return Err(WsError::DeserializationError(format!(
                "non-finite index: {}",
                index
            )));
        }
        Ok(HistoryPoint {
            timestamp: from_epoch_seconds(timestamp).map_err(WsError::DeserializationError)?,
            index,
        })
    }
}

#[derive(Deserialize)]
struct TypeTag {
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

/// Decode one text frame.
///
/// `Ok(None)` for well-formed JSON with an unrecognized `type`;
/// `Err` for anything malformed. Neither is fatal to the channel.
pub fn decode_message(text: &str) -> Result<Option<HistoryPoint>, WsError> {
    let tag: TypeTag = serde_json::from_str(text)
        .map_err(|e| WsError::DeserializationError(e.to_string()))?;
    match tag.kind.as_deref() {
        Some(kind) if StreamMessage::TYPES.contains(&kind) => {
            let msg: StreamMessage = serde_json::from_str(text)
                .map_err(|e| WsError::DeserializationError(e.to_string()))?;
            msg.into_point().map(Some)
        }
        _ => Ok(None),
    }
}

// ─── WsEvent ─────────────────────────────────────────────────────────────────

/// High-level events emitted by the stream client to the consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum WsEvent {
    /// Connection established.
    Connected,
    /// One recognized index update.
    Point(HistoryPoint),
    /// Connection lost. `reconnect_in` is set when a reconnect is armed.
    Disconnected {
        code: Option<u16>,
        reason: String,
        reconnect_in: Option<Duration>,
    },
    /// A malformed message. Connection failures arrive as `Disconnected`.
    Error(String),
}

/// Configuration for the stream client.
#[derive(Debug, Clone, PartialEq)]
pub struct WsConfig {
    pub url: String,
    pub reconnect: bool,
    /// Fixed delay before every reconnect attempt; no growth, no cap on attempts.
    pub reconnect_delay_ms: u64,
    pub connect_timeout_ms: u64,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: crate::network::DEFAULT_WS_URL.to_string(),
            reconnect: true,
            reconnect_delay_ms: 5_000,
            connect_timeout_ms: 30_000,
        }
    }
}

impl WsConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}
