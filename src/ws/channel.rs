//! `StreamChannel`: the reconnection state machine, free of any transport.
//!
//! `Connecting → Open → Closed(intentional=false) → Connecting → …`, or the
//! terminal `Closed(intentional=true)` after a shutdown. Every unintentional
//! close arms exactly one reconnect after a fixed delay; attempts are
//! unbounded and the delay never grows.

use super::{decode_message, WsConfig, WsEvent};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Closed { intentional: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Opened,
    Message(String),
    Closed { code: Option<u16>, reason: String },
    ConnectFailed(String),
    /// The armed reconnect delay elapsed.
    ReconnectDue,
    Shutdown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelAction {
    Connect,
    ScheduleReconnect(Duration),
    Emit(WsEvent),
    Stop,
}

#[derive(Debug, Clone)]
pub struct StreamChannel {
    state: ChannelState,
    reconnect: bool,
    reconnect_delay: Duration,
    reconnect_pending: bool,
    reconnects: u64,
}

impl StreamChannel {
    pub fn new(config: &WsConfig) -> Self {
        Self {
            state: ChannelState::Closed { intentional: false },
            reconnect: config.reconnect,
            reconnect_delay: config.reconnect_delay(),
            reconnect_pending: false,
            reconnects: 0,
        }
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Reconnect attempts made so far.
    pub fn reconnects(&self) -> u64 {
        self.reconnects
    }

    pub fn is_reconnect_pending(&self) -> bool {
        self.reconnect_pending
    }

    pub fn start(&mut self) -> Vec<ChannelAction> {
        self.state = ChannelState::Connecting;
        vec![ChannelAction::Connect]
    }

    pub fn handle(&mut self, event: ChannelEvent) -> Vec<ChannelAction> {
        if self.state == (ChannelState::Closed { intentional: true }) {
            return Vec::new();
        }

        match event {
            ChannelEvent::Opened => {
                if self.state != ChannelState::Connecting {
                    return Vec::new();
                }
                tracing::info!(reconnects = self.reconnects, "Stream connected");
                self.state = ChannelState::Open;
                vec![ChannelAction::Emit(WsEvent::Connected)]
            }
            ChannelEvent::Message(text) => {
                if self.state != ChannelState::Open {
                    return Vec::new();
                }
                self.on_message(&text)
            }
            ChannelEvent::Closed { code, reason } => self.on_closed(code, reason),
            ChannelEvent::ConnectFailed(reason) => {
                tracing::error!("Stream connection failed: {}", reason);
                self.on_closed(None, reason)
            }
            ChannelEvent::ReconnectDue => {
                if !self.reconnect_pending {
                    return Vec::new();
                }
                self.reconnect_pending = false;
                self.reconnects += 1;
                self.state = ChannelState::Connecting;
                vec![ChannelAction::Connect]
            }
            ChannelEvent::Shutdown => {
                self.state = ChannelState::Closed { intentional: true };
                self.reconnect_pending = false;
                vec![ChannelAction::Stop]
            }
        }
    }

    fn on_message(&self, text: &str) -> Vec<ChannelAction> {
        match decode_message(text) {
            Ok(Some(point)) => vec![ChannelAction::Emit(WsEvent::Point(point))],
            Ok(None) => {
                tracing::debug!("Ignoring unrecognized stream message: {}", text);
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("Ignoring malformed stream message: {} (raw: {})", e, text);
                vec![ChannelAction::Emit(WsEvent::Error(e.to_string()))]
            }
        }
    }

    fn on_closed(&mut self, code: Option<u16>, reason: String) -> Vec<ChannelAction> {
        if self.reconnect_pending {
            return Vec::new();
        }
        self.state = ChannelState::Closed { intentional: false };

        if !self.reconnect {
            self.state = ChannelState::Closed { intentional: true };
            return vec![
                ChannelAction::Emit(WsEvent::Disconnected {
                    code,
                    reason,
                    reconnect_in: None,
                }),
                ChannelAction::Stop,
            ];
        }

        self.reconnect_pending = true;
        tracing::info!(
            delay_ms = self.reconnect_delay.as_millis() as u64,
            "Stream closed ({}), reconnecting",
            reason
        );
        vec![
            ChannelAction::Emit(WsEvent::Disconnected {
                code,
                reason,
                reconnect_in: Some(self.reconnect_delay),
            }),
            ChannelAction::ScheduleReconnect(self.reconnect_delay),
        ]
    }
}
