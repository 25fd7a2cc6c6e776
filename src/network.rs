//! Network URL constants for the discount service.

/// Default REST API base URL.
pub const DEFAULT_API_URL: &str = "https://ptt-gossiping-live.up.railway.app";

/// Default streaming channel URL.
pub const DEFAULT_WS_URL: &str = "wss://ptt-gossiping-live.up.railway.app/ws";
