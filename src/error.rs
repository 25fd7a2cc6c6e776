//! Unified SDK error types.

use thiserror::Error;

/// Top-level SDK error.
#[derive(Error, Debug)]
pub enum SdkError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("WebSocket error: {0}")]
    Ws(#[from] WsError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Sync task is no longer running")]
    TaskStopped,

    #[error("{0}")]
    Other(String),
}

/// HTTP-layer (transport) errors.
#[derive(Error, Debug)]
pub enum HttpError {
    #[cfg(feature = "http")]
    #[error("Request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Timeout")]
    Timeout,

    #[error("Max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },
}

/// Errors from a single snapshot or history exchange with the backend.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Non-2xx response or connection failure.
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// The payload decoded but carries a server-side `error` field.
    #[error("Server reported an error: {0}")]
    Application(String),

    /// The payload could not be decoded into a well-typed value.
    #[error("Malformed payload: {0}")]
    Parse(String),
}

impl FetchError {
    /// Transport-class failure (status or connection).
    pub fn is_transport(&self) -> bool {
        matches!(self, FetchError::Http(_))
    }

    /// Application-class failure. Malformed payloads propagate as
    /// application errors.
    pub fn is_application(&self) -> bool {
        matches!(self, FetchError::Application(_) | FetchError::Parse(_))
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Parse(e.to_string())
    }
}

/// Stream channel errors.
#[derive(Error, Debug)]
pub enum WsError {
    #[error("Not connected")]
    NotConnected,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Connection closed: code={code:?} reason={reason}")]
    Closed {
        code: Option<u16>,
        reason: String,
    },
}
