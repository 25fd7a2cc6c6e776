//! # Sentiment Discount SDK
//!
//! Client for a service that turns a live sentiment index into a store
//! discount: snapshot polling driven by the server's own update hints,
//! one-shot history backfill for the chart, and a live index stream.
//!
//! ## Architecture
//!
//! The SDK is organized in layers:
//!
//! 1. **Core**: shared types, domain slices, view state and the sans-IO
//!    state machines (always available)
//! 2. **HTTP API**: `DiscountHttp`, one method per endpoint
//! 3. **Stream**: `tokio-tungstenite` client driving the reconnection machine
//! 4. **Runtime**: the single tokio task that owns timers, fetches and the view
//! 5. **High-Level Client**: `DiscountClient` with nested sub-clients
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sentiment_discount_sdk::prelude::*;
//!
//! let client = DiscountClient::builder().build()?;
//!
//! let snapshot = client.discounts().current().await?;
//! println!("{}", snapshot.discount_label());
//!
//! let handle = client.sync(SyncConfig::default())?;
//! let mut views = handle.subscribe();
//! while views.changed().await.is_ok() {
//!     let view = views.borrow().clone();
//!     println!("{} | {}", view.discount_label(), view.status());
//! }
//! ```

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Shared newtypes, serde helpers and display formatting.
pub mod shared;

/// Domain modules (vertical slices): types, wire types, conversions, state.
pub mod domain;

/// View state and status lines read by renderers.
pub mod view;

/// Fetch scheduling: state machine, config, clock, runtime.
pub mod sync;

/// Unified SDK error types.
pub mod error;

/// Network URL constants.
pub mod network;

// ── Layer 2: HTTP API ────────────────────────────────────────────────────────

/// HTTP client with an optional retry policy.
#[cfg(feature = "http")]
pub mod http;

// ── Layer 3: Stream ──────────────────────────────────────────────────────────

/// Live index stream: messages, events, reconnection.
pub mod ws;

// ── Layer 5: High-Level Client ───────────────────────────────────────────────

/// `DiscountClient`, the primary entry point.
#[cfg(feature = "http")]
pub mod client;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    // Shared
    pub use crate::shared::Timescale;

    // Domain types
    pub use crate::domain::discount::{
        calculate_discount, DiscountCode, DiscountSettings, DiscountSnapshot,
    };
    pub use crate::domain::history::{ChartPoint, ChartSeries, HistoryPoint, SeriesMode};

    // View
    pub use crate::view::{HistoryStatus, StreamStatus, SyncStatus, ViewState};

    // Sync
    pub use crate::sync::{DiscountSource, SchedulePolicy, SyncConfig, SyncScheduler};
    #[cfg(feature = "runtime")]
    pub use crate::sync::{spawn_sync, SyncHandle};

    // Errors
    pub use crate::error::{FetchError, SdkError};

    // Network
    pub use crate::network::{DEFAULT_API_URL, DEFAULT_WS_URL};

    // HTTP client + sub-clients
    #[cfg(feature = "http")]
    pub use crate::client::{DiscountClient, DiscountClientBuilder, DiscountsClient, HistoryClient};
    #[cfg(feature = "http")]
    pub use crate::http::retry::{RetryConfig, RetryPolicy};

    // Stream types
    pub use crate::ws::{WsConfig, WsEvent};
}
