//! High-level client: `DiscountClient` with nested sub-client accessors.
//!
//! Each domain has its own sub-client in `domain/<name>/client.rs`.
//! This module keeps the builder, the accessors, and the glue that hands
//! the client to the sync runtime.

use crate::domain::discount::client::Discounts;
use crate::domain::discount::DiscountSnapshot;
use crate::domain::history::client::History;
use crate::domain::history::HistoryPoint;
use crate::error::{FetchError, SdkError};
use crate::http::{DiscountHttp, RetryPolicy};
use crate::shared::Timescale;
use crate::sync::DiscountSource;
use crate::ws::WsConfig;

use async_trait::async_trait;
use std::time::Duration;

// Re-export sub-client types for convenience.
pub use crate::domain::discount::client::Discounts as DiscountsClient;
pub use crate::domain::history::client::History as HistoryClient;

/// The primary entry point for the SDK.
///
/// `client.discounts().current()` and `client.history().load(scale)` are
/// single exchanges with no scheduling; `client.sync(config)` runs the
/// full polling + streaming loop.
#[derive(Clone)]
pub struct DiscountClient {
    pub(crate) http: DiscountHttp,
    pub(crate) ws_config: WsConfig,
    /// Attach the live stream when spawning the sync runtime.
    pub(crate) stream_enabled: bool,
}

impl DiscountClient {
    pub fn builder() -> DiscountClientBuilder {
        DiscountClientBuilder::default()
    }

    // ── Sub-client accessors ─────────────────────────────────────────────

    pub fn discounts(&self) -> Discounts<'_> {
        Discounts { client: self }
    }

    pub fn history(&self) -> History<'_> {
        History { client: self }
    }

    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    /// Get a WS config for creating a stream connection.
    pub fn ws_config(&self) -> &WsConfig {
        &self.ws_config
    }

    /// Create a new native stream client from the current config.
    #[cfg(feature = "ws-native")]
    pub fn ws_native(&self) -> crate::ws::native::WsClient {
        crate::ws::native::WsClient::new(self.ws_config.clone())
    }

    /// Spawn the sync runtime on the current tokio runtime.
    ///
    /// The stream is attached when the client was built with it enabled
    /// (the default) and the `ws-native` feature is on.
    #[cfg(feature = "runtime")]
    pub fn sync(
        &self,
        config: crate::sync::SyncConfig,
    ) -> Result<crate::sync::SyncHandle, SdkError> {
        let stream = self.event_stream()?;
        Ok(crate::sync::spawn_sync(
            std::sync::Arc::new(self.clone()),
            config,
            stream,
            std::sync::Arc::new(crate::sync::SystemClock),
        ))
    }

    #[cfg(all(feature = "runtime", feature = "ws-native"))]
    fn event_stream(&self) -> Result<Option<crate::ws::EventStream>, SdkError> {
        if !self.stream_enabled {
            return Ok(None);
        }
        Ok(Some(self.ws_native().into_events()?))
    }

    #[cfg(all(feature = "runtime", not(feature = "ws-native")))]
    fn event_stream(&self) -> Result<Option<crate::ws::EventStream>, SdkError> {
        if self.stream_enabled {
            tracing::debug!("Stream requested but the ws-native feature is off");
        }
        Ok(None)
    }
}

#[async_trait]
impl DiscountSource for DiscountClient {
    async fn fetch_snapshot(&self) -> Result<DiscountSnapshot, FetchError> {
        self.discounts().current().await
    }

    async fn load_history(&self, scale: Timescale) -> Result<Vec<HistoryPoint>, FetchError> {
        self.history().load(scale).await
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Builder
// ═════════════════════════════════════════════════════════════════════════════

pub struct DiscountClientBuilder {
    base_url: String,
    ws_url: String,
    timeout: Duration,
    retry_policy: RetryPolicy,
    reconnect_delay: Duration,
    stream: bool,
}

impl Default for DiscountClientBuilder {
    fn default() -> Self {
        let ws = WsConfig::default();
        Self {
            base_url: crate::network::DEFAULT_API_URL.to_string(),
            reconnect_delay: ws.reconnect_delay(),
            ws_url: ws.url,
            timeout: Duration::from_secs(30),
            retry_policy: RetryPolicy::None,
            stream: true,
        }
    }
}

impl DiscountClientBuilder {
    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    pub fn ws_url(mut self, url: &str) -> Self {
        self.ws_url = url.to_string();
        self
    }

    /// Per-request HTTP timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Transport-level retry. Off by default; the scheduler's flat retry
    /// already covers failed fetches.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Attach the live stream to `sync()`.
    pub fn stream(mut self, enabled: bool) -> Self {
        self.stream = enabled;
        self
    }

    pub fn build(self) -> Result<DiscountClient, SdkError> {
        if self.base_url.is_empty() {
            return Err(SdkError::Config("base_url must not be empty".into()));
        }
        let http = DiscountHttp::new(&self.base_url, self.timeout, self.retry_policy)
            .map_err(FetchError::from)?;
        Ok(DiscountClient {
            http,
            ws_config: WsConfig {
                url: self.ws_url,
                reconnect_delay_ms: self.reconnect_delay.as_millis() as u64,
                ..WsConfig::default()
            },
            stream_enabled: self.stream,
        })
    }
}
