//! Low-level HTTP client: `DiscountHttp`.
//!
//! One method per API endpoint. Returns the raw body (validated decoding to
//! domain types happens in each domain's `convert.rs`). Layer 5 wraps this.

use crate::error::HttpError;
use crate::http::retry::RetryPolicy;
use crate::shared::Timescale;

use reqwest::Client;
use std::time::Duration;

/// Low-level HTTP client for the discount REST API.
#[derive(Clone)]
pub struct DiscountHttp {
    base_url: String,
    client: Client,
    retry: RetryPolicy,
}

impl DiscountHttp {
    pub fn new(base_url: &str, timeout: Duration, retry: RetryPolicy) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(2)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            retry,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ── Discount ─────────────────────────────────────────────────────────

    pub async fn get_current_discount(&self) -> Result<String, HttpError> {
        let url = format!("{}/api/current-discount", self.base_url);
        self.get(&url).await
    }

    // ── History ──────────────────────────────────────────────────────────

    pub async fn get_history(&self, scale: Timescale) -> Result<String, HttpError> {
        let url = format!(
            "{}/api/history?timescale={}",
            self.base_url,
            urlencoding::encode(scale.as_str())
        );
        self.get(&url).await
    }

    // ── Internal HTTP methods ────────────────────────────────────────────

    async fn get(&self, url: &str) -> Result<String, HttpError> {
        let Some(config) = self.retry.config() else {
            return self.do_get(url).await;
        };

        let mut last_error = None;

        for attempt in 0..=config.max_retries {
            match self.do_get(url).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    if config.is_retryable(&e) && attempt < config.max_retries {
                        let delay = config.delay_for_attempt(attempt);
                        tracing::debug!(
                            attempt = attempt + 1,
                            max = config.max_retries,
                            delay_ms = delay.as_millis() as u64,
                            "Retrying request to {}",
                            url
                        );
                        futures_timer::Delay::new(delay).await;
                        last_error = Some(e);
                    } else {
                        return Err(e);
                    }
                }
            }
        }

        Err(HttpError::MaxRetriesExceeded {
            attempts: config.max_retries + 1,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }

    async fn do_get(&self, url: &str) -> Result<String, HttpError> {
        let resp = self.client.get(url).send().await.map_err(transport_error)?;
        let status = resp.status();

        if status.is_success() {
            // A body cut off mid-read is a transport failure, not a bad payload.
            return resp.text().await.map_err(transport_error);
        }

        let body = resp.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), "Non-success response from {}", url);
        Err(HttpError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

fn transport_error(e: reqwest::Error) -> HttpError {
    if e.is_timeout() {
        HttpError::Timeout
    } else {
        HttpError::Reqwest(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let http = DiscountHttp::new(
            "https://example.test/",
            Duration::from_secs(5),
            RetryPolicy::None,
        )
        .unwrap();
        assert_eq!(http.base_url(), "https://example.test");
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Port 9 (discard) on localhost is not expected to accept HTTP.
        let http = DiscountHttp::new(
            "http://127.0.0.1:9",
            Duration::from_secs(2),
            RetryPolicy::None,
        )
        .unwrap();
        let err = http.get_current_discount().await.unwrap_err();
        assert!(matches!(err, HttpError::Reqwest(_) | HttpError::Timeout));
    }

    #[tokio::test]
    async fn test_truncated_body_is_transport_error() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 500\r\n\r\n{\"current_ppi\": 4")
                .await
                .unwrap();
            // Dropping the socket closes it mid-body.
        });

        let http = DiscountHttp::new(
            &format!("http://{}", addr),
            Duration::from_secs(5),
            RetryPolicy::None,
        )
        .unwrap();
        let err = http.get_current_discount().await.unwrap_err();
        assert!(matches!(err, HttpError::Reqwest(_)));
        assert!(crate::error::FetchError::from(err).is_transport());
    }
}
