//! Transport-level retry policies.
//!
//! Off by default: the sync scheduler owns the flat retry cadence for
//! snapshot fetches, and history loads never retry on their own. A custom
//! policy only smooths over connection blips inside a single exchange.

use crate::error::HttpError;
use std::time::Duration;

/// Retry policy for one HTTP exchange.
#[derive(Debug, Clone, Default)]
pub enum RetryPolicy {
    /// Single attempt.
    #[default]
    None,
    /// Retry transient failures per the given config.
    Custom(RetryConfig),
}

impl RetryPolicy {
    pub(crate) fn config(&self) -> Option<&RetryConfig> {
        match self {
            RetryPolicy::None => None,
            RetryPolicy::Custom(c) => Some(c),
        }
    }
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not counting the initial request).
    pub max_retries: u32,
    /// Initial delay before the first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each retry.
    pub backoff_factor: f64,
    /// Whether to add jitter to the delay.
    pub jitter: bool,
    /// HTTP status codes that trigger a retry.
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::transient()
    }
}

impl RetryConfig {
    /// Two quick retries on gateway errors and connection failures.
    pub fn transient() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(2),
            backoff_factor: 2.0,
            jitter: true,
            retryable_statuses: vec![502, 503, 504],
        }
    }

    /// Whether `error` is worth another attempt under this config.
    pub fn is_retryable(&self, error: &HttpError) -> bool {
        match error {
            HttpError::Status { status, .. } => self.retryable_statuses.contains(status),
            HttpError::Timeout => true,
            #[cfg(feature = "http")]
            HttpError::Reqwest(e) => e.is_connect() || e.is_timeout(),
            HttpError::MaxRetriesExceeded { .. } => false,
        }
    }

    /// Calculate delay for a given attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_millis() as f64
            * self.backoff_factor.powi(attempt as i32);
        let capped = base.min(self.max_delay.as_millis() as f64);

        let final_ms = if self.jitter {
            let jitter_range = capped * 0.25;
            let jitter = (rand::random::<f64>() - 0.5) * 2.0 * jitter_range;
            (capped + jitter).max(0.0)
        } else {
            capped
        };

        Duration::from_millis(final_ms as u64)
    }
}
