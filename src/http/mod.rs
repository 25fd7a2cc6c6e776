//! HTTP client layer: `DiscountHttp` with an optional transport retry policy.

pub mod client;
pub mod retry;

pub use client::DiscountHttp;
pub use retry::{RetryConfig, RetryPolicy};
