//! Discount sub-client: the single snapshot exchange.

use super::convert::decode_snapshot;
use super::DiscountSnapshot;
use crate::client::DiscountClient;
use crate::error::FetchError;

/// Sub-client for the current-discount endpoint.
pub struct Discounts<'a> {
    pub(crate) client: &'a DiscountClient,
}

impl<'a> Discounts<'a> {
    /// Fetch and validate the current snapshot. No retry at this level.
    pub async fn current(&self) -> Result<DiscountSnapshot, FetchError> {
        let body = self.client.http.get_current_discount().await?;
        decode_snapshot(&body, chrono::Utc::now())
    }
}
