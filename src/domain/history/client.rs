//! History sub-client: bulk backfill for the chart.

use super::convert::decode_history;
use super::HistoryPoint;
use crate::client::DiscountClient;
use crate::error::FetchError;
use crate::shared::Timescale;

/// Sub-client for the history endpoint.
pub struct History<'a> {
    pub(crate) client: &'a DiscountClient,
}

impl<'a> History<'a> {
    /// Load recent points at the given timescale, oldest first.
    pub async fn load(&self, scale: Timescale) -> Result<Vec<HistoryPoint>, FetchError> {
        let body = self.client.http.get_history(scale).await?;
        decode_history(&body)
    }
}
