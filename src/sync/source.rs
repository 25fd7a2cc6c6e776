//! The backend as the sync runtime sees it.

use crate::domain::discount::DiscountSnapshot;
use crate::domain::history::HistoryPoint;
use crate::error::FetchError;
use crate::shared::Timescale;
use async_trait::async_trait;

/// ValueFetcher + HistoryLoader. Implemented by `DiscountClient`; tests
/// substitute a scripted fake.
#[async_trait]
pub trait DiscountSource: Send + Sync {
    /// One snapshot exchange. No retry.
    async fn fetch_snapshot(&self) -> Result<DiscountSnapshot, FetchError>;

    /// One history exchange, oldest point first. No retry.
    async fn load_history(&self, scale: Timescale) -> Result<Vec<HistoryPoint>, FetchError>;
}
