pub mod client;

pub use client::ReviewApiClient;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::ReviewPage;

/// Source of review pages addressed by limit and offset
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch up to `limit` reviews starting at `offset`
    async fn fetch_page(&self, limit: u32, offset: u64) -> Result<ReviewPage>;
}
