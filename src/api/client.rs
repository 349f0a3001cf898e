use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use tracing::{debug, instrument};

use super::PageSource;
use crate::error::{Result, SyncError};
use crate::models::ReviewPage;

const API_KEY_HEADER: &str = "x-api-key";

/// HTTP client for a shop's review listing
pub struct ReviewApiClient {
    client: Client,
    base_url: String,
    shop_id: String,
    api_key: String,
}

impl ReviewApiClient {
    pub fn new(base_url: &str, shop_id: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            shop_id: shop_id.to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn reviews_url(&self) -> String {
        format!("{}/shops/{}/reviews", self.base_url, self.shop_id)
    }
}

#[async_trait]
impl PageSource for ReviewApiClient {
    #[instrument(skip(self), fields(shop = %self.shop_id))]
    async fn fetch_page(&self, limit: u32, offset: u64) -> Result<ReviewPage> {
        let url = self.reviews_url();
        debug!(%url, "Requesting review page");

        let response = self
            .client
            .get(&url)
            .query(&[("limit", limit as u64), ("offset", offset)])
            .header(ACCEPT, "application/json")
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        let status = response.status();
        debug!(status = %status, "Review page response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Transport(format!(
                "GET {url}?limit={limit}&offset={offset} returned {status}: {body}"
            )));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|source| SyncError::Decode { offset, source })
    }
}
