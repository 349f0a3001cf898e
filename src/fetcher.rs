use std::time::Duration;

use tracing::info;

use crate::api::PageSource;
use crate::config::FetchConfig;
use crate::error::Result;
use crate::models::Review;

/// Everything the fetch phase produced
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    /// All reviews in API order
    pub reviews: Vec<Review>,
    /// Number of page requests issued, including the terminating one
    pub pages_requested: u64,
}

/// Walks the review listing page by page until it is exhausted
pub struct Paginator<'a, S: PageSource> {
    source: &'a S,
    page_size: u32,
    page_delay: Duration,
    max_reviews: Option<usize>,
}

impl<'a, S: PageSource> Paginator<'a, S> {
    pub fn new(source: &'a S, config: &FetchConfig) -> Self {
        Self {
            source,
            page_size: config.page_size.max(1),
            page_delay: config.page_delay(),
            max_reviews: config.max_reviews,
        }
    }

    /// Whether another page should be requested after one of `page_len` reviews
    pub fn should_continue(&self, page_len: usize, total: usize) -> bool {
        if page_len == 0 {
            return false;
        }
        match self.max_reviews {
            Some(ceiling) => total < ceiling,
            None => true,
        }
    }

    /// Fetch every page, sleeping between requests.
    ///
    /// Any failed page aborts the whole fetch and the reviews gathered so far
    /// are dropped.
    pub async fn fetch_all(&self) -> Result<FetchOutcome> {
        let mut reviews = Vec::new();
        let mut page_index: u64 = 0;

        loop {
            let offset = page_index * u64::from(self.page_size);
            info!(
                page = page_index + 1,
                page_size = self.page_size,
                "Fetching review page"
            );

            let page = self.source.fetch_page(self.page_size, offset).await?;
            let added = page.results.len();
            reviews.extend(page.results);

            info!(added, total = reviews.len(), "Reviews added");

            if !self.should_continue(added, reviews.len()) {
                break;
            }

            tokio::time::sleep(self.page_delay).await;
            page_index += 1;
        }

        Ok(FetchOutcome {
            reviews,
            pages_requested: page_index + 1,
        })
    }
}
