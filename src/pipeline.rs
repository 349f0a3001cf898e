use std::fmt;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::api::{PageSource, ReviewApiClient};
use crate::config::{Config, Settings};
use crate::error::Result;
use crate::fetcher::Paginator;
use crate::persister::Persister;
use crate::store;

/// What a finished run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub pages_requested: u64,
    pub fetched: usize,
    pub eligible: usize,
    pub inserted: u64,
    /// Creation time of the newest fetched review
    pub newest_review: Option<DateTime<Utc>>,
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} reviews fetched in {} pages",
            self.fetched, self.pages_requested
        )?;
        if let Some(newest) = self.newest_review {
            writeln!(f, "Newest review: {}", newest.format("%Y-%m-%d %H:%M UTC"))?;
        }
        writeln!(f, "{} reviews passed the quality filter", self.eligible)?;
        write!(f, "{} reviews saved to database", self.inserted)
    }
}

/// Fetch every review, then replace the stored collection
pub async fn run(settings: &Settings) -> Result<SyncReport> {
    settings.config.validate()?;

    let client = ReviewApiClient::new(
        &settings.config.api.base_url,
        &settings.shop_id,
        &settings.api_key,
    );

    sync(&client, &settings.store_url, &settings.config).await
}

/// Run both phases against any page source
pub async fn sync<S: PageSource>(source: &S, store_url: &str, config: &Config) -> Result<SyncReport> {
    let outcome = Paginator::new(source, &config.fetch).fetch_all().await?;

    info!(
        total = outcome.reviews.len(),
        pages = outcome.pages_requested,
        "Fetch complete"
    );

    let store = store::open(store_url, &config.store).await?;
    let persisted = Persister::new(store.as_ref(), config.store.replace_mode)
        .replace_all(&outcome.reviews)
        .await?;

    Ok(SyncReport {
        pages_requested: outcome.pages_requested,
        fetched: outcome.reviews.len(),
        eligible: persisted.eligible,
        inserted: persisted.inserted,
        newest_review: outcome.reviews.iter().filter_map(|r| r.created_at()).max(),
    })
}
