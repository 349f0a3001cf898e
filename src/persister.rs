use tracing::{info, warn};

use crate::config::ReplaceMode;
use crate::error::Result;
use crate::models::{publishable, Review, StoredReview};
use crate::store::ReviewStore;

/// Counts from one replace
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistOutcome {
    /// Reviews that passed the quality filter
    pub eligible: usize,
    /// Documents the store reports as written
    pub inserted: u64,
}

/// Replaces a collection's contents with the publishable subset of a fetch
pub struct Persister<'a> {
    store: &'a dyn ReviewStore,
    mode: ReplaceMode,
}

impl<'a> Persister<'a> {
    pub fn new(store: &'a dyn ReviewStore, mode: ReplaceMode) -> Self {
        Self { store, mode }
    }

    /// Replace everything in the collection.
    ///
    /// In direct mode the old collection is dropped before the insert, so a
    /// failed insert leaves it empty.
    pub async fn replace_all(&self, reviews: &[Review]) -> Result<PersistOutcome> {
        let docs: Vec<StoredReview> = publishable(reviews)
            .into_iter()
            .map(StoredReview::from)
            .collect();

        info!(
            fetched = reviews.len(),
            eligible = docs.len(),
            "Filtered reviews"
        );

        let inserted = match self.mode {
            ReplaceMode::Direct => self.drop_then_insert(&docs).await?,
            ReplaceMode::Staged => {
                info!(collection = %self.store.name(), "Replacing collection via staging");
                self.store.replace_staged(&docs).await?
            }
        };

        if inserted != docs.len() as u64 {
            warn!(
                attempted = docs.len(),
                inserted, "Store wrote a different number of documents than sent"
            );
        }

        info!(inserted, "Reviews saved to database");

        Ok(PersistOutcome {
            eligible: docs.len(),
            inserted,
        })
    }

    async fn drop_then_insert(&self, docs: &[StoredReview]) -> Result<u64> {
        info!(collection = %self.store.name(), "Dropping old collection");
        self.store.drop_collection().await?;

        if docs.is_empty() {
            info!("No reviews passed the filter, nothing to insert");
            return Ok(0);
        }

        info!(count = docs.len(), "Saving reviews to database");
        self.store.insert_many(docs).await
    }
}
