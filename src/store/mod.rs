pub mod json;
pub mod postgres;

pub use json::JsonStore;
pub use postgres::PostgresStore;

use async_trait::async_trait;
use tracing::info;

use crate::config::{StoreConfig, STORE_URL_VAR};
use crate::error::{Result, SyncError};
use crate::models::StoredReview;

/// A single named collection of review documents
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Human-readable location, e.g. "bbpcontent.reviews"
    fn name(&self) -> String;

    /// Remove the collection and everything in it. Dropping a missing
    /// collection is not an error.
    async fn drop_collection(&self) -> Result<()>;

    /// Insert all documents in one batch, returning how many the store wrote
    async fn insert_many(&self, docs: &[StoredReview]) -> Result<u64>;

    /// Write the documents to a staging collection and swap it in place of
    /// the live one in a single step
    async fn replace_staged(&self, docs: &[StoredReview]) -> Result<u64>;

    /// Read every document in insertion order
    async fn load_all(&self) -> Result<Vec<StoredReview>>;
}

/// Open the store named by a connection string.
///
/// `postgres://` and `postgresql://` URLs connect to Postgres; a `file://` URL
/// or a bare path selects the JSON directory store. Any other scheme is
/// rejected rather than mistaken for a directory.
pub async fn open(url: &str, config: &StoreConfig) -> Result<Box<dyn ReviewStore>> {
    if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        let store = PostgresStore::connect(
            url,
            &config.database,
            &config.collection,
            config.connect_timeout(),
        )
        .await?;
        info!(collection = %store.name(), "Connected to PostgreSQL");
        return Ok(Box::new(store));
    }

    let path = match url.split_once("://") {
        Some(("file", path)) => path,
        Some((scheme, _)) => {
            return Err(SyncError::config(
                STORE_URL_VAR,
                format!("unsupported store scheme {scheme:?}; expected postgres://, postgresql:// or file://"),
            ))
        }
        None => url,
    };
    let store = JsonStore::new(path, &config.database, &config.collection)?;
    Ok(Box::new(store))
}
