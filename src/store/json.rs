use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use super::ReviewStore;
use crate::error::{Result, SyncError};
use crate::models::StoredReview;

/// JSON file-based store: one array file per collection
pub struct JsonStore {
    dir: PathBuf,
    database: String,
    collection: String,
}

impl JsonStore {
    pub fn new(base_path: impl AsRef<Path>, database: &str, collection: &str) -> Result<Self> {
        let dir = base_path.as_ref().join(database);
        fs::create_dir_all(&dir).map_err(|e| {
            SyncError::StoreConnect(format!("cannot create {}: {e}", dir.display()))
        })?;

        info!(path = %dir.display(), "Initialized JSON store");

        Ok(Self {
            dir,
            database: database.to_string(),
            collection: collection.to_string(),
        })
    }

    fn collection_path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.collection))
    }

    fn staging_path(&self) -> PathBuf {
        self.dir.join(format!("{}.json.staging", self.collection))
    }

    fn read_collection(&self) -> Result<Vec<StoredReview>> {
        let path = self.collection_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path)
            .map_err(|e| SyncError::StoreRead(format!("{}: {e}", path.display())))?;

        serde_json::from_str(&content)
            .map_err(|e| SyncError::StoreRead(format!("{}: {e}", path.display())))
    }
}

fn write_documents(path: &Path, docs: &[StoredReview]) -> std::io::Result<()> {
    let content = serde_json::to_string_pretty(docs)?;
    fs::write(path, content)
}

#[async_trait]
impl ReviewStore for JsonStore {
    fn name(&self) -> String {
        format!("{}.{}", self.database, self.collection)
    }

    async fn drop_collection(&self) -> Result<()> {
        let path = self.collection_path();
        match fs::remove_file(&path) {
            Ok(()) => debug!(path = %path.display(), "Removed collection file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(SyncError::write("drop", e)),
        }
        Ok(())
    }

    async fn insert_many(&self, docs: &[StoredReview]) -> Result<u64> {
        let mut all = self
            .read_collection()
            .map_err(|e| SyncError::write("insert", e))?;
        all.extend_from_slice(docs);

        write_documents(&self.collection_path(), &all).map_err(|e| SyncError::write("insert", e))?;

        debug!(count = docs.len(), "Appended documents");

        Ok(docs.len() as u64)
    }

    async fn replace_staged(&self, docs: &[StoredReview]) -> Result<u64> {
        let staging = self.staging_path();
        write_documents(&staging, docs).map_err(|e| SyncError::write("insert", e))?;

        fs::rename(&staging, self.collection_path()).map_err(|e| SyncError::write("swap", e))?;

        debug!(count = docs.len(), "Swapped in staged collection");

        Ok(docs.len() as u64)
    }

    async fn load_all(&self) -> Result<Vec<StoredReview>> {
        self.read_collection()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn doc(listing_id: i64) -> StoredReview {
        StoredReview {
            shop_id: Some(1),
            listing_id: Some(listing_id),
            rating: Some(5),
            review: Some("Great".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_insert_and_load() {
        let dir = tempdir().unwrap();
        let store = JsonStore::new(dir.path(), "shop", "reviews").unwrap();

        let inserted = store.insert_many(&[doc(1), doc(2)]).await.unwrap();
        assert_eq!(inserted, 2);

        let loaded = store.load_all().await.unwrap();
        assert_eq!(loaded, vec![doc(1), doc(2)]);
    }

    #[tokio::test]
    async fn test_insert_appends() {
        let dir = tempdir().unwrap();
        let store = JsonStore::new(dir.path(), "shop", "reviews").unwrap();

        store.insert_many(&[doc(1)]).await.unwrap();
        store.insert_many(&[doc(2)]).await.unwrap();

        assert_eq!(store.load_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_drop_removes_collection() {
        let dir = tempdir().unwrap();
        let store = JsonStore::new(dir.path(), "shop", "reviews").unwrap();

        store.insert_many(&[doc(1)]).await.unwrap();
        store.drop_collection().await.unwrap();

        assert!(store.load_all().await.unwrap().is_empty());
        assert!(!dir.path().join("shop/reviews.json").exists());
    }

    #[tokio::test]
    async fn test_drop_missing_collection_is_ok() {
        let dir = tempdir().unwrap();
        let store = JsonStore::new(dir.path(), "shop", "reviews").unwrap();

        assert!(store.drop_collection().await.is_ok());
    }

    #[tokio::test]
    async fn test_replace_staged_swaps_contents() {
        let dir = tempdir().unwrap();
        let store = JsonStore::new(dir.path(), "shop", "reviews").unwrap();

        store.insert_many(&[doc(1), doc(2), doc(3)]).await.unwrap();
        let inserted = store.replace_staged(&[doc(9)]).await.unwrap();

        assert_eq!(inserted, 1);
        assert_eq!(store.load_all().await.unwrap(), vec![doc(9)]);
        assert!(!dir.path().join("shop/reviews.json.staging").exists());
    }

    #[tokio::test]
    async fn test_documents_use_storage_field_names() {
        let dir = tempdir().unwrap();
        let store = JsonStore::new(dir.path(), "shop", "reviews").unwrap();

        store.insert_many(&[doc(7)]).await.unwrap();

        let raw = fs::read_to_string(dir.path().join("shop/reviews.json")).unwrap();
        assert!(raw.contains("\"listingid\": 7"));
        assert!(!raw.contains("listing_id"));
    }

    #[tokio::test]
    async fn test_corrupt_collection_is_read_error() {
        let dir = tempdir().unwrap();
        let store = JsonStore::new(dir.path(), "shop", "reviews").unwrap();
        fs::write(dir.path().join("shop/reviews.json"), "not json").unwrap();

        let err = store.load_all().await.unwrap_err();
        assert!(matches!(err, SyncError::StoreRead(_)));
    }
}
