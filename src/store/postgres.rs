use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::debug;

use super::ReviewStore;
use crate::config::is_valid_collection_name;
use crate::error::{Result, SyncError};
use crate::models::StoredReview;

/// PostgreSQL-backed document store.
///
/// The database name maps to a schema and the collection to a table of
/// `(id BIGSERIAL, doc JSONB)` rows.
pub struct PostgresStore {
    pool: PgPool,
    schema: String,
    table: String,
}

impl PostgresStore {
    /// Connect, giving up after `timeout`
    pub async fn connect(
        database_url: &str,
        schema: &str,
        table: &str,
        timeout: Duration,
    ) -> Result<Self> {
        for (key, name) in [("store.database", schema), ("store.collection", table)] {
            if !is_valid_collection_name(name) {
                return Err(SyncError::config(key, format!("invalid identifier: {name:?}")));
            }
        }

        let pool = tokio::time::timeout(
            timeout,
            PgPoolOptions::new()
                .max_connections(1)
                .acquire_timeout(timeout)
                .connect(database_url),
        )
        .await
        .map_err(|_| SyncError::connect_timeout(timeout))?
        .map_err(|e| SyncError::StoreConnect(e.to_string()))?;

        Ok(Self {
            pool,
            schema: schema.to_string(),
            table: table.to_string(),
        })
    }

    fn qualified(&self, table: &str) -> String {
        format!("\"{}\".\"{}\"", self.schema, table)
    }

    fn staging_table(&self) -> String {
        format!("{}_staging", self.table)
    }

    async fn create_table(&self, table: &str) -> std::result::Result<(), sqlx::Error> {
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS \"{}\"", self.schema))
            .execute(&self.pool)
            .await?;
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {} (id BIGSERIAL PRIMARY KEY, doc JSONB NOT NULL)",
            self.qualified(table)
        ))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_into(
        &self,
        table: &str,
        docs: &[StoredReview],
    ) -> std::result::Result<u64, sqlx::Error> {
        let result = sqlx::query(&format!(
            r#"
            INSERT INTO {} (doc)
            SELECT elem FROM jsonb_array_elements($1) WITH ORDINALITY AS e(elem, idx)
            ORDER BY idx
            "#,
            self.qualified(table)
        ))
        .bind(Json(docs))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ReviewStore for PostgresStore {
    fn name(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }

    async fn drop_collection(&self) -> Result<()> {
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", self.qualified(&self.table)))
            .execute(&self.pool)
            .await
            .map_err(|e| SyncError::write("drop", e))?;

        debug!(table = %self.name(), "Dropped table");

        Ok(())
    }

    async fn insert_many(&self, docs: &[StoredReview]) -> Result<u64> {
        self.create_table(&self.table)
            .await
            .map_err(|e| SyncError::write("insert", e))?;

        self.insert_into(&self.table, docs)
            .await
            .map_err(|e| SyncError::write("insert", e))
    }

    async fn replace_staged(&self, docs: &[StoredReview]) -> Result<u64> {
        let staging = self.staging_table();

        sqlx::query(&format!("DROP TABLE IF EXISTS {}", self.qualified(&staging)))
            .execute(&self.pool)
            .await
            .map_err(|e| SyncError::write("insert", e))?;
        self.create_table(&staging)
            .await
            .map_err(|e| SyncError::write("insert", e))?;
        let inserted = self
            .insert_into(&staging, docs)
            .await
            .map_err(|e| SyncError::write("insert", e))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| SyncError::write("swap", e))?;

        sqlx::query(&format!("DROP TABLE IF EXISTS {}", self.qualified(&self.table)))
            .execute(&mut *tx)
            .await
            .map_err(|e| SyncError::write("swap", e))?;

        sqlx::query(&format!(
            "ALTER TABLE {} RENAME TO \"{}\"",
            self.qualified(&staging),
            self.table
        ))
        .execute(&mut *tx)
        .await
        .map_err(|e| SyncError::write("swap", e))?;

        tx.commit().await.map_err(|e| SyncError::write("swap", e))?;

        debug!(table = %self.name(), inserted, "Swapped in staging table");

        Ok(inserted)
    }

    async fn load_all(&self) -> Result<Vec<StoredReview>> {
        let exists: bool = sqlx::query_scalar("SELECT to_regclass($1) IS NOT NULL")
            .bind(self.qualified(&self.table))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| SyncError::StoreRead(e.to_string()))?;

        if !exists {
            return Ok(Vec::new());
        }

        let docs: Vec<Json<StoredReview>> = sqlx::query_scalar(&format!(
            "SELECT doc FROM {} ORDER BY id",
            self.qualified(&self.table)
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| SyncError::StoreRead(e.to_string()))?;

        Ok(docs.into_iter().map(|Json(doc)| doc).collect())
    }
}
