//! Error types for review-sync
//!
//! Every variant is fatal for a run. Nothing in the crate retries; errors travel
//! up to the binary, which reports them and exits non-zero.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for review-sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Main error type for a sync run
#[derive(Debug, Error)]
pub enum SyncError {
    /// A required setting is missing or a tuning value is invalid
    #[error("configuration error: {message}")]
    Config {
        message: String,
        /// The setting that caused the error (e.g. "SHOP_ID")
        key: Option<String>,
    },

    /// The review API request failed or returned a non-success status
    #[error("review API request failed: {0}")]
    Transport(String),

    /// The review API answered with a body that is not a review page
    #[error("failed to decode review page at offset {offset}: {source}")]
    Decode {
        offset: u64,
        #[source]
        source: serde_json::Error,
    },

    /// The document store could not be reached in time
    #[error("failed to connect to document store: {0}")]
    StoreConnect(String),

    /// Dropping or writing the collection failed
    #[error("document store write failed during {stage}: {message}")]
    StoreWrite {
        /// "drop", "insert" or "swap"
        stage: &'static str,
        message: String,
    },

    /// Reading the collection back failed
    #[error("document store read failed: {0}")]
    StoreRead(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SyncError {
    pub(crate) fn config(key: &str, message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }

    pub(crate) fn connect_timeout(timeout: Duration) -> Self {
        Self::StoreConnect(format!("timed out after {}s", timeout.as_secs()))
    }

    pub(crate) fn write(stage: &'static str, err: impl std::fmt::Display) -> Self {
        Self::StoreWrite {
            stage,
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_names_key() {
        let err = SyncError::config("API_KEY", "API_KEY not set");
        match &err {
            SyncError::Config { key, .. } => assert_eq!(key.as_deref(), Some("API_KEY")),
            other => panic!("unexpected variant: {other:?}"),
        }
        assert_eq!(err.to_string(), "configuration error: API_KEY not set");
    }

    #[test]
    fn test_write_error_mentions_stage() {
        let err = SyncError::write("insert", "connection reset");
        assert_eq!(
            err.to_string(),
            "document store write failed during insert: connection reset"
        );
    }

    #[test]
    fn test_connect_timeout_message() {
        let err = SyncError::connect_timeout(Duration::from_secs(10));
        assert!(err.to_string().contains("timed out after 10s"));
    }
}
