pub mod api;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod persister;
pub mod pipeline;
pub mod store;

pub use api::{PageSource, ReviewApiClient};
pub use config::{Config, ReplaceMode, Settings};
pub use error::{Result, SyncError};
pub use fetcher::{FetchOutcome, Paginator};
pub use models::*;
pub use persister::{PersistOutcome, Persister};
pub use pipeline::{run, sync, SyncReport};
pub use store::{JsonStore, PostgresStore, ReviewStore};
