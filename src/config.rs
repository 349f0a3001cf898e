use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, SyncError};

/// Environment variable holding the document store connection string
pub const STORE_URL_VAR: &str = "STORE_URL";
/// Environment variable holding the shop whose reviews are synced
pub const SHOP_ID_VAR: &str = "SHOP_ID";
/// Environment variable holding the review API key
pub const API_KEY_VAR: &str = "API_KEY";

/// Names read when the preferred variable is unset, as written by older `.env` files
const LEGACY_VARS: [(&str, &str); 3] = [
    (STORE_URL_VAR, "MONGOURL"),
    (SHOP_ID_VAR, "SHOPID"),
    (API_KEY_VAR, "APIKEY"),
];

/// Overrides the location of the tuning file
pub const CONFIG_PATH_VAR: &str = "REVIEW_SYNC_CONFIG";

const DEFAULT_CONFIG_PATH: &str = ".review-sync/config.yml";

/// Everything a run needs: required secrets plus tuning
#[derive(Debug, Clone)]
pub struct Settings {
    pub store_url: String,
    pub shop_id: String,
    pub api_key: String,
    pub config: Config,
}

impl Settings {
    /// Load `.env` files, read the required variables and the tuning file.
    ///
    /// The `.env` beside the executable is read first, then the one in the
    /// working directory. Variables already set in the environment win.
    pub fn from_env() -> Result<Self> {
        if let Some(path) = exe_dir_env_file() {
            if dotenvy::from_path(&path).is_ok() {
                debug!(path = %path.display(), "Loaded settings file");
            }
        }
        dotenvy::dotenv().ok();

        let lookup = |key: &str| std::env::var(key).ok();
        let store_url = required_var(STORE_URL_VAR, lookup)?;
        let shop_id = required_var(SHOP_ID_VAR, lookup)?;
        let api_key = required_var(API_KEY_VAR, lookup)?;

        let config = match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) => Config::load_required(path)?,
            Err(_) => Config::load(DEFAULT_CONFIG_PATH)?,
        };

        Ok(Self {
            store_url,
            shop_id,
            api_key,
            config,
        })
    }
}

fn exe_dir_env_file() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    Some(exe.parent()?.join(".env"))
}

/// Read `key`, falling back to its legacy name
fn required_var(key: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<String> {
    let legacy = LEGACY_VARS
        .iter()
        .find(|(preferred, _)| *preferred == key)
        .map(|(_, legacy)| *legacy);

    std::iter::once(key)
        .chain(legacy)
        .filter_map(|name| lookup(name))
        .find(|value| !value.trim().is_empty())
        .ok_or_else(|| match legacy {
            Some(legacy) => SyncError::config(key, format!("{key} (or {legacy}) not set")),
            None => SyncError::config(key, format!("{key} not set")),
        })
}

/// Tuning loaded from YAML; every field has a default
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub fetch: FetchConfig,
    pub store: StoreConfig,
}

/// Review API endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openapi.etsy.com/v3/application".to_string(),
        }
    }
}

/// Pagination policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub page_size: u32,
    pub page_delay_ms: u64,
    /// Stop paging once this many reviews are held. `null` pages until empty.
    pub max_reviews: Option<usize>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            page_delay_ms: 200,
            max_reviews: Some(500),
        }
    }
}

impl FetchConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

/// How the old collection is replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplaceMode {
    /// Drop, then insert. The collection is empty if the insert fails.
    #[default]
    Direct,
    /// Write a staging collection and swap it in atomically
    Staged,
}

/// Document store layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub database: String,
    pub collection: String,
    pub connect_timeout_secs: u64,
    pub replace_mode: ReplaceMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: "bbpcontent".to_string(),
            collection: "reviews".to_string(),
            connect_timeout_secs: 10,
            replace_mode: ReplaceMode::Direct,
        }
    }
}

impl StoreConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Config {
    /// Load a file the user named explicitly; a missing file is an error
    pub fn load_required(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SyncError::config(
                CONFIG_PATH_VAR,
                format!("config file not found: {}", path.display()),
            ));
        }
        Self::load(path)
    }

    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;

        let config: Config = serde_yaml::from_str(&content).map_err(|e| SyncError::Config {
            message: format!("failed to parse {}: {e}", path.display()),
            key: None,
        })?;

        config.validate()?;

        info!(path = %path.display(), "Loaded configuration");

        Ok(config)
    }

    /// Reject values the fetch loop or the store cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.fetch.page_size == 0 {
            return Err(SyncError::config("fetch.page_size", "page size must be at least 1"));
        }
        if !is_valid_collection_name(&self.store.collection) {
            return Err(SyncError::config(
                "store.collection",
                format!("invalid collection name: {:?}", self.store.collection),
            ));
        }
        if !is_valid_collection_name(&self.store.database) {
            return Err(SyncError::config(
                "store.database",
                format!("invalid database name: {:?}", self.store.database),
            ));
        }
        Ok(())
    }
}

/// Names double as SQL identifiers and file stems
pub fn is_valid_collection_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
