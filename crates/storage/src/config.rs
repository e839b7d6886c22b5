//! Store selection and construction.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use super::{JsonFileStore, KvStore, MemoryStore, Result, StorageError};

/// Available storage backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process-local map, lost on exit
    Memory,
    /// One JSON file per key
    Json,
    /// SQLite database (requires the `sqlite` feature)
    Sqlite,
}

impl StoreBackend {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Memory => "memory",
            StoreBackend::Json => "json",
            StoreBackend::Sqlite => "sqlite",
        }
    }
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "json" => Ok(StoreBackend::Json),
            "sqlite" => Ok(StoreBackend::Sqlite),
            other => Err(StorageError::Other(format!("unknown store backend '{}'", other))),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Backend to open
    pub backend: StoreBackend,
    /// Data directory
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Json,
            path: ".studymate".into(),
        }
    }
}

impl StoreConfig {
    /// SQLite database file inside the data directory.
    pub fn database_path(&self) -> PathBuf {
        self.path.join("studymate.db")
    }
}

/// Open the store described by `config`.
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn KvStore>> {
    info!("Opening {} store at {}", config.backend, config.path.display());
    match config.backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreBackend::Json => Ok(Arc::new(JsonFileStore::new(&config.path).await?)),
        StoreBackend::Sqlite => open_sqlite(config).await,
    }
}

#[cfg(feature = "sqlite")]
async fn open_sqlite(config: &StoreConfig) -> Result<Arc<dyn KvStore>> {
    tokio::fs::create_dir_all(&config.path).await?;
    let store = super::SqliteStore::new_from_path(&config.database_path()).await?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "sqlite"))]
async fn open_sqlite(_config: &StoreConfig) -> Result<Arc<dyn KvStore>> {
    Err(StorageError::Other(
        "sqlite backend not compiled in (enable the `sqlite` feature)".to_string(),
    ))
}
