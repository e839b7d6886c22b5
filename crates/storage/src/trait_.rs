//! Storage trait abstraction.

use async_trait::async_trait;

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database backend error
    #[error("Database error: {0}")]
    Database(String),

    /// Key cannot be stored by this backend
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// String key-value store.
///
/// Implementations are injected into the ledgers; no transactionality is
/// assumed beyond a single `set` being all-or-nothing.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the value stored under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// All keys starting with `prefix`, sorted.
    async fn keys(&self, prefix: &str) -> Result<Vec<String>>;
}
