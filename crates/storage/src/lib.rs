//! Key-value storage abstraction and implementations for StudyMate.
//!
//! Records are stored as opaque strings under string keys. Backends: an
//! in-memory map, a directory of JSON files (one per key) and, behind the
//! `sqlite` feature, a single SQLite table.

#![warn(missing_docs)]

pub mod trait_;
pub mod memory;
pub mod json_storage;
#[cfg(feature = "sqlite")]
pub mod sqlite_storage;
pub mod locks;
pub mod config;

pub use trait_::{KvStore, StorageError, Result};
pub use memory::MemoryStore;
pub use json_storage::JsonFileStore;
#[cfg(feature = "sqlite")]
pub use sqlite_storage::SqliteStore;
pub use locks::KeyLocks;
pub use config::{open_store, StoreBackend, StoreConfig};
