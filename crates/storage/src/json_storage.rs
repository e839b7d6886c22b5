//! JSON file storage implementation.
//!
//! Stores each key as its own `.json` file inside a root directory. Key
//! characters outside `[A-Za-z0-9._-]` are percent-encoded in the file name.
//! Keys whose encoded name would be too long for the filesystem are stored
//! under `~<sha256>.json` with the encoded key on the first line of the file.
//! Writes go to a temporary sibling file unique to the write and are renamed
//! into place, so a reader never observes a partially written value.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tracing::debug;

use super::{KvStore, Result, StorageError};

const EXTENSION: &str = "json";

/// Longest encoded key kept as a plain file name.
const MAX_ENCODED_LEN: usize = 160;

/// Marks a file named by key hash.
const HASHED_MARKER: char = '~';

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// File-based JSON storage backend.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

/// Where a key lives on disk.
struct KeyFile {
    path: PathBuf,
    /// Encoded key header for hashed files
    header: Option<String>,
}

impl JsonFileStore {
    /// Create storage rooted at `root`, creating the directory if needed.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        debug!("Opened JSON store at {}", root.display());
        Ok(Self { root })
    }

    fn key_file(&self, key: &str) -> Result<KeyFile> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey("empty key".to_string()));
        }
        let encoded = encode_key(key);
        if encoded.len() <= MAX_ENCODED_LEN {
            return Ok(KeyFile {
                path: self.root.join(format!("{}.{}", encoded, EXTENSION)),
                header: None,
            });
        }
        let digest = hex::encode(Sha256::digest(key.as_bytes()));
        Ok(KeyFile {
            path: self
                .root
                .join(format!("{}{}.{}", HASHED_MARKER, digest, EXTENSION)),
            header: Some(encoded),
        })
    }

    fn tmp_path(&self, path: &Path) -> Result<PathBuf> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StorageError::InvalidKey(path.display().to_string()))?;
        let n = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .root
            .join(format!(".{}.{}-{}.tmp", file_name, std::process::id(), n)))
    }
}

#[async_trait]
impl KvStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let file = self.key_file(key)?;
        let raw = match fs::read_to_string(&file.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let Some(header) = file.header else {
            return Ok(Some(raw));
        };
        match raw.split_once('\n') {
            Some((stored, value)) if stored == header => Ok(Some(value.to_string())),
            _ => Err(StorageError::Other(format!(
                "{} does not hold key '{}'",
                file.path.display(),
                key
            ))),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let file = self.key_file(key)?;
        let tmp = self.tmp_path(&file.path)?;

        let contents = match &file.header {
            Some(header) => format!("{}\n{}", header, value),
            None => value.to_string(),
        };
        fs::write(&tmp, contents.as_bytes()).await?;
        if let Err(e) = fs::rename(&tmp, &file.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let file = self.key_file(key)?;
        fs::remove_file(file.path).await.or_else(|e| {
            if e.kind() == std::io::ErrorKind::NotFound { Ok(()) } else { Err(e) }
        })?;
        Ok(())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut rd = fs::read_dir(&self.root).await?;
        while let Some(entry) = rd.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if stem.starts_with('.') {
                continue;
            }
            let key = if stem.starts_with(HASHED_MARKER) {
                match read_header(&path).await? {
                    Some(header) => decode_key(&header),
                    None => continue,
                }
            } else {
                decode_key(stem)
            };
            if let Some(key) = key {
                if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// First line of a hashed file; `None` if it vanished meanwhile.
async fn read_header(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path).await {
        Ok(raw) => Ok(raw.split_once('\n').map(|(header, _)| header.to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' => out.push(byte as char),
            // A leading dot would collide with temp files
            b'.' if !out.is_empty() => out.push('.'),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

fn decode_key(name: &str) -> Option<String> {
    let bytes = name.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = name.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_encoding_round_trips() {
        for key in ["progress:py101", "all_reminders", "reminder:01HX", "a b/c", ".hidden", "ünï"] {
            let encoded = encode_key(key);
            assert!(!encoded.contains(':'));
            assert!(!encoded.contains('/'));
            assert!(!encoded.starts_with('.'));
            assert_eq!(decode_key(&encoded).as_deref(), Some(key));
        }
    }

    #[tokio::test]
    async fn test_set_get_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).await.unwrap();
        store.set("progress:py101", "{\"a\":1}").await.unwrap();

        let reopened = JsonFileStore::new(dir.path()).await.unwrap();
        assert_eq!(
            reopened.get("progress:py101").await.unwrap().as_deref(),
            Some("{\"a\":1}")
        );
        assert_eq!(reopened.get("progress:other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_keys_skips_temp_and_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).await.unwrap();
        store.set("progress:b", "1").await.unwrap();
        store.set("progress:a", "1").await.unwrap();
        store.set("all_reminders", "[]").await.unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        std::fs::write(dir.path().join(".progress%3Ac.json.tmp"), "x").unwrap();

        let keys = store.keys("progress:").await.unwrap();
        assert_eq!(keys, vec!["progress:a".to_string(), "progress:b".to_string()]);
        assert_eq!(store.keys("").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).await.unwrap();
        store.delete("reminder:none").await.unwrap();
        store.set("reminder:x", "{}").await.unwrap();
        store.delete("reminder:x").await.unwrap();
        assert_eq!(store.get("reminder:x").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_concurrent_sets_to_one_key_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.set("quiz_results:loops-quiz", &format!("{{\"n\":{}}}", i)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let value = store.get("quiz_results:loops-quiz").await.unwrap().unwrap();
        assert!(value.starts_with("{\"n\":"));
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_long_unicode_key_uses_hashed_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).await.unwrap();
        let key = format!("progress:{}", "机器学习基础".repeat(5));
        assert!(encode_key(&key).len() > MAX_ENCODED_LEN);

        store.set(&key, "{\"a\":1}").await.unwrap();
        store.set("progress:py101", "{}").await.unwrap();
        assert_eq!(store.get(&key).await.unwrap().as_deref(), Some("{\"a\":1}"));

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert!(names.iter().all(|n| n.len() < 255));
        assert!(names.iter().any(|n| n.starts_with(HASHED_MARKER)));

        let mut expected = vec![key.clone(), "progress:py101".to_string()];
        expected.sort();
        assert_eq!(store.keys("progress:").await.unwrap(), expected);

        store.delete(&key).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), None);
        assert_eq!(store.keys("progress:").await.unwrap(), vec!["progress:py101".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).await.unwrap();
        assert!(matches!(store.set("", "x").await, Err(StorageError::InvalidKey(_))));
    }
}
