//! Snapshot persistence port for the cart and wishlist stores.
//!
//! The stores write their entire state through this port after every
//! mutation and rehydrate from it once when they are opened. Production
//! uses [`FileSnapshotStore`] (one JSON file per key, replaced atomically);
//! tests use [`MemorySnapshotStore`].

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;

/// Snapshot read/write failure.
///
/// Callers treat these as transient: stores log them and keep serving from
/// memory rather than surfacing them to the UI.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Durable key-value persistence for store snapshots.
///
/// Implementations must replace the value for a key atomically; the stores
/// never perform multi-key updates.
pub trait SnapshotStore: Send + Sync {
    /// Load the snapshot stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read or the stored
    /// bytes are not valid JSON.
    fn load(&self, key: &str) -> Result<Option<serde_json::Value>, PersistenceError>;

    /// Replace the snapshot stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    fn save(&self, key: &str, value: &serde_json::Value) -> Result<(), PersistenceError>;
}

/// File-backed snapshot store: one JSON file per key under a data directory.
///
/// Writes go to a temporary file first and are renamed into place, so a
/// reader never observes a torn snapshot. Two sessions sharing a key
/// overwrite each other last-write-wins; that weak-consistency policy is
/// documented in the `store` module.
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    /// Create a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys come from cookie-held session ids; sanitize anyway so a
        // forged cookie can never traverse out of the data directory.
        let safe: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self, key: &str) -> Result<Option<serde_json::Value>, PersistenceError> {
        let path = self.path_for(key);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn save(&self, key: &str, value: &serde_json::Value) -> Result<(), PersistenceError> {
        let path = self.path_for(key);
        // Each writer gets its own temp file. Two requests for the same
        // session can save concurrently, and a shared temp path would let
        // one truncate the other's half-written snapshot before the rename.
        let tmp = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4()));
        {
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(&serde_json::to_vec(value)?)?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// In-memory snapshot store used by unit tests.
///
/// `fail_writes` makes every `save` return an error, exercising the stores'
/// degrade-gracefully path.
#[derive(Default)]
pub struct MemorySnapshotStore {
    entries: Mutex<HashMap<String, serde_json::Value>>,
    fail_writes: bool,
}

impl MemorySnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes always fail.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            fail_writes: true,
        }
    }

    /// Number of stored snapshots.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned (test-only type).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().expect("snapshot lock").len()
    }

    /// Whether the store holds no snapshots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self, key: &str) -> Result<Option<serde_json::Value>, PersistenceError> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn save(&self, key: &str, value: &serde_json::Value) -> Result<(), PersistenceError> {
        if self.fail_writes {
            return Err(PersistenceError::Io(std::io::Error::other(
                "writes disabled",
            )));
        }
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.to_string(), value.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trips() {
        let dir = std::env::temp_dir().join(format!("clementine-test-{}", uuid::Uuid::new_v4()));
        let store = FileSnapshotStore::new(&dir).expect("create dir");

        let value = serde_json::json!({ "items": [{ "id": "p1", "quantity": 2 }] });
        store.save("cart-abc", &value).expect("save");
        let loaded = store.load("cart-abc").expect("load");
        assert_eq!(loaded, Some(value));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn file_store_missing_key_is_none() {
        let dir = std::env::temp_dir().join(format!("clementine-test-{}", uuid::Uuid::new_v4()));
        let store = FileSnapshotStore::new(&dir).expect("create dir");
        assert!(store.load("nope").expect("load").is_none());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn file_store_sanitizes_keys() {
        let dir = std::env::temp_dir().join(format!("clementine-test-{}", uuid::Uuid::new_v4()));
        let store = FileSnapshotStore::new(&dir).expect("create dir");

        let value = serde_json::json!({ "items": [] });
        store.save("../../etc/passwd", &value).expect("save");
        // The write must land inside the data directory.
        assert!(store.load("../../etc/passwd").expect("load").is_some());
        // Dots and slashes alike collapse to underscores.
        assert!(dir.join("______etc_passwd.json").exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn concurrent_saves_to_one_key_never_tear_the_snapshot() {
        let dir = std::env::temp_dir().join(format!("clementine-test-{}", uuid::Uuid::new_v4()));
        let store = std::sync::Arc::new(FileSnapshotStore::new(&dir).expect("create dir"));

        let handles: Vec<_> = (0..4)
            .map(|writer| {
                let store = std::sync::Arc::clone(&store);
                std::thread::spawn(move || {
                    let value = serde_json::json!({ "writer": writer, "items": vec![writer; 64] });
                    for _ in 0..25 {
                        store.save("cart-shared", &value).expect("save");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("writer thread");
        }

        // Whichever write won, the published file is one intact snapshot.
        let loaded = store
            .load("cart-shared")
            .expect("load")
            .expect("snapshot present");
        assert!(loaded.get("writer").is_some());
        assert_eq!(loaded["items"].as_array().map(Vec::len), Some(64));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn failing_memory_store_errors_on_save() {
        let store = MemorySnapshotStore::failing();
        let err = store.save("k", &serde_json::json!({})).unwrap_err();
        assert!(matches!(err, PersistenceError::Io(_)));
    }
}
