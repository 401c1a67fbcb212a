use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::StorageError;

/// Fixed key of the persistent slot holding the bearer token.
pub const TOKEN_KEY: &str = "token";

/// What a backend hands back from `load`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRecord {
    pub token: String,
    /// When the token was written, if the backend records it.
    #[serde(default)]
    pub stored_at: Option<DateTime<Utc>>,
}

impl SlotRecord {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            stored_at: Some(Utc::now()),
        }
    }
}

/// A single key-value slot that survives process restarts.
///
/// Only `SessionStore` writes through this trait, and only on login and
/// logout. `clear` on an empty slot is not an error.
pub trait TokenStorage {
    fn load(&self) -> Result<Option<SlotRecord>, StorageError>;
    fn save(&self, token: &str) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;

    /// Short name used in logs and the status bar.
    fn describe(&self) -> String;
}

// ============================================================================
// In-memory slot
// ============================================================================

/// Process-local slot. Clones share the same slot, so a second
/// `SessionStore` opened over a clone sees what the first one wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<Option<SlotRecord>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot pre-populated with `token`, as if written by an earlier run.
    pub fn with_token(token: impl Into<String>) -> Self {
        let storage = Self::new();
        if let Ok(mut slot) = storage.slot.lock() {
            *slot = Some(SlotRecord::new(token));
        }
        storage
    }

    /// Raw slot contents, bypassing any session.
    pub fn peek(&self) -> Option<String> {
        self.slot
            .lock()
            .ok()
            .and_then(|slot| slot.as_ref().map(|r| r.token.clone()))
    }
}

impl TokenStorage for MemoryStorage {
    fn load(&self) -> Result<Option<SlotRecord>, StorageError> {
        let slot = self.slot.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(slot.clone())
    }

    fn save(&self, token: &str) -> Result<(), StorageError> {
        let mut slot = self.slot.lock().map_err(|_| StorageError::Poisoned)?;
        *slot = Some(SlotRecord::new(token));
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut slot = self.slot.lock().map_err(|_| StorageError::Poisoned)?;
        *slot = None;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

// ============================================================================
// File slot
// ============================================================================

/// Slot persisted as `<data_dir>/token.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    data_dir: PathBuf,
}

impl FileStorage {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.json", TOKEN_KEY))
    }

    fn read(path: &Path) -> Result<Option<SlotRecord>, StorageError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::io(path, e)),
        };
        let record: SlotRecord = serde_json::from_str(&contents)?;
        Ok(Some(record))
    }
}

impl TokenStorage for FileStorage {
    fn load(&self) -> Result<Option<SlotRecord>, StorageError> {
        let path = self.path();
        let record = Self::read(&path)?;
        debug!(path = %path.display(), found = record.is_some(), "Token slot read");
        Ok(record)
    }

    fn save(&self, token: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.data_dir)
            .map_err(|e| StorageError::io(&self.data_dir, e))?;

        let path = self.path();
        let contents = serde_json::to_string_pretty(&SlotRecord::new(token))?;

        // Write to a sibling and rename so a crash never leaves half a token.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, contents).map_err(|e| StorageError::io(&tmp, e))?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(StorageError::io(&path, e));
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let path = self.path();
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }

    fn describe(&self) -> String {
        format!("file ({})", self.path().display())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_clones_share_slot() {
        let a = MemoryStorage::new();
        let b = a.clone();
        a.save("abc123").unwrap();
        assert_eq!(b.load().unwrap().map(|r| r.token), Some("abc123".to_string()));
        b.clear().unwrap();
        assert_eq!(a.peek(), None);
    }

    #[test]
    fn test_memory_storage_clear_when_empty() {
        let storage = MemoryStorage::new();
        assert!(storage.clear().is_ok());
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn test_file_storage_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn test_file_storage_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested"));

        storage.save("abc123").unwrap();
        let record = storage.load().unwrap().unwrap();
        assert_eq!(record.token, "abc123");
        assert!(record.stored_at.is_some());
        assert!(storage.path().exists());

        storage.clear().unwrap();
        assert!(!storage.path().exists());
        // Second clear is a no-op
        storage.clear().unwrap();
    }

    #[test]
    fn test_file_storage_overwrites_previous_token() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        storage.save("first").unwrap();
        storage.save("second").unwrap();
        assert_eq!(storage.load().unwrap().unwrap().token, "second");
        assert!(!storage.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_file_storage_failed_rename_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        // A non-empty directory in the way makes the rename fail
        std::fs::create_dir_all(storage.path().join("occupied")).unwrap();

        assert!(matches!(storage.save("abc123"), Err(StorageError::Io { .. })));
        assert!(!storage.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_file_storage_malformed_contents() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        std::fs::write(storage.path(), "not json").unwrap();
        assert!(matches!(storage.load(), Err(StorageError::Malformed(_))));
    }

    #[test]
    fn test_slot_record_without_timestamp() {
        let record: SlotRecord = serde_json::from_str(r#"{"token":"abc"}"#).unwrap();
        assert_eq!(record.token, "abc");
        assert!(record.stored_at.is_none());
    }
}
