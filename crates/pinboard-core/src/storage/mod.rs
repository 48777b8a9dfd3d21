//! Storage abstraction for persistence.

mod memory;
pub mod payload;

#[cfg(not(target_arch = "wasm32"))]
mod file;

#[cfg(target_arch = "wasm32")]
mod local;

pub use memory::MemoryStorage;
pub use payload::{ExportPayload, ImportError, StoredNotesPayload, export_board, import_board};

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

#[cfg(target_arch = "wasm32")]
pub use local::LocalStorage;

use crate::board::BoardSnapshot;
use thiserror::Error;

/// Key the notes payload is stored under.
pub const NOTES_KEY: &str = "organizer-notes";
/// Key the folders payload is stored under.
pub const FOLDERS_KEY: &str = "organizer-folders";

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Key not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// String key-value store, in the shape of browser local storage.
///
/// Note: On native platforms, implementations must be Send + Sync.
/// On WASM, these bounds are relaxed since it's single-threaded.
#[cfg(not(target_arch = "wasm32"))]
pub trait KeyValueStore: Send + Sync {
    /// Read a value. Missing keys are `Ok(None)`.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Delete a value. Missing keys are not an error.
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// List all keys.
    fn keys(&self) -> StorageResult<Vec<String>>;

    /// Check if a key exists.
    fn contains(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Read a value that must exist.
    fn require(&self, key: &str) -> StorageResult<String> {
        self.get(key)?.ok_or_else(|| StorageError::NotFound(key.to_string()))
    }
}

/// String key-value store (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait KeyValueStore {
    /// Read a value. Missing keys are `Ok(None)`.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Delete a value. Missing keys are not an error.
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// List all keys.
    fn keys(&self) -> StorageResult<Vec<String>>;

    /// Check if a key exists.
    fn contains(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Read a value that must exist.
    fn require(&self, key: &str) -> StorageResult<String> {
        self.get(key)?.ok_or_else(|| StorageError::NotFound(key.to_string()))
    }
}

/// Persists a board as two payloads: notes (with the z-index counter) and folders.
#[derive(Debug)]
pub struct BoardStore<S> {
    store: S,
}

impl<S: KeyValueStore> BoardStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Write both payloads.
    pub fn save(&self, snapshot: &BoardSnapshot) -> StorageResult<()> {
        let notes = StoredNotesPayload {
            notes: snapshot.notes.clone(),
            next_z_index: Some(snapshot.next_z_index),
        };
        let notes_json = serde_json::to_string(&notes).map_err(|e| StorageError::Serialization(e.to_string()))?;
        let folders_json =
            serde_json::to_string(&snapshot.folders).map_err(|e| StorageError::Serialization(e.to_string()))?;

        self.store.set(NOTES_KEY, &notes_json)?;
        self.store.set(FOLDERS_KEY, &folders_json)?;
        log::debug!(
            "Saved {} note(s) and {} folder(s)",
            snapshot.notes.len(),
            snapshot.folders.len()
        );
        Ok(())
    }

    /// Load the board. Never fails: missing, unreadable or malformed payloads
    /// are logged and treated as empty.
    pub fn load(&self) -> BoardSnapshot {
        let notes = self
            .read(NOTES_KEY, payload::parse_stored_notes)
            .unwrap_or_default();
        let folders = self
            .read(FOLDERS_KEY, payload::parse_stored_folders)
            .unwrap_or_default();

        let mut notes_list = notes.notes;
        let unfiled = payload::unfile_orphans(&mut notes_list, &folders);
        if unfiled > 0 {
            log::warn!("Unfiled {unfiled} stored note(s) referencing missing folders");
        }
        let renumbered = payload::renumber_duplicate_z(&mut notes_list);
        if renumbered > 0 {
            log::warn!("Renumbered {renumbered} stored note(s) with duplicate zIndex");
        }

        let highest = notes_list.iter().map(|n| n.z_index).max().unwrap_or(0);
        let next_z_index = notes.next_z_index.unwrap_or(1).max(highest + 1);
        BoardSnapshot {
            notes: notes_list,
            folders,
            next_z_index,
        }
    }

    fn read<T>(&self, key: &str, parse: fn(&str) -> Result<T, ImportError>) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("Failed to read {key}: {e}");
                return None;
            }
        };
        match parse(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Ignoring invalid {key} payload: {e}");
                None
            }
        }
    }

    /// Remove both payloads.
    pub fn clear(&self) -> StorageResult<()> {
        self.store.remove(NOTES_KEY)?;
        self.store.remove(FOLDERS_KEY)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl BoardStore<FileStorage> {
    /// Board store backed by files in the platform data directory.
    pub fn default_location() -> StorageResult<Self> {
        FileStorage::default_location().map(Self::new)
    }
}

#[cfg(target_arch = "wasm32")]
impl BoardStore<LocalStorage> {
    /// Board store backed by the browser's local storage.
    pub fn local() -> StorageResult<Self> {
        LocalStorage::new().map(Self::new)
    }
}
