//! Durable key/value storage for the session record.
//!
//! In a browser this is local storage; on a desktop or CLI client it is a
//! small JSON file. Either way the interface is the same string-keyed
//! map, with one addition: writes come in batches that land all together
//! or not at all, because the session record and the token mirror must
//! never exist one without the other.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

/// Errors from the durable storage backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// The backend couldn't be read at all.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A batch couldn't be written. Nothing from it was applied.
    #[error("storage write failed: {0}")]
    WriteFailed(String),
}

/// One write in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageOp {
    Put { key: String, value: String },
    Delete { key: String },
}

impl StorageOp {
    pub fn put(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        Self::Delete { key: key.into() }
    }
}

/// A string-keyed durable store.
///
/// Synchronous on purpose: browser local storage is, and every write here
/// is a few hundred bytes.
pub trait Storage: Send + Sync + 'static {
    /// Reads one key. `Ok(None)` if it isn't set.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Applies every operation in `batch`, or none of them.
    fn apply(&self, batch: &[StorageOp]) -> Result<(), StorageError>;
}

/// Tests and apps that need to inspect the storage after handing it to a
/// session can share it through an `Arc`.
impl<T: Storage> Storage for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn apply(&self, batch: &[StorageOp]) -> Result<(), StorageError> {
        (**self).apply(batch)
    }
}

fn apply_to_map<M>(map: &mut M, batch: &[StorageOp])
where
    M: MapLike,
{
    for op in batch {
        match op {
            StorageOp::Put { key, value } => map.put(key.clone(), value.clone()),
            StorageOp::Delete { key } => map.delete(key),
        }
    }
}

trait MapLike {
    fn put(&mut self, key: String, value: String);
    fn delete(&mut self, key: &str);
}

impl MapLike for HashMap<String, String> {
    fn put(&mut self, key: String, value: String) {
        self.insert(key, value);
    }

    fn delete(&mut self, key: &str) {
        self.remove(key);
    }
}

impl MapLike for BTreeMap<String, String> {
    fn put(&mut self, key: String, value: String) {
        self.insert(key, value);
    }

    fn delete(&mut self, key: &str) {
        self.remove(key);
    }
}

// ---------------------------------------------------------------------------
// MemoryStorage
// ---------------------------------------------------------------------------

/// Storage that lives as long as the process. Batches are applied under a
/// single lock.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a raw value, bypassing the session layer. Used to seed
    /// storage as a previous run (or another app) left it.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.lock().insert(key.into(), value.into());
    }

    /// Reads a raw value.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.raw(key))
    }

    fn apply(&self, batch: &[StorageOp]) -> Result<(), StorageError> {
        apply_to_map(&mut *self.entries.lock(), batch);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileStorage
// ---------------------------------------------------------------------------

/// Storage backed by one JSON object on disk.
///
/// Each batch rewrites the whole document to a sibling temp file and
/// renames it over the original, so a crash mid-write leaves the previous
/// version intact.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(BTreeMap::new());
            }
            Err(e) => return Err(StorageError::Unavailable(e.to_string())),
        };
        serde_json::from_str(&text)
            .map_err(|e| StorageError::Unavailable(e.to_string()))
    }

    fn write_all(
        &self,
        entries: &BTreeMap<String, String>,
    ) -> Result<(), StorageError> {
        let text = serde_json::to_string_pretty(entries)
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, text)
            .and_then(|()| fs::rename(&tmp, &self.path))
            .map_err(|e| StorageError::WriteFailed(e.to_string()))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock();
        Ok(self.read_all()?.remove(key))
    }

    fn apply(&self, batch: &[StorageOp]) -> Result<(), StorageError> {
        let _guard = self.lock.lock();
        // An unreadable document is replaced rather than blocking every
        // future write; the caller only ever rewrites whole records.
        let mut entries = self.read_all().unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "replacing unreadable storage file");
            BTreeMap::new()
        });
        apply_to_map(&mut entries, batch);
        self.write_all(&entries)
    }
}
