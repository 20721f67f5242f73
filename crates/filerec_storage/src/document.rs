//! The on-disk document and its backing file.
//!
//! A document file holds everything the store knows about one entity
//! type:
//!
//! ```text
//! <directory>/<name>.<extension>        # the document itself
//! <directory>/<name>.<extension>.lock   # advisory lock sidecar
//! ```
//!
//! The document is a single JSON object mapping the stringified
//! primary-key value to the field mapping of one record. There is no
//! version header; a missing file is equivalent to an empty document.

use crate::error::{StorageError, StorageResult};
use crate::path::absolute_path;
use fs2::FileExt;
use serde_json::{Map, Value};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// The field mapping of a single record: field name to value.
pub type Entry = Map<String, Value>;

/// The full in-memory form of one entity type's file.
///
/// Keys are stringified primary-key values; values are [`Entry`]
/// field mappings. Insertion order is preserved across load/persist
/// cycles so that rewrites produce stable diffs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    entries: Map<String, Value>,
}

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the document has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if an entry exists under `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the entry stored under `key`, if any.
    #[must_use]
    pub fn entry(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key).and_then(Value::as_object)
    }

    /// Returns a mutable reference to the entry stored under `key`.
    pub fn entry_mut(&mut self, key: &str) -> Option<&mut Entry> {
        self.entries.get_mut(key).and_then(Value::as_object_mut)
    }

    /// Inserts or replaces the entry under `key`.
    pub fn insert(&mut self, key: String, entry: Entry) {
        self.entries.insert(key, Value::Object(entry));
    }

    /// Removes the entry under `key`, reporting whether one existed.
    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Iterates over `(key, entry)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Entry)> {
        self.entries
            .iter()
            .filter_map(|(k, v)| v.as_object().map(|e| (k, e)))
    }

    /// Iterates over document keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Clones every entry, in insertion order.
    ///
    /// This is the materialized snapshot the query layer filters over.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Entry> {
        self.iter().map(|(_, entry)| entry.clone()).collect()
    }

    /// Returns the underlying map for serialization.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.entries
    }

    /// Builds a document from a parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Corrupted` if the value is not an object
    /// of objects.
    pub fn from_value(value: Value) -> StorageResult<Self> {
        let entries = match value {
            Value::Object(map) => map,
            other => {
                return Err(StorageError::corrupted(format!(
                    "expected top-level object, got {}",
                    json_kind(&other)
                )))
            }
        };

        for (key, entry) in &entries {
            if !entry.is_object() {
                return Err(StorageError::corrupted(format!(
                    "entry {key:?} is not an object, got {}",
                    json_kind(entry)
                )));
            }
        }

        Ok(Self { entries })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Handle to one entity type's document file.
///
/// Owns path resolution and the load/persist codec. Persisting is
/// atomic from a reader's point of view: the document is written to a
/// temporary file, synced, and renamed over the target, so a partial
/// write is never observable as a parseable document.
#[derive(Debug, Clone)]
pub struct DocumentFile {
    path: PathBuf,
    lock_path: PathBuf,
}

impl DocumentFile {
    /// Resolves the document file for `name` under `directory`.
    ///
    /// The path is `<directory>/<name>.<extension>`, lexically
    /// normalized before use.
    #[must_use]
    pub fn new(directory: &Path, name: &str, extension: &str) -> Self {
        let path = absolute_path(&directory.join(format!("{name}.{extension}")));

        let mut lock_name = path.as_os_str().to_os_string();
        lock_name.push(".lock");

        Self {
            path,
            lock_path: PathBuf::from(lock_name),
        }
    }

    /// Returns the resolved document path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the full document.
    ///
    /// A missing or empty file yields an empty document.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed
    /// as JSON, or does not have the expected object-of-objects shape.
    pub fn load(&self) -> StorageResult<Document> {
        if !self.path.exists() {
            return Ok(Document::new());
        }

        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(Document::new());
        }

        let value: Value = serde_json::from_str(&raw).map_err(|source| StorageError::Parse {
            path: self.path.clone(),
            source,
        })?;

        Document::from_value(value)
    }

    /// Persists the full document, replacing the file contents.
    ///
    /// Uses write-then-rename for atomicity:
    /// 1. Write to `<path>.tmp`
    /// 2. Sync the temporary file to disk
    /// 3. Rename it over the document file
    /// 4. Fsync the directory so the rename is durable
    ///
    /// # Errors
    ///
    /// Returns an error on any I/O failure; the previous file contents
    /// remain intact in that case.
    pub fn persist(&self, document: &Document) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut tmp_name = self.path.as_os_str().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        let data = serde_json::to_vec(document.as_map()).map_err(|source| StorageError::Parse {
            path: self.path.clone(),
            source,
        })?;

        let mut file = File::create(&tmp_path)?;
        file.write_all(&data)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp_path, &self.path)?;
        self.sync_directory()?;

        tracing::debug!(path = %self.path.display(), entries = document.len(), "persisted document");
        Ok(())
    }

    /// Acquires an exclusive advisory lock for this document file.
    ///
    /// Blocks until the lock is available. The lock lives on a sidecar
    /// `.lock` file so that the document itself can be renamed over
    /// while the lock is held. In-process callers must additionally
    /// serialize through their own mutex; the file lock covers other
    /// processes.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock file cannot be created or locked.
    pub fn lock_exclusive(&self) -> StorageResult<FileLock> {
        if let Some(parent) = self.lock_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)?;
        file.lock_exclusive()?;

        Ok(FileLock { _file: file })
    }

    #[cfg(unix)]
    fn sync_directory(&self) -> StorageResult<()> {
        // On Unix, fsync on a directory syncs the directory entries
        if let Some(parent) = self.path.parent() {
            let dir = File::open(parent)?;
            dir.sync_all()?;
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_directory(&self) -> StorageResult<()> {
        // Windows NTFS journaling provides metadata durability
        Ok(())
    }
}

/// Guard for an exclusive advisory lock on a document file.
///
/// The lock is released when the guard is dropped (the `fs2` crate
/// unlocks on close).
#[derive(Debug)]
pub struct FileLock {
    _file: File,
}
