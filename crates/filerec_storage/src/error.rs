//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while reading or writing a document file.
///
/// Any of these means the backing store is unavailable or unusable;
/// they are surfaced to the caller unmodified and never retried.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file exists but is not valid JSON.
    #[error("cannot parse document file {}: {source}", .path.display())]
    Parse {
        /// Path of the offending file.
        path: PathBuf,
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// The file parsed but does not have the expected structure.
    #[error("document file corrupted: {0}")]
    Corrupted(String),
}

impl StorageError {
    /// Creates a corrupted-document error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted(message.into())
    }
}
