//! # Filerec Storage
//!
//! Document file storage for filerec.
//!
//! One entity type maps to exactly one JSON document file: an object
//! keyed by the stringified primary-key value, each value being the
//! field mapping for one record. This crate owns everything about that
//! file and nothing about what is inside the field mappings:
//!
//! - [`Document`] - the ordered in-memory form of one file
//! - [`DocumentFile`] - path resolution, load, atomic persist, locking
//! - [`absolute_path`] - lexical `.`/`..` normalization
//!
//! ## Design Principles
//!
//! - Absence of the file is equivalent to an empty document
//! - Writes are atomic from a reader's point of view (temp + rename)
//! - Entry insertion order is preserved across rewrites
//! - Higher layers own all schema interpretation

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod document;
mod error;
mod path;

pub use document::{Document, DocumentFile, Entry, FileLock};
pub use error::{StorageError, StorageResult};
pub use path::absolute_path;

pub use serde_json::Value;
