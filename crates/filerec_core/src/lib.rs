//! # Filerec Core
//!
//! Record store engine for filerec: an embedded, file-backed record
//! store with an ActiveRecord-style query interface. It stands in for
//! a relational table when no database is available.
//!
//! This crate provides:
//! - [`Schema`] - static per-entity-type description (keys, primary
//!   key, uniqueness/mandatory/hidden sets, mutators)
//! - [`AttributeBag`] - a record's current and last-persisted values
//! - [`Store`] - create/save/delete/find with constraint enforcement
//! - [`QueryBuilder`] - linear filtering over a document snapshot
//! - [`HashVerifier`] - the injected credential-hashing capability
//!
//! ## Example
//!
//! ```rust
//! use filerec_core::{Config, Schema, Store};
//! use serde_json::json;
//!
//! # fn main() -> filerec_core::CoreResult<()> {
//! # let dir = tempfile::tempdir().unwrap();
//! let schema = Schema::builder("user")
//!     .keys(["id", "name", "email"])
//!     .unique(["email"])
//!     .mandatory(["name", "email"])
//!     .build()?;
//! let store = Store::open(schema, &Config::new(dir.path()))?;
//!
//! let fields = [
//!     ("name".to_string(), json!("Alice")),
//!     ("email".to_string(), json!("alice@example.com")),
//! ]
//! .into_iter()
//! .collect();
//! let record = store.create(&fields)?;
//! assert_eq!(record.get("id"), Some(json!(1)));
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod attributes;
mod config;
mod credentials;
mod error;
mod query;
mod record;
mod schema;
mod store;
pub mod value;

pub use attributes::AttributeBag;
pub use config::{Config, DEFAULT_EXTENSION};
pub use credentials::HashVerifier;
pub use error::{CoreError, CoreResult};
pub use query::{Op, QueryBuilder};
pub use record::Record;
pub use schema::{Mutator, PrimaryKeyKind, Schema, SchemaBuilder};
pub use store::Store;

pub use filerec_storage::{Document, DocumentFile, Entry, StorageError, Value};
