//! The record store: CRUD and the save path for one entity type.

use crate::attributes::AttributeBag;
use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::query::QueryBuilder;
use crate::record::Record;
use crate::schema::{PrimaryKeyKind, Schema};
use crate::value;
use filerec_storage::{Document, DocumentFile, Entry, Value};
use parking_lot::Mutex;
use std::fs;
use std::io;
use std::sync::Arc;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

/// Timestamp format for "created at" / "updated at" fields.
const TIMESTAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// The record store for one entity type.
///
/// Composes the [`Schema`] with the backing [`DocumentFile`] and
/// enforces the schema's constraints on every save. The handle is
/// cheap to clone; all clones share the same write lock.
///
/// The document is never cached between operations: every operation
/// that needs it performs a fresh load, mutates an in-memory copy, and
/// writes the whole copy back. Each load-validate-merge-persist
/// sequence runs inside an exclusive critical section (an in-process
/// mutex plus an advisory file lock), so concurrent saves against the
/// same entity type cannot lose writes or collide on auto-incremented
/// keys.
#[derive(Debug, Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

#[derive(Debug)]
struct StoreInner {
    schema: Arc<Schema>,
    file: DocumentFile,
    write_lock: Mutex<()>,
}

impl Store {
    /// Opens the store for `schema` under the configured directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the base directory does not exist and
    /// `create_if_missing` is off, or cannot be created.
    pub fn open(schema: Schema, config: &Config) -> CoreResult<Self> {
        if !config.directory.exists() {
            if config.create_if_missing {
                fs::create_dir_all(&config.directory)
                    .map_err(filerec_storage::StorageError::from)?;
            } else {
                return Err(CoreError::Storage(
                    io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("store directory does not exist: {}", config.directory.display()),
                    )
                    .into(),
                ));
            }
        }

        let file = DocumentFile::new(&config.directory, schema.file_name(), &config.extension);

        Ok(Self {
            inner: Arc::new(StoreInner {
                schema: Arc::new(schema),
                file,
                write_lock: Mutex::new(()),
            }),
        })
    }

    /// Returns the schema this store enforces.
    #[must_use]
    pub fn schema(&self) -> &Arc<Schema> {
        &self.inner.schema
    }

    /// Constructs a new, unsaved record.
    #[must_use]
    pub fn new_record(&self) -> Record {
        Record::new(self.clone())
    }

    /// Creates and persists a record from `fields`.
    ///
    /// Applies every field, runs the full save path, and returns the
    /// persisted record with its primary key assigned.
    ///
    /// # Errors
    ///
    /// Fails with any error from [`Record::save`].
    pub fn create(&self, fields: &Entry) -> CoreResult<Record> {
        let mut record = self.new_record();
        record.set_many(fields);
        record.save()?;
        Ok(record)
    }

    /// Looks up a record by primary-key value.
    ///
    /// Returns `None` if no entry matches. A numeric id matches its
    /// stringified document key and vice versa.
    ///
    /// # Errors
    ///
    /// Fails if the document cannot be loaded.
    pub fn find(&self, id: &Value) -> CoreResult<Option<Record>> {
        let document = self.inner.file.load()?;
        Ok(self.lookup(&document, id))
    }

    /// As [`Store::find`], but fails when no record matches.
    ///
    /// # Errors
    ///
    /// Fails with `NotFound` if no entry matches, or if the document
    /// cannot be loaded.
    pub fn find_or_fail(&self, id: &Value) -> CoreResult<Record> {
        self.find(id)?.ok_or_else(|| {
            CoreError::not_found(self.inner.schema.entity(), value::to_key_string(id))
        })
    }

    /// Returns the first record whose `key` field equals `needle`.
    ///
    /// # Errors
    ///
    /// Fails if the document cannot be loaded.
    pub fn find_by(&self, key: &str, needle: &Value) -> CoreResult<Option<Record>> {
        Ok(self.query()?.where_eq(key, needle).first())
    }

    /// Applies `fields` (except the primary key) to the record with
    /// key `id`, saves, and returns the refreshed record.
    ///
    /// # Errors
    ///
    /// Fails with `NotFound` if no record matches, or with any error
    /// from [`Record::save`].
    pub fn update(&self, id: &Value, fields: &Entry) -> CoreResult<Record> {
        let mut record = self.find_or_fail(id)?;
        let pk = self.inner.schema.primary_key();

        for (key, val) in fields {
            if key == pk {
                continue;
            }
            record.set(key, val.clone());
        }

        record.save()?;
        record.refresh()?;
        Ok(record)
    }

    /// Removes the record with key `id` and persists the removal.
    ///
    /// Returns whether a record was actually removed.
    ///
    /// # Errors
    ///
    /// Fails if the document cannot be loaded or persisted.
    pub fn destroy(&self, id: &Value) -> CoreResult<bool> {
        let _guard = self.inner.write_lock.lock();
        let _file_lock = self.inner.file.lock_exclusive()?;

        let mut document = self.inner.file.load()?;
        let Some(key) = self.resolve_key(&document, id) else {
            return Ok(false);
        };

        let removed = document.remove(&key);
        if removed {
            self.inner.file.persist(&document)?;
            tracing::debug!(entity = self.inner.schema.entity(), key = %key, "destroyed record");
        }
        Ok(removed)
    }

    /// Every record in document order, or `None` if the store is
    /// empty.
    ///
    /// # Errors
    ///
    /// Fails if the document cannot be loaded.
    pub fn all(&self) -> CoreResult<Option<Vec<Record>>> {
        Ok(self.query()?.all())
    }

    /// Begins a query over a fresh snapshot of the document.
    ///
    /// # Errors
    ///
    /// Fails if the document cannot be loaded.
    pub fn query(&self) -> CoreResult<QueryBuilder> {
        let document = self.inner.file.load()?;
        Ok(QueryBuilder::new(self.clone(), document.snapshot()))
    }

    /// Runs the save path for a record's attribute state.
    ///
    /// Inside the exclusive critical section: load the document once,
    /// detect insert vs update, assign the primary key if needed,
    /// validate mandatory and unique constraints, stamp timestamps,
    /// merge, persist, and sync `original` to `current`.
    pub(crate) fn save_bag(&self, bag: &mut AttributeBag) -> CoreResult<()> {
        let _guard = self.inner.write_lock.lock();
        let _file_lock = self.inner.file.lock_exclusive()?;

        let schema = &self.inner.schema;
        let pk = schema.primary_key();
        let mut document = self.inner.file.load()?;

        let existing_key: Option<String> = bag
            .original(pk)
            .filter(|v| !value::is_empty(v))
            .map(value::to_key_string);
        let is_update = existing_key.is_some();

        if is_update {
            // The primary key is immutable once assigned
            if let Some(original) = bag.original(pk).cloned() {
                bag.set(pk, original);
            }
        } else if schema.primary_key_kind() == PrimaryKeyKind::AutoIncrement {
            let current = bag.raw(pk).cloned().unwrap_or(Value::Null);
            if value::is_empty(&current) {
                bag.set(pk, Value::from(next_primary_key(&document, pk)));
            }
        }

        for key in schema.keys() {
            let val = bag.raw(key).cloned().unwrap_or(Value::Null);

            if value::is_empty(&val) && schema.is_mandatory(key) {
                return Err(CoreError::mandatory_field_missing(key.as_str()));
            }

            if schema.is_unique(key) {
                if key == pk {
                    // An update never rewrites its own key; only an
                    // insert can collide on the primary key.
                    if !is_update
                        && (document.contains_key(&value::to_key_string(&val))
                            || has_conflict(&document, pk, &val, None))
                    {
                        return Err(CoreError::duplicate_unique_field(key.as_str()));
                    }
                } else if has_conflict(&document, key, &val, existing_key.as_deref()) {
                    return Err(CoreError::duplicate_unique_field(key.as_str()));
                }
            }

            if schema.created_at_key() == Some(key.as_str()) && value::is_empty(&val) {
                bag.set(key, Value::String(now_string()));
            }
            if schema.updated_at_key() == Some(key.as_str()) {
                bag.set(key, Value::String(now_string()));
            }
        }

        let own_key = match &existing_key {
            Some(key) => key.clone(),
            None => value::to_key_string(bag.raw(pk).unwrap_or(&Value::Null)),
        };

        if let Some(entry) = document.entry_mut(&own_key) {
            for (key, val) in bag.current() {
                if key != pk {
                    entry.insert(key.clone(), val.clone());
                }
            }
        } else {
            document.insert(own_key.clone(), bag.current().clone());
        }

        self.inner.file.persist(&document)?;
        bag.sync_original();

        tracing::debug!(
            entity = schema.entity(),
            key = %own_key,
            update = is_update,
            "saved record"
        );
        Ok(())
    }

    /// Hydrates the document entry matching `id`, if any.
    fn lookup(&self, document: &Document, id: &Value) -> Option<Record> {
        let key = self.resolve_key(document, id)?;
        document
            .entry(&key)
            .map(|entry| Record::hydrated(self.clone(), entry))
    }

    /// Resolves `id` to a document key, normalizing number-vs-string.
    fn resolve_key(&self, document: &Document, id: &Value) -> Option<String> {
        let direct = value::to_key_string(id);
        if document.contains_key(&direct) {
            return Some(direct);
        }
        document
            .keys()
            .find(|key| value::values_equal(&Value::String((*key).clone()), id))
            .cloned()
    }
}

/// Scans the document for another entry whose `field` equals
/// `candidate`, skipping the entry under `ignore_key`.
fn has_conflict(document: &Document, field: &str, candidate: &Value, ignore_key: Option<&str>) -> bool {
    document.iter().any(|(doc_key, entry)| {
        if ignore_key == Some(doc_key.as_str()) {
            return false;
        }
        let stored = entry.get(field).cloned().unwrap_or(Value::Null);
        value::values_equal(&stored, candidate)
    })
}

/// Computes the next auto-incremented primary key.
///
/// `max` over the document's primary-key values plus one; an empty
/// document yields `1`. Gaps left by deletions are not reused.
fn next_primary_key(document: &Document, pk: &str) -> i64 {
    document
        .iter()
        .filter_map(|(doc_key, entry)| {
            entry
                .get(pk)
                .and_then(value::as_i64)
                .or_else(|| doc_key.trim().parse().ok())
        })
        .max()
        .unwrap_or(0)
        + 1
}

/// Current instant as a `YYYY-MM-DD hh:mm:ss` UTC string.
fn now_string() -> String {
    OffsetDateTime::now_utc()
        .format(TIMESTAMP_FORMAT)
        .unwrap_or_else(|_| String::new())
}
