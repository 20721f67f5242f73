//! One in-memory instance of an entity.

use crate::attributes::AttributeBag;
use crate::credentials::HashVerifier;
use crate::error::CoreResult;
use crate::store::Store;
use filerec_storage::{Entry, Value};

/// A single record of an entity type.
///
/// A record owns its [`AttributeBag`] and holds a handle to the store
/// it belongs to, so instance-level `save`/`refresh`/`delete` go
/// through the store's constraint and locking machinery.
///
/// Lifecycle: constructed empty (via [`Store::new_record`]) or
/// hydrated from a stored entry → mutated through [`Record::set`] →
/// persisted via [`Record::save`] → optionally reloaded via
/// [`Record::refresh`] or removed via [`Record::delete`].
#[derive(Debug, Clone)]
pub struct Record {
    store: Store,
    bag: AttributeBag,
}

impl Record {
    /// Constructs a new, unsaved record.
    pub(crate) fn new(store: Store) -> Self {
        let bag = AttributeBag::new(store.schema().clone());
        Self { store, bag }
    }

    /// Hydrates a record from a stored entry.
    ///
    /// Both `current` and `original` are seeded from the entry; the
    /// result represents an already-persisted snapshot.
    pub(crate) fn hydrated(store: Store, entry: &Entry) -> Self {
        let bag = AttributeBag::hydrate(store.schema().clone(), entry);
        Self { store, bag }
    }

    /// Reads an attribute; `None` for unknown or absent fields.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.bag.get(key)
    }

    /// Sets an attribute; unknown keys are silently dropped.
    pub fn set(&mut self, key: &str, value: Value) {
        self.bag.set(key, value);
    }

    /// Sets every field in `fields`, in order.
    pub fn set_many(&mut self, fields: &Entry) {
        self.bag.set_many(fields);
    }

    /// Returns the current primary-key value, if set.
    #[must_use]
    pub fn primary_key_value(&self) -> Option<Value> {
        self.bag.raw(self.store.schema().primary_key()).cloned()
    }

    /// Returns the record's state with hidden fields removed.
    #[must_use]
    pub fn to_external(&self) -> Entry {
        self.bag.to_external()
    }

    /// Returns `true` if the record has been persisted.
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.bag.is_persisted()
    }

    /// Validates and persists the record.
    ///
    /// Either the save fully succeeds (document updated, `original`
    /// synced to `current`) or it fails and nothing persisted changes.
    ///
    /// # Errors
    ///
    /// Fails with `MandatoryFieldMissing`, `DuplicateUniqueField`, or
    /// a propagated storage error.
    pub fn save(&mut self) -> CoreResult<()> {
        let store = self.store.clone();
        store.save_bag(&mut self.bag)
    }

    /// Re-fetches the record from the document by primary key,
    /// replacing both `original` and `current`.
    ///
    /// Returns `false` (leaving the record untouched) if it has no
    /// primary key or no backing entry exists anymore.
    ///
    /// # Errors
    ///
    /// Fails if the document cannot be loaded.
    pub fn refresh(&mut self) -> CoreResult<bool> {
        let Some(id) = self.primary_key_value() else {
            return Ok(false);
        };
        match self.store.find(&id)? {
            Some(fresh) => {
                self.bag = fresh.bag;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes this record's entry from the document and persists the
    /// removal. Returns whether an entry was actually removed.
    ///
    /// # Errors
    ///
    /// Fails if the document cannot be loaded or persisted.
    pub fn delete(self) -> CoreResult<bool> {
        match self.primary_key_value() {
            Some(id) => self.store.destroy(&id),
            None => Ok(false),
        }
    }

    /// Checks a plain-text secret against the raw stored value of
    /// `key` using the injected hashing capability.
    ///
    /// Reads the raw value (hidden fields included, get mutators
    /// bypassed); returns `false` when the field is absent or not a
    /// string. The store itself never hashes.
    #[must_use]
    pub fn verify_secret(&self, key: &str, plain: &str, verifier: &dyn HashVerifier) -> bool {
        match self.bag.raw(key) {
            Some(Value::String(hash)) => verifier.check(plain, hash),
            _ => false,
        }
    }
}
