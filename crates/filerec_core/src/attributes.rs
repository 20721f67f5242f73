//! Per-record attribute state.

use crate::schema::Schema;
use crate::value;
use filerec_storage::Entry;
use serde_json::Value;
use std::sync::Arc;

/// Holds a record's working (`current`) and last-persisted
/// (`original`) field values.
///
/// Every key in either map is a member of the schema's known keys;
/// assignment to an unknown key is a no-op. `original` is empty for a
/// newly constructed, unsaved record and is synced to `current` after
/// a successful save.
#[derive(Debug, Clone)]
pub struct AttributeBag {
    schema: Arc<Schema>,
    current: Entry,
    original: Entry,
}

impl AttributeBag {
    /// Creates an empty bag for the given schema.
    #[must_use]
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            current: Entry::new(),
            original: Entry::new(),
        }
    }

    /// Hydrates a bag from a stored entry.
    ///
    /// Both `current` and `original` are seeded from the entry,
    /// filtered to known keys; the result represents an
    /// already-persisted snapshot.
    #[must_use]
    pub fn hydrate(schema: Arc<Schema>, entry: &Entry) -> Self {
        let mut bag = Self::new(schema);
        bag.set_originals(entry);
        bag.current = bag.original.clone();
        bag
    }

    /// Sets a single attribute.
    ///
    /// If a set mutator is registered for `key` its result is stored
    /// instead of the raw value. Unknown keys are silently dropped.
    pub fn set(&mut self, key: &str, mut value: Value) {
        if let Some(mutator) = self.schema.set_mutator(key) {
            value = mutator(value);
        }
        if !self.schema.is_known(key) {
            return;
        }
        self.current.insert(key.to_string(), value);
    }

    /// Sets every attribute in `fields`, in order.
    pub fn set_many(&mut self, fields: &Entry) {
        for (key, value) in fields {
            self.set(key, value.clone());
        }
    }

    /// Reads an attribute.
    ///
    /// Returns `None` for unknown keys. If a get mutator is registered
    /// it is applied to the stored raw value (or `null` when absent);
    /// otherwise the stored value is returned, or `None` when absent.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        if !self.schema.is_known(key) {
            return None;
        }
        let raw = self.current.get(key).cloned();
        if let Some(mutator) = self.schema.get_mutator(key) {
            return Some(mutator(raw.unwrap_or(Value::Null)));
        }
        raw
    }

    /// Reads the stored raw value, bypassing any get mutator.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.current.get(key)
    }

    /// Seeds `original` from a hydration payload, filtered to known
    /// keys.
    pub fn set_originals(&mut self, fields: &Entry) {
        for (key, val) in fields {
            if self.schema.is_known(key) {
                self.original.insert(key.clone(), val.clone());
            }
        }
    }

    /// Reads a last-persisted value.
    #[must_use]
    pub fn original(&self, key: &str) -> Option<&Value> {
        self.original.get(key)
    }

    /// Returns the working state.
    #[must_use]
    pub fn current(&self) -> &Entry {
        &self.current
    }

    /// Returns `true` if the record has a non-empty persisted primary
    /// key, i.e. it exists in the document.
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.original(self.schema.primary_key())
            .is_some_and(|v| !value::is_empty(v))
    }

    /// Syncs `original` to `current` after a successful persist.
    pub fn sync_original(&mut self) {
        self.original = self.current.clone();
    }

    /// Returns `current` with hidden keys removed.
    ///
    /// This is the only sanctioned way to expose a record's state
    /// outside the store.
    #[must_use]
    pub fn to_external(&self) -> Entry {
        self.current
            .iter()
            .filter(|(key, _)| !self.schema.is_hidden(key))
            .map(|(key, val)| (key.clone(), val.clone()))
            .collect()
    }

    /// Returns the schema this bag is bound to.
    #[must_use]
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }
}
