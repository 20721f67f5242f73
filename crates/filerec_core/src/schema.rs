//! Static per-entity-type schema.

use crate::error::{CoreError, CoreResult};
use serde_json::Value;
use std::collections::HashMap;

/// A registered field transform.
///
/// Mutators are a static capability table: a plain function registered
/// per field at schema-definition time and looked up by exact key.
/// Set mutators run on assignment and store their result; get mutators
/// run on read over the stored raw value.
pub type Mutator = fn(Value) -> Value;

/// How primary-key values come into existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryKeyKind {
    /// Assigned by the store as `max(existing) + 1` on insert.
    AutoIncrement,
    /// Supplied by the caller before the first save.
    Supplied,
}

/// Immutable description of one entity type.
///
/// A schema names the fields the store recognizes, the primary key and
/// how it is generated, the uniqueness and mandatory sets, the hidden
/// fields excluded from external serialization, and the optional
/// timestamp fields the store stamps at save time. Built once via
/// [`SchemaBuilder`] and shared read-only across all records of the
/// type.
#[derive(Debug)]
pub struct Schema {
    entity: String,
    file_name: String,
    keys: Vec<String>,
    primary_key: String,
    primary_key_kind: PrimaryKeyKind,
    unique_keys: Vec<String>,
    mandatory_keys: Vec<String>,
    hidden_keys: Vec<String>,
    created_at_key: Option<String>,
    updated_at_key: Option<String>,
    set_mutators: HashMap<String, Mutator>,
    get_mutators: HashMap<String, Mutator>,
}

impl Schema {
    /// Starts building a schema for the named entity type.
    #[must_use]
    pub fn builder(entity: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(entity)
    }

    /// Returns the entity type name.
    #[must_use]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Returns the backing file name (without extension).
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Returns the known field names, in declaration order.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Returns `true` if `key` is a known field.
    #[must_use]
    pub fn is_known(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    /// Returns the primary key field name.
    #[must_use]
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Returns how primary-key values are generated.
    #[must_use]
    pub fn primary_key_kind(&self) -> PrimaryKeyKind {
        self.primary_key_kind
    }

    /// Returns `true` if `key` must be unique across the document.
    ///
    /// The primary key is implicitly unique.
    #[must_use]
    pub fn is_unique(&self, key: &str) -> bool {
        key == self.primary_key || self.unique_keys.iter().any(|k| k == key)
    }

    /// Returns `true` if `key` must be non-empty at save time.
    ///
    /// The primary key is implicitly mandatory.
    #[must_use]
    pub fn is_mandatory(&self, key: &str) -> bool {
        key == self.primary_key || self.mandatory_keys.iter().any(|k| k == key)
    }

    /// Returns `true` if `key` is excluded from external serialization.
    #[must_use]
    pub fn is_hidden(&self, key: &str) -> bool {
        self.hidden_keys.iter().any(|k| k == key)
    }

    /// Returns the "created at" field name, if configured.
    #[must_use]
    pub fn created_at_key(&self) -> Option<&str> {
        self.created_at_key.as_deref()
    }

    /// Returns the "updated at" field name, if configured.
    #[must_use]
    pub fn updated_at_key(&self) -> Option<&str> {
        self.updated_at_key.as_deref()
    }

    /// Looks up the set mutator for `key`.
    #[must_use]
    pub fn set_mutator(&self, key: &str) -> Option<Mutator> {
        self.set_mutators.get(key).copied()
    }

    /// Looks up the get mutator for `key`.
    #[must_use]
    pub fn get_mutator(&self, key: &str) -> Option<Mutator> {
        self.get_mutators.get(key).copied()
    }
}

/// Builder for [`Schema`].
#[derive(Debug)]
pub struct SchemaBuilder {
    entity: String,
    file_name: Option<String>,
    keys: Vec<String>,
    primary_key: String,
    primary_key_kind: PrimaryKeyKind,
    unique_keys: Vec<String>,
    mandatory_keys: Vec<String>,
    hidden_keys: Vec<String>,
    created_at_key: Option<String>,
    updated_at_key: Option<String>,
    set_mutators: HashMap<String, Mutator>,
    get_mutators: HashMap<String, Mutator>,
}

impl SchemaBuilder {
    fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            file_name: None,
            keys: Vec::new(),
            primary_key: "id".to_string(),
            primary_key_kind: PrimaryKeyKind::AutoIncrement,
            unique_keys: Vec::new(),
            mandatory_keys: Vec::new(),
            hidden_keys: Vec::new(),
            created_at_key: None,
            updated_at_key: None,
            set_mutators: HashMap::new(),
            get_mutators: HashMap::new(),
        }
    }

    /// Sets the backing file name (defaults to the entity name).
    #[must_use]
    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Declares the known field names, in order.
    #[must_use]
    pub fn keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the primary key field and its kind (default: `id`,
    /// auto-incrementing).
    #[must_use]
    pub fn primary_key(mut self, key: impl Into<String>, kind: PrimaryKeyKind) -> Self {
        self.primary_key = key.into();
        self.primary_key_kind = kind;
        self
    }

    /// Declares fields (besides the primary key) that must be unique.
    #[must_use]
    pub fn unique<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unique_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Declares fields (besides the primary key) that must be
    /// non-empty at save time.
    #[must_use]
    pub fn mandatory<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mandatory_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Declares fields excluded from external serialization.
    #[must_use]
    pub fn hidden<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hidden_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Declares the "created at" / "updated at" timestamp fields.
    ///
    /// "created at" is stamped once when first empty; "updated at" is
    /// stamped on every save.
    #[must_use]
    pub fn timestamps(mut self, created_at: impl Into<String>, updated_at: impl Into<String>) -> Self {
        self.created_at_key = Some(created_at.into());
        self.updated_at_key = Some(updated_at.into());
        self
    }

    /// Registers a set mutator for `key`.
    #[must_use]
    pub fn set_mutator(mut self, key: impl Into<String>, mutator: Mutator) -> Self {
        self.set_mutators.insert(key.into(), mutator);
        self
    }

    /// Registers a get mutator for `key`.
    #[must_use]
    pub fn get_mutator(mut self, key: impl Into<String>, mutator: Mutator) -> Self {
        self.get_mutators.insert(key.into(), mutator);
        self
    }

    /// Validates and builds the schema.
    ///
    /// # Errors
    ///
    /// Returns `SchemaMisconfigured` if the entity or file name is
    /// empty, no keys are declared, or any referenced field (primary
    /// key, unique, mandatory, hidden, timestamps, mutators) is not a
    /// declared key.
    pub fn build(self) -> CoreResult<Schema> {
        if self.entity.is_empty() {
            return Err(CoreError::schema_misconfigured("entity name is empty"));
        }

        let file_name = self.file_name.unwrap_or_else(|| self.entity.clone());
        if file_name.is_empty() {
            return Err(CoreError::schema_misconfigured(format!(
                "no backing file name for entity {:?}",
                self.entity
            )));
        }

        if self.keys.is_empty() {
            return Err(CoreError::schema_misconfigured(format!(
                "entity {:?} declares no keys",
                self.entity
            )));
        }

        let known = |key: &String| self.keys.contains(key);
        let check = |set: &[String], role: &str| -> CoreResult<()> {
            for key in set {
                if !known(key) {
                    return Err(CoreError::schema_misconfigured(format!(
                        "{role} field {key:?} is not a declared key of entity {:?}",
                        self.entity
                    )));
                }
            }
            Ok(())
        };

        check(std::slice::from_ref(&self.primary_key), "primary key")?;
        check(&self.unique_keys, "unique")?;
        check(&self.mandatory_keys, "mandatory")?;
        check(&self.hidden_keys, "hidden")?;

        let timestamp_keys: Vec<String> = self
            .created_at_key
            .iter()
            .chain(self.updated_at_key.iter())
            .cloned()
            .collect();
        check(&timestamp_keys, "timestamp")?;

        let mutator_keys: Vec<String> = self
            .set_mutators
            .keys()
            .chain(self.get_mutators.keys())
            .cloned()
            .collect();
        check(&mutator_keys, "mutated")?;

        Ok(Schema {
            entity: self.entity,
            file_name,
            keys: self.keys,
            primary_key: self.primary_key,
            primary_key_kind: self.primary_key_kind,
            unique_keys: self.unique_keys,
            mandatory_keys: self.mandatory_keys,
            hidden_keys: self.hidden_keys,
            created_at_key: self.created_at_key,
            updated_at_key: self.updated_at_key,
            set_mutators: self.set_mutators,
            get_mutators: self.get_mutators,
        })
    }
}
