//! Error types for the record store.

use filerec_storage::StorageError;
use thiserror::Error;

/// Result type for record store operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in record store operations.
///
/// Validation failures during `save` are raised before anything is
/// persisted, so a failed save leaves the document file unchanged.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The backing document file could not be read, written, or parsed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A mandatory field was empty at save time.
    #[error("mandatory field is empty: {field}")]
    MandatoryFieldMissing {
        /// Name of the offending field.
        field: String,
    },

    /// A unique constraint would be violated.
    #[error("duplicate value for unique field: {field}")]
    DuplicateUniqueField {
        /// Name of the offending field.
        field: String,
    },

    /// No record matches the given identifier.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The entity type searched.
        entity: String,
        /// The identifier that was not found.
        id: String,
    },

    /// The schema is unusable; a programmer or configuration error.
    #[error("schema misconfigured: {message}")]
    SchemaMisconfigured {
        /// Description of the misconfiguration.
        message: String,
    },
}

impl CoreError {
    /// Creates a mandatory-field violation.
    pub fn mandatory_field_missing(field: impl Into<String>) -> Self {
        Self::MandatoryFieldMissing {
            field: field.into(),
        }
    }

    /// Creates a duplicate-unique violation.
    pub fn duplicate_unique_field(field: impl Into<String>) -> Self {
        Self::DuplicateUniqueField {
            field: field.into(),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a schema-misconfigured error.
    pub fn schema_misconfigured(message: impl Into<String>) -> Self {
        Self::SchemaMisconfigured {
            message: message.into(),
        }
    }
}
