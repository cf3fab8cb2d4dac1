//! Schema error types
//!
//! A `SchemaError` means the record type itself cannot be handled. It is
//! raised once, the first time a type is prepared, and never while decoding
//! individual values.

use thiserror::Error;

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Reasons a record type cannot be prepared.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("enum '{enum_name}' mixes int and str member values")]
    HeterogeneousEnum { enum_name: String },

    #[error("enum '{enum_name}' has no members")]
    EmptyEnum { enum_name: String },

    #[error("enum '{enum_name}' declares value {value} more than once")]
    DuplicateEnumValue { enum_name: String, value: String },

    #[error("unsupported union '{type_name}': only 'T | None' is supported")]
    UnsupportedUnion { type_name: String },

    #[error("unsupported dict key type '{key_type}': keys must be str, int or enum")]
    UnsupportedDictKey { key_type: String },

    #[error("tuple types must declare at least one element")]
    EmptyTuple,

    #[error("record '{record}' declares field '{field}' more than once")]
    DuplicateField { record: String, field: String },

    #[error("record '{record}' maps storage key '{key}' to more than one field")]
    DuplicateStorageKey { record: String, key: String },

    #[error("field '{field}' sets store_default=false but declares no soft default")]
    MissingDefault { field: String },

    #[error("field '{field}' declares both a soft default and a soft default factory")]
    ConflictingDefaults { field: String },

    #[error("field '{field}' has invalid io attrs: {reason}")]
    InvalidAttrs { field: String, reason: String },

    #[error("in record '{record}', field '{field}': {source}")]
    InField {
        record: String,
        field: String,
        #[source]
        source: Box<SchemaError>,
    },
}

impl SchemaError {
    /// Attaches record/field context to an error raised for a field's type.
    pub fn in_field(self, record: &str, field: &str) -> Self {
        SchemaError::InField {
            record: record.to_string(),
            field: field.to_string(),
            source: Box::new(self),
        }
    }

    /// Returns the innermost error with field context stripped.
    pub fn root_cause(&self) -> &SchemaError {
        match self {
            SchemaError::InField { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
