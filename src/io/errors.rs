//! Codec error types
//!
//! Every decode/encode failure carries:
//! - an [`ErrorKind`] callers can branch on
//! - the dotted field path where it happened (`$root` for the top level)
//! - a human-readable message
//!
//! Error codes:
//! - RIO_SCHEMA (record type itself is unsupported)
//! - RIO_TYPE (wrong shape or primitive kind)
//! - RIO_VALUE (right shape, invalid value)
//! - RIO_ATTRIBUTE (unknown field under the reject policy)
//! - RIO_CONSTRUCTION (record type refused the decoded values)
//! - RIO_LIMIT (nesting depth bound exceeded)

use std::fmt;

use thiserror::Error;

use crate::schema::SchemaError;
use crate::wire::WireError;

/// Path reported for errors at the top-level value.
pub const ROOT_PATH: &str = "$root";

/// Kinds of codec failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The record type is unsupported
    Schema,
    /// A wire value has the wrong shape or primitive kind
    Type,
    /// A wire value is shape-correct but semantically invalid
    Value,
    /// An unknown field was encountered under the reject policy
    Attribute,
    /// The record type rejected the decoded field values
    Construction,
    /// The nesting depth bound was exceeded
    Limit,
}

impl ErrorKind {
    /// Returns the stable string code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Schema => "RIO_SCHEMA",
            ErrorKind::Type => "RIO_TYPE",
            ErrorKind::Value => "RIO_VALUE",
            ErrorKind::Attribute => "RIO_ATTRIBUTE",
            ErrorKind::Construction => "RIO_CONSTRUCTION",
            ErrorKind::Limit => "RIO_LIMIT",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A decode/encode failure at a specific field path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{kind}] field '{path}': {message}")]
pub struct CodecError {
    kind: ErrorKind,
    path: String,
    message: String,
}

impl CodecError {
    /// Creates an error of the given kind at `path`.
    ///
    /// An empty path means the top-level value.
    pub fn new(kind: ErrorKind, path: impl Into<String>, message: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            kind,
            path: if path.is_empty() { ROOT_PATH.to_string() } else { path },
            message: message.into(),
        }
    }

    /// Wrong shape: `expected` vs the type name actually found.
    pub fn type_mismatch(path: &str, expected: &str, actual: &str) -> Self {
        Self::new(
            ErrorKind::Type,
            path,
            format!("expected {}, got {}", expected, actual),
        )
    }

    pub fn type_error(path: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, path, message)
    }

    pub fn value_error(path: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Value, path, message)
    }

    pub fn attribute_error(path: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Attribute, path, message)
    }

    pub fn construction_error(path: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Construction, path, message)
    }

    pub fn limit_error(path: &str, max_depth: usize) -> Self {
        Self::new(
            ErrorKind::Limit,
            path,
            format!("nesting exceeds maximum depth of {}", max_depth),
        )
    }

    pub fn schema_error(path: &str, err: &SchemaError) -> Self {
        Self::new(ErrorKind::Schema, path, err.to_string())
    }

    /// Returns the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the dotted field path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the message without kind or path
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_kind(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

impl From<SchemaError> for CodecError {
    fn from(err: SchemaError) -> Self {
        CodecError::schema_error("", &err)
    }
}

impl From<WireError> for CodecError {
    fn from(err: WireError) -> Self {
        let kind = match err {
            WireError::InvalidJson(_) => ErrorKind::Type,
            WireError::NotJsonRepresentable { .. } | WireError::NonFiniteFloat => ErrorKind::Value,
        };
        CodecError::new(kind, "", err.to_string())
    }
}

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Creates a field path from prefix and field name.
pub(crate) fn make_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}

/// Creates an element path from prefix and sequence index.
pub(crate) fn index_path(prefix: &str, index: usize) -> String {
    format!("{}[{}]", prefix, index)
}

/// Creates an entry path from prefix and map key.
pub(crate) fn key_path(prefix: &str, key: &str) -> String {
    format!("{}{{{}}}", prefix, key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ErrorKind::Schema.code(), "RIO_SCHEMA");
        assert_eq!(ErrorKind::Type.code(), "RIO_TYPE");
        assert_eq!(ErrorKind::Value.code(), "RIO_VALUE");
        assert_eq!(ErrorKind::Attribute.code(), "RIO_ATTRIBUTE");
        assert_eq!(ErrorKind::Construction.code(), "RIO_CONSTRUCTION");
        assert_eq!(ErrorKind::Limit.code(), "RIO_LIMIT");
    }

    #[test]
    fn test_empty_path_is_root() {
        let err = CodecError::type_mismatch("", "object", "int");
        assert_eq!(err.path(), ROOT_PATH);
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    #[test]
    fn test_display_includes_kind_and_path() {
        let err = CodecError::value_error("pos.x", "bad");
        let display = err.to_string();
        assert!(display.contains("RIO_VALUE"));
        assert!(display.contains("pos.x"));
        assert!(display.contains("bad"));
    }

    #[test]
    fn test_from_wire_error() {
        let err: CodecError = WireError::InvalidJson("eof".into()).into();
        assert_eq!(err.kind(), ErrorKind::Type);
        assert_eq!(err.path(), ROOT_PATH);

        let err: CodecError = WireError::NonFiniteFloat.into();
        assert_eq!(err.kind(), ErrorKind::Value);
    }

    #[test]
    fn test_paths() {
        assert_eq!(make_path("", "x"), "x");
        assert_eq!(make_path("a.b", "c"), "a.b.c");
        assert_eq!(index_path("items", 2), "items[2]");
        assert_eq!(key_path("scores", "alice"), "scores{alice}");
    }
}
