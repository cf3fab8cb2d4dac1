//! Wire conversion errors

use thiserror::Error;

/// Result type for wire conversions
pub type WireResult<T> = Result<T, WireError>;

/// Errors raised when wire data cannot be carried by a target representation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("{type_name} values cannot be represented as JSON")]
    NotJsonRepresentable { type_name: &'static str },

    #[error("non-finite float cannot be represented as JSON")]
    NonFiniteFloat,

    #[error("invalid JSON text: {0}")]
    InvalidJson(String),
}
