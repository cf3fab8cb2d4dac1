//! Wire data model for recordio
//!
//! Wire data is what crosses the boundary to callers: a JSON-compatible
//! primitive tree, optionally extended with native binary and date-time
//! leaves when a document-database driver is on the other side.
//!
//! # Shapes
//!
//! - `Null`, `Bool`, `Int`, `Float`, `Str`
//! - `Array` and `Object` containers (object keys are always strings)
//! - `Bytes` and `DateTime` (only legal under [`crate::Codec::NativeDoc`])
//!
//! Objects are ordered maps so that produced wire data is deterministic.

mod errors;
mod json;
mod value;

pub use errors::{WireError, WireResult};
pub use value::{WireDateTime, WireValue};
