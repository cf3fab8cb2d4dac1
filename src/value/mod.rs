//! Instance values and typed bindings
//!
//! The inputter produces, and the outputter consumes, a dynamic
//! [`Value`] graph that has already been checked against a schema. Rust
//! types reach that graph through [`IoType`]; records through
//! [`IoRecord`] and enums through [`IoEnum`].

mod traits;
mod types;

pub use traits::{IoEnum, IoKey, IoRecord, IoType};
pub use types::{Bytes, DictKey, EnumValue, ExtraAttrs, FromValueError, RecordValue, Value};
