//! Schema subsystem for recordio
//!
//! Record types are analysed once into a [`TypeSchema`]: a tree of
//! [`FieldTypeNode`]s classifying every field and sub-field, plus the
//! per-field [`IoAttrs`]. The inputter and outputter only ever walk these
//! prepared trees; no type analysis happens per value.
//!
//! # Design Principles
//!
//! - Unsupported types fail at first use, never mid-decode
//! - Storage keys are unique within one record level
//! - Only `T | None` unions are supported
//! - Enum members are all int-valued or all str-valued
//! - Dict keys are str, int or enum
//! - Prepared schemas are cached process-wide and never mutated

mod attrs;
mod errors;
mod prep;
mod types;

pub use attrs::{DateTimeValidator, IoAttrs, SoftDefaultFactory};
pub use errors::{SchemaError, SchemaResult};
pub use prep::{is_prepared, schema_for, RecordDescriptor};
pub use types::{
    EnumKind, EnumSpec, FieldSpec, FieldTypeNode, KeyKind, PrimitiveKind, SchemaRef, TypeSchema,
};
