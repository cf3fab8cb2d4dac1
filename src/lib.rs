//! recordio - A strict, type-directed record codec
//!
//! Converts between typed record graphs and wire data: either a
//! JSON-compatible primitive tree or a native-document tree carrying raw
//! binary and UTC date-time leaves.
//!
//! Record types describe themselves once through [`IoRecord`]; the
//! resulting [`TypeSchema`] is cached for the life of the process and drives
//! every [`decode`] and [`encode`].

pub mod codec;
pub mod io;
pub mod schema;
pub mod value;
pub mod wire;

pub use codec::Codec;
pub use io::{
    decode, decode_value, encode, encode_value, from_json_str, to_json_string,
    to_json_string_pretty, validate, CodecError, CodecResult, ErrorKind, IoOptions, UnknownAttrs,
};
pub use schema::{schema_for, IoAttrs, RecordDescriptor, SchemaError, TypeSchema};
pub use value::{Bytes, ExtraAttrs, IoEnum, IoKey, IoRecord, IoType, RecordValue, Value};
pub use wire::{WireDateTime, WireValue};
