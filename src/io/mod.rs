//! Decoding and encoding of records
//!
//! The entry points here tie schema preparation to the inputter and
//! outputter:
//! - [`decode`] / [`encode`] for Rust record types
//! - [`decode_value`] / [`encode_value`] for records described at runtime
//! - [`validate`] to check an instance is emittable without building output
//! - [`to_json_string`] / [`from_json_str`] for JSON text under the
//!   JSON-like codec
//!
//! All operations are synchronous, pure tree walks. Errors carry an
//! [`ErrorKind`] and the dotted path of the offending value.

mod errors;
mod inputter;
mod options;
mod outputter;

pub use errors::{CodecError, CodecResult, ErrorKind, ROOT_PATH};
pub(crate) use errors::{index_path, key_path, make_path};
pub use options::{IoOptions, UnknownAttrs, DEFAULT_MAX_DEPTH};

use inputter::Inputter;
use outputter::Outputter;

use crate::codec::Codec;
use crate::schema::{schema_for, TypeSchema};
use crate::value::{IoRecord, RecordValue};
use crate::wire::WireValue;

/// Decodes wire data into a record of type `T`.
///
/// # Errors
///
/// - `Schema` if `T` is unsupported
/// - `Type`, `Value`, `Attribute` or `Limit` if `raw` does not fit the schema
/// - `Construction` if `T` rejects the decoded field values
pub fn decode<T: IoRecord>(raw: &WireValue, codec: Codec, options: &IoOptions) -> CodecResult<T> {
    let schema = schema_for::<T>()?;
    let record = decode_value(&schema, raw, codec, options)?;
    T::from_record(record).map_err(|e| CodecError::construction_error(&e.path(), e.message()))
}

/// Decodes wire data into field values for a prepared schema.
pub fn decode_value(
    schema: &TypeSchema,
    raw: &WireValue,
    codec: Codec,
    options: &IoOptions,
) -> CodecResult<RecordValue> {
    Inputter::new(codec, options).record_from_input(schema, raw, "", 0)
}

/// Encodes a record of type `T` to wire data.
pub fn encode<T: IoRecord>(value: &T, codec: Codec, options: &IoOptions) -> CodecResult<WireValue> {
    let schema = schema_for::<T>()?;
    encode_value(&schema, &value.to_record(), codec, options)
}

/// Encodes field values for a prepared schema to wire data.
pub fn encode_value(
    schema: &TypeSchema,
    record: &RecordValue,
    codec: Codec,
    options: &IoOptions,
) -> CodecResult<WireValue> {
    let wire = Outputter::new(codec, options).record_to_output(schema, record, "", 0)?;
    // An emitting outputter always produces a value
    Ok(wire.unwrap_or(WireValue::Null))
}

/// Checks that a record of type `T` can be encoded under `codec`.
pub fn validate<T: IoRecord>(value: &T, codec: Codec, options: &IoOptions) -> CodecResult<()> {
    let schema = schema_for::<T>()?;
    Outputter::checker(codec, options)
        .record_to_output(&schema, &value.to_record(), "", 0)
        .map(|_| ())
}

/// Encodes a record to compact JSON text.
pub fn to_json_string<T: IoRecord>(value: &T, options: &IoOptions) -> CodecResult<String> {
    let json = encode(value, Codec::JsonLike, options)?.to_json()?;
    Ok(json.to_string())
}

/// Encodes a record to indented JSON text.
pub fn to_json_string_pretty<T: IoRecord>(value: &T, options: &IoOptions) -> CodecResult<String> {
    let json = encode(value, Codec::JsonLike, options)?.to_json()?;
    serde_json::to_string_pretty(&json).map_err(|e| CodecError::value_error("", e.to_string()))
}

/// Decodes a record from JSON text.
pub fn from_json_str<T: IoRecord>(text: &str, options: &IoOptions) -> CodecResult<T> {
    let raw = WireValue::parse_json(text)?;
    decode(&raw, Codec::JsonLike, options)
}
