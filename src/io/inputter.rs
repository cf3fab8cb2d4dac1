//! Inputter: wire data to validated instance values
//!
//! Walks raw wire data against a prepared [`TypeSchema`], dispatching on the
//! [`FieldTypeNode`] of each field and sub-value. Every failure carries the
//! dotted path of the offending value.
//!
//! Decoding is all-or-nothing: there is no partial result and nothing is
//! substituted for bad input unless [`IoOptions`] asks for it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::errors::{index_path, key_path, make_path, CodecError, CodecResult};
use super::options::{IoOptions, UnknownAttrs};
use super::outputter::Outputter;
use crate::codec::Codec;
use crate::schema::{EnumKind, EnumSpec, FieldTypeNode, IoAttrs, KeyKind, PrimitiveKind, TypeSchema};
use crate::value::{DictKey, EnumValue, ExtraAttrs, RecordValue, Value};
use crate::wire::WireValue;

pub(crate) struct Inputter<'a> {
    codec: Codec,
    options: &'a IoOptions,
}

impl<'a> Inputter<'a> {
    pub(crate) fn new(codec: Codec, options: &'a IoOptions) -> Self {
        Self { codec, options }
    }

    fn check_depth(&self, path: &str, depth: usize) -> CodecResult<()> {
        if depth > self.options.max_depth {
            tracing::debug!(path, max_depth = self.options.max_depth, "depth limit reached on input");
            return Err(CodecError::limit_error(path, self.options.max_depth));
        }
        Ok(())
    }

    /// Decodes a wire object into field values for `schema`.
    pub(crate) fn record_from_input(
        &self,
        schema: &TypeSchema,
        raw: &WireValue,
        path: &str,
        depth: usize,
    ) -> CodecResult<RecordValue> {
        self.check_depth(path, depth)?;

        let entries = match raw {
            WireValue::Object(entries) => entries,
            other => {
                return Err(CodecError::type_mismatch(
                    path,
                    &format!("{} object", schema.record_type()),
                    other.type_name(),
                ))
            }
        };

        let mut record = RecordValue::new();
        let mut extra = ExtraAttrs::new();

        for (key, wire) in entries {
            let entry_path = make_path(path, key);
            match schema.field_for_storage_key(key) {
                Some(spec) => {
                    let value = self.value_from_input(
                        &spec.type_node,
                        wire,
                        &entry_path,
                        depth + 1,
                        Some(&spec.io_attrs),
                    )?;
                    record.insert(spec.field_name.clone(), value);
                }
                None => match self.options.unknown_attrs {
                    UnknownAttrs::Reject => {
                        return Err(CodecError::attribute_error(
                            &entry_path,
                            format!("'{}' is not a field of {}", key, schema.record_type()),
                        ));
                    }
                    UnknownAttrs::Keep => {
                        if !schema.accepts_extra_attrs() {
                            return Err(CodecError::attribute_error(
                                &entry_path,
                                format!("{} does not keep extra attrs", schema.record_type()),
                            ));
                        }
                        self.codec
                            .check_any(wire, &entry_path, depth + 1, self.options.max_depth)?;
                        extra.insert(key.clone(), wire.clone());
                    }
                    UnknownAttrs::Discard => {
                        tracing::trace!(path = %entry_path, "discarding unknown attr");
                    }
                },
            }
        }

        for spec in schema.fields() {
            if record.contains(&spec.field_name) {
                continue;
            }
            let field_path = make_path(path, &spec.field_name);
            let default = spec.io_attrs.default_value().ok_or_else(|| {
                CodecError::value_error(
                    &field_path,
                    format!("missing required field '{}'", spec.storage_key()),
                )
            })?;
            Outputter::checker(self.codec, self.options).soft_default_check(
                &default,
                &spec.type_node,
                &field_path,
                &spec.io_attrs,
            )?;
            record.insert(spec.field_name.clone(), default);
        }

        record.set_extra(extra);
        Ok(record)
    }

    fn value_from_input(
        &self,
        node: &FieldTypeNode,
        raw: &WireValue,
        path: &str,
        depth: usize,
        attrs: Option<&IoAttrs>,
    ) -> CodecResult<Value> {
        self.check_depth(path, depth)?;

        match node {
            FieldTypeNode::Any => {
                self.codec.check_any(raw, path, depth, self.options.max_depth)?;
                Ok(Value::Any(raw.clone()))
            }

            FieldTypeNode::Optional(inner) => match raw {
                WireValue::Null => Ok(Value::Null),
                other => self.value_from_input(inner, other, path, depth, attrs),
            },

            FieldTypeNode::Primitive(kind) => self.primitive_from_input(*kind, raw, path),

            FieldTypeNode::List(inner) => self.sequence_from_input(inner, raw, path, depth).map(Value::List),

            FieldTypeNode::Set(inner) => self.sequence_from_input(inner, raw, path, depth).map(Value::Set),

            FieldTypeNode::Tuple(nodes) => {
                let items = match raw {
                    WireValue::Array(items) => items,
                    other => return Err(CodecError::type_mismatch(path, "array", other.type_name())),
                };
                if items.len() != nodes.len() {
                    return Err(CodecError::value_error(
                        path,
                        format!("expected {} tuple items, got {}", nodes.len(), items.len()),
                    ));
                }
                nodes
                    .iter()
                    .zip(items)
                    .enumerate()
                    .map(|(i, (item_node, item))| {
                        self.value_from_input(item_node, item, &index_path(path, i), depth + 1, None)
                    })
                    .collect::<CodecResult<Vec<_>>>()
                    .map(Value::Tuple)
            }

            FieldTypeNode::Dict(key_kind, inner) => {
                let entries = match raw {
                    WireValue::Object(entries) => entries,
                    other => return Err(CodecError::type_mismatch(path, "object", other.type_name())),
                };
                let mut out = BTreeMap::new();
                for (key, item) in entries {
                    let item_path = key_path(path, key);
                    let dict_key = key_from_input(key_kind, key, &item_path)?;
                    let value = self.value_from_input(inner, item, &item_path, depth + 1, None)?;
                    out.insert(dict_key, value);
                }
                Ok(Value::Dict(out))
            }

            FieldTypeNode::Enum(spec) => enum_from_input(spec, raw, path).map(Value::Enum),

            FieldTypeNode::DateTime => {
                let dt = self.codec.decode_datetime(raw, path)?;
                check_datetime(&dt, path, attrs)?;
                Ok(Value::DateTime(dt))
            }

            FieldTypeNode::Bytes => self.codec.decode_bytes(raw, path).map(Value::Bytes),

            FieldTypeNode::Nested(schema_ref) => {
                let schema = schema_ref
                    .resolve()
                    .map_err(|e| CodecError::schema_error(path, &e))?;
                self.record_from_input(&schema, raw, path, depth + 1)
                    .map(Value::Record)
            }
        }
    }

    fn primitive_from_input(&self, kind: PrimitiveKind, raw: &WireValue, path: &str) -> CodecResult<Value> {
        match (kind, raw) {
            (PrimitiveKind::Bool, WireValue::Bool(b)) => Ok(Value::Bool(*b)),
            (PrimitiveKind::Int, WireValue::Int(i)) => Ok(Value::Int(*i)),
            (PrimitiveKind::Float, WireValue::Float(f)) => {
                if !self.codec.is_legal_leaf(raw) {
                    return Err(CodecError::value_error(
                        path,
                        format!("{} is not representable under the {} codec", f, self.codec.name()),
                    ));
                }
                Ok(Value::Float(*f))
            }
            (PrimitiveKind::Float, WireValue::Int(i)) if self.options.coerce_int_to_float => {
                Ok(Value::Float(*i as f64))
            }
            (PrimitiveKind::Str, WireValue::Str(s)) => Ok(Value::Str(s.clone())),
            (kind, other) => Err(CodecError::type_mismatch(path, kind.type_name(), other.type_name())),
        }
    }

    fn sequence_from_input(
        &self,
        inner: &FieldTypeNode,
        raw: &WireValue,
        path: &str,
        depth: usize,
    ) -> CodecResult<Vec<Value>> {
        let items = match raw {
            WireValue::Array(items) => items,
            other => return Err(CodecError::type_mismatch(path, "array", other.type_name())),
        };
        items
            .iter()
            .enumerate()
            .map(|(i, item)| self.value_from_input(inner, item, &index_path(path, i), depth + 1, None))
            .collect()
    }
}

fn check_datetime(dt: &DateTime<Utc>, path: &str, attrs: Option<&IoAttrs>) -> CodecResult<()> {
    match attrs {
        Some(attrs) => attrs
            .validate_datetime(dt)
            .map_err(|message| CodecError::value_error(path, message)),
        None => Ok(()),
    }
}

fn enum_from_input(spec: &EnumSpec, raw: &WireValue, path: &str) -> CodecResult<EnumValue> {
    let member = match raw {
        WireValue::Int(i) => EnumValue::Int(*i),
        WireValue::Str(s) => EnumValue::Str(s.clone()),
        other => {
            return Err(CodecError::type_mismatch(
                path,
                &format!("{} value", spec.name()),
                other.type_name(),
            ))
        }
    };
    if !spec.contains(&member) {
        return Err(CodecError::value_error(
            path,
            format!("{} is not a member of {}", member, spec.name()),
        ));
    }
    Ok(member)
}

/// Parses a wire object key according to the dict's key kind.
fn key_from_input(kind: &KeyKind, key: &str, path: &str) -> CodecResult<DictKey> {
    match kind {
        KeyKind::Str => Ok(DictKey::Str(key.to_string())),
        KeyKind::Int => {
            let parsed = key
                .parse::<i64>()
                .map_err(|_| CodecError::type_error(path, format!("dict key '{}' is not an integer", key)))?;
            canonical_int_key(parsed, key, path).map(DictKey::Int)
        }
        KeyKind::Enum(spec) => {
            let member = match spec.kind() {
                EnumKind::Str => EnumValue::Str(key.to_string()),
                EnumKind::Int => {
                    let parsed = key.parse::<i64>().map_err(|_| {
                        CodecError::value_error(path, format!("dict key '{}' is not a member of {}", key, spec.name()))
                    })?;
                    EnumValue::Int(canonical_int_key(parsed, key, path)?)
                }
            };
            if !spec.contains(&member) {
                return Err(CodecError::value_error(
                    path,
                    format!("dict key '{}' is not a member of {}", key, spec.name()),
                ));
            }
            Ok(DictKey::Enum(member))
        }
    }
}

/// Rejects non-canonical spellings of an int key, such as "01" or "+1".
fn canonical_int_key(parsed: i64, key: &str, path: &str) -> CodecResult<i64> {
    if parsed.to_string() != key {
        return Err(CodecError::value_error(
            path,
            format!("dict key '{}' is not in canonical form '{}'", key, parsed),
        ));
    }
    Ok(parsed)
}
