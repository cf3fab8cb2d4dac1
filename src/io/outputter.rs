//! Outputter: instance values to wire data
//!
//! Structural mirror of the inputter. Walks a prepared schema alongside an
//! instance value and emits wire data under the active codec.
//!
//! Fields whose io attrs set `store_default = false` are pruned when their
//! value equals the declared default. Pruning applies to whole fields only;
//! elements inside lists, sets and dicts are never dropped.
//!
//! Running with `create = false` performs every check without building any
//! output; the inputter uses this to vet soft defaults it injects.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::errors::{index_path, key_path, make_path, CodecError, CodecResult};
use super::options::IoOptions;
use crate::codec::Codec;
use crate::schema::{FieldTypeNode, IoAttrs, KeyKind, PrimitiveKind, TypeSchema};
use crate::value::{DictKey, EnumValue, RecordValue, Value};
use crate::wire::WireValue;

pub(crate) struct Outputter<'a> {
    codec: Codec,
    options: &'a IoOptions,
    create: bool,
}

impl<'a> Outputter<'a> {
    /// Outputter that produces wire data.
    pub(crate) fn new(codec: Codec, options: &'a IoOptions) -> Self {
        Self {
            codec,
            options,
            create: true,
        }
    }

    /// Outputter that only checks values are emittable.
    pub(crate) fn checker(codec: Codec, options: &'a IoOptions) -> Self {
        Self {
            codec,
            options,
            create: false,
        }
    }

    /// Verifies a soft default can be emitted for `node` under the codec.
    pub(crate) fn soft_default_check(
        &self,
        value: &Value,
        node: &FieldTypeNode,
        path: &str,
        attrs: &IoAttrs,
    ) -> CodecResult<()> {
        self.value_to_output(node, value, path, 0, Some(attrs)).map(|_| ())
    }

    fn emit(&self, build: impl FnOnce() -> WireValue) -> Option<WireValue> {
        if self.create {
            Some(build())
        } else {
            None
        }
    }

    fn check_depth(&self, path: &str, depth: usize) -> CodecResult<()> {
        if depth > self.options.max_depth {
            tracing::debug!(path, max_depth = self.options.max_depth, "depth limit reached on output");
            return Err(CodecError::limit_error(path, self.options.max_depth));
        }
        Ok(())
    }

    /// Emits a record as a wire object keyed by storage key.
    pub(crate) fn record_to_output(
        &self,
        schema: &TypeSchema,
        record: &RecordValue,
        path: &str,
        depth: usize,
    ) -> CodecResult<Option<WireValue>> {
        self.check_depth(path, depth)?;

        for name in record.field_names() {
            if schema.field(name).is_none() {
                return Err(CodecError::attribute_error(
                    &make_path(path, name),
                    format!("'{}' is not a field of {}", name, schema.record_type()),
                ));
            }
        }

        let mut out = BTreeMap::new();
        for spec in schema.fields() {
            let field_path = make_path(path, &spec.field_name);
            let value = record
                .get(&spec.field_name)
                .ok_or_else(|| CodecError::value_error(&field_path, "record is missing a value for this field"))?;

            if !spec.io_attrs.store_default {
                if let Some(default) = spec.io_attrs.default_value() {
                    if *value == default {
                        continue;
                    }
                }
            }

            let wire = self.value_to_output(&spec.type_node, value, &field_path, depth + 1, Some(&spec.io_attrs))?;
            if let Some(wire) = wire {
                out.insert(spec.storage_key().to_string(), wire);
            }
        }

        if let Some(extra) = record.extra() {
            for (key, value) in extra.iter() {
                let extra_path = make_path(path, key);
                if schema.field_for_storage_key(key).is_some() {
                    return Err(CodecError::attribute_error(
                        &extra_path,
                        "extra attr collides with a declared storage key",
                    ));
                }
                self.codec.check_any(value, &extra_path, depth + 1, self.options.max_depth)?;
                if self.create {
                    out.insert(key.clone(), value.clone());
                }
            }
        }

        Ok(self.emit(|| WireValue::Object(out)))
    }

    fn value_to_output(
        &self,
        node: &FieldTypeNode,
        value: &Value,
        path: &str,
        depth: usize,
        attrs: Option<&IoAttrs>,
    ) -> CodecResult<Option<WireValue>> {
        self.check_depth(path, depth)?;

        match node {
            FieldTypeNode::Any => match value {
                Value::Any(wire) => {
                    self.codec.check_any(wire, path, depth, self.options.max_depth)?;
                    Ok(self.emit(|| wire.clone()))
                }
                other => Err(mismatch(path, "any", other)),
            },

            FieldTypeNode::Optional(inner) => match value {
                Value::Null => Ok(self.emit(|| WireValue::Null)),
                other => self.value_to_output(inner, other, path, depth, attrs),
            },

            FieldTypeNode::Primitive(kind) => self.primitive_to_output(*kind, value, path),

            FieldTypeNode::List(inner) => match value {
                Value::List(items) => self.sequence_to_output(inner, items, path, depth),
                other => Err(mismatch(path, "list", other)),
            },

            FieldTypeNode::Set(inner) => match value {
                Value::Set(items) => self.sequence_to_output(inner, items, path, depth),
                other => Err(mismatch(path, "set", other)),
            },

            FieldTypeNode::Tuple(nodes) => {
                let items = match value {
                    Value::Tuple(items) => items,
                    other => return Err(mismatch(path, "tuple", other)),
                };
                if items.len() != nodes.len() {
                    return Err(CodecError::value_error(
                        path,
                        format!("expected {} tuple items, got {}", nodes.len(), items.len()),
                    ));
                }
                let mut out = Vec::with_capacity(items.len());
                for (i, (item_node, item)) in nodes.iter().zip(items).enumerate() {
                    if let Some(wire) = self.value_to_output(item_node, item, &index_path(path, i), depth + 1, None)? {
                        out.push(wire);
                    }
                }
                Ok(self.emit(|| WireValue::Array(out)))
            }

            FieldTypeNode::Dict(key_kind, inner) => {
                let entries = match value {
                    Value::Dict(entries) => entries,
                    other => return Err(mismatch(path, "dict", other)),
                };
                let mut out = BTreeMap::new();
                for (key, item) in entries {
                    let wire_key = key_to_output(key_kind, key, path)?;
                    let item_path = key_path(path, &wire_key);
                    if let Some(wire) = self.value_to_output(inner, item, &item_path, depth + 1, None)? {
                        out.insert(wire_key, wire);
                    }
                }
                Ok(self.emit(|| WireValue::Object(out)))
            }

            FieldTypeNode::Enum(spec) => match value {
                Value::Enum(member) if spec.contains(member) => Ok(self.emit(|| match member {
                    EnumValue::Int(i) => WireValue::Int(*i),
                    EnumValue::Str(s) => WireValue::Str(s.clone()),
                })),
                Value::Enum(member) => Err(CodecError::value_error(
                    path,
                    format!("{} is not a member of {}", member, spec.name()),
                )),
                other => Err(mismatch(path, "enum", other)),
            },

            FieldTypeNode::DateTime => match value {
                Value::DateTime(dt) => {
                    check_datetime(dt, path, attrs)?;
                    let wire = self.codec.encode_datetime(dt, path)?;
                    Ok(self.emit(|| wire))
                }
                other => Err(mismatch(path, "datetime", other)),
            },

            FieldTypeNode::Bytes => match value {
                Value::Bytes(bytes) => Ok(self.emit(|| self.codec.encode_bytes(bytes))),
                other => Err(mismatch(path, "bytes", other)),
            },

            FieldTypeNode::Nested(schema_ref) => match value {
                Value::Record(record) => {
                    let schema = schema_ref
                        .resolve()
                        .map_err(|e| CodecError::schema_error(path, &e))?;
                    self.record_to_output(&schema, record, path, depth + 1)
                }
                other => Err(mismatch(path, schema_ref.record_type(), other)),
            },
        }
    }

    fn primitive_to_output(&self, kind: PrimitiveKind, value: &Value, path: &str) -> CodecResult<Option<WireValue>> {
        match (kind, value) {
            (PrimitiveKind::Bool, Value::Bool(b)) => Ok(self.emit(|| WireValue::Bool(*b))),
            (PrimitiveKind::Int, Value::Int(i)) => Ok(self.emit(|| WireValue::Int(*i))),
            (PrimitiveKind::Float, Value::Float(f)) => {
                if !self.codec.is_legal_leaf(&WireValue::Float(*f)) {
                    return Err(CodecError::value_error(
                        path,
                        format!("{} is not representable under the {} codec", f, self.codec.name()),
                    ));
                }
                Ok(self.emit(|| WireValue::Float(*f)))
            }
            (PrimitiveKind::Str, Value::Str(s)) => Ok(self.emit(|| WireValue::Str(s.clone()))),
            (kind, other) => Err(mismatch(path, kind.type_name(), other)),
        }
    }

    fn sequence_to_output(
        &self,
        inner: &FieldTypeNode,
        items: &[Value],
        path: &str,
        depth: usize,
    ) -> CodecResult<Option<WireValue>> {
        let mut out = Vec::with_capacity(if self.create { items.len() } else { 0 });
        for (i, item) in items.iter().enumerate() {
            if let Some(wire) = self.value_to_output(inner, item, &index_path(path, i), depth + 1, None)? {
                out.push(wire);
            }
        }
        Ok(self.emit(|| WireValue::Array(out)))
    }
}

fn mismatch(path: &str, expected: &str, actual: &Value) -> CodecError {
    CodecError::type_mismatch(path, expected, actual.kind_name())
}

fn check_datetime(dt: &DateTime<Utc>, path: &str, attrs: Option<&IoAttrs>) -> CodecResult<()> {
    match attrs {
        Some(attrs) => attrs
            .validate_datetime(dt)
            .map_err(|message| CodecError::value_error(path, message)),
        None => Ok(()),
    }
}

/// Converts a dict key to its wire string, checking it fits the key kind.
fn key_to_output(kind: &KeyKind, key: &DictKey, path: &str) -> CodecResult<String> {
    match (kind, key) {
        (KeyKind::Str, DictKey::Str(_)) | (KeyKind::Int, DictKey::Int(_)) => Ok(key.to_wire_key()),
        (KeyKind::Enum(spec), DictKey::Enum(member)) => {
            if spec.contains(member) {
                Ok(key.to_wire_key())
            } else {
                Err(CodecError::value_error(
                    path,
                    format!("dict key {} is not a member of {}", member, spec.name()),
                ))
            }
        }
        (kind, other) => Err(CodecError::type_error(
            path,
            format!("expected {}, got {:?}", kind.type_name(), other),
        )),
    }
}
