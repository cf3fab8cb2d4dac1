//! In-memory instance values

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::traits::IoType;
use crate::io::{index_path, key_path, make_path};
use crate::schema::EnumKind;
use crate::wire::WireValue;

/// Underlying value of an enum member.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EnumValue {
    Int(i64),
    Str(String),
}

impl EnumValue {
    pub fn kind(&self) -> EnumKind {
        match self {
            EnumValue::Int(_) => EnumKind::Int,
            EnumValue::Str(_) => EnumKind::Str,
        }
    }
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumValue::Int(i) => write!(f, "{}", i),
            EnumValue::Str(s) => write!(f, "'{}'", s),
        }
    }
}

/// A decoded dict key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DictKey {
    Str(String),
    Int(i64),
    Enum(EnumValue),
}

impl DictKey {
    /// The key's wire form: ints and int-valued enums become decimal strings.
    pub fn to_wire_key(&self) -> String {
        match self {
            DictKey::Str(s) | DictKey::Enum(EnumValue::Str(s)) => s.clone(),
            DictKey::Int(i) | DictKey::Enum(EnumValue::Int(i)) => i.to_string(),
        }
    }
}

/// Binary data.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bytes(pub Vec<u8>);

impl From<Vec<u8>> for Bytes {
    fn from(bytes: Vec<u8>) -> Self {
        Bytes(bytes)
    }
}

impl From<&[u8]> for Bytes {
    fn from(bytes: &[u8]) -> Self {
        Bytes(bytes.to_vec())
    }
}

impl AsRef<[u8]> for Bytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Unknown wire keys preserved on a decoded record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtraAttrs(BTreeMap<String, WireValue>);

impl ExtraAttrs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: WireValue) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&WireValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &WireValue)> {
        self.0.iter()
    }
}

/// A decoded record: field values by in-memory field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordValue {
    fields: BTreeMap<String, Value>,
    extra: Option<ExtraAttrs>,
}

impl RecordValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`RecordValue::put`].
    pub fn with<T: IoType>(mut self, field: &str, value: &T) -> Self {
        self.put(field, value);
        self
    }

    /// Stores a typed field value.
    pub fn put<T: IoType>(&mut self, field: &str, value: &T) {
        self.fields.insert(field.to_string(), value.to_value());
    }

    /// Stores an already-converted field value.
    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.fields.insert(field.into(), value);
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Removes a field and converts it to its Rust type.
    pub fn take<T: IoType>(&mut self, field: &str) -> Result<T, FromValueError> {
        let value = self
            .fields
            .remove(field)
            .ok_or_else(|| FromValueError::new("missing field value").within_field(field))?;
        T::from_value(value).map_err(|e| e.within_field(field))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn extra(&self) -> Option<&ExtraAttrs> {
        self.extra.as_ref()
    }

    pub fn set_extra(&mut self, extra: ExtraAttrs) {
        self.extra = if extra.is_empty() { None } else { Some(extra) };
    }

    /// Detaches the extra attrs, leaving none behind.
    pub fn take_extra(&mut self) -> ExtraAttrs {
        self.extra.take().unwrap_or_default()
    }
}

/// A value in the in-memory instance graph.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    /// Set elements in iteration order
    Set(Vec<Value>),
    Tuple(Vec<Value>),
    Dict(BTreeMap<DictKey, Value>),
    Enum(EnumValue),
    DateTime(DateTime<Utc>),
    Bytes(Vec<u8>),
    Record(RecordValue),
    /// Codec-legal wire data held verbatim
    Any(WireValue),
}

impl Value {
    /// Returns the value kind name for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dict",
            Value::Enum(_) => "enum",
            Value::DateTime(_) => "datetime",
            Value::Bytes(_) => "bytes",
            Value::Record(_) => "record",
            Value::Any(_) => "any",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Field(String),
    Index(usize),
    Key(String),
}

/// Failure converting instance values into a Rust type.
///
/// Carries the path to the offending value relative to where conversion
/// started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FromValueError {
    /// Innermost segment first
    segments: Vec<Segment>,
    message: String,
}

impl FromValueError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            segments: Vec::new(),
            message: message.into(),
        }
    }

    /// Value of the wrong kind for the Rust type being built.
    pub fn mismatch(expected: &str, actual: &Value) -> Self {
        Self::new(format!("expected {}, got {}", expected, actual.kind_name()))
    }

    pub fn within_field(mut self, field: &str) -> Self {
        self.segments.push(Segment::Field(field.to_string()));
        self
    }

    pub fn within_index(mut self, index: usize) -> Self {
        self.segments.push(Segment::Index(index));
        self
    }

    pub fn within_key(mut self, key: &DictKey) -> Self {
        self.segments.push(Segment::Key(key.to_wire_key()));
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Dotted path below `prefix`.
    pub fn path_from(&self, prefix: &str) -> String {
        self.segments.iter().rev().fold(prefix.to_string(), |path, segment| match segment {
            Segment::Field(name) => make_path(&path, name),
            Segment::Index(i) => index_path(&path, *i),
            Segment::Key(key) => key_path(&path, key),
        })
    }

    pub fn path(&self) -> String {
        self.path_from("")
    }
}
