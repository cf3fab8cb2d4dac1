//! Schema type definitions
//!
//! Every field (and every sub-value of a field) is classified into one of a
//! closed set of shapes:
//! - `Any`: codec-legal wire data kept verbatim
//! - `Optional`: `T | None`, the only supported union
//! - `Primitive`: bool, int, float, str
//! - `List`, `Set`, `Tuple`, `Dict`: containers
//! - `Enum`: int-valued or str-valued enumerations
//! - `DateTime`, `Bytes`: codec-dependent leaves
//! - `Nested`: another record, bound lazily so records may refer to themselves

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::attrs::IoAttrs;
use super::errors::{SchemaError, SchemaResult};
use crate::value::{EnumValue, IoRecord};

/// Primitive leaf kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    Int,
    Float,
    Str,
}

impl PrimitiveKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Str => "string",
        }
    }
}

/// Underlying value kind shared by all members of an enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumKind {
    Int,
    Str,
}

/// Member values of an enum type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumSpec {
    name: String,
    kind: EnumKind,
    values: Vec<EnumValue>,
}

impl EnumSpec {
    /// Builds an enum spec, checking that members are non-empty,
    /// homogeneous and distinct.
    pub fn new(name: impl Into<String>, values: Vec<EnumValue>) -> SchemaResult<Self> {
        let name = name.into();
        let kind = match values.first() {
            Some(EnumValue::Int(_)) => EnumKind::Int,
            Some(EnumValue::Str(_)) => EnumKind::Str,
            None => return Err(SchemaError::EmptyEnum { enum_name: name }),
        };

        for (i, value) in values.iter().enumerate() {
            if value.kind() != kind {
                return Err(SchemaError::HeterogeneousEnum { enum_name: name });
            }
            if values[..i].contains(value) {
                return Err(SchemaError::DuplicateEnumValue {
                    enum_name: name,
                    value: value.to_string(),
                });
            }
        }

        Ok(Self { name, kind, values })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EnumKind {
        self.kind
    }

    pub fn values(&self) -> &[EnumValue] {
        &self.values
    }

    pub fn contains(&self, value: &EnumValue) -> bool {
        self.values.contains(value)
    }
}

/// Allowed dict key kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyKind {
    /// Keys pass through as strings
    Str,
    /// Keys travel as decimal strings
    Int,
    /// Keys travel as the enum's underlying value in string form
    Enum(EnumSpec),
}

impl KeyKind {
    /// Converts a key node into a key kind.
    pub fn from_node(node: FieldTypeNode) -> SchemaResult<Self> {
        match node {
            FieldTypeNode::Primitive(PrimitiveKind::Str) => Ok(KeyKind::Str),
            FieldTypeNode::Primitive(PrimitiveKind::Int) => Ok(KeyKind::Int),
            FieldTypeNode::Enum(spec) => Ok(KeyKind::Enum(spec)),
            other => Err(SchemaError::UnsupportedDictKey {
                key_type: other.type_name().to_string(),
            }),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            KeyKind::Str => "string key",
            KeyKind::Int => "int key",
            KeyKind::Enum(_) => "enum key",
        }
    }
}

/// How a nested record's schema is obtained.
#[derive(Clone)]
enum Binding {
    /// Resolved through the process-wide cache on use
    Lazy {
        type_id: TypeId,
        type_name: &'static str,
        resolve: fn() -> SchemaResult<Arc<TypeSchema>>,
    },
    /// Already-built schema (runtime-described records)
    Bound(Arc<TypeSchema>),
}

/// Reference from a `Nested` node to a record schema.
#[derive(Clone)]
pub struct SchemaRef {
    binding: Binding,
}

impl SchemaRef {
    /// Late-bound reference to the schema of record type `T`.
    pub fn of<T: IoRecord>() -> Self {
        Self {
            binding: Binding::Lazy {
                type_id: TypeId::of::<T>(),
                type_name: T::NAME,
                resolve: super::prep::schema_for::<T>,
            },
        }
    }

    /// Reference to an already-built schema.
    pub fn bound(schema: Arc<TypeSchema>) -> Self {
        Self {
            binding: Binding::Bound(schema),
        }
    }

    /// Returns the referenced schema, preparing it on first use.
    pub fn resolve(&self) -> SchemaResult<Arc<TypeSchema>> {
        match &self.binding {
            Binding::Lazy { resolve, .. } => resolve(),
            Binding::Bound(schema) => Ok(Arc::clone(schema)),
        }
    }

    /// Type identity for late-bound references.
    pub fn type_id(&self) -> Option<TypeId> {
        match &self.binding {
            Binding::Lazy { type_id, .. } => Some(*type_id),
            Binding::Bound(schema) => schema.type_id(),
        }
    }

    pub fn record_type(&self) -> &str {
        match &self.binding {
            Binding::Lazy { type_name, .. } => type_name,
            Binding::Bound(schema) => schema.record_type(),
        }
    }

    pub(crate) fn is_lazy(&self) -> bool {
        matches!(self.binding, Binding::Lazy { .. })
    }
}

impl fmt::Debug for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SchemaRef({})", self.record_type())
    }
}

impl PartialEq for SchemaRef {
    fn eq(&self, other: &Self) -> bool {
        match (&self.binding, &other.binding) {
            (Binding::Lazy { type_id: a, .. }, Binding::Lazy { type_id: b, .. }) => a == b,
            (Binding::Bound(a), Binding::Bound(b)) => Arc::ptr_eq(a, b) || a == b,
            _ => false,
        }
    }
}

/// Shape classification of a field or sub-value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldTypeNode {
    Any,
    Optional(Box<FieldTypeNode>),
    Primitive(PrimitiveKind),
    List(Box<FieldTypeNode>),
    Set(Box<FieldTypeNode>),
    Tuple(Vec<FieldTypeNode>),
    Dict(KeyKind, Box<FieldTypeNode>),
    Enum(EnumSpec),
    DateTime,
    Bytes,
    Nested(SchemaRef),
}

impl FieldTypeNode {
    /// `T | None`; nesting optionals is rejected since `null` would be ambiguous.
    pub fn optional(inner: FieldTypeNode) -> SchemaResult<Self> {
        if let FieldTypeNode::Optional(_) = inner {
            return Err(SchemaError::UnsupportedUnion {
                type_name: format!("{} | None", inner.describe()),
            });
        }
        Ok(FieldTypeNode::Optional(Box::new(inner)))
    }

    pub fn list(inner: FieldTypeNode) -> Self {
        FieldTypeNode::List(Box::new(inner))
    }

    pub fn set(inner: FieldTypeNode) -> Self {
        FieldTypeNode::Set(Box::new(inner))
    }

    pub fn tuple(items: Vec<FieldTypeNode>) -> SchemaResult<Self> {
        if items.is_empty() {
            return Err(SchemaError::EmptyTuple);
        }
        Ok(FieldTypeNode::Tuple(items))
    }

    pub fn dict(key: FieldTypeNode, value: FieldTypeNode) -> SchemaResult<Self> {
        Ok(FieldTypeNode::Dict(KeyKind::from_node(key)?, Box::new(value)))
    }

    pub fn nested<T: IoRecord>() -> Self {
        FieldTypeNode::Nested(SchemaRef::of::<T>())
    }

    /// Short type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldTypeNode::Any => "any",
            FieldTypeNode::Optional(_) => "optional",
            FieldTypeNode::Primitive(kind) => kind.type_name(),
            FieldTypeNode::List(_) => "list",
            FieldTypeNode::Set(_) => "set",
            FieldTypeNode::Tuple(_) => "tuple",
            FieldTypeNode::Dict(..) => "dict",
            FieldTypeNode::Enum(_) => "enum",
            FieldTypeNode::DateTime => "datetime",
            FieldTypeNode::Bytes => "bytes",
            FieldTypeNode::Nested(_) => "record",
        }
    }

    /// Full type description, e.g. `list[dict[int, string]]`.
    pub fn describe(&self) -> String {
        match self {
            FieldTypeNode::Optional(inner) => format!("{} | None", inner.describe()),
            FieldTypeNode::List(inner) => format!("list[{}]", inner.describe()),
            FieldTypeNode::Set(inner) => format!("set[{}]", inner.describe()),
            FieldTypeNode::Tuple(items) => {
                let parts: Vec<String> = items.iter().map(FieldTypeNode::describe).collect();
                format!("tuple[{}]", parts.join(", "))
            }
            FieldTypeNode::Dict(key, value) => {
                let key_name = match key {
                    KeyKind::Str => "string".to_string(),
                    KeyKind::Int => "int".to_string(),
                    KeyKind::Enum(spec) => spec.name().to_string(),
                };
                format!("dict[{}, {}]", key_name, value.describe())
            }
            FieldTypeNode::Enum(spec) => spec.name().to_string(),
            FieldTypeNode::Nested(schema_ref) => schema_ref.record_type().to_string(),
            other => other.type_name().to_string(),
        }
    }

    /// Re-checks the structural rules for nodes assembled by hand.
    pub fn validate(&self) -> SchemaResult<()> {
        match self {
            FieldTypeNode::Optional(inner) => {
                if let FieldTypeNode::Optional(_) = **inner {
                    return Err(SchemaError::UnsupportedUnion {
                        type_name: self.describe(),
                    });
                }
                inner.validate()
            }
            FieldTypeNode::List(inner) | FieldTypeNode::Set(inner) => inner.validate(),
            FieldTypeNode::Tuple(items) => {
                if items.is_empty() {
                    return Err(SchemaError::EmptyTuple);
                }
                items.iter().try_for_each(FieldTypeNode::validate)
            }
            FieldTypeNode::Dict(key, value) => {
                if let KeyKind::Enum(spec) = key {
                    EnumSpec::new(spec.name(), spec.values().to_vec())?;
                }
                value.validate()
            }
            FieldTypeNode::Enum(spec) => EnumSpec::new(spec.name(), spec.values().to_vec()).map(|_| ()),
            FieldTypeNode::Any
            | FieldTypeNode::Primitive(_)
            | FieldTypeNode::DateTime
            | FieldTypeNode::Bytes
            | FieldTypeNode::Nested(_) => Ok(()),
        }
    }

    /// Whether this node is a datetime, optionally wrapped in `Optional`.
    pub(crate) fn is_datetime_like(&self) -> bool {
        match self {
            FieldTypeNode::DateTime => true,
            FieldTypeNode::Optional(inner) => inner.is_datetime_like(),
            _ => false,
        }
    }

    /// Collects every nested-record reference in this node.
    pub(crate) fn collect_refs<'a>(&'a self, out: &mut Vec<&'a SchemaRef>) {
        match self {
            FieldTypeNode::Nested(schema_ref) => out.push(schema_ref),
            FieldTypeNode::Optional(inner)
            | FieldTypeNode::List(inner)
            | FieldTypeNode::Set(inner)
            | FieldTypeNode::Dict(_, inner) => inner.collect_refs(out),
            FieldTypeNode::Tuple(items) => items.iter().for_each(|item| item.collect_refs(out)),
            FieldTypeNode::Any
            | FieldTypeNode::Primitive(_)
            | FieldTypeNode::Enum(_)
            | FieldTypeNode::DateTime
            | FieldTypeNode::Bytes => {}
        }
    }
}

/// A single record field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// In-memory field name
    pub field_name: String,
    /// Shape classification
    pub type_node: FieldTypeNode,
    /// Io attributes
    pub io_attrs: IoAttrs,
}

impl FieldSpec {
    /// Wire key for this field.
    pub fn storage_key(&self) -> &str {
        self.io_attrs.storage_key.as_deref().unwrap_or(&self.field_name)
    }
}

/// Prepared description of a record type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSchema {
    pub(super) record_type: String,
    pub(super) type_id: Option<TypeId>,
    pub(super) fields: Vec<FieldSpec>,
    /// Storage key -> index into `fields`
    pub(super) storage_name_to_field: HashMap<String, usize>,
    pub(super) keeps_extra_attrs: bool,
}

impl TypeSchema {
    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    /// Type identity when the schema was prepared from a Rust type.
    pub fn type_id(&self) -> Option<TypeId> {
        self.type_id
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, field_name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.field_name == field_name)
    }

    /// Resolves a wire key to its field.
    pub fn field_for_storage_key(&self, key: &str) -> Option<&FieldSpec> {
        self.storage_name_to_field.get(key).map(|&i| &self.fields[i])
    }

    /// Whether decoded instances carry unknown wire keys.
    pub fn keeps_extra_attrs(&self) -> bool {
        self.keeps_extra_attrs
    }

    /// Whether unknown wire keys can be kept on decode. Typed records opt in;
    /// schemas built at runtime decode only to [`crate::RecordValue`], which
    /// always has room for them.
    pub(crate) fn accepts_extra_attrs(&self) -> bool {
        self.keeps_extra_attrs || self.type_id.is_none()
    }

    /// Nested-record references paired with the field that holds them.
    pub(crate) fn nested_refs(&self) -> Vec<(&str, &SchemaRef)> {
        let mut out = Vec::new();
        for field in &self.fields {
            let mut refs = Vec::new();
            field.type_node.collect_refs(&mut refs);
            out.extend(refs.into_iter().map(|r| (field.field_name.as_str(), r)));
        }
        out
    }
}
