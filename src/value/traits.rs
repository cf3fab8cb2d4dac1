//! Typed bindings between Rust types and schema nodes
//!
//! [`IoType`] ties a Rust type to its [`FieldTypeNode`] and to the
//! instance [`Value`] it converts to and from. Implementations exist for
//! the supported leaf and container types; records and enums opt in with
//! [`impl_io_record!`](crate::impl_io_record) and
//! [`impl_io_enum!`](crate::impl_io_enum).

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::Hash;

use chrono::{DateTime, Utc};

use super::types::{Bytes, DictKey, EnumValue, FromValueError, RecordValue, Value};
use crate::schema::{
    EnumSpec, FieldTypeNode, KeyKind, PrimitiveKind, RecordDescriptor, SchemaResult,
};
use crate::wire::WireValue;

/// A Rust type that can appear as a field or sub-value.
pub trait IoType: Sized {
    /// Shape classification for this type.
    fn type_node() -> SchemaResult<FieldTypeNode>;

    /// Converts into an instance value.
    fn to_value(&self) -> Value;

    /// Builds from an instance value.
    fn from_value(value: Value) -> Result<Self, FromValueError>;
}

/// A Rust type usable as a dict key.
pub trait IoKey: Sized {
    fn key_kind() -> SchemaResult<KeyKind>;

    fn to_key(&self) -> DictKey;

    fn from_key(key: DictKey) -> Result<Self, FromValueError>;
}

/// A fieldless Rust enum with int or str underlying values.
pub trait IoEnum: Sized + Clone + 'static {
    const NAME: &'static str;

    /// All members, in declaration order.
    fn members() -> &'static [Self];

    /// Underlying value of this member.
    fn value(&self) -> EnumValue;

    fn from_enum_value(value: &EnumValue) -> Option<Self> {
        Self::members().iter().find(|m| m.value() == *value).cloned()
    }

    fn enum_spec() -> SchemaResult<EnumSpec> {
        EnumSpec::new(Self::NAME, Self::members().iter().map(IoEnum::value).collect())
    }
}

/// A record type: a named set of fields with io attrs.
pub trait IoRecord: Sized + 'static {
    const NAME: &'static str;

    /// Declares the record's fields.
    fn describe() -> RecordDescriptor;

    /// Converts into field values by field name.
    fn to_record(&self) -> RecordValue;

    /// Builds from decoded field values. Errors here are construction
    /// failures and carry the offending field path.
    fn from_record(record: RecordValue) -> Result<Self, FromValueError>;
}

impl IoType for bool {
    fn type_node() -> SchemaResult<FieldTypeNode> {
        Ok(FieldTypeNode::Primitive(PrimitiveKind::Bool))
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> Result<Self, FromValueError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(FromValueError::mismatch("bool", &other)),
        }
    }
}

impl IoType for i64 {
    fn type_node() -> SchemaResult<FieldTypeNode> {
        Ok(FieldTypeNode::Primitive(PrimitiveKind::Int))
    }

    fn to_value(&self) -> Value {
        Value::Int(*self)
    }

    fn from_value(value: Value) -> Result<Self, FromValueError> {
        match value {
            Value::Int(i) => Ok(i),
            other => Err(FromValueError::mismatch("int", &other)),
        }
    }
}

/// Narrower integers travel as `int` and are range-checked on the way in.
macro_rules! impl_io_narrow_int {
    ($($ty:ty),+) => {
        $(
            impl IoType for $ty {
                fn type_node() -> SchemaResult<FieldTypeNode> {
                    Ok(FieldTypeNode::Primitive(PrimitiveKind::Int))
                }

                fn to_value(&self) -> Value {
                    Value::Int(i64::from(*self))
                }

                fn from_value(value: Value) -> Result<Self, FromValueError> {
                    match value {
                        Value::Int(i) => <$ty>::try_from(i).map_err(|_| {
                            FromValueError::new(format!(
                                "{} is out of range for {}",
                                i,
                                stringify!($ty)
                            ))
                        }),
                        other => Err(FromValueError::mismatch("int", &other)),
                    }
                }
            }
        )+
    };
}

impl_io_narrow_int!(i32, u32, u16, u8);

impl IoType for f64 {
    fn type_node() -> SchemaResult<FieldTypeNode> {
        Ok(FieldTypeNode::Primitive(PrimitiveKind::Float))
    }

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    fn from_value(value: Value) -> Result<Self, FromValueError> {
        match value {
            Value::Float(f) => Ok(f),
            other => Err(FromValueError::mismatch("float", &other)),
        }
    }
}

impl IoType for String {
    fn type_node() -> SchemaResult<FieldTypeNode> {
        Ok(FieldTypeNode::Primitive(PrimitiveKind::Str))
    }

    fn to_value(&self) -> Value {
        Value::Str(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, FromValueError> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(FromValueError::mismatch("string", &other)),
        }
    }
}

impl IoType for DateTime<Utc> {
    fn type_node() -> SchemaResult<FieldTypeNode> {
        Ok(FieldTypeNode::DateTime)
    }

    fn to_value(&self) -> Value {
        Value::DateTime(*self)
    }

    fn from_value(value: Value) -> Result<Self, FromValueError> {
        match value {
            Value::DateTime(dt) => Ok(dt),
            other => Err(FromValueError::mismatch("datetime", &other)),
        }
    }
}

impl IoType for Bytes {
    fn type_node() -> SchemaResult<FieldTypeNode> {
        Ok(FieldTypeNode::Bytes)
    }

    fn to_value(&self) -> Value {
        Value::Bytes(self.0.clone())
    }

    fn from_value(value: Value) -> Result<Self, FromValueError> {
        match value {
            Value::Bytes(bytes) => Ok(Bytes(bytes)),
            other => Err(FromValueError::mismatch("bytes", &other)),
        }
    }
}

/// `Any`: codec-legal wire data kept as-is.
impl IoType for WireValue {
    fn type_node() -> SchemaResult<FieldTypeNode> {
        Ok(FieldTypeNode::Any)
    }

    fn to_value(&self) -> Value {
        Value::Any(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, FromValueError> {
        match value {
            Value::Any(wire) => Ok(wire),
            other => Err(FromValueError::mismatch("any", &other)),
        }
    }
}

impl<T: IoType> IoType for Option<T> {
    fn type_node() -> SchemaResult<FieldTypeNode> {
        FieldTypeNode::optional(T::type_node()?)
    }

    fn to_value(&self) -> Value {
        match self {
            Some(inner) => inner.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self, FromValueError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: IoType> IoType for Box<T> {
    fn type_node() -> SchemaResult<FieldTypeNode> {
        T::type_node()
    }

    fn to_value(&self) -> Value {
        self.as_ref().to_value()
    }

    fn from_value(value: Value) -> Result<Self, FromValueError> {
        T::from_value(value).map(Box::new)
    }
}

impl<T: IoType> IoType for Vec<T> {
    fn type_node() -> SchemaResult<FieldTypeNode> {
        Ok(FieldTypeNode::list(T::type_node()?))
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(IoType::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, FromValueError> {
        match value {
            Value::List(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| T::from_value(item).map_err(|e| e.within_index(i)))
                .collect(),
            other => Err(FromValueError::mismatch("list", &other)),
        }
    }
}

impl<T: IoType + Ord> IoType for BTreeSet<T> {
    fn type_node() -> SchemaResult<FieldTypeNode> {
        Ok(FieldTypeNode::set(T::type_node()?))
    }

    fn to_value(&self) -> Value {
        Value::Set(self.iter().map(IoType::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, FromValueError> {
        match value {
            Value::Set(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| T::from_value(item).map_err(|e| e.within_index(i)))
                .collect(),
            other => Err(FromValueError::mismatch("set", &other)),
        }
    }
}

impl<K: IoKey + Ord, V: IoType> IoType for BTreeMap<K, V> {
    fn type_node() -> SchemaResult<FieldTypeNode> {
        Ok(FieldTypeNode::Dict(K::key_kind()?, Box::new(V::type_node()?)))
    }

    fn to_value(&self) -> Value {
        Value::Dict(self.iter().map(|(k, v)| (k.to_key(), v.to_value())).collect())
    }

    fn from_value(value: Value) -> Result<Self, FromValueError> {
        match value {
            Value::Dict(entries) => entries.into_iter().map(entry_from_value::<K, V>).collect(),
            other => Err(FromValueError::mismatch("dict", &other)),
        }
    }
}

impl<K: IoKey + Eq + Hash, V: IoType> IoType for HashMap<K, V> {
    fn type_node() -> SchemaResult<FieldTypeNode> {
        Ok(FieldTypeNode::Dict(K::key_kind()?, Box::new(V::type_node()?)))
    }

    fn to_value(&self) -> Value {
        Value::Dict(self.iter().map(|(k, v)| (k.to_key(), v.to_value())).collect())
    }

    fn from_value(value: Value) -> Result<Self, FromValueError> {
        match value {
            Value::Dict(entries) => entries.into_iter().map(entry_from_value::<K, V>).collect(),
            other => Err(FromValueError::mismatch("dict", &other)),
        }
    }
}

fn entry_from_value<K: IoKey, V: IoType>((key, value): (DictKey, Value)) -> Result<(K, V), FromValueError> {
    let converted = V::from_value(value).map_err(|e| e.within_key(&key))?;
    let context = key.clone();
    let key = K::from_key(key).map_err(|e| e.within_key(&context))?;
    Ok((key, converted))
}

/// Takes the next tuple element, tagging errors with its position.
fn next_item<T: IoType>(
    items: &mut impl Iterator<Item = (usize, Value)>,
) -> Result<T, FromValueError> {
    match items.next() {
        Some((i, item)) => T::from_value(item).map_err(|e| e.within_index(i)),
        None => Err(FromValueError::new("tuple is shorter than its declared arity")),
    }
}

macro_rules! impl_io_tuple {
    ($len:expr; $($name:ident : $idx:tt),+) => {
        impl<$($name: IoType),+> IoType for ($($name,)+) {
            fn type_node() -> SchemaResult<FieldTypeNode> {
                FieldTypeNode::tuple(vec![$($name::type_node()?),+])
            }

            fn to_value(&self) -> Value {
                Value::Tuple(vec![$(self.$idx.to_value()),+])
            }

            fn from_value(value: Value) -> Result<Self, FromValueError> {
                let items = match value {
                    Value::Tuple(items) => items,
                    other => return Err(FromValueError::mismatch("tuple", &other)),
                };
                if items.len() != $len {
                    return Err(FromValueError::new(format!(
                        "expected {} tuple items, got {}",
                        $len,
                        items.len()
                    )));
                }
                let mut items = items.into_iter().enumerate();
                Ok(($(next_item::<$name>(&mut items)?,)+))
            }
        }
    };
}

impl_io_tuple!(1; A: 0);
impl_io_tuple!(2; A: 0, B: 1);
impl_io_tuple!(3; A: 0, B: 1, C: 2);
impl_io_tuple!(4; A: 0, B: 1, C: 2, D: 3);

impl IoKey for String {
    fn key_kind() -> SchemaResult<KeyKind> {
        Ok(KeyKind::Str)
    }

    fn to_key(&self) -> DictKey {
        DictKey::Str(self.clone())
    }

    fn from_key(key: DictKey) -> Result<Self, FromValueError> {
        match key {
            DictKey::Str(s) => Ok(s),
            other => Err(FromValueError::new(format!("expected string key, got {:?}", other))),
        }
    }
}

impl IoKey for i64 {
    fn key_kind() -> SchemaResult<KeyKind> {
        Ok(KeyKind::Int)
    }

    fn to_key(&self) -> DictKey {
        DictKey::Int(*self)
    }

    fn from_key(key: DictKey) -> Result<Self, FromValueError> {
        match key {
            DictKey::Int(i) => Ok(i),
            other => Err(FromValueError::new(format!("expected int key, got {:?}", other))),
        }
    }
}

/// Implements [`IoType`] for a type implementing [`IoRecord`].
#[macro_export]
macro_rules! impl_io_record {
    ($ty:ty) => {
        impl $crate::IoType for $ty {
            fn type_node() -> $crate::schema::SchemaResult<$crate::schema::FieldTypeNode> {
                Ok($crate::schema::FieldTypeNode::nested::<$ty>())
            }

            fn to_value(&self) -> $crate::value::Value {
                $crate::value::Value::Record(<$ty as $crate::IoRecord>::to_record(self))
            }

            fn from_value(
                value: $crate::value::Value,
            ) -> ::std::result::Result<Self, $crate::value::FromValueError> {
                match value {
                    $crate::value::Value::Record(record) => {
                        <$ty as $crate::IoRecord>::from_record(record)
                    }
                    other => Err($crate::value::FromValueError::mismatch("record", &other)),
                }
            }
        }
    };
}

/// Implements [`IoType`] and [`IoKey`] for a type implementing [`IoEnum`].
#[macro_export]
macro_rules! impl_io_enum {
    ($ty:ty) => {
        impl $crate::IoType for $ty {
            fn type_node() -> $crate::schema::SchemaResult<$crate::schema::FieldTypeNode> {
                Ok($crate::schema::FieldTypeNode::Enum(
                    <$ty as $crate::IoEnum>::enum_spec()?,
                ))
            }

            fn to_value(&self) -> $crate::value::Value {
                $crate::value::Value::Enum(<$ty as $crate::IoEnum>::value(self))
            }

            fn from_value(
                value: $crate::value::Value,
            ) -> ::std::result::Result<Self, $crate::value::FromValueError> {
                match value {
                    $crate::value::Value::Enum(v) => <$ty as $crate::IoEnum>::from_enum_value(&v)
                        .ok_or_else(|| {
                            $crate::value::FromValueError::new(format!(
                                "{} is not a member of {}",
                                v,
                                <$ty as $crate::IoEnum>::NAME
                            ))
                        }),
                    other => Err($crate::value::FromValueError::mismatch("enum", &other)),
                }
            }
        }

        impl $crate::IoKey for $ty {
            fn key_kind() -> $crate::schema::SchemaResult<$crate::schema::KeyKind> {
                Ok($crate::schema::KeyKind::Enum(
                    <$ty as $crate::IoEnum>::enum_spec()?,
                ))
            }

            fn to_key(&self) -> $crate::value::DictKey {
                $crate::value::DictKey::Enum(<$ty as $crate::IoEnum>::value(self))
            }

            fn from_key(
                key: $crate::value::DictKey,
            ) -> ::std::result::Result<Self, $crate::value::FromValueError> {
                match key {
                    $crate::value::DictKey::Enum(v) => <$ty as $crate::IoEnum>::from_enum_value(&v)
                        .ok_or_else(|| {
                            $crate::value::FromValueError::new(format!(
                                "{} is not a member of {}",
                                v,
                                <$ty as $crate::IoEnum>::NAME
                            ))
                        }),
                    other => Err($crate::value::FromValueError::new(format!(
                        "expected enum key, got {:?}",
                        other
                    ))),
                }
            }
        }
    };
}
