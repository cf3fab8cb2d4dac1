//! Schema preparation and the process-wide schema cache
//!
//! A record type is analysed once, on first use:
//! - every declared field is classified into a [`FieldTypeNode`]
//! - io attrs are checked against the field's shape
//! - storage keys are checked for uniqueness
//! - nested record types are prepared too, so a bad type anywhere in the
//!   graph fails on first use rather than halfway through a decode
//!
//! Nested nodes hold late-bound [`super::SchemaRef`]s, which is what lets
//! self-referential and mutually-referential records prepare without
//! infinite recursion.
//!
//! # Cache lifecycle
//!
//! The cache is lazily populated, read-mostly, and never torn down before
//! process exit. Preparation is deterministic, so two threads racing to
//! prepare the same type build equal schemas; only the map insert is
//! serialized and the first stored schema is the one everyone keeps.
//!
//! Schemas built while preparing a record graph are held back until the
//! outermost preparation succeeds. A failure anywhere in the graph discards
//! them all, so the outcome for a type never depends on which type in its
//! graph was prepared first.

use std::any::TypeId;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock, RwLock};

use super::attrs::IoAttrs;
use super::errors::{SchemaError, SchemaResult};
use super::types::{FieldSpec, FieldTypeNode, TypeSchema};
use crate::value::{IoRecord, IoType};

/// Prepared schemas keyed by record type identity.
static SCHEMA_CACHE: OnceLock<RwLock<HashMap<TypeId, Arc<TypeSchema>>>> = OnceLock::new();

thread_local! {
    /// Types currently being prepared on this thread.
    static PREPARING: RefCell<HashSet<TypeId>> = RefCell::new(HashSet::new());

    /// Schemas built under the current outermost preparation, not yet cached.
    static PENDING: RefCell<HashMap<TypeId, Arc<TypeSchema>>> = RefCell::new(HashMap::new());
}

fn cache() -> &'static RwLock<HashMap<TypeId, Arc<TypeSchema>>> {
    SCHEMA_CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

fn cache_get(type_id: TypeId) -> Option<Arc<TypeSchema>> {
    let map = cache().read().unwrap_or_else(|poisoned| poisoned.into_inner());
    map.get(&type_id).cloned()
}

/// Caches a prepared root schema together with the nested schemas built for
/// it, all under one write lock. Returns the cached root.
fn cache_commit(
    type_id: TypeId,
    root: TypeSchema,
    nested: Vec<(TypeId, Arc<TypeSchema>)>,
) -> Arc<TypeSchema> {
    let mut map = cache().write().unwrap_or_else(|poisoned| poisoned.into_inner());
    for (id, schema) in nested {
        if map.contains_key(&id) {
            tracing::trace!(record = %schema.record_type, "schema already cached by another thread");
            continue;
        }
        map.insert(id, schema);
    }
    if let Some(existing) = map.get(&type_id) {
        tracing::trace!(record = %root.record_type, "schema already cached by another thread");
        return Arc::clone(existing);
    }
    let root = Arc::new(root);
    map.insert(type_id, Arc::clone(&root));
    root
}

fn pending_get(type_id: TypeId) -> Option<Arc<TypeSchema>> {
    PENDING.with(|pending| pending.borrow().get(&type_id).cloned())
}

fn lookup(type_id: TypeId) -> Option<Arc<TypeSchema>> {
    cache_get(type_id).or_else(|| pending_get(type_id))
}

/// Marks a type as in preparation for the guard's lifetime.
struct PrepGuard {
    type_id: TypeId,
}

impl PrepGuard {
    fn enter(type_id: TypeId) -> Self {
        PREPARING.with(|set| set.borrow_mut().insert(type_id));
        Self { type_id }
    }
}

impl Drop for PrepGuard {
    fn drop(&mut self) {
        PREPARING.with(|set| set.borrow_mut().remove(&self.type_id));
    }
}

fn is_preparing(type_id: TypeId) -> bool {
    PREPARING.with(|set| set.borrow().contains(&type_id))
}

fn nothing_preparing() -> bool {
    PREPARING.with(|set| set.borrow().is_empty())
}

/// Returns the prepared schema for record type `T`, building it on first use.
///
/// # Errors
///
/// Returns `SchemaError` if `T` or any record type reachable from it is
/// unsupported. Nothing built during a failed preparation is cached.
pub fn schema_for<T: IoRecord>() -> SchemaResult<Arc<TypeSchema>> {
    let type_id = TypeId::of::<T>();
    if let Some(schema) = lookup(type_id) {
        return Ok(schema);
    }

    let outermost = nothing_preparing();
    let built = {
        let _guard = PrepGuard::enter(type_id);
        prepare::<T>(type_id)
    };

    if !outermost {
        let schema = Arc::new(built?);
        PENDING.with(|pending| pending.borrow_mut().insert(type_id, Arc::clone(&schema)));
        return Ok(schema);
    }

    let pending: Vec<_> = PENDING.with(|pending| pending.borrow_mut().drain().collect());
    match built {
        Ok(schema) => Ok(cache_commit(type_id, schema, pending)),
        Err(e) => {
            tracing::debug!(
                record = T::NAME,
                discarded = pending.len(),
                error = %e,
                "record schema preparation failed"
            );
            Err(e)
        }
    }
}

/// Builds the schema for `T` and prepares every record type it reaches.
fn prepare<T: IoRecord>(type_id: TypeId) -> SchemaResult<TypeSchema> {
    let mut schema = TypeSchema::build(T::describe())?;
    schema.type_id = Some(type_id);

    for (field, nested) in schema.nested_refs() {
        let pending = match nested.type_id() {
            Some(id) => nested.is_lazy() && !is_preparing(id) && lookup(id).is_none(),
            None => false,
        };
        if pending {
            nested
                .resolve()
                .map_err(|e| e.in_field(&schema.record_type, field))?;
        }
    }

    tracing::debug!(
        record = %schema.record_type,
        fields = schema.fields.len(),
        "prepared record schema"
    );
    Ok(schema)
}

/// Whether the schema for `T` is already cached.
pub fn is_prepared<T: IoRecord>() -> bool {
    cache_get(TypeId::of::<T>()).is_some()
}

/// A record's self-description, consumed by schema preparation.
pub struct RecordDescriptor {
    record_type: String,
    fields: Vec<FieldDecl>,
    keeps_extra_attrs: bool,
}

struct FieldDecl {
    name: String,
    node: SchemaResult<FieldTypeNode>,
    attrs: IoAttrs,
}

impl RecordDescriptor {
    pub fn new(record_type: impl Into<String>) -> Self {
        Self {
            record_type: record_type.into(),
            fields: Vec::new(),
            keeps_extra_attrs: false,
        }
    }

    /// Declares a field of Rust type `T` with default io attrs.
    pub fn field<T: IoType>(self, name: &str) -> Self {
        self.field_with::<T>(name, IoAttrs::new())
    }

    /// Declares a field of Rust type `T`.
    pub fn field_with<T: IoType>(mut self, name: &str, attrs: IoAttrs) -> Self {
        self.fields.push(FieldDecl {
            name: name.to_string(),
            node: T::type_node(),
            attrs,
        });
        self
    }

    /// Declares a field from a hand-built node.
    pub fn field_node(mut self, name: &str, node: FieldTypeNode, attrs: IoAttrs) -> Self {
        self.fields.push(FieldDecl {
            name: name.to_string(),
            node: node.validate().map(|_| node),
            attrs,
        });
        self
    }

    /// Decoded instances keep unknown wire keys as extra attrs.
    pub fn keeps_extra_attrs(mut self) -> Self {
        self.keeps_extra_attrs = true;
        self
    }
}

impl TypeSchema {
    /// Builds a schema from a descriptor without touching the cache.
    ///
    /// Useful for records described at runtime; nested references inside
    /// are resolved on use.
    pub fn build(descriptor: RecordDescriptor) -> SchemaResult<TypeSchema> {
        let RecordDescriptor {
            record_type,
            fields: decls,
            keeps_extra_attrs,
        } = descriptor;

        let mut fields: Vec<FieldSpec> = Vec::with_capacity(decls.len());
        let mut storage_name_to_field = HashMap::with_capacity(decls.len());

        for decl in decls {
            let node = decl.node.map_err(|e| e.in_field(&record_type, &decl.name))?;
            check_attrs(&decl.name, &node, &decl.attrs).map_err(|e| e.in_field(&record_type, &decl.name))?;

            if fields.iter().any(|f| f.field_name == decl.name) {
                return Err(SchemaError::DuplicateField {
                    record: record_type,
                    field: decl.name,
                });
            }

            let spec = FieldSpec {
                field_name: decl.name,
                type_node: node,
                io_attrs: decl.attrs,
            };
            let key = spec.storage_key().to_string();
            if storage_name_to_field.insert(key.clone(), fields.len()).is_some() {
                return Err(SchemaError::DuplicateStorageKey {
                    record: record_type,
                    key,
                });
            }
            fields.push(spec);
        }

        Ok(TypeSchema {
            record_type,
            type_id: None,
            fields,
            storage_name_to_field,
            keeps_extra_attrs,
        })
    }
}

/// Checks io attrs against the field's shape.
fn check_attrs(field: &str, node: &FieldTypeNode, attrs: &IoAttrs) -> SchemaResult<()> {
    if attrs.soft_default.is_some() && attrs.soft_default_factory.is_some() {
        return Err(SchemaError::ConflictingDefaults {
            field: field.to_string(),
        });
    }
    if !attrs.store_default && !attrs.has_soft_default() {
        return Err(SchemaError::MissingDefault {
            field: field.to_string(),
        });
    }
    if attrs.has_datetime_checks() && !node.is_datetime_like() {
        return Err(SchemaError::InvalidAttrs {
            field: field.to_string(),
            reason: format!("datetime checks set on a {} field", node.describe()),
        });
    }
    if let Some(key) = &attrs.storage_key {
        if key.is_empty() {
            return Err(SchemaError::InvalidAttrs {
                field: field.to_string(),
                reason: "storage key is empty".into(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PrimitiveKind;
    use crate::value::{FromValueError, RecordValue};

    struct Point {
        x: i64,
        y: i64,
    }

    impl IoRecord for Point {
        const NAME: &'static str = "Point";

        fn describe() -> RecordDescriptor {
            RecordDescriptor::new(Self::NAME)
                .field::<i64>("x")
                .field_with::<i64>("y", IoAttrs::new().storage_key("yy"))
        }

        fn to_record(&self) -> RecordValue {
            RecordValue::new().with("x", &self.x).with("y", &self.y)
        }

        fn from_record(mut record: RecordValue) -> Result<Self, FromValueError> {
            Ok(Self {
                x: record.take("x")?,
                y: record.take("y")?,
            })
        }
    }

    #[test]
    fn test_build_maps_storage_keys() {
        let schema = TypeSchema::build(Point::describe()).unwrap();
        assert_eq!(schema.record_type(), "Point");
        assert_eq!(schema.fields().len(), 2);
        assert_eq!(schema.field_for_storage_key("yy").unwrap().field_name, "y");
        assert!(schema.field_for_storage_key("y").is_none());
        assert!(!schema.keeps_extra_attrs());
    }

    #[test]
    fn test_duplicate_storage_key_rejected() {
        let descriptor = RecordDescriptor::new("Clash")
            .field::<i64>("a")
            .field_with::<i64>("b", IoAttrs::new().storage_key("a"));
        let err = TypeSchema::build(descriptor).unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateStorageKey {
                record: "Clash".into(),
                key: "a".into()
            }
        );
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let descriptor = RecordDescriptor::new("Twice").field::<i64>("a").field::<String>("a");
        assert!(matches!(
            TypeSchema::build(descriptor),
            Err(SchemaError::DuplicateField { .. })
        ));
    }

    #[test]
    fn test_store_default_requires_soft_default() {
        let descriptor = RecordDescriptor::new("Pruned")
            .field_with::<i64>("n", IoAttrs::new().store_default(false));
        let err = TypeSchema::build(descriptor).unwrap_err();
        assert!(matches!(err.root_cause(), SchemaError::MissingDefault { .. }));
    }

    #[test]
    fn test_conflicting_defaults_rejected() {
        let attrs = IoAttrs::new().soft_default(1i64).soft_default_factory(|| 2i64);
        let descriptor = RecordDescriptor::new("Both").field_with::<i64>("n", attrs);
        let err = TypeSchema::build(descriptor).unwrap_err();
        assert!(matches!(err.root_cause(), SchemaError::ConflictingDefaults { .. }));
    }

    #[test]
    fn test_datetime_attrs_on_wrong_type() {
        let descriptor = RecordDescriptor::new("Bad").field_with::<i64>("n", IoAttrs::new().whole_days());
        let err = TypeSchema::build(descriptor).unwrap_err();
        assert!(matches!(err.root_cause(), SchemaError::InvalidAttrs { .. }));
    }

    #[test]
    fn test_field_node_validated() {
        let bad = FieldTypeNode::Optional(Box::new(FieldTypeNode::Optional(Box::new(
            FieldTypeNode::Primitive(PrimitiveKind::Int),
        ))));
        let descriptor = RecordDescriptor::new("Hand").field_node("n", bad, IoAttrs::new());
        let err = TypeSchema::build(descriptor).unwrap_err();
        assert!(matches!(err.root_cause(), SchemaError::UnsupportedUnion { .. }));
    }

    #[test]
    fn test_schema_for_is_cached() {
        let first = schema_for::<Point>().unwrap();
        let second = schema_for::<Point>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
        assert!(is_prepared::<Point>());
        assert_eq!(first.type_id(), Some(TypeId::of::<Point>()));
    }
}
