// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type registry: maps small integer type ids to record descriptors.
//!
//! Ids are assigned in declaration order by default, so two registries only
//! agree on the wire if their types were declared in the same order. The
//! explicit and fingerprinted registration paths exist for callers that want
//! ids that do not depend on that order.
//!
//! Declarations take a write lock, lookups a read lock. Finish declaring
//! before sharing the registry with encoding threads: an id assigned while
//! traffic is in flight may not match the peer's.

use crate::error::{CodecError, Result};
use crate::record::Record;
use crate::taggable::Taggable;
use crate::value::Value;
use parking_lot::RwLock;
use std::any::TypeId as RustTypeId;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// RecordDescriptor
// ---------------------------------------------------------------------------

/// Shape of one registered record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDescriptor {
    type_id: u32,
    name: String,
    field_order: Vec<String>,
}

impl RecordDescriptor {
    pub fn type_id(&self) -> u32 {
        self.type_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field names in wire order.
    pub fn field_order(&self) -> &[String] {
        &self.field_order
    }

    pub fn arity(&self) -> usize {
        self.field_order.len()
    }

    /// Position of a field in wire order.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.field_order.iter().position(|f| f == name)
    }

    /// Content-derived 32-bit id for a shape (FNV-1a over name and fields).
    pub fn fingerprint<S: AsRef<str>>(name: &str, field_order: &[S]) -> u32 {
        let mut hash = fnv1a(2_166_136_261, name.as_bytes());
        for field in field_order {
            hash = fnv1a(hash, &[0]);
            hash = fnv1a(hash, field.as_ref().as_bytes());
        }
        hash
    }
}

fn fnv1a(mut hash: u32, bytes: &[u8]) -> u32 {
    for byte in bytes {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(16_777_619);
    }
    hash
}

// ---------------------------------------------------------------------------
// RecordType
// ---------------------------------------------------------------------------

/// Handle returned by a declaration: the assigned id plus the constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordType {
    descriptor: Arc<RecordDescriptor>,
}

impl RecordType {
    pub fn type_id(&self) -> u32 {
        self.descriptor.type_id
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn field_order(&self) -> &[String] {
        &self.descriptor.field_order
    }

    pub fn descriptor(&self) -> &Arc<RecordDescriptor> {
        &self.descriptor
    }

    /// Build an instance from field values in declaration order.
    ///
    /// Values are made canonical (see [`Value::into_canonical`]).
    pub fn instantiate(&self, fields: Vec<Value>) -> Result<Record> {
        if fields.len() != self.descriptor.arity() {
            return Err(CodecError::ConstructorArity {
                type_name: self.descriptor.name.clone(),
                expected: self.descriptor.arity(),
                actual: fields.len(),
            });
        }
        let fields = fields
            .into_iter()
            .map(Value::into_canonical)
            .collect::<Result<Vec<_>>>()?;
        Ok(Record::from_parts(self.descriptor.clone(), fields))
    }

    /// Build an instance from `(field, value)` pairs in any order.
    ///
    /// Fields left out are set to [`Value::Nil`].
    pub fn build<I, K, V>(&self, pairs: I) -> Result<Record>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut fields = vec![Value::Nil; self.descriptor.arity()];
        for (name, value) in pairs {
            let index = self
                .descriptor
                .field_index(name.as_ref())
                .ok_or_else(|| CodecError::FieldNotFound(name.as_ref().to_string()))?;
            let value: Value = value.into();
            fields[index] = value.into_canonical()?;
        }
        Ok(Record::from_parts(self.descriptor.clone(), fields))
    }
}

// ---------------------------------------------------------------------------
// TypeRegistry
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct RegistryInner {
    by_id: BTreeMap<u32, Arc<RecordDescriptor>>,
    by_name: HashMap<String, u32>,
    by_rust_type: HashMap<RustTypeId, u32>,
}

impl RegistryInner {
    /// Count of registered types, skipping forward past explicit ids.
    fn next_implicit_id(&self) -> u32 {
        let mut id = self.by_id.len() as u32;
        while self.by_id.contains_key(&id) {
            id += 1;
        }
        id
    }

    fn insert(&mut self, type_id: u32, name: String, field_order: Vec<String>) -> RecordType {
        let descriptor = Arc::new(RecordDescriptor {
            type_id,
            name: name.clone(),
            field_order,
        });
        self.by_id.insert(type_id, descriptor.clone());
        self.by_name.insert(name, type_id);
        RecordType { descriptor }
    }

    fn check_explicit(&self, type_id: u32, name: &str) -> Result<()> {
        if self.by_id.contains_key(&type_id) {
            return Err(CodecError::DuplicateTypeId(type_id));
        }
        if self.by_name.contains_key(name) {
            return Err(CodecError::DuplicateTypeName(name.to_string()));
        }
        Ok(())
    }
}

/// Append-only table of record types, one per serialization context.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    inner: RwLock<RegistryInner>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a record type; its id is the number of types declared before it.
    ///
    /// Never fails. Declaring the same name twice yields two distinct ids;
    /// name lookups resolve to the latest one.
    pub fn declare_record_type<I, S>(&self, name: impl Into<String>, field_order: I) -> RecordType
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let field_order: Vec<String> = field_order.into_iter().map(Into::into).collect();
        let mut inner = self.inner.write();
        let type_id = inner.next_implicit_id();
        log::debug!(
            "[dinobytes] declared {} as type {} ({} fields)",
            name,
            type_id,
            field_order.len()
        );
        inner.insert(type_id, name, field_order)
    }

    /// Declare a record type under a caller-chosen id.
    ///
    /// Fails if the id or the name is already taken.
    pub fn declare_with_id<I, S>(
        &self,
        type_id: u32,
        name: impl Into<String>,
        field_order: I,
    ) -> Result<RecordType>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let field_order: Vec<String> = field_order.into_iter().map(Into::into).collect();
        let mut inner = self.inner.write();
        inner.check_explicit(type_id, &name)?;
        log::debug!("[dinobytes] declared {} with explicit id {}", name, type_id);
        Ok(inner.insert(type_id, name, field_order))
    }

    /// Declare a record type whose id is the fingerprint of its shape.
    ///
    /// Two processes declaring the same name and fields get the same id
    /// regardless of declaration order.
    pub fn declare_fingerprinted<I, S>(
        &self,
        name: impl Into<String>,
        field_order: I,
    ) -> Result<RecordType>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let field_order: Vec<String> = field_order.into_iter().map(Into::into).collect();
        let type_id = RecordDescriptor::fingerprint(&name, &field_order);
        self.declare_with_id(type_id, name, field_order)
    }

    /// Declare a derived Rust record type.
    ///
    /// Idempotent per registry: a second call returns the existing handle, so
    /// the Rust type keeps a single id.
    pub fn declare<T: Taggable>(&self) -> RecordType {
        let rust_type = RustTypeId::of::<T>();
        let mut inner = self.inner.write();
        if let Some(descriptor) = inner
            .by_rust_type
            .get(&rust_type)
            .and_then(|id| inner.by_id.get(id))
        {
            return RecordType {
                descriptor: descriptor.clone(),
            };
        }
        let type_id = inner.next_implicit_id();
        log::debug!("[dinobytes] declared {} as type {}", T::NAME, type_id);
        let record_type = inner.insert(
            type_id,
            T::NAME.to_string(),
            T::FIELDS.iter().map(|f| (*f).to_string()).collect(),
        );
        inner.by_rust_type.insert(rust_type, type_id);
        record_type
    }

    /// Declare a derived Rust record type under a caller-chosen id.
    pub fn declare_with_id_for<T: Taggable>(&self, type_id: u32) -> Result<RecordType> {
        let rust_type = RustTypeId::of::<T>();
        let mut inner = self.inner.write();
        if inner.by_rust_type.contains_key(&rust_type) {
            return Err(CodecError::DuplicateTypeName(T::NAME.to_string()));
        }
        inner.check_explicit(type_id, T::NAME)?;
        log::debug!("[dinobytes] declared {} with explicit id {}", T::NAME, type_id);
        let record_type = inner.insert(
            type_id,
            T::NAME.to_string(),
            T::FIELDS.iter().map(|f| (*f).to_string()).collect(),
        );
        inner.by_rust_type.insert(rust_type, type_id);
        Ok(record_type)
    }

    /// Look up a type id, failing with `UnknownType` when absent.
    pub fn resolve(&self, type_id: u32) -> Result<RecordType> {
        self.get(type_id).ok_or(CodecError::UnknownType(type_id))
    }

    pub fn get(&self, type_id: u32) -> Option<RecordType> {
        self.inner
            .read()
            .by_id
            .get(&type_id)
            .map(|descriptor| RecordType {
                descriptor: descriptor.clone(),
            })
    }

    /// Latest type declared under `name`.
    pub fn lookup_name(&self, name: &str) -> Option<RecordType> {
        let inner = self.inner.read();
        let type_id = inner.by_name.get(name)?;
        inner.by_id.get(type_id).map(|descriptor| RecordType {
            descriptor: descriptor.clone(),
        })
    }

    /// Handle of a derived Rust record type declared on this registry.
    pub fn record_type<T: Taggable>(&self) -> Result<RecordType> {
        let inner = self.inner.read();
        inner
            .by_rust_type
            .get(&RustTypeId::of::<T>())
            .and_then(|id| inner.by_id.get(id))
            .map(|descriptor| RecordType {
                descriptor: descriptor.clone(),
            })
            .ok_or(CodecError::NotDeclared(T::NAME))
    }

    /// Registered ids in ascending order.
    pub fn type_ids(&self) -> Vec<u32> {
        self.inner.read().by_id.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().by_id.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_declaration_order() {
        let reg = TypeRegistry::new();
        let t1 = reg.declare_record_type("T1", ["a"]);
        let t2 = reg.declare_record_type("T2", ["b"]);
        let t3 = reg.declare_record_type("T3", ["c"]);
        assert_eq!((t1.type_id(), t2.type_id(), t3.type_id()), (0, 1, 2));
        assert_eq!(reg.type_ids(), vec![0, 1, 2]);
    }

    #[test]
    fn different_order_gives_different_ids() {
        let first = TypeRegistry::new();
        first.declare_record_type("T1", ["a"]);
        first.declare_record_type("T2", ["b"]);

        let second = TypeRegistry::new();
        second.declare_record_type("T2", ["b"]);
        second.declare_record_type("T1", ["a"]);

        assert_eq!(first.lookup_name("T1").map(|t| t.type_id()), Some(0));
        assert_eq!(second.lookup_name("T1").map(|t| t.type_id()), Some(1));
    }

    #[test]
    fn redeclaring_a_name_appends() {
        let reg = TypeRegistry::new();
        let a = reg.declare_record_type("Point", ["x", "y"]);
        let b = reg.declare_record_type("Point", ["x", "y"]);
        assert_ne!(a.type_id(), b.type_id());
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.lookup_name("Point").map(|t| t.type_id()), Some(1));
    }

    #[test]
    fn resolve_unknown_id() {
        let reg = TypeRegistry::new();
        reg.declare_record_type("Only", Vec::<String>::new());
        assert_eq!(reg.resolve(5).unwrap_err(), CodecError::UnknownType(5));
        assert_eq!(reg.resolve(0).unwrap().name(), "Only");
    }

    #[test]
    fn explicit_id_collisions_rejected() {
        let reg = TypeRegistry::new();
        reg.declare_with_id(10, "Ping", ["seq"]).unwrap();
        assert_eq!(
            reg.declare_with_id(10, "Pong", ["seq"]).unwrap_err(),
            CodecError::DuplicateTypeId(10)
        );
        assert_eq!(
            reg.declare_with_id(11, "Ping", ["seq"]).unwrap_err(),
            CodecError::DuplicateTypeName("Ping".into())
        );
    }

    #[test]
    fn implicit_ids_skip_explicit_ones() {
        let reg = TypeRegistry::new();
        reg.declare_with_id(1, "Fixed", ["v"]).unwrap();
        // one type registered, so the next implicit id would be 1: taken
        let next = reg.declare_record_type("Implicit", ["v"]);
        assert_eq!(next.type_id(), 2);
    }

    #[test]
    fn fingerprint_is_order_independent_across_registries() {
        let a = TypeRegistry::new();
        a.declare_record_type("Filler", ["x"]);
        let ta = a.declare_fingerprinted("Sensor", ["id", "reading"]).unwrap();

        let b = TypeRegistry::new();
        let tb = b.declare_fingerprinted("Sensor", ["id", "reading"]).unwrap();

        assert_eq!(ta.type_id(), tb.type_id());
        assert_ne!(
            RecordDescriptor::fingerprint("Sensor", &["id", "reading"]),
            RecordDescriptor::fingerprint("Sensor", &["idreading"])
        );
    }

    #[test]
    fn instantiate_checks_arity() {
        let reg = TypeRegistry::new();
        let msg = reg.declare_record_type("Message", ["name", "value"]);
        let err = msg.instantiate(vec![Value::from("x")]).unwrap_err();
        assert_eq!(
            err,
            CodecError::ConstructorArity {
                type_name: "Message".into(),
                expected: 2,
                actual: 1,
            }
        );
        let rec = msg
            .instantiate(vec![Value::from("x"), Value::from(1i32)])
            .unwrap();
        assert_eq!(rec.type_id(), 0);
    }

    #[test]
    fn build_by_field_name() {
        let reg = TypeRegistry::new();
        let msg = reg.declare_record_type("Message", ["name", "value"]);
        let rec = msg.build([("value", Value::from(3i32))]).unwrap();
        assert_eq!(rec.get("value"), Some(&Value::Int(3)));
        assert_eq!(rec.get("name"), Some(&Value::Nil));
        assert_eq!(
            msg.build([("missing", 1i32)]).unwrap_err(),
            CodecError::FieldNotFound("missing".into())
        );
    }
}
