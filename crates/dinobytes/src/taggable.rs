// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed bindings: Rust structs as record types.
//!
//! `#[derive(Record)]` implements [`Taggable`], [`ToValue`] and
//! [`FromValue`] for a struct with named fields. The struct has to be
//! declared on a registry ([`TypeRegistry::declare`]) before it can be
//! encoded.

use crate::codec::TaggedCodec;
use crate::error::{CodecError, Result};
use crate::primitive::PrimitiveCodec;
use crate::record::Record;
use crate::registry::{RecordType, TypeRegistry};
use crate::value::{Bytes, Key, Value};
use std::collections::BTreeMap;
use std::ops::Deref;

/// A Rust type with a fixed record shape.
pub trait Taggable: Sized + 'static {
    /// Record type name.
    const NAME: &'static str;

    /// Field names in wire order.
    const FIELDS: &'static [&'static str];

    /// Field values in [`Self::FIELDS`] order.
    fn to_fields(&self, registry: &TypeRegistry) -> Result<Vec<Value>>;

    /// Positional constructor.
    fn from_fields(fields: Vec<Value>) -> Result<Self>;

    /// Convert into a record of this type's declared descriptor.
    fn to_record(&self, registry: &TypeRegistry) -> Result<Record> {
        let record_type = registry.record_type::<Self>()?;
        record_type.instantiate(self.to_fields(registry)?)
    }

    /// Convert a decoded record, checking the type name first.
    fn from_record(record: Record) -> Result<Self> {
        if record.type_name() != Self::NAME {
            return Err(CodecError::TypeMismatch {
                expected: Self::NAME.to_string(),
                found: record.type_name().to_string(),
            });
        }
        Self::from_fields(record.into_fields())
    }
}

/// Conversion of a field into a [`Value`].
pub trait ToValue {
    fn to_value(&self, registry: &TypeRegistry) -> Result<Value>;
}

/// Conversion of a decoded [`Value`] back into a field.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
}

/// Conversion of map keys.
pub trait KeyValue: Sized {
    fn to_key(&self) -> Key;
    fn from_key(key: Key) -> Result<Self>;
}

pub(crate) fn type_mismatch(expected: &str, found: &Value) -> CodecError {
    CodecError::TypeMismatch {
        expected: expected.to_string(),
        found: found.kind_name().to_string(),
    }
}

// ---------------------------------------------------------------------------
// Scalar impls
// ---------------------------------------------------------------------------

impl ToValue for bool {
    fn to_value(&self, _: &TypeRegistry) -> Result<Value> {
        Ok(Value::Bool(*self))
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        value.as_bool().ok_or_else(|| type_mismatch("bool", &value))
    }
}

macro_rules! int_value {
    ($($t:ty),*) => {
        $(
            impl ToValue for $t {
                fn to_value(&self, _: &TypeRegistry) -> Result<Value> {
                    Ok(Value::from(*self))
                }
            }

            impl FromValue for $t {
                fn from_value(value: Value) -> Result<Self> {
                    let converted = match &value {
                        Value::Int(v) => <$t>::try_from(*v).ok(),
                        Value::UInt(v) => <$t>::try_from(*v).ok(),
                        _ => None,
                    };
                    converted.ok_or_else(|| type_mismatch(stringify!($t), &value))
                }
            }

            impl KeyValue for $t {
                fn to_key(&self) -> Key {
                    match i64::try_from(*self) {
                        Ok(v) => Key::Int(v),
                        Err(_) => Key::UInt(*self as u64),
                    }
                }

                fn from_key(key: Key) -> Result<Self> {
                    <$t>::from_value(Value::from(key))
                }
            }
        )*
    };
}

int_value!(i8, i16, i32, i64, u8, u16, u32, u64);

impl ToValue for f32 {
    fn to_value(&self, _: &TypeRegistry) -> Result<Value> {
        Ok(Value::F32(*self))
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::F32(v) => Ok(v),
            other => Err(type_mismatch("f32", &other)),
        }
    }
}

impl ToValue for f64 {
    fn to_value(&self, _: &TypeRegistry) -> Result<Value> {
        Ok(Value::F64(*self))
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self> {
        value.as_f64().ok_or_else(|| type_mismatch("f64", &value))
    }
}

impl ToValue for String {
    fn to_value(&self, _: &TypeRegistry) -> Result<Value> {
        Ok(Value::Str(self.clone()))
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Str(v) => Ok(v),
            other => Err(type_mismatch("string", &other)),
        }
    }
}

impl KeyValue for String {
    fn to_key(&self) -> Key {
        Key::Str(self.clone())
    }

    fn from_key(key: Key) -> Result<Self> {
        String::from_value(Value::from(key))
    }
}

impl KeyValue for bool {
    fn to_key(&self) -> Key {
        Key::Bool(*self)
    }

    fn from_key(key: Key) -> Result<Self> {
        bool::from_value(Value::from(key))
    }
}

impl ToValue for Bytes {
    fn to_value(&self, _: &TypeRegistry) -> Result<Value> {
        Ok(Value::Bytes(self.0.clone()))
    }
}

impl FromValue for Bytes {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bytes(v) => Ok(Bytes(v)),
            other => Err(type_mismatch("bytes", &other)),
        }
    }
}

impl KeyValue for Bytes {
    fn to_key(&self) -> Key {
        Key::Bytes(self.0.clone())
    }

    fn from_key(key: Key) -> Result<Self> {
        Bytes::from_value(Value::from(key))
    }
}

// ---------------------------------------------------------------------------
// Dynamic values and containers
// ---------------------------------------------------------------------------

impl ToValue for Value {
    fn to_value(&self, _: &TypeRegistry) -> Result<Value> {
        Ok(self.clone())
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl ToValue for Record {
    fn to_value(&self, _: &TypeRegistry) -> Result<Value> {
        Ok(Value::Record(self.clone()))
    }
}

impl FromValue for Record {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Record(r) => Ok(r),
            other => Err(type_mismatch("record", &other)),
        }
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self, registry: &TypeRegistry) -> Result<Value> {
        match self {
            Some(v) => v.to_value(registry),
            None => Ok(Value::Nil),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Nil => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: ToValue> ToValue for Box<T> {
    fn to_value(&self, registry: &TypeRegistry) -> Result<Value> {
        (**self).to_value(registry)
    }
}

impl<T: FromValue> FromValue for Box<T> {
    fn from_value(value: Value) -> Result<Self> {
        T::from_value(value).map(Box::new)
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self, registry: &TypeRegistry) -> Result<Value> {
        self.iter()
            .map(|item| item.to_value(registry))
            .collect::<Result<Vec<_>>>()
            .map(Value::Seq)
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Seq(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(type_mismatch("sequence", &other)),
        }
    }
}

impl<K: KeyValue + Ord, V: ToValue> ToValue for BTreeMap<K, V> {
    fn to_value(&self, registry: &TypeRegistry) -> Result<Value> {
        let mut entries = BTreeMap::new();
        for (key, value) in self {
            entries.insert(key.to_key(), value.to_value(registry)?);
        }
        Ok(Value::Map(entries))
    }
}

impl<K: KeyValue + Ord, V: FromValue> FromValue for BTreeMap<K, V> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| Ok((K::from_key(k)?, V::from_value(v)?)))
                .collect(),
            other => Err(type_mismatch("map", &other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tagged<T>
// ---------------------------------------------------------------------------

/// A plain value paired with the record type it is registered under.
///
/// Exposes the type id and field order next to the value, and round-trips
/// through a codec without the caller naming the type again.
#[derive(Debug, Clone)]
pub struct Tagged<T> {
    value: T,
    record_type: RecordType,
}

impl<T: Taggable> Tagged<T> {
    /// Pair `value` with its declaration on `registry`.
    pub fn new(registry: &TypeRegistry, value: T) -> Result<Self> {
        let record_type = registry.record_type::<T>()?;
        Ok(Self { value, record_type })
    }

    pub fn type_id(&self) -> u32 {
        self.record_type.type_id()
    }

    pub fn field_order(&self) -> &[String] {
        self.record_type.field_order()
    }

    pub fn record_type(&self) -> &RecordType {
        &self.record_type
    }

    pub fn into_inner(self) -> T {
        self.value
    }

    /// Encode the wrapped value.
    pub fn to_bytes<C: PrimitiveCodec>(&self, codec: &TaggedCodec<C>) -> Result<Vec<u8>> {
        codec.encode_typed(&self.value)
    }

    /// Decode bytes that must hold a `T` envelope.
    pub fn from_bytes<C: PrimitiveCodec>(codec: &TaggedCodec<C>, bytes: &[u8]) -> Result<Self> {
        let value = codec.decode_as::<T>(bytes)?;
        Self::new(codec.registry(), value)
    }
}

impl<T> Deref for Tagged<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

// Support code for `#[derive(Record)]`.
#[doc(hidden)]
pub mod __private {
    use super::*;

    pub fn check_arity(type_name: &str, expected: usize, fields: Vec<Value>) -> Result<Vec<Value>> {
        if fields.len() != expected {
            return Err(CodecError::ConstructorArity {
                type_name: type_name.to_string(),
                expected,
                actual: fields.len(),
            });
        }
        Ok(fields)
    }

    pub fn bytes_from_value(value: Value) -> Result<Vec<u8>> {
        Bytes::from_value(value).map(Bytes::into_inner)
    }

    pub fn record_from_value<T: Taggable>(value: Value) -> Result<T> {
        match value {
            Value::Record(r) => T::from_record(r),
            other => Err(type_mismatch(T::NAME, &other)),
        }
    }
}
