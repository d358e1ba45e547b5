// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field values carried by records.

use crate::error::{CodecError, Result};
use crate::record::Record;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

/// A field value: scalar, byte string, container, or nested record.
///
/// Integers are kept canonical: anything that fits `i64` is `Int`, only
/// larger unsigned values are `UInt`. The `From` conversions and the decoder
/// produce this shape; values built from the variants directly are brought
/// into it by [`Value::into_canonical`] when they enter a record and again
/// when they are encoded, so a round trip compares equal.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    UInt(u64),
    F32(f32),
    F64(f64),
    Str(String),
    Bytes(Vec<u8>),
    Seq(Vec<Value>),
    Map(BTreeMap<Key, Value>),
    Record(Record),
}

impl Value {
    /// Rewrite `UInt` values and keys that fit `i64` as `Int`, through
    /// sequences and maps.
    ///
    /// Fails with `DuplicateKey` when two map keys collapse into one, e.g.
    /// `Int(1)` and `UInt(1)`. Nested records are left as they are; their
    /// fields were canonicalised when the record was built.
    pub fn into_canonical(self) -> Result<Value> {
        Ok(match self {
            Value::UInt(v) => Value::from(v),
            Value::Seq(items) => Value::Seq(
                items
                    .into_iter()
                    .map(Value::into_canonical)
                    .collect::<Result<Vec<_>>>()?,
            ),
            Value::Map(entries) => Value::Map(canonical_entries(entries, Value::into_canonical)?),
            other => other,
        })
    }

    /// Short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool(_) => "bool",
            Self::Int(_) | Self::UInt(_) => "integer",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::Str(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Seq(_) => "sequence",
            Self::Map(_) => "map",
            Self::Record(_) => "record",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer value as `i64`, if it fits.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::UInt(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Integer value as `u64`, if non-negative.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Int(v) => u64::try_from(*v).ok(),
            Self::UInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Float value widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::F32(v) => Some(f64::from(*v)),
            Self::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Self::Seq(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<Key, Value>> {
        match self {
            Self::Map(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_record(self) -> Option<Record> {
        match self {
            Self::Record(v) => Some(v),
            _ => None,
        }
    }
}

/// Key of a [`Value::Map`]. Only totally ordered scalars are allowed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Str(String),
    Bytes(Vec<u8>),
}

impl Key {
    /// `UInt` keys that fit `i64` become `Int`.
    pub fn into_canonical(self) -> Key {
        match self {
            Key::UInt(v) => Key::from(v),
            other => other,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) | Self::UInt(_) => "integer",
            Self::Str(_) => "string",
            Self::Bytes(_) => "bytes",
        }
    }
}

impl From<Key> for Value {
    fn from(key: Key) -> Self {
        match key {
            Key::Bool(v) => Value::Bool(v),
            Key::Int(v) => Value::Int(v),
            Key::UInt(v) => Value::UInt(v),
            Key::Str(v) => Value::Str(v),
            Key::Bytes(v) => Value::Bytes(v),
        }
    }
}

impl From<&str> for Key {
    fn from(v: &str) -> Self {
        Key::Str(v.to_string())
    }
}

impl From<String> for Key {
    fn from(v: String) -> Self {
        Key::Str(v)
    }
}

impl From<bool> for Key {
    fn from(v: bool) -> Self {
        Key::Bool(v)
    }
}

impl From<i64> for Key {
    fn from(v: i64) -> Self {
        Key::Int(v)
    }
}

impl From<u64> for Key {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(v) => Key::Int(v),
            Err(_) => Key::UInt(v),
        }
    }
}

/// Rebuild a map with canonical keys, converting each value with `convert`.
pub(crate) fn canonical_entries<F>(
    entries: BTreeMap<Key, Value>,
    mut convert: F,
) -> Result<BTreeMap<Key, Value>>
where
    F: FnMut(Value) -> Result<Value>,
{
    let mut out = BTreeMap::new();
    for (key, item) in entries {
        match out.entry(key.into_canonical()) {
            Entry::Occupied(slot) => {
                return Err(CodecError::DuplicateKey(format!("{:?}", slot.key())));
            }
            Entry::Vacant(slot) => {
                slot.insert(convert(item)?);
            }
        }
    }
    Ok(out)
}

/// Owned raw byte string.
///
/// `Vec<u8>` converts to a sequence of integers; wrap it in `Bytes` to get
/// [`Value::Bytes`] instead. Derived record fields typed `Vec<u8>` are
/// already treated as bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl Deref for Bytes {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.0
    }
}

impl DerefMut for Bytes {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.0
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(v: Vec<u8>) -> Self {
        Self(v)
    }
}

impl From<&[u8]> for Bytes {
    fn from(v: &[u8]) -> Self {
        Self(v.to_vec())
    }
}

impl From<Bytes> for Value {
    fn from(v: Bytes) -> Self {
        Value::Bytes(v.0)
    }
}

impl From<Bytes> for Key {
    fn from(v: Bytes) -> Self {
        Key::Bytes(v.0)
    }
}

// Conversion traits
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

// Every type here widens losslessly into i64.
macro_rules! value_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Self::Int(i64::from(v))
            }
        })*
    };
}

value_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(v) => Self::Int(v),
            Err(_) => Self::UInt(v),
        }
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::F32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::F64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Self::Record(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::Seq(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Nil, Into::into)
    }
}

impl<K: Into<Key>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::Map(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
