// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! MessagePack primitive codec on top of `rmpv`.
//!
//! Covers nil, bool, integers, float32/64, str, bin, array and map.
//! Extension types are rejected. `rmp` always writes the smallest form, so
//! equal values encode to equal bytes.
//!
//! The wire reading itself is `rmpv`'s; this module maps between its value
//! tree and [`Value`] and enforces what the tagged codec relies on:
//!
//! - exactly one value per buffer (trailing bytes are an error)
//! - nesting no deeper than `max_depth`
//! - no string, byte string or container longer than `max_container_len`
//! - scalar map keys, each appearing once

use crate::config::CodecConfig;
use crate::error::PrimitiveError;
use crate::primitive::PrimitiveCodec;
use crate::value::{Key, Value};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::io::ErrorKind;

const WIRE_MAX_LEN: usize = u32::MAX as usize;

/// MessagePack primitive codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsgPack {
    max_depth: usize,
    max_len: usize,
}

impl MsgPack {
    /// Codec with the built-in limits.
    pub fn new() -> Self {
        Self::from_config(&CodecConfig::default())
    }

    /// Codec using the depth and length limits of `config`.
    pub fn from_config(config: &CodecConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            max_len: config.max_container_len,
        }
    }
}

impl Default for MsgPack {
    fn default() -> Self {
        Self::new()
    }
}

impl PrimitiveCodec for MsgPack {
    fn encode_primitive(&self, value: &Value) -> Result<Vec<u8>, PrimitiveError> {
        let wire = self.encode_wire(value, 0)?;
        let mut buf = Vec::with_capacity(64);
        rmpv::encode::write_value(&mut buf, &wire)
            .map_err(|e| PrimitiveError::Encode(e.to_string()))?;
        Ok(buf)
    }

    fn decode_primitive(&self, bytes: &[u8]) -> Result<Value, PrimitiveError> {
        let mut rd = bytes;
        // Headroom over our own limit; the exact check happens in decode_wire.
        let wire = rmpv::decode::read_value_with_max_depth(&mut rd, self.max_depth.saturating_add(2))
            .map_err(|e| self.read_error(e))?;
        if !rd.is_empty() {
            return Err(PrimitiveError::TrailingBytes(rd.len()));
        }
        self.decode_wire(wire, 0)
    }
}

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

impl MsgPack {
    fn encode_wire(&self, value: &Value, depth: usize) -> Result<rmpv::Value, PrimitiveError> {
        Ok(match value {
            Value::Nil => rmpv::Value::Nil,
            Value::Bool(v) => rmpv::Value::Boolean(*v),
            Value::Int(v) => rmpv::Value::from(*v),
            Value::UInt(v) => rmpv::Value::from(*v),
            Value::F32(v) => rmpv::Value::F32(*v),
            Value::F64(v) => rmpv::Value::F64(*v),
            Value::Str(v) => {
                check_wire_len(v.len())?;
                rmpv::Value::from(v.as_str())
            }
            Value::Bytes(v) => {
                check_wire_len(v.len())?;
                rmpv::Value::Binary(v.clone())
            }
            Value::Seq(items) => {
                self.check_depth(depth)?;
                check_wire_len(items.len())?;
                rmpv::Value::Array(
                    items
                        .iter()
                        .map(|item| self.encode_wire(item, depth + 1))
                        .collect::<Result<_, _>>()?,
                )
            }
            Value::Map(entries) => {
                self.check_depth(depth)?;
                check_wire_len(entries.len())?;
                // Int(1) and UInt(1) are one key on the wire.
                let mut seen = BTreeSet::new();
                let mut wire = Vec::with_capacity(entries.len());
                for (key, item) in entries {
                    let key = key.clone().into_canonical();
                    if seen.contains(&key) {
                        return Err(PrimitiveError::DuplicateKey(format!("{:?}", key)));
                    }
                    wire.push((key_to_wire(&key), self.encode_wire(item, depth + 1)?));
                    seen.insert(key);
                }
                rmpv::Value::Map(wire)
            }
            Value::Record(_) => return Err(PrimitiveError::UnsupportedValue("record")),
        })
    }

    fn check_depth(&self, depth: usize) -> Result<(), PrimitiveError> {
        if depth >= self.max_depth {
            return Err(PrimitiveError::DepthExceeded(self.max_depth));
        }
        Ok(())
    }
}

fn key_to_wire(key: &Key) -> rmpv::Value {
    match key {
        Key::Bool(v) => rmpv::Value::Boolean(*v),
        Key::Int(v) => rmpv::Value::from(*v),
        Key::UInt(v) => rmpv::Value::from(*v),
        Key::Str(v) => rmpv::Value::from(v.as_str()),
        Key::Bytes(v) => rmpv::Value::Binary(v.clone()),
    }
}

fn check_wire_len(len: usize) -> Result<(), PrimitiveError> {
    if len > WIRE_MAX_LEN {
        return Err(PrimitiveError::TooLarge {
            len,
            max: WIRE_MAX_LEN,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

impl MsgPack {
    fn read_error(&self, e: rmpv::decode::Error) -> PrimitiveError {
        use rmpv::decode::Error;

        match e {
            Error::InvalidMarkerRead(ref io) | Error::InvalidDataRead(ref io)
                if io.kind() == ErrorKind::UnexpectedEof =>
            {
                PrimitiveError::Truncated
            }
            Error::DepthLimitExceeded => PrimitiveError::DepthExceeded(self.max_depth),
            other => PrimitiveError::Decode(other.to_string()),
        }
    }

    fn check_len(&self, len: usize) -> Result<(), PrimitiveError> {
        if len > self.max_len {
            return Err(PrimitiveError::TooLarge {
                len,
                max: self.max_len,
            });
        }
        Ok(())
    }

    fn decode_wire(&self, wire: rmpv::Value, depth: usize) -> Result<Value, PrimitiveError> {
        Ok(match wire {
            rmpv::Value::Nil => Value::Nil,
            rmpv::Value::Boolean(v) => Value::Bool(v),
            rmpv::Value::Integer(n) => match (n.as_i64(), n.as_u64()) {
                (Some(v), _) => Value::Int(v),
                (None, Some(v)) => Value::UInt(v),
                (None, None) => return Err(PrimitiveError::Decode(format!("integer {:?}", n))),
            },
            rmpv::Value::F32(v) => Value::F32(v),
            rmpv::Value::F64(v) => Value::F64(v),
            rmpv::Value::String(s) => {
                let text = s.as_str().ok_or(PrimitiveError::InvalidUtf8)?;
                self.check_len(text.len())?;
                Value::Str(text.to_string())
            }
            rmpv::Value::Binary(v) => {
                self.check_len(v.len())?;
                Value::Bytes(v)
            }
            rmpv::Value::Array(items) => {
                self.enter(depth, items.len())?;
                Value::Seq(
                    items
                        .into_iter()
                        .map(|item| self.decode_wire(item, depth + 1))
                        .collect::<Result<_, _>>()?,
                )
            }
            rmpv::Value::Map(pairs) => {
                self.enter(depth, pairs.len())?;
                let mut entries = BTreeMap::new();
                for (key, item) in pairs {
                    let key = value_to_key(self.decode_wire(key, depth + 1)?)?;
                    match entries.entry(key) {
                        Entry::Occupied(slot) => {
                            return Err(PrimitiveError::DuplicateKey(format!("{:?}", slot.key())));
                        }
                        Entry::Vacant(slot) => {
                            slot.insert(self.decode_wire(item, depth + 1)?);
                        }
                    }
                }
                Value::Map(entries)
            }
            rmpv::Value::Ext(..) => return Err(PrimitiveError::UnsupportedValue("ext")),
        })
    }

    fn enter(&self, depth: usize, len: usize) -> Result<(), PrimitiveError> {
        if depth >= self.max_depth {
            return Err(PrimitiveError::DepthExceeded(self.max_depth));
        }
        self.check_len(len)
    }
}

fn value_to_key(value: Value) -> Result<Key, PrimitiveError> {
    match value {
        Value::Bool(v) => Ok(Key::Bool(v)),
        Value::Int(v) => Ok(Key::Int(v)),
        Value::UInt(v) => Ok(Key::UInt(v)),
        Value::Str(v) => Ok(Key::Str(v)),
        Value::Bytes(v) => Ok(Key::Bytes(v)),
        other => Err(PrimitiveError::UnsupportedKey(other.kind_name())),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
