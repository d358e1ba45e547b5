// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Tagged encode/decode.
//!
//! An envelope is the primitive encoding of `[type_id, field_1, ..., field_n]`.
//! Nested records are encoded on their own and embedded as byte strings, at
//! any position: directly in a field, inside a sequence, or as a map value.
//!
//! Decoding has no schema to tell a nested record from a raw byte string, so
//! every byte string is offered to [`TaggedCodec::try_decode_as_record`]; if
//! it parses as an envelope of a registered type with the right arity it
//! becomes a record, otherwise it stays bytes.
//!
//! # Known limitation
//!
//! A raw byte field whose content happens to be a valid envelope for some
//! registered type is turned into a record on decode. Nothing in the wire
//! format distinguishes the two cases. Callers storing arbitrary binary
//! payloads next to nested records can turn recovery off with
//! [`CodecConfig::with_recover_nested`] and convert fields themselves.

use crate::config::CodecConfig;
use crate::error::{CodecError, Result};
use crate::msgpack::MsgPack;
use crate::primitive::PrimitiveCodec;
use crate::record::Record;
use crate::registry::TypeRegistry;
use crate::taggable::Taggable;
use crate::value::{canonical_entries, Value};
use std::sync::Arc;

/// Encoder/decoder bound to one type registry.
#[derive(Debug, Clone)]
pub struct TaggedCodec<C = MsgPack> {
    registry: Arc<TypeRegistry>,
    primitive: C,
    config: CodecConfig,
}

impl TaggedCodec<MsgPack> {
    /// MessagePack codec with the built-in config.
    ///
    /// The environment is not consulted; pass [`CodecConfig::from_env`] to
    /// [`TaggedCodec::with_config`] for `DINOBYTES_*` overrides.
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self::with_config(registry, CodecConfig::default())
    }

    pub fn with_config(registry: Arc<TypeRegistry>, config: CodecConfig) -> Self {
        let primitive = MsgPack::from_config(&config);
        Self {
            registry,
            primitive,
            config,
        }
    }
}

impl<C: PrimitiveCodec> TaggedCodec<C> {
    /// Codec over a caller-supplied primitive codec.
    pub fn with_primitive(registry: Arc<TypeRegistry>, primitive: C, config: CodecConfig) -> Self {
        Self {
            registry,
            primitive,
            config,
        }
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Encode
    // -----------------------------------------------------------------------

    /// Encode a record into an envelope.
    ///
    /// Fails only if the primitive codec rejects a value or nesting exceeds
    /// `max_depth`.
    pub fn encode(&self, record: &Record) -> Result<Vec<u8>> {
        self.encode_at(record, 0)
    }

    fn encode_at(&self, record: &Record, depth: usize) -> Result<Vec<u8>> {
        if depth >= self.config.max_depth {
            return Err(CodecError::DepthExceeded(self.config.max_depth));
        }
        let mut envelope = Vec::with_capacity(record.fields().len() + 1);
        envelope.push(Value::from(record.type_id()));
        for field in record.fields() {
            envelope.push(self.transform(field.clone(), depth)?);
        }
        Ok(self.primitive.encode_primitive(&Value::Seq(envelope))?)
    }

    /// Replace every nested record with its envelope bytes and make integers
    /// canonical.
    fn transform(&self, value: Value, depth: usize) -> Result<Value> {
        walk_nested(value, depth, self.config.max_depth, &mut |leaf, at| match leaf {
            Value::Record(nested) => self.encode_at(&nested, at + 1).map(Value::Bytes),
            Value::UInt(v) => Ok(Value::from(v)),
            other => Ok(other),
        })
    }

    /// Encode a derived Rust record declared on this codec's registry.
    pub fn encode_typed<T: Taggable>(&self, value: &T) -> Result<Vec<u8>> {
        let record = value.to_record(&self.registry)?;
        self.encode(&record)
    }

    // -----------------------------------------------------------------------
    // Decode
    // -----------------------------------------------------------------------

    /// Decode an envelope into a record of whatever type its id names.
    pub fn decode(&self, bytes: &[u8]) -> Result<Record> {
        self.decode_at(bytes, 0)
    }

    fn decode_at(&self, bytes: &[u8], depth: usize) -> Result<Record> {
        if depth >= self.config.max_depth {
            return Err(CodecError::DepthExceeded(self.config.max_depth));
        }
        let items = match self.primitive.decode_primitive(bytes) {
            Ok(Value::Seq(items)) => items,
            Ok(other) => {
                return Err(CodecError::MalformedEnvelope(format!(
                    "expected sequence, found {}",
                    other.kind_name()
                )))
            }
            Err(e) => return Err(CodecError::MalformedEnvelope(e.to_string())),
        };

        let mut items = items.into_iter();
        let head = items
            .next()
            .ok_or_else(|| CodecError::MalformedEnvelope("empty envelope".into()))?;
        let type_id = envelope_type_id(&head)?;
        let record_type = self.registry.resolve(type_id)?;

        let fields = items
            .map(|raw| self.recover(raw, depth))
            .collect::<Result<Vec<_>>>()?;
        record_type.instantiate(fields)
    }

    /// Reinterpret byte strings as nested records where they parse as one.
    fn recover(&self, value: Value, depth: usize) -> Result<Value> {
        if !self.config.recover_nested {
            return Ok(value);
        }
        walk_nested(value, depth, self.config.max_depth, &mut |leaf, at| {
            Ok(match leaf {
                Value::Bytes(bytes) => match self.try_decode_at(&bytes, at + 1) {
                    Some(nested) => Value::Record(nested),
                    None => Value::Bytes(bytes),
                },
                other => other,
            })
        })
    }

    /// Best-effort decode: `None` when `bytes` is not an envelope of a
    /// registered type with matching arity.
    pub fn try_decode_as_record(&self, bytes: &[u8]) -> Option<Record> {
        self.try_decode_at(bytes, 0)
    }

    fn try_decode_at(&self, bytes: &[u8], depth: usize) -> Option<Record> {
        match self.decode_at(bytes, depth) {
            Ok(record) => Some(record),
            Err(e) => {
                log::trace!(
                    "[dinobytes] {} bytes kept raw, not an envelope: {}",
                    bytes.len(),
                    e
                );
                None
            }
        }
    }

    /// Decode an envelope that must hold a `T`.
    pub fn decode_as<T: Taggable>(&self, bytes: &[u8]) -> Result<T> {
        T::from_record(self.decode(bytes)?)
    }
}

fn envelope_type_id(head: &Value) -> Result<u32> {
    head.as_u64()
        .and_then(|id| u32::try_from(id).ok())
        .ok_or_else(|| {
            CodecError::MalformedEnvelope(format!(
                "envelope head is not a type id: {}",
                head.kind_name()
            ))
        })
}

/// Shared recursive walk for both directions.
///
/// Descends into sequence elements and map values and hands every other
/// value to `leaf` together with its depth. Map keys come out canonical; two
/// keys that collapse into one fail with `DuplicateKey`.
pub(crate) fn walk_nested<F>(value: Value, depth: usize, max_depth: usize, leaf: &mut F) -> Result<Value>
where
    F: FnMut(Value, usize) -> Result<Value>,
{
    match value {
        Value::Seq(items) => {
            if depth >= max_depth {
                return Err(CodecError::DepthExceeded(max_depth));
            }
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(walk_nested(item, depth + 1, max_depth, &mut *leaf)?);
            }
            Ok(Value::Seq(out))
        }
        Value::Map(entries) => {
            if depth >= max_depth {
                return Err(CodecError::DepthExceeded(max_depth));
            }
            canonical_entries(entries, |item| {
                walk_nested(item, depth + 1, max_depth, &mut *leaf)
            })
            .map(Value::Map)
        }
        other => leaf(other, depth),
    }
}
