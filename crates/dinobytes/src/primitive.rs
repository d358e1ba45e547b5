// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Primitive codec seam.

use crate::error::PrimitiveError;
use crate::value::Value;

/// Byte-level serializer for scalars and plain containers.
///
/// The tagged codec builds envelopes out of [`Value`]s and hands them to an
/// implementation of this trait. Implementations must round-trip nil, bool,
/// integers, floats, strings, byte strings, sequences and key-ordered maps
/// without loss, reject [`Value::Record`] (the tagged codec replaces records
/// with bytes before calling `encode_primitive`), and fail on input that is
/// not exactly one value.
pub trait PrimitiveCodec {
    /// Serialize one value.
    fn encode_primitive(&self, value: &Value) -> Result<Vec<u8>, PrimitiveError>;

    /// Parse exactly one value from `bytes`.
    fn decode_primitive(&self, bytes: &[u8]) -> Result<Value, PrimitiveError>;
}

impl<C: PrimitiveCodec + ?Sized> PrimitiveCodec for &C {
    fn encode_primitive(&self, value: &Value) -> Result<Vec<u8>, PrimitiveError> {
        (**self).encode_primitive(value)
    }

    fn decode_primitive(&self, bytes: &[u8]) -> Result<Value, PrimitiveError> {
        (**self).decode_primitive(bytes)
    }
}
