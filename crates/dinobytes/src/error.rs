// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for the primitive codec and the tagged codec.

use std::fmt;

/// Errors raised by a [`PrimitiveCodec`](crate::PrimitiveCodec).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimitiveError {
    /// Input ended before the value was complete.
    Truncated,
    /// Input is not valid MessagePack.
    Decode(String),
    /// Writing the encoded form failed.
    Encode(String),
    /// String payload is not valid UTF-8.
    InvalidUtf8,
    /// Bytes left over after the top-level value.
    TrailingBytes(usize),
    /// Value variant cannot be written by this codec.
    UnsupportedValue(&'static str),
    /// Mapping key variant cannot be represented as a [`Key`](crate::Key).
    UnsupportedKey(&'static str),
    /// The same mapping key appears twice.
    DuplicateKey(String),
    /// Container or payload length exceeds the configured or wire limit.
    TooLarge { len: usize, max: usize },
    /// Containers nested deeper than the configured limit.
    DepthExceeded(usize),
}

impl fmt::Display for PrimitiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveError::Truncated => write!(f, "truncated input"),
            PrimitiveError::Decode(reason) => write!(f, "invalid input: {}", reason),
            PrimitiveError::Encode(reason) => write!(f, "encode failed: {}", reason),
            PrimitiveError::InvalidUtf8 => write!(f, "string is not valid UTF-8"),
            PrimitiveError::TrailingBytes(n) => {
                write!(f, "{} trailing bytes after top-level value", n)
            }
            PrimitiveError::UnsupportedValue(kind) => write!(f, "unsupported value: {}", kind),
            PrimitiveError::UnsupportedKey(kind) => write!(f, "unsupported map key: {}", kind),
            PrimitiveError::DuplicateKey(key) => write!(f, "duplicate map key: {}", key),
            PrimitiveError::TooLarge { len, max } => {
                write!(f, "length {} exceeds limit {}", len, max)
            }
            PrimitiveError::DepthExceeded(max) => {
                write!(f, "nesting exceeds maximum depth {}", max)
            }
        }
    }
}

impl std::error::Error for PrimitiveError {}

/// Errors raised by the type registry and the tagged codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Envelope names a type id absent from the registry.
    UnknownType(u32),
    /// Bytes are not a primitive-encoded, non-empty sequence headed by a type id.
    MalformedEnvelope(String),
    /// Field count does not match the record type's arity.
    ConstructorArity {
        type_name: String,
        expected: usize,
        actual: usize,
    },
    /// Primitive codec rejected a value while encoding.
    Primitive(PrimitiveError),
    /// Explicit registration collided with an existing type id.
    DuplicateTypeId(u32),
    /// Explicit registration collided with an existing type name.
    DuplicateTypeName(String),
    /// Rust record type was never declared on this registry.
    NotDeclared(&'static str),
    /// Record has no field with this name.
    FieldNotFound(String),
    /// Two map keys are equal once integers are canonical.
    DuplicateKey(String),
    /// Typed binding received a value of the wrong shape.
    TypeMismatch { expected: String, found: String },
    /// Records or containers nested deeper than the configured limit.
    DepthExceeded(usize),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::UnknownType(id) => write!(f, "unknown record type id: {}", id),
            CodecError::MalformedEnvelope(reason) => write!(f, "malformed envelope: {}", reason),
            CodecError::ConstructorArity {
                type_name,
                expected,
                actual,
            } => write!(
                f,
                "{} expects {} fields, got {}",
                type_name, expected, actual
            ),
            CodecError::Primitive(e) => write!(f, "primitive codec error: {}", e),
            CodecError::DuplicateTypeId(id) => write!(f, "type id already registered: {}", id),
            CodecError::DuplicateTypeName(name) => {
                write!(f, "type name already registered: {}", name)
            }
            CodecError::NotDeclared(name) => {
                write!(f, "record type not declared on this registry: {}", name)
            }
            CodecError::FieldNotFound(name) => write!(f, "field not found: {}", name),
            CodecError::DuplicateKey(key) => write!(f, "duplicate map key: {}", key),
            CodecError::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected {}, found {}", expected, found)
            }
            CodecError::DepthExceeded(max) => {
                write!(f, "nesting exceeds maximum depth {}", max)
            }
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CodecError::Primitive(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PrimitiveError> for CodecError {
    fn from(e: PrimitiveError) -> Self {
        CodecError::Primitive(e)
    }
}

pub type Result<T> = core::result::Result<T, CodecError>;
