// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Self-describing tagged binary serialization.
//!
//! Records are encoded as `[type_id, field_1, ..., field_n]` through a
//! primitive codec (MessagePack by default). The type id comes from a
//! [`TypeRegistry`]; nested records are embedded as their own envelopes, and
//! the decoder recovers them without a schema.
//!
//! # Architecture
//!
//! ```text
//! Record / #[derive(Record)] struct
//!        |
//!        v
//!   TaggedCodec  --- resolve ids --->  TypeRegistry
//!        |
//!        v
//!   PrimitiveCodec (MsgPack)
//!        |
//!        v
//!      bytes
//! ```
//!
//! # Example
//!
//! ```rust
//! use dinobytes::{Record, TaggedCodec, TypeRegistry};
//! use std::sync::Arc;
//!
//! #[derive(Debug, Clone, PartialEq, Record)]
//! struct Message {
//!     name: String,
//!     value: i64,
//! }
//!
//! #[derive(Debug, Clone, PartialEq, Record)]
//! struct Container {
//!     message: Message,
//! }
//!
//! let registry = Arc::new(TypeRegistry::new());
//! assert_eq!(registry.declare::<Message>().type_id(), 0);
//! assert_eq!(registry.declare::<Container>().type_id(), 1);
//!
//! let codec = TaggedCodec::new(registry);
//! let original = Container {
//!     message: Message { name: "Test".into(), value: 123 },
//! };
//! let bytes = codec.encode_typed(&original).unwrap();
//!
//! // Decoding dispatches on the embedded type id.
//! let record = codec.decode(&bytes).unwrap();
//! assert_eq!(record.type_name(), "Container");
//! assert_eq!(record.record("message").map(|m| m.type_name()), Some("Message"));
//!
//! let decoded: Container = codec.decode_as(&bytes).unwrap();
//! assert_eq!(decoded, original);
//! ```
//!
//! # Design Decisions
//!
//! - Ids are assigned in declaration order unless declared explicitly or by
//!   fingerprint; both ends must declare the same types in the same order.
//! - Registries are owned values; [`global`] offers an optional shared slot.
//! - Byte strings that parse as an envelope are decoded as records. See
//!   [`codec`] for the ambiguity this implies.

// Lets generated code refer to `::dinobytes` from inside this crate.
extern crate self as dinobytes;

pub mod codec;
pub mod config;
pub mod error;
pub mod global;
pub mod msgpack;
pub mod primitive;
pub mod record;
pub mod registry;
pub mod taggable;
pub mod value;

pub use codec::TaggedCodec;
pub use config::CodecConfig;
pub use dinobytes_codegen::Record;
pub use error::{CodecError, PrimitiveError, Result};
pub use global::{global, init_global, teardown_global};
pub use msgpack::MsgPack;
pub use primitive::PrimitiveCodec;
pub use record::Record;
pub use registry::{RecordDescriptor, RecordType, TypeRegistry};
pub use taggable::{FromValue, KeyValue, Tagged, Taggable, ToValue};
pub use value::{Bytes, Key, Value};

#[doc(hidden)]
pub use taggable::__private;
