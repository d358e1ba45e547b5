// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// End-to-end tests for derived records: encode -> bytes -> decode, against
// one or more registries.

#![allow(clippy::float_cmp)]

use dinobytes::{
    Bytes, CodecConfig, CodecError, Key, MsgPack, PrimitiveCodec, Record, Tagged, TaggedCodec,
    TypeRegistry, Value,
};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Record)]
struct Message {
    name: String,
    value: i64,
}

#[derive(Debug, Clone, PartialEq, Record)]
struct Container {
    message: Message,
}

#[derive(Debug, Clone, PartialEq, Record)]
struct NestedContainer {
    label: String,
    container: Container,
}

#[derive(Debug, Clone, PartialEq, Record)]
struct Envelope {
    seq: u32,
    payload: Vec<u8>,
    reply_to: Option<Message>,
    history: Vec<Message>,
    routes: BTreeMap<String, Message>,
    weights: Vec<f64>,
    attributes: BTreeMap<u16, Bytes>,
}

#[derive(Debug, Clone, PartialEq, Record)]
#[record(name = "telemetry.Node")]
struct Node {
    id: u64,
    next: Option<Box<Node>>,
}

fn message(name: &str, value: i64) -> Message {
    Message {
        name: name.to_string(),
        value,
    }
}

fn codec_with(declare: impl FnOnce(&TypeRegistry)) -> TaggedCodec {
    let registry = TypeRegistry::new();
    declare(&registry);
    TaggedCodec::with_config(Arc::new(registry), CodecConfig::default())
}

fn standard_codec() -> TaggedCodec {
    codec_with(|reg| {
        reg.declare::<Message>();
        reg.declare::<Container>();
        reg.declare::<NestedContainer>();
        reg.declare::<Envelope>();
        reg.declare::<Node>();
    })
}

#[test]
fn test_message_container_scenario() {
    let codec = standard_codec();
    assert_eq!(codec.registry().record_type::<Message>().unwrap().type_id(), 0);
    assert_eq!(codec.registry().record_type::<Container>().unwrap().type_id(), 1);

    let original = Container {
        message: message("Test", 123),
    };
    let bytes = codec.encode_typed(&original).unwrap();

    // [1, <bytes of [0, "Test", 123]>]
    let inner = vec![0x93, 0x00, 0xa4, b'T', b'e', b's', b't', 0x7b];
    let mut expected = vec![0x92, 0x01, 0xc4, inner.len() as u8];
    expected.extend_from_slice(&inner);
    assert_eq!(bytes, expected);

    let record = codec.decode(&bytes).unwrap();
    assert_eq!(record.type_name(), "Container");
    let nested = record.record("message").expect("nested record recovered");
    assert_eq!(nested.type_name(), "Message");
    assert_eq!(nested.get("name"), Some(&Value::from("Test")));
    assert_eq!(nested.get("value"), Some(&Value::Int(123)));

    assert_eq!(codec.decode_as::<Container>(&bytes).unwrap(), original);
}

#[test]
fn test_three_levels_of_nesting() {
    let codec = standard_codec();
    let original = NestedContainer {
        label: "outer".into(),
        container: Container {
            message: message("deep", -7),
        },
    };
    let bytes = codec.encode_typed(&original).unwrap();

    let record = codec.decode(&bytes).unwrap();
    let deepest = record
        .record("container")
        .and_then(|c| c.record("message"))
        .expect("two levels recovered");
    assert_eq!(deepest.get("value"), Some(&Value::Int(-7)));

    assert_eq!(codec.decode_as::<NestedContainer>(&bytes).unwrap(), original);
}

#[test]
fn test_empty_and_absent_values_round_trip() {
    let codec = standard_codec();
    let original = Envelope {
        seq: 0,
        payload: Vec::new(),
        reply_to: None,
        history: Vec::new(),
        routes: BTreeMap::new(),
        weights: Vec::new(),
        attributes: BTreeMap::new(),
    };
    let bytes = codec.encode_typed(&original).unwrap();
    assert_eq!(codec.decode_as::<Envelope>(&bytes).unwrap(), original);

    let record = codec.decode(&bytes).unwrap();
    assert_eq!(record.get("payload"), Some(&Value::Bytes(Vec::new())));
    assert_eq!(record.get("reply_to"), Some(&Value::Nil));
}

#[test]
fn test_records_inside_containers() {
    let codec = standard_codec();
    let mut routes = BTreeMap::new();
    routes.insert("east".to_string(), message("e", 1));
    routes.insert("west".to_string(), message("w", 2));
    let mut attributes = BTreeMap::new();
    attributes.insert(7u16, Bytes(vec![0xde, 0xad]));

    let original = Envelope {
        seq: 42,
        payload: b"plain text".to_vec(),
        reply_to: Some(message("reply", 9)),
        history: vec![message("a", 1), message("b", i64::MIN)],
        routes,
        weights: vec![0.5, -1.25],
        attributes,
    };
    let bytes = codec.encode_typed(&original).unwrap();

    let record = codec.decode(&bytes).unwrap();
    let history = record.get("history").and_then(Value::as_seq).unwrap();
    assert!(history.iter().all(|v| v.as_record().is_some()));
    let routes = record.get("routes").and_then(Value::as_map).unwrap();
    assert!(routes.values().all(|v| v.as_record().is_some()));

    assert_eq!(codec.decode_as::<Envelope>(&bytes).unwrap(), original);
}

#[test]
fn test_self_referential_chain() {
    let codec = standard_codec();
    let original = Node {
        id: u64::MAX,
        next: Some(Box::new(Node {
            id: 1,
            next: Some(Box::new(Node { id: 2, next: None })),
        })),
    };
    let bytes = codec.encode_typed(&original).unwrap();
    let record = codec.decode(&bytes).unwrap();
    assert_eq!(record.type_name(), "telemetry.Node");
    assert_eq!(record.get("id"), Some(&Value::UInt(u64::MAX)));
    assert_eq!(codec.decode_as::<Node>(&bytes).unwrap(), original);
}

#[test]
fn test_depth_limit_on_typed_chain() {
    let registry = Arc::new(TypeRegistry::new());
    registry.declare::<Node>();
    let codec = TaggedCodec::with_config(registry, CodecConfig::default().with_max_depth(4));

    let mut node = Node { id: 0, next: None };
    for id in 1..10 {
        node = Node {
            id,
            next: Some(Box::new(node)),
        };
    }
    assert_eq!(
        codec.encode_typed(&node).unwrap_err(),
        CodecError::DepthExceeded(4)
    );
}

#[test]
fn test_registries_are_isolated() {
    let sender = standard_codec();
    let receiver = codec_with(|reg| {
        reg.declare_with_id(100, "Other", ["x"]).unwrap();
    });

    let bytes = sender.encode_typed(&message("m", 1)).unwrap();
    assert_eq!(receiver.decode(&bytes).unwrap_err(), CodecError::UnknownType(0));
    assert!(receiver.try_decode_as_record(&bytes).is_none());
}

#[test]
fn test_undeclared_type_cannot_be_encoded() {
    let codec = codec_with(|reg| {
        reg.declare::<Message>();
    });
    let err = codec
        .encode_typed(&Container {
            message: message("x", 0),
        })
        .unwrap_err();
    assert_eq!(err, CodecError::NotDeclared("Container"));
}

#[test]
fn test_declaration_order_determines_ids() {
    let forward = codec_with(|reg| {
        reg.declare::<Message>();
        reg.declare::<Container>();
    });
    let same = codec_with(|reg| {
        reg.declare::<Message>();
        reg.declare::<Container>();
    });
    let reversed = codec_with(|reg| {
        reg.declare::<Container>();
        reg.declare::<Message>();
    });

    let original = Container {
        message: message("order", 3),
    };
    let bytes = forward.encode_typed(&original).unwrap();
    assert_eq!(same.decode_as::<Container>(&bytes).unwrap(), original);

    // Id 1 names Message on the reversed side; the arity no longer matches.
    assert!(matches!(
        reversed.decode(&bytes),
        Err(CodecError::ConstructorArity { expected: 2, actual: 1, .. })
    ));
}

#[test]
fn test_fingerprinted_ids_ignore_declaration_order() {
    let a = TypeRegistry::new();
    let a_msg = a.declare_fingerprinted("Message", ["name", "value"]).unwrap();
    let a_box = a.declare_fingerprinted("Box", ["item"]).unwrap();

    let b = TypeRegistry::new();
    let b_box = b.declare_fingerprinted("Box", ["item"]).unwrap();
    let b_msg = b.declare_fingerprinted("Message", ["name", "value"]).unwrap();

    assert_eq!(a_msg.type_id(), b_msg.type_id());
    assert_eq!(a_box.type_id(), b_box.type_id());

    let sender = TaggedCodec::with_config(Arc::new(a), CodecConfig::default());
    let receiver = TaggedCodec::with_config(Arc::new(b), CodecConfig::default());
    let inner = a_msg
        .instantiate(vec![Value::from("fp"), Value::from(5i32)])
        .unwrap();
    let outer = a_box.instantiate(vec![Value::Record(inner)]).unwrap();

    let decoded = receiver
        .decode(&sender.encode(&outer).unwrap())
        .unwrap();
    assert_eq!(decoded.type_id(), b_box.type_id());
    assert_eq!(
        decoded.record("item").and_then(|m| m.get("name")),
        Some(&Value::from("fp"))
    );
}

#[test]
fn test_dynamic_records_match_derived_ones() {
    let codec = standard_codec();
    let message_type = codec.registry().record_type::<Message>().unwrap();
    let dynamic = message_type
        .build([("value", Value::from(123i32)), ("name", Value::from("Test"))])
        .unwrap();
    assert_eq!(
        codec.encode(&dynamic).unwrap(),
        codec.encode_typed(&message("Test", 123)).unwrap()
    );
}

#[test]
fn test_decode_as_checks_type_name() {
    let codec = standard_codec();
    let bytes = codec.encode_typed(&message("m", 1)).unwrap();
    assert_eq!(
        codec.decode_as::<Container>(&bytes).unwrap_err(),
        CodecError::TypeMismatch {
            expected: "Container".into(),
            found: "Message".into(),
        }
    );
}

#[test]
fn test_tagged_wrapper() {
    let codec = standard_codec();
    let tagged = Tagged::new(codec.registry(), message("w", 11)).unwrap();
    assert_eq!(tagged.type_id(), 0);
    assert_eq!(tagged.field_order(), ["name", "value"]);
    assert_eq!(tagged.name, "w");

    let bytes = tagged.to_bytes(&codec).unwrap();
    let back = Tagged::<Message>::from_bytes(&codec, &bytes).unwrap();
    assert_eq!(back.into_inner(), message("w", 11));
}

#[test]
fn test_truncated_and_trailing_input() {
    let codec = standard_codec();
    let bytes = codec
        .encode_typed(&Container {
            message: message("cut", 1),
        })
        .unwrap();

    for len in 0..bytes.len() {
        assert!(
            matches!(codec.decode(&bytes[..len]), Err(CodecError::MalformedEnvelope(_))),
            "prefix of {} bytes decoded",
            len
        );
    }

    let mut padded = bytes.clone();
    padded.push(0x00);
    assert!(matches!(
        codec.decode(&padded),
        Err(CodecError::MalformedEnvelope(_))
    ));
}

#[test]
fn test_envelope_is_plain_msgpack() {
    let codec = standard_codec();
    let bytes = codec.encode_typed(&message("raw", 2)).unwrap();
    let raw = MsgPack::new().decode_primitive(&bytes).unwrap();
    assert_eq!(
        raw,
        Value::Seq(vec![Value::Int(0), Value::from("raw"), Value::Int(2)])
    );
}

#[test]
fn test_unsigned_values_in_dynamic_records() {
    let codec = standard_codec();
    let sample = codec
        .registry()
        .declare_record_type("Sample", ["count", "readings", "by_channel"]);

    let mut by_channel = BTreeMap::new();
    by_channel.insert(Key::UInt(3), Value::Seq(vec![Value::UInt(30)]));
    by_channel.insert(Key::UInt(u64::MAX), Value::UInt(u64::MAX));
    let rec = sample
        .instantiate(vec![
            Value::UInt(42),
            Value::Seq(vec![Value::UInt(0), Value::Int(-1)]),
            Value::Map(by_channel),
        ])
        .unwrap();

    let back = codec.decode(&codec.encode(&rec).unwrap()).unwrap();
    assert_eq!(back, rec);
    assert_eq!(back.get("count"), Some(&Value::Int(42)));
    let keys: Vec<_> = back
        .get("by_channel")
        .and_then(Value::as_map)
        .unwrap()
        .keys()
        .cloned()
        .collect();
    assert_eq!(keys, vec![Key::Int(3), Key::UInt(u64::MAX)]);
}

#[test]
fn test_colliding_map_keys_never_reach_the_wire() {
    let codec = standard_codec();
    let sample = codec.registry().declare_record_type("Lookup", ["table"]);

    let mut table = BTreeMap::new();
    table.insert(Key::Int(1), Value::from("a"));
    table.insert(Key::UInt(1), Value::from("b"));

    let mut rec = sample.instantiate(vec![Value::Nil]).unwrap();
    assert_eq!(
        rec.set("table", Value::Map(table.clone())).unwrap_err(),
        CodecError::DuplicateKey("Int(1)".into())
    );
    assert_eq!(rec.get("table"), Some(&Value::Nil));

    // Entries are kept intact when the keys are distinct.
    table.remove(&Key::UInt(1));
    table.insert(Key::UInt(2), Value::from("b"));
    rec.set("table", Value::Map(table)).unwrap();
    let back = codec.decode(&codec.encode(&rec).unwrap()).unwrap();
    assert_eq!(back.get("table").and_then(Value::as_map).map(BTreeMap::len), Some(2));
}
