//! End-to-end tests: parse an interface, encode calls, decode replies.

use didl_codec::{decode_args, encode_args, CodecError, ServiceCodec};
use didl_core::{Label, Value};
use didl_parser::parse_interface;
use indoc::indoc;

fn greeter() -> ServiceCodec {
    let graph = parse_interface(indoc! {r#"
        type Name = text;
        service : {
          greet : (Name) -> (text) query;
        }
    "#})
    .unwrap();
    ServiceCodec::new(graph)
}

#[test]
fn greet_call_bytes() {
    let codec = greeter();
    let bytes = codec.encode_call("greet", &[Value::text("alice")]).unwrap();
    // magic(4) + empty table(1) + arg count(1) + text opcode(1) +
    // length(1) + 5 bytes of payload
    assert_eq!(bytes.len(), 13);
    assert_eq!(&bytes[..4], b"DIDL");
    assert_eq!(
        bytes,
        [b'D', b'I', b'D', b'L', 0x00, 0x01, 0x71, 0x05, b'a', b'l', b'i', b'c', b'e']
    );
}

#[test]
fn greet_reply_round_trips() {
    let codec = greeter();
    let reply = encode_args(
        codec.graph(),
        &codec.graph().method("greet").unwrap().rets,
        &[Value::text("hello, alice")],
    )
    .unwrap();
    let values = codec.decode_reply("greet", &reply).unwrap();
    assert_eq!(values, [Value::text("hello, alice")]);
}

#[test]
fn unknown_method_is_an_error() {
    let codec = greeter();
    let err = codec.encode_call("shout", &[]).unwrap_err();
    assert!(matches!(err, CodecError::UnknownMethod(name) if name == "shout"));
}

#[test]
fn rich_argument_round_trip() {
    let graph = parse_interface(indoc! {r#"
        type Profile = record {
          name : text;
          age : nat8;
          tags : vec text;
          nickname : opt text;
          balance : nat;
        };
        type Result = variant { ok : Profile; err : text };
        service : {
          save : (Profile) -> (Result);
        }
    "#})
    .unwrap();
    let codec = ServiceCodec::new(graph);

    let profile = Value::record([
        ("name", Value::text("alice")),
        ("age", Value::Nat8(30)),
        ("tags", Value::Vec(vec![Value::text("admin")])),
        ("nickname", Value::none()),
        ("balance", Value::nat(1_000_000)),
    ]);
    let bytes = codec.encode_call("save", &[profile.clone()]).unwrap();
    let decoded = codec.decode_call("save", &bytes).unwrap();
    assert_eq!(decoded, [profile]);
}

#[test]
fn variant_round_trip_keeps_names() {
    let graph = parse_interface(indoc! {r#"
        type Result = variant { ok : nat; err : text };
        service : {
          run : () -> (Result);
        }
    "#})
    .unwrap();
    let codec = ServiceCodec::new(graph);

    for value in [
        Value::variant("ok", Value::nat(99)),
        Value::variant("err", Value::text("boom")),
    ] {
        let rets = &codec.graph().method("run").unwrap().rets;
        let bytes = encode_args(codec.graph(), rets, &[value.clone()]).unwrap();
        let decoded = codec.decode_reply("run", &bytes).unwrap();
        assert_eq!(decoded, [value]);
    }
}

#[test]
fn recursive_list_round_trips() {
    let graph = parse_interface(indoc! {r#"
        type List = opt record { head : nat; tail : List };
        service : {
          sum : (List) -> (nat);
        }
    "#})
    .unwrap();
    let codec = ServiceCodec::new(graph);

    // 1 :: 2 :: 3 :: nil
    let mut list = Value::none();
    for head in [3u64, 2, 1] {
        list = Value::some(Value::record([
            ("head", Value::nat(head)),
            ("tail", list),
        ]));
    }
    let bytes = codec.encode_call("sum", &[list.clone()]).unwrap();
    let decoded = codec.decode_call("sum", &bytes).unwrap();
    assert_eq!(decoded, [list]);

    // three links deep when walked
    let mut depth = 0;
    let mut cursor = &decoded[0];
    while let Value::Opt(Some(node)) = cursor {
        depth += 1;
        cursor = node.field("tail").unwrap();
    }
    assert_eq!(depth, 3);
}

#[test]
fn encoding_is_deterministic_across_field_spellings() {
    let graph = parse_interface(indoc! {r#"
        service : {
          put : (record { a : nat; b : nat }) -> ();
        }
    "#})
    .unwrap();
    let codec = ServiceCodec::new(graph);

    let forward = Value::record([("a", Value::nat(1)), ("b", Value::nat(2))]);
    let backward = Value::record([("b", Value::nat(2)), ("a", Value::nat(1))]);
    assert_eq!(
        codec.encode_call("put", &[forward]).unwrap(),
        codec.encode_call("put", &[backward]).unwrap()
    );
}

#[test]
fn self_describing_decode_of_a_foreign_message() {
    let graph = parse_interface(indoc! {r#"
        service : {
          put : (record { a : nat }, bool) -> ();
        }
    "#})
    .unwrap();
    let codec = ServiceCodec::new(graph);
    let bytes = codec
        .encode_call(
            "put",
            &[Value::record([("a", Value::nat(5))]), Value::Bool(true)],
        )
        .unwrap();

    // decoded without the interface, labels are numeric
    let values = decode_args(&bytes).unwrap();
    assert_eq!(values.len(), 2);
    let Value::Record(fields) = &values[0] else {
        panic!("expected record");
    };
    assert_eq!(fields[0].0, Label::Id(97));
    assert_eq!(fields[0].1, Value::nat(5));
    assert_eq!(values[1], Value::Bool(true));
}

#[test]
fn blob_arguments_use_vec_nat8() {
    let graph = parse_interface(indoc! {r#"
        service : {
          store : (blob) -> ();
        }
    "#})
    .unwrap();
    let codec = ServiceCodec::new(graph);
    let payload = Value::Vec(vec![Value::Nat8(0xca), Value::Nat8(0xfe)]);
    let bytes = codec.encode_call("store", &[payload.clone()]).unwrap();
    let decoded = codec.decode_call("store", &bytes).unwrap();
    assert_eq!(decoded, [payload]);
}

#[test]
fn tuple_arguments_round_trip() {
    let graph = parse_interface(indoc! {r#"
        service : {
          swap : (record { nat; text }) -> (record { text; nat });
        }
    "#})
    .unwrap();
    let codec = ServiceCodec::new(graph);
    let pair = Value::tuple([Value::nat(7), Value::text("x")]);
    let bytes = codec.encode_call("swap", &[pair.clone()]).unwrap();
    let decoded = codec.decode_call("swap", &bytes).unwrap();
    assert_eq!(decoded, [pair]);
}

#[test]
fn render_call_matches_textual_syntax() {
    let codec = greeter();
    assert_eq!(
        codec.render_call("greet", &[Value::text("alice")]),
        "greet(\"alice\")"
    );
}
