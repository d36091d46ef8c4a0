//! Argument encoding.
//!
//! A message is `DIDL` followed by the type table, the argument type list,
//! and the argument values back to back. Encoding is deterministic: record
//! and variant members are written in ascending label order regardless of how
//! the value spells them, and the type table indexes each distinct type once.

use didl_core::{Principal, TypeGraph, TypeId, TypeNode, Value};

use crate::error::CodecError;
use crate::leb128::{write_sleb, write_sleb_big, write_uleb, write_uleb_big};
use crate::type_table::{wire_field_order, TypeTableBuilder};

pub const MAGIC: &[u8; 4] = b"DIDL";

/// Encode `values` against the expected argument types.
pub fn encode_args(
    graph: &TypeGraph,
    types: &[TypeId],
    values: &[Value],
) -> Result<Vec<u8>, CodecError> {
    if types.len() != values.len() {
        return Err(CodecError::ArityMismatch {
            declared: values.len(),
            expected: types.len(),
        });
    }

    let mut table = TypeTableBuilder::new(graph);
    let mut arg_indices = Vec::with_capacity(types.len());
    for ty in types {
        arg_indices.push(table.index_of(*ty)?);
    }

    let mut out = Vec::new();
    out.extend_from_slice(MAGIC);
    table.serialize(&mut out);
    write_uleb(&mut out, arg_indices.len() as u64);
    for index in arg_indices {
        write_sleb(&mut out, index);
    }
    for (ty, value) in types.iter().zip(values) {
        encode_value(graph, &mut out, *ty, value)?;
    }
    Ok(out)
}

fn encode_value(
    graph: &TypeGraph,
    out: &mut Vec<u8>,
    ty: TypeId,
    value: &Value,
) -> Result<(), CodecError> {
    let ty = graph.resolve(ty);
    match (graph.node(ty), value) {
        (TypeNode::Null, Value::Null) => {}
        // reserved accepts any value and carries no bytes
        (TypeNode::Reserved, _) => {}
        (TypeNode::Empty, _) => {
            return Err(CodecError::UnsupportedType(
                graph.name_of(ty).unwrap_or("empty").to_owned(),
            ));
        }
        (TypeNode::Bool, Value::Bool(b)) => out.push(u8::from(*b)),
        (TypeNode::Nat, Value::Nat(n)) => write_uleb_big(out, n),
        (TypeNode::Int, Value::Int(i)) => write_sleb_big(out, i),
        (TypeNode::Nat8, Value::Nat8(n)) => out.push(*n),
        (TypeNode::Nat16, Value::Nat16(n)) => out.extend_from_slice(&n.to_le_bytes()),
        (TypeNode::Nat32, Value::Nat32(n)) => out.extend_from_slice(&n.to_le_bytes()),
        (TypeNode::Nat64, Value::Nat64(n)) => out.extend_from_slice(&n.to_le_bytes()),
        (TypeNode::Int8, Value::Int8(n)) => out.extend_from_slice(&n.to_le_bytes()),
        (TypeNode::Int16, Value::Int16(n)) => out.extend_from_slice(&n.to_le_bytes()),
        (TypeNode::Int32, Value::Int32(n)) => out.extend_from_slice(&n.to_le_bytes()),
        (TypeNode::Int64, Value::Int64(n)) => out.extend_from_slice(&n.to_le_bytes()),
        (TypeNode::Float32, Value::Float32(f)) => out.extend_from_slice(&f.to_le_bytes()),
        (TypeNode::Float64, Value::Float64(f)) => out.extend_from_slice(&f.to_le_bytes()),
        (TypeNode::Text, Value::Text(s)) => {
            write_uleb(out, s.len() as u64);
            out.extend_from_slice(s.as_bytes());
        }
        (TypeNode::Principal, Value::Principal(p)) => write_principal(out, p),
        (TypeNode::Opt(_), Value::Opt(None)) => out.push(0),
        (TypeNode::Opt(inner), Value::Opt(Some(boxed))) => {
            out.push(1);
            encode_value(graph, out, *inner, boxed)?;
        }
        (TypeNode::Vec(elem), Value::Vec(items)) => {
            write_uleb(out, items.len() as u64);
            for item in items {
                encode_value(graph, out, *elem, item)?;
            }
        }
        (TypeNode::Record(fields), Value::Record(entries)) => {
            for field in wire_field_order(fields) {
                let entry = entries
                    .iter()
                    .find(|(label, _)| label.id() == field.label.id());
                match entry {
                    Some((_, value)) => encode_value(graph, out, field.ty, value)?,
                    // an absent optional field encodes as none
                    None if matches!(graph.node(graph.resolve(field.ty)), TypeNode::Opt(_)) => {
                        out.push(0);
                    }
                    None => return Err(CodecError::MissingField(field.label.clone())),
                }
            }
        }
        (TypeNode::Variant(fields), Value::Variant { label, value }) => {
            let ordered = wire_field_order(fields);
            let position = ordered
                .iter()
                .position(|field| field.label.id() == label.id())
                .ok_or_else(|| CodecError::UnknownVariantTag(label.clone()))?;
            write_uleb(out, position as u64);
            encode_value(graph, out, ordered[position].ty, value)?;
        }
        (TypeNode::Func(_), Value::Func { service, method }) => {
            out.push(1);
            out.push(1);
            write_principal_blob(out, service);
            write_uleb(out, method.len() as u64);
            out.extend_from_slice(method.as_bytes());
        }
        (TypeNode::Service(_), Value::Service(principal)) => write_principal(out, principal),
        (node, value) => {
            return Err(CodecError::TypeMismatch {
                expected: describe_type(graph, ty, node),
                found: describe_value(value),
            });
        }
    }
    Ok(())
}

fn write_principal(out: &mut Vec<u8>, principal: &Principal) {
    out.push(1);
    write_principal_blob(out, principal);
}

fn write_principal_blob(out: &mut Vec<u8>, principal: &Principal) {
    write_uleb(out, principal.as_bytes().len() as u64);
    out.extend_from_slice(principal.as_bytes());
}

fn describe_type(graph: &TypeGraph, id: TypeId, node: &TypeNode) -> String {
    if let Some(name) = graph.name_of(id) {
        return name.to_owned();
    }
    match node {
        TypeNode::Opt(_) => "opt".into(),
        TypeNode::Vec(_) => "vec".into(),
        TypeNode::Record(_) => "record".into(),
        TypeNode::Variant(_) => "variant".into(),
        TypeNode::Func(_) => "func".into(),
        TypeNode::Service(_) => "service".into(),
        other => format!("{other:?}").to_lowercase(),
    }
}

fn describe_value(value: &Value) -> String {
    match value {
        Value::Null => "null".into(),
        Value::Reserved => "reserved".into(),
        Value::Bool(_) => "bool".into(),
        Value::Nat(_) => "nat".into(),
        Value::Int(_) => "int".into(),
        Value::Nat8(_) => "nat8".into(),
        Value::Nat16(_) => "nat16".into(),
        Value::Nat32(_) => "nat32".into(),
        Value::Nat64(_) => "nat64".into(),
        Value::Int8(_) => "int8".into(),
        Value::Int16(_) => "int16".into(),
        Value::Int32(_) => "int32".into(),
        Value::Int64(_) => "int64".into(),
        Value::Float32(_) => "float32".into(),
        Value::Float64(_) => "float64".into(),
        Value::Text(_) => "text".into(),
        Value::Principal(_) => "principal".into(),
        Value::Opt(_) => "opt".into(),
        Value::Vec(_) => "vec".into(),
        Value::Record(_) => "record".into(),
        Value::Variant { .. } => "variant".into(),
        Value::Func { .. } => "func".into(),
        Value::Service(_) => "service".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use didl_core::{Field, Label};

    #[test]
    fn single_text_argument() {
        let mut graph = TypeGraph::new();
        let text = graph.alloc(TypeNode::Text);
        let bytes = encode_args(&graph, &[text], &[Value::text("hi")]).unwrap();
        // magic, empty table, 1 arg of type text, "hi"
        assert_eq!(
            bytes,
            [b'D', b'I', b'D', b'L', 0x00, 0x01, 0x71, 0x02, b'h', b'i']
        );
    }

    #[test]
    fn record_members_follow_hash_order() {
        let mut graph = TypeGraph::new();
        let nat8 = graph.alloc(TypeNode::Nat8);
        let record = graph.alloc(TypeNode::Record(vec![
            Field { label: Label::Named("b".into()), ty: nat8 },
            Field { label: Label::Named("a".into()), ty: nat8 },
        ]));
        let value = Value::record([("b", Value::Nat8(2)), ("a", Value::Nat8(1))]);
        let bytes = encode_args(&graph, &[record], &[value]).unwrap();
        // hash("a") = 97 < hash("b") = 98, so 1 before 2 on the wire
        let values = &bytes[bytes.len() - 2..];
        assert_eq!(values, [1, 2]);
    }

    #[test]
    fn missing_mandatory_field_is_an_error() {
        let mut graph = TypeGraph::new();
        let nat = graph.alloc(TypeNode::Nat);
        let record = graph.alloc(TypeNode::Record(vec![Field {
            label: Label::Named("x".into()),
            ty: nat,
        }]));
        let err = encode_args(&graph, &[record], &[Value::record([])]).unwrap_err();
        assert!(matches!(err, CodecError::MissingField(_)));
    }

    #[test]
    fn missing_optional_field_encodes_as_none() {
        let mut graph = TypeGraph::new();
        let nat = graph.alloc(TypeNode::Nat);
        let opt_nat = graph.alloc(TypeNode::Opt(nat));
        let record = graph.alloc(TypeNode::Record(vec![Field {
            label: Label::Named("x".into()),
            ty: opt_nat,
        }]));
        let bytes = encode_args(&graph, &[record], &[Value::record([])]).unwrap();
        assert_eq!(*bytes.last().unwrap(), 0x00);
    }

    #[test]
    fn type_mismatch_names_both_sides() {
        let mut graph = TypeGraph::new();
        let nat = graph.alloc(TypeNode::Nat);
        let err = encode_args(&graph, &[nat], &[Value::text("no")]).unwrap_err();
        let CodecError::TypeMismatch { expected, found } = err else {
            panic!("expected type mismatch");
        };
        assert_eq!(expected, "nat");
        assert_eq!(found, "text");
    }

    #[test]
    fn unresolved_type_refuses_to_encode() {
        let mut graph = TypeGraph::new();
        let hole = graph.alloc(TypeNode::Empty);
        graph.define("Missing", hole);
        let err = encode_args(&graph, &[hole], &[Value::Null]).unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedType(name) if name == "Missing"));
    }

    #[test]
    fn reserved_swallows_any_value() {
        let mut graph = TypeGraph::new();
        let reserved = graph.alloc(TypeNode::Reserved);
        let bytes = encode_args(&graph, &[reserved], &[Value::text("anything")]).unwrap();
        // no value bytes at all
        assert_eq!(bytes, [b'D', b'I', b'D', b'L', 0x00, 0x01, 0x70]);
    }
}
