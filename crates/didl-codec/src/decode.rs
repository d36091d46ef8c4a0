//! Argument decoding.
//!
//! Every message carries its own type table, so decoding happens in two
//! layers. [`decode_args`] reads a message purely from the table it carries
//! and produces values with numeric labels. [`decode_args_with_types`] walks
//! the carried table in tandem with an expected type graph: it verifies the
//! wire shape matches, restores declared field and variant names, and
//! tolerates the width the format itself allows (unknown record fields are
//! skipped, absent optional fields come back as `none`).

use didl_core::{Field, Label, Principal, TypeGraph, TypeId, TypeNode, Value};

use crate::cursor::Cursor;
use crate::encode::MAGIC;
use crate::error::CodecError;
use crate::leb128::{read_sleb, read_sleb_big, read_uleb, read_uleb_big};
use crate::type_table::{
    OP_BOOL, OP_EMPTY, OP_FLOAT32, OP_FLOAT64, OP_FUNC, OP_INT, OP_INT16, OP_INT32, OP_INT64,
    OP_INT8, OP_NAT, OP_NAT16, OP_NAT32, OP_NAT64, OP_NAT8, OP_NULL, OP_OPT, OP_PRINCIPAL,
    OP_RECORD, OP_RESERVED, OP_SERVICE, OP_TEXT, OP_VARIANT, OP_VEC,
};

/// The type table a message carries, reconstructed as a type graph.
struct WireTypes {
    graph: TypeGraph,
    args: Vec<TypeId>,
}

/// Hard cap on value nesting while decoding; a wire message deeper than this
/// is rejected instead of recursing further.
const MAX_VALUE_DEPTH: u32 = 512;

/// Decode a message using only the types it carries. Record fields and
/// variant tags come back with numeric labels.
pub fn decode_args(bytes: &[u8]) -> Result<Vec<Value>, CodecError> {
    let mut cursor = Cursor::new(bytes);
    let wire = parse_header(&mut cursor)?;
    let mut values = Vec::with_capacity(wire.args.len());
    for ty in &wire.args {
        values.push(decode_value(&wire.graph, *ty, &mut cursor, 0)?);
    }
    if !cursor.is_at_end() {
        return Err(CodecError::TrailingBytes);
    }
    Ok(values)
}

/// Decode a message against expected types, restoring declared labels.
pub fn decode_args_with_types(
    graph: &TypeGraph,
    types: &[TypeId],
    bytes: &[u8],
) -> Result<Vec<Value>, CodecError> {
    let mut cursor = Cursor::new(bytes);
    let wire = parse_header(&mut cursor)?;
    if wire.args.len() < types.len() {
        return Err(CodecError::ArityMismatch {
            declared: wire.args.len(),
            expected: types.len(),
        });
    }
    let mut values = Vec::with_capacity(types.len());
    for (expected, wire_ty) in types.iter().zip(&wire.args) {
        values.push(decode_typed(graph, *expected, &wire.graph, *wire_ty, &mut cursor, 0)?);
    }
    // extra trailing arguments are legal; skip them by their own types
    for wire_ty in &wire.args[types.len()..] {
        decode_value(&wire.graph, *wire_ty, &mut cursor, 0)?;
    }
    if !cursor.is_at_end() {
        return Err(CodecError::TrailingBytes);
    }
    Ok(values)
}

fn parse_header(cursor: &mut Cursor<'_>) -> Result<WireTypes, CodecError> {
    if cursor.array::<4>("magic").map_err(|_| CodecError::BadMagic)? != *MAGIC {
        return Err(CodecError::BadMagic);
    }

    let entry_count = read_count(cursor, "type table length")?;
    let mut graph = TypeGraph::new();
    let slots: Vec<TypeId> = (0..entry_count).map(|_| graph.alloc(TypeNode::Empty)).collect();

    for index in 0..entry_count {
        let offset = cursor.offset();
        let opcode = read_sleb(cursor, "type table entry")?;
        let node = match opcode {
            OP_OPT => TypeNode::Opt(read_type_ref(cursor, &mut graph, &slots)?),
            OP_VEC => TypeNode::Vec(read_type_ref(cursor, &mut graph, &slots)?),
            OP_RECORD => TypeNode::Record(read_field_list(cursor, &mut graph, &slots)?),
            OP_VARIANT => TypeNode::Variant(read_field_list(cursor, &mut graph, &slots)?),
            OP_FUNC => {
                let args = read_type_list(cursor, &mut graph, &slots)?;
                let rets = read_type_list(cursor, &mut graph, &slots)?;
                let mode_count = read_uleb(cursor, "func modes")?;
                let mut modes = Vec::new();
                for _ in 0..mode_count {
                    let mode = cursor.byte("func mode")?;
                    modes.push(match mode {
                        1 => didl_core::FuncMode::Query,
                        2 => didl_core::FuncMode::Oneway,
                        other => {
                            return Err(CodecError::InvalidTag {
                                context: "func mode",
                                tag: i64::from(other),
                                offset: cursor.offset() - 1,
                            });
                        }
                    });
                }
                TypeNode::Func(didl_core::FuncType { args, rets, modes })
            }
            OP_SERVICE => {
                let method_count = read_uleb(cursor, "service methods")?;
                let mut methods = Vec::new();
                for _ in 0..method_count {
                    let name_len = read_uleb(cursor, "method name length")? as usize;
                    let name_bytes = cursor.bytes(name_len, "method name")?;
                    let name = std::str::from_utf8(name_bytes)
                        .map_err(|_| CodecError::InvalidUtf8)?
                        .to_owned();
                    let ty = read_type_ref(cursor, &mut graph, &slots)?;
                    methods.push(didl_core::Method { name, ty });
                }
                TypeNode::Service(methods)
            }
            other => {
                return Err(CodecError::InvalidTag {
                    context: "type table entry",
                    tag: other,
                    offset,
                });
            }
        };
        graph.fill(slots[index], node);
    }

    let arg_count = read_count(cursor, "argument count")?;
    let mut args = Vec::with_capacity(arg_count);
    for _ in 0..arg_count {
        args.push(read_type_ref(cursor, &mut graph, &slots)?);
    }
    Ok(WireTypes { graph, args })
}

/// Read a count that heads a list whose items each occupy at least one byte.
/// Bounding it by the remaining buffer keeps a corrupt count from driving
/// allocation before any item bytes are read.
fn read_count(cursor: &mut Cursor<'_>, context: &'static str) -> Result<usize, CodecError> {
    let count = read_uleb(cursor, context)?;
    if count > cursor.remaining() as u64 {
        return Err(CodecError::TruncatedBuffer {
            context,
            offset: cursor.offset(),
        });
    }
    Ok(count as usize)
}

/// Read one type reference: non-negative table index or negative primitive
/// opcode.
fn read_type_ref(
    cursor: &mut Cursor<'_>,
    graph: &mut TypeGraph,
    slots: &[TypeId],
) -> Result<TypeId, CodecError> {
    let offset = cursor.offset();
    let reference = read_sleb(cursor, "type reference")?;
    if reference >= 0 {
        let index = reference as u64;
        return slots
            .get(index as usize)
            .copied()
            .ok_or(CodecError::TypeIndexOutOfRange {
                index,
                len: slots.len(),
            });
    }
    let node = match reference {
        OP_NULL => TypeNode::Null,
        OP_BOOL => TypeNode::Bool,
        OP_NAT => TypeNode::Nat,
        OP_INT => TypeNode::Int,
        OP_NAT8 => TypeNode::Nat8,
        OP_NAT16 => TypeNode::Nat16,
        OP_NAT32 => TypeNode::Nat32,
        OP_NAT64 => TypeNode::Nat64,
        OP_INT8 => TypeNode::Int8,
        OP_INT16 => TypeNode::Int16,
        OP_INT32 => TypeNode::Int32,
        OP_INT64 => TypeNode::Int64,
        OP_FLOAT32 => TypeNode::Float32,
        OP_FLOAT64 => TypeNode::Float64,
        OP_TEXT => TypeNode::Text,
        OP_RESERVED => TypeNode::Reserved,
        OP_EMPTY => TypeNode::Empty,
        OP_PRINCIPAL => TypeNode::Principal,
        other => {
            return Err(CodecError::InvalidTag {
                context: "type reference",
                tag: other,
                offset,
            });
        }
    };
    Ok(graph.alloc(node))
}

fn read_type_list(
    cursor: &mut Cursor<'_>,
    graph: &mut TypeGraph,
    slots: &[TypeId],
) -> Result<Vec<TypeId>, CodecError> {
    let count = read_uleb(cursor, "type list length")?;
    let mut types = Vec::new();
    for _ in 0..count {
        types.push(read_type_ref(cursor, graph, slots)?);
    }
    Ok(types)
}

fn read_field_list(
    cursor: &mut Cursor<'_>,
    graph: &mut TypeGraph,
    slots: &[TypeId],
) -> Result<Vec<Field>, CodecError> {
    let count = read_uleb(cursor, "field list length")?;
    let mut fields = Vec::new();
    for _ in 0..count {
        let offset = cursor.offset();
        let id = read_uleb(cursor, "field label")?;
        let id = u32::try_from(id).map_err(|_| CodecError::InvalidTag {
            context: "field label",
            tag: id as i64,
            offset,
        })?;
        let ty = read_type_ref(cursor, graph, slots)?;
        fields.push(Field {
            label: Label::Id(id),
            ty,
        });
    }
    Ok(fields)
}

/// Decode one value purely from the wire types.
fn decode_value(
    wire: &TypeGraph,
    ty: TypeId,
    cursor: &mut Cursor<'_>,
    depth: u32,
) -> Result<Value, CodecError> {
    if depth >= MAX_VALUE_DEPTH {
        return Err(CodecError::NestingTooDeep {
            limit: MAX_VALUE_DEPTH,
        });
    }
    match wire.node(wire.resolve(ty)) {
        TypeNode::Null => Ok(Value::Null),
        TypeNode::Reserved => Ok(Value::Reserved),
        TypeNode::Empty => Err(CodecError::UnsupportedType("empty".into())),
        TypeNode::Bool => match cursor.byte("bool")? {
            0 => Ok(Value::Bool(false)),
            1 => Ok(Value::Bool(true)),
            other => Err(CodecError::InvalidTag {
                context: "bool",
                tag: i64::from(other),
                offset: cursor.offset() - 1,
            }),
        },
        TypeNode::Nat => Ok(Value::Nat(read_uleb_big(cursor, "nat")?)),
        TypeNode::Int => Ok(Value::Int(read_sleb_big(cursor, "int")?)),
        TypeNode::Nat8 => Ok(Value::Nat8(cursor.byte("nat8")?)),
        TypeNode::Nat16 => Ok(Value::Nat16(u16::from_le_bytes(cursor.array("nat16")?))),
        TypeNode::Nat32 => Ok(Value::Nat32(u32::from_le_bytes(cursor.array("nat32")?))),
        TypeNode::Nat64 => Ok(Value::Nat64(u64::from_le_bytes(cursor.array("nat64")?))),
        TypeNode::Int8 => Ok(Value::Int8(i8::from_le_bytes(cursor.array("int8")?))),
        TypeNode::Int16 => Ok(Value::Int16(i16::from_le_bytes(cursor.array("int16")?))),
        TypeNode::Int32 => Ok(Value::Int32(i32::from_le_bytes(cursor.array("int32")?))),
        TypeNode::Int64 => Ok(Value::Int64(i64::from_le_bytes(cursor.array("int64")?))),
        TypeNode::Float32 => Ok(Value::Float32(f32::from_le_bytes(cursor.array("float32")?))),
        TypeNode::Float64 => Ok(Value::Float64(f64::from_le_bytes(cursor.array("float64")?))),
        TypeNode::Text => Ok(Value::Text(read_text(cursor)?)),
        TypeNode::Principal => Ok(Value::Principal(read_principal(cursor)?)),
        TypeNode::Opt(inner) => match cursor.byte("opt presence")? {
            0 => Ok(Value::Opt(None)),
            1 => Ok(Value::some(decode_value(wire, *inner, cursor, depth + 1)?)),
            other => Err(CodecError::InvalidTag {
                context: "opt presence",
                tag: i64::from(other),
                offset: cursor.offset() - 1,
            }),
        },
        TypeNode::Vec(elem) => {
            let len = read_uleb(cursor, "vec length")?;
            let mut items = Vec::new();
            for _ in 0..len {
                items.push(decode_value(wire, *elem, cursor, depth + 1)?);
            }
            Ok(Value::Vec(items))
        }
        TypeNode::Record(fields) => {
            let mut entries = Vec::with_capacity(fields.len());
            for field in fields {
                let value = decode_value(wire, field.ty, cursor, depth + 1)?;
                entries.push((field.label.clone(), value));
            }
            Ok(Value::Record(entries))
        }
        TypeNode::Variant(fields) => {
            let offset = cursor.offset();
            let index = read_uleb(cursor, "variant index")?;
            let field = fields
                .get(index as usize)
                .ok_or(CodecError::InvalidTag {
                    context: "variant index",
                    tag: index as i64,
                    offset,
                })?;
            let value = decode_value(wire, field.ty, cursor, depth + 1)?;
            Ok(Value::Variant {
                label: field.label.clone(),
                value: Box::new(value),
            })
        }
        TypeNode::Func(_) => {
            read_reference_flag(cursor, "func reference")?;
            read_reference_flag(cursor, "service reference")?;
            let service = read_principal_blob(cursor)?;
            let method = read_text(cursor)?;
            Ok(Value::Func { service, method })
        }
        TypeNode::Service(_) => Ok(Value::Service(read_principal(cursor)?)),
        TypeNode::Rec(_) => unreachable!("resolve never returns Rec"),
    }
}

/// Decode one value guided by the wire type, shaped by the expected type.
fn decode_typed(
    graph: &TypeGraph,
    expected: TypeId,
    wire: &TypeGraph,
    wire_ty: TypeId,
    cursor: &mut Cursor<'_>,
    depth: u32,
) -> Result<Value, CodecError> {
    if depth >= MAX_VALUE_DEPTH {
        return Err(CodecError::NestingTooDeep {
            limit: MAX_VALUE_DEPTH,
        });
    }
    let expected = graph.resolve(expected);
    let wire_ty = wire.resolve(wire_ty);
    let expected_node = graph.node(expected);
    let wire_node = wire.node(wire_ty);

    match (expected_node, wire_node) {
        // identical primitives: the wire already carries the right shape
        (e, w) if e.is_primitive() && e == w => decode_value(wire, wire_ty, cursor, depth),
        // reserved accepts any wire value and forgets it
        (TypeNode::Reserved, _) => {
            decode_value(wire, wire_ty, cursor, depth)?;
            Ok(Value::Reserved)
        }
        // null widens into any opt
        (TypeNode::Opt(_), TypeNode::Null) => Ok(Value::Opt(None)),
        (TypeNode::Opt(expected_inner), TypeNode::Opt(wire_inner)) => {
            match cursor.byte("opt presence")? {
                0 => Ok(Value::Opt(None)),
                1 => Ok(Value::some(decode_typed(
                    graph,
                    *expected_inner,
                    wire,
                    *wire_inner,
                    cursor,
                    depth + 1,
                )?)),
                other => Err(CodecError::InvalidTag {
                    context: "opt presence",
                    tag: i64::from(other),
                    offset: cursor.offset() - 1,
                }),
            }
        }
        (TypeNode::Vec(expected_elem), TypeNode::Vec(wire_elem)) => {
            let len = read_uleb(cursor, "vec length")?;
            let mut items = Vec::new();
            for _ in 0..len {
                items.push(decode_typed(
                    graph,
                    *expected_elem,
                    wire,
                    *wire_elem,
                    cursor,
                    depth + 1,
                )?);
            }
            Ok(Value::Vec(items))
        }
        (TypeNode::Record(expected_fields), TypeNode::Record(wire_fields)) => {
            // wire fields arrive in their serialized order and must all be
            // consumed; unknown ones are decoded and dropped
            let mut entries = Vec::with_capacity(expected_fields.len());
            for wire_field in wire_fields {
                let known = expected_fields
                    .iter()
                    .find(|f| f.label.id() == wire_field.label.id());
                match known {
                    Some(field) => {
                        let value =
                            decode_typed(graph, field.ty, wire, wire_field.ty, cursor, depth + 1)?;
                        entries.push((field.label.clone(), value));
                    }
                    None => {
                        decode_value(wire, wire_field.ty, cursor, depth + 1)?;
                    }
                }
            }
            for field in expected_fields {
                if entries.iter().any(|(label, _)| label.id() == field.label.id()) {
                    continue;
                }
                if matches!(graph.node(graph.resolve(field.ty)), TypeNode::Opt(_)) {
                    entries.push((field.label.clone(), Value::Opt(None)));
                } else {
                    return Err(CodecError::MissingField(field.label.clone()));
                }
            }
            // restore declaration order
            entries.sort_by_key(|(label, _)| {
                expected_fields
                    .iter()
                    .position(|f| f.label.id() == label.id())
            });
            Ok(Value::Record(entries))
        }
        (TypeNode::Variant(expected_fields), TypeNode::Variant(wire_fields)) => {
            let offset = cursor.offset();
            let index = read_uleb(cursor, "variant index")?;
            let wire_field = wire_fields
                .get(index as usize)
                .ok_or(CodecError::InvalidTag {
                    context: "variant index",
                    tag: index as i64,
                    offset,
                })?;
            let field = expected_fields
                .iter()
                .find(|f| f.label.id() == wire_field.label.id())
                .ok_or_else(|| CodecError::UnknownVariantTag(wire_field.label.clone()))?;
            let value = decode_typed(graph, field.ty, wire, wire_field.ty, cursor, depth + 1)?;
            Ok(Value::Variant {
                label: field.label.clone(),
                value: Box::new(value),
            })
        }
        (TypeNode::Func(_), TypeNode::Func(_)) => decode_value(wire, wire_ty, cursor, depth),
        (TypeNode::Service(_), TypeNode::Service(_)) => decode_value(wire, wire_ty, cursor, depth),
        _ => Err(CodecError::TypeMismatch {
            expected: didl_core::render_type(graph, expected),
            found: didl_core::render_type(wire, wire_ty),
        }),
    }
}

fn read_text(cursor: &mut Cursor<'_>) -> Result<String, CodecError> {
    let len = read_uleb(cursor, "text length")? as usize;
    let bytes = cursor.bytes(len, "text")?;
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|_| CodecError::InvalidUtf8)
}

fn read_reference_flag(cursor: &mut Cursor<'_>, context: &'static str) -> Result<(), CodecError> {
    match cursor.byte(context)? {
        1 => Ok(()),
        other => Err(CodecError::InvalidTag {
            context,
            tag: i64::from(other),
            offset: cursor.offset() - 1,
        }),
    }
}

fn read_principal(cursor: &mut Cursor<'_>) -> Result<Principal, CodecError> {
    read_reference_flag(cursor, "principal reference")?;
    read_principal_blob(cursor)
}

fn read_principal_blob(cursor: &mut Cursor<'_>) -> Result<Principal, CodecError> {
    let len = read_uleb(cursor, "principal length")? as usize;
    let bytes = cursor.bytes(len, "principal")?;
    Principal::from_blob(bytes.to_vec()).map_err(|_| CodecError::InvalidTag {
        context: "principal length",
        tag: len as i64,
        offset: cursor.offset() - len,
    })
}
