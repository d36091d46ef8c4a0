//! Wire type table construction.
//!
//! Composite types get a table entry and are referenced by non-negative
//! index; primitives are referenced inline by their negative opcode and never
//! enter the table. Each distinct graph node is emitted once: the builder
//! reserves a slot before serializing the body, so recursive types reference
//! their own (or each other's) indices without special handling. Distinct
//! nodes whose serialized bodies come out identical also collapse to one
//! entry, so repeating an inline type does not repeat its description.

use std::collections::HashMap;

use didl_core::{Field, FuncMode, TypeGraph, TypeId, TypeNode};

use crate::error::CodecError;
use crate::leb128::{write_sleb, write_uleb};

pub const OP_NULL: i64 = -1;
pub const OP_BOOL: i64 = -2;
pub const OP_NAT: i64 = -3;
pub const OP_INT: i64 = -4;
pub const OP_NAT8: i64 = -5;
pub const OP_NAT16: i64 = -6;
pub const OP_NAT32: i64 = -7;
pub const OP_NAT64: i64 = -8;
pub const OP_INT8: i64 = -9;
pub const OP_INT16: i64 = -10;
pub const OP_INT32: i64 = -11;
pub const OP_INT64: i64 = -12;
pub const OP_FLOAT32: i64 = -13;
pub const OP_FLOAT64: i64 = -14;
pub const OP_TEXT: i64 = -15;
pub const OP_RESERVED: i64 = -16;
pub const OP_EMPTY: i64 = -17;
pub const OP_OPT: i64 = -18;
pub const OP_VEC: i64 = -19;
pub const OP_RECORD: i64 = -20;
pub const OP_VARIANT: i64 = -21;
pub const OP_FUNC: i64 = -22;
pub const OP_SERVICE: i64 = -23;
pub const OP_PRINCIPAL: i64 = -24;

/// The inline opcode of a primitive type, `None` for composites.
pub fn prim_opcode(node: &TypeNode) -> Option<i64> {
    Some(match node {
        TypeNode::Null => OP_NULL,
        TypeNode::Bool => OP_BOOL,
        TypeNode::Nat => OP_NAT,
        TypeNode::Int => OP_INT,
        TypeNode::Nat8 => OP_NAT8,
        TypeNode::Nat16 => OP_NAT16,
        TypeNode::Nat32 => OP_NAT32,
        TypeNode::Nat64 => OP_NAT64,
        TypeNode::Int8 => OP_INT8,
        TypeNode::Int16 => OP_INT16,
        TypeNode::Int32 => OP_INT32,
        TypeNode::Int64 => OP_INT64,
        TypeNode::Float32 => OP_FLOAT32,
        TypeNode::Float64 => OP_FLOAT64,
        TypeNode::Text => OP_TEXT,
        TypeNode::Reserved => OP_RESERVED,
        TypeNode::Empty => OP_EMPTY,
        TypeNode::Principal => OP_PRINCIPAL,
        _ => return None,
    })
}

/// Record and variant fields sort ascending by numeric label on the wire.
pub fn wire_field_order(fields: &[Field]) -> Vec<&Field> {
    let mut sorted: Vec<&Field> = fields.iter().collect();
    sorted.sort_by_key(|field| field.label.id());
    sorted
}

pub struct TypeTableBuilder<'g> {
    graph: &'g TypeGraph,
    entries: Vec<Option<Vec<u8>>>,
    indices: HashMap<TypeId, i64>,
    /// Serialized body to table index, for collapsing structurally equal
    /// entries that come from distinct graph nodes.
    by_body: HashMap<Vec<u8>, i64>,
}

impl<'g> TypeTableBuilder<'g> {
    pub fn new(graph: &'g TypeGraph) -> Self {
        Self {
            graph,
            entries: Vec::new(),
            indices: HashMap::new(),
            by_body: HashMap::new(),
        }
    }

    /// Table index (non-negative) or inline opcode (negative) for a type.
    pub fn index_of(&mut self, id: TypeId) -> Result<i64, CodecError> {
        let graph = self.graph;
        let id = graph.resolve(id);
        let node = graph.node(id);
        if let Some(opcode) = prim_opcode(node) {
            return Ok(opcode);
        }
        if let Some(&index) = self.indices.get(&id) {
            return Ok(index);
        }

        // Reserve the slot first so recursive references land on it.
        let slot = self.entries.len();
        self.entries.push(None);
        self.indices.insert(id, slot as i64);

        let mut entry = Vec::new();
        match node {
            TypeNode::Opt(inner) => {
                write_sleb(&mut entry, OP_OPT);
                let inner = self.index_of(*inner)?;
                write_sleb(&mut entry, inner);
            }
            TypeNode::Vec(elem) => {
                write_sleb(&mut entry, OP_VEC);
                let elem = self.index_of(*elem)?;
                write_sleb(&mut entry, elem);
            }
            TypeNode::Record(fields) => {
                write_sleb(&mut entry, OP_RECORD);
                self.write_fields(&mut entry, fields)?;
            }
            TypeNode::Variant(fields) => {
                write_sleb(&mut entry, OP_VARIANT);
                self.write_fields(&mut entry, fields)?;
            }
            TypeNode::Func(func) => {
                write_sleb(&mut entry, OP_FUNC);
                write_uleb(&mut entry, func.args.len() as u64);
                for arg in &func.args {
                    let index = self.index_of(*arg)?;
                    write_sleb(&mut entry, index);
                }
                write_uleb(&mut entry, func.rets.len() as u64);
                for ret in &func.rets {
                    let index = self.index_of(*ret)?;
                    write_sleb(&mut entry, index);
                }
                write_uleb(&mut entry, func.modes.len() as u64);
                for mode in &func.modes {
                    entry.push(match mode {
                        FuncMode::Query => 1,
                        FuncMode::Oneway => 2,
                    });
                }
            }
            TypeNode::Service(methods) => {
                write_sleb(&mut entry, OP_SERVICE);
                write_uleb(&mut entry, methods.len() as u64);
                for method in methods {
                    write_uleb(&mut entry, method.name.len() as u64);
                    entry.extend_from_slice(method.name.as_bytes());
                    let index = self.index_of(method.ty)?;
                    write_sleb(&mut entry, index);
                }
            }
            // resolve() never returns Rec, and primitives returned above
            _ => unreachable!("composite node expected"),
        }

        // The slot can be dropped again when its body duplicates an earlier
        // entry, but only while it is still the last: once nested calls have
        // kept slots after it, its index is taken. Children fill (and drop)
        // their own slots before this point, so the check cascades outward.
        if slot + 1 == self.entries.len() {
            if let Some(&existing) = self.by_body.get(&entry) {
                self.entries.pop();
                self.indices.insert(id, existing);
                return Ok(existing);
            }
        }
        self.by_body.entry(entry.clone()).or_insert(slot as i64);
        self.entries[slot] = Some(entry);
        Ok(slot as i64)
    }

    fn write_fields(&mut self, entry: &mut Vec<u8>, fields: &[Field]) -> Result<(), CodecError> {
        let ordered = wire_field_order(fields);
        write_uleb(entry, ordered.len() as u64);
        for field in ordered {
            write_uleb(entry, u64::from(field.label.id()));
            let index = self.index_of(field.ty)?;
            write_sleb(entry, index);
        }
        Ok(())
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Append the serialized table: entry count, then entries by index.
    pub fn serialize(&self, out: &mut Vec<u8>) {
        write_uleb(out, self.entries.len() as u64);
        for entry in &self.entries {
            // every reserved slot is filled before serialize is reachable
            if let Some(bytes) = entry {
                out.extend_from_slice(bytes);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use didl_core::{Label, TypeGraph};

    fn table_for(graph: &TypeGraph, id: TypeId) -> (i64, Vec<u8>) {
        let mut builder = TypeTableBuilder::new(graph);
        let index = builder.index_of(id).unwrap();
        let mut out = Vec::new();
        builder.serialize(&mut out);
        (index, out)
    }

    #[test]
    fn primitives_stay_out_of_the_table() {
        let mut graph = TypeGraph::new();
        let nat = graph.alloc(TypeNode::Nat);
        let (index, table) = table_for(&graph, nat);
        assert_eq!(index, OP_NAT);
        assert_eq!(table, [0x00]);
    }

    #[test]
    fn record_entry_bytes() {
        let mut graph = TypeGraph::new();
        let nat = graph.alloc(TypeNode::Nat);
        let text = graph.alloc(TypeNode::Text);
        let record = graph.alloc(TypeNode::Record(vec![
            Field { label: Label::Named("a".into()), ty: nat },
            Field { label: Label::Named("b".into()), ty: text },
        ]));
        let (index, table) = table_for(&graph, record);
        assert_eq!(index, 0);
        // 1 entry: record, 2 fields, hash("a")=97:nat, hash("b")=98:text
        assert_eq!(table, [0x01, 0x6c, 0x02, 0x61, 0x7d, 0x62, 0x71]);
    }

    #[test]
    fn fields_sort_by_hash_not_declaration_order() {
        let mut graph = TypeGraph::new();
        let nat = graph.alloc(TypeNode::Nat);
        let record = graph.alloc(TypeNode::Record(vec![
            Field { label: Label::Named("b".into()), ty: nat },
            Field { label: Label::Named("a".into()), ty: nat },
        ]));
        let (_, table) = table_for(&graph, record);
        assert_eq!(table, [0x01, 0x6c, 0x02, 0x61, 0x7d, 0x62, 0x7d]);
    }

    #[test]
    fn shared_type_emitted_once() {
        let mut graph = TypeGraph::new();
        let nat = graph.alloc(TypeNode::Nat);
        let vec_nat = graph.alloc(TypeNode::Vec(nat));
        let record = graph.alloc(TypeNode::Record(vec![
            Field { label: Label::Id(0), ty: vec_nat },
            Field { label: Label::Id(1), ty: vec_nat },
        ]));
        let mut builder = TypeTableBuilder::new(&graph);
        builder.index_of(record).unwrap();
        assert_eq!(builder.entry_count(), 2);
    }

    #[test]
    fn structurally_equal_nodes_share_an_entry() {
        // two inline `vec nat` occurrences lower to distinct graph nodes
        let mut graph = TypeGraph::new();
        let nat_a = graph.alloc(TypeNode::Nat);
        let vec_a = graph.alloc(TypeNode::Vec(nat_a));
        let nat_b = graph.alloc(TypeNode::Nat);
        let vec_b = graph.alloc(TypeNode::Vec(nat_b));
        let mut builder = TypeTableBuilder::new(&graph);
        let first = builder.index_of(vec_a).unwrap();
        let second = builder.index_of(vec_b).unwrap();
        assert_eq!(first, second);
        assert_eq!(builder.entry_count(), 1);
    }

    #[test]
    fn structural_dedup_cascades_through_nesting() {
        // record { vec nat } twice: the inner vec collapses first, which
        // makes the outer records byte-identical too
        let mut graph = TypeGraph::new();
        let mut records = Vec::new();
        for _ in 0..2 {
            let nat = graph.alloc(TypeNode::Nat);
            let vec_nat = graph.alloc(TypeNode::Vec(nat));
            records.push(graph.alloc(TypeNode::Record(vec![Field {
                label: Label::Id(0),
                ty: vec_nat,
            }])));
        }
        let mut builder = TypeTableBuilder::new(&graph);
        let first = builder.index_of(records[0]).unwrap();
        let second = builder.index_of(records[1]).unwrap();
        assert_eq!(first, second);
        assert_eq!(builder.entry_count(), 2);
    }

    #[test]
    fn recursive_type_references_its_own_slot() {
        // type List = opt record { head : nat; tail : List }
        let mut graph = TypeGraph::new();
        let list = graph.alloc(TypeNode::Empty);
        graph.define("List", list);
        let nat = graph.alloc(TypeNode::Nat);
        let tail = graph.alloc(TypeNode::Rec(list));
        let record = graph.alloc(TypeNode::Record(vec![
            Field { label: Label::Named("head".into()), ty: nat },
            Field { label: Label::Named("tail".into()), ty: tail },
        ]));
        graph.fill(list, TypeNode::Opt(record));

        let (index, table) = table_for(&graph, list);
        assert_eq!(index, 0);
        // entry 0 is `opt 1`; entry 1 ends with the tail field pointing
        // back at entry 0
        assert_eq!(&table[..3], [0x02, 0x6e, 0x01]);
        assert_eq!(table[table.len() - 1], 0x00);
    }
}
