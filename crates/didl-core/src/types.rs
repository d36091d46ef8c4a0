//! The resolved type graph.
//!
//! Types live in an arena indexed by [`TypeId`]. Named definitions map to
//! arena slots; a reference to a name is the slot id itself, never a copy, so
//! mutually and self-recursive definitions stay finite. Cycles pass through
//! [`TypeNode::Rec`] links only.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::label::Label;

/// Index of a type node in a [`TypeGraph`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeId(pub u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A record or variant field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub label: Label,
    pub ty: TypeId,
}

/// Function mode annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FuncMode {
    Query,
    Oneway,
}

/// A function type: argument types, return types, mode annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncType {
    pub args: Vec<TypeId>,
    pub rets: Vec<TypeId>,
    pub modes: Vec<FuncMode>,
}

impl FuncType {
    pub fn is_query(&self) -> bool {
        self.modes.contains(&FuncMode::Query)
    }

    pub fn is_oneway(&self) -> bool {
        self.modes.contains(&FuncMode::Oneway)
    }
}

/// A service method: name plus a type that resolves to a `Func` node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    pub ty: TypeId,
}

/// One node of the type graph.
///
/// `Rec` is a deferred link to a definition slot: it appears where a named
/// type was re-entered while still being expanded (self or mutual recursion)
/// and for pure aliases (`type A = B`). Consumers chase it with
/// [`TypeGraph::resolve`].
///
/// `Empty` doubles as the unresolved placeholder: a reference to an undefined
/// name lowers to `Empty` (after reporting) and the encoder rejects it with
/// an unsupported-type error rather than inventing bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeNode {
    Null,
    Bool,
    Nat,
    Int,
    Nat8,
    Nat16,
    Nat32,
    Nat64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Text,
    Reserved,
    Empty,
    Principal,
    Opt(TypeId),
    Vec(TypeId),
    Record(Vec<Field>),
    Variant(Vec<Field>),
    Func(FuncType),
    Service(Vec<Method>),
    Rec(TypeId),
}

impl TypeNode {
    /// Primitive types have a negative wire opcode and no type-table entry.
    pub fn is_primitive(&self) -> bool {
        !matches!(
            self,
            TypeNode::Opt(_)
                | TypeNode::Vec(_)
                | TypeNode::Record(_)
                | TypeNode::Variant(_)
                | TypeNode::Func(_)
                | TypeNode::Service(_)
                | TypeNode::Rec(_)
        )
    }
}

/// A resolved method signature: concrete argument and return types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSig {
    pub args: Vec<TypeId>,
    pub rets: Vec<TypeId>,
    pub is_query: bool,
    pub is_oneway: bool,
}

/// The service entry of an interface: init args plus method signatures in
/// declaration order. Built once per parsed interface, immutable after.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ServiceSignature {
    pub init_args: Vec<TypeId>,
    pub methods: IndexMap<String, MethodSig>,
}

/// Arena of type nodes plus the name table of an interface description.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TypeGraph {
    nodes: Vec<TypeNode>,
    defs: IndexMap<String, TypeId>,
    service: Option<ServiceSignature>,
}

impl TypeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, node: TypeNode) -> TypeId {
        let id = TypeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Overwrite a previously allocated slot (second resolver pass).
    pub fn fill(&mut self, id: TypeId, node: TypeNode) {
        self.nodes[id.index()] = node;
    }

    pub fn node(&self, id: TypeId) -> &TypeNode {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn define(&mut self, name: impl Into<String>, id: TypeId) -> Option<TypeId> {
        self.defs.insert(name.into(), id)
    }

    pub fn def(&self, name: &str) -> Option<TypeId> {
        self.defs.get(name).copied()
    }

    /// Named definitions in declaration order.
    pub fn defs(&self) -> impl Iterator<Item = (&str, TypeId)> {
        self.defs.iter().map(|(name, id)| (name.as_str(), *id))
    }

    /// Reverse lookup: the declared name of a definition slot, if any.
    pub fn name_of(&self, id: TypeId) -> Option<&str> {
        self.defs
            .iter()
            .find(|(_, def_id)| **def_id == id)
            .map(|(name, _)| name.as_str())
    }

    pub fn set_service(&mut self, service: ServiceSignature) {
        self.service = Some(service);
    }

    pub fn service(&self) -> Option<&ServiceSignature> {
        self.service.as_ref()
    }

    pub fn method(&self, name: &str) -> Option<&MethodSig> {
        self.service.as_ref()?.methods.get(name)
    }

    /// Chase `Rec` links to the node they stand for.
    ///
    /// Alias cycles are rejected at resolution time, so the chase is bounded
    /// by the arena size; the bound only guards corrupted graphs.
    pub fn resolve(&self, id: TypeId) -> TypeId {
        let mut current = id;
        for _ in 0..self.nodes.len() {
            match self.node(current) {
                TypeNode::Rec(target) => current = *target,
                _ => return current,
            }
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_chases_rec_links() {
        let mut graph = TypeGraph::new();
        let nat = graph.alloc(TypeNode::Nat);
        let alias = graph.alloc(TypeNode::Rec(nat));
        let alias2 = graph.alloc(TypeNode::Rec(alias));
        assert_eq!(graph.resolve(alias2), nat);
        assert_eq!(graph.resolve(nat), nat);
    }

    #[test]
    fn defs_preserve_declaration_order() {
        let mut graph = TypeGraph::new();
        let b = graph.alloc(TypeNode::Bool);
        let t = graph.alloc(TypeNode::Text);
        graph.define("Zeta", b);
        graph.define("Alpha", t);
        let names: Vec<&str> = graph.defs().map(|(name, _)| name).collect();
        assert_eq!(names, ["Zeta", "Alpha"]);
        assert_eq!(graph.name_of(t), Some("Alpha"));
    }
}
