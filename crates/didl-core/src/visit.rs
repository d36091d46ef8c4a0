//! Single dispatch surface over the type graph.
//!
//! Every consumer that walks types (renderer, codec checks, UI form builders)
//! goes through [`accept`], so a new [`TypeNode`] variant requires touching
//! exactly one dispatch point plus the visitors the compiler then flags.

use crate::types::{Field, FuncType, Method, TypeGraph, TypeId, TypeNode};

pub trait TypeVisitor {
    type Output;

    /// All leaf types: `null`, `bool`, the sized and unbounded numbers,
    /// `float*`, `text`, `reserved`, `empty`, `principal`.
    fn visit_prim(&mut self, graph: &TypeGraph, id: TypeId, node: &TypeNode) -> Self::Output;

    fn visit_opt(&mut self, graph: &TypeGraph, id: TypeId, inner: TypeId) -> Self::Output;

    fn visit_vec(&mut self, graph: &TypeGraph, id: TypeId, elem: TypeId) -> Self::Output;

    fn visit_record(&mut self, graph: &TypeGraph, id: TypeId, fields: &[Field]) -> Self::Output;

    fn visit_variant(&mut self, graph: &TypeGraph, id: TypeId, fields: &[Field]) -> Self::Output;

    fn visit_func(&mut self, graph: &TypeGraph, id: TypeId, func: &FuncType) -> Self::Output;

    fn visit_service(&mut self, graph: &TypeGraph, id: TypeId, methods: &[Method])
    -> Self::Output;

    /// Deferred link to a (possibly recursive) named definition.
    fn visit_rec(&mut self, graph: &TypeGraph, id: TypeId, target: TypeId) -> Self::Output;
}

/// Dispatch one node to the matching visitor method.
pub fn accept<V: TypeVisitor + ?Sized>(
    graph: &TypeGraph,
    id: TypeId,
    visitor: &mut V,
) -> V::Output {
    match graph.node(id) {
        TypeNode::Opt(inner) => visitor.visit_opt(graph, id, *inner),
        TypeNode::Vec(elem) => visitor.visit_vec(graph, id, *elem),
        TypeNode::Record(fields) => visitor.visit_record(graph, id, fields),
        TypeNode::Variant(fields) => visitor.visit_variant(graph, id, fields),
        TypeNode::Func(func) => visitor.visit_func(graph, id, func),
        TypeNode::Service(methods) => visitor.visit_service(graph, id, methods),
        TypeNode::Rec(target) => visitor.visit_rec(graph, id, *target),
        prim => visitor.visit_prim(graph, id, prim),
    }
}
