//! Renders resolved types back to `.did` text.
//!
//! A [`TypeVisitor`] consumer: named definitions print as their name, so
//! recursive graphs render in finite text.

use std::fmt::Write;

use crate::types::{Field, FuncMode, FuncType, Method, TypeGraph, TypeId, TypeNode};
use crate::visit::{TypeVisitor, accept};

/// Render a single type expression.
pub fn render_type(graph: &TypeGraph, id: TypeId) -> String {
    let mut renderer = TypeRenderer::new(graph);
    renderer.write_ref(id);
    renderer.out
}

/// Render the whole interface: `type` definitions in declaration order, then
/// the `service` entry if present.
pub fn render_graph(graph: &TypeGraph) -> String {
    let mut out = String::new();
    for (name, id) in graph.defs() {
        let mut renderer = TypeRenderer::new(graph);
        // Render the body itself, not the name shortcut.
        accept(graph, id, &mut renderer);
        let _ = writeln!(out, "type {} = {};", name, renderer.out);
    }
    if let Some(service) = graph.service() {
        let _ = write!(out, "service : ");
        if !service.init_args.is_empty() {
            let args: Vec<String> = service
                .init_args
                .iter()
                .map(|id| render_type(graph, *id))
                .collect();
            let _ = write!(out, "({}) -> ", args.join(", "));
        }
        let _ = writeln!(out, "{{");
        for (name, sig) in &service.methods {
            let args: Vec<String> = sig.args.iter().map(|id| render_type(graph, *id)).collect();
            let rets: Vec<String> = sig.rets.iter().map(|id| render_type(graph, *id)).collect();
            let _ = write!(out, "  {} : ({}) -> ({})", name, args.join(", "), rets.join(", "));
            if sig.is_query {
                let _ = write!(out, " query");
            }
            if sig.is_oneway {
                let _ = write!(out, " oneway");
            }
            let _ = writeln!(out, ";");
        }
        let _ = writeln!(out, "}}");
    }
    out
}

struct TypeRenderer<'g> {
    graph: &'g TypeGraph,
    out: String,
}

impl<'g> TypeRenderer<'g> {
    fn new(graph: &'g TypeGraph) -> Self {
        Self {
            graph,
            out: String::new(),
        }
    }

    /// Write a reference to a type: its declared name when it has one,
    /// otherwise the structure inline.
    fn write_ref(&mut self, id: TypeId) {
        let resolved = self.graph.resolve(id);
        if let Some(name) = self.graph.name_of(resolved) {
            self.out.push_str(name);
        } else {
            accept(self.graph, resolved, self);
        }
    }

    fn write_fields(&mut self, keyword: &str, fields: &[Field]) {
        self.out.push_str(keyword);
        self.out.push_str(" {");
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                self.out.push(';');
            }
            let _ = write!(self.out, " {} : ", field.label);
            self.write_ref(field.ty);
        }
        self.out.push_str(" }");
    }
}

impl TypeVisitor for TypeRenderer<'_> {
    type Output = ();

    fn visit_prim(&mut self, _graph: &TypeGraph, _id: TypeId, node: &TypeNode) {
        let text = match node {
            TypeNode::Null => "null",
            TypeNode::Bool => "bool",
            TypeNode::Nat => "nat",
            TypeNode::Int => "int",
            TypeNode::Nat8 => "nat8",
            TypeNode::Nat16 => "nat16",
            TypeNode::Nat32 => "nat32",
            TypeNode::Nat64 => "nat64",
            TypeNode::Int8 => "int8",
            TypeNode::Int16 => "int16",
            TypeNode::Int32 => "int32",
            TypeNode::Int64 => "int64",
            TypeNode::Float32 => "float32",
            TypeNode::Float64 => "float64",
            TypeNode::Text => "text",
            TypeNode::Reserved => "reserved",
            TypeNode::Empty => "empty",
            TypeNode::Principal => "principal",
            _ => unreachable!("accept() routes compounds elsewhere"),
        };
        self.out.push_str(text);
    }

    fn visit_opt(&mut self, _graph: &TypeGraph, _id: TypeId, inner: TypeId) {
        self.out.push_str("opt ");
        self.write_ref(inner);
    }

    fn visit_vec(&mut self, _graph: &TypeGraph, _id: TypeId, elem: TypeId) {
        self.out.push_str("vec ");
        self.write_ref(elem);
    }

    fn visit_record(&mut self, _graph: &TypeGraph, _id: TypeId, fields: &[Field]) {
        self.write_fields("record", fields);
    }

    fn visit_variant(&mut self, _graph: &TypeGraph, _id: TypeId, fields: &[Field]) {
        self.write_fields("variant", fields);
    }

    fn visit_func(&mut self, graph: &TypeGraph, _id: TypeId, func: &FuncType) {
        let args: Vec<String> = func.args.iter().map(|a| render_type(graph, *a)).collect();
        let rets: Vec<String> = func.rets.iter().map(|r| render_type(graph, *r)).collect();
        let _ = write!(self.out, "func ({}) -> ({})", args.join(", "), rets.join(", "));
        for mode in &func.modes {
            self.out.push_str(match mode {
                FuncMode::Query => " query",
                FuncMode::Oneway => " oneway",
            });
        }
    }

    fn visit_service(&mut self, graph: &TypeGraph, _id: TypeId, methods: &[Method]) {
        self.out.push_str("service {");
        for (i, method) in methods.iter().enumerate() {
            if i > 0 {
                self.out.push(';');
            }
            let _ = write!(self.out, " {} : ", method.name);
            let rendered = render_type(graph, method.ty);
            // Method types render without the leading `func` keyword.
            self.out
                .push_str(rendered.strip_prefix("func ").unwrap_or(&rendered));
        }
        self.out.push_str(" }");
    }

    fn visit_rec(&mut self, graph: &TypeGraph, _id: TypeId, target: TypeId) {
        if let Some(name) = graph.name_of(graph.resolve(target)) {
            self.out.push_str(name);
        } else {
            self.write_ref(target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::Label;

    #[test]
    fn renders_compound_types_inline() {
        let mut graph = TypeGraph::new();
        let nat = graph.alloc(TypeNode::Nat);
        let text = graph.alloc(TypeNode::Text);
        let record = graph.alloc(TypeNode::Record(vec![
            Field {
                label: Label::Named("id".into()),
                ty: nat,
            },
            Field {
                label: Label::Named("name".into()),
                ty: text,
            },
        ]));
        let opt = graph.alloc(TypeNode::Opt(record));
        assert_eq!(
            render_type(&graph, opt),
            "opt record { id : nat; name : text }"
        );
    }

    #[test]
    fn recursive_definitions_render_by_name() {
        // type List = opt record { head : nat; tail : List };
        let mut graph = TypeGraph::new();
        let list = graph.alloc(TypeNode::Null); // placeholder slot
        let nat = graph.alloc(TypeNode::Nat);
        let rec = graph.alloc(TypeNode::Rec(list));
        let node = graph.alloc(TypeNode::Record(vec![
            Field {
                label: Label::Named("head".into()),
                ty: nat,
            },
            Field {
                label: Label::Named("tail".into()),
                ty: rec,
            },
        ]));
        graph.fill(list, TypeNode::Opt(node));
        graph.define("List", list);

        assert_eq!(render_type(&graph, rec), "List");
        assert_eq!(
            render_graph(&graph).trim(),
            "type List = opt record { head : nat; tail : List };"
        );
    }
}
