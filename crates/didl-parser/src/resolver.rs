//! Resolution: CST to type graph.
//!
//! Two passes. The first registers every named `type` definition as a
//! placeholder arena slot, so forward references resolve without lookahead.
//! The second lowers each definition's body into its slot; a named reference
//! becomes the target slot's id (identity, never a copy). A name re-entered
//! while its own body is still being lowered is wrapped in a `Rec` marker, so
//! directly and mutually recursive definitions terminate.
//!
//! Unknown names report `UnresolvedReference` and lower to `empty`, which the
//! encoder refuses; resolution itself keeps going and accumulates every
//! unresolved name.

use std::collections::HashSet;

use rowan::TextRange;

use didl_core::{
    Field, FuncType, Method, MethodSig, ServiceSignature, TypeGraph, TypeId, TypeNode,
};

use crate::cst::{
    FieldSpec, FuncSpec, MethodSpec, PrimType, Program, ServiceBody, ServiceDecl, TypeExpr,
    TypeExprKind,
};
use crate::diagnostics::{DiagnosticKind, Diagnostics};

#[derive(Debug)]
pub struct ResolveResult {
    pub graph: TypeGraph,
    pub diagnostics: Diagnostics,
}

pub fn resolve(program: &Program) -> ResolveResult {
    let mut resolver = Resolver {
        graph: TypeGraph::new(),
        diagnostics: Diagnostics::new(),
        in_progress: HashSet::new(),
        depth: 0,
    };

    // Pass 1: register placeholders so forward references resolve.
    let mut first_seen: Vec<(String, TextRange)> = Vec::new();
    for def in program.type_defs() {
        if let Some((_, original)) = first_seen.iter().find(|(name, _)| *name == def.name) {
            resolver
                .diagnostics
                .report(DiagnosticKind::DuplicateTypeDefinition, def.name_span)
                .message(format!("type `{}` is defined twice", def.name))
                .related_to("first defined here", *original)
                .emit();
            continue;
        }
        let slot = resolver.graph.alloc(TypeNode::Empty);
        resolver.graph.define(def.name.clone(), slot);
        first_seen.push((def.name.clone(), def.name_span));
    }

    // Pass 2: lower each body into its slot.
    for def in program.type_defs() {
        let Some(slot) = resolver.graph.def(&def.name) else {
            continue; // duplicate, already reported
        };
        if resolver.graph.node(slot) != &TypeNode::Empty {
            continue; // duplicate definition of an already-lowered name
        }
        resolver.in_progress.insert(def.name.clone());
        let node = resolver.lower_node(&def.ty);
        resolver.graph.fill(slot, node);
        resolver.in_progress.remove(&def.name);
    }

    resolver.check_alias_cycles(program);

    if let Some(service) = program.service() {
        let signature = resolver.resolve_service(service);
        resolver.graph.set_service(signature);
    }

    ResolveResult {
        graph: resolver.graph,
        diagnostics: resolver.diagnostics,
    }
}

/// The parser enforces the same bound, but `resolve` also accepts trees
/// built in code, so lowering carries its own.
const MAX_TYPE_DEPTH: u32 = 128;

struct Resolver {
    graph: TypeGraph,
    diagnostics: Diagnostics,
    /// Names whose bodies are currently being lowered.
    in_progress: HashSet<String>,
    /// Current lowering depth, bounded by `MAX_TYPE_DEPTH`.
    depth: u32,
}

impl Resolver {
    /// Lower a type expression to an arena id to be referenced by a parent.
    fn lower_ref(&mut self, expr: &TypeExpr) -> TypeId {
        if self.depth >= MAX_TYPE_DEPTH {
            self.diagnostics
                .report(DiagnosticKind::NestingTooDeep, expr.span)
                .emit();
            return self.graph.alloc(TypeNode::Empty);
        }
        self.depth += 1;
        let id = self.lower_ref_inner(expr);
        self.depth -= 1;
        id
    }

    fn lower_ref_inner(&mut self, expr: &TypeExpr) -> TypeId {
        if let TypeExprKind::Named(name) = &expr.kind {
            return match self.graph.def(name) {
                Some(target) if self.in_progress.contains(name) => {
                    // Re-entered while expanding: defer through a Rec marker
                    // instead of recursing, which is what keeps expansion
                    // finite.
                    self.graph.alloc(TypeNode::Rec(target))
                }
                Some(target) => target,
                None => {
                    self.report_unresolved(name, expr.span);
                    self.graph.alloc(TypeNode::Empty)
                }
            };
        }
        let node = self.lower_node(expr);
        self.graph.alloc(node)
    }

    /// Lower a type expression to a node (for filling a definition slot).
    fn lower_node(&mut self, expr: &TypeExpr) -> TypeNode {
        match &expr.kind {
            TypeExprKind::Prim(prim) => lower_prim(*prim),
            TypeExprKind::Principal => TypeNode::Principal,
            TypeExprKind::Named(name) => match self.graph.def(name) {
                Some(target) => TypeNode::Rec(target),
                None => {
                    self.report_unresolved(name, expr.span);
                    TypeNode::Empty
                }
            },
            TypeExprKind::Opt(inner) => TypeNode::Opt(self.lower_ref(inner)),
            TypeExprKind::Vec(elem) => TypeNode::Vec(self.lower_ref(elem)),
            TypeExprKind::Blob => {
                let byte = self.graph.alloc(TypeNode::Nat8);
                TypeNode::Vec(byte)
            }
            TypeExprKind::Record(fields) => TypeNode::Record(self.lower_fields(fields)),
            TypeExprKind::Variant(fields) => TypeNode::Variant(self.lower_fields(fields)),
            TypeExprKind::Func(spec) => TypeNode::Func(self.lower_func(spec)),
            TypeExprKind::Service(methods) => TypeNode::Service(self.lower_methods(methods)),
        }
    }

    fn lower_fields(&mut self, fields: &[FieldSpec]) -> Vec<Field> {
        let mut seen: Vec<(u32, TextRange)> = Vec::new();
        let mut lowered = Vec::with_capacity(fields.len());
        for field in fields {
            let id = field.label.id();
            if let Some((_, original)) = seen.iter().find(|(seen_id, _)| *seen_id == id) {
                self.diagnostics
                    .report(DiagnosticKind::DuplicateFieldLabel, field.span)
                    .message(format!("field label `{}` occurs twice", field.label))
                    .related_to("first occurrence here", *original)
                    .emit();
                continue;
            }
            seen.push((id, field.span));
            lowered.push(Field {
                label: field.label.clone(),
                ty: self.lower_ref(&field.ty),
            });
        }
        lowered
    }

    fn lower_func(&mut self, spec: &FuncSpec) -> FuncType {
        FuncType {
            args: spec.args.iter().map(|t| self.lower_ref(t)).collect(),
            rets: spec.rets.iter().map(|t| self.lower_ref(t)).collect(),
            modes: spec.modes.clone(),
        }
    }

    fn lower_methods(&mut self, methods: &[MethodSpec]) -> Vec<Method> {
        methods
            .iter()
            .map(|method| Method {
                name: method.name.clone(),
                ty: self.lower_ref(&method.ty),
            })
            .collect()
    }

    fn report_unresolved(&mut self, name: &str, span: TextRange) {
        self.diagnostics
            .report(DiagnosticKind::UnresolvedReference, span)
            .message(format!("reference to undefined type `{name}`"))
            .emit();
    }

    /// Pure alias chains (`type A = B`) may only end at a structure; a chain
    /// that loops never names a type at all.
    fn check_alias_cycles(&mut self, program: &Program) {
        for def in program.type_defs() {
            let Some(start) = self.graph.def(&def.name) else {
                continue;
            };
            let mut visited = HashSet::new();
            let mut current = start;
            while let TypeNode::Rec(target) = self.graph.node(current) {
                if !visited.insert(current) {
                    self.diagnostics
                        .report(DiagnosticKind::CyclicAlias, def.name_span)
                        .message(format!(
                            "type `{}` is an alias cycle with no structure",
                            def.name
                        ))
                        .emit();
                    break;
                }
                current = *target;
            }
        }
    }

    fn resolve_service(&mut self, decl: &ServiceDecl) -> ServiceSignature {
        let mut signature = ServiceSignature {
            init_args: decl.init_args.iter().map(|t| self.lower_ref(t)).collect(),
            methods: Default::default(),
        };

        let methods = match &decl.body {
            ServiceBody::Methods(specs) => self.lower_methods(specs),
            ServiceBody::Ref { name, span } => match self.graph.def(name) {
                Some(target) => match self.graph.node(self.graph.resolve(target)).clone() {
                    TypeNode::Service(methods) => methods,
                    _ => {
                        self.diagnostics
                            .report(DiagnosticKind::NotAService, *span)
                            .message(format!("`{name}` is not a service type"))
                            .emit();
                        Vec::new()
                    }
                },
                None => {
                    self.report_unresolved(name, *span);
                    Vec::new()
                }
            },
        };

        for method in methods {
            let resolved = self.graph.resolve(method.ty);
            let TypeNode::Func(func) = self.graph.node(resolved) else {
                self.diagnostics
                    .report(DiagnosticKind::NotAFunction, decl.span)
                    .message(format!("method `{}` does not have a function type", method.name))
                    .emit();
                continue;
            };
            let sig = MethodSig {
                args: func.args.clone(),
                rets: func.rets.clone(),
                is_query: func.is_query(),
                is_oneway: func.is_oneway(),
            };
            if signature.methods.insert(method.name.clone(), sig).is_some() {
                self.diagnostics
                    .report(DiagnosticKind::DuplicateFieldLabel, decl.span)
                    .message(format!("method `{}` is declared twice", method.name))
                    .emit();
            }
        }

        signature
    }
}

fn lower_prim(prim: PrimType) -> TypeNode {
    match prim {
        PrimType::Null => TypeNode::Null,
        PrimType::Bool => TypeNode::Bool,
        PrimType::Nat => TypeNode::Nat,
        PrimType::Int => TypeNode::Int,
        PrimType::Nat8 => TypeNode::Nat8,
        PrimType::Nat16 => TypeNode::Nat16,
        PrimType::Nat32 => TypeNode::Nat32,
        PrimType::Nat64 => TypeNode::Nat64,
        PrimType::Int8 => TypeNode::Int8,
        PrimType::Int16 => TypeNode::Int16,
        PrimType::Int32 => TypeNode::Int32,
        PrimType::Int64 => TypeNode::Int64,
        PrimType::Float32 => TypeNode::Float32,
        PrimType::Float64 => TypeNode::Float64,
        PrimType::Text => TypeNode::Text,
        PrimType::Reserved => TypeNode::Reserved,
        PrimType::Empty => TypeNode::Empty,
    }
}
