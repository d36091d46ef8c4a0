//! Concrete syntax tree for interface descriptions.
//!
//! The tree owns its children outright; the one exception is
//! [`TypeExprKind::Named`], a non-owning back-reference by identifier that the
//! resolver ties to a definition later. That is how the CST states potential
//! cycles without ever building one.

use rowan::TextRange;

use didl_core::{FuncMode, Label};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
    pub decls: Vec<Decl>,
}

impl Program {
    /// The service declaration, if the source has one.
    pub fn service(&self) -> Option<&ServiceDecl> {
        self.decls.iter().find_map(|decl| match decl {
            Decl::Service(service) => Some(service),
            _ => None,
        })
    }

    pub fn type_defs(&self) -> impl Iterator<Item = &TypeDef> {
        self.decls.iter().filter_map(|decl| match decl {
            Decl::Type(def) => Some(def),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decl {
    Type(TypeDef),
    Import(ImportDecl),
    Service(ServiceDecl),
}

/// `type Name = <type>;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDef {
    pub name: String,
    pub name_span: TextRange,
    pub ty: TypeExpr,
}

/// `import "path";` or `import service "path";`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    pub path: String,
    pub span: TextRange,
}

/// `service [name] : [(init args) ->] { methods }` or `service : Name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDecl {
    pub name: Option<String>,
    pub init_args: Vec<TypeExpr>,
    pub body: ServiceBody,
    pub span: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceBody {
    Methods(Vec<MethodSpec>),
    /// Reference to a previously declared service type name.
    Ref { name: String, span: TextRange },
}

/// A method entry of a service body. The type is either an inline function
/// signature or a named reference to a `func` type definition; both normalize
/// to the same signature shape during resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSpec {
    pub name: String,
    pub ty: TypeExpr,
    pub span: TextRange,
}

/// A record or variant field. The label is always present in the CST: the
/// parser assigns implicit numeric labels to unlabeled fields in declaration
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub label: Label,
    pub ty: TypeExpr,
    pub span: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncSpec {
    pub args: Vec<TypeExpr>,
    pub rets: Vec<TypeExpr>,
    pub modes: Vec<FuncMode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub span: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExprKind {
    Prim(PrimType),
    /// Back-reference by name, resolved in a later pass; the parser never
    /// needs to know whether the name is forward-declared.
    Named(String),
    Opt(Box<TypeExpr>),
    Vec(Box<TypeExpr>),
    /// `blob`, sugar for `vec nat8`.
    Blob,
    Record(Vec<FieldSpec>),
    Variant(Vec<FieldSpec>),
    Func(Box<FuncSpec>),
    Service(Vec<MethodSpec>),
    Principal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimType {
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
}

impl PrimType {
    /// Classify an identifier occurring in type position.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "null" => Self::Null,
            "bool" => Self::Bool,
            "nat" => Self::Nat,
            "int" => Self::Int,
            "nat8" => Self::Nat8,
            "nat16" => Self::Nat16,
            "nat32" => Self::Nat32,
            "nat64" => Self::Nat64,
            "int8" => Self::Int8,
            "int16" => Self::Int16,
            "int32" => Self::Int32,
            "int64" => Self::Int64,
            "float32" => Self::Float32,
            "float64" => Self::Float64,
            "text" => Self::Text,
            "reserved" => Self::Reserved,
            "empty" => Self::Empty,
            _ => return None,
        })
    }
}
