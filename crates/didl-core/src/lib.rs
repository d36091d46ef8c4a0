//! Core data structures for didl: the resolved Candid type graph, runtime
//! values, field labels, and principal ids.
//!
//! Two layers:
//! - **Type layer**: [`TypeGraph`], an arena of [`TypeNode`]s where named
//!   definitions are slots referenced by identity, so recursive interfaces
//!   stay finite.
//! - **Value layer**: [`Value`], the host-side tree the codec maps to and
//!   from wire bytes.
//!
//! Everything here is immutable after construction and safe to share across
//! threads; the parser builds a graph once, the codec reads it per call.

pub mod label;
pub mod principal;
pub mod render;
pub mod types;
pub mod value;
pub mod visit;

pub use label::{Label, field_hash};
pub use principal::{Principal, PrincipalError};
pub use render::{render_graph, render_type};
pub use types::{
    Field, FuncMode, FuncType, Method, MethodSig, ServiceSignature, TypeGraph, TypeId, TypeNode,
};
pub use value::Value;
pub use visit::{TypeVisitor, accept};
