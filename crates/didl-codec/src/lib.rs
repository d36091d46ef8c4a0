//! Candid binary wire format.
//!
//! [`encode_args`] and [`decode_args_with_types`] work against a resolved
//! [`didl_core::TypeGraph`]; [`decode_args`] reads any message from the type
//! table it carries. [`ServiceCodec`] binds a graph's service declaration and
//! keys both directions by method name.

mod cursor;
mod decode;
mod encode;
mod error;
mod leb128;
mod text;
mod type_table;

pub use decode::{decode_args, decode_args_with_types};
pub use encode::{encode_args, MAGIC};
pub use error::CodecError;
pub use text::{render_args, render_value};
pub use type_table::{prim_opcode, TypeTableBuilder};

use didl_core::{TypeGraph, Value};

/// Encoder and decoder for the calls of one service.
///
/// Owns the resolved type graph; every operation resolves the method by name
/// and applies its declared argument or return types.
#[derive(Debug, Clone)]
pub struct ServiceCodec {
    graph: TypeGraph,
}

impl ServiceCodec {
    pub fn new(graph: TypeGraph) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &TypeGraph {
        &self.graph
    }

    /// Encode the arguments of a call to `method`.
    pub fn encode_call(&self, method: &str, args: &[Value]) -> Result<Vec<u8>, CodecError> {
        let sig = self.method(method)?;
        encode_args(&self.graph, &sig.args, args)
    }

    /// Decode the reply bytes of a call to `method`.
    pub fn decode_reply(&self, method: &str, bytes: &[u8]) -> Result<Vec<Value>, CodecError> {
        let sig = self.method(method)?;
        decode_args_with_types(&self.graph, &sig.rets, bytes)
    }

    /// Decode the argument bytes of an incoming call to `method`.
    pub fn decode_call(&self, method: &str, bytes: &[u8]) -> Result<Vec<Value>, CodecError> {
        let sig = self.method(method)?;
        decode_args_with_types(&self.graph, &sig.args, bytes)
    }

    /// Render a call in textual syntax, e.g. for logs: `greet("alice")`.
    pub fn render_call(&self, method: &str, args: &[Value]) -> String {
        format!("{method}{}", render_args(args))
    }

    fn method(&self, name: &str) -> Result<&didl_core::MethodSig, CodecError> {
        self.graph
            .method(name)
            .ok_or_else(|| CodecError::UnknownMethod(name.to_owned()))
    }
}
