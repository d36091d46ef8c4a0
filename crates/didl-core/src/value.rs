//! Runtime values, the host-side counterpart of wire bytes.
//!
//! `Value` is what the encoder consumes and the decoder produces. It is a
//! plain tree; sharing and cycles never occur in values (only in types).

use num_bigint::{BigInt, BigUint};
use serde::{Deserialize, Serialize};

use crate::label::Label;
use crate::principal::Principal;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Reserved,
    Bool(bool),
    Nat(BigUint),
    Int(BigInt),
    Nat8(u8),
    Nat16(u16),
    Nat32(u32),
    Nat64(u64),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Text(String),
    Principal(Principal),
    Opt(Option<Box<Value>>),
    Vec(Vec<Value>),
    Record(Vec<(Label, Value)>),
    Variant { label: Label, value: Box<Value> },
    Func { service: Principal, method: String },
    Service(Principal),
}

impl Value {
    pub fn nat(value: u64) -> Self {
        Value::Nat(BigUint::from(value))
    }

    pub fn int(value: i64) -> Self {
        Value::Int(BigInt::from(value))
    }

    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(value.into())
    }

    pub fn some(value: Value) -> Self {
        Value::Opt(Some(Box::new(value)))
    }

    pub fn none() -> Self {
        Value::Opt(None)
    }

    pub fn record<I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, Value)>,
    {
        Value::Record(
            fields
                .into_iter()
                .map(|(name, value)| (Label::Named(name.to_owned()), value))
                .collect(),
        )
    }

    /// Tuple-style record with numeric labels 0..n.
    pub fn tuple<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        Value::Record(
            values
                .into_iter()
                .enumerate()
                .map(|(i, value)| (Label::Id(i as u32), value))
                .collect(),
        )
    }

    pub fn variant(label: impl Into<String>, value: Value) -> Self {
        Value::Variant {
            label: Label::Named(label.into()),
            value: Box::new(value),
        }
    }

    /// Field of a record value, looked up by label id.
    pub fn field(&self, name: &str) -> Option<&Value> {
        let wanted = Label::Named(name.to_owned()).id();
        match self {
            Value::Record(fields) => fields
                .iter()
                .find(|(label, _)| label.id() == wanted)
                .map(|(_, value)| value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_lookup_ignores_label_spelling() {
        // "a" hashes to 97, so a numeric 97 label is the same field.
        let value = Value::Record(vec![(Label::Id(97), Value::nat(5))]);
        assert_eq!(value.field("a"), Some(&Value::nat(5)));
        assert_eq!(value.field("b"), None);
    }

    #[test]
    fn builders_produce_expected_shapes() {
        let v = Value::record([("head", Value::nat(1)), ("tail", Value::none())]);
        let Value::Record(fields) = &v else {
            panic!("expected record");
        };
        assert_eq!(fields.len(), 2);
        assert_eq!(v.field("head"), Some(&Value::nat(1)));
        assert_eq!(v.field("tail"), Some(&Value::Opt(None)));
    }
}
