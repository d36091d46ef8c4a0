//! JSON to Candid value bridge.
//!
//! JSON alone cannot say whether `5` is a `nat` or an `int32`, so conversion
//! is guided by the expected type from the interface. The mapping is the
//! obvious one: objects become records or variants, arrays become vectors,
//! `null` becomes `none`, and principals are textual.

use didl_core::{Label, Principal, TypeGraph, TypeId, TypeNode, Value};
use num_bigint::{BigInt, BigUint};
use serde_json::Value as Json;

pub fn value_from_json(graph: &TypeGraph, ty: TypeId, json: &Json) -> Result<Value, String> {
    let ty = graph.resolve(ty);
    match (graph.node(ty), json) {
        (TypeNode::Null, Json::Null) => Ok(Value::Null),
        (TypeNode::Reserved, _) => Ok(Value::Reserved),
        (TypeNode::Bool, Json::Bool(b)) => Ok(Value::Bool(*b)),
        (TypeNode::Nat, json) => Ok(Value::Nat(biguint_from(json)?)),
        (TypeNode::Int, json) => Ok(Value::Int(bigint_from(json)?)),
        (TypeNode::Nat8, json) => Ok(Value::Nat8(fit(u64_from(json)?, "nat8")?)),
        (TypeNode::Nat16, json) => Ok(Value::Nat16(fit(u64_from(json)?, "nat16")?)),
        (TypeNode::Nat32, json) => Ok(Value::Nat32(fit(u64_from(json)?, "nat32")?)),
        (TypeNode::Nat64, json) => Ok(Value::Nat64(u64_from(json)?)),
        (TypeNode::Int8, json) => Ok(Value::Int8(fit_i(i64_from(json)?, "int8")?)),
        (TypeNode::Int16, json) => Ok(Value::Int16(fit_i(i64_from(json)?, "int16")?)),
        (TypeNode::Int32, json) => Ok(Value::Int32(fit_i(i64_from(json)?, "int32")?)),
        (TypeNode::Int64, json) => Ok(Value::Int64(i64_from(json)?)),
        (TypeNode::Float32, Json::Number(n)) => n
            .as_f64()
            .map(|f| Value::Float32(f as f32))
            .ok_or_else(|| "expected a float".to_owned()),
        (TypeNode::Float64, Json::Number(n)) => n
            .as_f64()
            .map(Value::Float64)
            .ok_or_else(|| "expected a float".to_owned()),
        (TypeNode::Text, Json::String(s)) => Ok(Value::Text(s.clone())),
        (TypeNode::Principal, Json::String(s)) => s
            .parse::<Principal>()
            .map(Value::Principal)
            .map_err(|e| format!("invalid principal {s:?}: {e}")),
        (TypeNode::Opt(_), Json::Null) => Ok(Value::none()),
        (TypeNode::Opt(inner), json) => Ok(Value::some(value_from_json(graph, *inner, json)?)),
        (TypeNode::Vec(elem), Json::Array(items)) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.push(value_from_json(graph, *elem, item)?);
            }
            Ok(Value::Vec(values))
        }
        (TypeNode::Record(fields), Json::Object(entries)) => {
            let mut values = Vec::with_capacity(fields.len());
            for field in fields {
                let entry = entries.iter().find(|(key, _)| key_matches(key, &field.label));
                match entry {
                    Some((_, json)) => {
                        values.push((field.label.clone(), value_from_json(graph, field.ty, json)?));
                    }
                    None if matches!(graph.node(graph.resolve(field.ty)), TypeNode::Opt(_)) => {
                        values.push((field.label.clone(), Value::none()));
                    }
                    None => return Err(format!("missing record field `{}`", field.label)),
                }
            }
            Ok(Value::Record(values))
        }
        // tuple records also accept a JSON array
        (TypeNode::Record(fields), Json::Array(items)) => {
            if items.len() != fields.len() {
                return Err(format!(
                    "expected {} tuple elements, got {}",
                    fields.len(),
                    items.len()
                ));
            }
            let mut values = Vec::with_capacity(fields.len());
            for (field, item) in fields.iter().zip(items) {
                values.push((field.label.clone(), value_from_json(graph, field.ty, item)?));
            }
            Ok(Value::Record(values))
        }
        (TypeNode::Variant(fields), json) => {
            // either {"tag": payload} or a bare "tag" for null payloads
            let (tag, payload) = match json {
                Json::String(tag) => (tag.as_str(), None),
                Json::Object(entries) if entries.len() == 1 => {
                    let (tag, payload) = entries.iter().next().ok_or("empty variant object")?;
                    (tag.as_str(), Some(payload))
                }
                _ => return Err("expected a variant tag or single-key object".to_owned()),
            };
            let field = fields
                .iter()
                .find(|f| key_matches(tag, &f.label))
                .ok_or_else(|| format!("unknown variant tag `{tag}`"))?;
            let value = match payload {
                Some(json) => value_from_json(graph, field.ty, json)?,
                None => Value::Null,
            };
            Ok(Value::Variant {
                label: field.label.clone(),
                value: Box::new(value),
            })
        }
        (TypeNode::Service(_), Json::String(s)) => s
            .parse::<Principal>()
            .map(Value::Service)
            .map_err(|e| format!("invalid principal {s:?}: {e}")),
        (TypeNode::Func(_), Json::Object(entries)) => {
            let service = entries
                .get("service")
                .and_then(Json::as_str)
                .ok_or("func value needs a \"service\" principal")?;
            let method = entries
                .get("method")
                .and_then(Json::as_str)
                .ok_or("func value needs a \"method\" name")?;
            let service = service
                .parse::<Principal>()
                .map_err(|e| format!("invalid principal {service:?}: {e}"))?;
            Ok(Value::Func {
                service,
                method: method.to_owned(),
            })
        }
        (TypeNode::Empty, _) => Err("type `empty` has no values".to_owned()),
        (node, json) => Err(format!("cannot read {json} as {node:?}")),
    }
}

fn key_matches(key: &str, label: &Label) -> bool {
    match key.parse::<u32>() {
        Ok(id) => label.id() == id,
        Err(_) => Label::Named(key.to_owned()).id() == label.id(),
    }
}

fn u64_from(json: &Json) -> Result<u64, String> {
    json.as_u64()
        .ok_or_else(|| format!("expected an unsigned integer, got {json}"))
}

fn i64_from(json: &Json) -> Result<i64, String> {
    json.as_i64()
        .ok_or_else(|| format!("expected an integer, got {json}"))
}

fn biguint_from(json: &Json) -> Result<BigUint, String> {
    match json {
        Json::Number(n) => n
            .as_u64()
            .map(BigUint::from)
            .ok_or_else(|| format!("expected a nat, got {json}")),
        // large literals arrive as strings
        Json::String(s) => s
            .parse::<BigUint>()
            .map_err(|_| format!("expected a nat, got {s:?}")),
        _ => Err(format!("expected a nat, got {json}")),
    }
}

fn bigint_from(json: &Json) -> Result<BigInt, String> {
    match json {
        Json::Number(n) => n
            .as_i64()
            .map(BigInt::from)
            .ok_or_else(|| format!("expected an int, got {json}")),
        Json::String(s) => s
            .parse::<BigInt>()
            .map_err(|_| format!("expected an int, got {s:?}")),
        _ => Err(format!("expected an int, got {json}")),
    }
}

fn fit<T: TryFrom<u64>>(value: u64, ty: &str) -> Result<T, String> {
    T::try_from(value).map_err(|_| format!("{value} does not fit in {ty}"))
}

fn fit_i<T: TryFrom<i64>>(value: i64, ty: &str) -> Result<T, String> {
    T::try_from(value).map_err(|_| format!("{value} does not fit in {ty}"))
}
