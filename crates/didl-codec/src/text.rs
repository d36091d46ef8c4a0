//! Candid textual syntax for values.
//!
//! Renders decoded values back into source-like text, the form used in call
//! logs and tooling output: `(record { name = "alice"; age = 30 : nat8 })`.

use std::fmt::Write;

use didl_core::{Label, Value};

/// Render an argument sequence, parenthesized and comma-separated.
pub fn render_args(values: &[Value]) -> String {
    let mut out = String::from("(");
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&render_value(value));
    }
    out.push(')');
    out
}

/// Render a single value.
pub fn render_value(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Reserved => out.push_str("reserved"),
        Value::Bool(b) => {
            let _ = write!(out, "{b}");
        }
        Value::Nat(n) => {
            let _ = write!(out, "{n}");
        }
        Value::Int(i) => {
            // unannotated positive literals parse as nat, so keep the sign
            // explicit for non-negative ints
            if i.sign() == num_bigint::Sign::Minus {
                let _ = write!(out, "{i}");
            } else {
                let _ = write!(out, "+{i}");
            }
        }
        Value::Nat8(n) => annotated(out, n, "nat8"),
        Value::Nat16(n) => annotated(out, n, "nat16"),
        Value::Nat32(n) => annotated(out, n, "nat32"),
        Value::Nat64(n) => annotated(out, n, "nat64"),
        Value::Int8(n) => annotated(out, n, "int8"),
        Value::Int16(n) => annotated(out, n, "int16"),
        Value::Int32(n) => annotated(out, n, "int32"),
        Value::Int64(n) => annotated(out, n, "int64"),
        Value::Float32(f) => annotated(out, f, "float32"),
        Value::Float64(f) => {
            let _ = write!(out, "{f}");
        }
        Value::Text(s) => write_text(out, s),
        Value::Principal(p) => {
            let _ = write!(out, "principal \"{p}\"");
        }
        Value::Opt(None) => out.push_str("null"),
        Value::Opt(Some(inner)) => {
            out.push_str("opt ");
            write_value(out, inner);
        }
        Value::Vec(items) => write_vec(out, items),
        Value::Record(fields) => {
            if fields.is_empty() {
                out.push_str("record {}");
                return;
            }
            out.push_str("record { ");
            let tuple_like = fields
                .iter()
                .enumerate()
                .all(|(i, (label, _))| *label == Label::Id(i as u32));
            for (i, (label, value)) in fields.iter().enumerate() {
                if i > 0 {
                    out.push_str("; ");
                }
                if !tuple_like {
                    let _ = write!(out, "{label} = ");
                }
                write_value(out, value);
            }
            out.push_str(" }");
        }
        Value::Variant { label, value } => {
            if **value == Value::Null {
                let _ = write!(out, "variant {{ {label} }}");
            } else {
                let _ = write!(out, "variant {{ {label} = ");
                write_value(out, value);
                out.push_str(" }");
            }
        }
        Value::Func { service, method } => {
            let _ = write!(out, "func \"{service}\".{method}");
        }
        Value::Service(principal) => {
            let _ = write!(out, "service \"{principal}\"");
        }
    }
}

fn annotated(out: &mut String, value: impl std::fmt::Display, ty: &str) {
    let _ = write!(out, "{value} : {ty}");
}

fn write_text(out: &mut String, text: &str) {
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
}

fn write_vec(out: &mut String, items: &[Value]) {
    // byte vectors render in blob form
    if !items.is_empty() && items.iter().all(|item| matches!(item, Value::Nat8(_))) {
        out.push_str("blob \"");
        for item in items {
            if let Value::Nat8(byte) = item {
                let _ = write!(out, "\\{byte:02x}");
            }
        }
        out.push('"');
        return;
    }
    if items.is_empty() {
        out.push_str("vec {}");
        return;
    }
    out.push_str("vec { ");
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str("; ");
        }
        write_value(out, item);
    }
    out.push_str(" }");
}

#[cfg(test)]
mod tests {
    use super::*;
    use didl_core::Principal;

    #[test]
    fn scalars_render_with_width_annotations() {
        assert_eq!(render_value(&Value::nat(42)), "42");
        assert_eq!(render_value(&Value::int(-7)), "-7");
        assert_eq!(render_value(&Value::int(7)), "+7");
        assert_eq!(render_value(&Value::Nat8(30)), "30 : nat8");
        assert_eq!(render_value(&Value::Bool(true)), "true");
    }

    #[test]
    fn records_and_variants() {
        let v = Value::record([("name", Value::text("alice")), ("age", Value::Nat8(30))]);
        assert_eq!(
            render_value(&v),
            "record { name = \"alice\"; age = 30 : nat8 }"
        );
        assert_eq!(
            render_value(&Value::variant("ok", Value::Null)),
            "variant { ok }"
        );
        assert_eq!(
            render_value(&Value::variant("err", Value::text("boom"))),
            "variant { err = \"boom\" }"
        );
    }

    #[test]
    fn tuples_drop_labels() {
        let v = Value::tuple([Value::nat(1), Value::text("x")]);
        assert_eq!(render_value(&v), "record { 1; \"x\" }");
    }

    #[test]
    fn byte_vectors_render_as_blobs() {
        let v = Value::Vec(vec![Value::Nat8(0xde), Value::Nat8(0xad)]);
        assert_eq!(render_value(&v), "blob \"\\de\\ad\"");
    }

    #[test]
    fn text_escapes() {
        assert_eq!(
            render_value(&Value::text("a\"b\nc")),
            "\"a\\\"b\\nc\""
        );
    }

    #[test]
    fn args_and_references() {
        let args = render_args(&[Value::text("hi"), Value::none()]);
        assert_eq!(args, "(\"hi\", null)");
        assert_eq!(
            render_value(&Value::Service(Principal::management())),
            "service \"aaaaa-aa\""
        );
    }
}
