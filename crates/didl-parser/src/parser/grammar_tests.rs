use indoc::indoc;

use didl_core::{FuncMode, Label};

use crate::cst::{Decl, PrimType, ServiceBody, TypeExprKind};
use crate::diagnostics::DiagnosticKind;
use crate::parser::parse;

#[test]
fn parses_a_simple_type_def() {
    let result = parse("type Id = nat64;");
    assert!(result.diagnostics.is_empty());
    assert_eq!(result.program.decls.len(), 1);
    let Decl::Type(def) = &result.program.decls[0] else {
        panic!("expected type def");
    };
    assert_eq!(def.name, "Id");
    assert_eq!(def.ty.kind, TypeExprKind::Prim(PrimType::Nat64));
}

#[test]
fn record_fields_auto_number_from_zero() {
    let result = parse("type Pair = record { nat; text };");
    assert!(result.diagnostics.is_empty());
    let Decl::Type(def) = &result.program.decls[0] else {
        panic!("expected type def");
    };
    let TypeExprKind::Record(fields) = &def.ty.kind else {
        panic!("expected record");
    };
    assert_eq!(fields[0].label, Label::Id(0));
    assert_eq!(fields[1].label, Label::Id(1));
}

#[test]
fn explicit_label_steers_but_does_not_reset_the_counter() {
    let result = parse("type T = record { nat; 5 : text; bool };");
    assert!(result.diagnostics.is_empty());
    let Decl::Type(def) = &result.program.decls[0] else {
        panic!("expected type def");
    };
    let TypeExprKind::Record(fields) = &def.ty.kind else {
        panic!("expected record");
    };
    let labels: Vec<u32> = fields.iter().map(|f| f.label.id()).collect();
    assert_eq!(labels, [0, 5, 6]);
}

#[test]
fn variant_tag_without_payload_is_null() {
    let result = parse("type R = variant { ok : nat; err };");
    assert!(result.diagnostics.is_empty());
    let Decl::Type(def) = &result.program.decls[0] else {
        panic!("expected type def");
    };
    let TypeExprKind::Variant(fields) = &def.ty.kind else {
        panic!("expected variant");
    };
    assert_eq!(fields[1].label, Label::Named("err".into()));
    assert_eq!(fields[1].ty.kind, TypeExprKind::Prim(PrimType::Null));
}

#[test]
fn service_with_inline_methods() {
    let result = parse(indoc! {r#"
        service : {
          greet : (text) -> (text) query;
          notify : (nat) -> () oneway;
        }
    "#});
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    let service = result.program.service().expect("service decl");
    let ServiceBody::Methods(methods) = &service.body else {
        panic!("expected inline methods");
    };
    assert_eq!(methods.len(), 2);
    assert_eq!(methods[0].name, "greet");
    let TypeExprKind::Func(func) = &methods[0].ty.kind else {
        panic!("expected func");
    };
    assert_eq!(func.modes, [FuncMode::Query]);
    assert_eq!(func.args.len(), 1);
    assert_eq!(func.rets.len(), 1);
}

#[test]
fn service_by_reference_and_init_args() {
    let result = parse(indoc! {r#"
        type Wallet = service { balance : () -> (nat) query };
        service : (principal) -> Wallet
    "#});
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    let service = result.program.service().expect("service decl");
    assert_eq!(service.init_args.len(), 1);
    assert!(matches!(&service.body, ServiceBody::Ref { name, .. } if name == "Wallet"));
}

#[test]
fn quoted_field_names_unescape() {
    let result = parse(r#"type T = record { "two words" : nat };"#);
    assert!(result.diagnostics.is_empty());
    let Decl::Type(def) = &result.program.decls[0] else {
        panic!("expected type def");
    };
    let TypeExprKind::Record(fields) = &def.ty.kind else {
        panic!("expected record");
    };
    assert_eq!(fields[0].label, Label::Named("two words".into()));
}

#[test]
fn import_statement() {
    let result = parse(r#"import service "common.did";"#);
    assert!(result.diagnostics.is_empty());
    assert!(
        matches!(&result.program.decls[0], Decl::Import(import) if import.path == "common.did")
    );
}

#[test]
fn reports_all_errors_in_one_pass() {
    // Two independent problems: a bad field and a bad definition.
    let result = parse(indoc! {r#"
        type A = record { : nat };
        type = nat;
        type B = bool;
    "#});
    assert!(result.diagnostics.error_count() >= 2);
    // Recovery still picked up the following well-formed definition.
    assert!(
        result
            .program
            .type_defs()
            .any(|def| def.name == "B")
    );
}

#[test]
fn recovers_inside_field_lists() {
    let result = parse("type T = record { a : nat; ??? ; b : text };");
    assert!(result.diagnostics.has_errors());
    let Decl::Type(def) = &result.program.decls[0] else {
        panic!("expected type def");
    };
    let TypeExprKind::Record(fields) = &def.ty.kind else {
        panic!("expected record");
    };
    let names: Vec<Option<&str>> = fields.iter().map(|f| f.label.name()).collect();
    assert_eq!(names, [Some("a"), Some("b")]);
}

#[test]
fn unclosed_record_reports_unclosed_block() {
    let result = parse("type T = record { a : nat;");
    assert!(
        result
            .diagnostics
            .messages()
            .iter()
            .any(|m| m.kind() == DiagnosticKind::UnclosedBlock)
    );
}

#[test]
fn garbage_characters_become_diagnostics_not_aborts() {
    let result = parse("type A = nat; €€€ type B = bool;");
    assert!(
        result
            .diagnostics
            .messages()
            .iter()
            .any(|m| m.kind() == DiagnosticKind::UnexpectedCharacter)
    );
    assert_eq!(result.program.type_defs().count(), 2);
}

#[test]
fn parse_is_deterministic() {
    let source = "type L = opt record { head : nat; tail : L };";
    assert_eq!(parse(source).program, parse(source).program);
}

#[test]
fn deeply_nested_type_reports_instead_of_overflowing() {
    let source = format!("type T = {}nat;", "opt ".repeat(500));
    let result = parse(&source);
    assert!(
        result
            .diagnostics
            .messages()
            .iter()
            .any(|m| m.kind() == DiagnosticKind::NestingTooDeep)
    );
}
