//! Grammar productions, one method per rule.

use didl_core::{FuncMode, Label};
use rowan::TextRange;

use crate::cst::{
    Decl, FieldSpec, FuncSpec, ImportDecl, MethodSpec, PrimType, Program, ServiceBody,
    ServiceDecl, TypeDef, TypeExpr, TypeExprKind,
};
use crate::diagnostics::DiagnosticKind;
use crate::lexer::{TokenKind, token_text, unescape_text};

use super::Parser;

const DECL_SYNC: &[TokenKind] = &[
    TokenKind::Semicolon,
    TokenKind::TypeKw,
    TokenKind::ImportKw,
    TokenKind::ServiceKw,
];

const FIELD_SYNC: &[TokenKind] = &[TokenKind::Semicolon, TokenKind::BraceClose];

/// Every grammar cycle passes through `parse_type_expr`, so a single depth
/// check there bounds recursion for the whole parser.
const MAX_TYPE_DEPTH: u32 = 128;

impl Parser<'_> {
    pub(super) fn parse_program(&mut self) -> Program {
        let mut program = Program::default();

        while !self.eof() {
            match self.current() {
                Some(TokenKind::TypeKw) => {
                    if let Some(def) = self.parse_type_def() {
                        program.decls.push(Decl::Type(def));
                    }
                }
                Some(TokenKind::ImportKw) => {
                    if let Some(import) = self.parse_import() {
                        program.decls.push(Decl::Import(import));
                    }
                }
                Some(TokenKind::ServiceKw) => {
                    if let Some(service) = self.parse_service_decl() {
                        program.decls.push(Decl::Service(service));
                    }
                }
                Some(TokenKind::Semicolon) => {
                    self.bump();
                }
                _ => {
                    self.error(DiagnosticKind::ExpectedDefinition);
                    self.bump();
                    self.recover_to(DECL_SYNC);
                }
            }
        }

        program
    }

    /// `type Name = <type> ;`
    fn parse_type_def(&mut self) -> Option<TypeDef> {
        self.bump(); // `type`

        if !self.at(TokenKind::Ident) {
            self.error_msg(
                DiagnosticKind::UnexpectedToken,
                "expected a name after `type`",
            );
            self.recover_to(DECL_SYNC);
            self.eat(TokenKind::Semicolon);
            return None;
        }
        let name = self.current_text().to_owned();
        let name_span = self.current_span();
        self.bump();

        self.expect(TokenKind::Equals, "`=` after the type name");

        let ty = match self.parse_type_expr() {
            Some(ty) => ty,
            None => {
                self.recover_to(DECL_SYNC);
                self.eat(TokenKind::Semicolon);
                return None;
            }
        };

        self.expect(TokenKind::Semicolon, "`;` after the type definition");
        Some(TypeDef {
            name,
            name_span,
            ty,
        })
    }

    /// `import "path" ;` or `import service "path" ;`
    fn parse_import(&mut self) -> Option<ImportDecl> {
        let start = self.current_span();
        self.bump(); // `import`
        self.eat(TokenKind::ServiceKw);

        if !self.at(TokenKind::Text) {
            self.error_msg(
                DiagnosticKind::UnexpectedToken,
                "expected a quoted path after `import`",
            );
            self.recover_to(DECL_SYNC);
            self.eat(TokenKind::Semicolon);
            return None;
        }
        let token = self.bump();
        let literal = token_text(self.source, &token);
        let path = match unescape_text(literal) {
            Ok(path) => path,
            Err(reason) => {
                self.diagnostics
                    .report(DiagnosticKind::UnexpectedCharacter, token.span)
                    .message(reason)
                    .emit();
                return None;
            }
        };
        let end = self.current_span();
        self.expect(TokenKind::Semicolon, "`;` after the import");
        Some(ImportDecl {
            path,
            span: TextRange::new(start.start(), end.start()),
        })
    }

    /// `service [name] : [(init args) ->] ({ methods } | Name) ;`
    fn parse_service_decl(&mut self) -> Option<ServiceDecl> {
        let start = self.current_span();
        self.bump(); // `service`

        let name = if self.at(TokenKind::Ident) {
            let name = self.current_text().to_owned();
            self.bump();
            Some(name)
        } else {
            None
        };

        self.expect(TokenKind::Colon, "`:` after `service`");

        let mut init_args = Vec::new();
        if self.at(TokenKind::ParenOpen) {
            init_args = self.parse_type_list();
            self.expect(TokenKind::Arrow, "`->` after service init arguments");
        }

        let body = match self.current() {
            Some(TokenKind::BraceOpen) => ServiceBody::Methods(self.parse_service_body()),
            Some(TokenKind::Ident) => {
                let span = self.current_span();
                let name = self.current_text().to_owned();
                self.bump();
                ServiceBody::Ref { name, span }
            }
            _ => {
                self.error_msg(
                    DiagnosticKind::UnexpectedToken,
                    "expected `{` or a service type name",
                );
                self.recover_to(DECL_SYNC);
                self.eat(TokenKind::Semicolon);
                return None;
            }
        };

        let end = self.current_span();
        self.eat(TokenKind::Semicolon);
        Some(ServiceDecl {
            name,
            init_args,
            body,
            span: TextRange::new(start.start(), end.start()),
        })
    }

    /// `{ name : <functype> ; ... }`
    fn parse_service_body(&mut self) -> Vec<MethodSpec> {
        let open_span = self.current_span();
        self.bump(); // `{`
        let mut methods = Vec::new();

        loop {
            if self.eat(TokenKind::BraceClose) {
                break;
            }
            if self.eof() {
                self.error_unclosed(open_span, "service body");
                break;
            }
            match self.parse_method() {
                Some(method) => {
                    methods.push(method);
                    if !self.at(TokenKind::BraceClose) {
                        self.expect(TokenKind::Semicolon, "`;` after the method");
                    }
                }
                None => {
                    self.recover_to(FIELD_SYNC);
                    self.eat(TokenKind::Semicolon);
                }
            }
        }

        methods
    }

    /// `name : (args) -> (rets) modes` or `name : FuncTypeName`
    fn parse_method(&mut self) -> Option<MethodSpec> {
        let start = self.current_span();
        let name = match self.current() {
            Some(TokenKind::Ident) => {
                let name = self.current_text().to_owned();
                self.bump();
                name
            }
            Some(TokenKind::Text) => {
                let token = self.bump();
                match unescape_text(token_text(self.source, &token)) {
                    Ok(name) => name,
                    Err(reason) => {
                        self.diagnostics
                            .report(DiagnosticKind::ExpectedMethodName, token.span)
                            .message(reason)
                            .emit();
                        return None;
                    }
                }
            }
            _ => {
                self.error(DiagnosticKind::ExpectedMethodName);
                return None;
            }
        };

        self.expect(TokenKind::Colon, "`:` after the method name");

        let ty = match self.current() {
            // Inline signature, written without the `func` keyword.
            Some(TokenKind::ParenOpen) => {
                let span = self.current_span();
                let func = self.parse_func_signature()?;
                TypeExpr {
                    kind: TypeExprKind::Func(Box::new(func)),
                    span,
                }
            }
            Some(TokenKind::Ident) => {
                let span = self.current_span();
                let name = self.current_text().to_owned();
                self.bump();
                TypeExpr {
                    kind: TypeExprKind::Named(name),
                    span,
                }
            }
            _ => {
                self.error_msg(
                    DiagnosticKind::ExpectedType,
                    "expected a function signature or type name",
                );
                return None;
            }
        };

        let end = self.current_span();
        Some(MethodSpec {
            name,
            ty,
            span: TextRange::new(start.start(), end.start()),
        })
    }

    /// `(args) -> (rets) [query|oneway]*`
    fn parse_func_signature(&mut self) -> Option<FuncSpec> {
        let args = self.parse_type_list();
        if !self.expect(TokenKind::Arrow, "`->` after the argument list") {
            return None;
        }
        let rets = if self.at(TokenKind::ParenOpen) {
            self.parse_type_list()
        } else {
            self.error_msg(DiagnosticKind::UnexpectedToken, "expected `(` after `->`");
            return None;
        };

        let mut modes = Vec::new();
        loop {
            match self.current() {
                Some(TokenKind::QueryKw) => {
                    self.bump();
                    modes.push(FuncMode::Query);
                }
                Some(TokenKind::OnewayKw) => {
                    self.bump();
                    modes.push(FuncMode::Oneway);
                }
                Some(TokenKind::Ident)
                    if matches!(self.current_text(), "composite_query") =>
                {
                    // Not supported on the wire here; parse and warn-as-error.
                    self.error(DiagnosticKind::InvalidAnnotation);
                    self.bump();
                }
                _ => break,
            }
        }

        Some(FuncSpec { args, rets, modes })
    }

    /// `( type , type , ... )`, tolerant of a trailing comma.
    fn parse_type_list(&mut self) -> Vec<TypeExpr> {
        let open_span = self.current_span();
        self.bump(); // `(`
        let mut types = Vec::new();

        loop {
            if self.eat(TokenKind::ParenClose) {
                break;
            }
            if self.eof() {
                self.error_unclosed(open_span, "argument list");
                break;
            }
            match self.parse_type_expr() {
                Some(ty) => {
                    types.push(ty);
                    if !self.at(TokenKind::ParenClose) {
                        self.expect(TokenKind::Comma, "`,` between types");
                    }
                }
                None => {
                    self.recover_to(&[
                        TokenKind::Comma,
                        TokenKind::ParenClose,
                        TokenKind::Semicolon,
                    ]);
                    self.eat(TokenKind::Comma);
                    if self.at(TokenKind::Semicolon) {
                        break;
                    }
                }
            }
        }

        types
    }

    pub(super) fn parse_type_expr(&mut self) -> Option<TypeExpr> {
        if self.type_depth >= MAX_TYPE_DEPTH {
            self.error(DiagnosticKind::NestingTooDeep);
            return None;
        }
        self.type_depth += 1;
        let expr = self.parse_type_expr_inner();
        self.type_depth -= 1;
        expr
    }

    fn parse_type_expr_inner(&mut self) -> Option<TypeExpr> {
        let span = self.current_span();
        let kind = match self.current() {
            Some(TokenKind::OptKw) => {
                self.bump();
                TypeExprKind::Opt(Box::new(self.parse_type_expr()?))
            }
            Some(TokenKind::VecKw) => {
                self.bump();
                TypeExprKind::Vec(Box::new(self.parse_type_expr()?))
            }
            Some(TokenKind::BlobKw) => {
                self.bump();
                TypeExprKind::Blob
            }
            Some(TokenKind::RecordKw) => {
                self.bump();
                TypeExprKind::Record(self.parse_field_list(FieldStyle::Record))
            }
            Some(TokenKind::VariantKw) => {
                self.bump();
                TypeExprKind::Variant(self.parse_field_list(FieldStyle::Variant))
            }
            Some(TokenKind::FuncKw) => {
                self.bump();
                if !self.at(TokenKind::ParenOpen) {
                    self.error_msg(DiagnosticKind::UnexpectedToken, "expected `(` after `func`");
                    return None;
                }
                TypeExprKind::Func(Box::new(self.parse_func_signature()?))
            }
            Some(TokenKind::ServiceKw) => {
                self.bump();
                if !self.at(TokenKind::BraceOpen) {
                    self.error_msg(
                        DiagnosticKind::UnexpectedToken,
                        "expected `{` after `service` in type position",
                    );
                    return None;
                }
                TypeExprKind::Service(self.parse_service_body())
            }
            Some(TokenKind::PrincipalKw) => {
                self.bump();
                TypeExprKind::Principal
            }
            Some(TokenKind::Ident) => {
                let name = self.current_text().to_owned();
                self.bump();
                match PrimType::from_name(&name) {
                    Some(prim) => TypeExprKind::Prim(prim),
                    None => TypeExprKind::Named(name),
                }
            }
            _ => {
                self.error(DiagnosticKind::ExpectedType);
                return None;
            }
        };

        let end = self
            .tokens
            .get(self.pos.saturating_sub(1))
            .map_or(span.end(), |t| t.span.end());
        Some(TypeExpr {
            kind,
            span: TextRange::new(span.start(), end),
        })
    }

    /// `{ field ; field ; ... }` for records and variants.
    ///
    /// Unlabeled fields auto-number in declaration order: the counter starts
    /// at 0 and after every field becomes that field's id + 1, so explicit
    /// labels steer the counter but never reset it.
    fn parse_field_list(&mut self, style: FieldStyle) -> Vec<FieldSpec> {
        if !self.at(TokenKind::BraceOpen) {
            self.error_msg(DiagnosticKind::UnexpectedToken, "expected `{`");
            return Vec::new();
        }
        let open_span = self.current_span();
        self.bump();

        let mut fields = Vec::new();
        let mut next_implicit: u32 = 0;

        loop {
            if self.eat(TokenKind::BraceClose) {
                break;
            }
            if self.eof() {
                self.error_unclosed(
                    open_span,
                    match style {
                        FieldStyle::Record => "record",
                        FieldStyle::Variant => "variant",
                    },
                );
                break;
            }
            match self.parse_field(style, next_implicit) {
                Some(field) => {
                    next_implicit = field.label.id().wrapping_add(1);
                    fields.push(field);
                    if !self.at(TokenKind::BraceClose) {
                        self.expect(TokenKind::Semicolon, "`;` between fields");
                    }
                }
                None => {
                    self.recover_to(FIELD_SYNC);
                    self.eat(TokenKind::Semicolon);
                }
            }
        }

        fields
    }

    fn parse_field(&mut self, style: FieldStyle, next_implicit: u32) -> Option<FieldSpec> {
        let start = self.current_span();

        let explicit_label = match (self.current(), self.next()) {
            (Some(TokenKind::Number), _) => Some(self.parse_label_number()?),
            (Some(TokenKind::Text), _) => {
                let token = self.bump();
                match unescape_text(token_text(self.source, &token)) {
                    Ok(name) => Some(Label::Named(name)),
                    Err(reason) => {
                        self.diagnostics
                            .report(DiagnosticKind::InvalidFieldLabel, token.span)
                            .message(reason)
                            .emit();
                        return None;
                    }
                }
            }
            // A bare identifier is a label only when a `:` follows (records)
            // or always in variants, where `Tag` alone means `Tag : null`.
            (Some(TokenKind::Ident), Some(TokenKind::Colon)) => {
                let name = self.current_text().to_owned();
                self.bump();
                Some(Label::Named(name))
            }
            (Some(TokenKind::Ident), _) if style == FieldStyle::Variant => {
                let name = self.current_text().to_owned();
                self.bump();
                Some(Label::Named(name))
            }
            _ => None,
        };

        let (label, ty) = match explicit_label {
            Some(label) => {
                let ty = if self.eat(TokenKind::Colon) {
                    self.parse_type_expr()?
                } else if style == FieldStyle::Variant {
                    // `Tag` without a payload carries null.
                    TypeExpr {
                        kind: TypeExprKind::Prim(PrimType::Null),
                        span: start,
                    }
                } else {
                    self.error_msg(
                        DiagnosticKind::UnexpectedToken,
                        "expected `:` after the field label",
                    );
                    return None;
                };
                (label, ty)
            }
            None => {
                if style == FieldStyle::Variant {
                    self.error_msg(DiagnosticKind::InvalidFieldLabel, "expected a variant tag");
                    return None;
                }
                // Tuple-style record field.
                (Label::Id(next_implicit), self.parse_type_expr()?)
            }
        };

        let end = self.current_span();
        Some(FieldSpec {
            label,
            ty,
            span: TextRange::new(start.start(), end.start()),
        })
    }

    fn parse_label_number(&mut self) -> Option<Label> {
        let token = self.bump();
        let text = token_text(self.source, &token).replace('_', "");
        let parsed = if let Some(hex) = text.strip_prefix("0x") {
            u32::from_str_radix(hex, 16)
        } else {
            text.parse::<u32>()
        };
        match parsed {
            Ok(id) => Some(Label::Id(id)),
            Err(_) => {
                self.diagnostics
                    .report(DiagnosticKind::InvalidFieldLabel, token.span)
                    .message("field label does not fit in 32 bits")
                    .emit();
                None
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldStyle {
    Record,
    Variant,
}
