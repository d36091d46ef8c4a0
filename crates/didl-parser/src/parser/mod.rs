//! Parser state machine and low-level operations.
//!
//! Recursive descent over the token stream, one production per grammar rule
//! (see `grammar.rs`). The parser never stops at the first error: malformed
//! constructs skip ahead to the next synchronization token (`;` or `}`) and
//! parsing continues, so one pass reports every independent syntax problem.

mod grammar;

#[cfg(test)]
mod grammar_tests;

use rowan::{TextRange, TextSize};

use crate::cst::Program;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::lexer::{Token, TokenKind, lex, token_text};

#[derive(Debug)]
pub struct ParseResult {
    pub program: Program,
    pub diagnostics: Diagnostics,
}

/// Lex and parse one interface description.
pub fn parse(source: &str) -> ParseResult {
    let mut diagnostics = Diagnostics::new();

    // Garbage tokens are reported here and dropped, so the grammar only ever
    // sees recognizable tokens. Best-effort: a bad character never aborts the
    // file.
    let mut tokens = Vec::new();
    for token in lex(source) {
        if token.kind == TokenKind::Garbage {
            diagnostics
                .report(DiagnosticKind::UnexpectedCharacter, token.span)
                .message(format!(
                    "unrecognized character(s) `{}`",
                    token_text(source, &token)
                ))
                .emit();
        } else {
            tokens.push(token);
        }
    }

    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
        diagnostics,
        last_diagnostic_pos: None,
        type_depth: 0,
    };
    let program = parser.parse_program();
    ParseResult {
        program,
        diagnostics: parser.diagnostics,
    }
}

pub(super) struct Parser<'src> {
    pub(super) source: &'src str,
    pub(super) tokens: Vec<Token>,
    pub(super) pos: usize,
    pub(super) diagnostics: Diagnostics,
    last_diagnostic_pos: Option<TextSize>,
    /// Current type-expression nesting, bounded so pathological input cannot
    /// exhaust the stack.
    pub(super) type_depth: u32,
}

impl<'src> Parser<'src> {
    pub(super) fn current(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    pub(super) fn next(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos + 1).map(|t| t.kind)
    }

    pub(super) fn at(&self, kind: TokenKind) -> bool {
        self.current() == Some(kind)
    }

    pub(super) fn eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub(super) fn current_span(&self) -> TextRange {
        self.tokens
            .get(self.pos)
            .map_or_else(|| TextRange::empty(self.eof_offset()), |t| t.span)
    }

    pub(super) fn eof_offset(&self) -> TextSize {
        TextSize::from(self.source.len() as u32)
    }

    pub(super) fn current_text(&self) -> &'src str {
        self.tokens
            .get(self.pos)
            .map_or("", |t| token_text(self.source, t))
    }

    /// Advance one token, returning it. Must not be called at EOF.
    pub(super) fn bump(&mut self) -> Token {
        assert!(!self.eof(), "bump called at EOF");
        let token = self.tokens[self.pos];
        self.pos += 1;
        token
    }

    pub(super) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// On mismatch: emit diagnostic but don't consume.
    pub(super) fn expect(&mut self, kind: TokenKind, what: &str) -> bool {
        if self.eat(kind) {
            return true;
        }
        self.error_msg(DiagnosticKind::UnexpectedToken, format!("expected {what}"));
        false
    }

    /// One diagnostic per position, so a single stuck token doesn't flood.
    fn should_report(&mut self, pos: TextSize) -> bool {
        if self.last_diagnostic_pos == Some(pos) {
            return false;
        }
        self.last_diagnostic_pos = Some(pos);
        true
    }

    pub(super) fn error(&mut self, kind: DiagnosticKind) {
        let range = self.current_span();
        if self.should_report(range.start()) {
            self.diagnostics.report(kind, range).emit();
        }
    }

    pub(super) fn error_msg(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let range = self.current_span();
        if self.should_report(range.start()) {
            self.diagnostics.report(kind, range).message(message).emit();
        }
    }

    pub(super) fn error_unclosed(&mut self, open_span: TextRange, what: &str) {
        let current = self.current_span();
        if !self.should_report(current.start()) {
            return;
        }
        let full_range = TextRange::new(open_span.start(), current.end());
        self.diagnostics
            .report(DiagnosticKind::UnclosedBlock, full_range)
            .message(format!("unclosed {what}"))
            .related_to(format!("{what} opened here"), open_span)
            .emit();
    }

    /// Skip tokens until one of `sync` (or EOF). Does not consume the sync
    /// token itself.
    pub(super) fn recover_to(&mut self, sync: &[TokenKind]) {
        while let Some(kind) = self.current() {
            if sync.contains(&kind) {
                return;
            }
            self.pos += 1;
        }
    }
}
