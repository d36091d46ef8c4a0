//! Batched diagnostics.
//!
//! Lexing, parsing, and resolution never stop at the first problem: each pass
//! accumulates into a [`Diagnostics`] so a caller can show every independent
//! problem in one round.

mod message;
mod printer;

use rowan::TextRange;

pub use message::{DiagnosticKind, DiagnosticMessage, Severity};
pub use printer::DiagnosticsPrinter;

use message::RelatedInfo;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    messages: Vec<DiagnosticMessage>,
}

#[must_use = "diagnostic not emitted, call .emit()"]
pub struct DiagnosticBuilder<'a> {
    diagnostics: &'a mut Diagnostics,
    message: DiagnosticMessage,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a diagnostic with the kind's default message; override with
    /// `.message()` on the builder.
    pub fn report(&mut self, kind: DiagnosticKind, range: TextRange) -> DiagnosticBuilder<'_> {
        DiagnosticBuilder {
            diagnostics: self,
            message: DiagnosticMessage::new(kind, range),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|d| d.is_error())
    }

    pub fn error_count(&self) -> usize {
        self.messages.iter().filter(|d| d.is_error()).count()
    }

    pub fn messages(&self) -> &[DiagnosticMessage] {
        &self.messages
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.messages.extend(other.messages);
    }

    /// Diagnostics with same-position cascades suppressed.
    ///
    /// When two diagnostics start at the same offset, the higher-priority
    /// kind wins; duplicates of the same kind collapse to one.
    pub fn filtered(&self) -> Vec<DiagnosticMessage> {
        let mut kept: Vec<DiagnosticMessage> = Vec::with_capacity(self.messages.len());
        for msg in &self.messages {
            match kept
                .iter_mut()
                .find(|k| k.range().start() == msg.range().start())
            {
                Some(existing) => {
                    if msg.kind().suppresses(&existing.kind()) {
                        *existing = msg.clone();
                    }
                }
                None => kept.push(msg.clone()),
            }
        }
        kept
    }

    pub fn printer(&self) -> DiagnosticsPrinter<'_, '_> {
        DiagnosticsPrinter::new(self)
    }

    pub fn render(&self, source: &str) -> String {
        self.printer().source(source).render()
    }
}

impl<'a> DiagnosticBuilder<'a> {
    pub fn message(mut self, msg: impl Into<String>) -> Self {
        self.message.message = msg.into();
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.message.severity = severity;
        self
    }

    pub fn related_to(mut self, msg: impl Into<String>, range: TextRange) -> Self {
        self.message.related.push(RelatedInfo::new(range, msg));
        self
    }

    pub fn emit(self) {
        self.diagnostics.messages.push(self.message);
    }
}
