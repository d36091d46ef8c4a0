use rowan::TextRange;

/// Diagnostic kinds, ordered by priority (highest first).
///
/// When two diagnostics start at the same position, the higher-priority one
/// suppresses the lower-priority one to cut cascading noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticKind {
    // Cascading sources: everything after an unclosed brace is suspect
    UnclosedBlock,

    // Lexical
    UnexpectedCharacter,

    // Grammar: something required is missing
    ExpectedType,
    ExpectedMethodName,
    ExpectedDefinition,

    // Grammar: something present doesn't belong
    UnexpectedToken,
    InvalidFieldLabel,
    InvalidAnnotation,
    NestingTooDeep,

    // Valid syntax, invalid meaning
    DuplicateTypeDefinition,
    DuplicateFieldLabel,
    UnresolvedReference,
    CyclicAlias,
    NotAFunction,
    NotAService,
}

impl DiagnosticKind {
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::UnclosedBlock => "unclosed block",
            Self::UnexpectedCharacter => "unrecognized character",
            Self::ExpectedType => "expected a type",
            Self::ExpectedMethodName => "expected a method name",
            Self::ExpectedDefinition => "expected `type`, `service`, or `import`",
            Self::UnexpectedToken => "unexpected token",
            Self::InvalidFieldLabel => "invalid field label",
            Self::InvalidAnnotation => "unknown function annotation",
            Self::NestingTooDeep => "type nesting is too deep",
            Self::DuplicateTypeDefinition => "duplicate type definition",
            Self::DuplicateFieldLabel => "duplicate field label",
            Self::UnresolvedReference => "reference to undefined type",
            Self::CyclicAlias => "type alias cycle",
            Self::NotAFunction => "method type is not a function",
            Self::NotAService => "service reference is not a service type",
        }
    }

    pub fn default_severity(&self) -> Severity {
        Severity::Error
    }

    /// Lower discriminant wins when spans collide.
    pub fn suppresses(&self, other: &DiagnosticKind) -> bool {
        self < other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedInfo {
    pub(crate) range: TextRange,
    pub(crate) message: String,
}

impl RelatedInfo {
    pub fn new(range: TextRange, message: impl Into<String>) -> Self {
        Self {
            range,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub(crate) kind: DiagnosticKind,
    /// The range underlined in rendered output.
    pub(crate) range: TextRange,
    pub(crate) severity: Severity,
    pub(crate) message: String,
    pub(crate) related: Vec<RelatedInfo>,
}

impl DiagnosticMessage {
    pub(crate) fn new(kind: DiagnosticKind, range: TextRange) -> Self {
        Self {
            kind,
            range,
            severity: kind.default_severity(),
            message: kind.default_message().to_owned(),
            related: Vec::new(),
        }
    }

    pub fn kind(&self) -> DiagnosticKind {
        self.kind
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl std::fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}..{}: {}",
            self.severity,
            u32::from(self.range.start()),
            u32::from(self.range.end()),
            self.message
        )
    }
}
