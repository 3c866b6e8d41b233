use rowan::TextRange;

use crate::source_map::SourceId;

/// Where a diagnostic points: a byte range inside one registered source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub source: SourceId,
    pub range: TextRange,
}

impl Span {
    pub fn new(source: SourceId, range: TextRange) -> Self {
        Self { source, range }
    }
}

/// The four failure families a schema build can surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    /// Malformed text or substatement sets, missing sources.
    Source,
    /// A named reference that never resolved, or resolved into a cycle.
    Inference,
    /// A schema inference stack operation that structurally cannot succeed.
    Navigation,
    /// Range, length, scale or numbering arithmetic.
    Arithmetic,
}

/// Diagnostic kinds, grouped by category.
///
/// Declaration order is also reporting order when several kinds are emitted
/// for the same statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticKind {
    // Lexical and grammar errors
    InvalidToken,
    UnterminatedString,
    UnexpectedToken,
    UnclosedBlock,
    ExpectedKeyword,
    ExpectedTerminator,
    UnknownKeyword,
    MissingArgument,
    UnexpectedArgument,
    InvalidArgument,
    MissingSubstatement,
    DuplicateSubstatement,
    InvalidSubstatement,
    InvalidPattern,
    DuplicateDefinition,
    MissingSource,
    IgnoredStatement,

    // Reference resolution
    UnresolvedType,
    UnresolvedGrouping,
    UnresolvedIdentity,
    UnresolvedFeature,
    UnresolvedPrefix,
    InvalidTarget,
    ReferenceCycle,
    DuplicateSchemaNode,
    InvalidListKey,
    InvalidDefault,
    InvalidConfig,

    // Navigation
    InvalidLeafref,

    // Arithmetic
    InvalidRestriction,
    NumberingOverflow,
    DuplicateNumbering,
}

impl DiagnosticKind {
    pub fn category(&self) -> DiagnosticCategory {
        match self {
            Self::UnresolvedType
            | Self::UnresolvedGrouping
            | Self::UnresolvedIdentity
            | Self::UnresolvedFeature
            | Self::UnresolvedPrefix
            | Self::InvalidTarget
            | Self::ReferenceCycle
            | Self::DuplicateSchemaNode
            | Self::InvalidListKey
            | Self::InvalidDefault
            | Self::InvalidConfig => DiagnosticCategory::Inference,
            Self::InvalidLeafref => DiagnosticCategory::Navigation,
            Self::InvalidRestriction | Self::NumberingOverflow | Self::DuplicateNumbering => {
                DiagnosticCategory::Arithmetic
            }
            _ => DiagnosticCategory::Source,
        }
    }

    pub fn default_severity(&self) -> Severity {
        match self {
            Self::IgnoredStatement => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Base message for this diagnostic kind, used when no custom message is provided.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Self::InvalidToken => "invalid token",
            Self::UnterminatedString => "unterminated quoted string",
            Self::UnexpectedToken => "unexpected token",
            Self::UnclosedBlock => "missing closing `}`",
            Self::ExpectedKeyword => "expected a statement keyword",
            Self::ExpectedTerminator => "expected `;` or `{`",
            Self::UnknownKeyword => "unknown statement",
            Self::MissingArgument => "missing argument",
            Self::UnexpectedArgument => "statement takes no argument",
            Self::InvalidArgument => "invalid argument",
            Self::MissingSubstatement => "missing mandatory substatement",
            Self::DuplicateSubstatement => "duplicate substatement",
            Self::InvalidSubstatement => "substatement not allowed here",
            Self::InvalidPattern => "invalid pattern",
            Self::DuplicateDefinition => "duplicate definition",
            Self::MissingSource => "source not found",
            Self::IgnoredStatement => "statement is not applied",

            Self::UnresolvedType => "type not found",
            Self::UnresolvedGrouping => "grouping not found",
            Self::UnresolvedIdentity => "identity not found",
            Self::UnresolvedFeature => "feature not found",
            Self::UnresolvedPrefix => "prefix not bound",
            Self::InvalidTarget => "invalid target node",
            Self::ReferenceCycle => "reference cycle",
            Self::DuplicateSchemaNode => "duplicate schema node",
            Self::InvalidListKey => "invalid list key",
            Self::InvalidDefault => "invalid default",
            Self::InvalidConfig => "invalid config",

            Self::InvalidLeafref => "invalid leafref path",

            Self::InvalidRestriction => "invalid type restriction",
            Self::NumberingOverflow => "numbering overflow",
            Self::DuplicateNumbering => "duplicate numbering",
        }
    }

    /// Template for custom messages. Contains `{}` placeholder for caller-provided detail.
    pub fn custom_message(&self) -> String {
        match self {
            Self::UnknownKeyword => "unknown statement `{}`".to_string(),
            Self::MissingArgument => "statement `{}` requires an argument".to_string(),
            Self::UnexpectedArgument => "statement `{}` takes no argument".to_string(),
            Self::DuplicateDefinition => "`{}` is already defined".to_string(),
            Self::UnresolvedPrefix => "prefix `{}` is not bound to any module".to_string(),

            // Reference and arithmetic messages are fully formed by the caller
            Self::MissingSubstatement
            | Self::DuplicateSubstatement
            | Self::InvalidSubstatement
            | Self::MissingSource
            | Self::UnresolvedType
            | Self::UnresolvedGrouping
            | Self::UnresolvedIdentity
            | Self::UnresolvedFeature
            | Self::InvalidTarget
            | Self::ReferenceCycle
            | Self::DuplicateSchemaNode
            | Self::InvalidListKey
            | Self::InvalidDefault
            | Self::InvalidConfig
            | Self::InvalidRestriction
            | Self::NumberingOverflow
            | Self::DuplicateNumbering
            | Self::InvalidLeafref => "{}".to_string(),

            _ => format!("{}: {{}}", self.fallback_message()),
        }
    }

    /// Render the final message.
    ///
    /// - `None` → returns `fallback_message()`
    /// - `Some(detail)` → returns `custom_message()` with `{}` replaced by detail
    pub fn message(&self, msg: Option<&str>) -> String {
        match msg {
            None => self.fallback_message().to_string(),
            Some(detail) => self.custom_message().replace("{}", detail),
        }
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
    pub span: Span,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub kind: DiagnosticKind,
    pub span: Span,
    pub message: String,
    pub related: Vec<RelatedInfo>,
}

impl DiagnosticMessage {
    pub(crate) fn with_default_message(kind: DiagnosticKind, span: Span) -> Self {
        Self {
            kind,
            span,
            message: kind.fallback_message().to_string(),
            related: Vec::new(),
        }
    }

    pub fn severity(&self) -> Severity {
        self.kind.default_severity()
    }

    pub fn category(&self) -> DiagnosticCategory {
        self.kind.category()
    }

    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity() == Severity::Warning
    }
}

impl std::fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}..{}: {}",
            self.severity(),
            u32::from(self.span.range.start()),
            u32::from(self.span.range.end()),
            self.message
        )?;
        for related in &self.related {
            write!(
                f,
                " (related: {} at {}..{})",
                related.message,
                u32::from(related.span.range.start()),
                u32::from(related.span.range.end())
            )?;
        }
        Ok(())
    }
}
