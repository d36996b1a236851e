//! parsegraph Error Handling
//!
//! Match failures are not errors: they are reported through `ParseOutcome::success`.
//! Everything in this module describes conditions that stop a grammar from being
//! built or a run from being attempted at all.

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceSpan};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub type Result<T, E = GrammarError> = std::result::Result<T, E>;

// ============================================================================
// ERROR KINDS
// ============================================================================

/// Every way building or running a grammar can go wrong.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("invalid description for rule '{rule}': {reason}")]
    InvalidDescription { rule: String, reason: String },

    #[error("invalid pattern /{pattern}/ in rule '{rule}': {message}")]
    InvalidPattern {
        rule: String,
        pattern: String,
        message: String,
    },

    #[error("rule '{rule}' references undefined rule '{target}'")]
    UnresolvedReference { rule: String, target: String },

    #[error("rule '{rule}' is defined more than once")]
    DuplicateRule { rule: String },

    #[error("no rule named '{rule}'")]
    UnknownRule { rule: String },

    #[error("nesting depth exceeded the limit of {limit}")]
    RecursionLimit { limit: usize },

    #[error("invalid grammar notation: {reason}")]
    InvalidNotation { reason: String },

    #[error("cannot coerce parse result: {message}")]
    Coercion { message: String },

    #[error("cannot read '{path}': {message}")]
    Io { path: String, message: String },

    #[error("invalid {format} grammar: {message}")]
    Format { format: String, message: String },
}

/// Coarse grouping of error kinds, mostly for test assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The grammar itself is malformed.
    Grammar,
    /// The caller asked for something the grammar does not have.
    Usage,
    /// A run was aborted part way.
    Runtime,
    /// Reading or decoding grammar sources failed.
    Input,
}

impl ErrorKind {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidDescription { .. }
            | Self::InvalidPattern { .. }
            | Self::UnresolvedReference { .. }
            | Self::DuplicateRule { .. } => ErrorCategory::Grammar,

            Self::UnknownRule { .. } | Self::Coercion { .. } => ErrorCategory::Usage,

            Self::RecursionLimit { .. } => ErrorCategory::Runtime,

            Self::InvalidNotation { .. } | Self::Io { .. } | Self::Format { .. } => {
                ErrorCategory::Input
            }
        }
    }

    /// Error code suffix used in diagnostic codes.
    pub const fn code_suffix(&self) -> &'static str {
        match self {
            Self::InvalidDescription { .. } => "invalid_description",
            Self::InvalidPattern { .. } => "invalid_pattern",
            Self::UnresolvedReference { .. } => "unresolved_reference",
            Self::DuplicateRule { .. } => "duplicate_rule",
            Self::UnknownRule { .. } => "unknown_rule",
            Self::RecursionLimit { .. } => "recursion_limit",
            Self::InvalidNotation { .. } => "invalid_notation",
            Self::Coercion { .. } => "coercion",
            Self::Io { .. } => "io",
            Self::Format { .. } => "format",
        }
    }

    fn primary_label(&self) -> &'static str {
        match self {
            Self::InvalidPattern { .. } => "pattern does not compile",
            Self::InvalidNotation { .. } => "parsing stopped here",
            Self::DuplicateRule { .. } => "defined again here",
            _ => "here",
        }
    }

    fn default_help(&self) -> Option<String> {
        match self {
            Self::UnresolvedReference { target, .. } => {
                Some(format!("define a rule named '{target}' or fix the reference"))
            }
            Self::RecursionLimit { .. } => Some(
                "the grammar may be left-recursive, or the input nests deeper than the configured max_depth"
                    .into(),
            ),
            Self::InvalidDescription { .. } => Some(
                "a description is a pattern, a rule name, an array, or an object with `contains`, `first`, or `repeats`"
                    .into(),
            ),
            _ => None,
        }
    }
}

// ============================================================================
// ERROR STRUCT
// ============================================================================

/// Source text an error points into.
#[derive(Debug, Clone)]
pub struct SourceInfo {
    pub source: Arc<NamedSource<String>>,
    pub primary_span: SourceSpan,
}

/// Diagnostic enhancement data.
#[derive(Debug, Clone)]
pub struct DiagnosticInfo {
    pub help: Option<String>,
    pub error_code: String,
}

/// The single error type of the crate.
#[derive(Debug, Clone)]
pub struct GrammarError {
    pub kind: ErrorKind,
    pub source_info: Option<SourceInfo>,
    pub diagnostic_info: DiagnosticInfo,
}

impl GrammarError {
    pub fn new(kind: ErrorKind) -> Self {
        let diagnostic_info = DiagnosticInfo {
            help: kind.default_help(),
            error_code: format!("parsegraph::{}", kind.code_suffix()),
        };
        Self {
            kind,
            source_info: None,
            diagnostic_info,
        }
    }

    /// Attaches the text the error refers to and the span inside it.
    pub fn with_source(
        mut self,
        name: impl AsRef<str>,
        content: impl Into<String>,
        span: impl Into<SourceSpan>,
    ) -> Self {
        self.source_info = Some(SourceInfo {
            source: Arc::new(NamedSource::new(name, content.into())),
            primary_span: span.into(),
        });
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.diagnostic_info.help = Some(help.into());
        self
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    pub(crate) fn invalid_description(rule: &str, reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidDescription {
            rule: rule.into(),
            reason: reason.into(),
        })
    }

    pub(crate) fn unknown_rule(rule: &str) -> Self {
        Self::new(ErrorKind::UnknownRule { rule: rule.into() })
    }

    pub(crate) fn invalid_notation(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidNotation {
            reason: reason.into(),
        })
    }
}

impl From<ErrorKind> for GrammarError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl std::error::Error for GrammarError {}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)
    }
}

impl Diagnostic for GrammarError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(&self.diagnostic_info.error_code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diagnostic_info
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let info = self.source_info.as_ref()?;
        let label = LabeledSpan::new_with_span(
            Some(self.kind.primary_label().to_string()),
            info.primary_span,
        );
        Some(Box::new(std::iter::once(label)))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.source_info
            .as_ref()
            .map(|info| &*info.source as &dyn miette::SourceCode)
    }
}

/// Prints a GrammarError with full miette diagnostics.
pub fn print_error(error: GrammarError) {
    let report = miette::Report::new(error);
    eprintln!("{report:?}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_follows_kind() {
        let err = GrammarError::unknown_rule("expr");
        assert_eq!(err.diagnostic_info.error_code, "parsegraph::unknown_rule");
        assert_eq!(err.category(), ErrorCategory::Usage);
        assert_eq!(err.to_string(), "no rule named 'expr'");
    }

    #[test]
    fn test_unresolved_reference_has_help() {
        let err = GrammarError::new(ErrorKind::UnresolvedReference {
            rule: "list".into(),
            target: "item".into(),
        });
        let help = err.diagnostic_info.help.clone().unwrap();
        assert!(help.contains("'item'"));
        assert_eq!(err.category(), ErrorCategory::Grammar);
    }

    #[test]
    fn test_labels_only_with_source() {
        let err = GrammarError::invalid_notation("unexpected text");
        assert!(err.labels().is_none());
        let err = err.with_source("grammar", "{ definitions: ? }", 15..16);
        let labels: Vec<_> = err.labels().unwrap().collect();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].offset(), 15);
    }
}
