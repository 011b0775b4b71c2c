//! Diagnostics and reports
//!
//! Every phase reports problems as [`Diagnostic`]s. A diagnostic's severity and
//! category follow from its [`DiagnosticKind`]; the `code` is a stable
//! upper-snake identifier (`UNSUPPORTED_FUNCTION`, `PRECISION_NARROWED`, ...)
//! suitable for grouping across a project.

use crate::error::Error;
use crate::tokens::Span;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Parse,
    Mapping,
    SemanticRisk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    LexError,
    ParseError,
    MappingError,
    PrecisionWarning,
    SemanticRiskWarning,
    Info,
}

impl DiagnosticKind {
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::LexError | DiagnosticKind::ParseError | DiagnosticKind::MappingError => {
                Severity::Error
            }
            DiagnosticKind::PrecisionWarning | DiagnosticKind::SemanticRiskWarning => Severity::Warning,
            DiagnosticKind::Info => Severity::Info,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            DiagnosticKind::LexError | DiagnosticKind::ParseError => Category::Parse,
            DiagnosticKind::MappingError | DiagnosticKind::Info => Category::Mapping,
            DiagnosticKind::PrecisionWarning | DiagnosticKind::SemanticRiskWarning => Category::SemanticRisk,
        }
    }
}

/// A single finding about the input or its translation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub category: Category,
    pub kind: DiagnosticKind,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    pub span: Span,
    /// Zero-based index of the statement within its input
    pub statement: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Rewrite rule that produced the finding
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: kind.severity(),
            category: kind.category(),
            kind,
            code: code.into(),
            message: message.into(),
            hint: None,
            span: Span::default(),
            statement: 0,
            file: None,
            rule: None,
        }
    }

    /// Diagnostic for a lexing or parsing failure
    pub fn from_error(err: &Error) -> Self {
        let (kind, code) = match err {
            Error::Tokenize { .. } => (DiagnosticKind::LexError, "LEX_ERROR"),
            Error::Syntax { .. } => (DiagnosticKind::ParseError, "PARSE_ERROR"),
            _ => (DiagnosticKind::MappingError, "INTERNAL_ERROR"),
        };
        let mut diagnostic = Diagnostic::new(kind, code, err.message());
        if let Some(span) = err.span() {
            diagnostic.span = span;
        }
        if let Error::Syntax { expected, found, .. } = err {
            if !expected.is_empty() {
                let found = if found.is_empty() { "end of input" } else { found.as_str() };
                diagnostic.hint = Some(format!("expected {}, found {found}", expected.join(" or ")));
            }
        }
        diagnostic
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_statement(mut self, statement: usize) -> Self {
        self.statement = statement;
        self
    }

    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}

/// Diagnostics of one input, ordered by source position
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub error_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
    pub entries: Vec<Diagnostic>,
}

impl Report {
    /// Count and order diagnostics. Entries at the same offset keep their
    /// relative order.
    pub fn aggregate(mut entries: Vec<Diagnostic>) -> Self {
        entries.sort_by_key(|d| d.span.start);
        let count = |severity| entries.iter().filter(|d| d.severity == severity).count();
        Self {
            error_count: count(Severity::Error),
            warning_count: count(Severity::Warning),
            info_count: count(Severity::Info),
            entries,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries with the given code
    pub fn with_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.entries.iter().filter(move |d| d.code == code)
    }

    /// Entry counts per code
    pub fn counts_by_code(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.entries {
            *counts.entry(entry.code.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Plain-text log, one entry per line with an indented hint
    pub fn render_log(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            if let Some(file) = &entry.file {
                let _ = write!(out, "{file}: ");
            }
            let _ = write!(
                out,
                "[{}] {} at line {}, column {} (statement {}): {}",
                entry.severity.label(),
                entry.code,
                entry.span.line,
                entry.span.column,
                entry.statement + 1,
                entry.message
            );
            if let Some(rule) = &entry.rule {
                let _ = write!(out, " [{rule}]");
            }
            out.push('\n');
            if let Some(hint) = &entry.hint {
                let _ = writeln!(out, "    hint: {hint}");
            }
        }
        let _ = writeln!(
            out,
            "{} error(s), {} warning(s), {} info",
            self.error_count, self.warning_count, self.info_count
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at(kind: DiagnosticKind, code: &str, offset: usize) -> Diagnostic {
        Diagnostic::new(kind, code, code.to_lowercase()).with_span(Span::new(offset, offset + 1, 1, offset + 1))
    }

    #[test]
    fn test_kind_determines_severity_and_category() {
        let d = Diagnostic::new(DiagnosticKind::PrecisionWarning, "PRECISION_NARROWED", "x");
        assert_eq!(d.severity, Severity::Warning);
        assert_eq!(d.category, Category::SemanticRisk);
        assert_eq!(DiagnosticKind::MappingError.category(), Category::Mapping);
        assert_eq!(DiagnosticKind::LexError.severity(), Severity::Error);
    }

    #[test]
    fn test_aggregate_orders_stably_by_offset() {
        let report = Report::aggregate(vec![
            at(DiagnosticKind::Info, "B", 10),
            at(DiagnosticKind::MappingError, "A", 3),
            at(DiagnosticKind::SemanticRiskWarning, "C", 10),
        ]);
        let codes: Vec<&str> = report.entries.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(codes, vec!["A", "B", "C"]);
        assert_eq!((report.error_count, report.warning_count, report.info_count), (1, 1, 1));
        assert!(report.has_errors());
    }

    #[test]
    fn test_syntax_error_becomes_parse_diagnostic() {
        let err = Error::syntax("Expected query", Span::new(14, 14, 1, 15), vec!["SELECT".into(), "(".into()], "");
        let d = Diagnostic::from_error(&err);
        assert_eq!(d.kind, DiagnosticKind::ParseError);
        assert_eq!(d.code, "PARSE_ERROR");
        assert_eq!(d.span.start, 14);
        assert_eq!(d.hint.as_deref(), Some("expected SELECT or (, found end of input"));
    }

    #[test]
    fn test_render_log() {
        let report = Report::aggregate(vec![at(DiagnosticKind::MappingError, "UNSUPPORTED_FUNCTION", 0)
            .with_hint("rewrite by hand")
            .with_file("etl/load.sql")
            .with_statement(1)]);
        assert_eq!(
            report.render_log(),
            "etl/load.sql: [ERROR] UNSUPPORTED_FUNCTION at line 1, column 1 (statement 2): unsupported_function\n    hint: rewrite by hand\n1 error(s), 0 warning(s), 0 info\n"
        );
    }

    #[test]
    fn test_json_shape() {
        let d = at(DiagnosticKind::SemanticRiskWarning, "NULL_COMPARISON", 4);
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["category"], "semantic-risk");
        assert_eq!(json["kind"], "SemanticRiskWarning");
        assert!(json.get("hint").is_none());
    }
}
