//! Error types for polyglot-migrate

use crate::tokens::Span;
use thiserror::Error;

/// The result type for migration operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building the engine or processing a statement.
///
/// Lexing and parsing errors are fatal for the containing statement only; the
/// transpile surface turns them into diagnostics. `Config` errors are raised
/// while the engine is assembled and abort construction.
#[derive(Debug, Error)]
pub enum Error {
    /// Error during tokenization
    #[error("Tokenization error at line {line}, column {column}: {message}")]
    Tokenize {
        message: String,
        line: usize,
        column: usize,
        offset: usize,
    },

    /// Invalid SQL syntax
    #[error("Syntax error at line {line}, column {column}: {message}")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
        offset: usize,
        /// What the parser would have accepted at this position
        expected: Vec<String>,
        /// The offending token text (empty at end of input)
        found: String,
    },

    /// Error during SQL generation
    #[error("Generation error: {0}")]
    Generate(String),

    /// Unsupported feature for the target dialect
    #[error("Unsupported: {feature} is not supported in {dialect}")]
    Unsupported { feature: String, dialect: String },

    /// Unknown dialect name
    #[error("Unknown dialect: {0}")]
    UnknownDialect(String),

    /// Invalid engine configuration: duplicate rule priority, contradictory grammar,
    /// malformed options file
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal usage)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a tokenization error at the given span
    pub fn tokenize(message: impl Into<String>, span: Span) -> Self {
        Error::Tokenize {
            message: message.into(),
            line: span.line,
            column: span.column,
            offset: span.start,
        }
    }

    /// Create a syntax error with the set of accepted alternatives
    pub fn syntax(
        message: impl Into<String>,
        span: Span,
        expected: Vec<String>,
        found: impl Into<String>,
    ) -> Self {
        Error::Syntax {
            message: message.into(),
            line: span.line,
            column: span.column,
            offset: span.start,
            expected,
            found: found.into(),
        }
    }

    /// Create a generation error
    pub fn generate(message: impl Into<String>) -> Self {
        Error::Generate(message.into())
    }

    /// Create an unsupported feature error
    pub fn unsupported(feature: impl Into<String>, dialect: impl Into<String>) -> Self {
        Error::Unsupported {
            feature: feature.into(),
            dialect: dialect.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal(message.into())
    }

    /// Source position of the error, when it has one
    pub fn span(&self) -> Option<Span> {
        match self {
            Error::Tokenize {
                line,
                column,
                offset,
                ..
            }
            | Error::Syntax {
                line,
                column,
                offset,
                ..
            } => Some(Span::new(*offset, *offset, *line, *column)),
            _ => None,
        }
    }

    /// Short error message without the position prefix
    pub fn message(&self) -> String {
        match self {
            Error::Tokenize { message, .. } | Error::Syntax { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_display() {
        let err = Error::syntax(
            "Expected expression",
            Span::new(14, 14, 1, 15),
            vec!["expression".to_string()],
            "",
        );
        assert_eq!(
            err.to_string(),
            "Syntax error at line 1, column 15: Expected expression"
        );
        assert_eq!(err.span().map(|s| s.start), Some(14));
        assert_eq!(err.message(), "Expected expression");
    }

    #[test]
    fn test_config_error_has_no_span() {
        let err = Error::config("duplicate priority");
        assert!(err.span().is_none());
        assert_eq!(err.to_string(), "Configuration error: duplicate priority");
    }
}
