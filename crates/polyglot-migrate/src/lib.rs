//! Polyglot Migrate - migrate warehouse SQL to Databricks SQL
//!
//! This library tokenizes and parses SQL written for Snowflake, Teradata,
//! Oracle, SQL Server, Azure Synapse, PostgreSQL, Redshift, MySQL, BigQuery
//! and Hive into a dialect-neutral AST, applies a catalog of rewrite rules and
//! emits Databricks SQL together with a report of everything that could not
//! be carried over exactly.
//!
//! # Architecture
//!
//! The library follows a pipeline architecture:
//! 1. **Tokenizer** - Converts SQL text into a lazy token stream
//! 2. **Parser** - Builds the AST of one statement from its tokens
//! 3. **Rule engine** - Rewrites the AST bottom-up with the rules of the migration
//! 4. **Generator** - Renders the AST as Databricks SQL
//! 5. **Diagnostics** - Collects findings from every phase into one report
//!
//! ```
//! use polyglot_migrate::{transpile, DialectType};
//!
//! let result = transpile("SELECT TOP 10 * FROM customers", DialectType::SqlServer).unwrap();
//! assert_eq!(result.sql, "SELECT * FROM customers LIMIT 10");
//! assert!(result.report.is_empty());
//! ```

pub mod batch;
pub mod cache;
pub mod config;
pub mod diagnostics;
pub mod dialects;
pub mod engine;
pub mod error;
pub mod expressions;
pub mod generator;
pub mod grammar;
pub mod parser;
pub mod rules;
pub mod scope;
pub mod time;
pub mod tokens;
pub mod transpiler;
pub mod traversal;
pub mod trie;

pub use batch::{analyze_project, Complexity, FileResult, ProjectAnalysis, ProjectSummary, SourceFile};
pub use config::{DateFormatPreference, EngineConfig, SemiStructuredMapping, TranspileOptions};
pub use diagnostics::{Category, Diagnostic, DiagnosticKind, Report, Severity};
pub use dialects::{Dialect, DialectImpl, DialectRegistry, DialectType};
pub use error::{Error, Result};
pub use expressions::{DataType, Expression, Statement};
pub use generator::{FormatOptions, IdentifierQuoting, KeywordCase};
pub use rules::{DialectMatch, Finding, RewriteRule, RuleCatalog, RuleContext, RuleOutcome};
pub use tokens::{Span, Token, TokenType, Tokenizer};
pub use transpiler::{
    CancellationToken, DialectPair, Engine, EngineStatus, StatementResult, StatementStatus, TranspileRequest,
    TranspileResult, TranspileSummary,
};

use once_cell::sync::Lazy;

static DEFAULT_ENGINE: Lazy<Result<Engine>> = Lazy::new(Engine::builtin);

/// The shared engine with every built-in dialect and default options
pub fn default_engine() -> Result<&'static Engine> {
    DEFAULT_ENGINE
        .as_ref()
        .map_err(|e| Error::config(format!("built-in engine failed to load: {e}")))
}

/// Migrate `sql` from `source` to Databricks with default options.
///
/// Problems in the SQL are reported in the result; only a broken engine
/// configuration is an `Err`.
pub fn transpile(sql: &str, source: DialectType) -> Result<TranspileResult> {
    default_engine()?.transpile(&TranspileRequest::new(sql, source))
}

/// Parse `sql` as `dialect` without rewriting anything
pub fn parse(sql: &str, dialect: DialectType) -> Result<Vec<Statement>> {
    default_engine()?.dialect(dialect)?.parse(sql)
}
