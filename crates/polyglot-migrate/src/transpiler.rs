//! The transpilation surface
//!
//! An [`Engine`] owns the validated dialects and the rule catalog. It is
//! built once, never mutated and shared between threads. Each call to
//! [`Engine::transpile`] is an independent run:
//!
//! 1. the input is split into statements from a lazy token stream
//! 2. each statement is parsed, rewritten and emitted on its own, so a
//!    statement that fails to lex or parse only costs itself
//! 3. every diagnostic is collected into one [`Report`]
//!
//! Output text is always returned, even when some statements failed.

use crate::cache::{CacheKey, TranspileCache};
use crate::config::{EngineConfig, TranspileOptions};
use crate::dialects::{builtin_dialects, Dialect, DialectImpl, DialectRegistry, DialectType};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Report, Severity};
use crate::engine::{collect_extensions, rewrite_statement};
use crate::error::{Error, Result};
use crate::expressions::Statement;
use crate::parser::{Parser, StatementChunk};
use crate::rules::{RuleCatalog, RuleContext, RuleSet};
use crate::tokens::Span;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// What a caller asks the engine to do
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranspileRequest {
    pub sql: String,
    pub source: DialectType,
    #[serde(default = "default_target")]
    pub target: DialectType,
    /// Overrides the engine's default options when present
    #[serde(default)]
    pub options: Option<TranspileOptions>,
}

fn default_target() -> DialectType {
    DialectType::Databricks
}

impl TranspileRequest {
    /// Migrate `sql` from `source` to Databricks
    pub fn new(sql: impl Into<String>, source: DialectType) -> Self {
        Self {
            sql: sql.into(),
            source,
            target: default_target(),
            options: None,
        }
    }

    pub fn with_target(mut self, target: DialectType) -> Self {
        self.target = target;
        self
    }

    pub fn with_options(mut self, options: TranspileOptions) -> Self {
        self.options = Some(options);
        self
    }
}

/// How far one statement got
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementStatus {
    /// Emitted without mapping errors
    Translated,
    /// Emitted, but with constructs copied through that need manual work
    Partial,
    /// Could not be lexed, parsed or emitted; a placeholder comment stands in its place
    Failed,
}

/// The AST of a statement before and after rewriting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstSnapshot {
    pub parsed: serde_json::Value,
    pub rewritten: serde_json::Value,
}

/// Per-statement part of a [`TranspileResult`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementResult {
    pub index: usize,
    pub span: Span,
    /// Statement kind, e.g. `query` or `create_table`; absent when parsing failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub status: StatementStatus,
    /// Emitted text (the placeholder comment for failed statements)
    pub sql: String,
    /// Rules that changed the statement, in firing order
    pub rules: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<AstSnapshot>,
}

/// Counts over a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranspileSummary {
    pub statements: usize,
    pub translated: usize,
    pub partial: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
    pub rules_fired: usize,
}

/// Output of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranspileResult {
    pub source: DialectType,
    pub target: DialectType,
    /// Emitted statements joined by `;` and a newline
    pub sql: String,
    pub statements: Vec<StatementResult>,
    pub report: Report,
    pub summary: TranspileSummary,
    /// Cancelled before every statement was processed
    #[serde(default)]
    pub cancelled: bool,
}

impl TranspileResult {
    /// A result with output text and nothing else
    pub fn empty(source: DialectType, target: DialectType, sql: impl Into<String>) -> Self {
        Self {
            source,
            target,
            sql: sql.into(),
            statements: Vec::new(),
            report: Report::default(),
            summary: TranspileSummary::default(),
            cancelled: false,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Cooperative cancellation, checked between statements
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// A supported migration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialectPair {
    pub source: DialectType,
    pub target: DialectType,
}

/// Answer to [`Engine::status`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineStatus {
    pub version: String,
    pub pairs: Vec<DialectPair>,
    pub rule_count: usize,
}

/// Dialects plus rule catalog. Immutable once built.
#[derive(Debug)]
pub struct Engine {
    registry: DialectRegistry,
    catalog: RuleCatalog,
    config: EngineConfig,
    cache: Option<TranspileCache>,
}

impl Engine {
    /// Engine with every built-in dialect and default configuration
    pub fn builtin() -> Result<Self> {
        Self::from_config(EngineConfig::default())
    }

    pub fn from_config(config: EngineConfig) -> Result<Self> {
        Self::with_dialects(&builtin_dialects(), config)
    }

    /// Engine over an explicit set of dialect implementations. Grammar
    /// contradictions and rule priority conflicts are reported here.
    pub fn with_dialects(dialects: &[Box<dyn DialectImpl>], config: EngineConfig) -> Result<Self> {
        let registry = DialectRegistry::from_impls(dialects)?;
        let catalog = RuleCatalog::builtin(dialects)?;
        let cache = (config.cache_capacity > 0).then(|| TranspileCache::new(config.cache_capacity));
        debug!(rules = catalog.len(), cache = config.cache_capacity, "engine built");
        Ok(Self {
            registry,
            catalog,
            config,
            cache,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    pub fn dialect(&self, dialect: DialectType) -> Result<&Dialect> {
        self.registry.get(dialect)
    }

    pub fn cache(&self) -> Option<&TranspileCache> {
        self.cache.as_ref()
    }

    /// Version and supported migrations
    pub fn status(&self) -> EngineStatus {
        let pairs = DialectType::SOURCES
            .into_iter()
            .filter(|source| self.registry.contains(*source))
            .flat_map(|source| {
                DialectType::TARGETS
                    .into_iter()
                    .filter(|target| self.registry.contains(*target))
                    .map(move |target| DialectPair { source, target })
            })
            .collect();
        EngineStatus {
            version: env!("CARGO_PKG_VERSION").to_string(),
            pairs,
            rule_count: self.catalog.len(),
        }
    }

    /// A request for the configured default source dialect
    pub fn request(&self, sql: impl Into<String>) -> Result<TranspileRequest> {
        let source = self
            .config
            .source
            .ok_or_else(|| Error::config("no source dialect configured"))?;
        Ok(TranspileRequest::new(sql, source).with_options(self.config.options.clone()))
    }

    /// Options a request runs with
    pub fn options_for<'a>(&'a self, request: &'a TranspileRequest) -> &'a TranspileOptions {
        request.options.as_ref().unwrap_or(&self.config.options)
    }

    /// Run a request. Only an unsupported migration is an `Err`; problems with
    /// the SQL itself are diagnostics in the result.
    pub fn transpile(&self, request: &TranspileRequest) -> Result<TranspileResult> {
        let key = self
            .cache
            .as_ref()
            .map(|_| CacheKey::new(request.source, request.target, &request.sql, self.options_for(request)));
        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            if let Some(hit) = cache.get(key) {
                debug!(source = %request.source, "cache hit");
                return Ok(hit.as_ref().clone());
            }
        }
        let result = self.transpile_with_cancel(request, &CancellationToken::new())?;
        if let (Some(cache), Some(key)) = (&self.cache, key) {
            cache.insert(key, Arc::new(result.clone()));
        }
        Ok(result)
    }

    /// Run a request, stopping between statements once `cancel` is set.
    /// Statements finished before that stay in the result.
    #[instrument(skip(self, request, cancel), fields(source = %request.source, target = %request.target, bytes = request.sql.len()))]
    pub fn transpile_with_cancel(&self, request: &TranspileRequest, cancel: &CancellationToken) -> Result<TranspileResult> {
        self.check_pair(request.source, request.target)?;
        let source = self.registry.get(request.source)?;
        let target = self.registry.get(request.target)?;
        let options = self.options_for(request);
        let rules = self.catalog.select(request.source, request.target);
        let ctx = RuleContext::new(request.source, request.target, options);
        let run = Run {
            sql: &request.sql,
            source,
            target,
            rules: &rules,
            ctx,
            options,
        };

        let mut statements = Vec::new();
        let mut diagnostics = Vec::new();
        let mut cancelled = false;
        for (index, chunk) in source.split(&request.sql).enumerate() {
            if cancel.is_cancelled() {
                cancelled = true;
                diagnostics.push(
                    Diagnostic::new(DiagnosticKind::Info, "CANCELLED", format!("run cancelled before statement {}", index + 1))
                        .with_span(chunk.span)
                        .with_statement(index),
                );
                break;
            }
            let (statement, mut found) = run.statement(index, chunk);
            statements.push(statement);
            diagnostics.append(&mut found);
        }

        let sql = join_statements(&statements);
        let rules_fired: usize = statements.iter().map(|s| s.rules.len()).sum();
        if !cancelled
            && rules_fired == 0
            && diagnostics.is_empty()
            && !statements.is_empty()
            && request.source != request.target
            && normalized(&request.sql) == normalized(&sql)
        {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::Info,
                "NOT_REQUIRED",
                format!("input is already valid {} SQL; no transpilation required", request.target),
            ));
        }

        let report = Report::aggregate(diagnostics);
        let count = |status| statements.iter().filter(|s| s.status == status).count();
        let summary = TranspileSummary {
            statements: statements.len(),
            translated: count(StatementStatus::Translated),
            partial: count(StatementStatus::Partial),
            failed: count(StatementStatus::Failed),
            errors: report.error_count,
            warnings: report.warning_count,
            infos: report.info_count,
            rules_fired,
        };
        debug!(statements = summary.statements, failed = summary.failed, errors = summary.errors, "run finished");
        Ok(TranspileResult {
            source: request.source,
            target: request.target,
            sql,
            statements,
            report,
            summary,
            cancelled,
        })
    }

    fn check_pair(&self, source: DialectType, target: DialectType) -> Result<()> {
        if source == target || DialectType::TARGETS.contains(&target) {
            return Ok(());
        }
        Err(Error::unsupported(
            format!("migration from {source} to {target}"),
            "this engine",
        ))
    }
}

/// Everything one run shares between its statements
struct Run<'a> {
    sql: &'a str,
    source: &'a Dialect,
    target: &'a Dialect,
    rules: &'a RuleSet<'a>,
    ctx: RuleContext<'a>,
    options: &'a TranspileOptions,
}

impl Run<'_> {
    fn statement(&self, index: usize, chunk: StatementChunk) -> (StatementResult, Vec<Diagnostic>) {
        let span = chunk.span;
        let comments = if self.options.preserve_comments {
            chunk.comments()
        } else {
            Vec::new()
        };
        let parsed = chunk
            .into_tokens()
            .and_then(|tokens| Parser::new(tokens, self.sql, self.source.grammar()).parse_statement());
        let mut statement = match parsed {
            Ok(statement) => statement,
            Err(err) => return self.failed(index, span, &err, None),
        };

        let before = self.options.snapshots.then(|| snapshot_value(&statement, index));
        let rewrite = rewrite_statement(&mut statement, self.rules, self.ctx, index);
        let mut diagnostics = rewrite.diagnostics;
        if self.ctx.source != self.ctx.target {
            diagnostics.extend(collect_extensions(&mut statement, index));
        }

        let emitted = match self.target.generate(&statement, &self.options.format) {
            Ok(sql) => sql,
            Err(err) => {
                let (result, mut failed) = self.failed(index, span, &err, Some(statement.kind_name()));
                diagnostics.append(&mut failed);
                return (result, diagnostics);
            }
        };

        let has_errors = diagnostics.iter().any(|d| d.severity == Severity::Error);
        if !self.options.skip_validation && !has_errors {
            if let Err(err) = self.target.parse(&emitted) {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::SemanticRiskWarning,
                        "VALIDATION_FAILED",
                        format!("output does not parse as {} SQL: {}", self.target.dialect_type(), err.message()),
                    )
                    .with_span(span)
                    .with_statement(index)
                    .with_hint("review the emitted statement by hand"),
                );
            }
        }

        let sql = with_comments(&comments, emitted);
        let result = StatementResult {
            index,
            span,
            kind: Some(statement.kind_name().to_string()),
            status: if has_errors {
                StatementStatus::Partial
            } else {
                StatementStatus::Translated
            },
            sql,
            rules: rewrite.fired.iter().map(|r| r.to_string()).collect(),
            snapshot: before.map(|parsed| AstSnapshot {
                parsed,
                rewritten: snapshot_value(&statement, index),
            }),
        };
        (result, diagnostics)
    }

    fn failed(
        &self,
        index: usize,
        span: Span,
        err: &Error,
        kind: Option<&str>,
    ) -> (StatementResult, Vec<Diagnostic>) {
        warn!(statement = index, error = %err, "statement failed");
        let mut diagnostic = Diagnostic::from_error(err).with_statement(index);
        if diagnostic.span == Span::default() {
            diagnostic.span = span;
        }
        let result = StatementResult {
            index,
            span,
            kind: kind.map(str::to_string),
            status: StatementStatus::Failed,
            sql: placeholder(index, err),
            rules: Vec::new(),
            snapshot: None,
        };
        (result, vec![diagnostic])
    }
}

fn snapshot_value(statement: &Statement, index: usize) -> serde_json::Value {
    match serde_json::to_value(statement) {
        Ok(value) => value,
        Err(e) => {
            debug!(statement = index, error = %e, "snapshot serialization failed");
            serde_json::Value::Null
        }
    }
}

/// Comment emitted in place of a statement that could not be translated
fn placeholder(index: usize, err: &Error) -> String {
    let message = err.to_string().replace("*/", "* /");
    format!("/* statement {} not translated: {message} */", index + 1)
}

fn with_comments(comments: &[String], sql: String) -> String {
    if comments.is_empty() {
        return sql;
    }
    let mut out = String::new();
    for comment in comments {
        match comment.strip_prefix('#') {
            Some(rest) => out.push_str(&format!("--{rest}")),
            None => out.push_str(comment),
        }
        out.push('\n');
    }
    out.push_str(&sql);
    out
}

/// Statements joined by `;\n`; placeholder comments are not terminated
fn join_statements(statements: &[StatementResult]) -> String {
    let mut out = String::new();
    for (i, statement) in statements.iter().enumerate() {
        out.push_str(&statement.sql);
        if i + 1 < statements.len() {
            match statement.status {
                StatementStatus::Failed => out.push('\n'),
                _ => out.push_str(";\n"),
            }
        }
    }
    out
}

/// Text with whitespace, case and statement terminators ignored
fn normalized(sql: &str) -> String {
    sql.chars()
        .filter(|c| !c.is_whitespace() && *c != ';')
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{codes, convert};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_statements_are_isolated() {
        let result = convert(DialectType::SqlServer, "SELECT 1; SELECT a FROM; SELECT 3");
        assert_eq!(result.summary.statements, 3);
        assert_eq!(result.summary.failed, 1);
        assert_eq!(result.statements[1].status, StatementStatus::Failed);
        assert!(result.sql.starts_with("SELECT 1;\n/* statement 2 not translated:"));
        assert!(result.sql.ends_with("*/\nSELECT 3"));
        assert_eq!(result.report.error_count, 1);
        assert_eq!(result.report.entries[0].statement, 1);
    }

    #[test]
    fn test_unterminated_string_is_a_lex_error() {
        let result = convert(DialectType::Oracle, "SELECT 'abc FROM t");
        assert_eq!(codes(&result), vec!["LEX_ERROR"]);
        assert_eq!(result.report.entries[0].severity, Severity::Error);
    }

    #[test]
    fn test_not_required_when_nothing_changes() {
        let result = convert(DialectType::Hive, "select a,  b from t;");
        assert_eq!(result.sql, "SELECT a, b FROM t");
        assert_eq!(codes(&result), vec!["NOT_REQUIRED"]);
    }

    #[test]
    fn test_cancelled_run_keeps_finished_statements() {
        let engine = Engine::builtin().unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let result = engine
            .transpile_with_cancel(&TranspileRequest::new("SELECT 1; SELECT 2", DialectType::MySQL), &token)
            .unwrap();
        assert!(result.cancelled);
        assert!(result.statements.is_empty());
        assert_eq!(codes(&result), vec!["CANCELLED"]);
    }

    #[test]
    fn test_unsupported_pair_is_an_error() {
        let engine = Engine::builtin().unwrap();
        let request = TranspileRequest::new("SELECT 1", DialectType::MySQL).with_target(DialectType::Oracle);
        assert!(matches!(engine.transpile(&request), Err(Error::Unsupported { .. })));
    }

    #[test]
    fn test_status_lists_every_source() {
        let status = Engine::builtin().unwrap().status();
        assert_eq!(status.pairs.len(), DialectType::SOURCES.len());
        assert!(status.pairs.iter().all(|p| p.target == DialectType::Databricks));
        assert_eq!(status.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_snapshots_and_comments() {
        let engine = Engine::builtin().unwrap();
        let options = TranspileOptions {
            snapshots: true,
            preserve_comments: true,
            ..TranspileOptions::default()
        };
        let request = TranspileRequest::new("# totals\nSELECT IFNULL(a, 0) FROM t", DialectType::MySQL).with_options(options);
        let result = engine.transpile(&request).unwrap();
        assert_eq!(result.sql, "-- totals\nSELECT COALESCE(a, 0) FROM t");
        let snapshot = result.statements[0].snapshot.as_ref().unwrap();
        assert_ne!(snapshot.parsed, snapshot.rewritten);
        assert!(snapshot.parsed.is_object() && snapshot.rewritten.is_object());
    }

    #[test]
    fn test_cache_returns_the_same_result() {
        let engine = Engine::builtin().unwrap();
        let request = TranspileRequest::new("SELECT NVL(a, b) FROM t", DialectType::Oracle);
        let first = engine.transpile(&request).unwrap();
        assert_eq!(engine.cache().map(TranspileCache::len), Some(1));
        let second = engine.transpile(&request).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_request_uses_configured_source() {
        let engine = Engine::from_config(EngineConfig {
            source: Some(DialectType::Teradata),
            cache_capacity: 0,
            ..EngineConfig::default()
        })
        .unwrap();
        assert!(engine.cache().is_none());
        let result = engine.transpile(&engine.request("SEL a FROM t").unwrap()).unwrap();
        assert_eq!(result.sql, "SELECT a FROM t");
        assert!(Engine::builtin().unwrap().request("SELECT 1").is_err());
    }
}
