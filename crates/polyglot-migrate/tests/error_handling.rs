//! Error Handling Tests
//!
//! Malformed input must cost only the statement it appears in, and every
//! problem must come back as a positioned diagnostic instead of an `Err`.

use polyglot_migrate::dialects::{DialectImpl, HiveDialect, OracleDialect};
use polyglot_migrate::{
    transpile, Category, DiagnosticKind, DialectType, Engine, EngineConfig, Error, Severity, StatementStatus,
};
use pretty_assertions::assert_eq;

// ============================================================================
// Syntax errors
// ============================================================================

mod syntax_errors {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_truncated_derived_table() {
        let result = transpile("SELECT * FROM (", DialectType::SqlServer).unwrap();
        assert_eq!(result.report.entries.len(), 1);
        let entry = &result.report.entries[0];
        assert_eq!(entry.kind, DiagnosticKind::ParseError);
        assert_eq!(entry.category, Category::Parse);
        assert_eq!(entry.severity, Severity::Error);
        assert_eq!(entry.code, "PARSE_ERROR");
        assert!(entry.span.start >= 14, "error reported at {}", entry.span.start);
        assert_eq!(entry.span.line, 1);

        assert_eq!(result.statements.len(), 1);
        assert_eq!(result.statements[0].status, StatementStatus::Failed);
        assert!(result.statements[0].kind.is_none());
        assert!(result.sql.starts_with("/* statement 1 not translated"));
    }

    #[test]
    fn test_hint_lists_expected_tokens() {
        let result = transpile("SELECT a FROM t WHERE", DialectType::Oracle).unwrap();
        let entry = &result.report.entries[0];
        assert_eq!(entry.code, "PARSE_ERROR");
        let hint = entry.hint.as_deref().unwrap_or_default();
        assert!(hint.starts_with("expected "), "hint was {hint:?}");
        assert!(hint.ends_with("found end of input"), "hint was {hint:?}");
    }

    #[test]
    fn test_unbalanced_parentheses() {
        for sql in ["SELECT (1 + 2", "SELECT ((a) FROM t", "SELECT COALESCE(a, b FROM t"] {
            let result = transpile(sql, DialectType::PostgreSQL).unwrap();
            assert_eq!(result.report.error_count, 1, "{sql}");
            assert_eq!(result.summary.failed, 1, "{sql}");
        }
    }

    #[test]
    fn test_unterminated_string_is_a_lex_error() {
        let result = transpile("SELECT 'open FROM t", DialectType::Snowflake).unwrap();
        assert_eq!(result.report.entries.len(), 1);
        assert_eq!(result.report.entries[0].kind, DiagnosticKind::LexError);
        assert_eq!(result.report.entries[0].span.start, 7);
    }
}

// ============================================================================
// Statement isolation
// ============================================================================

mod statement_isolation {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_one_bad_statement_among_many() {
        let sql = "SELECT TOP 1 a FROM t;\nSELECT b FROM WHERE;\nSELECT ISNULL(c, 0) FROM u;\nSELECT d FROM v";
        let result = transpile(sql, DialectType::SqlServer).unwrap();
        assert_eq!(result.summary.statements, 4);
        assert_eq!(result.summary.failed, 1);
        assert_eq!(result.summary.translated, 3);
        assert_eq!(result.report.error_count, 1);
        assert_eq!(result.report.entries[0].statement, 1);
        assert_eq!(result.report.entries[0].span.line, 2);

        let lines: Vec<&str> = result.sql.lines().collect();
        assert_eq!(lines[0], "SELECT a FROM t LIMIT 1;");
        assert!(lines[1].starts_with("/* statement 2 not translated"));
        assert_eq!(lines[2], "SELECT COALESCE(c, 0) FROM u;");
        assert_eq!(lines[3], "SELECT d FROM v");
    }

    #[test]
    fn test_unclosed_paren_or_case_stays_in_its_statement() {
        let result = transpile("SELECT 1; SELECT * FROM (; SELECT 3", DialectType::Snowflake).unwrap();
        assert_eq!(result.summary.statements, 3);
        assert_eq!(result.summary.failed, 1);
        assert!(result.sql.starts_with("SELECT 1;"), "{}", result.sql);
        assert!(result.sql.ends_with("SELECT 3"), "{}", result.sql);

        let result = transpile("SELECT CASE WHEN a = 1 THEN 2 FROM t; SELECT 3 FROM dual", DialectType::Oracle).unwrap();
        assert_eq!(result.summary.statements, 2);
        assert_eq!(result.summary.failed, 1);
        assert!(result.sql.ends_with("SELECT 3"), "{}", result.sql);
    }

    #[test]
    fn test_lex_error_does_not_poison_later_statements() {
        let sql = "SELECT \"unterminated FROM t;\nSELECT 1";
        let result = transpile(sql, DialectType::PostgreSQL).unwrap();
        assert!(result.summary.failed >= 1);
        assert!(result.report.entries.iter().any(|d| d.kind == DiagnosticKind::LexError));
    }

    #[test]
    fn test_mapping_errors_keep_the_statement() {
        let result = transpile("SELECT HASHROW(a) FROM t; SELECT 1", DialectType::Teradata).unwrap();
        assert_eq!(result.statements[0].status, StatementStatus::Partial);
        assert_eq!(result.statements[1].status, StatementStatus::Translated);
        assert_eq!(result.sql, "SELECT HASHROW(a) FROM t;\nSELECT 1");
        assert_eq!(result.report.entries[0].kind, DiagnosticKind::MappingError);
        assert_eq!(result.report.entries[0].code, "UNSUPPORTED_FUNCTION");
    }
}

// ============================================================================
// Diagnostics ordering
// ============================================================================

mod diagnostics_ordering {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_entries_sorted_by_position() {
        let sql = "SELECT a FROM t WHERE b = NULL;\n\
                   SELECT HASHROW(x), y FROM u WHERE z = NULL;\n\
                   SELECT FROM;\n\
                   SELECT STRTOK(s, ',', 2) FROM w";
        let result = transpile(sql, DialectType::Teradata).unwrap();
        assert!(result.report.entries.len() >= 4);
        let offsets: Vec<usize> = result.report.entries.iter().map(|d| d.span.start).collect();
        assert!(offsets.windows(2).all(|w| w[0] <= w[1]), "{offsets:?}");
        let statements: Vec<usize> = result.report.entries.iter().map(|d| d.statement).collect();
        assert!(statements.windows(2).all(|w| w[0] <= w[1]), "{statements:?}");
    }

    #[test]
    fn test_counts_match_entries() {
        let result = transpile("SELECT a FROM t WHERE b = NULL; SELECT FROM", DialectType::Oracle).unwrap();
        let report = &result.report;
        assert_eq!(
            report.error_count + report.warning_count + report.info_count,
            report.entries.len()
        );
        assert_eq!(result.summary.errors, report.error_count);
        assert_eq!(result.summary.warnings, report.warning_count);
    }

    #[test]
    fn test_render_log() {
        let result = transpile("SELECT a FROM t WHERE b = NULL", DialectType::SqlServer).unwrap();
        let log = result.report.render_log();
        assert!(log.contains("[WARNING] NULL_COMPARISON at line 1"), "{log}");
        assert!(log.trim_end().ends_with("0 error(s), 1 warning(s), 0 info"), "{log}");
    }
}

// ============================================================================
// Engine configuration
// ============================================================================

mod engine_config {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_duplicate_dialect_is_a_config_error() {
        let dialects: Vec<Box<dyn DialectImpl>> = vec![Box::new(OracleDialect), Box::new(OracleDialect)];
        let err = Engine::with_dialects(&dialects, EngineConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_missing_dialect_is_unsupported() {
        let dialects: Vec<Box<dyn DialectImpl>> = vec![Box::new(HiveDialect)];
        let engine = Engine::with_dialects(&dialects, EngineConfig::default()).unwrap();
        let request = polyglot_migrate::TranspileRequest::new("SELECT 1", DialectType::Hive);
        assert!(matches!(engine.transpile(&request), Err(Error::Unsupported { .. })));
    }

    #[test]
    fn test_unknown_dialect_name() {
        assert!(matches!("informix".parse::<DialectType>(), Err(Error::UnknownDialect(_))));
    }

    #[test]
    fn test_malformed_config_file() {
        let err = EngineConfig::from_toml_str("cache_capacity = -1").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
