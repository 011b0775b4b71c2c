//! Project Analysis Tests
//!
//! Batch runs over several files, the result cache, cancellation and the
//! serialized form of results.

use polyglot_migrate::{
    analyze_project, Category, CancellationToken, Complexity, DialectPair, DialectType, Engine, EngineConfig,
    SourceFile, TranspileRequest, TranspileResult,
};
use pretty_assertions::assert_eq;

fn engine_with(config: EngineConfig) -> Engine {
    Engine::from_config(config).unwrap()
}

// ============================================================================
// Batch analysis
// ============================================================================

mod batch {
    use super::*;
    use pretty_assertions::assert_eq;

    fn teradata_project() -> Vec<SourceFile> {
        vec![
            SourceFile::new("etl/load.sql", "SEL a, b FROM stage;\nDEL FROM stage WHERE a IS NULL"),
            SourceFile::new("etl/hash.sql", "SEL HASHROW(id), HASHBUCKET(HASHROW(id)) FROM t"),
            SourceFile::new("etl/broken.sql", "SEL FROM;\nSEL ( FROM t"),
            SourceFile::new("etl/split.sql", "SEL STRTOK(path, '/', 2) FROM t"),
        ]
    }

    #[test]
    fn test_complexity_per_file() {
        let engine = engine_with(EngineConfig::default());
        let analysis = analyze_project(&engine, &teradata_project(), DialectType::Teradata).unwrap();
        let complexity: Vec<Complexity> = analysis.files.iter().map(|f| f.complexity).collect();
        assert_eq!(
            complexity,
            vec![Complexity::Low, Complexity::High, Complexity::VeryHigh, Complexity::Medium]
        );
        assert_eq!(analysis.files[0].review_minutes, 0);
    }

    #[test]
    fn test_unmappable_totals() {
        let engine = engine_with(EngineConfig::default());
        let analysis = analyze_project(&engine, &teradata_project(), DialectType::Teradata).unwrap();
        let summary = &analysis.summary;
        assert_eq!(summary.source, Some(DialectType::Teradata));
        assert_eq!(summary.files, 4);
        assert_eq!(summary.statements, 6);
        assert_eq!(summary.failed_statements, 2);
        assert_eq!(summary.unmappable_by_category.get(&Category::Parse), Some(&2));
        assert_eq!(summary.unmappable_by_code.get("UNSUPPORTED_FUNCTION"), Some(&3));
        assert_eq!(summary.files_by_complexity.values().sum::<usize>(), 4);
        let per_file: u32 = analysis.files.iter().map(|f| f.review_minutes).sum();
        assert_eq!(summary.review_minutes, per_file);
    }

    #[test]
    fn test_diagnostics_name_their_file() {
        let engine = engine_with(EngineConfig::default());
        let analysis = analyze_project(&engine, &teradata_project(), DialectType::Teradata).unwrap();
        for file in &analysis.files {
            assert!(file.result.report.entries.iter().all(|d| d.file.as_deref() == Some(file.path.as_str())));
        }
    }

    #[test]
    fn test_many_files_on_few_workers() {
        let files: Vec<SourceFile> = (0..40)
            .map(|i| SourceFile::new(format!("q{i}.sql"), format!("SELECT TOP {} c{i} FROM t{i}", i + 1)))
            .collect();
        let engine = engine_with(EngineConfig {
            workers: 3,
            ..EngineConfig::default()
        });
        let analysis = analyze_project(&engine, &files, DialectType::SqlServer).unwrap();
        assert_eq!(analysis.files.len(), 40);
        for (i, file) in analysis.files.iter().enumerate() {
            assert_eq!(file.path, format!("q{i}.sql"));
            assert_eq!(file.result.sql, format!("SELECT c{i} FROM t{i} LIMIT {}", i + 1));
        }
    }

    #[test]
    fn test_unsupported_source_fails_the_batch() {
        let dialects: Vec<Box<dyn polyglot_migrate::DialectImpl>> = vec![
            Box::new(polyglot_migrate::dialects::MySQLDialect),
            Box::new(polyglot_migrate::dialects::DatabricksDialect),
        ];
        let engine = Engine::with_dialects(&dialects, EngineConfig::default()).unwrap();
        let files = [SourceFile::new("a.sql", "SELECT 1")];
        assert!(analyze_project(&engine, &files, DialectType::Oracle).is_err());
    }
}

// ============================================================================
// Cache
// ============================================================================

mod cache {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_repeated_request_is_served_from_cache() {
        let engine = engine_with(EngineConfig {
            cache_capacity: 2,
            ..EngineConfig::default()
        });
        let request = TranspileRequest::new("SELECT NVL(a, 0) FROM t", DialectType::Oracle);
        let first = engine.transpile(&request).unwrap();
        assert_eq!(engine.cache().map(|c| c.len()), Some(1));
        let second = engine.transpile(&request).unwrap();
        assert_eq!(first, second);
        assert_eq!(engine.cache().map(|c| c.len()), Some(1));
    }

    #[test]
    fn test_options_are_part_of_the_key() {
        let engine = engine_with(EngineConfig::default());
        let sql = "CREATE TABLE t (doc VARIANT)";
        let variant = engine.transpile(&TranspileRequest::new(sql, DialectType::Snowflake)).unwrap();
        let mut options = polyglot_migrate::TranspileOptions::default();
        options.semi_structured = polyglot_migrate::SemiStructuredMapping::String;
        let string = engine
            .transpile(&TranspileRequest::new(sql, DialectType::Snowflake).with_options(options))
            .unwrap();
        assert_eq!(variant.sql, "CREATE TABLE t (doc VARIANT)");
        assert_eq!(string.sql, "CREATE TABLE t (doc STRING)");
    }

    #[test]
    fn test_capacity_is_bounded() {
        let engine = engine_with(EngineConfig {
            cache_capacity: 2,
            ..EngineConfig::default()
        });
        for n in 1..=5 {
            engine
                .transpile(&TranspileRequest::new(format!("SELECT TOP {n} a FROM t"), DialectType::SqlServer))
                .unwrap();
        }
        assert_eq!(engine.cache().map(|c| c.len()), Some(2));
    }

    #[test]
    fn test_zero_capacity_disables_caching() {
        let engine = engine_with(EngineConfig {
            cache_capacity: 0,
            ..EngineConfig::default()
        });
        assert!(engine.cache().is_none());
        let result = engine.transpile(&TranspileRequest::new("SELECT 1", DialectType::Hive)).unwrap();
        assert_eq!(result.sql, "SELECT 1");
    }
}

// ============================================================================
// Cancellation
// ============================================================================

mod cancellation {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cancelled_before_start() {
        let engine = engine_with(EngineConfig::default());
        let token = CancellationToken::new();
        token.cancel();
        let request = TranspileRequest::new("SELECT 1; SELECT 2; SELECT 3", DialectType::PostgreSQL);
        let result = engine.transpile_with_cancel(&request, &token).unwrap();
        assert!(result.cancelled);
        assert!(result.statements.is_empty());
        assert_eq!(result.report.entries.len(), 1);
        assert_eq!(result.report.entries[0].code, "CANCELLED");
    }

    #[test]
    fn test_token_clones_share_state() {
        let token = CancellationToken::new();
        let handle = token.clone();
        assert!(!token.is_cancelled());
        handle.cancel();
        assert!(token.is_cancelled());
    }
}

// ============================================================================
// Serialized results and engine status
// ============================================================================

mod output {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_result_json_round_trip() {
        let result = polyglot_migrate::transpile("SELECT TOP 2 a FROM t WHERE b = NULL", DialectType::SqlServer).unwrap();
        let json = result.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["source"], "sqlserver");
        assert_eq!(value["target"], "databricks");
        assert_eq!(value["summary"]["statements"], 1);
        assert_eq!(value["report"]["entries"][0]["code"], "NULL_COMPARISON");

        let back: TranspileResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn test_engine_status() {
        let status = engine_with(EngineConfig::default()).status();
        assert_eq!(status.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(status.pairs.len(), DialectType::SOURCES.len());
        assert!(status.pairs.contains(&DialectPair {
            source: DialectType::Teradata,
            target: DialectType::Databricks,
        }));
        assert!(status.rule_count > 50);
    }

    #[test]
    fn test_configured_defaults_from_toml() {
        let config = EngineConfig::from_toml_str(
            r#"
            source = "oracle"
            [options.format]
            pretty = false
            "#,
        )
        .unwrap();
        let engine = engine_with(config);
        let result = engine.transpile(&engine.request("SELECT NVL(a, 0) FROM DUAL").unwrap()).unwrap();
        assert_eq!(result.source, DialectType::Oracle);
        assert!(result.sql.starts_with("SELECT COALESCE(a, 0)"), "{}", result.sql);
    }
}
