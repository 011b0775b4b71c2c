//! Dialect Matrix Tests
//!
//! One module per source system, each migrating representative statements to
//! Databricks and checking both the emitted text and the diagnostics.

use polyglot_migrate::{
    transpile, Category, DialectType, Engine, SemiStructuredMapping, TranspileOptions, TranspileRequest,
    TranspileResult,
};
use pretty_assertions::assert_eq;

fn convert(sql: &str, source: DialectType) -> TranspileResult {
    transpile(sql, source).unwrap_or_else(|e| panic!("engine failed for {source}: {e}"))
}

fn codes(result: &TranspileResult) -> Vec<&str> {
    result.report.entries.iter().map(|d| d.code.as_str()).collect()
}

/// Every source parses and emits the same plain query
#[test]
fn test_plain_query_from_every_source() {
    for source in DialectType::SOURCES {
        let result = convert("SELECT a, b FROM t WHERE a > 1 ORDER BY b", source);
        assert_eq!(result.sql, "SELECT a, b FROM t WHERE a > 1 ORDER BY b", "{source}");
        assert!(!result.report.has_errors(), "{source}: {:?}", result.report.entries);
    }
}

mod sql_server {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_top_becomes_limit_without_diagnostics() {
        let result = convert("SELECT TOP 10 * FROM customers", DialectType::SqlServer);
        assert_eq!(result.sql, "SELECT * FROM customers LIMIT 10");
        assert!(result.report.is_empty());
    }

    #[test]
    fn test_report_query() {
        let result = convert(
            "SELECT TOP 5 c.[name], ISNULL(SUM(o.total), 0) AS spent, GETDATE() AS run_at \
             FROM dbo.customers c LEFT JOIN dbo.orders o ON o.customer_id = c.id \
             GROUP BY c.[name] ORDER BY spent DESC",
            DialectType::SqlServer,
        );
        assert_eq!(
            result.sql,
            "SELECT c.`name`, COALESCE(SUM(o.total), 0) AS spent, CURRENT_TIMESTAMP AS run_at \
             FROM dbo.customers AS c LEFT JOIN dbo.orders AS o ON o.customer_id = c.id \
             GROUP BY c.`name` ORDER BY spent DESC LIMIT 5"
        );
        assert!(!result.report.has_errors(), "{:?}", result.report.entries);
    }

    #[test]
    fn test_temp_tables_and_go_batches() {
        let result = convert("SELECT a INTO #work FROM t\nGO\nSELECT a FROM #work", DialectType::SqlServer);
        assert_eq!(result.summary.statements, 2);
        assert_eq!(result.sql, "CREATE OR REPLACE TEMPORARY VIEW work AS SELECT a FROM t;\nSELECT a FROM work");
        assert!(codes(&result).contains(&"TEMP_TABLE_RENAMED"));
    }
}

mod snowflake {
    use super::*;
    use pretty_assertions::assert_eq;

    const EMPLOYEE: &str = "CREATE TABLE employee (id INT, name VARCHAR(100), salary DECIMAL(10,2) NOT NULL, remarks VARIANT)";

    #[test]
    fn test_variant_column_maps_to_variant() {
        let result = convert(EMPLOYEE, DialectType::Snowflake);
        assert_eq!(
            result.sql,
            "CREATE TABLE employee (id INT, name STRING, salary DECIMAL(10, 2) NOT NULL, remarks VARIANT)"
        );
        assert!(!result.report.has_errors());
        assert!(result.report.entries.iter().all(|d| !d.message.contains("remarks")));
    }

    #[test]
    fn test_lossy_semi_structured_mapping_names_the_column() {
        let engine = Engine::builtin().unwrap();
        let options = TranspileOptions {
            semi_structured: SemiStructuredMapping::String,
            ..TranspileOptions::default()
        };
        let result = engine
            .transpile(&TranspileRequest::new(EMPLOYEE, DialectType::Snowflake).with_options(options))
            .unwrap();
        assert_eq!(
            result.sql,
            "CREATE TABLE employee (id INT, name STRING, salary DECIMAL(10, 2) NOT NULL, remarks STRING)"
        );
        let mapping: Vec<_> = result
            .report
            .entries
            .iter()
            .filter(|d| d.category == Category::Mapping)
            .collect();
        assert_eq!(mapping.len(), 1);
        assert!(mapping[0].message.contains("remarks"));
    }

    #[test]
    fn test_qualify_and_iff() {
        let result = convert(
            "SELECT id, IFF(amount > 100, 'big', 'small') AS size FROM sales \
             QUALIFY ROW_NUMBER() OVER (PARTITION BY id ORDER BY ts DESC) = 1",
            DialectType::Snowflake,
        );
        assert_eq!(
            result.sql,
            "SELECT id, IF(amount > 100, 'big', 'small') AS size FROM sales \
             QUALIFY ROW_NUMBER() OVER (PARTITION BY id ORDER BY ts DESC) = 1"
        );
    }
}

mod teradata {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_shorthand_keywords_and_operators() {
        let result = convert("SEL a MOD 3, b ** 2 FROM t", DialectType::Teradata);
        assert_eq!(result.sql, "SELECT a % 3, POWER(b, 2) FROM t");
    }

    #[test]
    fn test_volatile_multiset_table() {
        let result = convert(
            "CREATE MULTISET VOLATILE TABLE stage (id INTEGER, amt DECIMAL(12,2)) PRIMARY INDEX (id) ON COMMIT PRESERVE ROWS",
            DialectType::Teradata,
        );
        assert_eq!(result.sql, "CREATE TABLE stage (id INT, amt DECIMAL(12, 2)) CLUSTER BY (id)");
        assert!(codes(&result).contains(&"TEMP_TABLE"));
        assert!(!result.report.has_errors(), "{:?}", result.report.entries);
    }

    #[test]
    fn test_hash_functions_are_unmappable() {
        let result = convert("SELECT HASHBUCKET(HASHROW(id)) FROM t", DialectType::Teradata);
        assert!(result.report.error_count >= 1);
        assert!(codes(&result).iter().all(|c| *c == "UNSUPPORTED_FUNCTION"));
    }
}

mod oracle {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rownum_and_nvl() {
        let result = convert(
            "SELECT NVL(e.bonus, 0) FROM emp e WHERE e.dept = 10 AND ROWNUM <= 5",
            DialectType::Oracle,
        );
        assert_eq!(result.sql, "SELECT COALESCE(e.bonus, 0) FROM emp AS e WHERE e.dept = 10 LIMIT 5");
    }

    #[test]
    fn test_connect_by_is_reported_and_kept() {
        let result = convert(
            "SELECT id FROM emp START WITH mgr IS NULL CONNECT BY PRIOR id = mgr",
            DialectType::Oracle,
        );
        assert!(result.sql.contains("CONNECT BY PRIOR id = mgr"), "{}", result.sql);
        assert!(result.report.has_errors());
    }
}

mod postgres_family {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_casts_and_concatenation() {
        let result = convert("SELECT fname || ' ' || lname, price::NUMERIC(8,2) FROM people", DialectType::PostgreSQL);
        assert_eq!(result.sql, "SELECT fname || ' ' || lname, price::DECIMAL(8, 2) FROM people");
    }

    #[test]
    fn test_redshift_distribution_keys() {
        let result = convert(
            "CREATE TABLE sales (id INT, region VARCHAR(10)) DISTKEY (region) SORTKEY (id)",
            DialectType::Redshift,
        );
        assert!(result.sql.ends_with("CLUSTER BY (region, id)"), "{}", result.sql);
    }
}

mod mysql {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_backticks_and_limit_offset() {
        let result = convert("SELECT `id`, IFNULL(`name`, 'n/a') FROM `users` LIMIT 10 OFFSET 20", DialectType::MySQL);
        assert_eq!(result.sql, "SELECT `id`, COALESCE(`name`, 'n/a') FROM `users` LIMIT 10 OFFSET 20");
    }

    #[test]
    fn test_pipes_are_logical_or() {
        assert_eq!(convert("SELECT a || b FROM t", DialectType::MySQL).sql, "SELECT a OR b FROM t");
    }
}

mod bigquery {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unnest_and_safe_cast() {
        let result = convert(
            "SELECT o.id, SAFE_CAST(item AS INT64) FROM orders AS o, UNNEST(o.items) AS item",
            DialectType::BigQuery,
        );
        assert_eq!(
            result.sql,
            "SELECT o.id, TRY_CAST(item AS BIGINT) FROM orders AS o, LATERAL EXPLODE(o.items) AS item (item)"
        );
    }
}

mod hive_and_synapse {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_hive_needs_no_translation() {
        let result = convert("SELECT id, tag FROM posts LATERAL VIEW explode(tags) t AS tag", DialectType::Hive);
        assert_eq!(codes(&result), vec!["NOT_REQUIRED"]);
    }

    #[test]
    fn test_synapse_shares_tsql_rules() {
        let result = convert("SELECT TOP 3 [id] FROM #stage", DialectType::Synapse);
        assert_eq!(result.sql, "SELECT `id` FROM stage LIMIT 3");
    }
}
