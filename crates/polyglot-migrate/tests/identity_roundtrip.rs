//! Identity Round-Trip Tests
//!
//! Transpiling from a dialect to itself must not change the meaning of a
//! statement: the re-parsed output has the same AST as the input, spans aside.

use polyglot_migrate::traversal::ast_fingerprint;
use polyglot_migrate::{parse, transpile, DialectType, Engine, TranspileRequest};
use pretty_assertions::assert_eq;

fn roundtrip(sql: &str, dialect: DialectType) {
    let engine = Engine::builtin().unwrap();
    let result = engine
        .transpile(&TranspileRequest::new(sql, dialect).with_target(dialect))
        .unwrap();
    assert!(!result.report.has_errors(), "{dialect}: {:?}", result.report.entries);

    let before = parse(sql, dialect).unwrap();
    let after = parse(&result.sql, dialect).unwrap_or_else(|e| panic!("{dialect} output {:?}: {e}", result.sql));
    assert_eq!(before.len(), after.len(), "{dialect}: {}", result.sql);
    for (b, a) in before.iter().zip(&after) {
        assert_eq!(ast_fingerprint(b), ast_fingerprint(a), "{dialect}: {sql} => {}", result.sql);
    }
}

mod per_dialect {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_shared_query_shapes() {
        let queries = [
            "SELECT a, COUNT(*) AS n FROM t WHERE b IN (1, 2, 3) GROUP BY a HAVING COUNT(*) > 1",
            "SELECT x.id FROM x INNER JOIN y ON x.id = y.id LEFT JOIN z ON z.k = y.k",
            "SELECT CASE WHEN a IS NULL THEN 0 ELSE a END FROM t",
            "SELECT id FROM a UNION ALL SELECT id FROM b",
            "WITH recent AS (SELECT id FROM orders WHERE total > 10) SELECT id FROM recent",
            "SELECT CAST(a AS INT), UPPER(b) FROM t WHERE c BETWEEN 1 AND 5 AND d LIKE 'x%'",
            "INSERT INTO t (a, b) VALUES (1, 'one'), (2, 'two')",
            "UPDATE t SET a = 1 WHERE b = 2",
            "DELETE FROM t WHERE a < 0",
        ];
        let mut dialects = DialectType::SOURCES.to_vec();
        dialects.push(DialectType::Databricks);
        for dialect in dialects {
            for sql in queries {
                roundtrip(sql, dialect);
            }
        }
    }

    #[test]
    fn test_sql_server_specific() {
        roundtrip("SELECT TOP 5 [order id] FROM dbo.orders ORDER BY [order id]", DialectType::SqlServer);
        roundtrip("SELECT ISNULL(a, 0) FROM #stage", DialectType::SqlServer);
    }

    #[test]
    fn test_teradata_specific() {
        roundtrip("SELECT a FROM t QUALIFY ROW_NUMBER() OVER (PARTITION BY b ORDER BY c) = 1", DialectType::Teradata);
    }

    #[test]
    fn test_oracle_specific() {
        roundtrip("SELECT NVL(a, 0), DECODE(b, 1, 'x', 'y') FROM t", DialectType::Oracle);
    }

    #[test]
    fn test_snowflake_specific() {
        roundtrip("SELECT IFF(a > 0, 'pos', 'neg') FROM t", DialectType::Snowflake);
        roundtrip("CREATE TABLE t (id INT, doc VARIANT)", DialectType::Snowflake);
    }

    #[test]
    fn test_postgres_specific() {
        roundtrip("SELECT a::INT, b || c FROM t", DialectType::PostgreSQL);
    }

    #[test]
    fn test_mysql_specific() {
        roundtrip("SELECT `id`, IFNULL(`name`, '') FROM `users` LIMIT 10", DialectType::MySQL);
    }

    #[test]
    fn test_databricks_specific() {
        roundtrip(
            "SELECT id, tag FROM posts LATERAL VIEW EXPLODE(tags) t AS tag",
            DialectType::Databricks,
        );
    }
}

mod determinism {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_repeated_runs_are_identical() {
        let sql = "SELECT TOP 3 ISNULL(a, 0), GETDATE() FROM t WHERE b = NULL; SELECT FROM";
        let first = transpile(sql, DialectType::SqlServer).unwrap();
        for _ in 0..5 {
            assert_eq!(transpile(sql, DialectType::SqlServer).unwrap(), first);
        }
    }

    #[test]
    fn test_output_is_a_fixed_point() {
        let cases = [
            ("SELECT TOP 10 ISNULL(a, 0) FROM t ORDER BY a", DialectType::SqlServer),
            ("SEL a MOD 3 FROM t", DialectType::Teradata),
            ("SELECT NVL(e.bonus, 0) FROM emp e WHERE ROWNUM <= 5", DialectType::Oracle),
            ("SELECT o.id, f.value FROM orders o, LATERAL FLATTEN(input => o.items) f", DialectType::Snowflake),
        ];
        let engine = Engine::builtin().unwrap();
        for (sql, source) in cases {
            let once = transpile(sql, source).unwrap().sql;
            let twice = engine
                .transpile(&TranspileRequest::new(once.as_str(), DialectType::Databricks))
                .unwrap();
            assert_eq!(twice.sql, once, "{source}");
            assert!(!twice.report.has_errors());
        }
    }
}
