use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use polyglot_migrate::{analyze_project, DialectType, Engine, EngineConfig, FormatOptions, SourceFile, TranspileRequest};

const SIMPLE_SELECT: &str = "SELECT TOP 10 a, b, c FROM table1";

const MEDIUM_SELECT: &str = r#"
SELECT TOP 100
    u.id,
    u.name,
    ISNULL(u.email, '') AS email,
    COUNT(o.id) AS order_count,
    SUM(o.total) AS total_spent
FROM dbo.users u
LEFT JOIN dbo.orders o ON u.id = o.user_id
WHERE u.created_at > '2024-01-01'
    AND u.status = 'active'
GROUP BY u.id, u.name, u.email
HAVING COUNT(o.id) > 5
ORDER BY total_spent DESC
"#;

const COMPLEX_SELECT: &str = r#"
WITH
    active_users AS (
        SELECT
            u.id,
            u.name,
            u.email,
            u.created_at
        FROM users u
        WHERE u.status = 'active'
            AND u.last_login > DATEADD(day, -30, GETDATE())
    ),
    user_orders AS (
        SELECT
            o.user_id,
            COUNT(*) AS order_count,
            SUM(o.total) AS total_spent,
            AVG(o.total) AS avg_order_value,
            MAX(o.created_at) AS last_order_date
        FROM orders o
        WHERE o.status = 'completed'
        GROUP BY o.user_id
    )
SELECT TOP 1000
    au.id AS user_id,
    au.name AS user_name,
    au.email,
    ISNULL(uo.order_count, 0) AS total_orders,
    ISNULL(uo.total_spent, 0) AS lifetime_value,
    CONVERT(VARCHAR(10), uo.last_order_date, 120) AS last_order,
    CASE
        WHEN uo.total_spent > 10000 THEN 'VIP'
        WHEN uo.total_spent > 1000 THEN 'Premium'
        ELSE 'Regular'
    END AS customer_tier
FROM active_users au
LEFT JOIN user_orders uo ON au.id = uo.user_id
ORDER BY uo.total_spent DESC
"#;

fn uncached_engine() -> Engine {
    Engine::from_config(EngineConfig {
        cache_capacity: 0,
        ..EngineConfig::default()
    })
    .unwrap()
}

fn bench_transpile_by_query_size(c: &mut Criterion) {
    let engine = uncached_engine();
    let mut group = c.benchmark_group("transpile_by_size");

    for (name, sql) in [("simple", SIMPLE_SELECT), ("medium", MEDIUM_SELECT), ("complex", COMPLEX_SELECT)] {
        let request = TranspileRequest::new(sql, DialectType::SqlServer);
        group.bench_function(name, |b| b.iter(|| engine.transpile(black_box(&request))));
    }

    group.finish();
}

fn bench_transpile_sources(c: &mut Criterion) {
    let engine = uncached_engine();
    let mut group = c.benchmark_group("transpile_sources");

    let inputs = [
        ("SqlServer", DialectType::SqlServer, "SELECT TOP 5 ISNULL(a, 0), GETDATE() FROM t ORDER BY a"),
        ("Teradata", DialectType::Teradata, "SEL a MOD 3, STRTOK(p, '/', 2) FROM t QUALIFY ROW_NUMBER() OVER (ORDER BY a) = 1"),
        ("Oracle", DialectType::Oracle, "SELECT NVL(a, 0), DECODE(b, 1, 'x', 'y') FROM t WHERE ROWNUM <= 10"),
        ("Snowflake", DialectType::Snowflake, "SELECT o.id, f.value FROM orders o, LATERAL FLATTEN(input => o.items) f"),
        ("BigQuery", DialectType::BigQuery, "SELECT SAFE_CAST(a AS INT64), TIMESTAMP_TRUNC(ts, HOUR) FROM ds.t"),
        ("PostgreSQL", DialectType::PostgreSQL, "SELECT a::NUMERIC(8, 2), STRING_TO_ARRAY(tags, ',') FROM t"),
    ];

    for (name, source, sql) in inputs {
        let request = TranspileRequest::new(sql, source);
        group.bench_with_input(BenchmarkId::new("short_query", name), &request, |b, request| {
            b.iter(|| engine.transpile(black_box(request)))
        });
    }

    group.finish();
}

fn bench_roundtrip(c: &mut Criterion) {
    let engine = uncached_engine();
    let mut group = c.benchmark_group("roundtrip");
    let dialect = engine.dialect(DialectType::SqlServer).unwrap();
    let format = FormatOptions::default();

    group.bench_function("medium_query", |b| {
        b.iter(|| {
            let ast = dialect.parse(black_box(MEDIUM_SELECT)).unwrap();
            for statement in &ast {
                let _ = dialect.generate(black_box(statement), &format);
            }
        })
    });

    group.finish();
}

fn bench_project(c: &mut Criterion) {
    let engine = uncached_engine();
    let files: Vec<SourceFile> = (0..32)
        .map(|i| SourceFile::new(format!("q{i}.sql"), MEDIUM_SELECT))
        .collect();
    c.bench_function("analyze_project_32_files", |b| {
        b.iter(|| analyze_project(&engine, black_box(&files), DialectType::SqlServer))
    });
}

criterion_group!(
    benches,
    bench_transpile_by_query_size,
    bench_transpile_sources,
    bench_roundtrip,
    bench_project
);
criterion_main!(benches);
