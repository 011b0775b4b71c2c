//! Type mapping
//!
//! Column and cast types are rewritten to the Databricks type system. Decimal
//! precision is never narrowed silently: anything that loses digits or
//! fractional seconds reports a precision warning.

use super::{DialectMatch, Finding, RewriteRule, RuleContext, RuleOutcome};
use crate::config::SemiStructuredMapping;
use crate::dialects::DialectType;
use crate::expressions::{DataType, DateTimeKind, TimestampZone};

/// Widest decimal Databricks stores
pub const MAX_DECIMAL_PRECISION: u32 = 38;

pub fn rules() -> Vec<RewriteRule> {
    let foreign = DialectMatch::Foreign;
    vec![
        RewriteRule::data_type("custom_types", foreign, 190, custom),
        RewriteRule::data_type("semi_structured_types", foreign, 180, semi_structured),
        RewriteRule::data_type("decimal_precision", foreign, 170, decimal),
        RewriteRule::data_type("float_width", foreign, 160, float),
        RewriteRule::data_type("money_to_decimal", foreign, 150, money),
        RewriteRule::data_type("character_to_string", foreign, 140, character),
        RewriteRule::data_type("binary_types", foreign, 130, binary),
        RewriteRule::data_type("temporal_types", foreign, 120, temporal),
        RewriteRule::data_type("text_like_types", foreign, 110, text_like),
        RewriteRule::data_type("unsigned_widening", foreign, 100, unsigned),
    ]
}

fn column_label(ctx: &RuleContext<'_>) -> String {
    match ctx.column {
        Some(column) => format!("column `{column}`"),
        None => "expression".to_string(),
    }
}

/// Types the parser keeps by name
fn custom(ty: &DataType, ctx: &RuleContext<'_>) -> RuleOutcome<DataType> {
    let DataType::Custom { name, args } = ty else {
        return RuleOutcome::Unchanged;
    };
    let upper = name.to_uppercase();
    match upper.as_str() {
        "ROWVERSION" => RuleOutcome::risk(
            DataType::Binary { length: None },
            Finding::info("ROWVERSION_NOT_MAINTAINED", format!("{} is no longer maintained automatically", column_label(ctx)))
                .with_hint("use Delta row tracking or a commit version column"),
        ),
        "YEAR" => RuleOutcome::Replaced(DataType::Int { unsigned: false }),
        "ENUM" | "SET" => RuleOutcome::risk(
            DataType::String,
            Finding::info(
                "ENUM_AS_STRING",
                format!("{upper}({}) on {} becomes STRING", args.join(", "), column_label(ctx)),
            )
            .with_hint("add a CHECK constraint to restrict values"),
        ),
        "BIT" => RuleOutcome::Replaced(DataType::Binary { length: None }),
        "CITEXT" | "NAME" | "SYSNAME" | "GRAPHIC" | "VARGRAPHIC" => RuleOutcome::Replaced(DataType::String),
        "INET" | "CIDR" | "MACADDR" => RuleOutcome::risk(
            DataType::String,
            Finding::risk("NETWORK_TYPE_AS_STRING", format!("{upper} on {} is kept as text", column_label(ctx))),
        ),
        "SERIAL" | "SERIAL4" | "SMALLSERIAL" | "SERIAL2" | "BIGSERIAL" | "SERIAL8" => RuleOutcome::risk(
            DataType::BigInt { unsigned: false },
            Finding::risk("SERIAL_DEFAULT_DROPPED", format!("{upper} on {} loses its sequence default", column_label(ctx)))
                .with_hint("declare the column GENERATED BY DEFAULT AS IDENTITY"),
        ),
        _ => RuleOutcome::Unmappable(
            Finding::unmappable("UNSUPPORTED_TYPE", format!("type {upper} on {} has no Databricks equivalent", column_label(ctx)))
                .with_hint("choose a target type by hand"),
        ),
    }
}

/// `VARIANT`, `OBJECT`, `JSON`, `SUPER`, untyped `ARRAY`
fn semi_structured(ty: &DataType, ctx: &RuleContext<'_>) -> RuleOutcome<DataType> {
    let semi = matches!(ty, DataType::Variant | DataType::Object | DataType::Json | DataType::Array(None));
    if !semi {
        return RuleOutcome::Unchanged;
    }
    match ctx.options.semi_structured {
        SemiStructuredMapping::Variant => match ty {
            DataType::Variant => RuleOutcome::Unchanged,
            DataType::Array(None) => RuleOutcome::Replaced(DataType::Array(Some(Box::new(DataType::Variant)))),
            _ => RuleOutcome::Replaced(DataType::Variant),
        },
        SemiStructuredMapping::String => RuleOutcome::risk(
            DataType::String,
            Finding::unmappable(
                "SEMI_STRUCTURED_AS_STRING",
                format!("{} on {} is stored as JSON text", ty.name(), column_label(ctx)),
            )
            .with_hint("path access on this column must be rewritten with GET_JSON_OBJECT or FROM_JSON"),
        ),
    }
}

/// Precision and scale a source uses for a bare `DECIMAL`/`NUMBER`
fn default_decimal(source: DialectType) -> (u32, u32, bool) {
    match source {
        DialectType::Snowflake => (38, 0, false),
        DialectType::SqlServer | DialectType::Synapse | DialectType::Redshift => (18, 0, false),
        DialectType::MySQL | DialectType::Hive | DialectType::Databricks => (10, 0, false),
        DialectType::Teradata => (5, 0, false),
        DialectType::BigQuery => (38, 9, false),
        // floating decimal in the source
        DialectType::Oracle | DialectType::PostgreSQL => (38, 10, true),
    }
}

fn decimal(ty: &DataType, ctx: &RuleContext<'_>) -> RuleOutcome<DataType> {
    let DataType::Decimal { precision, scale } = ty else {
        return RuleOutcome::Unchanged;
    };
    let mut findings = Vec::new();
    let (p, s) = match (*precision, *scale) {
        (Some(p), Some(s)) => (p, s),
        (Some(p), None) => (p, 0),
        (None, Some(s)) => (MAX_DECIMAL_PRECISION, s),
        (None, None) => {
            let (p, s, lossy) = default_decimal(ctx.source);
            if lossy {
                findings.push(
                    Finding::precision(
                        "PRECISION_NARROWED",
                        format!("unconstrained {} on {} becomes DECIMAL({p}, {s})", ty.name(), column_label(ctx)),
                    )
                    .with_hint("declare an explicit precision and scale"),
                );
            }
            (p, s)
        }
    };
    let (p, s) = if p > MAX_DECIMAL_PRECISION {
        let lost = p - MAX_DECIMAL_PRECISION;
        let narrowed = (MAX_DECIMAL_PRECISION, s.saturating_sub(lost));
        findings.push(Finding::precision(
            "PRECISION_NARROWED",
            format!(
                "DECIMAL({p}, {s}) on {} exceeds 38 digits; narrowed to DECIMAL({}, {})",
                column_label(ctx),
                narrowed.0,
                narrowed.1
            ),
        ));
        narrowed
    } else {
        (p, s)
    };
    let rewritten = DataType::Decimal {
        precision: Some(p),
        scale: Some(s.min(p)),
    };
    if rewritten == *ty {
        return RuleOutcome::Unchanged;
    }
    RuleOutcome::with_findings(rewritten, findings)
}

fn float(ty: &DataType, ctx: &RuleContext<'_>) -> RuleOutcome<DataType> {
    if let DataType::ScaledFloat {
        double,
        precision,
        scale,
    } = ty
    {
        let mapped = if *double { DataType::Double } else { DataType::Real };
        return RuleOutcome::risk(
            mapped,
            Finding::precision(
                "PRECISION_DROPPED",
                format!(
                    "{}({precision}, {scale}) on {} is no longer rounded to {scale} decimals",
                    ty.name(),
                    column_label(ctx)
                ),
            )
            .with_hint(format!("use DECIMAL({precision}, {scale}) for exact values")),
        );
    }
    let DataType::Float { precision } = ty else {
        return RuleOutcome::Unchanged;
    };
    let single = match precision {
        Some(p) => *p <= 24,
        None => matches!(ctx.source, DialectType::MySQL | DialectType::Hive),
    };
    RuleOutcome::Replaced(if single { DataType::Real } else { DataType::Double })
}

fn money(ty: &DataType, _ctx: &RuleContext<'_>) -> RuleOutcome<DataType> {
    let (precision, scale) = match ty {
        DataType::Money => (19, 4),
        DataType::SmallMoney => (10, 4),
        _ => return RuleOutcome::Unchanged,
    };
    RuleOutcome::Replaced(DataType::Decimal {
        precision: Some(precision),
        scale: Some(scale),
    })
}

/// Databricks compares `STRING` values without padding
fn character(ty: &DataType, _ctx: &RuleContext<'_>) -> RuleOutcome<DataType> {
    if ty.is_string() && *ty != DataType::String {
        RuleOutcome::Replaced(DataType::String)
    } else {
        RuleOutcome::Unchanged
    }
}

fn binary(ty: &DataType, _ctx: &RuleContext<'_>) -> RuleOutcome<DataType> {
    match ty {
        DataType::Binary { length: Some(_) } | DataType::VarBinary { .. } | DataType::Blob => {
            RuleOutcome::Replaced(DataType::Binary { length: None })
        }
        _ => RuleOutcome::Unchanged,
    }
}

fn fractional_seconds(precision: Option<u32>, ctx: &RuleContext<'_>) -> Option<Finding> {
    match precision {
        Some(p) if p > 6 => Some(Finding::precision(
            "FRACTIONAL_SECONDS_TRUNCATED",
            format!("{} keeps {p} fractional digits; Databricks stores microseconds", column_label(ctx)),
        )),
        _ => None,
    }
}

fn offset_lost(ctx: &RuleContext<'_>) -> Finding {
    Finding::risk(
        "TIMEZONE_OFFSET_LOST",
        format!("{} stores an instant; the original UTC offset is not kept", column_label(ctx)),
    )
    .with_hint("store the offset in a separate column if it is needed")
}

fn temporal(ty: &DataType, ctx: &RuleContext<'_>) -> RuleOutcome<DataType> {
    match ty {
        DataType::Time { .. } => RuleOutcome::risk(
            DataType::String,
            Finding::risk("TIME_AS_STRING", format!("TIME on {} has no Databricks type and is kept as text", column_label(ctx))),
        ),
        DataType::Timestamp { precision, zone } => {
            let mut findings: Vec<Finding> = fractional_seconds(*precision, ctx).into_iter().collect();
            let zone = match zone {
                TimestampZone::With => {
                    findings.push(offset_lost(ctx));
                    TimestampZone::Local
                }
                other => *other,
            };
            let rewritten = DataType::Timestamp { precision: None, zone };
            if rewritten == *ty {
                return RuleOutcome::Unchanged;
            }
            RuleOutcome::with_findings(rewritten, findings)
        }
        DataType::DateTime { kind, precision } => {
            // DATETIME2 defaults to 100ns
            let precision = match (kind, precision) {
                (DateTimeKind::DateTime2 | DateTimeKind::DateTimeOffset, None) if ctx.source.is_tsql_family() => Some(7),
                (_, p) => *p,
            };
            let mut findings: Vec<Finding> = fractional_seconds(precision, ctx).into_iter().collect();
            let zone = if *kind == DateTimeKind::DateTimeOffset {
                findings.push(offset_lost(ctx));
                TimestampZone::Local
            } else {
                TimestampZone::Without
            };
            RuleOutcome::with_findings(DataType::Timestamp { precision: None, zone }, findings)
        }
        _ => RuleOutcome::Unchanged,
    }
}

fn text_like(ty: &DataType, ctx: &RuleContext<'_>) -> RuleOutcome<DataType> {
    match ty {
        DataType::Uuid => RuleOutcome::Replaced(DataType::String),
        DataType::Xml => RuleOutcome::risk(
            DataType::String,
            Finding::risk("XML_AS_STRING", format!("XML on {} is kept as text", column_label(ctx)))
                .with_hint("XPath methods must be rewritten with xpath functions"),
        ),
        DataType::Interval => RuleOutcome::risk(
            DataType::String,
            Finding::risk("INTERVAL_AS_STRING", format!("INTERVAL on {} is kept as text", column_label(ctx))),
        ),
        _ => RuleOutcome::Unchanged,
    }
}

/// Unsigned integers widen to the next signed type
fn unsigned(ty: &DataType, _ctx: &RuleContext<'_>) -> RuleOutcome<DataType> {
    let widened = match ty {
        DataType::TinyInt { unsigned: true } => DataType::SmallInt { unsigned: false },
        DataType::SmallInt { unsigned: true } => DataType::Int { unsigned: false },
        DataType::Int { unsigned: true } => DataType::BigInt { unsigned: false },
        DataType::BigInt { unsigned: true } => DataType::Decimal {
            precision: Some(20),
            scale: Some(0),
        },
        _ => return RuleOutcome::Unchanged,
    };
    RuleOutcome::Replaced(widened)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TranspileOptions;
    use crate::rules::test_support::{codes, convert, convert_with, sql};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decimal_defaults_per_source() {
        let options = TranspileOptions::default();
        let ctx = RuleContext::new(DialectType::Snowflake, DialectType::Databricks, &options);
        let bare = DataType::Decimal {
            precision: None,
            scale: None,
        };
        assert_eq!(
            decimal(&bare, &ctx),
            RuleOutcome::Replaced(DataType::Decimal {
                precision: Some(38),
                scale: Some(0)
            })
        );
        let ctx = RuleContext::new(DialectType::Oracle, DialectType::Databricks, &options);
        assert!(matches!(decimal(&bare, &ctx), RuleOutcome::ReplacedWithRisk(_, ref f) if f[0].code == "PRECISION_NARROWED"));
    }

    #[test]
    fn test_wide_decimal_reports_narrowing() {
        let result = convert(DialectType::PostgreSQL, "CREATE TABLE t (amount NUMERIC(40, 10))");
        assert_eq!(result.sql, "CREATE TABLE t (amount DECIMAL(38, 8))");
        assert_eq!(codes(&result), vec!["PRECISION_NARROWED"]);
    }

    #[test]
    fn test_scaled_floats_warn_about_dropped_rounding() {
        let result = convert(DialectType::MySQL, "CREATE TABLE t (c DOUBLE(10,2), d FLOAT(7,3), e FLOAT(30))");
        assert_eq!(result.sql, "CREATE TABLE t (c DOUBLE, d FLOAT, e DOUBLE)");
        let dropped: Vec<_> = result
            .report
            .entries
            .iter()
            .filter(|d| d.code == "PRECISION_DROPPED")
            .collect();
        assert_eq!(dropped.len(), 2);
        assert!(dropped[0].message.contains("column `c`"), "{}", dropped[0].message);
        assert_eq!(dropped[1].hint.as_deref(), Some("use DECIMAL(7, 3) for exact values"));
    }

    #[test]
    fn test_explicit_decimal_is_kept() {
        let result = convert(DialectType::Teradata, "CREATE TABLE t (amount DECIMAL(10, 2) NOT NULL)");
        assert_eq!(result.sql, "CREATE TABLE t (amount DECIMAL(10, 2) NOT NULL)");
        assert_eq!(codes(&result), vec!["NOT_REQUIRED"]);
    }

    #[test]
    fn test_sql_server_types() {
        assert_eq!(
            sql(DialectType::SqlServer, "CREATE TABLE t (a NVARCHAR(MAX), b MONEY, c VARBINARY(16), d UNIQUEIDENTIFIER)"),
            "CREATE TABLE t (a STRING, b DECIMAL(19, 4), c BINARY, d STRING)"
        );
        let result = convert(DialectType::SqlServer, "CREATE TABLE t (created DATETIME2)");
        assert_eq!(result.sql, "CREATE TABLE t (created TIMESTAMP_NTZ)");
        assert_eq!(codes(&result), vec!["FRACTIONAL_SECONDS_TRUNCATED"]);
    }

    #[test]
    fn test_offset_types_lose_their_offset() {
        let result = convert(DialectType::Snowflake, "SELECT CAST(x AS TIMESTAMP_TZ) FROM t");
        assert_eq!(result.sql, "SELECT CAST(x AS TIMESTAMP) FROM t");
        assert_eq!(codes(&result), vec!["TIMEZONE_OFFSET_LOST"]);
    }

    #[test]
    fn test_float_width() {
        assert_eq!(sql(DialectType::MySQL, "SELECT CAST(x AS FLOAT)"), "SELECT CAST(x AS FLOAT)");
        assert_eq!(sql(DialectType::SqlServer, "SELECT CAST(x AS FLOAT)"), "SELECT CAST(x AS DOUBLE)");
        assert_eq!(sql(DialectType::Oracle, "SELECT CAST(x AS FLOAT(10)) FROM DUAL"), "SELECT CAST(x AS FLOAT)");
    }

    #[test]
    fn test_semi_structured_mapping() {
        assert_eq!(
            sql(DialectType::Redshift, "CREATE TABLE t (payload SUPER)"),
            "CREATE TABLE t (payload VARIANT)"
        );
        let mut options = TranspileOptions::default();
        options.semi_structured = SemiStructuredMapping::String;
        let result = convert_with(DialectType::Redshift, "CREATE TABLE t (payload SUPER)", options);
        assert_eq!(result.sql, "CREATE TABLE t (payload STRING)");
        assert_eq!(result.report.error_count, 1);
        assert!(result.report.entries[0].message.contains("payload"));
    }

    #[test]
    fn test_unknown_type_is_unmappable() {
        let result = convert(DialectType::SqlServer, "CREATE TABLE t (loc GEOGRAPHY)");
        assert_eq!(result.sql, "CREATE TABLE t (loc GEOGRAPHY)");
        assert_eq!(codes(&result), vec!["UNSUPPORTED_TYPE"]);
        assert!(result.report.entries[0].message.contains("`loc`"));
    }

    #[test]
    fn test_unsigned_widening() {
        assert_eq!(
            sql(DialectType::MySQL, "CREATE TABLE t (a INT UNSIGNED, b BIGINT UNSIGNED)"),
            "CREATE TABLE t (a BIGINT, b DECIMAL(20, 0))"
        );
    }
}
