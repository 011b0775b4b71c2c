//! SQL Server (T-SQL) dialect
//!
//! Bracket-quoted names, `@variables`, `#temp` tables, `TOP`, `SELECT ... INTO`
//! and `GO` batch separators. The rules here cover T-SQL functions whose
//! argument order or style codes have no direct Databricks spelling:
//! `CONVERT`/`TRY_CONVERT`, `FORMAT`, `DATEFROMPARTS` and `SPACE`.
//!
//! Azure Synapse shares every rule in this file.

use super::{DialectImpl, DialectType};
use crate::expressions::{Cast, CastKind, CharLength, DataType, Expression};
use crate::generator::GeneratorConfig;
use crate::grammar::Grammar;
use crate::rules::{as_function, call_at, DialectMatch, Finding, RewriteRule, RuleContext, RuleOutcome};
use crate::time::tsql_style;
use crate::tokens::TokenizerConfig;

const TSQL: DialectMatch = DialectMatch::Sources(&[DialectType::SqlServer, DialectType::Synapse]);

/// SQL Server dialect
pub struct TSQLDialect;

impl DialectImpl for TSQLDialect {
    fn dialect_type(&self) -> DialectType {
        DialectType::SqlServer
    }

    fn tokenizer_config(&self) -> TokenizerConfig {
        let mut config = TokenizerConfig::default().with_identifiers(&[('[', ']'), ('"', '"')]);
        config.variable_prefixes = vec!['@', '#'];
        config.nested_comments = true;
        config
    }

    fn grammar(&self) -> Grammar {
        Grammar {
            supports_top: true,
            supports_fetch_first: true,
            supports_select_into: true,
            trailing_extensions: vec!["OPTION", "FOR"],
            batch_separator: Some("GO"),
            ..Grammar::standard(DialectType::SqlServer)
        }
    }

    fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            identifier_quote: ('[', ']'),
            ..GeneratorConfig::new(DialectType::SqlServer)
        }
    }

    fn rules(&self) -> Vec<RewriteRule> {
        vec![
            RewriteRule::function("tsql_convert", TSQL, 100, "CONVERT", convert),
            RewriteRule::function("tsql_try_convert", TSQL, 100, "TRY_CONVERT", convert),
            RewriteRule::function("tsql_format", TSQL, 100, "FORMAT", format),
            RewriteRule::function("datefromparts", TSQL, 100, "DATEFROMPARTS", datefromparts),
            RewriteRule::function("space_to_repeat", TSQL, 100, "SPACE", space),
        ]
    }
}

/// Declared width of a character type, when it has one
fn char_width(data_type: &DataType) -> Option<usize> {
    match data_type {
        DataType::Char { length: Some(n) } | DataType::NChar { length: Some(n) } => Some(*n as usize),
        DataType::VarChar {
            length: Some(CharLength::Fixed(n)),
        }
        | DataType::NVarChar {
            length: Some(CharLength::Fixed(n)),
        } => Some(*n as usize),
        _ => None,
    }
}

/// `CONVERT(type, value [, style])`, `TRY_CONVERT(type, value [, style])`
fn convert(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(f) = as_function(expr) else {
        return RuleOutcome::Unchanged;
    };
    let (to, value, style) = match f.args.as_slice() {
        [Expression::DataType(to), value] => (to, value, None),
        [Expression::DataType(to), value, style] => (to, value, Some(style)),
        _ => return RuleOutcome::Unchanged,
    };
    let kind = if f.name == "TRY_CONVERT" {
        CastKind::TryCast
    } else {
        CastKind::Cast
    };
    let cast = Expression::Cast(Box::new(Cast {
        expr: value.clone(),
        to: to.clone(),
        kind,
        format: None,
        span: f.span,
    }));
    let Some(style) = style else {
        return RuleOutcome::Replaced(cast);
    };

    let pattern = style.as_integer().and_then(tsql_style);
    let Some(pattern) = pattern else {
        return RuleOutcome::risk(
            cast,
            Finding::risk("CONVERT_STYLE_IGNORED", format!("style {} has no pattern equivalent", style_text(style)))
                .with_hint("check the output format of the converted value"),
        );
    };
    if to.is_string() {
        let mut pattern = pattern.to_string();
        // CONVERT truncates to the declared width
        if let Some(width) = char_width(to) {
            if width < pattern.len() && !pattern.contains('\'') {
                pattern.truncate(width);
            }
        }
        return RuleOutcome::Replaced(call_at(f, "DATE_FORMAT", vec![value.clone(), Expression::string(pattern)]));
    }
    let parser = match to {
        DataType::Date => "TO_DATE",
        DataType::Timestamp { .. } | DataType::DateTime { .. } => "TO_TIMESTAMP",
        _ => {
            return RuleOutcome::risk(
                cast,
                Finding::risk(
                    "CONVERT_STYLE_IGNORED",
                    format!("style {} only applies to date and string conversions", style_text(style)),
                ),
            )
        }
    };
    let parsed = call_at(f, parser, vec![value.clone(), Expression::string(pattern)]);
    if kind == CastKind::TryCast {
        return RuleOutcome::risk(
            parsed,
            Finding::risk("TRY_CONVERT_FAILS", "an unparseable value raises an error instead of returning NULL")
                .with_hint("set spark.sql.ansi.enabled=false or validate the input"),
        );
    }
    RuleOutcome::Replaced(parsed)
}

fn style_text(style: &Expression) -> String {
    style
        .as_integer()
        .map(|n| n.to_string())
        .unwrap_or_else(|| "expression".to_string())
}

/// `FORMAT(value, format [, culture])`
fn format(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(f) = as_function(expr) else {
        return RuleOutcome::Unchanged;
    };
    let (value, pattern) = match f.args.as_slice() {
        [value, pattern] | [value, pattern, _] => (value, pattern),
        _ => return RuleOutcome::Unchanged,
    };
    let Some(text) = pattern.as_string() else {
        return RuleOutcome::Unmappable(Finding::unmappable(
            "UNSUPPORTED_FORMAT",
            "FORMAT with a computed pattern cannot be translated",
        ));
    };
    let mut findings = Vec::new();
    if f.args.len() == 3 {
        findings.push(Finding::risk("CULTURE_DROPPED", "the culture argument is ignored"));
    }

    let upper = text.to_uppercase();
    let rewritten = if let Some(digits) = upper.strip_prefix('N').filter(|d| d.chars().all(|c| c.is_ascii_digit())) {
        let scale = if digits.is_empty() { "2" } else { digits };
        call_at(f, "FORMAT_NUMBER", vec![value.clone(), Expression::number(scale)])
    } else if text.len() == 1 {
        return RuleOutcome::Unmappable(
            Finding::unmappable("UNSUPPORTED_FORMAT", format!("standard format specifier '{text}' has no equivalent"))
                .with_hint("write the pattern out, e.g. 'yyyy-MM-dd'"),
        );
    } else {
        let java = text.replace("tt", "a").replace("fff", "SSS");
        call_at(f, "DATE_FORMAT", vec![value.clone(), Expression::string(java)])
    };
    RuleOutcome::with_findings(rewritten, findings)
}

fn datefromparts(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    match as_function(expr) {
        Some(f) if f.args.len() == 3 => RuleOutcome::Replaced(call_at(f, "MAKE_DATE", f.args.clone())),
        _ => RuleOutcome::Unchanged,
    }
}

fn space(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    match as_function(expr) {
        Some(f) if f.args.len() == 1 => {
            RuleOutcome::Replaced(call_at(f, "REPEAT", vec![Expression::string(" "), f.args[0].clone()]))
        }
        _ => RuleOutcome::Unchanged,
    }
}

#[cfg(test)]
mod tests {
    use crate::dialects::DialectType;
    use crate::rules::test_support::{codes, convert, sql};
    use pretty_assertions::assert_eq;

    const MSSQL: DialectType = DialectType::SqlServer;

    #[test]
    fn test_convert_without_style_is_a_cast() {
        assert_eq!(
            sql(MSSQL, "SELECT CONVERT(INT, qty), TRY_CONVERT(DECIMAL(10, 2), price) FROM t"),
            "SELECT CAST(qty AS INT), TRY_CAST(price AS DECIMAL(10, 2)) FROM t"
        );
    }

    #[test]
    fn test_convert_style_truncates_to_width() {
        assert_eq!(
            sql(MSSQL, "SELECT CONVERT(VARCHAR(10), order_date, 120) FROM orders"),
            "SELECT DATE_FORMAT(order_date, 'yyyy-MM-dd') FROM orders"
        );
        assert_eq!(
            sql(MSSQL, "SELECT CONVERT(VARCHAR(5), d, 108), CONVERT(NVARCHAR(30), d, 120) FROM t"),
            "SELECT DATE_FORMAT(d, 'HH:mm'), DATE_FORMAT(d, 'yyyy-MM-dd HH:mm:ss') FROM t"
        );
        assert_eq!(
            sql(MSSQL, "SELECT CONVERT(DATE, s, 103) FROM t"),
            "SELECT TO_DATE(s, 'dd/MM/yyyy') FROM t"
        );
    }

    #[test]
    fn test_unknown_style_is_reported() {
        let result = convert(MSSQL, "SELECT CONVERT(VARCHAR(20), d, 999) FROM t");
        assert_eq!(result.sql, "SELECT CAST(d AS STRING) FROM t");
        assert_eq!(codes(&result), vec!["CONVERT_STYLE_IGNORED"]);
    }

    #[test]
    fn test_format_numbers_and_dates() {
        assert_eq!(
            sql(MSSQL, "SELECT FORMAT(amount, 'N2'), FORMAT(created, 'yyyy-MM-dd hh:mm tt') FROM t"),
            "SELECT FORMAT_NUMBER(amount, 2), DATE_FORMAT(created, 'yyyy-MM-dd hh:mm a') FROM t"
        );
        let result = convert(MSSQL, "SELECT FORMAT(created, 'D') FROM t");
        assert!(result.report.has_errors());
        assert_eq!(codes(&result), vec!["UNSUPPORTED_FORMAT"]);
    }

    #[test]
    fn test_date_parts_and_space() {
        assert_eq!(
            sql(MSSQL, "SELECT DATEFROMPARTS(y, m, 1), SPACE(3)"),
            "SELECT MAKE_DATE(y, m, 1), REPEAT(' ', 3)"
        );
    }

    #[test]
    fn test_batches_split_on_go() {
        let result = convert(MSSQL, "SELECT 1\nGO\nSELECT 2");
        assert_eq!(result.sql, "SELECT 1;\nSELECT 2");
    }
}
