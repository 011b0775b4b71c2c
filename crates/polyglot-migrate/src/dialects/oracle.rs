//! Oracle dialect
//!
//! Oracle specifics handled during parsing: `MINUS`, `(+)` outer join marks,
//! `FETCH FIRST`, hierarchical `CONNECT BY` clauses and table aliases written
//! without `AS`. Oracle `DATE` holds a time of day, so it maps to a timestamp.

use super::{DialectImpl, DialectType};
use crate::expressions::{DataType, Expression, TimestampZone};
use crate::generator::GeneratorConfig;
use crate::grammar::Grammar;
use crate::rules::{as_function, call_at, unit_text, DialectMatch, Finding, RewriteRule, RuleContext, RuleOutcome};
use crate::tokens::{TokenType, TokenizerConfig};

const ORACLE: DialectMatch = DialectMatch::Source(DialectType::Oracle);

/// `TRUNC` format elements and the `DATE_TRUNC` unit they select
const TRUNC_UNITS: &[(&str, &str)] = &[
    ("SYYYY", "YEAR"),
    ("YYYY", "YEAR"),
    ("YEAR", "YEAR"),
    ("YYY", "YEAR"),
    ("YY", "YEAR"),
    ("Y", "YEAR"),
    ("Q", "QUARTER"),
    ("MONTH", "MONTH"),
    ("MON", "MONTH"),
    ("MM", "MONTH"),
    ("RM", "MONTH"),
    ("IW", "WEEK"),
    ("DDD", "DAY"),
    ("DD", "DAY"),
    ("J", "DAY"),
    ("HH24", "HOUR"),
    ("HH12", "HOUR"),
    ("HH", "HOUR"),
    ("MI", "MINUTE"),
];

/// Oracle dialect
pub struct OracleDialect;

impl DialectImpl for OracleDialect {
    fn dialect_type(&self) -> DialectType {
        DialectType::Oracle
    }

    fn tokenizer_config(&self) -> TokenizerConfig {
        TokenizerConfig::default().with_keyword("MINUS", TokenType::Except)
    }

    fn grammar(&self) -> Grammar {
        Grammar {
            supports_fetch_first: true,
            supports_join_mark: true,
            select_extensions: vec!["CONNECT", "START"],
            ..Grammar::standard(DialectType::Oracle)
        }
    }

    fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            table_alias_as: false,
            ..GeneratorConfig::new(DialectType::Oracle)
        }
    }

    fn rules(&self) -> Vec<RewriteRule> {
        vec![
            RewriteRule::data_type("oracle_date", ORACLE, 195, date),
            RewriteRule::function("trunc_to_date_trunc", ORACLE, 100, "TRUNC", trunc),
            RewriteRule::expression("sequence_pseudocolumns", ORACLE, 300, sequences),
        ]
    }
}

fn date(ty: &DataType, ctx: &RuleContext<'_>) -> RuleOutcome<DataType> {
    if *ty != DataType::Date {
        return RuleOutcome::Unchanged;
    }
    let timestamp = DataType::Timestamp {
        precision: None,
        zone: TimestampZone::Without,
    };
    match ctx.column {
        Some(column) => RuleOutcome::risk(
            timestamp,
            Finding::info("DATE_AS_TIMESTAMP", format!("DATE column `{column}` keeps its time of day as TIMESTAMP_NTZ")),
        ),
        None => RuleOutcome::Replaced(timestamp),
    }
}

/// `TRUNC(d, 'fmt')`; a single argument may be a date or a number
fn trunc(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(f) = as_function(expr) else {
        return RuleOutcome::Unchanged;
    };
    match f.args.as_slice() {
        [_] => RuleOutcome::risk(
            expr.clone(),
            Finding::risk("TRUNC_AMBIGUOUS", "TRUNC with one argument truncates a date or a number")
                .with_hint("use DATE_TRUNC('DAY', x) for dates, CAST(x AS BIGINT) for numbers"),
        ),
        [value, format] => {
            let Some(format) = unit_text(format) else {
                return RuleOutcome::Unchanged;
            };
            if format.chars().all(|c| c.is_ascii_digit()) {
                // numeric TRUNC(n, places)
                return RuleOutcome::Unchanged;
            }
            match TRUNC_UNITS.iter().find(|(element, _)| *element == format) {
                Some((_, unit)) => {
                    RuleOutcome::Replaced(call_at(f, "DATE_TRUNC", vec![Expression::string(*unit), value.clone()]))
                }
                None => RuleOutcome::Unmappable(Finding::unmappable(
                    "UNSUPPORTED_DATE_PART",
                    format!("TRUNC format '{format}' has no DATE_TRUNC unit"),
                )),
            }
        }
        _ => RuleOutcome::Unchanged,
    }
}

/// `seq.NEXTVAL`, `seq.CURRVAL`
fn sequences(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Expression::Column(column) = expr else {
        return RuleOutcome::Unchanged;
    };
    let pseudo = column.name.name.to_uppercase();
    if column.qualifier.is_empty() || !matches!(pseudo.as_str(), "NEXTVAL" | "CURRVAL") {
        return RuleOutcome::Unchanged;
    }
    RuleOutcome::Unmappable(
        Finding::unmappable("SEQUENCE_UNSUPPORTED", format!("sequence reference `{column}` has no Databricks equivalent"))
            .with_hint("use an identity column or monotonically_increasing_id()")
            .at(column.span),
    )
}

#[cfg(test)]
mod tests {
    use crate::dialects::DialectType;
    use crate::rules::test_support::{codes, convert, sql};
    use pretty_assertions::assert_eq;

    const ORA: DialectType = DialectType::Oracle;

    #[test]
    fn test_date_columns_become_timestamps() {
        let result = convert(ORA, "CREATE TABLE emp (id NUMBER(10), hired DATE)");
        assert_eq!(result.sql, "CREATE TABLE emp (id DECIMAL(10, 0), hired TIMESTAMP_NTZ)");
        assert_eq!(codes(&result), vec!["DATE_AS_TIMESTAMP"]);
    }

    #[test]
    fn test_trunc_with_format() {
        assert_eq!(
            sql(ORA, "SELECT TRUNC(hired, 'MM'), TRUNC(amount, 2) FROM emp"),
            "SELECT DATE_TRUNC('MONTH', hired), TRUNC(amount, 2) FROM emp"
        );
        let result = convert(ORA, "SELECT TRUNC(hired) FROM emp");
        assert_eq!(result.sql, "SELECT TRUNC(hired) FROM emp");
        assert_eq!(codes(&result), vec!["TRUNC_AMBIGUOUS"]);
    }

    #[test]
    fn test_minus_and_sequences() {
        assert_eq!(
            sql(ORA, "SELECT id FROM a MINUS SELECT id FROM b"),
            "SELECT id FROM a EXCEPT SELECT id FROM b"
        );
        let result = convert(ORA, "SELECT order_seq.NEXTVAL FROM DUAL");
        assert!(result.report.has_errors());
        assert_eq!(codes(&result), vec!["SEQUENCE_UNSUPPORTED"]);
    }

    #[test]
    fn test_connect_by_is_unsupported() {
        let result = convert(ORA, "SELECT id FROM emp START WITH mgr IS NULL CONNECT BY PRIOR id = mgr");
        assert!(result.report.has_errors());
        assert!(codes(&result).iter().any(|c| c == "UNSUPPORTED_CONSTRUCT"));
    }
}
