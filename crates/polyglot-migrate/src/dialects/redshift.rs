//! Amazon Redshift dialect
//!
//! Redshift is PostgreSQL 8 with warehouse extensions: `TOP`, `QUALIFY`,
//! `DISTKEY`/`SORTKEY`/`DISTSTYLE` table attributes and column `ENCODE`
//! settings. Table attributes are handled by the shared DDL rules.

use super::{DialectImpl, DialectType, PostgresDialect};
use crate::expressions::Expression;
use crate::grammar::Grammar;
use crate::rules::{as_function, call_at, DialectMatch, Finding, RewriteRule, RuleContext, RuleOutcome};
use crate::tokens::TokenizerConfig;

/// Redshift dialect
pub struct RedshiftDialect;

impl DialectImpl for RedshiftDialect {
    fn dialect_type(&self) -> DialectType {
        DialectType::Redshift
    }

    fn tokenizer_config(&self) -> TokenizerConfig {
        PostgresDialect.tokenizer_config()
    }

    fn grammar(&self) -> Grammar {
        Grammar {
            dialect: DialectType::Redshift,
            supports_top: true,
            supports_qualify: true,
            ..PostgresDialect.grammar()
        }
    }

    fn rules(&self) -> Vec<RewriteRule> {
        vec![RewriteRule::function(
            "convert_timezone",
            DialectMatch::Sources(&[DialectType::Redshift, DialectType::Snowflake]),
            100,
            "CONVERT_TIMEZONE",
            convert_timezone,
        )]
    }
}

/// `CONVERT_TIMEZONE([source_tz,] target_tz, ts)`; a missing source zone means UTC
fn convert_timezone(expr: &Expression, ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(f) = as_function(expr) else {
        return RuleOutcome::Unchanged;
    };
    match f.args.as_slice() {
        [target, ts] => {
            let rewritten = call_at(f, "FROM_UTC_TIMESTAMP", vec![ts.clone(), target.clone()]);
            if ctx.source == DialectType::Snowflake {
                // Snowflake reads the zone from a TIMESTAMP_TZ value, not UTC
                return RuleOutcome::risk(
                    rewritten,
                    Finding::risk("TIMEZONE_ASSUMED_UTC", "the input timestamp is assumed to be in UTC")
                        .with_hint("use the three-argument form with the real source zone"),
                );
            }
            RuleOutcome::Replaced(rewritten)
        }
        [source, target, ts] => {
            let utc = call_at(f, "TO_UTC_TIMESTAMP", vec![ts.clone(), source.clone()]);
            RuleOutcome::Replaced(call_at(f, "FROM_UTC_TIMESTAMP", vec![utc, target.clone()]))
        }
        _ => RuleOutcome::Unchanged,
    }
}

#[cfg(test)]
mod tests {
    use crate::dialects::DialectType;
    use crate::rules::test_support::{codes, convert, sql};
    use pretty_assertions::assert_eq;

    const RS: DialectType = DialectType::Redshift;

    #[test]
    fn test_convert_timezone() {
        assert_eq!(
            sql(RS, "SELECT CONVERT_TIMEZONE('America/New_York', created) FROM t"),
            "SELECT FROM_UTC_TIMESTAMP(created, 'America/New_York') FROM t"
        );
        assert_eq!(
            sql(RS, "SELECT CONVERT_TIMEZONE('UTC', 'Asia/Tokyo', created) FROM t"),
            "SELECT FROM_UTC_TIMESTAMP(TO_UTC_TIMESTAMP(created, 'UTC'), 'Asia/Tokyo') FROM t"
        );
        let result = convert(DialectType::Snowflake, "SELECT CONVERT_TIMEZONE('UTC', created) FROM t");
        assert_eq!(codes(&result), vec!["TIMEZONE_ASSUMED_UTC"]);
    }

    #[test]
    fn test_top_and_postgres_rules() {
        assert_eq!(
            sql(RS, "SELECT TOP 3 STRING_TO_ARRAY(tags, ',') FROM t"),
            "SELECT SPLIT(tags, ',') FROM t LIMIT 3"
        );
    }

    #[test]
    fn test_distkey_and_sortkey() {
        let result = convert(RS, "CREATE TABLE sales (id INT, region VARCHAR(10)) DISTKEY(region) SORTKEY(id)");
        assert_eq!(result.sql, "CREATE TABLE sales (id INT, region STRING) CLUSTER BY (region, id)");
        assert!(codes(&result).iter().all(|c| c == "CLUSTER_BY_FROM_INDEX"));
    }
}
