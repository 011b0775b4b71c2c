//! MySQL dialect
//!
//! MySQL quotes names with backticks, accepts `"..."` strings and backslash
//! escapes, starts comments with `#`, treats `||` as logical OR and has `DIV`
//! and `XOR` operators. `CONVERT` takes either a type or a character set.

use super::{DialectImpl, DialectType};
use crate::expressions::{BinaryOperator, Cast, CastKind, Expression, NamedArgStyle};
use crate::generator::GeneratorConfig;
use crate::grammar::Grammar;
use crate::rules::{as_function, call_at, DialectMatch, Finding, RewriteRule, RuleContext, RuleOutcome};
use crate::tokens::TokenizerConfig;

const MYSQL: DialectMatch = DialectMatch::Source(DialectType::MySQL);

/// MySQL dialect
pub struct MySQLDialect;

impl DialectImpl for MySQLDialect {
    fn dialect_type(&self) -> DialectType {
        DialectType::MySQL
    }

    fn tokenizer_config(&self) -> TokenizerConfig {
        let mut config = TokenizerConfig::default().with_identifiers(&[('`', '`')]);
        config.double_quote_strings = true;
        config.string_escapes.push('\\');
        config.hash_comments = true;
        config
    }

    fn grammar(&self) -> Grammar {
        Grammar {
            dpipe_is_concat: false,
            div_keyword: true,
            ..Grammar::standard(DialectType::MySQL)
        }
    }

    fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            identifier_quote: ('`', '`'),
            backslash_escapes: true,
            concat_operator: false,
            ..GeneratorConfig::new(DialectType::MySQL)
        }
    }

    fn rules(&self) -> Vec<RewriteRule> {
        vec![
            RewriteRule::expression("xor_expansion", MYSQL, 300, xor),
            RewriteRule::function("mysql_convert", MYSQL, 100, "CONVERT", convert),
            RewriteRule::function("curdate", MYSQL, 100, "CURDATE", curdate),
            RewriteRule::function("last_insert_id", MYSQL, 100, "LAST_INSERT_ID", last_insert_id),
        ]
    }
}

/// `a XOR b` as `(a AND NOT b) OR (NOT a AND b)`
fn xor(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Expression::Binary(binary) = expr else {
        return RuleOutcome::Unchanged;
    };
    if binary.op != BinaryOperator::Xor {
        return RuleOutcome::Unchanged;
    }
    let (a, b) = (binary.left.clone(), binary.right.clone());
    let left = Expression::binary(BinaryOperator::And, a.clone(), Expression::not(b.clone()));
    let right = Expression::binary(BinaryOperator::And, Expression::not(a), b);
    RuleOutcome::Replaced(Expression::binary(
        BinaryOperator::Or,
        Expression::paren(left),
        Expression::paren(right),
    ))
}

/// `CONVERT(x, type)` and `CONVERT(x USING charset)`
fn convert(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(f) = as_function(expr) else {
        return RuleOutcome::Unchanged;
    };
    match f.args.as_slice() {
        [value, Expression::DataType(to)] => RuleOutcome::Replaced(Expression::Cast(Box::new(Cast {
            expr: value.clone(),
            to: to.clone(),
            kind: CastKind::Cast,
            format: None,
            span: f.span,
        }))),
        [value, Expression::NamedArgument(using)] if using.style == NamedArgStyle::Keyword => {
            let charset = match &using.value {
                Expression::Column(c) => c.name.name.clone(),
                _ => "the requested character set".to_string(),
            };
            RuleOutcome::risk(
                value.clone(),
                Finding::info("CHARSET_CONVERSION_DROPPED", format!("conversion to {charset} dropped; strings are UTF-8")),
            )
        }
        _ => RuleOutcome::Unchanged,
    }
}

fn curdate(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    match as_function(expr) {
        Some(f) if f.args.is_empty() => RuleOutcome::Replaced(call_at(f, "CURRENT_DATE", Vec::new())),
        _ => RuleOutcome::Unchanged,
    }
}

fn last_insert_id(_expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    RuleOutcome::Unmappable(
        Finding::unmappable("UNSUPPORTED_FUNCTION", "LAST_INSERT_ID has no Databricks equivalent")
            .with_hint("read the generated identity value back with a query on a natural key"),
    )
}

#[cfg(test)]
mod tests {
    use crate::dialects::DialectType;
    use crate::rules::test_support::{codes, convert, sql};
    use pretty_assertions::assert_eq;

    const MY: DialectType = DialectType::MySQL;

    #[test]
    fn test_xor_is_expanded() {
        assert_eq!(
            sql(MY, "SELECT a XOR b FROM t"),
            "SELECT (a AND NOT b) OR (NOT a AND b) FROM t"
        );
    }

    #[test]
    fn test_pipes_are_logical_or() {
        assert_eq!(sql(MY, "SELECT a || b FROM t"), "SELECT a OR b FROM t");
    }

    #[test]
    fn test_convert_forms() {
        let result = convert(MY, "SELECT CONVERT(price, DECIMAL(10, 2)), CONVERT(name USING utf8mb4) FROM t");
        assert_eq!(result.sql, "SELECT CAST(price AS DECIMAL(10, 2)), name FROM t");
        assert_eq!(codes(&result), vec!["CHARSET_CONVERSION_DROPPED"]);
    }

    #[test]
    fn test_quoting_and_dates() {
        assert_eq!(
            sql(MY, "SELECT `order`, CURDATE() FROM t WHERE note = \"it's\""),
            "SELECT `order`, CURRENT_DATE FROM t WHERE note = 'it\\'s'"
        );
    }

    #[test]
    fn test_last_insert_id_is_unmappable() {
        let result = convert(MY, "SELECT LAST_INSERT_ID()");
        assert!(result.report.has_errors());
    }
}
