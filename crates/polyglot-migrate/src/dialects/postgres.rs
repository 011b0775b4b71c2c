//! PostgreSQL dialect
//!
//! PostgreSQL brings `$$` strings, `::` casts, `^` exponentiation, `ILIKE`,
//! `ARRAY[...]` literals and set-returning functions in FROM. Redshift reuses
//! the tokenizer and most of the grammar.

use super::{DialectImpl, DialectType};
use crate::expressions::{BinaryOperator, Expression, Function, Identifier, Select, TableAlias, TableFactor};
use crate::generator::{ArrayLiteralStyle, GeneratorConfig};
use crate::grammar::Grammar;
use crate::rules::{as_function, call_at, DialectMatch, Finding, RewriteRule, RuleContext, RuleOutcome};
use crate::tokens::TokenizerConfig;

const POSTGRES_FAMILY: DialectMatch = DialectMatch::Sources(&[DialectType::PostgreSQL, DialectType::Redshift]);

/// Characters that make a `SPLIT` delimiter a non-literal pattern
const REGEX_META: &[char] = &['.', '^', '$', '|', '?', '*', '+', '(', ')', '[', ']', '{', '}', '\\'];

/// PostgreSQL dialect
pub struct PostgresDialect;

impl DialectImpl for PostgresDialect {
    fn dialect_type(&self) -> DialectType {
        DialectType::PostgreSQL
    }

    fn tokenizer_config(&self) -> TokenizerConfig {
        let mut config = TokenizerConfig::default();
        config.dollar_strings = true;
        config
    }

    fn grammar(&self) -> Grammar {
        Grammar {
            double_colon_cast: true,
            caret_is_power: true,
            supports_fetch_first: true,
            supports_ilike: true,
            ..Grammar::standard(DialectType::PostgreSQL)
        }
    }

    fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            array_literal: ArrayLiteralStyle::ArrayBracket,
            ..GeneratorConfig::new(DialectType::PostgreSQL)
        }
    }

    fn rules(&self) -> Vec<RewriteRule> {
        vec![
            RewriteRule::select("generate_series_to_range", POSTGRES_FAMILY, 300, generate_series),
            RewriteRule::function("string_to_array", POSTGRES_FAMILY, 100, "STRING_TO_ARRAY", string_to_array),
            RewriteRule::function("array_length_to_size", POSTGRES_FAMILY, 100, "ARRAY_LENGTH", array_length),
        ]
    }
}

/// `stop + 1`, folded when `stop` is an integer literal
fn inclusive_stop(stop: &Expression) -> Expression {
    match stop.as_integer() {
        Some(n) => Expression::number(n + 1),
        None => Expression::binary(BinaryOperator::Plus, stop.clone(), Expression::number(1)),
    }
}

/// Replacement for a `generate_series(...)` call in FROM
fn series_factor(call: &Function, alias: Option<&TableAlias>) -> Option<TableFactor> {
    let (function, lateral) = match call.args.as_slice() {
        [start, stop] => (Function::new("RANGE", vec![start.clone(), inclusive_stop(stop)]), false),
        [start, stop, Expression::Interval(step)] => {
            let sequence = Expression::function(
                "SEQUENCE",
                vec![start.clone(), stop.clone(), Expression::Interval(step.clone())],
            );
            (Function::new("EXPLODE", vec![sequence]), true)
        }
        [start, stop, step] => (
            Function::new("RANGE", vec![start.clone(), inclusive_stop(stop), step.clone()]),
            false,
        ),
        _ => return None,
    };
    // the single output column is named after the alias, or after the function
    let alias = match alias {
        Some(alias) if !alias.columns.is_empty() => alias.clone(),
        Some(alias) => TableAlias {
            name: alias.name.clone(),
            columns: vec![alias.name.clone()],
        },
        None => TableAlias {
            name: Identifier::new("generate_series"),
            columns: vec![Identifier::new("generate_series")],
        },
    };
    Some(TableFactor::Function {
        lateral,
        function: Box::new(Function {
            span: call.span,
            ..function
        }),
        alias: Some(alias),
    })
}

/// `FROM generate_series(a, b [, step]) AS g`
fn generate_series(select: &Select, _ctx: &RuleContext<'_>) -> RuleOutcome<Select> {
    let Some(from) = &select.from else {
        return RuleOutcome::Unchanged;
    };
    let is_series = |factor: &TableFactor| {
        matches!(factor, TableFactor::Function { function, .. } if function.name == "GENERATE_SERIES")
    };
    if !from.relations.iter().chain(from.joins.iter().map(|j| &j.relation)).any(is_series) {
        return RuleOutcome::Unchanged;
    }

    let mut rewritten = select.clone();
    let Some(out_from) = rewritten.from.as_mut() else {
        return RuleOutcome::Unchanged;
    };
    let factors = out_from
        .relations
        .iter_mut()
        .chain(out_from.joins.iter_mut().map(|j| &mut j.relation));
    for factor in factors {
        let TableFactor::Function { function, alias, .. } = &*factor else {
            continue;
        };
        if function.name != "GENERATE_SERIES" {
            continue;
        }
        let span = function.span;
        let Some(replacement) = series_factor(function, alias.as_ref()) else {
            return RuleOutcome::Unmappable(
                Finding::unmappable("UNSUPPORTED_FUNCTION", "generate_series needs a start and a stop").at(span),
            );
        };
        *factor = replacement;
    }
    RuleOutcome::Replaced(rewritten)
}

/// `STRING_TO_ARRAY(s, delimiter)`; `SPLIT` reads the delimiter as a regular expression
fn string_to_array(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(f) = as_function(expr) else {
        return RuleOutcome::Unchanged;
    };
    let [value, delimiter] = f.args.as_slice() else {
        return RuleOutcome::Unchanged;
    };
    match delimiter.as_string() {
        Some(d) if !d.contains(REGEX_META) => {
            RuleOutcome::Replaced(call_at(f, "SPLIT", vec![value.clone(), delimiter.clone()]))
        }
        Some(d) => {
            let escaped: String = d
                .chars()
                .flat_map(|c| if REGEX_META.contains(&c) { vec!['\\', c] } else { vec![c] })
                .collect();
            RuleOutcome::Replaced(call_at(f, "SPLIT", vec![value.clone(), Expression::string(escaped)]))
        }
        None => RuleOutcome::risk(
            call_at(f, "SPLIT", vec![value.clone(), delimiter.clone()]),
            Finding::risk("SPLIT_REGEX", "SPLIT treats the delimiter as a regular expression")
                .with_hint("escape regular expression characters in the delimiter"),
        ),
    }
}

/// `ARRAY_LENGTH(a, 1)`
fn array_length(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(f) = as_function(expr) else {
        return RuleOutcome::Unchanged;
    };
    match f.args.as_slice() {
        [array, dimension] if dimension.as_integer() == Some(1) => {
            RuleOutcome::Replaced(call_at(f, "SIZE", vec![array.clone()]))
        }
        [_, _] => RuleOutcome::Unmappable(Finding::unmappable(
            "UNSUPPORTED_FUNCTION",
            "ARRAY_LENGTH of an inner dimension has no equivalent",
        )),
        _ => RuleOutcome::Unchanged,
    }
}

#[cfg(test)]
mod tests {
    use crate::dialects::DialectType;
    use crate::rules::test_support::{codes, convert, sql};
    use pretty_assertions::assert_eq;

    const PG: DialectType = DialectType::PostgreSQL;

    #[test]
    fn test_generate_series_becomes_range() {
        assert_eq!(
            sql(PG, "SELECT n FROM generate_series(1, 10) AS n"),
            "SELECT n FROM RANGE(1, 11) AS n (n)"
        );
        assert_eq!(
            sql(PG, "SELECT g.i FROM generate_series(0, total, 5) AS g(i)"),
            "SELECT g.i FROM RANGE(0, total + 1, 5) AS g (i)"
        );
    }

    #[test]
    fn test_interval_series_uses_sequence() {
        assert_eq!(
            sql(PG, "SELECT d FROM generate_series(a, b, INTERVAL '1 day') AS d"),
            "SELECT d FROM LATERAL EXPLODE(SEQUENCE(a, b, INTERVAL '1 day')) AS d (d)"
        );
    }

    #[test]
    fn test_string_to_array_escapes_delimiter() {
        assert_eq!(
            sql(PG, "SELECT STRING_TO_ARRAY(tags, ','), STRING_TO_ARRAY(path, '.') FROM t"),
            "SELECT SPLIT(tags, ','), SPLIT(path, '\\\\.') FROM t"
        );
    }

    #[test]
    fn test_array_length() {
        assert_eq!(sql(PG, "SELECT ARRAY_LENGTH(tags, 1) FROM t"), "SELECT SIZE(tags) FROM t");
        let result = convert(PG, "SELECT ARRAY_LENGTH(grid, 2) FROM t");
        assert_eq!(codes(&result), vec!["UNSUPPORTED_FUNCTION"]);
    }

    #[test]
    fn test_power_and_casts() {
        assert_eq!(sql(PG, "SELECT a ^ 2, b::INT FROM t"), "SELECT POWER(a, 2), b::INT FROM t");
    }
}
