//! BigQuery dialect
//!
//! GoogleSQL quotes paths with backticks, accepts `"..."` strings, writes
//! arrays as `[...]` and expands arrays with `UNNEST` in FROM. Truncation
//! functions take the value first and a bare date part second.

use super::{DialectImpl, DialectType};
use crate::expressions::{Expression, Function, Identifier, JoinKind, Select, TableAlias, TableFactor};
use crate::generator::{ArrayLiteralStyle, GeneratorConfig};
use crate::grammar::Grammar;
use crate::rules::{
    as_function, call_at, renamed, unit_text, DialectMatch, Finding, RewriteRule, RuleContext, RuleOutcome,
};
use crate::tokens::TokenizerConfig;

const BIGQUERY: DialectMatch = DialectMatch::Source(DialectType::BigQuery);

const RENAMES: &[(&str, &str)] = &[
    ("SAFE_DIVIDE", "TRY_DIVIDE"),
    ("ARRAY_LENGTH", "SIZE"),
    ("GENERATE_UUID", "UUID"),
    ("LOGICAL_AND", "BOOL_AND"),
    ("LOGICAL_OR", "BOOL_OR"),
];

const TRUNC_FUNCTIONS: &[&str] = &["DATE_TRUNC", "DATETIME_TRUNC", "TIMESTAMP_TRUNC"];

/// BigQuery dialect
pub struct BigQueryDialect;

impl DialectImpl for BigQueryDialect {
    fn dialect_type(&self) -> DialectType {
        DialectType::BigQuery
    }

    fn tokenizer_config(&self) -> TokenizerConfig {
        let mut config = TokenizerConfig::default().with_identifiers(&[('`', '`')]);
        config.double_quote_strings = true;
        config.string_escapes.push('\\');
        config
    }

    fn grammar(&self) -> Grammar {
        Grammar {
            supports_qualify: true,
            ..Grammar::standard(DialectType::BigQuery)
        }
    }

    fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            identifier_quote: ('`', '`'),
            backslash_escapes: true,
            array_literal: ArrayLiteralStyle::Bracket,
            union_distinct: true,
            ..GeneratorConfig::new(DialectType::BigQuery)
        }
    }

    fn rules(&self) -> Vec<RewriteRule> {
        let mut rules = vec![RewriteRule::select("unnest_to_explode", BIGQUERY, 300, unnest)];
        rules.extend(
            RENAMES
                .iter()
                .map(|(from, _)| RewriteRule::function("bigquery_rename", BIGQUERY, 100, from, rename)),
        );
        rules.extend(
            TRUNC_FUNCTIONS
                .iter()
                .map(|name| RewriteRule::function("truncation_unit_first", BIGQUERY, 100, name, truncate)),
        );
        rules
    }
}

fn rename(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let name = match expr {
        Expression::Function(f) => f.name.as_str(),
        Expression::Window(w) => w.function.name.as_str(),
        _ => return RuleOutcome::Unchanged,
    };
    RENAMES
        .iter()
        .find(|(from, _)| *from == name)
        .and_then(|(_, to)| renamed(expr, to))
        .map_or(RuleOutcome::Unchanged, RuleOutcome::Replaced)
}

/// `DATE_TRUNC(d, MONTH)` to `DATE_TRUNC('MONTH', d)`
fn truncate(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(f) = as_function(expr) else {
        return RuleOutcome::Unchanged;
    };
    let [value, part] = f.args.as_slice() else {
        return RuleOutcome::Unchanged;
    };
    if value.as_string().is_some() {
        return RuleOutcome::Unchanged;
    }
    match unit_text(part) {
        Some(unit) => RuleOutcome::Replaced(call_at(f, "DATE_TRUNC", vec![Expression::string(unit), value.clone()])),
        // WEEK(MONDAY) and friends
        None => RuleOutcome::Unmappable(
            Finding::unmappable("UNSUPPORTED_DATE_PART", format!("{} date part cannot be translated", f.name))
                .with_hint("weeks always start on Monday in DATE_TRUNC"),
        ),
    }
}

/// `FROM t, UNNEST(t.tags) AS tag` and `CROSS JOIN UNNEST(...)`
fn unnest(select: &Select, _ctx: &RuleContext<'_>) -> RuleOutcome<Select> {
    let Some(from) = &select.from else {
        return RuleOutcome::Unchanged;
    };
    let is_unnest =
        |factor: &TableFactor| matches!(factor, TableFactor::Function { function, .. } if function.name == "UNNEST");
    if !from.relations.iter().chain(from.joins.iter().map(|j| &j.relation)).any(is_unnest) {
        return RuleOutcome::Unchanged;
    }

    let mut rewritten = select.clone();
    let Some(out_from) = rewritten.from.as_mut() else {
        return RuleOutcome::Unchanged;
    };
    let mut factors: Vec<(&mut TableFactor, bool)> = out_from.relations.iter_mut().map(|f| (f, false)).collect();
    factors.extend(
        out_from
            .joins
            .iter_mut()
            .map(|j| (&mut j.relation, j.kind == JoinKind::Left)),
    );
    for (factor, outer) in factors {
        let TableFactor::Function { function, alias, .. } = &*factor else {
            continue;
        };
        if function.name != "UNNEST" {
            continue;
        }
        let [array] = function.args.as_slice() else {
            return RuleOutcome::Unmappable(
                Finding::unmappable("UNSUPPORTED_FUNCTION", "UNNEST of several arrays has no generator equivalent")
                    .at(function.span),
            );
        };
        let name = alias
            .as_ref()
            .map_or_else(|| Identifier::new("element"), |a| a.name.clone());
        let mut generator = Function::new(if outer { "EXPLODE_OUTER" } else { "EXPLODE" }, vec![array.clone()]);
        generator.span = function.span;
        *factor = TableFactor::Function {
            lateral: true,
            function: Box::new(generator),
            alias: Some(TableAlias {
                name: name.clone(),
                columns: vec![name],
            }),
        };
    }
    RuleOutcome::Replaced(rewritten)
}

#[cfg(test)]
mod tests {
    use crate::dialects::DialectType;
    use crate::rules::test_support::{codes, convert, sql};
    use pretty_assertions::assert_eq;

    const BQ: DialectType = DialectType::BigQuery;

    #[test]
    fn test_unnest_becomes_explode() {
        assert_eq!(
            sql(BQ, "SELECT o.id, item FROM orders AS o, UNNEST(o.items) AS item"),
            "SELECT o.id, item FROM orders AS o, LATERAL EXPLODE(o.items) AS item (item)"
        );
    }

    #[test]
    fn test_renames() {
        assert_eq!(
            sql(BQ, "SELECT SAFE_DIVIDE(a, b), ARRAY_LENGTH(tags), GENERATE_UUID() FROM ds.t"),
            "SELECT TRY_DIVIDE(a, b), SIZE(tags), UUID() FROM ds.t"
        );
    }

    #[test]
    fn test_truncation_unit_moves_first() {
        assert_eq!(
            sql(BQ, "SELECT TIMESTAMP_TRUNC(created, HOUR) FROM t"),
            "SELECT DATE_TRUNC('HOUR', created) FROM t"
        );
        let result = convert(BQ, "SELECT DATE_TRUNC(d, WEEK(MONDAY)) FROM t");
        assert_eq!(codes(&result), vec!["UNSUPPORTED_DATE_PART"]);
    }

    #[test]
    fn test_backtick_paths() {
        assert_eq!(sql(BQ, "SELECT `name` FROM `ds`.`users`"), "SELECT `name` FROM `ds`.`users`");
    }
}
