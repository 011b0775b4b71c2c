//! Snowflake dialect
//!
//! Snowflake adds `$$` strings, `x::type` casts, `col:path` access into
//! VARIANT values, `QUALIFY`, `MATCH_RECOGNIZE` and `SELECT * EXCLUDE (...)`.
//! `LATERAL FLATTEN(...)` becomes an `EXPLODE` family generator; the other
//! semi-structured functions are mapped by the shared function rules.

use super::{DialectImpl, DialectType};
use crate::expressions::{Expression, Function, Identifier, Select, TableAlias, TableFactor};
use crate::generator::{ArrayLiteralStyle, GeneratorConfig};
use crate::grammar::Grammar;
use crate::rules::{as_function, call_at, DialectMatch, Finding, RewriteRule, RuleContext, RuleOutcome};
use crate::tokens::TokenizerConfig;
use crate::traversal::ExpressionWalk;

const SNOWFLAKE: DialectMatch = DialectMatch::Source(DialectType::Snowflake);

/// FLATTEN output columns with no `EXPLODE` counterpart
const FLATTEN_ONLY_COLUMNS: &[&str] = &["KEY", "PATH", "THIS", "SEQ"];

/// Snowflake dialect
pub struct SnowflakeDialect;

impl DialectImpl for SnowflakeDialect {
    fn dialect_type(&self) -> DialectType {
        DialectType::Snowflake
    }

    fn tokenizer_config(&self) -> TokenizerConfig {
        let mut config = TokenizerConfig::default();
        config.dollar_strings = true;
        config.string_escapes.push('\\');
        config
    }

    fn grammar(&self) -> Grammar {
        Grammar {
            double_colon_cast: true,
            colon_json_access: true,
            supports_top: true,
            supports_fetch_first: true,
            supports_qualify: true,
            supports_ilike: true,
            select_extensions: vec!["CONNECT", "START"],
            table_extensions: vec!["PIVOT", "UNPIVOT", "TABLESAMPLE", "SAMPLE", "MATCH_RECOGNIZE", "CHANGES"],
            ..Grammar::standard(DialectType::Snowflake)
        }
    }

    fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            star_except_keyword: "EXCLUDE",
            array_literal: ArrayLiteralStyle::Bracket,
            backslash_escapes: true,
            ..GeneratorConfig::new(DialectType::Snowflake)
        }
    }

    fn rules(&self) -> Vec<RewriteRule> {
        vec![
            RewriteRule::select("flatten_to_explode", SNOWFLAKE, 300, flatten),
            RewriteRule::function("array_contains_arguments", SNOWFLAKE, 100, "ARRAY_CONTAINS", array_contains),
            RewriteRule::function("strtok_to_array", SNOWFLAKE, 100, "STRTOK_TO_ARRAY", strtok_to_array),
        ]
    }
}

/// The `FLATTEN` call behind a FROM item and the alias it is known by
fn flatten_call(factor: &TableFactor) -> Option<(&Function, Option<&TableAlias>)> {
    let TableFactor::Function { function, alias, .. } = factor else {
        return None;
    };
    match function.name.as_str() {
        "FLATTEN" => Some((function, alias.as_ref())),
        "TABLE" => match function.args.as_slice() {
            [Expression::Function(inner)] if inner.name == "FLATTEN" => Some((inner, alias.as_ref())),
            _ => None,
        },
        _ => None,
    }
}

#[derive(Debug, Default)]
struct FlattenArgs {
    input: Option<Expression>,
    outer: bool,
    path: bool,
    recursive: bool,
}

fn flatten_args(function: &Function) -> FlattenArgs {
    let mut args = FlattenArgs::default();
    for arg in &function.args {
        match arg {
            Expression::NamedArgument(named) => match named.name.name.to_uppercase().as_str() {
                "INPUT" => args.input = Some(named.value.clone()),
                "OUTER" => args.outer = named.value == Expression::Boolean(true),
                "RECURSIVE" => args.recursive = named.value == Expression::Boolean(true),
                "PATH" => args.path = true,
                _ => {}
            },
            positional if args.input.is_none() => args.input = Some(positional.clone()),
            _ => {}
        }
    }
    args
}

/// Uppercase names of `alias.column` references in the SELECT
fn referenced_columns(select: &Select, alias: Option<&Identifier>) -> Vec<String> {
    let mut roots: Vec<&Expression> = select.projection.iter().collect();
    roots.extend(select.where_clause.as_ref().map(|w| &w.condition));
    roots.extend(select.having.as_ref().map(|h| &h.condition));
    roots.extend(select.qualify.as_ref().map(|q| &q.condition));
    if let Some(group_by) = &select.group_by {
        roots.extend(&group_by.expressions);
    }
    let mut names = Vec::new();
    for root in roots {
        for expr in root.dfs() {
            let Expression::Column(column) = expr else {
                continue;
            };
            let matches = match (alias, column.table()) {
                (Some(alias), Some(table)) => table.key(false) == alias.key(false),
                (None, None) => true,
                _ => false,
            };
            if matches {
                names.push(column.name.name.to_uppercase());
            }
        }
    }
    names
}

/// `LATERAL FLATTEN(input => x) f` and `TABLE(FLATTEN(x)) f`
fn flatten(select: &Select, _ctx: &RuleContext<'_>) -> RuleOutcome<Select> {
    let Some(from) = &select.from else {
        return RuleOutcome::Unchanged;
    };
    let has_flatten = from
        .relations
        .iter()
        .chain(from.joins.iter().map(|j| &j.relation))
        .any(|factor| flatten_call(factor).is_some());
    if !has_flatten {
        return RuleOutcome::Unchanged;
    }

    let mut rewritten = select.clone();
    let mut findings = Vec::new();
    let Some(out_from) = rewritten.from.as_mut() else {
        return RuleOutcome::Unchanged;
    };
    let factors = out_from
        .relations
        .iter_mut()
        .chain(out_from.joins.iter_mut().map(|j| &mut j.relation));
    for factor in factors {
        let Some((call, alias)) = flatten_call(factor).map(|(call, alias)| (call.clone(), alias.cloned())) else {
            continue;
        };
        let args = flatten_args(&call);
        let Some(input) = args.input.clone() else {
            return RuleOutcome::Unmappable(Finding::unmappable("UNSUPPORTED_FLATTEN", "FLATTEN without an input"));
        };
        if args.recursive || args.path {
            return RuleOutcome::Unmappable(
                Finding::unmappable("UNSUPPORTED_FLATTEN", "FLATTEN with PATH or RECURSIVE has no generator equivalent")
                    .with_hint("extract the nested array first, then EXPLODE it")
                    .at(call.span),
            );
        }

        let used = referenced_columns(select, alias.as_ref().map(|a| &a.name));
        let positional = used.iter().any(|c| c == "INDEX");
        for column in FLATTEN_ONLY_COLUMNS {
            if used.iter().any(|c| c == column) {
                findings.push(
                    Finding::risk("FLATTEN_COLUMN_DROPPED", format!("FLATTEN column {column} is not produced by EXPLODE"))
                        .with_hint("use explode on map_entries() for object keys"),
                );
            }
        }

        let name = match (positional, args.outer) {
            (false, false) => "EXPLODE",
            (false, true) => "EXPLODE_OUTER",
            (true, false) => "POSEXPLODE",
            (true, true) => "POSEXPLODE_OUTER",
        };
        let mut columns = Vec::new();
        if positional {
            columns.push(Identifier::new("index"));
        }
        columns.push(Identifier::new("value"));
        let alias_name = alias.map_or_else(|| Identifier::new("flattened"), |a| a.name);
        let mut generator = Function::new(name, vec![input]);
        generator.span = call.span;
        *factor = TableFactor::Function {
            lateral: true,
            function: Box::new(generator),
            alias: Some(TableAlias {
                name: alias_name,
                columns,
            }),
        };
    }
    RuleOutcome::with_findings(rewritten, findings)
}

/// Snowflake takes the value first: `ARRAY_CONTAINS(value, array)`
fn array_contains(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    match as_function(expr) {
        Some(f) if f.args.len() == 2 => {
            RuleOutcome::Replaced(call_at(f, "ARRAY_CONTAINS", vec![f.args[1].clone(), f.args[0].clone()]))
        }
        _ => RuleOutcome::Unchanged,
    }
}

fn strtok_to_array(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(f) = as_function(expr) else {
        return RuleOutcome::Unchanged;
    };
    let (value, delimiters) = match f.args.as_slice() {
        [value] => (value.clone(), Expression::string(" ")),
        [value, delimiters] => (value.clone(), delimiters.clone()),
        _ => return RuleOutcome::Unchanged,
    };
    RuleOutcome::risk(
        call_at(f, "SPLIT", vec![value, delimiters]),
        Finding::risk(
            "STRTOK_DELIMITERS",
            "STRTOK_TO_ARRAY splits on any listed character and drops empty tokens; SPLIT takes a regular expression",
        ),
    )
}

#[cfg(test)]
mod tests {
    use crate::dialects::DialectType;
    use crate::rules::test_support::{codes, convert, sql};
    use pretty_assertions::assert_eq;

    const SF: DialectType = DialectType::Snowflake;

    #[test]
    fn test_backslash_escapes_in_strings() {
        let result = convert(SF, r"SELECT 'It\'s', 'C:\\dir', 'a\tb' FROM t");
        assert!(!codes(&result).contains(&"LEX_ERROR".to_string()), "{:?}", codes(&result));
        assert_eq!(result.sql, "SELECT 'It\\'s', 'C:\\\\dir', 'a\tb' FROM t");
    }

    #[test]
    fn test_lateral_flatten_becomes_explode() {
        let result = convert(SF, "SELECT o.id, f.value FROM orders o, LATERAL FLATTEN(input => o.items) f");
        assert_eq!(
            result.sql,
            "SELECT o.id, f.value FROM orders AS o, LATERAL EXPLODE(o.items) AS f (value)"
        );
        assert!(result.report.is_empty());
    }

    #[test]
    fn test_flatten_index_uses_posexplode() {
        assert_eq!(
            sql(SF, "SELECT f.index, f.value FROM t, TABLE(FLATTEN(t.tags)) f"),
            "SELECT f.index, f.value FROM t, LATERAL POSEXPLODE(t.tags) AS f (index, value)"
        );
    }

    #[test]
    fn test_outer_flatten() {
        assert_eq!(
            sql(SF, "SELECT f.value FROM t, LATERAL FLATTEN(input => t.tags, outer => TRUE) f"),
            "SELECT f.value FROM t, LATERAL EXPLODE_OUTER(t.tags) AS f (value)"
        );
    }

    #[test]
    fn test_flatten_key_is_reported() {
        let result = convert(SF, "SELECT f.key, f.value FROM t, LATERAL FLATTEN(input => t.attrs) f");
        assert_eq!(codes(&result), vec!["FLATTEN_COLUMN_DROPPED"]);
    }

    #[test]
    fn test_recursive_flatten_is_unmappable() {
        let result = convert(SF, "SELECT f.value FROM t, LATERAL FLATTEN(input => t.doc, recursive => TRUE) f");
        assert!(result.report.has_errors());
        assert_eq!(codes(&result), vec!["UNSUPPORTED_FLATTEN"]);
    }

    #[test]
    fn test_array_contains_argument_order() {
        assert_eq!(
            sql(SF, "SELECT ARRAY_CONTAINS('x', tags) FROM t"),
            "SELECT ARRAY_CONTAINS(tags, 'x') FROM t"
        );
    }
}
