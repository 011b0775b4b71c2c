//! Function mapping
//!
//! Renames and argument reshaping for scalar and aggregate functions whose
//! Databricks spelling differs from the source. Date and time functions live
//! in [`super::datetime`].

use super::{as_function, call_at, is_not_null, renamed, DialectMatch, Finding, RewriteRule, RuleContext, RuleOutcome};
use crate::config::SemiStructuredMapping;
use crate::dialects::DialectType;
use crate::expressions::{
    BinaryOperator, Case, Cast, CastKind, DataType, Expression, Function, IsNull, JsonAccess,
    JsonAccessKind, Literal, NamedArgStyle, Ordered,
};
use crate::traversal::same_expression;

/// One-to-one renames with identical arguments
const RENAMES: &[(&str, &str)] = &[
    ("NEWID", "UUID"),
    ("UUID_STRING", "UUID"),
    ("GEN_RANDOM_UUID", "UUID"),
    ("SYS_GUID", "UUID"),
    ("DATALENGTH", "OCTET_LENGTH"),
    ("LENGTHB", "OCTET_LENGTH"),
    ("REPLICATE", "REPEAT"),
    ("RANDOM", "RAND"),
    ("COUNTIF", "COUNT_IF"),
    ("STDEV", "STDDEV_SAMP"),
    ("STDEVP", "STDDEV_POP"),
    ("VARP", "VAR_POP"),
    ("ATN2", "ATAN2"),
    ("CHARACTER_LENGTH", "CHAR_LENGTH"),
    ("JSON_EXTRACT_SCALAR", "GET_JSON_OBJECT"),
    ("JSON_VALUE", "GET_JSON_OBJECT"),
    ("BOOLAND_AGG", "BOOL_AND"),
    ("BOOLOR_AGG", "BOOL_OR"),
    ("APPROX_DISTINCT", "APPROX_COUNT_DISTINCT"),
    ("TO_VARCHAR", "TO_CHAR"),
];

/// Source functions with no Databricks counterpart
const UNSUPPORTED: &[(&str, &str)] = &[
    ("SOUNDEX_CODE", "no phonetic code function"),
    ("DIFFERENCE", "no SOUNDEX difference function; compare SOUNDEX values by hand"),
    ("OBJECT_ID", "catalog lookups go through information_schema"),
    ("SCOPE_IDENTITY", "identity values are not returned per session"),
    ("SYS_CONTEXT", "session context has no equivalent"),
    ("USERENV", "session context has no equivalent"),
    ("HASHBYTES", "use SHA2 or MD5 with the matching algorithm"),
    ("FORMATMESSAGE", "build the message with FORMAT_STRING"),
];

pub fn rules() -> Vec<RewriteRule> {
    let foreign = DialectMatch::Foreign;
    let mut rules = vec![
        RewriteRule::function("nvl_to_coalesce", foreign, 100, "NVL", coalesce_alias),
        RewriteRule::function("ifnull_to_coalesce", foreign, 100, "IFNULL", coalesce_alias),
        RewriteRule::function("isnull_to_coalesce", foreign, 100, "ISNULL", coalesce_alias),
        RewriteRule::function("nvl2_to_case", foreign, 100, "NVL2", nvl2),
        RewriteRule::function("iff_to_if", foreign, 100, "IFF", iff),
        RewriteRule::function("iif_to_if", foreign, 100, "IIF", iff),
        RewriteRule::function("decode_to_case", foreign, 100, "DECODE", decode),
        RewriteRule::function("len_to_length", foreign, 100, "LEN", len),
        RewriteRule::function("charindex_to_locate", foreign, 100, "CHARINDEX", charindex),
        RewriteRule::function("instr_to_locate", foreign, 100, "INSTR", instr),
        RewriteRule::function("strpos_to_locate", foreign, 100, "STRPOS", strpos),
        RewriteRule::function("substr_to_substring", foreign, 100, "SUBSTR", substr),
        RewriteRule::function("zeroifnull", foreign, 100, "ZEROIFNULL", zeroifnull),
        RewriteRule::function("nullifzero", foreign, 100, "NULLIFZERO", nullifzero),
        RewriteRule::function("div0", foreign, 100, "DIV0", div0),
        RewriteRule::function("square_to_power", foreign, 100, "SQUARE", square),
        RewriteRule::function("listagg", foreign, 100, "LISTAGG", string_aggregate),
        RewriteRule::function("string_agg", foreign, 100, "STRING_AGG", string_aggregate),
        RewriteRule::function("group_concat", foreign, 100, "GROUP_CONCAT", string_aggregate),
        RewriteRule::function("to_number", foreign, 100, "TO_NUMBER", to_number),
        RewriteRule::function("parse_json", foreign, 100, "PARSE_JSON", parse_json),
        RewriteRule::function("object_construct", foreign, 100, "OBJECT_CONSTRUCT", object_construct),
        RewriteRule::function("array_size", foreign, 100, "ARRAY_SIZE", array_size),
        RewriteRule::function("array_construct", foreign, 100, "ARRAY_CONSTRUCT", array_construct),
        RewriteRule::function("json_extract_path_text", foreign, 100, "JSON_EXTRACT_PATH_TEXT", json_path_text),
        RewriteRule::expression("safe_cast_to_try_cast", foreign, 210, safe_cast),
        RewriteRule::expression(
            "json_arrow_to_get_json_object",
            DialectMatch::Sources(&[DialectType::PostgreSQL, DialectType::Redshift, DialectType::MySQL]),
            205,
            json_arrow,
        ),
    ];
    rules.extend(
        RENAMES
            .iter()
            .map(|(from, _)| RewriteRule::function("rename_function", foreign, 50, from, rename)),
    );
    rules.extend(
        UNSUPPORTED
            .iter()
            .map(|(name, _)| RewriteRule::function("unsupported_function", foreign, 50, name, unsupported)),
    );
    rules
}

fn rename(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let name = match expr {
        Expression::Function(f) => &f.name,
        Expression::Window(w) => &w.function.name,
        _ => return RuleOutcome::Unchanged,
    };
    match RENAMES.iter().find(|(from, _)| from == name) {
        Some((_, to)) => renamed(expr, to).map_or(RuleOutcome::Unchanged, RuleOutcome::Replaced),
        None => RuleOutcome::Unchanged,
    }
}

fn unsupported(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(f) = as_function(expr) else {
        return RuleOutcome::Unchanged;
    };
    let Some((name, hint)) = UNSUPPORTED.iter().find(|(name, _)| *name == f.name) else {
        return RuleOutcome::Unchanged;
    };
    RuleOutcome::Unmappable(
        Finding::unmappable("UNSUPPORTED_FUNCTION", format!("{name} has no Databricks equivalent")).with_hint(*hint),
    )
}

/// `NVL(a, b)`, `IFNULL(a, b)`, SQL Server `ISNULL(a, b)`; MySQL `ISNULL(a)` is a null test
fn coalesce_alias(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(f) = as_function(expr) else {
        return RuleOutcome::Unchanged;
    };
    match f.args.len() {
        1 if f.name == "ISNULL" => RuleOutcome::Replaced(Expression::IsNull(Box::new(IsNull {
            expr: f.args[0].clone(),
            negated: false,
        }))),
        2 => RuleOutcome::Replaced(call_at(f, "COALESCE", f.args.clone())),
        _ => RuleOutcome::Unchanged,
    }
}

fn nvl2(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(f) = as_function(expr) else {
        return RuleOutcome::Unchanged;
    };
    let [test, present, absent] = f.args.as_slice() else {
        return RuleOutcome::Unchanged;
    };
    RuleOutcome::Replaced(Expression::Case(Box::new(Case {
        operand: None,
        whens: vec![(is_not_null(test.clone()), present.clone())],
        else_result: Some(absent.clone()),
    })))
}

fn iff(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    match as_function(expr) {
        Some(f) if f.args.len() == 3 => RuleOutcome::Replaced(call_at(f, "IF", f.args.clone())),
        _ => RuleOutcome::Unchanged,
    }
}

/// Oracle `DECODE(x, s1, r1, ..., default)`; a NULL search value matches NULL
fn decode(expr: &Expression, ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(f) = as_function(expr) else {
        return RuleOutcome::Unchanged;
    };
    // Hive and MySQL DECODE is a charset conversion
    if f.args.len() < 3 || matches!(ctx.source, DialectType::Hive | DialectType::MySQL) {
        return RuleOutcome::Unchanged;
    }
    let subject = &f.args[0];
    let mut rest = f.args[1..].chunks_exact(2);
    let mut whens = Vec::new();
    for pair in rest.by_ref() {
        let condition = if pair[0].is_null() {
            Expression::IsNull(Box::new(IsNull {
                expr: subject.clone(),
                negated: false,
            }))
        } else {
            Expression::binary(BinaryOperator::Eq, subject.clone(), pair[0].clone())
        };
        whens.push((condition, pair[1].clone()));
    }
    let else_result = rest.remainder().first().cloned();
    RuleOutcome::Replaced(Expression::Case(Box::new(Case {
        operand: None,
        whens,
        else_result,
    })))
}

/// SQL Server `LEN` ignores trailing blanks
fn len(expr: &Expression, ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(f) = as_function(expr) else {
        return RuleOutcome::Unchanged;
    };
    let [arg] = f.args.as_slice() else {
        return RuleOutcome::Unchanged;
    };
    let arg = if ctx.source.is_tsql_family() {
        call_at(f, "RTRIM", vec![arg.clone()])
    } else {
        arg.clone()
    };
    RuleOutcome::Replaced(call_at(f, "LENGTH", vec![arg]))
}

/// `CHARINDEX(needle, haystack[, start])`
fn charindex(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    match as_function(expr) {
        Some(f) if matches!(f.args.len(), 2 | 3) => RuleOutcome::Replaced(call_at(f, "LOCATE", f.args.clone())),
        _ => RuleOutcome::Unchanged,
    }
}

/// `INSTR(haystack, needle[, start[, occurrence]])`
fn instr(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(f) = as_function(expr) else {
        return RuleOutcome::Unchanged;
    };
    match f.args.as_slice() {
        [haystack, needle] => RuleOutcome::Replaced(call_at(f, "LOCATE", vec![needle.clone(), haystack.clone()])),
        [haystack, needle, start] if start.as_integer().is_some_and(|n| n > 0) => RuleOutcome::Replaced(call_at(
            f,
            "LOCATE",
            vec![needle.clone(), haystack.clone(), start.clone()],
        )),
        [_, _, start] if start.as_integer().is_none() => RuleOutcome::risk(
            call_at(f, "LOCATE", vec![f.args[1].clone(), f.args[0].clone(), start.clone()]),
            Finding::risk("INSTR_NEGATIVE_START", "a negative start position searches backwards in the source")
                .with_hint("LOCATE only searches forwards"),
        ),
        _ => RuleOutcome::Unmappable(
            Finding::unmappable("UNSUPPORTED_FUNCTION", "INSTR with a backward search or an occurrence argument")
                .with_hint("rewrite with REGEXP_INSTR or string splitting"),
        ),
    }
}

/// `STRPOS(haystack, needle)`
fn strpos(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(f) = as_function(expr) else {
        return RuleOutcome::Unchanged;
    };
    match f.args.as_slice() {
        [haystack, needle] => RuleOutcome::Replaced(call_at(f, "LOCATE", vec![needle.clone(), haystack.clone()])),
        _ => RuleOutcome::Unchanged,
    }
}

fn substr(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    renamed(expr, "SUBSTRING").map_or(RuleOutcome::Unchanged, RuleOutcome::Replaced)
}

fn zeroifnull(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    match as_function(expr) {
        Some(f) if f.args.len() == 1 => RuleOutcome::Replaced(call_at(
            f,
            "COALESCE",
            vec![f.args[0].clone(), Expression::number(0)],
        )),
        _ => RuleOutcome::Unchanged,
    }
}

fn nullifzero(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    match as_function(expr) {
        Some(f) if f.args.len() == 1 => RuleOutcome::Replaced(call_at(
            f,
            "NULLIF",
            vec![f.args[0].clone(), Expression::number(0)],
        )),
        _ => RuleOutcome::Unchanged,
    }
}

/// Snowflake `DIV0(a, b)` returns 0 for a zero divisor
fn div0(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(f) = as_function(expr) else {
        return RuleOutcome::Unchanged;
    };
    let [dividend, divisor] = f.args.as_slice() else {
        return RuleOutcome::Unchanged;
    };
    RuleOutcome::Replaced(call_at(
        f,
        "IF",
        vec![
            Expression::binary(BinaryOperator::Eq, divisor.clone(), Expression::number(0)),
            Expression::number(0),
            Expression::binary(BinaryOperator::Divide, dividend.clone(), divisor.clone()),
        ],
    ))
}

fn square(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    match as_function(expr) {
        Some(f) if f.args.len() == 1 => {
            RuleOutcome::Replaced(call_at(f, "POWER", vec![f.args[0].clone(), Expression::number(2)]))
        }
        _ => RuleOutcome::Unchanged,
    }
}

/// `LISTAGG`, `STRING_AGG` and `GROUP_CONCAT` become `ARRAY_JOIN` over a
/// collected array. Only an ordering by the aggregated value itself survives.
fn string_aggregate(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(f) = as_function(expr) else {
        return RuleOutcome::Unchanged;
    };
    let mut separator = None;
    let mut positional = Vec::new();
    for arg in &f.args {
        match arg {
            Expression::NamedArgument(named)
                if named.style == NamedArgStyle::Keyword && named.name.name.eq_ignore_ascii_case("SEPARATOR") =>
            {
                separator = Some(named.value.clone());
            }
            other => positional.push(other.clone()),
        }
    }
    let mut positional = positional.into_iter();
    let Some(value) = positional.next() else {
        return RuleOutcome::Unchanged;
    };
    if f.name == "GROUP_CONCAT" && positional.len() > 0 {
        return RuleOutcome::Unmappable(
            Finding::unmappable("UNSUPPORTED_FUNCTION", "GROUP_CONCAT over several expressions")
                .with_hint("concatenate the expressions with CONCAT first"),
        );
    }
    let separator = separator
        .or_else(|| positional.next())
        .unwrap_or_else(|| Expression::string(if f.name == "GROUP_CONCAT" { "," } else { "" }));

    let collector = if f.distinct { "COLLECT_SET" } else { "COLLECT_LIST" };
    let mut collected = call_at(f, collector, vec![value.clone()]);
    let ordering: &[Ordered] = if f.within_group.is_empty() { &f.order_by } else { &f.within_group };
    let mut findings = Vec::new();
    match ordering {
        [] => {}
        [only] if same_expression(&only.expr, &value) && only.nulls_first.is_none() => {
            collected = call_at(f, "ARRAY_SORT", vec![collected]);
            if only.desc == Some(true) {
                collected = call_at(f, "REVERSE", vec![collected]);
            }
        }
        _ => findings.push(
            Finding::risk(
                "ORDER_NOT_GUARANTEED",
                format!("{} ordering is not preserved by COLLECT_LIST", f.name),
            )
            .with_hint("sort a collected array of structs with ARRAY_SORT if the order matters"),
        ),
    }
    if f.distinct && !ordering.is_empty() && findings.is_empty() {
        findings.push(Finding::info("DISTINCT_AGGREGATE", "COLLECT_SET removes duplicates before sorting"));
    }
    RuleOutcome::with_findings(call_at(f, "ARRAY_JOIN", vec![collected, separator]), findings)
}

/// `TO_NUMBER(x)` without a format
fn to_number(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(f) = as_function(expr) else {
        return RuleOutcome::Unchanged;
    };
    let [value] = f.args.as_slice() else {
        return RuleOutcome::Unchanged;
    };
    RuleOutcome::risk(
        Expression::Cast(Box::new(Cast {
            expr: value.clone(),
            to: DataType::Decimal {
                precision: Some(38),
                scale: Some(10),
            },
            kind: CastKind::Cast,
            format: None,
            span: f.span,
        })),
        Finding::precision("PRECISION_NARROWED", "TO_NUMBER without a format is cast to DECIMAL(38, 10)")
            .with_hint("cast to the exact precision and scale the data needs"),
    )
}

/// Snowflake `PARSE_JSON` keeps its name for VARIANT targets
fn parse_json(expr: &Expression, ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(f) = as_function(expr) else {
        return RuleOutcome::Unchanged;
    };
    let [text] = f.args.as_slice() else {
        return RuleOutcome::Unchanged;
    };
    match ctx.options.semi_structured {
        SemiStructuredMapping::Variant => RuleOutcome::Unchanged,
        SemiStructuredMapping::String => RuleOutcome::risk(
            text.clone(),
            Finding::info("JSON_KEPT_AS_TEXT", "PARSE_JSON removed; the JSON text is stored as STRING"),
        ),
    }
}

/// `OBJECT_CONSTRUCT('k', v, ...)` with literal keys
fn object_construct(expr: &Expression, ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(f) = as_function(expr) else {
        return RuleOutcome::Unchanged;
    };
    let literal_keys = f.args.len() % 2 == 0 && f.args.chunks_exact(2).all(|pair| pair[0].as_string().is_some());
    if !literal_keys {
        return RuleOutcome::Unmappable(
            Finding::unmappable("UNSUPPORTED_FUNCTION", "OBJECT_CONSTRUCT needs literal keys in Databricks")
                .with_hint("build the object with NAMED_STRUCT or MAP_FROM_ARRAYS"),
        );
    }
    let structure = call_at(f, "NAMED_STRUCT", f.args.clone());
    let json = call_at(f, "TO_JSON", vec![structure]);
    let result = match ctx.options.semi_structured {
        SemiStructuredMapping::Variant => call_at(f, "PARSE_JSON", vec![json]),
        SemiStructuredMapping::String => json,
    };
    RuleOutcome::risk(
        result,
        Finding::risk("OBJECT_NULL_FIELDS", "OBJECT_CONSTRUCT drops NULL values; TO_JSON keeps the keys out as well")
            .with_hint("check consumers that test for key presence"),
    )
}

fn array_size(expr: &Expression, ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(f) = as_function(expr) else {
        return RuleOutcome::Unchanged;
    };
    let [array] = f.args.as_slice() else {
        return RuleOutcome::Unchanged;
    };
    let name = match ctx.options.semi_structured {
        SemiStructuredMapping::Variant => "ARRAY_SIZE",
        SemiStructuredMapping::String => "JSON_ARRAY_LENGTH",
    };
    if name == f.name {
        return RuleOutcome::Unchanged;
    }
    RuleOutcome::Replaced(call_at(f, name, vec![array.clone()]))
}

fn array_construct(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    match as_function(expr) {
        Some(f) => RuleOutcome::Replaced(Expression::Array(f.args.clone())),
        None => RuleOutcome::Unchanged,
    }
}

/// Redshift `JSON_EXTRACT_PATH_TEXT(json, 'a', 'b')`
fn json_path_text(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(f) = as_function(expr) else {
        return RuleOutcome::Unchanged;
    };
    let Some((json, keys)) = f.args.split_first() else {
        return RuleOutcome::Unchanged;
    };
    let mut path = String::from("$");
    for key in keys {
        match key.as_string() {
            Some(key) => {
                path.push('.');
                path.push_str(key);
            }
            None => {
                return RuleOutcome::Unmappable(Finding::unmappable(
                    "UNSUPPORTED_FUNCTION",
                    "JSON_EXTRACT_PATH_TEXT with computed keys",
                ))
            }
        }
    }
    RuleOutcome::Replaced(call_at(f, "GET_JSON_OBJECT", vec![json.clone(), Expression::string(path)]))
}

/// BigQuery `SAFE_CAST`
fn safe_cast(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    match expr {
        Expression::Cast(cast) if cast.kind == CastKind::SafeCast => {
            let mut cast = cast.clone();
            cast.kind = CastKind::TryCast;
            RuleOutcome::Replaced(Expression::Cast(cast))
        }
        _ => RuleOutcome::Unchanged,
    }
}

/// PostgreSQL/MySQL `->` and `->>`
fn json_arrow(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Expression::JsonAccess(access) = expr else {
        return RuleOutcome::Unchanged;
    };
    let JsonAccess { expr: base, kind, path } = access.as_ref();
    if *kind == JsonAccessKind::Colon {
        return RuleOutcome::Unchanged;
    }
    // nested `a -> 'b' ->> 'c'` collapses into one path
    let (base, mut json_path) = match base {
        Expression::Function(f) if f.name == "GET_JSON_OBJECT" && f.args.len() == 2 => {
            match f.args[1].as_string() {
                Some(p) => (f.args[0].clone(), p.to_string()),
                None => (base.clone(), "$".to_string()),
            }
        }
        _ => (base.clone(), "$".to_string()),
    };
    match path {
        Expression::Literal(Literal::Number(n)) => json_path.push_str(&format!("[{n}]")),
        Expression::Literal(Literal::String(s)) if s.starts_with('$') => json_path = s.clone(),
        Expression::Literal(Literal::String(s)) => {
            json_path.push('.');
            json_path.push_str(s);
        }
        _ => {
            return RuleOutcome::Unmappable(
                Finding::unmappable("UNSUPPORTED_JSON_PATH", "JSON access with a computed key")
                    .with_hint("build the path string and call GET_JSON_OBJECT"),
            )
        }
    }
    let call = Expression::Function(Box::new(Function::new(
        "GET_JSON_OBJECT",
        vec![base, Expression::string(json_path)],
    )));
    match kind {
        JsonAccessKind::DoubleArrow => RuleOutcome::Replaced(call),
        _ => RuleOutcome::risk(
            call,
            Finding::info("JSON_AS_TEXT", "`->` returns JSON text in Databricks, not a JSON value"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use crate::dialects::DialectType;
    use crate::rules::test_support::{codes, convert, sql};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_null_handling_functions() {
        assert_eq!(
            sql(DialectType::Oracle, "SELECT NVL(a, 0), NVL2(b, 1, 2) FROM t"),
            "SELECT COALESCE(a, 0), CASE WHEN b IS NOT NULL THEN 1 ELSE 2 END FROM t"
        );
        assert_eq!(sql(DialectType::SqlServer, "SELECT ISNULL(a, '') FROM t"), "SELECT COALESCE(a, '') FROM t");
        assert_eq!(sql(DialectType::MySQL, "SELECT ISNULL(a) FROM t"), "SELECT a IS NULL FROM t");
        assert_eq!(sql(DialectType::Teradata, "SELECT ZEROIFNULL(x), NULLIFZERO(y) FROM t"), "SELECT COALESCE(x, 0), NULLIF(y, 0) FROM t");
    }

    #[test]
    fn test_decode_matches_null_search_values() {
        assert_eq!(
            sql(DialectType::Oracle, "SELECT DECODE(status, 'A', 'Active', NULL, 'None', 'Other') FROM t"),
            "SELECT CASE WHEN status = 'A' THEN 'Active' WHEN status IS NULL THEN 'None' ELSE 'Other' END FROM t"
        );
    }

    #[test]
    fn test_string_functions() {
        assert_eq!(
            sql(DialectType::SqlServer, "SELECT LEN(name), CHARINDEX('x', name) FROM t"),
            "SELECT LENGTH(RTRIM(name)), LOCATE('x', name) FROM t"
        );
        assert_eq!(sql(DialectType::Oracle, "SELECT INSTR(name, 'x'), SUBSTR(name, 1, 2) FROM t"), "SELECT LOCATE('x', name), SUBSTRING(name, 1, 2) FROM t");
        assert_eq!(sql(DialectType::Snowflake, "SELECT IFF(a > 1, 'y', 'n') FROM t"), "SELECT IF(a > 1, 'y', 'n') FROM t");
    }

    #[test]
    fn test_string_aggregates() {
        assert_eq!(
            sql(DialectType::MySQL, "SELECT GROUP_CONCAT(name SEPARATOR '; ') FROM t"),
            "SELECT ARRAY_JOIN(COLLECT_LIST(name), '; ') FROM t"
        );
        assert_eq!(
            sql(DialectType::Oracle, "SELECT LISTAGG(name, ',') WITHIN GROUP (ORDER BY name) FROM t"),
            "SELECT ARRAY_JOIN(ARRAY_SORT(COLLECT_LIST(name)), ',') FROM t"
        );
        let result = convert(DialectType::PostgreSQL, "SELECT STRING_AGG(name, ',' ORDER BY id) FROM t");
        assert_eq!(codes(&result), vec!["ORDER_NOT_GUARANTEED"]);
    }

    #[test]
    fn test_safe_cast_and_renames() {
        assert_eq!(
            sql(DialectType::BigQuery, "SELECT SAFE_CAST(x AS INT64) FROM t"),
            "SELECT TRY_CAST(x AS BIGINT) FROM t"
        );
        assert_eq!(sql(DialectType::SqlServer, "SELECT NEWID()"), "SELECT UUID()");
    }

    #[test]
    fn test_unsupported_function_is_reported_and_kept() {
        let result = convert(DialectType::SqlServer, "SELECT SCOPE_IDENTITY()");
        assert_eq!(codes(&result), vec!["UNSUPPORTED_FUNCTION"]);
        assert_eq!(result.sql, "SELECT SCOPE_IDENTITY()");
    }

    #[test]
    fn test_json_arrows() {
        assert_eq!(
            sql(DialectType::PostgreSQL, "SELECT doc ->> 'name' FROM t"),
            "SELECT GET_JSON_OBJECT(doc, '$.name') FROM t"
        );
        assert_eq!(
            sql(DialectType::PostgreSQL, "SELECT doc -> 'a' ->> 'b' FROM t"),
            "SELECT GET_JSON_OBJECT(doc, '$.a.b') FROM t"
        );
    }

    #[test]
    fn test_semi_structured_functions_follow_mapping() {
        assert_eq!(sql(DialectType::Snowflake, "SELECT ARRAY_SIZE(tags) FROM t"), "SELECT ARRAY_SIZE(tags) FROM t");
        assert_eq!(
            sql(DialectType::Snowflake, "SELECT ARRAY_CONSTRUCT(1, 2)"),
            "SELECT ARRAY(1, 2)"
        );
    }
}
