//! Window function syntax
//!
//! Teradata's moving aggregates (`CSUM`, `MSUM`, `MAVG`, `MDIFF`) become
//! standard aggregates over a `ROWS` frame. Elsewhere the changes are about
//! where modifiers sit: Databricks wants `IGNORE NULLS` after the argument
//! list and an explicit order for ranking functions.

use super::{as_function, renamed, DialectMatch, Finding, RewriteRule, RuleContext, RuleOutcome};
use crate::dialects::DialectType;
use crate::expressions::{
    BinaryOperator, Expression, FrameBound, FrameUnits, Function, Ordered, WindowFrame, WindowFunction, WindowSpec,
};

/// Functions Databricks only evaluates over an ordered window
const NEEDS_ORDER: &[&str] = &[
    "ROW_NUMBER", "RANK", "DENSE_RANK", "PERCENT_RANK", "CUME_DIST", "NTILE", "LAG", "LEAD",
];

pub fn rules() -> Vec<RewriteRule> {
    let foreign = DialectMatch::Foreign;
    let teradata = DialectMatch::Source(DialectType::Teradata);
    vec![
        RewriteRule::function("csum", teradata, 100, "CSUM", cumulative_sum),
        RewriteRule::function("msum", teradata, 100, "MSUM", moving_aggregate),
        RewriteRule::function("mavg", teradata, 100, "MAVG", moving_aggregate),
        RewriteRule::function("mdiff", teradata, 100, "MDIFF", moving_difference),
        RewriteRule::function("ratio_to_report", foreign, 100, "RATIO_TO_REPORT", ratio_to_report),
        RewriteRule::function("array_agg", foreign, 100, "ARRAY_AGG", array_agg),
        RewriteRule::expression("null_treatment_placement", foreign, 260, null_treatment),
        RewriteRule::expression("ranking_requires_order", foreign, 255, ranking_order),
    ]
}

fn windowed(function: Function, over: WindowSpec) -> Expression {
    Expression::Window(Box::new(WindowFunction {
        function,
        null_treatment: None,
        over,
    }))
}

fn rows_frame(start: FrameBound) -> Option<WindowFrame> {
    Some(WindowFrame {
        units: FrameUnits::Rows,
        start,
        end: Some(FrameBound::CurrentRow),
    })
}

fn sort_keys(args: &[Expression]) -> Vec<Ordered> {
    args.iter().cloned().map(Ordered::asc).collect()
}

fn missing_sort(name: &str) -> RuleOutcome<Expression> {
    RuleOutcome::Unmappable(Finding::unmappable(
        "UNSUPPORTED_WINDOW",
        format!("{name} needs a value and at least one sort expression"),
    ))
}

/// `CSUM(x, k)` => `SUM(x) OVER (ORDER BY k ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW)`
fn cumulative_sum(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(f) = as_function(expr) else {
        return RuleOutcome::Unchanged;
    };
    if f.args.len() < 2 {
        return missing_sort("CSUM");
    }
    let mut sum = Function::new("SUM", vec![f.args[0].clone()]);
    sum.span = f.span;
    RuleOutcome::Replaced(windowed(
        sum,
        WindowSpec {
            order_by: sort_keys(&f.args[1..]),
            frame: rows_frame(FrameBound::UnboundedPreceding),
            ..WindowSpec::empty()
        },
    ))
}

/// Literal window width of a Teradata moving function
fn width(f: &Function) -> Result<i64, RuleOutcome<Expression>> {
    match f.args.get(1).and_then(Expression::as_integer) {
        Some(n) if n >= 1 => Ok(n),
        _ => Err(RuleOutcome::Unmappable(Finding::unmappable(
            "UNSUPPORTED_WINDOW",
            format!("{} width must be a positive integer literal", f.name),
        ))),
    }
}

/// `MSUM(x, n, k)` / `MAVG(x, n, k)` over the last `n` rows
fn moving_aggregate(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(f) = as_function(expr) else {
        return RuleOutcome::Unchanged;
    };
    if f.args.len() < 3 {
        return missing_sort(&f.name);
    }
    let n = match width(f) {
        Ok(n) => n,
        Err(outcome) => return outcome,
    };
    let aggregate = if f.name == "MSUM" { "SUM" } else { "AVG" };
    let mut function = Function::new(aggregate, vec![f.args[0].clone()]);
    function.span = f.span;
    RuleOutcome::Replaced(windowed(
        function,
        WindowSpec {
            order_by: sort_keys(&f.args[2..]),
            frame: rows_frame(FrameBound::Preceding(Expression::number(n - 1))),
            ..WindowSpec::empty()
        },
    ))
}

/// `MDIFF(x, n, k)` => `x - LAG(x, n) OVER (ORDER BY k)`
fn moving_difference(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(f) = as_function(expr) else {
        return RuleOutcome::Unchanged;
    };
    if f.args.len() < 3 {
        return missing_sort("MDIFF");
    }
    let n = match width(f) {
        Ok(n) => n,
        Err(outcome) => return outcome,
    };
    let value = f.args[0].clone();
    let lag = windowed(
        Function::new("LAG", vec![value.clone(), Expression::number(n)]),
        WindowSpec {
            order_by: sort_keys(&f.args[2..]),
            ..WindowSpec::empty()
        },
    );
    RuleOutcome::Replaced(Expression::binary(BinaryOperator::Minus, value, lag))
}

/// `RATIO_TO_REPORT(x) OVER (PARTITION BY p)` => `x / SUM(x) OVER (PARTITION BY p)`
fn ratio_to_report(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let (function, partition_by) = match expr {
        Expression::Window(w) => (&w.function, w.over.partition_by.clone()),
        Expression::Function(f) => (f.as_ref(), Vec::new()),
        _ => return RuleOutcome::Unchanged,
    };
    let [value] = function.args.as_slice() else {
        return RuleOutcome::Unmappable(Finding::unmappable(
            "UNSUPPORTED_WINDOW",
            "RATIO_TO_REPORT takes exactly one argument",
        ));
    };
    let total = windowed(
        Function::new("SUM", vec![value.clone()]),
        WindowSpec {
            partition_by,
            ..WindowSpec::empty()
        },
    );
    RuleOutcome::Replaced(Expression::binary(BinaryOperator::Divide, value.clone(), total))
}

/// `ARRAY_AGG` => `COLLECT_LIST` / `COLLECT_SET`
fn array_agg(expr: &Expression, ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let function = match expr {
        Expression::Function(f) => f.as_ref(),
        Expression::Window(w) => &w.function,
        _ => return RuleOutcome::Unchanged,
    };
    let target = if function.distinct { "COLLECT_SET" } else { "COLLECT_LIST" };
    let ordered = !function.order_by.is_empty() || !function.within_group.is_empty();
    let Some(mut rewritten) = renamed(expr, target) else {
        return RuleOutcome::Unchanged;
    };
    let strip = |f: &mut Function| {
        f.distinct = false;
        f.order_by.clear();
        f.within_group.clear();
    };
    match &mut rewritten {
        Expression::Function(f) => strip(f),
        Expression::Window(w) => strip(&mut w.function),
        _ => {}
    }

    let mut findings = Vec::new();
    if ctx.source.is_postgres_family() || ctx.source == DialectType::Oracle {
        findings.push(
            Finding::risk("NULLS_DROPPED", format!("{target} skips NULL values; {} keeps them", ctx.source))
                .with_hint("wrap the value with COALESCE if NULL elements matter"),
        );
    }
    if ordered {
        findings.push(
            Finding::risk("ORDER_NOT_GUARANTEED", format!("{target} does not preserve the requested element order"))
                .with_hint("collect structs with the sort key and ARRAY_SORT them"),
        );
    }
    RuleOutcome::with_findings(rewritten, findings)
}

/// `LAST_VALUE(x IGNORE NULLS) OVER (...)` => `LAST_VALUE(x) IGNORE NULLS OVER (...)`
fn null_treatment(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Expression::Window(w) = expr else {
        return RuleOutcome::Unchanged;
    };
    let Some(treatment) = w.function.null_treatment else {
        return RuleOutcome::Unchanged;
    };
    let mut w = w.clone();
    w.function.null_treatment = None;
    w.null_treatment.get_or_insert(treatment);
    RuleOutcome::Replaced(Expression::Window(w))
}

/// Ranking and offset functions without ORDER BY
fn ranking_order(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Expression::Window(w) = expr else {
        return RuleOutcome::Unchanged;
    };
    if !NEEDS_ORDER.contains(&w.function.name.as_str()) || !w.over.order_by.is_empty() || w.over.name.is_some() {
        return RuleOutcome::Unchanged;
    }
    let mut w = w.clone();
    w.over.order_by = vec![Ordered::asc(Expression::Null)];
    let name = w.function.name.clone();
    RuleOutcome::risk(
        Expression::Window(w),
        Finding::risk("ORDER_NOT_DETERMINISTIC", format!("{name} needs ORDER BY in Databricks; ordering by NULL"))
            .with_hint("order by a column that makes the numbering deterministic"),
    )
}

#[cfg(test)]
mod tests {
    use crate::dialects::DialectType;
    use crate::rules::test_support::{codes, convert, sql};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_teradata_cumulative_sum() {
        assert_eq!(
            sql(DialectType::Teradata, "SELECT CSUM(amount, sale_date) FROM sales"),
            "SELECT SUM(amount) OVER (ORDER BY sale_date ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW) FROM sales"
        );
    }

    #[test]
    fn test_teradata_moving_functions() {
        assert_eq!(
            sql(DialectType::Teradata, "SELECT MAVG(price, 7, d) FROM quotes"),
            "SELECT AVG(price) OVER (ORDER BY d ROWS BETWEEN 6 PRECEDING AND CURRENT ROW) FROM quotes"
        );
        assert_eq!(
            sql(DialectType::Teradata, "SELECT MDIFF(price, 1, d) FROM quotes"),
            "SELECT price - LAG(price, 1) OVER (ORDER BY d) FROM quotes"
        );
        let result = convert(DialectType::Teradata, "SELECT MSUM(price, w, d) FROM quotes");
        assert_eq!(codes(&result), vec!["UNSUPPORTED_WINDOW"]);
    }

    #[test]
    fn test_ratio_to_report() {
        assert_eq!(
            sql(DialectType::Oracle, "SELECT RATIO_TO_REPORT(sal) OVER (PARTITION BY dept) FROM emp"),
            "SELECT sal / SUM(sal) OVER (PARTITION BY dept) FROM emp"
        );
    }

    #[test]
    fn test_array_agg() {
        let result = convert(DialectType::PostgreSQL, "SELECT ARRAY_AGG(name ORDER BY name) FROM t");
        assert_eq!(result.sql, "SELECT COLLECT_LIST(name) FROM t");
        assert_eq!(codes(&result), vec!["NULLS_DROPPED", "ORDER_NOT_GUARANTEED"]);
        assert_eq!(
            sql(DialectType::Snowflake, "SELECT ARRAY_AGG(DISTINCT tag) FROM t"),
            "SELECT COLLECT_SET(tag) FROM t"
        );
    }

    #[test]
    fn test_null_treatment_moves_outside() {
        assert_eq!(
            sql(
                DialectType::Snowflake,
                "SELECT LAST_VALUE(x IGNORE NULLS) OVER (PARTITION BY g ORDER BY t) FROM s"
            ),
            "SELECT LAST_VALUE(x) IGNORE NULLS OVER (PARTITION BY g ORDER BY t) FROM s"
        );
    }

    #[test]
    fn test_ranking_without_order() {
        let result = convert(DialectType::Snowflake, "SELECT ROW_NUMBER() OVER (PARTITION BY g) FROM s");
        assert_eq!(result.sql, "SELECT ROW_NUMBER() OVER (PARTITION BY g ORDER BY NULL) FROM s");
        assert_eq!(codes(&result), vec!["ORDER_NOT_DETERMINISTIC"]);
    }
}
