//! Row limiting, operators, parameters and join syntax

use super::{DialectMatch, Finding, RewriteRule, RuleContext, RuleOutcome};
use crate::dialects::DialectType;
use crate::expressions::{
    BinaryOperator, Column, Expression, Extension, From, Function, Join, JoinConstraint, JoinKind, Limit,
    Literal, OrderBy, Ordered, Parameter, ParameterKind, Qualify, Query, QueryBody, Select, TableFactor, Where,
    WindowFunction, WindowSpec,
};
use crate::scope::SymbolTable;
use crate::traversal::{and_all, conjuncts, contains_aggregate, contains_window_function, transform_map, ExpressionWalk};

const TSQL: &[DialectType] = &[DialectType::SqlServer, DialectType::Synapse];
/// Sources that resolve select-list aliases in WHERE
const LATERAL_ALIAS_SOURCES: &[DialectType] = &[DialectType::Teradata, DialectType::Snowflake, DialectType::Redshift];

pub fn rules() -> Vec<RewriteRule> {
    use DialectMatch::{Foreign, Source, Sources};
    vec![
        RewriteRule::query("top_to_limit", Foreign, 100, top_to_limit),
        RewriteRule::query("fetch_to_limit", Foreign, 90, fetch_to_limit),
        RewriteRule::query("rownum_to_limit", Source(DialectType::Oracle), 80, rownum_to_limit),
        RewriteRule::query("sample_to_limit", Source(DialectType::Teradata), 70, sample_to_limit),
        RewriteRule::query("drop_query_hints", Sources(TSQL), 60, drop_query_hints),
        RewriteRule::expression("null_comparison", Foreign, 250, null_comparison),
        RewriteRule::expression("tsql_string_concat", Sources(TSQL), 240, string_plus),
        RewriteRule::expression("parameter_markers", Foreign, 230, parameter_markers),
        RewriteRule::expression("oracle_empty_string", Source(DialectType::Oracle), 220, empty_string),
        RewriteRule::select("oracle_outer_join", Source(DialectType::Oracle), 190, outer_join_marks),
        RewriteRule::select("apply_to_lateral_join", Sources(TSQL), 180, apply_joins),
        RewriteRule::select("drop_table_hints", Foreign, 170, drop_table_hints),
        RewriteRule::select("drop_from_dual", Foreign, 160, drop_from_dual),
        RewriteRule::select("inline_lateral_aliases", Sources(LATERAL_ALIAS_SOURCES), 150, lateral_aliases),
    ]
}

/// How a dialect construct that survived rewriting is reported
pub fn extension_verdict(extension: &Extension, statement: bool) -> Option<Finding> {
    let construct = extension.construct.as_str();
    let finding = match construct {
        "LATERAL VIEW" if matches!(extension.dialect, DialectType::Hive | DialectType::Databricks) => return None,
        "LATERAL VIEW" | "TABLESAMPLE" => Finding::info(
            "CONSTRUCT_KEPT",
            format!("{construct} is copied as written; Databricks accepts the same syntax"),
        ),
        "PIVOT" | "UNPIVOT" => Finding::risk("PIVOT_SYNTAX", format!("{construct} is copied as written"))
            .with_hint("check aggregate and alias placement against Databricks PIVOT syntax"),
        _ if statement => Finding::unmappable(
            "UNSUPPORTED_STATEMENT",
            format!("{} statement `{construct}` has no Databricks equivalent", extension.dialect),
        )
        .with_hint("migrate this statement by hand"),
        _ => Finding::unmappable(
            "UNSUPPORTED_CONSTRUCT",
            format!("{} construct `{construct}` has no Databricks equivalent", extension.dialect),
        ),
    };
    Some(finding.at(extension.span))
}

// ---------------------------------------------------------------------------
// Row limiting
// ---------------------------------------------------------------------------

/// `RANK() OVER (ORDER BY ...) <= n`
fn ties_filter(order_by: &OrderBy, count: Expression) -> Expression {
    let rank = Expression::Window(Box::new(WindowFunction {
        function: Function::new("RANK", Vec::new()),
        null_treatment: None,
        over: WindowSpec {
            order_by: order_by.expressions.clone(),
            ..WindowSpec::empty()
        },
    }));
    Expression::binary(BinaryOperator::Lte, rank, count)
}

/// Put a row limit on `query`, whose body is a single SELECT
fn limit_select(mut query: Query, count: Expression, with_ties: bool, clause: &str) -> RuleOutcome<Query> {
    if !with_ties {
        query.limit = Some(Limit { count });
        return RuleOutcome::Replaced(query);
    }
    let Some(order_by) = query.order_by.clone() else {
        return RuleOutcome::Unmappable(Finding::unmappable(
            "UNSUPPORTED_ROW_LIMIT",
            format!("{clause} WITH TIES without ORDER BY"),
        ));
    };
    let filter = ties_filter(&order_by, count);
    let Some(select) = query.select_mut() else {
        return RuleOutcome::Unchanged;
    };
    let condition = match select.qualify.take() {
        Some(existing) => Expression::binary(BinaryOperator::And, existing.condition, filter),
        None => filter,
    };
    select.qualify = Some(Qualify { condition });
    RuleOutcome::Replaced(query)
}

fn percent_limit(clause: &str) -> Finding {
    Finding::unmappable("UNSUPPORTED_ROW_LIMIT", format!("{clause} ... PERCENT has no Databricks equivalent"))
        .with_hint("compute the row count first or use TABLESAMPLE")
}

/// The first operand of a chain of set operations
fn leftmost(body: &mut QueryBody) -> &mut QueryBody {
    match body {
        QueryBody::SetOperation(set) => leftmost(&mut set.left),
        other => other,
    }
}

/// SQL Server `SELECT TOP n`
fn top_to_limit(query: &Query, _ctx: &RuleContext<'_>) -> RuleOutcome<Query> {
    let mut query = query.clone();
    let span = query.span;
    if let Some(select) = query.select_mut() {
        let Some(top) = select.top.take() else {
            return RuleOutcome::Unchanged;
        };
        if top.percent {
            return RuleOutcome::Unmappable(percent_limit("TOP"));
        }
        if query.limit.is_some() || query.fetch.is_some() {
            return RuleOutcome::Unchanged;
        }
        return limit_select(query, top.count, top.with_ties, "TOP");
    }
    // TOP on the first operand of a UNION limits that operand only
    let operand = leftmost(&mut query.body);
    let QueryBody::Select(select) = operand else {
        return RuleOutcome::Unchanged;
    };
    let Some(top) = select.top.take() else {
        return RuleOutcome::Unchanged;
    };
    if top.percent {
        return RuleOutcome::Unmappable(percent_limit("TOP"));
    }
    if top.with_ties {
        return RuleOutcome::Unmappable(Finding::unmappable(
            "UNSUPPORTED_ROW_LIMIT",
            "TOP ... WITH TIES inside a set operation",
        ));
    }
    let mut nested = Query::from_body(QueryBody::Select(select.clone()), span);
    nested.limit = Some(Limit { count: top.count });
    *operand = QueryBody::Nested(Box::new(nested));
    RuleOutcome::Replaced(query)
}

/// `OFFSET m ROWS FETCH FIRST n ROWS ONLY`
fn fetch_to_limit(query: &Query, _ctx: &RuleContext<'_>) -> RuleOutcome<Query> {
    let mut query = query.clone();
    let offset_rows = query.offset.as_ref().is_some_and(|o| o.rows);
    if let Some(offset) = &mut query.offset {
        offset.rows = false;
    }
    let Some(fetch) = query.fetch.take() else {
        return if offset_rows {
            RuleOutcome::Replaced(query)
        } else {
            RuleOutcome::Unchanged
        };
    };
    if fetch.percent {
        return RuleOutcome::Unmappable(percent_limit("FETCH FIRST"));
    }
    let count = fetch.count.unwrap_or_else(|| Expression::number(1));
    if fetch.with_ties && query.select().is_none() {
        return RuleOutcome::Unmappable(Finding::unmappable(
            "UNSUPPORTED_ROW_LIMIT",
            "FETCH ... WITH TIES on a set operation",
        ));
    }
    limit_select(query, count, fetch.with_ties, "FETCH FIRST")
}

fn is_rownum(expr: &Expression) -> bool {
    matches!(expr, Expression::Column(c) if c.qualifier.is_empty() && !c.name.quoted && c.name.name.eq_ignore_ascii_case("ROWNUM"))
}

fn minus_one(expr: &Expression) -> Expression {
    match expr.as_integer() {
        Some(n) => Expression::number(n - 1),
        None => Expression::binary(BinaryOperator::Minus, expr.clone(), Expression::number(1)),
    }
}

/// Row count implied by a `ROWNUM` comparison
fn rownum_bound(condition: &Expression) -> Option<Expression> {
    let Expression::Binary(b) = condition else {
        return None;
    };
    match (b.op, is_rownum(&b.left), is_rownum(&b.right)) {
        (BinaryOperator::Lte, true, false) | (BinaryOperator::Gte, false, true) => {
            Some(if is_rownum(&b.left) { b.right.clone() } else { b.left.clone() })
        }
        (BinaryOperator::Lt, true, false) => Some(minus_one(&b.right)),
        (BinaryOperator::Gt, false, true) => Some(minus_one(&b.left)),
        (BinaryOperator::Eq, true, false) if b.right.as_integer() == Some(1) => Some(Expression::number(1)),
        (BinaryOperator::Eq, false, true) if b.left.as_integer() == Some(1) => Some(Expression::number(1)),
        _ => None,
    }
}

fn select_mentions_rownum(select: &Select) -> bool {
    select
        .projection
        .iter()
        .chain(select.where_clause.iter().map(|w| &w.condition))
        .chain(select.qualify.iter().map(|q| &q.condition))
        .any(|e| e.contains(is_rownum))
}

/// Oracle `WHERE ROWNUM <= n`
fn rownum_to_limit(query: &Query, _ctx: &RuleContext<'_>) -> RuleOutcome<Query> {
    let Some(select) = query.select() else {
        return RuleOutcome::Unchanged;
    };
    if !select_mentions_rownum(select) {
        return RuleOutcome::Unchanged;
    }
    let unsupported = || {
        Finding::unmappable("UNSUPPORTED_ROWNUM", "ROWNUM is only rewritten in top-level `ROWNUM <= n` filters")
            .with_hint("use ROW_NUMBER() OVER (...)")
    };
    if query.limit.is_some() {
        return RuleOutcome::Unmappable(unsupported());
    }
    let Some(where_clause) = &select.where_clause else {
        return RuleOutcome::Unmappable(unsupported());
    };
    let mut bound = None;
    let mut rest = Vec::new();
    for condition in conjuncts(&where_clause.condition) {
        match rownum_bound(&condition) {
            Some(count) if bound.is_none() => bound = Some(count),
            _ => rest.push(condition),
        }
    }
    let Some(count) = bound else {
        return RuleOutcome::Unmappable(unsupported());
    };

    let mut query = query.clone();
    let mut findings = Vec::new();
    if query.order_by.is_some() {
        findings.push(
            Finding::risk("ROWNUM_BEFORE_ORDER", "ROWNUM is assigned before ORDER BY; LIMIT applies after it")
                .with_hint("the source returned an arbitrary n rows, then sorted them"),
        );
    }
    query.limit = Some(Limit { count });
    if let Some(select) = query.select_mut() {
        select.where_clause = and_all(rest).map(|condition| Where { condition });
        if select_mentions_rownum(select) {
            findings.push(unsupported());
        }
    }
    RuleOutcome::with_findings(query, findings)
}

/// Teradata `SAMPLE n`
fn sample_to_limit(query: &Query, _ctx: &RuleContext<'_>) -> RuleOutcome<Query> {
    let Some(position) = query.trailing.iter().position(|e| e.construct == "SAMPLE") else {
        return RuleOutcome::Unchanged;
    };
    let raw = &query.trailing[position].raw;
    let count = raw
        .split_whitespace()
        .nth(1)
        .filter(|_| raw.split_whitespace().count() == 2)
        .and_then(|n| n.parse::<u64>().ok());
    let Some(count) = count else {
        return RuleOutcome::Unchanged;
    };
    if query.order_by.is_some() || query.limit.is_some() {
        return RuleOutcome::Unchanged;
    }
    let mut query = query.clone();
    query.trailing.remove(position);
    query.order_by = Some(OrderBy {
        expressions: vec![Ordered::asc(Expression::function("RAND", Vec::new()))],
    });
    query.limit = Some(Limit {
        count: Expression::number(count),
    });
    RuleOutcome::risk(
        query,
        Finding::info("SAMPLE_RANDOM_ORDER", format!("SAMPLE {count} rewritten as ORDER BY RAND() LIMIT {count}")),
    )
}

/// SQL Server `OPTION (...)` query hints
fn drop_query_hints(query: &Query, _ctx: &RuleContext<'_>) -> RuleOutcome<Query> {
    if !query.trailing.iter().any(|e| e.construct == "OPTION") {
        return RuleOutcome::Unchanged;
    }
    let mut query = query.clone();
    let mut findings = Vec::new();
    query.trailing.retain(|e| {
        if e.construct != "OPTION" {
            return true;
        }
        findings.push(Finding::info("QUERY_HINT_DROPPED", format!("`{}` dropped", e.raw)).at(e.span));
        false
    });
    RuleOutcome::with_findings(query, findings)
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// `x = NULL` is never true under ANSI rules
fn null_comparison(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Expression::Binary(b) = expr else {
        return RuleOutcome::Unchanged;
    };
    if !matches!(b.op, BinaryOperator::Eq | BinaryOperator::Neq) || !(b.left.is_null() || b.right.is_null()) {
        return RuleOutcome::Unchanged;
    }
    RuleOutcome::risk(
        expr.clone(),
        Finding::risk("NULL_COMPARISON", "comparison with NULL never evaluates to true")
            .with_hint("use IS NULL or IS NOT NULL"),
    )
}

const STRING_FUNCTIONS: &[&str] = &[
    "CONCAT", "SUBSTRING", "LEFT", "RIGHT", "UPPER", "LOWER", "LTRIM", "RTRIM", "TRIM", "REPLACE", "FORMAT",
    "DATE_FORMAT", "REPEAT", "REVERSE", "CONCAT_WS",
];

fn is_textual(expr: &Expression) -> bool {
    match expr {
        Expression::Literal(Literal::String(_) | Literal::NationalString(_)) => true,
        Expression::Binary(b) => b.op == BinaryOperator::Concat,
        Expression::Cast(c) => c.to.is_string(),
        Expression::Function(f) => STRING_FUNCTIONS.contains(&f.name.as_str()),
        Expression::Paren(inner) => is_textual(inner),
        _ => false,
    }
}

fn is_numeric_literal(expr: &Expression) -> bool {
    matches!(expr, Expression::Literal(Literal::Number(_)))
}

/// SQL Server `'a' + b` concatenation
fn string_plus(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Expression::Binary(b) = expr else {
        return RuleOutcome::Unchanged;
    };
    if b.op != BinaryOperator::Plus || is_numeric_literal(&b.left) || is_numeric_literal(&b.right) {
        return RuleOutcome::Unchanged;
    }
    if !(is_textual(&b.left) || is_textual(&b.right)) {
        return RuleOutcome::Unchanged;
    }
    RuleOutcome::Replaced(Expression::binary(BinaryOperator::Concat, b.left.clone(), b.right.clone()))
}

/// `@p` and `$1` markers become Databricks named parameters
fn parameter_markers(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Expression::Parameter(p) = expr else {
        return RuleOutcome::Unchanged;
    };
    match p.kind {
        ParameterKind::At if p.name.starts_with('@') => RuleOutcome::Unmappable(
            Finding::unmappable("SYSTEM_VARIABLE", format!("system variable @{} has no Databricks equivalent", p.name))
                .at(p.span),
        ),
        ParameterKind::At => RuleOutcome::Replaced(Expression::Parameter(Parameter {
            kind: ParameterKind::Colon,
            ..p.clone()
        })),
        ParameterKind::Numbered => {
            let name = format!("p{}", p.name);
            RuleOutcome::risk(
                Expression::Parameter(Parameter {
                    name: name.clone(),
                    kind: ParameterKind::Colon,
                    span: p.span,
                }),
                Finding::info("PARAMETER_RENAMED", format!("${} is now :{name}", p.name)),
            )
        }
        _ => RuleOutcome::Unchanged,
    }
}

/// Oracle stores `''` as NULL
fn empty_string(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    match expr {
        Expression::Literal(Literal::String(s)) if s.is_empty() => RuleOutcome::risk(
            expr.clone(),
            Finding::risk("EMPTY_STRING_IS_NULL", "'' is NULL in Oracle but an empty string in Databricks")
                .with_hint("use NULL if the code relies on Oracle's behaviour"),
        ),
        _ => RuleOutcome::Unchanged,
    }
}

// ---------------------------------------------------------------------------
// SELECT
// ---------------------------------------------------------------------------

fn factor_name(factor: &TableFactor) -> Option<String> {
    match factor {
        TableFactor::Table(t) => Some(t.reference_name().name.to_lowercase()),
        TableFactor::Derived { alias, .. } | TableFactor::Function { alias, .. } => {
            alias.as_ref().map(|a| a.name.name.to_lowercase())
        }
        TableFactor::Extended { base, .. } => factor_name(base),
    }
}

/// Tables whose columns carry `(+)` in `expr`; `None` for an unqualified marker
fn marked_tables(expr: &Expression) -> Option<Vec<String>> {
    let mut tables = Vec::new();
    for found in expr.find_all(|e| matches!(e, Expression::Column(c) if c.join_mark)) {
        let Expression::Column(column) = found else {
            continue;
        };
        let table = column.table()?.name.to_lowercase();
        if !tables.contains(&table) {
            tables.push(table);
        }
    }
    Some(tables)
}

fn has_join_mark(expr: &Expression) -> bool {
    expr.contains(|e| matches!(e, Expression::Column(c) if c.join_mark))
}

fn clear_marks(expr: Expression) -> Expression {
    transform_map(expr, &mut |e| match e {
        Expression::Column(c) if c.join_mark => Expression::Column(Column { join_mark: false, ..c }),
        other => other,
    })
}

/// Oracle `WHERE a.id = b.id(+)` outer joins
fn outer_join_marks(select: &Select, _ctx: &RuleContext<'_>) -> RuleOutcome<Select> {
    let Some(condition) = select.where_clause.as_ref().map(|w| &w.condition) else {
        return RuleOutcome::Unchanged;
    };
    if !has_join_mark(condition) {
        return RuleOutcome::Unchanged;
    }
    let unsupported = |message: &str| {
        RuleOutcome::Unmappable(
            Finding::unmappable("UNSUPPORTED_OUTER_JOIN", message.to_string())
                .with_hint("rewrite the join with LEFT JOIN ... ON"),
        )
    };
    let Some(from) = &select.from else {
        return unsupported("(+) without a FROM clause");
    };
    if !from.joins.is_empty() {
        return unsupported("(+) mixed with ANSI joins");
    }

    // conditions per marked table, in FROM order
    let mut on: Vec<(String, Vec<Expression>)> = Vec::new();
    let mut rest = Vec::new();
    for conjunct in conjuncts(condition) {
        if !has_join_mark(&conjunct) {
            rest.push(conjunct);
            continue;
        }
        if conjunct.contains(|e| matches!(e, Expression::Binary(b) if b.op == BinaryOperator::Or)) {
            return unsupported("(+) inside an OR condition");
        }
        let tables = match marked_tables(&conjunct) {
            Some(tables) if tables.len() == 1 => tables,
            Some(_) => return unsupported("(+) on columns of more than one table in one condition"),
            None => return unsupported("(+) on an unqualified column"),
        };
        match on.iter_mut().find(|(t, _)| *t == tables[0]) {
            Some((_, conditions)) => conditions.push(clear_marks(conjunct)),
            None => on.push((tables[0].clone(), vec![clear_marks(conjunct)])),
        }
    }

    let mut relations = Vec::new();
    let mut outer = Vec::new();
    for factor in &from.relations {
        let name = factor_name(factor);
        match on.iter().position(|(t, _)| Some(t) == name.as_ref()) {
            Some(i) => outer.push((factor.clone(), i)),
            None => relations.push(factor.clone()),
        }
    }
    if outer.len() != on.len() {
        return unsupported("(+) on a table that is not in FROM");
    }
    if relations.is_empty() {
        return unsupported("every table in FROM is outer joined");
    }

    let first = relations.remove(0);
    let mut joins: Vec<Join> = relations
        .into_iter()
        .map(|relation| Join {
            kind: JoinKind::Cross,
            relation,
            constraint: JoinConstraint::None,
        })
        .collect();
    for (relation, i) in outer {
        let condition = and_all(on[i].1.clone()).unwrap_or(Expression::Boolean(true));
        joins.push(Join {
            kind: JoinKind::Left,
            relation,
            constraint: JoinConstraint::On(condition),
        });
    }

    let mut select = select.clone();
    select.from = Some(From {
        relations: vec![first],
        joins,
    });
    select.where_clause = and_all(rest).map(|condition| Where { condition });
    RuleOutcome::Replaced(select)
}

fn set_lateral(factor: &mut TableFactor) {
    match factor {
        TableFactor::Derived { lateral, .. } | TableFactor::Function { lateral, .. } => *lateral = true,
        TableFactor::Extended { base, .. } => set_lateral(base),
        TableFactor::Table(_) => {}
    }
}

/// SQL Server `CROSS APPLY` / `OUTER APPLY`
fn apply_joins(select: &Select, _ctx: &RuleContext<'_>) -> RuleOutcome<Select> {
    let applies = |j: &Join| matches!(j.kind, JoinKind::CrossApply | JoinKind::OuterApply);
    if !select.from.as_ref().is_some_and(|f| f.joins.iter().any(applies)) {
        return RuleOutcome::Unchanged;
    }
    let mut select = select.clone();
    let mut findings = Vec::new();
    for join in select.from.iter_mut().flat_map(|f| f.joins.iter_mut()) {
        match join.kind {
            JoinKind::CrossApply => {
                join.kind = JoinKind::Cross;
                join.constraint = JoinConstraint::None;
            }
            JoinKind::OuterApply => {
                join.kind = JoinKind::Left;
                join.constraint = JoinConstraint::On(Expression::Boolean(true));
            }
            _ => continue,
        }
        if let TableFactor::Function { function, .. } = &join.relation {
            findings.push(Finding::risk(
                "TABLE_FUNCTION_APPLY",
                format!("table function {} applied laterally; check that Databricks provides it", function.name),
            ));
        }
        set_lateral(&mut join.relation);
    }
    RuleOutcome::with_findings(select, findings)
}

/// SQL Server `WITH (NOLOCK)` and similar table hints
fn drop_table_hints(select: &Select, _ctx: &RuleContext<'_>) -> RuleOutcome<Select> {
    fn hints_of(factor: &mut TableFactor) -> Option<&mut crate::expressions::TableRef> {
        match factor {
            TableFactor::Table(t) if !t.hints.is_empty() => Some(t),
            TableFactor::Extended { base, .. } => hints_of(base),
            _ => None,
        }
    }
    let mut select = select.clone();
    let mut findings = Vec::new();
    let Some(from) = &mut select.from else {
        return RuleOutcome::Unchanged;
    };
    let factors = from
        .relations
        .iter_mut()
        .chain(from.joins.iter_mut().map(|j| &mut j.relation));
    for factor in factors {
        if let Some(table) = hints_of(factor) {
            let hints = std::mem::take(&mut table.hints);
            findings.push(
                Finding::info(
                    "TABLE_HINT_DROPPED",
                    format!("hint WITH ({}) on {} dropped", hints.join(", "), table.qualified_name()),
                )
                .at(table.span),
            );
        }
    }
    if findings.is_empty() {
        return RuleOutcome::Unchanged;
    }
    RuleOutcome::with_findings(select, findings)
}

/// `FROM DUAL`
fn drop_from_dual(select: &Select, _ctx: &RuleContext<'_>) -> RuleOutcome<Select> {
    let is_dual = select.from.as_ref().is_some_and(|from| {
        from.joins.is_empty()
            && matches!(from.relations.as_slice(), [TableFactor::Table(t)]
                if t.schema.is_none() && t.alias.is_none() && t.name.name.eq_ignore_ascii_case("DUAL"))
    });
    if !is_dual {
        return RuleOutcome::Unchanged;
    }
    let mut select = select.clone();
    select.from = None;
    RuleOutcome::Replaced(select)
}

/// Expression an unqualified column stands for, following alias chains
fn resolve_lateral(
    table: &SymbolTable,
    expr: Expression,
    depth: usize,
    inlined: &mut Vec<String>,
    blocked: &mut Option<String>,
) -> Expression {
    transform_map(expr, &mut |e| {
        let Expression::Column(column) = &e else {
            return e;
        };
        if !column.qualifier.is_empty() || depth > 8 || !table.sources_with_column(&column.name).is_empty() {
            return e;
        }
        let Some(target) = table.resolve_alias(&column.name) else {
            return e;
        };
        if matches!(target, Expression::Column(c) if c.name.name.eq_ignore_ascii_case(&column.name.name)) {
            return e;
        }
        if contains_aggregate(target) || contains_window_function(target) {
            *blocked = Some(column.name.name.clone());
            return e;
        }
        inlined.push(column.name.name.clone());
        resolve_lateral(table, target.clone(), depth + 1, inlined, blocked)
    })
}

/// Select-list aliases referenced in WHERE
fn lateral_aliases(select: &Select, ctx: &RuleContext<'_>) -> RuleOutcome<Select> {
    let Some(where_clause) = &select.where_clause else {
        return RuleOutcome::Unchanged;
    };
    let mut table = SymbolTable::new(ctx.options.case_sensitive);
    table.define_select(select);
    let mut inlined = Vec::new();
    let mut blocked = None;
    let condition = resolve_lateral(&table, where_clause.condition.clone(), 0, &mut inlined, &mut blocked);
    if let Some(alias) = blocked {
        return RuleOutcome::Unmappable(
            Finding::unmappable(
                "UNSUPPORTED_LCA",
                format!("WHERE refers to `{alias}`, an alias of an aggregate or window expression"),
            )
            .with_hint("move the condition to HAVING or QUALIFY"),
        );
    }
    if inlined.is_empty() {
        return RuleOutcome::Unchanged;
    }
    inlined.dedup();
    let mut select = select.clone();
    select.where_clause = Some(Where { condition });
    RuleOutcome::risk(
        select,
        Finding::info("LCA_INLINED", format!("select-list alias {} inlined in WHERE", inlined.join(", "))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{codes, convert, sql};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_top_becomes_limit() {
        let result = convert(DialectType::SqlServer, "SELECT TOP 10 * FROM customers");
        assert_eq!(result.sql, "SELECT * FROM customers LIMIT 10");
        assert!(result.report.is_empty());
        assert_eq!(
            sql(DialectType::SqlServer, "SELECT TOP 3 a FROM t UNION ALL SELECT b FROM u"),
            "(SELECT a FROM t LIMIT 3) UNION ALL SELECT b FROM u"
        );
    }

    #[test]
    fn test_top_with_ties_and_percent() {
        assert_eq!(
            sql(DialectType::SqlServer, "SELECT TOP 5 WITH TIES name FROM t ORDER BY score DESC"),
            "SELECT name FROM t QUALIFY RANK() OVER (ORDER BY score DESC) <= 5 ORDER BY score DESC"
        );
        let result = convert(DialectType::SqlServer, "SELECT TOP 10 PERCENT * FROM t");
        assert_eq!(codes(&result), vec!["UNSUPPORTED_ROW_LIMIT"]);
    }

    #[test]
    fn test_fetch_first() {
        assert_eq!(
            sql(DialectType::Oracle, "SELECT a FROM t ORDER BY a OFFSET 5 ROWS FETCH FIRST 10 ROWS ONLY"),
            "SELECT a FROM t ORDER BY a LIMIT 10 OFFSET 5"
        );
    }

    #[test]
    fn test_rownum_filter() {
        assert_eq!(
            sql(DialectType::Oracle, "SELECT * FROM (SELECT a FROM t ORDER BY a) WHERE ROWNUM <= 10"),
            "SELECT * FROM (SELECT a FROM t ORDER BY a) LIMIT 10"
        );
        let result = convert(DialectType::Oracle, "SELECT a FROM t WHERE ROWNUM < 6 AND a > 1 ORDER BY a");
        assert_eq!(result.sql, "SELECT a FROM t WHERE a > 1 ORDER BY a LIMIT 5");
        assert_eq!(codes(&result), vec!["ROWNUM_BEFORE_ORDER"]);
    }

    #[test]
    fn test_teradata_sample() {
        assert_eq!(
            sql(DialectType::Teradata, "SELECT a FROM t SAMPLE 100"),
            "SELECT a FROM t ORDER BY RAND() LIMIT 100"
        );
    }

    #[test]
    fn test_null_comparison_is_flagged() {
        let result = convert(DialectType::SqlServer, "SELECT a FROM t WHERE b = NULL");
        assert_eq!(result.sql, "SELECT a FROM t WHERE b = NULL");
        assert_eq!(codes(&result), vec!["NULL_COMPARISON"]);
    }

    #[test]
    fn test_tsql_string_plus() {
        assert_eq!(
            sql(DialectType::SqlServer, "SELECT first_name + ' ' + last_name FROM people"),
            "SELECT first_name || ' ' || last_name FROM people"
        );
        assert_eq!(sql(DialectType::SqlServer, "SELECT a + 1 FROM t"), "SELECT a + 1 FROM t");
    }

    #[test]
    fn test_parameter_markers() {
        assert_eq!(
            sql(DialectType::SqlServer, "SELECT * FROM t WHERE id = @id"),
            "SELECT * FROM t WHERE id = :id"
        );
        let result = convert(DialectType::SqlServer, "SELECT @@ROWCOUNT");
        assert_eq!(codes(&result), vec!["SYSTEM_VARIABLE"]);
    }

    #[test]
    fn test_oracle_outer_join() {
        assert_eq!(
            sql(
                DialectType::Oracle,
                "SELECT e.name, d.name FROM emp e, dept d WHERE e.dept_id = d.id(+) AND e.active = 1"
            ),
            "SELECT e.name, d.name FROM emp AS e LEFT JOIN dept AS d ON e.dept_id = d.id WHERE e.active = 1"
        );
    }

    #[test]
    fn test_apply_becomes_lateral_join() {
        assert_eq!(
            sql(
                DialectType::SqlServer,
                "SELECT c.id, o.total FROM customers c OUTER APPLY (SELECT TOP 1 total FROM orders WHERE orders.cid = c.id) o"
            ),
            "SELECT c.id, o.total FROM customers AS c LEFT JOIN LATERAL (SELECT total FROM orders WHERE orders.cid = c.id LIMIT 1) AS o ON TRUE"
        );
    }

    #[test]
    fn test_table_hints_are_dropped() {
        let result = convert(DialectType::SqlServer, "SELECT a FROM t WITH (NOLOCK)");
        assert_eq!(result.sql, "SELECT a FROM t");
        assert_eq!(codes(&result), vec!["TABLE_HINT_DROPPED"]);
    }

    #[test]
    fn test_lateral_alias_in_where() {
        let result = convert(DialectType::Snowflake, "SELECT price * qty AS total FROM t WHERE total > 100");
        assert_eq!(result.sql, "SELECT price * qty AS total FROM t WHERE price * qty > 100");
        assert_eq!(codes(&result), vec!["LCA_INLINED"]);
        let result = convert(DialectType::Teradata, "SELECT SUM(x) AS s FROM t WHERE s > 1");
        assert_eq!(codes(&result), vec!["UNSUPPORTED_LCA"]);
    }

    #[test]
    fn test_extension_verdicts() {
        let ext = Extension::new("CONNECT BY", "CONNECT BY PRIOR id = parent", DialectType::Oracle, Default::default());
        assert_eq!(extension_verdict(&ext, false).map(|f| f.code), Some("UNSUPPORTED_CONSTRUCT"));
        let ext = Extension::new("LATERAL VIEW", "LATERAL VIEW explode(x) t", DialectType::Hive, Default::default());
        assert!(extension_verdict(&ext, false).is_none());
    }
}
