//! Tree traversal utilities for the SQL AST.
//!
//! Read-only search over expression trees goes through [`ExpressionWalk`]
//! (depth-first iteration, `find`, `contains`). Mutating passes implement
//! [`VisitorMut`]; its default methods walk every child, so an implementation
//! only overrides the nodes it cares about and calls the matching `walk_*`
//! function to keep descending.
//!
//! Expression children never include queries: a subquery is reached through
//! [`VisitorMut::visit_query`], and the `ExpressionWalk` iterators stop at it.

use crate::expressions::{
    ColumnConstraint, ColumnDef, DataType, Expression, FrameBound, From, InTarget, InsertSource,
    MergeAction, Query, QueryBody, Select, Statement, TableConstraintKind, TableFactor, TableOption,
    TableRef,
};
use crate::tokens::Span;

/// Aggregate functions recognised by [`contains_aggregate`]
pub const AGGREGATE_FUNCTIONS: &[&str] = &[
    "ANY_VALUE",
    "APPROX_COUNT_DISTINCT",
    "ARRAY_AGG",
    "AVG",
    "BIT_AND",
    "BIT_OR",
    "BOOL_AND",
    "BOOL_OR",
    "COLLECT_LIST",
    "COLLECT_SET",
    "COUNT",
    "COUNT_IF",
    "GROUP_CONCAT",
    "LISTAGG",
    "MAX",
    "MEDIAN",
    "MIN",
    "STDDEV",
    "STDDEV_POP",
    "STDDEV_SAMP",
    "STRING_AGG",
    "SUM",
    "VARIANCE",
    "VAR_POP",
    "VAR_SAMP",
];

/// Direct child expressions of `expr`, left to right
pub fn children(expr: &Expression) -> Vec<&Expression> {
    let mut out = Vec::new();
    match expr {
        Expression::Binary(b) => {
            out.push(&b.left);
            out.push(&b.right);
        }
        Expression::Unary(u) => out.push(&u.expr),
        Expression::Paren(inner) => out.push(inner),
        Expression::Alias(a) => out.push(&a.expr),
        Expression::Function(f) => {
            out.extend(f.args.iter());
            out.extend(f.order_by.iter().map(|o| &o.expr));
            out.extend(f.within_group.iter().map(|o| &o.expr));
            out.extend(f.filter.iter());
        }
        Expression::Window(w) => {
            out.extend(w.function.args.iter());
            out.extend(w.function.order_by.iter().map(|o| &o.expr));
            out.extend(w.function.filter.iter());
            out.extend(w.over.partition_by.iter());
            out.extend(w.over.order_by.iter().map(|o| &o.expr));
            if let Some(frame) = &w.over.frame {
                for bound in std::iter::once(&frame.start).chain(frame.end.iter()) {
                    if let FrameBound::Preceding(e) | FrameBound::Following(e) = bound {
                        out.push(e);
                    }
                }
            }
        }
        Expression::Cast(c) => out.push(&c.expr),
        Expression::Case(c) => {
            out.extend(c.operand.iter());
            for (condition, result) in &c.whens {
                out.push(condition);
                out.push(result);
            }
            out.extend(c.else_result.iter());
        }
        Expression::In(i) => {
            out.push(&i.expr);
            if let InTarget::List(items) = &i.target {
                out.extend(items.iter());
            }
        }
        Expression::Between(b) => {
            out.push(&b.expr);
            out.push(&b.low);
            out.push(&b.high);
        }
        Expression::Like(l) => {
            out.push(&l.expr);
            out.push(&l.pattern);
            out.extend(l.escape.iter());
        }
        Expression::IsNull(i) => out.push(&i.expr),
        Expression::Interval(i) => out.push(&i.value),
        Expression::Extract(e) => out.push(&e.expr),
        Expression::Trim(t) => {
            out.extend(t.characters.iter());
            out.push(&t.expr);
        }
        Expression::Array(items) | Expression::Tuple(items) => out.extend(items.iter()),
        Expression::Subscript(s) => {
            out.push(&s.expr);
            out.push(&s.index);
        }
        Expression::JsonAccess(j) => {
            out.push(&j.expr);
            out.push(&j.path);
        }
        Expression::NamedArgument(n) => out.push(&n.value),
        Expression::Literal(_)
        | Expression::Boolean(_)
        | Expression::Null
        | Expression::Column(_)
        | Expression::Star(_)
        | Expression::Parameter(_)
        | Expression::Exists(_)
        | Expression::Subquery(_)
        | Expression::DataType(_)
        | Expression::Extension(_) => {}
    }
    out
}

/// Pre-order depth-first iterator over an expression tree
pub struct DfsIter<'a> {
    stack: Vec<&'a Expression>,
}

impl<'a> DfsIter<'a> {
    pub fn new(root: &'a Expression) -> Self {
        Self { stack: vec![root] }
    }
}

impl<'a> Iterator for DfsIter<'a> {
    type Item = &'a Expression;

    fn next(&mut self) -> Option<Self::Item> {
        let expr = self.stack.pop()?;
        // reversed so children come out left to right
        self.stack.extend(children(expr).into_iter().rev());
        Some(expr)
    }
}

/// Search methods on [`Expression`]
pub trait ExpressionWalk {
    fn dfs(&self) -> DfsIter<'_>;

    fn find<F>(&self, predicate: F) -> Option<&Expression>
    where
        F: Fn(&Expression) -> bool;

    fn find_all<F>(&self, predicate: F) -> Vec<&Expression>
    where
        F: Fn(&Expression) -> bool;

    fn contains<F>(&self, predicate: F) -> bool
    where
        F: Fn(&Expression) -> bool;
}

impl ExpressionWalk for Expression {
    fn dfs(&self) -> DfsIter<'_> {
        DfsIter::new(self)
    }

    fn find<F>(&self, predicate: F) -> Option<&Expression>
    where
        F: Fn(&Expression) -> bool,
    {
        self.dfs().find(|e| predicate(e))
    }

    fn find_all<F>(&self, predicate: F) -> Vec<&Expression>
    where
        F: Fn(&Expression) -> bool,
    {
        self.dfs().filter(|e| predicate(e)).collect()
    }

    fn contains<F>(&self, predicate: F) -> bool
    where
        F: Fn(&Expression) -> bool,
    {
        self.dfs().any(|e| predicate(e))
    }
}

pub fn is_column(expr: &Expression) -> bool {
    matches!(expr, Expression::Column(_))
}

/// An aggregate call that is not evaluated over a window
pub fn is_aggregate(expr: &Expression) -> bool {
    matches!(expr, Expression::Function(f) if AGGREGATE_FUNCTIONS.contains(&f.name.as_str()))
}

pub fn is_window_function(expr: &Expression) -> bool {
    matches!(expr, Expression::Window(_))
}

pub fn contains_aggregate(expr: &Expression) -> bool {
    expr.contains(is_aggregate)
}

pub fn contains_window_function(expr: &Expression) -> bool {
    expr.contains(is_window_function)
}

/// Rebuild `expr` bottom-up, applying `fun` to every node after its children
pub fn transform_map<F>(mut expr: Expression, fun: &mut F) -> Expression
where
    F: FnMut(Expression) -> Expression,
{
    for child in children_mut(&mut expr) {
        let taken = std::mem::replace(child, Expression::Null);
        *child = transform_map(taken, fun);
    }
    fun(expr)
}

/// Mutable direct children of `expr`, in the same order as [`children`]
pub fn children_mut(expr: &mut Expression) -> Vec<&mut Expression> {
    let mut out = Vec::new();
    match expr {
        Expression::Binary(b) => {
            out.push(&mut b.left);
            out.push(&mut b.right);
        }
        Expression::Unary(u) => out.push(&mut u.expr),
        Expression::Paren(inner) => out.push(&mut **inner),
        Expression::Alias(a) => out.push(&mut a.expr),
        Expression::Function(f) => {
            out.extend(f.args.iter_mut());
            out.extend(f.order_by.iter_mut().map(|o| &mut o.expr));
            out.extend(f.within_group.iter_mut().map(|o| &mut o.expr));
            out.extend(f.filter.iter_mut());
        }
        Expression::Window(w) => {
            let w = &mut **w;
            out.extend(w.function.args.iter_mut());
            out.extend(w.function.order_by.iter_mut().map(|o| &mut o.expr));
            out.extend(w.function.filter.iter_mut());
            out.extend(w.over.partition_by.iter_mut());
            out.extend(w.over.order_by.iter_mut().map(|o| &mut o.expr));
            if let Some(frame) = &mut w.over.frame {
                for bound in std::iter::once(&mut frame.start).chain(frame.end.iter_mut()) {
                    if let FrameBound::Preceding(e) | FrameBound::Following(e) = bound {
                        out.push(e);
                    }
                }
            }
        }
        Expression::Cast(c) => out.push(&mut c.expr),
        Expression::Case(c) => {
            let c = &mut **c;
            out.extend(c.operand.iter_mut());
            for (condition, result) in &mut c.whens {
                out.push(condition);
                out.push(result);
            }
            out.extend(c.else_result.iter_mut());
        }
        Expression::In(i) => {
            let i = &mut **i;
            out.push(&mut i.expr);
            if let InTarget::List(items) = &mut i.target {
                out.extend(items.iter_mut());
            }
        }
        Expression::Between(b) => {
            let b = &mut **b;
            out.push(&mut b.expr);
            out.push(&mut b.low);
            out.push(&mut b.high);
        }
        Expression::Like(l) => {
            let l = &mut **l;
            out.push(&mut l.expr);
            out.push(&mut l.pattern);
            out.extend(l.escape.iter_mut());
        }
        Expression::IsNull(i) => out.push(&mut i.expr),
        Expression::Interval(i) => out.push(&mut i.value),
        Expression::Extract(e) => out.push(&mut e.expr),
        Expression::Trim(t) => {
            let t = &mut **t;
            out.extend(t.characters.iter_mut());
            out.push(&mut t.expr);
        }
        Expression::Array(items) | Expression::Tuple(items) => out.extend(items.iter_mut()),
        Expression::Subscript(s) => {
            let s = &mut **s;
            out.push(&mut s.expr);
            out.push(&mut s.index);
        }
        Expression::JsonAccess(j) => {
            let j = &mut **j;
            out.push(&mut j.expr);
            out.push(&mut j.path);
        }
        Expression::NamedArgument(n) => out.push(&mut n.value),
        Expression::Literal(_)
        | Expression::Boolean(_)
        | Expression::Null
        | Expression::Column(_)
        | Expression::Star(_)
        | Expression::Parameter(_)
        | Expression::Exists(_)
        | Expression::Subquery(_)
        | Expression::DataType(_)
        | Expression::Extension(_) => {}
    }
    out
}

// ---------------------------------------------------------------------------
// Statement visitor
// ---------------------------------------------------------------------------

/// Mutable post-order walk over a whole statement
pub trait VisitorMut {
    fn visit_statement(&mut self, statement: &mut Statement) {
        walk_statement(self, statement);
    }

    fn visit_query(&mut self, query: &mut Query) {
        walk_query(self, query);
    }

    fn visit_select(&mut self, select: &mut Select) {
        walk_select(self, select);
    }

    fn visit_table_factor(&mut self, factor: &mut TableFactor) {
        walk_table_factor(self, factor);
    }

    fn visit_table_ref(&mut self, _table: &mut TableRef) {}

    fn visit_expression(&mut self, expr: &mut Expression) {
        walk_expression(self, expr);
    }

    fn visit_column_def(&mut self, column: &mut ColumnDef) {
        walk_column_def(self, column);
    }

    fn visit_data_type(&mut self, _data_type: &mut DataType) {}
}

pub fn walk_statement<V: VisitorMut + ?Sized>(v: &mut V, statement: &mut Statement) {
    match statement {
        Statement::Query(query) => v.visit_query(query),
        Statement::Insert(insert) => {
            v.visit_table_ref(&mut insert.table);
            if let InsertSource::Query(query) = &mut insert.source {
                v.visit_query(query);
            }
        }
        Statement::Update(update) => {
            v.visit_table_ref(&mut update.table);
            for assignment in &mut update.assignments {
                v.visit_expression(&mut assignment.value);
            }
            if let Some(from) = &mut update.from {
                walk_from(v, from);
            }
            if let Some(where_clause) = &mut update.where_clause {
                v.visit_expression(&mut where_clause.condition);
            }
        }
        Statement::Delete(delete) => {
            v.visit_table_ref(&mut delete.table);
            if let Some(using) = &mut delete.using {
                walk_from(v, using);
            }
            if let Some(where_clause) = &mut delete.where_clause {
                v.visit_expression(&mut where_clause.condition);
            }
        }
        Statement::Merge(merge) => {
            v.visit_table_ref(&mut merge.target);
            v.visit_table_factor(&mut merge.source);
            v.visit_expression(&mut merge.on);
            for clause in &mut merge.clauses {
                if let Some(condition) = &mut clause.condition {
                    v.visit_expression(condition);
                }
                match &mut clause.action {
                    MergeAction::Update { assignments } => {
                        for assignment in assignments {
                            v.visit_expression(&mut assignment.value);
                        }
                    }
                    MergeAction::Insert { values, .. } => {
                        for value in values {
                            v.visit_expression(value);
                        }
                    }
                    MergeAction::Delete => {}
                }
            }
        }
        Statement::CreateTable(create) => {
            v.visit_table_ref(&mut create.name);
            for column in &mut create.columns {
                v.visit_column_def(column);
            }
            for constraint in &mut create.constraints {
                match &mut constraint.kind {
                    TableConstraintKind::Check(expr) => v.visit_expression(expr),
                    TableConstraintKind::ForeignKey { table, .. } => v.visit_table_ref(table),
                    _ => {}
                }
            }
            for option in &mut create.options {
                if let TableOption::ClusterBy(exprs) | TableOption::PartitionBy(exprs) = option {
                    for expr in exprs {
                        v.visit_expression(expr);
                    }
                }
            }
            if let Some(like) = &mut create.like {
                v.visit_table_ref(like);
            }
            if let Some(query) = &mut create.as_query {
                v.visit_query(query);
            }
        }
        Statement::CreateView(view) => {
            v.visit_table_ref(&mut view.name);
            v.visit_query(&mut view.query);
        }
        Statement::Drop(drop) => {
            for name in &mut drop.names {
                v.visit_table_ref(name);
            }
        }
        Statement::Truncate(truncate) => v.visit_table_ref(&mut truncate.table),
        Statement::Use(_) => {}
        Statement::Extension(extension) => {
            if let Some(body) = &mut extension.body {
                v.visit_statement(body);
            }
        }
    }
}

pub fn walk_query<V: VisitorMut + ?Sized>(v: &mut V, query: &mut Query) {
    if let Some(with) = &mut query.with {
        for cte in &mut with.ctes {
            v.visit_query(&mut cte.query);
        }
    }
    walk_query_body(v, &mut query.body);
    if let Some(order_by) = &mut query.order_by {
        for item in &mut order_by.expressions {
            v.visit_expression(&mut item.expr);
        }
    }
    if let Some(limit) = &mut query.limit {
        v.visit_expression(&mut limit.count);
    }
    if let Some(offset) = &mut query.offset {
        v.visit_expression(&mut offset.count);
    }
    if let Some(count) = query.fetch.as_mut().and_then(|f| f.count.as_mut()) {
        v.visit_expression(count);
    }
}

pub fn walk_query_body<V: VisitorMut + ?Sized>(v: &mut V, body: &mut QueryBody) {
    match body {
        QueryBody::Select(select) => v.visit_select(select),
        QueryBody::SetOperation(set) => {
            walk_query_body(v, &mut set.left);
            walk_query_body(v, &mut set.right);
        }
        QueryBody::Values(values) => {
            for row in &mut values.rows {
                for expr in row {
                    v.visit_expression(expr);
                }
            }
        }
        QueryBody::Nested(query) => v.visit_query(query),
    }
}

pub fn walk_select<V: VisitorMut + ?Sized>(v: &mut V, select: &mut Select) {
    if let Some(from) = &mut select.from {
        walk_from(v, from);
    }
    if let Some(top) = &mut select.top {
        v.visit_expression(&mut top.count);
    }
    for item in &mut select.projection {
        v.visit_expression(item);
    }
    if let Some(into) = &mut select.into {
        v.visit_table_ref(into);
    }
    if let Some(where_clause) = &mut select.where_clause {
        v.visit_expression(&mut where_clause.condition);
    }
    if let Some(group_by) = &mut select.group_by {
        for expr in &mut group_by.expressions {
            v.visit_expression(expr);
        }
    }
    if let Some(having) = &mut select.having {
        v.visit_expression(&mut having.condition);
    }
    if let Some(qualify) = &mut select.qualify {
        v.visit_expression(&mut qualify.condition);
    }
    for window in &mut select.named_windows {
        for expr in &mut window.spec.partition_by {
            v.visit_expression(expr);
        }
        for item in &mut window.spec.order_by {
            v.visit_expression(&mut item.expr);
        }
    }
}

pub fn walk_from<V: VisitorMut + ?Sized>(v: &mut V, from: &mut From) {
    for relation in &mut from.relations {
        v.visit_table_factor(relation);
    }
    for join in &mut from.joins {
        v.visit_table_factor(&mut join.relation);
        if let crate::expressions::JoinConstraint::On(condition) = &mut join.constraint {
            v.visit_expression(condition);
        }
    }
}

pub fn walk_table_factor<V: VisitorMut + ?Sized>(v: &mut V, factor: &mut TableFactor) {
    match factor {
        TableFactor::Table(table) => v.visit_table_ref(table),
        TableFactor::Derived { subquery, .. } => v.visit_query(subquery),
        TableFactor::Function { function, .. } => {
            for arg in &mut function.args {
                v.visit_expression(arg);
            }
        }
        TableFactor::Extended { base, .. } => v.visit_table_factor(base),
    }
}

/// Visit the children of `expr`, including subqueries and type operands
pub fn walk_expression<V: VisitorMut + ?Sized>(v: &mut V, expr: &mut Expression) {
    match expr {
        Expression::Subquery(query) => v.visit_query(query),
        Expression::Exists(exists) => v.visit_query(&mut exists.query),
        Expression::DataType(data_type) => v.visit_data_type(data_type),
        Expression::Cast(cast) => {
            v.visit_expression(&mut cast.expr);
            v.visit_data_type(&mut cast.to);
        }
        Expression::In(in_expr) => {
            v.visit_expression(&mut in_expr.expr);
            match &mut in_expr.target {
                InTarget::List(items) => {
                    for item in items {
                        v.visit_expression(item);
                    }
                }
                InTarget::Subquery(query) => v.visit_query(query),
            }
        }
        other => {
            for child in children_mut(other) {
                v.visit_expression(child);
            }
        }
    }
}

pub fn walk_column_def<V: VisitorMut + ?Sized>(v: &mut V, column: &mut ColumnDef) {
    v.visit_data_type(&mut column.data_type);
    for constraint in &mut column.constraints {
        match constraint {
            ColumnConstraint::Default(expr) | ColumnConstraint::Check(expr) => v.visit_expression(expr),
            ColumnConstraint::References { table, .. } => v.visit_table_ref(table),
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Source position of the nearest node under `expr` that carries one
pub fn expression_span(expr: &Expression) -> Option<Span> {
    let own = match expr {
        Expression::Column(c) => Some(c.span),
        Expression::Function(f) => Some(f.span),
        Expression::Window(w) => Some(w.function.span),
        Expression::Cast(c) => Some(c.span),
        Expression::Parameter(p) => Some(p.span),
        Expression::Extension(e) => Some(e.span),
        Expression::Subquery(q) => Some(q.span),
        Expression::Exists(e) => Some(e.query.span),
        _ => None,
    };
    own.filter(|span| *span != Span::default())
        .or_else(|| children(expr).into_iter().find_map(expression_span))
}

/// Split a condition into its top-level `AND` operands
pub fn conjuncts(expr: &Expression) -> Vec<Expression> {
    use crate::expressions::BinaryOperator;
    match expr {
        Expression::Binary(b) if b.op == BinaryOperator::And => {
            let mut out = conjuncts(&b.left);
            out.extend(conjuncts(&b.right));
            out
        }
        Expression::Paren(inner) if matches!(&**inner, Expression::Binary(b) if b.op == BinaryOperator::And) => {
            conjuncts(inner)
        }
        other => vec![other.clone()],
    }
}

/// Join conditions with `AND`; `None` for an empty list
pub fn and_all(conditions: Vec<Expression>) -> Option<Expression> {
    use crate::expressions::BinaryOperator;
    conditions
        .into_iter()
        .reduce(|acc, next| Expression::binary(BinaryOperator::And, acc, next))
}

/// Span-free JSON form of a statement, for structural comparison
pub fn ast_fingerprint(statement: &Statement) -> serde_json::Value {
    span_free(statement).unwrap_or(serde_json::Value::Null)
}

/// Whether two expressions are the same once source positions are ignored
pub fn same_expression(a: &Expression, b: &Expression) -> bool {
    if a == b {
        return true;
    }
    match (span_free(a), span_free(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn span_free<T: serde::Serialize>(node: &T) -> Option<serde_json::Value> {
    fn strip(value: &mut serde_json::Value) {
        match value {
            serde_json::Value::Object(map) => {
                map.remove("span");
                map.values_mut().for_each(strip);
            }
            serde_json::Value::Array(items) => items.iter_mut().for_each(strip),
            _ => {}
        }
    }
    let mut value = serde_json::to_value(node).ok()?;
    strip(&mut value);
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialects::{DialectRegistry, DialectType};
    use crate::expressions::{BinaryOperator, Column};

    fn parse(dialect: DialectType, sql: &str) -> Statement {
        let registry = DialectRegistry::builtin().unwrap();
        registry.get(dialect).unwrap().parse_one(sql).unwrap()
    }

    fn projection(statement: &Statement) -> Vec<Expression> {
        match statement {
            Statement::Query(q) => q.select().unwrap().projection.clone(),
            _ => panic!("not a query"),
        }
    }

    #[test]
    fn test_dfs_is_pre_order() {
        let expr = Expression::binary(
            BinaryOperator::Plus,
            Expression::column("a"),
            Expression::binary(BinaryOperator::Multiply, Expression::column("b"), Expression::number(2)),
        );
        let columns: Vec<String> = expr
            .find_all(is_column)
            .into_iter()
            .map(|e| match e {
                Expression::Column(c) => c.name.name.clone(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(columns, vec!["a", "b"]);
        assert_eq!(expr.dfs().count(), 5);
    }

    #[test]
    fn test_contains_aggregate_ignores_subqueries() {
        let statement = parse(
            DialectType::PostgreSQL,
            "SELECT SUM(x), (SELECT MAX(y) FROM t), z + 1 FROM s",
        );
        let items = projection(&statement);
        assert!(contains_aggregate(&items[0]));
        assert!(!contains_aggregate(&items[1]));
        assert!(!contains_aggregate(&items[2]));
    }

    #[test]
    fn test_transform_map_renames_columns() {
        let expr = Expression::binary(BinaryOperator::Eq, Expression::column("a"), Expression::column("b"));
        let renamed = transform_map(expr, &mut |e| match e {
            Expression::Column(c) if c.name.name == "a" => Expression::Column(Column::new("x")),
            other => other,
        });
        assert_eq!(
            renamed,
            Expression::binary(BinaryOperator::Eq, Expression::column("x"), Expression::column("b"))
        );
    }

    #[test]
    fn test_conjuncts_round_trip() {
        let statement = parse(DialectType::PostgreSQL, "SELECT 1 FROM t WHERE a = 1 AND (b = 2 AND c = 3)");
        let Statement::Query(query) = &statement else {
            panic!("not a query");
        };
        let condition = &query.select().unwrap().where_clause.as_ref().unwrap().condition;
        let parts = conjuncts(condition);
        assert_eq!(parts.len(), 3);
        assert!(and_all(Vec::new()).is_none());
        assert_eq!(conjuncts(&and_all(parts.clone()).unwrap()), parts);
    }

    #[test]
    fn test_fingerprint_ignores_spans() {
        let a = parse(DialectType::PostgreSQL, "SELECT a FROM t");
        let b = parse(DialectType::PostgreSQL, "SELECT   a\nFROM    t");
        assert_ne!(a, b);
        assert_eq!(ast_fingerprint(&a), ast_fingerprint(&b));
    }

    struct CountTables(usize);

    impl VisitorMut for CountTables {
        fn visit_table_ref(&mut self, _table: &mut TableRef) {
            self.0 += 1;
        }
    }

    #[test]
    fn test_visitor_reaches_nested_tables() {
        let mut statement = parse(
            DialectType::PostgreSQL,
            "WITH c AS (SELECT * FROM a) SELECT * FROM c JOIN b ON c.id = b.id WHERE EXISTS (SELECT 1 FROM d)",
        );
        let mut counter = CountTables(0);
        counter.visit_statement(&mut statement);
        assert_eq!(counter.0, 4);
    }

    #[test]
    fn test_same_expression_ignores_positions() {
        let items = projection(&parse(DialectType::Oracle, "SELECT name, name, other FROM t"));
        assert_ne!(items[0], items[1]);
        assert!(same_expression(&items[0], &items[1]));
        assert!(!same_expression(&items[0], &items[2]));
    }
}
