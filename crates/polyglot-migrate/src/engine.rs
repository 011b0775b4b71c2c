//! Rule application
//!
//! [`rewrite_statement`] walks a parsed statement bottom-up (children before
//! parents) and offers every node to the rules of the active migration,
//! highest priority first. The first rule that answers with anything other
//! than [`RuleOutcome::Unchanged`] wins the round; a replacement node is then
//! offered again to the rules that have not fired on it yet, so chained rules
//! compose. A node sees at most [`MAX_ROUNDS`] firings.
//!
//! Dialect constructs that are still present as [`Extension`] nodes after
//! rewriting are reported once each by [`collect_extensions`].

use crate::diagnostics::Diagnostic;
use crate::expressions::{
    ColumnConstraint, ColumnDef, DataType, Expression, Extension, Query, Select, Statement, TableFactor, TableOption,
};
use crate::rules::syntax::extension_verdict;
use crate::rules::{Finding, RewriteRule, RuleAction, RuleContext, RuleOutcome, RuleSet};
use crate::tokens::Span;
use crate::traversal::{
    children_mut, expression_span, walk_column_def, walk_expression, walk_query, walk_select, walk_statement, walk_table_factor,
    VisitorMut,
};
use tracing::debug;

/// Firings allowed on one node before the engine gives up on a fixed point
pub const MAX_ROUNDS: usize = 8;

/// What rewriting one statement produced
#[derive(Debug, Clone, Default)]
pub struct RewriteOutput {
    pub diagnostics: Vec<Diagnostic>,
    /// Names of the rules that changed something, in firing order
    pub fired: Vec<&'static str>,
}

/// A node kind rules can be offered
trait Rewritable: Clone + PartialEq {
    fn offer(&self, action: &RuleAction, ctx: &RuleContext<'_>) -> RuleOutcome<Self>;

    /// Uppercase function name keyed rules are matched against
    fn key(&self) -> Option<String> {
        None
    }

    fn node_span(&self) -> Option<Span>;
}

impl Rewritable for Expression {
    fn offer(&self, action: &RuleAction, ctx: &RuleContext<'_>) -> RuleOutcome<Self> {
        match action {
            RuleAction::Expression(f) => f(self, ctx),
            _ => RuleOutcome::Unchanged,
        }
    }

    fn key(&self) -> Option<String> {
        match self {
            Expression::Function(f) => Some(f.name.to_uppercase()),
            Expression::Window(w) => Some(w.function.name.to_uppercase()),
            _ => None,
        }
    }

    fn node_span(&self) -> Option<Span> {
        expression_span(self)
    }
}

impl Rewritable for DataType {
    fn offer(&self, action: &RuleAction, ctx: &RuleContext<'_>) -> RuleOutcome<Self> {
        match action {
            RuleAction::DataType(f) => f(self, ctx),
            _ => RuleOutcome::Unchanged,
        }
    }

    fn node_span(&self) -> Option<Span> {
        None
    }
}

impl Rewritable for Select {
    fn offer(&self, action: &RuleAction, ctx: &RuleContext<'_>) -> RuleOutcome<Self> {
        match action {
            RuleAction::Select(f) => f(self, ctx),
            _ => RuleOutcome::Unchanged,
        }
    }

    fn node_span(&self) -> Option<Span> {
        self.projection.iter().find_map(expression_span)
    }
}

impl Rewritable for Query {
    fn offer(&self, action: &RuleAction, ctx: &RuleContext<'_>) -> RuleOutcome<Self> {
        match action {
            RuleAction::Query(f) => f(self, ctx),
            _ => RuleOutcome::Unchanged,
        }
    }

    fn node_span(&self) -> Option<Span> {
        Some(self.span)
    }
}

impl Rewritable for Statement {
    fn offer(&self, action: &RuleAction, ctx: &RuleContext<'_>) -> RuleOutcome<Self> {
        match action {
            RuleAction::Statement(f) => f(self, ctx),
            _ => RuleOutcome::Unchanged,
        }
    }

    fn node_span(&self) -> Option<Span> {
        Some(self.span())
    }
}

/// Apply `rules` to one parsed statement in place
pub fn rewrite_statement(
    statement: &mut Statement,
    rules: &RuleSet<'_>,
    ctx: RuleContext<'_>,
    index: usize,
) -> RewriteOutput {
    let mut rewriter = Rewriter {
        rules,
        ctx,
        column: None,
        column_span: None,
        index,
        statement_span: statement.span(),
        output: RewriteOutput::default(),
    };
    rewriter.visit_statement(statement);
    rewriter.output
}

struct Rewriter<'r, 'c, 'o> {
    rules: &'r RuleSet<'c>,
    ctx: RuleContext<'o>,
    /// Column whose definition is being walked
    column: Option<String>,
    /// Where that column is declared; positions findings on its type
    column_span: Option<Span>,
    index: usize,
    statement_span: Span,
    output: RewriteOutput,
}

impl Rewriter<'_, '_, '_> {
    fn rewrite<T: Rewritable>(&mut self, node: &mut T, rules: &[&RewriteRule], ctx: &RuleContext<'_>) {
        if rules.is_empty() {
            return;
        }
        let mut fired: Vec<usize> = Vec::new();
        for _ in 0..MAX_ROUNDS {
            let key = node.key();
            let mut progressed = false;
            for (i, rule) in rules.iter().enumerate() {
                if fired.contains(&i) || !rule.accepts_key(key.as_deref()) {
                    continue;
                }
                match node.offer(&rule.action, ctx) {
                    RuleOutcome::Unchanged => continue,
                    RuleOutcome::Replaced(replacement) => {
                        if replacement == *node {
                            continue;
                        }
                        *node = replacement;
                        self.fired(rule, Vec::new(), node.node_span());
                    }
                    RuleOutcome::ReplacedWithRisk(replacement, findings) => {
                        *node = replacement;
                        self.fired(rule, findings, node.node_span());
                    }
                    RuleOutcome::Unmappable(finding) => {
                        self.fired(rule, vec![finding], node.node_span());
                        return;
                    }
                }
                fired.push(i);
                progressed = true;
                break;
            }
            if !progressed {
                return;
            }
        }
        debug!(statement = self.index, rounds = MAX_ROUNDS, "rewrite round limit reached");
    }

    fn fired(&mut self, rule: &RewriteRule, findings: Vec<Finding>, node_span: Option<Span>) {
        debug!(rule = rule.name, statement = self.index, findings = findings.len(), "rule fired");
        self.output.fired.push(rule.name);
        let fallback = node_span
            .or(self.column_span)
            .filter(|span| *span != Span::default())
            .unwrap_or(self.statement_span);
        for finding in findings {
            self.output
                .diagnostics
                .push(to_diagnostic(finding, fallback, self.index).with_rule(rule.name));
        }
    }
}

impl VisitorMut for Rewriter<'_, '_, '_> {
    fn visit_statement(&mut self, statement: &mut Statement) {
        walk_statement(self, statement);
        let (rules, ctx) = (self.rules, self.ctx);
        self.rewrite(statement, &rules.statement, &ctx);
    }

    fn visit_query(&mut self, query: &mut Query) {
        walk_query(self, query);
        let (rules, ctx) = (self.rules, self.ctx);
        self.rewrite(query, &rules.query, &ctx);
    }

    fn visit_select(&mut self, select: &mut Select) {
        walk_select(self, select);
        let (rules, ctx) = (self.rules, self.ctx);
        self.rewrite(select, &rules.select, &ctx);
    }

    fn visit_expression(&mut self, expr: &mut Expression) {
        let (rules, ctx) = (self.rules, self.ctx);
        if !has_type_operand(expr) {
            walk_expression(self, expr);
            self.rewrite(expr, &rules.expression, &ctx);
            return;
        }
        // `CONVERT(VARCHAR(10), d, 120)` reads the declared type, so type operands are mapped last
        for child in children_mut(expr) {
            if !matches!(child, Expression::DataType(_)) {
                self.visit_expression(child);
            }
        }
        self.rewrite(expr, &rules.expression, &ctx);
        match expr {
            Expression::Cast(cast) => self.visit_data_type(&mut cast.to),
            other => {
                for child in children_mut(other) {
                    if let Expression::DataType(data_type) = child {
                        self.visit_data_type(data_type);
                    }
                }
            }
        }
    }

    fn visit_column_def(&mut self, column: &mut ColumnDef) {
        self.column = Some(column.name.name.clone());
        self.column_span = Some(column.span);
        walk_column_def(self, column);
        self.column = None;
        self.column_span = None;
    }

    fn visit_data_type(&mut self, data_type: &mut DataType) {
        let rules = self.rules;
        let column = self.column.clone();
        let ctx = self.ctx.with_column(column.as_deref());
        self.rewrite(data_type, &rules.data_type, &ctx);
    }
}

fn has_type_operand(expr: &Expression) -> bool {
    matches!(expr, Expression::Function(f) if f.args.iter().any(|arg| matches!(arg, Expression::DataType(_))))
}

/// Turn a rule finding into a diagnostic positioned at the finding, the node or the statement
pub fn to_diagnostic(finding: Finding, fallback: Span, statement: usize) -> Diagnostic {
    let mut diagnostic = Diagnostic::new(finding.kind, finding.code, finding.message)
        .with_span(finding.span.unwrap_or(fallback))
        .with_statement(statement);
    if let Some(hint) = finding.hint {
        diagnostic = diagnostic.with_hint(hint);
    }
    diagnostic
}

/// Report every dialect construct that survived rewriting
pub fn collect_extensions(statement: &mut Statement, index: usize) -> Vec<Diagnostic> {
    let mut collector = ExtensionCollector {
        statement_span: statement.span(),
        index,
        diagnostics: Vec::new(),
    };
    collector.visit_statement(statement);
    collector.diagnostics
}

struct ExtensionCollector {
    statement_span: Span,
    index: usize,
    diagnostics: Vec<Diagnostic>,
}

impl ExtensionCollector {
    fn report(&mut self, extension: &Extension, statement: bool) {
        if let Some(finding) = extension_verdict(extension, statement) {
            self.diagnostics
                .push(to_diagnostic(finding, self.statement_span, self.index));
        }
    }
}

impl VisitorMut for ExtensionCollector {
    fn visit_statement(&mut self, statement: &mut Statement) {
        match statement {
            Statement::Extension(extension) => {
                self.report(extension, extension.body.is_none());
            }
            Statement::CreateTable(create) => {
                for option in &create.options {
                    if let TableOption::Raw(extension) = option {
                        self.report(extension, false);
                    }
                }
            }
            _ => {}
        }
        walk_statement(self, statement);
    }

    fn visit_query(&mut self, query: &mut Query) {
        for extension in &query.trailing {
            self.report(extension, false);
        }
        walk_query(self, query);
    }

    fn visit_select(&mut self, select: &mut Select) {
        for extension in &select.extensions {
            self.report(extension, false);
        }
        walk_select(self, select);
    }

    fn visit_table_factor(&mut self, factor: &mut TableFactor) {
        if let TableFactor::Extended { extension, .. } = factor {
            self.report(extension, false);
        }
        walk_table_factor(self, factor);
    }

    fn visit_expression(&mut self, expr: &mut Expression) {
        if let Expression::Extension(extension) = expr {
            self.report(extension, false);
        }
        walk_expression(self, expr);
    }

    fn visit_column_def(&mut self, column: &mut ColumnDef) {
        for constraint in &column.constraints {
            if let ColumnConstraint::Raw(extension) = constraint {
                self.report(extension, false);
            }
        }
        walk_column_def(self, column);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TranspileOptions;
    use crate::dialects::{builtin_dialects, DialectRegistry, DialectType};
    use crate::diagnostics::DiagnosticKind;
    use crate::rules::{renamed, DialectMatch, RuleCatalog};

    fn parse(source: DialectType, sql: &str) -> Statement {
        DialectRegistry::builtin()
            .unwrap()
            .get(source)
            .unwrap()
            .parse_one(sql)
            .unwrap()
    }

    fn rename_foo(expr: &Expression, _: &RuleContext<'_>) -> RuleOutcome<Expression> {
        match renamed(expr, "BAR") {
            Some(replacement) => RuleOutcome::Replaced(replacement),
            None => RuleOutcome::Unchanged,
        }
    }

    fn rename_bar(expr: &Expression, _: &RuleContext<'_>) -> RuleOutcome<Expression> {
        match renamed(expr, "BAZ") {
            Some(replacement) => RuleOutcome::risk(replacement, Finding::risk("BAR_RENAMED", "BAR became BAZ")),
            None => RuleOutcome::Unchanged,
        }
    }

    fn always_replace(expr: &Expression, _: &RuleContext<'_>) -> RuleOutcome<Expression> {
        match expr {
            Expression::Function(f) => {
                let mut f = f.clone();
                f.args.push(Expression::number(1));
                RuleOutcome::Replaced(Expression::Function(f))
            }
            _ => RuleOutcome::Unchanged,
        }
    }

    fn rewrite(catalog: &RuleCatalog, sql: &str) -> (Statement, RewriteOutput) {
        let options = TranspileOptions::default();
        let mut statement = parse(DialectType::MySQL, sql);
        let rules = catalog.select(DialectType::MySQL, DialectType::Databricks);
        let ctx = RuleContext::new(DialectType::MySQL, DialectType::Databricks, &options);
        let output = rewrite_statement(&mut statement, &rules, ctx, 0);
        (statement, output)
    }

    #[test]
    fn test_replacements_chain_across_keys() {
        let catalog = RuleCatalog::build(vec![
            RewriteRule::function("foo", DialectMatch::Foreign, 10, "FOO", rename_foo),
            RewriteRule::function("bar", DialectMatch::Foreign, 10, "BAR", rename_bar),
        ])
        .unwrap();
        let (statement, output) = rewrite(&catalog, "SELECT FOO(a) FROM t");
        let Statement::Query(query) = &statement else { panic!("expected a query") };
        let select = query.select().unwrap();
        assert_eq!(select.projection[0].function_name(), Some("BAZ"));
        assert_eq!(output.fired, vec!["foo", "bar"]);
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.diagnostics[0].kind, DiagnosticKind::SemanticRiskWarning);
        assert_eq!(output.diagnostics[0].rule.as_deref(), Some("bar"));
        assert_eq!(output.diagnostics[0].span.start, 7);
    }

    #[test]
    fn test_each_rule_fires_once_per_node() {
        let catalog =
            RuleCatalog::build(vec![RewriteRule::function("grow", DialectMatch::Foreign, 10, "F", always_replace)])
                .unwrap();
        let (statement, output) = rewrite(&catalog, "SELECT F() FROM t");
        assert_eq!(output.fired, vec!["grow"]);
        let Statement::Query(query) = &statement else { panic!("expected a query") };
        let Expression::Function(f) = &query.select().unwrap().projection[0] else {
            panic!("expected a call")
        };
        assert_eq!(f.args.len(), 1);
    }

    #[test]
    fn test_identical_replacement_does_not_count() {
        fn same(expr: &Expression, _: &RuleContext<'_>) -> RuleOutcome<Expression> {
            RuleOutcome::Replaced(expr.clone())
        }
        let catalog = RuleCatalog::build(vec![RewriteRule::expression("same", DialectMatch::Foreign, 1, same)]).unwrap();
        let (_, output) = rewrite(&catalog, "SELECT a + 1 FROM t");
        assert!(output.fired.is_empty());
    }

    #[test]
    fn test_type_findings_point_at_their_column() {
        let sql = "CREATE TABLE t (a INT, amount NUMERIC(40, 10))";
        let options = TranspileOptions::default();
        let mut statement = parse(DialectType::PostgreSQL, sql);
        let catalog = RuleCatalog::builtin(&builtin_dialects()).unwrap();
        let rules = catalog.select(DialectType::PostgreSQL, DialectType::Databricks);
        let ctx = RuleContext::new(DialectType::PostgreSQL, DialectType::Databricks, &options);
        let output = rewrite_statement(&mut statement, &rules, ctx, 0);
        let narrowed: Vec<_> = output
            .diagnostics
            .iter()
            .filter(|d| d.code == "PRECISION_NARROWED")
            .collect();
        assert_eq!(narrowed.len(), 1);
        assert_eq!(narrowed[0].span.start, sql.find("amount").unwrap());
    }

    #[test]
    fn test_surviving_extensions_are_reported_once() {
        let mut statement = parse(DialectType::Oracle, "SELECT id FROM emp START WITH mgr IS NULL CONNECT BY PRIOR id = mgr");
        let diagnostics = collect_extensions(&mut statement, 3);
        assert!(!diagnostics.is_empty());
        assert!(diagnostics.iter().all(|d| d.code == "UNSUPPORTED_CONSTRUCT" && d.statement == 3));
        assert!(diagnostics.iter().all(|d| d.span.start > 0));
    }
}
