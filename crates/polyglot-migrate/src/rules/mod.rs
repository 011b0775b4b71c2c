//! Rewrite rule catalog
//!
//! A [`RewriteRule`] is a plain function pointer plus the metadata the engine
//! needs to pick it: which migrations it applies to, which node kind it
//! rewrites and how strongly it claims a node. Rules carry no state; anything
//! configurable is read from [`TranspileOptions`] through the [`RuleContext`].
//!
//! Rules shared by every source live in the submodules here. Rules that only
//! make sense for one source system are returned by that system's
//! [`DialectImpl::rules`](crate::dialects::DialectImpl::rules).
//!
//! | Module | Concern |
//! |---|---|
//! | [`functions`] | Function renames and argument reshaping |
//! | [`datetime`] | Date arithmetic and format strings |
//! | [`types`] | Column and cast types |
//! | [`syntax`] | Row limiting, operators, parameters, joins |
//! | [`identifiers`] | Name qualification and alias resolution |
//! | [`window`] | Window function syntax |
//! | [`ddl`] | Table options, column attributes, constraints |

pub mod datetime;
pub mod ddl;
pub mod functions;
pub mod identifiers;
pub mod syntax;
pub mod types;
pub mod window;

use crate::config::TranspileOptions;
use crate::dialects::{DialectImpl, DialectType};
use crate::diagnostics::DiagnosticKind;
use crate::error::{Error, Result};
use crate::expressions::{DataType, Expression, Function, Query, Select, Statement};
use crate::tokens::Span;
use std::fmt;

pub type ExpressionRule = fn(&Expression, &RuleContext<'_>) -> RuleOutcome<Expression>;
pub type DataTypeRule = fn(&DataType, &RuleContext<'_>) -> RuleOutcome<DataType>;
pub type SelectRule = fn(&Select, &RuleContext<'_>) -> RuleOutcome<Select>;
pub type QueryRule = fn(&Query, &RuleContext<'_>) -> RuleOutcome<Query>;
pub type StatementRule = fn(&Statement, &RuleContext<'_>) -> RuleOutcome<Statement>;

/// Which migrations a rule takes part in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialectMatch {
    /// Migrations out of one system
    Source(DialectType),
    /// Migrations out of any of these systems
    Sources(&'static [DialectType]),
    /// Every migration whose source differs from its target
    Foreign,
    /// Every run, including same-dialect runs
    Any,
}

impl DialectMatch {
    pub fn matches(&self, source: DialectType, target: DialectType) -> bool {
        match self {
            DialectMatch::Any => true,
            _ if source == target => false,
            DialectMatch::Foreign => true,
            DialectMatch::Source(d) => *d == source,
            DialectMatch::Sources(ds) => ds.contains(&source),
        }
    }

    /// Whether some migration selects both matchers
    pub fn overlaps(&self, other: &DialectMatch) -> bool {
        DialectType::all().any(|source| {
            DialectType::all().any(|target| self.matches(source, target) && other.matches(source, target))
        })
    }
}

/// Node kind a rule rewrites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Expression,
    DataType,
    Select,
    Query,
    Statement,
}

#[derive(Clone, Copy)]
pub enum RuleAction {
    Expression(ExpressionRule),
    DataType(DataTypeRule),
    Select(SelectRule),
    Query(QueryRule),
    Statement(StatementRule),
}

impl RuleAction {
    pub fn kind(&self) -> NodeKind {
        match self {
            RuleAction::Expression(_) => NodeKind::Expression,
            RuleAction::DataType(_) => NodeKind::DataType,
            RuleAction::Select(_) => NodeKind::Select,
            RuleAction::Query(_) => NodeKind::Query,
            RuleAction::Statement(_) => NodeKind::Statement,
        }
    }
}

impl fmt::Debug for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RuleAction::{:?}", self.kind())
    }
}

/// One entry of the catalog
#[derive(Debug, Clone, Copy)]
pub struct RewriteRule {
    pub name: &'static str,
    pub dialects: DialectMatch,
    /// Higher priorities are tried first
    pub priority: i32,
    /// Uppercase function name the rule is limited to (expression rules only)
    pub key: Option<&'static str>,
    pub action: RuleAction,
}

impl RewriteRule {
    pub fn expression(name: &'static str, dialects: DialectMatch, priority: i32, f: ExpressionRule) -> Self {
        Self {
            name,
            dialects,
            priority,
            key: None,
            action: RuleAction::Expression(f),
        }
    }

    /// An expression rule that only sees calls of `function`
    pub fn function(
        name: &'static str,
        dialects: DialectMatch,
        priority: i32,
        function: &'static str,
        f: ExpressionRule,
    ) -> Self {
        Self {
            name,
            dialects,
            priority,
            key: Some(function),
            action: RuleAction::Expression(f),
        }
    }

    pub fn data_type(name: &'static str, dialects: DialectMatch, priority: i32, f: DataTypeRule) -> Self {
        Self {
            name,
            dialects,
            priority,
            key: None,
            action: RuleAction::DataType(f),
        }
    }

    pub fn select(name: &'static str, dialects: DialectMatch, priority: i32, f: SelectRule) -> Self {
        Self {
            name,
            dialects,
            priority,
            key: None,
            action: RuleAction::Select(f),
        }
    }

    pub fn query(name: &'static str, dialects: DialectMatch, priority: i32, f: QueryRule) -> Self {
        Self {
            name,
            dialects,
            priority,
            key: None,
            action: RuleAction::Query(f),
        }
    }

    pub fn statement(name: &'static str, dialects: DialectMatch, priority: i32, f: StatementRule) -> Self {
        Self {
            name,
            dialects,
            priority,
            key: None,
            action: RuleAction::Statement(f),
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.action.kind()
    }

    /// Whether this rule may look at an expression with the given function name
    pub fn accepts_key(&self, key: Option<&str>) -> bool {
        match self.key {
            None => true,
            Some(wanted) => key == Some(wanted),
        }
    }

    /// Two rules compete for the same nodes in at least one migration
    fn conflicts_with(&self, other: &RewriteRule) -> bool {
        self.priority == other.priority
            && self.kind() == other.kind()
            && (self.key.is_none() || other.key.is_none() || self.key == other.key)
            && self.dialects.overlaps(&other.dialects)
    }
}

/// What a rule found that the user should know about
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub kind: DiagnosticKind,
    pub code: &'static str,
    pub message: String,
    pub hint: Option<String>,
    /// Position to report; the rewritten node's position when absent
    pub span: Option<Span>,
}

impl Finding {
    pub fn new(kind: DiagnosticKind, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
            hint: None,
            span: None,
        }
    }

    /// No target equivalent
    pub fn unmappable(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::MappingError, code, message)
    }

    pub fn precision(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::PrecisionWarning, code, message)
    }

    pub fn risk(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::SemanticRiskWarning, code, message)
    }

    pub fn info(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Info, code, message)
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn at(mut self, span: Span) -> Self {
        if span != Span::default() {
            self.span = Some(span);
        }
        self
    }
}

/// Result of offering a node to a rule
#[derive(Debug, Clone, PartialEq)]
pub enum RuleOutcome<T> {
    /// The rule does not apply
    Unchanged,
    Replaced(T),
    /// Replaced, but the user should review the listed findings
    ReplacedWithRisk(T, Vec<Finding>),
    /// The rule applies but the node has no target form; it is kept as is
    Unmappable(Finding),
}

impl<T> RuleOutcome<T> {
    /// Replacement with a single finding
    pub fn risk(node: T, finding: Finding) -> Self {
        RuleOutcome::ReplacedWithRisk(node, vec![finding])
    }

    /// Replacement with findings, or a plain replacement when there are none
    pub fn with_findings(node: T, findings: Vec<Finding>) -> Self {
        if findings.is_empty() {
            RuleOutcome::Replaced(node)
        } else {
            RuleOutcome::ReplacedWithRisk(node, findings)
        }
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, RuleOutcome::Unchanged)
    }
}

/// What a rule may read about the run it is part of
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub source: DialectType,
    pub target: DialectType,
    pub options: &'a TranspileOptions,
    /// Name of the column whose definition holds the type being rewritten
    pub column: Option<&'a str>,
}

impl<'a> RuleContext<'a> {
    pub fn new(source: DialectType, target: DialectType, options: &'a TranspileOptions) -> Self {
        Self {
            source,
            target,
            options,
            column: None,
        }
    }

    pub fn with_column(mut self, column: Option<&'a str>) -> Self {
        self.column = column;
        self
    }
}

/// Every rule the engine knows, checked for priority conflicts
#[derive(Debug, Clone)]
pub struct RuleCatalog {
    rules: Vec<RewriteRule>,
}

impl RuleCatalog {
    /// Build a catalog. Two rules with the same priority, node kind and
    /// function key that can meet in one migration are a configuration error.
    pub fn build(rules: Vec<RewriteRule>) -> Result<Self> {
        for (i, rule) in rules.iter().enumerate() {
            if let Some(other) = rules[..i].iter().find(|other| other.conflicts_with(rule)) {
                return Err(Error::config(format!(
                    "rules `{}` and `{}` share priority {} for {:?} nodes",
                    other.name,
                    rule.name,
                    rule.priority,
                    rule.kind()
                )));
            }
        }
        let mut rules = rules;
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        Ok(Self { rules })
    }

    /// Shared rules plus the source rules of every dialect
    pub fn builtin(dialects: &[Box<dyn DialectImpl>]) -> Result<Self> {
        let mut rules = shared_rules();
        for dialect in dialects {
            rules.extend(dialect.rules());
        }
        Self::build(rules)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    pub fn get(&self, name: &str) -> Option<&RewriteRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Rules for one migration, highest priority first
    pub fn select(&self, source: DialectType, target: DialectType) -> RuleSet<'_> {
        let mut set = RuleSet::default();
        for rule in self.rules.iter().filter(|r| r.dialects.matches(source, target)) {
            match rule.kind() {
                NodeKind::Expression => set.expression.push(rule),
                NodeKind::DataType => set.data_type.push(rule),
                NodeKind::Select => set.select.push(rule),
                NodeKind::Query => set.query.push(rule),
                NodeKind::Statement => set.statement.push(rule),
            }
        }
        set
    }
}

/// The rules of one migration, grouped by node kind
#[derive(Debug, Default, Clone)]
pub struct RuleSet<'c> {
    pub expression: Vec<&'c RewriteRule>,
    pub data_type: Vec<&'c RewriteRule>,
    pub select: Vec<&'c RewriteRule>,
    pub query: Vec<&'c RewriteRule>,
    pub statement: Vec<&'c RewriteRule>,
}

impl RuleSet<'_> {
    pub fn len(&self) -> usize {
        self.expression.len() + self.data_type.len() + self.select.len() + self.query.len() + self.statement.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Rules that apply to more than one source system
pub fn shared_rules() -> Vec<RewriteRule> {
    let mut rules = Vec::new();
    rules.extend(functions::rules());
    rules.extend(datetime::rules());
    rules.extend(types::rules());
    rules.extend(syntax::rules());
    rules.extend(identifiers::rules());
    rules.extend(window::rules());
    rules.extend(ddl::rules());
    rules
}

// ---------------------------------------------------------------------------
// Helpers shared by rule modules
// ---------------------------------------------------------------------------

/// The function call behind `expr`, if it is one
pub(crate) fn as_function(expr: &Expression) -> Option<&Function> {
    match expr {
        Expression::Function(f) => Some(f),
        _ => None,
    }
}

/// Same call under another name, windowed or not
pub(crate) fn renamed(expr: &Expression, name: &str) -> Option<Expression> {
    match expr {
        Expression::Function(f) => {
            let mut f = f.clone();
            f.name = name.to_string();
            Some(Expression::Function(f))
        }
        Expression::Window(w) => {
            let mut w = w.clone();
            w.function.name = name.to_string();
            Some(Expression::Window(w))
        }
        _ => None,
    }
}

/// A plain call to `name` positioned where `at` was
pub(crate) fn call_at(at: &Function, name: &str, args: Vec<Expression>) -> Expression {
    let mut function = Function::new(name, args);
    function.span = at.span;
    Expression::Function(Box::new(function))
}

/// Lowercase a date-part argument written as a name or a string (`day`, `'dd'`)
pub(crate) fn unit_text(expr: &Expression) -> Option<String> {
    match expr {
        Expression::Column(c) if c.qualifier.is_empty() => Some(c.name.name.to_uppercase()),
        Expression::Literal(crate::expressions::Literal::String(s)) => Some(s.to_uppercase()),
        _ => None,
    }
}

/// `expr IS NOT NULL`
pub(crate) fn is_not_null(expr: Expression) -> Expression {
    Expression::IsNull(Box::new(crate::expressions::IsNull { expr, negated: true }))
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::TranspileOptions;
    use crate::dialects::DialectType;
    use crate::transpiler::{Engine, TranspileRequest, TranspileResult};
    use once_cell::sync::Lazy;

    static ENGINE: Lazy<Engine> = Lazy::new(|| Engine::builtin().unwrap());

    pub fn convert_with(source: DialectType, sql: &str, options: TranspileOptions) -> TranspileResult {
        ENGINE
            .transpile(&TranspileRequest::new(sql, source).with_options(options))
            .unwrap()
    }

    /// Translate to Databricks with default options
    pub fn convert(source: DialectType, sql: &str) -> TranspileResult {
        convert_with(source, sql, TranspileOptions::default())
    }

    pub fn sql(source: DialectType, sql: &str) -> String {
        convert(source, sql).sql
    }

    /// Diagnostic codes in report order
    pub fn codes(result: &TranspileResult) -> Vec<String> {
        result.report.entries.iter().map(|d| d.code.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialects::builtin_dialects;

    fn noop(_: &Expression, _: &RuleContext<'_>) -> RuleOutcome<Expression> {
        RuleOutcome::Unchanged
    }

    #[test]
    fn test_builtin_catalog_has_no_conflicts() {
        let catalog = RuleCatalog::builtin(&builtin_dialects()).unwrap();
        assert!(catalog.len() > 50);
        let priorities: Vec<i32> = catalog.rules().iter().map(|r| r.priority).collect();
        assert!(priorities.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_equal_priority_overlap_is_a_config_error() {
        let rules = vec![
            RewriteRule::expression("a", DialectMatch::Foreign, 10, noop),
            RewriteRule::expression("b", DialectMatch::Source(DialectType::Oracle), 10, noop),
        ];
        let err = RuleCatalog::build(rules).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("`a` and `b`"));
    }

    #[test]
    fn test_disjoint_scopes_may_share_priority() {
        let rules = vec![
            RewriteRule::expression("a", DialectMatch::Source(DialectType::MySQL), 10, noop),
            RewriteRule::expression("b", DialectMatch::Source(DialectType::Oracle), 10, noop),
            RewriteRule::function("c", DialectMatch::Foreign, 10, "NVL", noop),
            RewriteRule::function("d", DialectMatch::Foreign, 10, "IFF", noop),
        ];
        assert!(RuleCatalog::build(rules).is_err());
        let rules = vec![
            RewriteRule::function("c", DialectMatch::Foreign, 10, "NVL", noop),
            RewriteRule::function("d", DialectMatch::Foreign, 10, "IFF", noop),
            RewriteRule::expression("a", DialectMatch::Source(DialectType::MySQL), 11, noop),
        ];
        assert!(RuleCatalog::build(rules).is_ok());
    }

    #[test]
    fn test_same_dialect_runs_only_see_any_rules() {
        let rules = vec![
            RewriteRule::expression("foreign", DialectMatch::Foreign, 2, noop),
            RewriteRule::expression("any", DialectMatch::Any, 1, noop),
        ];
        let catalog = RuleCatalog::build(rules).unwrap();
        let same = catalog.select(DialectType::Oracle, DialectType::Oracle);
        assert_eq!(same.expression.len(), 1);
        assert_eq!(same.expression[0].name, "any");
        let cross = catalog.select(DialectType::Oracle, DialectType::Databricks);
        assert_eq!(cross.expression.len(), 2);
        assert_eq!(cross.expression[0].name, "foreign");
    }
}
