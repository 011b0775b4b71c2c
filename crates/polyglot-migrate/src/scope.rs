//! Scope analysis
//!
//! A [`SymbolTable`] is built per statement as a stack of [`Frame`]s, one per
//! query scope (outer query, CTE body, derived table, subquery). Frames map
//! CTE names to their projected columns, FROM sources to what is known about
//! their columns, and select-list aliases to their expressions.
//!
//! CTE references are resolved by name, innermost frame first.

use crate::expressions::{Expression, Identifier, Query, QueryBody, Select, Statement, TableFactor, TableRef};
use crate::tokens::Span;
use crate::traversal::{self, VisitorMut};
use std::collections::HashMap;

/// Kind of query scope a frame belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeType {
    Root,
    Cte,
    DerivedTable,
    Subquery,
}

/// A relation visible in a SELECT
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    /// Name other clauses use for it: the alias, else the table name
    pub name: String,
    /// Output columns when known (CTEs and derived tables with simple projections)
    pub columns: Option<Vec<String>>,
    pub is_cte: bool,
}

/// One query scope
#[derive(Debug, Clone)]
pub struct Frame {
    pub scope_type: ScopeType,
    ctes: HashMap<String, Option<Vec<String>>>,
    pub sources: Vec<Source>,
    aliases: HashMap<String, Expression>,
}

impl Frame {
    fn new(scope_type: ScopeType) -> Self {
        Self {
            scope_type,
            ctes: HashMap::new(),
            sources: Vec::new(),
            aliases: HashMap::new(),
        }
    }
}

/// Per-statement symbol table
#[derive(Debug, Clone)]
pub struct SymbolTable {
    frames: Vec<Frame>,
    case_sensitive: bool,
}

impl SymbolTable {
    pub fn new(case_sensitive: bool) -> Self {
        Self {
            frames: vec![Frame::new(ScopeType::Root)],
            case_sensitive,
        }
    }

    fn key(&self, identifier: &Identifier) -> String {
        identifier.key(self.case_sensitive)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn push(&mut self, scope_type: ScopeType) {
        self.frames.push(Frame::new(scope_type));
    }

    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    fn current_mut(&mut self) -> &mut Frame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    pub fn current(&self) -> &Frame {
        &self.frames[self.frames.len() - 1]
    }

    /// Register the CTEs of `query` in the current frame.
    ///
    /// Every name is registered before any projection is computed, so a
    /// recursive CTE and later CTEs can refer to earlier ones.
    pub fn define_ctes(&mut self, query: &Query) {
        let Some(with) = &query.with else {
            return;
        };
        for cte in &with.ctes {
            let key = self.key(&cte.alias);
            self.current_mut().ctes.insert(key, None);
        }
        for cte in &with.ctes {
            let columns = if cte.columns.is_empty() {
                projection_names(&cte.query, self)
            } else {
                Some(cte.columns.iter().map(|c| self.key(c)).collect())
            };
            let key = self.key(&cte.alias);
            self.current_mut().ctes.insert(key, columns);
        }
    }

    /// Whether an unqualified table name refers to a CTE in scope
    pub fn is_cte(&self, table: &TableRef) -> bool {
        if table.schema.is_some() || table.catalog.is_some() {
            return false;
        }
        let key = self.key(&table.name);
        self.frames.iter().rev().any(|f| f.ctes.contains_key(&key))
    }

    pub fn cte_columns(&self, name: &Identifier) -> Option<&[String]> {
        let key = self.key(name);
        self.frames
            .iter()
            .rev()
            .find_map(|f| f.ctes.get(&key))
            .and_then(|columns| columns.as_deref())
    }

    /// Record the FROM sources and select-list aliases of `select` in the current frame
    pub fn define_select(&mut self, select: &Select) {
        let mut sources = Vec::new();
        if let Some(from) = &select.from {
            let factors = from
                .relations
                .iter()
                .chain(from.joins.iter().map(|j| &j.relation));
            for factor in factors {
                if let Some(source) = self.source_of(factor) {
                    sources.push(source);
                }
            }
        }
        let mut aliases = HashMap::new();
        for item in &select.projection {
            if let Expression::Alias(alias) = item {
                aliases.insert(self.key(&alias.alias), alias.expr.clone());
            }
        }
        let frame = self.current_mut();
        frame.sources = sources;
        frame.aliases = aliases;
    }

    fn source_of(&self, factor: &TableFactor) -> Option<Source> {
        match factor {
            TableFactor::Table(table) => {
                let is_cte = self.is_cte(table);
                let columns = if is_cte {
                    self.cte_columns(&table.name).map(|c| c.to_vec())
                } else {
                    None
                };
                Some(Source {
                    name: self.key(table.reference_name()),
                    columns,
                    is_cte,
                })
            }
            TableFactor::Derived { subquery, alias, .. } => {
                let alias = alias.as_ref()?;
                let columns = if alias.columns.is_empty() {
                    projection_names(subquery, self)
                } else {
                    Some(alias.columns.iter().map(|c| self.key(c)).collect())
                };
                Some(Source {
                    name: self.key(&alias.name),
                    columns,
                    is_cte: false,
                })
            }
            TableFactor::Function { alias, .. } => alias.as_ref().map(|alias| Source {
                name: self.key(&alias.name),
                columns: (!alias.columns.is_empty())
                    .then(|| alias.columns.iter().map(|c| self.key(c)).collect()),
                is_cte: false,
            }),
            TableFactor::Extended { base, .. } => self.source_of(base),
        }
    }

    /// Expression behind a select-list alias of the current frame
    pub fn resolve_alias(&self, name: &Identifier) -> Option<&Expression> {
        self.current().aliases.get(&self.key(name))
    }

    /// Sources of the current frame whose known columns include `name`
    pub fn sources_with_column(&self, name: &Identifier) -> Vec<&Source> {
        let key = self.key(name);
        self.current()
            .sources
            .iter()
            .filter(|s| s.columns.as_ref().is_some_and(|c| c.contains(&key)))
            .collect()
    }

    /// Columns `*` stands for in `select`, when every source is known
    pub fn expand_star(&self, qualifier: Option<&Identifier>) -> Option<Vec<String>> {
        let wanted = qualifier.map(|q| self.key(q));
        let mut out = Vec::new();
        for source in &self.current().sources {
            if wanted.as_ref().is_some_and(|w| *w != source.name) {
                continue;
            }
            out.extend(source.columns.clone()?);
        }
        Some(out)
    }
}

/// Output column names of `query`, when they can be determined
pub fn projection_names(query: &Query, table: &SymbolTable) -> Option<Vec<String>> {
    let select = match &query.body {
        QueryBody::Select(select) => select,
        QueryBody::SetOperation(set) => {
            let left = Query::from_body(set.left.clone(), Span::default());
            return projection_names(&left, table);
        }
        QueryBody::Nested(inner) => return projection_names(inner, table),
        QueryBody::Values(_) => return None,
    };
    let mut scoped = table.clone();
    scoped.push(ScopeType::Subquery);
    scoped.define_ctes(query);
    scoped.define_select(select);

    let mut names = Vec::new();
    for item in &select.projection {
        match item {
            Expression::Alias(alias) => names.push(scoped.key(&alias.alias)),
            Expression::Column(column) => names.push(scoped.key(&column.name)),
            Expression::Star(star) => {
                let mut columns = scoped.expand_star(star.qualifier.last())?;
                let except: Vec<String> = star.except.iter().map(|e| scoped.key(e)).collect();
                columns.retain(|c| !except.contains(c));
                names.extend(columns);
            }
            _ => return None,
        }
    }
    Some(names)
}

/// An unqualified column that more than one known source provides
#[derive(Debug, Clone, PartialEq)]
pub struct AmbiguousColumn {
    pub name: String,
    pub sources: Vec<String>,
    pub span: Span,
}

/// Walks a statement with a symbol table, maintaining frames for every query
struct ScopeWalker<'a, F: FnMut(&mut SymbolTable, ScopeEvent<'_>)> {
    table: SymbolTable,
    /// Scope type of the next query entered
    pending: Option<ScopeType>,
    callback: &'a mut F,
}

/// What the scope walker reports to its callback
pub enum ScopeEvent<'e> {
    Table(&'e mut TableRef),
    Select(&'e mut Select),
}

impl<F: FnMut(&mut SymbolTable, ScopeEvent<'_>)> VisitorMut for ScopeWalker<'_, F> {
    fn visit_query(&mut self, query: &mut Query) {
        let scope_type = match self.pending.take() {
            Some(scope_type) => scope_type,
            None if self.table.depth() == 1 => ScopeType::Root,
            None => ScopeType::Subquery,
        };
        self.table.push(scope_type);
        self.table.define_ctes(query);
        let mut with = query.with.take();
        if let Some(with) = &mut with {
            for cte in &mut with.ctes {
                self.pending = Some(ScopeType::Cte);
                self.visit_query(&mut cte.query);
            }
        }
        traversal::walk_query(self, query);
        query.with = with;
        self.table.pop();
    }

    fn visit_table_factor(&mut self, factor: &mut TableFactor) {
        if matches!(factor, TableFactor::Derived { .. }) {
            self.pending = Some(ScopeType::DerivedTable);
        }
        traversal::walk_table_factor(self, factor);
    }

    fn visit_select(&mut self, select: &mut Select) {
        let scope_type = self.table.current().scope_type;
        self.table.push(scope_type);
        self.table.define_select(select);
        traversal::walk_select(self, select);
        (self.callback)(&mut self.table, ScopeEvent::Select(select));
        self.table.pop();
    }

    fn visit_table_ref(&mut self, table: &mut TableRef) {
        (self.callback)(&mut self.table, ScopeEvent::Table(table));
    }
}

/// Walk `statement`, reporting every table reference and every SELECT with
/// the symbol table that is in effect there
pub fn walk_scopes<F>(statement: &mut Statement, case_sensitive: bool, mut callback: F)
where
    F: FnMut(&mut SymbolTable, ScopeEvent<'_>),
{
    let mut walker = ScopeWalker {
        table: SymbolTable::new(case_sensitive),
        pending: None,
        callback: &mut callback,
    };
    walker.visit_statement(statement);
}

/// Qualify table references that are not CTEs with a default catalog and
/// schema. Returns the number of references changed.
pub fn qualify_tables(
    statement: &mut Statement,
    catalog: Option<&str>,
    schema: Option<&str>,
    case_sensitive: bool,
) -> usize {
    if catalog.is_none() && schema.is_none() {
        return 0;
    }
    let mut changed = 0;
    walk_scopes(statement, case_sensitive, |table, event| {
        let ScopeEvent::Table(table_ref) = event else {
            return;
        };
        if table.is_cte(table_ref) {
            return;
        }
        let mut touched = false;
        if table_ref.schema.is_none() {
            if let Some(schema) = schema {
                table_ref.schema = Some(Identifier::new(schema));
                touched = true;
            }
        }
        if table_ref.catalog.is_none() && table_ref.schema.is_some() {
            if let Some(catalog) = catalog {
                table_ref.catalog = Some(Identifier::new(catalog));
                touched = true;
            }
        }
        if touched {
            changed += 1;
        }
    });
    changed
}

/// Unqualified columns that two or more sources with known columns provide
pub fn ambiguous_columns(statement: &mut Statement, case_sensitive: bool) -> Vec<AmbiguousColumn> {
    let mut found = Vec::new();
    walk_scopes(statement, case_sensitive, |table, event| {
        let ScopeEvent::Select(select) = event else {
            return;
        };
        if table.current().sources.len() < 2 {
            return;
        }
        let mut exprs: Vec<&Expression> = select.projection.iter().collect();
        exprs.extend(select.where_clause.iter().map(|w| &w.condition));
        for expr in exprs {
            for column in crate::traversal::ExpressionWalk::find_all(expr, traversal::is_column) {
                let Expression::Column(column) = column else {
                    continue;
                };
                if !column.qualifier.is_empty() || table.resolve_alias(&column.name).is_some() {
                    continue;
                }
                let sources = table.sources_with_column(&column.name);
                if sources.len() > 1 {
                    let entry = AmbiguousColumn {
                        name: column.name.name.clone(),
                        sources: sources.iter().map(|s| s.name.clone()).collect(),
                        span: column.span,
                    };
                    if !found.iter().any(|f: &AmbiguousColumn| f.name == entry.name && f.span == entry.span) {
                        found.push(entry);
                    }
                }
            }
        }
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialects::{DialectRegistry, DialectType};
    use crate::generator::FormatOptions;

    fn parse(sql: &str) -> Statement {
        let registry = DialectRegistry::builtin().unwrap();
        registry.get(DialectType::Snowflake).unwrap().parse_one(sql).unwrap()
    }

    fn render(statement: &Statement) -> String {
        let registry = DialectRegistry::builtin().unwrap();
        registry
            .get(DialectType::Databricks)
            .unwrap()
            .generate(statement, &FormatOptions::default())
            .unwrap()
    }

    #[test]
    fn test_qualification_skips_ctes() {
        let mut statement = parse("WITH recent AS (SELECT * FROM orders) SELECT * FROM recent JOIN customers c ON c.id = recent.cid");
        let changed = qualify_tables(&mut statement, Some("main"), Some("sales"), false);
        assert_eq!(changed, 2);
        assert_eq!(
            render(&statement),
            "WITH recent AS (SELECT * FROM main.sales.orders) SELECT * FROM recent JOIN main.sales.customers AS c ON c.id = recent.cid"
        );
    }

    #[test]
    fn test_qualification_keeps_existing_schema() {
        let mut statement = parse("SELECT * FROM hr.people");
        qualify_tables(&mut statement, Some("main"), Some("sales"), false);
        assert_eq!(render(&statement), "SELECT * FROM main.hr.people");
    }

    #[test]
    fn test_cte_names_are_visible_in_nested_queries() {
        let mut statement =
            parse("WITH a AS (SELECT 1 AS x) SELECT * FROM t WHERE t.x IN (SELECT x FROM a)");
        assert_eq!(qualify_tables(&mut statement, None, Some("s"), false), 1);
        assert_eq!(
            render(&statement),
            "WITH a AS (SELECT 1 AS x) SELECT * FROM s.t WHERE t.x IN (SELECT x FROM a)"
        );
    }

    #[test]
    fn test_projection_names_expand_star_over_ctes() {
        let statement = parse("WITH a AS (SELECT id, name FROM t), b AS (SELECT * FROM a) SELECT 1");
        let Statement::Query(query) = &statement else {
            panic!("not a query");
        };
        let mut table = SymbolTable::new(false);
        table.define_ctes(query);
        assert_eq!(
            table.cte_columns(&Identifier::new("B")),
            Some(&["id".to_string(), "name".to_string()][..])
        );
    }

    #[test]
    fn test_ambiguous_columns_across_ctes() {
        let mut statement = parse(
            "WITH a AS (SELECT id, v FROM t), b AS (SELECT id, w FROM u) SELECT id, v, w FROM a, b",
        );
        let found = ambiguous_columns(&mut statement, false);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "id");
        assert_eq!(found[0].sources, vec!["a".to_string(), "b".to_string()]);
    }
}
