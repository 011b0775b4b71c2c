//! SQL Generator
//!
//! Renders an AST as SQL text in one dialect. The generator never changes the
//! meaning of the tree it is given: dialect differences are the job of the
//! rewrite rules, and the generator only decides *spelling*: keyword case,
//! identifier quoting, type names, parentheses and layout.
//!
//! Parentheses are derived from the target grammar's precedence table, so a
//! rewritten tree whose nodes came from different places still prints with
//! the grouping the tree encodes.

use crate::dialects::{Dialect, DialectType};
use crate::error::{Error, Result};
use crate::expressions::*;
use crate::grammar::prec;
use serde::{Deserialize, Serialize};

/// How keywords are cased in the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordCase {
    #[default]
    Upper,
    Lower,
}

/// When identifiers are quoted in the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierQuoting {
    /// Quote identifiers that were quoted in the source, plus any that need it
    #[default]
    Preserve,
    /// Quote only identifiers that would not survive unquoted
    Minimal,
    Always,
}

/// Output formatting options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatOptions {
    pub keyword_case: KeywordCase,
    pub identifier_quoting: IdentifierQuoting,
    /// One clause per line with indented nesting
    pub pretty: bool,
    /// Spaces per indentation level in pretty mode
    pub indent: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            keyword_case: KeywordCase::Upper,
            identifier_quoting: IdentifierQuoting::Preserve,
            pretty: false,
            indent: 2,
        }
    }
}

impl FormatOptions {
    pub fn pretty() -> Self {
        Self {
            pretty: true,
            ..Self::default()
        }
    }
}

/// How array constructors are spelled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayLiteralStyle {
    /// `ARRAY(1, 2)`
    Function,
    /// `[1, 2]`
    Bracket,
    /// `ARRAY[1, 2]`
    ArrayBracket,
}

/// Spelling conventions of one dialect
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub dialect: DialectType,
    /// Opening and closing identifier quote
    pub identifier_quote: (char, char),
    /// Backslash is an escape character inside string literals
    pub backslash_escapes: bool,
    /// `||` is string concatenation; otherwise `CONCAT(a, b)` is written
    pub concat_operator: bool,
    /// Keyword for `SELECT * EXCEPT (...)`
    pub star_except_keyword: &'static str,
    /// Write `AS` before table aliases
    pub table_alias_as: bool,
    pub array_literal: ArrayLiteralStyle,
    /// Write a bare `UNION` as `UNION DISTINCT`
    pub union_distinct: bool,
    /// `N'...'` literals exist
    pub national_strings: bool,
    /// `PARTITIONED BY (...)` rather than `PARTITION BY ...`
    pub partitioned_by: bool,
    /// Properties are written as `TBLPROPERTIES ('k' = 'v')`
    pub tblproperties: bool,
}

impl GeneratorConfig {
    pub fn new(dialect: DialectType) -> Self {
        Self {
            dialect,
            identifier_quote: ('"', '"'),
            backslash_escapes: false,
            concat_operator: true,
            star_except_keyword: "EXCEPT",
            table_alias_as: true,
            array_literal: ArrayLiteralStyle::Function,
            union_distinct: false,
            national_strings: true,
            partitioned_by: false,
            tblproperties: false,
        }
    }
}

/// Binding level of an expression as written; atoms bind tightest
fn expression_level(dialect: &Dialect, expr: &Expression) -> u8 {
    match expr {
        Expression::Binary(b) => dialect.grammar().precedence.level(b.op),
        Expression::Unary(u) if u.op == UnaryOperator::Not => prec::NOT,
        Expression::Unary(_) => prec::UNARY,
        Expression::In(_) | Expression::Between(_) | Expression::Like(_) | Expression::IsNull(_) => {
            prec::COMPARISON
        }
        Expression::Cast(c) if c.kind == CastKind::DoubleColon && dialect.grammar().double_colon_cast => {
            prec::CAST
        }
        Expression::Subscript(_) | Expression::JsonAccess(_) => prec::CAST,
        Expression::Alias(_) | Expression::NamedArgument(_) => 0,
        _ => u8::MAX,
    }
}

/// SQL generator for one dialect
pub struct Generator<'a> {
    dialect: &'a Dialect,
    config: &'a GeneratorConfig,
    options: FormatOptions,
    level: usize,
}

impl<'a> Generator<'a> {
    pub fn new(dialect: &'a Dialect, options: FormatOptions) -> Self {
        Self {
            dialect,
            config: dialect.generator_config(),
            options,
            level: 0,
        }
    }

    /// Render one statement, without a trailing terminator
    pub fn generate(&mut self, statement: &Statement) -> Result<String> {
        self.level = 0;
        self.statement_sql(statement)
    }

    pub fn generate_expression(&mut self, expr: &Expression) -> Result<String> {
        self.expr_sql(expr)
    }

    pub fn generate_data_type(&mut self, data_type: &DataType) -> Result<String> {
        self.data_type_sql(data_type)
    }

    // -- layout -------------------------------------------------------------

    fn kw(&self, keyword: &str) -> String {
        match self.options.keyword_case {
            KeywordCase::Upper => keyword.to_string(),
            KeywordCase::Lower => keyword.to_lowercase(),
        }
    }

    fn indent(&self, level: usize) -> String {
        " ".repeat(level * self.options.indent)
    }

    /// Separator between clauses
    fn sep(&self) -> String {
        if self.options.pretty {
            format!("\n{}", self.indent(self.level))
        } else {
            " ".to_string()
        }
    }

    /// A parenthesized query, indented one level deeper in pretty mode
    fn nested_query(&mut self, query: &Query) -> Result<String> {
        if !self.options.pretty {
            return Ok(format!("({})", self.query_sql(query)?));
        }
        self.level += 1;
        let inner = self.query_sql(query);
        self.level -= 1;
        Ok(format!(
            "(\n{}{}\n{})",
            self.indent(self.level + 1),
            inner?,
            self.indent(self.level)
        ))
    }

    // -- names --------------------------------------------------------------

    fn needs_quoting(&self, name: &str) -> bool {
        let mut chars = name.chars();
        let Some(first) = chars.next() else {
            return true;
        };
        let prefixes = &self.dialect.tokenizer().config().variable_prefixes;
        if !(first.is_alphabetic() || first == '_' || prefixes.contains(&first)) {
            return true;
        }
        if !chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$' || c == '#' || c == '@') {
            return true;
        }
        self.dialect
            .tokenizer()
            .config()
            .keywords
            .get(&name.to_uppercase())
            .is_some_and(|t| t.is_reserved())
    }

    fn quote(&self, name: &str) -> String {
        let (open, close) = self.config.identifier_quote;
        let escaped = name.replace(close, &format!("{close}{close}"));
        format!("{open}{escaped}{close}")
    }

    fn ident(&self, identifier: &Identifier) -> String {
        let quote = match self.options.identifier_quoting {
            IdentifierQuoting::Always => true,
            IdentifierQuoting::Preserve => identifier.quoted || self.needs_quoting(&identifier.name),
            IdentifierQuoting::Minimal => self.needs_quoting(&identifier.name),
        };
        if quote {
            self.quote(&identifier.name)
        } else {
            identifier.name.clone()
        }
    }

    fn ident_list(&self, identifiers: &[Identifier]) -> String {
        identifiers
            .iter()
            .map(|i| self.ident(i))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn table_name(&self, table: &TableRef) -> String {
        let mut parts = Vec::new();
        for part in [&table.catalog, &table.schema].into_iter().flatten() {
            // SQL Server `db..table` keeps an empty schema
            if part.name.is_empty() {
                parts.push(String::new());
            } else {
                parts.push(self.ident(part));
            }
        }
        parts.push(self.ident(&table.name));
        parts.join(".")
    }

    fn table_alias(&self, alias: &TableAlias, with_as: bool) -> String {
        let mut sql = String::new();
        if with_as {
            sql.push_str(&self.kw("AS"));
            sql.push(' ');
        }
        sql.push_str(&self.ident(&alias.name));
        if !alias.columns.is_empty() {
            sql.push_str(&format!(" ({})", self.ident_list(&alias.columns)));
        }
        sql
    }

    fn string_literal(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len() + 2);
        out.push('\'');
        for c in value.chars() {
            match c {
                '\'' if self.config.backslash_escapes => out.push_str("\\'"),
                '\'' => out.push_str("''"),
                '\\' if self.config.backslash_escapes => out.push_str("\\\\"),
                c => out.push(c),
            }
        }
        out.push('\'');
        out
    }

    // -- statements ---------------------------------------------------------

    fn statement_sql(&mut self, statement: &Statement) -> Result<String> {
        match statement {
            Statement::Query(query) => self.query_sql(query),
            Statement::Insert(insert) => self.insert_sql(insert),
            Statement::Update(update) => self.update_sql(update),
            Statement::Delete(delete) => self.delete_sql(delete),
            Statement::Merge(merge) => self.merge_sql(merge),
            Statement::CreateTable(create) => self.create_table_sql(create),
            Statement::CreateView(view) => self.create_view_sql(view),
            Statement::Drop(drop) => self.drop_sql(drop),
            Statement::Truncate(truncate) => Ok(format!(
                "{} {}",
                self.kw("TRUNCATE TABLE"),
                self.table_name(&truncate.table)
            )),
            Statement::Use(use_stmt) => {
                let mut sql = self.kw("USE");
                if let Some(kind) = &use_stmt.kind {
                    sql.push(' ');
                    sql.push_str(&self.kw(kind));
                }
                let name: Vec<String> = use_stmt.name.iter().map(|i| self.ident(i)).collect();
                sql.push(' ');
                sql.push_str(&name.join("."));
                Ok(sql)
            }
            Statement::Extension(extension) => match &extension.body {
                Some(body) => {
                    let body = self.statement_sql(body)?;
                    Ok(format!("{}{}{}", extension.raw, self.sep(), body))
                }
                None => Ok(extension.raw.clone()),
            },
        }
    }

    pub(crate) fn query_sql(&mut self, query: &Query) -> Result<String> {
        let mut parts = Vec::new();
        if let Some(with) = &query.with {
            parts.push(self.with_sql(with)?);
        }
        parts.push(self.body_sql(&query.body)?);
        if let Some(order_by) = &query.order_by {
            parts.push(format!(
                "{} {}",
                self.kw("ORDER BY"),
                self.ordered_list(&order_by.expressions)?
            ));
        }
        if let Some(limit) = &query.limit {
            parts.push(format!("{} {}", self.kw("LIMIT"), self.expr_sql(&limit.count)?));
        }
        if let Some(offset) = &query.offset {
            let mut sql = format!("{} {}", self.kw("OFFSET"), self.expr_sql(&offset.count)?);
            if offset.rows {
                sql.push(' ');
                sql.push_str(&self.kw("ROWS"));
            }
            parts.push(sql);
        }
        if let Some(fetch) = &query.fetch {
            let mut sql = self.kw("FETCH FIRST");
            if let Some(count) = &fetch.count {
                sql.push(' ');
                sql.push_str(&self.expr_sql(count)?);
            }
            if fetch.percent {
                sql.push(' ');
                sql.push_str(&self.kw("PERCENT"));
            }
            sql.push(' ');
            sql.push_str(&self.kw(if fetch.with_ties { "ROWS WITH TIES" } else { "ROWS ONLY" }));
            parts.push(sql);
        }
        for extension in &query.trailing {
            parts.push(extension.raw.clone());
        }
        Ok(parts.join(&self.sep()))
    }

    fn with_sql(&mut self, with: &With) -> Result<String> {
        let mut ctes = Vec::new();
        for cte in &with.ctes {
            let mut sql = self.ident(&cte.alias);
            if !cte.columns.is_empty() {
                sql.push_str(&format!(" ({})", self.ident_list(&cte.columns)));
            }
            sql.push(' ');
            sql.push_str(&self.kw("AS"));
            sql.push(' ');
            sql.push_str(&self.nested_query(&cte.query)?);
            ctes.push(sql);
        }
        let keyword = if with.recursive { "WITH RECURSIVE" } else { "WITH" };
        let separator = if self.options.pretty {
            format!(",{}", self.sep())
        } else {
            ", ".to_string()
        };
        Ok(format!("{} {}", self.kw(keyword), ctes.join(&separator)))
    }

    fn body_sql(&mut self, body: &QueryBody) -> Result<String> {
        match body {
            QueryBody::Select(select) => self.select_sql(select),
            QueryBody::SetOperation(set) => {
                let left = self.body_sql(&set.left)?;
                let right = match &set.right {
                    QueryBody::SetOperation(_) => {
                        let query = Query::from_body(set.right.clone(), Default::default());
                        self.nested_query(&query)?
                    }
                    other => self.body_sql(other)?,
                };
                let mut op = set.op.keyword().to_string();
                if set.all {
                    op.push_str(" ALL");
                } else if self.config.union_distinct {
                    op.push_str(" DISTINCT");
                }
                let sep = self.sep();
                Ok(format!("{left}{sep}{}{sep}{right}", self.kw(&op)))
            }
            QueryBody::Values(values) => {
                let mut rows = Vec::new();
                for row in &values.rows {
                    rows.push(format!("({})", self.expr_list(row)?));
                }
                Ok(format!("{} {}", self.kw("VALUES"), rows.join(", ")))
            }
            QueryBody::Nested(query) => self.nested_query(query),
        }
    }

    fn select_sql(&mut self, select: &Select) -> Result<String> {
        let mut head = self.kw("SELECT");
        if select.distinct {
            head.push(' ');
            head.push_str(&self.kw("DISTINCT"));
        }
        if let Some(top) = &select.top {
            head.push(' ');
            head.push_str(&self.kw("TOP"));
            head.push(' ');
            let count = self.expr_sql(&top.count)?;
            if expression_level(self.dialect, &top.count) == u8::MAX {
                head.push_str(&count);
            } else {
                head.push_str(&format!("({count})"));
            }
            if top.percent {
                head.push(' ');
                head.push_str(&self.kw("PERCENT"));
            }
            if top.with_ties {
                head.push(' ');
                head.push_str(&self.kw("WITH TIES"));
            }
        }

        let mut items = Vec::new();
        for item in &select.projection {
            items.push(self.expr_sql(item)?);
        }
        if self.options.pretty && items.len() > 1 {
            let inner = format!("\n{}", self.indent(self.level + 1));
            head.push_str(&inner);
            head.push_str(&items.join(&format!(",{inner}")));
        } else {
            head.push(' ');
            head.push_str(&items.join(", "));
        }

        let mut parts = vec![head];
        if let Some(into) = &select.into {
            parts.push(format!("{} {}", self.kw("INTO"), self.table_name(into)));
        }
        if let Some(from) = &select.from {
            parts.push(format!("{} {}", self.kw("FROM"), self.from_sql(from)?));
        }
        if let Some(where_clause) = &select.where_clause {
            parts.push(format!(
                "{} {}",
                self.kw("WHERE"),
                self.expr_sql(&where_clause.condition)?
            ));
        }
        for extension in &select.extensions {
            parts.push(extension.raw.clone());
        }
        if let Some(group_by) = &select.group_by {
            let mut sql = format!("{} {}", self.kw("GROUP BY"), self.expr_list(&group_by.expressions)?);
            if group_by.with_rollup {
                sql.push(' ');
                sql.push_str(&self.kw("WITH ROLLUP"));
            }
            parts.push(sql);
        }
        if let Some(having) = &select.having {
            parts.push(format!("{} {}", self.kw("HAVING"), self.expr_sql(&having.condition)?));
        }
        if let Some(qualify) = &select.qualify {
            parts.push(format!("{} {}", self.kw("QUALIFY"), self.expr_sql(&qualify.condition)?));
        }
        if !select.named_windows.is_empty() {
            let mut windows = Vec::new();
            for window in &select.named_windows {
                windows.push(format!(
                    "{} {} ({})",
                    self.ident(&window.name),
                    self.kw("AS"),
                    self.window_spec_sql(&window.spec)?
                ));
            }
            parts.push(format!("{} {}", self.kw("WINDOW"), windows.join(", ")));
        }
        Ok(parts.join(&self.sep()))
    }

    fn from_sql(&mut self, from: &From) -> Result<String> {
        let mut relations = Vec::new();
        for relation in &from.relations {
            relations.push(self.table_factor_sql(relation)?);
        }
        let mut sql = relations.join(", ");
        for join in &from.joins {
            sql.push_str(&self.sep());
            sql.push_str(&self.join_sql(join)?);
        }
        Ok(sql)
    }

    fn join_sql(&mut self, join: &Join) -> Result<String> {
        let mut sql = String::new();
        if join.constraint == JoinConstraint::Natural {
            sql.push_str(&self.kw("NATURAL"));
            sql.push(' ');
        }
        sql.push_str(&self.kw(join.kind.keyword()));
        sql.push(' ');
        sql.push_str(&self.table_factor_sql(&join.relation)?);
        match &join.constraint {
            JoinConstraint::On(condition) => {
                sql.push(' ');
                sql.push_str(&self.kw("ON"));
                sql.push(' ');
                sql.push_str(&self.expr_sql(condition)?);
            }
            JoinConstraint::Using(columns) => {
                sql.push(' ');
                sql.push_str(&self.kw("USING"));
                sql.push_str(&format!(" ({})", self.ident_list(columns)));
            }
            JoinConstraint::Natural | JoinConstraint::None => {}
        }
        Ok(sql)
    }

    fn table_factor_sql(&mut self, factor: &TableFactor) -> Result<String> {
        match factor {
            TableFactor::Table(table) => Ok(self.table_ref_sql(table)),
            TableFactor::Derived {
                lateral,
                subquery,
                alias,
            } => {
                let mut sql = String::new();
                if *lateral {
                    sql.push_str(&self.kw("LATERAL"));
                    sql.push(' ');
                }
                sql.push_str(&self.nested_query(subquery)?);
                if let Some(alias) = alias {
                    sql.push(' ');
                    sql.push_str(&self.table_alias(alias, self.config.table_alias_as));
                }
                Ok(sql)
            }
            TableFactor::Function {
                lateral,
                function,
                alias,
            } => {
                let mut sql = String::new();
                if *lateral {
                    sql.push_str(&self.kw("LATERAL"));
                    sql.push(' ');
                }
                sql.push_str(&self.function_sql(function)?);
                if let Some(alias) = alias {
                    sql.push(' ');
                    sql.push_str(&self.table_alias(alias, self.config.table_alias_as));
                }
                Ok(sql)
            }
            TableFactor::Extended { base, extension } => {
                Ok(format!("{} {}", self.table_factor_sql(base)?, extension.raw))
            }
        }
    }

    fn table_ref_sql(&self, table: &TableRef) -> String {
        let mut sql = self.table_name(table);
        if let Some(alias) = &table.alias {
            sql.push(' ');
            sql.push_str(&self.table_alias(alias, self.config.table_alias_as));
        }
        for hint in &table.hints {
            sql.push(' ');
            sql.push_str(&self.kw("WITH"));
            sql.push_str(&format!(" ({hint})"));
        }
        sql
    }

    fn ordered_list(&mut self, items: &[Ordered]) -> Result<String> {
        let mut out = Vec::new();
        for item in items {
            let mut sql = self.expr_sql(&item.expr)?;
            match item.desc {
                Some(true) => sql.push_str(&format!(" {}", self.kw("DESC"))),
                Some(false) => sql.push_str(&format!(" {}", self.kw("ASC"))),
                None => {}
            }
            match item.nulls_first {
                Some(true) => sql.push_str(&format!(" {}", self.kw("NULLS FIRST"))),
                Some(false) => sql.push_str(&format!(" {}", self.kw("NULLS LAST"))),
                None => {}
            }
            out.push(sql);
        }
        Ok(out.join(", "))
    }

    fn insert_sql(&mut self, insert: &Insert) -> Result<String> {
        let mut sql = if insert.overwrite {
            if self.config.dialect == DialectType::Hive {
                self.kw("INSERT OVERWRITE TABLE")
            } else {
                self.kw("INSERT OVERWRITE")
            }
        } else {
            self.kw("INSERT INTO")
        };
        sql.push(' ');
        sql.push_str(&self.table_name(&insert.table));
        if !insert.columns.is_empty() {
            sql.push_str(&format!(" ({})", self.ident_list(&insert.columns)));
        }
        match &insert.source {
            InsertSource::DefaultValues => {
                sql.push(' ');
                sql.push_str(&self.kw("DEFAULT VALUES"));
            }
            InsertSource::Query(query) => {
                sql.push_str(&self.sep());
                sql.push_str(&self.query_sql(query)?);
            }
        }
        Ok(sql)
    }

    fn assignments_sql(&mut self, assignments: &[Assignment]) -> Result<String> {
        let mut out = Vec::new();
        for assignment in assignments {
            out.push(format!(
                "{} = {}",
                self.column_sql(&assignment.target),
                self.expr_sql(&assignment.value)?
            ));
        }
        Ok(out.join(", "))
    }

    fn update_sql(&mut self, update: &Update) -> Result<String> {
        let mut parts = vec![
            format!("{} {}", self.kw("UPDATE"), self.table_ref_sql(&update.table)),
            format!("{} {}", self.kw("SET"), self.assignments_sql(&update.assignments)?),
        ];
        if let Some(from) = &update.from {
            parts.push(format!("{} {}", self.kw("FROM"), self.from_sql(from)?));
        }
        if let Some(where_clause) = &update.where_clause {
            parts.push(format!(
                "{} {}",
                self.kw("WHERE"),
                self.expr_sql(&where_clause.condition)?
            ));
        }
        Ok(parts.join(&self.sep()))
    }

    fn delete_sql(&mut self, delete: &Delete) -> Result<String> {
        let mut parts = vec![format!(
            "{} {}",
            self.kw("DELETE FROM"),
            self.table_ref_sql(&delete.table)
        )];
        if let Some(using) = &delete.using {
            let keyword = if self.config.dialect.is_tsql_family() {
                "FROM"
            } else {
                "USING"
            };
            parts.push(format!("{} {}", self.kw(keyword), self.from_sql(using)?));
        }
        if let Some(where_clause) = &delete.where_clause {
            parts.push(format!(
                "{} {}",
                self.kw("WHERE"),
                self.expr_sql(&where_clause.condition)?
            ));
        }
        Ok(parts.join(&self.sep()))
    }

    fn merge_sql(&mut self, merge: &Merge) -> Result<String> {
        let mut parts = vec![
            format!("{} {}", self.kw("MERGE INTO"), self.table_ref_sql(&merge.target)),
            format!("{} {}", self.kw("USING"), self.table_factor_sql(&merge.source)?),
            format!("{} {}", self.kw("ON"), self.expr_sql(&merge.on)?),
        ];
        for clause in &merge.clauses {
            let mut sql = self.kw(match clause.kind {
                MergeMatchKind::Matched => "WHEN MATCHED",
                MergeMatchKind::NotMatched => "WHEN NOT MATCHED",
                MergeMatchKind::NotMatchedBySource => "WHEN NOT MATCHED BY SOURCE",
            });
            if let Some(condition) = &clause.condition {
                sql.push(' ');
                sql.push_str(&self.kw("AND"));
                sql.push(' ');
                sql.push_str(&self.expr_sql(condition)?);
            }
            sql.push(' ');
            sql.push_str(&self.kw("THEN"));
            sql.push(' ');
            match &clause.action {
                MergeAction::Update { assignments } => {
                    sql.push_str(&self.kw("UPDATE SET"));
                    sql.push(' ');
                    sql.push_str(&self.assignments_sql(assignments)?);
                }
                MergeAction::Delete => sql.push_str(&self.kw("DELETE")),
                MergeAction::Insert { columns, values } => {
                    sql.push_str(&self.kw("INSERT"));
                    if !columns.is_empty() {
                        sql.push_str(&format!(" ({})", self.ident_list(columns)));
                    }
                    sql.push(' ');
                    sql.push_str(&self.kw("VALUES"));
                    sql.push_str(&format!(" ({})", self.expr_list(values)?));
                }
            }
            parts.push(sql);
        }
        Ok(parts.join(&self.sep()))
    }

    fn create_table_sql(&mut self, create: &CreateTable) -> Result<String> {
        let mut sql = self.kw("CREATE");
        if create.or_replace {
            sql.push(' ');
            sql.push_str(&self.kw("OR REPLACE"));
        }
        for modifier in &create.modifiers {
            sql.push(' ');
            sql.push_str(&self.kw(modifier));
        }
        if create.temporary {
            sql.push(' ');
            sql.push_str(&self.kw("TEMPORARY"));
        }
        sql.push(' ');
        sql.push_str(&self.kw("TABLE"));
        if create.if_not_exists {
            sql.push(' ');
            sql.push_str(&self.kw("IF NOT EXISTS"));
        }
        sql.push(' ');
        sql.push_str(&self.table_name(&create.name));

        let is_inline = |option: &TableOption| {
            matches!(option, TableOption::Raw(ext) if ext.construct == "TABLE OPTION" || ext.construct == "INDEX")
        };
        for option in &create.options {
            if let TableOption::Raw(ext) = option {
                if ext.construct == "TABLE OPTION" {
                    sql.push_str(", ");
                    sql.push_str(&ext.raw);
                }
            }
        }
        if let Some(like) = &create.like {
            sql.push(' ');
            sql.push_str(&self.kw("LIKE"));
            sql.push(' ');
            sql.push_str(&self.table_name(like));
        }

        let mut elements = Vec::new();
        for column in &create.columns {
            elements.push(self.column_def_sql(column)?);
        }
        for constraint in &create.constraints {
            elements.push(self.table_constraint_sql(constraint)?);
        }
        for option in &create.options {
            if let TableOption::Raw(ext) = option {
                if ext.construct == "INDEX" {
                    elements.push(ext.raw.clone());
                }
            }
        }
        if !elements.is_empty() {
            if self.options.pretty {
                let inner = format!("\n{}", self.indent(self.level + 1));
                sql.push_str(&format!(
                    " ({inner}{}\n{})",
                    elements.join(&format!(",{inner}")),
                    self.indent(self.level)
                ));
            } else {
                sql.push_str(&format!(" ({})", elements.join(", ")));
            }
        }

        // Teradata writes table options after the CTAS query
        let options_after_query =
            create.as_query.is_some() && self.config.dialect == DialectType::Teradata;
        let mut options = Vec::new();
        let mut trailing = Vec::new();
        let mut properties = Vec::new();
        for option in create.options.iter().filter(|o| !is_inline(*o)) {
            if let TableOption::Property { key, value } = option {
                if self.config.tblproperties {
                    properties.push(format!(
                        "{} = {}",
                        self.string_literal(key),
                        self.string_literal(value)
                    ));
                    continue;
                }
            }
            let rendered = self.table_option_sql(option)?;
            if options_after_query || matches!(option, TableOption::WithData(_)) {
                trailing.push(rendered);
            } else {
                options.push(rendered);
            }
        }
        if !properties.is_empty() {
            options.push(format!("{} ({})", self.kw("TBLPROPERTIES"), properties.join(", ")));
        }
        for option in options {
            sql.push_str(&self.sep());
            sql.push_str(&option);
        }
        if let Some(query) = &create.as_query {
            sql.push_str(&self.sep());
            sql.push_str(&self.kw("AS"));
            sql.push(' ');
            sql.push_str(&self.query_sql(query)?);
        }
        for option in trailing {
            sql.push_str(&self.sep());
            sql.push_str(&option);
        }
        Ok(sql)
    }

    fn column_def_sql(&mut self, column: &ColumnDef) -> Result<String> {
        let mut sql = format!("{} {}", self.ident(&column.name), self.data_type_sql(&column.data_type)?);
        for constraint in &column.constraints {
            sql.push(' ');
            sql.push_str(&self.column_constraint_sql(constraint)?);
        }
        Ok(sql)
    }

    fn column_constraint_sql(&mut self, constraint: &ColumnConstraint) -> Result<String> {
        Ok(match constraint {
            ColumnConstraint::NotNull => self.kw("NOT NULL"),
            ColumnConstraint::Null => self.kw("NULL"),
            ColumnConstraint::PrimaryKey => self.kw("PRIMARY KEY"),
            ColumnConstraint::Unique => self.kw("UNIQUE"),
            ColumnConstraint::Default(expr) => format!("{} {}", self.kw("DEFAULT"), self.expr_sql(expr)?),
            ColumnConstraint::Check(expr) => format!("{} ({})", self.kw("CHECK"), self.expr_sql(expr)?),
            ColumnConstraint::References { table, columns } => {
                let mut sql = format!("{} {}", self.kw("REFERENCES"), self.table_name(table));
                if !columns.is_empty() {
                    sql.push_str(&format!(" ({})", self.ident_list(columns)));
                }
                sql
            }
            ColumnConstraint::Identity(spec) => self.identity_sql(spec),
            ColumnConstraint::Comment(text) => format!("{} {}", self.kw("COMMENT"), self.string_literal(text)),
            ColumnConstraint::Collate(name) => format!("{} {}", self.kw("COLLATE"), name),
            ColumnConstraint::Raw(ext) => ext.raw.clone(),
        })
    }

    fn identity_sql(&self, spec: &IdentitySpec) -> String {
        let args = match (&spec.start, &spec.increment) {
            (Some(start), Some(increment)) => Some(format!("{start}, {increment}")),
            (Some(start), None) => Some(start.clone()),
            _ => None,
        };
        match spec.style {
            IdentityStyle::Identity => match args {
                Some(args) => format!("{}({args})", self.kw("IDENTITY")),
                None => self.kw("IDENTITY"),
            },
            IdentityStyle::AutoIncrement => {
                let word = if self.config.dialect == DialectType::MySQL {
                    "AUTO_INCREMENT"
                } else {
                    "AUTOINCREMENT"
                };
                match args {
                    Some(args) => format!("{}({args})", self.kw(word)),
                    None => self.kw(word),
                }
            }
            IdentityStyle::GeneratedAlways | IdentityStyle::GeneratedByDefault => {
                let mut sql = self.kw(if spec.style == IdentityStyle::GeneratedAlways {
                    "GENERATED ALWAYS AS IDENTITY"
                } else {
                    "GENERATED BY DEFAULT AS IDENTITY"
                });
                let mut parts = Vec::new();
                if let Some(start) = &spec.start {
                    parts.push(format!("{} {start}", self.kw("START WITH")));
                }
                if let Some(increment) = &spec.increment {
                    parts.push(format!("{} {increment}", self.kw("INCREMENT BY")));
                }
                if !parts.is_empty() {
                    sql.push_str(&format!(" ({})", parts.join(" ")));
                }
                sql
            }
        }
    }

    fn table_constraint_sql(&mut self, constraint: &TableConstraint) -> Result<String> {
        let mut sql = String::new();
        if let Some(name) = &constraint.name {
            sql.push_str(&format!("{} {} ", self.kw("CONSTRAINT"), self.ident(name)));
        }
        match &constraint.kind {
            TableConstraintKind::PrimaryKey { columns } => {
                sql.push_str(&format!("{} ({})", self.kw("PRIMARY KEY"), self.ident_list(columns)));
            }
            TableConstraintKind::Unique { columns } => {
                sql.push_str(&format!("{} ({})", self.kw("UNIQUE"), self.ident_list(columns)));
            }
            TableConstraintKind::ForeignKey {
                columns,
                table,
                referenced,
            } => {
                sql.push_str(&format!(
                    "{} ({}) {} {}",
                    self.kw("FOREIGN KEY"),
                    self.ident_list(columns),
                    self.kw("REFERENCES"),
                    self.table_name(table)
                ));
                if !referenced.is_empty() {
                    sql.push_str(&format!(" ({})", self.ident_list(referenced)));
                }
            }
            TableConstraintKind::Check(expr) => {
                sql.push_str(&format!("{} ({})", self.kw("CHECK"), self.expr_sql(expr)?));
            }
        }
        Ok(sql)
    }

    fn table_option_sql(&mut self, option: &TableOption) -> Result<String> {
        Ok(match option {
            TableOption::ClusterBy(exprs) => format!("{} ({})", self.kw("CLUSTER BY"), self.expr_list(exprs)?),
            TableOption::PartitionBy(exprs) => {
                if self.config.partitioned_by {
                    format!("{} ({})", self.kw("PARTITIONED BY"), self.expr_list(exprs)?)
                } else {
                    format!("{} {}", self.kw("PARTITION BY"), self.expr_list(exprs)?)
                }
            }
            TableOption::Comment(text) => format!("{} {}", self.kw("COMMENT"), self.string_literal(text)),
            TableOption::Using(format) => format!("{} {}", self.kw("USING"), format.to_uppercase()),
            TableOption::Location(path) => format!("{} {}", self.kw("LOCATION"), self.string_literal(path)),
            TableOption::Property { key, value } => {
                let value = if value.chars().all(|c| c.is_alphanumeric() || c == '_') {
                    value.clone()
                } else {
                    self.string_literal(value)
                };
                format!("{}={value}", self.kw(key))
            }
            TableOption::PrimaryIndex { unique, columns } => {
                let keyword = if *unique { "UNIQUE PRIMARY INDEX" } else { "PRIMARY INDEX" };
                format!("{} ({})", self.kw(keyword), self.ident_list(columns))
            }
            TableOption::DistKey(column) => format!("{} ({})", self.kw("DISTKEY"), self.ident(column)),
            TableOption::SortKey { style, columns } => {
                let mut sql = String::new();
                if let Some(style) = style {
                    sql.push_str(&self.kw(style));
                    sql.push(' ');
                }
                sql.push_str(&format!("{} ({})", self.kw("SORTKEY"), self.ident_list(columns)));
                sql
            }
            TableOption::DistStyle(style) => format!("{} {}", self.kw("DISTSTYLE"), self.kw(style)),
            TableOption::WithData(true) => self.kw("WITH DATA"),
            TableOption::WithData(false) => self.kw("WITH NO DATA"),
            TableOption::Raw(ext) => ext.raw.clone(),
        })
    }

    fn create_view_sql(&mut self, view: &CreateView) -> Result<String> {
        let mut sql = self.kw("CREATE");
        if view.or_replace {
            sql.push(' ');
            sql.push_str(&self.kw("OR REPLACE"));
        }
        if view.temporary {
            sql.push(' ');
            sql.push_str(&self.kw("TEMPORARY"));
        }
        if view.materialized {
            sql.push(' ');
            sql.push_str(&self.kw("MATERIALIZED"));
        }
        sql.push(' ');
        sql.push_str(&self.kw("VIEW"));
        if view.if_not_exists {
            sql.push(' ');
            sql.push_str(&self.kw("IF NOT EXISTS"));
        }
        sql.push(' ');
        sql.push_str(&self.table_name(&view.name));
        if !view.columns.is_empty() {
            sql.push_str(&format!(" ({})", self.ident_list(&view.columns)));
        }
        sql.push(' ');
        sql.push_str(&self.kw("AS"));
        sql.push_str(&self.sep());
        sql.push_str(&self.query_sql(&view.query)?);
        Ok(sql)
    }

    fn drop_sql(&mut self, drop: &Drop) -> Result<String> {
        let mut sql = format!("{} {}", self.kw("DROP"), self.kw(drop.kind.keyword()));
        if drop.if_exists {
            sql.push(' ');
            sql.push_str(&self.kw("IF EXISTS"));
        }
        let names: Vec<String> = drop.names.iter().map(|n| self.table_name(n)).collect();
        sql.push(' ');
        sql.push_str(&names.join(", "));
        if drop.cascade {
            sql.push(' ');
            sql.push_str(&self.kw("CASCADE"));
        }
        Ok(sql)
    }

    // -- expressions --------------------------------------------------------

    fn expr_list(&mut self, exprs: &[Expression]) -> Result<String> {
        let mut out = Vec::with_capacity(exprs.len());
        for expr in exprs {
            out.push(self.expr_sql(expr)?);
        }
        Ok(out.join(", "))
    }

    /// Render `expr`, parenthesized when it binds looser than `min_level`
    fn operand_sql(&mut self, expr: &Expression, min_level: u8) -> Result<String> {
        let sql = self.expr_sql(expr)?;
        if expression_level(self.dialect, expr) < min_level {
            Ok(format!("({sql})"))
        } else {
            Ok(sql)
        }
    }

    fn column_sql(&self, column: &Column) -> String {
        let mut parts: Vec<String> = column.qualifier.iter().map(|q| self.ident(q)).collect();
        parts.push(self.ident(&column.name));
        let mut sql = parts.join(".");
        if column.join_mark {
            sql.push_str("(+)");
        }
        sql
    }

    pub(crate) fn expr_sql(&mut self, expr: &Expression) -> Result<String> {
        match expr {
            Expression::Literal(literal) => Ok(self.literal_sql(literal)),
            Expression::Boolean(true) => Ok(self.kw("TRUE")),
            Expression::Boolean(false) => Ok(self.kw("FALSE")),
            Expression::Null => Ok(self.kw("NULL")),
            Expression::Column(column) => Ok(self.column_sql(column)),
            Expression::Star(star) => {
                let mut sql = String::new();
                for part in &star.qualifier {
                    sql.push_str(&self.ident(part));
                    sql.push('.');
                }
                sql.push('*');
                if !star.except.is_empty() {
                    sql.push_str(&format!(
                        " {} ({})",
                        self.kw(self.config.star_except_keyword),
                        self.ident_list(&star.except)
                    ));
                }
                Ok(sql)
            }
            Expression::Parameter(parameter) => Ok(match parameter.kind {
                ParameterKind::Positional => "?".to_string(),
                ParameterKind::Numbered => format!("${}", parameter.name),
                ParameterKind::Colon => format!(":{}", parameter.name),
                ParameterKind::At => format!("@{}", parameter.name),
            }),
            Expression::Binary(binary) => self.binary_sql(binary),
            Expression::Unary(unary) => self.unary_sql(unary),
            Expression::Paren(inner) => Ok(format!("({})", self.expr_sql(inner)?)),
            Expression::Alias(alias) => Ok(format!(
                "{} {} {}",
                self.expr_sql(&alias.expr)?,
                self.kw("AS"),
                self.ident(&alias.alias)
            )),
            Expression::Function(function) => self.function_sql(function),
            Expression::Window(window) => {
                let mut sql = self.function_sql(&window.function)?;
                if let Some(treatment) = window.null_treatment {
                    sql.push(' ');
                    sql.push_str(&self.null_treatment_sql(treatment));
                }
                sql.push(' ');
                sql.push_str(&self.kw("OVER"));
                sql.push(' ');
                let spec = &window.over;
                let bare_name = spec.partition_by.is_empty() && spec.order_by.is_empty() && spec.frame.is_none();
                match &spec.name {
                    Some(name) if bare_name => sql.push_str(&self.ident(name)),
                    _ => sql.push_str(&format!("({})", self.window_spec_sql(spec)?)),
                }
                Ok(sql)
            }
            Expression::Cast(cast) => self.cast_sql(cast),
            Expression::Case(case) => {
                let mut sql = self.kw("CASE");
                if let Some(operand) = &case.operand {
                    sql.push(' ');
                    sql.push_str(&self.expr_sql(operand)?);
                }
                for (condition, result) in &case.whens {
                    sql.push_str(&format!(
                        " {} {} {} {}",
                        self.kw("WHEN"),
                        self.expr_sql(condition)?,
                        self.kw("THEN"),
                        self.expr_sql(result)?
                    ));
                }
                if let Some(else_result) = &case.else_result {
                    sql.push_str(&format!(" {} {}", self.kw("ELSE"), self.expr_sql(else_result)?));
                }
                sql.push(' ');
                sql.push_str(&self.kw("END"));
                Ok(sql)
            }
            Expression::In(in_expr) => {
                let mut sql = self.operand_sql(&in_expr.expr, prec::COMPARISON)?;
                sql.push(' ');
                if in_expr.negated {
                    sql.push_str(&self.kw("NOT"));
                    sql.push(' ');
                }
                sql.push_str(&self.kw("IN"));
                sql.push(' ');
                match &in_expr.target {
                    InTarget::List(items) => sql.push_str(&format!("({})", self.expr_list(items)?)),
                    InTarget::Subquery(query) => sql.push_str(&self.nested_query(query)?),
                }
                Ok(sql)
            }
            Expression::Between(between) => {
                let mut sql = self.operand_sql(&between.expr, prec::COMPARISON)?;
                if between.negated {
                    sql.push(' ');
                    sql.push_str(&self.kw("NOT"));
                }
                Ok(format!(
                    "{sql} {} {} {} {}",
                    self.kw("BETWEEN"),
                    self.operand_sql(&between.low, prec::COMPARISON + 1)?,
                    self.kw("AND"),
                    self.operand_sql(&between.high, prec::COMPARISON + 1)?
                ))
            }
            Expression::Like(like) => {
                let mut sql = self.operand_sql(&like.expr, prec::COMPARISON)?;
                if like.negated {
                    sql.push(' ');
                    sql.push_str(&self.kw("NOT"));
                }
                let keyword = match like.kind {
                    LikeKind::Like => "LIKE",
                    LikeKind::ILike => "ILIKE",
                    LikeKind::RLike => "RLIKE",
                };
                sql.push_str(&format!(
                    " {} {}",
                    self.kw(keyword),
                    self.operand_sql(&like.pattern, prec::COMPARISON + 1)?
                ));
                if let Some(escape) = &like.escape {
                    sql.push_str(&format!(
                        " {} {}",
                        self.kw("ESCAPE"),
                        self.operand_sql(escape, prec::COMPARISON + 1)?
                    ));
                }
                Ok(sql)
            }
            Expression::IsNull(is_null) => {
                let keyword = if is_null.negated { "IS NOT NULL" } else { "IS NULL" };
                Ok(format!(
                    "{} {}",
                    self.operand_sql(&is_null.expr, prec::COMPARISON)?,
                    self.kw(keyword)
                ))
            }
            Expression::Exists(exists) => {
                let keyword = if exists.negated { "NOT EXISTS" } else { "EXISTS" };
                Ok(format!("{} {}", self.kw(keyword), self.nested_query(&exists.query)?))
            }
            Expression::Subquery(query) => self.nested_query(query),
            Expression::Interval(interval) => {
                let mut sql = format!("{} {}", self.kw("INTERVAL"), self.operand_sql(&interval.value, u8::MAX)?);
                if let Some(unit) = &interval.unit {
                    sql.push(' ');
                    sql.push_str(&self.kw(unit));
                }
                if let Some(to_unit) = &interval.to_unit {
                    sql.push_str(&format!(" {} {}", self.kw("TO"), self.kw(to_unit)));
                }
                Ok(sql)
            }
            Expression::Extract(extract) => Ok(format!(
                "{}({} {} {})",
                self.kw("EXTRACT"),
                self.kw(&extract.field),
                self.kw("FROM"),
                self.expr_sql(&extract.expr)?
            )),
            Expression::Trim(trim) => {
                let mut inner = String::new();
                if let Some(position) = trim.position {
                    inner.push_str(&self.kw(position.keyword()));
                    inner.push(' ');
                }
                if let Some(characters) = &trim.characters {
                    inner.push_str(&self.expr_sql(characters)?);
                    inner.push(' ');
                }
                if !inner.is_empty() {
                    inner.push_str(&self.kw("FROM"));
                    inner.push(' ');
                }
                inner.push_str(&self.expr_sql(&trim.expr)?);
                Ok(format!("{}({inner})", self.kw("TRIM")))
            }
            Expression::Array(items) => {
                let items = self.expr_list(items)?;
                Ok(match self.config.array_literal {
                    ArrayLiteralStyle::Function => format!("{}({items})", self.kw("ARRAY")),
                    ArrayLiteralStyle::Bracket => format!("[{items}]"),
                    ArrayLiteralStyle::ArrayBracket => format!("{}[{items}]", self.kw("ARRAY")),
                })
            }
            Expression::Tuple(items) => Ok(format!("({})", self.expr_list(items)?)),
            Expression::Subscript(subscript) => Ok(format!(
                "{}[{}]",
                self.operand_sql(&subscript.expr, prec::CAST)?,
                self.expr_sql(&subscript.index)?
            )),
            Expression::JsonAccess(access) => {
                let base = self.operand_sql(&access.expr, prec::CAST)?;
                match access.kind {
                    JsonAccessKind::Colon => {
                        let path = match access.path.as_string() {
                            Some(path) => path.to_string(),
                            None => self.expr_sql(&access.path)?,
                        };
                        Ok(format!("{base}:{path}"))
                    }
                    JsonAccessKind::Arrow => Ok(format!("{base} -> {}", self.operand_sql(&access.path, u8::MAX)?)),
                    JsonAccessKind::DoubleArrow => {
                        Ok(format!("{base} ->> {}", self.operand_sql(&access.path, u8::MAX)?))
                    }
                }
            }
            Expression::NamedArgument(arg) => match arg.style {
                NamedArgStyle::Arrow => Ok(format!("{} => {}", self.ident(&arg.name), self.expr_sql(&arg.value)?)),
                NamedArgStyle::Keyword => Ok(format!("{} {}", self.kw(&arg.name.name), self.expr_sql(&arg.value)?)),
            },
            Expression::DataType(data_type) => self.data_type_sql(data_type),
            Expression::Extension(extension) => Ok(extension.raw.clone()),
        }
    }

    fn literal_sql(&self, literal: &Literal) -> String {
        match literal {
            Literal::String(s) => self.string_literal(s),
            Literal::NationalString(s) if self.config.national_strings => format!("N{}", self.string_literal(s)),
            Literal::NationalString(s) => self.string_literal(s),
            Literal::HexString(s) => format!("X'{s}'"),
            Literal::Number(n) => n.clone(),
            Literal::Date(s) => format!("{} {}", self.kw("DATE"), self.string_literal(s)),
            Literal::Time(s) => format!("{} {}", self.kw("TIME"), self.string_literal(s)),
            Literal::Timestamp(s) => format!("{} {}", self.kw("TIMESTAMP"), self.string_literal(s)),
        }
    }

    fn binary_sql(&mut self, binary: &BinaryOp) -> Result<String> {
        let grammar = self.dialect.grammar();
        let level = grammar.precedence.level(binary.op);

        // `x IS TRUE` parses as a null-safe comparison with a boolean
        if let Expression::Boolean(value) = binary.right {
            let keyword = match binary.op {
                BinaryOperator::IsNotDistinctFrom => Some("IS"),
                BinaryOperator::IsDistinctFrom => Some("IS NOT"),
                _ => None,
            };
            if let Some(keyword) = keyword {
                let left = self.operand_sql(&binary.left, prec::COMPARISON)?;
                let value = self.kw(if value { "TRUE" } else { "FALSE" });
                return Ok(format!("{left} {} {value}", self.kw(keyword)));
            }
        }

        let op = match binary.op {
            BinaryOperator::Or => self.kw("OR"),
            BinaryOperator::And => self.kw("AND"),
            BinaryOperator::Xor => self.kw("XOR"),
            BinaryOperator::Eq => "=".into(),
            BinaryOperator::Neq => "<>".into(),
            BinaryOperator::Lt => "<".into(),
            BinaryOperator::Lte => "<=".into(),
            BinaryOperator::Gt => ">".into(),
            BinaryOperator::Gte => ">=".into(),
            BinaryOperator::NullsafeEq
                if matches!(self.config.dialect, DialectType::MySQL | DialectType::Databricks | DialectType::Hive) =>
            {
                "<=>".into()
            }
            BinaryOperator::NullsafeEq | BinaryOperator::IsNotDistinctFrom => self.kw("IS NOT DISTINCT FROM"),
            BinaryOperator::IsDistinctFrom => self.kw("IS DISTINCT FROM"),
            BinaryOperator::Concat if !self.config.concat_operator => {
                let args = vec![binary.left.clone(), binary.right.clone()];
                return self.function_sql(&Function::new("CONCAT", args));
            }
            BinaryOperator::Concat => "||".into(),
            BinaryOperator::Plus => "+".into(),
            BinaryOperator::Minus => "-".into(),
            BinaryOperator::Multiply => "*".into(),
            BinaryOperator::Divide => "/".into(),
            BinaryOperator::IntDivide => self.kw("DIV"),
            BinaryOperator::Modulo if grammar.mod_keyword => self.kw("MOD"),
            BinaryOperator::Modulo => "%".into(),
            BinaryOperator::Power if grammar.caret_is_power => "^".into(),
            BinaryOperator::Power if grammar.dstar_is_power => "**".into(),
            BinaryOperator::Power => {
                let args = vec![binary.left.clone(), binary.right.clone()];
                return self.function_sql(&Function::new("POWER", args));
            }
            BinaryOperator::BitwiseOr => "|".into(),
            BinaryOperator::BitwiseAnd => "&".into(),
            BinaryOperator::BitwiseXor => "^".into(),
            BinaryOperator::ShiftLeft => "<<".into(),
            BinaryOperator::ShiftRight => ">>".into(),
        };

        let left = self.operand_sql(&binary.left, level)?;
        let right = self.operand_sql(&binary.right, level + 1)?;
        if self.options.pretty && matches!(binary.op, BinaryOperator::And | BinaryOperator::Or) && self.level == 0 {
            return Ok(format!("{left}\n{}{op} {right}", self.indent(self.level + 1)));
        }
        Ok(format!("{left} {op} {right}"))
    }

    fn unary_sql(&mut self, unary: &UnaryOp) -> Result<String> {
        match unary.op {
            UnaryOperator::Not => Ok(format!("{} {}", self.kw("NOT"), self.operand_sql(&unary.expr, prec::NOT)?)),
            op => {
                let symbol = match op {
                    UnaryOperator::Minus => "-",
                    UnaryOperator::Plus => "+",
                    _ => "~",
                };
                let operand = self.operand_sql(&unary.expr, prec::UNARY)?;
                // `- -x` must not become a comment
                if operand.starts_with(symbol) {
                    Ok(format!("{symbol} {operand}"))
                } else {
                    Ok(format!("{symbol}{operand}"))
                }
            }
        }
    }

    fn null_treatment_sql(&self, treatment: NullTreatment) -> String {
        self.kw(match treatment {
            NullTreatment::IgnoreNulls => "IGNORE NULLS",
            NullTreatment::RespectNulls => "RESPECT NULLS",
        })
    }

    pub(crate) fn function_sql(&mut self, function: &Function) -> Result<String> {
        if function.name == "GROUPING SETS" {
            return Ok(format!("{} ({})", self.kw("GROUPING SETS"), self.expr_list(&function.args)?));
        }
        let plain = !function.distinct
            && function.filter.is_none()
            && function.within_group.is_empty()
            && function.order_by.is_empty()
            && function.null_treatment.is_none();
        if plain && function.args.is_empty() && crate::parser::NILADIC_FUNCTIONS.contains(&function.name.as_str()) {
            return Ok(function.name.clone());
        }

        let mut inner = String::new();
        if function.distinct {
            inner.push_str(&self.kw("DISTINCT"));
            inner.push(' ');
        }
        if function.name == "POSITION" && function.args.len() == 2 {
            inner.push_str(&format!(
                "{} {} {}",
                self.operand_sql(&function.args[0], prec::COMPARISON + 1)?,
                self.kw("IN"),
                self.expr_sql(&function.args[1])?
            ));
        } else {
            let (keyword_args, positional): (Vec<&Expression>, Vec<&Expression>) = function
                .args
                .iter()
                .partition(|a| matches!(a, Expression::NamedArgument(n) if n.style == NamedArgStyle::Keyword));
            let mut args = Vec::with_capacity(positional.len());
            for arg in positional {
                args.push(self.expr_sql(arg)?);
            }
            inner.push_str(&args.join(", "));
            if let Some(treatment) = function.null_treatment {
                inner.push(' ');
                inner.push_str(&self.null_treatment_sql(treatment));
            }
            if !function.order_by.is_empty() {
                inner.push_str(&format!(" {} {}", self.kw("ORDER BY"), self.ordered_list(&function.order_by)?));
            }
            for arg in keyword_args {
                inner.push(' ');
                inner.push_str(&self.expr_sql(arg)?);
            }
        }

        let mut sql = format!("{}({inner})", function.name);
        if !function.within_group.is_empty() {
            sql.push_str(&format!(
                " {} ({} {})",
                self.kw("WITHIN GROUP"),
                self.kw("ORDER BY"),
                self.ordered_list(&function.within_group)?
            ));
        }
        if let Some(filter) = &function.filter {
            sql.push_str(&format!(" {} ({} {})", self.kw("FILTER"), self.kw("WHERE"), self.expr_sql(filter)?));
        }
        Ok(sql)
    }

    fn window_spec_sql(&mut self, spec: &WindowSpec) -> Result<String> {
        let mut parts = Vec::new();
        if let Some(name) = &spec.name {
            parts.push(self.ident(name));
        }
        if !spec.partition_by.is_empty() {
            parts.push(format!("{} {}", self.kw("PARTITION BY"), self.expr_list(&spec.partition_by)?));
        }
        if !spec.order_by.is_empty() {
            parts.push(format!("{} {}", self.kw("ORDER BY"), self.ordered_list(&spec.order_by)?));
        }
        if let Some(frame) = &spec.frame {
            let units = self.kw(match frame.units {
                FrameUnits::Rows => "ROWS",
                FrameUnits::Range => "RANGE",
            });
            let start = self.frame_bound_sql(&frame.start)?;
            match &frame.end {
                Some(end) => {
                    let end = self.frame_bound_sql(end)?;
                    parts.push(format!("{units} {} {start} {} {end}", self.kw("BETWEEN"), self.kw("AND")));
                }
                None => parts.push(format!("{units} {start}")),
            }
        }
        Ok(parts.join(" "))
    }

    fn frame_bound_sql(&mut self, bound: &FrameBound) -> Result<String> {
        Ok(match bound {
            FrameBound::UnboundedPreceding => self.kw("UNBOUNDED PRECEDING"),
            FrameBound::UnboundedFollowing => self.kw("UNBOUNDED FOLLOWING"),
            FrameBound::CurrentRow => self.kw("CURRENT ROW"),
            FrameBound::Preceding(offset) => {
                format!("{} {}", self.operand_sql(offset, prec::COMPARISON)?, self.kw("PRECEDING"))
            }
            FrameBound::Following(offset) => {
                format!("{} {}", self.operand_sql(offset, prec::COMPARISON)?, self.kw("FOLLOWING"))
            }
        })
    }

    fn cast_sql(&mut self, cast: &Cast) -> Result<String> {
        let to = self.data_type_sql(&cast.to)?;
        let keyword = match cast.kind {
            CastKind::DoubleColon if self.dialect.grammar().double_colon_cast && cast.format.is_none() => {
                let expr = self.operand_sql(&cast.expr, prec::CAST)?;
                return Ok(format!("{expr}::{to}"));
            }
            CastKind::Cast | CastKind::DoubleColon => "CAST",
            CastKind::TryCast => "TRY_CAST",
            CastKind::SafeCast => "SAFE_CAST",
        };
        let mut sql = format!("{}({} {} {to}", self.kw(keyword), self.expr_sql(&cast.expr)?, self.kw("AS"));
        if let Some(format) = &cast.format {
            sql.push_str(&format!(" {} {}", self.kw("FORMAT"), self.string_literal(format)));
        }
        sql.push(')');
        Ok(sql)
    }

    // -- data types ---------------------------------------------------------

    fn data_type_sql(&mut self, data_type: &DataType) -> Result<String> {
        let dialect = self.config.dialect;
        let with_len = |name: &str, len: Option<u32>| match len {
            Some(n) => format!("{name}({n})"),
            None => name.to_string(),
        };
        let char_len = |name: &str, len: &Option<CharLength>| match len {
            Some(CharLength::Fixed(n)) => format!("{name}({n})"),
            Some(CharLength::Max) => format!("{name}(MAX)"),
            None => name.to_string(),
        };
        let unsigned = |name: &str, unsigned: bool| {
            if unsigned {
                format!("{name} UNSIGNED")
            } else {
                name.to_string()
            }
        };

        let sql = match data_type {
            DataType::Boolean if dialect.is_tsql_family() => "BIT".to_string(),
            DataType::Boolean => "BOOLEAN".to_string(),
            DataType::TinyInt { unsigned: u } => unsigned("TINYINT", *u),
            DataType::SmallInt { unsigned: u } => unsigned("SMALLINT", *u),
            DataType::Int { unsigned: u } => unsigned("INT", *u),
            DataType::BigInt { .. } if dialect == DialectType::BigQuery => "INT64".to_string(),
            DataType::BigInt { unsigned: u } => unsigned("BIGINT", *u),
            DataType::Decimal { precision, scale } => {
                let name = match dialect {
                    DialectType::Oracle => "NUMBER",
                    DialectType::BigQuery | DialectType::PostgreSQL => "NUMERIC",
                    _ => "DECIMAL",
                };
                match (precision, scale) {
                    (Some(p), Some(s)) => format!("{name}({p}, {s})"),
                    (Some(p), None) => format!("{name}({p})"),
                    (None, Some(s)) => format!("{name}(*, {s})"),
                    (None, None) => name.to_string(),
                }
            }
            DataType::Float { precision } => with_len("FLOAT", *precision),
            DataType::Real if dialect == DialectType::Databricks => "FLOAT".to_string(),
            DataType::Real if dialect == DialectType::Oracle => "BINARY_FLOAT".to_string(),
            DataType::Real => "REAL".to_string(),
            DataType::Double => match dialect {
                DialectType::BigQuery => "FLOAT64",
                DialectType::Oracle => "BINARY_DOUBLE",
                DialectType::PostgreSQL
                | DialectType::Redshift
                | DialectType::SqlServer
                | DialectType::Synapse => "DOUBLE PRECISION",
                _ => "DOUBLE",
            }
            .to_string(),
            DataType::ScaledFloat {
                double,
                precision,
                scale,
            } => format!("{}({precision}, {scale})", if *double { "DOUBLE" } else { "FLOAT" }),
            DataType::Money => "MONEY".to_string(),
            DataType::SmallMoney => "SMALLMONEY".to_string(),
            DataType::Char { length } => with_len("CHAR", *length),
            DataType::NChar { length } => with_len("NCHAR", *length),
            DataType::VarChar { length } if dialect == DialectType::Oracle => char_len("VARCHAR2", length),
            DataType::VarChar { length } => char_len("VARCHAR", length),
            DataType::NVarChar { length } if dialect == DialectType::Oracle => char_len("NVARCHAR2", length),
            DataType::NVarChar { length } => char_len("NVARCHAR", length),
            DataType::Text => "TEXT".to_string(),
            DataType::String => "STRING".to_string(),
            DataType::Clob => "CLOB".to_string(),
            DataType::Binary { length } => with_len("BINARY", *length),
            DataType::VarBinary { length: None } if dialect.is_postgres_family() => "BYTEA".to_string(),
            DataType::VarBinary { length: None } if dialect == DialectType::BigQuery => "BYTES".to_string(),
            DataType::VarBinary { length } if dialect == DialectType::Oracle => char_len("RAW", length),
            DataType::VarBinary { length } => char_len("VARBINARY", length),
            DataType::Blob if dialect.is_tsql_family() => "IMAGE".to_string(),
            DataType::Blob => "BLOB".to_string(),
            DataType::Date => "DATE".to_string(),
            DataType::Time {
                precision,
                with_time_zone,
            } => {
                let mut sql = with_len("TIME", *precision);
                if *with_time_zone {
                    sql.push_str(" WITH TIME ZONE");
                }
                sql
            }
            DataType::Timestamp { precision, zone } => self.timestamp_sql(*precision, *zone),
            DataType::DateTime { kind, precision } => {
                let name = match kind {
                    DateTimeKind::DateTime => "DATETIME",
                    DateTimeKind::DateTime2 => "DATETIME2",
                    DateTimeKind::SmallDateTime => "SMALLDATETIME",
                    DateTimeKind::DateTimeOffset => "DATETIMEOFFSET",
                };
                with_len(name, *precision)
            }
            DataType::Interval => "INTERVAL".to_string(),
            DataType::Json => "JSON".to_string(),
            DataType::Variant if dialect == DialectType::Redshift => "SUPER".to_string(),
            DataType::Variant => "VARIANT".to_string(),
            DataType::Object => "OBJECT".to_string(),
            DataType::Array(None) => "ARRAY".to_string(),
            DataType::Array(Some(inner)) => {
                let inner = self.data_type_sql(inner)?;
                if dialect.is_postgres_family() {
                    return Ok(format!("{inner}[]"));
                }
                return Ok(format!("{}<{inner}>", self.kw("ARRAY")));
            }
            DataType::Map(key, value) => {
                let key = self.data_type_sql(key)?;
                let value = self.data_type_sql(value)?;
                return Ok(format!("{}<{key}, {value}>", self.kw("MAP")));
            }
            DataType::Struct(fields) => {
                let separator = if dialect == DialectType::BigQuery { " " } else { ": " };
                let mut rendered = Vec::with_capacity(fields.len());
                for field in fields {
                    rendered.push(format!(
                        "{}{separator}{}",
                        self.ident(&field.name),
                        self.data_type_sql(&field.data_type)?
                    ));
                }
                return Ok(format!("{}<{}>", self.kw("STRUCT"), rendered.join(", ")));
            }
            DataType::Uuid if dialect.is_tsql_family() => "UNIQUEIDENTIFIER".to_string(),
            DataType::Uuid => "UUID".to_string(),
            DataType::Xml => "XML".to_string(),
            DataType::Custom { name, args } => {
                if name.is_empty() {
                    return Err(Error::generate("data type without a name"));
                }
                if args.is_empty() {
                    return Ok(name.clone());
                }
                return Ok(format!("{name}({})", args.join(", ")));
            }
        };
        Ok(self.kw(&sql))
    }

    fn timestamp_sql(&self, precision: Option<u32>, zone: TimestampZone) -> String {
        let p = |name: &str| match precision {
            Some(n) => format!("{name}({n})"),
            None => name.to_string(),
        };
        match self.config.dialect {
            DialectType::Snowflake => match zone {
                TimestampZone::Without => p("TIMESTAMP_NTZ"),
                TimestampZone::With => p("TIMESTAMP_TZ"),
                TimestampZone::Local => p("TIMESTAMP_LTZ"),
            },
            DialectType::Databricks => match zone {
                TimestampZone::Without => "TIMESTAMP_NTZ".to_string(),
                TimestampZone::With | TimestampZone::Local => "TIMESTAMP".to_string(),
            },
            DialectType::BigQuery => match zone {
                TimestampZone::Without => "DATETIME".to_string(),
                TimestampZone::With | TimestampZone::Local => "TIMESTAMP".to_string(),
            },
            DialectType::SqlServer | DialectType::Synapse => match zone {
                TimestampZone::Without => p("DATETIME2"),
                TimestampZone::With | TimestampZone::Local => p("DATETIMEOFFSET"),
            },
            _ => match zone {
                TimestampZone::Without => p("TIMESTAMP"),
                TimestampZone::With => format!("{} WITH TIME ZONE", p("TIMESTAMP")),
                TimestampZone::Local => format!("{} WITH LOCAL TIME ZONE", p("TIMESTAMP")),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialects::DialectRegistry;
    use pretty_assertions::assert_eq;

    fn round_trip(dialect: DialectType, sql: &str) -> String {
        let registry = DialectRegistry::builtin().unwrap();
        let dialect = registry.get(dialect).unwrap();
        let statement = dialect.parse_one(sql).unwrap();
        dialect.generate(&statement, &FormatOptions::default()).unwrap()
    }

    fn databricks(statement: &Statement) -> String {
        let registry = DialectRegistry::builtin().unwrap();
        let dialect = registry.get(DialectType::Databricks).unwrap();
        dialect.generate(statement, &FormatOptions::default()).unwrap()
    }

    #[test]
    fn test_select_round_trip() {
        assert_eq!(
            round_trip(DialectType::PostgreSQL, "select a, b as c from t where x = 1 order by a desc limit 5"),
            "SELECT a, b AS c FROM t WHERE x = 1 ORDER BY a DESC LIMIT 5"
        );
    }

    #[test]
    fn test_parentheses_follow_the_tree() {
        let expr = Expression::binary(
            BinaryOperator::Multiply,
            Expression::binary(BinaryOperator::Plus, Expression::column("a"), Expression::column("b")),
            Expression::column("c"),
        );
        let mut select = Select::new(vec![expr]);
        select.from = None;
        let statement = Statement::Query(Box::new(Query::from_body(
            QueryBody::Select(Box::new(select)),
            Default::default(),
        )));
        assert_eq!(databricks(&statement), "SELECT (a + b) * c");
    }

    #[test]
    fn test_right_operand_of_same_level_is_grouped() {
        let expr = Expression::binary(
            BinaryOperator::Minus,
            Expression::column("a"),
            Expression::binary(BinaryOperator::Minus, Expression::column("b"), Expression::column("c")),
        );
        let statement = Statement::Query(Box::new(Query::from_body(
            QueryBody::Select(Box::new(Select::new(vec![expr]))),
            Default::default(),
        )));
        assert_eq!(databricks(&statement), "SELECT a - (b - c)");
    }

    #[test]
    fn test_identifier_quoting_uses_target_quotes() {
        let mut column = Column::new("order date");
        column.qualifier = vec![Identifier::new("t")];
        let statement = Statement::Query(Box::new(Query::from_body(
            QueryBody::Select(Box::new(Select::new(vec![
                Expression::Column(column),
                Expression::column("select"),
            ]))),
            Default::default(),
        )));
        assert_eq!(databricks(&statement), "SELECT t.`order date`, `select`");
    }

    #[test]
    fn test_databricks_strings_escape_backslashes() {
        let statement = Statement::Query(Box::new(Query::from_body(
            QueryBody::Select(Box::new(Select::new(vec![Expression::string("it's a\\b")]))),
            Default::default(),
        )));
        assert_eq!(databricks(&statement), "SELECT 'it\\'s a\\\\b'");
    }

    #[test]
    fn test_tsql_spelling_round_trips() {
        assert_eq!(
            round_trip(DialectType::SqlServer, "SELECT TOP 10 [Order Id] FROM dbo.orders WITH (NOLOCK)"),
            "SELECT TOP 10 [Order Id] FROM dbo.orders WITH (NOLOCK)"
        );
    }

    #[test]
    fn test_is_true_is_preserved() {
        assert_eq!(
            round_trip(DialectType::PostgreSQL, "SELECT * FROM t WHERE flag IS NOT TRUE"),
            "SELECT * FROM t WHERE flag IS NOT TRUE"
        );
    }

    #[test]
    fn test_lowercase_keywords() {
        let registry = DialectRegistry::builtin().unwrap();
        let dialect = registry.get(DialectType::Databricks).unwrap();
        let statement = dialect.parse_one("SELECT a FROM t WHERE a IS NULL").unwrap();
        let options = FormatOptions {
            keyword_case: KeywordCase::Lower,
            ..FormatOptions::default()
        };
        assert_eq!(
            dialect.generate(&statement, &options).unwrap(),
            "select a from t where a is null"
        );
    }

    #[test]
    fn test_pretty_layout() {
        let registry = DialectRegistry::builtin().unwrap();
        let dialect = registry.get(DialectType::Databricks).unwrap();
        let statement = dialect.parse_one("SELECT a, b FROM t WHERE a > 1").unwrap();
        assert_eq!(
            dialect.generate(&statement, &FormatOptions::pretty()).unwrap(),
            "SELECT\n  a,\n  b\nFROM t\nWHERE a > 1"
        );
    }

    #[test]
    fn test_databricks_type_names() {
        let registry = DialectRegistry::builtin().unwrap();
        let dialect = registry.get(DialectType::Databricks).unwrap();
        let mut generator = Generator::new(dialect, FormatOptions::default());
        let ntz = DataType::Timestamp {
            precision: None,
            zone: TimestampZone::Without,
        };
        assert_eq!(generator.generate_data_type(&ntz).unwrap(), "TIMESTAMP_NTZ");
        assert_eq!(generator.generate_data_type(&DataType::Real).unwrap(), "FLOAT");
        let array = DataType::Array(Some(Box::new(DataType::String)));
        assert_eq!(generator.generate_data_type(&array).unwrap(), "ARRAY<STRING>");
    }

    #[test]
    fn test_ctas_options_follow_query_in_teradata() {
        assert_eq!(
            round_trip(
                DialectType::Teradata,
                "CREATE TABLE t AS (SELECT a FROM s) WITH DATA PRIMARY INDEX (a)"
            ),
            "CREATE TABLE t AS (SELECT a FROM s) WITH DATA PRIMARY INDEX (a)"
        );
    }
}
