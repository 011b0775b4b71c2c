//! SQL AST (Abstract Syntax Tree).
//!
//! The dialect-neutral representation every source dialect parses into and
//! every rewrite rule operates on.
//!
//! # Architecture
//!
//! | Group | Types | Purpose |
//! |---|---|---|
//! | **Statements** | [`Statement`], [`Query`], [`Insert`], [`Merge`], [`CreateTable`] | Top-level units |
//! | **Clauses** | [`From`], [`Join`], [`Where`], [`GroupBy`], [`OrderBy`], [`Top`], [`Fetch`] | Query clauses |
//! | **Expressions** | [`Expression`], [`BinaryOp`], [`Function`], [`WindowFunction`], [`Cast`] | Scalar trees |
//! | **Types** | [`DataType`] | Column and cast types |
//! | **Escape hatch** | [`Extension`] | Dialect constructs with no neutral form, kept as raw text |
//!
//! Every node owns its children. Nodes the user can point at (statements,
//! columns, function calls, casts, column definitions, table references,
//! extensions) carry a [`Span`] into the original input.

use crate::dialects::DialectType;
use crate::tokens::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

/// A single top-level SQL statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Statement {
    Query(Box<Query>),
    Insert(Box<Insert>),
    Update(Box<Update>),
    Delete(Box<Delete>),
    Merge(Box<Merge>),
    CreateTable(Box<CreateTable>),
    CreateView(Box<CreateView>),
    Drop(Box<Drop>),
    Truncate(Box<Truncate>),
    Use(Box<Use>),
    Extension(Box<Extension>),
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Query(q) => q.span,
            Statement::Insert(s) => s.span,
            Statement::Update(s) => s.span,
            Statement::Delete(s) => s.span,
            Statement::Merge(s) => s.span,
            Statement::CreateTable(s) => s.span,
            Statement::CreateView(s) => s.span,
            Statement::Drop(s) => s.span,
            Statement::Truncate(s) => s.span,
            Statement::Use(s) => s.span,
            Statement::Extension(e) => e.span,
        }
    }

    /// Short lowercase name of the statement kind
    pub fn kind_name(&self) -> &'static str {
        match self {
            Statement::Query(_) => "query",
            Statement::Insert(_) => "insert",
            Statement::Update(_) => "update",
            Statement::Delete(_) => "delete",
            Statement::Merge(_) => "merge",
            Statement::CreateTable(_) => "create_table",
            Statement::CreateView(_) => "create_view",
            Statement::Drop(_) => "drop",
            Statement::Truncate(_) => "truncate",
            Statement::Use(_) => "use",
            Statement::Extension(_) => "extension",
        }
    }
}

/// A full query: optional CTEs, a body, and the row-limiting tail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub with: Option<With>,
    pub body: QueryBody,
    pub order_by: Option<OrderBy>,
    pub limit: Option<Limit>,
    pub offset: Option<Offset>,
    pub fetch: Option<Fetch>,
    /// Dialect clauses after the body (`SAMPLE`, `OPTION (...)`, `FOR XML`)
    #[serde(default)]
    pub trailing: Vec<Extension>,
    pub span: Span,
}

impl Query {
    /// Wrap a query body without any tail clauses
    pub fn from_body(body: QueryBody, span: Span) -> Self {
        Self {
            with: None,
            body,
            order_by: None,
            limit: None,
            offset: None,
            fetch: None,
            trailing: Vec::new(),
            span,
        }
    }

    /// The single SELECT of a simple query, if the body is one
    pub fn select(&self) -> Option<&Select> {
        match &self.body {
            QueryBody::Select(select) => Some(select),
            _ => None,
        }
    }

    pub fn select_mut(&mut self) -> Option<&mut Select> {
        match &mut self.body {
            QueryBody::Select(select) => Some(select),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueryBody {
    Select(Box<Select>),
    SetOperation(Box<SetOperation>),
    Values(Values),
    /// A parenthesized query used as a set-operation operand
    Nested(Box<Query>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetOperation {
    pub op: SetOperator,
    pub all: bool,
    pub left: QueryBody,
    pub right: QueryBody,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetOperator {
    Union,
    Intersect,
    Except,
}

impl SetOperator {
    pub fn keyword(&self) -> &'static str {
        match self {
            SetOperator::Union => "UNION",
            SetOperator::Intersect => "INTERSECT",
            SetOperator::Except => "EXCEPT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Values {
    pub rows: Vec<Vec<Expression>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct With {
    pub recursive: bool,
    pub ctes: Vec<Cte>,
}

/// A common table expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cte {
    pub alias: Identifier,
    pub columns: Vec<Identifier>,
    pub query: Box<Query>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Select {
    pub distinct: bool,
    pub top: Option<Top>,
    /// The select-list: columns, expressions, aliases, and wildcards.
    pub projection: Vec<Expression>,
    /// `SELECT ... INTO table` target
    pub into: Option<TableRef>,
    pub from: Option<From>,
    pub where_clause: Option<Where>,
    /// Dialect clauses between WHERE and GROUP BY (`CONNECT BY`, `START WITH`)
    #[serde(default)]
    pub extensions: Vec<Extension>,
    pub group_by: Option<GroupBy>,
    pub having: Option<Having>,
    pub qualify: Option<Qualify>,
    #[serde(default)]
    pub named_windows: Vec<NamedWindow>,
}

impl Select {
    pub fn new(projection: Vec<Expression>) -> Self {
        Self {
            distinct: false,
            top: None,
            projection,
            into: None,
            from: None,
            where_clause: None,
            extensions: Vec::new(),
            group_by: None,
            having: None,
            qualify: None,
            named_windows: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct From {
    /// Comma-separated sources
    pub relations: Vec<TableFactor>,
    pub joins: Vec<Join>,
}

/// Something that can appear in FROM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TableFactor {
    Table(TableRef),
    Derived {
        lateral: bool,
        subquery: Box<Query>,
        alias: Option<TableAlias>,
    },
    /// Table-valued function (`FLATTEN(...)`, `UNNEST(...)`, `generate_series(...)`)
    Function {
        lateral: bool,
        function: Box<Function>,
        alias: Option<TableAlias>,
    },
    /// A source followed by a dialect suffix such as `PIVOT (...)` or `MATCH_RECOGNIZE (...)`
    Extended {
        base: Box<TableFactor>,
        extension: Extension,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableAlias {
    pub name: Identifier,
    pub columns: Vec<Identifier>,
}

impl TableAlias {
    pub fn new(name: Identifier) -> Self {
        Self {
            name,
            columns: Vec::new(),
        }
    }
}

/// A reference to a table by (up to) three-part name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRef {
    pub catalog: Option<Identifier>,
    pub schema: Option<Identifier>,
    pub name: Identifier,
    pub alias: Option<TableAlias>,
    /// Table hints such as SQL Server `WITH (NOLOCK)`
    #[serde(default)]
    pub hints: Vec<String>,
    pub span: Span,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            catalog: None,
            schema: None,
            name: Identifier::new(name),
            alias: None,
            hints: Vec::new(),
            span: Span::default(),
        }
    }

    /// Dotted name, unquoted
    pub fn qualified_name(&self) -> String {
        let mut parts = Vec::new();
        if let Some(catalog) = &self.catalog {
            parts.push(catalog.name.as_str());
        }
        if let Some(schema) = &self.schema {
            parts.push(schema.name.as_str());
        }
        parts.push(self.name.name.as_str());
        parts.join(".")
    }

    /// The name other clauses use to refer to this table
    pub fn reference_name(&self) -> &Identifier {
        self.alias.as_ref().map(|a| &a.name).unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    pub kind: JoinKind,
    pub relation: TableFactor,
    pub constraint: JoinConstraint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
    /// SQL Server `CROSS APPLY`
    CrossApply,
    /// SQL Server `OUTER APPLY`
    OuterApply,
}

impl JoinKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            JoinKind::Inner => "JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => "FULL OUTER JOIN",
            JoinKind::Cross => "CROSS JOIN",
            JoinKind::CrossApply => "CROSS APPLY",
            JoinKind::OuterApply => "OUTER APPLY",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JoinConstraint {
    On(Expression),
    Using(Vec<Identifier>),
    Natural,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Where {
    pub condition: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupBy {
    pub expressions: Vec<Expression>,
    /// MySQL `WITH ROLLUP`
    #[serde(default)]
    pub with_rollup: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Having {
    pub condition: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Qualify {
    pub condition: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub expressions: Vec<Ordered>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ordered {
    pub expr: Expression,
    /// `None` when no direction was written
    pub desc: Option<bool>,
    pub nulls_first: Option<bool>,
}

impl Ordered {
    pub fn asc(expr: Expression) -> Self {
        Self {
            expr,
            desc: None,
            nulls_first: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Limit {
    pub count: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    pub count: Expression,
    /// Written as `OFFSET n ROWS`
    pub rows: bool,
}

/// `FETCH {FIRST|NEXT} n {ROW|ROWS} {ONLY|WITH TIES}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fetch {
    pub count: Option<Expression>,
    pub percent: bool,
    pub with_ties: bool,
}

/// SQL Server `TOP (n) [PERCENT] [WITH TIES]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Top {
    pub count: Expression,
    pub percent: bool,
    pub with_ties: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedWindow {
    pub name: Identifier,
    pub spec: WindowSpec,
}

// ---------------------------------------------------------------------------
// DML
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insert {
    pub table: TableRef,
    pub columns: Vec<Identifier>,
    /// `INSERT OVERWRITE`
    pub overwrite: bool,
    pub source: InsertSource,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InsertSource {
    Query(Box<Query>),
    DefaultValues,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub target: Column,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub table: TableRef,
    pub assignments: Vec<Assignment>,
    pub from: Option<From>,
    pub where_clause: Option<Where>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delete {
    pub table: TableRef,
    /// PostgreSQL/Redshift `USING`, SQL Server second `FROM`
    pub using: Option<From>,
    pub where_clause: Option<Where>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Merge {
    pub target: TableRef,
    pub source: TableFactor,
    pub on: Expression,
    pub clauses: Vec<MergeClause>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeClause {
    pub kind: MergeMatchKind,
    pub condition: Option<Expression>,
    pub action: MergeAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergeMatchKind {
    Matched,
    NotMatched,
    NotMatchedBySource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MergeAction {
    Update { assignments: Vec<Assignment> },
    Delete,
    Insert {
        columns: Vec<Identifier>,
        values: Vec<Expression>,
    },
}

// ---------------------------------------------------------------------------
// DDL
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTable {
    pub name: TableRef,
    pub or_replace: bool,
    pub if_not_exists: bool,
    pub temporary: bool,
    /// Dialect table kind words kept for round trips (`TRANSIENT`, `VOLATILE`, `MULTISET`)
    #[serde(default)]
    pub modifiers: Vec<String>,
    pub columns: Vec<ColumnDef>,
    pub constraints: Vec<TableConstraint>,
    pub options: Vec<TableOption>,
    pub like: Option<TableRef>,
    pub as_query: Option<Box<Query>>,
    pub span: Span,
}

impl CreateTable {
    pub fn new(name: TableRef) -> Self {
        Self {
            name,
            or_replace: false,
            if_not_exists: false,
            temporary: false,
            modifiers: Vec::new(),
            columns: Vec::new(),
            constraints: Vec::new(),
            options: Vec::new(),
            like: None,
            as_query: None,
            span: Span::default(),
        }
    }

    pub fn has_modifier(&self, word: &str) -> bool {
        self.modifiers.iter().any(|m| m.eq_ignore_ascii_case(word))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: Identifier,
    pub data_type: DataType,
    pub constraints: Vec<ColumnConstraint>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnConstraint {
    NotNull,
    Null,
    PrimaryKey,
    Unique,
    Default(Expression),
    Check(Expression),
    References {
        table: TableRef,
        columns: Vec<Identifier>,
    },
    Identity(IdentitySpec),
    Comment(String),
    Collate(String),
    /// Dialect column attributes (`FORMAT 'x'`, `COMPRESS`, `ENCODE zstd`, `CHARACTER SET`)
    Raw(Extension),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentitySpec {
    pub style: IdentityStyle,
    pub start: Option<String>,
    pub increment: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityStyle {
    /// `IDENTITY(1,1)` / `IDENTITY`
    Identity,
    /// `AUTO_INCREMENT` / `AUTOINCREMENT`
    AutoIncrement,
    GeneratedAlways,
    GeneratedByDefault,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableConstraint {
    pub name: Option<Identifier>,
    pub kind: TableConstraintKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TableConstraintKind {
    PrimaryKey {
        columns: Vec<Identifier>,
    },
    Unique {
        columns: Vec<Identifier>,
    },
    ForeignKey {
        columns: Vec<Identifier>,
        table: TableRef,
        referenced: Vec<Identifier>,
    },
    Check(Expression),
}

/// Table-level options that follow the column list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TableOption {
    ClusterBy(Vec<Expression>),
    PartitionBy(Vec<Expression>),
    Comment(String),
    /// Databricks `USING DELTA`
    Using(String),
    Location(String),
    /// `key = value` properties (MySQL `ENGINE=InnoDB`, Databricks `TBLPROPERTIES`)
    Property { key: String, value: String },
    /// Teradata `[UNIQUE] PRIMARY INDEX (cols)`
    PrimaryIndex {
        unique: bool,
        columns: Vec<Identifier>,
    },
    /// Redshift `DISTKEY (col)`
    DistKey(Identifier),
    /// Redshift `[COMPOUND|INTERLEAVED] SORTKEY (cols)`
    SortKey {
        style: Option<String>,
        columns: Vec<Identifier>,
    },
    /// Redshift `DISTSTYLE ...`
    DistStyle(String),
    /// Teradata `WITH [NO] DATA`
    WithData(bool),
    Raw(Extension),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateView {
    pub name: TableRef,
    pub or_replace: bool,
    pub if_not_exists: bool,
    pub temporary: bool,
    pub materialized: bool,
    pub columns: Vec<Identifier>,
    pub query: Box<Query>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drop {
    pub kind: ObjectKind,
    pub if_exists: bool,
    pub names: Vec<TableRef>,
    pub cascade: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    Table,
    View,
    MaterializedView,
    Schema,
}

impl ObjectKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            ObjectKind::Table => "TABLE",
            ObjectKind::View => "VIEW",
            ObjectKind::MaterializedView => "MATERIALIZED VIEW",
            ObjectKind::Schema => "SCHEMA",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Truncate {
    pub table: TableRef,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Use {
    /// `CATALOG`, `SCHEMA`, `DATABASE` or `WAREHOUSE` when written
    pub kind: Option<String>,
    pub name: Vec<Identifier>,
    pub span: Span,
}

/// A dialect construct with no neutral representation, kept as raw source text.
///
/// Rules may replace an extension with a neutral node. Extensions that survive
/// a cross-dialect run are reported and emitted verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extension {
    /// Construct label, e.g. `CONNECT BY`, `PIVOT`, `LOCKING`
    pub construct: String,
    pub raw: String,
    pub dialect: DialectType,
    pub span: Span,
    /// Statement governed by a prefix construct (Teradata `LOCKING ... SELECT`)
    #[serde(default)]
    pub body: Option<Box<Statement>>,
}

impl Extension {
    pub fn new(construct: impl Into<String>, raw: impl Into<String>, dialect: DialectType, span: Span) -> Self {
        Self {
            construct: construct.into(),
            raw: raw.into(),
            dialect,
            span,
            body: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    Literal(Literal),
    Boolean(bool),
    Null,
    Column(Column),
    Star(Star),
    Parameter(Parameter),
    Binary(Box<BinaryOp>),
    Unary(Box<UnaryOp>),
    Paren(Box<Expression>),
    Alias(Box<Alias>),
    Function(Box<Function>),
    Window(Box<WindowFunction>),
    Cast(Box<Cast>),
    Case(Box<Case>),
    In(Box<In>),
    Between(Box<Between>),
    Like(Box<Like>),
    IsNull(Box<IsNull>),
    Exists(Box<Exists>),
    Subquery(Box<Query>),
    Interval(Box<Interval>),
    Extract(Box<Extract>),
    Trim(Box<Trim>),
    Array(Vec<Expression>),
    Tuple(Vec<Expression>),
    Subscript(Box<Subscript>),
    JsonAccess(Box<JsonAccess>),
    /// Named function argument (`INPUT => x`, MySQL `SEPARATOR ','`)
    NamedArgument(Box<NamedArgument>),
    /// A type used as a value, e.g. the first argument of SQL Server `CONVERT`
    DataType(DataType),
    Extension(Box<Extension>),
}

impl Expression {
    pub fn column(name: impl Into<String>) -> Self {
        Expression::Column(Column::new(name))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expression::Literal(Literal::String(value.into()))
    }

    pub fn number(value: impl fmt::Display) -> Self {
        Expression::Literal(Literal::Number(value.to_string()))
    }

    pub fn binary(op: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::Binary(Box::new(BinaryOp { op, left, right }))
    }

    pub fn not(expr: Expression) -> Self {
        Expression::Unary(Box::new(UnaryOp {
            op: UnaryOperator::Not,
            expr,
        }))
    }

    pub fn function(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::Function(Box::new(Function::new(name, args)))
    }

    pub fn paren(expr: Expression) -> Self {
        Expression::Paren(Box::new(expr))
    }

    pub fn alias(expr: Expression, alias: Identifier) -> Self {
        Expression::Alias(Box::new(Alias { expr, alias }))
    }

    /// Numeric literal value, when this is an integer literal
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Expression::Literal(Literal::Number(n)) => n.parse().ok(),
            Expression::Paren(inner) => inner.as_integer(),
            _ => None,
        }
    }

    /// String literal value, when this is one
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Expression::Literal(Literal::String(s)) | Expression::Literal(Literal::NationalString(s)) => {
                Some(s.as_str())
            }
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Expression::Null)
    }

    /// Expression with an outer alias removed
    pub fn unaliased(&self) -> &Expression {
        match self {
            Expression::Alias(alias) => &alias.expr,
            other => other,
        }
    }

    /// Uppercase name of the function this expression calls, if any
    pub fn function_name(&self) -> Option<&str> {
        match self {
            Expression::Function(f) => Some(f.name.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Literal {
    String(String),
    NationalString(String),
    HexString(String),
    Number(String),
    /// `DATE '2020-01-01'`
    Date(String),
    Time(String),
    Timestamp(String),
}

/// An identifier, possibly quoted in the source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    pub name: String,
    pub quoted: bool,
}

impl Identifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quoted: false,
        }
    }

    pub fn quoted(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quoted: true,
        }
    }

    /// Lookup key: unquoted identifiers fold to lowercase unless case-sensitive
    pub fn key(&self, case_sensitive: bool) -> String {
        if self.quoted || case_sensitive {
            self.name.clone()
        } else {
            self.name.to_lowercase()
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A column reference such as `c`, `t.c` or `db.t.c`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: Identifier,
    pub qualifier: Vec<Identifier>,
    /// Oracle-style outer join marker `(+)`
    #[serde(default)]
    pub join_mark: bool,
    pub span: Span,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Identifier::new(name),
            qualifier: Vec::new(),
            join_mark: false,
            span: Span::default(),
        }
    }

    pub fn qualified(table: Identifier, name: Identifier) -> Self {
        Self {
            name,
            qualifier: vec![table],
            join_mark: false,
            span: Span::default(),
        }
    }

    /// The table qualifier directly before the column name
    pub fn table(&self) -> Option<&Identifier> {
        self.qualifier.last()
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.qualifier {
            write!(f, "{}.", part)?;
        }
        write!(f, "{}", self.name)
    }
}

/// `*`, `t.*`, optionally with `EXCLUDE`/`EXCEPT` columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Star {
    pub qualifier: Vec<Identifier>,
    pub except: Vec<Identifier>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Name without its marker; the position for `?`
    pub name: String,
    pub kind: ParameterKind,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterKind {
    /// `?`
    Positional,
    /// `$1`
    Numbered,
    /// `:name`
    Colon,
    /// `@name`
    At,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryOp {
    pub op: BinaryOperator,
    pub left: Expression,
    pub right: Expression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    Or,
    And,
    Xor,
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    NullsafeEq,
    IsDistinctFrom,
    IsNotDistinctFrom,
    Concat,
    Plus,
    Minus,
    Multiply,
    Divide,
    IntDivide,
    Modulo,
    Power,
    BitwiseOr,
    BitwiseAnd,
    BitwiseXor,
    ShiftLeft,
    ShiftRight,
}

impl BinaryOperator {
    pub const ALL: [BinaryOperator; 25] = [
        BinaryOperator::Or,
        BinaryOperator::And,
        BinaryOperator::Xor,
        BinaryOperator::Eq,
        BinaryOperator::Neq,
        BinaryOperator::Lt,
        BinaryOperator::Lte,
        BinaryOperator::Gt,
        BinaryOperator::Gte,
        BinaryOperator::NullsafeEq,
        BinaryOperator::IsDistinctFrom,
        BinaryOperator::IsNotDistinctFrom,
        BinaryOperator::Concat,
        BinaryOperator::Plus,
        BinaryOperator::Minus,
        BinaryOperator::Multiply,
        BinaryOperator::Divide,
        BinaryOperator::IntDivide,
        BinaryOperator::Modulo,
        BinaryOperator::Power,
        BinaryOperator::BitwiseOr,
        BinaryOperator::BitwiseAnd,
        BinaryOperator::BitwiseXor,
        BinaryOperator::ShiftLeft,
        BinaryOperator::ShiftRight,
    ];

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Eq
                | BinaryOperator::Neq
                | BinaryOperator::Lt
                | BinaryOperator::Lte
                | BinaryOperator::Gt
                | BinaryOperator::Gte
                | BinaryOperator::NullsafeEq
                | BinaryOperator::IsDistinctFrom
                | BinaryOperator::IsNotDistinctFrom
        )
    }

    /// `a op (b op c)` equals `(a op b) op c`
    pub fn is_associative(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Or
                | BinaryOperator::And
                | BinaryOperator::Plus
                | BinaryOperator::Multiply
                | BinaryOperator::Concat
                | BinaryOperator::BitwiseOr
                | BinaryOperator::BitwiseAnd
                | BinaryOperator::BitwiseXor
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnaryOp {
    pub op: UnaryOperator,
    pub expr: Expression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOperator {
    Not,
    Minus,
    Plus,
    BitwiseNot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alias {
    pub expr: Expression,
    pub alias: Identifier,
}

/// A function call. Names of unquoted functions are stored uppercase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub args: Vec<Expression>,
    pub distinct: bool,
    /// `agg(x) FILTER (WHERE ...)`
    pub filter: Option<Expression>,
    /// `LISTAGG(x) WITHIN GROUP (ORDER BY ...)`
    #[serde(default)]
    pub within_group: Vec<Ordered>,
    /// `ORDER BY` inside the argument list (`STRING_AGG(x, ',' ORDER BY y)`)
    #[serde(default)]
    pub order_by: Vec<Ordered>,
    /// `IGNORE NULLS` / `RESPECT NULLS` written inside the parentheses
    pub null_treatment: Option<NullTreatment>,
    pub span: Span,
}

impl Function {
    pub fn new(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Self {
            name: name.into(),
            args,
            distinct: false,
            filter: None,
            within_group: Vec::new(),
            order_by: Vec::new(),
            null_treatment: None,
            span: Span::default(),
        }
    }

    /// Same call with another name and argument list, keeping modifiers and span
    pub fn renamed(mut self, name: impl Into<String>, args: Vec<Expression>) -> Self {
        self.name = name.into();
        self.args = args;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedArgument {
    pub name: Identifier,
    pub value: Expression,
    pub style: NamedArgStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NamedArgStyle {
    /// `name => value`
    Arrow,
    /// `NAME value` after the positional arguments
    Keyword,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NullTreatment {
    IgnoreNulls,
    RespectNulls,
}

/// A function evaluated over a window: `f(...) [IGNORE NULLS] OVER (...)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowFunction {
    pub function: Function,
    pub null_treatment: Option<NullTreatment>,
    pub over: WindowSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSpec {
    /// Named window reference (`OVER w` or `OVER (w ORDER BY ...)`)
    pub name: Option<Identifier>,
    pub partition_by: Vec<Expression>,
    pub order_by: Vec<Ordered>,
    pub frame: Option<WindowFrame>,
}

impl WindowSpec {
    pub fn empty() -> Self {
        Self {
            name: None,
            partition_by: Vec::new(),
            order_by: Vec::new(),
            frame: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowFrame {
    pub units: FrameUnits,
    pub start: FrameBound,
    pub end: Option<FrameBound>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameUnits {
    Rows,
    Range,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FrameBound {
    UnboundedPreceding,
    Preceding(Expression),
    CurrentRow,
    Following(Expression),
    UnboundedFollowing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CastKind {
    Cast,
    TryCast,
    /// BigQuery `SAFE_CAST`
    SafeCast,
    /// PostgreSQL-style `x::type`
    DoubleColon,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cast {
    pub expr: Expression,
    pub to: DataType,
    pub kind: CastKind,
    /// Teradata `CAST(x AS DATE FORMAT 'YYYY-MM-DD')`
    pub format: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub operand: Option<Expression>,
    pub whens: Vec<(Expression, Expression)>,
    pub else_result: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct In {
    pub expr: Expression,
    pub target: InTarget,
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum InTarget {
    List(Vec<Expression>),
    Subquery(Box<Query>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Between {
    pub expr: Expression,
    pub low: Expression,
    pub high: Expression,
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Like {
    pub kind: LikeKind,
    pub expr: Expression,
    pub pattern: Expression,
    pub escape: Option<Expression>,
    pub negated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LikeKind {
    Like,
    ILike,
    RLike,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsNull {
    pub expr: Expression,
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exists {
    pub query: Box<Query>,
    pub negated: bool,
}

/// `INTERVAL '1' DAY`, `INTERVAL '1 day'`, `INTERVAL 1 DAY`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub value: Expression,
    /// Uppercase unit keyword
    pub unit: Option<String>,
    /// `TO` unit of a range qualifier (`DAY TO SECOND`)
    pub to_unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extract {
    /// Uppercase field name
    pub field: String,
    pub expr: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trim {
    pub position: Option<TrimPosition>,
    pub characters: Option<Expression>,
    pub expr: Expression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrimPosition {
    Both,
    Leading,
    Trailing,
}

impl TrimPosition {
    pub fn keyword(&self) -> &'static str {
        match self {
            TrimPosition::Both => "BOTH",
            TrimPosition::Leading => "LEADING",
            TrimPosition::Trailing => "TRAILING",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscript {
    pub expr: Expression,
    pub index: Expression,
}

/// Semi-structured field access
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonAccess {
    pub expr: Expression,
    pub kind: JsonAccessKind,
    /// Path text for `:` access, key/index expression for arrows
    pub path: Expression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JsonAccessKind {
    /// Snowflake/Databricks `col:a.b[0]`
    Colon,
    /// PostgreSQL/MySQL `->`
    Arrow,
    /// PostgreSQL/MySQL `->>`
    DoubleArrow,
}

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    TinyInt { unsigned: bool },
    SmallInt { unsigned: bool },
    Int { unsigned: bool },
    BigInt { unsigned: bool },
    Decimal {
        precision: Option<u32>,
        scale: Option<u32>,
    },
    Float { precision: Option<u32> },
    Real,
    Double,
    /// MySQL `FLOAT(M, D)` and `DOUBLE(M, D)`: stored values are rounded to `D` decimals
    ScaledFloat { double: bool, precision: u32, scale: u32 },
    Money,
    SmallMoney,
    Char { length: Option<u32> },
    NChar { length: Option<u32> },
    VarChar { length: Option<CharLength> },
    NVarChar { length: Option<CharLength> },
    Text,
    String,
    Clob,
    Binary { length: Option<u32> },
    VarBinary { length: Option<CharLength> },
    Blob,
    Date,
    Time {
        precision: Option<u32>,
        with_time_zone: bool,
    },
    Timestamp {
        precision: Option<u32>,
        zone: TimestampZone,
    },
    /// SQL Server / MySQL date-time family
    DateTime {
        kind: DateTimeKind,
        precision: Option<u32>,
    },
    Interval,
    Json,
    Variant,
    Object,
    Array(Option<Box<DataType>>),
    Map(Box<DataType>, Box<DataType>),
    Struct(Vec<StructField>),
    Uuid,
    Xml,
    /// A type name the parser does not model, with its raw arguments
    Custom { name: String, args: Vec<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CharLength {
    Fixed(u32),
    /// `VARCHAR(MAX)`
    Max,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampZone {
    /// Wall-clock timestamp (`TIMESTAMP`, `TIMESTAMP_NTZ`)
    Without,
    /// Timestamp carrying its own offset (`TIMESTAMP WITH TIME ZONE`, `TIMESTAMP_TZ`)
    With,
    /// Instant rendered in the session zone (`TIMESTAMP_LTZ`, `WITH LOCAL TIME ZONE`)
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateTimeKind {
    DateTime,
    DateTime2,
    SmallDateTime,
    DateTimeOffset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructField {
    pub name: Identifier,
    pub data_type: DataType,
}

impl DataType {
    /// Uppercase base name, used in diagnostics
    pub fn name(&self) -> String {
        match self {
            DataType::Boolean => "BOOLEAN".into(),
            DataType::TinyInt { .. } => "TINYINT".into(),
            DataType::SmallInt { .. } => "SMALLINT".into(),
            DataType::Int { .. } => "INT".into(),
            DataType::BigInt { .. } => "BIGINT".into(),
            DataType::Decimal { .. } => "DECIMAL".into(),
            DataType::Float { .. } => "FLOAT".into(),
            DataType::Real => "REAL".into(),
            DataType::Double => "DOUBLE".into(),
            DataType::ScaledFloat { double: true, .. } => "DOUBLE".into(),
            DataType::ScaledFloat { double: false, .. } => "FLOAT".into(),
            DataType::Money => "MONEY".into(),
            DataType::SmallMoney => "SMALLMONEY".into(),
            DataType::Char { .. } => "CHAR".into(),
            DataType::NChar { .. } => "NCHAR".into(),
            DataType::VarChar { .. } => "VARCHAR".into(),
            DataType::NVarChar { .. } => "NVARCHAR".into(),
            DataType::Text => "TEXT".into(),
            DataType::String => "STRING".into(),
            DataType::Clob => "CLOB".into(),
            DataType::Binary { .. } => "BINARY".into(),
            DataType::VarBinary { .. } => "VARBINARY".into(),
            DataType::Blob => "BLOB".into(),
            DataType::Date => "DATE".into(),
            DataType::Time { .. } => "TIME".into(),
            DataType::Timestamp { zone, .. } => match zone {
                TimestampZone::Without => "TIMESTAMP".into(),
                TimestampZone::With => "TIMESTAMP WITH TIME ZONE".into(),
                TimestampZone::Local => "TIMESTAMP WITH LOCAL TIME ZONE".into(),
            },
            DataType::DateTime { kind, .. } => match kind {
                DateTimeKind::DateTime => "DATETIME".into(),
                DateTimeKind::DateTime2 => "DATETIME2".into(),
                DateTimeKind::SmallDateTime => "SMALLDATETIME".into(),
                DateTimeKind::DateTimeOffset => "DATETIMEOFFSET".into(),
            },
            DataType::Interval => "INTERVAL".into(),
            DataType::Json => "JSON".into(),
            DataType::Variant => "VARIANT".into(),
            DataType::Object => "OBJECT".into(),
            DataType::Array(_) => "ARRAY".into(),
            DataType::Map(_, _) => "MAP".into(),
            DataType::Struct(_) => "STRUCT".into(),
            DataType::Uuid => "UUID".into(),
            DataType::Xml => "XML".into(),
            DataType::Custom { name, .. } => name.to_uppercase(),
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            DataType::TinyInt { .. } | DataType::SmallInt { .. } | DataType::Int { .. } | DataType::BigInt { .. }
        )
    }

    pub fn is_string(&self) -> bool {
        matches!(
            self,
            DataType::Char { .. }
                | DataType::NChar { .. }
                | DataType::VarChar { .. }
                | DataType::NVarChar { .. }
                | DataType::Text
                | DataType::String
                | DataType::Clob
        )
    }
}
