//! Statement-level rewrites: table DDL, DML forms Databricks lacks, session statements

use super::{DialectMatch, Finding, RewriteRule, RuleContext, RuleOutcome};
use crate::dialects::DialectType;
use crate::expressions::{
    Column, ColumnConstraint, CreateTable, CreateView, DataType, Delete, Expression, From, Identifier, IdentitySpec,
    IdentityStyle, JoinConstraint, JoinKind, Limit, Merge, MergeAction, MergeClause, MergeMatchKind, Statement,
    TableConstraintKind, TableFactor, TableOption, TableRef, Update, Use,
};
use crate::tokens::Span;
use crate::traversal::and_all;

/// Databricks clusters on at most this many columns
const MAX_CLUSTER_COLUMNS: usize = 4;

pub fn rules() -> Vec<RewriteRule> {
    let foreign = DialectMatch::Foreign;
    vec![
        RewriteRule::statement("select_into_to_ctas", foreign, 100, select_into),
        RewriteRule::statement("unwrap_locking", DialectMatch::Source(DialectType::Teradata), 95, locking),
        RewriteRule::statement("temporary_tables", foreign, 90, temporary_tables),
        RewriteRule::statement("use_namespace", foreign, 85, use_namespace),
        RewriteRule::statement("dml_join_to_merge", foreign, 80, dml_join_to_merge),
        RewriteRule::statement("table_modifiers", foreign, 75, table_modifiers),
        RewriteRule::statement("table_options", foreign, 70, table_options),
        RewriteRule::statement("column_attributes", foreign, 65, column_attributes),
    ]
}

fn create_table(statement: &Statement) -> Option<&CreateTable> {
    match statement {
        Statement::CreateTable(create) => Some(create),
        _ => None,
    }
}

/// `SELECT ... INTO t FROM ...` => `CREATE TABLE t AS SELECT ...`
fn select_into(statement: &Statement, _ctx: &RuleContext<'_>) -> RuleOutcome<Statement> {
    let Statement::Query(query) = statement else {
        return RuleOutcome::Unchanged;
    };
    if query.select().and_then(|s| s.into.as_ref()).is_none() {
        return RuleOutcome::Unchanged;
    }
    let mut query = query.clone();
    let Some(name) = query.select_mut().and_then(|s| s.into.take()) else {
        return RuleOutcome::Unchanged;
    };
    let mut create = CreateTable::new(name);
    create.span = query.span;
    create.as_query = Some(query);
    RuleOutcome::Replaced(Statement::CreateTable(Box::new(create)))
}

/// Teradata `LOCKING ROW FOR ACCESS` prefixes
fn locking(statement: &Statement, _ctx: &RuleContext<'_>) -> RuleOutcome<Statement> {
    let Statement::Extension(extension) = statement else {
        return RuleOutcome::Unchanged;
    };
    let Some(body) = extension.body.as_ref().filter(|_| extension.construct == "LOCKING") else {
        return RuleOutcome::Unchanged;
    };
    RuleOutcome::risk(
        body.as_ref().clone(),
        Finding::info("LOCKING_DROPPED", format!("`{}` dropped; Delta reads never block writers", extension.raw))
            .at(extension.span),
    )
}

fn is_temporary(create: &CreateTable) -> bool {
    create.temporary
        || create.has_modifier("VOLATILE")
        || create.has_modifier("GLOBAL")
        || create.has_modifier("LOCAL")
        || (!create.name.name.quoted && create.name.name.name.starts_with('#'))
}

/// Volatile and temporary tables
fn temporary_tables(statement: &Statement, _ctx: &RuleContext<'_>) -> RuleOutcome<Statement> {
    let Some(create) = create_table(statement).filter(|c| is_temporary(c)) else {
        return RuleOutcome::Unchanged;
    };
    let name = create.name.qualified_name();
    if let Some(query) = &create.as_query {
        let view = CreateView {
            name: create.name.clone(),
            or_replace: true,
            if_not_exists: false,
            temporary: true,
            materialized: false,
            columns: create.columns.iter().map(|c| c.name.clone()).collect(),
            query: query.clone(),
            span: create.span,
        };
        return RuleOutcome::risk(
            Statement::CreateView(Box::new(view)),
            Finding::info("TEMP_TABLE_AS_VIEW", format!("temporary table {name} created as a temporary view"))
                .with_hint("the view is evaluated on every reference; cache it if it is read often"),
        );
    }
    let mut create = create.clone();
    create.temporary = false;
    create
        .modifiers
        .retain(|m| !["VOLATILE", "GLOBAL", "LOCAL"].iter().any(|w| m.eq_ignore_ascii_case(w)));
    RuleOutcome::risk(
        Statement::CreateTable(Box::new(create)),
        Finding::risk("TEMP_TABLE", format!("temporary table {name} becomes a permanent Delta table"))
            .with_hint("drop it at the end of the job or use a temporary view"),
    )
}

/// `USE DATABASE x` and SQL Server `USE x`
fn use_namespace(statement: &Statement, ctx: &RuleContext<'_>) -> RuleOutcome<Statement> {
    let Statement::Use(use_stmt) = statement else {
        return RuleOutcome::Unchanged;
    };
    let catalog_level = ctx.source.is_tsql_family() || ctx.source == DialectType::Snowflake;
    let kind = match use_stmt.kind.as_deref() {
        Some("WAREHOUSE") => {
            return RuleOutcome::Unmappable(
                Finding::unmappable("UNSUPPORTED_STATEMENT", "USE WAREHOUSE has no Databricks equivalent")
                    .with_hint("pick the SQL warehouse in the job or connection settings"),
            )
        }
        Some("DATABASE") if catalog_level => "CATALOG",
        Some("DATABASE") => "SCHEMA",
        None if ctx.source.is_tsql_family() && use_stmt.name.len() == 1 => "CATALOG",
        _ => return RuleOutcome::Unchanged,
    };
    let name = use_stmt.name.iter().map(|i| i.name.as_str()).collect::<Vec<_>>().join(".");
    RuleOutcome::risk(
        Statement::Use(Box::new(Use {
            kind: Some(kind.to_string()),
            ..use_stmt.as_ref().clone()
        })),
        Finding::info("USE_NAMESPACE", format!("database {name} is addressed as a Databricks {}", kind.to_lowercase())),
    )
}

/// The relation `target` names inside a FROM list, and what else FROM joins to it
fn split_target(target: &TableRef, from: &From) -> Option<(TableRef, TableFactor, Option<Expression>)> {
    let names_target = |factor: &TableFactor| match factor {
        TableFactor::Table(t) => {
            t.reference_name().name.eq_ignore_ascii_case(&target.name.name)
                || (target.alias.is_none() && t.name.name.eq_ignore_ascii_case(&target.name.name))
        }
        _ => false,
    };
    match (from.relations.as_slice(), from.joins.as_slice()) {
        // UPDATE t SET ... FROM s WHERE ...
        ([source], []) if !names_target(source) => Some((target.clone(), source.clone(), None)),
        // UPDATE t SET ... FROM t JOIN s ON ...
        ([TableFactor::Table(first)], [join]) if names_target(&from.relations[0]) => {
            let on = match (&join.kind, &join.constraint) {
                (JoinKind::Inner, JoinConstraint::On(on)) => Some(on.clone()),
                (JoinKind::Cross, JoinConstraint::None) => None,
                _ => return None,
            };
            Some((first.clone(), join.relation.clone(), on))
        }
        _ => None,
    }
}

fn merge_condition(on: Option<Expression>, where_clause: Option<Expression>) -> Expression {
    and_all(on.into_iter().chain(where_clause).collect()).unwrap_or(Expression::Boolean(true))
}

fn duplicate_match_risk(kind: &str) -> Finding {
    Finding::risk(
        "MERGE_DUPLICATE_MATCH",
        format!("{kind} with a join rewritten as MERGE; MERGE fails when several source rows match one target row"),
    )
    .with_hint("make the source unique on the join key")
}

fn unsupported_join(kind: &str) -> RuleOutcome<Statement> {
    RuleOutcome::Unmappable(
        Finding::unmappable("UNSUPPORTED_DML_JOIN", format!("{kind} joining more than one source table"))
            .with_hint("join the sources in a subquery and MERGE from it"),
    )
}

/// `UPDATE ... FROM` and `DELETE ... USING`
fn dml_join_to_merge(statement: &Statement, _ctx: &RuleContext<'_>) -> RuleOutcome<Statement> {
    match statement {
        Statement::Update(update) => match &update.from {
            Some(from) => update_to_merge(update, from),
            None => RuleOutcome::Unchanged,
        },
        Statement::Delete(delete) => match &delete.using {
            Some(using) => delete_to_merge(delete, using),
            None => RuleOutcome::Unchanged,
        },
        _ => RuleOutcome::Unchanged,
    }
}

fn update_to_merge(update: &Update, from: &From) -> RuleOutcome<Statement> {
    let Some((target, source, on)) = split_target(&update.table, from) else {
        return unsupported_join("UPDATE");
    };
    let on = merge_condition(on, update.where_clause.as_ref().map(|w| w.condition.clone()));
    let merge = Merge {
        target,
        source,
        on,
        clauses: vec![MergeClause {
            kind: MergeMatchKind::Matched,
            condition: None,
            action: MergeAction::Update {
                assignments: update.assignments.clone(),
            },
        }],
        span: update.span,
    };
    RuleOutcome::risk(Statement::Merge(Box::new(merge)), duplicate_match_risk("UPDATE"))
}

fn delete_to_merge(delete: &Delete, using: &From) -> RuleOutcome<Statement> {
    let Some((target, source, on)) = split_target(&delete.table, using) else {
        return unsupported_join("DELETE");
    };
    let on = merge_condition(on, delete.where_clause.as_ref().map(|w| w.condition.clone()));
    let merge = Merge {
        target,
        source,
        on,
        clauses: vec![MergeClause {
            kind: MergeMatchKind::Matched,
            condition: None,
            action: MergeAction::Delete,
        }],
        span: delete.span,
    };
    RuleOutcome::risk(Statement::Merge(Box::new(merge)), duplicate_match_risk("DELETE"))
}

/// `SET`, `MULTISET`, `TRANSIENT` and other table kind words
fn table_modifiers(statement: &Statement, _ctx: &RuleContext<'_>) -> RuleOutcome<Statement> {
    let Some(create) = create_table(statement).filter(|c| !c.modifiers.is_empty()) else {
        return RuleOutcome::Unchanged;
    };
    let name = create.name.qualified_name();
    let findings = create
        .modifiers
        .iter()
        .filter_map(|modifier| match modifier.to_uppercase().as_str() {
            "MULTISET" => None,
            "SET" => Some(
                Finding::risk("SET_TABLE_DUPLICATES", format!("SET table {name} rejected duplicate rows; Delta keeps them"))
                    .with_hint("deduplicate on write, e.g. with MERGE or SELECT DISTINCT"),
            ),
            other => Some(Finding::info("TABLE_MODIFIER_DROPPED", format!("{other} dropped from table {name}"))),
        })
        .collect();
    let mut create = create.clone();
    create.modifiers.clear();
    RuleOutcome::with_findings(Statement::CreateTable(Box::new(create)), findings)
}

fn column_ref(name: Identifier) -> Expression {
    Expression::Column(Column {
        name,
        qualifier: Vec::new(),
        join_mark: false,
        span: Span::default(),
    })
}

fn push_cluster_columns(columns: &mut Vec<Identifier>, add: &[Identifier]) {
    for column in add {
        if !columns.iter().any(|c| c.name.eq_ignore_ascii_case(&column.name)) {
            columns.push(column.clone());
        }
    }
}

/// Distribution, index and storage options
fn table_options(statement: &Statement, ctx: &RuleContext<'_>) -> RuleOutcome<Statement> {
    let Some(create) = create_table(statement) else {
        return RuleOutcome::Unchanged;
    };
    let keep = |option: &TableOption| match option {
        TableOption::Property { .. } => ctx.source == DialectType::Hive,
        TableOption::ClusterBy(_)
        | TableOption::PartitionBy(_)
        | TableOption::Comment(_)
        | TableOption::Using(_)
        | TableOption::Location(_) => true,
        _ => false,
    };
    if create.options.iter().all(keep) {
        return RuleOutcome::Unchanged;
    }

    let name = create.name.qualified_name();
    let mut create = create.clone();
    let mut findings = Vec::new();
    let mut cluster: Vec<Identifier> = Vec::new();
    let mut kept = Vec::new();
    for option in std::mem::take(&mut create.options) {
        match option {
            _ if keep(&option) => kept.push(option),
            TableOption::PrimaryIndex { unique, columns } => {
                push_cluster_columns(&mut cluster, &columns);
                if unique {
                    findings.push(
                        Finding::risk("UNIQUENESS_NOT_ENFORCED", format!("UNIQUE PRIMARY INDEX on {name} is not enforced"))
                            .with_hint("check for duplicates in the load job"),
                    );
                }
            }
            TableOption::DistKey(column) => push_cluster_columns(&mut cluster, std::slice::from_ref(&column)),
            TableOption::SortKey { columns, .. } => push_cluster_columns(&mut cluster, &columns),
            TableOption::WithData(with_data) => {
                if !with_data {
                    if let Some(query) = &mut create.as_query {
                        query.limit = Some(Limit {
                            count: Expression::number(0),
                        });
                    }
                    findings.push(Finding::info("WITH_NO_DATA", "WITH NO DATA rewritten as LIMIT 0"));
                }
            }
            TableOption::DistStyle(style) => {
                findings.push(Finding::info("TABLE_OPTION_DROPPED", format!("DISTSTYLE {style} dropped")));
            }
            TableOption::Property { key, value } => {
                findings.push(Finding::info("TABLE_OPTION_DROPPED", format!("{key}={value} dropped")));
            }
            TableOption::Raw(extension) => {
                findings.push(
                    Finding::info("TABLE_OPTION_DROPPED", format!("`{}` dropped", extension.raw)).at(extension.span),
                );
            }
            other => kept.push(other),
        }
    }

    if !cluster.is_empty() {
        let has_cluster = kept.iter().any(|o| matches!(o, TableOption::ClusterBy(_)));
        let partitioned = kept.iter().any(|o| matches!(o, TableOption::PartitionBy(_)));
        if !has_cluster && !partitioned {
            if cluster.len() > MAX_CLUSTER_COLUMNS {
                findings.push(Finding::info(
                    "CLUSTER_COLUMNS_TRUNCATED",
                    format!("only the first {MAX_CLUSTER_COLUMNS} of {} distribution columns are clustered", cluster.len()),
                ));
                cluster.truncate(MAX_CLUSTER_COLUMNS);
            }
            let names = cluster.iter().map(|c| c.name.as_str()).collect::<Vec<_>>().join(", ");
            findings.push(Finding::info("CLUSTER_BY_FROM_INDEX", format!("distribution on ({names}) became CLUSTER BY")));
            kept.push(TableOption::ClusterBy(cluster.into_iter().map(column_ref).collect()));
        }
    }
    create.options = kept;
    RuleOutcome::with_findings(Statement::CreateTable(Box::new(create)), findings)
}

/// Column attributes, identity columns and constraints
fn column_attributes(statement: &Statement, _ctx: &RuleContext<'_>) -> RuleOutcome<Statement> {
    let Some(create) = create_table(statement) else {
        return RuleOutcome::Unchanged;
    };
    let mut create = create.clone();
    let mut findings = Vec::new();
    let mut changed = false;

    let mut primary_key: Vec<String> = Vec::new();
    create.constraints.retain(|constraint| match &constraint.kind {
        TableConstraintKind::PrimaryKey { columns } => {
            primary_key.extend(columns.iter().map(|c| c.name.to_lowercase()));
            findings.push(Finding::info(
                "CONSTRAINT_INFORMATIONAL",
                "PRIMARY KEY is informational in Databricks and not enforced",
            ));
            true
        }
        TableConstraintKind::ForeignKey { .. } => {
            findings.push(Finding::info(
                "CONSTRAINT_INFORMATIONAL",
                "FOREIGN KEY is informational in Databricks and not enforced",
            ));
            true
        }
        TableConstraintKind::Unique { columns } => {
            let names = columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>().join(", ");
            findings.push(Finding::risk("UNIQUE_DROPPED", format!("UNIQUE ({names}) dropped")));
            changed = true;
            false
        }
        TableConstraintKind::Check(_) => {
            findings.push(
                Finding::risk("CHECK_DROPPED", "table CHECK constraint dropped")
                    .with_hint("add it back with ALTER TABLE ... ADD CONSTRAINT ... CHECK"),
            );
            changed = true;
            false
        }
    });

    for column in &mut create.columns {
        let name = column.name.name.clone();
        let mut is_key = primary_key.contains(&name.to_lowercase());
        let mut attributes = Vec::with_capacity(column.constraints.len());
        for constraint in std::mem::take(&mut column.constraints) {
            match constraint {
                ColumnConstraint::Raw(extension) => {
                    changed = true;
                    let finding = match extension.construct.as_str() {
                        "NOT CASESPECIFIC" => Finding::risk(
                            "CASE_INSENSITIVE_COLUMN",
                            format!("column `{name}` compared case-insensitively in the source"),
                        )
                        .with_hint("compare with LOWER() or a case-insensitive collation"),
                        "ON UPDATE" => Finding::risk(
                            "ON_UPDATE_DROPPED",
                            format!("`{}` on column `{name}` is not maintained", extension.raw),
                        ),
                        _ => Finding::info("COLUMN_ATTRIBUTE_DROPPED", format!("`{}` on column `{name}` dropped", extension.raw)),
                    };
                    findings.push(finding.at(extension.span));
                }
                ColumnConstraint::Collate(collation) => {
                    changed = true;
                    findings.push(Finding::risk(
                        "COLLATION_DROPPED",
                        format!("collation {collation} on column `{name}` dropped"),
                    ));
                }
                ColumnConstraint::Null => changed = true,
                ColumnConstraint::Unique => {
                    changed = true;
                    findings.push(Finding::risk("UNIQUE_DROPPED", format!("UNIQUE on column `{name}` dropped")));
                }
                ColumnConstraint::Check(_) => {
                    changed = true;
                    findings.push(
                        Finding::risk("CHECK_DROPPED", format!("CHECK on column `{name}` dropped"))
                            .with_hint("add it back with ALTER TABLE ... ADD CONSTRAINT ... CHECK"),
                    );
                }
                ColumnConstraint::Identity(spec) if spec.style != IdentityStyle::GeneratedByDefault
                    && spec.style != IdentityStyle::GeneratedAlways =>
                {
                    changed = true;
                    if !matches!(column.data_type, DataType::BigInt { .. }) {
                        column.data_type = DataType::BigInt { unsigned: false };
                    }
                    findings.push(Finding::info(
                        "IDENTITY_COLUMN",
                        format!("identity column `{name}` is GENERATED BY DEFAULT AS IDENTITY on BIGINT"),
                    ));
                    attributes.push(ColumnConstraint::Identity(IdentitySpec {
                        style: IdentityStyle::GeneratedByDefault,
                        ..spec
                    }));
                }
                ColumnConstraint::PrimaryKey => {
                    is_key = true;
                    findings.push(Finding::info(
                        "CONSTRAINT_INFORMATIONAL",
                        format!("PRIMARY KEY on `{name}` is informational in Databricks and not enforced"),
                    ));
                    attributes.push(ColumnConstraint::PrimaryKey);
                }
                other => attributes.push(other),
            }
        }
        if is_key && !attributes.contains(&ColumnConstraint::NotNull) {
            changed = true;
            let at = attributes
                .iter()
                .position(|c| *c == ColumnConstraint::PrimaryKey)
                .unwrap_or(attributes.len());
            attributes.insert(at, ColumnConstraint::NotNull);
        }
        column.constraints = attributes;
    }

    if !changed && findings.is_empty() {
        return RuleOutcome::Unchanged;
    }
    RuleOutcome::with_findings(Statement::CreateTable(Box::new(create)), findings)
}

#[cfg(test)]
mod tests {
    use crate::dialects::DialectType;
    use crate::rules::test_support::{codes, convert, sql};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_select_into_becomes_ctas() {
        assert_eq!(
            sql(DialectType::SqlServer, "SELECT id, name INTO archive FROM customers WHERE active = 0"),
            "CREATE TABLE archive AS SELECT id, name FROM customers WHERE active = 0"
        );
    }

    #[test]
    fn test_tsql_temp_table_as_view() {
        let result = convert(DialectType::SqlServer, "SELECT id INTO #recent FROM orders");
        assert_eq!(result.sql, "CREATE OR REPLACE TEMPORARY VIEW recent AS SELECT id FROM orders");
        assert_eq!(codes(&result), vec!["TEMP_TABLE_AS_VIEW", "TEMP_TABLE_RENAMED"]);
    }

    #[test]
    fn test_teradata_volatile_multiset_table() {
        let result = convert(
            DialectType::Teradata,
            "CREATE MULTISET VOLATILE TABLE t (id INTEGER NOT NULL, d DATE FORMAT 'YYYY-MM-DD') PRIMARY INDEX (id) ON COMMIT PRESERVE ROWS",
        );
        assert_eq!(result.sql, "CREATE TABLE t (id INT NOT NULL, d DATE) CLUSTER BY (id)");
        let codes = codes(&result);
        assert!(codes.contains(&"TEMP_TABLE".to_string()));
        assert!(codes.contains(&"CLUSTER_BY_FROM_INDEX".to_string()));
        assert!(codes.contains(&"COLUMN_ATTRIBUTE_DROPPED".to_string()));
    }

    #[test]
    fn test_locking_prefix_is_removed() {
        let result = convert(DialectType::Teradata, "LOCKING ROW FOR ACCESS SEL a FROM t");
        assert_eq!(result.sql, "SELECT a FROM t");
        assert_eq!(codes(&result), vec!["LOCKING_DROPPED"]);
    }

    #[test]
    fn test_redshift_distribution_keys() {
        let result = convert(
            DialectType::Redshift,
            "CREATE TABLE sales (id INT, region VARCHAR(10), sold DATE) DISTSTYLE KEY DISTKEY (region) SORTKEY (sold, id)",
        );
        assert_eq!(
            result.sql,
            "CREATE TABLE sales (id INT, region STRING, sold DATE) CLUSTER BY (region, sold, id)"
        );
    }

    #[test]
    fn test_identity_and_keys() {
        assert_eq!(
            sql(
                DialectType::SqlServer,
                "CREATE TABLE t (id INT IDENTITY(1,1) PRIMARY KEY, code VARCHAR(5) UNIQUE)"
            ),
            "CREATE TABLE t (id BIGINT GENERATED BY DEFAULT AS IDENTITY (START WITH 1 INCREMENT BY 1) NOT NULL PRIMARY KEY, code STRING)"
        );
    }

    #[test]
    fn test_update_from_becomes_merge() {
        let result = convert(
            DialectType::PostgreSQL,
            "UPDATE accounts SET balance = s.balance FROM staging s WHERE accounts.id = s.id",
        );
        assert_eq!(
            result.sql,
            "MERGE INTO accounts USING staging AS s ON accounts.id = s.id WHEN MATCHED THEN UPDATE SET balance = s.balance"
        );
        assert_eq!(codes(&result), vec!["MERGE_DUPLICATE_MATCH"]);
    }

    #[test]
    fn test_use_database() {
        assert_eq!(sql(DialectType::SqlServer, "USE sales"), "USE CATALOG sales");
        assert_eq!(sql(DialectType::Snowflake, "USE DATABASE sales"), "USE CATALOG sales");
        let result = convert(DialectType::Snowflake, "USE WAREHOUSE etl_wh");
        assert_eq!(codes(&result), vec!["UNSUPPORTED_STATEMENT"]);
    }
}
