//! Table name qualification, temporary names and ambiguous references

use super::{DialectMatch, Finding, RewriteRule, RuleContext, RuleOutcome};
use crate::dialects::DialectType;
use crate::expressions::{Statement, TableRef};
use crate::scope::{ambiguous_columns, qualify_tables};
use crate::traversal::VisitorMut;

pub fn rules() -> Vec<RewriteRule> {
    use DialectMatch::{Any, Foreign, Sources};
    vec![
        RewriteRule::statement("strip_temp_prefix", Sources(&[DialectType::SqlServer, DialectType::Synapse]), 20, temp_names),
        RewriteRule::statement("qualify_tables", Any, 10, qualify),
        RewriteRule::statement("ambiguous_columns", Foreign, 5, ambiguous),
    ]
}

/// Prefix unqualified table names with the configured catalog and schema
fn qualify(statement: &Statement, ctx: &RuleContext<'_>) -> RuleOutcome<Statement> {
    let catalog = ctx.options.default_catalog.as_deref();
    let schema = ctx.options.default_schema.as_deref();
    if catalog.is_none() && schema.is_none() {
        return RuleOutcome::Unchanged;
    }
    let mut statement = statement.clone();
    match qualify_tables(&mut statement, catalog, schema, ctx.options.case_sensitive) {
        0 => RuleOutcome::Unchanged,
        _ => RuleOutcome::Replaced(statement),
    }
}

/// Columns that could come from more than one source
fn ambiguous(statement: &Statement, ctx: &RuleContext<'_>) -> RuleOutcome<Statement> {
    let mut scratch = statement.clone();
    let findings: Vec<Finding> = ambiguous_columns(&mut scratch, ctx.options.case_sensitive)
        .into_iter()
        .map(|column| {
            Finding::risk(
                "AMBIGUOUS_COLUMN",
                format!("column `{}` is provided by {}", column.name, column.sources.join(" and ")),
            )
            .with_hint("qualify the column with its table alias")
            .at(column.span)
        })
        .collect();
    if findings.is_empty() {
        return RuleOutcome::Unchanged;
    }
    RuleOutcome::with_findings(statement.clone(), findings)
}

#[derive(Default)]
struct TempNames {
    renamed: Vec<String>,
}

impl VisitorMut for TempNames {
    fn visit_table_ref(&mut self, table: &mut TableRef) {
        if table.schema.is_some() || table.name.quoted || !table.name.name.starts_with('#') {
            return;
        }
        let original = std::mem::take(&mut table.name.name);
        table.name.name = original.trim_start_matches('#').to_string();
        if !self.renamed.contains(&original) {
            self.renamed.push(original);
        }
    }
}

/// SQL Server `#temp` and `##global` table names
fn temp_names(statement: &Statement, _ctx: &RuleContext<'_>) -> RuleOutcome<Statement> {
    let mut statement = statement.clone();
    let mut names = TempNames::default();
    names.visit_statement(&mut statement);
    if names.renamed.is_empty() {
        return RuleOutcome::Unchanged;
    }
    let findings = names
        .renamed
        .iter()
        .map(|name| {
            Finding::info(
                "TEMP_TABLE_RENAMED",
                format!("{name} renamed to {}", name.trim_start_matches('#')),
            )
        })
        .collect();
    RuleOutcome::with_findings(statement, findings)
}

#[cfg(test)]
mod tests {
    use crate::config::TranspileOptions;
    use crate::dialects::DialectType;
    use crate::rules::test_support::{codes, convert, convert_with};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_schema_qualification() {
        let options = TranspileOptions {
            default_catalog: Some("main".into()),
            default_schema: Some("sales".into()),
            ..TranspileOptions::default()
        };
        let result = convert_with(
            DialectType::Snowflake,
            "WITH recent AS (SELECT id FROM orders) SELECT r.id FROM recent r JOIN analytics.customers c ON r.id = c.id",
            options,
        );
        assert_eq!(
            result.sql,
            "WITH recent AS (SELECT id FROM main.sales.orders) SELECT r.id FROM recent AS r JOIN main.analytics.customers AS c ON r.id = c.id"
        );
        assert!(result.report.is_empty());
    }

    #[test]
    fn test_ambiguous_column_is_reported() {
        let result = convert(
            DialectType::PostgreSQL,
            "WITH a AS (SELECT id, name FROM x), b AS (SELECT id, total FROM y) SELECT id FROM a, b",
        );
        assert_eq!(codes(&result), vec!["AMBIGUOUS_COLUMN"]);
        assert!(result.report.entries[0].message.contains("`id`"));
    }

    #[test]
    fn test_tsql_temp_names() {
        let result = convert(DialectType::SqlServer, "SELECT a FROM #staging");
        assert_eq!(result.sql, "SELECT a FROM staging");
        assert_eq!(codes(&result), vec!["TEMP_TABLE_RENAMED"]);
    }
}
