//! SQL dialects
//!
//! Each supported system implements [`DialectImpl`]: its tokenizer settings,
//! grammar, generator settings and the rewrite rules that apply when it is the
//! source of a migration. A [`DialectRegistry`] holds one validated [`Dialect`]
//! per system and is owned by the engine.

mod bigquery;
mod databricks;
mod hive;
mod mysql;
mod oracle;
mod postgres;
mod redshift;
mod snowflake;
mod synapse;
mod teradata;
mod tsql;

pub use bigquery::BigQueryDialect;
pub use databricks::DatabricksDialect;
pub use hive::HiveDialect;
pub use mysql::MySQLDialect;
pub use oracle::OracleDialect;
pub use postgres::PostgresDialect;
pub use redshift::RedshiftDialect;
pub use snowflake::SnowflakeDialect;
pub use synapse::SynapseDialect;
pub use teradata::TeradataDialect;
pub use tsql::TSQLDialect;

use crate::error::{Error, Result};
use crate::expressions::Statement;
use crate::generator::{FormatOptions, Generator, GeneratorConfig};
use crate::grammar::Grammar;
use crate::parser::{Parser, StatementSplitter};
use crate::rules::RewriteRule;
use crate::time::FormatFamily;
use crate::tokens::{Token, Tokenizer, TokenizerConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Supported SQL dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectType {
    Databricks,
    Snowflake,
    Teradata,
    Oracle,
    #[serde(alias = "tsql", alias = "mssql")]
    SqlServer,
    #[serde(alias = "postgres")]
    PostgreSQL,
    MySQL,
    Redshift,
    BigQuery,
    Synapse,
    Hive,
}

impl DialectType {
    /// Every system that can be migrated from, in display order
    pub const SOURCES: [DialectType; 10] = [
        DialectType::Snowflake,
        DialectType::Teradata,
        DialectType::Oracle,
        DialectType::SqlServer,
        DialectType::PostgreSQL,
        DialectType::MySQL,
        DialectType::Redshift,
        DialectType::BigQuery,
        DialectType::Synapse,
        DialectType::Hive,
    ];

    /// Systems that can be migrated to
    pub const TARGETS: [DialectType; 1] = [DialectType::Databricks];

    pub fn all() -> impl Iterator<Item = DialectType> {
        Self::TARGETS.into_iter().chain(Self::SOURCES)
    }

    /// Canonical lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            DialectType::Databricks => "databricks",
            DialectType::Snowflake => "snowflake",
            DialectType::Teradata => "teradata",
            DialectType::Oracle => "oracle",
            DialectType::SqlServer => "sqlserver",
            DialectType::PostgreSQL => "postgresql",
            DialectType::MySQL => "mysql",
            DialectType::Redshift => "redshift",
            DialectType::BigQuery => "bigquery",
            DialectType::Synapse => "synapse",
            DialectType::Hive => "hive",
        }
    }

    /// SQL Server and Azure Synapse share T-SQL syntax
    pub fn is_tsql_family(&self) -> bool {
        matches!(self, DialectType::SqlServer | DialectType::Synapse)
    }

    pub fn is_postgres_family(&self) -> bool {
        matches!(self, DialectType::PostgreSQL | DialectType::Redshift)
    }

    /// Datetime format vocabulary used by `TO_CHAR`/`DATE_FORMAT`-style functions
    pub fn format_family(&self) -> FormatFamily {
        match self {
            DialectType::Oracle
            | DialectType::Snowflake
            | DialectType::Teradata
            | DialectType::PostgreSQL
            | DialectType::Redshift => FormatFamily::Oracle,
            DialectType::MySQL => FormatFamily::MySql,
            DialectType::BigQuery => FormatFamily::Strftime,
            DialectType::SqlServer
            | DialectType::Synapse
            | DialectType::Hive
            | DialectType::Databricks => FormatFamily::Java,
        }
    }
}

impl fmt::Display for DialectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DialectType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace(['-', '_', ' '], "");
        let dialect = match normalized.as_str() {
            "databricks" | "spark" | "sparksql" => DialectType::Databricks,
            "snowflake" => DialectType::Snowflake,
            "teradata" => DialectType::Teradata,
            "oracle" => DialectType::Oracle,
            "sqlserver" | "tsql" | "mssql" | "mssqlserver" => DialectType::SqlServer,
            "postgresql" | "postgres" | "pg" => DialectType::PostgreSQL,
            "mysql" => DialectType::MySQL,
            "redshift" => DialectType::Redshift,
            "bigquery" | "bq" => DialectType::BigQuery,
            "synapse" | "azuresynapse" => DialectType::Synapse,
            "hive" => DialectType::Hive,
            _ => return Err(Error::UnknownDialect(s.to_string())),
        };
        Ok(dialect)
    }
}

/// Per-system behaviour. Implementations are stateless.
pub trait DialectImpl: Send + Sync {
    fn dialect_type(&self) -> DialectType;

    fn tokenizer_config(&self) -> TokenizerConfig {
        TokenizerConfig::default()
    }

    fn grammar(&self) -> Grammar {
        Grammar::standard(self.dialect_type())
    }

    fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig::new(self.dialect_type())
    }

    /// Rewrite rules that apply when this dialect is the migration source
    fn rules(&self) -> Vec<RewriteRule> {
        Vec::new()
    }
}

/// Every built-in dialect implementation
pub fn builtin_dialects() -> Vec<Box<dyn DialectImpl>> {
    vec![
        Box::new(DatabricksDialect),
        Box::new(SnowflakeDialect),
        Box::new(TeradataDialect),
        Box::new(OracleDialect),
        Box::new(TSQLDialect),
        Box::new(PostgresDialect),
        Box::new(MySQLDialect),
        Box::new(RedshiftDialect),
        Box::new(BigQueryDialect),
        Box::new(SynapseDialect),
        Box::new(HiveDialect),
    ]
}

/// A dialect with its configuration resolved and validated
#[derive(Debug, Clone)]
pub struct Dialect {
    dialect_type: DialectType,
    tokenizer: Tokenizer,
    grammar: Grammar,
    generator_config: GeneratorConfig,
}

impl Dialect {
    pub fn new(dialect: &dyn DialectImpl) -> Result<Self> {
        let tokenizer_config = dialect.tokenizer_config();
        let grammar = dialect.grammar();
        grammar.validate(&tokenizer_config)?;
        Ok(Self {
            dialect_type: dialect.dialect_type(),
            tokenizer: Tokenizer::new(tokenizer_config),
            grammar,
            generator_config: dialect.generator_config(),
        })
    }

    pub fn dialect_type(&self) -> DialectType {
        self.dialect_type
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn generator_config(&self) -> &GeneratorConfig {
        &self.generator_config
    }

    pub fn tokenize(&self, sql: &str) -> Result<Vec<Token>> {
        self.tokenizer.tokenize(sql)
    }

    /// Split `sql` into statements lazily
    pub fn split<'a>(&'a self, sql: &'a str) -> StatementSplitter<'a> {
        StatementSplitter::new(self.tokenizer.stream(sql), &self.grammar)
    }

    /// Parse every statement, failing on the first error
    pub fn parse(&self, sql: &str) -> Result<Vec<Statement>> {
        self.split(sql)
            .map(|chunk| {
                let chunk = chunk.into_tokens()?;
                Parser::new(chunk, sql, &self.grammar).parse_statement()
            })
            .collect()
    }

    /// Parse exactly one statement
    pub fn parse_one(&self, sql: &str) -> Result<Statement> {
        let mut statements = self.parse(sql)?;
        match statements.len() {
            1 => Ok(statements.remove(0)),
            n => Err(Error::internal(format!("expected one statement, found {n}"))),
        }
    }

    /// Render a statement in this dialect
    pub fn generate(&self, statement: &Statement, options: &FormatOptions) -> Result<String> {
        Generator::new(self, options.clone()).generate(statement)
    }
}

/// The set of dialects an engine works with
#[derive(Debug, Clone)]
pub struct DialectRegistry {
    dialects: HashMap<DialectType, Dialect>,
}

impl DialectRegistry {
    /// Build and validate every built-in dialect
    pub fn builtin() -> Result<Self> {
        Self::from_impls(&builtin_dialects())
    }

    pub fn from_impls(impls: &[Box<dyn DialectImpl>]) -> Result<Self> {
        let mut dialects = HashMap::new();
        for imp in impls {
            let dialect = Dialect::new(imp.as_ref())?;
            if dialects.insert(dialect.dialect_type(), dialect).is_some() {
                return Err(Error::config(format!(
                    "dialect {} registered twice",
                    imp.dialect_type()
                )));
            }
        }
        Ok(Self { dialects })
    }

    pub fn get(&self, dialect: DialectType) -> Result<&Dialect> {
        self.dialects
            .get(&dialect)
            .ok_or_else(|| Error::unsupported(format!("dialect {dialect}"), "this engine"))
    }

    pub fn contains(&self, dialect: DialectType) -> bool {
        self.dialects.contains_key(&dialect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_aliases() {
        assert_eq!("tsql".parse::<DialectType>().unwrap(), DialectType::SqlServer);
        assert_eq!("MSSQL".parse::<DialectType>().unwrap(), DialectType::SqlServer);
        assert_eq!("postgres".parse::<DialectType>().unwrap(), DialectType::PostgreSQL);
        assert_eq!("Big_Query".parse::<DialectType>().unwrap(), DialectType::BigQuery);
        assert!(matches!(
            "db2".parse::<DialectType>(),
            Err(Error::UnknownDialect(_))
        ));
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&DialectType::SqlServer).unwrap();
        assert_eq!(json, "\"sqlserver\"");
        let parsed: DialectType = serde_json::from_str("\"tsql\"").unwrap();
        assert_eq!(parsed, DialectType::SqlServer);
    }

    #[test]
    fn test_builtin_registry_validates() {
        let registry = DialectRegistry::builtin().unwrap();
        for dialect in DialectType::all() {
            assert!(registry.contains(dialect), "{dialect} missing");
        }
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let impls: Vec<Box<dyn DialectImpl>> = vec![Box::new(HiveDialect), Box::new(HiveDialect)];
        assert!(matches!(
            DialectRegistry::from_impls(&impls),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_parse_and_generate_round_trip() {
        let registry = DialectRegistry::builtin().unwrap();
        let dialect = registry.get(DialectType::PostgreSQL).unwrap();
        let statement = dialect.parse_one("SELECT a FROM t WHERE b > 1").unwrap();
        let sql = dialect
            .generate(&statement, &FormatOptions::default())
            .unwrap();
        assert_eq!(sql, "SELECT a FROM t WHERE b > 1");
    }
}
