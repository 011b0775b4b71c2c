//! Azure Synapse dialect
//!
//! Dedicated SQL pools speak T-SQL. Synapse shares the SQL Server tokenizer,
//! grammar and spelling; the T-SQL rules are registered for both sources by
//! [`TSQLDialect`](super::TSQLDialect). Distribution and index options of
//! `CREATE TABLE ... WITH (...)` are handled by the shared DDL rules.

use super::{DialectImpl, DialectType, TSQLDialect};
use crate::generator::GeneratorConfig;
use crate::grammar::Grammar;
use crate::tokens::TokenizerConfig;

/// Azure Synapse dialect
pub struct SynapseDialect;

impl DialectImpl for SynapseDialect {
    fn dialect_type(&self) -> DialectType {
        DialectType::Synapse
    }

    fn tokenizer_config(&self) -> TokenizerConfig {
        TSQLDialect.tokenizer_config()
    }

    fn grammar(&self) -> Grammar {
        Grammar {
            dialect: DialectType::Synapse,
            ..TSQLDialect.grammar()
        }
    }

    fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            dialect: DialectType::Synapse,
            ..TSQLDialect.generator_config()
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::dialects::DialectType;
    use crate::rules::test_support::{codes, convert};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_synapse_uses_tsql_rules() {
        let result = convert(DialectType::Synapse, "SELECT TOP 5 [name] FROM #stage");
        assert_eq!(result.sql, "SELECT `name` FROM stage LIMIT 5");
        assert_eq!(codes(&result), vec!["TEMP_TABLE_RENAMED"]);
    }

    #[test]
    fn test_distribution_option_is_reported() {
        let result = convert(
            DialectType::Synapse,
            "CREATE TABLE sales (id INT) WITH (DISTRIBUTION = HASH(id), CLUSTERED COLUMNSTORE INDEX)",
        );
        assert!(result.sql.starts_with("CREATE TABLE sales (id INT)"));
        assert!(!result.report.has_errors());
        assert!(codes(&result).iter().any(|c| c == "TABLE_OPTION_DROPPED"));
    }
}
