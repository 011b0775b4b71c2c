//! Hive dialect
//!
//! HiveQL is close to Databricks SQL. Migrations out of Hive mostly keep the
//! text as is; the shared rules cover the few type and property differences.

use super::{DialectImpl, DialectType};
use crate::generator::GeneratorConfig;
use crate::grammar::Grammar;
use crate::tokens::TokenizerConfig;

/// Hive dialect
pub struct HiveDialect;

impl DialectImpl for HiveDialect {
    fn dialect_type(&self) -> DialectType {
        DialectType::Hive
    }

    fn tokenizer_config(&self) -> TokenizerConfig {
        let mut config = TokenizerConfig::default().with_identifiers(&[('`', '`')]);
        config.double_quote_strings = true;
        config.string_escapes.push('\\');
        config
    }

    fn grammar(&self) -> Grammar {
        Grammar {
            div_keyword: true,
            ..Grammar::standard(DialectType::Hive)
        }
    }

    fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            identifier_quote: ('`', '`'),
            backslash_escapes: true,
            partitioned_by: true,
            tblproperties: true,
            ..GeneratorConfig::new(DialectType::Hive)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::dialects::DialectType;
    use crate::rules::test_support::{codes, convert};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lateral_view_passes_through() {
        let result = convert(
            DialectType::Hive,
            "SELECT id, tag FROM posts LATERAL VIEW explode(tags) t AS tag",
        );
        assert_eq!(result.sql, "SELECT id, tag FROM posts LATERAL VIEW explode(tags) t AS tag");
        assert_eq!(codes(&result), vec!["NOT_REQUIRED"]);
    }

    #[test]
    fn test_hive_string_type() {
        let result = convert(DialectType::Hive, "CREATE TABLE t (id INT, name STRING)");
        assert_eq!(result.sql, "CREATE TABLE t (id INT, name STRING)");
    }
}
