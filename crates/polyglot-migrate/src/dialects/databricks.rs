//! Databricks dialect
//!
//! The migration target. Databricks SQL follows Spark SQL conventions:
//! - backtick-quoted identifiers, `"..."` string literals, backslash escapes
//! - `col:path` access into semi-structured strings
//! - `a DIV b` integer division and `x::type` casts
//! - `QUALIFY` and `ILIKE`
//!
//! It has no source rules; same-dialect runs only see rules that apply to
//! every migration.

use super::{DialectImpl, DialectType};
use crate::generator::GeneratorConfig;
use crate::grammar::Grammar;
use crate::tokens::TokenizerConfig;

/// Databricks dialect
pub struct DatabricksDialect;

impl DialectImpl for DatabricksDialect {
    fn dialect_type(&self) -> DialectType {
        DialectType::Databricks
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
            double_colon_cast: true,
            colon_json_access: true,
            supports_qualify: true,
            supports_ilike: true,
            ..Grammar::standard(DialectType::Databricks)
        }
    }

    fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            identifier_quote: ('`', '`'),
            backslash_escapes: true,
            ..GeneratorConfig::new(DialectType::Databricks)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialects::Dialect;
    use crate::expressions::{BinaryOperator, Expression, Statement};
    use crate::generator::FormatOptions;

    fn dialect() -> Dialect {
        Dialect::new(&DatabricksDialect).unwrap()
    }

    #[test]
    fn test_backticks_and_double_quoted_strings() {
        let d = dialect();
        let statement = d.parse_one("SELECT `order id`, \"x\" FROM t").unwrap();
        let sql = d.generate(&statement, &FormatOptions::default()).unwrap();
        assert_eq!(sql, "SELECT `order id`, 'x' FROM t");
    }

    #[test]
    fn test_div_is_integer_division() {
        let d = dialect();
        let Statement::Query(q) = d.parse_one("SELECT a DIV 2").unwrap() else {
            panic!("expected query");
        };
        let Expression::Binary(b) = &q.select().unwrap().projection[0] else {
            panic!("expected binary");
        };
        assert_eq!(b.op, BinaryOperator::IntDivide);
    }
}
