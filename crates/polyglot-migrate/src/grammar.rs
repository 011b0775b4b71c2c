//! Dialect grammar descriptions
//!
//! A [`Grammar`] tells the parser which statement forms a dialect accepts and
//! how tightly its binary operators bind. The emitter uses the *target*
//! grammar's precedence table to decide where parentheses are needed.

use crate::dialects::DialectType;
use crate::error::{Error, Result};
use crate::expressions::BinaryOperator;
use crate::tokens::TokenizerConfig;
use std::collections::HashMap;

/// Binding power levels, weakest first
pub mod prec {
    pub const OR: u8 = 1;
    pub const AND: u8 = 2;
    pub const NOT: u8 = 3;
    pub const COMPARISON: u8 = 4;
    pub const BITWISE_OR: u8 = 5;
    pub const BITWISE_XOR: u8 = 6;
    pub const BITWISE_AND: u8 = 7;
    pub const SHIFT: u8 = 8;
    pub const CONCAT: u8 = 9;
    pub const ADDITIVE: u8 = 10;
    pub const MULTIPLICATIVE: u8 = 11;
    pub const POWER: u8 = 12;
    pub const UNARY: u8 = 13;
    pub const CAST: u8 = 14;
}

/// Operator binding powers for one dialect
#[derive(Debug, Clone)]
pub struct PrecedenceTable {
    levels: HashMap<BinaryOperator, u8>,
}

impl PrecedenceTable {
    pub fn standard() -> Self {
        use BinaryOperator::*;
        let mut levels = HashMap::new();
        levels.insert(Or, prec::OR);
        levels.insert(Xor, prec::OR);
        levels.insert(And, prec::AND);
        for op in [
            Eq,
            Neq,
            Lt,
            Lte,
            Gt,
            Gte,
            NullsafeEq,
            IsDistinctFrom,
            IsNotDistinctFrom,
        ] {
            levels.insert(op, prec::COMPARISON);
        }
        levels.insert(BitwiseOr, prec::BITWISE_OR);
        levels.insert(BitwiseXor, prec::BITWISE_XOR);
        levels.insert(BitwiseAnd, prec::BITWISE_AND);
        levels.insert(ShiftLeft, prec::SHIFT);
        levels.insert(ShiftRight, prec::SHIFT);
        levels.insert(Concat, prec::CONCAT);
        levels.insert(Plus, prec::ADDITIVE);
        levels.insert(Minus, prec::ADDITIVE);
        for op in [Multiply, Divide, IntDivide, Modulo] {
            levels.insert(op, prec::MULTIPLICATIVE);
        }
        levels.insert(Power, prec::POWER);
        Self { levels }
    }

    pub fn with(mut self, op: BinaryOperator, level: u8) -> Self {
        self.levels.insert(op, level);
        self
    }

    pub fn without(mut self, op: BinaryOperator) -> Self {
        self.levels.remove(&op);
        self
    }

    pub fn get(&self, op: BinaryOperator) -> Option<u8> {
        self.levels.get(&op).copied()
    }

    /// Binding power, falling back to the standard level for operators the
    /// dialect has no spelling for
    pub fn level(&self, op: BinaryOperator) -> u8 {
        self.get(op)
            .or_else(|| PrecedenceTable::standard().get(op))
            .unwrap_or(prec::COMPARISON)
    }
}

/// Statement forms and operator conventions of a dialect
#[derive(Debug, Clone)]
pub struct Grammar {
    pub dialect: DialectType,
    pub precedence: PrecedenceTable,
    /// `||` concatenates; when false it is logical OR (MySQL)
    pub dpipe_is_concat: bool,
    /// `^` is exponentiation rather than bitwise XOR (PostgreSQL)
    pub caret_is_power: bool,
    /// `**` is exponentiation (Teradata)
    pub dstar_is_power: bool,
    /// `a MOD b` infix form (Teradata)
    pub mod_keyword: bool,
    /// `a DIV b` integer division (MySQL, Hive, Databricks)
    pub div_keyword: bool,
    /// `x::type` casts
    pub double_colon_cast: bool,
    /// `col:path` semi-structured access (Snowflake, Databricks)
    pub colon_json_access: bool,
    pub supports_top: bool,
    pub supports_limit: bool,
    pub supports_fetch_first: bool,
    pub supports_qualify: bool,
    pub supports_ilike: bool,
    /// Oracle `(+)` outer join markers
    pub supports_join_mark: bool,
    /// `SELECT ... INTO table`
    pub supports_select_into: bool,
    /// Words that start a dialect clause inside a SELECT, kept as [`Extension`](crate::expressions::Extension)
    pub select_extensions: Vec<&'static str>,
    /// Words that follow a table reference and start a dialect suffix (`PIVOT`)
    pub table_extensions: Vec<&'static str>,
    /// Words that start a trailing clause after the query body (`OPTION`, `SAMPLE`)
    pub trailing_extensions: Vec<&'static str>,
    /// Statement prefixes that govern the statement that follows (`LOCKING`)
    pub statement_prefixes: Vec<&'static str>,
    /// A line holding only this word separates batches (`GO`)
    pub batch_separator: Option<&'static str>,
}

impl Grammar {
    /// ANSI-leaning baseline the dialect files adjust
    pub fn standard(dialect: DialectType) -> Self {
        Self {
            dialect,
            precedence: PrecedenceTable::standard(),
            dpipe_is_concat: true,
            caret_is_power: false,
            dstar_is_power: false,
            mod_keyword: false,
            div_keyword: false,
            double_colon_cast: false,
            colon_json_access: false,
            supports_top: false,
            supports_limit: true,
            supports_fetch_first: false,
            supports_qualify: false,
            supports_ilike: false,
            supports_join_mark: false,
            supports_select_into: false,
            select_extensions: Vec::new(),
            table_extensions: vec!["PIVOT", "UNPIVOT", "TABLESAMPLE"],
            trailing_extensions: Vec::new(),
            statement_prefixes: Vec::new(),
            batch_separator: None,
        }
    }

    /// True when `word` opens a dialect extension anywhere inside a query
    pub fn is_extension_word(&self, word: &str) -> bool {
        let upper = word.to_uppercase();
        self.select_extensions
            .iter()
            .chain(&self.table_extensions)
            .chain(&self.trailing_extensions)
            .any(|w| *w == upper)
    }

    /// Check the grammar for contradictions against its tokenizer
    pub fn validate(&self, tokenizer: &TokenizerConfig) -> Result<()> {
        let name = self.dialect.name();

        for op in BinaryOperator::ALL {
            if op == BinaryOperator::Concat && !self.dpipe_is_concat {
                continue;
            }
            if self.precedence.get(op).is_none() && self.spells(op) {
                return Err(Error::config(format!(
                    "{name}: operator {op:?} has no precedence"
                )));
            }
        }

        let order = [
            BinaryOperator::Or,
            BinaryOperator::And,
            BinaryOperator::Eq,
            BinaryOperator::Plus,
            BinaryOperator::Multiply,
        ];
        for pair in order.windows(2) {
            if self.precedence.level(pair[0]) >= self.precedence.level(pair[1]) {
                return Err(Error::config(format!(
                    "{name}: {:?} must bind looser than {:?}",
                    pair[0], pair[1]
                )));
            }
        }

        if !(self.supports_limit || self.supports_top || self.supports_fetch_first) {
            return Err(Error::config(format!("{name}: no row-limiting clause")));
        }
        if self.caret_is_power && self.dstar_is_power {
            return Err(Error::config(format!(
                "{name}: both `^` and `**` claim exponentiation"
            )));
        }
        if tokenizer.double_quote_strings && tokenizer.identifiers.contains_key(&'"') {
            return Err(Error::config(format!(
                "{name}: '\"' is both a string and an identifier quote"
            )));
        }
        if tokenizer.identifiers.contains_key(&'\'') {
            return Err(Error::config(format!(
                "{name}: single quote cannot quote identifiers"
            )));
        }
        if tokenizer.hash_comments && tokenizer.variable_prefixes.contains(&'#') {
            return Err(Error::config(format!(
                "{name}: '#' is both a comment marker and a name prefix"
            )));
        }
        Ok(())
    }

    /// Whether the dialect has a surface spelling for `op`
    fn spells(&self, op: BinaryOperator) -> bool {
        match op {
            BinaryOperator::Power => self.caret_is_power || self.dstar_is_power,
            BinaryOperator::IntDivide => self.div_keyword,
            BinaryOperator::NullsafeEq | BinaryOperator::Xor => false,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_grammar_is_valid() {
        let grammar = Grammar::standard(DialectType::PostgreSQL);
        assert!(grammar.validate(&TokenizerConfig::default()).is_ok());
        assert!(
            grammar.precedence.level(BinaryOperator::Multiply)
                > grammar.precedence.level(BinaryOperator::Plus)
        );
    }

    #[test]
    fn test_contradictory_quotes_are_rejected() {
        let grammar = Grammar::standard(DialectType::MySQL);
        let mut tokenizer = TokenizerConfig::default();
        tokenizer.double_quote_strings = true;
        let err = grammar.validate(&tokenizer).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_inverted_precedence_is_rejected() {
        let mut grammar = Grammar::standard(DialectType::Oracle);
        grammar.precedence = grammar.precedence.with(BinaryOperator::Or, prec::MULTIPLICATIVE);
        assert!(grammar.validate(&TokenizerConfig::default()).is_err());
    }

    #[test]
    fn test_missing_row_limit_is_rejected() {
        let mut grammar = Grammar::standard(DialectType::SqlServer);
        grammar.supports_limit = false;
        assert!(grammar.validate(&TokenizerConfig::default()).is_err());
        grammar.supports_top = true;
        assert!(grammar.validate(&TokenizerConfig::default()).is_ok());
    }

    #[test]
    fn test_extension_words_are_case_insensitive() {
        let mut grammar = Grammar::standard(DialectType::Oracle);
        grammar.select_extensions = vec!["CONNECT"];
        assert!(grammar.is_extension_word("connect"));
        assert!(grammar.is_extension_word("Pivot"));
        assert!(!grammar.is_extension_word("where"));
    }
}
