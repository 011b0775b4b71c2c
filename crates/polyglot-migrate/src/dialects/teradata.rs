//! Teradata dialect
//!
//! Teradata accepts `SEL`/`DEL`/`INS`/`UPD` abbreviations, `MINUS`, `**` and
//! infix `MOD`, `TOP n`, `QUALIFY`, trailing `SAMPLE n` and `LOCKING ... FOR
//! ACCESS` statement prefixes. String functions with an `O` prefix are the
//! Oracle-compatible variants.

use super::{DialectImpl, DialectType};
use crate::expressions::Expression;
use crate::grammar::Grammar;
use crate::rules::{as_function, call_at, renamed, DialectMatch, Finding, RewriteRule, RuleContext, RuleOutcome};
use crate::tokens::{TokenType, TokenizerConfig};

const TERADATA: DialectMatch = DialectMatch::Source(DialectType::Teradata);

/// Renames with identical arguments
const RENAMES: &[(&str, &str)] = &[
    ("OREPLACE", "REPLACE"),
    ("OTRANSLATE", "TRANSLATE"),
    ("CHARACTERS", "CHAR_LENGTH"),
    ("CHARS", "CHAR_LENGTH"),
];

/// Row-hash functions tied to AMP distribution
const HASH_FUNCTIONS: &[&str] = &["HASHROW", "HASHBUCKET", "HASHAMP", "HASHBAKAMP"];

/// Teradata dialect
pub struct TeradataDialect;

impl DialectImpl for TeradataDialect {
    fn dialect_type(&self) -> DialectType {
        DialectType::Teradata
    }

    fn tokenizer_config(&self) -> TokenizerConfig {
        TokenizerConfig::default()
            .with_keyword("SEL", TokenType::Select)
            .with_keyword("DEL", TokenType::Delete)
            .with_keyword("INS", TokenType::Insert)
            .with_keyword("UPD", TokenType::Update)
            .with_keyword("MINUS", TokenType::Except)
    }

    fn grammar(&self) -> Grammar {
        Grammar {
            dstar_is_power: true,
            mod_keyword: true,
            supports_top: true,
            supports_qualify: true,
            trailing_extensions: vec!["SAMPLE"],
            statement_prefixes: vec!["LOCKING"],
            ..Grammar::standard(DialectType::Teradata)
        }
    }

    fn rules(&self) -> Vec<RewriteRule> {
        let mut rules = vec![
            RewriteRule::function("index_to_locate", TERADATA, 100, "INDEX", index),
            RewriteRule::function("strtok_to_split_part", TERADATA, 100, "STRTOK", strtok),
        ];
        rules.extend(
            RENAMES
                .iter()
                .map(|(from, _)| RewriteRule::function("teradata_rename", TERADATA, 100, from, rename)),
        );
        rules.extend(
            HASH_FUNCTIONS
                .iter()
                .map(|name| RewriteRule::function("row_hash_function", TERADATA, 100, name, row_hash)),
        );
        rules
    }
}

fn rename(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(name) = expr.function_name() else {
        return RuleOutcome::Unchanged;
    };
    RENAMES
        .iter()
        .find(|(from, _)| *from == name)
        .and_then(|(_, to)| renamed(expr, to))
        .map_or(RuleOutcome::Unchanged, RuleOutcome::Replaced)
}

/// `INDEX(s, sub)` is one-based like `LOCATE(sub, s)`
fn index(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    match as_function(expr) {
        Some(f) if f.args.len() == 2 => {
            RuleOutcome::Replaced(call_at(f, "LOCATE", vec![f.args[1].clone(), f.args[0].clone()]))
        }
        _ => RuleOutcome::Unchanged,
    }
}

/// `STRTOK(s, delimiters, n)`
fn strtok(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(f) = as_function(expr) else {
        return RuleOutcome::Unchanged;
    };
    let [value, delimiters, token] = f.args.as_slice() else {
        return RuleOutcome::Unchanged;
    };
    let single = delimiters.as_string().is_some_and(|d| d.chars().count() == 1);
    let rewritten = call_at(f, "SPLIT_PART", vec![value.clone(), delimiters.clone(), token.clone()]);
    if single {
        return RuleOutcome::risk(
            rewritten,
            Finding::risk("EMPTY_TOKENS_KEPT", "STRTOK skips empty tokens; SPLIT_PART counts them"),
        );
    }
    RuleOutcome::risk(
        rewritten,
        Finding::risk(
            "STRTOK_DELIMITERS",
            "STRTOK splits on any listed character; SPLIT_PART splits on the whole string",
        )
        .with_hint("use SPLIT with a character class and element_at"),
    )
}

fn row_hash(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(name) = expr.function_name() else {
        return RuleOutcome::Unchanged;
    };
    RuleOutcome::Unmappable(
        Finding::unmappable("UNSUPPORTED_FUNCTION", format!("{name} depends on AMP row distribution"))
            .with_hint("use HASH or XXHASH64 when only a stable hash is needed"),
    )
}

#[cfg(test)]
mod tests {
    use crate::dialects::DialectType;
    use crate::rules::test_support::{codes, convert, sql};
    use pretty_assertions::assert_eq;

    const TD: DialectType = DialectType::Teradata;

    #[test]
    fn test_abbreviations_and_minus() {
        assert_eq!(
            sql(TD, "SEL a FROM x MINUS SEL a FROM y"),
            "SELECT a FROM x EXCEPT SELECT a FROM y"
        );
        assert_eq!(sql(TD, "DEL FROM t WHERE id = 1"), "DELETE FROM t WHERE id = 1");
    }

    #[test]
    fn test_operators() {
        assert_eq!(sql(TD, "SEL a MOD 3, b ** 2 FROM t"), "SELECT a % 3, POWER(b, 2) FROM t");
    }

    #[test]
    fn test_string_functions() {
        assert_eq!(
            sql(TD, "SEL INDEX(name, 'a'), OREPLACE(name, 'x', 'y'), CHARACTERS(name) FROM t"),
            "SELECT LOCATE('a', name), REPLACE(name, 'x', 'y'), CHAR_LENGTH(name) FROM t"
        );
    }

    #[test]
    fn test_strtok() {
        let result = convert(TD, "SEL STRTOK(path, '/', 2) FROM t");
        assert_eq!(result.sql, "SELECT SPLIT_PART(path, '/', 2) FROM t");
        assert_eq!(codes(&result), vec!["EMPTY_TOKENS_KEPT"]);
    }

    #[test]
    fn test_row_hash_is_unmappable() {
        let result = convert(TD, "SEL HASHROW(id) FROM t");
        assert!(result.report.has_errors());
        assert_eq!(codes(&result), vec!["UNSUPPORTED_FUNCTION"]);
    }
}
