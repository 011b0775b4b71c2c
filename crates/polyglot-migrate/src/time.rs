//! Date/time format conversion
//!
//! Translates source format strings (Oracle-style `YYYY-MM-DD HH24:MI:SS`,
//! MySQL/BigQuery `%Y-%m-%d`, SQL Server `CONVERT` style codes) into the
//! Java-style datetime patterns Databricks uses. Specifiers are matched
//! longest-first through a [`Trie`].

use crate::trie::Trie;
use once_cell::sync::Lazy;

/// Which format-specifier vocabulary a dialect uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatFamily {
    /// `YYYY`, `MM`, `HH24`, `MI`; case-insensitive (Oracle, Snowflake, Teradata, PostgreSQL, Redshift)
    Oracle,
    /// `%Y`, `%i` minutes, `%M` month name
    MySql,
    /// `%Y`, `%M` minutes, `%B` month name (BigQuery strftime)
    Strftime,
    /// Already Java-style (Hive, Databricks)
    Java,
}

/// Outcome of translating one format string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeFormat {
    pub pattern: String,
    /// Source specifiers with no Databricks counterpart, kept as quoted text
    pub unmapped: Vec<String>,
}

impl TimeFormat {
    pub fn is_exact(&self) -> bool {
        self.unmapped.is_empty()
    }
}

const ORACLE_FORMATS: &[(&str, &str)] = &[
    ("YYYY", "yyyy"),
    ("RRRR", "yyyy"),
    ("YY", "yy"),
    ("RR", "yy"),
    ("MONTH", "MMMM"),
    ("MON", "MMM"),
    ("MM", "MM"),
    ("DDD", "DDD"),
    ("DD", "dd"),
    ("DAY", "EEEE"),
    ("DY", "EEE"),
    ("HH24", "HH"),
    ("HH12", "hh"),
    ("HH", "hh"),
    ("MI", "mm"),
    ("SS", "ss"),
    ("FF1", "S"),
    ("FF2", "SS"),
    ("FF3", "SSS"),
    ("FF4", "SSSS"),
    ("FF5", "SSSSS"),
    ("FF6", "SSSSSS"),
    ("FF7", "SSSSSSS"),
    ("FF8", "SSSSSSSS"),
    ("FF9", "SSSSSSSSS"),
    ("FF", "SSSSSS"),
    ("MS", "SSS"),
    ("US", "SSSSSS"),
    ("AM", "a"),
    ("PM", "a"),
    ("TZH:TZM", "XXX"),
    ("TZHTZM", "XX"),
    ("TZH", "X"),
    ("Q", "Q"),
    ("FM", ""),
];

const MYSQL_FORMATS: &[(&str, &str)] = &[
    ("%Y", "yyyy"),
    ("%y", "yy"),
    ("%m", "MM"),
    ("%c", "M"),
    ("%M", "MMMM"),
    ("%b", "MMM"),
    ("%d", "dd"),
    ("%e", "d"),
    ("%j", "DDD"),
    ("%W", "EEEE"),
    ("%a", "EEE"),
    ("%H", "HH"),
    ("%k", "H"),
    ("%h", "hh"),
    ("%I", "hh"),
    ("%l", "h"),
    ("%i", "mm"),
    ("%s", "ss"),
    ("%S", "ss"),
    ("%f", "SSSSSS"),
    ("%p", "a"),
    ("%T", "HH:mm:ss"),
    ("%%", "%"),
];

const STRFTIME_FORMATS: &[(&str, &str)] = &[
    ("%Y", "yyyy"),
    ("%y", "yy"),
    ("%m", "MM"),
    ("%B", "MMMM"),
    ("%b", "MMM"),
    ("%h", "MMM"),
    ("%d", "dd"),
    ("%e", "d"),
    ("%j", "DDD"),
    ("%A", "EEEE"),
    ("%a", "EEE"),
    ("%H", "HH"),
    ("%I", "hh"),
    ("%M", "mm"),
    ("%S", "ss"),
    ("%E6S", "ss.SSSSSS"),
    ("%E3S", "ss.SSS"),
    ("%p", "a"),
    ("%F", "yyyy-MM-dd"),
    ("%T", "HH:mm:ss"),
    ("%D", "MM/dd/yy"),
    ("%Z", "z"),
    ("%z", "Z"),
    ("%%", "%"),
];

/// SQL Server `CONVERT(..., style)` codes with a fixed pattern
const TSQL_STYLES: &[(i64, &str)] = &[
    (1, "MM/dd/yy"),
    (2, "yy.MM.dd"),
    (3, "dd/MM/yy"),
    (4, "dd.MM.yy"),
    (5, "dd-MM-yy"),
    (10, "MM-dd-yy"),
    (11, "yy/MM/dd"),
    (12, "yyMMdd"),
    (23, "yyyy-MM-dd"),
    (101, "MM/dd/yyyy"),
    (102, "yyyy.MM.dd"),
    (103, "dd/MM/yyyy"),
    (104, "dd.MM.yyyy"),
    (105, "dd-MM-yyyy"),
    (106, "dd MMM yyyy"),
    (107, "MMM dd, yyyy"),
    (108, "HH:mm:ss"),
    (110, "MM-dd-yyyy"),
    (111, "yyyy/MM/dd"),
    (112, "yyyyMMdd"),
    (120, "yyyy-MM-dd HH:mm:ss"),
    (121, "yyyy-MM-dd HH:mm:ss.SSS"),
    (126, "yyyy-MM-dd'T'HH:mm:ss.SSS"),
];

static ORACLE_TRIE: Lazy<Trie<&'static str>> =
    Lazy::new(|| ORACLE_FORMATS.iter().copied().collect());
static MYSQL_TRIE: Lazy<Trie<&'static str>> =
    Lazy::new(|| MYSQL_FORMATS.iter().copied().collect());
static STRFTIME_TRIE: Lazy<Trie<&'static str>> =
    Lazy::new(|| STRFTIME_FORMATS.iter().copied().collect());

/// Java pattern for a SQL Server `CONVERT` style code
pub fn tsql_style(style: i64) -> Option<&'static str> {
    TSQL_STYLES
        .iter()
        .find(|(code, _)| *code == style)
        .map(|(_, pattern)| *pattern)
}

/// Translate a format string from `family` into a Java-style pattern
pub fn translate_format(input: &str, family: FormatFamily) -> TimeFormat {
    match family {
        FormatFamily::Java => TimeFormat {
            pattern: input.to_string(),
            unmapped: Vec::new(),
        },
        FormatFamily::Oracle => translate(input, &ORACLE_TRIE, true),
        FormatFamily::MySql => translate(input, &MYSQL_TRIE, false),
        FormatFamily::Strftime => translate(input, &STRFTIME_TRIE, false),
    }
}

fn translate(input: &str, trie: &Trie<&'static str>, case_insensitive: bool) -> TimeFormat {
    let chars: Vec<char> = input.chars().collect();
    let keys: Vec<char> = if case_insensitive {
        chars.iter().map(|c| c.to_ascii_uppercase()).collect()
    } else {
        chars.clone()
    };

    let mut out = JavaPattern::default();
    let mut unmapped = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        // Oracle-style "literal text"
        if case_insensitive && c == '"' {
            let close = chars[i + 1..].iter().position(|ch| *ch == '"');
            let end = close.map(|p| i + 1 + p).unwrap_or(chars.len());
            for ch in &chars[i + 1..end] {
                out.literal(*ch);
            }
            i = end + 1;
            continue;
        }

        if let Some((len, java)) = trie.longest_match(&keys[i..]) {
            out.specifier(java);
            i += len;
            continue;
        }

        if c == '%' && !case_insensitive && i + 1 < chars.len() {
            unmapped.push(chars[i..i + 2].iter().collect());
            out.literal(chars[i + 1]);
            i += 2;
            continue;
        }

        if c.is_alphabetic() {
            let run: String = chars[i..]
                .iter()
                .take_while(|ch| ch.is_alphabetic())
                .collect();
            for ch in run.chars() {
                out.literal(ch);
            }
            i += run.chars().count();
            unmapped.push(run);
            continue;
        }

        out.literal(c);
        i += 1;
    }

    TimeFormat {
        pattern: out.finish(),
        unmapped,
    }
}

/// Builds a Java datetime pattern, quoting literal letters
#[derive(Default)]
struct JavaPattern {
    out: String,
    quoted: String,
}

impl JavaPattern {
    fn specifier(&mut self, java: &str) {
        self.flush();
        self.out.push_str(java);
    }

    fn literal(&mut self, ch: char) {
        if ch.is_alphabetic() {
            self.quoted.push(ch);
        } else if ch == '\'' {
            self.flush();
            self.out.push_str("''");
        } else {
            self.flush();
            self.out.push(ch);
        }
    }

    fn flush(&mut self) {
        if !self.quoted.is_empty() {
            self.out.push('\'');
            self.out.push_str(&self.quoted);
            self.out.push('\'');
            self.quoted.clear();
        }
    }

    fn finish(mut self) -> String {
        self.flush();
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oracle_formats() {
        let f = translate_format("YYYY-MM-DD HH24:MI:SS", FormatFamily::Oracle);
        assert_eq!(f.pattern, "yyyy-MM-dd HH:mm:ss");
        assert!(f.is_exact());

        let f = translate_format("dd-mon-yyyy", FormatFamily::Oracle);
        assert_eq!(f.pattern, "dd-MMM-yyyy");

        let f = translate_format("FMMonth DD", FormatFamily::Oracle);
        assert_eq!(f.pattern, "MMMM dd");
    }

    #[test]
    fn test_oracle_literal_text_is_quoted() {
        let f = translate_format("YYYY\"T\"HH24:MI:SS.FF3", FormatFamily::Oracle);
        assert_eq!(f.pattern, "yyyy'T'HH:mm:ss.SSS");
    }

    #[test]
    fn test_unknown_specifiers_are_reported() {
        let f = translate_format("IW-YYYY", FormatFamily::Oracle);
        assert_eq!(f.pattern, "'IW'-yyyy");
        assert_eq!(f.unmapped, vec!["IW".to_string()]);
    }

    #[test]
    fn test_mysql_formats() {
        let f = translate_format("%Y-%m-%d %H:%i:%s", FormatFamily::MySql);
        assert_eq!(f.pattern, "yyyy-MM-dd HH:mm:ss");
        let f = translate_format("%M %e, %Y", FormatFamily::MySql);
        assert_eq!(f.pattern, "MMMM d, yyyy");
    }

    #[test]
    fn test_strftime_minutes_differ_from_mysql() {
        let f = translate_format("%H:%M", FormatFamily::Strftime);
        assert_eq!(f.pattern, "HH:mm");
        let f = translate_format("%Q", FormatFamily::Strftime);
        assert_eq!(f.unmapped, vec!["%Q".to_string()]);
    }

    #[test]
    fn test_tsql_styles() {
        assert_eq!(tsql_style(112), Some("yyyyMMdd"));
        assert_eq!(tsql_style(120), Some("yyyy-MM-dd HH:mm:ss"));
        assert_eq!(tsql_style(999), None);
    }
}
