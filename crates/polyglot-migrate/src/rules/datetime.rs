//! Date and time rules
//!
//! Date-part names are normalized to the Databricks keywords, interval
//! arithmetic is rewritten to `DATEADD`, and format strings are translated
//! through [`crate::time`]. A format the translator cannot map completely is
//! still rewritten, with a warning listing the leftover specifiers.

use super::{as_function, call_at, unit_text, DialectMatch, Finding, RewriteRule, RuleContext, RuleOutcome};
use crate::config::DateFormatPreference;
use crate::dialects::DialectType;
use crate::expressions::{
    BinaryOperator, Cast, DataType, Expression, Extract, Function, Literal, UnaryOperator,
};
use crate::time::{translate_format, FormatFamily};

pub fn rules() -> Vec<RewriteRule> {
    let foreign = DialectMatch::Foreign;
    vec![
        RewriteRule::function("current_timestamp", foreign, 100, "GETDATE", current_timestamp),
        RewriteRule::function("sysdate", foreign, 100, "SYSDATE", current_timestamp),
        RewriteRule::function("systimestamp", foreign, 100, "SYSTIMESTAMP", current_timestamp),
        RewriteRule::function("sysdatetime", foreign, 100, "SYSDATETIME", current_timestamp),
        RewriteRule::function("now", foreign, 100, "NOW", current_timestamp),
        RewriteRule::function("current_datetime", foreign, 100, "CURRENT_DATETIME", current_timestamp),
        RewriteRule::function("getutcdate", foreign, 100, "GETUTCDATE", utc_timestamp),
        RewriteRule::function("sysutcdatetime", foreign, 100, "SYSUTCDATETIME", utc_timestamp),
        RewriteRule::function("dateadd_units", foreign, 100, "DATEADD", dateadd),
        RewriteRule::function("datediff_units", foreign, 100, "DATEDIFF", datediff),
        RewriteRule::function("timestampdiff_units", foreign, 100, "TIMESTAMPDIFF", datediff),
        RewriteRule::function("date_add_interval", foreign, 100, "DATE_ADD", interval_add),
        RewriteRule::function("date_sub_interval", foreign, 100, "DATE_SUB", interval_add),
        RewriteRule::function("timestamp_add_interval", foreign, 100, "TIMESTAMP_ADD", interval_add),
        RewriteRule::function("timestamp_sub_interval", foreign, 100, "TIMESTAMP_SUB", interval_add),
        RewriteRule::function("datetime_add_interval", foreign, 100, "DATETIME_ADD", interval_add),
        RewriteRule::function("datetime_sub_interval", foreign, 100, "DATETIME_SUB", interval_add),
        RewriteRule::function("datepart_to_extract", foreign, 100, "DATEPART", datepart),
        RewriteRule::function("date_part_to_extract", foreign, 100, "DATE_PART", datepart),
        RewriteRule::function("datename", foreign, 100, "DATENAME", datename),
        RewriteRule::function("eomonth_to_last_day", foreign, 100, "EOMONTH", eomonth),
        RewriteRule::expression("extract_fields", foreign, 225, extract),
        RewriteRule::expression("datetime_format", foreign, 215, datetime_format),
    ]
}

/// Databricks date-part keyword for a source spelling
pub(crate) fn normalize_unit(unit: &str, source: DialectType) -> Option<&'static str> {
    let unit = unit.trim().to_uppercase();
    let normalized = match unit.as_str() {
        "YEAR" | "YEARS" | "YY" | "YYYY" | "YR" | "YRS" | "Y" => "YEAR",
        "QUARTER" | "QUARTERS" | "QQ" | "Q" | "QTR" | "QTRS" => "QUARTER",
        "MONTH" | "MONTHS" | "MM" | "MON" | "MONS" => "MONTH",
        "M" if source.is_tsql_family() => "MONTH",
        "M" => "MINUTE",
        "WEEK" | "WEEKS" | "WK" | "WW" | "W" | "ISO_WEEK" | "ISOWK" | "ISOWW" => "WEEK",
        "DAY" | "DAYS" | "DD" | "D" | "DAYOFYEAR" | "DY" | "DOY" | "WEEKDAY" | "DW" => "DAY",
        "HOUR" | "HOURS" | "HH" | "H" | "HR" | "HRS" => "HOUR",
        "MINUTE" | "MINUTES" | "MI" | "N" | "MIN" | "MINS" => "MINUTE",
        "SECOND" | "SECONDS" | "SS" | "S" | "SEC" | "SECS" => "SECOND",
        "MILLISECOND" | "MILLISECONDS" | "MS" | "MSEC" | "MSECS" => "MILLISECOND",
        "MICROSECOND" | "MICROSECONDS" | "MCS" | "US" | "USEC" | "USECS" => "MICROSECOND",
        _ => return None,
    };
    Some(normalized)
}

fn unit_column(unit: &str) -> Expression {
    Expression::column(unit)
}

fn unknown_unit(unit: &str) -> Finding {
    Finding::unmappable("UNSUPPORTED_DATE_PART", format!("date part `{unit}` has no Databricks equivalent"))
}

fn current_timestamp(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    match as_function(expr) {
        Some(f) if f.args.is_empty() => RuleOutcome::Replaced(call_at(f, "CURRENT_TIMESTAMP", Vec::new())),
        _ => RuleOutcome::Unchanged,
    }
}

fn utc_timestamp(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(f) = as_function(expr) else {
        return RuleOutcome::Unchanged;
    };
    let now = call_at(f, "CURRENT_TIMESTAMP", Vec::new());
    RuleOutcome::Replaced(call_at(f, "TO_UTC_TIMESTAMP", vec![now, call_at(f, "CURRENT_TIMEZONE", Vec::new())]))
}

/// `DATEADD(unit, n, d)` with the unit normalized
fn dateadd(expr: &Expression, ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(f) = as_function(expr) else {
        return RuleOutcome::Unchanged;
    };
    let [unit, amount, date] = f.args.as_slice() else {
        return RuleOutcome::Unchanged;
    };
    let Some(text) = unit_text(unit) else {
        return RuleOutcome::Unchanged;
    };
    let Some(normalized) = normalize_unit(&text, ctx.source) else {
        return RuleOutcome::Unmappable(unknown_unit(&text));
    };
    if *unit == unit_column(normalized) {
        return RuleOutcome::Unchanged;
    }
    RuleOutcome::Replaced(call_at(
        f,
        "DATEADD",
        vec![unit_column(normalized), amount.clone(), date.clone()],
    ))
}

/// Three-argument `DATEDIFF(unit, a, b)` and MySQL `TIMESTAMPDIFF(unit, a, b)`.
/// SQL Server and Snowflake count unit boundaries crossed; Databricks counts
/// whole units elapsed.
fn datediff(expr: &Expression, ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(f) = as_function(expr) else {
        return RuleOutcome::Unchanged;
    };
    let [unit, start, end] = f.args.as_slice() else {
        return RuleOutcome::Unchanged;
    };
    let Some(text) = unit_text(unit) else {
        return RuleOutcome::Unchanged;
    };
    let Some(normalized) = normalize_unit(&text, ctx.source) else {
        return RuleOutcome::Unmappable(unknown_unit(&text));
    };
    let rewritten = call_at(f, &f.name, vec![unit_column(normalized), start.clone(), end.clone()]);
    let counts_boundaries = f.name == "DATEDIFF" && ctx.source != DialectType::MySQL && normalized != "DAY";
    if counts_boundaries {
        return RuleOutcome::risk(
            rewritten,
            Finding::risk(
                "DATEDIFF_BOUNDARY",
                format!("DATEDIFF({normalized}, ...) counts boundaries in the source but whole units in Databricks"),
            )
            .with_hint("truncate both arguments to the unit first if boundary counting is required"),
        );
    }
    if *unit == unit_column(normalized) {
        return RuleOutcome::Unchanged;
    }
    RuleOutcome::Replaced(rewritten)
}

/// `DATE_ADD(d, INTERVAL n unit)` and its subtracting and BigQuery variants
fn interval_add(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(f) = as_function(expr) else {
        return RuleOutcome::Unchanged;
    };
    let [date, Expression::Interval(interval)] = f.args.as_slice() else {
        return RuleOutcome::Unchanged;
    };
    let (amount, unit) = match (&interval.value, &interval.unit) {
        (value, Some(unit)) => (interval_amount(value), unit.clone()),
        // `INTERVAL '3 days'`
        (Expression::Literal(Literal::String(s)), None) => {
            let mut parts = s.split_whitespace();
            match (parts.next(), parts.next(), parts.next()) {
                (Some(n), Some(unit), None) if n.parse::<f64>().is_ok() => (Expression::number(n), unit.to_uppercase()),
                _ => return RuleOutcome::Unmappable(Finding::unmappable("UNSUPPORTED_INTERVAL", format!("interval '{s}'"))),
            }
        }
        _ => return RuleOutcome::Unchanged,
    };
    if interval.to_unit.is_some() {
        return RuleOutcome::Unmappable(
            Finding::unmappable("UNSUPPORTED_INTERVAL", "interval ranges cannot be added with DATEADD")
                .with_hint("add each component separately"),
        );
    }
    let Some(normalized) = normalize_unit(&unit, DialectType::MySQL) else {
        return RuleOutcome::Unmappable(unknown_unit(&unit));
    };
    let subtract = f.name.ends_with("_SUB");
    let amount = if subtract { negate(amount) } else { amount };
    RuleOutcome::Replaced(call_at(f, "DATEADD", vec![unit_column(normalized), amount, date.clone()]))
}

/// Interval values written as strings (`INTERVAL '5' DAY`) become numbers
fn interval_amount(value: &Expression) -> Expression {
    match value {
        Expression::Literal(Literal::String(s)) if s.trim().parse::<f64>().is_ok() => Expression::number(s.trim()),
        other => other.clone(),
    }
}

fn negate(amount: Expression) -> Expression {
    match amount {
        Expression::Literal(Literal::Number(n)) => match n.strip_prefix('-') {
            Some(positive) => Expression::number(positive),
            None => Expression::number(format!("-{n}")),
        },
        Expression::Unary(u) if u.op == UnaryOperator::Minus => u.expr,
        other => Expression::Unary(Box::new(crate::expressions::UnaryOp {
            op: UnaryOperator::Minus,
            expr: other,
        })),
    }
}

/// A date part extracted from `value`, with a finding when the numbering differs
fn part_of(part: &str, value: Expression, ctx: &RuleContext<'_>) -> Result<(Expression, Option<Finding>), Finding> {
    let upper = part.to_uppercase();
    let extract = |field: &str, value: Expression| {
        Expression::Extract(Box::new(Extract {
            field: field.to_string(),
            expr: value,
        }))
    };
    match upper.as_str() {
        "DOW" | "DAYOFWEEK" | "WEEKDAY" | "DW" => {
            let day = Expression::function("DAYOFWEEK", vec![value]);
            if ctx.source.is_postgres_family() {
                // 0 = Sunday
                Ok((Expression::binary(BinaryOperator::Minus, day, Expression::number(1)), None))
            } else if ctx.source.is_tsql_family() {
                Ok((
                    day,
                    Some(Finding::risk("DATEFIRST_DEPENDENT", "weekday numbering follows SET DATEFIRST in the source")),
                ))
            } else {
                Ok((day, None))
            }
        }
        "ISODOW" => Ok((extract("DAYOFWEEK_ISO", value), None)),
        "DOY" | "DAYOFYEAR" | "DY" => Ok((extract("DOY", value), None)),
        "EPOCH" => Ok((Expression::function("UNIX_TIMESTAMP", vec![value]), None)),
        "ISO_WEEK" | "ISOWK" | "ISOWW" | "ISOWEEK" => Ok((extract("WEEK", value), None)),
        _ => match normalize_unit(&upper, ctx.source) {
            Some("WEEK") if ctx.source.is_tsql_family() => Ok((
                extract("WEEK", value),
                Some(Finding::risk("WEEK_NUMBERING", "DATEPART(week) is not ISO numbered; Databricks WEEK is")),
            )),
            Some("MILLISECOND") | Some("MICROSECOND") | None => Err(unknown_unit(part)),
            Some(field) => Ok((extract(field, value), None)),
        },
    }
}

/// `DATEPART(unit, d)`, `DATE_PART('unit', d)`
fn datepart(expr: &Expression, ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(f) = as_function(expr) else {
        return RuleOutcome::Unchanged;
    };
    let [unit, value] = f.args.as_slice() else {
        return RuleOutcome::Unchanged;
    };
    let Some(text) = unit_text(unit) else {
        return RuleOutcome::Unchanged;
    };
    match part_of(&text, value.clone(), ctx) {
        Ok((rewritten, finding)) => RuleOutcome::with_findings(rewritten, finding.into_iter().collect()),
        Err(finding) => RuleOutcome::Unmappable(finding),
    }
}

/// `EXTRACT(DOW FROM d)`, `EXTRACT(EPOCH FROM d)`
fn extract(expr: &Expression, ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Expression::Extract(extract) = expr else {
        return RuleOutcome::Unchanged;
    };
    if !matches!(extract.field.as_str(), "DOW" | "ISODOW" | "EPOCH" | "DAYOFWEEK" | "WEEKDAY") {
        return RuleOutcome::Unchanged;
    }
    match part_of(&extract.field, extract.expr.clone(), ctx) {
        Ok((rewritten, finding)) => RuleOutcome::with_findings(rewritten, finding.into_iter().collect()),
        Err(finding) => RuleOutcome::Unmappable(finding),
    }
}

/// SQL Server `DATENAME(unit, d)`
fn datename(expr: &Expression, ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(f) = as_function(expr) else {
        return RuleOutcome::Unchanged;
    };
    let [unit, value] = f.args.as_slice() else {
        return RuleOutcome::Unchanged;
    };
    let Some(text) = unit_text(unit) else {
        return RuleOutcome::Unchanged;
    };
    let pattern = match text.as_str() {
        "WEEKDAY" | "DW" => Some("EEEE"),
        _ if normalize_unit(&text, ctx.source) == Some("MONTH") => Some("MMMM"),
        _ => None,
    };
    if let Some(pattern) = pattern {
        return RuleOutcome::Replaced(call_at(f, "DATE_FORMAT", vec![value.clone(), Expression::string(pattern)]));
    }
    match part_of(&text, value.clone(), ctx) {
        Ok((part, finding)) => RuleOutcome::with_findings(
            Expression::Cast(Box::new(Cast {
                expr: part,
                to: DataType::String,
                kind: crate::expressions::CastKind::Cast,
                format: None,
                span: f.span,
            })),
            finding.into_iter().collect(),
        ),
        Err(finding) => RuleOutcome::Unmappable(finding),
    }
}

/// `EOMONTH(d[, months])`
fn eomonth(expr: &Expression, _ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(f) = as_function(expr) else {
        return RuleOutcome::Unchanged;
    };
    match f.args.as_slice() {
        [date] => RuleOutcome::Replaced(call_at(f, "LAST_DAY", vec![date.clone()])),
        [date, months] => RuleOutcome::Replaced(call_at(
            f,
            "LAST_DAY",
            vec![call_at(f, "ADD_MONTHS", vec![date.clone(), months.clone()])],
        )),
        _ => RuleOutcome::Unchanged,
    }
}

/// A translated format argument
struct Pattern {
    expr: Expression,
    findings: Vec<Finding>,
    has_time: bool,
}

/// Translate a format-string argument from the source vocabulary
fn translate_pattern(format: &Expression, family: FormatFamily, ctx: &RuleContext<'_>) -> Pattern {
    let Some(text) = format.as_string() else {
        return Pattern {
            expr: format.clone(),
            findings: vec![Finding::risk("DATE_FORMAT_DYNAMIC", "format string is computed at run time")
                .with_hint("make sure it produces a Databricks datetime pattern")],
            has_time: true,
        };
    };
    if ctx.options.date_format == DateFormatPreference::Preserve {
        return Pattern {
            expr: format.clone(),
            findings: vec![Finding::risk(
                "DATE_FORMAT_PRESERVED",
                format!("format '{text}' kept in source notation"),
            )],
            has_time: true,
        };
    }
    let translated = translate_format(text, family);
    let mut findings = Vec::new();
    if !translated.is_exact() {
        findings.push(
            Finding::risk(
                "DATE_FORMAT_UNMAPPED",
                format!("format specifiers {} have no Databricks equivalent", translated.unmapped.join(", ")),
            )
            .with_hint("they are kept as literal text"),
        );
    }
    Pattern {
        has_time: pattern_has_time(&translated.pattern),
        expr: Expression::string(translated.pattern),
        findings,
    }
}

/// Whether a Java pattern has time-of-day fields outside quoted text
fn pattern_has_time(pattern: &str) -> bool {
    let mut quoted = false;
    for c in pattern.chars() {
        match c {
            '\'' => quoted = !quoted,
            'H' | 'h' | 'k' | 'K' | 'm' | 's' | 'S' | 'a' if !quoted => return true,
            _ => {}
        }
    }
    false
}

/// Whether an Oracle `TO_CHAR` format formats a number
fn is_number_format(format: &str) -> bool {
    let upper = format.to_uppercase();
    let stripped = upper.trim_start_matches("FM");
    !stripped.is_empty() && stripped.chars().all(|c| "90.,$DGSLMIPRBV".contains(c) || c == ' ')
}

/// Format-taking functions native to the source, plus Teradata `CAST ... FORMAT`.
/// One rule covers them all so a node is translated at most once: the
/// functions it emits share names with other dialects' format functions.
fn datetime_format(expr: &Expression, ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let f = match expr {
        Expression::Cast(_) if ctx.source == DialectType::Teradata => return cast_format(expr, ctx),
        Expression::Function(f) => f,
        _ => return RuleOutcome::Unchanged,
    };
    match (ctx.source.format_family(), f.name.as_str()) {
        (FormatFamily::Oracle, "TO_CHAR") => to_char(expr, ctx),
        (FormatFamily::Oracle, "TO_DATE" | "TO_TIMESTAMP") => parse_with_format(expr, ctx),
        (FormatFamily::MySql, "DATE_FORMAT") => format_with_pattern(expr, ctx),
        (FormatFamily::MySql, "STR_TO_DATE") => parse_with_format(expr, ctx),
        (FormatFamily::Strftime, "FORMAT_DATE" | "FORMAT_TIMESTAMP" | "FORMAT_DATETIME") => {
            format_with_pattern(expr, ctx)
        }
        (FormatFamily::Strftime, "PARSE_DATE" | "PARSE_TIMESTAMP" | "PARSE_DATETIME") => parse_with_format(expr, ctx),
        _ => RuleOutcome::Unchanged,
    }
}

/// `TO_CHAR(d, fmt)` → `DATE_FORMAT`; numeric formats are left alone
fn to_char(expr: &Expression, ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(f) = as_function(expr) else {
        return RuleOutcome::Unchanged;
    };
    match f.args.as_slice() {
        [value] => RuleOutcome::Replaced(Expression::Cast(Box::new(Cast {
            expr: value.clone(),
            to: DataType::String,
            kind: crate::expressions::CastKind::Cast,
            format: None,
            span: f.span,
        }))),
        [value, format] => {
            if format.as_string().is_some_and(is_number_format) {
                return RuleOutcome::Unchanged;
            }
            let pattern = translate_pattern(format, ctx.source.format_family(), ctx);
            RuleOutcome::with_findings(
                call_at(f, "DATE_FORMAT", vec![value.clone(), pattern.expr]),
                pattern.findings,
            )
        }
        _ => RuleOutcome::Unchanged,
    }
}

/// MySQL `DATE_FORMAT(d, fmt)`, BigQuery `FORMAT_DATE(fmt, d)`
fn format_with_pattern(expr: &Expression, ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(f) = as_function(expr) else {
        return RuleOutcome::Unchanged;
    };
    let family = ctx.source.format_family();
    if family == FormatFamily::Java {
        return RuleOutcome::Unchanged;
    }
    let (value, format) = match f.args.as_slice() {
        [value, format] if f.name == "DATE_FORMAT" => (value, format),
        [format, value] if f.name.starts_with("FORMAT_") => (value, format),
        [format, value, _zone] if f.name.starts_with("FORMAT_") => (value, format),
        _ => return RuleOutcome::Unchanged,
    };
    let pattern = translate_pattern(format, family, ctx);
    let mut findings = pattern.findings;
    if f.args.len() == 3 {
        findings.push(Finding::risk("TIME_ZONE_ARGUMENT_DROPPED", "the time zone argument is ignored"));
    }
    RuleOutcome::with_findings(call_at(f, "DATE_FORMAT", vec![value.clone(), pattern.expr]), findings)
}

/// `TO_DATE(s, fmt)`, `TO_TIMESTAMP(s, fmt)`, `STR_TO_DATE(s, fmt)`, BigQuery `PARSE_*(fmt, s)`
fn parse_with_format(expr: &Expression, ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Some(f) = as_function(expr) else {
        return RuleOutcome::Unchanged;
    };
    let family = ctx.source.format_family();
    if family == FormatFamily::Java {
        return RuleOutcome::Unchanged;
    }
    let (value, format) = match f.args.as_slice() {
        [format, value] if f.name.starts_with("PARSE_") => (value, format),
        [value, format] if !f.name.starts_with("PARSE_") => (value, format),
        _ => return RuleOutcome::Unchanged,
    };
    let pattern = translate_pattern(format, family, ctx);
    // Oracle DATE carries a time of day
    let name = match f.name.as_str() {
        "TO_TIMESTAMP" | "PARSE_TIMESTAMP" | "PARSE_DATETIME" => "TO_TIMESTAMP",
        _ if pattern.has_time => "TO_TIMESTAMP",
        _ => "TO_DATE",
    };
    RuleOutcome::with_findings(call_at(f, name, vec![value.clone(), pattern.expr]), pattern.findings)
}

/// Teradata `CAST(x AS DATE FORMAT 'YYYY-MM-DD')`
fn cast_format(expr: &Expression, ctx: &RuleContext<'_>) -> RuleOutcome<Expression> {
    let Expression::Cast(cast) = expr else {
        return RuleOutcome::Unchanged;
    };
    let Some(format) = &cast.format else {
        return RuleOutcome::Unchanged;
    };
    let at = Function {
        span: cast.span,
        ..Function::new("", Vec::new())
    };
    let pattern = translate_pattern(&Expression::string(format.clone()), FormatFamily::Oracle, ctx);
    let rewritten = match &cast.to {
        DataType::Date => call_at(&at, "TO_DATE", vec![cast.expr.clone(), pattern.expr]),
        DataType::Timestamp { .. } => call_at(&at, "TO_TIMESTAMP", vec![cast.expr.clone(), pattern.expr]),
        to if to.is_string() => call_at(&at, "DATE_FORMAT", vec![cast.expr.clone(), pattern.expr]),
        _ => {
            let mut plain = cast.clone();
            plain.format = None;
            return RuleOutcome::risk(
                Expression::Cast(plain),
                Finding::info("CAST_FORMAT_DROPPED", format!("display format '{format}' dropped")),
            );
        }
    };
    RuleOutcome::with_findings(rewritten, pattern.findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{codes, convert, convert_with, sql};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unit_spellings() {
        assert_eq!(normalize_unit("yyyy", DialectType::SqlServer), Some("YEAR"));
        assert_eq!(normalize_unit("m", DialectType::SqlServer), Some("MONTH"));
        assert_eq!(normalize_unit("m", DialectType::Snowflake), Some("MINUTE"));
        assert_eq!(normalize_unit("fortnight", DialectType::Snowflake), None);
    }

    #[test]
    fn test_current_timestamp_aliases() {
        assert_eq!(sql(DialectType::SqlServer, "SELECT GETDATE()"), "SELECT CURRENT_TIMESTAMP");
        assert_eq!(sql(DialectType::Oracle, "SELECT SYSDATE FROM DUAL"), "SELECT CURRENT_TIMESTAMP");
        assert_eq!(sql(DialectType::MySQL, "SELECT NOW()"), "SELECT CURRENT_TIMESTAMP");
    }

    #[test]
    fn test_dateadd_units_are_normalized() {
        assert_eq!(
            sql(DialectType::SqlServer, "SELECT DATEADD(dd, 7, order_date) FROM orders"),
            "SELECT DATEADD(DAY, 7, order_date) FROM orders"
        );
        assert_eq!(
            sql(DialectType::MySQL, "SELECT DATE_SUB(created, INTERVAL 3 MONTH) FROM t"),
            "SELECT DATEADD(MONTH, -3, created) FROM t"
        );
    }

    #[test]
    fn test_datediff_boundary_risk() {
        let result = convert(DialectType::SqlServer, "SELECT DATEDIFF(month, a, b) FROM t");
        assert_eq!(result.sql, "SELECT DATEDIFF(MONTH, a, b) FROM t");
        assert_eq!(codes(&result), vec!["DATEDIFF_BOUNDARY"]);
        assert!(codes(&convert(DialectType::SqlServer, "SELECT DATEDIFF(day, a, b) FROM t")).is_empty());
    }

    #[test]
    fn test_datepart_and_datename() {
        assert_eq!(
            sql(DialectType::SqlServer, "SELECT DATEPART(year, d), DATENAME(month, d) FROM t"),
            "SELECT EXTRACT(YEAR FROM d), DATE_FORMAT(d, 'MMMM') FROM t"
        );
        assert_eq!(
            sql(DialectType::PostgreSQL, "SELECT EXTRACT(DOW FROM d) FROM t"),
            "SELECT DAYOFWEEK(d) - 1 FROM t"
        );
    }

    #[test]
    fn test_format_strings_are_translated() {
        assert_eq!(
            sql(DialectType::Oracle, "SELECT TO_CHAR(hired, 'YYYY-MM-DD HH24:MI') FROM emp"),
            "SELECT DATE_FORMAT(hired, 'yyyy-MM-dd HH:mm') FROM emp"
        );
        assert_eq!(
            sql(DialectType::MySQL, "SELECT STR_TO_DATE(s, '%d/%m/%Y') FROM t"),
            "SELECT TO_DATE(s, 'dd/MM/yyyy') FROM t"
        );
        assert_eq!(
            sql(DialectType::BigQuery, "SELECT FORMAT_DATE('%Y%m', d) FROM t"),
            "SELECT DATE_FORMAT(d, 'yyyyMM') FROM t"
        );
        assert_eq!(sql(DialectType::Oracle, "SELECT TO_CHAR(amount, 'FM999.99') FROM t"), "SELECT TO_CHAR(amount, 'FM999.99') FROM t");
    }

    #[test]
    fn test_translated_pattern_is_not_translated_again() {
        let result = convert(DialectType::Oracle, "SELECT TO_CHAR(d, 'YYYY-MM-DD HH24:MI:SS') FROM t");
        assert_eq!(result.sql, "SELECT DATE_FORMAT(d, 'yyyy-MM-dd HH:mm:ss') FROM t");
        assert!(codes(&result).is_empty(), "{:?}", codes(&result));
        assert_eq!(
            sql(DialectType::Oracle, "SELECT TO_DATE(s, 'YYYY-MM-DD HH24:MI') FROM t"),
            "SELECT TO_TIMESTAMP(s, 'yyyy-MM-dd HH:mm') FROM t"
        );
        assert_eq!(
            sql(DialectType::MySQL, "SELECT STR_TO_DATE(s, '%d/%m/%Y %H:%i') FROM t"),
            "SELECT TO_TIMESTAMP(s, 'dd/MM/yyyy HH:mm') FROM t"
        );
        assert_eq!(
            sql(DialectType::BigQuery, "SELECT FORMAT_DATE('%Y-%m-%d', d) FROM t"),
            "SELECT DATE_FORMAT(d, 'yyyy-MM-dd') FROM t"
        );
    }

    #[test]
    fn test_format_functions_of_other_dialects_are_kept() {
        // DATE_FORMAT is already in Databricks notation outside MySQL
        assert_eq!(
            sql(DialectType::Oracle, "SELECT DATE_FORMAT(d, 'yyyy-MM') FROM t"),
            "SELECT DATE_FORMAT(d, 'yyyy-MM') FROM t"
        );
    }

    #[test]
    fn test_unmapped_specifier_is_flagged() {
        let result = convert(DialectType::Oracle, "SELECT TO_CHAR(d, 'IW') FROM t");
        assert_eq!(codes(&result), vec!["DATE_FORMAT_UNMAPPED"]);
    }

    #[test]
    fn test_preserve_keeps_source_pattern() {
        let mut options = crate::config::TranspileOptions::default();
        options.date_format = DateFormatPreference::Preserve;
        let result = convert_with(DialectType::Oracle, "SELECT TO_CHAR(d, 'YYYY') FROM t", options);
        assert_eq!(result.sql, "SELECT DATE_FORMAT(d, 'YYYY') FROM t");
        assert_eq!(codes(&result), vec!["DATE_FORMAT_PRESERVED"]);
    }

    #[test]
    fn test_teradata_cast_format() {
        assert_eq!(
            sql(DialectType::Teradata, "SELECT CAST(s AS DATE FORMAT 'YYYY-MM-DD') FROM t"),
            "SELECT TO_DATE(s, 'yyyy-MM-dd') FROM t"
        );
    }

    #[test]
    fn test_pattern_has_time() {
        assert!(pattern_has_time("yyyy-MM-dd HH:mm"));
        assert!(!pattern_has_time("yyyy-MM-dd"));
        assert!(!pattern_has_time("yyyy'h'"));
    }
}
