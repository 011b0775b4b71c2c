//! SQL Parser
//!
//! Statements are parsed by recursive descent and expressions by precedence
//! climbing over the dialect's [`PrecedenceTable`](crate::grammar::PrecedenceTable).
//! Constructs without a neutral AST form are captured as [`Extension`] nodes
//! holding their raw source text, so a statement using them still parses.
//!
//! [`StatementSplitter`] cuts a lazy token stream into statements. Each chunk
//! is parsed independently; a lexical error poisons only its own chunk.

use crate::dialects::DialectType;
use crate::error::{Error, Result};
use crate::expressions::*;
use crate::grammar::{prec, Grammar};
use crate::tokens::{Span, Token, TokenStream, TokenType};

/// Nesting limit for expressions and subqueries
const MAX_DEPTH: usize = 256;

/// Niladic functions written without parentheses
pub const NILADIC_FUNCTIONS: &[&str] = &[
    "CURRENT_DATE",
    "CURRENT_TIME",
    "CURRENT_TIMESTAMP",
    "CURRENT_USER",
    "SESSION_USER",
    "LOCALTIME",
    "LOCALTIMESTAMP",
    "SYSDATE",
    "SYSTIMESTAMP",
];

/// Non-reserved keywords that may still serve as an implicit alias
const ALIAS_KEYWORDS: &[TokenType] = &[
    TokenType::Key,
    TokenType::First,
    TokenType::Next,
    TokenType::View,
    TokenType::Temporary,
    TokenType::Replace,
    TokenType::Matched,
    TokenType::Begin,
    TokenType::Use,
    TokenType::If,
];

/// Words that start a clause and so never begin an implicit alias
const CLAUSE_WORDS: &[&str] = &["FOR", "SEPARATOR", "MINUS"];

const INTERVAL_UNITS: &[&str] = &[
    "YEAR", "YEARS", "QUARTER", "MONTH", "MONTHS", "WEEK", "WEEKS", "DAY", "DAYS", "HOUR",
    "HOURS", "MINUTE", "MINUTES", "SECOND", "SECONDS", "MILLISECOND", "MILLISECONDS",
    "MICROSECOND", "MICROSECONDS",
];

/// Words that begin a new table option in `CREATE TABLE`
const TABLE_OPTION_WORDS: &[&str] = &[
    "CLUSTER",
    "PARTITIONED",
    "COMMENT",
    "LOCATION",
    "TBLPROPERTIES",
    "DISTKEY",
    "SORTKEY",
    "COMPOUND",
    "INTERLEAVED",
    "DISTSTYLE",
    "ENGINE",
    "CHARSET",
    "AUTO_INCREMENT",
    "ROW_FORMAT",
    "STORED",
    "CLUSTERED",
    "BACKUP",
];

// ---------------------------------------------------------------------------
// Statement splitting
// ---------------------------------------------------------------------------

/// The tokens of one statement, cut from a larger input
#[derive(Debug)]
pub struct StatementChunk {
    pub tokens: Vec<Token>,
    /// From the first token (or the lexical error) through the last token
    pub span: Span,
    /// First lexical error inside the chunk
    pub error: Option<Error>,
    /// Ended with `;` or a batch separator
    pub terminated: bool,
}

impl StatementChunk {
    /// The tokens, or the lexical error that poisoned this chunk
    pub fn into_tokens(self) -> Result<Vec<Token>> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.tokens),
        }
    }

    /// Comments attached anywhere inside the chunk, in order
    pub fn comments(&self) -> Vec<String> {
        self.tokens
            .iter()
            .flat_map(|t| t.comments.iter().cloned())
            .collect()
    }

    /// Source text covered by the chunk
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        source
            .get(self.span.start..self.span.end)
            .unwrap_or_default()
    }
}

/// Splits a token stream on `;` outside `BEGIN ... END` blocks and on the
/// dialect's batch separator.
pub struct StatementSplitter<'a> {
    stream: TokenStream<'a>,
    grammar: &'a Grammar,
}

impl<'a> StatementSplitter<'a> {
    pub fn new(stream: TokenStream<'a>, grammar: &'a Grammar) -> Self {
        Self { stream, grammar }
    }

    pub fn source(&self) -> &'a str {
        self.stream.source()
    }

    fn next_is_on_later_line(&mut self, line: usize) -> bool {
        match self.stream.peek() {
            Some(Ok(next)) => next.span.line > line,
            Some(Err(_)) => true,
            None => true,
        }
    }

    fn next_is_word(&mut self, words: &[&str]) -> bool {
        match self.stream.peek() {
            Some(Ok(next)) => words.iter().any(|w| next.is_word(w)),
            _ => false,
        }
    }

    fn next_is(&mut self, token_type: TokenType) -> bool {
        matches!(self.stream.peek(), Some(Ok(next)) if next.token_type == token_type)
    }
}

impl Iterator for StatementSplitter<'_> {
    type Item = StatementChunk;

    fn next(&mut self) -> Option<StatementChunk> {
        let mut tokens: Vec<Token> = Vec::new();
        let mut error: Option<Error> = None;
        // Open CASE (false) and BEGIN (true) keywords, innermost last
        let mut open: Vec<bool> = Vec::new();
        let mut terminated = false;

        while let Some(item) = self.stream.next() {
            let token = match item {
                Ok(token) => token,
                Err(err) => {
                    if error.is_none() {
                        error = Some(err);
                    }
                    continue;
                }
            };

            if let Some(separator) = self.grammar.batch_separator {
                let starts_line = tokens.last().map_or(true, |t| t.span.line < token.span.line);
                if token.is_word(separator)
                    && starts_line
                    && self.next_is_on_later_line(token.span.line)
                {
                    if tokens.is_empty() && error.is_none() {
                        continue;
                    }
                    terminated = true;
                    break;
                }
            }

            match token.token_type {
                // A `;` only stays inside a BEGIN ... END body; an unclosed
                // parenthesis or CASE never reaches past it
                TokenType::Semicolon => {
                    if error.is_none() {
                        if let Some(block) = open.iter().rposition(|&is_block| is_block) {
                            open.truncate(block + 1);
                            tokens.push(token);
                            continue;
                        }
                    }
                    if tokens.is_empty() && error.is_none() {
                        continue;
                    }
                    terminated = true;
                    break;
                }
                TokenType::Case => open.push(false),
                TokenType::Begin => {
                    let transaction = self.next_is(TokenType::Semicolon)
                        || self.next_is_word(&["TRANSACTION", "TRAN", "WORK"]);
                    if !transaction {
                        open.push(true);
                    }
                }
                TokenType::End => {
                    let closes_other = self.next_is(TokenType::If)
                        || self.next_is_word(&["LOOP", "WHILE", "FOR", "REPEAT"]);
                    if !closes_other {
                        open.pop();
                    }
                }
                _ => {}
            }
            tokens.push(token);
        }

        if tokens.is_empty() && error.is_none() {
            return None;
        }

        let error_span = error.as_ref().and_then(Error::span);
        let span = match (tokens.first(), tokens.last()) {
            (Some(first), Some(last)) => {
                let span = first.span.merge(last.span);
                match error_span {
                    Some(err) => span.merge(err),
                    None => span,
                }
            }
            _ => error_span.unwrap_or_default(),
        };

        Some(StatementChunk {
            tokens,
            span,
            error,
            terminated,
        })
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parser for one statement's tokens
pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    source: &'a str,
    grammar: &'a Grammar,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// `source` is the full input the token spans point into
    pub fn new(tokens: Vec<Token>, source: &'a str, grammar: &'a Grammar) -> Self {
        Self {
            tokens,
            pos: 0,
            source,
            grammar,
            depth: 0,
        }
    }

    fn dialect(&self) -> DialectType {
        self.grammar.dialect
    }

    /// Parse the tokens as exactly one statement
    pub fn parse_statement(&mut self) -> Result<Statement> {
        let statement = self.parse_statement_inner()?;
        if !self.is_at_end() {
            return Err(self.error_expected(&["end of statement"]));
        }
        Ok(statement)
    }

    fn parse_statement_inner(&mut self) -> Result<Statement> {
        let Some(token_type) = self.peek_type() else {
            return Err(self.error_expected(&["statement"]));
        };
        match token_type {
            TokenType::Select | TokenType::With | TokenType::LParen | TokenType::Values => {
                Ok(Statement::Query(Box::new(self.parse_query()?)))
            }
            TokenType::Insert => self.parse_insert(),
            TokenType::Update => self.parse_update(),
            TokenType::Delete => self.parse_delete(),
            TokenType::Merge => self.parse_merge(),
            TokenType::Create => self.parse_create(),
            TokenType::Drop => self.parse_drop(),
            TokenType::Truncate => self.parse_truncate(),
            TokenType::Use => self.parse_use(),
            TokenType::Var if self.is_statement_prefix() => self.parse_prefixed_statement(),
            _ => Ok(self.raw_statement()),
        }
    }

    // -- token helpers ------------------------------------------------------

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n)
    }

    fn peek_type(&self) -> Option<TokenType> {
        self.peek().map(|t| t.token_type)
    }

    fn nth_type(&self, n: usize) -> Option<TokenType> {
        self.peek_nth(n).map(|t| t.token_type)
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn check(&self, token_type: TokenType) -> bool {
        self.peek_type() == Some(token_type)
    }

    fn check_nth(&self, n: usize, token_type: TokenType) -> bool {
        self.nth_type(n) == Some(token_type)
    }

    fn check_word(&self, word: &str) -> bool {
        self.peek().is_some_and(|t| t.is_word(word))
    }

    fn check_word_nth(&self, n: usize, word: &str) -> bool {
        self.peek_nth(n).is_some_and(|t| t.is_word(word))
    }

    fn bump(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.bump();
        token
    }

    fn match_token(&mut self, token_type: TokenType) -> bool {
        if self.check(token_type) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn match_word(&mut self, word: &str) -> bool {
        if self.check_word(word) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token_type: TokenType, what: &str) -> Result<Token> {
        if self.check(token_type) {
            self.advance()
                .ok_or_else(|| self.error_expected(&[what]))
        } else {
            Err(self.error_expected(&[what]))
        }
    }

    fn expect_word(&mut self, word: &str) -> Result<()> {
        if self.match_word(word) {
            Ok(())
        } else {
            Err(self.error_expected(&[word]))
        }
    }

    fn upper_at(&self, n: usize) -> String {
        self.peek_nth(n).map(Token::upper).unwrap_or_default()
    }

    fn is_name_token(token: &Token) -> bool {
        match token.token_type {
            TokenType::Var | TokenType::QuotedIdentifier => true,
            t => t.is_keyword() && !t.is_reserved(),
        }
    }

    fn check_name(&self) -> bool {
        self.peek().is_some_and(Self::is_name_token)
    }

    /// Span from token `start` through the last consumed token
    fn span_from(&self, start: usize) -> Span {
        let first = self.tokens.get(start).map(|t| t.span);
        let last = self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)).map(|t| t.span);
        match (first, last) {
            (Some(first), Some(last)) if self.pos > start => first.merge(last),
            (Some(first), _) => first,
            _ => self.end_span(),
        }
    }

    /// Raw source text from token `start` through the last consumed token
    fn raw_from(&self, start: usize) -> String {
        if self.pos <= start {
            return String::new();
        }
        let span = self.span_from(start);
        self.source
            .get(span.start..span.end)
            .unwrap_or_default()
            .to_string()
    }

    /// Position just past the last token
    fn end_span(&self) -> Span {
        let Some(last) = self.tokens.last() else {
            return Span::new(0, 0, 1, 1);
        };
        let text = self.source.get(last.span.start..last.span.end).unwrap_or_default();
        let (line, column) = match text.rfind('\n') {
            Some(idx) => (
                last.span.line + text.matches('\n').count(),
                text[idx + 1..].chars().count() + 1,
            ),
            None => (last.span.line, last.span.column + text.chars().count()),
        };
        Span::new(last.span.end, last.span.end, line, column)
    }

    fn error_expected(&self, expected: &[&str]) -> Error {
        let expected: Vec<String> = expected.iter().map(|s| s.to_string()).collect();
        match self.peek() {
            Some(token) => Error::syntax(
                format!(
                    "Expected {} but found '{}'",
                    expected.join(" or "),
                    token.text
                ),
                token.span,
                expected,
                token.text.clone(),
            ),
            None => Error::syntax(
                format!("Expected {} but reached end of input", expected.join(" or ")),
                self.end_span(),
                expected,
                "end of input",
            ),
        }
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            let span = self.peek().map(|t| t.span).unwrap_or_else(|| self.end_span());
            return Err(Error::syntax(
                "Statement is nested too deeply",
                span,
                Vec::new(),
                self.peek().map(|t| t.text.clone()).unwrap_or_default(),
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Consume a parenthesized group, including nested groups
    fn skip_group(&mut self) -> Result<()> {
        self.expect(TokenType::LParen, "(")?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.peek_type() {
                None => return Err(self.error_expected(&[")"])),
                Some(TokenType::LParen) => depth += 1,
                Some(TokenType::RParen) => depth -= 1,
                _ => {}
            }
            self.bump();
        }
        Ok(())
    }

    /// Consume tokens until `stop` matches at nesting depth zero, or an
    /// unmatched closing bracket is reached
    fn skip_until(&mut self, stop: &dyn Fn(&Parser<'a>, &Token) -> bool) {
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            if depth == 0 && stop(self, token) {
                return;
            }
            match token.token_type {
                TokenType::LParen | TokenType::LBracket => depth += 1,
                TokenType::RParen | TokenType::RBracket => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            self.bump();
        }
    }

    /// Leading construct label, e.g. `CONNECT BY`, `CREATE PROCEDURE`
    fn construct_label(&self) -> String {
        let mut words = self.tokens[self.pos..]
            .iter()
            .take_while(|t| t.token_type == TokenType::Var || t.token_type.is_keyword())
            .map(Token::upper);
        let Some(first) = words.next() else {
            return "STATEMENT".to_string();
        };
        if matches!(first.as_str(), "CREATE" | "ALTER" | "DROP" | "REPLACE") {
            const SKIP: &[&str] = &[
                "OR", "REPLACE", "TEMP", "TEMPORARY", "GLOBAL", "LOCAL", "SECURE", "VOLATILE",
                "TRANSIENT", "MULTISET", "SET", "UNIQUE", "CLUSTERED", "NONCLUSTERED",
            ];
            for word in words {
                if !SKIP.contains(&word.as_str()) {
                    return format!("{first} {word}");
                }
            }
            return first;
        }
        match words.next() {
            Some(second) if matches!(second.as_str(), "BY" | "WITH" | "VIEW" | "XML" | "JSON") => {
                format!("{first} {second}")
            }
            _ => first,
        }
    }

    fn extension_from(&self, construct: String, start: usize) -> Extension {
        Extension::new(
            construct,
            self.raw_from(start),
            self.dialect(),
            self.span_from(start),
        )
    }

    // -- raw and prefixed statements ---------------------------------------

    fn raw_statement(&mut self) -> Statement {
        let start = self.pos;
        let construct = self.construct_label();
        self.pos = self.tokens.len();
        Statement::Extension(Box::new(self.extension_from(construct, start)))
    }

    fn is_statement_prefix(&self) -> bool {
        self.peek()
            .is_some_and(|t| self.grammar.statement_prefixes.iter().any(|p| t.is_word(p)))
    }

    /// `LOCKING ROW FOR ACCESS SELECT ...`: the prefix is kept raw, the
    /// statement it governs is parsed normally
    fn parse_prefixed_statement(&mut self) -> Result<Statement> {
        let start = self.pos;
        let construct = self.upper_at(0);
        self.bump();
        let mut depth = 0usize;
        while let Some(token_type) = self.peek_type() {
            match token_type {
                TokenType::LParen => depth += 1,
                TokenType::RParen => depth = depth.saturating_sub(1),
                TokenType::Select
                | TokenType::With
                | TokenType::Insert
                | TokenType::Update
                | TokenType::Delete
                | TokenType::Merge
                    if depth == 0 =>
                {
                    break
                }
                _ => {}
            }
            self.bump();
        }
        if self.is_at_end() {
            return Err(self.error_expected(&["SELECT", "INSERT", "UPDATE", "DELETE"]));
        }
        let mut extension = self.extension_from(construct, start);
        let body = self.parse_statement_inner()?;
        extension.body = Some(Box::new(body));
        Ok(Statement::Extension(Box::new(extension)))
    }

    // -- queries ------------------------------------------------------------

    /// Parse a full query: `[WITH ...] body [ORDER BY] [LIMIT|OFFSET|FETCH]`
    pub fn parse_query(&mut self) -> Result<Query> {
        self.enter()?;
        let result = self.parse_query_inner();
        self.leave();
        result
    }

    fn parse_query_inner(&mut self) -> Result<Query> {
        let start = self.pos;
        let with = if self.check(TokenType::With) {
            Some(self.parse_with()?)
        } else {
            None
        };
        let body = self.parse_set_expr()?;
        let mut query = Query::from_body(body, Span::default());
        query.with = with;
        self.parse_query_tail(&mut query)?;
        query.span = self.span_from(start);
        Ok(query)
    }

    fn parse_with(&mut self) -> Result<With> {
        self.expect(TokenType::With, "WITH")?;
        let recursive = self.match_token(TokenType::Recursive);
        let mut ctes = Vec::new();
        loop {
            let alias = self.parse_identifier()?;
            let columns = if self.check(TokenType::LParen) {
                self.parse_paren_identifiers()?
            } else {
                Vec::new()
            };
            self.expect(TokenType::As, "AS")?;
            if self.check(TokenType::Not) && self.check_word_nth(1, "MATERIALIZED") {
                self.bump();
            }
            self.match_word("MATERIALIZED");
            self.expect(TokenType::LParen, "(")?;
            let query = self.parse_query()?;
            self.expect(TokenType::RParen, ")")?;
            ctes.push(Cte {
                alias,
                columns,
                query: Box::new(query),
            });
            if !self.match_token(TokenType::Comma) {
                break;
            }
        }
        Ok(With { recursive, ctes })
    }

    fn parse_set_expr(&mut self) -> Result<QueryBody> {
        let mut left = self.parse_set_operand()?;
        loop {
            let op = match self.peek_type() {
                Some(TokenType::Union) => SetOperator::Union,
                Some(TokenType::Intersect) => SetOperator::Intersect,
                Some(TokenType::Except) => SetOperator::Except,
                _ => break,
            };
            self.bump();
            let all = self.match_token(TokenType::All);
            if !all {
                self.match_token(TokenType::Distinct);
            }
            let right = self.parse_set_operand()?;
            left = QueryBody::SetOperation(Box::new(SetOperation {
                op,
                all,
                left,
                right,
            }));
        }
        Ok(left)
    }

    fn parse_set_operand(&mut self) -> Result<QueryBody> {
        match self.peek_type() {
            Some(TokenType::Select) => Ok(QueryBody::Select(Box::new(self.parse_select()?))),
            Some(TokenType::Values) => Ok(QueryBody::Values(self.parse_values()?)),
            Some(TokenType::LParen) => {
                self.bump();
                let query = self.parse_query()?;
                self.expect(TokenType::RParen, ")")?;
                Ok(QueryBody::Nested(Box::new(query)))
            }
            _ => Err(self.error_expected(&["SELECT", "VALUES", "("])),
        }
    }

    fn parse_values(&mut self) -> Result<Values> {
        self.expect(TokenType::Values, "VALUES")?;
        let mut rows = Vec::new();
        loop {
            if self.match_token(TokenType::LParen) {
                let row = self.parse_expression_list()?;
                self.expect(TokenType::RParen, ")")?;
                rows.push(row);
            } else {
                rows.push(vec![self.parse_expression()?]);
            }
            if !self.match_token(TokenType::Comma) {
                break;
            }
        }
        Ok(Values { rows })
    }

    fn parse_query_tail(&mut self, query: &mut Query) -> Result<()> {
        loop {
            match self.peek_type() {
                Some(TokenType::Order) if query.order_by.is_none() => {
                    self.bump();
                    self.expect(TokenType::By, "BY")?;
                    query.order_by = Some(OrderBy {
                        expressions: self.parse_ordered_list()?,
                    });
                }
                Some(TokenType::Limit) if query.limit.is_none() => {
                    self.bump();
                    if self.match_token(TokenType::All) {
                        continue;
                    }
                    let first = self.parse_expression()?;
                    if self.match_token(TokenType::Comma) {
                        let count = self.parse_expression()?;
                        query.offset = Some(Offset {
                            count: first,
                            rows: false,
                        });
                        query.limit = Some(Limit { count });
                    } else {
                        query.limit = Some(Limit { count: first });
                    }
                }
                Some(TokenType::Offset) if query.offset.is_none() => {
                    self.bump();
                    let count = self.parse_expression()?;
                    let rows = self.match_token(TokenType::Rows) || self.match_token(TokenType::Row);
                    query.offset = Some(Offset { count, rows });
                }
                Some(TokenType::Fetch) if query.fetch.is_none() => {
                    query.fetch = Some(self.parse_fetch()?);
                }
                Some(TokenType::Var)
                    if self
                        .peek()
                        .is_some_and(|t| self.grammar.trailing_extensions.iter().any(|w| t.is_word(w))) =>
                {
                    let extension = self.parse_trailing_extension();
                    query.trailing.push(extension);
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn parse_fetch(&mut self) -> Result<Fetch> {
        self.expect(TokenType::Fetch, "FETCH")?;
        if !(self.match_token(TokenType::First) || self.match_token(TokenType::Next)) {
            return Err(self.error_expected(&["FIRST", "NEXT"]));
        }
        let count = if self.check(TokenType::Row) || self.check(TokenType::Rows) {
            None
        } else {
            Some(self.parse_expr_bp(prec::ADDITIVE * 2)?)
        };
        let percent = self.match_token(TokenType::PercentKw);
        if !(self.match_token(TokenType::Rows) || self.match_token(TokenType::Row)) {
            return Err(self.error_expected(&["ROWS"]));
        }
        let with_ties = if self.match_token(TokenType::Only) {
            false
        } else if self.check(TokenType::With) && self.check_nth(1, TokenType::Ties) {
            self.pos += 2;
            true
        } else {
            return Err(self.error_expected(&["ONLY", "WITH TIES"]));
        };
        Ok(Fetch {
            count,
            percent,
            with_ties,
        })
    }

    /// `SAMPLE 10`, `OPTION (MAXDOP 1)`, `FOR XML PATH('')`
    fn parse_trailing_extension(&mut self) -> Extension {
        let start = self.pos;
        let construct = self.construct_label();
        self.bump();
        self.skip_until(&|p: &Parser<'_>, t: &Token| {
            matches!(
                t.token_type,
                TokenType::Union
                    | TokenType::Intersect
                    | TokenType::Except
                    | TokenType::Order
                    | TokenType::Limit
                    | TokenType::Semicolon
            ) || (t.token_type == TokenType::Var
                && p.grammar.trailing_extensions.iter().any(|w| t.is_word(w)))
        });
        self.extension_from(construct, start)
    }

    fn parse_select(&mut self) -> Result<Select> {
        self.expect(TokenType::Select, "SELECT")?;
        let mut select = Select::new(Vec::new());
        if self.match_token(TokenType::Distinct) {
            select.distinct = true;
        } else {
            self.match_token(TokenType::All);
        }
        if self.grammar.supports_top && self.check(TokenType::Top) {
            select.top = Some(self.parse_top()?);
        }

        loop {
            select.projection.push(self.parse_projection_item()?);
            if !self.match_token(TokenType::Comma) {
                break;
            }
        }

        if self.grammar.supports_select_into && self.match_token(TokenType::Into) {
            select.into = Some(self.parse_table_name()?);
        }
        if self.match_token(TokenType::From) {
            select.from = Some(self.parse_from()?);
        }

        loop {
            match self.peek_type() {
                Some(TokenType::Where) if select.where_clause.is_none() => {
                    self.bump();
                    select.where_clause = Some(Where {
                        condition: self.parse_expression()?,
                    });
                }
                Some(TokenType::Group) if select.group_by.is_none() => {
                    select.group_by = Some(self.parse_group_by()?);
                }
                Some(TokenType::Having) if select.having.is_none() => {
                    self.bump();
                    select.having = Some(Having {
                        condition: self.parse_expression()?,
                    });
                }
                Some(TokenType::Qualify) if select.qualify.is_none() => {
                    self.bump();
                    select.qualify = Some(Qualify {
                        condition: self.parse_expression()?,
                    });
                }
                Some(TokenType::Window) if select.named_windows.is_empty() => {
                    self.bump();
                    loop {
                        let name = self.parse_identifier()?;
                        self.expect(TokenType::As, "AS")?;
                        self.expect(TokenType::LParen, "(")?;
                        let spec = self.parse_window_spec_body()?;
                        self.expect(TokenType::RParen, ")")?;
                        select.named_windows.push(NamedWindow { name, spec });
                        if !self.match_token(TokenType::Comma) {
                            break;
                        }
                    }
                }
                Some(TokenType::Var)
                    if self
                        .peek()
                        .is_some_and(|t| self.grammar.select_extensions.iter().any(|w| t.is_word(w))) =>
                {
                    let extension = self.parse_select_extension();
                    select.extensions.push(extension);
                }
                _ => break,
            }
        }
        Ok(select)
    }

    /// `CONNECT BY ...`, `START WITH ...`
    fn parse_select_extension(&mut self) -> Extension {
        let start = self.pos;
        let construct = self.construct_label();
        self.bump();
        self.skip_until(&|p: &Parser<'_>, t: &Token| {
            matches!(
                t.token_type,
                TokenType::Group
                    | TokenType::Having
                    | TokenType::Qualify
                    | TokenType::Window
                    | TokenType::Order
                    | TokenType::Limit
                    | TokenType::Offset
                    | TokenType::Fetch
                    | TokenType::Union
                    | TokenType::Intersect
                    | TokenType::Except
                    | TokenType::Semicolon
            ) || (t.token_type == TokenType::Var
                && (p.grammar.select_extensions.iter().any(|w| t.is_word(w))
                    || p.grammar.trailing_extensions.iter().any(|w| t.is_word(w))))
        });
        self.extension_from(construct, start)
    }

    fn parse_top(&mut self) -> Result<Top> {
        self.expect(TokenType::Top, "TOP")?;
        let count = if self.match_token(TokenType::LParen) {
            let count = self.parse_expression()?;
            self.expect(TokenType::RParen, ")")?;
            count
        } else {
            self.parse_prefix()?
        };
        let percent = self.match_token(TokenType::PercentKw);
        let with_ties = if self.check(TokenType::With) && self.check_nth(1, TokenType::Ties) {
            self.pos += 2;
            true
        } else {
            false
        };
        Ok(Top {
            count,
            percent,
            with_ties,
        })
    }

    fn parse_projection_item(&mut self) -> Result<Expression> {
        // T-SQL `alias = expr`
        if self.dialect().is_tsql_family()
            && self.check_name()
            && self.check_nth(1, TokenType::Eq)
            && !self.peek().is_some_and(|t| t.text.starts_with('@'))
        {
            let alias = self.parse_identifier()?;
            self.bump();
            let expr = self.parse_expression()?;
            return Ok(Expression::alias(expr, alias));
        }
        let expr = self.parse_expression()?;
        self.parse_optional_alias(expr)
    }

    fn parse_optional_alias(&mut self, expr: Expression) -> Result<Expression> {
        if self.match_token(TokenType::As) {
            let alias = self.parse_alias_name()?;
            return Ok(Expression::alias(expr, alias));
        }
        if self.can_start_implicit_alias() {
            let alias = self.parse_identifier()?;
            return Ok(Expression::alias(expr, alias));
        }
        Ok(expr)
    }

    fn parse_alias_name(&mut self) -> Result<Identifier> {
        if let Some(token) = self.peek() {
            if token.token_type == TokenType::String {
                let alias = Identifier::quoted(token.text.clone());
                self.bump();
                return Ok(alias);
            }
        }
        self.parse_identifier()
    }

    fn can_start_implicit_alias(&self) -> bool {
        let Some(token) = self.peek() else {
            return false;
        };
        match token.token_type {
            TokenType::QuotedIdentifier => true,
            TokenType::Var => {
                !token.text.starts_with('@')
                    && !self.grammar.is_extension_word(&token.text)
                    && !self.grammar.statement_prefixes.iter().any(|w| token.is_word(w))
                    && !CLAUSE_WORDS.iter().any(|w| token.is_word(w))
                    && !(self.grammar.mod_keyword && token.is_word("MOD"))
                    && !(self.grammar.div_keyword && token.is_word("DIV"))
            }
            t => ALIAS_KEYWORDS.contains(&t),
        }
    }

    fn parse_group_by(&mut self) -> Result<GroupBy> {
        self.expect(TokenType::Group, "GROUP")?;
        self.expect(TokenType::By, "BY")?;
        let mut expressions = Vec::new();
        loop {
            if self.check_word("GROUPING") && self.check_word_nth(1, "SETS") {
                let start = self.pos;
                self.pos += 2;
                self.expect(TokenType::LParen, "(")?;
                let sets = self.parse_expression_list()?;
                self.expect(TokenType::RParen, ")")?;
                let mut function = Function::new("GROUPING SETS", sets);
                function.span = self.span_from(start);
                expressions.push(Expression::Function(Box::new(function)));
            } else {
                expressions.push(self.parse_expression()?);
            }
            if !self.match_token(TokenType::Comma) {
                break;
            }
        }
        let with_rollup = if self.check(TokenType::With) && self.check_word_nth(1, "ROLLUP") {
            self.pos += 2;
            true
        } else {
            false
        };
        Ok(GroupBy {
            expressions,
            with_rollup,
        })
    }

    fn parse_ordered_list(&mut self) -> Result<Vec<Ordered>> {
        let mut items = Vec::new();
        loop {
            let expr = self.parse_expression()?;
            let desc = if self.match_token(TokenType::Desc) {
                Some(true)
            } else if self.match_token(TokenType::Asc) {
                Some(false)
            } else {
                None
            };
            let nulls_first = if self.match_token(TokenType::Nulls) {
                if self.match_token(TokenType::First) {
                    Some(true)
                } else if self.match_word("LAST") {
                    Some(false)
                } else {
                    return Err(self.error_expected(&["FIRST", "LAST"]));
                }
            } else {
                None
            };
            items.push(Ordered {
                expr,
                desc,
                nulls_first,
            });
            if !self.match_token(TokenType::Comma) {
                break;
            }
        }
        Ok(items)
    }

    // -- FROM ---------------------------------------------------------------

    fn parse_from(&mut self) -> Result<From> {
        let mut from = From {
            relations: vec![self.parse_table_factor()?],
            joins: Vec::new(),
        };
        loop {
            if self.match_token(TokenType::Comma) {
                from.relations.push(self.parse_table_factor()?);
                continue;
            }
            if self.check(TokenType::Lateral) && self.check_word_nth(1, "VIEW") {
                let extension = self.parse_lateral_view();
                let target = match from.joins.last_mut() {
                    Some(join) => &mut join.relation,
                    None => from
                        .relations
                        .last_mut()
                        .ok_or_else(|| Error::internal("FROM without relations"))?,
                };
                extend_factor(target, extension);
                continue;
            }
            match self.parse_join()? {
                Some(join) => from.joins.push(join),
                None => break,
            }
        }
        Ok(from)
    }

    /// Hive `LATERAL VIEW [OUTER] explode(x) t AS a, b`
    fn parse_lateral_view(&mut self) -> Extension {
        let start = self.pos;
        self.pos += 2;
        self.skip_until(&|_: &Parser<'_>, t: &Token| {
            matches!(
                t.token_type,
                TokenType::Where
                    | TokenType::Group
                    | TokenType::Having
                    | TokenType::Order
                    | TokenType::Limit
                    | TokenType::Qualify
                    | TokenType::Window
                    | TokenType::Union
                    | TokenType::Intersect
                    | TokenType::Except
                    | TokenType::Join
                    | TokenType::Left
                    | TokenType::Right
                    | TokenType::Inner
                    | TokenType::Full
                    | TokenType::Cross
                    | TokenType::Natural
                    | TokenType::Lateral
                    | TokenType::Semicolon
            )
        });
        self.extension_from("LATERAL VIEW".to_string(), start)
    }

    fn parse_join(&mut self) -> Result<Option<Join>> {
        let natural = self.match_token(TokenType::Natural);
        let kind = match self.peek_type() {
            Some(TokenType::Join) => {
                self.bump();
                JoinKind::Inner
            }
            Some(TokenType::Inner) => {
                self.bump();
                self.expect(TokenType::Join, "JOIN")?;
                JoinKind::Inner
            }
            Some(TokenType::Left) => {
                self.bump();
                self.match_token(TokenType::Outer);
                self.expect(TokenType::Join, "JOIN")?;
                JoinKind::Left
            }
            Some(TokenType::Right) => {
                self.bump();
                self.match_token(TokenType::Outer);
                self.expect(TokenType::Join, "JOIN")?;
                JoinKind::Right
            }
            Some(TokenType::Full) => {
                self.bump();
                self.match_token(TokenType::Outer);
                self.expect(TokenType::Join, "JOIN")?;
                JoinKind::Full
            }
            Some(TokenType::Cross) => {
                self.bump();
                if self.match_token(TokenType::Apply) {
                    JoinKind::CrossApply
                } else {
                    self.expect(TokenType::Join, "JOIN")?;
                    JoinKind::Cross
                }
            }
            Some(TokenType::Outer) if self.check_nth(1, TokenType::Apply) => {
                self.pos += 2;
                JoinKind::OuterApply
            }
            _ if natural => return Err(self.error_expected(&["JOIN"])),
            _ => return Ok(None),
        };

        let relation = self.parse_table_factor()?;
        let constraint = if natural {
            JoinConstraint::Natural
        } else if self.match_token(TokenType::On) {
            JoinConstraint::On(self.parse_expression()?)
        } else if self.match_token(TokenType::Using) {
            JoinConstraint::Using(self.parse_paren_identifiers()?)
        } else {
            JoinConstraint::None
        };
        Ok(Some(Join {
            kind,
            relation,
            constraint,
        }))
    }

    fn parse_table_factor(&mut self) -> Result<TableFactor> {
        self.enter()?;
        let result = self.parse_table_factor_inner();
        self.leave();
        result
    }

    fn parse_table_factor_inner(&mut self) -> Result<TableFactor> {
        let mut factor = self.parse_table_factor_base()?;
        while self
            .peek()
            .is_some_and(|t| t.token_type == TokenType::Var && self.grammar.table_extensions.iter().any(|w| t.is_word(w)))
        {
            let extension = self.parse_table_extension()?;
            extend_factor(&mut factor, extension);
        }
        Ok(factor)
    }

    fn parse_table_factor_base(&mut self) -> Result<TableFactor> {
        match self.peek_type() {
            Some(TokenType::LParen) => {
                if !matches!(
                    self.nth_type(1),
                    Some(TokenType::Select | TokenType::With | TokenType::LParen | TokenType::Values)
                ) {
                    self.bump();
                    return Err(self.error_expected(&["SELECT", "table"]));
                }
                self.bump();
                let subquery = self.parse_query()?;
                self.expect(TokenType::RParen, ")")?;
                let alias = self.parse_table_alias()?;
                Ok(TableFactor::Derived {
                    lateral: false,
                    subquery: Box::new(subquery),
                    alias,
                })
            }
            Some(TokenType::Lateral) => {
                self.bump();
                if self.match_token(TokenType::LParen) {
                    let subquery = self.parse_query()?;
                    self.expect(TokenType::RParen, ")")?;
                    let alias = self.parse_table_alias()?;
                    return Ok(TableFactor::Derived {
                        lateral: true,
                        subquery: Box::new(subquery),
                        alias,
                    });
                }
                let start = self.pos;
                let name = self.parse_function_name()?;
                let function = self.parse_function_body(name, start)?;
                let alias = self.parse_table_alias()?;
                Ok(TableFactor::Function {
                    lateral: true,
                    function: Box::new(function),
                    alias,
                })
            }
            Some(TokenType::Table) if self.check_nth(1, TokenType::LParen) => {
                let start = self.pos;
                self.pos += 2;
                let inner = self.parse_expression()?;
                self.expect(TokenType::RParen, ")")?;
                let mut function = Function::new("TABLE", vec![inner]);
                function.span = self.span_from(start);
                let alias = self.parse_table_alias()?;
                Ok(TableFactor::Function {
                    lateral: false,
                    function: Box::new(function),
                    alias,
                })
            }
            Some(TokenType::Unique) | None => Err(self.error_expected(&["table"])),
            Some(_) if !self.check_name() => Err(self.error_expected(&["table", "("])),
            Some(_) => {
                let start = self.pos;
                let parts = self.parse_object_name()?;
                if self.check(TokenType::LParen) {
                    let name = function_name_from_parts(&parts);
                    let function = self.parse_function_body(name, start)?;
                    let alias = self.parse_table_alias()?;
                    return Ok(TableFactor::Function {
                        lateral: false,
                        function: Box::new(function),
                        alias,
                    });
                }
                let mut table = self.table_ref_from_parts(parts, start)?;
                table.hints = self.parse_table_hints()?;
                table.alias = self.parse_table_alias()?;
                if table.hints.is_empty() {
                    table.hints = self.parse_table_hints()?;
                }
                Ok(TableFactor::Table(table))
            }
        }
    }

    /// `PIVOT (...) [AS p]`, `MATCH_RECOGNIZE (...)`, `TABLESAMPLE BERNOULLI (10)`
    fn parse_table_extension(&mut self) -> Result<Extension> {
        let start = self.pos;
        let construct = self.upper_at(0);
        self.bump();
        let mut words = 0;
        while !self.check(TokenType::LParen) && words < 3 {
            match self.peek() {
                Some(t) if t.token_type == TokenType::Var || t.token_type.is_keyword() => {
                    self.bump();
                    words += 1;
                }
                _ => break,
            }
        }
        self.skip_group()?;
        if (self.check_word("REPEATABLE") || self.check_word("SEED"))
            && self.check_nth(1, TokenType::LParen)
        {
            self.bump();
            self.skip_group()?;
        }
        if self.match_token(TokenType::As) || self.can_start_implicit_alias() {
            self.parse_identifier()?;
            if self.check(TokenType::LParen) {
                self.parse_paren_identifiers()?;
            }
        }
        Ok(self.extension_from(construct, start))
    }

    /// SQL Server `WITH (NOLOCK)` table hints
    fn parse_table_hints(&mut self) -> Result<Vec<String>> {
        if !(self.dialect().is_tsql_family()
            && self.check(TokenType::With)
            && self.check_nth(1, TokenType::LParen))
        {
            return Ok(Vec::new());
        }
        self.bump();
        let start = self.pos + 1;
        self.skip_group()?;
        let inner = if self.pos - 1 > start {
            let first = self.tokens[start].span.start;
            let last = self.tokens[self.pos - 2].span.end;
            self.source.get(first..last).unwrap_or_default().to_string()
        } else {
            String::new()
        };
        Ok(vec![inner])
    }

    fn parse_table_alias(&mut self) -> Result<Option<TableAlias>> {
        let explicit = self.match_token(TokenType::As);
        if !explicit && !self.can_start_implicit_alias() {
            return Ok(None);
        }
        let name = self.parse_identifier()?;
        let columns = if self.check(TokenType::LParen) {
            self.parse_paren_identifiers()?
        } else {
            Vec::new()
        };
        Ok(Some(TableAlias { name, columns }))
    }

    /// Dotted name parts (`a`, `a.b`, `a.b.c`)
    fn parse_object_name(&mut self) -> Result<Vec<Identifier>> {
        let mut parts = vec![self.parse_identifier()?];
        while self.check(TokenType::Dot) && !self.check_nth(1, TokenType::Star) {
            self.bump();
            if self.check(TokenType::Dot) {
                // SQL Server `db..table`
                parts.push(Identifier::new(""));
                continue;
            }
            parts.push(self.parse_identifier()?);
        }
        Ok(parts)
    }

    fn table_ref_from_parts(&self, mut parts: Vec<Identifier>, start: usize) -> Result<TableRef> {
        if parts.len() > 3 {
            let token = &self.tokens[start];
            return Err(Error::syntax(
                "Table names have at most three parts",
                token.span,
                vec!["catalog.schema.table".to_string()],
                token.text.clone(),
            ));
        }
        let name = parts.pop().ok_or_else(|| Error::internal("empty table name"))?;
        let schema = parts.pop();
        let catalog = parts.pop();
        Ok(TableRef {
            catalog,
            schema,
            name,
            alias: None,
            hints: Vec::new(),
            span: self.span_from(start),
        })
    }

    /// A table name without alias
    pub fn parse_table_name(&mut self) -> Result<TableRef> {
        let start = self.pos;
        let parts = self.parse_object_name()?;
        self.table_ref_from_parts(parts, start)
    }

    fn parse_table_name_with_alias(&mut self) -> Result<TableRef> {
        let mut table = self.parse_table_name()?;
        table.alias = self.parse_table_alias()?;
        Ok(table)
    }

    // -- expressions --------------------------------------------------------

    pub fn parse_expression(&mut self) -> Result<Expression> {
        self.parse_expr_bp(0)
    }

    fn parse_expression_list(&mut self) -> Result<Vec<Expression>> {
        let mut items = Vec::new();
        if self.check(TokenType::RParen) {
            return Ok(items);
        }
        loop {
            items.push(self.parse_expression()?);
            if !self.match_token(TokenType::Comma) {
                break;
            }
        }
        Ok(items)
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Expression> {
        self.enter()?;
        let result = self.parse_expr_bp_inner(min_bp);
        self.leave();
        result
    }

    fn parse_expr_bp_inner(&mut self, min_bp: u8) -> Result<Expression> {
        let mut left = self.parse_prefix()?;
        loop {
            let Some(token_type) = self.peek_type() else {
                break;
            };

            if let Some(expr) = self.parse_postfix(&mut left)? {
                left = expr;
                continue;
            }

            if let Some(op) = self.peek().and_then(|t| self.binary_operator(t)) {
                let lbp = self.grammar.precedence.level(op) * 2;
                if lbp < min_bp {
                    break;
                }
                self.bump();
                let right = self.parse_expr_bp(lbp + 1)?;
                left = Expression::binary(op, left, right);
                continue;
            }

            let comparison = prec::COMPARISON * 2;
            let special = match token_type {
                TokenType::Is
                | TokenType::In
                | TokenType::Between
                | TokenType::Like
                | TokenType::ILike
                | TokenType::RLike => true,
                TokenType::Not => matches!(
                    self.nth_type(1),
                    Some(
                        TokenType::In
                            | TokenType::Between
                            | TokenType::Like
                            | TokenType::ILike
                            | TokenType::RLike
                    )
                ),
                _ => false,
            };
            if special && comparison >= min_bp {
                left = self.parse_comparison_special(left)?;
                continue;
            }
            break;
        }
        Ok(left)
    }

    /// Cast-level postfix forms: `::type`, `[index]`, `:path`, `->key`
    fn parse_postfix(&mut self, left: &mut Expression) -> Result<Option<Expression>> {
        let Some(token_type) = self.peek_type() else {
            return Ok(None);
        };
        let take = |left: &mut Expression| std::mem::replace(left, Expression::Null);
        match token_type {
            TokenType::DColon if self.grammar.double_colon_cast => {
                let start = self.pos;
                self.bump();
                let to = self.parse_data_type()?;
                Ok(Some(Expression::Cast(Box::new(Cast {
                    expr: take(left),
                    to,
                    kind: CastKind::DoubleColon,
                    format: None,
                    span: self.span_from(start),
                }))))
            }
            TokenType::LBracket => {
                self.bump();
                let index = self.parse_expression()?;
                self.expect(TokenType::RBracket, "]")?;
                Ok(Some(Expression::Subscript(Box::new(Subscript {
                    expr: take(left),
                    index,
                }))))
            }
            TokenType::Colon
                if self.grammar.colon_json_access
                    && matches!(
                        left,
                        Expression::Column(_) | Expression::JsonAccess(_) | Expression::Subscript(_)
                    )
                    && self.peek_nth(1).is_some_and(|t| {
                        Self::is_name_token(t) || t.token_type == TokenType::Number
                    }) =>
            {
                self.bump();
                let start = self.pos;
                self.bump();
                loop {
                    if self.check(TokenType::Dot) && self.peek_nth(1).is_some_and(Self::is_name_token) {
                        self.pos += 2;
                    } else if self.check(TokenType::LBracket) {
                        let mut depth = 0usize;
                        while let Some(t) = self.peek_type() {
                            self.bump();
                            match t {
                                TokenType::LBracket => depth += 1,
                                TokenType::RBracket => {
                                    depth -= 1;
                                    if depth == 0 {
                                        break;
                                    }
                                }
                                _ => {}
                            }
                        }
                    } else {
                        break;
                    }
                }
                let path = self.raw_from(start);
                Ok(Some(Expression::JsonAccess(Box::new(JsonAccess {
                    expr: take(left),
                    kind: JsonAccessKind::Colon,
                    path: Expression::string(path),
                }))))
            }
            TokenType::Arrow | TokenType::DArrow => {
                let kind = if token_type == TokenType::Arrow {
                    JsonAccessKind::Arrow
                } else {
                    JsonAccessKind::DoubleArrow
                };
                self.bump();
                let path = self.parse_prefix()?;
                Ok(Some(Expression::JsonAccess(Box::new(JsonAccess {
                    expr: take(left),
                    kind,
                    path,
                }))))
            }
            _ => Ok(None),
        }
    }

    fn binary_operator(&self, token: &Token) -> Option<BinaryOperator> {
        use BinaryOperator as B;
        let g = self.grammar;
        Some(match token.token_type {
            TokenType::Or => B::Or,
            TokenType::And => B::And,
            TokenType::Eq => B::Eq,
            TokenType::Neq => B::Neq,
            TokenType::Lt => B::Lt,
            TokenType::Lte => B::Lte,
            TokenType::Gt => B::Gt,
            TokenType::Gte => B::Gte,
            TokenType::NullsafeEq => B::NullsafeEq,
            TokenType::DPipe if g.dpipe_is_concat => B::Concat,
            TokenType::DPipe => B::Or,
            TokenType::Plus => B::Plus,
            TokenType::Dash => B::Minus,
            TokenType::Star => B::Multiply,
            TokenType::Slash => B::Divide,
            TokenType::Percent => B::Modulo,
            TokenType::DStar if g.dstar_is_power => B::Power,
            TokenType::Caret if g.caret_is_power => B::Power,
            TokenType::Caret => B::BitwiseXor,
            TokenType::Pipe => B::BitwiseOr,
            TokenType::Amp => B::BitwiseAnd,
            TokenType::LtLt => B::ShiftLeft,
            TokenType::GtGt => B::ShiftRight,
            TokenType::Var if g.mod_keyword && token.is_word("MOD") => B::Modulo,
            TokenType::Var if g.div_keyword && token.is_word("DIV") => B::IntDivide,
            TokenType::Var if g.dialect == DialectType::MySQL && token.is_word("XOR") => B::Xor,
            _ => return None,
        })
    }

    fn parse_comparison_special(&mut self, left: Expression) -> Result<Expression> {
        let rbp = prec::COMPARISON * 2 + 1;
        if self.match_token(TokenType::Is) {
            let negated = self.match_token(TokenType::Not);
            if self.match_token(TokenType::Null) {
                return Ok(Expression::IsNull(Box::new(IsNull {
                    expr: left,
                    negated,
                })));
            }
            if self.match_token(TokenType::Distinct) {
                self.expect(TokenType::From, "FROM")?;
                let right = self.parse_expr_bp(rbp)?;
                let op = if negated {
                    BinaryOperator::IsNotDistinctFrom
                } else {
                    BinaryOperator::IsDistinctFrom
                };
                return Ok(Expression::binary(op, left, right));
            }
            let value = if self.match_token(TokenType::True) {
                true
            } else if self.match_token(TokenType::False) {
                false
            } else {
                return Err(self.error_expected(&["NULL", "DISTINCT FROM", "TRUE", "FALSE"]));
            };
            let op = if negated {
                BinaryOperator::IsDistinctFrom
            } else {
                BinaryOperator::IsNotDistinctFrom
            };
            return Ok(Expression::binary(op, left, Expression::Boolean(value)));
        }

        let negated = self.match_token(TokenType::Not);
        match self.peek_type() {
            Some(TokenType::In) => {
                self.bump();
                self.expect(TokenType::LParen, "(")?;
                let target = if matches!(self.peek_type(), Some(TokenType::Select | TokenType::With)) {
                    InTarget::Subquery(Box::new(self.parse_query()?))
                } else {
                    InTarget::List(self.parse_expression_list()?)
                };
                self.expect(TokenType::RParen, ")")?;
                Ok(Expression::In(Box::new(In {
                    expr: left,
                    target,
                    negated,
                })))
            }
            Some(TokenType::Between) => {
                self.bump();
                let low = self.parse_expr_bp(rbp)?;
                self.expect(TokenType::And, "AND")?;
                let high = self.parse_expr_bp(rbp)?;
                Ok(Expression::Between(Box::new(Between {
                    expr: left,
                    low,
                    high,
                    negated,
                })))
            }
            Some(t @ (TokenType::Like | TokenType::ILike | TokenType::RLike)) => {
                let kind = match t {
                    TokenType::ILike => LikeKind::ILike,
                    TokenType::RLike => LikeKind::RLike,
                    _ => LikeKind::Like,
                };
                self.bump();
                let pattern = self.parse_expr_bp(rbp)?;
                let escape = if self.match_token(TokenType::Escape) {
                    Some(self.parse_expr_bp(rbp)?)
                } else {
                    None
                };
                Ok(Expression::Like(Box::new(Like {
                    kind,
                    expr: left,
                    pattern,
                    escape,
                    negated,
                })))
            }
            _ => Err(self.error_expected(&["IN", "BETWEEN", "LIKE"])),
        }
    }

    fn parse_prefix(&mut self) -> Result<Expression> {
        let Some(token) = self.peek().cloned() else {
            return Err(self.error_expected(&["expression"]));
        };
        match token.token_type {
            TokenType::Number => {
                self.bump();
                Ok(Expression::Literal(Literal::Number(token.text)))
            }
            TokenType::String | TokenType::DollarString => {
                self.bump();
                Ok(Expression::Literal(Literal::String(token.text)))
            }
            TokenType::NationalString => {
                self.bump();
                Ok(Expression::Literal(Literal::NationalString(token.text)))
            }
            TokenType::HexString => {
                self.bump();
                Ok(Expression::Literal(Literal::HexString(token.text)))
            }
            TokenType::Null => {
                self.bump();
                Ok(Expression::Null)
            }
            TokenType::True => {
                self.bump();
                Ok(Expression::Boolean(true))
            }
            TokenType::False => {
                self.bump();
                Ok(Expression::Boolean(false))
            }
            TokenType::Parameter => {
                self.bump();
                let (name, kind) = match token.text.strip_prefix('$') {
                    Some(number) => (number.to_string(), ParameterKind::Numbered),
                    None => (String::new(), ParameterKind::Positional),
                };
                Ok(Expression::Parameter(Parameter {
                    name,
                    kind,
                    span: token.span,
                }))
            }
            TokenType::Colon
                if self
                    .peek_nth(1)
                    .is_some_and(|t| Self::is_name_token(t) || t.token_type == TokenType::Number) =>
            {
                let start = self.pos;
                self.bump();
                let name = self.advance().map(|t| t.text).unwrap_or_default();
                Ok(Expression::Parameter(Parameter {
                    name,
                    kind: ParameterKind::Colon,
                    span: self.span_from(start),
                }))
            }
            TokenType::Star => {
                self.bump();
                let except = self.parse_star_except()?;
                Ok(Expression::Star(Star {
                    qualifier: Vec::new(),
                    except,
                }))
            }
            TokenType::LParen => self.parse_paren(),
            TokenType::LBracket => {
                self.bump();
                let items = self.parse_bracket_list()?;
                Ok(Expression::Array(items))
            }
            TokenType::Case => self.parse_case(),
            TokenType::Cast => self.parse_cast(CastKind::Cast),
            TokenType::TryCast => self.parse_cast(CastKind::TryCast),
            TokenType::Extract => self.parse_extract(),
            TokenType::Interval => self.parse_interval(),
            TokenType::Exists => {
                self.bump();
                self.expect(TokenType::LParen, "(")?;
                let query = self.parse_query()?;
                self.expect(TokenType::RParen, ")")?;
                Ok(Expression::Exists(Box::new(Exists {
                    query: Box::new(query),
                    negated: false,
                })))
            }
            TokenType::Not => {
                self.bump();
                let operand = self.parse_expr_bp(prec::NOT * 2 + 1)?;
                Ok(Expression::not(operand))
            }
            TokenType::Dash | TokenType::Plus | TokenType::Tilde => {
                self.bump();
                let operand = self.parse_expr_bp(prec::UNARY * 2 + 1)?;
                let op = match token.token_type {
                    TokenType::Dash => UnaryOperator::Minus,
                    TokenType::Plus => UnaryOperator::Plus,
                    _ => UnaryOperator::BitwiseNot,
                };
                Ok(Expression::Unary(Box::new(UnaryOp { op, expr: operand })))
            }
            TokenType::Any
            | TokenType::Left
            | TokenType::Right
            | TokenType::Replace
            | TokenType::If
            | TokenType::Insert
            | TokenType::Truncate
                if self.check_nth(1, TokenType::LParen) =>
            {
                let start = self.pos;
                self.bump();
                self.parse_function_call(token.upper(), start)
            }
            TokenType::Var | TokenType::QuotedIdentifier => self.parse_name_expression(),
            t if t.is_keyword() && !t.is_reserved() => self.parse_name_expression(),
            _ => Err(self.error_expected(&["expression"])),
        }
    }

    fn parse_star_except(&mut self) -> Result<Vec<Identifier>> {
        let opens_list = (self.check_word("EXCLUDE") || self.check(TokenType::Except))
            && self.check_nth(1, TokenType::LParen);
        if !opens_list {
            return Ok(Vec::new());
        }
        self.bump();
        self.parse_paren_identifiers()
    }

    fn parse_bracket_list(&mut self) -> Result<Vec<Expression>> {
        let mut items = Vec::new();
        if !self.check(TokenType::RBracket) {
            loop {
                items.push(self.parse_expression()?);
                if !self.match_token(TokenType::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenType::RBracket, "]")?;
        Ok(items)
    }

    fn parse_paren(&mut self) -> Result<Expression> {
        self.expect(TokenType::LParen, "(")?;
        if matches!(self.peek_type(), Some(TokenType::Select | TokenType::With)) {
            let query = self.parse_query()?;
            self.expect(TokenType::RParen, ")")?;
            return Ok(Expression::Subquery(Box::new(query)));
        }
        if self.match_token(TokenType::RParen) {
            return Ok(Expression::Tuple(Vec::new()));
        }
        let first = self.parse_expression()?;
        if self.match_token(TokenType::Comma) {
            let mut items = vec![first];
            loop {
                items.push(self.parse_expression()?);
                if !self.match_token(TokenType::Comma) {
                    break;
                }
            }
            self.expect(TokenType::RParen, ")")?;
            return Ok(Expression::Tuple(items));
        }
        self.expect(TokenType::RParen, ")")?;
        Ok(Expression::paren(first))
    }

    /// Identifiers, qualified columns, function calls and typed literals
    fn parse_name_expression(&mut self) -> Result<Expression> {
        let start = self.pos;
        let Some(token) = self.peek().cloned() else {
            return Err(self.error_expected(&["expression"]));
        };
        let unquoted = token.token_type != TokenType::QuotedIdentifier;
        let upper = token.upper();

        if unquoted {
            if token.text.starts_with('@') {
                self.bump();
                return Ok(Expression::Parameter(Parameter {
                    name: token.text[1..].to_string(),
                    kind: ParameterKind::At,
                    span: token.span,
                }));
            }
            if self.check_nth(1, TokenType::String) {
                let literal = match upper.as_str() {
                    "DATE" => Some(Literal::Date as fn(String) -> Literal),
                    "TIME" => Some(Literal::Time as fn(String) -> Literal),
                    "TIMESTAMP" => Some(Literal::Timestamp as fn(String) -> Literal),
                    _ => None,
                };
                if let Some(make) = literal {
                    self.bump();
                    let value = self.advance().map(|t| t.text).unwrap_or_default();
                    return Ok(Expression::Literal(make(value)));
                }
            }
            if self.check_nth(1, TokenType::LParen) {
                match upper.as_str() {
                    "SAFE_CAST" => return self.parse_cast(CastKind::SafeCast),
                    "TRIM" => return self.parse_trim(),
                    _ => {}
                }
            }
            if upper == "ARRAY" && self.check_nth(1, TokenType::LBracket) {
                self.pos += 2;
                let items = self.parse_bracket_list()?;
                return Ok(Expression::Array(items));
            }
            if NILADIC_FUNCTIONS.contains(&upper.as_str()) && !self.check_nth(1, TokenType::LParen) {
                self.bump();
                let mut function = Function::new(upper, Vec::new());
                function.span = token.span;
                return Ok(Expression::Function(Box::new(function)));
            }
        }

        let mut parts = vec![self.parse_identifier()?];
        while self.check(TokenType::Dot) {
            if self.check_nth(1, TokenType::Star) {
                self.pos += 2;
                let except = self.parse_star_except()?;
                return Ok(Expression::Star(Star {
                    qualifier: parts,
                    except,
                }));
            }
            self.bump();
            parts.push(self.parse_identifier()?);
        }

        if self.grammar.supports_join_mark
            && self.check(TokenType::LParen)
            && self.check_nth(1, TokenType::Plus)
            && self.check_nth(2, TokenType::RParen)
        {
            let span = self.span_from(start);
            self.pos += 3;
            let mut column = column_from_parts(parts, span)?;
            column.join_mark = true;
            return Ok(Expression::Column(column));
        }

        if self.check(TokenType::LParen) {
            let name = function_name_from_parts(&parts);
            return self.parse_function_call(name, start);
        }

        let span = self.span_from(start);
        Ok(Expression::Column(column_from_parts(parts, span)?))
    }

    fn parse_function_name(&mut self) -> Result<String> {
        let parts = self.parse_object_name()?;
        Ok(function_name_from_parts(&parts))
    }

    /// Call with optional `OVER (...)`; the name is already consumed
    fn parse_function_call(&mut self, name: String, start: usize) -> Result<Expression> {
        let function = self.parse_function_body(name, start)?;
        let null_treatment = self.parse_null_treatment();
        if self.check(TokenType::Over) {
            let over = self.parse_over()?;
            return Ok(Expression::Window(Box::new(WindowFunction {
                function,
                null_treatment,
                over,
            })));
        }
        if let Some(treatment) = null_treatment {
            let mut function = function;
            function.null_treatment = Some(treatment);
            return Ok(Expression::Function(Box::new(function)));
        }
        Ok(Expression::Function(Box::new(function)))
    }

    fn parse_null_treatment(&mut self) -> Option<NullTreatment> {
        let treatment = if self.check_word("IGNORE") {
            NullTreatment::IgnoreNulls
        } else if self.check_word("RESPECT") {
            NullTreatment::RespectNulls
        } else {
            return None;
        };
        if !self.check_nth(1, TokenType::Nulls) {
            return None;
        }
        self.pos += 2;
        Some(treatment)
    }

    /// Argument list and aggregate modifiers: `(args) [WITHIN GROUP (...)] [FILTER (...)]`
    fn parse_function_body(&mut self, name: String, start: usize) -> Result<Function> {
        self.expect(TokenType::LParen, "(")?;
        let mut function = Function::new(name, Vec::new());

        if !self.match_token(TokenType::RParen) {
            if self.match_token(TokenType::Distinct) {
                function.distinct = true;
            } else {
                self.match_token(TokenType::All);
            }
            self.parse_function_args(&mut function)?;
            function.null_treatment = self.parse_null_treatment();
            if self.check(TokenType::Order) && self.check_nth(1, TokenType::By) {
                self.pos += 2;
                function.order_by = self.parse_ordered_list()?;
            }
            if self.check_word("SEPARATOR") {
                let name = Identifier::new("SEPARATOR");
                self.bump();
                let value = self.parse_expression()?;
                function
                    .args
                    .push(Expression::NamedArgument(Box::new(NamedArgument {
                        name,
                        value,
                        style: NamedArgStyle::Keyword,
                    })));
            }
            self.expect(TokenType::RParen, ")")?;
        }

        if self.check(TokenType::Within) && self.check_nth(1, TokenType::Group) {
            self.pos += 2;
            self.expect(TokenType::LParen, "(")?;
            self.expect(TokenType::Order, "ORDER")?;
            self.expect(TokenType::By, "BY")?;
            function.within_group = self.parse_ordered_list()?;
            self.expect(TokenType::RParen, ")")?;
        }
        if self.check(TokenType::Filter) && self.check_nth(1, TokenType::LParen) {
            self.pos += 2;
            self.expect(TokenType::Where, "WHERE")?;
            function.filter = Some(self.parse_expression()?);
            self.expect(TokenType::RParen, ")")?;
        }
        function.span = self.span_from(start);
        Ok(function)
    }

    fn parse_function_args(&mut self, function: &mut Function) -> Result<()> {
        let name = function.name.clone();
        let tsql = self.dialect().is_tsql_family();

        if tsql && matches!(name.as_str(), "CONVERT" | "TRY_CONVERT") {
            function.args.push(Expression::DataType(self.parse_data_type()?));
            if !self.match_token(TokenType::Comma) {
                return Err(self.error_expected(&[","]));
            }
        }

        if name == "POSITION" {
            let needle = self.parse_expr_bp(prec::COMPARISON * 2 + 1)?;
            function.args.push(needle);
            if self.match_token(TokenType::In) {
                function.args.push(self.parse_expression()?);
                return Ok(());
            }
            if !self.match_token(TokenType::Comma) {
                return Ok(());
            }
        }

        loop {
            let named = self
                .peek()
                .is_some_and(|t| Self::is_name_token(t) || t.token_type.is_keyword());
            let arg = if named && self.check_nth(1, TokenType::FArrow) {
                // `outer => TRUE`: reserved words are fine as argument names
                let arg_name = match self.advance() {
                    Some(t) if t.token_type == TokenType::QuotedIdentifier => Identifier::quoted(t.text.clone()),
                    Some(t) => Identifier::new(t.text.clone()),
                    None => return Err(self.error_expected(&["identifier"])),
                };
                self.bump();
                let value = self.parse_expression()?;
                Expression::NamedArgument(Box::new(NamedArgument {
                    name: arg_name,
                    value,
                    style: NamedArgStyle::Arrow,
                }))
            } else {
                self.parse_expression()?
            };
            function.args.push(arg);

            if matches!(name.as_str(), "SUBSTRING" | "SUBSTR") && self.match_token(TokenType::From) {
                function.args.push(self.parse_expression()?);
                if self.match_word("FOR") {
                    function.args.push(self.parse_expression()?);
                }
                break;
            }
            if name == "CONVERT" && self.dialect() == DialectType::MySQL {
                if self.match_token(TokenType::Comma) {
                    function.args.push(Expression::DataType(self.parse_data_type()?));
                } else if self.match_token(TokenType::Using) {
                    let charset = self.parse_identifier()?;
                    function
                        .args
                        .push(Expression::NamedArgument(Box::new(NamedArgument {
                            name: Identifier::new("USING"),
                            value: Expression::Column(Column::new(charset.name)),
                            style: NamedArgStyle::Keyword,
                        })));
                }
                break;
            }
            if !self.match_token(TokenType::Comma) {
                break;
            }
        }
        Ok(())
    }

    fn parse_over(&mut self) -> Result<WindowSpec> {
        self.expect(TokenType::Over, "OVER")?;
        if !self.check(TokenType::LParen) {
            let name = self.parse_identifier()?;
            let mut spec = WindowSpec::empty();
            spec.name = Some(name);
            return Ok(spec);
        }
        self.bump();
        let spec = self.parse_window_spec_body()?;
        self.expect(TokenType::RParen, ")")?;
        Ok(spec)
    }

    fn parse_window_spec_body(&mut self) -> Result<WindowSpec> {
        let mut spec = WindowSpec::empty();
        if self.check_name()
            && !matches!(
                self.peek_type(),
                Some(TokenType::Partition | TokenType::Rows | TokenType::Range)
            )
        {
            spec.name = Some(self.parse_identifier()?);
        }
        if self.match_token(TokenType::Partition) {
            self.expect(TokenType::By, "BY")?;
            loop {
                spec.partition_by.push(self.parse_expression()?);
                if !self.match_token(TokenType::Comma) {
                    break;
                }
            }
        }
        if self.match_token(TokenType::Order) {
            self.expect(TokenType::By, "BY")?;
            spec.order_by = self.parse_ordered_list()?;
        }
        let units = match self.peek_type() {
            Some(TokenType::Rows) => Some(FrameUnits::Rows),
            Some(TokenType::Range) => Some(FrameUnits::Range),
            _ => None,
        };
        if let Some(units) = units {
            self.bump();
            let (start, end) = if self.match_token(TokenType::Between) {
                let start = self.parse_frame_bound()?;
                self.expect(TokenType::And, "AND")?;
                (start, Some(self.parse_frame_bound()?))
            } else {
                (self.parse_frame_bound()?, None)
            };
            spec.frame = Some(WindowFrame { units, start, end });
        }
        Ok(spec)
    }

    fn parse_frame_bound(&mut self) -> Result<FrameBound> {
        if self.match_token(TokenType::Unbounded) {
            if self.match_token(TokenType::Preceding) {
                return Ok(FrameBound::UnboundedPreceding);
            }
            if self.match_token(TokenType::Following) {
                return Ok(FrameBound::UnboundedFollowing);
            }
            return Err(self.error_expected(&["PRECEDING", "FOLLOWING"]));
        }
        if self.match_token(TokenType::Current) {
            self.expect(TokenType::Row, "ROW")?;
            return Ok(FrameBound::CurrentRow);
        }
        let offset = self.parse_expr_bp(prec::AND * 2 + 1)?;
        if self.match_token(TokenType::Preceding) {
            Ok(FrameBound::Preceding(offset))
        } else if self.match_token(TokenType::Following) {
            Ok(FrameBound::Following(offset))
        } else {
            Err(self.error_expected(&["PRECEDING", "FOLLOWING"]))
        }
    }

    fn parse_case(&mut self) -> Result<Expression> {
        self.expect(TokenType::Case, "CASE")?;
        let operand = if self.check(TokenType::When) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        let mut whens = Vec::new();
        while self.match_token(TokenType::When) {
            let condition = self.parse_expression()?;
            self.expect(TokenType::Then, "THEN")?;
            let result = self.parse_expression()?;
            whens.push((condition, result));
        }
        if whens.is_empty() {
            return Err(self.error_expected(&["WHEN"]));
        }
        let else_result = if self.match_token(TokenType::Else) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect(TokenType::End, "END")?;
        Ok(Expression::Case(Box::new(Case {
            operand,
            whens,
            else_result,
        })))
    }

    fn parse_cast(&mut self, kind: CastKind) -> Result<Expression> {
        let start = self.pos;
        self.bump();
        self.expect(TokenType::LParen, "(")?;
        let expr = self.parse_expression()?;
        self.expect(TokenType::As, "AS")?;
        let to = self.parse_data_type()?;
        let format = if self.match_word("FORMAT") {
            Some(self.expect(TokenType::String, "format string")?.text)
        } else {
            None
        };
        self.expect(TokenType::RParen, ")")?;
        Ok(Expression::Cast(Box::new(Cast {
            expr,
            to,
            kind,
            format,
            span: self.span_from(start),
        })))
    }

    fn parse_extract(&mut self) -> Result<Expression> {
        self.expect(TokenType::Extract, "EXTRACT")?;
        self.expect(TokenType::LParen, "(")?;
        let field = match self.peek() {
            Some(t) if Self::is_name_token(t) || t.token_type == TokenType::String => t.upper(),
            _ => return Err(self.error_expected(&["date part"])),
        };
        self.bump();
        self.expect(TokenType::From, "FROM")?;
        let expr = self.parse_expression()?;
        self.expect(TokenType::RParen, ")")?;
        Ok(Expression::Extract(Box::new(Extract { field, expr })))
    }

    fn parse_trim(&mut self) -> Result<Expression> {
        self.bump();
        self.expect(TokenType::LParen, "(")?;
        let position = if self.match_word("BOTH") {
            Some(TrimPosition::Both)
        } else if self.match_word("LEADING") {
            Some(TrimPosition::Leading)
        } else if self.match_word("TRAILING") {
            Some(TrimPosition::Trailing)
        } else {
            None
        };
        let (characters, expr) = if position.is_some() && self.match_token(TokenType::From) {
            (None, self.parse_expression()?)
        } else {
            let first = self.parse_expression()?;
            if self.match_token(TokenType::From) {
                (Some(first), self.parse_expression()?)
            } else if self.match_token(TokenType::Comma) {
                (Some(self.parse_expression()?), first)
            } else {
                (None, first)
            }
        };
        self.expect(TokenType::RParen, ")")?;
        Ok(Expression::Trim(Box::new(Trim {
            position,
            characters,
            expr,
        })))
    }

    fn parse_interval(&mut self) -> Result<Expression> {
        self.expect(TokenType::Interval, "INTERVAL")?;
        let value = self.parse_prefix()?;
        let unit = self.parse_interval_unit()?;
        let to_unit = if unit.is_some() && self.check_word("TO") {
            self.bump();
            let to = self.parse_interval_unit()?;
            if to.is_none() {
                return Err(self.error_expected(&["interval unit"]));
            }
            to
        } else {
            None
        };
        Ok(Expression::Interval(Box::new(Interval {
            value,
            unit,
            to_unit,
        })))
    }

    fn parse_interval_unit(&mut self) -> Result<Option<String>> {
        let upper = self.upper_at(0);
        if !INTERVAL_UNITS.contains(&upper.as_str()) {
            return Ok(None);
        }
        self.bump();
        if self.check(TokenType::LParen) {
            self.skip_group()?;
        }
        Ok(Some(upper))
    }

    // -- data types ---------------------------------------------------------

    pub fn parse_data_type(&mut self) -> Result<DataType> {
        let Some(token) = self.peek().cloned() else {
            return Err(self.error_expected(&["data type"]));
        };
        if !(token.token_type == TokenType::Var
            || token.token_type == TokenType::QuotedIdentifier
            || token.token_type.is_keyword())
        {
            return Err(self.error_expected(&["data type"]));
        }
        self.bump();
        let name = token.upper();
        let dialect = self.dialect();

        let mut data_type = match name.as_str() {
            "BOOLEAN" | "BOOL" => DataType::Boolean,
            "BIT" => {
                if self.check(TokenType::LParen) && dialect == DialectType::MySQL {
                    DataType::Custom {
                        name,
                        args: self.parse_raw_type_args()?,
                    }
                } else {
                    self.parse_optional_length()?;
                    DataType::Boolean
                }
            }
            "TINYINT" | "BYTEINT" | "INT1" => {
                self.parse_optional_length()?;
                DataType::TinyInt {
                    unsigned: self.match_word("UNSIGNED"),
                }
            }
            "SMALLINT" | "INT2" => {
                self.parse_optional_length()?;
                DataType::SmallInt {
                    unsigned: self.match_word("UNSIGNED"),
                }
            }
            "INT" | "INTEGER" | "INT4" | "MEDIUMINT" | "SIGNED" => {
                self.parse_optional_length()?;
                let unsigned = self.match_word("UNSIGNED");
                self.match_word("INTEGER");
                DataType::Int { unsigned }
            }
            "UNSIGNED" => {
                self.match_word("INTEGER");
                DataType::Int { unsigned: true }
            }
            "BIGINT" | "INT8" | "INT64" => {
                self.parse_optional_length()?;
                DataType::BigInt {
                    unsigned: self.match_word("UNSIGNED"),
                }
            }
            "DECIMAL" | "DEC" | "NUMERIC" | "NUMBER" => {
                let (precision, scale) = self.parse_precision_scale()?;
                self.match_word("UNSIGNED");
                DataType::Decimal { precision, scale }
            }
            "BIGNUMERIC" | "BIGDECIMAL" => {
                let (precision, scale) = self.parse_precision_scale()?;
                DataType::Decimal {
                    precision: precision.or(Some(76)),
                    scale: scale.or(Some(38)),
                }
            }
            "FLOAT" => match self.parse_precision_scale()? {
                (Some(precision), Some(scale)) => DataType::ScaledFloat {
                    double: false,
                    precision,
                    scale,
                },
                (precision, _) => DataType::Float { precision },
            },
            "FLOAT4" | "REAL" | "BINARY_FLOAT" => DataType::Real,
            "FLOAT8" | "FLOAT64" | "BINARY_DOUBLE" => DataType::Double,
            "DOUBLE" => {
                self.match_word("PRECISION");
                match self.parse_precision_scale()? {
                    (Some(precision), Some(scale)) => DataType::ScaledFloat {
                        double: true,
                        precision,
                        scale,
                    },
                    _ => DataType::Double,
                }
            }
            "MONEY" => DataType::Money,
            "SMALLMONEY" => DataType::SmallMoney,
            "CHAR" | "CHARACTER" => {
                if self.match_word("VARYING") {
                    DataType::VarChar {
                        length: self.parse_optional_length()?,
                    }
                } else {
                    DataType::Char {
                        length: fixed_length(self.parse_optional_length()?),
                    }
                }
            }
            "NCHAR" => {
                if self.match_word("VARYING") {
                    DataType::NVarChar {
                        length: self.parse_optional_length()?,
                    }
                } else {
                    DataType::NChar {
                        length: fixed_length(self.parse_optional_length()?),
                    }
                }
            }
            "VARCHAR" | "VARCHAR2" | "BPCHAR" => DataType::VarChar {
                length: self.parse_optional_length()?,
            },
            "NVARCHAR" | "NVARCHAR2" => DataType::NVarChar {
                length: self.parse_optional_length()?,
            },
            "LONG" if self.check_word("VARCHAR") => {
                self.bump();
                DataType::VarChar { length: None }
            }
            "STRING" => {
                self.parse_optional_length()?;
                DataType::String
            }
            "TEXT" | "TINYTEXT" | "MEDIUMTEXT" | "LONGTEXT" | "NTEXT" => DataType::Text,
            "CLOB" | "NCLOB" | "LONG" => {
                self.parse_optional_length()?;
                DataType::Clob
            }
            "BINARY" | "BYTE" => DataType::Binary {
                length: fixed_length(self.parse_optional_length()?),
            },
            "VARBINARY" | "VARBYTE" | "RAW" => DataType::VarBinary {
                length: self.parse_optional_length()?,
            },
            "BYTEA" | "BYTES" => {
                self.parse_optional_length()?;
                DataType::VarBinary { length: None }
            }
            "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "IMAGE" => {
                self.parse_optional_length()?;
                DataType::Blob
            }
            "DATE" => DataType::Date,
            "TIME" => {
                let precision = self.parse_optional_precision()?;
                let zone = self.parse_time_zone_clause();
                DataType::Time {
                    precision,
                    with_time_zone: zone == Some(TimestampZone::With),
                }
            }
            "TIMETZ" => DataType::Time {
                precision: self.parse_optional_precision()?,
                with_time_zone: true,
            },
            "TIMESTAMP" if dialect.is_tsql_family() => DataType::Custom {
                name: "ROWVERSION".to_string(),
                args: Vec::new(),
            },
            "TIMESTAMP" => {
                let precision = self.parse_optional_precision()?;
                let default_zone = if matches!(dialect, DialectType::BigQuery | DialectType::Databricks) {
                    TimestampZone::Local
                } else {
                    TimestampZone::Without
                };
                DataType::Timestamp {
                    precision,
                    zone: self.parse_time_zone_clause().unwrap_or(default_zone),
                }
            }
            "TIMESTAMP_NTZ" | "TIMESTAMPNTZ" => DataType::Timestamp {
                precision: self.parse_optional_precision()?,
                zone: TimestampZone::Without,
            },
            "TIMESTAMP_LTZ" | "TIMESTAMPLTZ" => DataType::Timestamp {
                precision: self.parse_optional_precision()?,
                zone: TimestampZone::Local,
            },
            "TIMESTAMP_TZ" | "TIMESTAMPTZ" => DataType::Timestamp {
                precision: self.parse_optional_precision()?,
                zone: TimestampZone::With,
            },
            "DATETIME" if dialect.is_tsql_family() || dialect == DialectType::MySQL => {
                DataType::DateTime {
                    kind: DateTimeKind::DateTime,
                    precision: self.parse_optional_precision()?,
                }
            }
            "DATETIME" => DataType::Timestamp {
                precision: self.parse_optional_precision()?,
                zone: TimestampZone::Without,
            },
            "DATETIME2" => DataType::DateTime {
                kind: DateTimeKind::DateTime2,
                precision: self.parse_optional_precision()?,
            },
            "SMALLDATETIME" => DataType::DateTime {
                kind: DateTimeKind::SmallDateTime,
                precision: None,
            },
            "DATETIMEOFFSET" => DataType::DateTime {
                kind: DateTimeKind::DateTimeOffset,
                precision: self.parse_optional_precision()?,
            },
            "INTERVAL" => {
                while self.parse_interval_unit()?.is_some() {
                    if !self.match_word("TO") {
                        break;
                    }
                }
                DataType::Interval
            }
            "JSON" | "JSONB" => DataType::Json,
            "VARIANT" | "SUPER" => DataType::Variant,
            "OBJECT" => DataType::Object,
            "ARRAY" => {
                if self.match_token(TokenType::Lt) {
                    let inner = self.parse_data_type()?;
                    self.expect_close_angle()?;
                    DataType::Array(Some(Box::new(inner)))
                } else {
                    DataType::Array(None)
                }
            }
            "MAP" => {
                self.expect(TokenType::Lt, "<")?;
                let key = self.parse_data_type()?;
                self.expect(TokenType::Comma, ",")?;
                let value = self.parse_data_type()?;
                self.expect_close_angle()?;
                DataType::Map(Box::new(key), Box::new(value))
            }
            "STRUCT" => {
                self.expect(TokenType::Lt, "<")?;
                let mut fields = Vec::new();
                loop {
                    let field_name = self.parse_identifier()?;
                    self.match_token(TokenType::Colon);
                    let field_type = self.parse_data_type()?;
                    fields.push(StructField {
                        name: field_name,
                        data_type: field_type,
                    });
                    if !self.match_token(TokenType::Comma) {
                        break;
                    }
                }
                self.expect_close_angle()?;
                DataType::Struct(fields)
            }
            "UUID" | "UNIQUEIDENTIFIER" => DataType::Uuid,
            "XML" | "XMLTYPE" => DataType::Xml,
            _ => DataType::Custom {
                args: if self.check(TokenType::LParen) {
                    self.parse_raw_type_args()?
                } else {
                    Vec::new()
                },
                name,
            },
        };

        // PostgreSQL `INT[]`
        while self.check(TokenType::LBracket) && self.check_nth(1, TokenType::RBracket) {
            self.pos += 2;
            data_type = DataType::Array(Some(Box::new(data_type)));
        }
        Ok(data_type)
    }

    /// `>` closing a generic type, splitting `>>` when types nest
    fn expect_close_angle(&mut self) -> Result<()> {
        match self.peek_type() {
            Some(TokenType::Gt) => {
                self.bump();
                Ok(())
            }
            Some(TokenType::GtGt) => {
                let token = &mut self.tokens[self.pos];
                token.token_type = TokenType::Gt;
                token.text = ">".to_string();
                token.span.start += 1;
                token.span.column += 1;
                Ok(())
            }
            _ => Err(self.error_expected(&[">"])),
        }
    }

    fn parse_u32(&mut self) -> Result<u32> {
        match self.peek() {
            Some(t) if t.token_type == TokenType::Number => {
                let value = t.text.parse::<u32>().map_err(|_| {
                    Error::syntax(
                        format!("Invalid type length '{}'", t.text),
                        t.span,
                        vec!["integer".to_string()],
                        t.text.clone(),
                    )
                })?;
                self.bump();
                Ok(value)
            }
            _ => Err(self.error_expected(&["integer"])),
        }
    }

    /// `(n)`, `(MAX)`, `(n CHAR)`
    fn parse_optional_length(&mut self) -> Result<Option<CharLength>> {
        if !self.match_token(TokenType::LParen) {
            return Ok(None);
        }
        let length = if self.match_word("MAX") {
            CharLength::Max
        } else {
            CharLength::Fixed(self.parse_u32()?)
        };
        if !self.match_word("CHAR") {
            self.match_word("BYTE");
        }
        self.expect(TokenType::RParen, ")")?;
        Ok(Some(length))
    }

    fn parse_optional_precision(&mut self) -> Result<Option<u32>> {
        if !self.match_token(TokenType::LParen) {
            return Ok(None);
        }
        let value = self.parse_u32()?;
        self.expect(TokenType::RParen, ")")?;
        Ok(Some(value))
    }

    fn parse_precision_scale(&mut self) -> Result<(Option<u32>, Option<u32>)> {
        if !self.match_token(TokenType::LParen) {
            return Ok((None, None));
        }
        // Oracle `NUMBER(*, 2)`
        let precision = if self.match_token(TokenType::Star) {
            None
        } else {
            Some(self.parse_u32()?)
        };
        let scale = if self.match_token(TokenType::Comma) {
            Some(self.parse_u32()?)
        } else {
            None
        };
        self.expect(TokenType::RParen, ")")?;
        Ok((precision, scale))
    }

    fn parse_time_zone_clause(&mut self) -> Option<TimestampZone> {
        if self.check(TokenType::With) && self.check_word_nth(1, "TIME") && self.check_word_nth(2, "ZONE") {
            self.pos += 3;
            return Some(TimestampZone::With);
        }
        if self.check(TokenType::With)
            && self.check_word_nth(1, "LOCAL")
            && self.check_word_nth(2, "TIME")
            && self.check_word_nth(3, "ZONE")
        {
            self.pos += 4;
            return Some(TimestampZone::Local);
        }
        if self.check_word("WITHOUT") && self.check_word_nth(1, "TIME") && self.check_word_nth(2, "ZONE") {
            self.pos += 3;
            return Some(TimestampZone::Without);
        }
        None
    }

    /// Raw argument texts of an unmodelled type, split on top-level commas
    fn parse_raw_type_args(&mut self) -> Result<Vec<String>> {
        self.expect(TokenType::LParen, "(")?;
        let mut args = Vec::new();
        let mut depth = 0usize;
        let mut arg_start = self.pos;
        loop {
            match self.peek_type() {
                None => return Err(self.error_expected(&[")"])),
                Some(TokenType::LParen) => depth += 1,
                Some(TokenType::RParen) if depth == 0 => {
                    if self.pos > arg_start {
                        args.push(self.raw_from(arg_start));
                    }
                    self.bump();
                    return Ok(args);
                }
                Some(TokenType::RParen) => depth -= 1,
                Some(TokenType::Comma) if depth == 0 => {
                    args.push(self.raw_from(arg_start));
                    self.bump();
                    arg_start = self.pos;
                    continue;
                }
                _ => {}
            }
            self.bump();
        }
    }

    // -- DML ----------------------------------------------------------------

    fn parse_insert(&mut self) -> Result<Statement> {
        let start = self.pos;
        self.expect(TokenType::Insert, "INSERT")?;
        let overwrite = self.match_word("OVERWRITE");
        if overwrite {
            self.match_token(TokenType::Table);
        } else {
            self.match_token(TokenType::Into);
        }
        let table = self.parse_table_name()?;
        let columns = if self.check(TokenType::LParen)
            && !matches!(self.nth_type(1), Some(TokenType::Select | TokenType::With))
        {
            self.parse_paren_identifiers()?
        } else {
            Vec::new()
        };
        let source = if self.check(TokenType::Default) && self.check_nth(1, TokenType::Values) {
            self.pos += 2;
            InsertSource::DefaultValues
        } else if matches!(
            self.peek_type(),
            Some(TokenType::Values | TokenType::Select | TokenType::With | TokenType::LParen)
        ) {
            InsertSource::Query(Box::new(self.parse_query()?))
        } else {
            return Err(self.error_expected(&["VALUES", "SELECT"]));
        };
        Ok(Statement::Insert(Box::new(Insert {
            table,
            columns,
            overwrite,
            source,
            span: self.span_from(start),
        })))
    }

    fn parse_assignments(&mut self) -> Result<Vec<Assignment>> {
        let mut assignments = Vec::new();
        loop {
            let start = self.pos;
            let parts = self.parse_object_name()?;
            let target = column_from_parts(parts, self.span_from(start))?;
            self.expect(TokenType::Eq, "=")?;
            let value = self.parse_expression()?;
            assignments.push(Assignment { target, value });
            if !self.match_token(TokenType::Comma) {
                break;
            }
        }
        Ok(assignments)
    }

    fn parse_update(&mut self) -> Result<Statement> {
        let start = self.pos;
        self.expect(TokenType::Update, "UPDATE")?;
        let table = self.parse_table_name_with_alias()?;
        self.expect(TokenType::Set, "SET")?;
        let assignments = self.parse_assignments()?;
        let from = if self.match_token(TokenType::From) {
            Some(self.parse_from()?)
        } else {
            None
        };
        let where_clause = if self.match_token(TokenType::Where) {
            Some(Where {
                condition: self.parse_expression()?,
            })
        } else {
            None
        };
        Ok(Statement::Update(Box::new(Update {
            table,
            assignments,
            from,
            where_clause,
            span: self.span_from(start),
        })))
    }

    fn parse_delete(&mut self) -> Result<Statement> {
        let start = self.pos;
        self.expect(TokenType::Delete, "DELETE")?;
        self.match_token(TokenType::From);
        let table = self.parse_table_name_with_alias()?;
        self.match_token(TokenType::All);
        let using = if self.match_token(TokenType::Using) || self.match_token(TokenType::From) {
            Some(self.parse_from()?)
        } else {
            None
        };
        let where_clause = if self.match_token(TokenType::Where) {
            Some(Where {
                condition: self.parse_expression()?,
            })
        } else {
            None
        };
        Ok(Statement::Delete(Box::new(Delete {
            table,
            using,
            where_clause,
            span: self.span_from(start),
        })))
    }

    fn parse_merge(&mut self) -> Result<Statement> {
        let start = self.pos;
        self.expect(TokenType::Merge, "MERGE")?;
        self.match_token(TokenType::Into);
        let target = self.parse_table_name_with_alias()?;
        self.expect(TokenType::Using, "USING")?;
        let source = self.parse_table_factor()?;
        self.expect(TokenType::On, "ON")?;
        let on = self.parse_expression()?;

        let mut clauses = Vec::new();
        while self.match_token(TokenType::When) {
            let kind = if self.match_token(TokenType::Matched) {
                MergeMatchKind::Matched
            } else {
                self.expect(TokenType::Not, "NOT")?;
                self.expect(TokenType::Matched, "MATCHED")?;
                if self.match_token(TokenType::By) {
                    if self.match_word("SOURCE") {
                        MergeMatchKind::NotMatchedBySource
                    } else {
                        self.expect_word("TARGET")?;
                        MergeMatchKind::NotMatched
                    }
                } else {
                    MergeMatchKind::NotMatched
                }
            };
            let condition = if self.match_token(TokenType::And) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            self.expect(TokenType::Then, "THEN")?;
            let action = if self.match_token(TokenType::Update) {
                self.expect(TokenType::Set, "SET")?;
                MergeAction::Update {
                    assignments: self.parse_assignments()?,
                }
            } else if self.match_token(TokenType::Delete) {
                MergeAction::Delete
            } else if self.match_token(TokenType::Insert) {
                let columns = if self.check(TokenType::LParen) {
                    self.parse_paren_identifiers()?
                } else {
                    Vec::new()
                };
                self.expect(TokenType::Values, "VALUES")?;
                self.expect(TokenType::LParen, "(")?;
                let values = self.parse_expression_list()?;
                self.expect(TokenType::RParen, ")")?;
                MergeAction::Insert { columns, values }
            } else {
                return Err(self.error_expected(&["UPDATE", "DELETE", "INSERT"]));
            };
            clauses.push(MergeClause {
                kind,
                condition,
                action,
            });
        }
        if clauses.is_empty() {
            return Err(self.error_expected(&["WHEN"]));
        }
        Ok(Statement::Merge(Box::new(Merge {
            target,
            source,
            on,
            clauses,
            span: self.span_from(start),
        })))
    }

    // -- DDL ----------------------------------------------------------------

    fn parse_create(&mut self) -> Result<Statement> {
        let start = self.pos;
        self.expect(TokenType::Create, "CREATE")?;
        let or_replace = if self.check(TokenType::Or) && self.check_nth(1, TokenType::Replace) {
            self.pos += 2;
            true
        } else {
            false
        };

        let mut temporary = false;
        let mut modifiers = Vec::new();
        loop {
            match self.peek() {
                Some(t) if t.token_type == TokenType::Temporary => {
                    temporary = true;
                    self.bump();
                }
                Some(t)
                    if t.token_type == TokenType::Set
                        || ["GLOBAL", "LOCAL", "VOLATILE", "TRANSIENT", "MULTISET", "SECURE"]
                            .iter()
                            .any(|w| t.is_word(w)) =>
                {
                    modifiers.push(t.upper());
                    self.bump();
                }
                _ => break,
            }
        }

        if self.match_token(TokenType::Table) {
            return self.parse_create_table(start, or_replace, temporary, modifiers);
        }
        let materialized = self.match_word("MATERIALIZED");
        if self.match_token(TokenType::View) {
            return self.parse_create_view(start, or_replace, temporary, materialized);
        }
        self.pos = start;
        Ok(self.raw_statement())
    }

    fn parse_if_not_exists(&mut self) -> bool {
        if self.check(TokenType::If) && self.check_nth(1, TokenType::Not) && self.check_nth(2, TokenType::Exists) {
            self.pos += 3;
            true
        } else {
            false
        }
    }

    fn parse_create_table(
        &mut self,
        start: usize,
        or_replace: bool,
        temporary: bool,
        modifiers: Vec<String>,
    ) -> Result<Statement> {
        let if_not_exists = self.parse_if_not_exists();
        let mut create = CreateTable::new(self.parse_table_name()?);
        create.or_replace = or_replace;
        create.if_not_exists = if_not_exists;
        create.temporary = temporary;
        create.modifiers = modifiers;

        // Teradata `CREATE TABLE t, NO FALLBACK, NO JOURNAL (...)`
        while self.match_token(TokenType::Comma) {
            let option_start = self.pos;
            self.skip_until(&|_: &Parser<'_>, t: &Token| {
                matches!(t.token_type, TokenType::Comma | TokenType::LParen)
            });
            if self.pos == option_start {
                return Err(self.error_expected(&["table option"]));
            }
            let extension = self.extension_from("TABLE OPTION".to_string(), option_start);
            create.options.push(TableOption::Raw(extension));
        }

        if self.match_token(TokenType::Like) {
            create.like = Some(self.parse_table_name()?);
        }

        if self.match_token(TokenType::LParen) {
            loop {
                if self.check(TokenType::LParen) || self.check(TokenType::RParen) {
                    return Err(self.error_expected(&["column definition"]));
                }
                if matches!(
                    self.peek_type(),
                    Some(
                        TokenType::Constraint
                            | TokenType::Primary
                            | TokenType::Unique
                            | TokenType::Foreign
                            | TokenType::Check
                    )
                ) {
                    create.constraints.push(self.parse_table_constraint()?);
                } else if (self.check_word("INDEX") || self.check(TokenType::Key))
                    && !matches!(self.nth_type(1), Some(TokenType::Comma | TokenType::RParen))
                    && !self.peek_nth(1).is_some_and(|t| t.token_type == TokenType::Var && self.is_type_word(t))
                {
                    let option_start = self.pos;
                    self.bump();
                    self.skip_until(&|_: &Parser<'_>, t: &Token| t.token_type == TokenType::Comma);
                    let extension = self.extension_from("INDEX".to_string(), option_start);
                    create.options.push(TableOption::Raw(extension));
                } else {
                    create.columns.push(self.parse_column_def()?);
                }
                if !self.match_token(TokenType::Comma) {
                    break;
                }
            }
            self.expect(TokenType::RParen, ")")?;
        }

        self.parse_table_options(&mut create)?;

        if self.match_token(TokenType::As) {
            if matches!(
                self.peek_type(),
                Some(TokenType::Select | TokenType::With | TokenType::LParen | TokenType::Values)
            ) {
                create.as_query = Some(Box::new(self.parse_query()?));
            } else {
                create.like = Some(self.parse_table_name()?);
            }
            self.parse_table_options(&mut create)?;
        }

        create.span = self.span_from(start);
        Ok(Statement::CreateTable(Box::new(create)))
    }

    fn is_type_word(&self, token: &Token) -> bool {
        matches!(
            token.upper().as_str(),
            "INT" | "INTEGER" | "BIGINT" | "VARCHAR" | "CHAR" | "TEXT" | "DATE" | "TIMESTAMP" | "DECIMAL"
        )
    }

    fn parse_column_def(&mut self) -> Result<ColumnDef> {
        let start = self.pos;
        let name = self.parse_identifier()?;
        let mut data_type = self.parse_data_type()?;
        let mut constraints = Vec::new();

        // PostgreSQL serial types are integer identity columns
        if let DataType::Custom { name: type_name, args } = &data_type {
            let serial = match type_name.as_str() {
                "SERIAL" | "SERIAL4" => Some(DataType::Int { unsigned: false }),
                "BIGSERIAL" | "SERIAL8" => Some(DataType::BigInt { unsigned: false }),
                "SMALLSERIAL" | "SERIAL2" => Some(DataType::SmallInt { unsigned: false }),
                _ => None,
            };
            if let (Some(serial), true) = (serial, args.is_empty()) {
                data_type = serial;
                constraints.push(ColumnConstraint::Identity(IdentitySpec {
                    style: IdentityStyle::GeneratedByDefault,
                    start: None,
                    increment: None,
                }));
            }
        }

        while let Some(constraint) = self.parse_column_constraint()? {
            constraints.push(constraint);
        }
        Ok(ColumnDef {
            name,
            data_type,
            constraints,
            span: self.span_from(start),
        })
    }

    fn parse_signed_number(&mut self) -> Result<String> {
        let negative = self.match_token(TokenType::Dash);
        match self.peek() {
            Some(t) if t.token_type == TokenType::Number => {
                let text = if negative {
                    format!("-{}", t.text)
                } else {
                    t.text.clone()
                };
                self.bump();
                Ok(text)
            }
            _ => Err(self.error_expected(&["number"])),
        }
    }

    /// `(start, increment)` or `START n INCREMENT n`
    fn parse_identity_args(&mut self) -> Result<(Option<String>, Option<String>)> {
        if self.match_token(TokenType::LParen) {
            let start = self.parse_signed_number()?;
            let increment = if self.match_token(TokenType::Comma) {
                Some(self.parse_signed_number()?)
            } else {
                None
            };
            self.expect(TokenType::RParen, ")")?;
            return Ok((Some(start), increment));
        }
        let mut start = None;
        let mut increment = None;
        if self.match_word("START") {
            self.match_token(TokenType::With);
            start = Some(self.parse_signed_number()?);
        }
        if self.match_word("INCREMENT") {
            self.match_token(TokenType::By);
            increment = Some(self.parse_signed_number()?);
        }
        Ok((start, increment))
    }

    fn parse_column_constraint(&mut self) -> Result<Option<ColumnConstraint>> {
        let Some(token) = self.peek().cloned() else {
            return Ok(None);
        };
        let constraint = match token.token_type {
            TokenType::Comma | TokenType::RParen => return Ok(None),
            TokenType::Not if self.check_nth(1, TokenType::Null) => {
                self.pos += 2;
                ColumnConstraint::NotNull
            }
            TokenType::Null => {
                self.bump();
                ColumnConstraint::Null
            }
            TokenType::Primary => {
                self.bump();
                self.expect(TokenType::Key, "KEY")?;
                if !self.match_word("CLUSTERED") {
                    self.match_word("NONCLUSTERED");
                }
                ColumnConstraint::PrimaryKey
            }
            TokenType::Unique => {
                self.bump();
                ColumnConstraint::Unique
            }
            TokenType::Default => {
                self.bump();
                ColumnConstraint::Default(self.parse_expression()?)
            }
            TokenType::Check => {
                self.bump();
                self.expect(TokenType::LParen, "(")?;
                let condition = self.parse_expression()?;
                self.expect(TokenType::RParen, ")")?;
                ColumnConstraint::Check(condition)
            }
            TokenType::References => {
                self.bump();
                let table = self.parse_table_name()?;
                let columns = if self.check(TokenType::LParen) {
                    self.parse_paren_identifiers()?
                } else {
                    Vec::new()
                };
                ColumnConstraint::References { table, columns }
            }
            TokenType::Constraint => {
                self.bump();
                self.parse_identifier()?;
                return self.parse_column_constraint();
            }
            TokenType::Collate => {
                self.bump();
                let name = match self.peek() {
                    Some(t) if t.token_type == TokenType::String => t.text.clone(),
                    _ => self.parse_identifier()?.name,
                };
                if self.peek().is_some_and(|t| t.token_type == TokenType::String) {
                    self.bump();
                }
                ColumnConstraint::Collate(name)
            }
            TokenType::Var if token.is_word("IDENTITY") => {
                self.bump();
                let (start, increment) = self.parse_identity_args()?;
                ColumnConstraint::Identity(IdentitySpec {
                    style: IdentityStyle::Identity,
                    start,
                    increment,
                })
            }
            TokenType::Var if token.is_word("AUTOINCREMENT") || token.is_word("AUTO_INCREMENT") => {
                self.bump();
                let (start, increment) = self.parse_identity_args()?;
                ColumnConstraint::Identity(IdentitySpec {
                    style: IdentityStyle::AutoIncrement,
                    start,
                    increment,
                })
            }
            TokenType::Var
                if token.is_word("GENERATED")
                    && (self.check_word_nth(1, "ALWAYS") || self.check_nth(1, TokenType::By))
                    && !self.is_computed_column() =>
            {
                self.bump();
                let style = if self.match_word("ALWAYS") {
                    IdentityStyle::GeneratedAlways
                } else {
                    self.expect(TokenType::By, "BY")?;
                    self.expect(TokenType::Default, "DEFAULT")?;
                    if self.check(TokenType::On) && self.check_nth(1, TokenType::Null) {
                        self.pos += 2;
                    }
                    IdentityStyle::GeneratedByDefault
                };
                self.expect(TokenType::As, "AS")?;
                self.expect_word("IDENTITY")?;
                let (mut start, mut increment) = (None, None);
                if self.match_token(TokenType::LParen) {
                    while !self.check(TokenType::RParen) {
                        if self.match_word("START") {
                            self.match_token(TokenType::With);
                            start = Some(self.parse_signed_number()?);
                        } else if self.match_word("INCREMENT") {
                            self.match_token(TokenType::By);
                            increment = Some(self.parse_signed_number()?);
                        } else if self.is_at_end() {
                            return Err(self.error_expected(&[")"]));
                        } else {
                            // MINVALUE, MAXVALUE, CYCLE, CACHE: sequence tuning
                            self.bump();
                        }
                    }
                    self.bump();
                }
                ColumnConstraint::Identity(IdentitySpec {
                    style,
                    start,
                    increment,
                })
            }
            TokenType::Var if token.is_word("COMMENT") && self.check_nth(1, TokenType::String) => {
                self.bump();
                let text = self.advance().map(|t| t.text).unwrap_or_default();
                ColumnConstraint::Comment(text)
            }
            TokenType::Var | TokenType::Not | TokenType::On => {
                return self.parse_raw_column_attribute();
            }
            _ => return Ok(None),
        };
        Ok(Some(constraint))
    }

    fn is_computed_column(&self) -> bool {
        // GENERATED ALWAYS AS (expr)
        let offset = if self.check_word_nth(1, "ALWAYS") { 2 } else { 3 };
        self.check_nth(offset, TokenType::As) && self.check_nth(offset + 1, TokenType::LParen)
    }

    /// Dialect column attributes kept verbatim: `FORMAT 'x'`, `ENCODE zstd`,
    /// `CHARACTER SET latin`, `NOT CASESPECIFIC`, `ON UPDATE CURRENT_TIMESTAMP`
    fn parse_raw_column_attribute(&mut self) -> Result<Option<ColumnConstraint>> {
        let start = self.pos;
        let Some(token) = self.advance() else {
            return Ok(None);
        };
        let mut construct = token.upper();
        match construct.as_str() {
            "NOT" | "ON" => {
                let next = self.upper_at(0);
                if next.is_empty() {
                    return Err(self.error_expected(&["column attribute"]));
                }
                construct = format!("{construct} {next}");
                self.bump();
                if construct == "ON UPDATE" {
                    self.parse_expr_bp(prec::CAST * 2)?;
                }
            }
            "CHARACTER" if self.check(TokenType::Set) => {
                self.bump();
                construct = "CHARACTER SET".to_string();
                self.bump();
            }
            "CHARSET" | "ENCODE" => self.bump(),
            "GENERATED" | "AS" => {
                self.skip_until(&|_: &Parser<'_>, t: &Token| t.token_type == TokenType::Comma);
            }
            _ => {
                if matches!(
                    self.peek_type(),
                    Some(TokenType::String | TokenType::Number)
                ) {
                    self.bump();
                } else if self.check(TokenType::LParen) {
                    self.skip_group()?;
                }
            }
        }
        Ok(Some(ColumnConstraint::Raw(self.extension_from(construct, start))))
    }

    fn parse_index_columns(&mut self) -> Result<Vec<Identifier>> {
        self.expect(TokenType::LParen, "(")?;
        let mut columns = Vec::new();
        loop {
            columns.push(self.parse_identifier()?);
            if !self.match_token(TokenType::Asc) {
                self.match_token(TokenType::Desc);
            }
            if !self.match_token(TokenType::Comma) {
                break;
            }
        }
        self.expect(TokenType::RParen, ")")?;
        Ok(columns)
    }

    fn parse_table_constraint(&mut self) -> Result<TableConstraint> {
        let name = if self.match_token(TokenType::Constraint) {
            Some(self.parse_identifier()?)
        } else {
            None
        };
        let kind = match self.peek_type() {
            Some(TokenType::Primary) => {
                self.bump();
                self.expect(TokenType::Key, "KEY")?;
                if !self.match_word("CLUSTERED") {
                    self.match_word("NONCLUSTERED");
                }
                TableConstraintKind::PrimaryKey {
                    columns: self.parse_index_columns()?,
                }
            }
            Some(TokenType::Unique) => {
                self.bump();
                self.match_token(TokenType::Key);
                if !self.match_word("CLUSTERED") {
                    self.match_word("NONCLUSTERED");
                }
                if self.check_name() {
                    self.parse_identifier()?;
                }
                TableConstraintKind::Unique {
                    columns: self.parse_index_columns()?,
                }
            }
            Some(TokenType::Foreign) => {
                self.bump();
                self.expect(TokenType::Key, "KEY")?;
                let columns = self.parse_paren_identifiers()?;
                self.expect(TokenType::References, "REFERENCES")?;
                let table = self.parse_table_name()?;
                let referenced = if self.check(TokenType::LParen) {
                    self.parse_paren_identifiers()?
                } else {
                    Vec::new()
                };
                TableConstraintKind::ForeignKey {
                    columns,
                    table,
                    referenced,
                }
            }
            Some(TokenType::Check) => {
                self.bump();
                self.expect(TokenType::LParen, "(")?;
                let condition = self.parse_expression()?;
                self.expect(TokenType::RParen, ")")?;
                TableConstraintKind::Check(condition)
            }
            _ => return Err(self.error_expected(&["PRIMARY KEY", "UNIQUE", "FOREIGN KEY", "CHECK"])),
        };

        // Referential actions and enforcement flags carry no data semantics
        loop {
            if self.check(TokenType::On) && matches!(self.nth_type(1), Some(TokenType::Delete | TokenType::Update)) {
                self.pos += 2;
                if self.match_token(TokenType::Set) {
                    self.bump();
                } else if self.match_word("NO") {
                    self.bump();
                } else {
                    self.bump();
                }
                continue;
            }
            const FLAGS: &[&str] = &[
                "ENFORCED", "RELY", "NORELY", "NOVALIDATE", "VALIDATE", "ENABLE", "DISABLE",
                "DEFERRABLE", "INITIALLY", "DEFERRED", "IMMEDIATE",
            ];
            if self.check(TokenType::Not) && FLAGS.iter().any(|w| self.check_word_nth(1, w)) {
                self.pos += 2;
                continue;
            }
            if FLAGS.iter().any(|w| self.check_word(w)) {
                self.bump();
                continue;
            }
            break;
        }
        Ok(TableConstraint { name, kind })
    }

    fn is_table_option_start(&self, token: &Token) -> bool {
        match token.token_type {
            TokenType::As
            | TokenType::With
            | TokenType::On
            | TokenType::Partition
            | TokenType::Primary
            | TokenType::Unique
            | TokenType::Using
            | TokenType::Default
            | TokenType::Collate
            | TokenType::Comma => true,
            TokenType::Var => TABLE_OPTION_WORDS.iter().any(|w| token.is_word(w)),
            _ => false,
        }
    }

    fn raw_table_option(&mut self) -> TableOption {
        let start = self.pos;
        let mut construct = self.upper_at(0);
        self.bump();
        if self.peek().is_some_and(|t| t.token_type == TokenType::Var || t.token_type.is_keyword()) {
            construct = format!("{construct} {}", self.upper_at(0));
            self.bump();
        }
        self.skip_until(&|p: &Parser<'_>, t: &Token| p.is_table_option_start(t));
        TableOption::Raw(self.extension_from(construct, start))
    }

    fn option_value(&mut self) -> Result<String> {
        match self.advance() {
            Some(t) if matches!(t.token_type, TokenType::RParen | TokenType::Comma) => {
                self.pos -= 1;
                Err(self.error_expected(&["option value"]))
            }
            Some(t) => Ok(t.text),
            None => Err(self.error_expected(&["option value"])),
        }
    }

    fn parse_table_options(&mut self, create: &mut CreateTable) -> Result<()> {
        loop {
            let Some(token) = self.peek().cloned() else {
                break;
            };
            let option = match token.token_type {
                TokenType::As => break,
                TokenType::Comma => {
                    self.bump();
                    continue;
                }
                TokenType::Primary if self.check_word_nth(1, "INDEX") => {
                    self.pos += 2;
                    if self.check_name() {
                        self.parse_identifier()?;
                    }
                    TableOption::PrimaryIndex {
                        unique: false,
                        columns: self.parse_paren_identifiers()?,
                    }
                }
                TokenType::Unique
                    if self.check_nth(1, TokenType::Primary) && self.check_word_nth(2, "INDEX") =>
                {
                    self.pos += 3;
                    if self.check_name() {
                        self.parse_identifier()?;
                    }
                    TableOption::PrimaryIndex {
                        unique: true,
                        columns: self.parse_paren_identifiers()?,
                    }
                }
                TokenType::Partition if self.check_nth(1, TokenType::By) => {
                    let scheme = self.peek_nth(2).map(Token::upper).unwrap_or_default();
                    if matches!(scheme.as_str(), "RANGE" | "LIST" | "HASH" | "KEY") {
                        self.raw_table_option()
                    } else {
                        self.pos += 2;
                        TableOption::PartitionBy(self.parse_option_expressions()?)
                    }
                }
                TokenType::With if self.check_word_nth(1, "DATA") => {
                    self.pos += 2;
                    TableOption::WithData(true)
                }
                TokenType::With if self.check_word_nth(1, "NO") && self.check_word_nth(2, "DATA") => {
                    self.pos += 3;
                    TableOption::WithData(false)
                }
                TokenType::With | TokenType::On => self.raw_table_option(),
                TokenType::Using => {
                    self.bump();
                    TableOption::Using(self.option_value()?)
                }
                TokenType::Default | TokenType::Collate => {
                    let mut key = token.upper();
                    self.bump();
                    while self.check_name() && !self.check(TokenType::Eq) {
                        if let Some(word) = self.advance() {
                            key = format!("{key} {}", word.upper());
                        }
                    }
                    self.match_token(TokenType::Eq);
                    TableOption::Property {
                        key,
                        value: self.option_value()?,
                    }
                }
                TokenType::Var => {
                    let word = token.upper();
                    match word.as_str() {
                        "CLUSTER" if self.check_nth(1, TokenType::By) => {
                            self.pos += 2;
                            TableOption::ClusterBy(self.parse_option_expressions()?)
                        }
                        "PARTITIONED" if self.check_nth(1, TokenType::By) => {
                            let save = self.pos;
                            self.pos += 2;
                            match self.parse_paren_identifiers() {
                                Ok(columns) => TableOption::PartitionBy(
                                    columns
                                        .into_iter()
                                        .map(|c| Expression::Column(Column {
                                            name: c,
                                            qualifier: Vec::new(),
                                            join_mark: false,
                                            span: Span::default(),
                                        }))
                                        .collect(),
                                ),
                                Err(_) => {
                                    self.pos = save;
                                    self.raw_table_option()
                                }
                            }
                        }
                        "COMMENT" => {
                            self.bump();
                            self.match_token(TokenType::Eq);
                            TableOption::Comment(self.expect(TokenType::String, "comment string")?.text)
                        }
                        "LOCATION" => {
                            self.bump();
                            TableOption::Location(self.expect(TokenType::String, "location string")?.text)
                        }
                        "TBLPROPERTIES" => {
                            self.bump();
                            self.expect(TokenType::LParen, "(")?;
                            loop {
                                let key = self.option_value()?;
                                self.expect(TokenType::Eq, "=")?;
                                let value = self.option_value()?;
                                create.options.push(TableOption::Property { key, value });
                                if !self.match_token(TokenType::Comma) {
                                    break;
                                }
                            }
                            self.expect(TokenType::RParen, ")")?;
                            continue;
                        }
                        "DISTKEY" => {
                            self.bump();
                            self.expect(TokenType::LParen, "(")?;
                            let column = self.parse_identifier()?;
                            self.expect(TokenType::RParen, ")")?;
                            TableOption::DistKey(column)
                        }
                        "SORTKEY" => {
                            self.bump();
                            TableOption::SortKey {
                                style: None,
                                columns: self.parse_paren_identifiers()?,
                            }
                        }
                        "COMPOUND" | "INTERLEAVED" if self.check_word_nth(1, "SORTKEY") => {
                            self.pos += 2;
                            TableOption::SortKey {
                                style: Some(word),
                                columns: self.parse_paren_identifiers()?,
                            }
                        }
                        "DISTSTYLE" => {
                            self.bump();
                            TableOption::DistStyle(self.option_value()?.to_uppercase())
                        }
                        _ if self.check_nth(1, TokenType::Eq) => {
                            self.pos += 2;
                            TableOption::Property {
                                key: word,
                                value: self.option_value()?,
                            }
                        }
                        _ => self.raw_table_option(),
                    }
                }
                _ => break,
            };
            create.options.push(option);
        }
        Ok(())
    }

    /// `(a, b)` or `a, b` or a single expression
    fn parse_option_expressions(&mut self) -> Result<Vec<Expression>> {
        if self.check(TokenType::LParen) {
            self.bump();
            let items = self.parse_expression_list()?;
            self.expect(TokenType::RParen, ")")?;
            return Ok(items);
        }
        let mut items = vec![self.parse_expression()?];
        while self.match_token(TokenType::Comma) {
            items.push(self.parse_expression()?);
        }
        Ok(items)
    }

    fn parse_create_view(
        &mut self,
        start: usize,
        or_replace: bool,
        temporary: bool,
        materialized: bool,
    ) -> Result<Statement> {
        let if_not_exists = self.parse_if_not_exists();
        let name = self.parse_table_name()?;
        let columns = if self.check(TokenType::LParen) {
            self.parse_paren_identifiers()?
        } else {
            Vec::new()
        };
        self.expect(TokenType::As, "AS")?;
        let query = self.parse_query()?;
        Ok(Statement::CreateView(Box::new(CreateView {
            name,
            or_replace,
            if_not_exists,
            temporary,
            materialized,
            columns,
            query: Box::new(query),
            span: self.span_from(start),
        })))
    }

    fn parse_drop(&mut self) -> Result<Statement> {
        let start = self.pos;
        self.expect(TokenType::Drop, "DROP")?;
        let kind = if self.match_token(TokenType::Table) {
            ObjectKind::Table
        } else if self.match_token(TokenType::View) {
            ObjectKind::View
        } else if self.check_word("MATERIALIZED") && self.check_nth(1, TokenType::View) {
            self.pos += 2;
            ObjectKind::MaterializedView
        } else if self.match_word("SCHEMA") || self.match_word("DATABASE") {
            ObjectKind::Schema
        } else {
            self.pos = start;
            return Ok(self.raw_statement());
        };
        let if_exists = if self.check(TokenType::If) && self.check_nth(1, TokenType::Exists) {
            self.pos += 2;
            true
        } else {
            false
        };
        let mut names = Vec::new();
        loop {
            names.push(self.parse_table_name()?);
            if !self.match_token(TokenType::Comma) {
                break;
            }
        }
        let cascade = self.match_word("CASCADE");
        if !cascade && !self.match_word("RESTRICT") {
            self.match_word("PURGE");
        }
        Ok(Statement::Drop(Box::new(Drop {
            kind,
            if_exists,
            names,
            cascade,
            span: self.span_from(start),
        })))
    }

    fn parse_truncate(&mut self) -> Result<Statement> {
        let start = self.pos;
        self.expect(TokenType::Truncate, "TRUNCATE")?;
        self.match_token(TokenType::Table);
        let table = self.parse_table_name()?;
        Ok(Statement::Truncate(Box::new(Truncate {
            table,
            span: self.span_from(start),
        })))
    }

    fn parse_use(&mut self) -> Result<Statement> {
        let start = self.pos;
        self.expect(TokenType::Use, "USE")?;
        let kind = ["CATALOG", "SCHEMA", "DATABASE", "WAREHOUSE"]
            .iter()
            .find(|w| self.check_word(w) && self.peek_nth(1).is_some_and(Self::is_name_token))
            .map(|w| w.to_string());
        if kind.is_some() {
            self.bump();
        }
        let name = self.parse_object_name()?;
        Ok(Statement::Use(Box::new(Use {
            kind,
            name,
            span: self.span_from(start),
        })))
    }

    // -- shared pieces ------------------------------------------------------

    pub fn parse_identifier(&mut self) -> Result<Identifier> {
        match self.peek() {
            Some(t) if t.token_type == TokenType::QuotedIdentifier => {
                let identifier = Identifier::quoted(t.text.clone());
                self.bump();
                Ok(identifier)
            }
            Some(t) if Self::is_name_token(t) => {
                let identifier = Identifier::new(t.text.clone());
                self.bump();
                Ok(identifier)
            }
            _ => Err(self.error_expected(&["identifier"])),
        }
    }

    fn parse_paren_identifiers(&mut self) -> Result<Vec<Identifier>> {
        self.expect(TokenType::LParen, "(")?;
        let mut items = Vec::new();
        loop {
            items.push(self.parse_identifier()?);
            if !self.match_token(TokenType::Comma) {
                break;
            }
        }
        self.expect(TokenType::RParen, ")")?;
        Ok(items)
    }
}

fn extend_factor(factor: &mut TableFactor, extension: Extension) {
    let base = std::mem::replace(factor, TableFactor::Table(TableRef::new("")));
    *factor = TableFactor::Extended {
        base: Box::new(base),
        extension,
    };
}

fn fixed_length(length: Option<CharLength>) -> Option<u32> {
    match length {
        Some(CharLength::Fixed(n)) => Some(n),
        _ => None,
    }
}

/// Function names are stored uppercase unless quoted
fn function_name_from_parts(parts: &[Identifier]) -> String {
    parts
        .iter()
        .map(|p| {
            if p.quoted {
                p.name.clone()
            } else {
                p.name.to_uppercase()
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

fn column_from_parts(mut parts: Vec<Identifier>, span: Span) -> Result<Column> {
    let name = parts
        .pop()
        .ok_or_else(|| Error::internal("empty column reference"))?;
    Ok(Column {
        name,
        qualifier: parts,
        join_mark: false,
        span,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialects::{DialectRegistry, DialectType};

    fn parse(dialect: DialectType, sql: &str) -> Result<Statement> {
        let registry = DialectRegistry::builtin()?;
        registry.get(dialect)?.parse_one(sql)
    }

    fn query(dialect: DialectType, sql: &str) -> Query {
        match parse(dialect, sql).unwrap() {
            Statement::Query(q) => *q,
            other => panic!("expected query, got {other:?}"),
        }
    }

    fn projection(sql: &str) -> Expression {
        let q = query(DialectType::PostgreSQL, sql);
        q.select().unwrap().projection[0].clone()
    }

    #[test]
    fn test_precedence_climbing() {
        let expr = projection("SELECT 1 + 2 * 3");
        let Expression::Binary(op) = expr else {
            panic!("expected binary")
        };
        assert_eq!(op.op, BinaryOperator::Plus);
        assert!(matches!(&op.right, Expression::Binary(r) if r.op == BinaryOperator::Multiply));
    }

    #[test]
    fn test_not_binds_looser_than_comparison() {
        let expr = projection("SELECT NOT a = b AND c");
        let Expression::Binary(and) = expr else {
            panic!("expected AND")
        };
        assert_eq!(and.op, BinaryOperator::And);
        assert!(matches!(&and.left, Expression::Unary(u) if u.op == UnaryOperator::Not));
    }

    #[test]
    fn test_double_colon_binds_tighter_than_arithmetic() {
        let expr = projection("SELECT a + b::INT");
        let Expression::Binary(op) = expr else {
            panic!("expected binary")
        };
        assert!(matches!(&op.right, Expression::Cast(c) if c.kind == CastKind::DoubleColon));
    }

    #[test]
    fn test_mysql_dpipe_is_or() {
        let q = query(DialectType::MySQL, "SELECT a || b");
        let expr = &q.select().unwrap().projection[0];
        assert!(matches!(expr, Expression::Binary(op) if op.op == BinaryOperator::Or));

        let q = query(DialectType::Oracle, "SELECT a || b FROM dual");
        let expr = &q.select().unwrap().projection[0];
        assert!(matches!(expr, Expression::Binary(op) if op.op == BinaryOperator::Concat));
    }

    #[test]
    fn test_top_and_aliases() {
        let q = query(DialectType::SqlServer, "SELECT TOP 10 total = a + b, c AS d FROM t");
        let select = q.select().unwrap();
        assert_eq!(select.top.as_ref().unwrap().count.as_integer(), Some(10));
        assert!(matches!(&select.projection[0], Expression::Alias(a) if a.alias.name == "total"));
        assert!(matches!(&select.projection[1], Expression::Alias(a) if a.alias.name == "d"));
    }

    #[test]
    fn test_bracket_identifiers_and_hints() {
        let q = query(DialectType::SqlServer, "SELECT [order id] FROM [dbo].[orders] o WITH (NOLOCK)");
        let select = q.select().unwrap();
        let Expression::Column(col) = &select.projection[0] else {
            panic!("expected column")
        };
        assert!(col.name.quoted);
        let TableFactor::Table(table) = &select.from.as_ref().unwrap().relations[0] else {
            panic!("expected table")
        };
        assert_eq!(table.schema.as_ref().unwrap().name, "dbo");
        assert_eq!(table.hints, vec!["NOLOCK".to_string()]);
        assert_eq!(table.alias.as_ref().unwrap().name.name, "o");
    }

    #[test]
    fn test_connect_by_becomes_extension() {
        let q = query(
            DialectType::Oracle,
            "SELECT id FROM emp START WITH mgr IS NULL CONNECT BY PRIOR id = mgr ORDER BY id",
        );
        let select = q.select().unwrap();
        let constructs: Vec<_> = select.extensions.iter().map(|e| e.construct.as_str()).collect();
        assert_eq!(constructs, vec!["START WITH", "CONNECT BY"]);
        assert_eq!(select.extensions[1].raw, "CONNECT BY PRIOR id = mgr");
        assert!(q.order_by.is_some());
    }

    #[test]
    fn test_pivot_wraps_table() {
        let q = query(
            DialectType::Snowflake,
            "SELECT * FROM sales PIVOT (SUM(amount) FOR month IN ('JAN', 'FEB')) AS p",
        );
        let relation = &q.select().unwrap().from.as_ref().unwrap().relations[0];
        let TableFactor::Extended { extension, .. } = relation else {
            panic!("expected extension")
        };
        assert_eq!(extension.construct, "PIVOT");
        assert!(extension.raw.ends_with("AS p"));
    }

    #[test]
    fn test_teradata_locking_prefix() {
        let statement = parse(DialectType::Teradata, "LOCKING ROW FOR ACCESS SEL a FROM t").unwrap();
        let Statement::Extension(ext) = statement else {
            panic!("expected extension")
        };
        assert_eq!(ext.construct, "LOCKING");
        assert_eq!(ext.raw, "LOCKING ROW FOR ACCESS");
        assert!(matches!(ext.body.as_deref(), Some(Statement::Query(_))));
    }

    #[test]
    fn test_unknown_statement_is_kept_raw() {
        let statement = parse(DialectType::SqlServer, "CREATE PROCEDURE p AS SELECT 1").unwrap();
        let Statement::Extension(ext) = statement else {
            panic!("expected extension")
        };
        assert_eq!(ext.construct, "CREATE PROCEDURE");
    }

    #[test]
    fn test_create_table_columns() {
        let statement = parse(
            DialectType::Snowflake,
            "CREATE TABLE employee (employee_id INT, name VARCHAR(50) NOT NULL, salary DECIMAL(10,2), remarks VARIANT)",
        )
        .unwrap();
        let Statement::CreateTable(create) = statement else {
            panic!("expected create table")
        };
        assert_eq!(create.columns.len(), 4);
        assert_eq!(
            create.columns[1].data_type,
            DataType::VarChar {
                length: Some(CharLength::Fixed(50))
            }
        );
        assert_eq!(create.columns[1].constraints, vec![ColumnConstraint::NotNull]);
        assert_eq!(
            create.columns[2].data_type,
            DataType::Decimal {
                precision: Some(10),
                scale: Some(2)
            }
        );
        assert_eq!(create.columns[3].data_type, DataType::Variant);
    }

    #[test]
    fn test_teradata_table_options() {
        let statement = parse(
            DialectType::Teradata,
            "CREATE MULTISET VOLATILE TABLE t, NO FALLBACK (id INTEGER, d DATE FORMAT 'YYYY-MM-DD') UNIQUE PRIMARY INDEX (id) ON COMMIT PRESERVE ROWS",
        )
        .unwrap();
        let Statement::CreateTable(create) = statement else {
            panic!("expected create table")
        };
        assert_eq!(create.modifiers, vec!["MULTISET", "VOLATILE"]);
        assert!(matches!(&create.columns[1].constraints[0], ColumnConstraint::Raw(e) if e.construct == "FORMAT"));
        assert!(create
            .options
            .iter()
            .any(|o| matches!(o, TableOption::PrimaryIndex { unique: true, .. })));
        assert!(create
            .options
            .iter()
            .any(|o| matches!(o, TableOption::Raw(e) if e.construct == "ON COMMIT")));
    }

    #[test]
    fn test_four_part_name_is_rejected() {
        let err = parse(DialectType::SqlServer, "SELECT * FROM a.b.c.d").unwrap_err();
        assert!(matches!(err, Error::Syntax { .. }));
    }

    #[test]
    fn test_truncated_input_reports_end_position() {
        let err = parse(DialectType::Snowflake, "SELECT * FROM (").unwrap_err();
        let Error::Syntax {
            column, found, ..
        } = err
        else {
            panic!("expected syntax error")
        };
        assert_eq!(found, "end of input");
        assert_eq!(column, 16);
    }

    #[test]
    fn test_window_and_ignore_nulls() {
        let expr = projection(
            "SELECT LAST_VALUE(x IGNORE NULLS) OVER (PARTITION BY g ORDER BY t ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW)",
        );
        let Expression::Window(window) = expr else {
            panic!("expected window")
        };
        assert_eq!(window.function.null_treatment, Some(NullTreatment::IgnoreNulls));
        let frame = window.over.frame.unwrap();
        assert_eq!(frame.start, FrameBound::UnboundedPreceding);
        assert_eq!(frame.end, Some(FrameBound::CurrentRow));
    }

    #[test]
    fn test_oracle_join_mark() {
        let q = query(DialectType::Oracle, "SELECT * FROM a, b WHERE a.id = b.id(+)");
        let condition = &q.select().unwrap().where_clause.as_ref().unwrap().condition;
        let Expression::Binary(op) = condition else {
            panic!("expected comparison")
        };
        assert!(matches!(&op.right, Expression::Column(c) if c.join_mark));
    }

    #[test]
    fn test_splitter_isolates_lex_errors() {
        let registry = DialectRegistry::builtin().unwrap();
        let dialect = registry.get(DialectType::PostgreSQL).unwrap();
        let chunks: Vec<_> = dialect.split("SELECT 1; SELECT ! 2; SELECT 3").collect();
        assert_eq!(chunks.len(), 3);
        assert!(chunks[0].error.is_none() && chunks[0].terminated);
        assert!(chunks[1].error.is_some());
        assert!(chunks[2].error.is_none() && !chunks[2].terminated);
    }

    #[test]
    fn test_splitter_does_not_carry_open_parens_or_case() {
        let registry = DialectRegistry::builtin().unwrap();
        let sql = "SELECT 1; SELECT * FROM (; SELECT 3";
        let dialect = registry.get(DialectType::Snowflake).unwrap();
        let texts: Vec<&str> = dialect.split(sql).map(|c| c.text(sql)).collect();
        assert_eq!(texts, vec!["SELECT 1", "SELECT * FROM (", "SELECT 3"]);

        let sql = "SELECT CASE WHEN a = 1 THEN 2 FROM t; SELECT 3 FROM dual; SELECT 4 FROM dual";
        let dialect = registry.get(DialectType::Oracle).unwrap();
        assert_eq!(dialect.split(sql).count(), 3);
    }

    #[test]
    fn test_splitter_case_inside_block() {
        let registry = DialectRegistry::builtin().unwrap();
        let dialect = registry.get(DialectType::SqlServer).unwrap();
        let sql = "CREATE PROCEDURE p AS BEGIN SELECT CASE WHEN a = 1 THEN 2 END FROM t; SELECT 2; END;\nSELECT 3";
        let texts: Vec<&str> = dialect.split(sql).map(|c| c.text(sql)).collect();
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[1], "SELECT 3");
    }

    #[test]
    fn test_splitter_keeps_blocks_together() {
        let registry = DialectRegistry::builtin().unwrap();
        let dialect = registry.get(DialectType::SqlServer).unwrap();
        let sql = "CREATE PROCEDURE p AS BEGIN SELECT 1; SELECT 2; END\nGO\nSELECT 3";
        let chunks: Vec<_> = dialect.split(sql).collect();
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].terminated);
        assert_eq!(chunks[1].text(sql), "SELECT 3");
    }
}
