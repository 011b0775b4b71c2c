//! Token types and tokenization for SQL parsing
//!
//! This module defines the SQL token types, the per-dialect tokenizer
//! configuration, and a lazy [`TokenStream`] that scans one token at a time.
//! The stream supports lookahead without consuming and can be restarted from
//! the beginning of its input.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;

/// Represents a position in the source SQL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Starting byte offset
    pub start: usize,
    /// Ending byte offset (exclusive)
    pub end: usize,
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based, in characters)
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Smallest span covering both `self` and `other`, positioned at the earlier one
    pub fn merge(self, other: Span) -> Span {
        let (first, _) = if self.start <= other.start {
            (self, other)
        } else {
            (other, self)
        };
        Span {
            start: first.start,
            end: self.end.max(other.end),
            line: first.line,
            column: first.column,
        }
    }
}

/// Coarse grouping of token types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenClass {
    Keyword,
    Identifier,
    Literal,
    Operator,
    Punctuation,
}

/// A token in the SQL token stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// The type of token
    pub token_type: TokenType,
    /// The token text; unescaped content for strings and quoted identifiers
    pub text: String,
    /// Position information
    pub span: Span,
    /// Comments that appeared before this token, with their markers
    #[serde(default)]
    pub comments: Vec<String>,
}

impl Token {
    /// Create a new token
    pub fn new(token_type: TokenType, text: impl Into<String>, span: Span) -> Self {
        Self {
            token_type,
            text: text.into(),
            span,
            comments: Vec::new(),
        }
    }

    pub fn class(&self) -> TokenClass {
        self.token_type.class()
    }

    /// Uppercased token text, for keyword-like comparisons on `Var` tokens
    pub fn upper(&self) -> String {
        self.text.to_uppercase()
    }

    /// True for an unquoted word whose text equals `word` (case-insensitive)
    pub fn is_word(&self, word: &str) -> bool {
        (self.token_type == TokenType::Var || self.token_type.is_keyword())
            && self.text.eq_ignore_ascii_case(word)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self.token_type, self.text)
    }
}

/// All token types understood by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenType {
    // Punctuation
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Semicolon,
    Colon,

    // Operators
    DColon,
    ColonEq,
    Star,
    Plus,
    Dash,
    Slash,
    Percent,
    DStar,
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    NullsafeEq,
    DPipe,
    Pipe,
    Amp,
    Caret,
    Tilde,
    LtLt,
    GtGt,
    Arrow,
    DArrow,
    FArrow,

    // Literals
    String,
    NationalString,
    HexString,
    DollarString,
    Number,

    // Names
    Var,
    QuotedIdentifier,
    Parameter,

    // Keywords
    All,
    And,
    Any,
    Apply,
    As,
    Asc,
    Begin,
    Between,
    By,
    Case,
    Cast,
    Check,
    Collate,
    Constraint,
    Create,
    Cross,
    Current,
    Default,
    Delete,
    Desc,
    Distinct,
    Drop,
    Else,
    End,
    Escape,
    Except,
    Exists,
    Extract,
    False,
    Fetch,
    Filter,
    First,
    Following,
    Foreign,
    From,
    Full,
    Group,
    Having,
    If,
    ILike,
    In,
    Inner,
    Insert,
    Intersect,
    Interval,
    Into,
    Is,
    Join,
    Key,
    Lateral,
    Left,
    Like,
    Limit,
    Matched,
    Merge,
    Natural,
    Next,
    Not,
    Null,
    Nulls,
    Offset,
    On,
    Only,
    Or,
    Order,
    Outer,
    Over,
    Partition,
    PercentKw,
    Preceding,
    Primary,
    Qualify,
    Range,
    Recursive,
    References,
    Replace,
    Right,
    RLike,
    Row,
    Rows,
    Select,
    Set,
    Table,
    Temporary,
    Then,
    Ties,
    Top,
    True,
    Truncate,
    TryCast,
    Unbounded,
    Union,
    Unique,
    Update,
    Use,
    Using,
    Values,
    View,
    When,
    Where,
    Window,
    With,
    Within,
}

impl TokenType {
    pub fn class(&self) -> TokenClass {
        use TokenType::*;
        match self {
            LParen | RParen | LBracket | RBracket | LBrace | RBrace | Comma | Dot | Semicolon
            | Colon => TokenClass::Punctuation,
            DColon | ColonEq | Star | Plus | Dash | Slash | Percent | DStar | Eq | Neq | Lt
            | Lte | Gt | Gte | NullsafeEq | DPipe | Pipe | Amp | Caret | Tilde | LtLt | GtGt
            | Arrow | DArrow | FArrow => TokenClass::Operator,
            String | NationalString | HexString | DollarString | Number => TokenClass::Literal,
            Var | QuotedIdentifier | Parameter => TokenClass::Identifier,
            _ => TokenClass::Keyword,
        }
    }

    pub fn is_keyword(&self) -> bool {
        self.class() == TokenClass::Keyword
    }

    /// Keywords that can never be used as an unquoted name or implicit alias
    pub fn is_reserved(&self) -> bool {
        use TokenType::*;
        matches!(
            self,
            All | And
                | As
                | Between
                | By
                | Case
                | Check
                | Constraint
                | Create
                | Cross
                | Default
                | Delete
                | Distinct
                | Drop
                | Else
                | End
                | Except
                | Exists
                | False
                | Fetch
                | Foreign
                | From
                | Full
                | Group
                | Having
                | ILike
                | In
                | Inner
                | Insert
                | Intersect
                | Into
                | Is
                | Join
                | Lateral
                | Left
                | Like
                | Limit
                | Merge
                | Natural
                | Not
                | Null
                | Offset
                | On
                | Or
                | Order
                | Outer
                | Primary
                | Qualify
                | References
                | Right
                | RLike
                | Select
                | Set
                | Table
                | Then
                | True
                | Union
                | Unique
                | Update
                | Using
                | Values
                | When
                | Where
                | Window
                | With
        )
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            TokenType::Eq
                | TokenType::Neq
                | TokenType::Lt
                | TokenType::Lte
                | TokenType::Gt
                | TokenType::Gte
                | TokenType::NullsafeEq
        )
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

const KEYWORDS: &[(&str, TokenType)] = &[
    ("ALL", TokenType::All),
    ("AND", TokenType::And),
    ("ANY", TokenType::Any),
    ("APPLY", TokenType::Apply),
    ("AS", TokenType::As),
    ("ASC", TokenType::Asc),
    ("BEGIN", TokenType::Begin),
    ("BETWEEN", TokenType::Between),
    ("BY", TokenType::By),
    ("CASE", TokenType::Case),
    ("CAST", TokenType::Cast),
    ("CHECK", TokenType::Check),
    ("COLLATE", TokenType::Collate),
    ("CONSTRAINT", TokenType::Constraint),
    ("CREATE", TokenType::Create),
    ("CROSS", TokenType::Cross),
    ("CURRENT", TokenType::Current),
    ("DEFAULT", TokenType::Default),
    ("DELETE", TokenType::Delete),
    ("DESC", TokenType::Desc),
    ("DISTINCT", TokenType::Distinct),
    ("DROP", TokenType::Drop),
    ("ELSE", TokenType::Else),
    ("END", TokenType::End),
    ("ESCAPE", TokenType::Escape),
    ("EXCEPT", TokenType::Except),
    ("EXISTS", TokenType::Exists),
    ("EXTRACT", TokenType::Extract),
    ("FALSE", TokenType::False),
    ("FETCH", TokenType::Fetch),
    ("FILTER", TokenType::Filter),
    ("FIRST", TokenType::First),
    ("FOLLOWING", TokenType::Following),
    ("FOREIGN", TokenType::Foreign),
    ("FROM", TokenType::From),
    ("FULL", TokenType::Full),
    ("GROUP", TokenType::Group),
    ("HAVING", TokenType::Having),
    ("IF", TokenType::If),
    ("ILIKE", TokenType::ILike),
    ("IN", TokenType::In),
    ("INNER", TokenType::Inner),
    ("INSERT", TokenType::Insert),
    ("INTERSECT", TokenType::Intersect),
    ("INTERVAL", TokenType::Interval),
    ("INTO", TokenType::Into),
    ("IS", TokenType::Is),
    ("JOIN", TokenType::Join),
    ("KEY", TokenType::Key),
    ("LATERAL", TokenType::Lateral),
    ("LEFT", TokenType::Left),
    ("LIKE", TokenType::Like),
    ("LIMIT", TokenType::Limit),
    ("MATCHED", TokenType::Matched),
    ("MERGE", TokenType::Merge),
    ("NATURAL", TokenType::Natural),
    ("NEXT", TokenType::Next),
    ("NOT", TokenType::Not),
    ("NULL", TokenType::Null),
    ("NULLS", TokenType::Nulls),
    ("OFFSET", TokenType::Offset),
    ("ON", TokenType::On),
    ("ONLY", TokenType::Only),
    ("OR", TokenType::Or),
    ("ORDER", TokenType::Order),
    ("OUTER", TokenType::Outer),
    ("OVER", TokenType::Over),
    ("PARTITION", TokenType::Partition),
    ("PERCENT", TokenType::PercentKw),
    ("PRECEDING", TokenType::Preceding),
    ("PRIMARY", TokenType::Primary),
    ("QUALIFY", TokenType::Qualify),
    ("RANGE", TokenType::Range),
    ("RECURSIVE", TokenType::Recursive),
    ("REFERENCES", TokenType::References),
    ("REPLACE", TokenType::Replace),
    ("RIGHT", TokenType::Right),
    ("RLIKE", TokenType::RLike),
    ("ROW", TokenType::Row),
    ("ROWS", TokenType::Rows),
    ("SELECT", TokenType::Select),
    ("SET", TokenType::Set),
    ("TABLE", TokenType::Table),
    ("TEMP", TokenType::Temporary),
    ("TEMPORARY", TokenType::Temporary),
    ("THEN", TokenType::Then),
    ("TIES", TokenType::Ties),
    ("TOP", TokenType::Top),
    ("TRUE", TokenType::True),
    ("TRUNCATE", TokenType::Truncate),
    ("TRY_CAST", TokenType::TryCast),
    ("UNBOUNDED", TokenType::Unbounded),
    ("UNION", TokenType::Union),
    ("UNIQUE", TokenType::Unique),
    ("UPDATE", TokenType::Update),
    ("USE", TokenType::Use),
    ("USING", TokenType::Using),
    ("VALUES", TokenType::Values),
    ("VIEW", TokenType::View),
    ("WHEN", TokenType::When),
    ("WHERE", TokenType::Where),
    ("WINDOW", TokenType::Window),
    ("WITH", TokenType::With),
    ("WITHIN", TokenType::Within),
];

/// Tokenizer configuration for a dialect
#[derive(Debug, Clone)]
pub struct TokenizerConfig {
    /// Keywords mapping (uppercase keyword -> token type)
    pub keywords: HashMap<String, TokenType>,
    /// Identifier quote characters (start -> end)
    pub identifiers: HashMap<char, char>,
    /// Whether `"..."` is a string literal when `"` is not an identifier quote
    pub double_quote_strings: bool,
    /// String escape characters besides quote doubling
    pub string_escapes: Vec<char>,
    /// Whether to support nested block comments
    pub nested_comments: bool,
    /// Whether # starts a single-line comment (MySQL, Hive)
    pub hash_comments: bool,
    /// Whether `$$...$$` and `$tag$...$tag$` strings are recognized
    pub dollar_strings: bool,
    /// Characters that prefix variable or temp-table names (`@v`, `#t`)
    pub variable_prefixes: Vec<char>,
}

impl TokenizerConfig {
    /// Register an additional keyword spelling
    pub fn with_keyword(mut self, word: &str, token_type: TokenType) -> Self {
        self.keywords.insert(word.to_uppercase(), token_type);
        self
    }

    /// Remove a keyword so that the word scans as a plain name
    pub fn without_keyword(mut self, word: &str) -> Self {
        self.keywords.remove(&word.to_uppercase());
        self
    }

    /// Replace the identifier quote set
    pub fn with_identifiers(mut self, pairs: &[(char, char)]) -> Self {
        self.identifiers = pairs.iter().copied().collect();
        self
    }
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        let keywords = KEYWORDS
            .iter()
            .map(|(word, tt)| (word.to_string(), *tt))
            .collect();
        let mut identifiers = HashMap::new();
        identifiers.insert('"', '"');

        TokenizerConfig {
            keywords,
            identifiers,
            double_quote_strings: false,
            string_escapes: Vec::new(),
            nested_comments: false,
            hash_comments: false,
            dollar_strings: false,
            variable_prefixes: Vec::new(),
        }
    }
}

/// SQL Tokenizer
#[derive(Debug, Clone)]
pub struct Tokenizer {
    config: TokenizerConfig,
}

impl Tokenizer {
    /// Create a new tokenizer with the given configuration
    pub fn new(config: TokenizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    /// Tokenize a SQL string, stopping at the first error
    pub fn tokenize(&self, sql: &str) -> Result<Vec<Token>> {
        self.stream(sql).collect()
    }

    /// Lazily tokenize a SQL string
    pub fn stream<'a>(&'a self, sql: &'a str) -> TokenStream<'a> {
        TokenStream::new(sql, &self.config)
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(TokenizerConfig::default())
    }
}

/// A lazy, restartable token iterator.
///
/// Tokens are scanned on demand. `peek`/`peek_nth` buffer lookahead without
/// consuming it. After a lexical error the scanner has already moved past the
/// offending character, so iteration can continue with the following tokens.
pub struct TokenStream<'a> {
    sql: &'a str,
    config: &'a TokenizerConfig,
    state: TokenizerState<'a>,
    lookahead: VecDeque<Result<Token>>,
}

impl<'a> TokenStream<'a> {
    pub fn new(sql: &'a str, config: &'a TokenizerConfig) -> Self {
        Self {
            sql,
            config,
            state: TokenizerState::new(sql, config),
            lookahead: VecDeque::new(),
        }
    }

    /// Look at the next token without consuming it
    pub fn peek(&mut self) -> Option<&Result<Token>> {
        self.peek_nth(0)
    }

    /// Look `n` tokens ahead without consuming anything
    pub fn peek_nth(&mut self, n: usize) -> Option<&Result<Token>> {
        while self.lookahead.len() <= n {
            let next = self.state.next_token()?;
            self.lookahead.push_back(next);
        }
        self.lookahead.get(n)
    }

    /// Restart scanning from the beginning of the input
    pub fn reset(&mut self) {
        self.state = TokenizerState::new(self.sql, self.config);
        self.lookahead.clear();
    }

    /// The full input text
    pub fn source(&self) -> &'a str {
        self.sql
    }
}

impl Iterator for TokenStream<'_> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.lookahead.pop_front() {
            Some(item) => Some(item),
            None => self.state.next_token(),
        }
    }
}

/// Internal scanner state. Positions are byte offsets into `sql`.
struct TokenizerState<'a> {
    sql: &'a str,
    start: usize,
    start_line: usize,
    start_column: usize,
    current: usize,
    line: usize,
    column: usize,
    comments: Vec<String>,
    config: &'a TokenizerConfig,
}

impl<'a> TokenizerState<'a> {
    fn new(sql: &'a str, config: &'a TokenizerConfig) -> Self {
        Self {
            sql,
            start: 0,
            start_line: 1,
            start_column: 1,
            current: 0,
            line: 1,
            column: 1,
            comments: Vec::new(),
            config,
        }
    }

    fn next_token(&mut self) -> Option<Result<Token>> {
        if let Err(e) = self.skip_whitespace() {
            return Some(Err(e));
        }
        if self.is_at_end() {
            return None;
        }
        self.start = self.current;
        self.start_line = self.line;
        self.start_column = self.column;
        Some(self.scan_token())
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.sql.len()
    }

    fn peek(&self) -> char {
        self.sql[self.current..].chars().next().unwrap_or('\0')
    }

    fn peek_nth(&self, n: usize) -> char {
        self.sql[self.current..].chars().nth(n).unwrap_or('\0')
    }

    fn rest(&self) -> &'a str {
        &self.sql[self.current..]
    }

    fn advance(&mut self) -> char {
        let c = self.peek();
        if c == '\0' && self.is_at_end() {
            return c;
        }
        self.current += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        c
    }

    fn advance_bytes(&mut self, bytes: usize) {
        let target = (self.current + bytes).min(self.sql.len());
        while self.current < target {
            self.advance();
        }
    }

    fn start_span(&self) -> Span {
        Span::new(self.start, self.current, self.start_line, self.start_column)
    }

    fn here(&self) -> Span {
        Span::new(self.current, self.current, self.line, self.column)
    }

    fn skip_whitespace(&mut self) -> Result<()> {
        while !self.is_at_end() {
            let c = self.peek();
            match c {
                ' ' | '\t' | '\r' | '\n' | '\u{00A0}' | '\u{FEFF}' => {
                    self.advance();
                }
                '-' if self.peek_nth(1) == '-' => self.scan_line_comment(),
                '/' if self.peek_nth(1) == '*' => self.scan_block_comment()?,
                '#' if self.config.hash_comments => self.scan_line_comment(),
                _ => break,
            }
        }
        Ok(())
    }

    fn scan_line_comment(&mut self) {
        let start = self.current;
        while !self.is_at_end() && self.peek() != '\n' {
            self.advance();
        }
        let comment = self.sql[start..self.current].trim_end().to_string();
        self.comments.push(comment);
    }

    fn scan_block_comment(&mut self) -> Result<()> {
        let start = self.current;
        let open = self.here();
        self.advance(); // /
        self.advance(); // *
        let mut depth = 1;

        while !self.is_at_end() && depth > 0 {
            if self.config.nested_comments && self.peek() == '/' && self.peek_nth(1) == '*' {
                self.advance();
                self.advance();
                depth += 1;
            } else if self.peek() == '*' && self.peek_nth(1) == '/' {
                self.advance();
                self.advance();
                depth -= 1;
            } else {
                self.advance();
            }
        }

        if depth > 0 {
            return Err(Error::tokenize("Unterminated block comment", open));
        }
        self.comments.push(self.sql[start..self.current].to_string());
        Ok(())
    }

    fn scan_token(&mut self) -> Result<Token> {
        let c = self.peek();
        let next = self.peek_nth(1);

        if let Some(&end) = self.config.identifiers.get(&c) {
            return self.scan_quoted_identifier(end);
        }

        match c {
            '\'' => self.scan_string(TokenType::String, '\''),
            '"' if self.config.double_quote_strings => self.scan_string(TokenType::String, '"'),
            '$' if self.config.dollar_strings && (next == '$' || next.is_alphabetic() || next == '_') => {
                match self.try_scan_dollar_string()? {
                    Some(token) => Ok(token),
                    None => self.scan_identifier_or_keyword(),
                }
            }
            '$' if next.is_ascii_digit() => {
                self.advance();
                while self.peek().is_ascii_digit() {
                    self.advance();
                }
                Ok(self.make_token(TokenType::Parameter))
            }
            '?' => {
                self.advance();
                Ok(self.make_token(TokenType::Parameter))
            }
            c if c.is_ascii_digit() => self.scan_number(),
            '.' if next.is_ascii_digit() => self.scan_number(),
            c if self.config.variable_prefixes.contains(&c)
                && (next.is_alphanumeric() || next == '_' || next == c) =>
            {
                self.scan_prefixed_name()
            }
            c if c.is_alphabetic() || c == '_' => self.scan_identifier_or_keyword(),
            _ => self.scan_operator(),
        }
    }

    fn scan_operator(&mut self) -> Result<Token> {
        const MULTI: &[(&str, TokenType)] = &[
            ("->>", TokenType::DArrow),
            ("<=>", TokenType::NullsafeEq),
            ("::", TokenType::DColon),
            (":=", TokenType::ColonEq),
            ("<=", TokenType::Lte),
            (">=", TokenType::Gte),
            ("<>", TokenType::Neq),
            ("!=", TokenType::Neq),
            ("^=", TokenType::Neq),
            ("||", TokenType::DPipe),
            ("**", TokenType::DStar),
            ("->", TokenType::Arrow),
            ("=>", TokenType::FArrow),
            ("<<", TokenType::LtLt),
            (">>", TokenType::GtGt),
        ];
        for (op, tt) in MULTI {
            if self.rest().starts_with(op) {
                self.advance_bytes(op.len());
                return Ok(self.make_token(*tt));
            }
        }

        let c = self.advance();
        let token_type = match c {
            '(' => TokenType::LParen,
            ')' => TokenType::RParen,
            '[' => TokenType::LBracket,
            ']' => TokenType::RBracket,
            '{' => TokenType::LBrace,
            '}' => TokenType::RBrace,
            ',' => TokenType::Comma,
            '.' => TokenType::Dot,
            ';' => TokenType::Semicolon,
            ':' => TokenType::Colon,
            '*' => TokenType::Star,
            '+' => TokenType::Plus,
            '-' => TokenType::Dash,
            '/' => TokenType::Slash,
            '%' => TokenType::Percent,
            '=' => TokenType::Eq,
            '<' => TokenType::Lt,
            '>' => TokenType::Gt,
            '|' => TokenType::Pipe,
            '&' => TokenType::Amp,
            '^' => TokenType::Caret,
            '~' => TokenType::Tilde,
            other => {
                return Err(Error::tokenize(
                    format!("Unexpected character: '{}'", other),
                    self.start_span(),
                ));
            }
        };
        Ok(self.make_token(token_type))
    }

    fn scan_string(&mut self, token_type: TokenType, quote: char) -> Result<Token> {
        let value = self.scan_string_body(quote, self.config.string_escapes.contains(&'\\'))?;
        let mut token = self.make_token(token_type);
        token.text = value;
        Ok(token)
    }

    /// Scan from the opening quote through the closing quote, returning the unescaped content
    fn scan_string_body(&mut self, quote: char, backslash_escapes: bool) -> Result<String> {
        let open = self.here();
        self.advance(); // Opening quote
        let mut value = String::new();

        loop {
            if self.is_at_end() {
                return Err(Error::tokenize("Unterminated string", open));
            }
            let c = self.peek();
            if c == quote {
                if self.peek_nth(1) == quote {
                    value.push(quote);
                    self.advance();
                    self.advance();
                } else {
                    self.advance(); // Closing quote
                    return Ok(value);
                }
            } else if c == '\\' && backslash_escapes {
                self.advance();
                if self.is_at_end() {
                    return Err(Error::tokenize("Unterminated string", open));
                }
                match self.advance() {
                    'n' => value.push('\n'),
                    'r' => value.push('\r'),
                    't' => value.push('\t'),
                    '0' => value.push('\0'),
                    '\\' => value.push('\\'),
                    '\'' => value.push('\''),
                    '"' => value.push('"'),
                    other => {
                        value.push('\\');
                        value.push(other);
                    }
                }
            } else {
                value.push(self.advance());
            }
        }
    }

    fn try_scan_dollar_string(&mut self) -> Result<Option<Token>> {
        let rest = self.rest();
        let tag: String = rest[1..]
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        if !rest[1 + tag.len()..].starts_with('$') {
            return Ok(None);
        }
        let delimiter = format!("${}$", tag);
        let open = self.here();
        let body = &rest[delimiter.len()..];
        let Some(end) = body.find(&delimiter) else {
            self.advance_bytes(rest.len());
            return Err(Error::tokenize("Unterminated dollar-quoted string", open));
        };
        let content = body[..end].to_string();
        self.advance_bytes(delimiter.len() * 2 + end);
        let mut token = self.make_token(TokenType::DollarString);
        token.text = content;
        Ok(Some(token))
    }

    fn scan_quoted_identifier(&mut self, end_quote: char) -> Result<Token> {
        let open = self.here();
        self.advance(); // Opening quote
        let mut value = String::new();

        loop {
            if self.is_at_end() {
                return Err(Error::tokenize("Unterminated identifier", open));
            }
            let c = self.advance();
            if c == end_quote {
                if self.peek() == end_quote {
                    value.push(end_quote);
                    self.advance();
                } else {
                    break;
                }
            } else {
                value.push(c);
            }
        }

        let mut token = self.make_token(TokenType::QuotedIdentifier);
        token.text = value;
        Ok(token)
    }

    fn scan_number(&mut self) -> Result<Token> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
        if self.peek() == '.' && self.peek_nth(1) != '.' {
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }
        if matches!(self.peek(), 'e' | 'E') {
            let sign = self.peek_nth(1);
            let digit_at = if sign == '+' || sign == '-' { 2 } else { 1 };
            if self.peek_nth(digit_at).is_ascii_digit() {
                for _ in 0..digit_at {
                    self.advance();
                }
                while self.peek().is_ascii_digit() {
                    self.advance();
                }
            }
        }
        Ok(self.make_token(TokenType::Number))
    }

    /// `@var`, `@@global`, `#temp`, `##global_temp`
    fn scan_prefixed_name(&mut self) -> Result<Token> {
        let first = self.advance();
        if self.peek() == first {
            self.advance();
        }
        while !self.is_at_end() {
            let c = self.peek();
            if c.is_alphanumeric() || c == '_' || c == '$' || c == '#' || c == '@' {
                self.advance();
            } else {
                break;
            }
        }
        Ok(self.make_token(TokenType::Var))
    }

    fn scan_identifier_or_keyword(&mut self) -> Result<Token> {
        while !self.is_at_end() {
            let c = self.peek();
            let hash_ok = c == '#' && !self.config.hash_comments;
            if c.is_alphanumeric() || c == '_' || c == '$' || hash_ok {
                self.advance();
            } else {
                break;
            }
        }

        let text = &self.sql[self.start..self.current];
        let upper = text.to_uppercase();

        if self.peek() == '\'' {
            match upper.as_str() {
                "N" => return self.scan_string(TokenType::NationalString, '\''),
                "X" => return self.scan_string(TokenType::HexString, '\''),
                "E" => {
                    let value = self.scan_string_body('\'', true)?;
                    let mut token = self.make_token(TokenType::String);
                    token.text = value;
                    return Ok(token);
                }
                _ => {}
            }
        }

        let token_type = self
            .config
            .keywords
            .get(&upper)
            .copied()
            .unwrap_or(TokenType::Var);
        Ok(self.make_token(token_type))
    }

    fn make_token(&mut self, token_type: TokenType) -> Token {
        let span = self.start_span();
        let mut token = Token::new(token_type, &self.sql[self.start..self.current], span);
        token.comments = std::mem::take(&mut self.comments);
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(tokens: &[Token]) -> Vec<TokenType> {
        tokens.iter().map(|t| t.token_type).collect()
    }

    #[test]
    fn test_simple_select() {
        let tokenizer = Tokenizer::default();
        let tokens = tokenizer.tokenize("SELECT a, b FROM t").unwrap();

        assert_eq!(
            types(&tokens),
            vec![
                TokenType::Select,
                TokenType::Var,
                TokenType::Comma,
                TokenType::Var,
                TokenType::From,
                TokenType::Var
            ]
        );
        assert_eq!(tokens[5].text, "t");
        assert_eq!(tokens[5].span, Span::new(17, 18, 1, 18));
    }

    #[test]
    fn test_token_classes() {
        let tokens = Tokenizer::default()
            .tokenize("SELECT x + 'a' FROM \"t\";")
            .unwrap();
        let classes: Vec<TokenClass> = tokens.iter().map(Token::class).collect();
        assert_eq!(
            classes,
            vec![
                TokenClass::Keyword,
                TokenClass::Identifier,
                TokenClass::Operator,
                TokenClass::Literal,
                TokenClass::Keyword,
                TokenClass::Identifier,
                TokenClass::Punctuation
            ]
        );
    }

    #[test]
    fn test_escaped_string() {
        let tokens = Tokenizer::default().tokenize("SELECT 'it''s'").unwrap();
        assert_eq!(tokens[1].token_type, TokenType::String);
        assert_eq!(tokens[1].text, "it's");
    }

    #[test]
    fn test_backslash_escapes_are_dialect_specific() {
        let mut config = TokenizerConfig::default();
        config.string_escapes.push('\\');
        let tokens = Tokenizer::new(config).tokenize(r"SELECT 'a\'b'").unwrap();
        assert_eq!(tokens[1].text, "a'b");

        let tokens = Tokenizer::default().tokenize(r"SELECT 'a\b'").unwrap();
        assert_eq!(tokens[1].text, r"a\b");
    }

    #[test]
    fn test_bracket_and_backtick_identifiers() {
        let config = TokenizerConfig::default().with_identifiers(&[('[', ']'), ('"', '"')]);
        let tokens = Tokenizer::new(config).tokenize("SELECT [order id] FROM [dbo].[t]").unwrap();
        assert_eq!(tokens[1].token_type, TokenType::QuotedIdentifier);
        assert_eq!(tokens[1].text, "order id");

        let config = TokenizerConfig::default().with_identifiers(&[('`', '`')]);
        let tokens = Tokenizer::new(config).tokenize("SELECT `a``b`").unwrap();
        assert_eq!(tokens[1].text, "a`b");
    }

    #[test]
    fn test_comments_attach_to_next_token() {
        let tokens = Tokenizer::default()
            .tokenize("-- header\nSELECT /* inline */ 1")
            .unwrap();
        assert_eq!(tokens[0].comments, vec!["-- header".to_string()]);
        assert_eq!(tokens[1].comments, vec!["/* inline */".to_string()]);
    }

    #[test]
    fn test_nested_comments() {
        let mut config = TokenizerConfig::default();
        config.nested_comments = true;
        let tokens = Tokenizer::new(config)
            .tokenize("/* a /* b */ c */ SELECT 1")
            .unwrap();
        assert_eq!(tokens[0].token_type, TokenType::Select);

        let err = Tokenizer::default().tokenize("/* open").unwrap_err();
        assert!(matches!(err, Error::Tokenize { .. }));
    }

    #[test]
    fn test_hash_comments() {
        let mut config = TokenizerConfig::default();
        config.hash_comments = true;
        let tokens = Tokenizer::new(config).tokenize("SELECT 1 # trailing").unwrap();
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn test_operators() {
        let tokens = Tokenizer::default()
            .tokenize("a::INT || b ** 2 <> c <=> d -> 'k' ->> 'j'")
            .unwrap();
        assert_eq!(tokens[1].token_type, TokenType::DColon);
        assert_eq!(tokens[3].token_type, TokenType::DPipe);
        assert_eq!(tokens[5].token_type, TokenType::DStar);
        assert_eq!(tokens[7].token_type, TokenType::Neq);
        assert_eq!(tokens[9].token_type, TokenType::NullsafeEq);
        assert_eq!(tokens[11].token_type, TokenType::Arrow);
        assert_eq!(tokens[13].token_type, TokenType::DArrow);
    }

    #[test]
    fn test_numbers() {
        let tokens = Tokenizer::default().tokenize("1 2.5 .5 1e10 3E-2").unwrap();
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["1", "2.5", ".5", "1e10", "3E-2"]);
        assert!(tokens.iter().all(|t| t.token_type == TokenType::Number));
    }

    #[test]
    fn test_prefixed_strings() {
        let tokens = Tokenizer::default().tokenize("N'abc' X'FF'").unwrap();
        assert_eq!(tokens[0].token_type, TokenType::NationalString);
        assert_eq!(tokens[0].text, "abc");
        assert_eq!(tokens[1].token_type, TokenType::HexString);
        assert_eq!(tokens[1].text, "FF");
    }

    #[test]
    fn test_dollar_strings() {
        let mut config = TokenizerConfig::default();
        config.dollar_strings = true;
        let tokens = Tokenizer::new(config)
            .tokenize("SELECT $$it's$$, $fn$body$fn$, $1")
            .unwrap();
        assert_eq!(tokens[1].token_type, TokenType::DollarString);
        assert_eq!(tokens[1].text, "it's");
        assert_eq!(tokens[3].text, "body");
        assert_eq!(tokens[5].token_type, TokenType::Parameter);
    }

    #[test]
    fn test_variable_prefixes() {
        let mut config = TokenizerConfig::default();
        config.variable_prefixes = vec!['@', '#'];
        let tokens = Tokenizer::new(config)
            .tokenize("SELECT @id, @@ROWCOUNT FROM #tmp")
            .unwrap();
        assert_eq!(tokens[1].text, "@id");
        assert_eq!(tokens[3].text, "@@ROWCOUNT");
        assert_eq!(tokens[5].text, "#tmp");
        assert_eq!(tokens[5].token_type, TokenType::Var);
    }

    #[test]
    fn test_unterminated_string_reports_opening_position() {
        let err = Tokenizer::default().tokenize("SELECT 'abc").unwrap_err();
        match err {
            Error::Tokenize { line, column, offset, .. } => {
                assert_eq!((line, column, offset), (1, 8, 7));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_stream_recovers_after_bad_character() {
        let tokenizer = Tokenizer::default();
        let items: Vec<Result<Token>> = tokenizer.stream("SELECT 1 ! 2").collect();
        assert_eq!(items.len(), 4);
        assert!(items[2].is_err());
        assert_eq!(items[3].as_ref().unwrap().text, "2");
    }

    #[test]
    fn test_stream_peek_and_reset() {
        let tokenizer = Tokenizer::default();
        let mut stream = tokenizer.stream("SELECT a FROM t");
        assert_eq!(stream.peek_nth(2).unwrap().as_ref().unwrap().token_type, TokenType::From);
        assert_eq!(stream.next().unwrap().unwrap().token_type, TokenType::Select);
        assert_eq!(stream.next().unwrap().unwrap().text, "a");
        stream.reset();
        assert_eq!(stream.next().unwrap().unwrap().token_type, TokenType::Select);
        assert_eq!(stream.count(), 3);
    }

    #[test]
    fn test_multibyte_offsets() {
        let tokens = Tokenizer::default().tokenize("SELECT 'é', x").unwrap();
        assert_eq!(tokens[1].span, Span::new(7, 11, 1, 8));
        assert_eq!(tokens[3].span.start, 13);
        assert_eq!(tokens[3].span.column, 13);
    }
}
