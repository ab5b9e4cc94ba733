use std::fmt;

use tracing::debug;

use crate::diagnostics::{DiagnosticKind, Diagnostics};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    True,
    False,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Integer,
    Decimal,
    String,
    Keyword(Keyword),
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Colon,
    Question,
    Tilde,
    Arrow,
    FatArrow,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Ampersand,
    Pipe,
    DoubleAmpersand,
    DoublePipe,
    Bang,
    BangEqual,
    EqualEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Semicolon,
    Eol,
    Unknown,
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
    pub hidden: bool,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            line,
            column,
            hidden: false,
        }
    }

    pub fn is(&self, kind: &TokenKind) -> bool {
        &self.kind == kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eol => write!(f, "end of line")?,
            TokenKind::Eof => write!(f, "end of input")?,
            _ => write!(f, "`{}`", self.lexeme)?,
        }
        write!(f, " at {}:{}", self.line, self.column)
    }
}

/// Single-pass scanner. Never aborts: malformed input is reported through the
/// returned [`Diagnostics`] and scanning picks up again at the next character.
pub struct Lexer<'a> {
    source: &'a str,
    chars: std::str::CharIndices<'a>,
    current: usize,
    peeked: Option<(usize, char)>,
    line: usize,
    column: usize,
    start: usize,
    start_line: usize,
    start_column: usize,
    tokens: Vec<Token>,
    diagnostics: Diagnostics,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices(),
            current: 0,
            peeked: None,
            line: 1,
            column: 1,
            start: 0,
            start_line: 1,
            start_column: 1,
            tokens: Vec::new(),
            diagnostics: Diagnostics::new(DiagnosticKind::Lexer),
        }
    }

    fn bump(&mut self) -> Option<char> {
        let next = match self.peeked.take() {
            Some(pair) => Some(pair),
            None => self.chars.next(),
        };
        let (idx, ch) = next?;
        self.current = idx + ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn peek(&mut self) -> Option<char> {
        if self.peeked.is_none() {
            self.peeked = self.chars.next();
        }
        self.peeked.map(|(_, ch)| ch)
    }

    fn peek_next(&mut self) -> Option<char> {
        self.peek()?;
        self.chars.clone().next().map(|(_, ch)| ch)
    }

    fn match_next(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn is_at_end(&mut self) -> bool {
        self.peek().is_none()
    }

    fn lexeme(&self) -> &'a str {
        &self.source[self.start..self.current]
    }

    fn start_token(&self) -> Token {
        Token::new(
            TokenKind::Unknown,
            self.lexeme(),
            self.start_line,
            self.start_column,
        )
    }

    fn add_token(&mut self, kind: TokenKind) {
        let token = Token::new(kind, self.lexeme(), self.start_line, self.start_column);
        self.tokens.push(token);
    }

    fn error(&mut self, message: impl Into<String>) {
        let token = self.start_token();
        debug!(line = token.line, column = token.column, "lexical error");
        self.diagnostics.error(&token, message);
    }

    fn last_is_eol(&self) -> bool {
        matches!(self.tokens.last(), Some(token) if token.kind == TokenKind::Eol)
    }

    pub fn tokenize(mut self) -> (Vec<Token>, Diagnostics) {
        loop {
            self.start = self.current;
            self.start_line = self.line;
            self.start_column = self.column;
            let Some(ch) = self.bump() else {
                break;
            };
            if !self.scan_token(ch) {
                break;
            }
        }
        self.tokens
            .push(Token::new(TokenKind::Eof, "", self.line, self.column));
        debug!(
            tokens = self.tokens.len(),
            errors = self.diagnostics.errors.len(),
            warnings = self.diagnostics.warnings.len(),
            "lexing finished"
        );
        (self.tokens, self.diagnostics)
    }

    /// Scans one lexeme starting with `ch`. Returns `false` when scanning
    /// cannot safely continue.
    fn scan_token(&mut self, ch: char) -> bool {
        match ch {
            '(' => self.add_token(TokenKind::LParen),
            ')' => self.add_token(TokenKind::RParen),
            '{' => self.add_token(TokenKind::LBrace),
            '}' => self.add_token(TokenKind::RBrace),
            '[' => self.add_token(TokenKind::LBracket),
            ']' => self.add_token(TokenKind::RBracket),
            ',' => self.add_token(TokenKind::Comma),
            '.' => self.add_token(TokenKind::Dot),
            ':' => self.add_token(TokenKind::Colon),
            '?' => self.add_token(TokenKind::Question),
            '~' => self.add_token(TokenKind::Tilde),
            '+' => self.add_token(TokenKind::Plus),
            '*' => self.add_token(TokenKind::Star),
            '-' => {
                let kind = if self.match_next('>') {
                    TokenKind::Arrow
                } else {
                    TokenKind::Minus
                };
                self.add_token(kind);
            }
            '=' => {
                let kind = if self.match_next('>') {
                    TokenKind::FatArrow
                } else if self.match_next('=') {
                    TokenKind::EqualEqual
                } else {
                    TokenKind::Assign
                };
                self.add_token(kind);
            }
            '!' => {
                let kind = if self.match_next('=') {
                    TokenKind::BangEqual
                } else {
                    TokenKind::Bang
                };
                self.add_token(kind);
            }
            '&' => {
                let kind = if self.match_next('&') {
                    TokenKind::DoubleAmpersand
                } else {
                    TokenKind::Ampersand
                };
                self.add_token(kind);
            }
            '|' => {
                let kind = if self.match_next('|') {
                    TokenKind::DoublePipe
                } else {
                    TokenKind::Pipe
                };
                self.add_token(kind);
            }
            '<' => {
                let kind = if self.match_next('=') {
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                };
                self.add_token(kind);
            }
            '>' => {
                let kind = if self.match_next('=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                };
                self.add_token(kind);
            }
            '/' => {
                if self.match_next('/') {
                    while !matches!(self.peek(), Some('\n') | None) {
                        self.bump();
                    }
                } else if self.match_next('*') {
                    return self.block_comment();
                } else {
                    self.add_token(TokenKind::Slash);
                }
            }
            ';' => self.semicolon(),
            ' ' | '\t' | '\r' => {}
            '\n' => self.newline(),
            '"' => self.string_literal(),
            '0'..='9' => self.number_literal(),
            'a'..='z' | 'A'..='Z' | '_' => self.identifier_or_keyword(),
            other => self.error(format!("unexpected character '{other}'")),
        }
        true
    }

    fn newline(&mut self) {
        if self.last_is_eol() {
            return;
        }
        let mut token = Token::new(TokenKind::Eol, "\n", self.start_line, self.start_column);
        token.hidden = true;
        self.tokens.push(token);
    }

    fn semicolon(&mut self) {
        let redundant =
            self.last_is_eol() || matches!(self.peek(), Some('\n') | Some(';') | None);
        if redundant {
            let token = self.start_token();
            self.diagnostics.warning(&token, "redundant ';'");
        } else {
            self.add_token(TokenKind::Semicolon);
        }
    }

    /// Consumes a (possibly nested) block comment whose `/*` was already
    /// read. An unterminated comment swallows the rest of the input.
    fn block_comment(&mut self) -> bool {
        let mut depth = 1usize;
        while let Some(ch) = self.bump() {
            if ch == '/' && self.match_next('*') {
                depth += 1;
            } else if ch == '*' && self.match_next('/') {
                depth -= 1;
                if depth == 0 {
                    return true;
                }
            }
        }
        let token = Token::new(TokenKind::Unknown, "/*", self.start_line, self.start_column);
        self.diagnostics.error(&token, "unterminated comment");
        false
    }

    fn string_literal(&mut self) {
        loop {
            match self.bump() {
                None => {
                    self.error("unterminated string");
                    return;
                }
                Some('"') => break,
                Some('\\') => match self.peek() {
                    Some('n') | Some('\\') | Some('"') | Some('\n') => {
                        self.bump();
                    }
                    Some(other) => {
                        self.error(format!("unexpected escape sequence '\\{other}'"));
                        self.abandon_string();
                        return;
                    }
                    None => {
                        self.error("unterminated string");
                        return;
                    }
                },
                Some(_) => {}
            }
        }
        self.add_token(TokenKind::String);
    }

    /// Skips the remainder of a string literal after a bad escape so the
    /// closing quote is not mistaken for the start of a new string.
    fn abandon_string(&mut self) {
        while let Some(ch) = self.bump() {
            match ch {
                '"' => return,
                '\\' => {
                    self.bump();
                }
                _ => {}
            }
        }
    }

    fn number_literal(&mut self) {
        while matches!(self.peek(), Some('0'..='9')) {
            self.bump();
        }
        let mut kind = TokenKind::Integer;
        if self.peek() == Some('.') && matches!(self.peek_next(), Some('0'..='9')) {
            self.bump();
            while matches!(self.peek(), Some('0'..='9')) {
                self.bump();
            }
            kind = TokenKind::Decimal;
        }
        self.add_token(kind);
    }

    fn identifier_or_keyword(&mut self) {
        while matches!(self.peek(), Some(ch) if ch.is_ascii_alphanumeric() || ch == '_') {
            self.bump();
        }
        let kind = keyword_for(self.lexeme()).unwrap_or(TokenKind::Identifier);
        self.add_token(kind);
    }
}

/// Decodes the body of a string token's lexeme (quotes included) into its
/// runtime text.
pub fn unescape(lexeme: &str) -> String {
    let body = lexeme
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(lexeme);
    let mut value = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            value.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => value.push('\n'),
            Some('\n') | None => {}
            Some(other) => value.push(other),
        }
    }
    value
}

fn keyword_for(ident: &str) -> Option<TokenKind> {
    let keyword = match ident {
        "true" => Keyword::True,
        "false" => Keyword::False,
        _ => return None,
    };
    Some(TokenKind::Keyword(keyword))
}

/// Convenience wrapper around [`Lexer::tokenize`].
pub fn tokenize(source: &str) -> (Vec<Token>, Diagnostics) {
    Lexer::new(source).tokenize()
}
