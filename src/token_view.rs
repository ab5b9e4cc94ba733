//! Cursor over a scanned token sequence.
//!
//! Every query takes a [`View`]: the visible view steps over hidden tokens
//! (line breaks) as if they were not there, the hidden view sees every token
//! in source order. The parser mixes both freely; statement terminators and
//! sequence separators are looked up in the hidden view while expressions
//! are parsed in the visible one.

use crate::lexer::{Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Visible,
    Hidden,
}

#[derive(Debug, Clone)]
pub struct TokenView {
    tokens: Vec<Token>,
    current: usize,
    previous: Option<usize>,
}

impl TokenView {
    /// Wraps `tokens`. A trailing EOF token is appended if the sequence does
    /// not already end with one.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        let needs_eof = !matches!(tokens.last(), Some(token) if token.kind == TokenKind::Eof);
        if needs_eof {
            let (line, column) = tokens
                .last()
                .map(|token| (token.line, token.column + token.lexeme.chars().count()))
                .unwrap_or((1, 1));
            tokens.push(Token::new(TokenKind::Eof, "", line, column));
        }
        Self {
            tokens,
            current: 0,
            previous: None,
        }
    }

    pub fn peek(&self, view: View) -> &Token {
        &self.tokens[self.resolve(self.current, view)]
    }

    /// The token one past [`peek`](Self::peek) in the same view. At the end of
    /// input this is the EOF token again.
    pub fn peek_next(&self, view: View) -> &Token {
        let here = self.resolve(self.current, view);
        if self.tokens[here].kind == TokenKind::Eof {
            return &self.tokens[here];
        }
        &self.tokens[self.resolve(here + 1, view)]
    }

    /// Consumes and returns the token [`peek`](Self::peek) would return. EOF
    /// is never consumed; advancing at the end keeps returning it.
    pub fn advance(&mut self, view: View) -> Token {
        let here = self.resolve(self.current, view);
        self.previous = Some(here);
        if self.tokens[here].kind != TokenKind::Eof {
            self.current = here + 1;
        } else {
            self.current = here;
        }
        if view == View::Visible {
            self.current = self.resolve(self.current, View::Visible);
        }
        self.tokens[here].clone()
    }

    /// The last token physically consumed, whichever view consumed it. Before
    /// anything is consumed this is the first token.
    pub fn previous(&self) -> &Token {
        match self.previous {
            Some(index) => &self.tokens[index],
            None => self.peek(View::Hidden),
        }
    }

    /// Index of the cursor; only meaningful for comparing two positions.
    pub fn position(&self) -> usize {
        self.current
    }

    /// Whether hidden tokens lie between the last consumed token and the
    /// cursor, i.e. a visible advance stepped over a line break.
    pub fn skipped_hidden(&self) -> bool {
        self.previous
            .and_then(|index| self.tokens.get(index + 1..self.current))
            .is_some_and(|skipped| skipped.iter().any(|token| token.hidden))
    }

    pub fn is_at_end(&self, view: View) -> bool {
        self.peek(view).kind == TokenKind::Eof
    }

    pub fn check(&self, kind: &TokenKind, view: View) -> bool {
        !self.is_at_end(view) && self.peek(view).is(kind)
    }

    fn resolve(&self, mut index: usize, view: View) -> usize {
        let last = self.tokens.len() - 1;
        index = index.min(last);
        if view == View::Visible {
            while self.tokens[index].hidden && index < last {
                index += 1;
            }
        }
        index
    }
}
