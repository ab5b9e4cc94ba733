use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use tracing::debug;

use crate::{
    ast::{BinaryOp, Expr, Literal, LogicalOp, Program, Repl, ReplItem, Source, Stmt, UnaryOp},
    diagnostics::{Diagnostic, DiagnosticKind, Diagnostics},
    lexer::{unescape, Keyword, Token, TokenKind},
    session::Mode,
    token_view::{TokenView, View},
};

/// Parses a whole file: `statement* EOF`.
pub fn parse_source(tokens: Vec<Token>) -> (Source, Diagnostics) {
    let mut parser = Parser::new(tokens);
    let source = parser.parse_source();
    debug!(
        statements = source.statements.len(),
        errors = parser.diagnostics.errors.len(),
        "parsed source"
    );
    (source, parser.diagnostics)
}

/// Parses interactive input, where a line may also be a bare expression.
pub fn parse_repl(tokens: Vec<Token>) -> (Repl, Diagnostics) {
    let mut parser = Parser::new(tokens);
    let repl = parser.parse_repl();
    debug!(
        items = repl.items.len(),
        errors = parser.diagnostics.errors.len(),
        "parsed repl input"
    );
    (repl, parser.diagnostics)
}

pub fn parse(tokens: Vec<Token>, mode: Mode) -> (Program, Diagnostics) {
    match mode {
        Mode::Batch => {
            let (source, diagnostics) = parse_source(tokens);
            (Program::Source(source), diagnostics)
        }
        Mode::Interactive => {
            let (repl, diagnostics) = parse_repl(tokens);
            (Program::Repl(repl), diagnostics)
        }
    }
}

struct Parser {
    tokens: TokenView,
    diagnostics: Diagnostics,
    builder_depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens: TokenView::new(tokens),
            diagnostics: Diagnostics::new(DiagnosticKind::Parser),
            builder_depth: 0,
        }
    }

    fn parse_source(&mut self) -> Source {
        let mut statements = Vec::new();
        while !self.tokens.is_at_end(View::Visible) {
            let start = self.tokens.position();
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(diagnostic) => self.recover(diagnostic, start),
            }
        }
        Source { statements }
    }

    fn parse_repl(&mut self) -> Repl {
        let mut items = Vec::new();
        while !self.tokens.is_at_end(View::Visible) {
            self.skip_hidden();
            let start = self.tokens.position();
            let item = if self.starts_statement() {
                self.parse_statement().map(ReplItem::Stmt)
            } else {
                self.parse_expression_line().map(ReplItem::Expr)
            };
            match item {
                Ok(item) => items.push(item),
                Err(diagnostic) => self.recover(diagnostic, start),
            }
        }
        Repl { items }
    }

    /// A repl line is a typed statement when its leading identifier is
    /// followed by anything but a terminator; `x` on its own is a bare
    /// expression.
    fn starts_statement(&self) -> bool {
        self.tokens.check(&TokenKind::Identifier, View::Visible)
            && !matches!(
                self.tokens.peek_next(View::Hidden).kind,
                TokenKind::Semicolon | TokenKind::Eol | TokenKind::Eof
            )
    }

    fn parse_statement(&mut self) -> Result<Stmt, Diagnostic> {
        let kind = self.consume(TokenKind::Identifier, "expect statement type identifier")?;
        let value = self.parse_expression()?;
        self.end_of_statement("expect ';' or newline after statement")?;
        Ok(Stmt { kind, value })
    }

    fn parse_expression_line(&mut self) -> Result<Expr, Diagnostic> {
        let expr = self.parse_expression()?;
        self.end_of_statement("expect ';' or newline after expression")?;
        Ok(expr)
    }

    fn end_of_statement(&mut self, message: &str) -> Result<(), Diagnostic> {
        if self.tokens.is_at_end(View::Hidden)
            || self.tokens.skipped_hidden()
            || self.matches_hidden(&[TokenKind::Semicolon, TokenKind::Eol])
        {
            return Ok(());
        }
        if self.builder_depth > 0 && self.tokens.check(&TokenKind::RBrace, View::Hidden) {
            return Ok(());
        }
        Err(self.error(self.tokens.peek(View::Hidden), message))
    }

    fn parse_expression(&mut self) -> Result<Expr, Diagnostic> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_and()?;
        while self.matches(TokenKind::DoublePipe) {
            let operator = self.tokens.previous().clone();
            let right = self.parse_and()?;
            expr = Expr::Logical {
                op: LogicalOp::Or,
                operator,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_equality()?;
        while self.matches(TokenKind::DoubleAmpersand) {
            let operator = self.tokens.previous().clone();
            let right = self.parse_equality()?;
            expr = Expr::Logical {
                op: LogicalOp::And,
                operator,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn parse_equality(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_comparison()?;
        while let Some(op) = if self.matches(TokenKind::EqualEqual) {
            Some(BinaryOp::Equal)
        } else if self.matches(TokenKind::BangEqual) {
            Some(BinaryOp::NotEqual)
        } else {
            None
        } {
            expr = self.finish_binary(expr, op, Self::parse_comparison)?;
        }
        Ok(expr)
    }

    fn parse_comparison(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_term()?;
        while let Some(op) = if self.matches(TokenKind::LessEqual) {
            Some(BinaryOp::LessEqual)
        } else if self.matches(TokenKind::GreaterEqual) {
            Some(BinaryOp::GreaterEqual)
        } else if self.matches(TokenKind::Less) {
            Some(BinaryOp::Less)
        } else if self.matches(TokenKind::Greater) {
            Some(BinaryOp::Greater)
        } else {
            None
        } {
            expr = self.finish_binary(expr, op, Self::parse_term)?;
        }
        Ok(expr)
    }

    fn parse_term(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_factor()?;
        while let Some(op) = if self.matches(TokenKind::Plus) {
            Some(BinaryOp::Add)
        } else if self.matches(TokenKind::Minus) {
            Some(BinaryOp::Sub)
        } else {
            None
        } {
            expr = self.finish_binary(expr, op, Self::parse_factor)?;
        }
        Ok(expr)
    }

    fn parse_factor(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_unary()?;
        while let Some(op) = if self.matches(TokenKind::Star) {
            Some(BinaryOp::Mul)
        } else if self.matches(TokenKind::Slash) {
            Some(BinaryOp::Div)
        } else {
            None
        } {
            expr = self.finish_binary(expr, op, Self::parse_unary)?;
        }
        Ok(expr)
    }

    /// Builds `left <op> right` once the operator token has been consumed.
    fn finish_binary(
        &mut self,
        left: Expr,
        op: BinaryOp,
        operand: fn(&mut Self) -> Result<Expr, Diagnostic>,
    ) -> Result<Expr, Diagnostic> {
        let operator = self.tokens.previous().clone();
        let right = operand(self)?;
        Ok(Expr::Binary {
            op,
            operator,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn parse_unary(&mut self) -> Result<Expr, Diagnostic> {
        let op = if self.matches(TokenKind::Bang) {
            UnaryOp::Not
        } else if self.matches(TokenKind::Minus) {
            UnaryOp::Negate
        } else if self.matches(TokenKind::Plus) {
            UnaryOp::Plus
        } else if self.matches(TokenKind::Tilde) {
            UnaryOp::Complement
        } else {
            return self.parse_binding();
        };
        let operator = self.tokens.previous().clone();
        let operand = self.parse_unary()?;
        Ok(Expr::Unary {
            op,
            operator,
            operand: Box::new(operand),
        })
    }

    /// `primary ( ":" expression )?`, right-associative.
    fn parse_binding(&mut self) -> Result<Expr, Diagnostic> {
        let left = self.parse_primary()?;
        if self.matches(TokenKind::Colon) {
            let colon = self.tokens.previous().clone();
            let right = self.parse_expression()?;
            return Ok(Expr::Binding {
                left: Box::new(left),
                colon,
                right: Box::new(right),
            });
        }
        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<Expr, Diagnostic> {
        let token = self.tokens.peek(View::Visible).clone();
        let expr = match &token.kind {
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                literal(Literal::Bool(true), token)
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                literal(Literal::Bool(false), token)
            }
            TokenKind::String => {
                self.advance();
                let value = unescape(&token.lexeme);
                literal(Literal::String(value), token)
            }
            TokenKind::Integer => {
                self.advance();
                let value = BigInt::from_str(&token.lexeme)
                    .map_err(|_| self.error(&token, "invalid integer literal"))?;
                literal(Literal::Integer(value), token)
            }
            TokenKind::Decimal => {
                self.advance();
                let value = BigDecimal::from_str(&token.lexeme)
                    .map_err(|_| self.error(&token, "invalid decimal literal"))?;
                literal(Literal::Decimal(value), token)
            }
            TokenKind::Identifier => {
                self.advance();
                if !self.tokens.skipped_hidden()
                    && self.tokens.check(&TokenKind::LBrace, View::Hidden)
                {
                    self.parse_builder(token)?
                } else {
                    Expr::Variable { name: token }
                }
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.consume(TokenKind::RParen, "expect ')' after expression")?;
                Expr::Grouping(Box::new(inner))
            }
            TokenKind::LBracket => {
                self.advance();
                self.parse_sequence(token)?
            }
            _ => return Err(self.error(&token, "expect expression")),
        };
        Ok(expr)
    }

    /// `Type "{" statement* "}"`; the type identifier is already consumed.
    fn parse_builder(&mut self, kind: Token) -> Result<Expr, Diagnostic> {
        self.advance();
        self.builder_depth += 1;
        let body = self.parse_builder_body();
        self.builder_depth -= 1;
        let body = body?;
        self.consume(TokenKind::RBrace, "expect '}' after builder")?;
        Ok(Expr::Builder { kind, body })
    }

    fn parse_builder_body(&mut self) -> Result<Vec<Stmt>, Diagnostic> {
        let mut body = Vec::new();
        while !self.tokens.check(&TokenKind::RBrace, View::Visible)
            && !self.tokens.is_at_end(View::Visible)
        {
            body.push(self.parse_statement()?);
        }
        Ok(body)
    }

    /// Elements after `[` up to and including `]`. The first element decides
    /// whether the literal is a table (all bindings) or a list (no bindings).
    fn parse_sequence(&mut self, open: Token) -> Result<Expr, Diagnostic> {
        let mut elements: Vec<Expr> = Vec::new();
        if self.matches(TokenKind::RBracket) {
            return Ok(Expr::Sequence { open, elements });
        }
        loop {
            let element = self.parse_expression()?;
            if let Some(first) = elements.first() {
                if first.is_binding() && !element.is_binding() {
                    return Err(self.error(element.token(), "expect table entry"));
                }
                if !first.is_binding() && element.is_binding() {
                    return Err(self.error(element.token(), "expect sequence element"));
                }
            }
            elements.push(element);
            if !self.match_separators() || self.tokens.check(&TokenKind::RBracket, View::Visible)
            {
                break;
            }
        }
        self.consume(TokenKind::RBracket, "expect ']' after sequence")?;
        Ok(Expr::Sequence { open, elements })
    }

    /// Consumes a run of line breaks, commas and `;`. Returns whether any were present.
    fn match_separators(&mut self) -> bool {
        let mut found = self.tokens.skipped_hidden();
        while self.matches_hidden(&[TokenKind::Eol, TokenKind::Comma, TokenKind::Semicolon]) {
            found = true;
        }
        found
    }

    fn recover(&mut self, diagnostic: Diagnostic, start: usize) {
        debug!(%diagnostic, "parse error, synchronizing");
        self.diagnostics.push(diagnostic);
        self.synchronize(start);
    }

    /// Discards tokens up to and including the next line break or `;`. When
    /// the failed unit already stepped over a line break the boundary is
    /// behind the cursor and nothing more is discarded.
    fn synchronize(&mut self, start: usize) {
        if self.tokens.position() != start && self.tokens.skipped_hidden() {
            return;
        }
        while !self.tokens.is_at_end(View::Hidden) {
            let token = self.tokens.advance(View::Hidden);
            if matches!(token.kind, TokenKind::Eol | TokenKind::Semicolon) {
                return;
            }
        }
    }

    fn skip_hidden(&mut self) {
        while self.tokens.peek(View::Hidden).hidden {
            self.tokens.advance(View::Hidden);
        }
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.tokens.check(&kind, View::Visible) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn matches_hidden(&mut self, kinds: &[TokenKind]) -> bool {
        for kind in kinds {
            if self.tokens.check(kind, View::Hidden) {
                self.tokens.advance(View::Hidden);
                return true;
            }
        }
        false
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<Token, Diagnostic> {
        if self.tokens.check(&kind, View::Visible) {
            Ok(self.advance())
        } else {
            Err(self.error(self.tokens.peek(View::Visible), message))
        }
    }

    fn advance(&mut self) -> Token {
        self.tokens.advance(View::Visible)
    }

    fn error(&self, token: &Token, message: &str) -> Diagnostic {
        Diagnostic::error(DiagnosticKind::Parser, token, message)
    }
}

fn literal(value: Literal, token: Token) -> Expr {
    Expr::Literal { value, token }
}
