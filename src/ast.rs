use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use crate::lexer::Token;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Bool(bool),
    Integer(BigInt),
    Decimal(BigDecimal),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
    Plus,
    Complement,
}

/// Expression node. Every variant keeps the token(s) needed to point a
/// diagnostic at its exact source position.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal {
        value: Literal,
        token: Token,
    },
    Variable {
        name: Token,
    },
    Grouping(Box<Expr>),
    Unary {
        op: UnaryOp,
        operator: Token,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        operator: Token,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        operator: Token,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `key: value`
    Binding {
        left: Box<Expr>,
        colon: Token,
        right: Box<Expr>,
    },
    /// Bracketed list or table literal; which one is decided by the first element.
    Sequence {
        open: Token,
        elements: Vec<Expr>,
    },
    /// `Type { statements }`
    Builder {
        kind: Token,
        body: Vec<Stmt>,
    },
}

impl Expr {
    /// Token a diagnostic about this expression should point at.
    pub fn token(&self) -> &Token {
        match self {
            Expr::Literal { token, .. } => token,
            Expr::Variable { name } => name,
            Expr::Grouping(inner) => inner.token(),
            Expr::Unary { operator, .. } => operator,
            Expr::Binary { operator, .. } | Expr::Logical { operator, .. } => operator,
            Expr::Binding { colon, .. } => colon,
            Expr::Sequence { open, .. } => open,
            Expr::Builder { kind, .. } => kind,
        }
    }

    pub fn is_binding(&self) -> bool {
        matches!(self, Expr::Binding { .. })
    }

    /// Name token when this is a bare variable reference.
    pub fn as_variable(&self) -> Option<&Token> {
        match self {
            Expr::Variable { name } => Some(name),
            _ => None,
        }
    }
}

/// `kind value`, e.g. `decl answer: 42`.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: Token,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Source {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplItem {
    Stmt(Stmt),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Repl {
    pub items: Vec<ReplItem>,
}

/// Root produced by either parser entry point.
#[derive(Debug, Clone, PartialEq)]
pub enum Program {
    Source(Source),
    Repl(Repl),
}

impl Program {
    pub fn len(&self) -> usize {
        match self {
            Program::Source(source) => source.statements.len(),
            Program::Repl(repl) => repl.items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
