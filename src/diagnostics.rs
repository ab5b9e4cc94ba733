use std::fmt;

use thiserror::Error;

use crate::lexer::Token;

/// Pipeline phase that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Lexer,
    Parser,
    Runtime,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::Lexer => write!(f, "lexer"),
            DiagnosticKind::Parser => write!(f, "parser"),
            DiagnosticKind::Runtime => write!(f, "runtime"),
        }
    }
}

/// How bad a diagnostic is.
///
/// `Error` aborts the current unit (string, comment, statement or top-level
/// evaluation), `Warning` is only recorded, and `Fault` marks a broken
/// internal invariant or an operation the language reserves but does not
/// implement yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Fault,
}

/// A message pinned to the token it originated from.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
    pub token: Token,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, token: &Token, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            message: message.into(),
            token: token.clone(),
        }
    }

    pub fn warning(kind: DiagnosticKind, token: &Token, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(kind, token, message)
        }
    }

    pub fn fault(kind: DiagnosticKind, token: &Token, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Fault,
            ..Self::error(kind, token, message)
        }
    }

    pub fn line(&self) -> usize {
        self.token.line
    }

    pub fn column(&self) -> usize {
        self.token.column
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.severity == Severity::Warning {
            write!(f, "warning: ")?;
        }
        write!(
            f,
            "{}: {} [line {}, col {}]",
            self.kind, self.message, self.token.line, self.token.column
        )
    }
}

impl std::error::Error for Diagnostic {}

/// Error and warning lists collected by a single phase.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    pub kind: DiagnosticKind,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new(kind: DiagnosticKind) -> Self {
        Self {
            kind,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn error(&mut self, token: &Token, message: impl Into<String>) {
        self.errors
            .push(Diagnostic::error(self.kind, token, message));
    }

    pub fn warning(&mut self, token: &Token, message: impl Into<String>) {
        self.warnings
            .push(Diagnostic::warning(self.kind, token, message));
    }

    /// Files an already-built diagnostic under the list its severity belongs to.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Warning => self.warnings.push(diagnostic),
            Severity::Error | Severity::Fault => self.errors.push(diagnostic),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

/// Unified error type for the Mackerel toolchain.
#[derive(Debug, Error)]
pub enum MackerelError {
    #[error("{0}")]
    Diagnostic(#[from] Diagnostic),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line editor error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
}

pub type Result<T> = std::result::Result<T, MackerelError>;
