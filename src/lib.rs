//! Core of the Mackerel declaration language: lexer, token view, parser,
//! AST and a lazy tree-walking evaluator, plus the interactive prompt used
//! by the `mackerel` binary.

pub mod ast;
pub mod diagnostics;
pub mod environment;
pub mod lazy;
pub mod lexer;
pub mod numeric;
pub mod parser;
pub mod repl;
pub mod runtime;
pub mod session;
pub mod token_view;
pub mod value;

pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, MackerelError, Severity};
pub use repl::Repl;
pub use runtime::Interpreter;
pub use session::{Mode, Outcome, Session};
pub use value::{Value, ValueKind};
