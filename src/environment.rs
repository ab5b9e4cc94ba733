use std::rc::Rc;

use indexmap::IndexMap;
use tracing::trace;

use crate::{
    diagnostics::{Diagnostic, DiagnosticKind},
    lazy::Lazy,
    lexer::Token,
    runtime::Interpreter,
    value::Value,
};

pub type Declaration = Lazy<Interpreter, Value, Diagnostic>;

/// Session-wide declaration table. Names are only ever added or replaced;
/// cells are memoized in place when first forced.
#[derive(Debug, Default)]
pub struct Environment {
    declarations: IndexMap<String, Rc<Declaration>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `name`, returning `true` if it replaced an earlier declaration.
    pub fn declare(&mut self, name: impl Into<String>, cell: Declaration) -> bool {
        let name = name.into();
        trace!(%name, "declare");
        self.declarations.insert(name, Rc::new(cell)).is_some()
    }

    pub fn cell(&self, name: &str) -> Option<Rc<Declaration>> {
        self.declarations.get(name).cloned()
    }

    pub fn lookup(&self, name: &Token) -> Result<Rc<Declaration>, Diagnostic> {
        self.cell(&name.lexeme).ok_or_else(|| {
            Diagnostic::error(
                DiagnosticKind::Runtime,
                name,
                format!("cannot find variable `{}`", name.lexeme),
            )
        })
    }

    /// Whether `name` exists and has already been computed.
    pub fn is_forced(&self, name: &str) -> Option<bool> {
        self.declarations.get(name).map(|cell| cell.is_forced())
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}
