use rustyline::{error::ReadlineError, DefaultEditor};

use crate::{
    diagnostics::Result,
    lexer::{self, TokenKind},
    session::{Mode, Outcome, Session},
};

/// Interactive prompt. Lines are buffered until their brackets balance and
/// then run against one long-lived [`Session`].
pub struct Repl {
    session: Session,
    buffer: Vec<String>,
}

impl Default for Repl {
    fn default() -> Self {
        Self::new()
    }
}

impl Repl {
    pub fn new() -> Self {
        Self {
            session: Session::new(),
            buffer: Vec::new(),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        let mut editor = DefaultEditor::new()?;
        loop {
            let prompt = format!(":{:02}> ", self.buffer.len());
            match editor.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if self.buffer.is_empty() && (trimmed == ":q" || trimmed == ":quit") {
                        break;
                    }
                    if trimmed.is_empty() && self.buffer.is_empty() {
                        continue;
                    }
                    editor.add_history_entry(trimmed).ok();
                    if let Some(outcome) = self.push_line(&line) {
                        print_outcome(&outcome);
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }

    /// Buffers `line` and runs the buffer once its brackets balance.
    pub fn push_line(&mut self, line: &str) -> Option<Outcome> {
        self.buffer.push(line.to_string());
        let source = self.buffer.join("\n");
        if bracket_depth(&source) > 0 {
            return None;
        }
        self.buffer.clear();
        Some(self.session.run(&source, Mode::Interactive))
    }

    pub fn pending_lines(&self) -> usize {
        self.buffer.len()
    }
}

/// Net count of open `(`, `[` and `{` in `source`. Brackets inside strings
/// and comments are not tokens and so don't count.
pub fn bracket_depth(source: &str) -> i64 {
    let (tokens, _) = lexer::tokenize(source);
    tokens.iter().fold(0, |depth, token| match token.kind {
        TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth + 1,
        TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => depth - 1,
        _ => depth,
    })
}

/// Prints emitted values to stdout and diagnostics to stderr.
pub fn print_outcome(outcome: &Outcome) {
    for value in &outcome.values {
        println!("{value}");
    }
    for diagnostic in outcome.errors().chain(outcome.warnings()) {
        eprintln!("{diagnostic}");
    }
}
