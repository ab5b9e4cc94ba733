use tracing::debug;

use crate::{
    diagnostics::{Diagnostic, Diagnostics, MackerelError, Result},
    lexer,
    parser,
    runtime::Interpreter,
    value::Value,
};

/// Which parser entry point a chunk of input goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Whole files: every line is a typed statement.
    #[default]
    Batch,
    /// Prompt input: a line may also be a bare expression.
    Interactive,
}

/// Everything one run produced: emitted values plus the diagnostics of each
/// phase, kept apart.
#[derive(Debug)]
pub struct Outcome {
    pub values: Vec<Value>,
    pub lexical: Diagnostics,
    pub syntactic: Diagnostics,
    pub evaluation: Diagnostics,
}

impl Outcome {
    fn phases(&self) -> [&Diagnostics; 3] {
        [&self.lexical, &self.syntactic, &self.evaluation]
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.phases().into_iter().flat_map(|phase| phase.errors.iter())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.phases().into_iter().flat_map(|phase| phase.warnings.iter())
    }

    pub fn has_errors(&self) -> bool {
        self.phases().iter().any(|phase| phase.has_errors())
    }

    /// The emitted values, or the first error of the earliest failing phase.
    pub fn into_result(self) -> Result<Vec<Value>> {
        let first = self.errors().next().cloned();
        match first {
            Some(diagnostic) => Err(MackerelError::from(diagnostic)),
            None => Ok(self.values),
        }
    }
}

/// One interpreter lifetime. Declarations persist across [`Session::run`]
/// calls, which is what lets an interactive prompt build on earlier input.
#[derive(Default)]
pub struct Session {
    interpreter: Interpreter,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    /// Lexes, parses and evaluates `source`. Every phase always runs: whatever
    /// parsed cleanly is evaluated even when other statements were rejected.
    pub fn run(&mut self, source: &str, mode: Mode) -> Outcome {
        let (tokens, lexical) = lexer::tokenize(source);
        let (program, syntactic) = parser::parse(tokens, mode);
        let evaluation = self.interpreter.interpret(&program);
        debug!(
            ?mode,
            units = program.len(),
            lexical_errors = lexical.errors.len(),
            syntax_errors = syntactic.errors.len(),
            runtime_errors = evaluation.diagnostics.errors.len(),
            "run finished"
        );
        Outcome {
            values: evaluation.values,
            lexical,
            syntactic,
            evaluation: evaluation.diagnostics,
        }
    }

    /// Runs `source` as prompt input and fails on the first error.
    pub fn eval(&mut self, source: &str) -> Result<Vec<Value>> {
        self.run(source, Mode::Interactive).into_result()
    }
}
