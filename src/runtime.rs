use std::{cmp::Ordering, rc::Rc};

use tracing::{debug, trace};

use crate::{
    ast::{BinaryOp, Expr, LogicalOp, Program, ReplItem, Stmt, UnaryOp},
    diagnostics::{Diagnostic, DiagnosticKind, Diagnostics},
    environment::{Declaration, Environment},
    lexer::Token,
    numeric::{self, ArithmeticError},
    value::{Table, Value, ValueKind},
};

/// Statement type tag that installs a lazy declaration instead of
/// evaluating and emitting its value.
pub const DECL: &str = "decl";

/// Values emitted by one [`Interpreter::interpret`] call together with the
/// evaluation diagnostics raised while producing them.
#[derive(Debug)]
pub struct Evaluation {
    pub values: Vec<Value>,
    pub diagnostics: Diagnostics,
}

/// Tree-walking evaluator. Owns the session's declaration table, so
/// declarations made by one call are visible to every later call.
pub struct Interpreter {
    environment: Environment,
    diagnostics: Diagnostics,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            environment: Environment::new(),
            diagnostics: Diagnostics::new(DiagnosticKind::Runtime),
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Runs every top-level unit in order. A failing unit records one error
    /// and evaluation carries on with the next unit.
    pub fn interpret(&mut self, program: &Program) -> Evaluation {
        let mut values = Vec::new();
        match program {
            Program::Source(source) => {
                for stmt in &source.statements {
                    let result = self.execute_statement(stmt);
                    self.finish_unit(result, &mut values);
                }
            }
            Program::Repl(repl) => {
                for item in &repl.items {
                    let (result, anchor) = match item {
                        ReplItem::Stmt(stmt) => (self.execute_statement(stmt), &stmt.kind),
                        ReplItem::Expr(expr) => (self.evaluate(expr).map(Some), expr.token()),
                    };
                    let result = result.and_then(|value| match value {
                        Some(value) => self.dereference(value, anchor).map(Some),
                        None => Ok(None),
                    });
                    self.finish_unit(result, &mut values);
                }
            }
        }
        let diagnostics = std::mem::replace(
            &mut self.diagnostics,
            Diagnostics::new(DiagnosticKind::Runtime),
        );
        debug!(
            emitted = values.len(),
            errors = diagnostics.errors.len(),
            warnings = diagnostics.warnings.len(),
            "evaluation finished"
        );
        Evaluation {
            values,
            diagnostics,
        }
    }

    fn finish_unit(&mut self, result: Result<Option<Value>, Diagnostic>, values: &mut Vec<Value>) {
        match result {
            Ok(Some(value)) => values.push(value),
            Ok(None) => {}
            Err(diagnostic) => {
                debug!(%diagnostic, "unit aborted");
                self.diagnostics.push(diagnostic);
            }
        }
    }

    fn execute_statement(&mut self, stmt: &Stmt) -> Result<Option<Value>, Diagnostic> {
        if stmt.kind.lexeme == DECL {
            self.declare(stmt)?;
            return Ok(None);
        }
        self.evaluate(&stmt.value).map(Some)
    }

    fn declare(&mut self, stmt: &Stmt) -> Result<(), Diagnostic> {
        let Expr::Binding { left, right, .. } = &stmt.value else {
            return Err(runtime_error(&stmt.kind, "expect named binding"));
        };
        let Some(name) = left.as_variable() else {
            return Err(runtime_error(left.token(), "expect named binding"));
        };
        let body = Rc::new(right.as_ref().clone());
        let cell = Declaration::new(move |interpreter: &mut Interpreter| interpreter.evaluate(&body));
        if self.environment.declare(name.lexeme.clone(), cell) {
            self.diagnostics
                .warning(name, format!("redeclared `{}`", name.lexeme));
        }
        debug!(name = %name.lexeme, "declared");
        Ok(())
    }

    /// Follows a top-level reference to the declaration it names.
    fn dereference(&mut self, value: Value, anchor: &Token) -> Result<Value, Diagnostic> {
        let name = match value.kind() {
            ValueKind::Reference(name) => name.clone(),
            _ => return Ok(value),
        };
        let Some(cell) = self.environment.cell(&name) else {
            return Ok(value);
        };
        cell.force(self, || {
            runtime_error(anchor, format!("cyclic declaration `{name}`"))
        })
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Value, Diagnostic> {
        match expr {
            Expr::Literal { value, .. } => Ok(Value::from(value)),
            Expr::Grouping(inner) => self.evaluate(inner),
            Expr::Variable { name } => self.force(name),
            Expr::Unary {
                op,
                operator,
                operand,
            } => self.unary(*op, operator, operand),
            Expr::Binary {
                op,
                operator,
                left,
                right,
            } => {
                let left_value = self.evaluate(left)?;
                let right_value = self.evaluate(right)?;
                self.binary(*op, operator, &left_value, &right_value)
            }
            Expr::Logical {
                op,
                operator,
                left,
                right,
            } => self.logical(*op, operator, left, right),
            Expr::Binding { left, right, .. } => {
                let key = self.key(left, |name| Value::reference(name))?;
                let value = self.evaluate(right)?;
                Ok(Value::pair(key, value))
            }
            Expr::Sequence { elements, .. } => match elements.first() {
                None => Ok(Value::list(Vec::new())),
                Some(first) if first.is_binding() => self.table(elements),
                Some(_) => self.list(elements),
            },
            Expr::Builder { kind, body } => {
                trace!(kind = %kind.lexeme, statements = body.len(), "builder body left unevaluated");
                Ok(Value::builder(kind.lexeme.clone()))
            }
        }
    }

    fn force(&mut self, name: &Token) -> Result<Value, Diagnostic> {
        let cell = self.environment.lookup(name)?;
        trace!(name = %name.lexeme, memoized = cell.is_forced(), "force declaration");
        cell.force(self, || {
            runtime_error(name, format!("cyclic declaration `{}`", name.lexeme))
        })
    }

    /// Key of a binding. A bare name is taken literally via `symbol` and is
    /// not looked up; anything else is evaluated.
    fn key(&mut self, left: &Expr, symbol: fn(String) -> Value) -> Result<Value, Diagnostic> {
        match left.as_variable() {
            Some(name) => Ok(symbol(name.lexeme.clone())),
            None => self.evaluate(left),
        }
    }

    fn table(&mut self, elements: &[Expr]) -> Result<Value, Diagnostic> {
        let mut table = Table::new();
        for element in elements {
            let Expr::Binding { left, colon, right } = element else {
                return Err(Diagnostic::fault(
                    DiagnosticKind::Runtime,
                    element.token(),
                    "expect table entry",
                ));
            };
            let key = self.key(left, |name| Value::string(name))?;
            let value = self.evaluate(right)?;
            if table.contains_key(&key) {
                self.diagnostics
                    .warning(colon, format!("duplicate key in table: {key}"));
            }
            table.insert(key, value);
        }
        Ok(Value::table(table))
    }

    fn list(&mut self, elements: &[Expr]) -> Result<Value, Diagnostic> {
        let mut values = Vec::with_capacity(elements.len());
        for element in elements {
            if element.is_binding() {
                return Err(Diagnostic::fault(
                    DiagnosticKind::Runtime,
                    element.token(),
                    "expect sequence element",
                ));
            }
            values.push(self.evaluate(element)?);
        }
        Ok(Value::list(values))
    }

    fn unary(&mut self, op: UnaryOp, operator: &Token, operand: &Expr) -> Result<Value, Diagnostic> {
        if op == UnaryOp::Complement {
            return Err(Diagnostic::fault(
                DiagnosticKind::Runtime,
                operator,
                "unsupported operation: `~`",
            ));
        }
        let value = self.evaluate(operand)?;
        match (op, value.kind()) {
            (UnaryOp::Not, ValueKind::Bool(b)) => Ok(Value::bool(!b)),
            (UnaryOp::Not, _) => Err(runtime_error(
                operator,
                format!("operand must be a Boolean, got {}", value.type_name()),
            )),
            (UnaryOp::Negate, ValueKind::Integer(n)) => Ok(Value::integer(-n.clone())),
            (UnaryOp::Negate, ValueKind::Decimal(d)) => Ok(Value::decimal(-d.clone())),
            (UnaryOp::Plus, ValueKind::Integer(_) | ValueKind::Decimal(_)) => Ok(value.clone()),
            _ => Err(runtime_error(
                operator,
                format!("operand must be a number, got {}", value.type_name()),
            )),
        }
    }

    fn binary(
        &mut self,
        op: BinaryOp,
        operator: &Token,
        left: &Value,
        right: &Value,
    ) -> Result<Value, Diagnostic> {
        match op {
            BinaryOp::Equal => Ok(Value::bool(left == right)),
            BinaryOp::NotEqual => Ok(Value::bool(left != right)),
            BinaryOp::Add if left.is_string() || right.is_string() => {
                Ok(Value::string(format!("{left}{right}")))
            }
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                let promoted = numeric::promote(left, right)
                    .ok_or_else(|| operand_error(operator, left, right))?;
                promoted.apply(op).map_err(|err| match err {
                    ArithmeticError::DivisionByZero => runtime_error(operator, "division by zero"),
                    ArithmeticError::NotArithmetic => Diagnostic::fault(
                        DiagnosticKind::Runtime,
                        operator,
                        format!("`{}` is not an arithmetic operator", operator.lexeme),
                    ),
                })
            }
            BinaryOp::Less | BinaryOp::LessEqual | BinaryOp::Greater | BinaryOp::GreaterEqual => {
                let ordering = numeric::promote(left, right)
                    .ok_or_else(|| operand_error(operator, left, right))?
                    .compare();
                let result = match op {
                    BinaryOp::Less => ordering == Ordering::Less,
                    BinaryOp::LessEqual => ordering != Ordering::Greater,
                    BinaryOp::Greater => ordering == Ordering::Greater,
                    _ => ordering != Ordering::Less,
                };
                Ok(Value::bool(result))
            }
        }
    }

    fn logical(
        &mut self,
        op: LogicalOp,
        operator: &Token,
        left: &Expr,
        right: &Expr,
    ) -> Result<Value, Diagnostic> {
        let left_value = self.evaluate(left)?;
        let Some(lhs) = left_value.as_bool() else {
            return Err(boolean_error(operator, &left_value));
        };
        match (op, lhs) {
            (LogicalOp::And, false) => return Ok(Value::bool(false)),
            (LogicalOp::Or, true) => return Ok(Value::bool(true)),
            _ => {}
        }
        let right_value = self.evaluate(right)?;
        if right_value.as_bool().is_none() {
            return Err(boolean_error(operator, &right_value));
        }
        Ok(right_value)
    }
}

fn runtime_error(token: &Token, message: impl Into<String>) -> Diagnostic {
    Diagnostic::error(DiagnosticKind::Runtime, token, message)
}

fn operand_error(operator: &Token, left: &Value, right: &Value) -> Diagnostic {
    runtime_error(
        operator,
        format!(
            "operands of `{}` must be numbers, got {} and {}",
            operator.lexeme,
            left.type_name(),
            right.type_name()
        ),
    )
}

fn boolean_error(operator: &Token, value: &Value) -> Diagnostic {
    runtime_error(
        operator,
        format!(
            "operands of `{}` must be Booleans, got {}",
            operator.lexeme,
            value.type_name()
        ),
    )
}
