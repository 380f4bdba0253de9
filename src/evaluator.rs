//! Evaluator module: a stack machine over compiled postfix programs.
//!
//! Iterates a program's instructions once, left to right, against an operand
//! stack of [`Value`]s. Operands were pushed left-then-right, so the top of
//! the stack is always the right-hand side. Arithmetic anomalies (division by
//! zero, non-finite powers) are IEEE values, never errors.

use crate::compiler::Compiler;
use crate::functions::{FunctionDescriptor, FunctionRegistry};
use crate::ir::{CompiledProgram, Instruction};
use crate::token::TokenKind;
use crate::types::{parse_number, Value};
use crate::FormulonError;
use std::sync::Arc;

/// Host callback resolving a string literal to its runtime value.
pub type StringResolver = Arc<dyn Fn(&str) -> Value + Send + Sync>;

/// Host callback converting a raw numeric literal (suffix included) to a
/// double.
pub type NumberParser = Arc<dyn Fn(&str) -> f64 + Send + Sync>;

/// Compiles and executes formulas against the function registry.
///
/// Each `evaluate` call builds a fresh compiler and a fresh stack; the only
/// state shared across calls is the registry and the configured callbacks.
pub struct Evaluator {
    registry: Arc<FunctionRegistry>,
    string_resolver: Option<StringResolver>,
    number_parser: NumberParser,
}

impl Evaluator {
    /// An evaluator bound to the process-wide registry.
    pub fn new() -> Self {
        Self::with_registry(FunctionRegistry::global())
    }

    pub fn with_registry(registry: Arc<FunctionRegistry>) -> Self {
        Self {
            registry,
            string_resolver: None,
            number_parser: Arc::new(|raw| parse_number(raw)),
        }
    }

    /// An evaluator for a host container: the container's function package
    /// is registered into the process-wide registry (idempotently) before
    /// the evaluator is returned.
    pub fn with_package(
        package: &str,
        descriptors: impl IntoIterator<Item = FunctionDescriptor>,
    ) -> Result<Self, FormulonError> {
        let registry = FunctionRegistry::global();
        registry.register_package(package, descriptors)?;
        Ok(Self::with_registry(registry))
    }

    /// Install the callback that gives string literals a value. Unset,
    /// string literals evaluate to `Number(0.0)`.
    pub fn set_string_resolver(
        &mut self,
        resolver: impl Fn(&str) -> Value + Send + Sync + 'static,
    ) {
        self.string_resolver = Some(Arc::new(resolver));
    }

    /// Replace the numeric-literal parser. The default understands
    /// magnitude/percent suffixes; see [`parse_number`].
    pub fn set_number_parser(&mut self, parser: impl Fn(&str) -> f64 + Send + Sync + 'static) {
        self.number_parser = Arc::new(parser);
    }

    /// Compile without executing.
    pub fn compile(&self, expression: &str) -> Result<CompiledProgram, FormulonError> {
        Compiler::with_registry(Arc::clone(&self.registry)).compile(expression)
    }

    /// Syntax/semantic check only: compiles and discards the result. No
    /// function is ever invoked.
    pub fn validate(&self, expression: &str) -> Result<(), FormulonError> {
        self.compile(expression).map(|_| ())
    }

    /// Compile fresh and execute, returning the single remaining stack value
    /// as a number.
    pub fn evaluate(&self, expression: &str) -> Result<f64, FormulonError> {
        let program = self.compile(expression)?;
        self.run(&program)
    }

    /// Execute an already-compiled program with a fresh stack. Programs are
    /// replayable; compiling once and running many times is the cheap path.
    pub fn run(&self, program: &CompiledProgram) -> Result<f64, FormulonError> {
        let mut stack: Vec<Value> = Vec::new();

        for op in program.instructions() {
            self.step(op, &mut stack)?;
        }

        match stack.pop() {
            Some(value) => Ok(value.as_number()),
            None => Err(FormulonError::Execution(
                "program left no result on the stack".to_string(),
            )),
        }
    }

    fn step(&self, op: &Instruction, stack: &mut Vec<Value>) -> Result<(), FormulonError> {
        match op.token.kind {
            TokenKind::Num => {
                stack.push(Value::Number((self.number_parser)(&op.token.text)));
            }

            TokenKind::Str => {
                let value = match &self.string_resolver {
                    Some(resolver) => resolver(&op.token.text),
                    None => Value::Number(0.0),
                };
                stack.push(value);
            }

            TokenKind::Add | TokenKind::Sub | TokenKind::Mul | TokenKind::Div | TokenKind::Pow => {
                let (lhs, rhs) = pop_pair_of_numbers(stack)?;
                let result = match op.token.kind {
                    TokenKind::Add => lhs + rhs,
                    TokenKind::Sub => lhs - rhs,
                    TokenKind::Mul => lhs * rhs,
                    TokenKind::Div => lhs / rhs,
                    _ => lhs.powf(rhs),
                };
                stack.push(Value::Number(result));
            }

            TokenKind::Eq
            | TokenKind::Ne
            | TokenKind::Lt
            | TokenKind::Le
            | TokenKind::Gt
            | TokenKind::Ge => {
                let (lhs, rhs) = pop_pair_of_numbers(stack)?;
                let result = match op.token.kind {
                    TokenKind::Eq => lhs == rhs,
                    TokenKind::Ne => lhs != rhs,
                    TokenKind::Lt => lhs < rhs,
                    TokenKind::Le => lhs <= rhs,
                    TokenKind::Gt => lhs > rhs,
                    _ => lhs >= rhs,
                };
                // Relational results stay boolean on the stack.
                stack.push(Value::Boolean(result));
            }

            TokenKind::And | TokenKind::Or => {
                let (lhs, rhs) = pop_pair_of_booleans(stack)?;
                let result = if op.token.kind == TokenKind::And {
                    lhs && rhs
                } else {
                    lhs || rhs
                };
                // Logical results are numbers on the stack.
                stack.push(Value::Number(if result { 1.0 } else { 0.0 }));
            }

            TokenKind::Neg => {
                let atom = pop_number(stack)?;
                stack.push(Value::Number(-atom));
            }

            TokenKind::Not => {
                let atom = pop_number(stack)?;
                stack.push(Value::Number(if atom != 0.0 { 0.0 } else { 1.0 }));
            }

            TokenKind::Id => self.call(op, stack)?,

            kind => {
                return Err(FormulonError::Execution(format!(
                    "unhandled instruction kind '{kind}'"
                )));
            }
        }

        Ok(())
    }

    /// Pop the call's operands in reverse (last parameter first), coerce each
    /// to its declared kind, invoke, and push the numeric result.
    fn call(&self, op: &Instruction, stack: &mut Vec<Value>) -> Result<(), FormulonError> {
        let handle = op.handle.as_ref().ok_or_else(|| {
            FormulonError::Execution(format!("unresolved call to '{}'", op.token.text))
        })?;

        let params = handle.params();
        let mut args = vec![Value::Number(0.0); params.len()];

        for (i, kind) in params.iter().enumerate().rev() {
            let value = pop(stack)?;
            args[i] = value.coerce(*kind);
        }

        let mut result = handle.invoke(&args);

        if handle.returns_boolean() {
            result = if result != 0.0 { 1.0 } else { 0.0 };
        }

        stack.push(Value::Number(result));

        Ok(())
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

fn pop(stack: &mut Vec<Value>) -> Result<Value, FormulonError> {
    stack
        .pop()
        .ok_or_else(|| FormulonError::Execution("operand stack underflow".to_string()))
}

fn pop_number(stack: &mut Vec<Value>) -> Result<f64, FormulonError> {
    Ok(pop(stack)?.as_number())
}

fn pop_pair_of_numbers(stack: &mut Vec<Value>) -> Result<(f64, f64), FormulonError> {
    let rhs = pop_number(stack)?;
    let lhs = pop_number(stack)?;
    Ok((lhs, rhs))
}

fn pop_pair_of_booleans(stack: &mut Vec<Value>) -> Result<(bool, bool), FormulonError> {
    let rhs = pop(stack)?.as_boolean();
    let lhs = pop(stack)?.as_boolean();
    Ok((lhs, rhs))
}
