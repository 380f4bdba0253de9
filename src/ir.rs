//! Intermediate representation: postfix instructions and compiled programs.

use crate::functions::FunctionHandle;
use crate::token::Token;
use std::fmt;
use std::sync::Arc;

/// One step of a compiled program.
///
/// Produced only by the compiler, in postfix order: operand instructions
/// precede the operator or function instruction that consumes them. An `Id`
/// instruction always carries the function handle it was resolved to at
/// compile time.
#[derive(Debug, Clone)]
pub struct Instruction {
    pub token: Token,
    pub handle: Option<Arc<FunctionHandle>>,
}

impl Instruction {
    pub fn new(token: Token) -> Self {
        Self {
            token,
            handle: None,
        }
    }

    pub fn with_handle(token: Token, handle: Arc<FunctionHandle>) -> Self {
        Self {
            token,
            handle: Some(handle),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.token.fmt(f)
    }
}

/// The ordered instruction sequence produced by compilation.
///
/// Stateless and replayable: a program can be shared across threads and
/// executed any number of times.
#[derive(Debug, Clone, Default)]
pub struct CompiledProgram {
    ops: Vec<Instruction>,
}

impl CompiledProgram {
    pub(crate) fn new(ops: Vec<Instruction>) -> Self {
        Self { ops }
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
