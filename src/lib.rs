//! Formulon: a modular, embeddable formula engine for spreadsheet-style expressions.
//!
//! The engine compiles a textual formula (arithmetic, comparisons, logical
//! operators, string literals, and function calls) into a flat postfix
//! instruction sequence, then executes it on a small stack machine. Hosts
//! supply the interesting behavior: domain functions registered by name, a
//! resolver that gives string literals a value, and optionally a custom
//! numeric-literal parser.
//!
//! # Architecture
//! - Character scanning and tokenization ([`Scanner`], [`Lexer`])
//! - Fixed-depth token lookahead ([`Parser`])
//! - Precedence-climbing compilation to postfix instructions ([`Compiler`])
//! - Thread-safe function registry with early identifier binding
//!   ([`FunctionRegistry`])
//! - Stack-based evaluation with number/boolean/text coercions ([`Evaluator`])
//!
//! ```
//! use formulon::Evaluator;
//!
//! let eval = Evaluator::new();
//! assert_eq!(eval.evaluate("1 + 2 * 3").unwrap(), 7.0);
//! assert_eq!(eval.evaluate("IF(1 > 0, 10, 20)").unwrap(), 10.0);
//! ```

mod scanner;
mod token;
mod lexer;
mod parser;
mod ir;
mod compiler;
mod functions;
mod types;
mod evaluator;

pub use scanner::*;
pub use token::*;
pub use lexer::*;
pub use parser::*;
pub use ir::*;
pub use compiler::*;
pub use functions::*;
pub use types::*;
pub use evaluator::*;

use thiserror::Error;

/// Unified error type for Formulon operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FormulonError {
    /// The input contained a character sequence matching no token rule.
    #[error("[{line}:{column}] unexpected {found}")]
    Lexical { found: String, line: u32, column: u32 },

    /// Raw `(` and `)` counts differ; reported before any lexing begins.
    #[error("unbalanced parentheses")]
    UnbalancedParentheses,

    /// The grammar required one of a set of token kinds and found another.
    #[error("[{line}:{column}] expected '{expected}', found '{found}'")]
    UnexpectedToken {
        expected: String,
        found: TokenKind,
        line: u32,
        column: u32,
    },

    /// An identifier used as a function call is not in the registry.
    #[error("[{line}:{column}] unknown function '{name}'")]
    UnknownFunction { name: String, line: u32, column: u32 },

    /// A host function descriptor has an incompatible signature.
    #[error("cannot register function '{name}': {reason}")]
    Registration { name: String, reason: String },

    /// Internal-consistency failure during execution (never produced by
    /// programs the compiler emits).
    #[error("execution error: {0}")]
    Execution(String),
}
