//! Token module: the classified, positioned unit of lexical meaning.

use crate::scanner::Scanner;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a lexed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
    /// `=` or `==`
    Eq,
    /// `!=` or `<>`
    Ne,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `&&` or `and`
    And,
    /// `||` or `or`
    Or,
    /// `!` or `not`
    Not,
    /// `+`
    Add,
    /// Binary `-`
    Sub,
    /// Unary negate, emitted by the compiler for a leading `-`
    Neg,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `^`
    Pow,
    /// Identifier (function name, folded to uppercase)
    Id,
    /// Numeric literal
    Num,
    /// String literal
    Str,
    /// End of input
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::LParen => "left paren",
            TokenKind::RParen => "right paren",
            TokenKind::Comma => "comma",
            TokenKind::Eq => "=",
            TokenKind::Ne => "!=",
            TokenKind::Gt => ">",
            TokenKind::Ge => ">=",
            TokenKind::Lt => "<",
            TokenKind::Le => "<=",
            TokenKind::And => "and",
            TokenKind::Or => "or",
            TokenKind::Not => "not",
            TokenKind::Add => "+",
            TokenKind::Sub | TokenKind::Neg => "-",
            TokenKind::Mul => "*",
            TokenKind::Div => "/",
            TokenKind::Pow => "^",
            TokenKind::Id => "identifier",
            TokenKind::Num => "number",
            TokenKind::Str => "string",
            TokenKind::Eof => "end of input",
        };
        f.write_str(name)
    }
}

/// A lexed token with its source position.
///
/// Positions are captured from the scanner once the token's characters have
/// been consumed, so they point at the end of the lexeme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub kind: TokenKind,
    pub line: u32,
    pub column: u32,
    pub position: usize,
}

impl Token {
    pub fn new(text: impl Into<String>, scanner: &Scanner, kind: TokenKind) -> Self {
        Self {
            text: text.into(),
            kind,
            line: scanner.line(),
            column: scanner.column(),
            position: scanner.position(),
        }
    }

    /// A copy of this token reclassified as the given kind. Used by the
    /// compiler to emit a unary negate without mutating the lexed token.
    pub fn with_kind(&self, kind: TokenKind) -> Self {
        Self {
            kind,
            ..self.clone()
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}, {}:{}]",
            self.text, self.kind, self.line, self.column
        )
    }
}
