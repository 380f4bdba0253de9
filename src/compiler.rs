//! Compiler module: translates a formula into postfix instructions.
//!
//! A recursive-descent, precedence-climbing translator. Every binary level is
//! the same left-associative loop: parse the next-tighter level, then while
//! the lookahead is one of this level's operators, consume it, parse the
//! next-tighter level again, and emit the operator instruction. Identifiers
//! are resolved against the function registry as their instructions are
//! emitted, so unknown names fail at compile time.
//!
//! Two grammar quirks are intentional and preserved: `^` is left-associative
//! (`2^3^2` is `(2^3)^2`), and a leading `-` binds tighter than `^`
//! (`-2^2` is `(-2)^2`).
//!
//! Compilation recurses with call-stack depth proportional to the nesting
//! depth of the source expression; extreme nesting is bounded by the call
//! stack rather than handled defensively.

use crate::functions::FunctionRegistry;
use crate::ir::{CompiledProgram, Instruction};
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::token::{Token, TokenKind};
use crate::FormulonError;
use std::sync::Arc;

pub struct Compiler {
    registry: Arc<FunctionRegistry>,
    ops: Vec<Instruction>,
}

impl Compiler {
    /// A compiler resolving identifiers against the process-wide registry.
    pub fn new() -> Self {
        Self::with_registry(FunctionRegistry::global())
    }

    pub fn with_registry(registry: Arc<FunctionRegistry>) -> Self {
        Self {
            registry,
            ops: Vec::with_capacity(32),
        }
    }

    /// Compile an expression to a postfix program.
    ///
    /// A single leading `=` is stripped first (spreadsheet-cell convention),
    /// then the raw text is rejected if its `(`/`)` counts differ. All
    /// compile-time errors surface immediately; no partial program is ever
    /// returned.
    pub fn compile(&mut self, expression: &str) -> Result<CompiledProgram, FormulonError> {
        let expression = expression.strip_prefix('=').unwrap_or(expression);

        check_balanced_parens(expression)?;

        self.ops.clear();

        let mut parser = Parser::new(Lexer::new(expression))?;

        self.compile_expression(&mut parser)?;

        // The grammar must account for the whole input.
        let token = parser.la();
        if token.kind != TokenKind::Eof {
            return Err(unexpected(token, &[TokenKind::Eof]));
        }

        Ok(CompiledProgram::new(std::mem::take(&mut self.ops)))
    }

    fn compile_expression(&mut self, parser: &mut Parser) -> Result<(), FormulonError> {
        self.compile_logical(parser)
    }

    /// `relational ((and|or) relational)*`
    fn compile_logical(&mut self, parser: &mut Parser) -> Result<(), FormulonError> {
        self.compile_relational(parser)?;

        loop {
            let token = parser.la().clone();
            match token.kind {
                TokenKind::And | TokenKind::Or => {
                    parser.advance()?;
                    self.compile_relational(parser)?;
                    self.emit(token)?;
                }
                _ => return Ok(()),
            }
        }
    }

    /// `additive (relop additive)*` — non-chaining, folded left to right.
    fn compile_relational(&mut self, parser: &mut Parser) -> Result<(), FormulonError> {
        self.compile_additive(parser)?;

        loop {
            let token = parser.la().clone();
            match token.kind {
                TokenKind::Eq
                | TokenKind::Ne
                | TokenKind::Gt
                | TokenKind::Ge
                | TokenKind::Lt
                | TokenKind::Le => {
                    parser.advance()?;
                    self.compile_additive(parser)?;
                    self.emit(token)?;
                }
                _ => return Ok(()),
            }
        }
    }

    /// `mult ((+|-) mult)*`
    fn compile_additive(&mut self, parser: &mut Parser) -> Result<(), FormulonError> {
        self.compile_multiplicative(parser)?;

        loop {
            let token = parser.la().clone();
            match token.kind {
                TokenKind::Add | TokenKind::Sub => {
                    parser.advance()?;
                    self.compile_multiplicative(parser)?;
                    self.emit(token)?;
                }
                _ => return Ok(()),
            }
        }
    }

    /// `power ((*|/) power)*`
    fn compile_multiplicative(&mut self, parser: &mut Parser) -> Result<(), FormulonError> {
        self.compile_power(parser)?;

        loop {
            let token = parser.la().clone();
            match token.kind {
                TokenKind::Mul | TokenKind::Div => {
                    parser.advance()?;
                    self.compile_power(parser)?;
                    self.emit(token)?;
                }
                _ => return Ok(()),
            }
        }
    }

    /// `unary (^ unary)*` — left-associative like every other binary level.
    fn compile_power(&mut self, parser: &mut Parser) -> Result<(), FormulonError> {
        self.compile_unary(parser)?;

        loop {
            let token = parser.la().clone();
            match token.kind {
                TokenKind::Pow => {
                    parser.advance()?;
                    self.compile_unary(parser)?;
                    self.emit(token)?;
                }
                _ => return Ok(()),
            }
        }
    }

    /// `(-|not)? factor` — at most one prefix operator. A leading `-` is
    /// emitted as a fresh Neg instruction rather than reclassifying the
    /// lexed token in place.
    fn compile_unary(&mut self, parser: &mut Parser) -> Result<(), FormulonError> {
        let token = parser.la().clone();

        if matches!(token.kind, TokenKind::Sub | TokenKind::Not) {
            parser.advance()?;
        }

        self.compile_factor(parser)?;

        match token.kind {
            TokenKind::Sub => self.emit(token.with_kind(TokenKind::Neg))?,
            TokenKind::Not => self.emit(token)?,
            _ => {}
        }

        Ok(())
    }

    /// `'(' expression ')' | atom`
    fn compile_factor(&mut self, parser: &mut Parser) -> Result<(), FormulonError> {
        if parser.la().kind == TokenKind::LParen {
            parser.advance()?;
            self.compile_expression(parser)?;
            expect(parser, TokenKind::RParen)?;
            Ok(())
        } else {
            self.compile_atom(parser)
        }
    }

    /// A literal, or an identifier followed by its argument list. Arguments
    /// compile first, so all of them sit on the stack before the call
    /// instruction executes.
    fn compile_atom(&mut self, parser: &mut Parser) -> Result<(), FormulonError> {
        let token = parser.la().clone();

        match token.kind {
            TokenKind::Num | TokenKind::Str => {
                self.emit(token)?;
                parser.advance()?;
            }

            TokenKind::Id => {
                parser.advance()?;
                self.compile_arguments(parser)?;
                self.emit(token)?;
            }

            _ => {
                return Err(unexpected(
                    &token,
                    &[
                        TokenKind::Num,
                        TokenKind::Str,
                        TokenKind::Id,
                        TokenKind::LParen,
                    ],
                ));
            }
        }

        Ok(())
    }

    /// `'(' (expression (',' expression)*)? ')'`
    fn compile_arguments(&mut self, parser: &mut Parser) -> Result<(), FormulonError> {
        expect(parser, TokenKind::LParen)?;

        loop {
            match parser.la().kind {
                TokenKind::RParen => break,
                TokenKind::Comma => parser.advance()?,
                _ => self.compile_expression(parser)?,
            }
        }

        expect(parser, TokenKind::RParen)
    }

    /// Append one instruction, resolving identifiers against the registry.
    fn emit(&mut self, token: Token) -> Result<(), FormulonError> {
        let op = if token.kind == TokenKind::Id {
            match self.registry.get(&token.text) {
                Some(handle) => Instruction::with_handle(token, handle),
                None => {
                    return Err(FormulonError::UnknownFunction {
                        name: token.text,
                        line: token.line,
                        column: token.column,
                    });
                }
            }
        } else {
            Instruction::new(token)
        };

        self.ops.push(op);

        Ok(())
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Consume the current token if it has the expected kind, error otherwise.
fn expect(parser: &mut Parser, kind: TokenKind) -> Result<(), FormulonError> {
    let token = parser.la();
    if token.kind != kind {
        return Err(unexpected(token, &[kind]));
    }
    parser.advance()
}

fn unexpected(token: &Token, expected: &[TokenKind]) -> FormulonError {
    FormulonError::UnexpectedToken {
        expected: expected
            .iter()
            .map(|k| k.to_string())
            .collect::<Vec<_>>()
            .join(", "),
        found: token.kind,
        line: token.line,
        column: token.column,
    }
}

/// Pre-pass over the raw text: `(` and `)` counts must match. The counts are
/// character-level and include parentheses inside quoted string literals.
fn check_balanced_parens(expression: &str) -> Result<(), FormulonError> {
    let mut lp = 0usize;
    let mut rp = 0usize;

    for c in expression.chars() {
        match c {
            '(' => lp += 1,
            ')' => rp += 1,
            _ => {}
        }
    }

    if lp != rp {
        return Err(FormulonError::UnbalancedParentheses);
    }

    Ok(())
}
