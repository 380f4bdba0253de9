//! Parser module: a fixed-depth sliding window of lexed tokens.
//!
//! Wraps the [`Lexer`] with a small pre-fetched buffer so the compiler can
//! peek ahead without re-scanning. The window is filled at construction and
//! always full; past the end of input it simply holds Eof tokens.

use crate::lexer::Lexer;
use crate::token::Token;
use crate::FormulonError;

/// Tokens buffered ahead of the current position. Three covers multi-token
/// operator disambiguation plus one token of grammar lookahead.
pub const LOOKAHEAD_DEPTH: usize = 3;

pub struct Parser {
    lexer: Lexer,
    window: Vec<Token>,
}

impl Parser {
    /// Build the window by pulling [`LOOKAHEAD_DEPTH`] tokens up front.
    pub fn new(mut lexer: Lexer) -> Result<Self, FormulonError> {
        let mut window = Vec::with_capacity(LOOKAHEAD_DEPTH);
        for _ in 0..LOOKAHEAD_DEPTH {
            window.push(lexer.next_token()?);
        }
        Ok(Self { lexer, window })
    }

    /// The current token.
    pub fn la(&self) -> &Token {
        &self.window[0]
    }

    /// The `k`-th buffered token (1-based), or `None` outside the window.
    pub fn peek(&self, k: usize) -> Option<&Token> {
        if k == 0 {
            return None;
        }
        self.window.get(k - 1)
    }

    /// Shift the window left by one and pull a fresh token from the lexer.
    pub fn advance(&mut self) -> Result<(), FormulonError> {
        self.window.remove(0);
        self.window.push(self.lexer.next_token()?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    #[test]
    fn test_window_filled_at_construction() {
        let parser = Parser::new(Lexer::new("1 + 2")).unwrap();
        assert_eq!(parser.la().kind, TokenKind::Num);
        assert_eq!(parser.peek(2).unwrap().kind, TokenKind::Add);
        assert_eq!(parser.peek(3).unwrap().kind, TokenKind::Num);
        assert_eq!(parser.peek(4), None);
        assert_eq!(parser.peek(0), None);
    }

    #[test]
    fn test_advance_shifts_and_refills() {
        let mut parser = Parser::new(Lexer::new("1 + 2")).unwrap();
        parser.advance().unwrap();
        assert_eq!(parser.la().kind, TokenKind::Add);
        assert_eq!(parser.peek(3).unwrap().kind, TokenKind::Eof);
        parser.advance().unwrap();
        parser.advance().unwrap();
        assert_eq!(parser.la().kind, TokenKind::Eof);
        // Past the end the window stays full of Eof.
        parser.advance().unwrap();
        assert_eq!(parser.peek(3).unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn test_lexical_error_surfaces_through_advance() {
        // The error sits beyond the initial window and appears on advance.
        let mut parser = Parser::new(Lexer::new("1 + 2 + #")).unwrap();
        let mut result = Ok(());
        for _ in 0..LOOKAHEAD_DEPTH {
            result = parser.advance();
            if result.is_err() {
                break;
            }
        }
        assert!(matches!(result, Err(FormulonError::Lexical { .. })));
    }
}
