//! Lexer module: rules for which token a run of characters makes.
//!
//! Consumes the [`Scanner`] one character at a time and produces [`Token`]s,
//! normalizing aliases (`&&`→and, `||`→or, `<>`→!=) and folding identifiers
//! to uppercase. A character sequence matching no rule is a lexical error;
//! end of input produces an Eof token.

use crate::scanner::Scanner;
use crate::token::{Token, TokenKind};
use crate::FormulonError;

pub struct Lexer {
    scanner: Scanner,
}

impl Lexer {
    pub fn new(text: &str) -> Self {
        Self {
            scanner: Scanner::new(text),
        }
    }

    /// Produce the next token, skipping whitespace and the `$` filler.
    pub fn next_token(&mut self) -> Result<Token, FormulonError> {
        self.consume_whitespace();

        let la = match self.scanner.la() {
            Some(c) => c,
            None => return Ok(self.token("<EOF>", TokenKind::Eof)),
        };

        match la {
            '=' => {
                self.scanner.consume();
                if self.scanner.la() == Some('=') {
                    self.scanner.consume();
                }
                return Ok(self.token("=", TokenKind::Eq));
            }

            '!' => {
                self.scanner.consume();
                if self.scanner.la() == Some('=') {
                    self.scanner.consume();
                    return Ok(self.token("!=", TokenKind::Ne));
                }
                return Ok(self.token("!", TokenKind::Not));
            }

            '<' => {
                self.scanner.consume();
                if self.scanner.la() == Some('=') {
                    self.scanner.consume();
                    return Ok(self.token("<=", TokenKind::Le));
                }
                if self.scanner.la() == Some('>') {
                    self.scanner.consume();
                    return Ok(self.token("<>", TokenKind::Ne));
                }
                return Ok(self.token("<", TokenKind::Lt));
            }

            '>' => {
                self.scanner.consume();
                if self.scanner.la() == Some('=') {
                    self.scanner.consume();
                    return Ok(self.token(">=", TokenKind::Ge));
                }
                return Ok(self.token(">", TokenKind::Gt));
            }

            '+' => return Ok(self.single(la, TokenKind::Add)),
            '-' => return Ok(self.single(la, TokenKind::Sub)),
            '*' => return Ok(self.single(la, TokenKind::Mul)),
            '/' => return Ok(self.single(la, TokenKind::Div)),
            '^' => return Ok(self.single(la, TokenKind::Pow)),
            '(' => return Ok(self.single(la, TokenKind::LParen)),
            ')' => return Ok(self.single(la, TokenKind::RParen)),
            ',' => return Ok(self.single(la, TokenKind::Comma)),

            '"' | '\'' => return self.string_literal(la),

            _ => {}
        }

        // Keywords are matched by case-insensitive prefix, each consuming
        // exactly its own length.
        if self.keyword("true") {
            return Ok(self.token("1", TokenKind::Num));
        }
        if self.keyword("false") {
            return Ok(self.token("0", TokenKind::Num));
        }
        if self.keyword("and") || self.keyword("&&") {
            return Ok(self.token("and", TokenKind::And));
        }
        if self.keyword("or") || self.keyword("||") {
            return Ok(self.token("or", TokenKind::Or));
        }
        if self.keyword("not") {
            return Ok(self.token("not", TokenKind::Not));
        }

        if la.is_ascii_digit() {
            return self.number();
        }

        if la.is_ascii_alphabetic() || la == '_' {
            return Ok(self.identifier());
        }

        Err(self.lexical(Some(la)))
    }

    fn consume_whitespace(&mut self) {
        while let Some(c) = self.scanner.la() {
            if c.is_whitespace() || c == '$' {
                self.scanner.consume();
            } else {
                break;
            }
        }
    }

    fn token(&self, text: impl Into<String>, kind: TokenKind) -> Token {
        Token::new(text, &self.scanner, kind)
    }

    fn single(&mut self, ch: char, kind: TokenKind) -> Token {
        self.scanner.consume();
        self.token(ch.to_string(), kind)
    }

    /// Case-insensitive prefix match; consumes the keyword when it matches.
    fn keyword(&mut self, word: &str) -> bool {
        for (i, ch) in word.chars().enumerate() {
            match self.scanner.lookahead(i + 1) {
                Some(la) if la.eq_ignore_ascii_case(&ch) => {}
                _ => return false,
            }
        }
        for _ in word.chars() {
            self.scanner.consume();
        }
        true
    }

    /// `[0-9]+(.[0-9]+)?((E|e)[0-9]+ | %|T|B|M|K)?`
    ///
    /// Suffix recognition is purely lexical; the raw text, suffix included,
    /// is handed to the literal parser at evaluation time.
    fn number(&mut self) -> Result<Token, FormulonError> {
        let start = self.scanner.position();

        self.match_digit()?;
        self.consume_digits();

        if self.scanner.la() == Some('.') {
            self.scanner.consume();
            self.match_digit()?;
            self.consume_digits();
        }

        match self.scanner.la() {
            Some('E') | Some('e') => {
                self.scanner.consume();
                self.match_digit()?;
                self.consume_digits();
            }
            Some(c) if matches!(c.to_ascii_uppercase(), '%' | 'T' | 'B' | 'M' | 'K') => {
                self.scanner.consume();
            }
            _ => {}
        }

        Ok(self.token(self.scanner.slice(start), TokenKind::Num))
    }

    fn consume_digits(&mut self) {
        while let Some(c) = self.scanner.la() {
            if c.is_ascii_digit() {
                self.scanner.consume();
            } else {
                break;
            }
        }
    }

    /// `[A-Za-z_][A-Za-z0-9_]*`, folded to uppercase.
    fn identifier(&mut self) -> Token {
        let start = self.scanner.position();
        self.scanner.consume();

        while let Some(c) = self.scanner.la() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.scanner.consume();
            } else {
                break;
            }
        }

        self.token(self.scanner.slice(start).to_uppercase(), TokenKind::Id)
    }

    /// A quoted literal; a doubled quote character is an escaped quote.
    fn string_literal(&mut self, quote: char) -> Result<Token, FormulonError> {
        self.scanner.consume();

        let mut text = String::new();

        loop {
            match self.scanner.la() {
                None => return Err(self.lexical(None)),
                Some(c) if c == quote => {
                    if self.scanner.lookahead(2) == Some(quote) {
                        self.scanner.consume();
                        self.scanner.consume();
                        text.push(quote);
                    } else {
                        self.scanner.consume();
                        break;
                    }
                }
                Some(c) => {
                    text.push(c);
                    self.scanner.consume();
                }
            }
        }

        Ok(self.token(text, TokenKind::Str))
    }

    fn match_digit(&mut self) -> Result<(), FormulonError> {
        match self.scanner.la() {
            Some(c) if c.is_ascii_digit() => {
                self.scanner.consume();
                Ok(())
            }
            other => Err(self.lexical(other)),
        }
    }

    fn lexical(&self, found: Option<char>) -> FormulonError {
        FormulonError::Lexical {
            found: match found {
                Some(c) => format!("character '{}'", c),
                None => "end of input".to_string(),
            },
            line: self.scanner.line(),
            column: self.scanner.column(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(text);
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token().unwrap();
            let kind = token.kind;
            out.push(kind);
            if kind == TokenKind::Eof {
                return out;
            }
        }
    }

    #[test]
    fn test_operators() {
        use TokenKind::*;
        assert_eq!(
            kinds("= == != <> < <= > >= + - * / ^ ( ) , ! not"),
            vec![Eq, Eq, Ne, Ne, Lt, Le, Gt, Ge, Add, Sub, Mul, Div, Pow, LParen, RParen, Comma, Not, Not, Eof]
        );
    }

    #[test]
    fn test_logical_aliases() {
        use TokenKind::*;
        assert_eq!(kinds("and && or ||"), vec![And, And, Or, Or, Eof]);
        assert_eq!(kinds("AND oR"), vec![And, Or, Eof]);
    }

    #[test]
    fn test_boolean_literals_become_numbers() {
        let mut lexer = Lexer::new("TRUE false");
        let t = lexer.next_token().unwrap();
        assert_eq!((t.text.as_str(), t.kind), ("1", TokenKind::Num));
        let f = lexer.next_token().unwrap();
        assert_eq!((f.text.as_str(), f.kind), ("0", TokenKind::Num));
    }

    #[test]
    fn test_numbers_with_suffixes() {
        for (input, expected) in [
            ("42", "42"),
            ("3.25", "3.25"),
            ("2E10", "2E10"),
            ("2e3", "2e3"),
            ("50%", "50%"),
            ("1.5M", "1.5M"),
            ("2k", "2k"),
            ("7T", "7T"),
            ("9b", "9b"),
        ] {
            let t = Lexer::new(input).next_token().unwrap();
            assert_eq!((t.text.as_str(), t.kind), (expected, TokenKind::Num), "input {input:?}");
        }
    }

    #[test]
    fn test_number_missing_fraction_digits() {
        assert!(Lexer::new("1.").next_token().is_err());
        assert!(Lexer::new("2E").next_token().is_err());
    }

    #[test]
    fn test_identifier_uppercased() {
        let t = Lexer::new("net_income2").next_token().unwrap();
        assert_eq!((t.text.as_str(), t.kind), ("NET_INCOME2", TokenKind::Id));
    }

    #[test]
    fn test_string_literals_and_escapes() {
        let t = Lexer::new(r#""it""s""#).next_token().unwrap();
        assert_eq!((t.text.as_str(), t.kind), (r#"it"s"#, TokenKind::Str));

        let t = Lexer::new("'don''t'").next_token().unwrap();
        assert_eq!((t.text.as_str(), t.kind), ("don't", TokenKind::Str));
    }

    #[test]
    fn test_unterminated_string() {
        assert!(matches!(
            Lexer::new("\"oops").next_token(),
            Err(FormulonError::Lexical { .. })
        ));
    }

    #[test]
    fn test_dollar_is_filler() {
        assert_eq!(kinds("1 $ + $ 2"), vec![TokenKind::Num, TokenKind::Add, TokenKind::Num, TokenKind::Eof]);
    }

    #[test]
    fn test_unexpected_character() {
        let err = Lexer::new("#").next_token().unwrap_err();
        assert!(matches!(err, FormulonError::Lexical { .. }));
        assert!(err.to_string().contains('#'));
    }

    #[test]
    fn test_eof_is_sticky() {
        let mut lexer = Lexer::new("");
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
    }
}
