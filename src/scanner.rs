//! Scanner module: a character cursor over the input text.
//!
//! The scanner owns the input, hands out single characters of lookahead, and
//! tracks line/column/absolute position as it advances. It never fails: past
//! the end of the text, lookahead simply reports no character.

/// A cursor over the characters of a formula.
#[derive(Debug, Clone)]
pub struct Scanner {
    chars: Vec<char>,
    position: usize,
    line: u32,
    column: u32,
}

impl Scanner {
    pub fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// The next unconsumed character, if any.
    pub fn la(&self) -> Option<char> {
        self.lookahead(1)
    }

    /// The character `k` positions ahead (1-based) without consuming it.
    /// Returns `None` past the end of the text.
    pub fn lookahead(&self, k: usize) -> Option<char> {
        self.chars.get(self.position + k - 1).copied()
    }

    /// Advance the cursor by one character, updating line and column.
    pub fn consume(&mut self) {
        if self.position < self.chars.len() {
            if self.chars[self.position] == '\n' {
                self.column = 0;
                self.line += 1;
            }
            self.column += 1;
            self.position += 1;
        }
    }

    pub fn at_end(&self) -> bool {
        self.position >= self.chars.len()
    }

    /// The text between a previously saved position and the cursor.
    pub fn slice(&self, start: usize) -> String {
        self.chars[start..self.position].iter().collect()
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    pub fn position(&self) -> usize {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookahead_and_consume() {
        let mut sc = Scanner::new("ab");
        assert_eq!(sc.la(), Some('a'));
        assert_eq!(sc.lookahead(2), Some('b'));
        assert_eq!(sc.lookahead(3), None);
        sc.consume();
        assert_eq!(sc.la(), Some('b'));
        sc.consume();
        assert_eq!(sc.la(), None);
        assert!(sc.at_end());
    }

    #[test]
    fn test_consume_past_end_is_harmless() {
        let mut sc = Scanner::new("x");
        sc.consume();
        sc.consume();
        assert!(sc.at_end());
        assert_eq!(sc.position(), 1);
    }

    #[test]
    fn test_line_and_column_tracking() {
        let mut sc = Scanner::new("a\nb");
        assert_eq!((sc.line(), sc.column()), (1, 1));
        sc.consume(); // a
        assert_eq!((sc.line(), sc.column()), (1, 2));
        sc.consume(); // \n
        assert_eq!((sc.line(), sc.column()), (2, 1));
        sc.consume(); // b
        assert_eq!((sc.line(), sc.column()), (2, 2));
    }

    #[test]
    fn test_slice() {
        let mut sc = Scanner::new("12.5k");
        let start = sc.position();
        for _ in 0..4 {
            sc.consume();
        }
        assert_eq!(sc.slice(start), "12.5");
    }
}
