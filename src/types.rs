//! Types module: parameter kinds, stack values, and coercions.
//!
//! Every value the evaluator handles is one of three kinds: number, boolean,
//! or text. The coercion rules between them are fixed: booleans read as
//! 1.0/0.0, numbers are truthy when nonzero, and text converts to a number
//! through the literal parser (NaN when it doesn't parse).

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kinds a registered function may declare for its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamKind {
    Number,
    Boolean,
    Text,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Number => f.write_str("number"),
            ParamKind::Boolean => f.write_str("boolean"),
            ParamKind::Text => f.write_str("text"),
        }
    }
}

/// A dynamically-typed operand on the evaluation stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Number(f64),
    Boolean(bool),
    Text(String),
}

impl Value {
    /// Numeric coercion: booleans become 1.0/0.0, text goes through the
    /// literal parser and yields NaN when unparseable.
    pub fn as_number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Boolean(true) => 1.0,
            Value::Boolean(false) => 0.0,
            Value::Text(s) => parse_number(s),
        }
    }

    /// Truthiness coercion: nonzero numbers are true, text is true only for
    /// a case-insensitive "true".
    pub fn as_boolean(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0,
            Value::Boolean(b) => *b,
            Value::Text(s) => s.eq_ignore_ascii_case("true"),
        }
    }

    /// String coercion.
    pub fn as_text(&self) -> String {
        match self {
            Value::Number(n) => n.to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Text(s) => s.clone(),
        }
    }

    /// Convert to the representation a declared parameter kind expects.
    pub fn coerce(&self, kind: ParamKind) -> Value {
        match kind {
            ParamKind::Number => Value::Number(self.as_number()),
            ParamKind::Boolean => Value::Boolean(self.as_boolean()),
            ParamKind::Text => Value::Text(self.as_text()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

/// Parse a lexed numeric literal, suffix included, into a double.
///
/// This is the default literal-parsing collaborator: it receives exactly the
/// raw token text. A single trailing magnitude or percent suffix scales the
/// value (`%`→1e-2, `K`→1e3, `M`→1e6, `B`→1e9, `T`→1e12, case-insensitive);
/// exponents (`2E3`) are handled by the float parser itself. Text that still
/// fails to parse yields NaN, which propagates through arithmetic the same
/// way division by zero does.
pub fn parse_number(raw: &str) -> f64 {
    let text = raw.trim();

    let (body, scale) = match text.chars().last() {
        Some('%') => (&text[..text.len() - 1], 1e-2),
        Some('K') | Some('k') => (&text[..text.len() - 1], 1e3),
        Some('M') | Some('m') => (&text[..text.len() - 1], 1e6),
        Some('B') | Some('b') => (&text[..text.len() - 1], 1e9),
        Some('T') | Some('t') => (&text[..text.len() - 1], 1e12),
        _ => (text, 1.0),
    };

    match body.parse::<f64>() {
        Ok(n) => n * scale,
        Err(_) => f64::NAN,
    }
}
