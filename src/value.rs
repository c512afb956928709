use std::fmt;
use std::rc::Rc;

use crate::token::Literal;

/// Dynamically typed runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
}

impl Value {
    /// nil and false are falsy, everything else (including 0, "" and NaN) is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Number(_) | Value::Str(_) => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
        }
    }
}

/// Values of different kinds are never equal.  Numbers follow IEEE, so NaN != NaN.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(l), Value::Bool(r)) => l == r,
            (Value::Number(l), Value::Number(r)) => l == r,
            (Value::Str(l), Value::Str(r)) => l == r,
            _ => false,
        }
    }
}

impl From<&Literal> for Value {
    fn from(lit: &Literal) -> Value {
        match lit {
            Literal::Number(n) => Value::Number(*n),
            Literal::Str(s) => Value::Str(Rc::from(s.as_str())),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::Str(Rc::from(s))
    }
}

/// Formats the value as `print` shows it.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => {
                let txt = format_number(*n);
                f.write_str(txt.strip_suffix(".0").unwrap_or(&txt))
            }
            Value::Str(s) => f.write_str(s),
        }
    }
}

/// Render a number the way the token listing shows it: always with a fractional part, and in
/// `E` notation outside of `[1e-3, 1e7)`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let magnitude = n.abs();
    if n == 0.0 || (1e-3..1e7).contains(&magnitude) {
        let txt = n.to_string();
        if txt.contains('.') {
            txt
        } else {
            txt + ".0"
        }
    } else {
        let txt = format!("{:e}", n);
        match txt.split_once('e') {
            Some((mantissa, exp)) if mantissa.contains('.') => format!("{}E{}", mantissa, exp),
            Some((mantissa, exp)) => format!("{}.0E{}", mantissa, exp),
            None => txt,
        }
    }
}
