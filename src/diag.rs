//! Lexical and syntactic diagnostics.

use std::fmt;

use log::debug;
use thiserror::Error;

use crate::token::{Token, TokenKind};

/// Line number (starting at one).
pub type Position = u32;

/// A lexical or syntax error, formatted exactly as it is shown to the user.
#[derive(Debug, PartialEq, Clone, Error)]
#[error("[line {line}] Error{location}: {reason}")]
pub struct SyntaxError {
    pub line: Position,
    pub location: Location,
    pub reason: Reason,
}

impl SyntaxError {
    /// Error with no token context, as raised by the lexer.
    pub fn at_line(line: Position, reason: Reason) -> SyntaxError {
        SyntaxError {
            line,
            location: Location::Line,
            reason,
        }
    }

    /// Error pointing at a token, as raised by the parser.
    pub fn at_token(token: &Token, reason: Reason) -> SyntaxError {
        let location = if token.kind == TokenKind::Eof {
            Location::End
        } else {
            Location::Lexeme(token.lexeme.clone())
        };
        SyntaxError {
            line: token.line,
            location,
            reason,
        }
    }
}

/// Where on its line a syntax error occurred.
#[derive(Debug, PartialEq, Clone)]
pub enum Location {
    Line,
    End,
    Lexeme(String),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Line => Ok(()),
            Location::End => write!(f, " at end"),
            Location::Lexeme(lexeme) => write!(f, " at '{}'", lexeme),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Reason {
    UnexpectedCharacter,
    UnterminatedString,
    ExpectedExpression,
    InvalidAssignmentTarget,
    /// A required token is missing.  Holds the complete message.
    Expect(&'static str),
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::UnexpectedCharacter => write!(f, "Unexpected character."),
            Reason::UnterminatedString => write!(f, "Unterminated string."),
            Reason::ExpectedExpression => write!(f, "Expected expression."),
            Reason::InvalidAssignmentTarget => write!(f, "Invalid assignment target."),
            Reason::Expect(msg) => f.write_str(msg),
        }
    }
}

/// Collects the errors reported while lexing and parsing one source.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<SyntaxError>,
}

impl Diagnostics {
    pub fn new() -> Diagnostics {
        Diagnostics::default()
    }

    pub fn report(&mut self, error: SyntaxError) {
        debug!("reported: {}", error);
        self.errors.push(error);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[SyntaxError] {
        &self.errors
    }

    /// Remove and return everything reported so far, in report order.
    pub fn take(&mut self) -> Vec<SyntaxError> {
        std::mem::take(&mut self.errors)
    }
}
