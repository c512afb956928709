//! Lexical analyzer

use log::trace;

use crate::diag::{Diagnostics, Position, Reason, SyntaxError};
use crate::token::{self, Literal, Token, TokenKind};

/// Turn `source` into a sequence of tokens terminated by `EOF`.
///
/// Never fails: lexical errors are reported to `diag` and the offending bytes are skipped.
pub fn lex(source: &str, diag: &mut Diagnostics) -> Vec<Token> {
    Lexer::new(source, diag).lex()
}

/// Single pass over the bytes of a source string with one byte of lookahead (two for number
/// literals).
#[derive(Debug)]
pub struct Lexer<'s, 'd> {
    source: &'s str,
    bytes: &'s [u8],
    start: usize,
    current: usize,
    line: Position,
    diag: &'d mut Diagnostics,
}

impl<'s, 'd> Lexer<'s, 'd> {
    pub fn new(source: &'s str, diag: &'d mut Diagnostics) -> Lexer<'s, 'd> {
        Lexer {
            source,
            bytes: source.as_bytes(),
            start: 0,
            current: 0,
            line: 1,
            diag,
        }
    }

    pub fn lex(mut self) -> Vec<Token> {
        let mut tokens = vec![];
        while !self.at_end() {
            self.start = self.current;
            if let Some(token) = self.scan_token() {
                trace!("line {}: {}", token.line, token);
                tokens.push(token);
            }
        }
        tokens.push(Token::eof(self.line));
        tokens
    }

    /// Consume one lexeme.  Return the corresponding token unless the lexeme is blank, a
    /// comment or erroneous.
    fn scan_token(&mut self) -> Option<Token> {
        let b = self.advance();
        match b {
            b'(' => self.token(TokenKind::LeftParen),
            b')' => self.token(TokenKind::RightParen),
            b'{' => self.token(TokenKind::LeftBrace),
            b'}' => self.token(TokenKind::RightBrace),
            b',' => self.token(TokenKind::Comma),
            b'.' => self.token(TokenKind::Dot),
            b'-' => self.token(TokenKind::Minus),
            b'+' => self.token(TokenKind::Plus),
            b';' => self.token(TokenKind::Semicolon),
            b'*' => self.token(TokenKind::Star),
            b'!' => self.token_if_equal(TokenKind::BangEqual, TokenKind::Bang),
            b'=' => self.token_if_equal(TokenKind::EqualEqual, TokenKind::Equal),
            b'<' => self.token_if_equal(TokenKind::LessEqual, TokenKind::Less),
            b'>' => self.token_if_equal(TokenKind::GreaterEqual, TokenKind::Greater),
            b'/' => {
                if self.match_byte(b'/') {
                    self.skip_comment();
                    None
                } else {
                    self.token(TokenKind::Slash)
                }
            }
            b' ' | b'\r' | b'\t' => None,
            b'\n' => {
                self.line += 1;
                None
            }
            b'"' => self.string(),
            b'0'..=b'9' => self.number(),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(),
            _ => {
                // Skip the continuation bytes of a multi-byte character so it is reported once
                // and lexemes stay on character boundaries.
                while let Some(b) = self.peek() {
                    if b & 0b1100_0000 != 0b1000_0000 {
                        break;
                    }
                    self.advance();
                }
                self.diag
                    .report(SyntaxError::at_line(self.line, Reason::UnexpectedCharacter));
                None
            }
        }
    }

    fn skip_comment(&mut self) {
        while let Some(b) = self.peek() {
            if b == b'\n' {
                break;
            }
            self.advance();
        }
    }

    fn string(&mut self) -> Option<Token> {
        loop {
            match self.peek() {
                None => {
                    self.diag
                        .report(SyntaxError::at_line(self.line, Reason::UnterminatedString));
                    return None;
                }
                Some(b'"') => break,
                Some(b) => {
                    if b == b'\n' {
                        self.line += 1;
                    }
                    self.advance();
                }
            }
        }

        // closing quote
        self.advance();

        let contents = &self.source[self.start + 1..self.current - 1];
        self.literal_token(TokenKind::String, Literal::Str(contents.to_owned()))
    }

    fn number(&mut self) -> Option<Token> {
        self.skip_digits();
        if self.peek() == Some(b'.') && self.peek_next().map_or(false, |b| b.is_ascii_digit()) {
            self.advance();
            self.skip_digits();
        }

        // A run of ASCII digits with at most one inner dot always parses.
        let n = self.lexeme().parse::<f64>().unwrap_or(f64::NAN);
        self.literal_token(TokenKind::Number, Literal::Number(n))
    }

    fn skip_digits(&mut self) {
        while self.peek().map_or(false, |b| b.is_ascii_digit()) {
            self.advance();
        }
    }

    fn identifier(&mut self) -> Option<Token> {
        while self
            .peek()
            .map_or(false, |b| b.is_ascii_alphanumeric() || b == b'_')
        {
            self.advance();
        }

        let kind = token::keyword(self.lexeme()).unwrap_or(TokenKind::Ident);
        self.token(kind)
    }

    fn token_if_equal(&mut self, with_equal: TokenKind, without: TokenKind) -> Option<Token> {
        if self.match_byte(b'=') {
            self.token(with_equal)
        } else {
            self.token(without)
        }
    }

    fn token(&self, kind: TokenKind) -> Option<Token> {
        Some(Token::new(kind, self.lexeme(), None, self.line))
    }

    fn literal_token(&self, kind: TokenKind, literal: Literal) -> Option<Token> {
        Some(Token::new(kind, self.lexeme(), Some(literal), self.line))
    }

    fn lexeme(&self) -> &'s str {
        &self.source[self.start..self.current]
    }

    fn at_end(&self) -> bool {
        self.current >= self.bytes.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.current).copied()
    }

    fn peek_next(&self) -> Option<u8> {
        self.bytes.get(self.current + 1).copied()
    }

    /// Consume the next byte.  Only called when not at end.
    fn advance(&mut self) -> u8 {
        let b = self.bytes[self.current];
        self.current += 1;
        b
    }

    fn match_byte(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.current += 1;
            true
        } else {
            false
        }
    }
}
