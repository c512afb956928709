//! Recursive-descent parser with panic-mode error recovery.

use log::debug;
use thiserror::Error;

use crate::ast::{Expr, Stmt};
use crate::diag::{Diagnostics, Reason, SyntaxError};
use crate::token::{Token, TokenKind};
use crate::value::Value;

/// Parse a whole program.
///
/// Never fails: declarations containing syntax errors are reported to `diag` and left out of
/// the result.
pub fn parse(tokens: &[Token], diag: &mut Diagnostics) -> Vec<Stmt> {
    Parser::new(tokens, diag).parse()
}

/// Unwinds the parser up to the enclosing declaration.  Details have already been reported
/// when this is raised.
#[derive(Debug, PartialEq, Error)]
#[error("parse error")]
pub struct ParseError;

/// Stands in for the EOF token when the token slice is not properly terminated.
static END: Token = Token {
    kind: TokenKind::Eof,
    lexeme: String::new(),
    literal: None,
    line: 0,
};

#[derive(Debug)]
pub struct Parser<'t, 'd> {
    tokens: &'t [Token],
    current: usize,
    diag: &'d mut Diagnostics,
}

impl<'t, 'd> Parser<'t, 'd> {
    /// `tokens` is expected to end with an EOF token, as produced by the lexer.
    pub fn new(tokens: &'t [Token], diag: &'d mut Diagnostics) -> Parser<'t, 'd> {
        Parser {
            tokens,
            current: 0,
            diag,
        }
    }

    pub fn parse(mut self) -> Vec<Stmt> {
        let mut prg = vec![];
        while !self.at_end() {
            if let Some(stmt) = self.declaration() {
                prg.push(stmt);
            }
        }
        prg
    }

    /// Parse a declaration, recovering from any syntax error it contains.
    fn declaration(&mut self) -> Option<Stmt> {
        let stmt = if self.match_any(&[TokenKind::Var]) {
            self.var_decl()
        } else {
            self.statement()
        };

        match stmt {
            Ok(stmt) => Some(stmt),
            Err(ParseError) => {
                self.synchronize();
                None
            }
        }
    }

    /// Parse variable declaration.
    /// `var` has been consumed.
    fn var_decl(&mut self) -> Result<Stmt, ParseError> {
        let name = self.consume(TokenKind::Ident, "Expect variable name.")?;
        let init = if self.match_any(&[TokenKind::Equal]) {
            Some(Box::new(self.expression()?))
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after variable declaration.")?;
        Ok(Stmt::Var(name, init))
    }

    fn statement(&mut self) -> Result<Stmt, ParseError> {
        if self.match_any(&[TokenKind::Print]) {
            let expr = Box::new(self.expression()?);
            self.consume(TokenKind::Semicolon, "Expect ';' after value.")?;
            Ok(Stmt::Print(expr))
        } else {
            let expr = Box::new(self.expression()?);
            self.consume(TokenKind::Semicolon, "Expect ';' after expression.")?;
            Ok(Stmt::Expression(expr))
        }
    }

    fn expression(&mut self) -> Result<Expr, ParseError> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.equality()?;
        if self.match_any(&[TokenKind::Equal]) {
            let equals = self.previous();
            let rhs = self.assignment()?;
            match lhs {
                Expr::Variable(name) => Ok(Expr::Assign(name, Box::new(rhs))),
                lhs => {
                    // Reported but not unwound: the statement is still well formed.
                    self.report(equals, Reason::InvalidAssignmentTarget);
                    Ok(lhs)
                }
            }
        } else {
            Ok(lhs)
        }
    }

    fn equality(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.comparison()?;
        while self.match_any(&[TokenKind::BangEqual, TokenKind::EqualEqual]) {
            let op = self.previous().clone();
            let rhs = self.comparison()?;
            expr = Expr::Binary(Box::new(expr), op, Box::new(rhs));
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.term()?;
        while self.match_any(&[
            TokenKind::Greater,
            TokenKind::GreaterEqual,
            TokenKind::Less,
            TokenKind::LessEqual,
        ]) {
            let op = self.previous().clone();
            let rhs = self.term()?;
            expr = Expr::Binary(Box::new(expr), op, Box::new(rhs));
        }
        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.factor()?;
        while self.match_any(&[TokenKind::Minus, TokenKind::Plus]) {
            let op = self.previous().clone();
            let rhs = self.factor()?;
            expr = Expr::Binary(Box::new(expr), op, Box::new(rhs));
        }
        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.unary()?;
        while self.match_any(&[TokenKind::Slash, TokenKind::Star]) {
            let op = self.previous().clone();
            let rhs = self.unary()?;
            expr = Expr::Binary(Box::new(expr), op, Box::new(rhs));
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        if self.match_any(&[TokenKind::Bang, TokenKind::Minus]) {
            let op = self.previous().clone();
            let rhs = self.unary()?;
            Ok(Expr::Unary(op, Box::new(rhs)))
        } else {
            self.primary()
        }
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.peek();
        let expr = match token.kind {
            TokenKind::False => Expr::Literal(Value::Bool(false)),
            TokenKind::True => Expr::Literal(Value::Bool(true)),
            TokenKind::Nil => Expr::Literal(Value::Nil),
            TokenKind::Number | TokenKind::String => match &token.literal {
                Some(lit) => Expr::Literal(Value::from(lit)),
                None => return Err(self.error(token, Reason::ExpectedExpression)),
            },
            TokenKind::Ident => Expr::Variable(token.clone()),
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                self.consume(TokenKind::RightParen, "Expect ')' after expression.")?;
                return Ok(Expr::Grouping(Box::new(expr)));
            }
            _ => return Err(self.error(token, Reason::ExpectedExpression)),
        };
        self.advance();
        Ok(expr)
    }

    /// Discard tokens until a likely statement boundary.
    fn synchronize(&mut self) {
        self.advance();
        while !self.at_end() {
            if self.previous().kind == TokenKind::Semicolon || self.peek().kind.starts_statement()
            {
                break;
            }
            self.advance();
        }
        debug!("resynchronized before {}", self.peek());
    }

    fn at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn peek(&self) -> &'t Token {
        self.tokens.get(self.current).unwrap_or(&END)
    }

    fn previous(&self) -> &'t Token {
        self.current
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .unwrap_or(&END)
    }

    fn advance(&mut self) -> &'t Token {
        if !self.at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.at_end() && self.peek().kind == kind
    }

    fn match_any(&mut self, kinds: &[TokenKind]) -> bool {
        if kinds.iter().any(|kind| self.check(*kind)) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, expected: TokenKind, message: &'static str) -> Result<Token, ParseError> {
        if self.check(expected) {
            Ok(self.advance().clone())
        } else {
            Err(self.error(self.peek(), Reason::Expect(message)))
        }
    }

    fn report(&mut self, token: &Token, reason: Reason) {
        self.diag.report(SyntaxError::at_token(token, reason));
    }

    fn error(&mut self, token: &Token, reason: Reason) -> ParseError {
        self.report(token, reason);
        ParseError
    }
}
