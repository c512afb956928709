use std::io;
use std::io::prelude::*;
use std::rc::Rc;

use log::{debug, trace};
use thiserror::Error;

use crate::ast::{Expr, Stmt};
use crate::diag::Position;
use crate::env::Environment;
use crate::token::{Token, TokenKind};
use crate::value::Value;

/// Error raised while evaluating a well-formed program.
#[derive(Debug, PartialEq, Clone, Error)]
#[error("{message}\n[line {line}]")]
pub struct RuntimeError {
    pub message: String,
    /// Line of the operator or variable at fault.
    pub line: Position,
}

impl RuntimeError {
    pub fn new(token: &Token, message: &str) -> RuntimeError {
        RuntimeError {
            message: message.to_owned(),
            line: token.line,
        }
    }

    pub fn undefined_variable(name: &Token) -> RuntimeError {
        RuntimeError {
            message: format!("Undefined variable '{}'.", name.lexeme),
            line: name.line,
        }
    }
}

/// Reasons why `Evaluator::interpret` stops early.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("failed to write program output: {0}")]
    Io(#[from] io::Error),
}

/// Executes statements against the global environment and writes `print` output to `output`.
#[derive(Debug)]
pub struct Evaluator<'t, W: Write> {
    output: &'t mut W,
    globals: Environment,
}

impl<'a, W: Write> Evaluator<'a, W> {
    pub fn new(output: &'a mut W) -> Evaluator<'a, W> {
        Evaluator {
            output,
            globals: Environment::new(),
        }
    }

    pub fn output(&mut self) -> &mut W {
        &mut *self.output
    }

    pub fn globals(&self) -> &Environment {
        &self.globals
    }

    /// Execute `stmts` in order, stopping at the first runtime error.
    pub fn interpret(&mut self, stmts: &[Stmt]) -> Result<(), EvalError> {
        for stmt in stmts {
            self.execute(stmt)?;
        }
        Ok(())
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<(), EvalError> {
        trace!("execute {:?}", stmt);
        match stmt {
            Stmt::Expression(e) => {
                self.eval_expr(e)?;
            }
            Stmt::Print(e) => {
                let v = self.eval_expr(e)?;
                writeln!(self.output, "{}", v)?;
            }
            Stmt::Var(name, init) => {
                let v = match init {
                    Some(e) => self.eval_expr(e)?,
                    None => Value::Nil,
                };
                self.globals.define(&name.lexeme, v);
            }
        };
        Ok(())
    }

    fn eval_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Grouping(e) => self.eval_expr(e),
            Expr::Variable(name) => self.globals.get(name),
            Expr::Assign(name, rhs) => {
                let v = self.eval_expr(rhs)?;
                self.globals.assign(name, v.clone())?;
                Ok(v)
            }
            Expr::Unary(op, rhs) => {
                let v = self.eval_expr(rhs)?;
                match op.kind {
                    TokenKind::Bang => Ok(Value::Bool(!v.is_truthy())),
                    TokenKind::Minus => Ok(Value::Number(-number_operand(op, &v)?)),
                    // The parser only builds unary nodes for `!` and `-`.
                    _ => unreachable!("unary operator {}", op.kind),
                }
            }
            Expr::Binary(lhs, op, rhs) => {
                let l = self.eval_expr(lhs)?;
                let r = self.eval_expr(rhs)?;
                binary(op, l, r)
            }
        }
    }
}

fn binary(op: &Token, l: Value, r: Value) -> Result<Value, RuntimeError> {
    let v = match op.kind {
        TokenKind::Plus => match (l, r) {
            (Value::Number(l), Value::Number(r)) => Value::Number(l + r),
            (Value::Str(l), Value::Str(r)) => {
                let mut s = String::with_capacity(l.len() + r.len());
                s.push_str(&l);
                s.push_str(&r);
                Value::Str(Rc::from(s))
            }
            (l, r) => {
                debug!("cannot add {} to {}", r.type_name(), l.type_name());
                return Err(RuntimeError::new(
                    op,
                    "Operands must be two numbers or two strings.",
                ));
            }
        },
        TokenKind::Minus => {
            let (l, r) = number_operands(op, &l, &r)?;
            Value::Number(l - r)
        }
        TokenKind::Slash => {
            let (l, r) = number_operands(op, &l, &r)?;
            Value::Number(l / r)
        }
        TokenKind::Star => {
            let (l, r) = number_operands(op, &l, &r)?;
            Value::Number(l * r)
        }
        TokenKind::Greater => {
            let (l, r) = number_operands(op, &l, &r)?;
            Value::Bool(l > r)
        }
        TokenKind::GreaterEqual => {
            let (l, r) = number_operands(op, &l, &r)?;
            Value::Bool(l >= r)
        }
        TokenKind::Less => {
            let (l, r) = number_operands(op, &l, &r)?;
            Value::Bool(l < r)
        }
        TokenKind::LessEqual => {
            let (l, r) = number_operands(op, &l, &r)?;
            Value::Bool(l <= r)
        }
        TokenKind::EqualEqual => Value::Bool(l == r),
        TokenKind::BangEqual => Value::Bool(l != r),
        _ => unreachable!("binary operator {}", op.kind),
    };
    Ok(v)
}

fn number_operand(op: &Token, v: &Value) -> Result<f64, RuntimeError> {
    match v {
        Value::Number(n) => Ok(*n),
        _ => Err(RuntimeError::new(op, "Operand must be a number.")),
    }
}

fn number_operands(op: &Token, l: &Value, r: &Value) -> Result<(f64, f64), RuntimeError> {
    match (l, r) {
        (Value::Number(l), Value::Number(r)) => Ok((*l, *r)),
        _ => Err(RuntimeError::new(op, "Operands must be a number.")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::Diagnostics;
    use crate::{lexer, parser};

    fn num(n: f64) -> Box<Expr> {
        Box::new(Expr::Literal(Value::Number(n)))
    }

    fn string(s: &str) -> Box<Expr> {
        Box::new(Expr::Literal(Value::from(s)))
    }

    fn op(kind: TokenKind, lexeme: &str) -> Token {
        Token::new(kind, lexeme, None, 7)
    }

    fn binary_expr(l: Box<Expr>, kind: TokenKind, lexeme: &str, r: Box<Expr>) -> Expr {
        Expr::Binary(l, op(kind, lexeme), r)
    }

    fn eval_expr(expr: &Expr) -> Result<Value, RuntimeError> {
        let mut out: Vec<u8> = Vec::new();
        let mut evaluator = Evaluator::new(&mut out);
        let val = evaluator.eval_expr(expr)?;
        assert!(out.is_empty());
        Ok(val)
    }

    fn eval_prg(input: &str) -> Result<String, EvalError> {
        let mut diag = Diagnostics::new();
        let tokens = lexer::lex(input, &mut diag);
        let prg = parser::parse(&tokens, &mut diag);
        assert!(!diag.has_errors(), "unexpected errors: {:?}", diag.errors());

        let mut out: Vec<u8> = Vec::new();
        let mut evaluator = Evaluator::new(&mut out);
        evaluator.interpret(&prg)?;
        Ok(String::from_utf8(out).expect("error while converting output"))
    }

    fn runtime_error(input: &str) -> RuntimeError {
        match eval_prg(input) {
            Err(EvalError::Runtime(e)) => e,
            out => panic!("unexpected output: {:?}", out),
        }
    }

    #[test]
    fn literal() -> Result<(), RuntimeError> {
        assert_eq!(eval_expr(&num(1.0))?, Value::Number(1.0));
        Ok(())
    }

    #[test]
    fn unary_minus() -> Result<(), RuntimeError> {
        assert_eq!(
            eval_expr(&Expr::Unary(op(TokenKind::Minus, "-"), num(1.0)))?,
            Value::Number(-1.0)
        );
        Ok(())
    }

    #[test]
    fn unary_minus_on_string() {
        match eval_expr(&Expr::Unary(op(TokenKind::Minus, "-"), string("a"))) {
            Err(e) if e.message == "Operand must be a number." && e.line == 7 => (),
            out => panic!("unexpected output: {:?}", out),
        }
    }

    #[test]
    fn logical_not_uses_truthiness() -> Result<(), RuntimeError> {
        let not = |e: Box<Expr>| Expr::Unary(op(TokenKind::Bang, "!"), e);
        assert_eq!(eval_expr(&not(num(0.0)))?, Value::Bool(false));
        assert_eq!(eval_expr(&not(string("")))?, Value::Bool(false));
        assert_eq!(
            eval_expr(&not(Box::new(Expr::Literal(Value::Nil))))?,
            Value::Bool(true)
        );
        Ok(())
    }

    #[test]
    fn arithmetic() -> Result<(), RuntimeError> {
        assert_eq!(
            eval_expr(&binary_expr(num(1.0), TokenKind::Minus, "-", num(3.0)))?,
            Value::Number(-2.0)
        );
        assert_eq!(
            eval_expr(&binary_expr(num(6.0), TokenKind::Slash, "/", num(4.0)))?,
            Value::Number(1.5)
        );
        assert_eq!(
            eval_expr(&binary_expr(num(6.0), TokenKind::Star, "*", num(4.0)))?,
            Value::Number(24.0)
        );
        Ok(())
    }

    #[test]
    fn division_by_zero_follows_ieee() -> Result<(), EvalError> {
        assert_eq!(eval_prg("print 1 / 0; print -1 / 0; print 0 / 0;")?, "Infinity\n-Infinity\nNaN\n");
        Ok(())
    }

    #[test]
    fn string_concatenation() -> Result<(), RuntimeError> {
        assert_eq!(
            eval_expr(&binary_expr(string("foo"), TokenKind::Plus, "+", string("bar")))?,
            Value::from("foobar")
        );
        Ok(())
    }

    #[test]
    fn mixed_addition() {
        match eval_expr(&binary_expr(num(1.0), TokenKind::Plus, "+", string("a"))) {
            Err(e) if e.message == "Operands must be two numbers or two strings." => (),
            out => panic!("unexpected output: {:?}", out),
        }
    }

    #[test]
    fn comparisons() -> Result<(), RuntimeError> {
        let cases = [
            (TokenKind::Less, "<", 1.0, 2.0, true),
            (TokenKind::Less, "<", 2.0, 2.0, false),
            (TokenKind::LessEqual, "<=", 2.0, 2.0, true),
            (TokenKind::Greater, ">", 3.0, 2.0, true),
            (TokenKind::GreaterEqual, ">=", 1.0, 2.0, false),
        ];
        for (kind, lexeme, l, r, expected) in cases {
            assert_eq!(
                eval_expr(&binary_expr(num(l), kind, lexeme, num(r)))?,
                Value::Bool(expected)
            );
        }
        Ok(())
    }

    #[test]
    fn comparing_strings_is_an_error() {
        match eval_expr(&binary_expr(string("a"), TokenKind::Less, "<", string("b"))) {
            Err(e) if e.message == "Operands must be a number." => (),
            out => panic!("unexpected output: {:?}", out),
        }
    }

    #[test]
    fn equality_never_fails() -> Result<(), RuntimeError> {
        let eq = |l, r| binary_expr(l, TokenKind::EqualEqual, "==", r);
        let ne = |l, r| binary_expr(l, TokenKind::BangEqual, "!=", r);
        assert_eq!(eval_expr(&eq(num(2.0), num(2.0)))?, Value::Bool(true));
        assert_eq!(eval_expr(&eq(num(1.0), string("1")))?, Value::Bool(false));
        assert_eq!(eval_expr(&ne(string("a"), string("b")))?, Value::Bool(true));
        assert_eq!(
            eval_expr(&eq(
                Box::new(Expr::Literal(Value::Nil)),
                Box::new(Expr::Literal(Value::Nil))
            ))?,
            Value::Bool(true)
        );
        Ok(())
    }

    #[test]
    fn print_stmt() -> Result<(), EvalError> {
        assert_eq!(eval_prg("print 42;")?, "42\n");
        assert_eq!(eval_prg("print nil; print true; print \"s\";")?, "nil\ntrue\ns\n");
        Ok(())
    }

    #[test]
    fn precedence() -> Result<(), EvalError> {
        assert_eq!(eval_prg("print 1 + 2 * 3;")?, "7\n");
        assert_eq!(eval_prg("print (1 + 2) * 3;")?, "9\n");
        Ok(())
    }

    #[test]
    fn set_and_get_var() -> Result<(), EvalError> {
        assert_eq!(eval_prg("var foo = 42; foo = 24; print foo;")?, "24\n");
        Ok(())
    }

    #[test]
    fn uninitialized_var_is_nil() -> Result<(), EvalError> {
        assert_eq!(eval_prg("var foo; print foo;")?, "nil\n");
        Ok(())
    }

    #[test]
    fn redeclaring_a_variable_overwrites_it() -> Result<(), EvalError> {
        assert_eq!(eval_prg("var a = 1; var a = \"x\"; print a;")?, "x\n");
        Ok(())
    }

    #[test]
    fn chained_assignment() -> Result<(), EvalError> {
        assert_eq!(eval_prg("var a; var b; a = b = 3; print a; print b;")?, "3\n3\n");
        Ok(())
    }

    #[test]
    fn assignment_yields_its_value() -> Result<(), EvalError> {
        assert_eq!(eval_prg("var a; print a = \"v\";")?, "v\n");
        Ok(())
    }

    #[test]
    fn get_unknown_var() {
        let e = runtime_error("print y;");
        assert_eq!(e.to_string(), "Undefined variable 'y'.\n[line 1]");
    }

    #[test]
    fn set_unknown_var() {
        let e = runtime_error("\ny = 1;");
        assert_eq!(e.to_string(), "Undefined variable 'y'.\n[line 2]");
    }

    #[test]
    fn runtime_error_reports_operator_line() {
        let e = runtime_error("print 1\n+\n\"a\";");
        assert_eq!(e.message, "Operands must be two numbers or two strings.");
        assert_eq!(e.line, 2);
    }

    #[test]
    fn left_operand_is_evaluated_first() {
        let e = runtime_error("print (a = 1) + b;");
        assert_eq!(e.message, "Undefined variable 'a'.");
    }

    #[test]
    fn runtime_error_aborts_remaining_statements() {
        let mut diag = Diagnostics::new();
        let tokens = lexer::lex("print 1; print -\"x\"; print 2;", &mut diag);
        let prg = parser::parse(&tokens, &mut diag);

        let mut out: Vec<u8> = Vec::new();
        let mut evaluator = Evaluator::new(&mut out);
        match evaluator.interpret(&prg) {
            Err(EvalError::Runtime(e)) if e.message == "Operand must be a number." => (),
            r => panic!("unexpected output: {:?}", r),
        }
        assert_eq!(out, b"1\n");
    }

    #[test]
    fn bindings_persist_across_calls() -> Result<(), EvalError> {
        let mut out: Vec<u8> = Vec::new();
        let mut evaluator = Evaluator::new(&mut out);
        for src in ["var n = 1;", "n = n + 1;", "print n;"] {
            let mut diag = Diagnostics::new();
            let tokens = lexer::lex(src, &mut diag);
            evaluator.interpret(&parser::parse(&tokens, &mut diag))?;
        }
        assert_eq!(evaluator.globals().len(), 1);
        assert_eq!(out, b"2\n");
        Ok(())
    }

    #[test]
    #[should_panic(expected = "unary operator PLUS")]
    fn unary_plus_is_never_built() {
        let _ = eval_expr(&Expr::Unary(op(TokenKind::Plus, "+"), num(1.0)));
    }
}
