//! A tree-walking interpreter for `nice`, a small dynamically typed scripting language.
//!
//! Source text goes through three stages:
//!
//! - [`lexer::lex`] turns it into tokens,
//! - [`parser::parse`] turns tokens into statements, recovering from syntax errors,
//! - [`eval::Evaluator`] executes statements against a global environment.
//!
//! [`interpreter::Interpreter`] chains them and keeps the session state shared by the
//! interactive prompt.
//!
//! # Limitations
//!
//! - Only expressions, `print` and `var` statements are supported.  Reserved words for control
//! flow, functions and classes are recognized but rejected by the parser.
//! - There is a single, global scope.

#![warn(rust_2018_idioms)]
#![warn(missing_debug_implementations)]

pub mod ast;
pub mod config;
pub mod diag;
pub mod env;
pub mod eval;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod value;
