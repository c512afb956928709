//! API to control the interpreter.

use std::io;
use std::io::prelude::*;

use log::info;
use thiserror::Error;

use crate::config::Config;
use crate::diag::Diagnostics;
use crate::eval::{EvalError, Evaluator};
use crate::{lexer, parser};

/// Exit status for a usage error or a script that failed to parse or run.
pub const EXIT_FAILURE: i32 = 69;

/// Tree-walk interpreter session.
///
/// A session owns the global environment, so variables defined by one call to
/// [`Interpreter::run`] are visible to the next ones.  Program output (the token listing and
/// `print` results) goes to `output`, error reports go to `diagnostics`.
///
/// # Example
///
/// ```
/// # use nice::config::Config;
/// # use nice::interpreter::{Interpreter, InterpreterError};
/// let mut output: Vec<u8> = Vec::new();
/// let mut diagnostics: Vec<u8> = Vec::new();
/// let config = Config {
///     token_listing: false,
///     ..Config::default()
/// };
/// let mut interp = Interpreter::with_config(&mut output, &mut diagnostics, config);
///
/// interp.run("var greeting = \"hello\";")?;
/// interp.run("print greeting + \" world\";")?;
/// interp.run("print nope;")?;
/// assert!(interp.had_runtime_error());
///
/// assert_eq!(output, b"hello world\n");
/// assert_eq!(diagnostics, b"Undefined variable 'nope'.\n[line 1]\n");
/// # Ok::<(), InterpreterError>(())
/// ```
#[derive(Debug)]
pub struct Interpreter<'t, W: Write, E: Write> {
    evaluator: Evaluator<'t, W>,
    diagnostics: &'t mut E,
    config: Config,
    had_error: bool,
    had_runtime_error: bool,
}

/// Failures that prevent a session from reporting anything at all.
///
/// Errors in the interpreted program are not among them: they are reported to the diagnostic
/// writer and recorded in the session flags.
#[derive(Debug, Error)]
pub enum InterpreterError {
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl<'t, W: Write, E: Write> Interpreter<'t, W, E> {
    pub fn new(output: &'t mut W, diagnostics: &'t mut E) -> Interpreter<'t, W, E> {
        Interpreter::with_config(output, diagnostics, Config::default())
    }

    pub fn with_config(
        output: &'t mut W,
        diagnostics: &'t mut E,
        config: Config,
    ) -> Interpreter<'t, W, E> {
        Interpreter {
            evaluator: Evaluator::new(output),
            diagnostics,
            config,
            had_error: false,
            had_runtime_error: false,
        }
    }

    /// Lex, parse and, if no syntax error was found, evaluate `source`.
    pub fn run(&mut self, source: &str) -> Result<(), InterpreterError> {
        info!("running {} bytes", source.len());

        let mut diag = Diagnostics::new();
        let tokens = lexer::lex(source, &mut diag);
        let prg = parser::parse(&tokens, &mut diag);

        for error in diag.take() {
            writeln!(self.diagnostics, "{}", error)?;
            self.had_error = true;
        }

        if self.config.token_listing {
            let output = self.evaluator.output();
            for token in &tokens {
                writeln!(output, "{}", token)?;
            }
        }

        if self.had_error {
            return Ok(());
        }

        match self.evaluator.interpret(&prg) {
            Ok(()) => (),
            Err(EvalError::Runtime(e)) => {
                writeln!(self.diagnostics, "{}", e)?;
                self.had_runtime_error = true;
            }
            Err(EvalError::Io(e)) => return Err(InterpreterError::Io(e)),
        }

        info!(
            "ran {} statements (syntax error: {}, runtime error: {})",
            prg.len(),
            self.had_error,
            self.had_runtime_error
        );
        Ok(())
    }

    /// Whether a lexical or syntax error was reported since the last reset.
    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    /// Forget past syntax errors so the next `run` evaluates again.  Runtime errors are
    /// sticky.
    pub fn reset_error(&mut self) {
        self.had_error = false;
    }

    /// Process exit status after running a script file.
    pub fn exit_code(&self) -> i32 {
        if self.had_error || self.had_runtime_error {
            EXIT_FAILURE
        } else {
            0
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Writer receiving program output.
    pub fn output(&mut self) -> &mut W {
        self.evaluator.output()
    }
}
