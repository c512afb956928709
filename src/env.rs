use std::collections::HashMap;

use log::debug;

use crate::eval::RuntimeError;
use crate::token::Token;
use crate::value::Value;

/// Global variable bindings.  Lives as long as the interpreter so bindings survive across
/// REPL lines.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Environment {
        Environment::default()
    }

    /// Bind `name`, replacing any previous binding.
    pub fn define(&mut self, name: &str, value: Value) {
        debug!("define {} = {}", name, value);
        self.values.insert(name.to_owned(), value);
    }

    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        self.values
            .get(&name.lexeme)
            .cloned()
            .ok_or_else(|| RuntimeError::undefined_variable(name))
    }

    /// Rebind an existing variable.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        match self.values.get_mut(&name.lexeme) {
            Some(slot) => {
                debug!("assign {} = {}", name.lexeme, value);
                *slot = value;
                Ok(())
            }
            None => Err(RuntimeError::undefined_variable(name)),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
