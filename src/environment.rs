use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::diagnostics::RuntimeError;
use crate::token::Token;
use crate::value::Value;

struct Frame {
    values: HashMap<String, Value>,
    parent: Option<Environment>,
}

/// A lexical scope: a name→value map with an optional parent. Cloning an
/// `Environment` shares the same frame — this is how a function value can
/// own ("close over") the environment that was current at its declaration
/// without tying its lifetime to that block's textual scope.
#[derive(Clone)]
pub struct Environment(Rc<RefCell<Frame>>);

impl Environment {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(Frame {
            values: HashMap::new(),
            parent: None,
        })))
    }

    pub fn child(parent: &Environment) -> Self {
        Self(Rc::new(RefCell::new(Frame {
            values: HashMap::new(),
            parent: Some(parent.clone()),
        })))
    }

    /// Always writes into *this* frame, even if `name` already exists in an
    /// outer one — this is how `var x = 1;` shadows.
    pub fn define(&self, name: &str, value: Value) {
        self.0.borrow_mut().values.insert(name.to_string(), value);
    }

    /// Searches this frame then parents; a runtime error if `name` is
    /// undefined anywhere in the chain.
    pub fn get(&self, token: &Token) -> Result<Value, RuntimeError> {
        let frame = self.0.borrow();
        if let Some(value) = frame.values.get(&token.lexeme) {
            return Ok(value.clone());
        }
        if let Some(parent) = &frame.parent {
            return parent.get(token);
        }
        Err(RuntimeError::new(
            token.clone(),
            format!("Undefined variable '{}'.", token.lexeme),
        ))
    }

    /// Searches for an existing binding from this frame outward and writes
    /// in the first frame that has it; a runtime error if `name` is
    /// undefined anywhere in the chain.
    pub fn assign(&self, token: &Token, value: Value) -> Result<(), RuntimeError> {
        let mut frame = self.0.borrow_mut();
        if frame.values.contains_key(&token.lexeme) {
            frame.values.insert(token.lexeme.clone(), value);
            return Ok(());
        }
        match &frame.parent {
            Some(parent) => parent.assign(token, value),
            None => Err(RuntimeError::new(
                token.clone(),
                format!("Undefined variable '{}'.", token.lexeme),
            )),
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    fn ident(name: &str) -> Token {
        Token::new(TokenKind::Identifier, name, None, 1)
    }

    #[test]
    fn shadowing_in_child_leaves_outer_unchanged() {
        let outer = Environment::new();
        outer.define("x", Value::Number(1.0));

        let inner = Environment::child(&outer);
        inner.define("x", Value::Number(99.0));

        assert_eq!(outer.get(&ident("x")).unwrap(), Value::Number(1.0));
        assert_eq!(inner.get(&ident("x")).unwrap(), Value::Number(99.0));
    }

    #[test]
    fn assign_through_child_mutates_outer() {
        let outer = Environment::new();
        outer.define("x", Value::Number(1.0));

        let inner = Environment::child(&outer);
        inner.assign(&ident("x"), Value::Number(2.0)).unwrap();

        assert_eq!(outer.get(&ident("x")).unwrap(), Value::Number(2.0));
    }

    #[test]
    fn undefined_get_is_runtime_error() {
        let env = Environment::new();
        assert!(env.get(&ident("missing")).is_err());
    }

    #[test]
    fn undefined_assign_is_runtime_error() {
        let env = Environment::new();
        assert!(env.assign(&ident("missing"), Value::Nil).is_err());
    }
}
