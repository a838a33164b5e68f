use std::time::{SystemTime, UNIX_EPOCH};

use crate::diagnostics::RuntimeError;
use crate::environment::Environment;
use crate::interpreter::Interpreter;
use crate::token::Token;
use crate::value::{NativeFunction, Value};
use std::rc::Rc;

/// Installs the pre-defined callables into the global environment.
pub fn install(globals: &Environment) {
    define(globals, "clock", 0, clock);
    define(globals, "floor", 1, floor);
    define(globals, "substring", 3, substring);
}

fn define(globals: &Environment, name: &'static str, arity: usize, func: fn(&mut Interpreter, Vec<Value>, &Token) -> Result<Value, RuntimeError>) {
    globals.define(
        name,
        Value::Callable(Rc::new(NativeFunction { name, arity, func })),
    );
}

fn clock(_interpreter: &mut Interpreter, _args: Vec<Value>, _call_token: &Token) -> Result<Value, RuntimeError> {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the epoch")
        .as_millis();
    Ok(Value::Number(millis as f64 / 1000.0))
}

fn floor(_interpreter: &mut Interpreter, mut args: Vec<Value>, call_token: &Token) -> Result<Value, RuntimeError> {
    let arg = args.remove(0);
    match arg {
        Value::Number(n) => Ok(Value::Number(n.floor())),
        other => Err(RuntimeError::new(
            call_token.clone(),
            format!("Operand must be a number, got {}.", other.type_name()),
        )),
    }
}

fn substring(_interpreter: &mut Interpreter, mut args: Vec<Value>, call_token: &Token) -> Result<Value, RuntimeError> {
    let j_arg = args.remove(2);
    let i_arg = args.remove(1);
    let s_arg = args.remove(0);

    let (Value::Str(s), Value::Number(i), Value::Number(j)) = (&s_arg, &i_arg, &j_arg) else {
        return Err(RuntimeError::new(
            call_token.clone(),
            "substring expects (string, number, number).".to_string(),
        ));
    };

    let chars: Vec<char> = s.chars().collect();
    let i = *i as i64;
    let j = *j as i64;

    if i < 0 || j > chars.len() as i64 {
        return Err(RuntimeError::new(
            call_token.clone(),
            "substring indices out of bounds.".to_string(),
        ));
    }

    if j <= i {
        return Ok(Value::Str(String::new()));
    }

    let slice: String = chars[i as usize..j as usize].iter().collect();
    Ok(Value::Str(slice))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Session;

    fn token() -> Token {
        Token::new(crate::token::TokenKind::Identifier, "substring", None, 1)
    }

    #[test]
    fn substring_basic_range() {
        let mut session = Session::new();
        let mut interpreter = Interpreter::new(&mut session);
        let result = substring(
            &mut interpreter,
            vec![Value::Str("hello".into()), Value::Number(1.0), Value::Number(3.0)],
            &token(),
        )
        .unwrap();
        assert_eq!(result, Value::Str("el".into()));
    }

    #[test]
    fn substring_empty_when_end_before_start() {
        let mut session = Session::new();
        let mut interpreter = Interpreter::new(&mut session);
        let result = substring(
            &mut interpreter,
            vec![Value::Str("hello".into()), Value::Number(3.0), Value::Number(1.0)],
            &token(),
        )
        .unwrap();
        assert_eq!(result, Value::Str(String::new()));
    }

    #[test]
    fn floor_truncates_down() {
        let mut session = Session::new();
        let mut interpreter = Interpreter::new(&mut session);
        let result = floor(&mut interpreter, vec![Value::Number(3.7)], &token()).unwrap();
        assert_eq!(result, Value::Number(3.0));
    }
}
