use std::io::{self, BufRead, Write};
use std::rc::Rc;

use crate::ast::{Expr, LiteralValue, Stmt};
use crate::builtins;
use crate::diagnostics::{RuntimeError, Session};
use crate::environment::Environment;
use crate::token::{Token, TokenKind};
use crate::value::{Callable, UserFunction, Value};

/// Non-local control transfer out of statement execution: either a runtime
/// error or a `return` unwind carrying its value. Kept as a dedicated
/// result carrier threaded through evaluator frames rather than a thrown
/// exception, so `return` never sets `had_runtime_error` and is never
/// confused with a genuine failure.
pub enum Flow {
    Error(RuntimeError),
    Return(Value),
}

impl From<RuntimeError> for Flow {
    fn from(e: RuntimeError) -> Self {
        Flow::Error(e)
    }
}

type EvalResult = Result<Value, Flow>;
type ExecResult = Result<(), Flow>;

/// The tree-walking evaluator. Holds the current environment pointer and a
/// handle to the session carrying error flags and the `rand` sequence
/// index.
pub struct Interpreter<'a> {
    pub globals: Environment,
    environment: Environment,
    session: &'a mut Session,
}

impl<'a> Interpreter<'a> {
    pub fn new(session: &'a mut Session) -> Self {
        let globals = Environment::new();
        builtins::install(&globals);
        Self {
            environment: globals.clone(),
            globals,
            session,
        }
    }

    /// Runs a parsed program, reporting at most the first runtime error
    /// encountered and setting `had_runtime_error` on the session. A
    /// `return` that escapes every call frame (used outside a function)
    /// quietly ends the run rather than being reported.
    pub fn interpret(&mut self, statements: &[Stmt]) {
        for stmt in statements {
            match self.execute(stmt) {
                Ok(()) => {}
                Err(Flow::Error(err)) => {
                    self.session.runtime_error(&err);
                    return;
                }
                Err(Flow::Return(_)) => return,
            }
        }
    }

    pub fn next_rand(&mut self) -> f64 {
        self.session.next_rand()
    }

    // ---- statements -----------------------------------------------------

    fn execute(&mut self, stmt: &Stmt) -> ExecResult {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(())
            }
            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                println!("{}", value.stringify());
                Ok(())
            }
            Stmt::PrintOnly(expr) => {
                let value = self.evaluate(expr)?;
                print!("{}", value.stringify());
                io::stdout().flush().ok();
                Ok(())
            }
            Stmt::Var(name, initializer) => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                self.environment.define(&name.lexeme, value);
                Ok(())
            }
            Stmt::Block(statements) => {
                let child = Environment::child(&self.environment);
                self.execute_block(statements, child)
            }
            Stmt::If(condition, then_branch, else_branch) => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(())
                }
            }
            Stmt::While(condition, body) => {
                while self.evaluate(condition)?.is_truthy() {
                    self.execute(body)?;
                }
                Ok(())
            }
            Stmt::StringLoop(var, iterable, body) => self.execute_string_loop(var, iterable, body),
            Stmt::Function(declaration) => {
                let function = UserFunction {
                    declaration: declaration.clone(),
                    closure: self.environment.clone(),
                };
                self.environment
                    .define(&declaration.name.lexeme, Value::Callable(Rc::new(function)));
                Ok(())
            }
            Stmt::Return(_keyword, value) => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                Err(Flow::Return(value))
            }
        }
    }

    /// Executes `statements` in `env`, restoring the caller's environment on
    /// every exit path — normal completion, an error, or a `return`
    /// unwind.
    pub fn execute_block(&mut self, statements: &[Stmt], env: Environment) -> ExecResult {
        let previous = std::mem::replace(&mut self.environment, env);

        let mut result = Ok(());
        for stmt in statements {
            if let Err(flow) = self.execute(stmt) {
                result = Err(flow);
                break;
            }
        }

        self.environment = previous;
        result
    }

    fn execute_string_loop(&mut self, var: &Token, iterable: &Expr, body: &Stmt) -> ExecResult {
        let value = self.evaluate(iterable)?;
        let Value::Str(s) = value else {
            return Err(RuntimeError::new(
                var.clone(),
                "String loop can only iterate over strings.".to_string(),
            )
            .into());
        };

        for ch in s.chars() {
            let child = Environment::child(&self.environment);
            child.define(&var.lexeme, Value::Str(ch.to_string()));
            self.execute_block(std::slice::from_ref(body), child)?;
        }
        Ok(())
    }

    // ---- expressions ------------------------------------------------------

    fn evaluate(&mut self, expr: &Expr) -> EvalResult {
        match expr {
            Expr::Literal(lit) => Ok(literal_value(lit)),
            Expr::Grouping(inner) => self.evaluate(inner),
            Expr::Symbol(name) => Ok(Value::Symbol(name.clone())),
            Expr::Variable(name) => Ok(self.environment.get(name)?),
            Expr::Assign(name, value) => {
                let value = self.evaluate(value)?;
                self.environment.assign(name, value.clone())?;
                Ok(value)
            }
            Expr::Unary(op, right) => self.evaluate_unary(op, right),
            Expr::Binary(left, op, right) => self.evaluate_binary(left, op, right),
            Expr::Logical(left, op, right) => self.evaluate_logical(left, op, right),
            Expr::Call(callee, paren, args) => self.evaluate_call(callee, paren, args),
            Expr::DynamicLiteral(token) => self.evaluate_dynamic_literal(token),
        }
    }

    fn evaluate_unary(&mut self, op: &Token, right: &Expr) -> EvalResult {
        let right = self.evaluate(right)?;
        match op.kind {
            TokenKind::Minus => match right {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(RuntimeError::new(op.clone(), "Operand must be a number.".to_string()).into()),
            },
            TokenKind::Bang => Ok(Value::Bool(!right.is_truthy())),
            _ => unreachable!("unary operator token must be '!' or '-'"),
        }
    }

    fn evaluate_logical(&mut self, left: &Expr, op: &Token, right: &Expr) -> EvalResult {
        let left = self.evaluate(left)?;
        match op.kind {
            TokenKind::Or if left.is_truthy() => Ok(left),
            TokenKind::Or => self.evaluate(right),
            TokenKind::And if !left.is_truthy() => Ok(left),
            TokenKind::And => self.evaluate(right),
            _ => unreachable!("logical operator token must be 'and' or 'or'"),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, op: &Token, right: &Expr) -> EvalResult {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;

        use TokenKind::*;
        match op.kind {
            Plus => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
                _ => Err(RuntimeError::new(
                    op.clone(),
                    "Operands must be two numbers or two strings.".to_string(),
                )
                .into()),
            },
            Minus => Ok(Value::Number(number_operand(op, left)? - number_operand(op, right)?)),
            Star => Ok(Value::Number(number_operand(op, left)? * number_operand(op, right)?)),
            Slash => Ok(Value::Number(number_operand(op, left)? / number_operand(op, right)?)),
            Greater => Ok(Value::Bool(number_operand(op, left)? > number_operand(op, right)?)),
            GreaterEqual => Ok(Value::Bool(number_operand(op, left)? >= number_operand(op, right)?)),
            Less => Ok(Value::Bool(number_operand(op, left)? < number_operand(op, right)?)),
            LessEqual => Ok(Value::Bool(number_operand(op, left)? <= number_operand(op, right)?)),
            EqualEqual => Ok(Value::Bool(left == right)),
            BangEqual => Ok(Value::Bool(left != right)),
            _ => unreachable!("unexpected binary operator token {op:?}"),
        }
    }

    fn evaluate_call(&mut self, callee: &Expr, paren: &Token, arg_exprs: &[Expr]) -> EvalResult {
        let callee = self.evaluate(callee)?;

        let mut args = Vec::with_capacity(arg_exprs.len());
        for arg in arg_exprs {
            args.push(self.evaluate(arg)?);
        }

        let Value::Callable(callable) = callee else {
            return Err(RuntimeError::new(
                paren.clone(),
                "Can only call functions and classes.".to_string(),
            )
            .into());
        };

        if args.len() != callable.arity() {
            return Err(RuntimeError::new(
                paren.clone(),
                format!("Expected {} arguments but got {}.", callable.arity(), args.len()),
            )
            .into());
        }

        log::trace!("calling '{}' with {} argument(s)", callable.name(), args.len());
        callable.call(self, args, paren)
    }

    fn evaluate_dynamic_literal(&mut self, token: &Token) -> EvalResult {
        match token.kind {
            TokenKind::Rand => Ok(Value::Number(self.next_rand())),
            TokenKind::Read => Ok(self.read_line(token)?),
            _ => unreachable!("dynamic literal token must be 'read' or 'rand'"),
        }
    }

    fn read_line(&mut self, token: &Token) -> Result<Value, RuntimeError> {
        print!("input required > ");
        io::stdout()
            .flush()
            .map_err(|e| RuntimeError::new(token.clone(), format!("I/O error: {e}")))?;

        let mut line = String::new();
        let bytes = io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| RuntimeError::new(token.clone(), format!("I/O error: {e}")))?;

        if bytes == 0 {
            return Ok(Value::Str(String::new()));
        }
        Ok(Value::Str(line.trim().to_string()))
    }
}

fn literal_value(lit: &LiteralValue) -> Value {
    match lit {
        LiteralValue::Nil => Value::Nil,
        LiteralValue::Bool(b) => Value::Bool(*b),
        LiteralValue::Number(n) => Value::Number(*n),
        LiteralValue::Str(s) => Value::Str(s.clone()),
    }
}

fn number_operand(op: &Token, value: Value) -> Result<f64, Flow> {
    match value {
        Value::Number(n) => Ok(n),
        _ => Err(RuntimeError::new(op.clone(), "Operand must be a number.".to_string()).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn run(src: &str) -> Session {
        let mut session = Session::new();
        let tokens = Lexer::new(src).scan_tokens(&mut session);
        let statements = Parser::new(tokens, &mut session).parse();
        if !session.had_parse_error {
            let mut interpreter = Interpreter::new(&mut session);
            interpreter.interpret(&statements);
        }
        session
    }

    #[test]
    fn block_shadowing_leaves_outer_untouched() {
        // executed purely for its side effect on stdout in a real run; here
        // we only assert it doesn't raise a runtime error.
        let session = run("var x = 1; { var x = 2; } ");
        assert!(!session.had_runtime_error);
    }

    #[test]
    fn plus_requires_matching_operand_types() {
        let session = run("print 1 + \"a\";");
        assert!(session.had_runtime_error);
    }

    #[test]
    fn undefined_variable_is_runtime_error() {
        let session = run("print x;");
        assert!(session.had_runtime_error);
    }

    #[test]
    fn and_or_short_circuit_return_operand_value() {
        let mut session = Session::new();
        let tokens = Lexer::new("var a = nil or \"fallback\";").scan_tokens(&mut session);
        let statements = Parser::new(tokens, &mut session).parse();
        let mut interpreter = Interpreter::new(&mut session);
        interpreter.interpret(&statements);
        assert_eq!(
            interpreter.globals.get(&Token::new(TokenKind::Identifier, "a", None, 1)).unwrap(),
            Value::Str("fallback".into())
        );
    }

    #[test]
    fn closures_capture_declaring_frame() {
        let mut session = Session::new();
        let src = "fun makeCounter(){ var i=0; fun c(){ i = i+1; return i; } return c; } var counter = makeCounter();";
        let tokens = Lexer::new(src).scan_tokens(&mut session);
        let statements = Parser::new(tokens, &mut session).parse();
        let mut interpreter = Interpreter::new(&mut session);
        interpreter.interpret(&statements);

        let counter = interpreter
            .globals
            .get(&Token::new(TokenKind::Identifier, "counter", None, 1))
            .unwrap();
        let Value::Callable(counter) = counter else { panic!("expected callable") };

        let paren = Token::new(TokenKind::RightParen, ")", None, 1);
        let first = counter.call(&mut interpreter, vec![], &paren).ok().unwrap();
        let second = counter.call(&mut interpreter, vec![], &paren).ok().unwrap();
        let third = counter.call(&mut interpreter, vec![], &paren).ok().unwrap();

        assert_eq!(first, Value::Number(1.0));
        assert_eq!(second, Value::Number(2.0));
        assert_eq!(third, Value::Number(3.0));
    }

    #[test]
    fn rand_is_deterministic_and_wraps() {
        let mut session = Session::new();
        let expected = [57.0, 97.0, 28.0, 7.0, 71.0, 1.0, 79.0, 83.0, 64.0, 82.0, 89.0, 24.0, 57.0];
        for want in expected {
            assert_eq!(session.next_rand(), want);
        }
    }

    #[test]
    fn string_loop_requires_a_string() {
        let session = run("loop (var c in 5) { print c; }");
        assert!(session.had_runtime_error);
    }

    #[test]
    fn string_loop_iterates_characters() {
        let session = run("loop (var c in \"ab\") { printonly c; }");
        assert!(!session.had_runtime_error);
    }
}
