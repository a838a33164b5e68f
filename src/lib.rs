//! `glint`: a small tree-walking interpreter library.
//!
//! The binary entrypoint (`src/main.rs`) wires these pieces together into a
//! REPL/file runner; everything here is usable standalone for embedding or
//! testing.

pub mod ast;
pub mod builtins;
pub mod diagnostics;
pub mod environment;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod token;
pub mod value;

use diagnostics::Session;
use interpreter::Interpreter;
use lexer::Lexer;
use parser::Parser;
use token::{Token, TokenKind};

/// Scans, parses, and (if parsing succeeded) evaluates `source` against
/// `session`, sharing `session`'s error flags and `rand` index across the
/// whole pipeline.
pub fn run(source: &str, session: &mut Session) {
    let tokens = Lexer::new(source).scan_tokens(session);
    let statements = Parser::new(tokens, session).parse();

    if session.had_parse_error {
        return;
    }

    let mut interpreter = Interpreter::new(session);
    interpreter.interpret(&statements);
}

/// Runs only the scan phase: prints one token per line and returns without
/// parsing or evaluating.
pub fn scan(source: &str, session: &mut Session) -> Vec<Token> {
    Lexer::new(source).scan_tokens(session)
}

pub fn print_tokens(tokens: &[Token]) {
    for token in tokens {
        if token.kind != TokenKind::Eof {
            println!("{token}");
        }
    }
}
