use std::fmt;

use crate::token::{Token, TokenKind};

/// Carries the two process-global error flags and the `rand` sequence
/// index. Packaged as an explicit struct passed through the pipeline
/// rather than real globals, so the interpreter stays embeddable — a test
/// can spin up any number of independent `Session`s without interfering
/// with one another.
#[derive(Debug, Default)]
pub struct Session {
    pub had_parse_error: bool,
    pub had_runtime_error: bool,
    pub rand_index: usize,
}

const RAND_SEQUENCE: [f64; 12] = [57.0, 97.0, 28.0, 7.0, 71.0, 1.0, 79.0, 83.0, 64.0, 82.0, 89.0, 24.0];

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the deterministic `rand` sequence.
    pub fn next_rand(&mut self) -> f64 {
        let value = RAND_SEQUENCE[self.rand_index % RAND_SEQUENCE.len()];
        self.rand_index += 1;
        value
    }

    pub fn lex_error(&mut self, line: usize, message: &str) {
        self.had_parse_error = true;
        report(line, "", message);
    }

    pub fn parse_error_at(&mut self, token: &Token, message: &str) {
        self.had_parse_error = true;
        let location = if token.kind == TokenKind::Eof {
            " at end".to_string()
        } else {
            format!(" at '{}'", token.lexeme)
        };
        report(token.line, &location, message);
    }

    pub fn runtime_error(&mut self, error: &RuntimeError) {
        self.had_runtime_error = true;
        eprintln!("{}\n[line {}]", error.message, error.token.line);
    }

    pub fn clear_had_parse_error(&mut self) {
        self.had_parse_error = false;
    }
}

fn report(line: usize, location: &str, message: &str) {
    eprintln!("[line {line}] Error{location}: {message}");
}

/// A parse-sentinel error: no payload, caught inside the parser to drive
/// synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseError;

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("parse error")
    }
}

impl std::error::Error for ParseError {}

/// A runtime error: `(token, message)`, `token.line` is used for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub token: Token,
    pub message: String,
}

impl RuntimeError {
    pub fn new(token: Token, message: impl Into<String>) -> Self {
        Self {
            token,
            message: message.into(),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n[line {}]", self.message, self.token.line)
    }
}

impl std::error::Error for RuntimeError {}
