use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;

use once_cell::sync::Lazy;

use crate::diagnostics::Session;
use crate::token::{Literal, Token, TokenKind};

static KEYWORDS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    use TokenKind::*;
    let mut m = HashMap::new();
    m.insert("and", And);
    m.insert("class", Class);
    m.insert("else", Else);
    m.insert("false", False);
    m.insert("for", For);
    m.insert("fun", Fun);
    m.insert("if", If);
    m.insert("nil", Nil);
    m.insert("or", Or);
    m.insert("print", Print);
    m.insert("return", Return);
    m.insert("super", Super);
    m.insert("this", This);
    m.insert("true", True);
    m.insert("var", Var);
    m.insert("while", While);
    m.insert("read", Read);
    m.insert("rand", Rand);
    m.insert("loop", Loop);
    m.insert("in", In);
    m.insert("printonly", Printonly);
    m
});

/// Hand-written left-to-right scanner: source text in, token stream out.
///
/// Scans via a `Peekable<Chars>` cursor, dispatching on a fixed `match`
/// over character classes instead of a generic maximal-munch table, since
/// the two/three-character combinations here (`<-`, `!!`, `//`, `/* */`)
/// need explicit precedence over each other that a generic trie would
/// blur.
pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<Chars<'a>>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().peekable(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
        }
    }

    pub fn scan_tokens(mut self, session: &mut Session) -> Vec<Token> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token(session);
        }
        self.tokens.push(Token::eof(self.line));
        self.tokens
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next();
        if let Some(c) = c {
            self.current += c.len_utf8();
        }
        c
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn peek_match(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn lexeme(&self) -> &'a str {
        &self.source[self.start..self.current]
    }

    fn add_token(&mut self, kind: TokenKind) {
        self.add_token_literal(kind, None);
    }

    fn add_token_literal(&mut self, kind: TokenKind, literal: Option<Literal>) {
        log::trace!("token {kind:?} at line {}", self.line);
        self.tokens.push(Token::new(kind, self.lexeme(), literal, self.line));
    }

    fn scan_token(&mut self, session: &mut Session) {
        let Some(c) = self.advance() else { return };

        use TokenKind::*;
        match c {
            '(' => self.add_token(LeftParen),
            ')' => self.add_token(RightParen),
            '{' => self.add_token(LeftBrace),
            '}' => self.add_token(RightBrace),
            ',' => self.add_token(Comma),
            '.' => self.add_token(Dot),
            '-' => self.add_token(Minus),
            '+' => self.add_token(Plus),
            ';' => self.add_token(Semicolon),
            '*' => self.add_token(Star),
            '!' => {
                if self.peek_match('!') {
                    self.add_token(Rand);
                } else {
                    let kind = if self.peek_match('=') { BangEqual } else { Bang };
                    self.add_token(kind);
                }
            }
            '=' => {
                let kind = if self.peek_match('=') { EqualEqual } else { Equal };
                self.add_token(kind);
            }
            '<' => {
                if self.peek_match('-') {
                    self.add_token(Read);
                } else {
                    let kind = if self.peek_match('=') { LessEqual } else { Less };
                    self.add_token(kind);
                }
            }
            '>' => {
                let kind = if self.peek_match('=') { GreaterEqual } else { Greater };
                self.add_token(kind);
            }
            '/' => {
                if self.peek_match('/') {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                } else if self.peek_match('*') {
                    self.block_comment(session);
                } else {
                    self.add_token(Slash);
                }
            }
            ' ' | '\t' | '\r' => {}
            '\n' => self.line += 1,
            '"' => self.string(session),
            ':' => self.symbol(session),
            c if c.is_ascii_digit() => self.number(),
            c if is_alpha(c) => self.identifier(),
            other => session.lex_error(self.line, &format!("Unexpected character '{other}'")),
        }
    }

    fn block_comment(&mut self, session: &mut Session) {
        loop {
            match self.peek() {
                None => {
                    session.lex_error(self.line, "Unterminated multi-line comment");
                    return;
                }
                Some('*') => {
                    self.advance();
                    if self.peek_match('/') {
                        return;
                    }
                }
                Some('\n') => {
                    self.line += 1;
                    self.advance();
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    fn string(&mut self, session: &mut Session) {
        while let Some(c) = self.peek() {
            if c == '"' {
                break;
            }
            if c == '\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            session.lex_error(self.line, "Unterminated string.");
            return;
        }

        // closing quote
        self.advance();

        let contents = &self.source[self.start + 1..self.current - 1];
        self.add_token_literal(TokenKind::String, Some(Literal::Str(contents.to_string())));
    }

    fn symbol(&mut self, session: &mut Session) {
        if !self.peek().is_some_and(is_alpha) {
            session.lex_error(self.line, "Expected identifier after ':'");
            return;
        }
        while self.peek().is_some_and(is_alphanumeric) {
            self.advance();
        }
        let name = &self.source[self.start + 1..self.current];
        self.add_token_literal(TokenKind::Symbol, Some(Literal::Symbol(name.to_string())));
    }

    fn number(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        if self.peek() == Some('.') {
            let mut lookahead = self.chars.clone();
            lookahead.next();
            if lookahead.next().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }

        let value: f64 = self.lexeme().parse().expect("scanned number must be valid");
        self.add_token_literal(TokenKind::Number, Some(Literal::Number(value)));
    }

    fn identifier(&mut self) {
        while self.peek().is_some_and(is_alphanumeric) {
            self.advance();
        }
        let kind = KEYWORDS.get(self.lexeme()).copied().unwrap_or(TokenKind::Identifier);
        self.add_token(kind);
    }
}

fn is_alpha(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_alphanumeric(c: char) -> bool {
    is_alpha(c) || c.is_ascii_digit()
}
