use std::rc::Rc;

use crate::ast::{Expr, FunctionDecl, LiteralValue, Stmt};
use crate::diagnostics::{ParseError, Session};
use crate::token::{Token, TokenKind};

const MAX_ARGS: usize = 255;

/// Recursive-descent parser with one token of lookahead.
pub struct Parser<'a> {
    tokens: Vec<Token>,
    current: usize,
    session: &'a mut Session,
}

type PResult<T> = Result<T, ParseError>;

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, session: &'a mut Session) -> Self {
        Self {
            tokens,
            current: 0,
            session,
        }
    }

    pub fn parse(mut self) -> Vec<Stmt> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }
        statements
    }

    // ---- token cursor -----------------------------------------------

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous().clone()
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    fn matches(&mut self, kinds: &[TokenKind]) -> bool {
        for kind in kinds {
            if self.check(*kind) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> PResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(message))
        }
    }

    fn error(&mut self, message: &str) -> ParseError {
        let token = self.peek().clone();
        self.session.parse_error_at(&token, message);
        ParseError
    }

    /// Consumes tokens until after a `;` or until the next token starts a
    /// likely statement.
    fn synchronize(&mut self) {
        log::debug!("synchronizing parser at token {:?}", self.peek());
        self.advance();
        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon {
                return;
            }
            use TokenKind::*;
            if matches!(
                self.peek().kind,
                Class | Fun | Var | For | If | While | Print | Return
            ) {
                return;
            }
            self.advance();
        }
    }

    // ---- declarations -------------------------------------------------

    fn declaration(&mut self) -> Option<Stmt> {
        let result = if self.matches(&[TokenKind::Fun]) {
            self.function_decl()
        } else if self.matches(&[TokenKind::Var]) {
            self.var_decl()
        } else if self.matches(&[TokenKind::Loop]) {
            self.string_loop()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(_) => {
                self.synchronize();
                None
            }
        }
    }

    fn function_decl(&mut self) -> PResult<Stmt> {
        let name = self.consume(TokenKind::Identifier, "Expect function name.")?;
        self.consume(TokenKind::LeftParen, "Expect '(' after function name.")?;

        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if params.len() >= MAX_ARGS {
                    self.error("Can't have more than 255 parameters.");
                }
                params.push(self.consume(TokenKind::Identifier, "Expect parameter name.")?);
                if !self.matches(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after parameters.")?;

        self.consume(TokenKind::LeftBrace, "Expect '{' before function body.")?;
        let body = self.block()?;

        Ok(Stmt::Function(Rc::new(FunctionDecl { name, params, body })))
    }

    fn var_decl(&mut self) -> PResult<Stmt> {
        let name = self.consume(TokenKind::Identifier, "Expect variable name.")?;

        let initializer = if self.matches(&[TokenKind::Equal]) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenKind::Semicolon, "Expect ';' after variable declaration.")?;
        Ok(Stmt::Var(name, initializer))
    }

    fn string_loop(&mut self) -> PResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'loop'.")?;
        self.consume(TokenKind::Var, "Expect 'var' in string loop header.")?;
        let name = self.consume(TokenKind::Identifier, "Expect loop variable name.")?;
        self.consume(TokenKind::In, "Expect 'in' in string loop header.")?;
        let iterable = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after string loop header.")?;
        let body = self.statement()?;
        Ok(Stmt::StringLoop(name, iterable, Box::new(body)))
    }

    // ---- statements -----------------------------------------------------

    fn statement(&mut self) -> PResult<Stmt> {
        if self.matches(&[TokenKind::Print]) {
            return self.print_statement();
        }
        if self.matches(&[TokenKind::Printonly]) {
            return self.printonly_statement();
        }
        if self.matches(&[TokenKind::LeftBrace]) {
            return Ok(Stmt::Block(self.block()?));
        }
        if self.matches(&[TokenKind::If]) {
            return self.if_statement();
        }
        if self.matches(&[TokenKind::While]) {
            return self.while_statement();
        }
        if self.matches(&[TokenKind::For]) {
            return self.for_statement();
        }
        if self.matches(&[TokenKind::Return]) {
            return self.return_statement();
        }
        if matches!(self.peek().kind, TokenKind::Class | TokenKind::This | TokenKind::Super) {
            return Err(self.error("Classes are not supported."));
        }
        self.expression_statement()
    }

    fn print_statement(&mut self) -> PResult<Stmt> {
        let value = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after value.")?;
        Ok(Stmt::Print(value))
    }

    fn printonly_statement(&mut self) -> PResult<Stmt> {
        let value = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after value.")?;
        Ok(Stmt::PrintOnly(value))
    }

    fn block(&mut self) -> PResult<Vec<Stmt>> {
        let mut statements = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after block.")?;
        Ok(statements)
    }

    fn required_block(&mut self, context: &str) -> PResult<Stmt> {
        self.consume(TokenKind::LeftBrace, &format!("Expect '{{' {context}"))?;
        Ok(Stmt::Block(self.block()?))
    }

    fn if_statement(&mut self) -> PResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after if condition.")?;

        let then_branch = self.required_block("before if body.")?;
        let else_branch = if self.matches(&[TokenKind::Else]) {
            Some(Box::new(self.required_block("before else body.")?))
        } else {
            None
        };

        Ok(Stmt::If(condition, Box::new(then_branch), else_branch))
    }

    fn while_statement(&mut self) -> PResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after while condition.")?;
        let body = self.statement()?;
        Ok(Stmt::While(condition, Box::new(body)))
    }

    /// Desugars `for (init; cond; incr) body` into
    /// `Block([init, While(cond, Block([body, Expression(incr)]))])`.
    fn for_statement(&mut self) -> PResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'for'.")?;

        let initializer = if self.matches(&[TokenKind::Semicolon]) {
            None
        } else if self.matches(&[TokenKind::Var]) {
            Some(self.var_decl()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if self.check(TokenKind::Semicolon) {
            Expr::Literal(LiteralValue::Bool(true))
        } else {
            self.expression()?
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after loop condition.")?;

        let increment = if self.check(TokenKind::RightParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::RightParen, "Expect ')' after for clauses.")?;

        let mut body = self.statement()?;

        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }

        body = Stmt::While(condition, Box::new(body));

        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }

        Ok(body)
    }

    fn return_statement(&mut self) -> PResult<Stmt> {
        let keyword = self.previous().clone();
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after return value.")?;
        Ok(Stmt::Return(keyword, value))
    }

    fn expression_statement(&mut self) -> PResult<Stmt> {
        let expr = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after expression.")?;
        Ok(Stmt::Expression(expr))
    }

    // ---- expressions ----------------------------------------------------

    pub fn expression(&mut self) -> PResult<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> PResult<Expr> {
        let expr = self.or()?;

        if self.matches(&[TokenKind::Equal]) {
            let equals = self.previous().clone();
            let value = self.assignment()?;

            return match expr {
                Expr::Variable(name) => Ok(Expr::Assign(name, Box::new(value))),
                _ => {
                    self.session.parse_error_at(&equals, "Invalid assignment target.");
                    Ok(expr)
                }
            };
        }

        Ok(expr)
    }

    fn or(&mut self) -> PResult<Expr> {
        let mut expr = self.and()?;
        while self.matches(&[TokenKind::Or]) {
            let op = self.previous().clone();
            let right = self.and()?;
            expr = Expr::Logical(Box::new(expr), op, Box::new(right));
        }
        Ok(expr)
    }

    fn and(&mut self) -> PResult<Expr> {
        let mut expr = self.equality()?;
        while self.matches(&[TokenKind::And]) {
            let op = self.previous().clone();
            let right = self.equality()?;
            expr = Expr::Logical(Box::new(expr), op, Box::new(right));
        }
        Ok(expr)
    }

    fn equality(&mut self) -> PResult<Expr> {
        let mut expr = self.comparison()?;
        while self.matches(&[TokenKind::BangEqual, TokenKind::EqualEqual]) {
            let op = self.previous().clone();
            let right = self.comparison()?;
            expr = Expr::Binary(Box::new(expr), op, Box::new(right));
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> PResult<Expr> {
        let mut expr = self.term()?;
        while self.matches(&[
            TokenKind::Greater,
            TokenKind::GreaterEqual,
            TokenKind::Less,
            TokenKind::LessEqual,
        ]) {
            let op = self.previous().clone();
            let right = self.term()?;
            expr = Expr::Binary(Box::new(expr), op, Box::new(right));
        }
        Ok(expr)
    }

    fn term(&mut self) -> PResult<Expr> {
        let mut expr = self.factor()?;
        while self.matches(&[TokenKind::Plus, TokenKind::Minus]) {
            let op = self.previous().clone();
            let right = self.factor()?;
            expr = Expr::Binary(Box::new(expr), op, Box::new(right));
        }
        Ok(expr)
    }

    fn factor(&mut self) -> PResult<Expr> {
        let mut expr = self.unary()?;
        while self.matches(&[TokenKind::Star, TokenKind::Slash]) {
            let op = self.previous().clone();
            let right = self.unary()?;
            expr = Expr::Binary(Box::new(expr), op, Box::new(right));
        }
        Ok(expr)
    }

    fn unary(&mut self) -> PResult<Expr> {
        if self.matches(&[TokenKind::Bang, TokenKind::Minus]) {
            let op = self.previous().clone();
            let right = self.unary()?;
            return Ok(Expr::Unary(op, Box::new(right)));
        }
        self.call()
    }

    fn call(&mut self) -> PResult<Expr> {
        let mut expr = self.primary()?;

        loop {
            if self.matches(&[TokenKind::LeftParen]) {
                expr = self.finish_call(expr)?;
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> PResult<Expr> {
        let mut args = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if args.len() >= MAX_ARGS {
                    self.error("Can't have more than 255 arguments.");
                }
                args.push(self.expression()?);
                if !self.matches(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        let paren = self.consume(TokenKind::RightParen, "Expect ')' after arguments.")?;
        Ok(Expr::Call(Box::new(callee), paren, args))
    }

    fn primary(&mut self) -> PResult<Expr> {
        use TokenKind::*;

        if self.matches(&[False]) {
            return Ok(Expr::Literal(LiteralValue::Bool(false)));
        }
        if self.matches(&[True]) {
            return Ok(Expr::Literal(LiteralValue::Bool(true)));
        }
        if self.matches(&[Nil]) {
            return Ok(Expr::Literal(LiteralValue::Nil));
        }
        if self.matches(&[Number]) {
            let Some(crate::token::Literal::Number(n)) = self.previous().literal.clone() else {
                unreachable!("number token always carries a numeric literal")
            };
            return Ok(Expr::Literal(LiteralValue::Number(n)));
        }
        if self.matches(&[String]) {
            let Some(crate::token::Literal::Str(s)) = self.previous().literal.clone() else {
                unreachable!("string token always carries a string literal")
            };
            return Ok(Expr::Literal(LiteralValue::Str(s)));
        }
        if self.matches(&[Symbol]) {
            let Some(crate::token::Literal::Symbol(name)) = self.previous().literal.clone() else {
                unreachable!("symbol token always carries a symbol literal")
            };
            return Ok(Expr::Symbol(name));
        }
        if self.matches(&[Rand, Read]) {
            return Ok(Expr::DynamicLiteral(self.previous().clone()));
        }
        if self.matches(&[Identifier]) {
            return Ok(Expr::Variable(self.previous().clone()));
        }
        if self.matches(&[LeftParen]) {
            let expr = self.expression()?;
            self.consume(RightParen, "Expect ')' after expression.")?;
            return Ok(Expr::Grouping(Box::new(expr)));
        }
        if matches!(self.peek().kind, Class | This | Super) {
            return Err(self.error("Classes are not supported."));
        }

        Err(self.error("Expect expression."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::printer::print as print_ast;

    fn parse(src: &str) -> (Vec<Stmt>, Session) {
        let mut session = Session::new();
        let tokens = Lexer::new(src).scan_tokens(&mut session);
        let statements = Parser::new(tokens, &mut session).parse();
        (statements, session)
    }

    #[test]
    fn precedence_matches_expected_shape() {
        let (stmts, session) = parse("1 + 2 * 3;");
        assert!(!session.had_parse_error);
        let Stmt::Expression(expr) = &stmts[0] else { panic!() };
        assert_eq!(print_ast(expr), "(1 + (2 * 3))");
    }

    #[test]
    fn call_left_associates() {
        let (stmts, session) = parse("f()()(x);");
        assert!(!session.had_parse_error);
        let Stmt::Expression(Expr::Call(callee, _, args)) = &stmts[0] else { panic!() };
        assert_eq!(args.len(), 1);
        assert!(matches!(**callee, Expr::Call(..)));
    }

    #[test]
    fn invalid_assignment_target_is_diagnostic_not_fatal() {
        let (stmts, session) = parse("1 = 2;");
        assert!(session.had_parse_error);
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn if_requires_brace_blocks() {
        let (_, session) = parse("if (true) print 1;");
        assert!(session.had_parse_error);
    }

    #[test]
    fn for_desugars_to_block_while() {
        let (stmts, session) = parse("for (var i = 0; i < 3; i = i + 1) print i;");
        assert!(!session.had_parse_error);
        assert!(matches!(stmts[0], Stmt::Block(_)));
    }

    #[test]
    fn synchronize_recovers_after_error() {
        let (stmts, session) = parse("var ; print 1;");
        assert!(session.had_parse_error);
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn class_keyword_is_parse_error() {
        let (_, session) = parse("class Foo {}");
        assert!(session.had_parse_error);
    }
}
