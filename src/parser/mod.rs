pub mod ast;

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::lexer::Scanner;
use crate::token::TokenKind;
use ast::{BlockStmt, Expr, Ident, Infix, Literal, Prefix, Program, Stmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    /// `==`, `!=`, `===`
    Equals,
    /// `<`, `>`, `<=`, `>=`
    LessGreater,
    /// `+`, `-`
    Sum,
    /// `*`, `/`
    Product,
    /// `-x`, `!x`
    Prefix,
    /// `fn(…)`
    Call,
    /// `array[index]`
    Index,
}

static PRECEDENCES: Lazy<HashMap<TokenKind, Precedence>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert(TokenKind::Equal, Precedence::Equals);
    m.insert(TokenKind::NotEqual, Precedence::Equals);
    m.insert(TokenKind::StrictEqual, Precedence::Equals);
    m.insert(TokenKind::Less, Precedence::LessGreater);
    m.insert(TokenKind::Greater, Precedence::LessGreater);
    m.insert(TokenKind::LessEqual, Precedence::LessGreater);
    m.insert(TokenKind::GreaterEqual, Precedence::LessGreater);
    m.insert(TokenKind::Plus, Precedence::Sum);
    m.insert(TokenKind::Minus, Precedence::Sum);
    m.insert(TokenKind::Star, Precedence::Product);
    m.insert(TokenKind::Slash, Precedence::Product);
    m.insert(TokenKind::LeftParen, Precedence::Call);
    m.insert(TokenKind::LeftBracket, Precedence::Index);
    m
});

type PrefixParseFn = fn(&mut Parser) -> Option<Expr>;
type InfixParseFn = fn(&mut Parser, Expr) -> Option<Expr>;

pub struct Parser {
    scanner: Scanner,
    errors: Vec<String>,
    prefix_parse_fns: HashMap<TokenKind, PrefixParseFn>,
    infix_parse_fns: HashMap<TokenKind, InfixParseFn>,
}

impl Parser {
    pub fn new(scanner: Scanner) -> Self {
        let mut parser = Parser {
            scanner,
            errors: Vec::new(),
            prefix_parse_fns: HashMap::new(),
            infix_parse_fns: HashMap::new(),
        };

        parser.register_prefix(TokenKind::Identifier, Parser::parse_identifier);
        parser.register_prefix(TokenKind::Number, Parser::parse_number_literal);
        parser.register_prefix(TokenKind::String, Parser::parse_string_literal);
        parser.register_prefix(TokenKind::True, Parser::parse_boolean);
        parser.register_prefix(TokenKind::False, Parser::parse_boolean);
        parser.register_prefix(TokenKind::Bang, Parser::parse_prefix_expression);
        parser.register_prefix(TokenKind::Minus, Parser::parse_prefix_expression);
        parser.register_prefix(TokenKind::LeftParen, Parser::parse_grouped_expression);
        parser.register_prefix(TokenKind::If, Parser::parse_if_expression);
        parser.register_prefix(TokenKind::Function, Parser::parse_function_literal);
        parser.register_prefix(TokenKind::LeftBracket, Parser::parse_array_literal);
        parser.register_prefix(TokenKind::LeftBrace, Parser::parse_object_literal);

        for kind in [
            TokenKind::Plus,
            TokenKind::Minus,
            TokenKind::Star,
            TokenKind::Slash,
            TokenKind::Equal,
            TokenKind::NotEqual,
            TokenKind::Less,
            TokenKind::Greater,
            TokenKind::LessEqual,
            TokenKind::GreaterEqual,
        ] {
            parser.register_infix(kind, Parser::parse_infix_expression);
        }
        parser.register_infix(TokenKind::LeftParen, Parser::parse_call_expression);
        parser.register_infix(TokenKind::LeftBracket, Parser::parse_index_expression);

        parser
    }

    fn register_prefix(&mut self, kind: TokenKind, func: PrefixParseFn) {
        self.prefix_parse_fns.insert(kind, func);
    }

    fn register_infix(&mut self, kind: TokenKind, func: InfixParseFn) {
        self.infix_parse_fns.insert(kind, func);
    }

    pub fn parse(&mut self) -> Program {
        let mut program = Program::new();
        while !self.scanner.at_end() {
            if let Some(stmt) = self.parse_statement() {
                program.push(stmt);
            }
            self.advance();
        }
        program
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    // MARK: Cursor

    fn advance(&mut self) {
        self.scanner.advance();
    }

    fn cur_literal(&self) -> String {
        self.scanner.current().literal.clone()
    }

    fn cur_kind(&self) -> TokenKind {
        self.scanner.current().kind
    }

    fn peek_kind(&self) -> TokenKind {
        self.scanner.peek().kind
    }

    fn cur_is(&self, kind: TokenKind) -> bool {
        self.cur_kind() == kind
    }

    fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn expect_peek(&mut self, kind: TokenKind) -> bool {
        if self.peek_is(kind) {
            self.advance();
            true
        } else {
            self.peek_error(kind);
            false
        }
    }

    fn cur_precedence(&self) -> Precedence {
        *PRECEDENCES.get(&self.cur_kind()).unwrap_or(&Precedence::Lowest)
    }

    fn peek_precedence(&self) -> Precedence {
        *PRECEDENCES
            .get(&self.peek_kind())
            .unwrap_or(&Precedence::Lowest)
    }

    // MARK: Errors

    fn peek_error(&mut self, kind: TokenKind) {
        self.errors.push(format!(
            "expected match token {:?}, got {:?}",
            kind,
            self.peek_kind()
        ));
    }

    fn no_prefix_parse_fn_error(&mut self, kind: TokenKind) {
        self.errors
            .push(format!("no prefix parse function for {:?} found", kind));
    }

    // MARK: Statements

    fn parse_statement(&mut self) -> Option<Stmt> {
        match self.cur_kind() {
            TokenKind::Let | TokenKind::Const | TokenKind::Var => self.parse_let_statement(),
            TokenKind::Return => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> Option<Stmt> {
        if !self.expect_peek(TokenKind::Identifier) {
            return None;
        }
        let name = self.cur_literal();

        if !self.expect_peek(TokenKind::Assign) {
            return None;
        }
        self.advance();

        let mut value = self.parse_expression(Precedence::Lowest)?;
        // Let the function body refer to its own binding.
        if let Expr::Function { name: fn_name, .. } = &mut value {
            *fn_name = Some(name.clone());
        }

        if self.peek_is(TokenKind::Semicolon) {
            self.advance();
        }
        Some(Stmt::Let(Ident(name), value))
    }

    fn parse_return_statement(&mut self) -> Option<Stmt> {
        self.advance();
        let value = self.parse_expression(Precedence::Lowest)?;
        if self.peek_is(TokenKind::Semicolon) {
            self.advance();
        }
        Some(Stmt::Return(value))
    }

    fn parse_expression_statement(&mut self) -> Option<Stmt> {
        let expr = self.parse_expression(Precedence::Lowest)?;
        if self.peek_is(TokenKind::Semicolon) {
            self.advance();
        }
        Some(Stmt::Expr(expr))
    }

    // MARK: Expressions

    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expr> {
        let prefix = match self.prefix_parse_fns.get(&self.cur_kind()) {
            Some(func) => *func,
            None => {
                self.no_prefix_parse_fn_error(self.cur_kind());
                return None;
            }
        };
        let mut left = prefix(self)?;

        while !self.peek_is(TokenKind::Semicolon) && precedence < self.peek_precedence() {
            let infix = match self.infix_parse_fns.get(&self.peek_kind()) {
                Some(func) => *func,
                None => return Some(left),
            };
            self.advance();
            left = infix(self, left)?;
        }

        Some(left)
    }

    fn parse_identifier(&mut self) -> Option<Expr> {
        Some(Expr::Ident(Ident(self.cur_literal())))
    }

    fn parse_number_literal(&mut self) -> Option<Expr> {
        match self.cur_literal().parse::<i64>() {
            Ok(value) => Some(Expr::Lit(Literal::Int(value))),
            Err(_) => {
                self.errors
                    .push(format!("could not parse {} as integer", self.cur_literal()));
                None
            }
        }
    }

    fn parse_string_literal(&mut self) -> Option<Expr> {
        Some(Expr::Lit(Literal::String(self.cur_literal())))
    }

    fn parse_boolean(&mut self) -> Option<Expr> {
        Some(Expr::Lit(Literal::Bool(self.cur_is(TokenKind::True))))
    }

    fn parse_prefix_expression(&mut self) -> Option<Expr> {
        let op = match self.cur_kind() {
            TokenKind::Bang => Prefix::Not,
            _ => Prefix::Minus,
        };
        self.advance();
        let right = self.parse_expression(Precedence::Prefix)?;
        Some(Expr::Prefix(op, Box::new(right)))
    }

    fn parse_infix_expression(&mut self, left: Expr) -> Option<Expr> {
        let op = match self.cur_kind() {
            TokenKind::Plus => Infix::Plus,
            TokenKind::Minus => Infix::Minus,
            TokenKind::Star => Infix::Multiply,
            TokenKind::Slash => Infix::Divide,
            TokenKind::Greater => Infix::GreaterThan,
            TokenKind::GreaterEqual => Infix::GreaterThanEqual,
            TokenKind::Less => Infix::LessThan,
            TokenKind::LessEqual => Infix::LessThanEqual,
            TokenKind::Equal => Infix::Equal,
            TokenKind::NotEqual => Infix::NotEqual,
            kind => {
                self.errors
                    .push(format!("unknown infix operator {:?}", kind));
                return None;
            }
        };
        let precedence = self.cur_precedence();
        self.advance();
        let right = self.parse_expression(precedence)?;
        Some(Expr::Infix(op, Box::new(left), Box::new(right)))
    }

    fn parse_grouped_expression(&mut self) -> Option<Expr> {
        self.advance();
        let expr = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::RightParen) {
            return None;
        }
        Some(expr)
    }

    fn parse_if_expression(&mut self) -> Option<Expr> {
        if !self.expect_peek(TokenKind::LeftParen) {
            return None;
        }
        self.advance();
        let cond = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::RightParen) {
            return None;
        }
        if !self.expect_peek(TokenKind::LeftBrace) {
            return None;
        }
        let consequence = self.parse_block_statement();

        let mut alternative = None;
        if self.peek_is(TokenKind::Else) {
            self.advance();
            if !self.expect_peek(TokenKind::LeftBrace) {
                return None;
            }
            alternative = Some(self.parse_block_statement());
        }

        Some(Expr::If {
            cond: Box::new(cond),
            consequence,
            alternative,
        })
    }

    fn parse_block_statement(&mut self) -> BlockStmt {
        let mut block = BlockStmt::new();
        self.advance();
        while !self.cur_is(TokenKind::RightBrace) && !self.cur_is(TokenKind::Eof) {
            if let Some(stmt) = self.parse_statement() {
                block.push(stmt);
            }
            self.advance();
        }
        block
    }

    fn parse_function_literal(&mut self) -> Option<Expr> {
        // Anonymous unless a name follows the keyword.
        let mut name = None;
        if self.peek_is(TokenKind::Identifier) {
            self.advance();
            name = Some(self.cur_literal());
        }

        if !self.expect_peek(TokenKind::LeftParen) {
            return None;
        }
        let params = self.parse_function_parameters()?;
        if !self.expect_peek(TokenKind::LeftBrace) {
            return None;
        }
        let body = self.parse_block_statement();

        Some(Expr::Function { name, params, body })
    }

    fn parse_function_parameters(&mut self) -> Option<Vec<Ident>> {
        let mut params = Vec::new();

        if self.peek_is(TokenKind::RightParen) {
            self.advance();
            return Some(params);
        }

        if !self.expect_peek(TokenKind::Identifier) {
            return None;
        }
        params.push(Ident(self.cur_literal()));

        while self.peek_is(TokenKind::Comma) {
            self.advance();
            if !self.expect_peek(TokenKind::Identifier) {
                return None;
            }
            params.push(Ident(self.cur_literal()));
        }

        if !self.expect_peek(TokenKind::RightParen) {
            return None;
        }
        Some(params)
    }

    fn parse_array_literal(&mut self) -> Option<Expr> {
        let elements = self.parse_expression_list(TokenKind::RightBracket)?;
        Some(Expr::Lit(Literal::Array(elements)))
    }

    fn parse_object_literal(&mut self) -> Option<Expr> {
        let mut pairs = Vec::new();

        while !self.peek_is(TokenKind::RightBrace) {
            self.advance();
            // A bare identifier key means its name, as in JS: {a: 1} is
            // {"a": 1}. Every other key form is a full expression.
            let key = if self.cur_is(TokenKind::Identifier) && self.peek_is(TokenKind::Colon) {
                Expr::Lit(Literal::String(self.cur_literal()))
            } else {
                self.parse_expression(Precedence::Lowest)?
            };

            if !self.expect_peek(TokenKind::Colon) {
                return None;
            }
            self.advance();
            let value = self.parse_expression(Precedence::Lowest)?;
            pairs.push((key, value));

            if !self.peek_is(TokenKind::RightBrace) && !self.expect_peek(TokenKind::Comma) {
                return None;
            }
        }

        if !self.expect_peek(TokenKind::RightBrace) {
            return None;
        }
        Some(Expr::Lit(Literal::Hash(pairs)))
    }

    fn parse_expression_list(&mut self, end: TokenKind) -> Option<Vec<Expr>> {
        let mut list = Vec::new();

        if self.peek_is(end) {
            self.advance();
            return Some(list);
        }

        self.advance();
        list.push(self.parse_expression(Precedence::Lowest)?);

        while self.peek_is(TokenKind::Comma) {
            self.advance();
            self.advance();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }

        if !self.expect_peek(end) {
            return None;
        }
        Some(list)
    }

    fn parse_call_expression(&mut self, function: Expr) -> Option<Expr> {
        let arguments = self.parse_expression_list(TokenKind::RightParen)?;
        Some(Expr::Call {
            function: Box::new(function),
            arguments,
        })
    }

    fn parse_index_expression(&mut self, left: Expr) -> Option<Expr> {
        self.advance();
        let index = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::RightBracket) {
            return None;
        }
        Some(Expr::Index(Box::new(left), Box::new(index)))
    }
}
