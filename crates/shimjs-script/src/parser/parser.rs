// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The recursive descent parser.

use crate::ast::*;
use crate::error::{Result, ScriptError};
use crate::lexer::{Scanner, Span, Token, TokenKind};
use crate::runtime::number_to_string;
use crate::stack::ensure_sufficient_stack;
use std::rc::Rc;

/// Deepest nesting of statements and expressions the parser accepts
pub const MAX_NESTING_DEPTH: usize = 1024;

/// A recursive descent parser for the script subset.
pub struct Parser<'a> {
    scanner: Scanner<'a>,
    current: Token,
    previous: Token,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given source code.
    pub fn new(source: &'a str) -> Self {
        let mut scanner = Scanner::new(source);
        let current = scanner.next_token();
        Self {
            scanner,
            current,
            previous: Token::new(TokenKind::Eof, Span::new(0, 0), false),
            depth: 0,
        }
    }

    /// Parses the source code into a Program AST node.
    pub fn parse_program(&mut self) -> Result<Program> {
        let mut body = Vec::new();

        while !self.is_at_end() {
            body.push(self.parse_statement()?);
        }

        Ok(Program { body })
    }

    /// Parses a single statement.
    pub fn parse_statement(&mut self) -> Result<Statement> {
        self.nested(Self::parse_statement_inner)
    }

    fn parse_statement_inner(&mut self) -> Result<Statement> {
        match &self.current.kind {
            TokenKind::Var | TokenKind::Let | TokenKind::Const => self.parse_variable_declaration(),
            TokenKind::Function => self.parse_function_declaration(),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::Throw => self.parse_throw_statement(),
            TokenKind::LeftBrace => {
                self.advance();
                let body = self.parse_block_body()?;
                self.expect(&TokenKind::RightBrace)?;
                Ok(Statement::Block(body))
            }
            TokenKind::Semicolon => {
                self.advance();
                Ok(Statement::Empty)
            }
            _ => {
                let expression = self.parse_expression()?;
                self.consume_semicolon()?;
                Ok(Statement::Expression(expression))
            }
        }
    }

    fn parse_variable_declaration(&mut self) -> Result<Statement> {
        let kind = match &self.current.kind {
            TokenKind::Var => VariableKind::Var,
            TokenKind::Let => VariableKind::Let,
            _ => VariableKind::Const,
        };
        self.advance();

        let mut declarations = Vec::new();

        loop {
            let name = self.expect_identifier()?;
            let init = if self.check(&TokenKind::Equal) {
                self.advance();
                Some(self.parse_assignment()?)
            } else if kind == VariableKind::Const {
                return Err(self.error_at_previous("Missing initializer in const declaration"));
            } else {
                None
            };

            declarations.push(VariableDeclarator { name, init });

            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }

        self.consume_semicolon()?;

        Ok(Statement::VariableDeclaration(VariableDeclaration {
            kind,
            declarations,
        }))
    }

    fn parse_function_declaration(&mut self) -> Result<Statement> {
        self.advance(); // consume 'function'
        let name = self.expect_identifier()?;
        let function = self.parse_function_rest(Some(name))?;
        Ok(Statement::FunctionDeclaration(function))
    }

    /// Parameters and body, after the name
    fn parse_function_rest(&mut self, name: Option<String>) -> Result<Rc<FunctionNode>> {
        self.expect(&TokenKind::LeftParen)?;

        let mut params = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                params.push(self.expect_identifier()?);
                if !self.check(&TokenKind::Comma) {
                    break;
                }
                self.advance();
            }
        }

        self.expect(&TokenKind::RightParen)?;
        self.expect(&TokenKind::LeftBrace)?;
        let body = self.parse_block_body()?;
        self.expect(&TokenKind::RightBrace)?;

        Ok(Rc::new(FunctionNode { name, params, body }))
    }

    fn parse_block_body(&mut self) -> Result<Vec<Statement>> {
        let mut body = Vec::new();

        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            body.push(self.parse_statement()?);
        }

        Ok(body)
    }

    fn parse_if_statement(&mut self) -> Result<Statement> {
        self.advance(); // consume 'if'
        self.expect(&TokenKind::LeftParen)?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RightParen)?;

        let consequent = Box::new(self.parse_statement()?);
        let alternate = if self.check(&TokenKind::Else) {
            self.advance();
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(Statement::If(IfStatement {
            test,
            consequent,
            alternate,
        }))
    }

    fn parse_return_statement(&mut self) -> Result<Statement> {
        self.advance(); // consume 'return'

        // No line terminator allowed between 'return' and its argument
        let argument = if self.check(&TokenKind::Semicolon)
            || self.check(&TokenKind::RightBrace)
            || self.is_at_end()
            || self.current.newline_before
        {
            None
        } else {
            Some(self.parse_expression()?)
        };

        self.consume_semicolon()?;
        Ok(Statement::Return(argument))
    }

    fn parse_throw_statement(&mut self) -> Result<Statement> {
        self.advance(); // consume 'throw'
        if self.current.newline_before {
            return Err(self.error_at_current("Illegal newline after throw"));
        }
        let argument = self.parse_expression()?;
        self.consume_semicolon()?;
        Ok(Statement::Throw(argument))
    }

    // ==================== Expressions ====================

    /// Parses a full expression.
    pub fn parse_expression(&mut self) -> Result<Expression> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expression> {
        self.nested(Self::parse_assignment_inner)
    }

    fn parse_assignment_inner(&mut self) -> Result<Expression> {
        let target = self.parse_conditional()?;

        let operator = match &self.current.kind {
            TokenKind::Equal => AssignOperator::Assign,
            TokenKind::PlusEqual => AssignOperator::Add,
            TokenKind::MinusEqual => AssignOperator::Subtract,
            TokenKind::StarEqual => AssignOperator::Multiply,
            TokenKind::SlashEqual => AssignOperator::Divide,
            TokenKind::PercentEqual => AssignOperator::Remainder,
            _ => return Ok(target),
        };

        if !matches!(target, Expression::Identifier(_) | Expression::Member(_)) {
            return Err(self.error_at_current("Invalid left-hand side in assignment"));
        }
        self.advance();

        // Right-associative
        let value = self.parse_assignment()?;
        Ok(Expression::Assign(AssignExpression {
            operator,
            target: Box::new(target),
            value: Box::new(value),
        }))
    }

    fn parse_conditional(&mut self) -> Result<Expression> {
        let test = self.parse_logical_or()?;

        if !self.check(&TokenKind::Question) {
            return Ok(test);
        }
        self.advance();

        let consequent = self.parse_assignment()?;
        self.expect(&TokenKind::Colon)?;
        let alternate = self.parse_assignment()?;

        Ok(Expression::Conditional(ConditionalExpression {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        }))
    }

    fn parse_logical_or(&mut self) -> Result<Expression> {
        let mut left = self.parse_logical_and()?;

        while self.check(&TokenKind::PipePipe) {
            self.advance();
            let right = self.parse_logical_and()?;
            left = Expression::Logical(LogicalExpression {
                operator: LogicalOperator::Or,
                left: Box::new(left),
                right: Box::new(right),
            });
        }

        Ok(left)
    }

    fn parse_logical_and(&mut self) -> Result<Expression> {
        let mut left = self.parse_equality()?;

        while self.check(&TokenKind::AmpersandAmpersand) {
            self.advance();
            let right = self.parse_equality()?;
            left = Expression::Logical(LogicalExpression {
                operator: LogicalOperator::And,
                left: Box::new(left),
                right: Box::new(right),
            });
        }

        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expression> {
        let mut left = self.parse_relational()?;

        loop {
            let operator = match &self.current.kind {
                TokenKind::EqualEqual => BinaryOperator::Equal,
                TokenKind::BangEqual => BinaryOperator::NotEqual,
                TokenKind::EqualEqualEqual => BinaryOperator::StrictEqual,
                TokenKind::BangEqualEqual => BinaryOperator::StrictNotEqual,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational()?;
            left = binary(operator, left, right);
        }

        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Expression> {
        let mut left = self.parse_additive()?;

        loop {
            let operator = match &self.current.kind {
                TokenKind::LessThan => BinaryOperator::LessThan,
                TokenKind::LessThanEqual => BinaryOperator::LessThanEqual,
                TokenKind::GreaterThan => BinaryOperator::GreaterThan,
                TokenKind::GreaterThanEqual => BinaryOperator::GreaterThanEqual,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = binary(operator, left, right);
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expression> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let operator = match &self.current.kind {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Subtract,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(operator, left, right);
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expression> {
        let mut left = self.parse_unary()?;

        loop {
            let operator = match &self.current.kind {
                TokenKind::Star => BinaryOperator::Multiply,
                TokenKind::Slash => BinaryOperator::Divide,
                TokenKind::Percent => BinaryOperator::Remainder,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binary(operator, left, right);
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expression> {
        let operator = match &self.current.kind {
            TokenKind::Bang => UnaryOperator::Not,
            TokenKind::Minus => UnaryOperator::Minus,
            TokenKind::Plus => UnaryOperator::Plus,
            TokenKind::Typeof => UnaryOperator::Typeof,
            _ => return self.parse_call_member(),
        };
        self.advance();

        let argument = self.nested(Self::parse_unary)?;
        Ok(Expression::Unary(UnaryExpression {
            operator,
            argument: Box::new(argument),
        }))
    }

    fn parse_call_member(&mut self) -> Result<Expression> {
        let mut expr = self.parse_primary()?;

        loop {
            match &self.current.kind {
                TokenKind::Dot => {
                    self.advance();
                    let name = self.expect_property_name()?;
                    expr = Expression::Member(MemberExpression {
                        object: Box::new(expr),
                        property: MemberProperty::Named(name),
                    });
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    let property = self.parse_expression()?;
                    self.expect(&TokenKind::RightBracket)?;
                    expr = Expression::Member(MemberExpression {
                        object: Box::new(expr),
                        property: MemberProperty::Computed(Box::new(property)),
                    });
                }
                TokenKind::LeftParen => {
                    self.advance();
                    let arguments = self.parse_arguments()?;
                    expr = Expression::Call(CallExpression {
                        callee: Box::new(expr),
                        arguments,
                    });
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expression>> {
        let mut arguments = Vec::new();

        while !self.check(&TokenKind::RightParen) {
            arguments.push(self.parse_assignment()?);
            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }

        self.expect(&TokenKind::RightParen)?;
        Ok(arguments)
    }

    fn parse_primary(&mut self) -> Result<Expression> {
        let expr = match &self.current.kind {
            TokenKind::Number(n) => Expression::Number(*n),
            TokenKind::String(s) => Expression::String(s.clone()),
            TokenKind::True => Expression::Boolean(true),
            TokenKind::False => Expression::Boolean(false),
            TokenKind::Null => Expression::Null,
            TokenKind::This => Expression::This,
            TokenKind::Identifier(name) => Expression::Identifier(name.clone()),
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(&TokenKind::RightParen)?;
                return Ok(expr);
            }
            TokenKind::LeftBracket => return self.parse_array_literal(),
            TokenKind::LeftBrace => return self.parse_object_literal(),
            TokenKind::Function => {
                self.advance();
                let name = match &self.current.kind {
                    TokenKind::Identifier(name) => {
                        let name = name.clone();
                        self.advance();
                        Some(name)
                    }
                    _ => None,
                };
                return Ok(Expression::Function(self.parse_function_rest(name)?));
            }
            _ => return Err(self.unexpected()),
        };
        self.advance();
        Ok(expr)
    }

    fn parse_array_literal(&mut self) -> Result<Expression> {
        self.advance(); // consume '['
        let mut elements = Vec::new();

        while !self.check(&TokenKind::RightBracket) {
            elements.push(self.parse_assignment()?);
            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }

        self.expect(&TokenKind::RightBracket)?;
        Ok(Expression::Array(elements))
    }

    fn parse_object_literal(&mut self) -> Result<Expression> {
        self.advance(); // consume '{'
        let mut properties = Vec::new();

        while !self.check(&TokenKind::RightBrace) {
            let key = match &self.current.kind {
                TokenKind::String(s) => {
                    let key = s.clone();
                    self.advance();
                    key
                }
                TokenKind::Number(n) => {
                    let key = number_to_string(*n);
                    self.advance();
                    key
                }
                _ => self.expect_property_name()?,
            };
            self.expect(&TokenKind::Colon)?;
            properties.push((key, self.parse_assignment()?));

            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }

        self.expect(&TokenKind::RightBrace)?;
        Ok(Expression::Object(properties))
    }

    // ==================== Helpers ====================

    fn advance(&mut self) {
        let next = self.scanner.next_token();
        self.previous = std::mem::replace(&mut self.current, next);
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.current.kind == kind
    }

    fn is_at_end(&self) -> bool {
        self.current.kind == TokenKind::Eof
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<()> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.error_at_current(&format!("Expected {} but found {}", kind, self.current.kind)))
        }
    }

    fn expect_identifier(&mut self) -> Result<String> {
        match &self.current.kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected()),
        }
    }

    /// Identifier or keyword after `.` or as an object key
    fn expect_property_name(&mut self) -> Result<String> {
        if let Some(text) = self.current.kind.keyword_text() {
            self.advance();
            return Ok(text.to_string());
        }
        self.expect_identifier()
    }

    /// Automatic semicolon insertion, restricted to the common cases
    fn consume_semicolon(&mut self) -> Result<()> {
        if self.check(&TokenKind::Semicolon) {
            self.advance();
            return Ok(());
        }
        if self.check(&TokenKind::RightBrace) || self.is_at_end() || self.current.newline_before {
            return Ok(());
        }
        Err(self.unexpected())
    }

    fn unexpected(&self) -> ScriptError {
        let message = match &self.current.kind {
            TokenKind::UnterminatedString => "Invalid or unexpected token".to_string(),
            TokenKind::Eof => "Unexpected end of input".to_string(),
            other => format!("Unexpected {}", other),
        };
        self.error_at_current(&message)
    }

    /// Runs one level of recursive descent, bounded by [`MAX_NESTING_DEPTH`]
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.error_at_current("Nesting too deep"));
        }
        self.depth += 1;
        let result = ensure_sufficient_stack(|| parse(self));
        self.depth -= 1;
        result
    }

    fn error_at_current(&self, message: &str) -> ScriptError {
        self.error_at(self.current.span.start, message)
    }

    fn error_at_previous(&self, message: &str) -> ScriptError {
        self.error_at(self.previous.span.start, message)
    }

    fn error_at(&self, offset: usize, message: &str) -> ScriptError {
        let (line, column) = line_column(self.scanner.source(), offset);
        ScriptError::Syntax {
            message: message.to_string(),
            line,
            column,
        }
    }
}

fn binary(operator: BinaryOperator, left: Expression, right: Expression) -> Expression {
    Expression::Binary(BinaryExpression {
        operator,
        left: Box::new(left),
        right: Box::new(right),
    })
}

/// 1-based line and column of a byte offset
fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let before = &source[..offset.min(source.len())];
    let line = before.matches('\n').count() + 1;
    let column = before
        .rfind('\n')
        .map_or(before.chars().count(), |pos| before[pos + 1..].chars().count())
        + 1;
    (line, column)
}
