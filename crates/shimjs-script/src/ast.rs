// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Abstract syntax tree for the supported script subset.

use std::rc::Rc;

/// A complete script or module body.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// The statements in the program
    pub body: Vec<Statement>,
}

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Variable declaration (var, let, const)
    VariableDeclaration(VariableDeclaration),
    /// Function declaration, hoisted to the top of its block
    FunctionDeclaration(Rc<FunctionNode>),
    /// Expression statement
    Expression(Expression),
    /// Block statement { ... }
    Block(Vec<Statement>),
    /// If statement
    If(IfStatement),
    /// Return statement
    Return(Option<Expression>),
    /// Throw statement
    Throw(Expression),
    /// Empty statement (;)
    Empty,
}

/// Variable declaration kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    /// var declaration
    Var,
    /// let declaration
    Let,
    /// const declaration
    Const,
}

/// A variable declaration statement.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    /// The kind of declaration
    pub kind: VariableKind,
    /// The declarators
    pub declarations: Vec<VariableDeclarator>,
}

/// A single variable declarator.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclarator {
    /// The name being declared
    pub name: String,
    /// Optional initializer expression
    pub init: Option<Expression>,
}

/// A function declaration or expression.
///
/// Shared by every closure created from it.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionNode {
    /// The function name, if any
    pub name: Option<String>,
    /// Parameter names
    pub params: Vec<String>,
    /// The function body
    pub body: Vec<Statement>,
}

/// An if statement.
#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    /// The condition
    pub test: Expression,
    /// Taken when the condition is truthy
    pub consequent: Box<Statement>,
    /// The else branch
    pub alternate: Option<Box<Statement>>,
}

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Number literal
    Number(f64),
    /// String literal
    String(String),
    /// Boolean literal
    Boolean(bool),
    /// null
    Null,
    /// Identifier reference
    Identifier(String),
    /// this
    This,
    /// Array literal [a, b]
    Array(Vec<Expression>),
    /// Object literal { key: value }
    Object(Vec<(String, Expression)>),
    /// Function expression
    Function(Rc<FunctionNode>),
    /// Member access a.b or a[b]
    Member(MemberExpression),
    /// Call f(args)
    Call(CallExpression),
    /// Assignment a = b, a += b
    Assign(AssignExpression),
    /// Arithmetic, comparison or equality
    Binary(BinaryExpression),
    /// Short-circuit && and ||
    Logical(LogicalExpression),
    /// Prefix operator
    Unary(UnaryExpression),
    /// test ? consequent : alternate
    Conditional(ConditionalExpression),
}

/// The property part of a member expression.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberProperty {
    /// a.name
    Named(String),
    /// a[expr]
    Computed(Box<Expression>),
}

/// Member expression.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberExpression {
    /// The object
    pub object: Box<Expression>,
    /// The property
    pub property: MemberProperty,
}

/// Call expression.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpression {
    /// The callee
    pub callee: Box<Expression>,
    /// The arguments
    pub arguments: Vec<Expression>,
}

/// Assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOperator {
    /// =
    Assign,
    /// +=
    Add,
    /// -=
    Subtract,
    /// *=
    Multiply,
    /// /=
    Divide,
    /// %=
    Remainder,
}

impl AssignOperator {
    /// The binary operator a compound assignment applies
    pub fn binary(self) -> Option<BinaryOperator> {
        match self {
            AssignOperator::Assign => None,
            AssignOperator::Add => Some(BinaryOperator::Add),
            AssignOperator::Subtract => Some(BinaryOperator::Subtract),
            AssignOperator::Multiply => Some(BinaryOperator::Multiply),
            AssignOperator::Divide => Some(BinaryOperator::Divide),
            AssignOperator::Remainder => Some(BinaryOperator::Remainder),
        }
    }
}

/// Assignment expression.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignExpression {
    /// The operator
    pub operator: AssignOperator,
    /// Identifier or member expression
    pub target: Box<Expression>,
    /// The assigned value
    pub value: Box<Expression>,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    Equal,
    NotEqual,
    StrictEqual,
    StrictNotEqual,
}

/// Binary expression.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression {
    /// The operator
    pub operator: BinaryOperator,
    /// Left operand
    pub left: Box<Expression>,
    /// Right operand
    pub right: Box<Expression>,
}

/// Logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    /// &&
    And,
    /// ||
    Or,
}

/// Logical expression.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalExpression {
    /// The operator
    pub operator: LogicalOperator,
    /// Left operand
    pub left: Box<Expression>,
    /// Right operand, evaluated only when needed
    pub right: Box<Expression>,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// !
    Not,
    /// -
    Minus,
    /// +
    Plus,
    /// typeof
    Typeof,
}

/// Unary expression.
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpression {
    /// The operator
    pub operator: UnaryOperator,
    /// The operand
    pub argument: Box<Expression>,
}

/// Conditional expression.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalExpression {
    /// The condition
    pub test: Box<Expression>,
    /// Value when truthy
    pub consequent: Box<Expression>,
    /// Value when falsy
    pub alternate: Box<Expression>,
}
