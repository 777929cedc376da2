// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Token definitions for the script lexer.

use std::fmt;

/// A span in the source code, representing a range of bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
}

impl Span {
    /// Creates a new span.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns the length of this span in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns true if this span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The span in the source code
    pub span: Span,
    /// Whether a line terminator precedes this token
    pub newline_before: bool,
}

impl Token {
    /// Creates a new token.
    pub fn new(kind: TokenKind, span: Span, newline_before: bool) -> Self {
        Self {
            kind,
            span,
            newline_before,
        }
    }
}

/// The different kinds of tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    /// Numeric literal
    Number(f64),
    /// String literal (escapes already processed)
    String(String),
    /// Identifier
    Identifier(String),
    True,
    False,
    Null,

    // Keywords
    Const,
    Else,
    Function,
    If,
    Let,
    Return,
    This,
    Throw,
    Typeof,
    Var,

    // Punctuation
    /// {
    LeftBrace,
    /// }
    RightBrace,
    /// (
    LeftParen,
    /// )
    RightParen,
    /// [
    LeftBracket,
    /// ]
    RightBracket,
    /// ;
    Semicolon,
    /// ,
    Comma,
    /// :
    Colon,
    /// .
    Dot,
    /// ?
    Question,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Equal,
    PlusEqual,
    MinusEqual,
    StarEqual,
    SlashEqual,
    PercentEqual,
    EqualEqual,
    EqualEqualEqual,
    BangEqual,
    BangEqualEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    AmpersandAmpersand,
    PipePipe,

    /// Unterminated string
    UnterminatedString,
    /// Unrecognized character
    Invalid(char),
    /// End of input
    Eof,
}

impl TokenKind {
    /// Keyword for an identifier-shaped word, if it is one
    pub fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "const" => TokenKind::Const,
            "else" => TokenKind::Else,
            "false" => TokenKind::False,
            "function" => TokenKind::Function,
            "if" => TokenKind::If,
            "let" => TokenKind::Let,
            "null" => TokenKind::Null,
            "return" => TokenKind::Return,
            "this" => TokenKind::This,
            "throw" => TokenKind::Throw,
            "true" => TokenKind::True,
            "typeof" => TokenKind::Typeof,
            "var" => TokenKind::Var,
            _ => return None,
        };
        Some(kind)
    }

    /// The source spelling of a keyword, for use as a property name
    pub fn keyword_text(&self) -> Option<&'static str> {
        let text = match self {
            TokenKind::Const => "const",
            TokenKind::Else => "else",
            TokenKind::False => "false",
            TokenKind::Function => "function",
            TokenKind::If => "if",
            TokenKind::Let => "let",
            TokenKind::Null => "null",
            TokenKind::Return => "return",
            TokenKind::This => "this",
            TokenKind::Throw => "throw",
            TokenKind::True => "true",
            TokenKind::Typeof => "typeof",
            TokenKind::Var => "var",
            _ => return None,
        };
        Some(text)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(text) = self.keyword_text() {
            return write!(f, "{}", text);
        }
        let text = match self {
            TokenKind::Number(n) => return write!(f, "number {}", n),
            TokenKind::String(s) => return write!(f, "string \"{}\"", s),
            TokenKind::Identifier(name) => return write!(f, "identifier '{}'", name),
            TokenKind::Invalid(ch) => return write!(f, "character '{}'", ch),
            TokenKind::UnterminatedString => "unterminated string",
            TokenKind::Eof => "end of input",
            TokenKind::LeftBrace => "{",
            TokenKind::RightBrace => "}",
            TokenKind::LeftParen => "(",
            TokenKind::RightParen => ")",
            TokenKind::LeftBracket => "[",
            TokenKind::RightBracket => "]",
            TokenKind::Semicolon => ";",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::Dot => ".",
            TokenKind::Question => "?",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Bang => "!",
            TokenKind::Equal => "=",
            TokenKind::PlusEqual => "+=",
            TokenKind::MinusEqual => "-=",
            TokenKind::StarEqual => "*=",
            TokenKind::SlashEqual => "/=",
            TokenKind::PercentEqual => "%=",
            TokenKind::EqualEqual => "==",
            TokenKind::EqualEqualEqual => "===",
            TokenKind::BangEqual => "!=",
            TokenKind::BangEqualEqual => "!==",
            TokenKind::LessThan => "<",
            TokenKind::LessThanEqual => "<=",
            TokenKind::GreaterThan => ">",
            TokenKind::GreaterThanEqual => ">=",
            TokenKind::AmpersandAmpersand => "&&",
            TokenKind::PipePipe => "||",
            _ => "token",
        };
        write!(f, "{}", text)
    }
}
