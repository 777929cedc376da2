// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The scanner that produces tokens from source text.

use super::{Span, Token, TokenKind};

/// A scanner that tokenizes script source code.
pub struct Scanner<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    current_pos: usize,
    newline_before: bool,
}

impl<'a> Scanner<'a> {
    /// Creates a new scanner for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            current_pos: 0,
            newline_before: false,
        }
    }

    /// The source being scanned.
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Returns the next token from the source.
    pub fn next_token(&mut self) -> Token {
        self.newline_before = false;
        self.skip_whitespace_and_comments();

        let start = self.current_pos;
        let newline_before = self.newline_before;

        let Some((_pos, ch)) = self.advance() else {
            return Token::new(TokenKind::Eof, Span::new(start, start), newline_before);
        };

        let kind = match ch {
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '?' => TokenKind::Question,

            '.' => match self.peek() {
                Some('0'..='9') => self.scan_number(ch),
                _ => TokenKind::Dot,
            },
            '+' => self.with_equal(TokenKind::Plus, TokenKind::PlusEqual),
            '-' => self.with_equal(TokenKind::Minus, TokenKind::MinusEqual),
            '*' => self.with_equal(TokenKind::Star, TokenKind::StarEqual),
            '/' => self.with_equal(TokenKind::Slash, TokenKind::SlashEqual),
            '%' => self.with_equal(TokenKind::Percent, TokenKind::PercentEqual),
            '<' => self.with_equal(TokenKind::LessThan, TokenKind::LessThanEqual),
            '>' => self.with_equal(TokenKind::GreaterThan, TokenKind::GreaterThanEqual),
            '=' => self.scan_equal(),
            '!' => self.scan_bang(),
            '&' if self.matches('&') => TokenKind::AmpersandAmpersand,
            '|' if self.matches('|') => TokenKind::PipePipe,

            '"' | '\'' => self.scan_string(ch),
            '0'..='9' => self.scan_number(ch),
            _ if is_id_start(ch) => self.scan_identifier(start),

            _ => TokenKind::Invalid(ch),
        };

        Token::new(kind, Span::new(start, self.current_pos), newline_before)
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let result = self.chars.next();
        if let Some((pos, ch)) = result {
            self.current_pos = pos + ch.len_utf8();
        }
        result
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    fn peek_next(&self) -> Option<char> {
        let mut iter = self.chars.clone();
        iter.next();
        iter.next().map(|(_, ch)| ch)
    }

    fn matches(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some('\n' | '\r' | '\u{2028}' | '\u{2029}') => {
                    self.newline_before = true;
                    self.advance();
                }
                Some(ch) if ch.is_whitespace() || ch == '\u{feff}' => {
                    self.advance();
                }
                Some('/') => match self.peek_next() {
                    Some('/') => {
                        while let Some(ch) = self.peek() {
                            if ch == '\n' || ch == '\r' {
                                break;
                            }
                            self.advance();
                        }
                    }
                    Some('*') => {
                        self.advance();
                        self.advance();
                        let mut prev = ' ';
                        while let Some((_, ch)) = self.advance() {
                            if ch == '\n' || ch == '\r' {
                                self.newline_before = true;
                            }
                            if prev == '*' && ch == '/' {
                                break;
                            }
                            prev = ch;
                        }
                    }
                    _ => break,
                },
                _ => break,
            }
        }
    }

    fn with_equal(&mut self, plain: TokenKind, assign: TokenKind) -> TokenKind {
        if self.matches('=') { assign } else { plain }
    }

    fn scan_equal(&mut self) -> TokenKind {
        if self.matches('=') {
            if self.matches('=') {
                TokenKind::EqualEqualEqual
            } else {
                TokenKind::EqualEqual
            }
        } else {
            TokenKind::Equal
        }
    }

    fn scan_bang(&mut self) -> TokenKind {
        if self.matches('=') {
            if self.matches('=') {
                TokenKind::BangEqualEqual
            } else {
                TokenKind::BangEqual
            }
        } else {
            TokenKind::Bang
        }
    }

    fn scan_string(&mut self, quote: char) -> TokenKind {
        let mut value = String::new();

        loop {
            let Some((_, ch)) = self.advance() else {
                return TokenKind::UnterminatedString;
            };
            match ch {
                _ if ch == quote => return TokenKind::String(value),
                '\n' | '\r' => return TokenKind::UnterminatedString,
                '\\' => {
                    let Some((_, escaped)) = self.advance() else {
                        return TokenKind::UnterminatedString;
                    };
                    match escaped {
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        'r' => value.push('\r'),
                        'b' => value.push('\u{8}'),
                        'f' => value.push('\u{c}'),
                        'v' => value.push('\u{b}'),
                        '0' => value.push('\0'),
                        'x' => match self.scan_hex_digits(2) {
                            Some(ch) => value.push(ch),
                            None => value.push('x'),
                        },
                        'u' => match self.scan_hex_digits(4) {
                            Some(ch) => value.push(ch),
                            None => value.push('u'),
                        },
                        // Line continuation
                        '\n' => {}
                        '\r' => {
                            self.matches('\n');
                        }
                        other => value.push(other),
                    }
                }
                _ => value.push(ch),
            }
        }
    }

    fn scan_hex_digits(&mut self, count: usize) -> Option<char> {
        let mut iter = self.chars.clone();
        let mut code = 0u32;
        for _ in 0..count {
            let (_, ch) = iter.next()?;
            code = code * 16 + ch.to_digit(16)?;
        }
        for _ in 0..count {
            self.advance();
        }
        char::from_u32(code)
    }

    fn scan_number(&mut self, first: char) -> TokenKind {
        let start = self.current_pos - first.len_utf8();

        if first == '0' && matches!(self.peek(), Some('x' | 'X')) {
            self.advance();
            let digits_start = self.current_pos;
            while self.peek().is_some_and(|ch| ch.is_ascii_hexdigit()) {
                self.advance();
            }
            let digits = &self.source[digits_start..self.current_pos];
            return match u64::from_str_radix(digits, 16) {
                Ok(value) => TokenKind::Number(value as f64),
                Err(_) => TokenKind::Invalid('x'),
            };
        }

        let mut seen_dot = first == '.';
        while let Some(ch) = self.peek() {
            match ch {
                '0'..='9' => {
                    self.advance();
                }
                '.' if !seen_dot => {
                    seen_dot = true;
                    self.advance();
                }
                _ => break,
            }
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            let signed = matches!(self.peek_next(), Some('+' | '-'));
            let mut iter = self.chars.clone();
            iter.next();
            if signed {
                iter.next();
            }
            if iter.next().is_some_and(|(_, ch)| ch.is_ascii_digit()) {
                self.advance();
                if signed {
                    self.advance();
                }
                while self.peek().is_some_and(|ch| ch.is_ascii_digit()) {
                    self.advance();
                }
            }
        }

        let text = &self.source[start..self.current_pos];
        match text.parse::<f64>() {
            Ok(value) => TokenKind::Number(value),
            Err(_) => TokenKind::Invalid(first),
        }
    }

    fn scan_identifier(&mut self, start: usize) -> TokenKind {
        while self.peek().is_some_and(is_id_continue) {
            self.advance();
        }
        let word = &self.source[start..self.current_pos];
        TokenKind::keyword(word).unwrap_or_else(|| TokenKind::Identifier(word.to_string()))
    }
}

fn is_id_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

fn is_id_continue(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut scanner = Scanner::new(source);
        let mut kinds = Vec::new();
        loop {
            let token = scanner.next_token();
            if token.kind == TokenKind::Eof {
                break;
            }
            kinds.push(token.kind);
        }
        kinds
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("a === b !== c == d != e += 1"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::EqualEqualEqual,
                TokenKind::Identifier("b".into()),
                TokenKind::BangEqualEqual,
                TokenKind::Identifier("c".into()),
                TokenKind::EqualEqual,
                TokenKind::Identifier("d".into()),
                TokenKind::BangEqual,
                TokenKind::Identifier("e".into()),
                TokenKind::PlusEqual,
                TokenKind::Number(1.0),
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("42 3.5 .25 1e3 2E-2 0xff"),
            vec![
                TokenKind::Number(42.0),
                TokenKind::Number(3.5),
                TokenKind::Number(0.25),
                TokenKind::Number(1000.0),
                TokenKind::Number(0.02),
                TokenKind::Number(255.0),
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#"'it\'s' "a\tbA\x42""#),
            vec![
                TokenKind::String("it's".into()),
                TokenKind::String("a\tbAB".into()),
            ]
        );
        assert_eq!(kinds("'open"), vec![TokenKind::UnterminatedString]);
    }

    #[test]
    fn test_comments_and_newlines() {
        let mut scanner = Scanner::new("a // trailing\n/* block\n */ b c");
        assert!(!scanner.next_token().newline_before);
        let b = scanner.next_token();
        assert_eq!(b.kind, TokenKind::Identifier("b".into()));
        assert!(b.newline_before);
        assert!(!scanner.next_token().newline_before);
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            kinds("var exports typeof this"),
            vec![
                TokenKind::Var,
                TokenKind::Identifier("exports".into()),
                TokenKind::Typeof,
                TokenKind::This,
            ]
        );
    }
}
