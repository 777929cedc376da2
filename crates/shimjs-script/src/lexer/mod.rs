// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Lexical analysis (tokenization) for script source code.
//!
//! - `scanner.rs` - `Scanner`, which produces tokens on demand
//! - `token.rs` - `Token`, `TokenKind` and `Span`
//!
//! ```rust
//! use shimjs_script::lexer::{Scanner, TokenKind};
//!
//! let mut scanner = Scanner::new("var x = 42;");
//! assert_eq!(scanner.next_token().kind, TokenKind::Var);
//! ```

mod scanner;
mod token;

pub use scanner::Scanner;
pub use token::{Span, Token, TokenKind};
