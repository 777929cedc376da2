// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Parsing source text into an AST.

#[allow(clippy::module_inception)]
mod parser;

pub use parser::{MAX_NESTING_DEPTH, Parser};

use crate::ast::Program;
use crate::error::Result;

/// Parse a complete program
pub fn parse(source: &str) -> Result<Program> {
    Parser::new(source).parse_program()
}
