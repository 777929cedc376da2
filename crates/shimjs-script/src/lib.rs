// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # shimjs-script
//!
//! A small tree-walking interpreter for a CommonJS-flavoured subset of
//! JavaScript, used as the module evaluator behind `shimjs-loader`.
//!
//! ## Architecture
//!
//! ```text
//! Source → Scanner → Tokens → Parser → AST → Interpreter
//! ```
//!
//! The [`Interpreter`] implements [`shimjs_loader::Evaluator`] for [`Value`],
//! so a `ModuleLoader<Value>` can run module bodies with it:
//!
//! ```rust
//! use shimjs_loader::{ModuleLoader, SourceMap};
//! use shimjs_script::Interpreter;
//!
//! let mut interpreter = Interpreter::new();
//! let loader = ModuleLoader::new();
//! let mut sources = SourceMap::new();
//! sources.insert_str("/pkg/index", "module.exports = require('./util').double(21);");
//! sources.insert_str("/pkg/util", "exports.double = function (x) { return x * 2; };");
//!
//! loader.register(&sources, false, &mut interpreter).unwrap();
//! let answer = loader.require("/pkg/index", &mut interpreter).unwrap();
//! assert_eq!(answer.as_number(), Some(42.0));
//! ```
//!
//! ## Supported language
//!
//! `var`/`let`/`const`, function declarations and expressions, `if`/`else`,
//! blocks, `return`, `throw`, object and array literals, member access,
//! calls, assignment (including `+=` and friends), arithmetic, comparison,
//! equality, logical and conditional operators, and `typeof`. Semicolons
//! are optional at line ends.

#![warn(clippy::all)]

pub mod ast;
mod builtins;
pub mod error;
mod interpreter;
pub mod lexer;
pub mod parser;
pub mod runtime;
mod stack;

pub use error::{Result, ScriptError};
pub use interpreter::{DEFAULT_MAX_CALL_DEPTH, Interpreter};
pub use parser::parse;
pub use runtime::{Function, JsObject, Scope, Value};
