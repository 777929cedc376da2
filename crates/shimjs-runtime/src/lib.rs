// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # shimjs-runtime
//!
//! Host-facing layer over the shimjs module loader and script interpreter.
//!
//! - [`ScriptContext`]: one interpreter plus one module registry, with the
//!   eval/invoke helpers hosts use and a global `require` installed on the
//!   first [`load_with_require`](ScriptContext::load_with_require).
//! - [`ScriptExecutor`]: runs a context on a dedicated thread and hands back
//!   results as futures.
//! - [`RuntimeConfig`]: TOML and environment backed settings.
//!
//! ```rust
//! use shimjs_loader::SourceMap;
//! use shimjs_runtime::ScriptContext;
//!
//! let mut context = ScriptContext::new();
//! let mut sources = SourceMap::new();
//! sources.insert_str("/greeting", "exports.hello = function (name) { return 'hello ' + name; };");
//! context.load_with_require(&sources).unwrap();
//!
//! let greeting = context.eval("require('./greeting').hello('world')").unwrap();
//! assert_eq!(greeting.as_str(), Some("hello world"));
//! ```

#![warn(clippy::all)]

pub mod config;
mod context;
pub mod error;
mod executor;

pub use config::{ExecutorConfig, RuntimeConfig, ScriptConfig};
pub use context::ScriptContext;
pub use error::{Result, RuntimeError};
pub use executor::{JobHandle, ScriptExecutor};
