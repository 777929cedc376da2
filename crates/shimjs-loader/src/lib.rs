// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # shimjs-loader
//!
//! CommonJS-style `require()` for hosts that have no module loader of their
//! own. A [`ModuleLoader`] owns a registry of named source entries and a cache
//! of evaluated exports:
//!
//! - registration keys and `require()` specifiers are canonicalized into
//!   one module key (`/lib/util.js`) by the [`ModuleResolver`]
//! - each module is evaluated at most once, lazily on first require or
//!   eagerly in registration order
//! - evaluation is delegated to an injected [`Evaluator`], which receives its
//!   own `require`/`module`/`exports` bindings per module
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shimjs_loader::{ModuleLoader, SourceMap};
//!
//! let loader = ModuleLoader::new();
//! let mut sources = SourceMap::new();
//! sources.insert_str("/pkg/index", "module.exports = require('./util').double(21);");
//! sources.insert_str("/pkg/util", "exports.double = function(x){ return x*2; };");
//!
//! loader.register(&sources, false, &mut evaluator)?;
//! let answer = loader.require("/pkg/index", &mut evaluator)?;
//! ```
//!
//! ## Circular requires
//!
//! A module required while it is still evaluating hands out its current,
//! possibly half-populated exports container. If that module later replaces
//! `module.exports` wholesale, earlier holders keep the stale container.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod cache;
pub mod config;
pub mod error;
mod evaluator;
mod loader;
mod require;
pub mod resolver;
pub mod source;

pub use cache::{CachedModule, ModuleCache};
pub use config::{KeyStrategy, LoaderConfig};
pub use error::{LoaderError, Result};
pub use evaluator::{Evaluator, Module, ModuleScope};
pub use loader::ModuleLoader;
pub use require::Require;
pub use resolver::ModuleResolver;
pub use source::{FileSource, ModuleSource, SourceEntry, SourceMap, StringSource};
