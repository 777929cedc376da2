// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The evaluator seam
//!
//! The loader never runs source text itself. It hands each module body, with
//! its own `require`/`module`/`exports` bindings, to an [`Evaluator`].

use crate::error::Result;
use crate::require::Require;

/// Executes module bodies on behalf of a [`ModuleLoader`](crate::ModuleLoader).
///
/// `V` is the evaluator's value type; an exports container is a `V`.
pub trait Evaluator<V> {
    /// Create a fresh, empty exports container
    fn new_exports(&mut self) -> V;

    /// Identity comparison of two values
    fn same_exports(&self, a: &V, b: &V) -> bool;

    /// Run `source` with the bindings in `scope`.
    ///
    /// Reassigning `module.exports` inside the body must be reflected in
    /// `scope.module.exports`. Errors from nested requires should be returned
    /// as they are.
    fn evaluate(&mut self, source: &str, scope: &mut ModuleScope<V>) -> Result<()>;
}

/// The `module` binding of a module body
#[derive(Debug, Clone)]
pub struct Module<V> {
    /// Canonical module key
    pub id: String,
    /// Registration key
    pub filename: String,
    /// Current `module.exports`
    pub exports: V,
}

/// Bindings injected into one module evaluation
#[derive(Debug)]
pub struct ModuleScope<V> {
    /// `require`, bound to the module's directory
    pub require: Require<V>,
    /// `module`
    pub module: Module<V>,
    /// `exports`, initially the same container as `module.exports`
    pub exports: V,
}

impl<V> ModuleScope<V> {
    /// Directory nested specifiers resolve against
    pub fn dirname(&self) -> &str {
        self.require.directory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ModuleLoader;

    fn bindings_of<V>(scope: &ModuleScope<V>) -> (&str, String) {
        (scope.dirname(), scope.require.resolve("./util"))
    }

    #[test]
    fn test_scope_bindings_for_any_value_type() {
        let loader: ModuleLoader<u32> = ModuleLoader::new();
        let scope = ModuleScope {
            require: Require::new(loader, "/lib".to_string()),
            module: Module {
                id: "/lib/index.js".to_string(),
                filename: "lib/index".to_string(),
                exports: 0,
            },
            exports: 0,
        };

        let (dirname, resolved) = bindings_of(&scope);
        assert_eq!(dirname, "/lib");
        assert_eq!(resolved, "/lib/util.js");
    }
}
