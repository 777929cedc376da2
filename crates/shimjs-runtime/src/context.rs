// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Engine context facade.
//!
//! A [`ScriptContext`] pairs one interpreter with one module loader. It is
//! single-threaded; use [`ScriptExecutor`](crate::ScriptExecutor) to drive a
//! context from other threads.

use std::fmt;
use std::rc::Rc;

use shimjs_loader::{ModuleLoader, SourceMap};
use shimjs_script::{Function, Interpreter, Value};
use tracing::debug;

use crate::config::RuntimeConfig;
use crate::error::Result;

/// An interpreter together with the module registry it loads from
pub struct ScriptContext {
    interpreter: Interpreter,
    loader: ModuleLoader<Value>,
    require_installed: bool,
}

impl ScriptContext {
    /// Create a context with default configuration
    pub fn new() -> Self {
        Self::with_config(&RuntimeConfig::default())
    }

    /// Create a context from runtime configuration
    pub fn with_config(config: &RuntimeConfig) -> Self {
        Self {
            interpreter: Interpreter::new().with_max_call_depth(config.script.max_call_depth),
            loader: ModuleLoader::with_config(config.loader.clone()),
            require_installed: false,
        }
    }

    /// The interpreter
    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    /// The interpreter, mutably
    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }

    /// The module loader
    pub fn loader(&self) -> &ModuleLoader<Value> {
        &self.loader
    }

    /// Evaluate `code` without leaking its top-level names into the globals
    pub fn eval(&mut self, code: &str) -> Result<Value> {
        Ok(self.interpreter.eval(code)?)
    }

    /// Evaluate `code` directly in the global scope
    pub fn eval_into_engine(&mut self, code: &str) -> Result<Value> {
        Ok(self.interpreter.eval_into_engine(code)?)
    }

    /// Call the global function `name`
    pub fn invoke_function(&mut self, name: &str, args: &[Value]) -> Result<Value> {
        Ok(self.interpreter.invoke_function(name, args)?)
    }

    /// Call method `name` on `target`
    pub fn invoke_method(&mut self, target: &Value, name: &str, args: &[Value]) -> Result<Value> {
        Ok(self.interpreter.invoke_method(target, name, args)?)
    }

    /// Look up a global by dotted path, e.g. `UglifyJS.parser`
    pub fn get_script_object(&self, path: &str) -> Result<Value> {
        Ok(self.interpreter.get_script_object(path)?)
    }

    /// Register `sources` with the loader and make `require` available to
    /// scripts.
    ///
    /// The first call installs a global `require` bound to the root directory.
    /// Every call adds to the same registry; modules are evaluated right away
    /// when the loader is configured to preload.
    pub fn load_with_require(&mut self, sources: &SourceMap) -> Result<()> {
        if !self.require_installed {
            let require = Function::require(self.loader.root_require());
            self.interpreter.define_global("require", Value::Function(Rc::new(require)));
            self.require_installed = true;
            debug!("installed global require");
        }

        let preload = self.loader.config().preload;
        self.loader.register(sources, preload, &mut self.interpreter)?;
        Ok(())
    }

    /// Require a module from the root directory
    pub fn require(&mut self, specifier: &str) -> Result<Value> {
        Ok(self.loader.require(specifier, &mut self.interpreter)?)
    }
}

impl Default for ScriptContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ScriptContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptContext")
            .field("modules", &self.loader.len())
            .field("loaded", &self.loader.cached_keys().len())
            .field("require_installed", &self.require_installed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources(entries: &[(&str, &str)]) -> SourceMap {
        let mut map = SourceMap::new();
        for (key, text) in entries {
            map.insert_str(*key, *text);
        }
        map
    }

    #[test]
    fn test_global_require_installed_on_first_load() {
        let mut context = ScriptContext::new();
        assert!(context.interpreter().global("require").is_none());

        context
            .load_with_require(&sources(&[("/util", "exports.answer = 42;")]))
            .unwrap();
        assert!(context.interpreter().global("require").is_some());

        let answer = context.eval("require('./util').answer").unwrap();
        assert_eq!(answer.as_number(), Some(42.0));
    }

    #[test]
    fn test_later_loads_share_registry() {
        let mut context = ScriptContext::new();
        context
            .load_with_require(&sources(&[("/a", "exports.name = 'a';")]))
            .unwrap();
        context
            .load_with_require(&sources(&[("/b", "exports.name = require('./a').name + 'b';")]))
            .unwrap();

        let b = context.require("/b").unwrap();
        assert_eq!(b.get_property("name").unwrap().as_str(), Some("ab"));
        assert_eq!(context.loader().registered_keys(), vec!["/a.js", "/b.js"]);
    }

    #[test]
    fn test_preload_follows_config() {
        let mut config = RuntimeConfig::default();
        config.loader.preload = true;
        let mut context = ScriptContext::with_config(&config);

        context
            .load_with_require(&sources(&[("/side", "counter = 1;")]))
            .unwrap();
        assert!(context.loader().is_loaded("/side"));
        assert_eq!(context.eval("counter").unwrap().as_number(), Some(1.0));
    }

    #[test]
    fn test_collision_is_reported() {
        let mut context = ScriptContext::new();
        let err = context
            .load_with_require(&sources(&[("/lib/a", "1"), ("lib/a.js", "2")]))
            .unwrap_err();
        assert!(err.to_string().contains("Collision"));
        assert!(context.loader().is_empty());
    }
}
