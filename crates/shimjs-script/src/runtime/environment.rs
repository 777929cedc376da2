// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Lexical environments.

use super::Value;
use crate::error::{Result, ScriptError};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

/// A binding in an environment.
#[derive(Debug, Clone)]
struct Binding {
    value: Value,
    mutable: bool,
}

#[derive(Debug, Default)]
struct Environment {
    bindings: FxHashMap<String, Binding>,
    outer: Option<Scope>,
    /// `this` for function scopes
    this: Option<Value>,
    /// `var` declarations land here
    function_scope: bool,
    /// Assignments that would escape this environment stay in it
    shield: bool,
}

/// A shared handle to a lexical environment.
///
/// Closures keep the handle they were created with, so environments
/// outlive the block that created them.
#[derive(Debug, Clone)]
pub struct Scope(Rc<RefCell<Environment>>);

impl Scope {
    fn from_env(env: Environment) -> Self {
        Self(Rc::new(RefCell::new(env)))
    }

    /// Creates a global environment.
    pub fn global() -> Self {
        Self::from_env(Environment {
            this: Some(Value::Undefined),
            function_scope: true,
            ..Default::default()
        })
    }

    /// Creates a block environment inside `outer`.
    pub fn block(outer: &Scope) -> Self {
        Self::from_env(Environment {
            outer: Some(outer.clone()),
            ..Default::default()
        })
    }

    /// Creates a function environment inside `outer`.
    pub fn function(outer: &Scope, this: Value) -> Self {
        Self::from_env(Environment {
            outer: Some(outer.clone()),
            this: Some(this),
            function_scope: true,
            ..Default::default()
        })
    }

    /// Creates a throw-away environment over `outer`.
    ///
    /// Declarations and assignments to names not declared inside it are
    /// kept here instead of reaching `outer`. Property writes on reachable
    /// objects still go through.
    pub fn shield(outer: &Scope) -> Self {
        Self::from_env(Environment {
            outer: Some(outer.clone()),
            this: Some(Value::Undefined),
            function_scope: true,
            shield: true,
            ..Default::default()
        })
    }

    /// Declares (or redeclares) a binding in this environment.
    pub fn declare(&self, name: impl Into<String>, value: Value, mutable: bool) {
        self.0
            .borrow_mut()
            .bindings
            .insert(name.into(), Binding { value, mutable });
    }

    /// Whether this environment itself binds `name`.
    pub fn has_own(&self, name: &str) -> bool {
        self.0.borrow().bindings.contains_key(name)
    }

    /// Looks a name up along the scope chain.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut current = self.clone();
        loop {
            let outer = {
                let env = current.0.borrow();
                if let Some(binding) = env.bindings.get(name) {
                    return Some(binding.value.clone());
                }
                env.outer.clone()
            };
            current = outer?;
        }
    }

    /// Assigns to the nearest binding of `name`.
    ///
    /// An undeclared name becomes a new binding in the outermost
    /// environment, or in the nearest shield.
    pub fn assign(&self, name: &str, value: Value) -> Result<()> {
        let mut current = self.clone();
        loop {
            let outer = {
                let mut env = current.0.borrow_mut();
                if let Some(binding) = env.bindings.get_mut(name) {
                    if !binding.mutable {
                        return Err(ScriptError::type_error("Assignment to constant variable."));
                    }
                    binding.value = value;
                    return Ok(());
                }
                if env.shield {
                    None
                } else {
                    env.outer.clone()
                }
            };
            match outer {
                Some(outer) => current = outer,
                None => {
                    current.declare(name, value, true);
                    return Ok(());
                }
            }
        }
    }

    /// `this` of the nearest function environment.
    pub fn this_value(&self) -> Value {
        let mut current = self.clone();
        loop {
            let outer = {
                let env = current.0.borrow();
                if let Some(this) = &env.this {
                    return this.clone();
                }
                env.outer.clone()
            };
            match outer {
                Some(outer) => current = outer,
                None => return Value::Undefined,
            }
        }
    }

    /// The nearest environment `var` declarations belong to.
    pub fn var_scope(&self) -> Scope {
        let mut current = self.clone();
        loop {
            let outer = {
                let env = current.0.borrow();
                if env.function_scope {
                    None
                } else {
                    env.outer.clone()
                }
            };
            match outer {
                Some(outer) => current = outer,
                None => return current,
            }
        }
    }

    /// Names bound directly in this environment.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.0.borrow().bindings.keys().cloned().collect();
        names.sort();
        names
    }

    /// Whether both handles refer to the same environment.
    pub fn ptr_eq(&self, other: &Scope) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_walks_outward() {
        let global = Scope::global();
        global.declare("x", Value::Number(1.0), true);
        let inner = Scope::block(&Scope::function(&global, Value::Undefined));

        assert!(matches!(inner.lookup("x"), Some(Value::Number(n)) if n == 1.0));
        assert!(inner.lookup("y").is_none());
    }

    #[test]
    fn test_assign_undeclared_goes_to_outermost() {
        let global = Scope::global();
        let function = Scope::function(&global, Value::Undefined);

        function.assign("leak", Value::Boolean(true)).unwrap();
        assert!(global.has_own("leak"));
        assert!(!function.has_own("leak"));
    }

    #[test]
    fn test_shield_keeps_assignments() {
        let global = Scope::global();
        global.declare("kept", Value::Number(4.0), true);
        let shield = Scope::shield(&global);
        let block = Scope::block(&shield);

        block.assign("fresh", Value::Number(1.0)).unwrap();
        block.assign("kept", Value::Number(6.0)).unwrap();

        assert!(shield.has_own("fresh"));
        assert!(!global.has_own("fresh"));
        assert!(matches!(global.lookup("kept"), Some(Value::Number(n)) if n == 4.0));
        assert!(matches!(shield.lookup("kept"), Some(Value::Number(n)) if n == 6.0));
    }

    #[test]
    fn test_const_rejects_assignment() {
        let global = Scope::global();
        global.declare("fixed", Value::Null, false);
        assert!(matches!(
            global.assign("fixed", Value::Null),
            Err(ScriptError::Type(_))
        ));
    }

    #[test]
    fn test_var_scope_skips_blocks() {
        let global = Scope::global();
        let function = Scope::function(&global, Value::Undefined);
        let block = Scope::block(&Scope::block(&function));
        assert!(block.var_scope().ptr_eq(&function));
    }
}
