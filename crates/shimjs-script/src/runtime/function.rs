// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Callable values.

use super::{JsObject, Scope, Value};
use crate::ast::FunctionNode;
use crate::error::Result;
use crate::interpreter::Interpreter;
use shimjs_loader::Require;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Host function signature: interpreter, `this`, arguments.
pub type NativeFn = Rc<dyn Fn(&mut Interpreter, &Value, &[Value]) -> Result<Value>>;

/// What runs when a function is called.
pub enum FunctionKind {
    /// A closure over script code
    Script {
        /// The function's syntax
        node: Rc<FunctionNode>,
        /// The scope the function was created in
        scope: Scope,
    },
    /// A host function
    Native(NativeFn),
    /// A module's `require`
    Require(Require<Value>),
}

/// A function value.
///
/// Functions are objects too; `properties` holds whatever scripts attach.
pub struct Function {
    name: String,
    kind: FunctionKind,
    properties: RefCell<JsObject>,
}

impl Function {
    /// Creates a closure over `scope`.
    pub fn script(node: Rc<FunctionNode>, scope: Scope) -> Self {
        Self {
            name: node.name.clone().unwrap_or_default(),
            kind: FunctionKind::Script { node, scope },
            properties: RefCell::new(JsObject::new()),
        }
    }

    /// Creates a host function.
    pub fn native(
        name: impl Into<String>,
        f: impl Fn(&mut Interpreter, &Value, &[Value]) -> Result<Value> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            kind: FunctionKind::Native(Rc::new(f)),
            properties: RefCell::new(JsObject::new()),
        }
    }

    /// Creates a `require` function with a `resolve` property.
    pub fn require(require: Require<Value>) -> Self {
        let resolver = require.clone();
        let resolve = Function::native("resolve", move |_, _, args| {
            let specifier = super::string_argument(args, "id")?;
            Ok(Value::from(resolver.resolve(&specifier)))
        });

        let mut properties = JsObject::new();
        properties.set("resolve", Value::Function(Rc::new(resolve)));

        Self {
            name: "require".to_string(),
            kind: FunctionKind::Require(require),
            properties: RefCell::new(properties),
        }
    }

    /// The function name; empty for anonymous functions.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// What the function runs.
    pub fn kind(&self) -> &FunctionKind {
        &self.kind
    }

    /// Reads a property attached to the function.
    pub fn get(&self, key: &str) -> Option<Value> {
        if key == "name" {
            return Some(Value::from(self.name.as_str()));
        }
        self.properties.borrow().get(key)
    }

    /// Attaches a property to the function.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.properties.borrow_mut().set(key, value);
    }

    /// Properties attached to the function.
    pub fn properties(&self) -> JsObject {
        self.properties.borrow().clone()
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            FunctionKind::Script { .. } => "script",
            FunctionKind::Native(_) => "native",
            FunctionKind::Require(_) => "require",
        };
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("kind", &kind)
            .finish_non_exhaustive()
    }
}
