// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Global bindings every interpreter starts with.

use crate::interpreter::Interpreter;
use crate::runtime::{Function, Scope, Value};
use std::rc::Rc;

/// Install the builtins into `globals`
pub(crate) fn install(globals: &Scope) {
    globals.declare("undefined", Value::Undefined, false);
    globals.declare("NaN", Value::Number(f64::NAN), false);
    globals.declare("Infinity", Value::Number(f64::INFINITY), false);
    globals.declare("print", Value::Function(Rc::new(Function::native("print", print))), true);
}

/// print(...args): one line, arguments separated by spaces
fn print(interpreter: &mut Interpreter, _this: &Value, args: &[Value]) -> crate::Result<Value> {
    let line = args
        .iter()
        .map(|arg| match arg {
            Value::String(s) => s.to_string(),
            other => other.inspect(),
        })
        .collect::<Vec<_>>()
        .join(" ");
    interpreter.print(&line);
    Ok(Value::Undefined)
}
