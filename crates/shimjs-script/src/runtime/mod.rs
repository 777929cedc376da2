// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Runtime data structures: values, objects, functions and scopes.

mod environment;
mod function;
mod object;
mod operators;
mod value;

pub use environment::Scope;
pub use function::{Function, FunctionKind, NativeFn};
pub use object::JsObject;
pub use operators::binary_operation;
pub use value::{ArrayRef, ObjectRef, Value};

use crate::error::{Result, ScriptError};

/// Formats a number the way scripts see it.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        format!("{}", n)
    }
}

/// The string argument at position 0, or a TypeError naming `param`.
pub(crate) fn string_argument(args: &[Value], param: &str) -> Result<String> {
    match args.first() {
        Some(Value::String(s)) => Ok(s.to_string()),
        Some(other) => Err(ScriptError::type_error(format!(
            "The \"{}\" argument must be of type string. Received {}",
            param,
            other.type_of()
        ))),
        None => Err(ScriptError::type_error(format!(
            "The \"{}\" argument must be of type string. Received undefined",
            param
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_to_string() {
        assert_eq!(number_to_string(42.0), "42");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(0.5), "0.5");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
    }
}
