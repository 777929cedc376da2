// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Script value representation.

use super::{Function, JsObject, number_to_string};
use crate::error::{Result, ScriptError};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Shared handle to an object.
pub type ObjectRef = Rc<RefCell<JsObject>>;

/// Shared handle to an array's elements.
pub type ArrayRef = Rc<RefCell<Vec<Value>>>;

/// A script value.
///
/// Objects, arrays and functions are shared handles: cloning a value never
/// copies them, and identity is pointer identity.
#[derive(Clone)]
pub enum Value {
    /// undefined
    Undefined,
    /// null
    Null,
    /// Boolean value
    Boolean(bool),
    /// Number (IEEE 754 double)
    Number(f64),
    /// String
    String(Rc<str>),
    /// Object
    Object(ObjectRef),
    /// Array
    Array(ArrayRef),
    /// Function
    Function(Rc<Function>),
}

impl Value {
    /// Creates an empty object.
    pub fn new_object() -> Self {
        Value::Object(Rc::new(RefCell::new(JsObject::new())))
    }

    /// Creates an object from its properties.
    pub fn object_from(properties: impl IntoIterator<Item = (String, Value)>) -> Self {
        Value::Object(Rc::new(RefCell::new(properties.into_iter().collect())))
    }

    /// Creates an array.
    pub fn array(elements: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(elements)))
    }

    /// Returns true if this value is undefined.
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Returns true if this value is null or undefined.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Returns true if this value is a function.
    pub fn is_function(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    /// The string contents, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The number, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Converts the value to a boolean (ToBoolean).
    pub fn to_boolean(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Object(_) | Value::Array(_) | Value::Function(_) => true,
        }
    }

    /// Converts the value to a number (ToNumber).
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::String(s) => string_to_number(s),
            Value::Array(_) => string_to_number(&self.to_display_string()),
            Value::Object(_) | Value::Function(_) => f64::NAN,
        }
    }

    /// Converts the value to a string (ToString).
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => number_to_string(*n),
            Value::String(s) => s.to_string(),
            Value::Object(_) => "[object Object]".to_string(),
            Value::Array(elements) => {
                let mut seen = vec![Rc::as_ptr(elements) as *const ()];
                join_elements(elements, &mut seen)
            }
            Value::Function(function) => format!("function {}() {{ [code] }}", function.name()),
        }
    }

    /// The `typeof` result.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null | Value::Object(_) | Value::Array(_) => "object",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) => "function",
        }
    }

    /// Strict equality (===).
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            _ => self.same_reference(other),
        }
    }

    /// Loose equality (==).
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
            (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => false,
            (Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => {
                self.to_number() == other.to_number()
            }
            (Value::Boolean(_), _) => Value::Number(self.to_number()).loose_equals(other),
            (_, Value::Boolean(_)) => self.loose_equals(&Value::Number(other.to_number())),
            (Value::Object(_) | Value::Array(_) | Value::Function(_), Value::Number(_) | Value::String(_)) => {
                Value::from(self.to_display_string()).loose_equals(other)
            }
            (Value::Number(_) | Value::String(_), Value::Object(_) | Value::Array(_) | Value::Function(_)) => {
                self.loose_equals(&Value::from(other.to_display_string()))
            }
            _ => self.strict_equals(other),
        }
    }

    /// Whether both values are the same object, array or function.
    pub fn same_reference(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Identity: reference equality for shared values, SameValue otherwise.
    pub fn same_value(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => {
                (a.is_nan() && b.is_nan()) || (a == b && a.is_sign_negative() == b.is_sign_negative())
            }
            _ => self.strict_equals(other),
        }
    }

    /// Reads a property (`value.key`).
    pub fn get_property(&self, key: &str) -> Result<Value> {
        let value = match self {
            Value::Undefined | Value::Null => {
                return Err(ScriptError::type_error(format!(
                    "Cannot read properties of {} (reading '{}')",
                    self.to_display_string(),
                    key
                )));
            }
            Value::Object(object) => object.borrow().get(key),
            Value::Array(elements) => {
                let elements = elements.borrow();
                if key == "length" {
                    Some(Value::Number(elements.len() as f64))
                } else {
                    array_index(key).and_then(|index| elements.get(index).cloned())
                }
            }
            Value::String(s) => {
                if key == "length" {
                    Some(Value::Number(s.encode_utf16().count() as f64))
                } else {
                    array_index(key)
                        .and_then(|index| s.chars().nth(index))
                        .map(|ch| Value::from(ch.to_string()))
                }
            }
            Value::Function(function) => function.get(key),
            Value::Boolean(_) | Value::Number(_) => None,
        };
        Ok(value.unwrap_or(Value::Undefined))
    }

    /// Writes a property (`value.key = new_value`).
    ///
    /// Writes to primitives are ignored.
    pub fn set_property(&self, key: &str, new_value: Value) -> Result<()> {
        match self {
            Value::Undefined | Value::Null => {
                return Err(ScriptError::type_error(format!(
                    "Cannot set properties of {} (setting '{}')",
                    self.to_display_string(),
                    key
                )));
            }
            Value::Object(object) => object.borrow_mut().set(key, new_value),
            Value::Array(elements) => {
                let mut elements = elements.borrow_mut();
                if key == "length" {
                    let length = new_value.to_number();
                    if length < 0.0 || length.fract() != 0.0 || !length.is_finite() {
                        return Err(ScriptError::Range("Invalid array length".to_string()));
                    }
                    elements.resize(length as usize, Value::Undefined);
                } else if let Some(index) = array_index(key) {
                    if index >= elements.len() {
                        elements.resize(index + 1, Value::Undefined);
                    }
                    elements[index] = new_value;
                }
            }
            Value::Function(function) => function.set(key, new_value),
            Value::Boolean(_) | Value::Number(_) | Value::String(_) => {}
        }
        Ok(())
    }

    /// Renders the value for display in a REPL or log line.
    pub fn inspect(&self) -> String {
        let mut out = String::new();
        let mut seen = Vec::new();
        inspect_into(self, &mut out, &mut seen);
        out
    }

    /// Converts to JSON. Fails on cyclic structures.
    ///
    /// `undefined` and functions become `null`, or are left out when they
    /// are object properties.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        let mut seen = Vec::new();
        to_json_inner(self, &mut seen)
    }

    /// Converts from JSON.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::from(s.as_str()),
            serde_json::Value::Array(elements) => {
                Value::array(elements.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => {
                Value::object_from(map.iter().map(|(k, v)| (k.clone(), Value::from_json(v))))
            }
        }
    }
}

/// Canonical array index for a property key
fn array_index(key: &str) -> Option<usize> {
    let index: usize = key.parse().ok()?;
    (index.to_string() == key).then_some(index)
}

fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).map_or(f64::NAN, |n| n as f64);
    }
    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        // Rust accepts spellings like "inf" and "nan" that scripts do not
        _ if trimmed.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => f64::NAN,
        _ => trimmed.parse().unwrap_or(f64::NAN),
    }
}

fn join_elements(elements: &ArrayRef, seen: &mut Vec<*const ()>) -> String {
    let parts: Vec<String> = elements
        .borrow()
        .iter()
        .map(|element| match element {
            Value::Undefined | Value::Null => String::new(),
            Value::Array(inner) => {
                let ptr = Rc::as_ptr(inner) as *const ();
                if seen.contains(&ptr) {
                    return String::new();
                }
                seen.push(ptr);
                let joined = join_elements(inner, seen);
                seen.pop();
                joined
            }
            other => other.to_display_string(),
        })
        .collect();
    parts.join(",")
}

fn is_identifier_name(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'").replace('\n', "\\n"))
}

fn inspect_into(value: &Value, out: &mut String, seen: &mut Vec<*const ()>) {
    match value {
        Value::String(s) => out.push_str(&quote(s)),
        Value::Function(function) => {
            if function.name().is_empty() {
                out.push_str("[Function (anonymous)]");
            } else {
                out.push_str(&format!("[Function: {}]", function.name()));
            }
        }
        Value::Object(object) => {
            let ptr = Rc::as_ptr(object) as *const ();
            if seen.contains(&ptr) {
                out.push_str("[Circular]");
                return;
            }
            let entries = object.borrow().entries();
            if entries.is_empty() {
                out.push_str("{}");
                return;
            }
            seen.push(ptr);
            out.push_str("{ ");
            for (i, (key, value)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                if is_identifier_name(key) {
                    out.push_str(key);
                } else {
                    out.push_str(&quote(key));
                }
                out.push_str(": ");
                inspect_into(value, out, seen);
            }
            out.push_str(" }");
            seen.pop();
        }
        Value::Array(elements) => {
            let ptr = Rc::as_ptr(elements) as *const ();
            if seen.contains(&ptr) {
                out.push_str("[Circular]");
                return;
            }
            let elements = elements.borrow().clone();
            if elements.is_empty() {
                out.push_str("[]");
                return;
            }
            seen.push(ptr);
            out.push_str("[ ");
            for (i, element) in elements.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                inspect_into(element, out, seen);
            }
            out.push_str(" ]");
            seen.pop();
        }
        other => out.push_str(&other.to_display_string()),
    }
}

fn to_json_inner(value: &Value, seen: &mut Vec<*const ()>) -> Result<serde_json::Value> {
    let circular = || ScriptError::type_error("Converting circular structure to JSON");

    let json = match value {
        Value::Undefined | Value::Null | Value::Function(_) => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => number_to_json(*n),
        Value::String(s) => serde_json::Value::String(s.to_string()),
        Value::Array(elements) => {
            let ptr = Rc::as_ptr(elements) as *const ();
            if seen.contains(&ptr) {
                return Err(circular());
            }
            seen.push(ptr);
            let elements = elements.borrow().clone();
            let mut items = Vec::with_capacity(elements.len());
            for element in &elements {
                items.push(to_json_inner(element, seen)?);
            }
            seen.pop();
            serde_json::Value::Array(items)
        }
        Value::Object(object) => {
            let ptr = Rc::as_ptr(object) as *const ();
            if seen.contains(&ptr) {
                return Err(circular());
            }
            seen.push(ptr);
            let entries = object.borrow().entries();
            let mut map = serde_json::Map::new();
            for (key, value) in &entries {
                if value.is_undefined() || value.is_function() {
                    continue;
                }
                map.insert(key.clone(), to_json_inner(value, seen)?);
            }
            seen.pop();
            serde_json::Value::Object(map)
        }
    };
    Ok(json)
}

fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inspect())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_coercion() {
        assert_eq!(Value::from(" 42 ").to_number(), 42.0);
        assert_eq!(Value::from("").to_number(), 0.0);
        assert_eq!(Value::from("0x10").to_number(), 16.0);
        assert!(Value::from("inf").to_number().is_nan());
        assert!(Value::Undefined.to_number().is_nan());
        assert_eq!(Value::Null.to_number(), 0.0);
    }

    #[test]
    fn test_loose_equality() {
        assert!(Value::Null.loose_equals(&Value::Undefined));
        assert!(Value::from("1").loose_equals(&Value::Number(1.0)));
        assert!(Value::Boolean(true).loose_equals(&Value::Number(1.0)));
        assert!(!Value::Null.loose_equals(&Value::Number(0.0)));
        assert!(!Value::Number(f64::NAN).loose_equals(&Value::Number(f64::NAN)));
    }

    #[test]
    fn test_identity() {
        let a = Value::new_object();
        let b = Value::new_object();
        assert!(a.same_value(&a.clone()));
        assert!(!a.same_value(&b));
        assert!(Value::Number(f64::NAN).same_value(&Value::Number(f64::NAN)));
    }

    #[test]
    fn test_array_properties() {
        let array = Value::array(vec![Value::Number(1.0)]);
        array.set_property("2", Value::from("x")).unwrap();

        assert_eq!(array.get_property("length").unwrap().to_number(), 3.0);
        assert!(array.get_property("1").unwrap().is_undefined());
        assert_eq!(array.to_display_string(), "1,,x");
        assert!(array.get_property("01").unwrap().is_undefined());
    }

    #[test]
    fn test_reading_from_undefined_fails() {
        let err = Value::Undefined.get_property("x").unwrap_err();
        assert_eq!(
            err.to_string(),
            "TypeError: Cannot read properties of undefined (reading 'x')"
        );
    }

    #[test]
    fn test_inspect() {
        let object = Value::object_from([
            ("answer".to_string(), Value::Number(42.0)),
            ("odd key".to_string(), Value::from("it's")),
            ("list".to_string(), Value::array(vec![Value::Boolean(true), Value::Null])),
        ]);
        assert_eq!(
            object.inspect(),
            "{ answer: 42, 'odd key': 'it\\'s', list: [ true, null ] }"
        );

        object.set_property("self", object.clone()).unwrap();
        assert!(object.inspect().ends_with("self: [Circular] }"));
    }

    #[test]
    fn test_json_conversion() {
        let json = serde_json::json!({ "name": "shim", "sizes": [1, 2.5], "nested": { "ok": true } });
        let value = Value::from_json(&json);
        assert_eq!(value.to_json().unwrap(), json);

        value.set_property("skip", Value::Undefined).unwrap();
        assert_eq!(value.to_json().unwrap(), json);

        value.set_property("again", value.clone()).unwrap();
        assert!(value.to_json().is_err());
    }
}
