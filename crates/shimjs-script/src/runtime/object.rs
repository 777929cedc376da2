// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Plain script objects.

use super::Value;
use rustc_hash::FxHashMap;

/// An object's own properties, in insertion order.
#[derive(Clone, Default)]
pub struct JsObject {
    keys: Vec<String>,
    values: FxHashMap<String, Value>,
}

impl JsObject {
    /// Creates an empty object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an own property.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    /// Sets an own property, appending new keys at the end.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        if !self.values.contains_key(&key) {
            self.keys.push(key.clone());
        }
        self.values.insert(key, value);
    }

    /// Whether the object has an own property named `key`.
    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Own property names in insertion order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Own properties in insertion order.
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.keys
            .iter()
            .filter_map(|key| self.values.get(key).map(|value| (key.clone(), value.clone())))
            .collect()
    }

    /// Number of own properties.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the object has no own properties.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl FromIterator<(String, Value)> for JsObject {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut object = JsObject::new();
        for (key, value) in iter {
            object.set(key, value);
        }
        object
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_survives_overwrite() {
        let mut object = JsObject::new();
        object.set("b", Value::Number(1.0));
        object.set("a", Value::Number(2.0));
        object.set("b", Value::Number(3.0));

        assert_eq!(object.keys(), ["b".to_string(), "a".to_string()]);
        assert!(matches!(object.get("b"), Some(Value::Number(n)) if n == 3.0));
        assert_eq!(object.len(), 2);
    }
}
