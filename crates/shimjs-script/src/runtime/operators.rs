// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Binary operator semantics.

use super::Value;
use crate::ast::BinaryOperator;
use std::cmp::Ordering;

/// Applies a binary operator. Never fails: bad operands give NaN or false.
pub fn binary_operation(operator: BinaryOperator, left: &Value, right: &Value) -> Value {
    match operator {
        BinaryOperator::Add => add(left, right),
        BinaryOperator::Subtract => Value::Number(left.to_number() - right.to_number()),
        BinaryOperator::Multiply => Value::Number(left.to_number() * right.to_number()),
        BinaryOperator::Divide => Value::Number(left.to_number() / right.to_number()),
        BinaryOperator::Remainder => Value::Number(left.to_number() % right.to_number()),
        BinaryOperator::LessThan => Value::Boolean(compare(left, right) == Some(Ordering::Less)),
        BinaryOperator::LessThanEqual => Value::Boolean(matches!(
            compare(left, right),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinaryOperator::GreaterThan => {
            Value::Boolean(compare(left, right) == Some(Ordering::Greater))
        }
        BinaryOperator::GreaterThanEqual => Value::Boolean(matches!(
            compare(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        BinaryOperator::Equal => Value::Boolean(left.loose_equals(right)),
        BinaryOperator::NotEqual => Value::Boolean(!left.loose_equals(right)),
        BinaryOperator::StrictEqual => Value::Boolean(left.strict_equals(right)),
        BinaryOperator::StrictNotEqual => Value::Boolean(!left.strict_equals(right)),
    }
}

fn is_primitive(value: &Value) -> bool {
    !matches!(value, Value::Object(_) | Value::Array(_) | Value::Function(_))
}

/// Objects take part in `+` and comparisons through their string form
fn to_primitive(value: &Value) -> Value {
    if is_primitive(value) {
        value.clone()
    } else {
        Value::from(value.to_display_string())
    }
}

fn add(left: &Value, right: &Value) -> Value {
    let left = to_primitive(left);
    let right = to_primitive(right);

    if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) {
        let mut joined = left.to_display_string();
        joined.push_str(&right.to_display_string());
        Value::from(joined)
    } else {
        Value::Number(left.to_number() + right.to_number())
    }
}

/// None when either side is NaN
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    let left = to_primitive(left);
    let right = to_primitive(right);

    match (&left, &right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => left.to_number().partial_cmp(&right.to_number()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(operator: BinaryOperator, left: Value, right: Value) -> Value {
        binary_operation(operator, &left, &right)
    }

    #[test]
    fn test_addition_concatenates_strings() {
        let v = op(BinaryOperator::Add, Value::from("a"), Value::Number(1.0));
        assert_eq!(v.as_str(), Some("a1"));
        let v = op(BinaryOperator::Add, Value::Number(1.0), Value::Number(2.0));
        assert_eq!(v.as_number(), Some(3.0));
        let v = op(BinaryOperator::Add, Value::array(vec![Value::Number(1.0)]), Value::Number(1.0));
        assert_eq!(v.as_str(), Some("11"));
    }

    #[test]
    fn test_comparisons() {
        assert!(op(BinaryOperator::LessThan, Value::from("a"), Value::from("b")).to_boolean());
        assert!(op(BinaryOperator::GreaterThanEqual, Value::Number(2.0), Value::from("2")).to_boolean());
        assert!(!op(BinaryOperator::LessThan, Value::Number(f64::NAN), Value::Number(1.0)).to_boolean());
        assert!(!op(BinaryOperator::GreaterThanEqual, Value::Undefined, Value::Number(0.0)).to_boolean());
    }

    #[test]
    fn test_remainder_and_division() {
        assert_eq!(op(BinaryOperator::Remainder, Value::Number(7.0), Value::Number(3.0)).as_number(), Some(1.0));
        assert_eq!(
            op(BinaryOperator::Divide, Value::Number(1.0), Value::Number(0.0)).as_number(),
            Some(f64::INFINITY)
        );
    }
}
