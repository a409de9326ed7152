//! Value comparison
//!
//! - Missing fields compare as null
//! - Numbers compare numerically (`1 == 1.0`)
//! - Ordering is defined only between two numbers, two strings or two
//!   booleans; any other pair fails every ordering operator

use std::cmp::Ordering;

use serde_json::Value;

use super::condition::Operator;

/// Structural equality with numeric comparison of numbers
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).map_or(false, |y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

/// Ordering between comparable values
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Applies `operator` to a field value (missing reads as null) and an operand value
pub fn apply(operator: Operator, field: Option<&Value>, value: &Value) -> bool {
    let field = field.unwrap_or(&Value::Null);
    match operator {
        Operator::Eq => values_equal(field, value),
        Operator::Ne => !values_equal(field, value),
        Operator::Lt => compare_values(field, value) == Some(Ordering::Less),
        Operator::Gt => compare_values(field, value) == Some(Ordering::Greater),
        Operator::Le => matches!(
            compare_values(field, value),
            Some(Ordering::Less | Ordering::Equal)
        ),
        Operator::Ge => matches!(
            compare_values(field, value),
            Some(Ordering::Greater | Ordering::Equal)
        ),
    }
}

/// Inclusive range check
pub fn between(field: Option<&Value>, bounds: &Value) -> bool {
    let low = bounds.get(0).unwrap_or(&Value::Null);
    let high = bounds.get(1).unwrap_or(&Value::Null);
    apply(Operator::Ge, field, low) && apply(Operator::Le, field, high)
}
