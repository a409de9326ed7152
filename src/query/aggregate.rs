//! Aggregates over materialized results
//!
//! Absent fields read as null. `sum` counts non-numeric values as zero and
//! `average` divides by the number of rows, not the number of defined
//! values.

use std::cmp::Ordering;

use serde_json::Value;

use crate::filter::compare_values;
use crate::record::Model;

fn field(model: &Model, name: &str) -> Value {
    model.get(name).cloned().unwrap_or(Value::Null)
}

pub fn sum(models: &[Model], name: &str) -> f64 {
    models
        .iter()
        .map(|model| model.get(name).and_then(Value::as_f64).unwrap_or(0.0))
        .sum()
}

/// Rows whose field is present and not null
pub fn count_defined(models: &[Model], name: &str) -> usize {
    models
        .iter()
        .filter(|model| !matches!(model.get(name), None | Some(Value::Null)))
        .count()
}

pub fn average(models: &[Model], name: &str) -> Option<f64> {
    if models.is_empty() {
        return None;
    }
    Some(sum(models, name) / models.len() as f64)
}

/// Seeded with the first row's value, replaced only by strictly greater ones
pub fn max(models: &[Model], name: &str) -> Option<Value> {
    fold_extreme(models, name, Ordering::Greater)
}

/// Seeded with the first row's value, replaced only by strictly lesser ones
pub fn min(models: &[Model], name: &str) -> Option<Value> {
    fold_extreme(models, name, Ordering::Less)
}

fn fold_extreme(models: &[Model], name: &str, wanted: Ordering) -> Option<Value> {
    let (first, rest) = models.split_first()?;
    let mut extreme = field(first, name);
    for model in rest {
        let candidate = field(model, name);
        if compare_values(&candidate, &extreme) == Some(wanted) {
            extreme = candidate;
        }
    }
    Some(extreme)
}
