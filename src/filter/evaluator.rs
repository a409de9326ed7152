//! Condition list evaluation
//!
//! Conditions accumulate strictly left to right: the first one sets the
//! result, each later one combines with AND or OR according to its own
//! conjunction. Only `Group` conditions nest. An empty list matches.

use serde_json::Value;

use super::compare::{apply, between, values_equal};
use super::condition::{Condition, ConditionKind, Conjunction, InValues};
use crate::index::FieldSpec;
use crate::query::Row;

/// Whether `row` satisfies `conditions`
pub fn matches(row: &Row, conditions: &[Condition]) -> bool {
    let mut result: Option<bool> = None;

    for condition in conditions {
        let mut current = evaluate(row, &condition.kind);
        if condition.not {
            current = !current;
        }

        result = Some(match (result, condition.conjunction) {
            (None, _) => current,
            (Some(acc), Conjunction::And) => acc && current,
            (Some(acc), Conjunction::Or) => acc || current,
        });
    }

    result.unwrap_or(true)
}

fn evaluate(row: &Row, kind: &ConditionKind) -> bool {
    match kind {
        ConditionKind::Compare {
            property,
            operator,
            value,
        } => {
            let value = value.resolve(row);
            match property {
                FieldSpec::Single(field) => apply(*operator, row.get(field), &value),
                FieldSpec::Composite(fields) => fields.iter().enumerate().all(|(i, field)| {
                    apply(*operator, row.get(field), value.get(i).unwrap_or(&Value::Null))
                }),
            }
        }
        ConditionKind::Between { property, value } => {
            let value = value.resolve(row);
            match property {
                FieldSpec::Single(field) => between(row.get(field), &value),
                FieldSpec::Composite(fields) => fields.iter().enumerate().all(|(i, field)| {
                    between(row.get(field), value.get(i).unwrap_or(&Value::Null))
                }),
            }
        }
        ConditionKind::In { property, value } => evaluate_in(row, property, value),
        ConditionKind::Object(expected) => expected
            .iter()
            .all(|(field, value)| values_equal(row.get(field).unwrap_or(&Value::Null), value)),
        ConditionKind::Predicate(predicate) => predicate(row),
        ConditionKind::Group(conditions) => matches(row, conditions),
    }
}

fn evaluate_in(row: &Row, property: &FieldSpec, candidates: &InValues) -> bool {
    match candidates {
        InValues::Set(set) => match property {
            FieldSpec::Single(field) => set.contains(row.get(field).unwrap_or(&Value::Null)),
            FieldSpec::Composite(_) => set.contains(&row.read(property)),
        },
        InValues::Operand(operand) => {
            let candidates = operand.resolve(row);
            let Some(candidates) = candidates.as_array() else {
                return false;
            };
            let actual = row.read(property);
            candidates
                .iter()
                .any(|candidate| values_equal(&actual, candidate))
        }
    }
}
