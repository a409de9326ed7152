//! Primary-key shortcut
//!
//! Conditions that pin the declared key field to literal values are turned
//! into a key list, so only those records are fetched from storage. The
//! conditions themselves are still evaluated on the fetched candidates:
//! keys are stringified, so `"1"` and `1` share a key but do not compare
//! equal.
//!
//! Rules:
//! - only when no condition uses OR
//! - only non-negated `=` and `in` on exactly the key field(s)
//! - only literal values (never computed ones)
//! - several such conditions intersect

use serde_json::Value;

use crate::filter::{Condition, ConditionKind, Conjunction, InValues, Operand, Operator};
use crate::model::ModelType;

/// Candidate keys for the storage fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    /// `None`: scan everything; `Some(empty)`: nothing can match
    pub primary_keys: Option<Vec<String>>,
}

pub fn plan(model: &ModelType, conditions: &[Condition]) -> Plan {
    if conditions
        .iter()
        .any(|condition| condition.conjunction == Conjunction::Or)
    {
        return Plan { primary_keys: None };
    }

    let mut primary_keys: Option<Vec<String>> = None;
    for keys in conditions
        .iter()
        .filter_map(|condition| key_values(model, condition))
    {
        primary_keys = Some(match primary_keys {
            None => keys,
            Some(previous) => previous
                .into_iter()
                .filter(|key| keys.contains(key))
                .collect(),
        });
    }

    Plan { primary_keys }
}

/// Keys pinned by one condition, if it qualifies
fn key_values(model: &ModelType, condition: &Condition) -> Option<Vec<String>> {
    if condition.not {
        return None;
    }
    let key_field = model.key_field();

    match &condition.kind {
        ConditionKind::Compare {
            property,
            operator: Operator::Eq,
            value: Operand::Literal(value),
        } if property == key_field => Some(vec![model.key_of(value)]),
        ConditionKind::In {
            property,
            value: InValues::Set(set),
        } if property == key_field => Some(model.keys_of(set.members())),
        ConditionKind::In {
            property,
            value: InValues::Operand(Operand::Literal(Value::Array(tuples))),
        } if property == key_field && property.is_composite() => Some(model.keys_of(tuples)),
        _ => None,
    }
}
