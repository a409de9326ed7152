//! Generated mutation tables
//!
//! One single-field setter per plain field. Where the value lands depends on
//! the storage shape:
//! - object collection: `state[key][field]`
//! - array collection: `state[position][field]`
//! - single item: `state[field]`

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{StoreError, StoreResult};
use crate::model::{ModelType, StorageShape};

/// A mutation: applies one payload to the state of the module at the given
/// path.
pub type MutationFn = Rc<dyn Fn(&str, &mut Value, &MutationPayload) -> StoreResult<()>>;

/// Single-field write payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationPayload {
    /// Target record key
    pub key: String,
    /// Target position, resolved before commit for ordered-list storage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    pub new_value: Value,
}

impl MutationPayload {
    pub fn new(key: impl Into<String>, new_value: Value) -> Self {
        Self {
            key: key.into(),
            position: None,
            new_value,
        }
    }

    pub fn with_position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }
}

fn target_not_found(path: &str, payload: &MutationPayload) -> StoreError {
    StoreError::TargetNotFound {
        path: path.to_string(),
        key: payload.key.clone(),
    }
}

fn set_field(target: Option<&mut Value>, field: &str, value: Value) -> bool {
    match target {
        Some(Value::Object(record)) => {
            record.insert(field.to_string(), value);
            true
        }
        _ => false,
    }
}

fn setter(shape: StorageShape, field: String) -> MutationFn {
    Rc::new(move |path: &str, state: &mut Value, payload: &MutationPayload| {
        let target = match shape {
            StorageShape::ObjectCollection => state.get_mut(payload.key.as_str()),
            StorageShape::ArrayCollection => match payload.position {
                Some(position) => state.get_mut(position),
                None => None,
            },
            StorageShape::SingleItem => Some(state),
        };

        if set_field(target, &field, payload.new_value.clone()) {
            Ok(())
        } else {
            Err(target_not_found(path, payload))
        }
    })
}

/// Setter per plain field, keyed by field name
pub(crate) fn model_mutations(model: &ModelType) -> Vec<(String, MutationFn)> {
    model
        .plain_fields()
        .map(|field| (field.to_string(), setter(model.shape(), field.to_string())))
        .collect()
}
