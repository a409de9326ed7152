//! Storage shapes
//!
//! Each shape answers the same `{items, index, position_index}` contract
//! over the raw module state.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::index::{build_index, ItemIndex, PositionIndex, Record};
use crate::store::{StoreError, StoreResult};

/// How a model's records are laid out in store state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StorageShape {
    /// Object whose values are records, keyed by record key
    ObjectCollection,
    /// Ordered array of records
    ArrayCollection,
    /// One record
    SingleItem,
}

impl StorageShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageShape::ObjectCollection => "objectCollection",
            StorageShape::ArrayCollection => "arrayCollection",
            StorageShape::SingleItem => "singleItem",
        }
    }

    /// All records in storage order.
    ///
    /// A null single-item state holds no record.
    pub fn items(&self, path: &str, state: &Value) -> StoreResult<Vec<Record>> {
        match (self, state) {
            (StorageShape::ObjectCollection, Value::Object(map)) => {
                Ok(map.values().cloned().map(Rc::new).collect())
            }
            (StorageShape::ArrayCollection, Value::Array(items)) => {
                Ok(items.iter().cloned().map(Rc::new).collect())
            }
            (StorageShape::SingleItem, Value::Null) => Ok(Vec::new()),
            (StorageShape::SingleItem, Value::Object(_)) => Ok(vec![Rc::new(state.clone())]),
            _ => Err(self.mismatch(path)),
        }
    }

    /// Key to record.
    ///
    /// Object collections are already keyed; other shapes are indexed with
    /// `key` (last write wins).
    pub fn index<F>(&self, path: &str, state: &Value, key: F) -> StoreResult<ItemIndex>
    where
        F: Fn(&Value) -> String,
    {
        match (self, state) {
            (StorageShape::ObjectCollection, Value::Object(map)) => Ok(map
                .iter()
                .map(|(k, item)| (k.clone(), Rc::new(item.clone())))
                .collect()),
            (StorageShape::ObjectCollection, _) => Err(self.mismatch(path)),
            _ => Ok(build_index(self.items(path, state)?, |item: &Record| key(item.as_ref()))),
        }
    }

    /// Key to array position; only ordered-list storage has one.
    pub fn position_index<F>(&self, path: &str, state: &Value, key: F) -> StoreResult<Option<PositionIndex>>
    where
        F: Fn(&Value) -> String,
    {
        match (self, state) {
            (StorageShape::ArrayCollection, Value::Array(items)) => {
                let mut positions = IndexMap::with_capacity(items.len());
                for (position, item) in items.iter().enumerate() {
                    positions.insert(key(item), position);
                }
                Ok(Some(positions))
            }
            (StorageShape::ArrayCollection, _) => Err(self.mismatch(path)),
            _ => Ok(None),
        }
    }

    fn mismatch(&self, path: &str) -> StoreError {
        StoreError::StateShape {
            path: path.to_string(),
            expected: self.as_str(),
        }
    }
}

impl fmt::Display for StorageShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn id_key(value: &Value) -> String {
        value["id"].to_string()
    }

    #[test]
    fn test_object_collection() {
        let state = json!({"1": {"id": 1, "name": "Pen"}, "2": {"id": 2, "name": "Paper"}});
        let shape = StorageShape::ObjectCollection;
        assert_eq!(shape.items("items", &state).unwrap().len(), 2);
        let index = shape.index("items", &state, id_key).unwrap();
        assert_eq!(index["2"]["name"], "Paper");
        assert_eq!(shape.position_index("items", &state, id_key).unwrap(), None);
    }

    #[test]
    fn test_array_collection() {
        let state = json!([{"id": 3}, {"id": 1}]);
        let shape = StorageShape::ArrayCollection;
        let index = shape.index("users", &state, id_key).unwrap();
        assert_eq!(index.keys().collect::<Vec<_>>(), vec!["3", "1"]);
        let positions = shape.position_index("users", &state, id_key).unwrap().unwrap();
        assert_eq!(positions["1"], 1);
    }

    #[test]
    fn test_single_item() {
        let shape = StorageShape::SingleItem;
        let state = json!({"id": 9, "theme": "dark"});
        assert_eq!(shape.items("settings", &state).unwrap().len(), 1);
        assert!(shape.items("settings", &Value::Null).unwrap().is_empty());
        assert!(shape.index("settings", &state, id_key).unwrap().contains_key("9"));
    }

    #[test]
    fn test_shape_mismatch() {
        let err = StorageShape::ArrayCollection
            .items("users", &json!({"a": 1}))
            .unwrap_err();
        assert_eq!(err.code(), "STOREQL_STATE_SHAPE");
    }
}
