//! Shared fixtures: users, items, orders and order lines
//!
//! - users: array collection
//! - items: object collection keyed by id
//! - orders: array collection
//! - order lines: array collection with a composite key

#![allow(dead_code)]

use std::rc::Rc;

use serde_json::{json, Value};
use storeql::{
    Database, EngineConfig, MemoryStore, Model, ModelRegistry, ModelType, Related, StorageShape,
};

pub fn user_model() -> ModelType {
    ModelType::builder("User")
        .path("users")
        .shape(StorageShape::ArrayCollection)
        .primary_key("id")
        .prop("name")
        .prop("favoriteItemIds")
        .prop("oldId")
        .prop("sortNo")
        .has_many_by("orders", "Order", "userId")
        .has_many_with("favoriteItems", "Item", "favoriteItemIds")
        .build()
        .unwrap()
}

pub fn item_model() -> ModelType {
    ModelType::builder("Item")
        .path("items")
        .shape(StorageShape::ObjectCollection)
        .primary_key("id")
        .prop("name")
        .has_many_by("orderLines", "OrderLine", "itemId")
        .has_many_through("orders", "Order", "OrderLine", "itemId", "orderId")
        .has_many_by("favoritedByUsers", "User", "favoriteItemIds")
        .build()
        .unwrap()
}

pub fn order_model() -> ModelType {
    ModelType::builder("Order")
        .path("orders")
        .shape(StorageShape::ArrayCollection)
        .primary_key("id")
        .prop("userId")
        .belongs_to("user", "User", "userId")
        .has_many_by("orderLines", "OrderLine", "orderId")
        .has_many_through("items", "Item", "OrderLine", "orderId", "itemId")
        .build()
        .unwrap()
}

pub fn order_line_model() -> ModelType {
    ModelType::builder("OrderLine")
        .path("orderLines")
        .shape(StorageShape::ArrayCollection)
        .primary_key("orderId")
        .primary_key("itemId")
        .belongs_to("item", "Item", "itemId")
        .belongs_to("order", "Order", "orderId")
        .build()
        .unwrap()
}

pub fn users_state() -> Value {
    json!([
        {"id": 1, "name": "George", "favoriteItemIds": [1, 2], "oldId": 837, "sortNo": 1},
        {"id": 2, "name": "Susan", "favoriteItemIds": [1, 4], "sortNo": 1},
        {"id": 3, "name": "Mike", "favoriteItemIds": [], "oldId": 3, "sortNo": 2}
    ])
}

pub fn items_state() -> Value {
    json!({
        "1": {"id": 1, "name": "Pen"},
        "2": {"id": 2, "name": "Paper"},
        "3": {"id": 3, "name": "Compass"},
        "4": {"id": 4, "name": "Ruler"},
        "5": {"id": 5, "name": "Eraser"}
    })
}

pub fn orders_state() -> Value {
    json!([
        {"id": 101, "userId": 1},
        {"id": 102, "userId": 1},
        {"id": 201, "userId": 2}
    ])
}

pub fn order_lines_state() -> Value {
    json!([
        {"orderId": 101, "itemId": 1},
        {"orderId": 101, "itemId": 2},
        {"orderId": 102, "itemId": 1},
        {"orderId": 201, "itemId": 5}
    ])
}

pub fn store() -> MemoryStore {
    MemoryStore::new()
        .with_module("users", users_state())
        .with_module("items", items_state())
        .with_module("orders", orders_state())
        .with_module("orderLines", order_lines_state())
}

pub fn registry() -> ModelRegistry {
    ModelRegistry::build([user_model(), item_model(), order_model(), order_line_model()]).unwrap()
}

/// Database over the fixture store with every model installed
pub fn database_with(config: EngineConfig) -> Rc<Database> {
    let db = Database::new(registry(), store(), config);
    db.install_all().unwrap();
    db
}

pub fn database() -> Rc<Database> {
    database_with(EngineConfig::default())
}

/// Integer field of every model, in order
pub fn field_of(models: &[Model], field: &str) -> Vec<i64> {
    models
        .iter()
        .map(|model| model.get(field).and_then(Value::as_i64).unwrap_or(-1))
        .collect()
}

pub fn ids(models: &[Model]) -> Vec<i64> {
    field_of(models, "id")
}

pub fn names(models: &[Model]) -> Vec<String> {
    models
        .iter()
        .map(|model| {
            model
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        })
        .collect()
}

pub fn related_ids(related: &Related) -> Vec<i64> {
    ids(related.many())
}
