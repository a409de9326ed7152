//! Basic model operations
//!
//! - reads across the three storage shapes
//! - installation and naming errors
//! - single-field writes and memo invalidation

mod support;

use pretty_assertions::assert_eq;
use serde_json::json;
use storeql::{
    Database, EngineConfig, MemoryStore, ModelRegistry, ModelType, Operator, RowSet, StorageShape,
};

use support::{database, database_with, ids, names, registry, store};

// =============================================================================
// Reads
// =============================================================================

/// Array collection in storage order.
#[test]
fn test_all_users() {
    let db = database();
    assert_eq!(ids(&db.query("User").get().unwrap()), vec![1, 2, 3]);
}

/// Object collection in insertion order.
#[test]
fn test_all_items() {
    let db = database();
    assert_eq!(ids(&db.query("Item").get().unwrap()), vec![1, 2, 3, 4, 5]);
}

/// Single-item storage holds zero or one record.
#[test]
fn test_single_item_storage() {
    let settings = ModelType::builder("Settings")
        .path("settings")
        .shape(StorageShape::SingleItem)
        .primary_key("id")
        .prop("theme")
        .build()
        .unwrap();
    let registry = ModelRegistry::build([settings]).unwrap();
    let store = MemoryStore::new().with_module("settings", json!({"id": 1, "theme": "light"}));
    let db = Database::with_defaults(registry, store);
    db.install_all().unwrap();

    let current = db.query("Settings").first().unwrap().unwrap();
    assert_eq!(current.key(), "1");
    assert_eq!(db.position_index("Settings").unwrap(), None);

    current.set("theme", json!("dark")).unwrap();
    let current = db.query("Settings").first().unwrap().unwrap();
    assert_eq!(current.get("theme"), Some(&json!("dark")));

    db.replace_state("Settings", json!(null)).unwrap();
    assert!(db.query("Settings").get().unwrap().is_empty());
}

/// Keyed reads drop missing keys and follow key order.
#[test]
fn test_keyed_reads() {
    let db = database();
    let items = db.models("Item", &[json!(3), json!(9), json!(1)]).unwrap();
    assert_eq!(names(&items), vec!["Compass", "Pen"]);

    let index = db.model_index("Item", &[]).unwrap();
    assert_eq!(index.len(), 5);

    let key = db.key_of("OrderLine", &json!({"orderId": 102, "itemId": 1})).unwrap();
    let lines = db.index("OrderLine", &[json!([102, 1])]).unwrap();
    assert_eq!(lines.keys().collect::<Vec<_>>(), vec![&key]);
}

/// Results over caller-supplied rows; stored data is not consulted.
#[test]
fn test_get_from_supplied_rows() {
    let db = database();
    let rows = RowSet::from(vec![json!({"id": 7, "name": "Zoe"}), json!({"id": 8, "name": "Al"})]);
    let users = db
        .query("User")
        .where_(("id", Operator::Gt, 7))
        .get_from(rows)
        .unwrap();
    assert_eq!(names(&users), vec!["Al"]);
}

/// get_one keeps a candidate only while it satisfies the query.
#[test]
fn test_get_one() {
    let db = database();
    let george = db.query("User").first().unwrap().unwrap();
    let query = db.query("User").where_(("name", "George"));
    assert_eq!(query.get_one(george.clone()).unwrap().map(|user| user.key()), Some("1".to_string()));

    let strict = db.query("User").where_(("name", "Susan"));
    assert!(strict.get_one(george).unwrap().is_none());
}

// =============================================================================
// Errors
// =============================================================================

/// Reads before installation fail.
#[test]
fn test_query_before_install() {
    let db = Database::with_defaults(registry(), store());
    let err = db.query("User").get().unwrap_err();
    assert_eq!(err.code(), "STOREQL_GETTERS_NOT_INSTALLED");
}

/// Unknown model types fail at execution.
#[test]
fn test_unknown_model() {
    let db = database();
    let err = db.query("Ghost").get().unwrap_err();
    assert_eq!(err.code(), "STOREQL_UNKNOWN_MODEL");
}

/// Writing a field with no mutation fails.
#[test]
fn test_unknown_mutation() {
    let db = database();
    let user = db.query("User").first().unwrap().unwrap();
    let err = user.set("nickname", json!("G")).unwrap_err();
    assert_eq!(err.code(), "STOREQL_UNKNOWN_MUTATION");
}

/// Getter names follow the configured prefix and namespacing.
#[test]
fn test_flat_store_names() {
    let db = database_with(EngineConfig {
        prefix: "_".to_string(),
        namespaced: false,
        ..Default::default()
    });
    let user = db.model("User").unwrap();
    assert_eq!(db.getter_name(&user, "ordersBaseIndex"), "_usersOrdersBaseIndex");

    let first = db.query("User").first().unwrap().unwrap();
    assert_eq!(first.related("orders").unwrap().len(), 2);
}

// =============================================================================
// Writes
// =============================================================================

/// Writes land in storage; wrappers keep their snapshot.
#[test]
fn test_set_field() {
    let db = database();
    let susan = db.query("User").where_(("id", 2)).first().unwrap().unwrap();
    susan.set("name", json!("Sue")).unwrap();

    assert_eq!(susan.get("name"), Some(&json!("Susan")));
    let fresh = db.query("User").where_(("id", 2)).first().unwrap().unwrap();
    assert_eq!(fresh.get("name"), Some(&json!("Sue")));

    let item = db.query("Item").where_(("id", 5)).first().unwrap().unwrap();
    item.set("name", json!("Rubber")).unwrap();
    assert_eq!(db.state("items").unwrap()["5"]["name"], "Rubber");
}

/// Memoized results do not outlive a write.
#[test]
fn test_memo_invalidated_by_commit() {
    let db = database();
    let query = db.query("User").where_(("name", "Mike"));
    assert_eq!(ids(&query.get().unwrap()), vec![3]);
    assert_eq!(ids(&query.get().unwrap()), vec![3]);
    assert_eq!(db.metrics().snapshot().queries_executed, 1);

    let mike = query.first().unwrap().unwrap();
    mike.set("name", json!("Michael")).unwrap();
    assert!(query.get().unwrap().is_empty());
    assert_eq!(db.metrics().snapshot().queries_executed, 2);
}

/// Wrapping after filtering gives the same results.
#[test]
fn test_wrap_after_filter() {
    let db = database_with(EngineConfig {
        model_before_filter: false,
        ..Default::default()
    });
    let users = db.query("User").where_in("id", [2, 3]).get().unwrap();
    assert_eq!(ids(&users), vec![2, 3]);
    assert_eq!(users[0].related("favoriteItems").unwrap().keys(), vec!["1", "4"]);
}
