//! Filter condition tests
//!
//! - where / or_where / where_not / or_where_not
//! - between, in and null families
//! - grouped conditions and left-to-right accumulation
//! - primary-key shortcut equivalence

mod support;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use storeql::filter::Operand;
use storeql::{Clause, Operator, Row, RowSet};

use support::{database, ids};

// =============================================================================
// where
// =============================================================================

/// Field, operator and value.
#[test]
fn test_where_operator() {
    let db = database();
    let user = db.query("User").where_(("id", Operator::Gt, 1)).first().unwrap().unwrap();
    assert_eq!(user.key(), "2");
}

/// Field and value default to equality.
#[test]
fn test_where_equality() {
    let db = database();
    let users = db.query("User").where_(("name", "George")).get().unwrap();
    assert_eq!(ids(&users), vec![1]);
}

/// Value computed from the row under test.
#[test]
fn test_where_computed_value() {
    let db = database();
    let old_id = Operand::computed(|row: &Row| row.get("oldId").cloned().unwrap_or(Value::Null));
    let users = db.query("User").where_(("id", old_id)).get().unwrap();
    assert_eq!(ids(&users), vec![3]);
}

/// Partial record match.
#[test]
fn test_where_object() {
    let db = database();
    let users = db
        .query("User")
        .where_(json!({"id": 1, "name": "George"}))
        .get()
        .unwrap();
    assert_eq!(ids(&users), vec![1]);

    let none = db
        .query("User")
        .where_(json!({"id": 1, "name": "Susan"}))
        .get()
        .unwrap();
    assert!(none.is_empty());
}

/// A non-object value clause fails at execution.
#[test]
fn test_where_non_object_value() {
    let db = database();
    let err = db.query("User").where_(json!([1, 2])).get().unwrap_err();
    assert_eq!(err.code(), "STOREQL_INVALID_CLAUSE");

    let err = db.query("User").or_where_not(json!("George")).count().unwrap_err();
    assert_eq!(err.code(), "STOREQL_INVALID_CLAUSE");
}

/// Predicate over the row.
#[test]
fn test_where_predicate() {
    let db = database();
    let users = db
        .query("User")
        .where_(Clause::predicate(|row| row.get("id") == Some(&json!(1))))
        .get()
        .unwrap();
    assert_eq!(ids(&users), vec![1]);
}

#[test]
fn test_where_not() {
    let db = database();
    let user = db.query("User").where_not(("id", 1)).first().unwrap().unwrap();
    assert_eq!(user.get("id"), Some(&json!(2)));
}

#[test]
fn test_or_where() {
    let db = database();
    let users = db
        .query("User")
        .where_(("id", 1))
        .or_where(("id", 2))
        .get()
        .unwrap();
    assert_eq!(ids(&users), vec![1, 2]);
}

#[test]
fn test_or_where_not() {
    let db = database();
    let users = db
        .query("User")
        .where_(("id", 1))
        .or_where_not(("id", 2))
        .get()
        .unwrap();
    assert_eq!(ids(&users), vec![1, 3]);
}

#[test]
fn test_combined_where() {
    let db = database();
    let users = db
        .query("User")
        .where_(("id", Operator::Gt, 1))
        .where_(("id", Operator::Lt, 3))
        .get()
        .unwrap();
    assert_eq!(ids(&users), vec![2]);
}

/// Conditions combine strictly left to right.
#[test]
fn test_left_to_right_accumulation() {
    let db = database();
    // (id = 3 OR id = 1) AND name = George
    let users = db
        .query("User")
        .where_(("id", 3))
        .or_where(("id", 1))
        .where_(("name", "George"))
        .get()
        .unwrap();
    assert_eq!(ids(&users), vec![1]);
}

/// Groups nest explicitly.
#[test]
fn test_where_query_group() {
    let db = database();
    // id = 3 OR (id = 1 AND name = George)
    let users = db
        .query("User")
        .where_(("id", 3))
        .or_where_query(|q| q.where_(("id", 1)).where_(("name", "George")))
        .get()
        .unwrap();
    assert_eq!(ids(&users), vec![1, 3]);

    let users = db
        .query("User")
        .where_not_query(|q| q.where_(("id", 1)).or_where(("id", 2)))
        .get()
        .unwrap();
    assert_eq!(ids(&users), vec![3]);
}

/// Composite properties compare element-wise.
#[test]
fn test_where_composite_key() {
    let db = database();
    let lines = db
        .query("OrderLine")
        .where_((["orderId", "itemId"], json!([101, 1])))
        .get()
        .unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].get("itemId"), Some(&json!(1)));
    assert_eq!(lines[0].key(), "[101,1]");
}

// =============================================================================
// between
// =============================================================================

#[test]
fn test_where_between() {
    let db = database();
    let users = db.query("User").where_between("id", [2, 3]).get().unwrap();
    assert_eq!(ids(&users), vec![2, 3]);
}

#[test]
fn test_or_where_between() {
    let db = database();
    let users = db
        .query("User")
        .where_(("id", 1))
        .or_where_between("id", [2, 3])
        .get()
        .unwrap();
    assert_eq!(ids(&users), vec![1, 2, 3]);
}

#[test]
fn test_where_not_between() {
    let db = database();
    let users = db
        .query("User")
        .where_(("id", 1))
        .where_not_between("id", [2, 3])
        .get()
        .unwrap();
    assert_eq!(ids(&users), vec![1]);
}

#[test]
fn test_or_where_not_between() {
    let db = database();
    let users = db
        .query("User")
        .where_(("id", 1))
        .or_where_not_between("id", [2, 3])
        .get()
        .unwrap();
    assert_eq!(ids(&users), vec![1]);
}

// =============================================================================
// in
// =============================================================================

#[test]
fn test_where_in() {
    let db = database();
    let users = db.query("User").where_in("id", [1, 3]).get().unwrap();
    assert_eq!(ids(&users), vec![1, 3]);
}

#[test]
fn test_or_where_in() {
    let db = database();
    let users = db
        .query("User")
        .where_in("id", [1, 3])
        .or_where_in("id", [2, 3])
        .get()
        .unwrap();
    assert_eq!(ids(&users), vec![1, 2, 3]);
}

#[test]
fn test_where_not_in() {
    let db = database();
    let users = db
        .query("User")
        .where_in("id", [1, 3])
        .where_not_in("id", [2, 3])
        .get()
        .unwrap();
    assert_eq!(ids(&users), vec![1]);
}

/// A leading OR condition still sets the result outright.
#[test]
fn test_or_where_not_in_alone() {
    let db = database();
    let users = db.query("User").or_where_not_in("id", [2]).get().unwrap();
    assert_eq!(ids(&users), vec![1, 3]);
}

/// An empty candidate list matches nothing.
#[test]
fn test_where_in_empty() {
    let db = database();
    let users = db.query("User").where_in("id", Vec::<i64>::new()).get().unwrap();
    assert!(users.is_empty());
}

/// Static lists and computed lists select the same rows.
#[test]
fn test_where_in_static_matches_computed() {
    let db = database();
    let fixed = db.query("User").where_in("name", ["Mike", "George"]).get().unwrap();
    let computed = db
        .query("User")
        .where_in(
            "name",
            Operand::computed(|_: &Row| json!(["Mike", "George"])),
        )
        .get()
        .unwrap();
    assert_eq!(ids(&fixed), ids(&computed));
    assert_eq!(ids(&fixed), vec![1, 3]);
}

/// Object members match regardless of key order, static or computed.
#[test]
fn test_where_in_object_members() {
    let db = database();
    let rows = || RowSet::from(vec![json!({"id": 1, "meta": {"a": 1, "b": 2}}), json!({"id": 2, "meta": {"a": 2}})]);
    let fixed = db
        .query("User")
        .where_in("meta", [json!({"b": 2, "a": 1})])
        .get_from(rows())
        .unwrap();
    let computed = db
        .query("User")
        .where_in("meta", Operand::computed(|_: &Row| json!([{"b": 2, "a": 1}])))
        .get_from(rows())
        .unwrap();
    assert_eq!(ids(&fixed), vec![1]);
    assert_eq!(ids(&fixed), ids(&computed));
}

/// Composite membership against tuples.
#[test]
fn test_where_in_composite() {
    let db = database();
    let lines = db
        .query("OrderLine")
        .where_in(["orderId", "itemId"], json!([[101, 2], [201, 5], [999, 1]]))
        .get()
        .unwrap();
    let keys: Vec<String> = lines.iter().map(|line| line.key()).collect();
    assert_eq!(keys, vec!["[101,2]", "[201,5]"]);
}

// =============================================================================
// null
// =============================================================================

/// Absent fields read as null.
#[test]
fn test_where_null() {
    let db = database();
    let users = db.query("User").where_null("oldId").get().unwrap();
    assert_eq!(ids(&users), vec![2]);

    let users = db.query("User").where_not_null("oldId").get().unwrap();
    assert_eq!(ids(&users), vec![1, 3]);
}

// =============================================================================
// Primary-key shortcut
// =============================================================================

/// Key conditions produce the same rows with or without the shortcut.
#[test]
fn test_pk_shortcut_equivalence() {
    let db = database();
    let shortcut = db.query("User").where_in("id", [3, 1]).where_(("name", "Mike")).get().unwrap();
    let scanned = db
        .query("User")
        .where_(Clause::predicate(|row| {
            matches!(row.get("id").and_then(Value::as_i64), Some(1) | Some(3))
        }))
        .where_(("name", "Mike"))
        .get()
        .unwrap();
    assert_eq!(ids(&shortcut), ids(&scanned));

    let snapshot = db.metrics().snapshot();
    assert_eq!(snapshot.pk_shortcuts, 1);
    assert_eq!(snapshot.queries_executed, 2);
}

/// A key literal of another type shares the stringified key but is not
/// equal, with or without the shortcut.
#[test]
fn test_pk_shortcut_type_mismatch() {
    let db = database();
    let shortcut = db.query("User").where_(("id", "1")).get().unwrap();
    let scanned = db
        .query("User")
        .where_(("id", "1"))
        .or_where(Clause::predicate(|_| false))
        .get()
        .unwrap();
    assert!(shortcut.is_empty());
    assert_eq!(ids(&shortcut), ids(&scanned));

    let listed = db.query("User").where_in("id", ["1", "3"]).get().unwrap();
    assert!(listed.is_empty());
    assert_eq!(db.metrics().snapshot().pk_shortcuts, 2);
}

/// Disjoint key conditions select nothing.
#[test]
fn test_pk_shortcut_intersection() {
    let db = database();
    let users = db.query("User").where_(("id", 1)).where_(("id", 2)).get().unwrap();
    assert!(users.is_empty());
}

/// Supplied rows are filtered by the key condition too.
#[test]
fn test_key_condition_on_supplied_rows() {
    let db = database();
    let rows = RowSet::from(vec![json!({"id": 1}), json!({"id": 2})]);
    let users = db.query("User").where_(("id", 2)).get_from(rows).unwrap();
    assert_eq!(ids(&users), vec![2]);
}

/// Object collections keep their shape through filtering.
#[test]
fn test_filtered_keeps_keyed_shape() {
    let db = database();
    let index = db.index("Item", &[]).unwrap();
    let filtered = db
        .query("Item")
        .where_(("id", Operator::Ge, 4))
        .filtered(Some(RowSet::from(index)))
        .unwrap();
    match filtered {
        RowSet::Index(rows) => assert_eq!(rows.keys().collect::<Vec<_>>(), vec!["4", "5"]),
        RowSet::List(_) => panic!("expected keyed rows"),
    }
}
