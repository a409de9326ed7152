//! Collection-by-foreign-key relation
//!
//! Base index: source key -> target rows sharing that foreign key, built in
//! one pass over the targets. A target holding an array of foreign keys
//! lands in every matching bucket.
//!
//! Queried index: the base index with the relation's default query applied
//! per bucket, or the base index itself when no default query is declared.
//! Resolving one source record applies the default query to its bucket
//! only.

use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;

use super::{RelatedRows, RelationDef, RelationKind};
use crate::database::Database;
use crate::error::Result;
use crate::index::{compute_foreign_key, group_index};
use crate::query::{Row, RowSet};
use crate::store::{GetterFn, GetterValue};

pub(super) fn base_index_name(field: &str) -> String {
    format!("{}BaseIndex", field)
}

fn queried_index_name(field: &str) -> String {
    format!("{}QueriedIndex", field)
}

pub(super) fn index_getters(relation: &Rc<RelationDef>) -> Vec<(String, GetterFn)> {
    let def = Rc::clone(relation);
    let base: GetterFn = Rc::new(move |db: &Rc<Database>, _: Option<&Value>| {
        Ok(GetterValue::Grouped(base_index(db, &def)?))
    });

    let def = Rc::clone(relation);
    let queried: GetterFn = Rc::new(move |db: &Rc<Database>, _: Option<&Value>| {
        Ok(GetterValue::Grouped(queried_index(db, &def)?))
    });

    vec![
        (base_index_name(&relation.field), base),
        (queried_index_name(&relation.field), queried),
    ]
}

fn base_index(db: &Rc<Database>, relation: &RelationDef) -> Result<IndexMap<String, Vec<Row>>> {
    let RelationKind::HasManyBy { fk_field } = &relation.kind else {
        return Ok(IndexMap::new());
    };
    let source = db.model(&relation.source)?;
    let target = db.model(&relation.target)?;

    let rows = db.fetch_items(&target, None)?.into_iter().map(Row::Item);
    Ok(group_index(rows, |row: &Row| {
        compute_foreign_key(
            row.data(),
            source.key_field(),
            source.key_function(),
            Some(fk_field),
        )
        .into_vec()
    }))
}

fn queried_index(db: &Rc<Database>, relation: &RelationDef) -> Result<IndexMap<String, Vec<Row>>> {
    let source = db.model(&relation.source)?;
    let name = base_index_name(&relation.field);
    let index = db.getter(&source, &name, None)?.into_grouped(&name)?;

    let Some(query) = relation.default_query(db) else {
        return Ok(index);
    };

    let mut queried = IndexMap::with_capacity(index.len());
    for (key, rows) in index {
        let models = query.get_from(RowSet::List(rows))?;
        queried.insert(key, models.into_iter().map(Row::Model).collect());
    }
    Ok(queried)
}

/// Bucket of the source record (or raw source key); empty when absent
pub(super) fn related_rows(
    db: &Rc<Database>,
    relation: &RelationDef,
    value: &Value,
) -> Result<RelatedRows> {
    let source = db.model(&relation.source)?;
    let name = base_index_name(&relation.field);
    let mut index = db.getter(&source, &name, None)?.into_grouped(&name)?;

    let rows = index
        .swap_remove(&source.key_of(value))
        .unwrap_or_default();
    match relation.default_query(db) {
        Some(query) => {
            let models = query.get_from(RowSet::List(rows))?;
            Ok(RelatedRows::Many(models.into_iter().map(Row::Model).collect()))
        }
        None => Ok(RelatedRows::Many(rows)),
    }
}
