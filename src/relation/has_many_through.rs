//! Many-to-many relation through a junction type
//!
//! Through index: source key -> junction rows. When the source type already
//! declares a has-many-by relation to the junction type on the same foreign
//! key, its base index is reused instead of being rebuilt.

use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;

use super::has_many_by::base_index_name;
use super::{RelatedRows, RelationDef, RelationKind};
use crate::database::Database;
use crate::error::Result;
use crate::index::{compute_foreign_key, group_index, FieldSpec};
use crate::model::ModelType;
use crate::query::{Row, RowSet};
use crate::store::{GetterFn, GetterValue};

fn through_index_name(field: &str) -> String {
    format!("{}ThroughIndex", field)
}

pub(super) fn index_getters(relation: &Rc<RelationDef>) -> Vec<(String, GetterFn)> {
    let def = Rc::clone(relation);
    let through: GetterFn = Rc::new(move |db: &Rc<Database>, _: Option<&Value>| {
        Ok(GetterValue::Grouped(through_index(db, &def)?))
    });
    vec![(through_index_name(&relation.field), through)]
}

/// Has-many-by relation on `source` targeting `through` by `source_fk`
fn reusable_relation<'a>(
    source: &'a ModelType,
    through: &str,
    source_fk: &FieldSpec,
) -> Option<&'a Rc<RelationDef>> {
    source.relations().find(|relation| {
        relation.target == through
            && matches!(&relation.kind, RelationKind::HasManyBy { fk_field } if fk_field == source_fk)
    })
}

fn through_index(db: &Rc<Database>, relation: &RelationDef) -> Result<IndexMap<String, Vec<Row>>> {
    let RelationKind::HasManyThrough {
        through, source_fk, ..
    } = &relation.kind
    else {
        return Ok(IndexMap::new());
    };
    let source = db.model(&relation.source)?;

    if let Some(by) = reusable_relation(&source, through, source_fk) {
        let name = base_index_name(&by.field);
        return Ok(db.getter(&source, &name, None)?.into_grouped(&name)?);
    }

    let through = db.model(through)?;
    let rows = db.fetch_items(&through, None)?.into_iter().map(Row::Item);
    Ok(group_index(rows, |row: &Row| {
        compute_foreign_key(
            row.data(),
            source.key_field(),
            source.key_function(),
            Some(source_fk),
        )
        .into_vec()
    }))
}

/// Targets linked to the source record (or raw source key) through its
/// junction rows, in junction order; junction rows pointing at missing
/// targets are dropped.
pub(super) fn related_rows(
    db: &Rc<Database>,
    relation: &RelationDef,
    value: &Value,
) -> Result<RelatedRows> {
    let RelationKind::HasManyThrough { target_fk, .. } = &relation.kind else {
        return Ok(RelatedRows::Many(Vec::new()));
    };
    let source = db.model(&relation.source)?;
    let target = db.model(&relation.target)?;

    let name = through_index_name(&relation.field);
    let mut through_index = db.getter(&source, &name, None)?.into_grouped(&name)?;
    let junction_rows = through_index
        .swap_remove(&source.key_of(value))
        .unwrap_or_default();

    let target_index = db.fetch_index(&target, None)?;
    let targets: Vec<Row> = junction_rows
        .iter()
        .flat_map(|row| {
            compute_foreign_key(
                row.data(),
                target.key_field(),
                target.key_function(),
                Some(target_fk),
            )
            .into_vec()
        })
        .filter_map(|key| target_index.get(&key).cloned().map(Row::Item))
        .collect();

    match relation.default_query(db) {
        Some(query) => {
            let models = query.get_from(RowSet::List(targets))?;
            Ok(RelatedRows::Many(models.into_iter().map(Row::Model).collect()))
        }
        None => Ok(RelatedRows::Many(targets)),
    }
}
