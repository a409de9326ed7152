//! Collection-with-array-field relation
//!
//! The source record itself holds the target keys in an array field.

use std::rc::Rc;

use serde_json::Value;

use super::{RelatedRows, RelationDef, RelationKind};
use crate::database::Database;
use crate::error::Result;
use crate::index::compute_foreign_key;
use crate::query::{Row, RowSet};

/// Targets named by the source record's key array, in array order.
///
/// The source record is re-read from its current index; keys with no
/// stored target are dropped.
pub(super) fn related_rows(
    db: &Rc<Database>,
    relation: &RelationDef,
    value: &Value,
) -> Result<RelatedRows> {
    let RelationKind::HasManyWith { fk_field } = &relation.kind else {
        return Ok(RelatedRows::Many(Vec::new()));
    };
    let source = db.model(&relation.source)?;
    let target = db.model(&relation.target)?;

    let source_index = db.fetch_index(&source, None)?;
    let foreign_keys = source_index
        .get(&source.key_of(value))
        .and_then(|record| record.get(fk_field))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let target_index = db.fetch_index(&target, None)?;
    let targets: Vec<Row> = foreign_keys
        .iter()
        .flat_map(|fk| {
            compute_foreign_key(fk, target.key_field(), target.key_function(), None).into_vec()
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
