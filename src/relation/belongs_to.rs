//! Direct-reference relation
//!
//! The source record's foreign key is looked up in the target index. A
//! default query narrows the single candidate: it is returned only while it
//! still satisfies the query.

use std::rc::Rc;

use serde_json::Value;

use super::{RelatedRows, RelationDef, RelationKind};
use crate::database::Database;
use crate::error::Result;
use crate::index::{compute_foreign_key, ForeignKey};
use crate::query::Row;

pub(super) fn related_rows(
    db: &Rc<Database>,
    relation: &RelationDef,
    value: &Value,
) -> Result<RelatedRows> {
    let RelationKind::BelongsTo { fk_field } = &relation.kind else {
        return Ok(RelatedRows::One(None));
    };
    let target = db.model(&relation.target)?;

    // a value holding several keys references no single target
    let ForeignKey::One(key) = compute_foreign_key(
        value,
        target.key_field(),
        target.key_function(),
        Some(fk_field),
    ) else {
        return Ok(RelatedRows::One(None));
    };

    let Some(record) = db.fetch_index(&target, Some(std::slice::from_ref(&key)))?.into_values().next() else {
        return Ok(RelatedRows::One(None));
    };

    match relation.default_query(db) {
        Some(query) => Ok(RelatedRows::One(
            query.get_one(Row::Item(record))?.map(Row::Model),
        )),
        None => Ok(RelatedRows::One(Some(Row::Item(record)))),
    }
}
