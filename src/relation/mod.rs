//! Relation graph
//!
//! Four relation kinds share one contract: a `<field>Of` getter returning
//! the raw related row(s) for a source record or key, plus kind-specific
//! index getters installed next to it.
//!
//! - belongs-to: source holds a foreign key to the target
//! - has-many-by: targets hold a foreign key to the source
//! - has-many-through: junction records link source and target
//! - has-many-with: source holds an array of target keys
//!
//! Resolution always goes through the installed getters, so results come
//! from current storage, never from a snapshot.

mod belongs_to;
mod has_many_by;
mod has_many_through;
mod has_many_with;

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::database::Database;
use crate::error::Result;
use crate::index::FieldSpec;
use crate::query::{Query, Row};
use crate::record::{Model, Related};
use crate::store::GetterFn;

/// Default sub-query factory, applied to a fresh query of the target type
pub type QueryFn = Rc<dyn Fn(Query) -> Query>;

/// Relation topology and its key fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationKind {
    BelongsTo {
        fk_field: FieldSpec,
    },
    HasManyBy {
        fk_field: FieldSpec,
    },
    HasManyWith {
        fk_field: String,
    },
    HasManyThrough {
        through: String,
        source_fk: FieldSpec,
        target_fk: FieldSpec,
    },
}

impl RelationKind {
    pub fn is_many(&self) -> bool {
        !matches!(self, RelationKind::BelongsTo { .. })
    }
}

/// A declared relation field.
///
/// Source, target and through types are model names resolved against the
/// registry at use time.
#[derive(Clone)]
pub struct RelationDef {
    pub field: String,
    pub source: String,
    pub target: String,
    pub kind: RelationKind,
    pub query: Option<QueryFn>,
}

impl fmt::Debug for RelationDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationDef")
            .field("field", &self.field)
            .field("source", &self.source)
            .field("target", &self.target)
            .field("kind", &self.kind)
            .field("query", &self.query.is_some())
            .finish()
    }
}

impl RelationDef {
    /// Name of the per-item accessor getter
    pub fn accessor_name(&self) -> String {
        format!("{}Of", self.field)
    }

    /// The relation's default sub-query, built fresh against the target type
    pub fn default_query(&self, db: &Rc<Database>) -> Option<Query> {
        self.query
            .as_ref()
            .map(|factory| factory(db.query(&self.target)))
    }
}

/// Raw related row(s) returned by a `<field>Of` getter
#[derive(Debug, Clone)]
pub enum RelatedRows {
    One(Option<Row>),
    Many(Vec<Row>),
}

/// Getter table entries for one relation field
pub(crate) fn getters(relation: &Rc<RelationDef>) -> Vec<(String, GetterFn)> {
    let mut getters = match relation.kind {
        RelationKind::BelongsTo { .. } => Vec::new(),
        RelationKind::HasManyBy { .. } => has_many_by::index_getters(relation),
        RelationKind::HasManyThrough { .. } => has_many_through::index_getters(relation),
        RelationKind::HasManyWith { .. } => Vec::new(),
    };

    let def = Rc::clone(relation);
    let accessor: GetterFn = Rc::new(move |db: &Rc<Database>, value: Option<&Value>| {
        let value = value.unwrap_or(&Value::Null);
        let rows = match def.kind {
            RelationKind::BelongsTo { .. } => belongs_to::related_rows(db, &def, value)?,
            RelationKind::HasManyBy { .. } => has_many_by::related_rows(db, &def, value)?,
            RelationKind::HasManyThrough { .. } => has_many_through::related_rows(db, &def, value)?,
            RelationKind::HasManyWith { .. } => has_many_with::related_rows(db, &def, value)?,
        };
        Ok(crate::store::GetterValue::Related(rows))
    });
    getters.push((relation.accessor_name(), accessor));
    getters
}

/// Related data of a wrapped record, before the wrapper's own relation
/// query for this field is applied.
///
/// Related rows are wrapped into target models carrying the nested relation
/// queries of this field; rows that are already models are reused when there
/// is nothing to carry.
pub(crate) fn resolve(model: &Model, relation: &RelationDef) -> Result<Related> {
    let db = model.database();
    let target = db.model(&relation.target)?;
    let rows = db
        .getter(model.model_type(), &relation.accessor_name(), Some(model.data()))?
        .into_related(&relation.accessor_name())?;

    let nested = model
        .relation_queries()
        .get(&relation.field)
        .map(Query::relation_queries_rc)
        .filter(|queries| !queries.is_empty());

    let wrap = |row: Row| -> Model {
        match (row, &nested) {
            (Row::Model(model), None) => model,
            (row, nested) => Model::with_relation_queries(
                Rc::clone(db),
                Rc::clone(&target),
                row.record(),
                nested.clone().unwrap_or_default(),
            ),
        }
    };

    db.metrics().increment_relations_resolved();

    Ok(match rows {
        RelatedRows::One(row) => Related::One(row.map(wrap)),
        RelatedRows::Many(rows) => Related::Many(rows.into_iter().map(wrap).collect()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(field: &str, kind: RelationKind) -> RelationDef {
        RelationDef {
            field: field.to_string(),
            source: "Order".to_string(),
            target: "User".to_string(),
            kind,
            query: None,
        }
    }

    #[test]
    fn test_cardinality_by_kind() {
        assert!(!RelationKind::BelongsTo { fk_field: "userId".into() }.is_many());
        assert!(RelationKind::HasManyBy { fk_field: "userId".into() }.is_many());
        assert!(RelationKind::HasManyWith { fk_field: "itemIds".into() }.is_many());
    }

    #[test]
    fn test_accessor_name() {
        let user = def("user", RelationKind::BelongsTo { fk_field: "userId".into() });
        assert_eq!(user.accessor_name(), "userOf");
        assert!(format!("{:?}", user).contains("query: false"));
    }
}
