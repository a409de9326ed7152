//! Wrapped record

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use super::related::Related;
use crate::database::Database;
use crate::error::Result;
use crate::index::{field_value, Record};
use crate::model::ModelType;
use crate::query::{RelationQueries, Row, RowSet};
use crate::relation;

#[derive(Default)]
struct RelationCache {
    revision: Option<u64>,
    related: HashMap<String, Related>,
}

/// One record of a model type, with relation access.
///
/// Clones share the relation cache. The record data is the snapshot taken
/// when the wrapper was created; relations are always resolved against
/// current storage.
#[derive(Clone)]
pub struct Model {
    db: Rc<Database>,
    model_type: Rc<ModelType>,
    data: Record,
    relation_queries: Rc<RelationQueries>,
    cache: Rc<RefCell<RelationCache>>,
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("type", &self.model_type.name())
            .field("key", &self.key())
            .field("data", &self.data)
            .field(
                "relation_queries",
                &self.relation_queries.keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Model {
    pub fn new(db: Rc<Database>, model_type: Rc<ModelType>, data: Record) -> Self {
        Self::with_relation_queries(db, model_type, data, Rc::default())
    }

    pub fn with_relation_queries(
        db: Rc<Database>,
        model_type: Rc<ModelType>,
        data: Record,
        relation_queries: Rc<RelationQueries>,
    ) -> Self {
        Self {
            db,
            model_type,
            data,
            relation_queries,
            cache: Rc::default(),
        }
    }

    pub fn database(&self) -> &Rc<Database> {
        &self.db
    }

    pub fn model_type(&self) -> &Rc<ModelType> {
        &self.model_type
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn record(&self) -> Record {
        Rc::clone(&self.data)
    }

    /// Identity key from the declared key field(s)
    pub fn key(&self) -> String {
        self.model_type.key_of(&self.data)
    }

    /// Plain field read
    pub fn get(&self, field: &str) -> Option<&Value> {
        field_value(&self.data, field)
    }

    pub fn relation_queries(&self) -> &RelationQueries {
        &self.relation_queries
    }

    pub(crate) fn relation_queries_rc(&self) -> &Rc<RelationQueries> {
        &self.relation_queries
    }

    /// Relation field value.
    ///
    /// A sub-query carried for this field is applied to the related
    /// records. Results are cached until the store changes.
    pub fn related(&self, field: &str) -> Result<Related> {
        let revision = self.db.revision();
        {
            let cache = self.cache.borrow();
            if cache.revision == Some(revision) {
                if let Some(related) = cache.related.get(field) {
                    return Ok(related.clone());
                }
            }
        }

        let relation = self.model_type.relation(field)?;
        let related = relation::resolve(self, relation)?;
        let related = match self.relation_queries.get(field) {
            Some(query) => match related {
                Related::Many(models) => {
                    Related::Many(query.get_from(RowSet::from(models))?)
                }
                Related::One(Some(model)) => Related::One(query.get_one(Row::Model(model))?),
                Related::One(None) => Related::One(None),
            },
            None => related,
        };

        let mut cache = self.cache.borrow_mut();
        if cache.revision != Some(revision) {
            cache.related.clear();
            cache.revision = Some(revision);
        }
        cache.related.insert(field.to_string(), related.clone());
        Ok(related)
    }

    /// Writes one plain field through the store mutation.
    ///
    /// This wrapper keeps its snapshot; read the record again to observe the
    /// new value.
    pub fn set(&self, field: &str, value: Value) -> Result<()> {
        self.db
            .commit(self.model_type.name(), field, &self.key(), value)
    }
}
