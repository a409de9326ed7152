//! Generated getter tables
//!
//! Per model type: `index`, `items`, `modelIndex`, `models`, `positionIndex`
//! (ordered-list storage only) and the relation getters. Names here are
//! unprefixed; the database applies prefix and namespace on install.

use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;

use super::errors::{StoreError, StoreResult};
use crate::database::Database;
use crate::error::Result;
use crate::index::{ItemIndex, PositionIndex, Record};
use crate::model::{ModelType, StorageShape};
use crate::query::Row;
use crate::record::Model;
use crate::relation::{self, RelatedRows};

/// A getter: reads current store state through the database, optionally
/// for one argument (a record or raw key).
pub type GetterFn = Rc<dyn Fn(&Rc<Database>, Option<&Value>) -> Result<GetterValue>>;

/// Value produced by a getter
#[derive(Debug, Clone)]
pub enum GetterValue {
    Index(ItemIndex),
    Items(Vec<Record>),
    ModelIndex(IndexMap<String, Model>),
    Models(Vec<Model>),
    PositionIndex(PositionIndex),
    Grouped(IndexMap<String, Vec<Row>>),
    Related(RelatedRows),
}

impl GetterValue {
    fn kind(&self) -> &'static str {
        match self {
            GetterValue::Index(_) => "index",
            GetterValue::Items(_) => "items",
            GetterValue::ModelIndex(_) => "modelIndex",
            GetterValue::Models(_) => "models",
            GetterValue::PositionIndex(_) => "positionIndex",
            GetterValue::Grouped(_) => "grouped",
            GetterValue::Related(_) => "related",
        }
    }

    fn unexpected(&self, path: &str, expected: &'static str) -> StoreError {
        StoreError::UnexpectedGetterValue {
            path: path.to_string(),
            expected,
            actual: self.kind(),
        }
    }

    pub fn into_index(self, path: &str) -> StoreResult<ItemIndex> {
        match self {
            GetterValue::Index(index) => Ok(index),
            other => Err(other.unexpected(path, "index")),
        }
    }

    pub fn into_items(self, path: &str) -> StoreResult<Vec<Record>> {
        match self {
            GetterValue::Items(items) => Ok(items),
            other => Err(other.unexpected(path, "items")),
        }
    }

    pub fn into_model_index(self, path: &str) -> StoreResult<IndexMap<String, Model>> {
        match self {
            GetterValue::ModelIndex(index) => Ok(index),
            other => Err(other.unexpected(path, "modelIndex")),
        }
    }

    pub fn into_models(self, path: &str) -> StoreResult<Vec<Model>> {
        match self {
            GetterValue::Models(models) => Ok(models),
            other => Err(other.unexpected(path, "models")),
        }
    }

    pub fn into_position_index(self, path: &str) -> StoreResult<PositionIndex> {
        match self {
            GetterValue::PositionIndex(positions) => Ok(positions),
            other => Err(other.unexpected(path, "positionIndex")),
        }
    }

    pub fn into_grouped(self, path: &str) -> StoreResult<IndexMap<String, Vec<Row>>> {
        match self {
            GetterValue::Grouped(groups) => Ok(groups),
            other => Err(other.unexpected(path, "grouped")),
        }
    }

    pub fn into_related(self, path: &str) -> StoreResult<RelatedRows> {
        match self {
            GetterValue::Related(rows) => Ok(rows),
            other => Err(other.unexpected(path, "related")),
        }
    }
}

fn item_index(db: &Rc<Database>, model: &ModelType) -> Result<ItemIndex> {
    let state = db.state(model.path())?;
    Ok(model
        .shape()
        .index(model.path(), &state, |value| model.key_of(value))?)
}

fn wrap(db: &Rc<Database>, model: &Rc<ModelType>, record: Record) -> Model {
    Model::new(Rc::clone(db), Rc::clone(model), record)
}

/// Getter table for one model type
pub(crate) fn model_getters(model: &Rc<ModelType>) -> Vec<(String, GetterFn)> {
    let mut getters: Vec<(String, GetterFn)> = Vec::new();

    let mt = Rc::clone(model);
    getters.push((
        "index".to_string(),
        Rc::new(move |db: &Rc<Database>, _: Option<&Value>| {
            Ok(GetterValue::Index(item_index(db, &mt)?))
        }),
    ));

    let mt = Rc::clone(model);
    getters.push((
        "items".to_string(),
        Rc::new(move |db: &Rc<Database>, _: Option<&Value>| {
            let state = db.state(mt.path())?;
            Ok(GetterValue::Items(mt.shape().items(mt.path(), &state)?))
        }),
    ));

    let mt = Rc::clone(model);
    getters.push((
        "modelIndex".to_string(),
        Rc::new(move |db: &Rc<Database>, _: Option<&Value>| {
            let index = item_index(db, &mt)?
                .into_iter()
                .map(|(key, record)| (key, wrap(db, &mt, record)))
                .collect();
            Ok(GetterValue::ModelIndex(index))
        }),
    ));

    let mt = Rc::clone(model);
    getters.push((
        "models".to_string(),
        Rc::new(move |db: &Rc<Database>, _: Option<&Value>| {
            let state = db.state(mt.path())?;
            let models = mt
                .shape()
                .items(mt.path(), &state)?
                .into_iter()
                .map(|record| wrap(db, &mt, record))
                .collect();
            Ok(GetterValue::Models(models))
        }),
    ));

    if model.shape() == StorageShape::ArrayCollection {
        let mt = Rc::clone(model);
        getters.push((
            "positionIndex".to_string(),
            Rc::new(move |db: &Rc<Database>, _: Option<&Value>| {
                let state = db.state(mt.path())?;
                let positions = mt
                    .shape()
                    .position_index(mt.path(), &state, |value| mt.key_of(value))?
                    .unwrap_or_default();
                Ok(GetterValue::PositionIndex(positions))
            }),
        ));
    }

    for relation in model.relations() {
        getters.extend(relation::getters(relation));
    }

    getters
}
