//! Pipeline rows
//!
//! A row is either a raw stored record or a wrapped one; filters, sorting
//! and relation indices work on both.

use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::index::{field_value, FieldSpec, ItemIndex, Record};
use crate::record::Model;

/// One raw or wrapped record
#[derive(Debug, Clone)]
pub enum Row {
    Item(Record),
    Model(Model),
}

impl Row {
    /// Raw record data
    pub fn data(&self) -> &Value {
        match self {
            Row::Item(record) => record.as_ref(),
            Row::Model(model) => model.data(),
        }
    }

    pub fn record(&self) -> Record {
        match self {
            Row::Item(record) => Rc::clone(record),
            Row::Model(model) => model.record(),
        }
    }

    /// Plain field read; `None` when the field is absent
    pub fn get(&self, field: &str) -> Option<&Value> {
        field_value(self.data(), field)
    }

    /// Field or field tuple; absent fields read as null
    pub fn read(&self, property: &FieldSpec) -> Value {
        property.read(self.data())
    }

    pub fn as_model(&self) -> Option<&Model> {
        match self {
            Row::Model(model) => Some(model),
            Row::Item(_) => None,
        }
    }
}

impl From<Record> for Row {
    fn from(record: Record) -> Self {
        Row::Item(record)
    }
}

impl From<Value> for Row {
    fn from(value: Value) -> Self {
        Row::Item(Rc::new(value))
    }
}

impl From<Model> for Row {
    fn from(model: Model) -> Self {
        Row::Model(model)
    }
}

/// Pipeline input or intermediate result: a list, or a keyed map whose
/// shape is kept through filtering.
#[derive(Debug, Clone)]
pub enum RowSet {
    List(Vec<Row>),
    Index(IndexMap<String, Row>),
}

impl RowSet {
    pub fn len(&self) -> usize {
        match self {
            RowSet::List(rows) => rows.len(),
            RowSet::Index(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rows in list or key order
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            RowSet::List(rows) => rows,
            RowSet::Index(rows) => rows.into_values().collect(),
        }
    }

    /// Maps every row, keeping the shape
    pub fn map<F>(self, mut f: F) -> RowSet
    where
        F: FnMut(Row) -> Row,
    {
        match self {
            RowSet::List(rows) => RowSet::List(rows.into_iter().map(f).collect()),
            RowSet::Index(rows) => {
                RowSet::Index(rows.into_iter().map(|(key, row)| (key, f(row))).collect())
            }
        }
    }

    /// Keeps matching rows, keeping the shape
    pub fn retain<F>(self, mut f: F) -> RowSet
    where
        F: FnMut(&Row) -> bool,
    {
        match self {
            RowSet::List(mut rows) => {
                rows.retain(|row| f(row));
                RowSet::List(rows)
            }
            RowSet::Index(mut rows) => {
                rows.retain(|_, row| f(row));
                RowSet::Index(rows)
            }
        }
    }
}

impl From<Vec<Row>> for RowSet {
    fn from(rows: Vec<Row>) -> Self {
        RowSet::List(rows)
    }
}

impl From<Vec<Record>> for RowSet {
    fn from(records: Vec<Record>) -> Self {
        RowSet::List(records.into_iter().map(Row::Item).collect())
    }
}

impl From<Vec<Value>> for RowSet {
    fn from(values: Vec<Value>) -> Self {
        RowSet::List(values.into_iter().map(Row::from).collect())
    }
}

impl From<Vec<Model>> for RowSet {
    fn from(models: Vec<Model>) -> Self {
        RowSet::List(models.into_iter().map(Row::Model).collect())
    }
}

impl From<ItemIndex> for RowSet {
    fn from(index: ItemIndex) -> Self {
        RowSet::Index(index.into_iter().map(|(key, record)| (key, Row::Item(record))).collect())
    }
}

impl From<IndexMap<String, Model>> for RowSet {
    fn from(index: IndexMap<String, Model>) -> Self {
        RowSet::Index(index.into_iter().map(|(key, model)| (key, Row::Model(model))).collect())
    }
}
