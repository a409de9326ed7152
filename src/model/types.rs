//! Model type descriptors

use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;

use super::errors::{ModelError, ModelResult};
use super::shape::StorageShape;
use crate::index::{compute_key, FieldSpec, KeyFunction};
use crate::relation::RelationDef;

/// Kind of a declared field
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// Plain stored field, read from the record and written by mutation
    Prop,
    /// Relation field, resolved through the relation graph
    Relation(Rc<RelationDef>),
}

/// A named entity kind: storage shape, key field(s) and field registry.
///
/// Built once with [`ModelType::builder`].
#[derive(Debug)]
pub struct ModelType {
    pub(super) name: String,
    pub(super) path: String,
    pub(super) shape: StorageShape,
    pub(super) key_field: FieldSpec,
    pub(super) key_function: KeyFunction,
    pub(super) model_before_filter: Option<bool>,
    pub(super) fields: IndexMap<String, FieldKind>,
}

impl ModelType {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store module path
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn shape(&self) -> StorageShape {
        self.shape
    }

    pub fn key_field(&self) -> &FieldSpec {
        &self.key_field
    }

    pub fn key_function(&self) -> KeyFunction {
        self.key_function
    }

    /// Per-type override of the wrap-before-filter default
    pub fn model_before_filter(&self) -> Option<bool> {
        self.model_before_filter
    }

    pub fn fields(&self) -> &IndexMap<String, FieldKind> {
        &self.fields
    }

    /// Plain field names in declaration order
    pub fn plain_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, kind)| matches!(kind, FieldKind::Prop))
            .map(|(name, _)| name.as_str())
    }

    /// Relation declarations in declaration order
    pub fn relations(&self) -> impl Iterator<Item = &Rc<RelationDef>> {
        self.fields.values().filter_map(|kind| match kind {
            FieldKind::Relation(relation) => Some(relation),
            FieldKind::Prop => None,
        })
    }

    pub fn is_relation(&self, field: &str) -> bool {
        matches!(self.fields.get(field), Some(FieldKind::Relation(_)))
    }

    /// Relation declared on `field`
    pub fn relation(&self, field: &str) -> ModelResult<&Rc<RelationDef>> {
        match self.fields.get(field) {
            Some(FieldKind::Relation(relation)) => Ok(relation),
            Some(FieldKind::Prop) => Err(ModelError::NotARelation {
                model: self.name.clone(),
                field: field.to_string(),
            }),
            None => Err(ModelError::UnknownField {
                model: self.name.clone(),
                field: field.to_string(),
            }),
        }
    }

    /// Key of a record, or of a raw key value or tuple
    pub fn key_of(&self, value: &Value) -> String {
        compute_key(&self.key_field, self.key_function, value)
    }

    pub fn keys_of(&self, values: &[Value]) -> Vec<String> {
        values.iter().map(|value| self.key_of(value)).collect()
    }
}
