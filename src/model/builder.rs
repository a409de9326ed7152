//! Model type declaration builder
//!
//! Replaces per-field annotations with one explicit registration call per
//! model type. Relation targets are named, not referenced, and resolved
//! against the registry on use.

use std::rc::Rc;

use indexmap::IndexMap;

use super::errors::{ModelError, ModelResult};
use super::shape::StorageShape;
use super::types::{FieldKind, ModelType};
use crate::index::{default_key_function, FieldSpec, KeyFunction};
use crate::query::Query;
use crate::relation::{QueryFn, RelationDef, RelationKind};

impl ModelType {
    /// Starts declaring a model type
    pub fn builder(name: impl Into<String>) -> ModelTypeBuilder {
        ModelTypeBuilder::new(name)
    }
}

/// Builder for [`ModelType`]
pub struct ModelTypeBuilder {
    name: String,
    path: Option<String>,
    shape: Option<StorageShape>,
    key_field: Option<FieldSpec>,
    key_function: KeyFunction,
    model_before_filter: Option<bool>,
    fields: IndexMap<String, FieldKind>,
    error: Option<ModelError>,
}

impl ModelTypeBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
            shape: None,
            key_field: None,
            key_function: default_key_function,
            model_before_filter: None,
            fields: IndexMap::new(),
            error: None,
        }
    }

    /// Store module path
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn shape(mut self, shape: StorageShape) -> Self {
        self.shape = Some(shape);
        self
    }

    /// Declares a key field (also a plain field). Repeated calls build a
    /// composite key in call order.
    pub fn primary_key(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        let duplicate = self
            .key_field
            .as_ref()
            .map_or(false, |key| key.names().contains(&field.as_str()));

        if duplicate {
            self.fail(ModelError::MalformedKeyField {
                model: self.name.clone(),
                field: field.clone(),
            });
        } else {
            self.key_field = Some(match self.key_field.take() {
                None => FieldSpec::Single(field.clone()),
                Some(key) => key.push(field.clone()),
            });
        }

        self.fields.insert(field, FieldKind::Prop);
        self
    }

    /// Overrides the key function used for composite and foreign keys
    pub fn key_function(mut self, key_function: KeyFunction) -> Self {
        self.key_function = key_function;
        self
    }

    /// Overrides whether records are wrapped before filtering
    pub fn model_before_filter(mut self, enabled: bool) -> Self {
        self.model_before_filter = Some(enabled);
        self
    }

    /// Declares a plain stored field
    pub fn prop(mut self, field: impl Into<String>) -> Self {
        self.fields.insert(field.into(), FieldKind::Prop);
        self
    }

    /// Source record holds `fk_field` referencing the target's key
    pub fn belongs_to(
        self,
        field: impl Into<String>,
        target: impl Into<String>,
        fk_field: impl Into<FieldSpec>,
    ) -> Self {
        let kind = RelationKind::BelongsTo {
            fk_field: fk_field.into(),
        };
        self.relation(field, target, kind, None)
    }

    /// `belongs_to` whose related item must also satisfy a default query
    pub fn belongs_to_query<F>(
        self,
        field: impl Into<String>,
        target: impl Into<String>,
        fk_field: impl Into<FieldSpec>,
        query: F,
    ) -> Self
    where
        F: Fn(Query) -> Query + 'static,
    {
        let kind = RelationKind::BelongsTo {
            fk_field: fk_field.into(),
        };
        self.relation(field, target, kind, Some(Rc::new(query)))
    }

    /// Target records hold `fk_field` referencing the source's key
    pub fn has_many_by(
        self,
        field: impl Into<String>,
        target: impl Into<String>,
        fk_field: impl Into<FieldSpec>,
    ) -> Self {
        let kind = RelationKind::HasManyBy {
            fk_field: fk_field.into(),
        };
        self.relation(field, target, kind, None)
    }

    /// `has_many_by` with a default query applied per bucket
    pub fn has_many_by_query<F>(
        self,
        field: impl Into<String>,
        target: impl Into<String>,
        fk_field: impl Into<FieldSpec>,
        query: F,
    ) -> Self
    where
        F: Fn(Query) -> Query + 'static,
    {
        let kind = RelationKind::HasManyBy {
            fk_field: fk_field.into(),
        };
        self.relation(field, target, kind, Some(Rc::new(query)))
    }

    /// Source record holds an array of target keys in `fk_field`
    pub fn has_many_with(
        self,
        field: impl Into<String>,
        target: impl Into<String>,
        fk_field: impl Into<String>,
    ) -> Self {
        let kind = RelationKind::HasManyWith {
            fk_field: fk_field.into(),
        };
        self.relation(field, target, kind, None)
    }

    /// `has_many_with` with a default query over the related list
    pub fn has_many_with_query<F>(
        self,
        field: impl Into<String>,
        target: impl Into<String>,
        fk_field: impl Into<String>,
        query: F,
    ) -> Self
    where
        F: Fn(Query) -> Query + 'static,
    {
        let kind = RelationKind::HasManyWith {
            fk_field: fk_field.into(),
        };
        self.relation(field, target, kind, Some(Rc::new(query)))
    }

    /// Many-to-many through junction type `through`, whose records hold
    /// `source_fk` (to the source) and `target_fk` (to the target)
    pub fn has_many_through(
        self,
        field: impl Into<String>,
        target: impl Into<String>,
        through: impl Into<String>,
        source_fk: impl Into<FieldSpec>,
        target_fk: impl Into<FieldSpec>,
    ) -> Self {
        let kind = RelationKind::HasManyThrough {
            through: through.into(),
            source_fk: source_fk.into(),
            target_fk: target_fk.into(),
        };
        self.relation(field, target, kind, None)
    }

    /// `has_many_through` with a default query over the related list
    pub fn has_many_through_query<F>(
        self,
        field: impl Into<String>,
        target: impl Into<String>,
        through: impl Into<String>,
        source_fk: impl Into<FieldSpec>,
        target_fk: impl Into<FieldSpec>,
        query: F,
    ) -> Self
    where
        F: Fn(Query) -> Query + 'static,
    {
        let kind = RelationKind::HasManyThrough {
            through: through.into(),
            source_fk: source_fk.into(),
            target_fk: target_fk.into(),
        };
        self.relation(field, target, kind, Some(Rc::new(query)))
    }

    fn relation(
        mut self,
        field: impl Into<String>,
        target: impl Into<String>,
        kind: RelationKind,
        query: Option<QueryFn>,
    ) -> Self {
        let field = field.into();
        let relation = RelationDef {
            field: field.clone(),
            source: self.name.clone(),
            target: target.into(),
            kind,
            query,
        };
        self.fields
            .insert(field, FieldKind::Relation(Rc::new(relation)));
        self
    }

    fn fail(&mut self, error: ModelError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Finishes the declaration.
    ///
    /// Fails when no key field, path or storage shape was declared, or when
    /// a key field was declared twice.
    pub fn build(self) -> ModelResult<ModelType> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let key_field = self
            .key_field
            .ok_or_else(|| ModelError::MissingKeyField(self.name.clone()))?;
        let (path, shape) = match (self.path, self.shape) {
            (Some(path), Some(shape)) if !path.is_empty() => (path, shape),
            _ => return Err(ModelError::MissingPath(self.name)),
        };

        Ok(ModelType {
            name: self.name,
            path,
            shape,
            key_field,
            key_function: self.key_function,
            model_before_filter: self.model_before_filter,
            fields: self.fields,
        })
    }
}
