//! Model type registry
//!
//! Relation targets are stored by name; the registry resolves them on use,
//! so model types may reference each other in any order.

use std::rc::Rc;

use indexmap::IndexMap;

use super::errors::{ModelError, ModelResult};
use super::types::ModelType;
use crate::relation::RelationKind;

/// Model name to descriptor
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: IndexMap<String, Rc<ModelType>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers and validates a set of model types
    pub fn build<I>(models: I) -> ModelResult<Self>
    where
        I: IntoIterator<Item = ModelType>,
    {
        let mut registry = Self::new();
        for model in models {
            registry.register(model)?;
        }
        registry.validate()?;
        Ok(registry)
    }

    pub fn register(&mut self, model: ModelType) -> ModelResult<()> {
        if self.models.contains_key(model.name()) {
            return Err(ModelError::DuplicateModel(model.name().to_string()));
        }
        self.models.insert(model.name().to_string(), Rc::new(model));
        Ok(())
    }

    /// Checks that every relation target and through type is registered
    pub fn validate(&self) -> ModelResult<()> {
        for model in self.models.values() {
            for relation in model.relations() {
                self.get(&relation.target)?;
                if let RelationKind::HasManyThrough { through, .. } = &relation.kind {
                    self.get(through)?;
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> ModelResult<Rc<ModelType>> {
        self.models
            .get(name)
            .cloned()
            .ok_or_else(|| ModelError::UnknownModel(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// Model names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
