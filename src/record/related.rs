//! Resolved relation values

use super::model::Model;

/// Value of a relation field
#[derive(Debug, Clone)]
pub enum Related {
    One(Option<Model>),
    Many(Vec<Model>),
}

impl Related {
    /// The single related record; the first one for collections
    pub fn one(&self) -> Option<&Model> {
        match self {
            Related::One(model) => model.as_ref(),
            Related::Many(models) => models.first(),
        }
    }

    /// Related records as a slice
    pub fn many(&self) -> &[Model] {
        match self {
            Related::One(Some(model)) => std::slice::from_ref(model),
            Related::One(None) => &[],
            Related::Many(models) => models,
        }
    }

    pub fn into_vec(self) -> Vec<Model> {
        match self {
            Related::One(model) => model.into_iter().collect(),
            Related::Many(models) => models,
        }
    }

    /// Identity keys in order
    pub fn keys(&self) -> Vec<String> {
        self.many().iter().map(Model::key).collect()
    }

    pub fn len(&self) -> usize {
        self.many().len()
    }

    pub fn is_empty(&self) -> bool {
        self.many().is_empty()
    }
}
