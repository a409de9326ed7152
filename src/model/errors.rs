//! Model declaration errors
//!
//! All of these are configuration mistakes, detected when a model type is
//! declared, registered, or first navigated by a query.

use thiserror::Error;

/// Result type for model declarations
pub type ModelResult<T> = Result<T, ModelError>;

/// Model declaration and lookup errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    // ==================
    // Declaration
    // ==================
    /// No key field declared
    #[error("Model {0} has no key field; declare one with primary_key()")]
    MissingKeyField(String),

    /// No storage path declared
    #[error("Model {0} has no storage path; a path and a storage shape are required")]
    MissingPath(String),

    /// Key field declared twice or in an invalid accumulated shape
    #[error("Wrong key field: {field} on model {model}")]
    MalformedKeyField { model: String, field: String },

    /// Two models registered under one name
    #[error("Model {0} is registered twice")]
    DuplicateModel(String),

    // ==================
    // Lookup
    // ==================
    /// Model name not in the registry
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    /// Field not declared on the model
    #[error("Model {model} has no field {field}")]
    UnknownField { model: String, field: String },

    /// Field is a plain field where a relation was expected
    #[error("Field {field} of model {model} is not a relation")]
    NotARelation { model: String, field: String },

    /// `query_related` called with no path segments
    #[error("Relation path is empty")]
    EmptyRelationPath,

    // ==================
    // Query building
    // ==================
    /// Value clause that is not an object of field values
    #[error("Query on {model}: {value} is not a field-value object")]
    InvalidClause { model: String, value: String },
}

impl ModelError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            ModelError::MissingKeyField(_) => "STOREQL_MISSING_KEY_FIELD",
            ModelError::MissingPath(_) => "STOREQL_MISSING_PATH",
            ModelError::MalformedKeyField { .. } => "STOREQL_MALFORMED_KEY_FIELD",
            ModelError::DuplicateModel(_) => "STOREQL_DUPLICATE_MODEL",
            ModelError::UnknownModel(_) => "STOREQL_UNKNOWN_MODEL",
            ModelError::UnknownField { .. } => "STOREQL_UNKNOWN_FIELD",
            ModelError::NotARelation { .. } => "STOREQL_NOT_A_RELATION",
            ModelError::EmptyRelationPath => "STOREQL_EMPTY_RELATION_PATH",
            ModelError::InvalidClause { .. } => "STOREQL_INVALID_CLAUSE",
        }
    }
}
