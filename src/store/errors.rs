//! Store collaborator errors
//!
//! Accessing the store before installation, or through a name it does not
//! know, is a hard failure at call time.

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Store access errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Getter read before the model's getter table was installed
    #[error("{0} model may not have installed store getters; call Database::install first")]
    GettersNotInstalled(String),

    /// Commit before the model's mutation table was installed
    #[error("{0} model may not have installed store mutations; call Database::install first")]
    MutationsNotInstalled(String),

    /// No getter registered under this path
    #[error("Getter {0} is not available in the store")]
    UnknownGetter(String),

    /// No mutation registered under this path
    #[error("Mutation {0} is not available in the store")]
    UnknownMutation(String),

    /// No module registered under this path
    #[error("Store module {0} is not registered")]
    UnknownModule(String),

    /// Module state does not have the declared storage shape
    #[error("State of module {path} is not {expected}")]
    StateShape { path: String, expected: &'static str },

    /// Getter produced a different kind of value than the caller expects
    #[error("Getter {path} returned {actual}, expected {expected}")]
    UnexpectedGetterValue {
        path: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Mutation target record not present in state
    #[error("Mutation target {key} not found in module {path}")]
    TargetNotFound { path: String, key: String },
}

impl StoreError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::GettersNotInstalled(_) => "STOREQL_GETTERS_NOT_INSTALLED",
            StoreError::MutationsNotInstalled(_) => "STOREQL_MUTATIONS_NOT_INSTALLED",
            StoreError::UnknownGetter(_) => "STOREQL_UNKNOWN_GETTER",
            StoreError::UnknownMutation(_) => "STOREQL_UNKNOWN_MUTATION",
            StoreError::UnknownModule(_) => "STOREQL_UNKNOWN_MODULE",
            StoreError::StateShape { .. } => "STOREQL_STATE_SHAPE",
            StoreError::UnexpectedGetterValue { .. } => "STOREQL_UNEXPECTED_GETTER_VALUE",
            StoreError::TargetNotFound { .. } => "STOREQL_TARGET_NOT_FOUND",
        }
    }
}
