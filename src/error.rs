//! Crate-level error type
//!
//! Every failure is immediate: no retries, no partial results.

use thiserror::Error;

use crate::model::ModelError;
use crate::store::StoreError;

/// Result type used across the engine
pub type Result<T> = std::result::Result<T, Error>;

/// Engine errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Model declaration or lookup error
    #[error("{0}")]
    Model(#[from] ModelError),

    /// Store access error
    #[error("{0}")]
    Store(#[from] StoreError),
}

impl Error {
    /// Stable machine-readable code of the underlying error
    pub fn code(&self) -> &'static str {
        match self {
            Error::Model(err) => err.code(),
            Error::Store(err) => err.code(),
        }
    }
}
