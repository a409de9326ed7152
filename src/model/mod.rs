//! Model types
//!
//! - Declarations built once per type (`ModelType::builder`)
//! - Storage shapes with one shared read contract
//! - A registry resolving model names, including relation targets

mod builder;
mod errors;
mod registry;
mod shape;
mod types;

pub use builder::ModelTypeBuilder;
pub use errors::{ModelError, ModelResult};
pub use registry::ModelRegistry;
pub use shape::StorageShape;
pub use types::{FieldKind, ModelType};
