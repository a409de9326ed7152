//! storeql - An in-memory query engine over records held in a key-value store
//!
//! Model types are declared once, installed into a store as getter and
//! mutation tables, then queried: filter, sort, aggregate, and resolve
//! relations with per-path sub-queries.

pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod index;
pub mod model;
pub mod observability;
pub mod query;
pub mod record;
pub mod relation;
pub mod store;

pub use config::EngineConfig;
pub use database::Database;
pub use error::{Error, Result};
pub use filter::Operator;
pub use index::FieldSpec;
pub use model::{ModelRegistry, ModelType, StorageShape};
pub use query::{Clause, Query, Row, RowSet, SortDirection, SortKey};
pub use record::{Model, Related};
pub use store::{MemoryStore, Store};
