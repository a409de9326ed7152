//! Key and index helpers
//!
//! Indices are derived, in-memory views over storage content:
//! - rebuilt on access, never the source of truth
//! - insertion ordered (`IndexMap`)
//! - last write wins on duplicate keys

mod builder;
mod key;

use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;

pub use builder::{build_index, group_index, pick_keys};
pub use key::{
    canonical_json, compute_foreign_key, compute_key, default_key_function, field_value,
    is_array_of_arrays, is_record, FieldSpec, ForeignKey, KeyFunction,
};

/// Raw stored data for one entity instance
pub type Record = Rc<Value>;

/// Key to record
pub type ItemIndex = IndexMap<String, Record>;

/// Key to position in ordered-list storage
pub type PositionIndex = IndexMap<String, usize>;
