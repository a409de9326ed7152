//! Record wrappers
//!
//! A wrapper is a view over one stored record:
//! - plain fields read straight from the record
//! - relation fields resolved through the relation getters, memoized per
//!   store revision
//! - relation sub-queries carried from the query that produced it

mod model;
mod related;

pub use model::Model;
pub use related::Related;
