//! Query building and execution
//!
//! - Condition, ordering and relation sub-query accumulation
//! - Primary-key shortcut planning
//! - Filter, sort and wrap pipeline with per-revision memoization
//! - Aggregates over materialized results

mod aggregate;
mod builder;
mod executor;
mod planner;
mod row;
mod sorter;

pub use builder::{Clause, Query, RelationPath, RelationQueries};
pub use planner::{plan, Plan};
pub use row::{Row, RowSet};
pub use sorter::{compare_sort_values, sort_rows, OrderSpec, SortDirection, SortKey, UnknownSortDirection};
