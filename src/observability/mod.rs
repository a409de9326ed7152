//! Observability for the query engine
//!
//! - Structured logging (JSON lines)
//! - Per-database counters
//!
//! Observability is read-only: nothing here changes query results.

mod logger;
mod metrics;

pub use logger::{Logger, Severity};
pub use metrics::{MetricsSnapshot, QueryMetrics};
