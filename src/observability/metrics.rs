//! Query engine counters
//!
//! Counters only, monotonic, owned by one `Database`.

use std::sync::atomic::{AtomicU64, Ordering};

/// Operational counters for one database facade
#[derive(Debug, Default)]
pub struct QueryMetrics {
    /// Executed filter pipelines
    queries_executed: AtomicU64,
    /// Pipelines whose candidates were narrowed by primary key
    pk_shortcuts: AtomicU64,
    /// Candidate rows handed to the filter evaluator
    rows_scanned: AtomicU64,
    /// Rows surviving filter evaluation
    rows_returned: AtomicU64,
    /// Relation field resolutions (cache misses only)
    relations_resolved: AtomicU64,
    /// Successful store commits
    commits: AtomicU64,
}

impl QueryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one executed pipeline
    pub fn record_query(&self, pk_shortcut: bool, scanned: usize, returned: usize) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
        if pk_shortcut {
            self.pk_shortcuts.fetch_add(1, Ordering::Relaxed);
        }
        self.rows_scanned.fetch_add(scanned as u64, Ordering::Relaxed);
        self.rows_returned.fetch_add(returned as u64, Ordering::Relaxed);
    }

    pub fn increment_relations_resolved(&self) {
        self.relations_resolved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_commits(&self) {
        self.commits.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all counters as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            pk_shortcuts: self.pk_shortcuts.load(Ordering::Relaxed),
            rows_scanned: self.rows_scanned.load(Ordering::Relaxed),
            rows_returned: self.rows_returned.load(Ordering::Relaxed),
            relations_resolved: self.relations_resolved.load(Ordering::Relaxed),
            commits: self.commits.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub queries_executed: u64,
    pub pk_shortcuts: u64,
    pub rows_scanned: u64,
    pub rows_returned: u64,
    pub relations_resolved: u64,
    pub commits: u64,
}
