//! Counters for index maintenance and query resolution
//!
//! - Counters only, monotonic
//! - Relaxed atomics, no locks

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters for one `FacetIndex`
#[derive(Debug, Default)]
pub struct IndexMetrics {
    documents_indexed: AtomicU64,
    documents_deindexed: AtomicU64,
    documents_reindexed: AtomicU64,
    records_created: AtomicU64,
    records_updated: AtomicU64,
    records_pruned: AtomicU64,
    records_missing: AtomicU64,
    searches_executed: AtomicU64,
    searches_short_circuited: AtomicU64,
    searches_failed: AtomicU64,
}

impl IndexMetrics {
    /// Create a registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    // Maintenance

    pub fn increment_documents_indexed(&self) {
        self.documents_indexed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_documents_deindexed(&self) {
        self.documents_deindexed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_documents_reindexed(&self) {
        self.documents_reindexed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_records_created(&self, count: u64) {
        self.records_created.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_records_updated(&self, count: u64) {
        self.records_updated.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_records_pruned(&self, count: u64) {
        self.records_pruned.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_records_missing(&self, count: u64) {
        self.records_missing.fetch_add(count, Ordering::Relaxed);
    }

    // Queries

    pub fn increment_searches_executed(&self) {
        self.searches_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_searches_short_circuited(&self) {
        self.searches_short_circuited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_searches_failed(&self) {
        self.searches_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_indexed: self.documents_indexed.load(Ordering::Relaxed),
            documents_deindexed: self.documents_deindexed.load(Ordering::Relaxed),
            documents_reindexed: self.documents_reindexed.load(Ordering::Relaxed),
            records_created: self.records_created.load(Ordering::Relaxed),
            records_updated: self.records_updated.load(Ordering::Relaxed),
            records_pruned: self.records_pruned.load(Ordering::Relaxed),
            records_missing: self.records_missing.load(Ordering::Relaxed),
            searches_executed: self.searches_executed.load(Ordering::Relaxed),
            searches_short_circuited: self.searches_short_circuited.load(Ordering::Relaxed),
            searches_failed: self.searches_failed.load(Ordering::Relaxed),
        }
    }

    /// Current counters as a JSON object
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }
}

/// A point-in-time snapshot of all counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub documents_indexed: u64,
    pub documents_deindexed: u64,
    pub documents_reindexed: u64,
    pub records_created: u64,
    pub records_updated: u64,
    pub records_pruned: u64,
    pub records_missing: u64,
    pub searches_executed: u64,
    pub searches_short_circuited: u64,
    pub searches_failed: u64,
}
