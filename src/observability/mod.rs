//! Observability for facetdb
//!
//! - Structured logging (JSON lines)
//! - Maintenance and query counters
//!
//! Observability is read-only: nothing here changes what the index does.
//!
//! ```ignore
//! use facetdb::observability::{Logger, IndexMetrics};
//!
//! Logger::info("SEARCH_COMPLETE", &[("matches", "42")]);
//!
//! let metrics = IndexMetrics::new();
//! metrics.increment_searches_executed();
//! ```

mod logger;
mod metrics;

pub use logger::{Logger, Severity};
pub use metrics::{IndexMetrics, MetricsSnapshot};
