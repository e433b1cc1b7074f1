//! Sorting and page windowing for candidate sets
//!
//! Used when the caller needs "everything matching, newest first, page N":
//! the store can neither sort nor skip, so the already-filtered candidates
//! are ordered in memory and sliced.

mod page;
mod sorter;

pub use page::{Page, Pageable};
pub use sorter::{Paginator, SortKey, Timestamped};
