//! Newest-first ordering and page windowing for candidate sets
//!
//! The store cannot sort or offset, so candidates are ordered in memory.
//! Order is deterministic: timestamp descending, then id ascending.

use chrono::{DateTime, Utc};

use super::page::Page;
use crate::index::{IndexError, IndexResult};

/// Timestamp field candidates are ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    CreatedAt,
    #[default]
    UpdatedAt,
}

/// Something that can be ordered by one of its timestamps
pub trait Timestamped {
    /// Tie-breaker for equal timestamps
    fn sort_id(&self) -> &str;

    fn timestamp(&self, key: SortKey) -> DateTime<Utc>;
}

/// Sorts and windows candidate sets
pub struct Paginator;

impl Paginator {
    /// Sorts newest first, in place.
    pub fn sort_desc<T: Timestamped>(candidates: &mut [T], sort_key: SortKey) {
        candidates.sort_by(|a, b| {
            b.timestamp(sort_key)
                .cmp(&a.timestamp(sort_key))
                .then_with(|| a.sort_id().cmp(b.sort_id()))
        });
    }

    /// Rejects windows that cannot be served: size 0, or page 0 (pages are 1-based)
    pub fn check_window(page_number: usize, page_size: usize) -> IndexResult<()> {
        if page_size == 0 {
            return Err(IndexError::invalid_argument("page size must be greater than zero"));
        }
        if page_number == 0 {
            return Err(IndexError::invalid_argument("page numbers start at 1"));
        }
        Ok(())
    }

    /// Sorts `candidates` newest first and returns the 1-based page
    /// `page_number` of `page_size` elements.
    ///
    /// `total_elements` is the candidate count before windowing. A page past
    /// the end is empty, not an error.
    pub fn paginate<T: Timestamped>(
        mut candidates: Vec<T>,
        sort_key: SortKey,
        page_number: usize,
        page_size: usize,
    ) -> IndexResult<Page<T>> {
        Self::check_window(page_number, page_size)?;

        let total = candidates.len();
        Self::sort_desc(&mut candidates, sort_key);

        let start = (page_number - 1).saturating_mul(page_size);
        let content = if start >= total {
            Vec::new()
        } else {
            let end = page_number.saturating_mul(page_size).min(total);
            candidates.truncate(end);
            candidates.split_off(start)
        };

        Ok(Page::new(content, page_number, total))
    }
}
