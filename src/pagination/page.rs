//! Page of results

use serde::Serialize;

/// Requested window: 1-based page number and page size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pageable {
    pub page_number: usize,
    pub page_size: usize,
}

impl Pageable {
    pub fn new(page_number: usize, page_size: usize) -> Self {
        Self {
            page_number,
            page_size,
        }
    }
}

/// One window of a sorted candidate set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    /// Elements of this page, in sort order
    pub content: Vec<T>,
    /// 1-based page number
    pub page_number: usize,
    /// Number of elements on this page
    pub page_elements: usize,
    /// Number of candidates before windowing
    pub total_elements: usize,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, page_number: usize, total_elements: usize) -> Self {
        Self {
            page_elements: content.len(),
            content,
            page_number,
            total_elements,
        }
    }

    /// A page with nothing on it and nothing behind it
    pub fn empty() -> Self {
        Self::new(Vec::new(), 0, 0)
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Applies `f` to every element, keeping the counts
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page_number: self.page_number,
            page_elements: self.page_elements,
            total_elements: self.total_elements,
        }
    }
}
