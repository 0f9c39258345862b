use serde::Serialize;

use clinicdb_core::error::{Error, Result};

pub const DEFAULT_PAGE_SIZE: usize = 12;

/// One page of results. `page` is 1-based and echoes the request even when
/// it lies outside `[1, total_pages]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<'s, T> {
    pub items: &'s [T],
    pub page: usize,
    pub page_size: usize,
    pub total_results: usize,
    pub total_pages: usize,
}

impl<T> Page<'_, T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page_size: usize,
}

impl Default for Paginator {
    fn default() -> Self {
        Self { page_size: DEFAULT_PAGE_SIZE }
    }
}

impl Paginator {
    pub fn new(page_size: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(Error::InvalidConfig("page size must be at least 1".to_string()));
        }
        Ok(Self { page_size })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_pages(&self, total_results: usize) -> usize {
        total_results.div_ceil(self.page_size)
    }

    /// Never fails; pages outside the valid range are empty.
    pub fn page<'s, T>(&self, items: &'s [T], page: usize) -> Page<'s, T> {
        let total_results = items.len();
        let total_pages = self.total_pages(total_results);
        let slice = if page == 0 || page > total_pages {
            &items[..0]
        } else {
            let start = (page - 1) * self.page_size;
            let end = (start + self.page_size).min(total_results);
            &items[start..end]
        };
        Page { items: slice, page, page_size: self.page_size, total_results, total_pages }
    }
}
