//! Offset-based pagination for list endpoints.

use serde::{Deserialize, Serialize};

/// Default page size when `count` is not specified.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Maximum allowed page size.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Query parameters accepted by list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationParams {
    /// Items to skip from the start of the list.
    pub offset: Option<u64>,
    /// Number of items per page (default 100, max 1000).
    pub count: Option<u32>,
}

impl PaginationParams {
    /// Resolve effective page size, clamped to [1, MAX_PAGE_SIZE].
    pub fn effective_count(&self) -> u32 {
        self.count
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn effective_offset(&self) -> u64 {
        self.offset.unwrap_or(0)
    }

    /// Cut one page out of `items` and report where the next one starts.
    pub fn page<T>(&self, items: Vec<T>) -> (Vec<T>, PaginationMeta) {
        let offset = self.effective_offset();
        let count = self.effective_count();
        let total = items.len();
        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        let page: Vec<T> = items.into_iter().skip(skip).take(count as usize).collect();
        let next_offset = next_offset(offset, page.len(), total);
        (page, PaginationMeta { next_offset })
    }
}

/// Pagination metadata included in list responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationMeta {
    /// Offset to pass for the next page, or `None` if this is the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_offset: Option<u64>,
}

/// Offset of the page after the one just returned, or `None` when nothing is
/// left.
pub fn next_offset(current_offset: u64, returned: usize, total: usize) -> Option<u64> {
    let next = current_offset.saturating_add(returned as u64);
    (returned > 0 && next < total as u64).then_some(next)
}
