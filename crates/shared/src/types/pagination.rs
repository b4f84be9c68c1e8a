//! Pagination types for list endpoints.

use serde::{Deserialize, Serialize};

/// Highest page number a client may request.
pub const MAX_PAGE: u64 = 10_000_000;

/// Largest page size a client may request.
pub const MAX_LIMIT: u64 = 100;

/// Validated offset/limit window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Page number (1-indexed).
    pub page: u64,
    /// Number of rows per page.
    pub limit: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: 20 }
    }
}

impl PageRequest {
    /// Creates a page window.
    #[must_use]
    pub const fn new(page: u64, limit: u64) -> Self {
        Self { page, limit }
    }

    /// Calculates the offset for database queries.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    /// Returns the limit for database queries.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.limit
    }
}

/// Response wrapper for paginated data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    /// The rows in the current page.
    pub data: Vec<T>,
    /// Pagination metadata.
    pub meta: PageMeta,
}

impl<T> PageResponse<T> {
    /// Wraps a page of rows with metadata computed from `total_records`.
    #[must_use]
    pub fn new(data: Vec<T>, page: PageRequest, total_records: u64) -> Self {
        Self {
            data,
            meta: PageMeta::calculate(total_records, page),
        }
    }
}

/// Pagination metadata.
///
/// Every field is omitted from JSON when there are no records at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    /// Current page number.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub current_page: u64,
    /// Rows per page.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub page_size: u64,
    /// Always 1 when any record exists.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub first_page: u64,
    /// Last page holding records.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub last_page: u64,
    /// Total number of rows across all pages.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub total_records: u64,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(value: &u64) -> bool {
    *value == 0
}

impl PageMeta {
    /// Computes metadata for `total_records` rows split into pages of `page.limit`.
    #[must_use]
    pub fn calculate(total_records: u64, page: PageRequest) -> Self {
        if total_records == 0 || page.limit == 0 {
            return Self::default();
        }

        Self {
            current_page: page.page,
            page_size: page.limit,
            first_page: 1,
            last_page: total_records.div_ceil(page.limit),
            total_records,
        }
    }
}
