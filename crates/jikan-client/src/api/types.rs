//! Jikan API v4 response envelopes.
//!
//! Collections arrive as `{data: [...], pagination: {...}}`, single records as
//! `{data: {...}}`. Nothing past these envelopes is trusted structurally:
//! record fields are optional on the model side.

use serde::Deserialize;
use shared::Page;

/// Paginated collection envelope
#[derive(Debug, Clone, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

/// Unpaginated collection envelope
#[derive(Debug, Clone, Deserialize)]
pub struct DataResponse<T> {
    pub data: Vec<T>,
}

/// Single record envelope
#[derive(Debug, Clone, Deserialize)]
pub struct SingleResponse<T> {
    pub data: T,
}

/// Pagination metadata
#[derive(Debug, Clone, Deserialize)]
pub struct Pagination {
    pub has_next_page: bool,
    #[serde(default)]
    pub current_page: Option<u32>,
    #[serde(default)]
    pub last_visible_page: Option<u32>,
}

impl<T> PaginatedResponse<T> {
    /// Normalize into a [`Page`]; `requested_page` fills in a missing `current_page`
    pub fn into_page(self, requested_page: u32) -> Page<T> {
        Page {
            items: self.data,
            has_next: self.pagination.has_next_page,
            current_page: self.pagination.current_page.unwrap_or(requested_page),
            total_pages: self.pagination.last_visible_page,
        }
    }
}
