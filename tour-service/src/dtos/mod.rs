pub mod auth;
pub mod bookings;
pub mod dashboard;
pub mod packages;
pub mod users;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub limit: i64,
    pub total: u64,
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(page: u64, limit: i64, total: u64) -> Self {
        let per_page = limit.max(1) as u64;
        Self {
            page,
            limit,
            total,
            total_pages: total.div_ceil(per_page),
        }
    }
}

/// Normalizes raw `page`/`limit` query values: page starts at 1, limit is
/// clamped to `1..=MAX_PAGE_SIZE`.
pub fn page_window(page: Option<u64>, limit: Option<i64>) -> (u64, i64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    (page, limit)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Package deleted")]
    pub message: String,
}
