//! Pagination query parameters and the list envelope.

use serde::{Deserialize, Serialize};

/// Default number of items per page across all list endpoints.
pub const DEFAULT_PAGE_SIZE: i64 = 10;
/// Upper bound a client may request.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Page-number style parameters (users, categories, genres).
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// 1-based page number.
    pub page: Option<i64>,
    /// Items per page.
    pub page_size: Option<i64>,
    /// Optional substring filter; which field it applies to depends on the
    /// resource.
    pub search: Option<String>,
}

impl PageQuery {
    /// Translate to SQL limit/offset.
    #[must_use]
    pub fn limit_offset(&self) -> (i64, i64) {
        let size = self
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let page = self.page.unwrap_or(1).max(1);
        (size, (page - 1) * size)
    }
}

/// Limit/offset style parameters (titles, reviews, comments).
#[derive(Debug, Default, Deserialize)]
pub struct LimitOffsetQuery {
    /// Items per page.
    pub limit: Option<i64>,
    /// Items to skip.
    pub offset: Option<i64>,
}

impl LimitOffsetQuery {
    /// Translate to SQL limit/offset with defaults and bounds applied.
    #[must_use]
    pub fn limit_offset(&self) -> (i64, i64) {
        let limit = self
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

/// Envelope wrapping every list response.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    /// Total matching items, before pagination.
    pub count: i64,
    /// The requested page.
    pub results: Vec<T>,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(None, None, 10, 0)]
    #[case(Some(3), Some(20), 20, 40)]
    #[case(Some(0), None, 10, 0)] // page clamps to 1
    #[case(Some(1), Some(1_000), 100, 0)] // size clamps to the cap
    fn page_query_translates(
        #[case] page: Option<i64>,
        #[case] page_size: Option<i64>,
        #[case] limit: i64,
        #[case] offset: i64,
    ) {
        let q = PageQuery {
            page,
            page_size,
            search: None,
        };
        assert_eq!(q.limit_offset(), (limit, offset));
    }

    #[rstest]
    #[case(None, None, 10, 0)]
    #[case(Some(5), Some(12), 5, 12)]
    #[case(Some(-1), Some(-4), 1, 0)]
    fn limit_offset_query_translates(
        #[case] limit: Option<i64>,
        #[case] offset: Option<i64>,
        #[case] expected_limit: i64,
        #[case] expected_offset: i64,
    ) {
        let q = LimitOffsetQuery { limit, offset };
        assert_eq!(q.limit_offset(), (expected_limit, expected_offset));
    }
}
