//! Offset pagination parameters.
//!
//! List endpoints accept `page`/`page_size` query parameters. Out-of-range
//! values are clamped rather than rejected so that operator tooling with
//! sloppy defaults still gets a sane page back.

use serde::{Deserialize, Serialize};

/// Default page size when none (or an invalid one) is supplied.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Upper bound on page size.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Pagination query parameters.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub page_size: Option<i64>,
}

impl PageParams {
    /// Clamps the raw parameters into a usable page request.
    ///
    /// page < 1 becomes 1; page_size outside 1..=100 becomes the default.
    pub fn clamp(&self) -> Page {
        let page = match self.page {
            Some(p) if p >= 1 => p,
            _ => 1,
        };
        let page_size = match self.page_size {
            Some(s) if (1..=MAX_PAGE_SIZE).contains(&s) => s,
            _ => DEFAULT_PAGE_SIZE,
        };
        Page { page, page_size }
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: None,
            page_size: None,
        }
    }
}

/// A clamped page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub page_size: i64,
}

impl Page {
    /// Row offset for a SQL `OFFSET` clause.
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }

    /// Row limit for a SQL `LIMIT` clause.
    pub fn limit(&self) -> i64 {
        self.page_size
    }
}

/// A page of items plus the bookkeeping the admin UI renders.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    /// Assembles a page envelope from query results and a total count.
    pub fn new(items: Vec<T>, total: i64, page: Page) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + page.page_size - 1) / page.page_size
        };
        Self {
            items,
            total,
            page: page.page,
            page_size: page.page_size,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let page = PageParams::default().clamp();
        assert_eq!(page, Page { page: 1, page_size: DEFAULT_PAGE_SIZE });
    }

    #[test]
    fn test_negative_page_clamped() {
        let params = PageParams {
            page: Some(-3),
            page_size: Some(25),
        };
        let page = params.clamp();
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 25);
    }

    #[test]
    fn test_oversized_page_size_reset_to_default() {
        let params = PageParams {
            page: Some(2),
            page_size: Some(1000),
        };
        let page = params.clamp();
        assert_eq!(page.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_offset_and_limit() {
        let page = Page { page: 3, page_size: 20 };
        assert_eq!(page.offset(), 40);
        assert_eq!(page.limit(), 20);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let page = Page { page: 1, page_size: 10 };
        let paginated = Paginated::new(vec![1, 2, 3], 31, page);
        assert_eq!(paginated.total_pages, 4);
    }

    #[test]
    fn test_empty_result_has_zero_pages() {
        let page = Page { page: 1, page_size: 10 };
        let paginated: Paginated<i32> = Paginated::new(vec![], 0, page);
        assert_eq!(paginated.total_pages, 0);
        assert_eq!(paginated.total, 0);
    }
}
