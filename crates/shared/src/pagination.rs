//! Page-number pagination for admin listings.

use serde::Serialize;

/// Page used when the query omits or mangles `page`.
pub const DEFAULT_PAGE: i64 = 1;

/// Page size used when the query omits or mangles `page_size`.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Upper bound for `page_size`.
pub const MAX_PAGE_SIZE: i64 = 500;

/// A resolved page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    /// Builds a page request from raw query values.
    ///
    /// Values that do not parse as positive integers fall back to the
    /// defaults; `page_size` is clamped to [`MAX_PAGE_SIZE`].
    pub fn from_query(page: Option<&str>, page_size: Option<&str>) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(DEFAULT_PAGE);
        let page_size = page_size
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .map(|p| p.min(MAX_PAGE_SIZE))
            .unwrap_or(DEFAULT_PAGE_SIZE);
        Self { page, page_size }
    }

    /// Rows to skip for this page.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    /// Rows to fetch for this page.
    pub fn limit(&self) -> i64 {
        self.page_size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_missing() {
        let page = PageRequest::from_query(None, None);
        assert_eq!(page, PageRequest::default());
        assert_eq!(page.offset(), 0);
        assert_eq!(page.limit(), 20);
    }

    #[test]
    fn test_parses_values() {
        let page = PageRequest::from_query(Some("3"), Some("50"));
        assert_eq!(page.page, 3);
        assert_eq!(page.page_size, 50);
        assert_eq!(page.offset(), 100);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let page = PageRequest::from_query(Some("abc"), Some("-4"));
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 20);

        let page = PageRequest::from_query(Some("0"), Some("0"));
        assert_eq!(page, PageRequest::default());
    }

    #[test]
    fn test_page_size_is_clamped() {
        let page = PageRequest::from_query(Some("1"), Some("10000"));
        assert_eq!(page.page_size, MAX_PAGE_SIZE);
    }
}
