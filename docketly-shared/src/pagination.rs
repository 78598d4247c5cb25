/// Page-number pagination shared by every list endpoint
///
/// Pages are 1-based. `per_page` defaults to 20 and is clamped to 1..=100.
///
/// # Example
///
/// ```
/// use docketly_shared::pagination::PageParams;
///
/// let params = PageParams { page: Some(3), per_page: Some(10) };
/// assert_eq!(params.limit(), 10);
/// assert_eq!(params.offset(), 20);
/// ```

use serde::{Deserialize, Serialize};

/// Default page size
pub const DEFAULT_PER_PAGE: i64 = 20;

/// Largest page size a caller may request
pub const MAX_PER_PAGE: i64 = 100;

/// Query parameters for a paginated list
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PageParams {
    /// 1-based page number
    pub page: Option<i64>,

    /// Items per page
    pub per_page: Option<i64>,
}

impl PageParams {
    /// Effective page number (at least 1)
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Effective page size, clamped
    pub fn limit(&self) -> i64 {
        self.per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE)
    }

    /// Rows to skip
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

/// One page of results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,

    /// Total number of matching items
    pub total: i64,

    /// Page number that was served
    pub page: i64,

    /// Page size that was applied
    pub per_page: i64,
}

impl<T> Page<T> {
    /// Wraps a slice of results with its paging metadata
    pub fn new(items: Vec<T>, total: i64, params: &PageParams) -> Self {
        Self {
            items,
            total,
            page: params.page(),
            per_page: params.limit(),
        }
    }

    /// Converts items while keeping the paging metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }

    /// Fallible variant of [`Page::map`]
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            items: self.items.into_iter().map(f).collect::<Result<Vec<_>, E>>()?,
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        })
    }

    /// Number of pages needed for `total` items
    pub fn total_pages(&self) -> i64 {
        if self.total == 0 {
            0
        } else {
            (self.total + self.per_page - 1) / self.per_page
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = PageParams::default();
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), DEFAULT_PER_PAGE);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_clamping() {
        let params = PageParams {
            page: Some(0),
            per_page: Some(1000),
        };
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), MAX_PER_PAGE);

        let params = PageParams {
            page: Some(-4),
            per_page: Some(0),
        };
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), 1);
    }

    #[test]
    fn test_offset() {
        let params = PageParams {
            page: Some(4),
            per_page: Some(25),
        };
        assert_eq!(params.offset(), 75);
    }

    #[test]
    fn test_total_pages() {
        let params = PageParams {
            page: Some(1),
            per_page: Some(10),
        };
        assert_eq!(Page::<u8>::new(vec![], 0, &params).total_pages(), 0);
        assert_eq!(Page::<u8>::new(vec![], 10, &params).total_pages(), 1);
        assert_eq!(Page::<u8>::new(vec![], 11, &params).total_pages(), 2);
    }

    #[test]
    fn test_map_keeps_metadata() {
        let params = PageParams {
            page: Some(2),
            per_page: Some(2),
        };
        let page = Page::new(vec![1, 2], 5, &params).map(|n| n * 10);
        assert_eq!(page.items, vec![10, 20]);
        assert_eq!(page.total, 5);
        assert_eq!(page.page, 2);
        assert_eq!(page.per_page, 2);
    }
}
