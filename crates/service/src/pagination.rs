//! Pagination utilities for the list operation.
//!
//! A list request is paginated only when both `page` and `limit` are given;
//! otherwise the whole match set comes back as a single page.

use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

pub const MAX_LIMIT: u64 = 100;

/// Raw list parameters as they arrive on the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
}

/// A validated window: 1-based page and page size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
    offset: u64,
}

impl PageRequest {
    /// Rows to skip must fit a Postgres BIGINT.
    pub fn new(page: u64, limit: u64) -> Result<Self, ServiceError> {
        let offset = page
            .checked_sub(1)
            .and_then(|p| p.checked_mul(limit))
            .filter(|o| *o <= i64::MAX as u64)
            .ok_or_else(|| ServiceError::validation("page is out of range"))?;
        Ok(Self { page, limit, offset })
    }

    pub fn offset(&self) -> u64 { self.offset }
}

/// What a repository needs to produce one page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageQuery {
    pub window: Option<PageRequest>,
    /// Trimmed, non-empty search term.
    pub search: Option<String>,
}

impl PageQuery {
    pub fn all() -> Self { Self::default() }
}

impl ListQuery {
    pub fn into_page_query(self) -> Result<PageQuery, ServiceError> {
        if let Some(page) = self.page {
            if page < 1 {
                return Err(ServiceError::validation("page must be >= 1"));
            }
        }
        if let Some(limit) = self.limit {
            if !(1..=MAX_LIMIT).contains(&limit) {
                return Err(ServiceError::validation(format!("limit must be between 1 and {MAX_LIMIT}")));
            }
        }
        let window = match (self.page, self.limit) {
            (Some(page), Some(limit)) => Some(PageRequest::new(page, limit)?),
            _ => None,
        };
        let search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Ok(PageQuery { window, search })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub total_items: u64,
    pub item_count: u64,
    pub items_per_page: u64,
    pub total_pages: u64,
    pub current_page: u64,
}

impl PageMeta {
    pub fn new(window: Option<PageRequest>, total_items: u64, item_count: u64) -> Self {
        match window {
            Some(w) => Self {
                total_items,
                item_count,
                items_per_page: w.limit,
                total_pages: total_items.div_ceil(w.limit),
                current_page: w.page,
            },
            None => Self {
                total_items,
                item_count,
                items_per_page: total_items,
                total_pages: 1,
                current_page: 1,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_items: u64, window: Option<PageRequest>) -> Self {
        let meta = PageMeta::new(window, total_items, items.len() as u64);
        Self { items, meta }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(page: Option<u64>, limit: Option<u64>) -> ListQuery {
        ListQuery { page, limit, search: None }
    }

    #[test]
    fn both_params_enable_pagination() {
        let pq = q(Some(3), Some(20)).into_page_query().unwrap();
        let w = pq.window.unwrap();
        assert_eq!(w.offset(), 40);
        assert_eq!(w.limit, 20);
    }

    #[test]
    fn one_param_alone_disables_pagination() {
        assert_eq!(q(Some(2), None).into_page_query().unwrap().window, None);
        assert_eq!(q(None, Some(5)).into_page_query().unwrap().window, None);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(q(Some(0), Some(10)).into_page_query().is_err());
        assert!(q(Some(1), Some(0)).into_page_query().is_err());
        assert!(q(Some(1), Some(101)).into_page_query().is_err());
        assert!(q(Some(0), None).into_page_query().is_err());
        assert!(q(Some(1), Some(100)).into_page_query().is_ok());
    }

    #[test]
    fn huge_page_is_rejected_instead_of_overflowing() {
        let err = q(Some(u64::MAX), Some(100)).into_page_query().unwrap_err();
        assert_eq!(err, ServiceError::Validation("page is out of range".into()));
        // offset just past i64::MAX
        let past_bigint = (i64::MAX as u64) / 100 + 2;
        assert!(q(Some(past_bigint), Some(100)).into_page_query().is_err());
        let last_ok = (i64::MAX as u64) / 100 + 1;
        let w = q(Some(last_ok), Some(100)).into_page_query().unwrap().window.unwrap();
        assert_eq!(w.offset(), (last_ok - 1) * 100);
    }

    #[test]
    fn blank_search_is_dropped() {
        let pq = ListQuery { search: Some("  ".into()), ..Default::default() }.into_page_query().unwrap();
        assert_eq!(pq.search, None);
        let pq = ListQuery { search: Some(" Pho ".into()), ..Default::default() }.into_page_query().unwrap();
        assert_eq!(pq.search.as_deref(), Some("Pho"));
    }

    #[test]
    fn meta_for_middle_page() {
        let m = PageMeta::new(Some(PageRequest::new(2, 1).unwrap()), 3, 1);
        assert_eq!(m, PageMeta { total_items: 3, item_count: 1, items_per_page: 1, total_pages: 3, current_page: 2 });
    }

    #[test]
    fn meta_rounds_partial_last_page_up() {
        let m = PageMeta::new(Some(PageRequest::new(1, 10).unwrap()), 21, 10);
        assert_eq!(m.total_pages, 3);
    }

    #[test]
    fn meta_past_the_end_is_empty_not_error() {
        let m = PageMeta::new(Some(PageRequest::new(9, 10).unwrap()), 21, 0);
        assert_eq!(m.item_count, 0);
        assert_eq!(m.current_page, 9);
    }

    #[test]
    fn meta_without_window_is_single_page() {
        let m = PageMeta::new(None, 7, 7);
        assert_eq!((m.items_per_page, m.total_pages, m.current_page), (7, 1, 1));
        let empty = PageMeta::new(None, 0, 0);
        assert_eq!((empty.items_per_page, empty.total_pages), (0, 1));
    }

    #[test]
    fn meta_with_window_and_no_rows_has_zero_pages() {
        let m = PageMeta::new(Some(PageRequest::new(1, 10).unwrap()), 0, 0);
        assert_eq!(m.total_pages, 0);
    }
}
