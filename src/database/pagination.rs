use serde::{Deserialize, Serialize};

pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PageContext<T> {
    pub count: i64,
    pub next: Option<i64>,
    pub previous: Option<i64>,
    pub results: Vec<T>,
}

impl<T> PageContext<T> {
    pub fn from_rows(results: Vec<T>, total_rows: i64, request: PageRequest) -> Self {
        if results.is_empty() && request.page == 1 {
            return Self::no_rows();
        }

        let last_page = (total_rows + request.limit - 1) / request.limit;
        let next = (request.page < last_page).then_some(request.page + 1);
        let previous = (request.page > 1).then(|| (request.page - 1).min(last_page.max(1)));

        Self {
            count: total_rows,
            next,
            previous,
            results,
        }
    }

    pub fn no_rows() -> Self {
        Self {
            count: 0,
            next: None,
            previous: None,
            results: vec![],
        }
    }

    pub fn map<U, F>(self, f: F) -> PageContext<U>
    where
        F: FnMut(T) -> U,
    {
        PageContext {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

/// 1-based page number and page size taken from `?page=&limit=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn new(page: Option<i64>, limit: Option<i64>, default_limit: i64) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Saturates for page numbers far past the last row.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_links_forward_only() {
        let page = PageContext::from_rows(vec![1, 2, 3], 7, PageRequest::new(None, Some(3), 6));

        assert_eq!(page.count, 7);
        assert_eq!(page.next, Some(2));
        assert_eq!(page.previous, None);
    }

    #[test]
    fn last_page_links_backward_only() {
        let page = PageContext::from_rows(vec![7], 7, PageRequest::new(Some(3), Some(3), 6));

        assert_eq!(page.next, None);
        assert_eq!(page.previous, Some(2));
    }

    #[test]
    fn empty_result_has_no_links() {
        let page: PageContext<i32> = PageContext::from_rows(vec![], 0, PageRequest::new(None, None, 6));
        assert_eq!(page, PageContext::no_rows());
    }

    #[test]
    fn page_past_the_end_points_back_to_last_page() {
        let page: PageContext<i32> =
            PageContext::from_rows(vec![], 4, PageRequest::new(Some(9), Some(2), 6));

        assert_eq!(page.next, None);
        assert_eq!(page.previous, Some(2));
    }

    #[test]
    fn request_is_clamped() {
        let request = PageRequest::new(Some(0), Some(10_000), 6);

        assert_eq!(request.page, 1);
        assert_eq!(request.limit, MAX_PAGE_SIZE);
        assert_eq!(PageRequest::new(Some(3), None, 6).offset(), 12);
    }

    #[test]
    fn huge_page_number_does_not_overflow() {
        let request = PageRequest::new(Some(i64::MAX), None, 6);
        assert_eq!(request.offset(), i64::MAX);

        let page: PageContext<i32> = PageContext::from_rows(vec![], 10, request);
        assert_eq!(page.next, None);
        assert_eq!(page.previous, Some(2));
    }
}
